/// Number of members shown on each page of the group members list.
pub const MEMBERS_PER_PAGE: i64 = 25;

/// Interpret a raw `page` query value.
///
/// Pages are 1-indexed. Anything missing, non-numeric, fractional or below
/// one falls back to the first page.
pub fn parse_page(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or(1)
}

/// Number of rows to skip to reach the start of `page`.
pub fn page_offset(page: i64, per_page: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(per_page)
}

/// Number of pages needed to show `total` items, `ceil(total / per_page)`.
pub fn total_pages(total: i64, per_page: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (total + per_page - 1) / per_page
}

/// Rows expected on `page`, given `total` items.
pub fn rows_on_page(total: i64, page: i64, per_page: i64) -> i64 {
    (total - page_offset(page, per_page)).clamp(0, per_page)
}
