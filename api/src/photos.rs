//! Choosing the avatar url shown next to each group member.

use std::collections::HashMap;

use futures::future::try_join_all;
use payloads::{
    UserId,
    responses::{GroupMember, MemberUser},
};

use crate::storage::StorageService;
use crate::store::GroupMemberRow;

/// Placeholder avatars, seeded so every user keeps the same image.
pub const FALLBACK_AVATAR_URL: &str =
    "https://api.dicebear.com/8.x/personas/png";

/// Where a member's avatar comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoSource<'a> {
    /// Already a full url; used verbatim.
    Absolute(&'a str),
    /// A key into object storage.
    StorageKey(&'a str),
    /// No stored photo.
    Missing,
}

impl<'a> PhotoSource<'a> {
    pub fn classify(stored: Option<&'a str>) -> Self {
        match stored {
            None | Some("") => Self::Missing,
            Some(url) if url.starts_with("http") => Self::Absolute(url),
            Some(key) => Self::StorageKey(key),
        }
    }
}

pub fn fallback_avatar_url(user_id: &UserId) -> String {
    format!("{FALLBACK_AVATAR_URL}?seed={user_id}")
}

/// Resolve the url to display for one user.
pub async fn resolve_photo_url(
    stored: Option<&str>,
    user_id: &UserId,
    storage: &StorageService,
) -> anyhow::Result<String> {
    Ok(match PhotoSource::classify(stored) {
        PhotoSource::Absolute(url) => url.to_string(),
        PhotoSource::StorageKey(key) => storage.public_url(key).await?,
        PhotoSource::Missing => fallback_avatar_url(user_id),
    })
}

/// Attach a display photo to every member row.
///
/// Storage lookups for all members run concurrently; the first failure
/// fails the whole batch. Output order matches input order.
#[tracing::instrument(skip_all, fields(members = rows.len()))]
pub async fn attach_member_photos(
    rows: Vec<GroupMemberRow>,
    photo_urls: &HashMap<UserId, String>,
    storage: &StorageService,
) -> anyhow::Result<Vec<GroupMember>> {
    try_join_all(rows.into_iter().map(|row| async move {
        let photo_url = resolve_photo_url(
            photo_urls.get(&row.user_id).map(String::as_str),
            &row.user_id,
            storage,
        )
        .await?;
        Ok::<_, anyhow::Error>(GroupMember {
            id: row.id,
            group_id: row.group_id,
            user_id: row.user_id,
            role: row.role(),
            user: MemberUser {
                id: row.user_id,
                username: row.username,
                email: row.email,
                display_name: row.display_name,
                photo_url,
            },
            created_at: row.created_at,
        })
    }))
    .await
}
