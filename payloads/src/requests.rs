use serde::{Deserialize, Serialize};

pub const EMAIL_MAX_LEN: usize = 255;
pub const USERNAME_MAX_LEN: usize = 30;

#[derive(Serialize, Deserialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

/// Query string for the group members page.
///
/// `page` is kept as the raw string so that junk values fall back to the
/// first page instead of failing the request.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GroupMembersQuery {
    pub page: Option<String>,
}

impl GroupMembersQuery {
    pub fn page(&self) -> i64 {
        crate::pagination::parse_page(self.page.as_deref())
    }
}
