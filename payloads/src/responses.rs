use crate::{GroupId, GroupUserId, GroupUserRoleId, UserId, nav::NavTab};
use jiff::Timestamp;
#[cfg(feature = "use-sqlx")]
use jiff_sqlx::Timestamp as SqlxTs;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "use-sqlx", derive(sqlx::FromRow))]
pub struct Group {
    pub id: GroupId,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    #[cfg_attr(feature = "use-sqlx", sqlx(try_from = "SqlxTs"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "use-sqlx", sqlx(try_from = "SqlxTs"))]
    pub updated_at: Timestamp,
}

/// A role a group member can hold. Roles without a group are available to
/// every group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "use-sqlx", derive(sqlx::FromRow))]
pub struct GroupUserRole {
    pub id: GroupUserRoleId,
    pub group_id: Option<GroupId>,
    pub code: String,
    pub name: String,
}

/// The user behind a group membership, with the avatar to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    /// Absolute URL of the user's primary photo, or a generated placeholder.
    pub photo_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub id: GroupUserId,
    pub group_id: GroupId,
    pub user_id: UserId,
    pub role: GroupUserRole,
    pub user: MemberUser,
    pub created_at: Timestamp,
}

/// Everything the "Manage Members" page needs to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembersPage {
    pub group: Group,
    /// Members on the current page, newest first.
    pub members: Vec<GroupMember>,
    pub total_members: i64,
    pub is_super_admin: bool,
    pub is_global_admin_group: bool,
    /// 1-indexed
    pub page: i64,
    pub total_pages: i64,
    /// Roles that can be assigned to members of any group.
    pub group_user_roles: Vec<GroupUserRole>,
    pub tabs: Vec<NavTab>,
}

/// Everything the "Edit Details" page needs to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDetailsPage {
    pub group: Group,
    pub is_global_admin_group: bool,
    pub tabs: Vec<NavTab>,
}
