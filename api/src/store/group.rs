use jiff::Timestamp;
use jiff_sqlx::{Timestamp as SqlxTs, ToSqlx};
use payloads::{
    GroupId, GroupUserId, GroupUserRoleId, UserId,
    pagination::{MEMBERS_PER_PAGE, page_offset},
    responses::{Group, GroupUserRole},
};
use sqlx::{FromRow, PgPool};
use tracing::Level;

use super::{EntityType, PhotoType, StoreError};
use crate::time::TimeSource;

/// A membership row joined with its role and user, before any photo has been
/// resolved.
#[derive(Debug, Clone, FromRow)]
pub struct GroupMemberRow {
    pub id: GroupUserId,
    pub group_id: GroupId,
    pub user_id: UserId,
    #[sqlx(try_from = "SqlxTs")]
    pub created_at: Timestamp,
    pub role_id: GroupUserRoleId,
    pub role_group_id: Option<GroupId>,
    pub role_code: String,
    pub role_name: String,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
}

impl GroupMemberRow {
    pub fn role(&self) -> GroupUserRole {
        GroupUserRole {
            id: self.role_id,
            group_id: self.role_group_id,
            code: self.role_code.clone(),
            name: self.role_name.clone(),
        }
    }
}

/// Everything the members page reads from one database snapshot.
#[derive(Debug, Clone)]
pub struct MembersSnapshot {
    pub total_members: i64,
    /// Newest memberships first.
    pub members: Vec<GroupMemberRow>,
    pub group_user_roles: Vec<GroupUserRole>,
    pub entity_types: Vec<EntityType>,
    pub photo_types: Vec<PhotoType>,
}

pub async fn create_group(
    slug: &str,
    name: &str,
    description: Option<&str>,
    pool: &PgPool,
    time_source: &TimeSource,
) -> Result<Group, StoreError> {
    Ok(sqlx::query_as::<_, Group>(
        "INSERT INTO groups (slug, name, description, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $4)
        RETURNING *",
    )
    .bind(slug)
    .bind(name)
    .bind(description)
    .bind(time_source.now().to_sqlx())
    .fetch_one(pool)
    .await?)
}

pub async fn get_group_by_slug(
    slug: &str,
    pool: &PgPool,
) -> Result<Group, StoreError> {
    sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::GroupNotFound)
}

/// Look up a role available to all groups by its code.
pub async fn read_global_role(
    code: &str,
    pool: &PgPool,
) -> Result<GroupUserRole, StoreError> {
    sqlx::query_as::<_, GroupUserRole>(
        "SELECT id, group_id, code, name FROM group_user_roles
        WHERE group_id IS NULL AND code = $1",
    )
    .bind(code)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::GroupUserRoleNotFound)
}

pub async fn add_group_member(
    group_id: &GroupId,
    user_id: &UserId,
    role_id: &GroupUserRoleId,
    pool: &PgPool,
    time_source: &TimeSource,
) -> Result<GroupUserId, StoreError> {
    Ok(sqlx::query_scalar::<_, GroupUserId>(
        "INSERT INTO group_users (
            group_id, user_id, role_id, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $4)
        RETURNING id",
    )
    .bind(group_id)
    .bind(user_id)
    .bind(role_id)
    .bind(time_source.now().to_sqlx())
    .fetch_one(pool)
    .await?)
}

/// Read a page of a group's members along with the total count and the
/// global lookup tables.
///
/// All reads share one repeatable-read transaction, so the count always
/// agrees with the page even if members are added or removed concurrently.
#[tracing::instrument(skip(pool), err(level = Level::ERROR))]
pub async fn read_members_snapshot(
    group_id: &GroupId,
    page: i64,
    pool: &PgPool,
) -> Result<MembersSnapshot, StoreError> {
    let mut tx = pool.begin().await?;

    // must run before any other statement in the transaction
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await?;

    let total_members = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM group_users WHERE group_id = $1",
    )
    .bind(group_id)
    .fetch_one(&mut *tx)
    .await?;

    let members = sqlx::query_as::<_, GroupMemberRow>(
        "SELECT
            gu.id,
            gu.group_id,
            gu.user_id,
            gu.created_at,
            r.id AS role_id,
            r.group_id AS role_group_id,
            r.code AS role_code,
            r.name AS role_name,
            u.username,
            u.email,
            u.display_name
        FROM group_users gu
        JOIN group_user_roles r ON r.id = gu.role_id
        JOIN users u ON u.id = gu.user_id
        WHERE gu.group_id = $1
        ORDER BY gu.created_at DESC, gu.id DESC
        LIMIT $2 OFFSET $3",
    )
    .bind(group_id)
    .bind(MEMBERS_PER_PAGE)
    .bind(page_offset(page, MEMBERS_PER_PAGE))
    .fetch_all(&mut *tx)
    .await?;

    let group_user_roles = sqlx::query_as::<_, GroupUserRole>(
        "SELECT id, group_id, code, name FROM group_user_roles
        WHERE group_id IS NULL
        ORDER BY created_at, code",
    )
    .fetch_all(&mut *tx)
    .await?;

    let entity_types = sqlx::query_as::<_, EntityType>(
        "SELECT id, group_id, code, name FROM entity_types
        WHERE group_id IS NULL",
    )
    .fetch_all(&mut *tx)
    .await?;

    let photo_types = sqlx::query_as::<_, PhotoType>(
        "SELECT id, group_id, code, name FROM photo_types
        WHERE group_id IS NULL",
    )
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(MembersSnapshot {
        total_members,
        members,
        group_user_roles,
        entity_types,
        photo_types,
    })
}
