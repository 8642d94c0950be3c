//! Database store module for the group admin API
//!
//! ## Design Decisions
//!
//! ### Global lookups
//! - **Roles, entity types and photo types** can be global (`group_id IS
//!   NULL`) or scoped to one group. The admin pages only read the global
//!   rows.
//! - **Photos reference lookups by id**: a photo points at an entity type and
//!   a photo type row rather than storing symbolic codes, so reading a
//!   user's primary photo first resolves the `user` and `primary` codes to
//!   ids (see [`PhotoLookups`]).
//!
//! ### Snapshot reads
//! - **Count and page together**: the members page reads the member count
//!   and the page of members inside one `REPEATABLE READ` transaction, so
//!   both come from the same snapshot even while memberships change.
//!
//! ### Time Source Dependency
//! - **Mocked time for testing**: functions that stamp `created_at` accept a
//!   `TimeSource` so ordering can be controlled in tests.
//!
//! ### Type Safety
//! - **Id newtypes with sqlx::Type**: the ids from `payloads` are
//!   transparent sqlx types and bind directly in queries.

use jiff::Timestamp;
use jiff_sqlx::{Timestamp as SqlxTs, ToSqlx};
use sqlx::{FromRow, PgPool};

use payloads::UserId;

use crate::time::TimeSource;

pub mod group;
pub mod photo;

pub use group::*;
pub use photo::*;

/// A complete user row that stays in the backend.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: Option<String>,
    pub is_super_admin: bool,
    #[sqlx(try_from = "SqlxTs")]
    pub created_at: Timestamp,
    #[sqlx(try_from = "SqlxTs")]
    pub updated_at: Timestamp,
    #[sqlx(try_from = "OptionalTimestamp")]
    pub deleted_at: Option<Timestamp>,
}

#[derive(sqlx::Type)]
#[sqlx(transparent)]
pub struct OptionalTimestamp(Option<SqlxTs>);

impl From<OptionalTimestamp> for Option<Timestamp> {
    fn from(x: OptionalTimestamp) -> Option<Timestamp> {
        x.0.map(|x| x.to_jiff())
    }
}

/// The caller of a request, as far as authorization is concerned.
///
/// Built from the session cookie and passed explicitly into anything that
/// needs to make an access decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: UserId,
    pub is_super_admin: bool,
}

/// A type that can only exist if the interior session has been validated to
/// belong to a super admin.
#[derive(Debug, Clone)]
pub struct SuperAdmin(SessionUser);

impl SuperAdmin {
    /// Returns `None` unless the session grants super admin access.
    pub fn from_session(session: Option<&SessionUser>) -> Option<Self> {
        session
            .filter(|session| session.is_super_admin)
            .map(|session| Self(session.clone()))
    }

    pub fn user_id(&self) -> &UserId {
        &self.0.user_id
    }
}

pub async fn create_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
    time_source: &TimeSource,
) -> Result<User, StoreError> {
    if username.len() > payloads::requests::USERNAME_MAX_LEN {
        return Err(StoreError::FieldTooLong);
    }
    if email.len() > payloads::requests::EMAIL_MAX_LEN {
        return Err(StoreError::FieldTooLong);
    }
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (
                username,
                email,
                password_hash,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $4)
            RETURNING *;",
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(time_source.now().to_sqlx())
    .fetch_one(pool)
    .await?;
    Ok(user)
}

/// The id and password hash of a live account, by username.
pub async fn read_password_hash(
    username: &str,
    pool: &PgPool,
) -> Result<Option<(UserId, String)>, StoreError> {
    Ok(sqlx::query_as::<_, (UserId, String)>(
        "SELECT id, password_hash FROM users
        WHERE username = $1 AND deleted_at IS NULL",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?)
}

/// Grant or revoke site-wide admin access.
pub async fn set_super_admin(
    user_id: &UserId,
    is_super_admin: bool,
    pool: &PgPool,
) -> Result<(), StoreError> {
    let result = sqlx::query(
        "UPDATE users SET is_super_admin = $2
        WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(user_id)
    .bind(is_super_admin)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::UserNotFound);
    }
    Ok(())
}

/// Load the session details for a logged in user id.
///
/// A session that points at a deleted or missing user is treated as no
/// session at all.
#[tracing::instrument(skip(pool))]
pub async fn read_session_user(
    user_id: &UserId,
    pool: &PgPool,
) -> Result<Option<SessionUser>, StoreError> {
    Ok(sqlx::query_as::<_, (UserId, bool)>(
        "SELECT id, is_super_admin FROM users
        WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .map(|(user_id, is_super_admin)| SessionUser {
        user_id,
        is_super_admin,
    }))
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Field too long")]
    FieldTooLong,
    #[error("User not found")]
    UserNotFound,
    #[error("Group not found")]
    GroupNotFound,
    #[error("Group user role not found")]
    GroupUserRoleNotFound,
    #[error("Lookup type not found: {0}")]
    LookupTypeNotFound(String),
    #[error("Unique constraint violation")]
    NotUnique(#[source] sqlx::Error),
    #[error("Database error")]
    Database(#[source] sqlx::Error),
    #[error("Unexpected error")]
    UnexpectedError(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e
            && db_err.is_unique_violation()
        {
            return StoreError::NotUnique(e);
        }
        StoreError::Database(e)
    }
}
