use std::collections::HashMap;

use jiff_sqlx::ToSqlx;
use payloads::{EntityTypeId, GroupId, PhotoId, PhotoTypeId, UserId};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::StoreError;
use crate::time::TimeSource;

/// Entity type code for photos that belong to a user.
pub const USER_ENTITY_TYPE_CODE: &str = "user";
/// Photo type code for an entity's main photo (a user's avatar).
pub const PRIMARY_PHOTO_TYPE_CODE: &str = "primary";

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct EntityType {
    pub id: EntityTypeId,
    pub group_id: Option<GroupId>,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PhotoType {
    pub id: PhotoTypeId,
    pub group_id: Option<GroupId>,
    pub code: String,
    pub name: String,
}

/// Ids of the lookup rows needed to find users' primary photos.
///
/// Either may be missing if the lookup tables haven't been seeded, in which
/// case no photo can match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhotoLookups {
    pub user_entity_type: Option<EntityTypeId>,
    pub primary_photo_type: Option<PhotoTypeId>,
}

impl PhotoLookups {
    pub fn resolve(
        entity_types: &[EntityType],
        photo_types: &[PhotoType],
    ) -> Self {
        Self {
            user_entity_type: entity_types
                .iter()
                .find(|t| t.code == USER_ENTITY_TYPE_CODE)
                .map(|t| t.id),
            primary_photo_type: photo_types
                .iter()
                .find(|t| t.code == PRIMARY_PHOTO_TYPE_CODE)
                .map(|t| t.id),
        }
    }
}

/// Map each user to the stored url of their primary photo.
///
/// Users without a photo are absent from the map. If a user has several
/// matching photos, the most recently created one wins.
#[tracing::instrument(skip(user_ids, pool), fields(users = user_ids.len()))]
pub async fn get_primary_photo_urls(
    user_ids: &[UserId],
    lookups: &PhotoLookups,
    pool: &PgPool,
) -> Result<HashMap<UserId, String>, StoreError> {
    let (Some(entity_type_id), Some(type_id)) =
        (lookups.user_entity_type, lookups.primary_photo_type)
    else {
        tracing::warn!("photo lookup types missing; skipping photo query");
        return Ok(HashMap::new());
    };
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let photos = sqlx::query_as::<_, (UserId, String)>(
        "SELECT entity_id, url FROM photos
        WHERE entity_id = ANY($1)
            AND entity_type_id = $2
            AND type_id = $3
        ORDER BY created_at ASC, id ASC",
    )
    .bind(user_ids)
    .bind(entity_type_id)
    .bind(type_id)
    .fetch_all(pool)
    .await?;

    // later rows overwrite earlier ones
    Ok(photos.into_iter().collect())
}

pub async fn read_global_entity_type(
    code: &str,
    pool: &PgPool,
) -> Result<EntityType, StoreError> {
    sqlx::query_as::<_, EntityType>(
        "SELECT id, group_id, code, name FROM entity_types
        WHERE group_id IS NULL AND code = $1",
    )
    .bind(code)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| StoreError::LookupTypeNotFound(code.to_string()))
}

pub async fn read_global_photo_type(
    code: &str,
    pool: &PgPool,
) -> Result<PhotoType, StoreError> {
    sqlx::query_as::<_, PhotoType>(
        "SELECT id, group_id, code, name FROM photo_types
        WHERE group_id IS NULL AND code = $1",
    )
    .bind(code)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| StoreError::LookupTypeNotFound(code.to_string()))
}

/// Store a photo for any kind of entity. `url` may be absolute or a storage
/// key.
pub async fn create_photo(
    entity_id: Uuid,
    entity_type_id: &EntityTypeId,
    type_id: &PhotoTypeId,
    url: &str,
    pool: &PgPool,
    time_source: &TimeSource,
) -> Result<PhotoId, StoreError> {
    Ok(sqlx::query_scalar::<_, PhotoId>(
        "INSERT INTO photos (
            entity_id, entity_type_id, type_id, url, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $5)
        RETURNING id",
    )
    .bind(entity_id)
    .bind(entity_type_id)
    .bind(type_id)
    .bind(url)
    .bind(time_source.now().to_sqlx())
    .fetch_one(pool)
    .await?)
}
