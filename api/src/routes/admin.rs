//! Site admin pages for editing a group.
//!
//! Every route here answers 404 unless the caller is a super admin, so the
//! admin area looks the same as a missing page to everyone else.

use actix_identity::Identity;
use actix_web::{HttpResponse, get, web};
use payloads::{
    UserId, is_global_admin_group, nav,
    pagination::{MEMBERS_PER_PAGE, total_pages},
    requests::GroupMembersQuery,
    responses::{GroupDetailsPage, GroupMembersPage},
};
use sqlx::PgPool;

use crate::photos;
use crate::storage::StorageService;
use crate::store::{self, PhotoLookups, SessionUser, SuperAdmin};

use super::{APIError, get_session_user};

#[tracing::instrument(
    skip(user, pool),
    fields(user_id=tracing::field::Empty),
    ret
)]
#[get("/groups/{slug}/edit")]
pub async fn get_group_details(
    user: Option<Identity>,
    slug: web::Path<String>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, APIError> {
    let session = get_session_user(user.as_ref(), &pool).await?;
    let details =
        compose_group_details(session.as_ref(), &slug, &pool).await?;
    Ok(HttpResponse::Ok().json(details))
}

#[tracing::instrument(
    skip(user, pool, storage),
    fields(user_id=tracing::field::Empty),
    ret
)]
#[get("/groups/{slug}/edit/members")]
pub async fn get_group_members(
    user: Option<Identity>,
    slug: web::Path<String>,
    query: web::Query<GroupMembersQuery>,
    pool: web::Data<PgPool>,
    storage: web::Data<StorageService>,
) -> Result<HttpResponse, APIError> {
    let session = get_session_user(user.as_ref(), &pool).await?;
    let members_page = compose_members_page(
        session.as_ref(),
        &slug,
        query.page(),
        &pool,
        &storage,
    )
    .await?;
    Ok(HttpResponse::Ok().json(members_page))
}

fn require_super_admin(
    session: Option<&SessionUser>,
) -> Result<SuperAdmin, APIError> {
    SuperAdmin::from_session(session).ok_or_else(|| {
        APIError::NotFound(anyhow::anyhow!("Super admin access required"))
    })
}

pub async fn compose_group_details(
    session: Option<&SessionUser>,
    slug: &str,
    pool: &PgPool,
) -> Result<GroupDetailsPage, APIError> {
    require_super_admin(session)?;
    let group = store::get_group_by_slug(slug, pool).await?;
    let tabs =
        nav::edit_group_tabs(&group.slug, &nav::edit_group_path(&group.slug));
    Ok(GroupDetailsPage {
        is_global_admin_group: is_global_admin_group(&group.slug),
        tabs: tabs.into(),
        group,
    })
}

/// Assemble the "Manage Members" page for a group.
///
/// `page` is 1-indexed. Fails with `NotFound` if the session isn't a super
/// admin or the group doesn't exist; any database or storage failure fails
/// the whole page.
pub async fn compose_members_page(
    session: Option<&SessionUser>,
    slug: &str,
    page: i64,
    pool: &PgPool,
    storage: &StorageService,
) -> Result<GroupMembersPage, APIError> {
    let admin = require_super_admin(session)?;
    tracing::debug!(admin_id = %admin.user_id(), "super admin verified");

    let group = store::get_group_by_slug(slug, pool).await?;
    let snapshot = store::read_members_snapshot(&group.id, page, pool).await?;

    let lookups =
        PhotoLookups::resolve(&snapshot.entity_types, &snapshot.photo_types);
    let user_ids: Vec<UserId> =
        snapshot.members.iter().map(|m| m.user_id).collect();
    let photo_urls =
        store::get_primary_photo_urls(&user_ids, &lookups, pool).await?;
    let members =
        photos::attach_member_photos(snapshot.members, &photo_urls, storage)
            .await?;

    let members_path = nav::group_members_path(&group.slug);
    let tabs = nav::edit_group_tabs(&group.slug, &members_path);
    Ok(GroupMembersPage {
        is_global_admin_group: is_global_admin_group(&group.slug),
        members,
        total_members: snapshot.total_members,
        // guaranteed by require_super_admin
        is_super_admin: true,
        page,
        total_pages: total_pages(snapshot.total_members, MEMBERS_PER_PAGE),
        group_user_roles: snapshot.group_user_roles,
        tabs: tabs.into(),
        group,
    })
}
