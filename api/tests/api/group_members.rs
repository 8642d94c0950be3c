use api::photos::fallback_avatar_url;
use payloads::{
    UserId,
    pagination::{MEMBERS_PER_PAGE, rows_on_page},
    responses::GroupMembersPage,
};
use reqwest::StatusCode;

use test_helpers::{
    STORAGE_URL, assert_status_code,
    mock::{GroupDataset, STAFF_MEMBER_COUNT},
    spawn_app,
};

fn member_ids(page: &GroupMembersPage) -> Vec<UserId> {
    page.members.iter().map(|m| m.user_id).collect()
}

#[tokio::test]
async fn anonymous_gets_not_found() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.create_group("staff", "Staff").await?;

    let result = app.client.get_group_members("staff", None).await;
    match result {
        Err(payloads::ClientError::APIError(code, text)) => {
            assert_eq!(code, StatusCode::NOT_FOUND);
            // nothing about why
            assert_eq!(text, "Not found");
        }
        _ => panic!("Expected APIError"),
    }

    Ok(())
}

#[tokio::test]
async fn regular_user_gets_not_found() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let bob_id = app.create_bob_user().await?;
    let staff = app.create_group("staff", "Staff").await?;
    // membership doesn't matter, only the super admin flag
    app.add_member(&staff, &bob_id, "admin").await?;

    let result = app.client.get_group_members("staff", None).await;
    assert_status_code(result, StatusCode::NOT_FOUND);

    let result = app.client.get_group_members("nonexistent", None).await;
    assert_status_code(result, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn unknown_group_not_found() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.create_alice_admin().await?;

    let result = app.client.get_group_members("nonexistent", None).await;
    assert_status_code(result, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn first_page_newest_first() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let data = GroupDataset::create(&app).await?;

    let page = app.client.get_group_members("staff", None).await?;

    assert_eq!(page.group, data.staff);
    assert_eq!(page.page, 1);
    assert_eq!(page.total_members, STAFF_MEMBER_COUNT as i64);
    assert_eq!(page.total_pages, 2);
    assert!(page.is_super_admin);
    assert!(!page.is_global_admin_group);
    assert_eq!(member_ids(&page), data.staff_ids_newest_first()[..25]);

    for member in &page.members {
        assert_eq!(member.group_id, data.staff.id);
        assert_eq!(member.user.id, member.user_id);
        assert_eq!(member.role.code, "member");
        let email = format!("{}@example.com", member.user.username);
        assert_eq!(member.user.email, email);
    }

    let codes: Vec<&str> =
        page.group_user_roles.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, ["admin", "member"]);
    assert!(page.group_user_roles.iter().all(|r| r.group_id.is_none()));

    Ok(())
}

#[tokio::test]
async fn second_and_past_last_page() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let data = GroupDataset::create(&app).await?;

    let page = app.client.get_group_members("staff", Some("2")).await?;
    assert_eq!(page.page, 2);
    assert_eq!(page.total_pages, 2);
    assert_eq!(
        page.members.len() as i64,
        rows_on_page(page.total_members, 2, MEMBERS_PER_PAGE)
    );
    assert_eq!(member_ids(&page), data.staff_ids_newest_first()[25..]);

    // an out of range page is still a page, just an empty one
    let page = app.client.get_group_members("staff", Some("5")).await?;
    assert_eq!(page.page, 5);
    assert!(page.members.is_empty());
    assert_eq!(page.total_members, STAFF_MEMBER_COUNT as i64);
    assert_eq!(page.total_pages, 2);

    Ok(())
}

#[tokio::test]
async fn malformed_page_falls_back_to_first() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let data = GroupDataset::create(&app).await?;
    let first_page = data.staff_ids_newest_first()[..25].to_vec();

    for raw in ["abc", "0", "-1", "1.5", ""] {
        let page = app.client.get_group_members("staff", Some(raw)).await?;
        assert_eq!(page.page, 1, "page={raw:?}");
        assert_eq!(member_ids(&page), first_page, "page={raw:?}");
    }

    Ok(())
}

#[tokio::test]
async fn member_photo_urls() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let data = GroupDataset::create(&app).await?;

    let page = app.client.get_group_members("staff", Some("2")).await?;
    let photo_url = |user_id: &UserId| -> String {
        page.members
            .iter()
            .find(|m| &m.user_id == user_id)
            .map(|m| m.user.photo_url.clone())
            .expect("member should be on page 2")
    };

    let ids = &data.staff_member_ids;
    assert_eq!(photo_url(&ids[0]), "https://example.com/x.png");
    assert_eq!(
        photo_url(&ids[1]),
        format!("{STORAGE_URL}/avatars/staff1.png")
    );
    assert_eq!(photo_url(&ids[2]), fallback_avatar_url(&ids[2]));
    assert!(photo_url(&ids[2]).starts_with("https://api.dicebear.com/"));

    Ok(())
}

#[tokio::test]
async fn global_admin_group_flagged() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let data = GroupDataset::create(&app).await?;

    let page = app
        .client
        .get_group_members(payloads::GLOBAL_ADMIN_GROUP_SLUG, None)
        .await?;
    assert!(page.is_global_admin_group);
    assert_eq!(page.group, data.global_admin);
    assert_eq!(page.total_members, 1);
    assert_eq!(page.members[0].user_id, data.alice_id);
    assert_eq!(page.members[0].user.username, "alice");
    assert_eq!(page.members[0].role.code, "admin");

    Ok(())
}

#[tokio::test]
async fn members_tab_active() -> anyhow::Result<()> {
    let app = spawn_app().await;
    GroupDataset::create(&app).await?;

    let page = app.client.get_group_members("staff", None).await?;
    let tabs: Vec<(&str, &str, bool)> = page
        .tabs
        .iter()
        .map(|t| (t.name.as_str(), t.href.as_str(), t.active))
        .collect();
    assert_eq!(
        tabs,
        [
            ("Edit Details", "/admin/groups/staff/edit", false),
            ("Manage Members", "/admin/groups/staff/edit/members", true),
        ]
    );

    Ok(())
}

#[tokio::test]
async fn empty_group() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let data = GroupDataset::create(&app).await?;

    let page = app.client.get_group_members("empty", None).await?;
    assert_eq!(page.group, data.empty);
    assert!(page.members.is_empty());
    assert_eq!(page.total_members, 0);
    assert_eq!(page.total_pages, 0);
    assert_eq!(page.page, 1);

    Ok(())
}

#[tokio::test]
async fn revoked_super_admin_loses_access() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let data = GroupDataset::create(&app).await?;
    app.client.get_group_members("staff", None).await?;

    // the session cookie is unchanged, but the flag is read per request
    api::store::set_super_admin(&data.alice_id, false, &app.db_pool).await?;

    let result = app.client.get_group_members("staff", None).await;
    assert_status_code(result, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn missing_lookup_types_use_placeholders() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let data = GroupDataset::create(&app).await?;

    let lookups = [("entity_types", "user"), ("photo_types", "primary")];
    for (table, code) in lookups {
        sqlx::query(&format!(
            "UPDATE {table} SET code = 'renamed-{code}' WHERE code = $1"
        ))
        .bind(code)
        .execute(&app.db_pool)
        .await?;

        // staff0 and staff1 have photos, and are both on page 2
        let page = app.client.get_group_members("staff", Some("2")).await?;
        assert_eq!(page.members.len(), 5);
        for member in &page.members {
            assert_eq!(
                member.user.photo_url,
                fallback_avatar_url(&member.user_id),
                "{table}"
            );
        }
        assert!(
            page.members
                .iter()
                .any(|m| m.user_id == data.staff_member_ids[0])
        );

        sqlx::query(&format!(
            "UPDATE {table} SET code = $1 WHERE code = 'renamed-{code}'"
        ))
        .bind(code)
        .execute(&app.db_pool)
        .await?;
    }

    // restored lookups find the photos again
    let page = app.client.get_group_members("staff", Some("2")).await?;
    assert!(
        page.members
            .iter()
            .any(|m| m.user.photo_url == "https://example.com/x.png")
    );

    Ok(())
}

async fn assert_hidden(app: &test_helpers::TestApp, slug: &str) {
    match app.client.get_group_members(slug, None).await {
        Err(payloads::ClientError::APIError(code, text)) => {
            assert_eq!(code, StatusCode::NOT_FOUND);
            assert_eq!(text, "Not found");
        }
        _ => panic!("Expected APIError"),
    }
}

#[tokio::test]
async fn deleted_super_admin_loses_access() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let data = GroupDataset::create(&app).await?;
    app.client.get_group_members("staff", None).await?;

    // soft delete; the flag itself is still set
    sqlx::query("UPDATE users SET deleted_at = NOW() WHERE id = $1")
        .bind(data.alice_id)
        .execute(&app.db_pool)
        .await?;

    assert_hidden(&app, "staff").await;
    assert_hidden(&app, "nonexistent").await;

    Ok(())
}

#[tokio::test]
async fn session_for_missing_user_gets_not_found() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let data = GroupDataset::create(&app).await?;
    app.client.get_group_members("staff", None).await?;

    // the cookie now holds a user id that matches no row
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(data.alice_id)
        .execute(&app.db_pool)
        .await?;
    assert!(app.client.login_check().await?);

    assert_hidden(&app, "staff").await;

    Ok(())
}

#[tokio::test]
async fn new_member_shows_first() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let data = GroupDataset::create(&app).await?;

    let newcomer = app.create_member_user("newcomer").await?;
    app.add_member(&data.staff, &newcomer, "admin").await?;

    let page = app.client.get_group_members("staff", None).await?;
    assert_eq!(page.total_members, STAFF_MEMBER_COUNT as i64 + 1);
    assert_eq!(page.members[0].user_id, newcomer);
    assert_eq!(page.members[0].role.code, "admin");
    assert_eq!(page.members.len(), 25);

    Ok(())
}
