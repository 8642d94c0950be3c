use reqwest::StatusCode;

use test_helpers::{assert_status_code, mock::GroupDataset, spawn_app};

#[tokio::test]
async fn super_admin_sees_details() -> anyhow::Result<()> {
    let app = spawn_app().await;
    let data = GroupDataset::create(&app).await?;

    let details = app.client.get_group_details("staff").await?;
    assert_eq!(details.group, data.staff);
    assert!(!details.is_global_admin_group);

    let active: Vec<&str> = details
        .tabs
        .iter()
        .filter(|t| t.active)
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(active, ["Edit Details"]);

    let details = app
        .client
        .get_group_details(payloads::GLOBAL_ADMIN_GROUP_SLUG)
        .await?;
    assert!(details.is_global_admin_group);
    assert_eq!(details.group, data.global_admin);

    Ok(())
}

#[tokio::test]
async fn details_hidden_from_others() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.create_group("staff", "Staff").await?;

    let result = app.client.get_group_details("staff").await;
    assert_status_code(result, StatusCode::NOT_FOUND);

    app.create_bob_user().await?;
    let result = app.client.get_group_details("staff").await;
    assert_status_code(result, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn details_unknown_group() -> anyhow::Result<()> {
    let app = spawn_app().await;
    app.create_alice_admin().await?;

    let result = app.client.get_group_details("nonexistent").await;
    assert_status_code(result, StatusCode::NOT_FOUND);

    Ok(())
}
