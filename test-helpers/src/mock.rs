//! Mock data for group admin testing
//!
//! Builds a small but realistic set of groups:
//! - `global-admin` (seeded by the migrations) with alice as admin
//! - `staff`, with more members than fit on one page, some with photos
//! - `empty`, with no members at all

use crate::TestApp;
use anyhow::Result;
use payloads::{UserId, responses::Group};

/// Members in the staff group; enough for two pages.
pub const STAFF_MEMBER_COUNT: usize = 30;

pub struct GroupDataset {
    pub alice_id: UserId,
    pub global_admin: Group,
    pub staff: Group,
    pub empty: Group,
    /// Staff member ids, oldest membership first.
    pub staff_member_ids: Vec<UserId>,
}

impl GroupDataset {
    /// Create the dataset and leave alice (a super admin) logged in.
    #[cfg(feature = "mock-time")]
    pub async fn create(app: &TestApp) -> Result<Self> {
        let alice_id = app.create_alice_admin().await?;

        let global_admin = api::store::get_group_by_slug(
            payloads::GLOBAL_ADMIN_GROUP_SLUG,
            &app.db_pool,
        )
        .await?;
        app.add_member(&global_admin, &alice_id, "admin").await?;

        tracing::info!(
            "Creating staff group with {STAFF_MEMBER_COUNT} members"
        );
        let staff = app.create_group("staff", "Staff").await?;
        let staff_member_ids =
            app.add_members(&staff, "staff", STAFF_MEMBER_COUNT).await?;

        // a mix of absolute urls, storage keys and no photo at all
        app.add_user_photo(&staff_member_ids[0], "https://example.com/x.png")
            .await?;
        app.add_user_photo(&staff_member_ids[1], "avatars/staff1.png")
            .await?;

        let empty = app.create_group("empty", "Empty").await?;

        tracing::info!("Group dataset created");

        Ok(GroupDataset {
            alice_id,
            global_admin,
            staff,
            empty,
            staff_member_ids,
        })
    }

    /// Staff member ids in the order the members page lists them.
    pub fn staff_ids_newest_first(&self) -> Vec<UserId> {
        self.staff_member_ids.iter().rev().copied().collect()
    }
}
