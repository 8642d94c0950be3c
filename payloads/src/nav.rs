//! Tab navigation shared by the group edit pages.

use serde::{Deserialize, Serialize};

const TAB_BASE_CLASSES: &str =
    "whitespace-nowrap py-4 px-1 border-b-2 font-medium text-sm";
const ACTIVE_TAB_CLASSES: &str = "border-indigo-500 text-indigo-600";
const INACTIVE_TAB_CLASSES: &str = "border-transparent text-gray-500 \
    hover:text-gray-700 hover:border-gray-300";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavTab {
    pub name: String,
    pub href: String,
    pub active: bool,
}

impl NavTab {
    fn new(name: &str, href: String, current_path: &str) -> Self {
        // exact match only; sub-paths of a tab do not highlight it
        let active = href == current_path;
        Self {
            name: name.to_string(),
            href,
            active,
        }
    }

    /// CSS classes for rendering this tab as a link.
    pub fn class(&self) -> String {
        let state = if self.active {
            ACTIVE_TAB_CLASSES
        } else {
            INACTIVE_TAB_CLASSES
        };
        format!("{TAB_BASE_CLASSES} {state}")
    }
}

/// Path of the "Edit Details" page for a group.
pub fn edit_group_path(slug: &str) -> String {
    format!("/admin/groups/{slug}/edit")
}

/// Path of the "Manage Members" page for a group.
pub fn group_members_path(slug: &str) -> String {
    format!("/admin/groups/{slug}/edit/members")
}

/// The tabs shown above the group edit pages, in display order.
pub fn edit_group_tabs(slug: &str, current_path: &str) -> [NavTab; 2] {
    [
        NavTab::new("Edit Details", edit_group_path(slug), current_path),
        NavTab::new("Manage Members", group_members_path(slug), current_path),
    ]
}
