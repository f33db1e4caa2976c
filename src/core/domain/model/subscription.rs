//! Domain model for Azure subscriptions.

use serde::{Deserialize, Serialize};

/// An Azure subscription the signed-in account has access to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// The subscription identifier (a GUID).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether the user selected this subscription for display.
    #[serde(default = "default_selected")]
    pub selected: bool,
    /// Directory (tenant) the subscription belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

fn default_selected() -> bool {
    true
}

impl Subscription {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            selected: true,
            tenant_id: None,
        }
    }
}
