//! Domain models for Mobile Services and the resources they host.

use serde::{Deserialize, Serialize};

/// A Mobile Service instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileService {
    pub name: String,
    pub subscription_id: String,
    /// Backend runtime; see [`MobileService::NODE_RUNTIME`] and [`MobileService::NET_RUNTIME`].
    pub runtime: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_url: Option<String>,
}

impl MobileService {
    pub const NODE_RUNTIME: &'static str = "JavaScript";
    pub const NET_RUNTIME: &'static str = ".NET Framework";

    pub fn new(
        name: impl Into<String>,
        subscription_id: impl Into<String>,
        runtime: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            subscription_id: subscription_id.into(),
            runtime: runtime.into(),
            region: String::new(),
            state: String::new(),
            app_url: None,
        }
    }

    /// Only JavaScript backends expose tables, custom APIs and jobs through the management API.
    pub fn is_node_runtime(&self) -> bool {
        self.runtime == Self::NODE_RUNTIME
    }
}

/// A data table of a Mobile Service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileTable {
    pub name: String,
    #[serde(default)]
    pub self_link: String,
}

/// A custom API script of a Mobile Service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomApi {
    pub name: String,
}

/// A scheduled job of a Mobile Service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledJob {
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    /// Interval between runs, in `interval_unit`s.
    #[serde(default)]
    pub interval: u32,
    #[serde(default)]
    pub interval_unit: String,
}
