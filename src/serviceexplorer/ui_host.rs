//! Presentation boundary of the explorer tree.

use crate::core::domain::config::ExplorerConfig;
use crate::core::domain::error::{ExplorerError, ExplorerResult};
use crate::serviceexplorer::node::Node;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{error, info, trace};

/// Title used for prompts and error dialogs raised by the tree.
pub const SERVICE_EXPLORER_TITLE: &str = "Service Explorer";

/// Receives tree notifications and user interaction requests.
///
/// Notifications may arrive from any background task; a host with a single
/// UI thread is expected to marshal them onto it. Implementations must not
/// block: reading node state (names, children, loading flags) from inside a
/// notification is allowed.
#[async_trait]
pub trait UiHost: Send + Sync {
    /// The list of children of `node` changed.
    fn structure_changed(&self, node: &Node);

    /// The label, icon or loading state of `node` changed.
    fn node_changed(&self, node: &Node);

    /// Reports a failure to the user.
    fn show_error(&self, title: &str, message: &str, error: &ExplorerError);

    /// Asks the user a yes/no question.
    async fn confirm(&self, title: &str, message: &str) -> bool;

    /// Hands a downloaded file to the user.
    async fn save_file(&self, suggested_name: &str, contents: Vec<u8>) -> ExplorerResult<()>;
}

/// Headless host that logs notifications and writes files to a directory.
#[derive(Debug, Clone)]
pub struct TracingUiHost {
    auto_confirm: bool,
    download_dir: PathBuf,
}

impl TracingUiHost {
    pub fn new(auto_confirm: bool, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            auto_confirm,
            download_dir: download_dir.into(),
        }
    }

    pub fn from_config(config: &ExplorerConfig) -> Self {
        Self::new(config.auto_confirm, config.download_dir.clone())
    }
}

#[async_trait]
impl UiHost for TracingUiHost {
    fn structure_changed(&self, node: &Node) {
        trace!(node = %node.id(), children = node.child_count(), "structure changed");
    }

    fn node_changed(&self, node: &Node) {
        trace!(node = %node.id(), name = %node.display_name(), "node changed");
    }

    fn show_error(&self, title: &str, message: &str, err: &ExplorerError) {
        error!(title, error = %err, log = err.error_log().unwrap_or_default(), "{}", message);
    }

    async fn confirm(&self, title: &str, message: &str) -> bool {
        info!(title, answer = self.auto_confirm, "{}", message);
        self.auto_confirm
    }

    async fn save_file(&self, suggested_name: &str, contents: Vec<u8>) -> ExplorerResult<()> {
        let path = self.download_dir.join(suggested_name);
        tokio::fs::write(&path, contents).await.map_err(|e| {
            ExplorerError::remote_with_log(
                format!("Unable to save {}", path.display()),
                e.to_string(),
            )
        })?;
        info!(path = %path.display(), "file saved");
        Ok(())
    }
}
