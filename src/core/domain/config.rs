//! Runtime configuration for the explorer tree.

use crate::core::domain::{
    error::{ExplorerResult, ValidationError},
    model::storage::ClientStorageAccount,
    value_object::{Port, validate_node_id},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings consulted by nodes and actions.
///
/// The configuration is usually persisted by the host as JSON and loaded with
/// [`ExplorerConfig::from_file`]; every field has a default so partial files
/// are accepted.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Reload the whole tree when the set of subscriptions changes.
    pub watch_subscriptions: bool,
    /// Release compute resources (and the VIP) when shutting a VM down.
    pub shutdown_deallocates: bool,
    /// Remove the OS and data disks from storage when deleting a VM.
    pub delete_vm_disks: bool,
    /// Private port that marks an endpoint as Remote Desktop.
    pub rdp_port: Port,
    /// Directory where downloaded files (e.g. `.rdp`) are written by the default host.
    pub download_dir: PathBuf,
    /// Answer given to confirmation prompts by hosts without a user.
    pub auto_confirm: bool,
    /// Storage accounts attached by connection string rather than discovered.
    pub external_storage_accounts: Vec<ClientStorageAccount>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            watch_subscriptions: true,
            shutdown_deallocates: true,
            delete_vm_disks: false,
            rdp_port: Port::REMOTE_DESKTOP,
            download_dir: std::env::temp_dir(),
            auto_confirm: false,
            external_storage_accounts: Vec::new(),
        }
    }
}

impl ExplorerConfig {
    /// Creates a new builder for ExplorerConfig
    pub fn builder() -> ExplorerConfigBuilder {
        ExplorerConfigBuilder::default()
    }

    /// Loads and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// This method will return an error if:
    /// - The file cannot be read
    /// - The content is not valid JSON for this structure
    /// - A field violates its validation rules
    pub async fn from_file(path: impl AsRef<Path>) -> ExplorerResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            ValidationError::Field {
                field: "config".to_string(),
                message: format!("Unable to read {}: {}", path.display(), e),
            }
        })?;

        let config: ExplorerConfig = serde_json::from_str(&content)
            .map_err(|e| ValidationError::Format(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field rules that serde cannot express.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.download_dir.as_os_str().is_empty() {
            return Err(ValidationError::Field {
                field: "download_dir".to_string(),
                message: "Download directory cannot be empty".to_string(),
            });
        }

        let mut names = std::collections::HashSet::new();
        for account in &self.external_storage_accounts {
            validate_node_id(&account.name)?;
            if !names.insert(account.name.as_str()) {
                return Err(ValidationError::ConstraintViolation(format!(
                    "External storage account '{}' is attached more than once",
                    account.name
                )));
            }
        }
        Ok(())
    }
}

/// Builder for ExplorerConfig
#[derive(Debug, Default)]
pub struct ExplorerConfigBuilder {
    watch_subscriptions: Option<bool>,
    shutdown_deallocates: Option<bool>,
    delete_vm_disks: Option<bool>,
    rdp_port: Option<u16>,
    download_dir: Option<PathBuf>,
    auto_confirm: Option<bool>,
    external_storage_accounts: Vec<ClientStorageAccount>,
}

impl ExplorerConfigBuilder {
    pub fn watch_subscriptions(mut self, watch: bool) -> Self {
        self.watch_subscriptions = Some(watch);
        self
    }

    pub fn shutdown_deallocates(mut self, deallocate: bool) -> Self {
        self.shutdown_deallocates = Some(deallocate);
        self
    }

    pub fn delete_vm_disks(mut self, delete: bool) -> Self {
        self.delete_vm_disks = Some(delete);
        self
    }

    pub fn rdp_port(mut self, port: u16) -> Self {
        self.rdp_port = Some(port);
        self
    }

    pub fn download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = Some(dir.into());
        self
    }

    pub fn auto_confirm(mut self, confirm: bool) -> Self {
        self.auto_confirm = Some(confirm);
        self
    }

    pub fn external_storage_account(mut self, account: ClientStorageAccount) -> Self {
        self.external_storage_accounts.push(account);
        self
    }

    pub fn build(self) -> ExplorerResult<ExplorerConfig> {
        let defaults = ExplorerConfig::default();
        let rdp_port = match self.rdp_port {
            Some(port) => Port::new(port)?,
            None => defaults.rdp_port,
        };

        let config = ExplorerConfig {
            watch_subscriptions: self
                .watch_subscriptions
                .unwrap_or(defaults.watch_subscriptions),
            shutdown_deallocates: self
                .shutdown_deallocates
                .unwrap_or(defaults.shutdown_deallocates),
            delete_vm_disks: self.delete_vm_disks.unwrap_or(defaults.delete_vm_disks),
            rdp_port,
            download_dir: self.download_dir.unwrap_or(defaults.download_dir),
            auto_confirm: self.auto_confirm.unwrap_or(defaults.auto_confirm),
            external_storage_accounts: self.external_storage_accounts,
        };
        config.validate()?;
        Ok(config)
    }
}
