mod core;
mod serviceexplorer;

#[cfg(test)]
mod tests;

pub use crate::core::domain::config::{ExplorerConfig, ExplorerConfigBuilder};
pub use crate::core::domain::error::{ExplorerError, ExplorerResult, ValidationError};
pub use crate::core::domain::model::{
    mobile_service::{CustomApi, MobileService, MobileTable, ScheduledJob},
    storage::{
        BlobContainer, ClientStorageAccount, Queue, StorageAccount, StorageAccountType,
        StorageTable,
    },
    subscription::Subscription,
    vm::{Endpoint, VirtualMachine, VmStatus},
};
pub use crate::core::domain::value_object::{NodeId, Port};
pub use crate::core::infrastructure::azure_manager::AzureManager;
pub use crate::core::infrastructure::event_hub::{EventWaitHandle, SubscriptionsChangedHub};
pub use crate::serviceexplorer::azure::{
    AzureServiceModule, DELETE_ACTION, ItemNode,
    mobile_service::{self, MobileServiceModule, MobileServiceNode},
    service_module::{AzureServiceBehavior, compose_name},
    storage::{self, ClientStorageNode, StorageItemKind, StorageItemsModule, StorageModule, StorageSource},
    vm::{self, VmEndpointNode, VmNode, VmPowerAction, VmServiceModule},
};
pub use crate::serviceexplorer::event_helper::{
    AzureRefresh, EventHandler, EventState, refresh_interruptibly, run_interruptible,
};
pub use crate::serviceexplorer::node::{
    Leaf, LoadOutcome, LoadingGuard, Node, NodeBehavior, NodeBuilder, REFRESH_ACTION,
};
pub use crate::serviceexplorer::node_action::{
    ActionOutcome, ActionTask, NodeAction, NodeActionEvent, NodeActionListener, RefreshAction,
    set_action_enabled,
};
pub use crate::serviceexplorer::ui_host::{SERVICE_EXPLORER_TITLE, TracingUiHost, UiHost};

use std::sync::Arc;

/// Everything a node needs to reach the outside world.
///
/// The context is cloned into every node of the tree, so two trees built from
/// different contexts are fully independent.
///
/// # Examples
///
/// ```no_run
/// use service_explorer::{AzureManager, AzureServiceModule, ExplorerConfig, ExplorerContext, ExplorerResult};
/// use std::sync::Arc;
///
/// async fn open(azure: Arc<dyn AzureManager>) -> ExplorerResult<AzureServiceModule> {
///     let config = ExplorerConfig::from_file("explorer.json").await?;
///     let context = ExplorerContext::builder()
///         .azure(azure)
///         .config(config)
///         .build()?;
///
///     let module = AzureServiceModule::new(&context);
///     module.load().await;
///     Ok(module)
/// }
/// ```
#[derive(Clone)]
pub struct ExplorerContext {
    azure: Arc<dyn AzureManager>,
    ui: Arc<dyn UiHost>,
    config: Arc<ExplorerConfig>,
}

/// Builder for ExplorerContext
#[derive(Default)]
pub struct ExplorerContextBuilder {
    azure: Option<Arc<dyn AzureManager>>,
    ui: Option<Arc<dyn UiHost>>,
    config: Option<ExplorerConfig>,
}

impl ExplorerContextBuilder {
    pub fn azure(mut self, azure: Arc<dyn AzureManager>) -> Self {
        self.azure = Some(azure);
        self
    }

    pub fn ui(mut self, ui: Arc<dyn UiHost>) -> Self {
        self.ui = Some(ui);
        self
    }

    pub fn config(mut self, config: ExplorerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the context. Without a UI host, a [`TracingUiHost`] configured
    /// from the configuration is used.
    ///
    /// # Errors
    ///
    /// Returns a validation error if no Azure manager was given or the
    /// configuration is invalid.
    pub fn build(self) -> ExplorerResult<ExplorerContext> {
        let azure = self.azure.ok_or_else(|| ValidationError::Field {
            field: "azure".to_string(),
            message: "An Azure manager is required".to_string(),
        })?;

        let config = self.config.unwrap_or_default();
        config.validate()?;

        let ui = match self.ui {
            Some(ui) => ui,
            None => Arc::new(TracingUiHost::from_config(&config)),
        };

        Ok(ExplorerContext {
            azure,
            ui,
            config: Arc::new(config),
        })
    }
}

impl ExplorerContext {
    /// Creates a new builder for ExplorerContext
    pub fn builder() -> ExplorerContextBuilder {
        ExplorerContextBuilder::default()
    }

    pub fn azure(&self) -> &Arc<dyn AzureManager> {
        &self.azure
    }

    pub fn ui(&self) -> &Arc<dyn UiHost> {
        &self.ui
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }
}

impl std::fmt::Debug for ExplorerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplorerContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
