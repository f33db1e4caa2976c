//! Storage accounts, discovered per subscription or attached by configuration.

mod storage_node;

pub use storage_node::{
    ACTION_DETACH, BLOBS, ClientStorageNode, QUEUES, StorageItemKind, StorageItemsModule,
    StorageSource, TABLES,
};

use crate::core::domain::error::ExplorerResult;
use crate::serviceexplorer::event_helper::{AzureRefresh, EventState, refresh_interruptibly};
use crate::serviceexplorer::node::{Node, NodeBehavior};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

pub const STORAGE_MODULE_ID: &str = "storage";
const BASE_MODULE_NAME: &str = "Storage";
const ICON_PATH: &str = "storage.png";

/// Lists the Standard storage accounts of every subscription followed by the
/// external accounts from the configuration.
#[derive(Debug, Default)]
pub struct StorageModule;

impl StorageModule {
    pub fn create(parent: &Arc<Node>) -> Arc<Node> {
        Node::builder(STORAGE_MODULE_ID, BASE_MODULE_NAME)
            .icon(ICON_PATH)
            .parent(parent)
            .behavior(Arc::new(StorageModule))
            .refreshable()
            .build(parent.context())
    }
}

#[async_trait]
impl AzureRefresh for StorageModule {
    async fn refresh(&self, node: &Arc<Node>, state: &EventState) -> ExplorerResult<()> {
        let context = node.context();
        let azure = context.azure();

        let mut sources = Vec::new();
        for subscription in azure.subscription_list().await? {
            let accounts = azure.storage_accounts(&subscription.id).await?;
            if state.is_event_triggered() {
                return Ok(());
            }

            let listed = accounts.len();
            sources.extend(
                accounts
                    .into_iter()
                    .filter(|account| account.account_type.is_standard())
                    .map(StorageSource::Subscription),
            );
            debug!(subscription = %subscription.id, listed, "listed storage accounts");
        }
        sources.extend(
            context
                .config()
                .external_storage_accounts
                .iter()
                .cloned()
                .map(StorageSource::External),
        );

        node.reconcile_children(
            sources,
            StorageSource::node_id,
            |existing, source| match existing {
                Some(child) if child.behavior::<ClientStorageNode>().is_some() => {
                    ClientStorageNode::update(&child, source);
                    child
                }
                _ => ClientStorageNode::create(node, source),
            },
        );
        Ok(())
    }
}

#[async_trait]
impl NodeBehavior for StorageModule {
    async fn refresh_items(&self, node: &Arc<Node>) -> ExplorerResult<()> {
        refresh_interruptibly(node, self).await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
