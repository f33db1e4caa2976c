use crate::core::domain::error::{ExplorerError, ExplorerResult};
use crate::core::domain::model::storage::{ClientStorageAccount, StorageAccount};
use crate::core::sync::{read, write};
use crate::serviceexplorer::azure::{DELETE_ACTION, ItemNode};
use crate::serviceexplorer::event_helper::{AzureRefresh, EventState, refresh_interruptibly};
use crate::serviceexplorer::node::{Node, NodeBehavior};
use crate::serviceexplorer::node_action::{ActionTask, NodeActionEvent, NodeActionListener};
use async_trait::async_trait;
use futures::future::join_all;
use std::any::Any;
use std::sync::{Arc, RwLock};
use tracing::info;

pub const BLOBS: &str = "Blobs";
pub const QUEUES: &str = "Queues";
pub const TABLES: &str = "Tables";

/// Removes an external account from the tree.
pub const ACTION_DETACH: &str = "Detach";

const STORAGE_ICON_PATH: &str = "storageaccount.png";
const EXTERNAL_ICON_PATH: &str = "externalstorageaccount.png";
const CONTAINER_ICON_PATH: &str = "container.png";

/// Where a storage account shown in the tree comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageSource {
    /// Listed from a subscription.
    Subscription(StorageAccount),
    /// Attached through the configuration.
    External(ClientStorageAccount),
}

impl StorageSource {
    pub fn client(&self) -> &ClientStorageAccount {
        match self {
            StorageSource::Subscription(account) => &account.client,
            StorageSource::External(account) => account,
        }
    }

    pub fn node_id(&self) -> String {
        match self {
            StorageSource::Subscription(account) => {
                format!("{}/{}", account.subscription_id, account.name())
            }
            StorageSource::External(account) => format!("external:{}", account.name),
        }
    }
}

/// A storage account, with "Blobs", "Queues" and "Tables" children.
#[derive(Debug)]
pub struct ClientStorageNode {
    source: RwLock<StorageSource>,
}

impl ClientStorageNode {
    pub fn create(parent: &Arc<Node>, source: StorageSource) -> Arc<Node> {
        let builder = Node::builder(source.node_id(), source.client().name.clone())
            .parent(parent)
            .refreshable();
        let builder = match &source {
            StorageSource::Subscription(_) => builder
                .icon(STORAGE_ICON_PATH)
                .action(DELETE_ACTION, Arc::new(DeleteStorageAccountAction)),
            StorageSource::External(_) => builder
                .icon(EXTERNAL_ICON_PATH)
                .action(ACTION_DETACH, Arc::new(DetachAction)),
        };

        builder
            .behavior(Arc::new(ClientStorageNode {
                source: RwLock::new(source),
            }))
            .build(parent.context())
    }

    pub fn source(&self) -> StorageSource {
        read(&self.source).clone()
    }

    /// Replaces the cached account of `node` and hands its credentials to the
    /// existing item groups.
    pub fn update(node: &Arc<Node>, source: StorageSource) {
        node.set_name(source.client().name.clone());
        for group in node.child_nodes() {
            if let Some(items) = group.behavior::<StorageItemsModule>() {
                items.set_account(source.client().clone());
            }
        }
        if let Some(behavior) = node.behavior::<ClientStorageNode>() {
            *write(&behavior.source) = source;
        }
    }
}

#[async_trait]
impl AzureRefresh for ClientStorageNode {
    async fn refresh(&self, node: &Arc<Node>, state: &EventState) -> ExplorerResult<()> {
        let source = self.source();
        let account = source.client();
        if let StorageSource::External(account) = &source {
            if account.primary_key.is_empty() {
                return Err(ExplorerError::InvalidNode(format!(
                    "No access key is configured for external storage account {}",
                    account.name
                )));
            }
        }

        let mut groups = Vec::new();
        for kind in [StorageItemKind::Blobs, StorageItemKind::Queues, StorageItemKind::Tables] {
            if state.is_event_triggered() {
                return Ok(());
            }
            let group = StorageItemsModule::create(node, kind, account.clone());
            node.add_child_node(Arc::clone(&group));
            groups.push(group);
        }

        join_all(groups.iter().map(|group| group.load())).await;
        Ok(())
    }
}

#[async_trait]
impl NodeBehavior for ClientStorageNode {
    async fn refresh_items(&self, node: &Arc<Node>) -> ExplorerResult<()> {
        refresh_interruptibly(node, self).await
    }

    async fn on_click(&self, node: &Arc<Node>) {
        node.load().await;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The kind of items a [`StorageItemsModule`] lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageItemKind {
    Blobs,
    Queues,
    Tables,
}

impl StorageItemKind {
    pub fn display_name(self) -> &'static str {
        match self {
            StorageItemKind::Blobs => BLOBS,
            StorageItemKind::Queues => QUEUES,
            StorageItemKind::Tables => TABLES,
        }
    }
}

/// Lists the blob containers, queues or tables of one account.
#[derive(Debug)]
pub struct StorageItemsModule {
    kind: StorageItemKind,
    account: RwLock<ClientStorageAccount>,
}

impl StorageItemsModule {
    /// Returns the existing group of `kind` under `parent`, pointed at
    /// `account`, or a new one.
    pub fn create(
        parent: &Arc<Node>,
        kind: StorageItemKind,
        account: ClientStorageAccount,
    ) -> Arc<Node> {
        let id = format!("{}{}", kind.display_name(), account.name);
        if let Some(existing) = parent.find_child_by_id(&id) {
            if let Some(items) = existing.behavior::<StorageItemsModule>() {
                items.set_account(account);
            }
            return existing;
        }

        Node::builder(id, kind.display_name())
            .parent(parent)
            .behavior(Arc::new(StorageItemsModule {
                kind,
                account: RwLock::new(account),
            }))
            .refreshable()
            .build(parent.context())
    }

    pub fn kind(&self) -> StorageItemKind {
        self.kind
    }

    pub fn account(&self) -> ClientStorageAccount {
        read(&self.account).clone()
    }

    fn set_account(&self, account: ClientStorageAccount) {
        *write(&self.account) = account;
    }
}

#[async_trait]
impl NodeBehavior for StorageItemsModule {
    async fn refresh_items(&self, node: &Arc<Node>) -> ExplorerResult<()> {
        let azure = node.context().azure();
        let account = self.account();
        let children: Vec<Arc<Node>> = match self.kind {
            StorageItemKind::Blobs => azure
                .blob_containers(&account)
                .await?
                .into_iter()
                .map(|item| item_node(node, item.name.clone(), item))
                .collect(),
            StorageItemKind::Queues => azure
                .queues(&account)
                .await?
                .into_iter()
                .map(|item| item_node(node, item.name.clone(), item))
                .collect(),
            StorageItemKind::Tables => azure
                .storage_tables(&account)
                .await?
                .into_iter()
                .map(|item| item_node(node, item.name.clone(), item))
                .collect(),
        };
        node.replace_child_nodes(children);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn item_node<T: Send + Sync + 'static>(parent: &Arc<Node>, name: String, item: T) -> Arc<Node> {
    ItemNode::create(parent, name.clone(), name, CONTAINER_ICON_PATH, item)
}

struct DeleteStorageAccountAction;

impl NodeActionListener for DeleteStorageAccountAction {
    fn prompt(&self, event: &NodeActionEvent) -> Option<String> {
        Some(format!(
            "This operation will delete storage account {}.\nAre you sure you want to continue?",
            event.node.name()
        ))
    }

    fn action_performed_async(self: Arc<Self>, event: NodeActionEvent) -> ActionTask {
        ActionTask::spawn(async move {
            let source = event
                .node
                .behavior::<ClientStorageNode>()
                .map(ClientStorageNode::source);
            let Some(StorageSource::Subscription(account)) = source else {
                return Err(ExplorerError::InvalidNode(format!(
                    "{} is not a subscription storage account",
                    event.node.id()
                )));
            };

            event
                .node
                .context()
                .azure()
                .delete_storage_account(&account)
                .await?;
            info!(account = %account.name(), "storage account deleted");

            if let Some(parent) = event.node.parent() {
                parent.remove_direct_child_node(&event.node);
            }
            Ok(())
        })
    }
}

struct DetachAction;

impl NodeActionListener for DetachAction {
    fn prompt(&self, event: &NodeActionEvent) -> Option<String> {
        Some(format!(
            "This operation will detach external storage account {}.\nAre you sure you want to continue?",
            event.node.name()
        ))
    }

    fn action_performed(&self, event: &NodeActionEvent) -> ExplorerResult<()> {
        if let Some(parent) = event.node.parent() {
            parent.remove_direct_child_node(&event.node);
        }
        info!(account = %event.node.name(), "external storage account detached");
        Ok(())
    }
}
