//! Root of the Azure tree and its subscription watch.

use crate::ExplorerContext;
use crate::core::domain::error::ExplorerResult;
use crate::core::domain::model::subscription::Subscription;
use crate::core::infrastructure::event_hub::EventWaitHandle;
use crate::core::sync::lock;
use crate::serviceexplorer::azure::mobile_service::MobileServiceModule;
use crate::serviceexplorer::azure::storage::StorageModule;
use crate::serviceexplorer::azure::vm::VmServiceModule;
use crate::serviceexplorer::node::{LoadOutcome, Node, NodeBehavior};
use async_trait::async_trait;
use futures::future::join_all;
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const AZURE_SERVICE_MODULE_ID: &str = "azure";
const BASE_MODULE_NAME: &str = "Azure";
const ICON_PATH: &str = "azure.png";

/// Label of the root node for the given subscriptions.
pub fn compose_name(subscriptions: &[Subscription]) -> String {
    let selected: Vec<&Subscription> = subscriptions.iter().filter(|s| s.selected).collect();
    match selected.as_slice() {
        [] => BASE_MODULE_NAME.to_string(),
        [only] => format!("{} ({})", BASE_MODULE_NAME, only.name),
        many => format!("{} ({} subscriptions)", BASE_MODULE_NAME, many.len()),
    }
}

/// Children of the root: the three service modules, created on first use.
#[derive(Debug, Default)]
pub struct AzureServiceBehavior {
    modules: Mutex<Option<Vec<Arc<Node>>>>,
}

impl AzureServiceBehavior {
    fn modules(&self, node: &Arc<Node>) -> Vec<Arc<Node>> {
        lock(&self.modules)
            .get_or_insert_with(|| {
                vec![
                    MobileServiceModule::create(node),
                    VmServiceModule::create(node),
                    StorageModule::create(node),
                ]
            })
            .clone()
    }

    /// Drops the module nodes so the next refresh builds fresh ones.
    pub fn reset_modules(&self) {
        *lock(&self.modules) = None;
    }
}

#[async_trait]
impl NodeBehavior for AzureServiceBehavior {
    async fn refresh_items(&self, node: &Arc<Node>) -> ExplorerResult<()> {
        match node.context().azure().subscription_list().await {
            Ok(subscriptions) => node.set_name(compose_name(&subscriptions)),
            Err(err) => {
                warn!(error = %err, "unable to read the subscription list");
                node.set_name(BASE_MODULE_NAME);
            }
        }

        let mut loads = Vec::new();
        for module in self.modules(node) {
            if module.is_loading() {
                continue;
            }
            if !node.is_direct_child(&module) {
                node.add_child_node(Arc::clone(&module));
            }
            loads.push(async move { module.load().await });
        }
        join_all(loads).await;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Default)]
struct WatchState {
    handle: Option<EventWaitHandle>,
    task: Option<JoinHandle<()>>,
}

/// The root node plus the background task that rebuilds it when the selected
/// subscriptions change.
///
/// Call [`unregister_subscriptions_changed`](Self::unregister_subscriptions_changed)
/// before dropping the module. Dropping a watching module only releases its
/// handle; the hub forgets released handles lazily, but the Azure manager is
/// never told about the unregistration.
///
/// # Examples
///
/// ```no_run
/// use service_explorer::{AzureServiceModule, ExplorerContext};
///
/// async fn show(context: ExplorerContext) -> service_explorer::ExplorerResult<()> {
///     let azure = AzureServiceModule::new(&context);
///     azure.load().await;
///     for module in azure.node().child_nodes() {
///         println!("{} ({} items)", module.display_name(), module.child_count());
///     }
///     azure.unregister_subscriptions_changed().await
/// }
/// ```
pub struct AzureServiceModule {
    node: Arc<Node>,
    watch: tokio::sync::Mutex<WatchState>,
    registered: Arc<AtomicBool>,
}

impl AzureServiceModule {
    pub fn new(context: &ExplorerContext) -> Self {
        let node = Node::builder(AZURE_SERVICE_MODULE_ID, BASE_MODULE_NAME)
            .icon(ICON_PATH)
            .behavior(Arc::new(AzureServiceBehavior::default()))
            .refreshable()
            .build(context);

        Self {
            node,
            watch: tokio::sync::Mutex::new(WatchState::default()),
            registered: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    /// Loads the tree, starting the subscription watch first if configured.
    pub async fn load(&self) -> LoadOutcome {
        if self.node.context().config().watch_subscriptions {
            if let Err(err) = self.register_subscriptions_changed().await {
                warn!(error = %err, "unable to watch subscription changes");
            }
        }
        self.node.load().await
    }

    pub fn is_watching(&self) -> bool {
        self.registered.load(Ordering::Acquire)
    }

    /// Starts reloading the tree whenever the selected subscriptions change.
    ///
    /// Calling this while already registered does nothing.
    ///
    /// # Errors
    ///
    /// Returns the error of the Azure registration call.
    pub async fn register_subscriptions_changed(&self) -> ExplorerResult<()> {
        let mut watch = self.watch.lock().await;
        if watch.handle.is_some() {
            return Ok(());
        }

        let handle = self
            .node
            .context()
            .azure()
            .register_subscriptions_changed()
            .await?;
        self.registered.store(true, Ordering::Release);

        let task = tokio::spawn(watch_subscriptions(
            Arc::downgrade(&self.node),
            Arc::clone(&self.registered),
            handle.clone(),
        ));
        watch.handle = Some(handle);
        watch.task = Some(task);
        Ok(())
    }

    /// Stops the watch and waits for its task to finish.
    ///
    /// The task is asked to stop first (flag cleared, handle signalled once) and
    /// awaited; a rebuild in progress completes before it exits. Only then is
    /// the handle unregistered from Azure and released.
    ///
    /// # Errors
    ///
    /// Returns the error of the Azure unregistration call; the local handle is
    /// released and the task stopped regardless.
    pub async fn unregister_subscriptions_changed(&self) -> ExplorerResult<()> {
        let mut watch = self.watch.lock().await;
        self.registered.store(false, Ordering::Release);
        let Some(handle) = watch.handle.take() else {
            return Ok(());
        };

        handle.signal();
        if let Some(task) = watch.task.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "subscription watch ended abnormally");
            }
        }

        let result = self
            .node
            .context()
            .azure()
            .unregister_subscriptions_changed(&handle)
            .await;
        handle.release();
        result
    }
}

impl Drop for AzureServiceModule {
    fn drop(&mut self) {
        self.registered.store(false, Ordering::Release);
        if let Ok(mut watch) = self.watch.try_lock() {
            if let Some(handle) = watch.handle.take() {
                handle.release();
            }
            if let Some(task) = watch.task.take() {
                task.abort();
            }
        }
    }
}

async fn watch_subscriptions(node: Weak<Node>, registered: Arc<AtomicBool>, handle: EventWaitHandle) {
    debug!(handle = handle.id(), "watching subscription changes");
    while handle.wait_event().await.is_ok() {
        if !registered.load(Ordering::Acquire) {
            break;
        }
        let Some(node) = node.upgrade() else {
            break;
        };

        info!("subscriptions changed, rebuilding the Azure tree");
        node.rebuild(|node| {
            node.remove_all_child_nodes();
            if let Some(behavior) = node.behavior::<AzureServiceBehavior>() {
                behavior.reset_modules();
            }
        })
        .await;
    }
    debug!(handle = handle.id(), "stopped watching subscription changes");
}
