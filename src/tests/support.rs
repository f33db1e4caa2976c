use crate::core::infrastructure::azure_manager::MockAzureManager;
use crate::{
    ExplorerConfig, ExplorerContext, ExplorerError, ExplorerResult, Node, NodeBehavior,
    SubscriptionsChangedHub, UiHost,
};
use async_trait::async_trait;
use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// UI host that records everything the tree tells it.
#[derive(Default)]
pub(crate) struct RecordingUiHost {
    answer: AtomicBool,
    structure_changes: Mutex<Vec<String>>,
    errors: Mutex<Vec<(String, String)>>,
    prompts: Mutex<Vec<String>>,
    saved: Mutex<Vec<(String, Vec<u8>)>>,
}

impl RecordingUiHost {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn confirming() -> Arc<Self> {
        let host = Self::default();
        host.answer.store(true, Ordering::SeqCst);
        Arc::new(host)
    }

    pub(crate) fn structure_changes(&self, id: &str) -> usize {
        self.structure_changes
            .lock()
            .unwrap()
            .iter()
            .filter(|changed| changed.as_str() == id)
            .count()
    }

    pub(crate) fn errors(&self) -> Vec<(String, String)> {
        self.errors.lock().unwrap().clone()
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub(crate) fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl UiHost for RecordingUiHost {
    fn structure_changed(&self, node: &Node) {
        self.structure_changes
            .lock()
            .unwrap()
            .push(node.id().to_string());
    }

    fn node_changed(&self, _node: &Node) {}

    fn show_error(&self, title: &str, message: &str, _error: &ExplorerError) {
        self.errors
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
    }

    async fn confirm(&self, _title: &str, message: &str) -> bool {
        self.prompts.lock().unwrap().push(message.to_string());
        self.answer.load(Ordering::SeqCst)
    }

    async fn save_file(&self, suggested_name: &str, contents: Vec<u8>) -> ExplorerResult<()> {
        self.saved
            .lock()
            .unwrap()
            .push((suggested_name.to_string(), contents));
        Ok(())
    }
}

pub(crate) fn context(azure: MockAzureManager, ui: Arc<RecordingUiHost>) -> ExplorerContext {
    context_with_config(azure, ui, ExplorerConfig::default())
}

pub(crate) fn context_with_config(
    azure: MockAzureManager,
    ui: Arc<RecordingUiHost>,
    config: ExplorerConfig,
) -> ExplorerContext {
    ExplorerContext::builder()
        .azure(Arc::new(azure))
        .ui(ui)
        .config(config)
        .build()
        .unwrap()
}

/// Routes the subscription-change registration calls of `azure` to `hub`.
pub(crate) fn route_subscription_events(azure: &mut MockAzureManager, hub: &Arc<SubscriptionsChangedHub>) {
    let registry = Arc::clone(hub);
    azure
        .expect_register_subscriptions_changed()
        .returning(move || Ok(registry.register()));
    let registry = Arc::clone(hub);
    azure
        .expect_unregister_subscriptions_changed()
        .returning(move |handle| registry.unregister(handle));
}

/// Polls `condition` until it holds, failing the test after five seconds.
pub(crate) async fn eventually(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached within five seconds");
}

/// Refresh that blocks until the test opens the gate.
pub(crate) struct GatedRefresh {
    pub(crate) calls: AtomicUsize,
    gate: Semaphore,
}

impl GatedRefresh {
    pub(crate) fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            gate: Semaphore::new(0),
        }
    }

    pub(crate) fn open(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl NodeBehavior for GatedRefresh {
    async fn refresh_items(&self, _node: &Arc<Node>) -> ExplorerResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| ExplorerError::Task(e.to_string()))?;
        permit.forget();
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Refresh that tears the children down and then fails.
#[derive(Default)]
pub(crate) struct FailingRefresh {
    pub(crate) calls: AtomicUsize,
}

#[async_trait]
impl NodeBehavior for FailingRefresh {
    async fn refresh_items(&self, node: &Arc<Node>) -> ExplorerResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        node.remove_all_child_nodes();
        Err(ExplorerError::remote_with_log("Unable to list resources", "HTTP 503"))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Refresh that only counts its calls.
#[derive(Default)]
pub(crate) struct CountingRefresh {
    pub(crate) calls: AtomicUsize,
    pub(crate) clicks: AtomicUsize,
}

#[async_trait]
impl NodeBehavior for CountingRefresh {
    async fn refresh_items(&self, _node: &Arc<Node>) -> ExplorerResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn on_click(&self, _node: &Arc<Node>) {
        self.clicks.fetch_add(1, Ordering::SeqCst);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
