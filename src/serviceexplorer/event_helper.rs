//! Remote work that a "subscriptions changed" notification interrupts.
//!
//! [`run_interruptible`] registers a wait handle, runs the handler's action and
//! abandons it as soon as the handle is signalled. Long-running refreshes check
//! [`EventState::is_event_triggered`] between remote calls so they can stop
//! early on their own.

use crate::core::domain::error::ExplorerResult;
use crate::core::infrastructure::event_hub::EventWaitHandle;
use crate::serviceexplorer::node::Node;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;
use tracing::{debug, warn};

/// Whether the event raced by [`run_interruptible`] has fired.
#[derive(Debug, Default)]
pub struct EventState {
    triggered: AtomicBool,
    notify: Notify,
}

impl EventState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_event_triggered(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }

    pub(crate) fn trigger(&self) {
        self.triggered.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    async fn triggered(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_event_triggered() {
                return;
            }
            notified.await;
        }
    }
}

/// The pieces [`run_interruptible`] combines.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn register_event(&self) -> ExplorerResult<EventWaitHandle>;

    async fn unregister_event(&self, handle: &EventWaitHandle) -> ExplorerResult<()>;

    /// The work to abandon if the event fires first.
    async fn interruptible_action(&self, state: &EventState) -> ExplorerResult<()>;

    /// Runs after `interruptible_action` succeeded without interruption.
    async fn completed_action(&self) -> ExplorerResult<()> {
        Ok(())
    }
}

/// Runs `handler`'s action unless its event fires first.
///
/// The registration is always dropped before returning. When the event fired,
/// the action's result is discarded and `Ok(())` is returned.
///
/// # Errors
///
/// Fails if the registration fails, if the action fails without being
/// interrupted, or if the completion action fails.
pub async fn run_interruptible(handler: &dyn EventHandler) -> ExplorerResult<()> {
    let handle = handler.register_event().await?;
    let state = Arc::new(EventState::new());

    let watcher = {
        let handle = handle.clone();
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if handle.wait_event().await.is_ok() {
                state.trigger();
            }
        })
    };

    let result = tokio::select! {
        biased;
        () = state.triggered() => None,
        result = handler.interruptible_action(&state) => Some(result),
    };

    if let Err(err) = handler.unregister_event(&handle).await {
        warn!(handle = handle.id(), error = %err, "failed to unregister event handle");
    }
    watcher.abort();

    if state.is_event_triggered() {
        debug!(handle = handle.id(), "interrupted by event");
        return Ok(());
    }

    match result {
        Some(Err(err)) => Err(err),
        _ => handler.completed_action().await,
    }
}

/// Refresh logic that must stop when the selected subscriptions change.
#[async_trait]
pub trait AzureRefresh: Send + Sync {
    async fn refresh(&self, node: &Arc<Node>, state: &EventState) -> ExplorerResult<()>;
}

struct SubscriptionsChangedRefresh<'a> {
    node: &'a Arc<Node>,
    refresh: &'a dyn AzureRefresh,
}

#[async_trait]
impl<'a> EventHandler for SubscriptionsChangedRefresh<'a> {
    async fn register_event(&self) -> ExplorerResult<EventWaitHandle> {
        self.node
            .context()
            .azure()
            .register_subscriptions_changed()
            .await
    }

    async fn unregister_event(&self, handle: &EventWaitHandle) -> ExplorerResult<()> {
        self.node
            .context()
            .azure()
            .unregister_subscriptions_changed(handle)
            .await
    }

    async fn interruptible_action(&self, state: &EventState) -> ExplorerResult<()> {
        self.refresh.refresh(self.node, state).await
    }
}

/// Runs `refresh` for `node`, abandoning it if the subscriptions change.
pub async fn refresh_interruptibly(
    node: &Arc<Node>,
    refresh: &dyn AzureRefresh,
) -> ExplorerResult<()> {
    run_interruptible(&SubscriptionsChangedRefresh { node, refresh }).await
}
