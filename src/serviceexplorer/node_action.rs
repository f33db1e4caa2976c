//! User-invocable commands bound to a node.

use crate::core::domain::error::{ExplorerError, ExplorerResult};
use crate::serviceexplorer::node::Node;
use crate::serviceexplorer::ui_host::SERVICE_EXPLORER_TITLE;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use tracing::debug;

/// What a listener receives when its action fires.
#[derive(Debug, Clone)]
pub struct NodeActionEvent {
    pub node: Arc<Node>,
    pub action: String,
}

/// A running (or already finished) action body.
///
/// Awaiting the task yields the action's result; a panicked or cancelled
/// background task is reported as [`ExplorerError::Task`].
#[must_use = "an action task does nothing unless awaited"]
pub struct ActionTask {
    inner: Pin<Box<dyn Future<Output = ExplorerResult<()>> + Send>>,
}

impl ActionTask {
    /// A task that has already completed with `result`.
    pub fn ready(result: ExplorerResult<()>) -> Self {
        Self {
            inner: Box::pin(std::future::ready(result)),
        }
    }

    /// Runs `future` on the tokio runtime.
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ExplorerResult<()>> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        Self {
            inner: Box::pin(async move {
                handle
                    .await
                    .map_err(|e| ExplorerError::Task(e.to_string()))?
            }),
        }
    }
}

impl Future for ActionTask {
    type Output = ExplorerResult<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl fmt::Debug for ActionTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionTask").finish_non_exhaustive()
    }
}

/// Body of a [`NodeAction`].
///
/// Implement [`action_performed`](Self::action_performed) for quick local work,
/// or [`action_performed_async`](Self::action_performed_async) for remote calls.
pub trait NodeActionListener: Send + Sync + 'static {
    fn action_performed(&self, _event: &NodeActionEvent) -> ExplorerResult<()> {
        Ok(())
    }

    fn action_performed_async(self: Arc<Self>, event: NodeActionEvent) -> ActionTask {
        ActionTask::ready(self.action_performed(&event))
    }

    /// Confirmation question asked before the action runs.
    fn prompt(&self, _event: &NodeActionEvent) -> Option<String> {
        None
    }

    /// Whether the node shows as loading while the action runs.
    fn marks_loading(&self) -> bool {
        true
    }

    /// Runs once the action finished, whatever the result.
    fn after_action_performed(&self, _event: &NodeActionEvent, _result: &ExplorerResult<()>) {}
}

/// How a [`NodeAction::fire`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    /// A listener failed; the error has been reported.
    Failed,
    /// The user declined the confirmation prompt.
    Declined,
    /// The node was already loading or running another action.
    Busy,
    Disabled,
    /// The node the action belongs to no longer exists.
    Detached,
}

/// A named command on a node.
#[derive(Clone)]
pub struct NodeAction {
    name: String,
    enabled: bool,
    listeners: Vec<Arc<dyn NodeActionListener>>,
    node: Weak<Node>,
}

impl NodeAction {
    pub(crate) fn new(node: Weak<Node>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            listeners: Vec::new(),
            node,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enabled and the owning node is not busy.
    pub fn is_enabled(&self) -> bool {
        self.enabled && self.node.upgrade().is_some_and(|node| !node.is_loading())
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn add_listener(&mut self, listener: Arc<dyn NodeActionListener>) {
        self.listeners.push(listener);
    }

    pub fn node(&self) -> Option<Arc<Node>> {
        self.node.upgrade()
    }

    /// Runs the action's listeners in order.
    ///
    /// Prompts are asked first; a single "no" skips the whole action. While the
    /// listeners run the node is marked as loading, and the flag is cleared
    /// before `after_action_performed` hooks see the result. The first failing
    /// listener stops the chain and its error is shown through the UI host.
    pub async fn fire(&self) -> ActionOutcome {
        let Some(node) = self.node.upgrade() else {
            return ActionOutcome::Detached;
        };
        if !self.enabled {
            return ActionOutcome::Disabled;
        }
        if node.is_loading() {
            return ActionOutcome::Busy;
        }

        let event = NodeActionEvent {
            node: Arc::clone(&node),
            action: self.name.clone(),
        };

        for listener in &self.listeners {
            if let Some(message) = listener.prompt(&event) {
                let accepted = node
                    .context()
                    .ui()
                    .confirm(SERVICE_EXPLORER_TITLE, &message)
                    .await;
                if !accepted {
                    debug!(node = %node.id(), action = %self.name, "action declined");
                    return ActionOutcome::Declined;
                }
            }
        }

        let loading = if self.listeners.iter().any(|l| l.marks_loading()) {
            match node.try_begin_loading() {
                Some(guard) => Some(guard),
                None => return ActionOutcome::Busy,
            }
        } else {
            None
        };

        debug!(node = %node.id(), action = %self.name, "action fired");
        let mut result = Ok(());
        for listener in &self.listeners {
            result = Arc::clone(listener)
                .action_performed_async(event.clone())
                .await;
            if result.is_err() {
                break;
            }
        }
        drop(loading);

        for listener in &self.listeners {
            listener.after_action_performed(&event, &result);
        }

        match result {
            Ok(()) => ActionOutcome::Completed,
            Err(err) => {
                node.report_error(
                    &format!("Error {}", self.name),
                    &format!(
                        "An error occurred while attempting to {} {}.",
                        self.name.to_lowercase(),
                        node.name()
                    ),
                    &err,
                );
                ActionOutcome::Failed
            }
        }
    }
}

impl fmt::Debug for NodeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeAction")
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Sets the enabled flag of the action called `name`, if present.
pub fn set_action_enabled(actions: &mut [NodeAction], name: &str, enabled: bool) {
    if let Some(action) = actions.iter_mut().find(|a| a.name == name) {
        action.set_enabled(enabled);
    }
}

/// Listener behind the built-in "Refresh" action.
#[derive(Debug, Default)]
pub struct RefreshAction;

impl NodeActionListener for RefreshAction {
    fn action_performed_async(self: Arc<Self>, event: NodeActionEvent) -> ActionTask {
        ActionTask::spawn(async move {
            event.node.load().await;
            Ok(())
        })
    }

    fn marks_loading(&self) -> bool {
        false
    }
}
