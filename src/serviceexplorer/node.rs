//! Tree vertices of the Service Explorer.
//!
//! A [`Node`] owns its ordered children, holds a weak reference to its parent
//! and delegates resource discovery to a pluggable [`NodeBehavior`]. Loading is
//! guarded: at most one refresh per node is in flight, and a failed refresh
//! leaves the children exactly as they were before the call.

use crate::ExplorerContext;
use crate::core::domain::error::{ExplorerError, ExplorerResult};
use crate::core::domain::value_object::NodeId;
use crate::core::sync::{read, write};
use crate::serviceexplorer::node_action::{ActionOutcome, NodeAction, NodeActionListener, RefreshAction};
use async_trait::async_trait;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, Weak};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Name of the action every refreshable node carries.
pub const REFRESH_ACTION: &str = "Refresh";

const REFRESHING_SUFFIX: &str = " (Refreshing...)";

/// Result of a [`Node::load`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// `refresh_items` ran and succeeded.
    Completed,
    /// Another load was in flight; nothing was done.
    AlreadyLoading,
    /// `refresh_items` failed; the error was reported and the children restored.
    Failed,
}

/// Node-specific behavior: how children are discovered, which actions are
/// enabled, and what a click does.
///
/// Behaviors hold the cached remote state of their node (a VM description, a
/// storage account, ...). They are shared by the node and its action listeners.
#[async_trait]
pub trait NodeBehavior: Send + Sync + 'static {
    /// Synchronises the children of `node` with the remote resources.
    ///
    /// Implementations should fetch everything they need before mutating the
    /// tree. On error the caller restores the previous children.
    async fn refresh_items(&self, _node: &Arc<Node>) -> ExplorerResult<()> {
        Ok(())
    }

    /// Recomputes the enabled flag of `actions` from cached state.
    ///
    /// Called with the action list locked; must not call back into
    /// [`Node::get_node_actions`] and must not perform remote calls.
    fn update_actions(&self, _node: &Node, _actions: &mut [NodeAction]) {}

    /// Handles a left click on the node.
    async fn on_click(&self, _node: &Arc<Node>) {}

    fn as_any(&self) -> &dyn Any;
}

/// Behavior of nodes without remote state.
#[derive(Debug, Default)]
pub struct Leaf;

impl NodeBehavior for Leaf {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Marks a node as loading for as long as it is alive.
#[must_use = "the node stops loading when the guard is dropped"]
pub struct LoadingGuard {
    node: Arc<Node>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.node.loading.store(false, Ordering::Release);
        self.node.idle.notify_waiters();
        self.node.notify_node_changed();
    }
}

impl fmt::Debug for LoadingGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadingGuard")
            .field("node", &self.node.id)
            .finish()
    }
}

/// One entry of the explorer tree.
pub struct Node {
    id: NodeId,
    name: RwLock<String>,
    icon_path: RwLock<Option<String>>,
    parent: RwLock<Weak<Node>>,
    children: RwLock<Vec<Arc<Node>>>,
    actions: RwLock<Vec<NodeAction>>,
    loading: AtomicBool,
    // woken whenever a loading guard is released
    idle: Notify,
    behavior: Arc<dyn NodeBehavior>,
    self_ref: Weak<Node>,
    context: ExplorerContext,
}

impl Node {
    /// Starts building a node with the given stable id and label.
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> NodeBuilder {
        NodeBuilder {
            id: id.into(),
            name: name.into(),
            icon_path: None,
            parent: Weak::new(),
            behavior: Arc::new(Leaf),
            refreshable: false,
            actions: Vec::new(),
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn name(&self) -> String {
        read(&self.name).clone()
    }

    /// The label to render; loading nodes are suffixed so the UI can tell them apart.
    pub fn display_name(&self) -> String {
        let name = self.name();
        if self.is_loading() {
            format!("{}{}", name, REFRESHING_SUFFIX)
        } else {
            name
        }
    }

    pub fn set_name(&self, name: impl Into<String>) {
        let name = name.into();
        let changed = {
            let mut current = write(&self.name);
            if *current == name {
                false
            } else {
                *current = name;
                true
            }
        };
        if changed {
            self.notify_node_changed();
        }
    }

    pub fn icon_path(&self) -> Option<String> {
        read(&self.icon_path).clone()
    }

    pub fn set_icon_path(&self, icon_path: impl Into<String>) {
        let icon_path = Some(icon_path.into());
        let changed = {
            let mut current = write(&self.icon_path);
            if *current == icon_path {
                false
            } else {
                *current = icon_path;
                true
            }
        };
        if changed {
            self.notify_node_changed();
        }
    }

    pub fn context(&self) -> &ExplorerContext {
        &self.context
    }

    pub fn parent(&self) -> Option<Arc<Node>> {
        read(&self.parent).upgrade()
    }

    /// Returns the behavior downcast to its concrete type.
    pub fn behavior<B: NodeBehavior>(&self) -> Option<&B> {
        self.behavior.as_any().downcast_ref::<B>()
    }

    /// Returns a snapshot of the children.
    pub fn child_nodes(&self) -> Vec<Arc<Node>> {
        read(&self.children).clone()
    }

    pub fn child_count(&self) -> usize {
        read(&self.children).len()
    }

    pub fn has_child_nodes(&self) -> bool {
        !read(&self.children).is_empty()
    }

    /// Returns true if `node` is one of this node's children (by identity).
    pub fn is_direct_child(&self, node: &Arc<Node>) -> bool {
        read(&self.children).iter().any(|c| Arc::ptr_eq(c, node))
    }

    pub fn is_descendant(&self, node: &Arc<Node>) -> bool {
        self.child_nodes()
            .iter()
            .any(|child| Arc::ptr_eq(child, node) || child.is_descendant(node))
    }

    pub fn find_child_by_id(&self, id: &str) -> Option<Arc<Node>> {
        read(&self.children).iter().find(|c| c.id == id).cloned()
    }

    /// Appends `child` unless it already is a direct child.
    ///
    /// Returns false (and changes nothing) for a duplicate.
    pub fn add_child_node(self: &Arc<Self>, child: Arc<Node>) -> bool {
        {
            let mut children = write(&self.children);
            if children.iter().any(|c| Arc::ptr_eq(c, &child)) {
                return false;
            }
            *write(&child.parent) = Arc::downgrade(self);
            children.push(child);
        }
        self.notify_structure_changed();
        true
    }

    /// Removes one direct child and clears its subtree. Returns false if
    /// `child` is not a direct child.
    pub fn remove_direct_child_node(&self, child: &Arc<Node>) -> bool {
        let removed = {
            let mut children = write(&self.children);
            let before = children.len();
            children.retain(|c| !Arc::ptr_eq(c, child));
            before != children.len()
        };
        if removed {
            child.clear_subtree();
            child.detach();
            self.notify_structure_changed();
        }
        removed
    }

    /// Removes every child and their subtrees, firing a single structure
    /// notification for this node.
    pub fn remove_all_child_nodes(&self) {
        let removed = std::mem::take(&mut *write(&self.children));
        for child in &removed {
            child.clear_subtree();
            child.detach();
        }
        self.notify_structure_changed();
    }

    fn clear_subtree(&self) {
        let removed = std::mem::take(&mut *write(&self.children));
        if removed.is_empty() {
            return;
        }
        for child in &removed {
            child.clear_subtree();
            child.detach();
        }
        self.notify_structure_changed();
    }

    /// Replaces the children with `children` (duplicates dropped), firing a
    /// single structure notification if anything changed.
    pub fn replace_child_nodes(self: &Arc<Self>, children: Vec<Arc<Node>>) {
        let mut next: Vec<Arc<Node>> = Vec::with_capacity(children.len());
        for child in children {
            if !next.iter().any(|c| Arc::ptr_eq(c, &child)) {
                next.push(child);
            }
        }

        let previous = {
            let mut current = write(&self.children);
            let unchanged = current.len() == next.len()
                && current.iter().zip(&next).all(|(a, b)| Arc::ptr_eq(a, b));
            if unchanged {
                return;
            }
            std::mem::replace(&mut *current, next.clone())
        };

        for child in previous
            .iter()
            .filter(|old| !next.iter().any(|c| Arc::ptr_eq(c, old)))
        {
            child.detach();
        }
        for child in &next {
            *write(&child.parent) = Arc::downgrade(self);
        }
        self.notify_structure_changed();
    }

    /// Synchronises the children with a freshly fetched list of resources.
    ///
    /// For every item, `upsert` receives the existing child with the same id
    /// (if any) and returns the node to keep, so unchanged resources are
    /// updated in place. Children whose id is not produced are dropped and
    /// the remote order is kept.
    pub fn reconcile_children<T>(
        self: &Arc<Self>,
        items: impl IntoIterator<Item = T>,
        id_of: impl Fn(&T) -> String,
        mut upsert: impl FnMut(Option<Arc<Node>>, T) -> Arc<Node>,
    ) {
        let current = self.child_nodes();
        let children = items
            .into_iter()
            .map(|item| {
                let id = id_of(&item);
                let existing = current.iter().find(|c| c.id == id.as_str()).cloned();
                upsert(existing, item)
            })
            .collect();
        self.replace_child_nodes(children);
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Marks the node as loading unless it already is.
    ///
    /// Returns `None` if another load or action holds the node.
    pub fn try_begin_loading(self: &Arc<Self>) -> Option<LoadingGuard> {
        self.loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        self.notify_node_changed();
        Some(LoadingGuard {
            node: Arc::clone(self),
        })
    }

    /// Refreshes the children from the remote source.
    ///
    /// Concurrent calls are de-duplicated: while a load is in flight further
    /// calls return [`LoadOutcome::AlreadyLoading`] immediately. Failures are
    /// logged and shown through the UI host; they never escape this call.
    pub async fn load(self: &Arc<Self>) -> LoadOutcome {
        let Some(loading) = self.try_begin_loading() else {
            debug!(node = %self.id, "already loading, refresh skipped");
            return LoadOutcome::AlreadyLoading;
        };

        debug!(node = %self.id, "loading");
        let result = self.reload_items().await;
        drop(loading);
        self.finish_load(result)
    }

    /// Waits until no load or action holds the node, then marks it as loading.
    pub(crate) async fn begin_loading(self: &Arc<Self>) -> LoadingGuard {
        loop {
            let idle = self.idle.notified();
            if let Some(guard) = self.try_begin_loading() {
                return guard;
            }
            idle.await;
        }
    }

    /// Tears the node down and loads it again.
    ///
    /// Unlike [`load`](Self::load) this never gives up on a busy node: it waits
    /// for the running load to end, then runs `tear_down` and the refresh under
    /// one loading guard, so no other load can slip in between.
    pub(crate) async fn rebuild(
        self: &Arc<Self>,
        tear_down: impl FnOnce(&Arc<Node>) + Send,
    ) -> LoadOutcome {
        let loading = self.begin_loading().await;
        debug!(node = %self.id, "rebuilding");
        tear_down(self);
        let result = self.reload_items().await;
        drop(loading);
        self.finish_load(result)
    }

    fn finish_load(&self, result: ExplorerResult<()>) -> LoadOutcome {
        match result {
            Ok(()) => {
                debug!(node = %self.id, children = self.child_count(), "loaded");
                LoadOutcome::Completed
            }
            Err(err) => {
                let name = self.name();
                self.report_error(
                    &format!("Error Loading {}", name),
                    &format!("An error occurred while loading {}.", name),
                    &err,
                );
                LoadOutcome::Failed
            }
        }
    }

    /// Runs [`load`](Self::load) on a background task.
    pub fn spawn_load(self: &Arc<Self>) -> JoinHandle<LoadOutcome> {
        let node = Arc::clone(self);
        tokio::spawn(async move { node.load().await })
    }

    /// Runs the behavior's refresh without touching the loading flag,
    /// restoring the previous children if it fails.
    pub(crate) async fn reload_items(self: &Arc<Self>) -> ExplorerResult<()> {
        let snapshot = self.child_nodes();
        let behavior = Arc::clone(&self.behavior);
        let result = behavior.refresh_items(self).await;
        if result.is_err() {
            self.replace_child_nodes(snapshot);
        }
        result
    }

    /// Dispatches a left click; ignored while the node is loading.
    pub async fn click(self: &Arc<Self>) {
        if self.is_loading() {
            return;
        }
        let behavior = Arc::clone(&self.behavior);
        behavior.on_click(self).await;
    }

    /// Returns the actions with their enabled state recomputed.
    pub fn get_node_actions(&self) -> Vec<NodeAction> {
        let mut actions = write(&self.actions);
        self.behavior.update_actions(self, &mut actions);
        actions.clone()
    }

    pub fn get_node_action_by_name(&self, name: &str) -> Option<NodeAction> {
        self.get_node_actions()
            .into_iter()
            .find(|action| action.name() == name)
    }

    pub fn has_node_actions(&self) -> bool {
        !read(&self.actions).is_empty()
    }

    /// Adds a listener under `name`, creating the action if needed.
    pub fn add_action(&self, name: impl Into<String>, listener: Arc<dyn NodeActionListener>) {
        merge_action(&mut write(&self.actions), &self.self_ref, name.into(), listener);
    }

    /// Fires the named action. Returns `None` if the node has no such action.
    pub async fn fire_action(&self, name: &str) -> Option<ActionOutcome> {
        let action = self.get_node_action_by_name(name)?;
        Some(action.fire().await)
    }

    pub(crate) fn report_error(&self, title: &str, message: &str, err: &ExplorerError) {
        error!(node = %self.id, error = %err, "{}", message);
        self.context.ui().show_error(title, message, err);
    }

    fn detach(&self) {
        *write(&self.parent) = Weak::new();
    }

    fn notify_structure_changed(&self) {
        self.context.ui().structure_changed(self);
    }

    fn notify_node_changed(&self) {
        self.context.ui().node_changed(self);
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("loading", &self.is_loading())
            .field("children", &self.child_count())
            .finish()
    }
}

fn merge_action(
    actions: &mut Vec<NodeAction>,
    node: &Weak<Node>,
    name: String,
    listener: Arc<dyn NodeActionListener>,
) {
    match actions.iter_mut().find(|action| action.name() == name) {
        Some(action) => action.add_listener(listener),
        None => {
            let mut action = NodeAction::new(node.clone(), name);
            action.add_listener(listener);
            actions.push(action);
        }
    }
}

/// Builder for [`Node`].
pub struct NodeBuilder {
    id: String,
    name: String,
    icon_path: Option<String>,
    parent: Weak<Node>,
    behavior: Arc<dyn NodeBehavior>,
    refreshable: bool,
    actions: Vec<(String, Arc<dyn NodeActionListener>)>,
}

impl NodeBuilder {
    pub fn icon(mut self, icon_path: impl Into<String>) -> Self {
        self.icon_path = Some(icon_path.into());
        self
    }

    /// Records the parent back-reference. The node is not added to the
    /// parent's children; use [`Node::add_child_node`] for that.
    pub fn parent(mut self, parent: &Arc<Node>) -> Self {
        self.parent = Arc::downgrade(parent);
        self
    }

    pub fn behavior(mut self, behavior: Arc<dyn NodeBehavior>) -> Self {
        self.behavior = behavior;
        self
    }

    /// Adds the "Refresh" action, which reloads the node.
    pub fn refreshable(mut self) -> Self {
        self.refreshable = true;
        self
    }

    pub fn action(
        mut self,
        name: impl Into<String>,
        listener: Arc<dyn NodeActionListener>,
    ) -> Self {
        self.actions.push((name.into(), listener));
        self
    }

    pub fn build(self, context: &ExplorerContext) -> Arc<Node> {
        Arc::new_cyclic(|self_ref| {
            let mut actions = Vec::new();
            if self.refreshable {
                merge_action(
                    &mut actions,
                    self_ref,
                    REFRESH_ACTION.to_string(),
                    Arc::new(RefreshAction),
                );
            }
            for (name, listener) in self.actions {
                merge_action(&mut actions, self_ref, name, listener);
            }

            Node {
                id: NodeId::new(self.id),
                name: RwLock::new(self.name),
                icon_path: RwLock::new(self.icon_path),
                parent: RwLock::new(self.parent),
                children: RwLock::new(Vec::new()),
                actions: RwLock::new(actions),
                loading: AtomicBool::new(false),
                idle: Notify::new(),
                behavior: self.behavior,
                self_ref: self_ref.clone(),
                context: context.clone(),
            }
        })
    }
}
