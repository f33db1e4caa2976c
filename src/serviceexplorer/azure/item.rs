use crate::serviceexplorer::node::{Node, NodeBehavior};
use std::any::Any;
use std::sync::Arc;

/// Behavior of leaf nodes that only carry the resource they display.
#[derive(Debug)]
pub struct ItemNode<T> {
    item: T,
}

impl<T: Send + Sync + 'static> ItemNode<T> {
    pub fn create(
        parent: &Arc<Node>,
        id: impl Into<String>,
        name: impl Into<String>,
        icon_path: &str,
        item: T,
    ) -> Arc<Node> {
        Node::builder(id, name)
            .icon(icon_path)
            .parent(parent)
            .behavior(Arc::new(ItemNode { item }))
            .build(parent.context())
    }

    pub fn item(&self) -> &T {
        &self.item
    }
}

impl<T: Send + Sync + 'static> NodeBehavior for ItemNode<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }
}
