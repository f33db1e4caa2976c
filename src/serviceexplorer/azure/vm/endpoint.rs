use crate::core::domain::error::ExplorerResult;
use crate::core::domain::model::vm::Endpoint;
use crate::serviceexplorer::node::{Node, NodeBehavior};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

const ICON_PATH: &str = "endpoint.png";

/// An endpoint of a VM, shown with its protocol and ports as leaves.
#[derive(Debug)]
pub struct VmEndpointNode {
    endpoint: Endpoint,
}

impl VmEndpointNode {
    pub fn create(parent: &Arc<Node>, endpoint: Endpoint) -> Arc<Node> {
        let node = Node::builder(endpoint.name.clone(), endpoint.name.clone())
            .icon(ICON_PATH)
            .parent(parent)
            .behavior(Arc::new(VmEndpointNode {
                endpoint: endpoint.clone(),
            }))
            .build(parent.context());
        fill_ports(&node, &endpoint);
        node
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

#[async_trait]
impl NodeBehavior for VmEndpointNode {
    async fn refresh_items(&self, node: &Arc<Node>) -> ExplorerResult<()> {
        fill_ports(node, &self.endpoint);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn fill_ports(node: &Arc<Node>, endpoint: &Endpoint) {
    let context = node.context();
    let leaf = |suffix: &str, label: String| {
        Node::builder(format!("{}_{}", endpoint.name, suffix), label)
            .parent(node)
            .build(context)
    };

    node.replace_child_nodes(vec![
        leaf("protocol", format!("Protocol: {}", endpoint.protocol)),
        leaf("public_port", format!("Public Port: {}", endpoint.public_port)),
        leaf("private_port", format!("Private Port: {}", endpoint.private_port)),
    ]);
}
