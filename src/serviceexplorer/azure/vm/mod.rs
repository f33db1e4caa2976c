//! Virtual machines across every selected subscription.

mod endpoint;
mod vm_node;

pub use endpoint::VmEndpointNode;
pub use vm_node::{
    ACTION_DOWNLOAD_RDP_FILE, ACTION_RESTART, ACTION_SHUTDOWN, ACTION_START, VmNode,
    VmPowerAction,
};

use crate::core::domain::error::ExplorerResult;
use crate::serviceexplorer::node::{Node, NodeBehavior};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

pub const VM_SERVICE_MODULE_ID: &str = "vms";
const BASE_MODULE_NAME: &str = "Virtual Machines";
const ICON_PATH: &str = "virtualmachines.png";

/// Lists the virtual machines of all subscriptions as [`VmNode`]s.
#[derive(Debug, Default)]
pub struct VmServiceModule;

impl VmServiceModule {
    pub fn create(parent: &Arc<Node>) -> Arc<Node> {
        Node::builder(VM_SERVICE_MODULE_ID, BASE_MODULE_NAME)
            .icon(ICON_PATH)
            .parent(parent)
            .behavior(Arc::new(VmServiceModule))
            .refreshable()
            .build(parent.context())
    }
}

#[async_trait]
impl NodeBehavior for VmServiceModule {
    async fn refresh_items(&self, node: &Arc<Node>) -> ExplorerResult<()> {
        let azure = node.context().azure();

        let mut machines = Vec::new();
        for subscription in azure.subscription_list().await? {
            let vms = azure.virtual_machines(&subscription.id).await?;
            debug!(subscription = %subscription.id, count = vms.len(), "listed virtual machines");
            machines.extend(vms);
        }

        node.reconcile_children(machines, vm_node::node_id, |existing, vm| {
            match existing {
                Some(child) if child.behavior::<VmNode>().is_some() => {
                    VmNode::update(&child, vm);
                    child
                }
                _ => VmNode::create(node, vm),
            }
        });
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
