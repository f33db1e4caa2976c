use super::endpoint::VmEndpointNode;
use crate::core::domain::error::{ExplorerError, ExplorerResult};
use crate::core::domain::model::vm::VirtualMachine;
use crate::core::infrastructure::event_hub::EventWaitHandle;
use crate::core::sync::{read, write};
use crate::serviceexplorer::azure::DELETE_ACTION;
use crate::serviceexplorer::event_helper::{EventHandler, EventState, run_interruptible};
use crate::serviceexplorer::node::{Node, NodeBehavior};
use crate::serviceexplorer::node_action::{
    ActionTask, NodeAction, NodeActionEvent, NodeActionListener, set_action_enabled,
};
use async_trait::async_trait;
use std::any::Any;
use std::sync::{Arc, RwLock};
use tracing::info;

pub const ACTION_DOWNLOAD_RDP_FILE: &str = "Connect Remote Desktop";
pub const ACTION_SHUTDOWN: &str = "Shutdown";
pub const ACTION_START: &str = "Start";
pub const ACTION_RESTART: &str = "Restart";

const WAIT_ICON_PATH: &str = "virtualmachinewait.png";
const STOP_ICON_PATH: &str = "virtualmachinestop.png";
const RUN_ICON_PATH: &str = "virtualmachinerun.png";

/// Stable node id of a VM; names are only unique within a cloud service.
pub(super) fn node_id(vm: &VirtualMachine) -> String {
    format!("{}/{}/{}", vm.subscription_id, vm.service_name, vm.name)
}

fn icon_path(vm: &VirtualMachine) -> &'static str {
    if vm.status.is_running() {
        RUN_ICON_PATH
    } else if vm.status.is_stopped() {
        STOP_ICON_PATH
    } else {
        WAIT_ICON_PATH
    }
}

fn vm_of(node: &Node) -> ExplorerResult<VirtualMachine> {
    node.behavior::<VmNode>()
        .map(VmNode::virtual_machine)
        .ok_or_else(|| {
            ExplorerError::InvalidNode(format!("{} is not a virtual machine node", node.id()))
        })
}

/// A virtual machine with its endpoints and power actions.
///
/// The cached [`VirtualMachine`] drives the icon and which actions are
/// enabled; it is replaced on every refresh of the node or of its module.
#[derive(Debug)]
pub struct VmNode {
    vm: RwLock<VirtualMachine>,
}

impl VmNode {
    pub fn create(parent: &Arc<Node>, vm: VirtualMachine) -> Arc<Node> {
        let node = Node::builder(node_id(&vm), vm.name.clone())
            .icon(icon_path(&vm))
            .parent(parent)
            .behavior(Arc::new(VmNode {
                vm: RwLock::new(vm.clone()),
            }))
            .refreshable()
            .action(DELETE_ACTION, Arc::new(DeleteVmAction))
            .action(ACTION_DOWNLOAD_RDP_FILE, Arc::new(DownloadRdpAction))
            .action(ACTION_SHUTDOWN, Arc::new(VmPowerAction::Shutdown))
            .action(ACTION_START, Arc::new(VmPowerAction::Start))
            .action(ACTION_RESTART, Arc::new(VmPowerAction::Restart))
            .build(parent.context());
        show(&node, &vm);
        node
    }

    pub fn virtual_machine(&self) -> VirtualMachine {
        read(&self.vm).clone()
    }

    /// Replaces the cached machine of `node` and redraws it.
    pub fn update(node: &Arc<Node>, vm: VirtualMachine) {
        if let Some(behavior) = node.behavior::<VmNode>() {
            *write(&behavior.vm) = vm.clone();
        }
        show(node, &vm);
    }
}

fn show(node: &Arc<Node>, vm: &VirtualMachine) {
    node.set_name(vm.name.clone());
    node.set_icon_path(icon_path(vm));
    node.reconcile_children(
        vm.endpoints.clone(),
        |endpoint| endpoint.name.clone(),
        |existing, endpoint| match existing {
            Some(child)
                if child
                    .behavior::<VmEndpointNode>()
                    .is_some_and(|b| *b.endpoint() == endpoint) =>
            {
                child
            }
            _ => VmEndpointNode::create(node, endpoint),
        },
    );
}

#[async_trait]
impl NodeBehavior for VmNode {
    async fn refresh_items(&self, node: &Arc<Node>) -> ExplorerResult<()> {
        let current = self.virtual_machine();
        let vm = node
            .context()
            .azure()
            .refresh_virtual_machine(&current)
            .await?;
        *write(&self.vm) = vm.clone();
        show(node, &vm);
        Ok(())
    }

    fn update_actions(&self, node: &Node, actions: &mut [NodeAction]) {
        let vm = read(&self.vm);
        let running = vm.status.is_running();
        let stopped = vm.status.is_stopped();
        let rdp_port = node.context().config().rdp_port.get();

        set_action_enabled(
            actions,
            ACTION_DOWNLOAD_RDP_FILE,
            !stopped && vm.has_private_port(rdp_port),
        );
        set_action_enabled(actions, ACTION_SHUTDOWN, running);
        set_action_enabled(actions, ACTION_START, stopped);
        set_action_enabled(actions, ACTION_RESTART, running);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct DeleteVmAction;

impl NodeActionListener for DeleteVmAction {
    fn prompt(&self, event: &NodeActionEvent) -> Option<String> {
        let disks = if event.node.context().config().delete_vm_disks {
            "The associated disks will be deleted from your storage account."
        } else {
            "The associated disks will not be deleted from your storage account."
        };
        Some(format!(
            "This operation will delete virtual machine {}. {} Are you sure you want to continue?",
            event.node.name(),
            disks
        ))
    }

    fn action_performed_async(self: Arc<Self>, event: NodeActionEvent) -> ActionTask {
        ActionTask::spawn(async move {
            let vm = vm_of(&event.node)?;
            let context = event.node.context();
            context
                .azure()
                .delete_virtual_machine(&vm, context.config().delete_vm_disks)
                .await?;
            info!(vm = %vm.name, "virtual machine deleted");

            if let Some(parent) = event.node.parent() {
                parent.remove_direct_child_node(&event.node);
            }
            Ok(())
        })
    }
}

struct DownloadRdpAction;

impl NodeActionListener for DownloadRdpAction {
    fn action_performed_async(self: Arc<Self>, event: NodeActionEvent) -> ActionTask {
        ActionTask::spawn(async move {
            let vm = vm_of(&event.node)?;
            let context = event.node.context();
            let contents = context.azure().download_rdp(&vm).await?;
            context
                .ui()
                .save_file(&format!("{}.rdp", vm.name), contents)
                .await
        })
    }
}

/// Start, shut down or restart a machine.
///
/// The call is abandoned if the subscriptions change meanwhile; otherwise the
/// node is refreshed from Azure once the call returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmPowerAction {
    Start,
    Shutdown,
    Restart,
}

impl NodeActionListener for VmPowerAction {
    fn prompt(&self, event: &NodeActionEvent) -> Option<String> {
        let name = event.node.name();
        Some(match self {
            VmPowerAction::Start => {
                format!("Are you sure you want to start the virtual machine {}?", name)
            }
            VmPowerAction::Restart => {
                format!("Are you sure you want to restart the virtual machine {}?", name)
            }
            VmPowerAction::Shutdown if event.node.context().config().shutdown_deallocates => {
                format!(
                    "This operation will result in losing the VIP that was assigned to this virtual machine. Are you sure that you want to shut down virtual machine {}?",
                    name
                )
            }
            VmPowerAction::Shutdown => {
                format!("Are you sure that you want to shut down virtual machine {}?", name)
            }
        })
    }

    fn action_performed_async(self: Arc<Self>, event: NodeActionEvent) -> ActionTask {
        let action = *self;
        ActionTask::spawn(async move {
            let vm = vm_of(&event.node)?;
            run_interruptible(&PowerCall {
                action,
                node: event.node,
                vm,
            })
            .await
        })
    }
}

struct PowerCall {
    action: VmPowerAction,
    node: Arc<Node>,
    vm: VirtualMachine,
}

#[async_trait]
impl EventHandler for PowerCall {
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

    async fn interruptible_action(&self, _state: &EventState) -> ExplorerResult<()> {
        let context = self.node.context();
        let azure = context.azure();
        match self.action {
            VmPowerAction::Start => azure.start_virtual_machine(&self.vm).await,
            VmPowerAction::Shutdown => {
                azure
                    .shutdown_virtual_machine(&self.vm, context.config().shutdown_deallocates)
                    .await
            }
            VmPowerAction::Restart => azure.restart_virtual_machine(&self.vm).await,
        }
    }

    async fn completed_action(&self) -> ExplorerResult<()> {
        info!(vm = %self.vm.name, action = ?self.action, "virtual machine power action completed");
        self.node.reload_items().await
    }
}
