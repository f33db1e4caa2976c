use crate::core::domain::error::{ExplorerError, ExplorerResult};
use crate::core::domain::model::mobile_service::{
    CustomApi, MobileService, MobileTable, ScheduledJob,
};
use crate::core::sync::{read, write};
use crate::serviceexplorer::azure::{DELETE_ACTION, ItemNode};
use crate::serviceexplorer::event_helper::{AzureRefresh, EventState, refresh_interruptibly};
use crate::serviceexplorer::node::{LoadOutcome, Node, NodeBehavior};
use crate::serviceexplorer::node_action::{ActionTask, NodeActionEvent, NodeActionListener};
use async_trait::async_trait;
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

pub const TABLES: &str = "Tables";
pub const CUSTOM_APIS: &str = "Custom APIs";
pub const SCHEDULED_JOBS: &str = "Scheduled Jobs";

const ICON_PATH: &str = "service.png";

pub fn table_node(parent: &Arc<Node>, table: MobileTable) -> Arc<Node> {
    ItemNode::create(parent, table.name.clone(), table.name.clone(), "table.png", table)
}

pub fn custom_api_node(parent: &Arc<Node>, api: CustomApi) -> Arc<Node> {
    ItemNode::create(parent, api.name.clone(), api.name.clone(), "api.png", api)
}

pub fn scheduled_job_node(parent: &Arc<Node>, job: ScheduledJob) -> Arc<Node> {
    ItemNode::create(parent, job.name.clone(), job.name.clone(), "job.png", job)
}

/// A mobile service. JavaScript backends expose three groups of children.
#[derive(Debug)]
pub struct MobileServiceNode {
    service: RwLock<MobileService>,
    children_loaded: AtomicBool,
}

impl MobileServiceNode {
    pub fn create(parent: &Arc<Node>, service: MobileService) -> Arc<Node> {
        let mut builder = Node::builder(super::node_id(&service), service.name.clone())
            .icon(ICON_PATH)
            .parent(parent)
            .refreshable();
        if service.is_node_runtime() {
            builder = builder.action(DELETE_ACTION, Arc::new(DeleteMobileServiceAction));
        }

        builder
            .behavior(Arc::new(MobileServiceNode {
                service: RwLock::new(service),
                children_loaded: AtomicBool::new(false),
            }))
            .build(parent.context())
    }

    pub fn mobile_service(&self) -> MobileService {
        read(&self.service).clone()
    }

    pub fn update(node: &Arc<Node>, service: MobileService) {
        node.set_name(service.name.clone());
        if let Some(behavior) = node.behavior::<MobileServiceNode>() {
            *write(&behavior.service) = service;
        }
    }

    pub fn children_loaded(&self) -> bool {
        self.children_loaded.load(Ordering::Acquire)
    }
}

/// Fills the group node `<service><suffix>` with one child per item.
///
/// The group is added to `node` before its children are created and is kept
/// across refreshes; only its children are replaced.
fn load_service_node<T>(
    node: &Arc<Node>,
    service_name: &str,
    items: Vec<T>,
    id_suffix: &str,
    display_name: &str,
    create_child: fn(&Arc<Node>, T) -> Arc<Node>,
) -> Arc<Node> {
    let id = format!("{}{}", service_name, id_suffix);
    let group = match node.find_child_by_id(&id) {
        Some(group) => group,
        None => {
            let group = Node::builder(id, display_name)
                .parent(node)
                .build(node.context());
            node.add_child_node(Arc::clone(&group));
            group
        }
    };

    let children = items
        .into_iter()
        .map(|item| create_child(&group, item))
        .collect();
    group.replace_child_nodes(children);
    group
}

#[async_trait]
impl AzureRefresh for MobileServiceNode {
    async fn refresh(&self, node: &Arc<Node>, state: &EventState) -> ExplorerResult<()> {
        let service = self.mobile_service();
        if !service.is_node_runtime() {
            return Ok(());
        }

        let azure = node.context().azure();
        let subscription_id = service.subscription_id.as_str();
        let name = service.name.as_str();

        let tables = azure.mobile_tables(subscription_id, name).await?;
        if state.is_event_triggered() {
            return Ok(());
        }
        load_service_node(node, name, tables, "_tables", TABLES, table_node);

        let apis = azure.custom_apis(subscription_id, name).await?;
        if state.is_event_triggered() {
            return Ok(());
        }
        load_service_node(node, name, apis, "_apis", CUSTOM_APIS, custom_api_node);

        let jobs = azure.scheduled_jobs(subscription_id, name).await?;
        if state.is_event_triggered() {
            return Ok(());
        }
        load_service_node(node, name, jobs, "_jobs", SCHEDULED_JOBS, scheduled_job_node);

        debug!(service = name, "mobile service loaded");
        Ok(())
    }
}

#[async_trait]
impl NodeBehavior for MobileServiceNode {
    async fn refresh_items(&self, node: &Arc<Node>) -> ExplorerResult<()> {
        refresh_interruptibly(node, self).await
    }

    async fn on_click(&self, node: &Arc<Node>) {
        if self.children_loaded() {
            return;
        }
        if node.load().await == LoadOutcome::Completed {
            self.children_loaded.store(true, Ordering::Release);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct DeleteMobileServiceAction;

impl NodeActionListener for DeleteMobileServiceAction {
    fn prompt(&self, event: &NodeActionEvent) -> Option<String> {
        Some(format!(
            "This operation will delete mobile service {}.\nAre you sure you want to continue?",
            event.node.name()
        ))
    }

    fn action_performed_async(self: Arc<Self>, event: NodeActionEvent) -> ActionTask {
        ActionTask::spawn(async move {
            let service = event
                .node
                .behavior::<MobileServiceNode>()
                .map(MobileServiceNode::mobile_service)
                .ok_or_else(|| {
                    ExplorerError::InvalidNode(format!(
                        "{} is not a mobile service node",
                        event.node.id()
                    ))
                })?;

            event
                .node
                .context()
                .azure()
                .delete_mobile_service(&service.subscription_id, &service.name)
                .await?;
            info!(service = %service.name, "mobile service deleted");

            if let Some(parent) = event.node.parent() {
                parent.remove_direct_child_node(&event.node);
            }
            Ok(())
        })
    }
}
