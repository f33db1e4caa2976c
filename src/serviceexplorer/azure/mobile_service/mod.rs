//! Mobile services and their tables, custom APIs and scheduled jobs.

mod service_node;

pub use service_node::{
    CUSTOM_APIS, MobileServiceNode, SCHEDULED_JOBS, TABLES, custom_api_node, scheduled_job_node,
    table_node,
};

use crate::core::domain::error::ExplorerResult;
use crate::core::domain::model::mobile_service::MobileService;
use crate::serviceexplorer::node::{Node, NodeBehavior};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

pub const MOBILE_SERVICE_MODULE_ID: &str = "mobileservices";
const BASE_MODULE_NAME: &str = "Mobile Services";
const ICON_PATH: &str = "mobileservices.png";

fn node_id(service: &MobileService) -> String {
    format!("{}/{}", service.subscription_id, service.name)
}

#[derive(Debug, Default)]
pub struct MobileServiceModule;

impl MobileServiceModule {
    pub fn create(parent: &Arc<Node>) -> Arc<Node> {
        Node::builder(MOBILE_SERVICE_MODULE_ID, BASE_MODULE_NAME)
            .icon(ICON_PATH)
            .parent(parent)
            .behavior(Arc::new(MobileServiceModule))
            .refreshable()
            .build(parent.context())
    }
}

#[async_trait]
impl NodeBehavior for MobileServiceModule {
    async fn refresh_items(&self, node: &Arc<Node>) -> ExplorerResult<()> {
        let azure = node.context().azure();

        let mut services = Vec::new();
        for subscription in azure.subscription_list().await? {
            services.extend(azure.mobile_services(&subscription.id).await?);
        }

        node.reconcile_children(services, node_id, |existing, service| {
            let reusable = existing.filter(|child| {
                child
                    .behavior::<MobileServiceNode>()
                    .is_some_and(|b| b.mobile_service().runtime == service.runtime)
            });
            match reusable {
                Some(child) => {
                    MobileServiceNode::update(&child, service);
                    child
                }
                None => MobileServiceNode::create(node, service),
            }
        });
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
