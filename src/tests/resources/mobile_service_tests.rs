use crate::core::infrastructure::azure_manager::MockAzureManager;
use crate::mobile_service::{CUSTOM_APIS, SCHEDULED_JOBS, TABLES};
use crate::tests::support::{RecordingUiHost, context, route_subscription_events};
use crate::{
    ActionOutcome, CustomApi, DELETE_ACTION, ExplorerContext, ItemNode, MobileService,
    MobileServiceModule, MobileServiceNode, MobileTable, Node, ScheduledJob, Subscription,
    SubscriptionsChangedHub,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn table(name: &str) -> MobileTable {
    MobileTable {
        name: name.to_string(),
        self_link: String::new(),
    }
}

fn job(name: &str) -> ScheduledJob {
    ScheduledJob {
        name: name.to_string(),
        enabled: true,
        interval: 15,
        interval_unit: "minute".to_string(),
    }
}

/// A manager serving the resources of the JavaScript service "todo".
fn todo_azure(hub: &Arc<SubscriptionsChangedHub>, table_calls: &Arc<AtomicUsize>) -> MockAzureManager {
    let mut azure = MockAzureManager::new();
    route_subscription_events(&mut azure, hub);
    let calls = Arc::clone(table_calls);
    azure.expect_mobile_tables().returning(move |_, service| {
        assert_eq!(service, "todo");
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![table("TodoItem"), table("Users")])
    });
    azure.expect_custom_apis().returning(|_, _| {
        Ok(vec![CustomApi {
            name: "sendmail".to_string(),
        }])
    });
    azure
        .expect_scheduled_jobs()
        .returning(|_, _| Ok(vec![job("cleanup")]));
    azure
}

fn service_node(ctx: &ExplorerContext, service: MobileService) -> (Arc<Node>, Arc<Node>) {
    let module = Node::builder("mobileservices", "Mobile Services").build(ctx);
    let node = MobileServiceNode::create(&module, service);
    module.add_child_node(Arc::clone(&node));
    (module, node)
}

fn names(node: &Node) -> Vec<String> {
    node.child_nodes().iter().map(|c| c.name()).collect()
}

#[tokio::test]
async fn test_javascript_service_loads_three_groups() {
    let hub = Arc::new(SubscriptionsChangedHub::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let ctx = context(todo_azure(&hub, &calls), RecordingUiHost::new());
    let (_module, node) = service_node(&ctx, MobileService::new("todo", "s1", "JavaScript"));

    node.load().await;

    let ids: Vec<String> = node.child_nodes().iter().map(|c| c.id().to_string()).collect();
    assert_eq!(ids, vec!["todo_tables", "todo_apis", "todo_jobs"]);
    assert_eq!(names(&node), vec![TABLES, CUSTOM_APIS, SCHEDULED_JOBS]);

    let tables = node.find_child_by_id("todo_tables").unwrap();
    assert_eq!(names(&tables), vec!["TodoItem", "Users"]);
    let users = tables.find_child_by_id("Users").unwrap();
    assert_eq!(users.icon_path().as_deref(), Some("table.png"));
    assert_eq!(users.behavior::<ItemNode<MobileTable>>().unwrap().item(), &table("Users"));

    let jobs = node.find_child_by_id("todo_jobs").unwrap();
    assert_eq!(jobs.child_nodes()[0].behavior::<ItemNode<ScheduledJob>>().unwrap().item().interval, 15);
    assert_eq!(hub.registered_count(), 0);
}

#[tokio::test]
async fn test_reload_keeps_group_nodes() {
    let hub = Arc::new(SubscriptionsChangedHub::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let ctx = context(todo_azure(&hub, &calls), RecordingUiHost::new());
    let (_module, node) = service_node(&ctx, MobileService::new("todo", "s1", "JavaScript"));

    node.load().await;
    let tables = node.find_child_by_id("todo_tables").unwrap();
    node.load().await;

    assert_eq!(node.child_count(), 3);
    assert!(Arc::ptr_eq(&tables, &node.find_child_by_id("todo_tables").unwrap()));
    assert_eq!(tables.child_count(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_dotnet_service_has_no_groups_or_delete() {
    // no expectations: listing children of a .NET service would panic
    let hub = Arc::new(SubscriptionsChangedHub::new());
    let mut azure = MockAzureManager::new();
    route_subscription_events(&mut azure, &hub);
    let ctx = context(azure, RecordingUiHost::new());
    let (_module, node) =
        service_node(&ctx, MobileService::new("api", "s1", MobileService::NET_RUNTIME));

    node.load().await;

    assert!(!node.has_child_nodes());
    assert!(node.get_node_action_by_name(DELETE_ACTION).is_none());
    assert!(node.has_node_actions());
}

#[tokio::test]
async fn test_click_loads_children_once() {
    let hub = Arc::new(SubscriptionsChangedHub::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let ctx = context(todo_azure(&hub, &calls), RecordingUiHost::new());
    let (_module, node) = service_node(&ctx, MobileService::new("todo", "s1", "JavaScript"));

    node.click().await;
    node.click().await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(node.behavior::<MobileServiceNode>().unwrap().children_loaded());
    assert_eq!(node.child_count(), 3);
}

#[tokio::test]
async fn test_module_reuses_nodes_with_same_runtime() {
    let mut azure = MockAzureManager::new();
    azure
        .expect_subscription_list()
        .returning(|| Ok(vec![Subscription::new("s1", "Production")]));
    let listings = Arc::new(AtomicUsize::new(0));
    let count = Arc::clone(&listings);
    azure.expect_mobile_services().returning(move |subscription| {
        let runtime = if count.fetch_add(1, Ordering::SeqCst) == 0 {
            "JavaScript"
        } else {
            ".NET Framework"
        };
        Ok(vec![
            MobileService::new("todo", subscription, "JavaScript"),
            MobileService::new("api", subscription, runtime),
        ])
    });
    let ctx = context(azure, RecordingUiHost::new());
    let module = MobileServiceModule::create(&Node::builder("azure", "Azure").build(&ctx));

    module.load().await;
    let todo = module.find_child_by_id("s1/todo").unwrap();
    let api = module.find_child_by_id("s1/api").unwrap();
    assert!(api.get_node_action_by_name(DELETE_ACTION).is_some());

    module.load().await;

    assert_eq!(names(&module), vec!["todo", "api"]);
    assert!(Arc::ptr_eq(&todo, &module.find_child_by_id("s1/todo").unwrap()));
    let rebuilt = module.find_child_by_id("s1/api").unwrap();
    assert!(!Arc::ptr_eq(&api, &rebuilt));
    assert!(rebuilt.get_node_action_by_name(DELETE_ACTION).is_none());
}

#[tokio::test]
async fn test_delete_service_after_confirmation() {
    let mut azure = MockAzureManager::new();
    azure
        .expect_delete_mobile_service()
        .times(1)
        .returning(|subscription, service| {
            assert_eq!((subscription, service), ("s1", "todo"));
            Ok(())
        });
    let ui = RecordingUiHost::confirming();
    let ctx = context(azure, ui.clone());
    let (module, node) = service_node(&ctx, MobileService::new("todo", "s1", "JavaScript"));

    assert_eq!(
        node.fire_action(DELETE_ACTION).await,
        Some(ActionOutcome::Completed)
    );

    assert!(!module.has_child_nodes());
    assert_eq!(
        ui.prompts(),
        vec!["This operation will delete mobile service todo.\nAre you sure you want to continue?"]
    );
}
