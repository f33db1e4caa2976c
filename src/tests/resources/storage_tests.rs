use crate::core::infrastructure::azure_manager::MockAzureManager;
use crate::storage::{ACTION_DETACH, BLOBS, QUEUES, TABLES};
use crate::tests::support::{RecordingUiHost, context_with_config, route_subscription_events};
use crate::{
    ActionOutcome, BlobContainer, ClientStorageAccount, ClientStorageNode, DELETE_ACTION,
    ExplorerConfig, ItemNode, LoadOutcome, Node, Queue, StorageAccount, StorageAccountType,
    StorageItemKind, StorageItemsModule, StorageModule, StorageSource,
    Subscription, SubscriptionsChangedHub,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn external(name: &str, key: &str) -> ClientStorageAccount {
    let mut account = ClientStorageAccount::new(name);
    account.primary_key = key.to_string();
    account
}

fn config_with(external: Vec<ClientStorageAccount>) -> ExplorerConfig {
    external
        .into_iter()
        .fold(ExplorerConfig::builder(), |builder, account| {
            builder.external_storage_account(account)
        })
        .build()
        .unwrap()
}

fn routed(hub: &Arc<SubscriptionsChangedHub>) -> MockAzureManager {
    let mut azure = MockAzureManager::new();
    route_subscription_events(&mut azure, hub);
    azure
}

fn expect_items(azure: &mut MockAzureManager) {
    azure.expect_blob_containers().returning(|_| {
        Ok(vec![
            BlobContainer {
                name: "images".to_string(),
                uri: String::new(),
            },
            BlobContainer {
                name: "vhds".to_string(),
                uri: String::new(),
            },
        ])
    });
    azure.expect_queues().returning(|_| {
        Ok(vec![Queue {
            name: "orders".to_string(),
            uri: String::new(),
        }])
    });
    azure.expect_storage_tables().returning(|_| Ok(Vec::new()));
}

fn account_node(ctx: &crate::ExplorerContext, source: StorageSource) -> (Arc<Node>, Arc<Node>) {
    let module = Node::builder("storage", "Storage").build(ctx);
    let node = ClientStorageNode::create(&module, source);
    module.add_child_node(Arc::clone(&node));
    (module, node)
}

#[tokio::test]
async fn test_module_lists_standard_and_external_accounts() {
    let hub = Arc::new(SubscriptionsChangedHub::new());
    let mut azure = routed(&hub);
    azure
        .expect_subscription_list()
        .returning(|| Ok(vec![Subscription::new("s1", "Production")]));
    azure.expect_storage_accounts().returning(|subscription| {
        Ok(vec![
            StorageAccount::new("media", subscription, StorageAccountType::StandardGrs),
            StorageAccount::new("fastdisk", subscription, StorageAccountType::PremiumLrs),
        ])
    });
    let config = config_with(vec![external("devstore", "a2V5")]);
    let ctx = context_with_config(azure, RecordingUiHost::new(), config);
    let module = StorageModule::create(&Node::builder("azure", "Azure").build(&ctx));

    assert_eq!(module.load().await, LoadOutcome::Completed);

    let ids: Vec<String> = module.child_nodes().iter().map(|c| c.id().to_string()).collect();
    assert_eq!(ids, vec!["s1/media", "external:devstore"]);
    let media = module.find_child_by_id("s1/media").unwrap();
    assert_eq!(media.icon_path().as_deref(), Some("storageaccount.png"));
    assert!(media.get_node_action_by_name(DELETE_ACTION).is_some());
    let devstore = module.find_child_by_id("external:devstore").unwrap();
    assert_eq!(devstore.icon_path().as_deref(), Some("externalstorageaccount.png"));
    assert!(devstore.get_node_action_by_name(ACTION_DETACH).is_some());
    assert!(devstore.get_node_action_by_name(DELETE_ACTION).is_none());
    assert_eq!(hub.registered_count(), 0);
}

#[tokio::test]
async fn test_account_loads_item_groups() {
    let hub = Arc::new(SubscriptionsChangedHub::new());
    let mut azure = routed(&hub);
    expect_items(&mut azure);
    let ctx = context_with_config(azure, RecordingUiHost::new(), ExplorerConfig::default());
    let account = StorageAccount::new("media", "s1", StorageAccountType::StandardLrs);
    let (_module, node) = account_node(&ctx, StorageSource::Subscription(account));

    node.click().await;

    let groups: Vec<String> = node.child_nodes().iter().map(|c| c.name()).collect();
    assert_eq!(groups, vec![BLOBS, QUEUES, TABLES]);
    let blobs = node.find_child_by_id("Blobsmedia").unwrap();
    assert_eq!(
        blobs.behavior::<StorageItemsModule>().unwrap().kind(),
        StorageItemKind::Blobs
    );
    let containers: Vec<String> = blobs.child_nodes().iter().map(|c| c.name()).collect();
    assert_eq!(containers, vec!["images", "vhds"]);
    assert!(blobs.child_nodes()[0].behavior::<ItemNode<BlobContainer>>().is_some());

    let queues = node.find_child_by_id("Queuesmedia").unwrap();
    assert_eq!(queues.child_nodes()[0].name(), "orders");
    assert!(!node.find_child_by_id("Tablesmedia").unwrap().has_child_nodes());
    assert!(node.child_nodes().iter().all(|group| !group.is_loading()));
}

#[tokio::test]
async fn test_reload_keeps_item_groups() {
    let hub = Arc::new(SubscriptionsChangedHub::new());
    let mut azure = routed(&hub);
    expect_items(&mut azure);
    let ctx = context_with_config(azure, RecordingUiHost::new(), ExplorerConfig::default());
    let (_module, node) =
        account_node(&ctx, StorageSource::External(external("devstore", "a2V5")));

    node.load().await;
    let blobs = node.find_child_by_id("Blobsdevstore").unwrap();
    node.load().await;

    assert_eq!(node.child_count(), 3);
    assert!(Arc::ptr_eq(&blobs, &node.find_child_by_id("Blobsdevstore").unwrap()));
    assert_eq!(blobs.child_count(), 2);
}

#[tokio::test]
async fn test_external_account_without_key_reports_error() {
    let hub = Arc::new(SubscriptionsChangedHub::new());
    let ui = RecordingUiHost::new();
    let ctx = context_with_config(routed(&hub), ui.clone(), ExplorerConfig::default());
    let (_module, node) = account_node(&ctx, StorageSource::External(external("devstore", "")));

    assert_eq!(node.load().await, LoadOutcome::Failed);

    assert!(!node.has_child_nodes());
    assert_eq!(ui.errors()[0].0, "Error Loading devstore");
    assert_eq!(hub.registered_count(), 0);
}

#[tokio::test]
async fn test_item_group_failure_is_reported_on_the_group() {
    let hub = Arc::new(SubscriptionsChangedHub::new());
    let mut azure = routed(&hub);
    azure.expect_blob_containers().returning(|_| Ok(Vec::new()));
    azure
        .expect_queues()
        .returning(|_| Err(crate::ExplorerError::remote("403 Forbidden")));
    azure.expect_storage_tables().returning(|_| Ok(Vec::new()));
    let ui = RecordingUiHost::new();
    let ctx = context_with_config(azure, ui.clone(), ExplorerConfig::default());
    let account = StorageAccount::new("media", "s1", StorageAccountType::StandardLrs);
    let (_module, node) = account_node(&ctx, StorageSource::Subscription(account));

    assert_eq!(node.load().await, LoadOutcome::Completed);

    assert_eq!(node.child_count(), 3);
    assert_eq!(ui.errors(), vec![(
        "Error Loading Queues".to_string(),
        "An error occurred while loading Queues.".to_string()
    )]);
}

#[tokio::test]
async fn test_delete_account_removes_node() {
    let mut azure = MockAzureManager::new();
    azure
        .expect_delete_storage_account()
        .times(1)
        .returning(|account| {
            assert_eq!(account.name(), "media");
            Ok(())
        });
    let ui = RecordingUiHost::confirming();
    let ctx = context_with_config(azure, ui.clone(), ExplorerConfig::default());
    let account = StorageAccount::new("media", "s1", StorageAccountType::StandardLrs);
    let (module, node) = account_node(&ctx, StorageSource::Subscription(account));

    assert_eq!(
        node.fire_action(DELETE_ACTION).await,
        Some(ActionOutcome::Completed)
    );
    assert!(!module.has_child_nodes());
    assert!(ui.prompts()[0].starts_with("This operation will delete storage account media."));
}

#[tokio::test]
async fn test_detach_external_account() {
    let ui = RecordingUiHost::confirming();
    let ctx = context_with_config(MockAzureManager::new(), ui.clone(), ExplorerConfig::default());
    let (module, node) =
        account_node(&ctx, StorageSource::External(external("devstore", "a2V5")));

    assert_eq!(
        node.fire_action(ACTION_DETACH).await,
        Some(ActionOutcome::Completed)
    );
    assert!(!module.has_child_nodes());
    assert!(node.parent().is_none());
}

#[tokio::test]
async fn test_rotated_key_reaches_existing_item_groups() {
    let hub = Arc::new(SubscriptionsChangedHub::new());
    let mut azure = routed(&hub);
    azure
        .expect_subscription_list()
        .returning(|| Ok(vec![Subscription::new("s1", "Production")]));
    let rotations = Arc::new(AtomicUsize::new(1));
    let current = Arc::clone(&rotations);
    azure.expect_storage_accounts().returning(move |subscription| {
        let mut account = StorageAccount::new("media", subscription, StorageAccountType::StandardLrs);
        account.client.primary_key = format!("key-{}", current.load(Ordering::SeqCst));
        Ok(vec![account])
    });
    let used_keys = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&used_keys);
    azure.expect_blob_containers().returning(move |account| {
        seen.lock().unwrap().push(account.primary_key.clone());
        Ok(Vec::new())
    });
    azure.expect_queues().returning(|_| Ok(Vec::new()));
    azure.expect_storage_tables().returning(|_| Ok(Vec::new()));
    let ctx = context_with_config(azure, RecordingUiHost::new(), ExplorerConfig::default());
    let module = StorageModule::create(&Node::builder("azure", "Azure").build(&ctx));

    module.load().await;
    let media = module.find_child_by_id("s1/media").unwrap();
    media.load().await;
    let blobs = media.find_child_by_id("Blobsmedia").unwrap();

    rotations.store(2, Ordering::SeqCst);
    module.load().await;
    assert!(Arc::ptr_eq(&media, &module.find_child_by_id("s1/media").unwrap()));
    assert_eq!(
        blobs.behavior::<StorageItemsModule>().unwrap().account().primary_key,
        "key-2"
    );

    blobs.load().await;
    media.load().await;

    assert!(Arc::ptr_eq(&blobs, &media.find_child_by_id("Blobsmedia").unwrap()));
    assert_eq!(*used_keys.lock().unwrap(), vec!["key-1", "key-2", "key-2"]);
    assert_eq!(media.name(), "media");
}
