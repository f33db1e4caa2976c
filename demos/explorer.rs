//! Headless walk through the Azure service explorer tree.
//!
//! This program backs the explorer with a small in-memory Azure manager,
//! loads the tree, prints it, starts a stopped virtual machine and finally
//! switches subscriptions while the root watches for the change.

use async_trait::async_trait;
use service_explorer::vm::ACTION_START;
use service_explorer::{
    AzureManager, AzureServiceModule, BlobContainer, ClientStorageAccount, CustomApi,
    EventWaitHandle, ExplorerConfig, ExplorerContext, ExplorerError, ExplorerResult,
    MobileService, MobileTable, Node, Queue, ScheduledJob, StorageAccount, StorageAccountType,
    StorageTable, Subscription, SubscriptionsChangedHub, TracingUiHost, VirtualMachine, VmStatus,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Static Azure data; the selected subscription can be switched at runtime.
struct InMemoryAzure {
    hub: SubscriptionsChangedHub,
    selected: Mutex<Subscription>,
    machines: Mutex<Vec<VirtualMachine>>,
}

impl InMemoryAzure {
    fn new() -> Self {
        Self {
            hub: SubscriptionsChangedHub::new(),
            selected: Mutex::new(Subscription::new("s1", "Production")),
            machines: Mutex::new(vec![
                VirtualMachine::new("web-1", "web-svc", "s1", VmStatus::Running),
                VirtualMachine::new("batch-1", "batch-svc", "s1", VmStatus::StoppedDeallocated),
                VirtualMachine::new("qa-1", "qa-svc", "s2", VmStatus::Running),
            ]),
        }
    }

    fn select(&self, subscription: Subscription) -> ExplorerResult<()> {
        *self.selected.lock().map_err(|_| poisoned())? = subscription;
        self.hub.notify_all();
        Ok(())
    }

    fn set_status(&self, vm: &VirtualMachine, status: VmStatus) -> ExplorerResult<()> {
        let mut machines = self.machines.lock().map_err(|_| poisoned())?;
        if let Some(machine) = machines.iter_mut().find(|m| m.name == vm.name) {
            machine.status = status;
        }
        Ok(())
    }
}

fn poisoned() -> ExplorerError {
    ExplorerError::remote("in-memory state poisoned")
}

#[async_trait]
impl AzureManager for InMemoryAzure {
    async fn subscription_list(&self) -> ExplorerResult<Vec<Subscription>> {
        Ok(vec![self.selected.lock().map_err(|_| poisoned())?.clone()])
    }

    async fn register_subscriptions_changed(&self) -> ExplorerResult<EventWaitHandle> {
        Ok(self.hub.register())
    }

    async fn unregister_subscriptions_changed(
        &self,
        handle: &EventWaitHandle,
    ) -> ExplorerResult<()> {
        self.hub.unregister(handle)
    }

    async fn virtual_machines(&self, subscription_id: &str) -> ExplorerResult<Vec<VirtualMachine>> {
        let machines = self.machines.lock().map_err(|_| poisoned())?;
        Ok(machines
            .iter()
            .filter(|vm| vm.subscription_id == subscription_id)
            .cloned()
            .collect())
    }

    async fn refresh_virtual_machine(&self, vm: &VirtualMachine) -> ExplorerResult<VirtualMachine> {
        let machines = self.machines.lock().map_err(|_| poisoned())?;
        machines
            .iter()
            .find(|m| m.name == vm.name)
            .cloned()
            .ok_or_else(|| ExplorerError::remote(format!("{} not found", vm.name)))
    }

    async fn start_virtual_machine(&self, vm: &VirtualMachine) -> ExplorerResult<()> {
        self.set_status(vm, VmStatus::Running)
    }

    async fn shutdown_virtual_machine(
        &self,
        vm: &VirtualMachine,
        deallocate: bool,
    ) -> ExplorerResult<()> {
        let status = if deallocate {
            VmStatus::StoppedDeallocated
        } else {
            VmStatus::Stopped
        };
        self.set_status(vm, status)
    }

    async fn restart_virtual_machine(&self, vm: &VirtualMachine) -> ExplorerResult<()> {
        self.set_status(vm, VmStatus::Running)
    }

    async fn delete_virtual_machine(
        &self,
        vm: &VirtualMachine,
        _delete_from_storage: bool,
    ) -> ExplorerResult<()> {
        let mut machines = self.machines.lock().map_err(|_| poisoned())?;
        machines.retain(|m| m.name != vm.name);
        Ok(())
    }

    async fn download_rdp(&self, vm: &VirtualMachine) -> ExplorerResult<Vec<u8>> {
        Ok(format!("full address:s:{}.cloudapp.net\n", vm.service_name).into_bytes())
    }

    async fn mobile_services(&self, subscription_id: &str) -> ExplorerResult<Vec<MobileService>> {
        Ok(vec![MobileService::new(
            "todo-api",
            subscription_id,
            MobileService::NODE_RUNTIME,
        )])
    }

    async fn mobile_tables(
        &self,
        _subscription_id: &str,
        _service_name: &str,
    ) -> ExplorerResult<Vec<MobileTable>> {
        Ok(Vec::new())
    }

    async fn custom_apis(
        &self,
        _subscription_id: &str,
        _service_name: &str,
    ) -> ExplorerResult<Vec<CustomApi>> {
        Ok(Vec::new())
    }

    async fn scheduled_jobs(
        &self,
        _subscription_id: &str,
        _service_name: &str,
    ) -> ExplorerResult<Vec<ScheduledJob>> {
        Ok(Vec::new())
    }

    async fn delete_mobile_service(
        &self,
        _subscription_id: &str,
        _service_name: &str,
    ) -> ExplorerResult<()> {
        Ok(())
    }

    async fn storage_accounts(&self, subscription_id: &str) -> ExplorerResult<Vec<StorageAccount>> {
        Ok(vec![StorageAccount::new(
            "media",
            subscription_id,
            StorageAccountType::StandardLrs,
        )])
    }

    async fn delete_storage_account(&self, _account: &StorageAccount) -> ExplorerResult<()> {
        Ok(())
    }

    async fn blob_containers(
        &self,
        _account: &ClientStorageAccount,
    ) -> ExplorerResult<Vec<BlobContainer>> {
        Ok(Vec::new())
    }

    async fn queues(&self, _account: &ClientStorageAccount) -> ExplorerResult<Vec<Queue>> {
        Ok(Vec::new())
    }

    async fn storage_tables(
        &self,
        _account: &ClientStorageAccount,
    ) -> ExplorerResult<Vec<StorageTable>> {
        Ok(Vec::new())
    }
}

fn print_tree(node: &Arc<Node>, depth: usize) {
    println!("{}- {}", "  ".repeat(depth), node.display_name());
    for child in node.child_nodes() {
        print_tree(&child, depth + 1);
    }
}

#[tokio::main]
async fn main() -> ExplorerResult<()> {
    let azure = Arc::new(InMemoryAzure::new());

    // Watch subscriptions and answer every prompt with "yes".
    let config = ExplorerConfig::builder()
        .watch_subscriptions(true)
        .auto_confirm(true)
        .build()?;
    let context = ExplorerContext::builder()
        .azure(Arc::clone(&azure) as Arc<dyn AzureManager>)
        .ui(Arc::new(TracingUiHost::from_config(&config)))
        .config(config)
        .build()?;

    // 1. Load the whole tree.
    let module = AzureServiceModule::new(&context);
    println!("Load finished: {:?}", module.load().await);
    print_tree(module.node(), 0);

    // 2. Start the stopped machine.
    let vms = module
        .node()
        .find_child_by_id("vms")
        .ok_or_else(|| ExplorerError::remote("virtual machine module missing"))?;
    if let Some(batch) = vms.child_nodes().into_iter().find(|n| n.name() == "batch-1") {
        let outcome = batch.fire_action(ACTION_START).await;
        println!("\nStart {}: {:?}", batch.name(), outcome);
    }

    // 3. Switch subscriptions; the watched root rebuilds itself.
    azure.select(Subscription::new("s2", "QA"))?;
    tokio::time::sleep(Duration::from_millis(200)).await;
    while module.node().is_loading() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    println!("\nAfter switching to QA:");
    print_tree(module.node(), 0);

    // 4. Stop watching before the module goes away.
    module.unregister_subscriptions_changed().await?;
    println!("\nWatching: {}", module.is_watching());

    Ok(())
}
