//! Boundary to the Azure management layer.
//!
//! The explorer never talks to Azure directly. Every read and mutation goes
//! through [`AzureManager`], which hosts implement on top of their REST/SDK
//! clients and authentication. All failures are reported as
//! [`ExplorerError::Remote`](crate::ExplorerError::Remote).

use crate::core::domain::{
    error::ExplorerResult,
    model::{
        mobile_service::{CustomApi, MobileService, MobileTable, ScheduledJob},
        storage::{BlobContainer, ClientStorageAccount, Queue, StorageAccount, StorageTable},
        subscription::Subscription,
        vm::VirtualMachine,
    },
};
use crate::core::infrastructure::event_hub::EventWaitHandle;
use async_trait::async_trait;

/// Operations the explorer tree performs against Azure.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AzureManager: Send + Sync {
    /// Lists the subscriptions currently selected for display.
    async fn subscription_list(&self) -> ExplorerResult<Vec<Subscription>>;

    /// Registers interest in changes of the subscription selection.
    async fn register_subscriptions_changed(&self) -> ExplorerResult<EventWaitHandle>;

    /// Drops a registration obtained from
    /// [`register_subscriptions_changed`](Self::register_subscriptions_changed).
    async fn unregister_subscriptions_changed(&self, handle: &EventWaitHandle)
    -> ExplorerResult<()>;

    async fn virtual_machines(&self, subscription_id: &str) -> ExplorerResult<Vec<VirtualMachine>>;

    /// Re-reads status and endpoints of a single machine.
    async fn refresh_virtual_machine(&self, vm: &VirtualMachine) -> ExplorerResult<VirtualMachine>;

    async fn start_virtual_machine(&self, vm: &VirtualMachine) -> ExplorerResult<()>;

    async fn shutdown_virtual_machine(
        &self,
        vm: &VirtualMachine,
        deallocate: bool,
    ) -> ExplorerResult<()>;

    async fn restart_virtual_machine(&self, vm: &VirtualMachine) -> ExplorerResult<()>;

    async fn delete_virtual_machine(
        &self,
        vm: &VirtualMachine,
        delete_from_storage: bool,
    ) -> ExplorerResult<()>;

    /// Returns the content of a Remote Desktop connection file for the machine.
    async fn download_rdp(&self, vm: &VirtualMachine) -> ExplorerResult<Vec<u8>>;

    async fn mobile_services(&self, subscription_id: &str) -> ExplorerResult<Vec<MobileService>>;

    async fn mobile_tables(
        &self,
        subscription_id: &str,
        service_name: &str,
    ) -> ExplorerResult<Vec<MobileTable>>;

    async fn custom_apis(
        &self,
        subscription_id: &str,
        service_name: &str,
    ) -> ExplorerResult<Vec<CustomApi>>;

    async fn scheduled_jobs(
        &self,
        subscription_id: &str,
        service_name: &str,
    ) -> ExplorerResult<Vec<ScheduledJob>>;

    async fn delete_mobile_service(
        &self,
        subscription_id: &str,
        service_name: &str,
    ) -> ExplorerResult<()>;

    async fn storage_accounts(&self, subscription_id: &str) -> ExplorerResult<Vec<StorageAccount>>;

    async fn delete_storage_account(&self, account: &StorageAccount) -> ExplorerResult<()>;

    async fn blob_containers(
        &self,
        account: &ClientStorageAccount,
    ) -> ExplorerResult<Vec<BlobContainer>>;

    async fn queues(&self, account: &ClientStorageAccount) -> ExplorerResult<Vec<Queue>>;

    async fn storage_tables(
        &self,
        account: &ClientStorageAccount,
    ) -> ExplorerResult<Vec<StorageTable>>;
}
