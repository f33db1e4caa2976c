//! Domain models for storage accounts and the entities they contain.

use serde::{Deserialize, Serialize};

/// Replication type of a storage account.
///
/// Only the `Standard_*` types expose blobs, queues and tables to the explorer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum StorageAccountType {
    #[serde(rename = "Standard_LRS")]
    StandardLrs,
    #[serde(rename = "Standard_GRS")]
    StandardGrs,
    #[serde(rename = "Standard_RAGRS")]
    StandardRagrs,
    #[serde(rename = "Standard_ZRS")]
    StandardZrs,
    #[serde(rename = "Premium_LRS")]
    PremiumLrs,
    #[serde(untagged)]
    Other(String),
}

impl StorageAccountType {
    pub fn is_standard(&self) -> bool {
        matches!(
            self,
            StorageAccountType::StandardLrs
                | StorageAccountType::StandardGrs
                | StorageAccountType::StandardRagrs
                | StorageAccountType::StandardZrs
        )
    }
}

/// Connection details for a storage account, whether discovered through a
/// subscription or attached externally by connection string.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientStorageAccount {
    pub name: String,
    pub primary_key: String,
    /// Endpoint protocol ("https" or "http"); used when custom endpoints are off.
    pub protocol: String,
    pub blobs_uri: String,
    pub queues_uri: String,
    pub tables_uri: String,
    pub use_custom_endpoints: bool,
}

impl ClientStorageAccount {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            protocol: "https".to_string(),
            ..Default::default()
        }
    }

    /// Builds the storage connection string for this account.
    pub fn connection_string(&self) -> String {
        if self.use_custom_endpoints {
            format!(
                "BlobEndpoint={};QueueEndpoint={};TableEndpoint={};AccountName={};AccountKey={}",
                self.blobs_uri, self.queues_uri, self.tables_uri, self.name, self.primary_key
            )
        } else {
            format!(
                "DefaultEndpointsProtocol={};AccountName={};AccountKey={}",
                self.protocol, self.name, self.primary_key
            )
        }
    }
}

/// A storage account owned by a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageAccount {
    #[serde(flatten)]
    pub client: ClientStorageAccount,
    pub subscription_id: String,
    #[serde(rename = "type")]
    pub account_type: StorageAccountType,
    #[serde(default)]
    pub location: String,
}

impl StorageAccount {
    pub fn new(
        name: impl Into<String>,
        subscription_id: impl Into<String>,
        account_type: StorageAccountType,
    ) -> Self {
        Self {
            client: ClientStorageAccount::new(name),
            subscription_id: subscription_id.into(),
            account_type,
            location: String::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.client.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobContainer {
    pub name: String,
    #[serde(default)]
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Queue {
    pub name: String,
    #[serde(default)]
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageTable {
    pub name: String,
    #[serde(default)]
    pub uri: String,
}
