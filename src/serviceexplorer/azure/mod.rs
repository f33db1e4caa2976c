//! The Azure branch of the explorer tree.

mod item;
pub mod mobile_service;
pub mod service_module;
pub mod storage;
pub mod vm;

pub use item::ItemNode;
pub use service_module::AzureServiceModule;

/// Name of the action that deletes the remote resource behind a node.
pub const DELETE_ACTION: &str = "Delete";
