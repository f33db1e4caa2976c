pub mod azure_manager;
pub mod event_hub;
