pub mod azure;
pub mod event_helper;
pub mod node;
pub mod node_action;
pub mod ui_host;
