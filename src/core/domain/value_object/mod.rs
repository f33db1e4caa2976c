mod node_id;
mod port;

pub use node_id::NodeId;
pub use port::Port;

pub(crate) use node_id::validate_node_id;
pub(crate) use port::validate_port;
