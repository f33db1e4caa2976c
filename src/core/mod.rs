pub mod domain;
pub mod infrastructure;
pub(crate) mod sync;
