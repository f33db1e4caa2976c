use crate::core::domain::error::ValidationError;
use std::fmt;

/// A stable key identifying a node among its siblings.
///
/// Ids are derived from remote resource identities, so the same remote
/// resource maps to the same id on every refresh.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    /// Ids come from node builders only; resource names are not re-checked.
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NodeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Validates a node id.
pub(crate) fn validate_node_id(id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        return Err(ValidationError::Field {
            field: "id".to_string(),
            message: "Node id cannot be empty".to_string(),
        });
    }
    if id.chars().any(char::is_control) {
        return Err(ValidationError::Format(format!(
            "Node id '{}' contains control characters",
            id.escape_debug()
        )));
    }
    Ok(())
}
