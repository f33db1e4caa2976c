use crate::core::domain::error::ValidationError;
use serde::{Deserialize, Serialize};

/// A validated TCP/UDP port number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Port(u16);

impl Port {
    /// The well-known Remote Desktop port.
    pub const REMOTE_DESKTOP: Port = Port(3389);

    /// Creates a validated port.
    pub fn new(port: u16) -> Result<Self, ValidationError> {
        validate_port(port)?;
        Ok(Self(port))
    }

    /// Returns the port number.
    pub fn get(&self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for Port {
    type Error = ValidationError;

    fn try_from(port: u16) -> Result<Self, Self::Error> {
        Port::new(port)
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

/// Validates a port number.
pub(crate) fn validate_port(port: u16) -> Result<(), ValidationError> {
    if port == 0 {
        return Err(ValidationError::Field {
            field: "port".to_string(),
            message: "Port cannot be 0".to_string(),
        });
    }
    Ok(())
}
