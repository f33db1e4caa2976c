use thiserror::Error;

/// The main error type for Service Explorer operations.
///
/// Every failed call into the Azure management layer is reported as
/// [`ExplorerError::Remote`]; the remaining variants cover configuration
/// problems and broken contracts inside the node tree itself.
#[derive(Error, Debug)]
pub enum ExplorerError {
    /// A remote (network, authentication or API) call failed
    ///
    /// # Fields
    /// * `message` - A short, user-facing description of the failure
    /// * `error_log` - Detailed diagnostic output returned with the failure
    #[error("Azure command failed: {message}")]
    Remote { message: String, error_log: String },

    /// Represents validation failures with detailed context
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// An event wait handle was used after it was unregistered, or is unknown
    #[error("Event handle error: {0}")]
    EventHandle(String),

    /// A node did not carry the state an operation expected
    #[error("Invalid node state: {0}")]
    InvalidNode(String),

    /// A background task panicked or was cancelled before it completed
    #[error("Background task failed: {0}")]
    Task(String),
}

impl ExplorerError {
    /// Builds a remote failure without an attached error log.
    pub fn remote(message: impl Into<String>) -> Self {
        ExplorerError::Remote {
            message: message.into(),
            error_log: String::new(),
        }
    }

    /// Builds a remote failure carrying the diagnostic log of the call.
    pub fn remote_with_log(message: impl Into<String>, error_log: impl Into<String>) -> Self {
        ExplorerError::Remote {
            message: message.into(),
            error_log: error_log.into(),
        }
    }

    /// Returns the diagnostic log of a remote failure, if any.
    pub fn error_log(&self) -> Option<&str> {
        match self {
            ExplorerError::Remote { error_log, .. } if !error_log.is_empty() => Some(error_log),
            _ => None,
        }
    }
}

/// Specialized error type for validation failures.
///
/// This enum provides detailed context about why a validation
/// failed, including field-specific errors and format violations.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Represents a validation failure for a specific field
    ///
    /// # Fields
    /// * `field` - The name of the field that failed validation
    /// * `message` - A detailed message about why validation failed
    #[error("Field '{field}' validation failed: {message}")]
    Field { field: String, message: String },

    /// Represents format/syntax validation failures
    ///
    /// # Fields
    /// * `0` - Description of the format violation
    #[error("Format error: {0}")]
    Format(String),

    /// Represents violations of domain constraints
    ///
    /// # Fields
    /// * `0` - Description of the constraint violation
    #[error("Domain constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Type alias for Results that may fail with an ExplorerError
pub type ExplorerResult<T> = Result<T, ExplorerError>;
