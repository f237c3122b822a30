use thiserror::Error;

/// Error type for neighbour cache, provider and edge store operations.
#[derive(Debug, Error)]
pub enum NeighbourError {
    #[error("storage error: {0}")]
    StorageError(String),
    #[error("schema error: {0}")]
    SchemaError(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("document error: {0}")]
    DocumentError(String),
    #[error("resource limit exceeded: {requested} bytes requested, {current} of {limit} in use")]
    ResourceLimitExceeded {
        requested: usize,
        current: usize,
        limit: usize,
    },
    #[error("contract violation: {0}")]
    ContractViolation(String),
}

impl NeighbourError {
    pub fn storage<T: Into<String>>(msg: T) -> Self {
        NeighbourError::StorageError(msg.into())
    }

    pub fn schema<T: Into<String>>(msg: T) -> Self {
        NeighbourError::SchemaError(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        NeighbourError::NotFound(msg.into())
    }

    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        NeighbourError::InvalidInput(msg.into())
    }

    pub fn document<T: Into<String>>(msg: T) -> Self {
        NeighbourError::DocumentError(msg.into())
    }

    pub fn contract<T: Into<String>>(msg: T) -> Self {
        NeighbourError::ContractViolation(msg.into())
    }

    /// True for errors raised because a caller broke the cache/provider call protocol.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, NeighbourError::ContractViolation(_))
    }
}
