//! Cloud provider error types

use thiserror::Error;

/// Cloud provider errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error(
        "Cloud provider '{name}' is not supported. Available providers: {}",
        .available.join(", ")
    )]
    ProviderNotFound { name: String, available: Vec<String> },

    #[error("No provider bound to resource: {0}")]
    ProviderNotBound(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Resource already exists: {0}")]
    ResourceAlreadyExists(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Config(#[from] vaultflow_config::ConfigError),

    #[error("Output '{0}' was never resolved")]
    Unresolved(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    /// Whether the error came back from the remote platform or the engine
    /// rejecting a resource, as opposed to local configuration
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            CloudError::ApiError(_)
                | CloudError::ResourceAlreadyExists(_)
                | CloudError::ResourceNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
