//! Koyeb provider error types

use thiserror::Error;
use vaultflow_cloud::CloudError;

#[derive(Error, Debug)]
pub enum KoyebError {
    #[error("KOYEB_TOKEN is not set. Create an API token at https://app.koyeb.com/user/settings/api")]
    MissingToken,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Config(#[from] vaultflow_config::ConfigError),

    #[error("Koyeb API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Koyeb resource not found: {0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Cloud error: {0}")]
    CloudError(#[from] CloudError),
}

impl From<KoyebError> for CloudError {
    fn from(err: KoyebError) -> Self {
        match err {
            KoyebError::MissingToken => CloudError::InvalidConfig(err.to_string()),
            KoyebError::InvalidConfig(msg) => CloudError::InvalidConfig(msg),
            KoyebError::Config(e) => CloudError::Config(e),
            KoyebError::Api {
                status: 409,
                message,
            } => CloudError::ResourceAlreadyExists(message),
            KoyebError::NotFound(id) => CloudError::ResourceNotFound(id),
            KoyebError::JsonError(e) => CloudError::Json(e),
            KoyebError::CloudError(e) => e,
            other => CloudError::ApiError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, KoyebError>;
