use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "Stack file for stack '{0}' not found. Looked in:\n\
        - current directory: Vaultflow.{0}.yaml, Vaultflow.{0}.yml\n\
        - ./.vaultflow/ directory\n\
        - ~/.config/vaultflow/\n\
        Set VAULTFLOW_STACK_FILE to point at a file directly"
    )]
    StackFileNotFound(String),

    #[error("Missing required configuration value '{0}'")]
    MissingKey(String),

    #[error("Configuration value '{key}' is invalid: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse stack file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
