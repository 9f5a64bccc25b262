//! Configuration loading for vaultflow
//!
//! Stack files hold the namespaced settings of one deployment target
//! (`Vaultflow.<stack>.yaml`). Secrets and credentials come from the
//! process environment instead and are read through [`VaultEnvironment`].

pub mod env;
pub mod error;
pub mod stack;

pub use env::{DEFAULT_VAULT_ADDR, VaultEnvironment};
pub use error::*;
pub use stack::{Config, ConfigValue, PROJECT_NAMESPACE, StackConfig};

use std::path::PathBuf;

/// Environment variable pointing directly at a stack file
pub const STACK_FILE_ENV: &str = "VAULTFLOW_STACK_FILE";

/// File names tried for a stack, in priority order
pub fn stack_file_candidates(stack: &str) -> [String; 2] {
    [
        format!("Vaultflow.{}.yaml", stack),
        format!("Vaultflow.{}.yml", stack),
    ]
}

/// Locate the stack file for `stack`
///
/// Search order:
/// 1. `VAULTFLOW_STACK_FILE` (direct path)
/// 2. current directory: `Vaultflow.<stack>.yaml`, `Vaultflow.<stack>.yml`
/// 3. `./.vaultflow/` with the same names
/// 4. `~/.config/vaultflow/` with the same names
pub fn find_stack_file(stack: &str) -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(STACK_FILE_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::debug!(
            "{} points at missing file {}, continuing search",
            STACK_FILE_ENV,
            path.display()
        );
    }

    let current_dir = std::env::current_dir()?;
    let candidates = stack_file_candidates(stack);

    let mut search_dirs = vec![current_dir.clone(), current_dir.join(".vaultflow")];
    if let Some(config_dir) = dirs::config_dir() {
        search_dirs.push(config_dir.join("vaultflow"));
    }

    for dir in search_dirs.iter().filter(|d| d.is_dir()) {
        for filename in &candidates {
            let path = dir.join(filename);
            if path.exists() {
                tracing::debug!("Using stack file {}", path.display());
                return Ok(path);
            }
        }
    }

    Err(ConfigError::StackFileNotFound(stack.to_string()))
}

/// Locate and load the stack file for `stack`
pub fn load_stack(stack: &str) -> Result<StackConfig> {
    let path = find_stack_file(stack)?;
    StackConfig::load(stack, path)
}
