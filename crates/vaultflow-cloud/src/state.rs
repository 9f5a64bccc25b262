//! State management for deployed resources
//!
//! Each stack keeps its state in `.vaultflow/<stack>.state.json`, which
//! records the remote id and submitted properties of every managed resource
//! along with the last exported outputs.

use crate::error::{CloudError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const STATE_VERSION: u32 = 1;

const STALE_LOCK_MINUTES: i64 = 60;
const STATE_DIR: &str = ".vaultflow";

/// Everything recorded for one stack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalState {
    /// State file version
    pub version: u32,

    /// Last modified timestamp
    pub updated_at: DateTime<Utc>,

    /// Resources indexed by type:name
    pub resources: BTreeMap<String, ResourceState>,

    /// Exported stack outputs from the last successful `up`
    #[serde(default)]
    pub outputs: BTreeMap<String, String>,
}

impl Default for GlobalState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: Utc::now(),
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }
}

impl GlobalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a resource
    pub fn set_resource(&mut self, key: String, state: ResourceState) {
        self.resources.insert(key, state);
        self.updated_at = Utc::now();
    }

    /// Remove a resource
    pub fn remove_resource(&mut self, key: &str) -> Option<ResourceState> {
        let result = self.resources.remove(key);
        if result.is_some() {
            self.updated_at = Utc::now();
        }
        result
    }

    pub fn get_resource(&self, key: &str) -> Option<&ResourceState> {
        self.resources.get(key)
    }

    pub fn set_outputs(&mut self, outputs: BTreeMap<String, String>) {
        self.outputs = outputs;
        self.updated_at = Utc::now();
    }
}

/// State of a single deployed resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Provider-specific resource ID
    pub id: String,

    /// Resource type
    pub resource_type: String,

    /// Name of the provider binding that manages it
    #[serde(default)]
    pub provider: String,

    /// Properties submitted at the last create or update
    #[serde(default)]
    pub properties: serde_json::Value,

    /// Current status
    pub status: ResourceStatus,

    /// Attributes reported back by the platform (URI, app id, ...)
    pub attributes: HashMap<String, serde_json::Value>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl ResourceState {
    pub fn new(id: impl Into<String>, resource_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            resource_type: resource_type.into(),
            provider: String::new(),
            properties: serde_json::Value::Null,
            status: ResourceStatus::Unknown,
            attributes: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_status(mut self, status: ResourceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.attributes.insert(key.into(), value);
        self.updated_at = Utc::now();
    }

    pub fn get_attribute<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Status of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    /// Being created or restarted
    Provisioning,
    /// Running and passing health checks
    Healthy,
    /// Running but failing health checks
    Degraded,
    /// Paused or stopped
    Stopped,
    /// Being deleted or gone
    Deleted,
    /// Platform reported an error
    Error,
    Unknown,
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceStatus::Provisioning => write!(f, "provisioning"),
            ResourceStatus::Healthy => write!(f, "healthy"),
            ResourceStatus::Degraded => write!(f, "degraded"),
            ResourceStatus::Stopped => write!(f, "stopped"),
            ResourceStatus::Deleted => write!(f, "deleted"),
            ResourceStatus::Error => write!(f, "error"),
            ResourceStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Reads and writes the state file of one stack
#[derive(Debug, Clone)]
pub struct StateManager {
    project_root: PathBuf,
    stack: String,
}

impl StateManager {
    pub fn new(project_root: impl AsRef<Path>, stack: impl Into<String>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
            stack: stack.into(),
        }
    }

    pub fn stack(&self) -> &str {
        &self.stack
    }

    fn state_dir(&self) -> PathBuf {
        self.project_root.join(STATE_DIR)
    }

    pub fn state_path(&self) -> PathBuf {
        self.state_dir().join(format!("{}.state.json", self.stack))
    }

    fn backup_path(&self) -> PathBuf {
        self.state_dir()
            .join(format!("{}.state.json.backup", self.stack))
    }

    fn lock_path(&self) -> PathBuf {
        self.state_dir().join(format!("{}.lock.json", self.stack))
    }

    async fn ensure_state_dir(&self) -> Result<()> {
        let dir = self.state_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created state directory: {}", dir.display());
        }
        Ok(())
    }

    /// Load the current state; a missing file is an empty state
    pub async fn load(&self) -> Result<GlobalState> {
        let path = self.state_path();
        if !path.exists() {
            tracing::debug!("State file not found, returning empty state");
            return Ok(GlobalState::new());
        }

        let content = fs::read_to_string(&path).await?;
        let state: GlobalState = serde_json::from_str(&content)?;

        if state.version > STATE_VERSION {
            return Err(CloudError::StateError(format!(
                "State file version {} is newer than supported version {}",
                state.version, STATE_VERSION
            )));
        }

        tracing::debug!("Loaded state with {} resources", state.resources.len());
        Ok(state)
    }

    /// Save the state, keeping the previous file as a backup
    pub async fn save(&self, state: &GlobalState) -> Result<()> {
        self.ensure_state_dir().await?;

        let path = self.state_path();
        let backup = self.backup_path();

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
        }

        let content = serde_json::to_string_pretty(state)?;
        fs::write(&path, content).await?;

        tracing::debug!("Saved state with {} resources", state.resources.len());
        Ok(())
    }

    /// Acquire the stack lock
    ///
    /// The lock file is created exclusively. A lock older than
    /// `STALE_LOCK_MINUTES` is taken over.
    pub async fn acquire_lock(&self) -> Result<StateLock> {
        self.ensure_state_dir().await?;

        let lock_path = self.lock_path();
        let info = LockInfo {
            holder: lock_holder(),
            acquired_at: Utc::now(),
        };
        let content = serde_json::to_vec_pretty(&info)?;

        let created = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
            .await;

        match created {
            Ok(mut file) => file.write_all(&content).await?,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let existing: LockInfo =
                    serde_json::from_str(&fs::read_to_string(&lock_path).await?)?;
                let age = Utc::now().signed_duration_since(existing.acquired_at);
                if age.num_minutes() < STALE_LOCK_MINUTES {
                    return Err(CloudError::LockError(format!(
                        "Stack '{}' is locked by {} since {}",
                        self.stack, existing.holder, existing.acquired_at
                    )));
                }
                tracing::warn!(
                    "Taking over stale lock of stack {} held by {}",
                    self.stack,
                    existing.holder
                );
                fs::write(&lock_path, &content).await?;
            }
            Err(e) => return Err(e.into()),
        }

        tracing::debug!("Acquired state lock for stack {}", self.stack);
        Ok(StateLock {
            lock_path,
            released: false,
        })
    }
}

fn lock_holder() -> String {
    let host = std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("HOST"))
        .unwrap_or_else(|_| "unknown".to_string());
    format!("{}:{}", host, std::process::id())
}

#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    holder: String,
    acquired_at: DateTime<Utc>,
}

/// RAII guard for the state lock
#[derive(Debug)]
pub struct StateLock {
    lock_path: PathBuf,
    released: bool,
}

impl StateLock {
    /// Remove the lock file; dropping the guard does the same without
    /// reporting errors
    pub async fn release(mut self) -> Result<()> {
        self.released = true;
        match fs::remove_file(&self.lock_path).await {
            Ok(()) => {
                tracing::debug!("Released state lock {}", self.lock_path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}
