//! Resource engine
//!
//! A [`Stack`] collects resource registrations and exported outputs while the
//! deployment program runs, then applies them through each resource's
//! [`ResourceBackend`] in [`Stack::up`]. Outputs handed out at registration
//! time resolve during that apply.

use crate::action::{ActionType, ApplyResult, Plan};
use crate::error::{CloudError, Result};
use crate::output::{Output, OutputResolver};
use crate::resource::{ResourceConfig, ResourceOptions, resource_key};
use crate::state::{GlobalState, ResourceState, StateManager};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Platform API that creates, updates and deletes resources
#[async_trait]
pub trait ResourceBackend: Send + Sync {
    /// Backend name, used in logs
    fn name(&self) -> &str;

    /// Create the resource and report its initial state
    async fn create(&self, resource: &ResourceConfig) -> Result<ResourceState>;

    /// Update an existing resource in place
    async fn update(
        &self,
        current: &ResourceState,
        resource: &ResourceConfig,
    ) -> Result<ResourceState>;

    /// Delete a resource
    async fn delete(&self, current: &ResourceState) -> Result<()>;
}

struct Registration {
    config: ResourceConfig,
    backend: Arc<dyn ResourceBackend>,
    resolver: OutputResolver<ResourceState>,
}

#[derive(Default)]
struct StackInner {
    registrations: Vec<Registration>,
    exports: Vec<(String, Output<String>)>,
}

/// Outcome of [`Stack::up`]
#[derive(Debug, Clone)]
pub struct UpResult {
    pub plan: Plan,
    pub apply: ApplyResult,
    pub outputs: BTreeMap<String, String>,
}

/// Desired resources and outputs of one stack
pub struct Stack {
    name: String,
    state: Option<StateManager>,
    inner: Mutex<StackInner>,
}

impl std::fmt::Debug for Stack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stack")
            .field("name", &self.name)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Stack {
    /// A stack without persisted state; every resource is created fresh
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: None,
            inner: Mutex::new(StackInner::default()),
        }
    }

    /// A stack whose state is read from and written to `state`
    pub fn with_state(state: StateManager) -> Self {
        Self {
            name: state.stack().to_string(),
            state: Some(state),
            inner: Mutex::new(StackInner::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a resource to be applied by [`Stack::up`]
    ///
    /// Logical names are unique per resource type; registering the same
    /// type and name twice fails with [`CloudError::ResourceAlreadyExists`].
    pub async fn register_resource(
        &self,
        resource_type: &str,
        name: &str,
        properties: serde_json::Value,
        opts: ResourceOptions,
    ) -> Result<Output<ResourceState>> {
        let key = resource_key(resource_type, name);
        let binding = opts
            .provider
            .ok_or_else(|| CloudError::ProviderNotBound(key.clone()))?;

        let mut inner = self.inner.lock().await;
        if inner.registrations.iter().any(|r| r.config.key() == key) {
            return Err(CloudError::ResourceAlreadyExists(key));
        }

        let (output, resolver) = Output::pending(key.clone());
        inner.registrations.push(Registration {
            config: ResourceConfig::new(resource_type, name, binding.name(), properties),
            backend: binding.backend(),
            resolver,
        });

        tracing::info!("Registered {} (provider: {})", key, binding.name());
        Ok(output)
    }

    /// Declare a stack output
    pub async fn export(&self, name: impl Into<String>, value: Output<String>) {
        let name = name.into();
        let mut inner = self.inner.lock().await;
        if let Some(existing) = inner.exports.iter_mut().find(|(n, _)| *n == name) {
            tracing::warn!("Output '{}' exported twice, keeping the last value", name);
            existing.1 = value;
        } else {
            inner.exports.push((name, value));
        }
    }

    /// Registered resources in registration order
    pub async fn resources(&self) -> Vec<ResourceConfig> {
        let inner = self.inner.lock().await;
        inner
            .registrations
            .iter()
            .map(|r| r.config.clone())
            .collect()
    }

    /// Names of declared outputs
    pub async fn export_names(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        inner.exports.iter().map(|(n, _)| n.clone()).collect()
    }

    async fn load_state(&self) -> Result<GlobalState> {
        match &self.state {
            Some(manager) => manager.load().await,
            None => Ok(GlobalState::new()),
        }
    }

    async fn save_state(&self, state: &GlobalState) -> Result<()> {
        match &self.state {
            Some(manager) => manager.save(state).await,
            None => Ok(()),
        }
    }

    /// Compute what [`Stack::up`] would do without calling any backend
    pub async fn preview(&self) -> Result<Plan> {
        let current = self.load_state().await?;
        let desired = self.resources().await;
        Ok(Plan::diff(&desired, &current))
    }

    /// Apply all registrations, resolve outputs and persist state
    ///
    /// Fails on the first backend error. Resources applied before the
    /// failure stay recorded in state. Resources to delete must still have
    /// a registered backend; otherwise `up` fails before any backend call.
    pub async fn up(&self) -> Result<UpResult> {
        let lock = match &self.state {
            Some(manager) => Some(manager.acquire_lock().await?),
            None => None,
        };

        let mut global = self.load_state().await?;
        let (registrations, exports) = {
            let mut inner = self.inner.lock().await;
            (
                std::mem::take(&mut inner.registrations),
                std::mem::take(&mut inner.exports),
            )
        };

        let desired: Vec<ResourceConfig> = registrations.iter().map(|r| r.config.clone()).collect();
        let plan = Plan::diff(&desired, &global);
        tracing::info!("Stack {}: {}", self.name, plan.summary());

        let start = std::time::Instant::now();
        let mut apply = ApplyResult::new();
        let backends: HashMap<String, Arc<dyn ResourceBackend>> = registrations
            .iter()
            .map(|r| (r.config.provider.clone(), r.backend.clone()))
            .collect();

        // resolve every deletion up front so a missing backend fails the run
        // before anything is created
        let mut deletions = Vec::new();
        for action in plan.actions_by_type(ActionType::Delete) {
            let Some(existing) = global.get_resource(&action.key).cloned() else {
                continue;
            };
            let backend = backends.get(&existing.provider).cloned().ok_or_else(|| {
                tracing::error!(
                    "{} is managed by provider '{}', which is no longer registered; run destroy first",
                    action.key,
                    existing.provider
                );
                CloudError::ProviderNotBound(action.key.clone())
            })?;
            deletions.push((action.key.clone(), existing, backend));
        }

        for registration in registrations {
            let key = registration.config.key();
            let action_type = plan
                .get(&key)
                .map(|a| a.action_type)
                .unwrap_or(ActionType::Create);

            let applied = match (action_type, global.get_resource(&key)) {
                (ActionType::NoOp, Some(existing)) => Ok(existing.clone()),
                (ActionType::Update, Some(existing)) => {
                    tracing::info!("Updating {} via {}", key, registration.backend.name());
                    registration
                        .backend
                        .update(existing, &registration.config)
                        .await
                }
                _ => {
                    tracing::info!("Creating {} via {}", key, registration.backend.name());
                    registration.backend.create(&registration.config).await
                }
            };

            let mut state = match applied {
                Ok(state) => state,
                Err(e) => {
                    self.save_state(&global).await?;
                    return Err(e);
                }
            };
            state.provider = registration.config.provider.clone();
            state.properties = registration.config.properties.clone();

            global.set_resource(key.clone(), state.clone());
            registration.resolver.resolve(state);
            apply.add_success(key.clone(), action_type, format!("{} {}", action_type, key));
        }

        for (key, existing, backend) in deletions {
            tracing::info!("Deleting {} via {}", key, backend.name());
            if let Err(e) = backend.delete(&existing).await {
                self.save_state(&global).await?;
                return Err(e);
            }
            global.remove_resource(&key);
            apply.add_success(key.clone(), ActionType::Delete, format!("delete {}", key));
        }

        let mut outputs = BTreeMap::new();
        for (name, value) in exports {
            let resolved = match value.resolve().await {
                Ok(resolved) => resolved,
                Err(e) => {
                    self.save_state(&global).await?;
                    return Err(e);
                }
            };
            tracing::debug!("Output {} = {}", name, resolved);
            outputs.insert(name, resolved);
        }

        global.set_outputs(outputs.clone());
        self.save_state(&global).await?;
        apply.duration_ms = start.elapsed().as_millis() as u64;

        if let Some(lock) = lock {
            lock.release().await?;
        }

        Ok(UpResult {
            plan,
            apply,
            outputs,
        })
    }

    /// Delete every resource recorded in state through `backend`
    pub async fn destroy(&self, backend: &dyn ResourceBackend) -> Result<ApplyResult> {
        let lock = match &self.state {
            Some(manager) => Some(manager.acquire_lock().await?),
            None => None,
        };

        let mut global = self.load_state().await?;
        let start = std::time::Instant::now();
        let mut result = ApplyResult::new();

        let keys: Vec<String> = global.resources.keys().cloned().collect();
        for key in keys {
            let Some(existing) = global.get_resource(&key).cloned() else {
                continue;
            };
            tracing::info!("Deleting {} via {}", key, backend.name());
            if let Err(e) = backend.delete(&existing).await {
                self.save_state(&global).await?;
                return Err(e);
            }
            global.remove_resource(&key);
            result.add_success(key.clone(), ActionType::Delete, format!("delete {}", key));
        }

        global.set_outputs(BTreeMap::new());
        self.save_state(&global).await?;
        result.duration_ms = start.elapsed().as_millis() as u64;

        if let Some(lock) = lock {
            lock.release().await?;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ProviderBinding;
    use crate::state::ResourceStatus;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingBackend {
        calls: StdMutex<Vec<String>>,
        failing: Vec<String>,
    }

    impl RecordingBackend {
        /// Backend whose listed calls (`"create vault"`, `"delete id-old"`) fail
        fn failing(calls: &[&str]) -> Self {
            Self {
                failing: calls.iter().map(|c| c.to_string()).collect(),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) -> Result<()> {
            let fails = self.failing.contains(&call);
            self.calls.lock().unwrap().push(call);
            if fails {
                return Err(CloudError::ApiError("quota exceeded".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ResourceBackend for RecordingBackend {
        fn name(&self) -> &str {
            "recording"
        }

        async fn create(&self, resource: &ResourceConfig) -> Result<ResourceState> {
            self.record(format!("create {}", resource.name))?;
            Ok(ResourceState::new(format!("id-{}", resource.name), &resource.resource_type)
                .with_status(ResourceStatus::Healthy)
                .with_attribute("uri", json!(format!("https://{}.example.app", resource.name))))
        }

        async fn update(
            &self,
            current: &ResourceState,
            resource: &ResourceConfig,
        ) -> Result<ResourceState> {
            self.record(format!("update {}", resource.name))?;
            Ok(current.clone())
        }

        async fn delete(&self, current: &ResourceState) -> Result<()> {
            self.record(format!("delete {}", current.id))
        }
    }

    fn binding(backend: &Arc<RecordingBackend>) -> ResourceOptions {
        bound_to("test", backend)
    }

    fn bound_to(name: &str, backend: &Arc<RecordingBackend>) -> ResourceOptions {
        ResourceOptions::with_provider(ProviderBinding::new(name, backend.clone()))
    }

    async fn state_keys(manager: &StateManager) -> Vec<String> {
        manager.load().await.unwrap().resources.keys().cloned().collect()
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let backend = Arc::new(RecordingBackend::default());
        let stack = Stack::new("dev");

        stack
            .register_resource("svc", "vault", json!({}), binding(&backend))
            .await
            .unwrap();
        let err = stack
            .register_resource("svc", "vault", json!({}), binding(&backend))
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::ResourceAlreadyExists(ref key) if key == "svc:vault"));
        assert!(err.is_remote());

        // same name under another type is a different resource
        stack
            .register_resource("app", "vault", json!({}), binding(&backend))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_registration_requires_provider() {
        let stack = Stack::new("dev");
        let err = stack
            .register_resource("svc", "vault", json!({}), ResourceOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::ProviderNotBound(_)));
    }

    #[tokio::test]
    async fn test_up_resolves_outputs() {
        let backend = Arc::new(RecordingBackend::default());
        let stack = Stack::new("dev");

        let state = stack
            .register_resource("svc", "vault", json!({"port": 8200}), binding(&backend))
            .await
            .unwrap();
        let uri = state.apply(|s| s.get_attribute::<String>("uri").unwrap_or_default());
        stack.export("service_url", uri).await;

        let result = stack.up().await.unwrap();
        assert_eq!(backend.calls(), vec!["create vault"]);
        assert_eq!(result.apply.succeeded.len(), 1);
        assert_eq!(result.outputs["service_url"], "https://vault.example.app");
    }

    #[tokio::test]
    async fn test_up_propagates_backend_error() {
        let backend = Arc::new(RecordingBackend::failing(&["create vault"]));
        let stack = Stack::new("dev");
        stack
            .register_resource("svc", "vault", json!({}), binding(&backend))
            .await
            .unwrap();

        let err = stack.up().await.unwrap_err();
        assert!(matches!(err, CloudError::ApiError(ref msg) if msg == "quota exceeded"));
    }

    #[tokio::test]
    async fn test_up_with_state_updates_and_deletes() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(RecordingBackend::default());

        let first = Stack::with_state(StateManager::new(temp_dir.path(), "dev"));
        first
            .register_resource("svc", "vault", json!({"port": 8200}), binding(&backend))
            .await
            .unwrap();
        first
            .register_resource("svc", "old", json!({}), binding(&backend))
            .await
            .unwrap();
        first.up().await.unwrap();

        let second = Stack::with_state(StateManager::new(temp_dir.path(), "dev"));
        second
            .register_resource("svc", "vault", json!({"port": 8201}), binding(&backend))
            .await
            .unwrap();
        let plan = second.preview().await.unwrap();
        assert_eq!(plan.summary().update, 1);
        assert_eq!(plan.summary().delete, 1);

        second.up().await.unwrap();
        assert_eq!(
            backend.calls(),
            vec!["create vault", "create old", "update vault", "delete id-old"]
        );

        let third = Stack::with_state(StateManager::new(temp_dir.path(), "dev"));
        third
            .register_resource("svc", "vault", json!({"port": 8201}), binding(&backend))
            .await
            .unwrap();
        let result = third.up().await.unwrap();
        assert!(!result.plan.has_changes);
        assert_eq!(backend.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_destroy_clears_state() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(RecordingBackend::default());
        let manager = StateManager::new(temp_dir.path(), "dev");

        let stack = Stack::with_state(manager.clone());
        stack
            .register_resource("svc", "vault", json!({}), binding(&backend))
            .await
            .unwrap();
        stack
            .export("service_url", Output::known("service_url", "x".to_string()))
            .await;
        stack.up().await.unwrap();

        let result = Stack::with_state(manager.clone())
            .destroy(backend.as_ref())
            .await
            .unwrap();
        assert_eq!(result.succeeded.len(), 1);

        let state = manager.load().await.unwrap();
        assert!(state.resources.is_empty());
        assert!(state.outputs.is_empty());
    }

    #[tokio::test]
    async fn test_failed_create_keeps_earlier_resources_in_state() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path(), "dev");
        let backend = Arc::new(RecordingBackend::failing(&["create second"]));

        let stack = Stack::with_state(manager.clone());
        for name in ["first", "second"] {
            stack
                .register_resource("svc", name, json!({}), binding(&backend))
                .await
                .unwrap();
        }
        stack
            .export("service_url", Output::known("service_url", "x".to_string()))
            .await;

        let err = stack.up().await.unwrap_err();
        assert!(matches!(err, CloudError::ApiError(_)));
        assert_eq!(backend.calls(), vec!["create first", "create second"]);

        assert_eq!(state_keys(&manager).await, vec!["svc:first"]);
        assert!(manager.load().await.unwrap().outputs.is_empty());
        // the lock does not outlive the failed run
        manager.acquire_lock().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_all_resources_in_state() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path(), "dev");
        let backend = Arc::new(RecordingBackend::failing(&["delete id-old"]));

        let first = Stack::with_state(manager.clone());
        for name in ["vault", "old"] {
            first
                .register_resource("svc", name, json!({}), binding(&backend))
                .await
                .unwrap();
        }
        first.up().await.unwrap();

        let second = Stack::with_state(manager.clone());
        for name in ["vault", "new"] {
            second
                .register_resource("svc", name, json!({}), binding(&backend))
                .await
                .unwrap();
        }
        let err = second.up().await.unwrap_err();
        assert!(matches!(err, CloudError::ApiError(_)));
        assert_eq!(
            backend.calls(),
            vec!["create vault", "create old", "create new", "delete id-old"]
        );

        assert_eq!(
            state_keys(&manager).await,
            vec!["svc:new", "svc:old", "svc:vault"]
        );
    }

    #[tokio::test]
    async fn test_unbound_delete_fails_before_any_backend_call() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path(), "dev");
        let backend = Arc::new(RecordingBackend::default());

        let first = Stack::with_state(manager.clone());
        first
            .register_resource("svc", "vault", json!({}), bound_to("koyeb-old", &backend))
            .await
            .unwrap();
        first.up().await.unwrap();

        // binding and logical name both changed
        let second = Stack::with_state(manager.clone());
        second
            .register_resource("svc", "vault2", json!({}), bound_to("koyeb-new", &backend))
            .await
            .unwrap();
        let err = second.up().await.unwrap_err();
        assert!(matches!(err, CloudError::ProviderNotBound(ref key) if key == "svc:vault"));

        assert_eq!(backend.calls(), vec!["create vault"]);
        assert_eq!(state_keys(&manager).await, vec!["svc:vault"]);
        manager.acquire_lock().await.unwrap();
    }
}
