//! Koyeb provider implementation

use crate::api::KoyebApi;
use crate::definition::{
    EnvVar, GithubSource, InstanceTypes, ServiceDefinition, ServicePort, parse_ports,
};
use crate::error::{KoyebError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use vaultflow_cloud::{
    CloudProvider, ProviderBinding, ResourceBackend, ResourceOptions, ServiceHandle,
    ServiceStatus, Stack,
};
use vaultflow_config::env::{AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, VAULT_ADDR, VAULT_INIT_JSON};
use vaultflow_config::{StackConfig, VaultEnvironment};

/// Engine resource type of a Koyeb service
pub const SERVICE_RESOURCE_TYPE: &str = "koyeb:index/service:Service";

/// Stack configuration namespace of this provider
pub const CONFIG_NAMESPACE: &str = "koyeb";

/// Stack configuration namespace of the Vault source
pub const VAULT_NAMESPACE: &str = "hashicorp_vault";

/// Deploys Vault as a Koyeb service built from a GitHub repository
pub struct KoyebCloudProvider {
    stack: Arc<Stack>,
    config: Arc<StackConfig>,
    env: VaultEnvironment,
    binding: ProviderBinding,
}

impl std::fmt::Debug for KoyebCloudProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KoyebCloudProvider")
            .field("stack", &self.stack.name())
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

impl KoyebCloudProvider {
    /// Provider bound to the Koyeb API with `KOYEB_TOKEN`
    ///
    /// The binding is named after `koyeb:resource_name`.
    pub fn new(
        stack: Arc<Stack>,
        config: Arc<StackConfig>,
        env: VaultEnvironment,
    ) -> Result<Self> {
        let resource_name = config.namespace(CONFIG_NAMESPACE).require("resource_name")?;
        let token = env.koyeb_token.clone().ok_or(KoyebError::MissingToken)?;
        let binding = ProviderBinding::new(resource_name, Arc::new(KoyebApi::new(token)));
        Ok(Self::with_binding(stack, config, env, binding))
    }

    /// Provider using an existing binding
    pub fn with_binding(
        stack: Arc<Stack>,
        config: Arc<StackConfig>,
        env: VaultEnvironment,
        binding: ProviderBinding,
    ) -> Self {
        Self {
            stack,
            config,
            env,
            binding,
        }
    }

    pub fn create_github_source(&self) -> Result<GithubSource> {
        let vault = self.config.namespace(VAULT_NAMESPACE);
        Ok(GithubSource {
            repository: vault.require("github_repo")?,
            branch: vault.require("github_repo_branch")?,
            dockerfile_path: vault.require("dockerfile_path")?,
        })
    }

    pub fn create_instance_config(&self) -> Result<InstanceTypes> {
        let koyeb = self.config.namespace(CONFIG_NAMESPACE);
        Ok(InstanceTypes {
            instance_type: koyeb.require("service_type")?,
            vcpu: koyeb.require_float("service_instance_vcpu")?,
            memory: koyeb.require_int("service_instance_memory")?,
            disk: koyeb.require_int("service_instance_disk")?,
        })
    }

    pub fn create_ports(&self) -> Result<Vec<ServicePort>> {
        let port = self
            .config
            .namespace(CONFIG_NAMESPACE)
            .require("service_instance_port")?;
        parse_ports(&port)
    }

    pub fn create_env_vars(&self) -> Vec<EnvVar> {
        vec![
            EnvVar::new(AWS_ACCESS_KEY_ID, self.env.aws_access_key_id.clone()),
            EnvVar::new(AWS_SECRET_ACCESS_KEY, self.env.aws_secret_access_key.clone()),
            EnvVar::new(VAULT_ADDR, Some(self.env.vault_addr.clone())),
            EnvVar::new(VAULT_INIT_JSON, self.env.vault_init_json.clone()),
        ]
    }

    /// Compose the full service definition
    pub fn service_definition(&self) -> Result<ServiceDefinition> {
        Ok(ServiceDefinition {
            name: self.service_name()?,
            github: self.create_github_source()?,
            instance_types: self.create_instance_config()?,
            ports: self.create_ports()?,
            env: self.create_env_vars(),
        })
    }

    fn service_name(&self) -> Result<String> {
        Ok(self
            .config
            .namespace(CONFIG_NAMESPACE)
            .require("service_name")?)
    }
}

#[async_trait]
impl CloudProvider for KoyebCloudProvider {
    fn name(&self) -> &str {
        "koyeb"
    }

    fn display_name(&self) -> &str {
        "Koyeb"
    }

    async fn deploy(&self) -> vaultflow_cloud::Result<ServiceHandle> {
        let definition = self.service_definition()?;
        let properties = serde_json::to_value(&definition)?;

        let state = self
            .stack
            .register_resource(
                SERVICE_RESOURCE_TYPE,
                &definition.name,
                properties,
                ResourceOptions::with_provider(self.binding.clone()),
            )
            .await?;

        Ok(ServiceHandle {
            resource_type: SERVICE_RESOURCE_TYPE.to_string(),
            name: definition.name,
            status: state.apply(ServiceStatus::from),
        })
    }

    fn backend(&self) -> Arc<dyn ResourceBackend> {
        self.binding.backend()
    }
}
