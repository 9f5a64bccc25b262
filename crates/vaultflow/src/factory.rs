//! Provider registry

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};
use vaultflow_cloud::{CloudError, CloudProvider, ProviderBinding, Result, Stack};
use vaultflow_cloud_koyeb::KoyebCloudProvider;
use vaultflow_config::{StackConfig, VaultEnvironment};

/// Everything a provider is constructed from
#[derive(Debug, Clone)]
pub struct ProviderContext {
    pub stack: Arc<Stack>,
    pub config: Arc<StackConfig>,
    pub env: VaultEnvironment,
    /// Overrides the binding the provider would build from its own settings
    pub binding: Option<ProviderBinding>,
}

type Constructor = fn(ProviderContext) -> Result<Box<dyn CloudProvider>>;

static PROVIDERS: LazyLock<BTreeMap<&'static str, Constructor>> =
    LazyLock::new(|| BTreeMap::from([("koyeb", koyeb as Constructor)]));

fn koyeb(ctx: ProviderContext) -> Result<Box<dyn CloudProvider>> {
    let provider = match ctx.binding {
        Some(binding) => KoyebCloudProvider::with_binding(ctx.stack, ctx.config, ctx.env, binding),
        None => KoyebCloudProvider::new(ctx.stack, ctx.config, ctx.env)?,
    };
    Ok(Box::new(provider))
}

/// Registered provider names, sorted
pub fn supported_providers() -> Vec<&'static str> {
    PROVIDERS.keys().copied().collect()
}

/// Construct the provider registered under `name` (case-sensitive)
pub fn get_cloud_provider(name: &str, ctx: ProviderContext) -> Result<Box<dyn CloudProvider>> {
    let constructor = PROVIDERS
        .get(name)
        .ok_or_else(|| CloudError::ProviderNotFound {
            name: name.to_string(),
            available: supported_providers().into_iter().map(String::from).collect(),
        })?;

    tracing::debug!("Selected cloud provider {}", name);
    constructor(ctx)
}
