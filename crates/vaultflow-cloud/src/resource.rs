//! Resource registrations handed to the engine

use crate::engine::ResourceBackend;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Desired configuration of one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Resource type (e.g., "koyeb:index/service:Service")
    pub resource_type: String,

    /// Logical name, unique per type within a stack
    pub name: String,

    /// Name of the provider binding managing the resource
    pub provider: String,

    /// Resource-specific properties as submitted to the platform
    pub properties: serde_json::Value,
}

impl ResourceConfig {
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
        properties: serde_json::Value,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            provider: provider.into(),
            properties,
        }
    }

    /// Full resource key (type:name)
    pub fn key(&self) -> String {
        resource_key(&self.resource_type, &self.name)
    }

    /// Get a property as a specific type
    pub fn get_property<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.properties
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

pub(crate) fn resource_key(resource_type: &str, name: &str) -> String {
    format!("{}:{}", resource_type, name)
}

/// An explicitly configured provider instance
///
/// Binding resources to a named provider keeps accounts and regions apart:
/// each binding carries its own credentials through its backend.
#[derive(Clone)]
pub struct ProviderBinding {
    name: String,
    backend: Arc<dyn ResourceBackend>,
}

impl ProviderBinding {
    pub fn new(name: impl Into<String>, backend: Arc<dyn ResourceBackend>) -> Self {
        Self {
            name: name.into(),
            backend,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backend(&self) -> Arc<dyn ResourceBackend> {
        self.backend.clone()
    }
}

impl fmt::Debug for ProviderBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderBinding")
            .field("name", &self.name)
            .field("backend", &self.backend.name())
            .finish()
    }
}

/// Options attached to a resource registration
#[derive(Debug, Clone, Default)]
pub struct ResourceOptions {
    pub provider: Option<ProviderBinding>,
}

impl ResourceOptions {
    pub fn with_provider(provider: ProviderBinding) -> Self {
        Self {
            provider: Some(provider),
        }
    }
}
