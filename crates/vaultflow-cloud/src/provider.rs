//! Cloud provider trait definition

use crate::engine::ResourceBackend;
use crate::error::Result;
use crate::output::Output;
use crate::state::{ResourceState, ResourceStatus};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cloud provider abstraction trait
///
/// A provider turns its configuration into a service registration on the
/// engine. New deployment targets are added as new implementations; callers
/// only ever see `dyn CloudProvider`.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Returns the provider name (e.g., "koyeb")
    fn name(&self) -> &str;

    /// Returns the provider display name for UI
    fn display_name(&self) -> &str;

    /// Register the Vault service with the engine
    ///
    /// Registering twice within one run fails with
    /// [`CloudError::ResourceAlreadyExists`](crate::CloudError::ResourceAlreadyExists).
    async fn deploy(&self) -> Result<ServiceHandle>;

    /// Backend this provider's resources are applied through
    fn backend(&self) -> Arc<dyn ResourceBackend>;
}

/// Runtime status of a deployed service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    /// Externally reachable URI
    pub uri: String,

    pub status: ResourceStatus,
}

impl From<ResourceState> for ServiceStatus {
    fn from(state: ResourceState) -> Self {
        Self {
            uri: state.get_attribute("uri").unwrap_or_default(),
            status: state.status,
        }
    }
}

/// Reference to a registered service
///
/// The engine owns the resource; the handle only exposes its status once
/// the resource has been applied.
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    pub resource_type: String,
    pub name: String,
    pub status: Output<ServiceStatus>,
}

impl ServiceHandle {
    /// Deferred URI of the service
    pub fn uri(&self) -> Output<String> {
        self.status.clone().apply(|status| status.uri)
    }
}
