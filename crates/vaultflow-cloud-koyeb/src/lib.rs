//! Koyeb provider for vaultflow
//!
//! This crate implements the CloudProvider trait for Koyeb, deploying Vault
//! as a Koyeb service built from a GitHub repository with a Dockerfile.
//!
//! # Configuration
//!
//! - `hashicorp_vault:github_repo`, `github_repo_branch`, `dockerfile_path`
//! - `koyeb:resource_name`, `service_name`, `service_type`,
//!   `service_instance_vcpu`, `service_instance_memory`,
//!   `service_instance_disk`, `service_instance_port` (`"<port>,<protocol>"`)
//!
//! # Requirements
//!
//! - `KOYEB_TOKEN` must hold a Koyeb API token
//!
//! # Example
//!
//! ```ignore
//! use vaultflow_cloud::{CloudProvider, Stack};
//! use vaultflow_cloud_koyeb::KoyebCloudProvider;
//!
//! let stack = Arc::new(Stack::new("dev"));
//! let provider = KoyebCloudProvider::new(stack.clone(), config, env)?;
//!
//! let service = provider.deploy().await?;
//! stack.export("service_url", service.uri()).await;
//! stack.up().await?;
//! ```

pub mod api;
pub mod definition;
pub mod deployment;
pub mod error;
pub mod provider;

pub use api::KoyebApi;
pub use definition::{EnvVar, GithubSource, InstanceTypes, ServiceDefinition, ServicePort};
pub use deployment::DeploymentDefinition;
pub use error::{KoyebError, Result};
pub use provider::{KoyebCloudProvider, SERVICE_RESOURCE_TYPE};
