//! vaultflow deploys a single HashiCorp Vault service to a cloud provider
//! selected by the stack configuration and exports its URL.

pub mod deployer;
pub mod factory;
pub mod program;

pub use deployer::DeployerService;
pub use factory::{ProviderContext, get_cloud_provider, supported_providers};
pub use program::{Deployment, SERVICE_URL_OUTPUT};
