//! The deployment program
//!
//! Registers the Vault service on the stack and exports its URL. Nothing is
//! applied here; [`Stack::up`](vaultflow_cloud::Stack::up) does that.

use crate::deployer::DeployerService;
use crate::factory::{self, ProviderContext};
use vaultflow_cloud::{Result, ServiceHandle};

/// Project-level key selecting the provider
pub const CLOUD_PROVIDER_KEY: &str = "cloud_provider";

/// Name of the exported service URL
pub const SERVICE_URL_OUTPUT: &str = "service_url";

/// What the program registered
#[derive(Debug)]
pub struct Deployment {
    pub deployer: DeployerService,
    pub service: ServiceHandle,
}

pub async fn run(ctx: ProviderContext) -> Result<Deployment> {
    let cloud_provider_name = ctx.config.project().require(CLOUD_PROVIDER_KEY)?;
    let stack = ctx.stack.clone();

    let cloud_provider = factory::get_cloud_provider(&cloud_provider_name, ctx)?;
    tracing::info!(
        "Deploying Vault to {} (stack: {})",
        cloud_provider.display_name(),
        stack.name()
    );

    let deployer = DeployerService::new(cloud_provider);
    let service = deployer.deploy_service().await?;

    stack.export(SERVICE_URL_OUTPUT, service.uri()).await;

    Ok(Deployment { deployer, service })
}
