use vaultflow_cloud::{CloudProvider, Result, ServiceHandle};

/// Deploys the service through whichever provider it was given
pub struct DeployerService {
    cloud_provider: Box<dyn CloudProvider>,
}

impl DeployerService {
    pub fn new(cloud_provider: Box<dyn CloudProvider>) -> Self {
        Self { cloud_provider }
    }

    pub async fn deploy_service(&self) -> Result<ServiceHandle> {
        self.cloud_provider.deploy().await
    }

    pub fn cloud_provider(&self) -> &dyn CloudProvider {
        self.cloud_provider.as_ref()
    }
}

impl std::fmt::Debug for DeployerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployerService")
            .field("cloud_provider", &self.cloud_provider.name())
            .finish()
    }
}
