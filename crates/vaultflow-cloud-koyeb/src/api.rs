//! Koyeb REST API client
//!
//! Each Vault deployment maps to one Koyeb app holding one service. The app
//! owns the public domain the service URI is derived from. Service bodies
//! are sent as a [`DeploymentDefinition`] built from the stored
//! [`ServiceDefinition`].

use crate::definition::ServiceDefinition;
use crate::deployment::DeploymentDefinition;
use crate::error::{KoyebError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use vaultflow_cloud::{ResourceBackend, ResourceConfig, ResourceState, ResourceStatus};

pub const KOYEB_API_BASE: &str = "https://app.koyeb.com/v1";

/// Environment variable overriding [`KOYEB_API_BASE`]
pub const KOYEB_API_URL_ENV: &str = "KOYEB_API_URL";

/// Koyeb API client
pub struct KoyebApi {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl std::fmt::Debug for KoyebApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KoyebApi")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl KoyebApi {
    /// Client for the public API, or `KOYEB_API_URL` when set
    pub fn new(token: impl Into<String>) -> Self {
        let base_url =
            std::env::var(KOYEB_API_URL_ENV).unwrap_or_else(|_| KOYEB_API_BASE.to_string());
        Self::with_base_url(token, base_url)
    }

    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        Err(KoyebError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn create_app(&self, name: &str) -> Result<App> {
        let response = self
            .client
            .post(self.url("/apps"))
            .bearer_auth(&self.token)
            .json(&CreateAppRequest { name })
            .send()
            .await?;

        let body: AppEnvelope = Self::parse(response).await?;
        tracing::debug!("Created Koyeb app {} ({})", body.app.name, body.app.id);
        Ok(body.app)
    }

    pub async fn get_app(&self, app_id: &str) -> Result<App> {
        let response = self
            .client
            .get(self.url(&format!("/apps/{}", app_id)))
            .bearer_auth(&self.token)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(KoyebError::NotFound(format!("app {}", app_id)));
        }
        let body: AppEnvelope = Self::parse(response).await?;
        Ok(body.app)
    }

    pub async fn delete_app(&self, app_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/apps/{}", app_id)))
            .bearer_auth(&self.token)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    pub async fn create_service(
        &self,
        app_id: &str,
        definition: &ServiceDefinition,
    ) -> Result<Service> {
        let response = self
            .client
            .post(self.url("/services"))
            .bearer_auth(&self.token)
            .json(&ServiceRequest {
                app_id: Some(app_id),
                definition: definition.into(),
            })
            .send()
            .await?;

        let body: ServiceEnvelope = Self::parse(response).await?;
        tracing::debug!("Created Koyeb service {} ({})", body.service.name, body.service.id);
        Ok(body.service)
    }

    pub async fn update_service(
        &self,
        service_id: &str,
        definition: &ServiceDefinition,
    ) -> Result<Service> {
        let response = self
            .client
            .put(self.url(&format!("/services/{}", service_id)))
            .bearer_auth(&self.token)
            .json(&ServiceRequest {
                app_id: None,
                definition: definition.into(),
            })
            .send()
            .await?;

        let body: ServiceEnvelope = Self::parse(response).await?;
        Ok(body.service)
    }

    pub async fn delete_service(&self, service_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/services/{}", service_id)))
            .bearer_auth(&self.token)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!("Koyeb service {} already gone", service_id);
            return Ok(());
        }
        Self::check(response).await?;
        Ok(())
    }

    /// Best-effort removal of what a failed create left behind
    async fn rollback(&self, app_id: &str, service_id: Option<&str>) {
        if let Some(service_id) = service_id {
            if let Err(e) = self.delete_service(service_id).await {
                tracing::warn!("Failed to remove Koyeb service {}: {}", service_id, e);
            }
        }
        match self.delete_app(app_id).await {
            Ok(()) => tracing::info!("Removed Koyeb app {} after failed create", app_id),
            Err(e) => tracing::warn!(
                "Failed to remove Koyeb app {}, delete it manually: {}",
                app_id,
                e
            ),
        }
    }

    fn to_state(resource_type: &str, service: &Service, app: &App) -> ResourceState {
        let uri = app.public_uri().unwrap_or_else(|| {
            tracing::warn!(
                "Koyeb app {} has no domain yet, service URI is empty until the next update",
                app.name
            );
            String::new()
        });

        ResourceState::new(&service.id, resource_type)
            .with_status(service_status(&service.status))
            .with_attribute("app_id", serde_json::json!(app.id))
            .with_attribute("uri", serde_json::json!(uri))
    }
}

fn service_definition(resource: &ResourceConfig) -> Result<ServiceDefinition> {
    serde_json::from_value(resource.properties.clone()).map_err(|e| {
        KoyebError::InvalidConfig(format!(
            "properties of {} are not a Koyeb service definition: {}",
            resource.key(),
            e
        ))
    })
}

#[async_trait]
impl ResourceBackend for KoyebApi {
    fn name(&self) -> &str {
        "koyeb"
    }

    async fn create(&self, resource: &ResourceConfig) -> vaultflow_cloud::Result<ResourceState> {
        let definition = service_definition(resource)?;

        tracing::info!("Creating Koyeb app and service: {}", definition.name);
        let app = self.create_app(&definition.name).await?;

        let service = match self.create_service(&app.id, &definition).await {
            Ok(service) => service,
            Err(e) => {
                self.rollback(&app.id, None).await;
                return Err(e.into());
            }
        };

        // domains are assigned once the service exists
        let app = match self.get_app(&app.id).await {
            Ok(app) => app,
            Err(e) => {
                self.rollback(&app.id, Some(&service.id)).await;
                return Err(e.into());
            }
        };

        Ok(Self::to_state(&resource.resource_type, &service, &app))
    }

    async fn update(
        &self,
        current: &ResourceState,
        resource: &ResourceConfig,
    ) -> vaultflow_cloud::Result<ResourceState> {
        let app_id: String = current.get_attribute("app_id").ok_or_else(|| {
            KoyebError::InvalidConfig(format!("state of service {} has no app_id", current.id))
        })?;

        let definition = service_definition(resource)?;

        tracing::info!("Updating Koyeb service: {}", current.id);
        let service = self.update_service(&current.id, &definition).await?;
        let app = self.get_app(&app_id).await?;

        let mut state = Self::to_state(&resource.resource_type, &service, &app);
        state.created_at = current.created_at;
        Ok(state)
    }

    async fn delete(&self, current: &ResourceState) -> vaultflow_cloud::Result<()> {
        tracing::info!("Deleting Koyeb service: {}", current.id);
        self.delete_service(&current.id).await?;

        if let Some(app_id) = current.get_attribute::<String>("app_id") {
            self.delete_app(&app_id).await?;
        }
        Ok(())
    }
}

/// Map a Koyeb service status string
pub fn service_status(status: &str) -> ResourceStatus {
    match status {
        "STARTING" | "RESUMING" => ResourceStatus::Provisioning,
        "HEALTHY" => ResourceStatus::Healthy,
        "DEGRADED" | "UNHEALTHY" => ResourceStatus::Degraded,
        "PAUSING" | "PAUSED" => ResourceStatus::Stopped,
        "DELETING" | "DELETED" => ResourceStatus::Deleted,
        "ERROR" => ResourceStatus::Error,
        _ => ResourceStatus::Unknown,
    }
}

// ============ API Types ============

#[derive(Debug, Clone, Deserialize)]
pub struct App {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub domains: Vec<Domain>,
}

impl App {
    /// `https://` URI of the first assigned domain
    pub fn public_uri(&self) -> Option<String> {
        self.domains
            .first()
            .map(|domain| format!("https://{}", domain.name))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Domain {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
    pub id: String,
    #[serde(default)]
    pub app_id: String,
    pub name: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct AppEnvelope {
    app: App,
}

#[derive(Debug, Deserialize)]
struct ServiceEnvelope {
    service: Service,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Serialize)]
struct CreateAppRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct ServiceRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    app_id: Option<&'a str>,
    definition: DeploymentDefinition<'a>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{EnvVar, GithubSource, InstanceTypes, ServicePort};
    use serde_json::json;
    use vaultflow_cloud::CloudError;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SERVICE_TYPE: &str = "koyeb:index/service:Service";

    fn resource() -> ResourceConfig {
        let definition = ServiceDefinition {
            name: "vault".to_string(),
            github: GithubSource {
                repository: "acme/vault".to_string(),
                branch: "main".to_string(),
                dockerfile_path: "Dockerfile".to_string(),
            },
            instance_types: InstanceTypes {
                instance_type: "nano".to_string(),
                vcpu: 0.25,
                memory: 512,
                disk: 2,
            },
            ports: vec![ServicePort {
                port: 8200,
                protocol: "http".to_string(),
            }],
            env: vec![EnvVar::new("VAULT_ADDR", Some("http://0.0.0.0:8200".to_string()))],
        };
        ResourceConfig::new(
            SERVICE_TYPE,
            "vault",
            "koyeb-prod",
            serde_json::to_value(&definition).unwrap(),
        )
    }

    async fn mount_create_app(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/apps"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_partial_json(json!({"name": "vault"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "app": {"id": "app-1", "name": "vault", "domains": []}
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    async fn mount_get_app(server: &MockServer, domains: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/apps/app-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "app": {"id": "app-1", "name": "vault", "domains": domains}
            })))
            .mount(server)
            .await;
    }

    async fn mount_create_service(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/services"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "service": {"id": "svc-1", "app_id": "app-1", "name": "vault", "status": "STARTING"}
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    async fn mount_delete(server: &MockServer, route: &str, times: u64) {
        Mock::given(method("DELETE"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(times)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_create_returns_uri_and_ids() {
        let server = MockServer::start().await;
        mount_create_app(&server).await;
        mount_get_app(&server, json!([{"name": "vault-acme.koyeb.app"}])).await;

        Mock::given(method("POST"))
            .and(path("/services"))
            .and(body_partial_json(json!({
                "app_id": "app-1",
                "definition": {
                    "name": "vault",
                    "git": {"repository": "github.com/acme/vault", "branch": "main"},
                    "instance_types": [{"type": "nano"}],
                    "ports": [{"port": 8200, "protocol": "http"}]
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "service": {"id": "svc-1", "app_id": "app-1", "name": "vault", "status": "STARTING"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = KoyebApi::with_base_url("test-token", server.uri());
        let state = api.create(&resource()).await.unwrap();

        assert_eq!(state.id, "svc-1");
        assert_eq!(state.resource_type, SERVICE_TYPE);
        assert_eq!(state.status, ResourceStatus::Provisioning);
        assert_eq!(
            state.get_attribute::<String>("uri").as_deref(),
            Some("https://vault-acme.koyeb.app")
        );
        assert_eq!(state.get_attribute::<String>("app_id").as_deref(), Some("app-1"));
    }

    #[tokio::test]
    async fn test_create_without_domain_has_empty_uri() {
        let server = MockServer::start().await;
        mount_create_app(&server).await;
        mount_create_service(&server).await;
        mount_get_app(&server, json!([])).await;

        let api = KoyebApi::with_base_url("test-token", server.uri());
        let state = api.create(&resource()).await.unwrap();
        assert_eq!(state.get_attribute::<String>("uri").as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_name_conflict_is_already_exists() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/apps"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "status": 409, "code": "conflict", "message": "app name vault already exists"
            })))
            .mount(&server)
            .await;
        // nothing was created, so nothing is removed
        mount_delete(&server, "/apps/app-1", 0).await;

        let api = KoyebApi::with_base_url("test-token", server.uri());
        let err = api.create(&resource()).await.unwrap_err();
        match err {
            CloudError::ResourceAlreadyExists(msg) => {
                assert_eq!(msg, "app name vault already exists")
            }
            other => panic!("Expected ResourceAlreadyExists, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejected_service_removes_app() {
        let server = MockServer::start().await;
        mount_create_app(&server).await;
        Mock::given(method("POST"))
            .and(path("/services"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad instance type"))
            .expect(1)
            .mount(&server)
            .await;
        mount_delete(&server, "/apps/app-1", 1).await;

        let api = KoyebApi::with_base_url("test-token", server.uri());
        let err = api.create(&resource()).await.unwrap_err();
        match err {
            CloudError::ApiError(msg) => {
                assert!(msg.contains("400"));
                assert!(msg.contains("bad instance type"));
            }
            other => panic!("Expected ApiError, got {:?}", other),
        }
        server.verify().await;
    }

    #[tokio::test]
    async fn test_failed_app_lookup_removes_service_and_app() {
        let server = MockServer::start().await;
        mount_create_app(&server).await;
        mount_create_service(&server).await;
        Mock::given(method("GET"))
            .and(path("/apps/app-1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;
        mount_delete(&server, "/services/svc-1", 1).await;
        mount_delete(&server, "/apps/app-1", 1).await;

        let api = KoyebApi::with_base_url("test-token", server.uri());
        let err = api.create(&resource()).await.unwrap_err();
        assert!(matches!(err, CloudError::ApiError(ref msg) if msg.contains("internal error")));
        server.verify().await;
    }

    #[tokio::test]
    async fn test_failed_rollback_keeps_original_error() {
        let server = MockServer::start().await;
        mount_create_app(&server).await;
        Mock::given(method("POST"))
            .and(path("/services"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad instance type"))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/apps/app-1"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .expect(1)
            .mount(&server)
            .await;

        let api = KoyebApi::with_base_url("test-token", server.uri());
        let err = api.create(&resource()).await.unwrap_err();
        assert!(matches!(err, CloudError::ApiError(ref msg) if msg.contains("bad instance type")));
    }

    #[tokio::test]
    async fn test_invalid_properties_make_no_requests() {
        let server = MockServer::start().await;
        let api = KoyebApi::with_base_url("test-token", server.uri());
        let resource = ResourceConfig::new(SERVICE_TYPE, "vault", "koyeb-prod", json!({"name": "vault"}));

        let err = api.create(&resource).await.unwrap_err();
        assert!(matches!(err, CloudError::InvalidConfig(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_service_and_app() {
        let server = MockServer::start().await;
        mount_delete(&server, "/services/svc-1", 1).await;
        mount_delete(&server, "/apps/app-1", 1).await;

        let api = KoyebApi::with_base_url("test-token", server.uri());
        let state = ResourceState::new("svc-1", SERVICE_TYPE)
            .with_attribute("app_id", json!("app-1"));
        api.delete(&state).await.unwrap();
    }

    #[test]
    fn test_service_status_mapping() {
        assert_eq!(service_status("HEALTHY"), ResourceStatus::Healthy);
        assert_eq!(service_status("UNHEALTHY"), ResourceStatus::Degraded);
        assert_eq!(service_status("PAUSED"), ResourceStatus::Stopped);
        assert_eq!(service_status("whatever"), ResourceStatus::Unknown);
    }
}
