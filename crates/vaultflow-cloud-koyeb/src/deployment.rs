//! Koyeb deployment definition
//!
//! Wire shape of the `definition` sent to `POST /services` and
//! `PUT /services/{id}`. State keeps the [`ServiceDefinition`] so plans
//! diff what the stack file says; this is only the request body.
//!
//! Koyeb sizes a service through its instance type. The explicit vCPU,
//! memory and disk settings are recorded in state but not sent.

use crate::definition::{EnvVar, ServiceDefinition, ServicePort};
use serde::Serialize;

const GIT_HOST: &str = "github.com/";

#[derive(Debug, Serialize, PartialEq)]
pub struct DeploymentDefinition<'a> {
    pub name: &'a str,
    #[serde(rename = "type")]
    pub service_type: &'static str,
    pub git: GitSource<'a>,
    pub instance_types: Vec<InstanceTypeRef<'a>>,
    pub scalings: Vec<Scaling>,
    pub ports: &'a [ServicePort],
    pub routes: Vec<Route>,
    pub env: &'a [EnvVar],
}

#[derive(Debug, Serialize, PartialEq)]
pub struct GitSource<'a> {
    /// `github.com/<owner>/<repo>`
    pub repository: String,
    pub branch: &'a str,
    pub docker: DockerBuilder<'a>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DockerBuilder<'a> {
    pub dockerfile: &'a str,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct InstanceTypeRef<'a> {
    #[serde(rename = "type")]
    pub instance_type: &'a str,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Scaling {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Route {
    pub port: u16,
    pub path: String,
}

impl<'a> From<&'a ServiceDefinition> for DeploymentDefinition<'a> {
    fn from(definition: &'a ServiceDefinition) -> Self {
        let repository = definition.github.repository.trim_start_matches("https://");
        let repository = if repository.starts_with(GIT_HOST) {
            repository.to_string()
        } else {
            format!("{}{}", GIT_HOST, repository)
        };

        // only HTTP ports get a public route
        let routes = definition
            .ports
            .iter()
            .filter(|p| p.protocol.starts_with("http"))
            .map(|p| Route {
                port: p.port,
                path: "/".to_string(),
            })
            .collect();

        Self {
            name: &definition.name,
            service_type: "WEB",
            git: GitSource {
                repository,
                branch: &definition.github.branch,
                docker: DockerBuilder {
                    dockerfile: &definition.github.dockerfile_path,
                },
            },
            instance_types: vec![InstanceTypeRef {
                instance_type: &definition.instance_types.instance_type,
            }],
            // a single Vault node; Vault storage is not shared across instances
            scalings: vec![Scaling { min: 1, max: 1 }],
            ports: &definition.ports,
            routes,
            env: &definition.env,
        }
    }
}
