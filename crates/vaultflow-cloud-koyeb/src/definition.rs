//! Koyeb service definition

use crate::error::{KoyebError, Result};
use serde::{Deserialize, Serialize};

/// Git repository the service image is built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubSource {
    pub repository: String,
    pub branch: String,
    pub dockerfile_path: String,
}

/// Instance type and explicit sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceTypes {
    #[serde(rename = "type")]
    pub instance_type: String,
    #[serde(rename = "vCPU")]
    pub vcpu: f64,
    pub memory: i64,
    pub disk: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePort {
    pub port: u16,
    pub protocol: String,
}

/// Environment variable; an unset value is sent as absent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl EnvVar {
    pub fn new(key: impl Into<String>, value: Option<String>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Everything Koyeb needs to create the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub name: String,
    pub github: GithubSource,
    pub instance_types: InstanceTypes,
    pub ports: Vec<ServicePort>,
    pub env: Vec<EnvVar>,
}

/// Parse a `"<port>,<protocol>"` setting
pub fn parse_ports(value: &str) -> Result<Vec<ServicePort>> {
    let invalid = |reason: &str| {
        KoyebError::InvalidConfig(format!(
            "service_instance_port '{}' {}; expected \"<port>,<protocol>\"",
            value, reason
        ))
    };

    let mut parts = value.split(',');
    let (Some(port), Some(protocol), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid("must contain exactly one comma"));
    };

    let port: u16 = port
        .trim()
        .parse()
        .map_err(|_| invalid("has a non-numeric port"))?;
    let protocol = protocol.trim();
    if protocol.is_empty() {
        return Err(invalid("has an empty protocol"));
    }

    Ok(vec![ServicePort {
        port,
        protocol: protocol.to_string(),
    }])
}
