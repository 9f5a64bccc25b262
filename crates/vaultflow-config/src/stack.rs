//! Stack configuration
//!
//! A stack file carries a single `config:` mapping of `namespace:key` to a
//! scalar value:
//!
//! ```yaml
//! config:
//!   vaultflow:cloud_provider: koyeb
//!   hashicorp_vault:github_repo: acme/vault-infra
//!   koyeb:service_instance_vcpu: 0.25
//! ```
//!
//! Keys without a namespace belong to the project namespace.

use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Namespace used for keys written without a `namespace:` prefix
pub const PROJECT_NAMESPACE: &str = "vaultflow";

/// A single scalar configuration value
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::String(s) => write!(f, "{}", s),
            ConfigValue::Integer(i) => write!(f, "{}", i),
            ConfigValue::Float(v) => write!(f, "{}", v),
            ConfigValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StackFile {
    #[serde(default)]
    config: BTreeMap<String, serde_yaml::Value>,
}

/// Immutable configuration of one stack
#[derive(Debug, Clone, Default)]
pub struct StackConfig {
    stack: String,
    values: BTreeMap<String, ConfigValue>,
}

impl StackConfig {
    /// Load a stack file from disk
    pub fn load(stack: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let file: StackFile =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let config = Self::from_entries(stack, file.config)?;
        tracing::debug!(
            "Loaded {} configuration values from {}",
            config.values.len(),
            path.display()
        );
        Ok(config)
    }

    /// Parse a stack file from a YAML string
    pub fn from_yaml_str(stack: impl Into<String>, content: &str) -> Result<Self> {
        let file: StackFile =
            serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
                path: "<inline>".into(),
                source,
            })?;
        Self::from_entries(stack, file.config)
    }

    fn from_entries(
        stack: impl Into<String>,
        entries: BTreeMap<String, serde_yaml::Value>,
    ) -> Result<Self> {
        let mut values = BTreeMap::new();
        for (key, raw) in entries {
            let full_key = qualify(&key);
            let value = match raw {
                serde_yaml::Value::String(s) => ConfigValue::String(s),
                serde_yaml::Value::Bool(b) => ConfigValue::Bool(b),
                serde_yaml::Value::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        ConfigValue::Integer(i)
                    } else if let Some(f) = n.as_f64() {
                        ConfigValue::Float(f)
                    } else {
                        return Err(ConfigError::InvalidValue {
                            key: full_key,
                            message: format!("number {} is out of range", n),
                        });
                    }
                }
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: full_key,
                        message: "expected a string, number or boolean".to_string(),
                    });
                }
            };
            values.insert(full_key, value);
        }

        Ok(Self {
            stack: stack.into(),
            values,
        })
    }

    /// Build a configuration from `(namespace:key, value)` pairs
    pub fn from_values<K, I>(stack: impl Into<String>, values: I) -> Self
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, ConfigValue)>,
    {
        Self {
            stack: stack.into(),
            values: values
                .into_iter()
                .map(|(k, v)| (qualify(k.as_ref()), v))
                .collect(),
        }
    }

    /// Stack name this configuration belongs to
    pub fn stack(&self) -> &str {
        &self.stack
    }

    /// Accessor for the project namespace
    pub fn project(&self) -> Config<'_> {
        self.namespace(PROJECT_NAMESPACE)
    }

    /// Accessor for a named namespace
    pub fn namespace<'a>(&'a self, namespace: &'a str) -> Config<'a> {
        Config {
            stack: self,
            namespace,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigValue)> {
        self.values.iter()
    }
}

fn qualify(key: &str) -> String {
    if key.contains(':') {
        key.to_string()
    } else {
        format!("{}:{}", PROJECT_NAMESPACE, key)
    }
}

/// Read-only view of one configuration namespace
#[derive(Debug, Clone, Copy)]
pub struct Config<'a> {
    stack: &'a StackConfig,
    namespace: &'a str,
}

impl<'a> Config<'a> {
    pub fn namespace(&self) -> &str {
        self.namespace
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    /// Raw value lookup
    pub fn get(&self, key: &str) -> Option<&'a ConfigValue> {
        self.stack.values.get(&self.full_key(key))
    }

    /// Value rendered as a string, if present
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).map(|v| v.to_string())
    }

    /// Required value rendered as a string
    pub fn require(&self, key: &str) -> Result<String> {
        self.get_string(key)
            .ok_or_else(|| ConfigError::MissingKey(self.full_key(key)))
    }

    /// Required integer value
    pub fn require_int(&self, key: &str) -> Result<i64> {
        match self.get(key) {
            Some(ConfigValue::Integer(i)) => Ok(*i),
            Some(ConfigValue::String(s)) => {
                s.trim().parse().map_err(|_| self.invalid(key, "an integer", s))
            }
            Some(other) => Err(self.invalid(key, "an integer", &other.to_string())),
            None => Err(ConfigError::MissingKey(self.full_key(key))),
        }
    }

    /// Required floating point value; integers are widened
    pub fn require_float(&self, key: &str) -> Result<f64> {
        match self.get(key) {
            Some(ConfigValue::Float(f)) => Ok(*f),
            Some(ConfigValue::Integer(i)) => Ok(*i as f64),
            Some(ConfigValue::String(s)) => {
                s.trim().parse().map_err(|_| self.invalid(key, "a number", s))
            }
            Some(other) => Err(self.invalid(key, "a number", &other.to_string())),
            None => Err(ConfigError::MissingKey(self.full_key(key))),
        }
    }

    fn invalid(&self, key: &str, expected: &str, found: &str) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.full_key(key),
            message: format!("expected {}, found '{}'", expected, found),
        }
    }
}
