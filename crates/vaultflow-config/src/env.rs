//! Process environment read once at startup

/// Listener address handed to Vault when `VAULT_ADDR` is unset
pub const DEFAULT_VAULT_ADDR: &str = "http://0.0.0.0:8200";

pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const VAULT_ADDR: &str = "VAULT_ADDR";
pub const VAULT_INIT_JSON: &str = "VAULT_INIT_JSON";
pub const KOYEB_TOKEN: &str = "KOYEB_TOKEN";

/// Environment values forwarded to the Vault service and its provider
///
/// Unset variables stay `None`; whether that is fatal is decided by the
/// platform receiving them, except for `VAULT_ADDR` which has a default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultEnvironment {
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub vault_addr: String,
    pub vault_init_json: Option<String>,
    pub koyeb_token: Option<String>,
}

impl Default for VaultEnvironment {
    fn default() -> Self {
        Self {
            aws_access_key_id: None,
            aws_secret_access_key: None,
            vault_addr: DEFAULT_VAULT_ADDR.to_string(),
            vault_init_json: None,
            koyeb_token: None,
        }
    }
}

impl VaultEnvironment {
    /// Read from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read through an arbitrary lookup function
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let env = Self {
            aws_access_key_id: lookup(AWS_ACCESS_KEY_ID),
            aws_secret_access_key: lookup(AWS_SECRET_ACCESS_KEY),
            vault_addr: lookup(VAULT_ADDR).unwrap_or_else(|| DEFAULT_VAULT_ADDR.to_string()),
            vault_init_json: lookup(VAULT_INIT_JSON),
            koyeb_token: lookup(KOYEB_TOKEN),
        };

        for (name, value) in [
            (AWS_ACCESS_KEY_ID, &env.aws_access_key_id),
            (AWS_SECRET_ACCESS_KEY, &env.aws_secret_access_key),
            (VAULT_INIT_JSON, &env.vault_init_json),
        ] {
            if value.is_none() {
                tracing::warn!("{} is not set; it will be sent without a value", name);
            }
        }

        env
    }
}
