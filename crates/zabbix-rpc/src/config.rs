//! Zabbix API client configuration

use serde::{Deserialize, Serialize};

use crate::error::ZabbixError;
use crate::Result;

/// Default Zabbix agent port for created interfaces
pub const DEFAULT_AGENT_PORT: u16 = 10050;

/// Where the API token travels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// `auth` member of the JSON-RPC envelope (Zabbix up to 7.0)
    #[default]
    Envelope,
    /// `Authorization: Bearer` header (Zabbix 6.4+, required from 7.2)
    Header,
}

/// Zabbix API configuration (the `[zabbix]` section of the config file)
#[derive(Clone, Serialize, Deserialize)]
pub struct ZabbixConfig {
    /// Full JSON-RPC endpoint, e.g. `https://zabbix.example.com/api_jsonrpc.php`
    pub api_url: String,
    /// API token
    #[serde(default, skip_serializing)]
    pub auth_token: String,
    #[serde(default)]
    pub auth_mode: AuthMode,
    /// Agent port written on created host interfaces
    #[serde(default = "default_agent_port")]
    pub agent_port: u16,
}

fn default_agent_port() -> u16 {
    DEFAULT_AGENT_PORT
}

impl std::fmt::Debug for ZabbixConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZabbixConfig")
            .field("api_url", &self.api_url)
            .field("auth_token", &"<redacted>")
            .field("auth_mode", &self.auth_mode)
            .field("agent_port", &self.agent_port)
            .finish()
    }
}

impl ZabbixConfig {
    /// Create config for a specific endpoint and token
    pub fn new(api_url: &str, auth_token: &str) -> Self {
        ZabbixConfig {
            api_url: api_url.to_string(),
            auth_token: auth_token.to_string(),
            auth_mode: AuthMode::default(),
            agent_port: DEFAULT_AGENT_PORT,
        }
    }

    pub fn with_auth_mode(mut self, mode: AuthMode) -> Self {
        self.auth_mode = mode;
        self
    }

    pub fn with_agent_port(mut self, port: u16) -> Self {
        self.agent_port = port;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.api_url).map_err(|e| {
            ZabbixError::InvalidConfig(format!("api_url '{}': {}", self.api_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ZabbixError::InvalidConfig(format!(
                "api_url must be http(s), got '{}'",
                url.scheme()
            )));
        }
        if self.auth_token.trim().is_empty() {
            return Err(ZabbixError::InvalidConfig(
                "auth_token is empty (set zabbix.auth_token or HOSTSYNC_ZABBIX_TOKEN)".into(),
            ));
        }
        if self.agent_port == 0 {
            return Err(ZabbixError::InvalidConfig("agent_port must be non-zero".into()));
        }
        Ok(())
    }
}
