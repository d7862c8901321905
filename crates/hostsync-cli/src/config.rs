//! `hostsync.toml` loading
//!
//! ```toml
//! [zabbix]
//! api_url = "https://zabbix.example.com/api_jsonrpc.php"
//! auth_token = "..."          # or HOSTSYNC_ZABBIX_TOKEN
//!
//! [ldap]
//! url = "ldaps://dc01.corp.local"
//! bind_dn = "svc-zabbix@corp.local"
//! bind_password = "..."       # or HOSTSYNC_LDAP_PASSWORD
//! base_dn = "DC=corp,DC=local"
//!
//! [sync]
//! group_name = "Discovered hosts"
//! template_name = "Windows by Zabbix agent"
//! ignored_hosts = ["dc01.corp.local"]
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use hostsync_core::SyncSettings;
use ldap_inventory::LdapConfig;
use serde::Deserialize;
use zabbix_rpc::ZabbixConfig;

pub const ZABBIX_TOKEN_ENV: &str = "HOSTSYNC_ZABBIX_TOKEN";
pub const LDAP_PASSWORD_ENV: &str = "HOSTSYNC_LDAP_PASSWORD";

#[derive(Debug, Clone, Deserialize)]
pub struct HostsyncConfig {
    pub zabbix: ZabbixConfig,
    pub ldap: LdapConfig,
    #[serde(default)]
    pub sync: SyncSettings,
}

impl HostsyncConfig {
    /// Read, apply environment overrides, and validate.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::parse(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Replace secrets with values from `lookup` where it returns a non-empty value.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(token) = lookup(ZABBIX_TOKEN_ENV) {
            self.zabbix.auth_token = token;
        }
        if let Some(password) = lookup(LDAP_PASSWORD_ENV) {
            self.ldap.bind_password = password;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.zabbix.validate().context("Invalid [zabbix] section")?;
        self.ldap.validate().context("Invalid [ldap] section")?;
        self.sync.validate().context("Invalid [sync] section")?;
        Ok(())
    }
}
