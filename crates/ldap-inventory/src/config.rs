//! LDAP directory configuration

use serde::{Deserialize, Serialize};

use crate::error::DirectoryError;
use crate::Result;

/// Filter selecting computer objects
pub const DEFAULT_COMPUTER_FILTER: &str = "(objectClass=computer)";

/// Attribute holding a computer's fully qualified host name
pub const DEFAULT_HOST_NAME_ATTRIBUTE: &str = "dNSHostName";

/// LDAP configuration (the `[ldap]` section of the config file)
#[derive(Clone, Serialize, Deserialize)]
pub struct LdapConfig {
    /// Server URI, e.g. `ldap://dc01.corp.local` or `ldaps://dc01.corp.local:636`
    pub url: String,
    /// DN (or UPN for Active Directory) used for the simple bind
    pub bind_dn: String,
    #[serde(default, skip_serializing)]
    pub bind_password: String,
    /// Search base, e.g. `CN=Computers,DC=corp,DC=local`
    pub base_dn: String,
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default = "default_host_name_attribute")]
    pub host_name_attribute: String,
    /// Upgrade an `ldap://` connection with STARTTLS
    #[serde(default)]
    pub starttls: bool,
}

fn default_filter() -> String {
    DEFAULT_COMPUTER_FILTER.to_string()
}

fn default_host_name_attribute() -> String {
    DEFAULT_HOST_NAME_ATTRIBUTE.to_string()
}

impl std::fmt::Debug for LdapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapConfig")
            .field("url", &self.url)
            .field("bind_dn", &self.bind_dn)
            .field("bind_password", &"<redacted>")
            .field("base_dn", &self.base_dn)
            .field("filter", &self.filter)
            .field("host_name_attribute", &self.host_name_attribute)
            .field("starttls", &self.starttls)
            .finish()
    }
}

impl LdapConfig {
    pub fn new(url: &str, base_dn: &str, bind_dn: &str) -> Self {
        LdapConfig {
            url: url.to_string(),
            bind_dn: bind_dn.to_string(),
            bind_password: String::new(),
            base_dn: base_dn.to_string(),
            filter: default_filter(),
            host_name_attribute: default_host_name_attribute(),
            starttls: false,
        }
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.bind_password = password.to_string();
        self
    }

    pub fn with_starttls(mut self) -> Self {
        self.starttls = true;
        self
    }

    pub fn with_filter(mut self, filter: &str) -> Self {
        self.filter = filter.to_string();
        self
    }

    pub fn validate(&self) -> Result<()> {
        let scheme_ok = ["ldap://", "ldaps://", "ldapi://"]
            .iter()
            .any(|scheme| self.url.starts_with(scheme));
        if !scheme_ok {
            return Err(DirectoryError::InvalidConfig(format!(
                "url must start with ldap://, ldaps:// or ldapi://, got '{}'",
                self.url
            )));
        }
        if self.starttls && !self.url.starts_with("ldap://") {
            return Err(DirectoryError::InvalidConfig(
                "starttls only applies to ldap:// urls".into(),
            ));
        }
        if self.bind_dn.trim().is_empty() {
            return Err(DirectoryError::InvalidConfig("bind_dn must not be empty".into()));
        }
        if self.base_dn.trim().is_empty() {
            return Err(DirectoryError::InvalidConfig("base_dn must not be empty".into()));
        }
        if !(self.filter.starts_with('(') && self.filter.ends_with(')')) {
            return Err(DirectoryError::InvalidConfig(format!(
                "filter must be parenthesised, got '{}'",
                self.filter
            )));
        }
        if self.host_name_attribute.trim().is_empty() {
            return Err(DirectoryError::InvalidConfig(
                "host_name_attribute must not be empty".into(),
            ));
        }
        Ok(())
    }
}
