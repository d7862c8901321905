//! ldap-inventory: LDAP / Active Directory computer discovery for hostsync
//!
//! Lists the DNS host name of every computer object under a search base.
//! [`LdapDirectory`] implements [`hostsync_core::DirectorySource`].
//!
//! ## Example
//!
//! ```ignore
//! use ldap_inventory::{LdapConfig, LdapDirectory};
//!
//! let config = LdapConfig::new(
//!     "ldap://dc01.corp.local",
//!     "CN=Computers,DC=corp,DC=local",
//!     "CN=svc-zabbix,CN=Users,DC=corp,DC=local",
//! )
//! .with_password("secret");
//!
//! let hosts = LdapDirectory::new(config)?.list_computer_host_names().await?;
//! ```

pub mod config;
pub mod directory;
mod error;

pub use config::{LdapConfig, DEFAULT_COMPUTER_FILTER, DEFAULT_HOST_NAME_ATTRIBUTE};
pub use directory::{host_name_of, LdapDirectory};
pub use error::DirectoryError;

/// Result type for ldap-inventory operations
pub type Result<T> = std::result::Result<T, DirectoryError>;
