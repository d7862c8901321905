//! Error types for ldap-inventory

use hostsync_core::SyncError;
use thiserror::Error;

/// Errors that can occur while reading the directory
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// TCP/TLS connection to the directory server failed
    #[error("Failed to connect to {url}: {message}")]
    Connect { url: String, message: String },

    /// Bind rejected with invalidCredentials (result code 49)
    #[error("Invalid credentials for {bind_dn}")]
    InvalidCredentials { bind_dn: String },

    /// Bind rejected with any other result code
    #[error("Bind rejected with code {rc}: {text}")]
    BindRejected { rc: u32, text: String },

    /// Search completed with a non-success result code
    #[error("Search under {base_dn} failed with code {rc}: {text}")]
    Search { base_dn: String, rc: u32, text: String },

    /// Server stopped the search at its size limit (result code 4)
    #[error("Search under {base_dn} truncated at {returned} entries by the server size limit")]
    Truncated { base_dn: String, returned: usize },

    /// Protocol-level failure from the LDAP client
    #[error("LDAP error: {0}")]
    Ldap(String),

    /// Directory configuration is unusable
    #[error("Invalid LDAP configuration: {0}")]
    InvalidConfig(String),
}

impl From<ldap3::LdapError> for DirectoryError {
    fn from(err: ldap3::LdapError) -> Self {
        DirectoryError::Ldap(err.to_string())
    }
}

impl From<DirectoryError> for SyncError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::InvalidCredentials { .. } | DirectoryError::BindRejected { .. } => {
                SyncError::Authentication(err.to_string())
            }
            DirectoryError::Connect { .. } | DirectoryError::Ldap(_) => {
                SyncError::Transport(err.to_string())
            }
            DirectoryError::Search { .. } | DirectoryError::Truncated { .. } => {
                SyncError::Protocol(err.to_string())
            }
            DirectoryError::InvalidConfig(msg) => SyncError::Config(msg),
        }
    }
}
