//! Error types for zabbix-rpc

use hostsync_core::{RemoteFault, SyncError};
use thiserror::Error;

/// Errors that can occur while talking to the Zabbix API
#[derive(Error, Debug)]
pub enum ZabbixError {
    /// Request could not be sent or the response body could not be read
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-2xx status without an error envelope
    #[error("Zabbix API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response was not the JSON shape we expected
    #[error("Malformed Zabbix API response: {0}")]
    Decode(String),

    /// The API answered with an error envelope
    #[error("Zabbix API error: {0}")]
    RemoteApi(RemoteFault),

    /// Lookup by name returned nothing
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// Client configuration is unusable
    #[error("Invalid Zabbix configuration: {0}")]
    InvalidConfig(String),
}

impl From<reqwest::Error> for ZabbixError {
    fn from(err: reqwest::Error) -> Self {
        ZabbixError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for ZabbixError {
    fn from(err: serde_json::Error) -> Self {
        ZabbixError::Decode(err.to_string())
    }
}

impl From<ZabbixError> for SyncError {
    fn from(err: ZabbixError) -> Self {
        match err {
            ZabbixError::Http(_) | ZabbixError::Status { .. } => {
                SyncError::Transport(err.to_string())
            }
            ZabbixError::Decode(msg) => SyncError::Protocol(msg),
            ZabbixError::RemoteApi(fault) => SyncError::RemoteApi(fault),
            ZabbixError::NotFound { kind, name } => SyncError::not_found(kind, &name),
            ZabbixError::InvalidConfig(msg) => SyncError::Config(msg),
        }
    }
}
