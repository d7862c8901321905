//! Error taxonomy for hostsync

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error payload returned by the monitoring API in a JSON-RPC error envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteFault {
    /// JSON-RPC error code (e.g. -32602 for invalid params)
    #[serde(default)]
    pub code: i64,
    /// Short error message
    #[serde(default)]
    pub message: String,
    /// Server-provided detail, kept verbatim
    #[serde(default)]
    pub data: serde_json::Value,
}

impl std::fmt::Display for RemoteFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        match &self.data {
            serde_json::Value::Null => Ok(()),
            serde_json::Value::String(detail) => write!(f, " ({})", detail),
            other => write!(f, " ({})", other),
        }
    }
}

/// Errors that can occur while reading inventories or applying a plan
#[derive(Error, Debug, Clone)]
pub enum SyncError {
    /// The monitoring API answered with an error envelope
    #[error("monitoring API error: {0}")]
    RemoteApi(RemoteFault),

    /// A named template or host group does not exist
    #[error("{kind} not found: {name}")]
    NotFound { kind: String, name: String },

    /// The directory rejected the bind
    #[error("directory authentication failed: {0}")]
    Authentication(String),

    /// Network or HTTP-level failure
    #[error("transport error: {0}")]
    Transport(String),

    /// A peer answered with something we could not interpret
    #[error("unexpected response: {0}")]
    Protocol(String),

    /// Invalid or incomplete configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SyncError {
    /// Build a `NotFound` error for the given object kind.
    pub fn not_found(kind: &str, name: &str) -> Self {
        SyncError::NotFound {
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }

    /// Whether retrying the same call could plausibly succeed.
    ///
    /// Only transport failures qualify; remote faults, missing objects and
    /// rejected credentials will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Transport(_))
    }
}
