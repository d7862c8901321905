//! zabbix-rpc: Zabbix JSON-RPC client for hostsync
//!
//! Wraps the Zabbix API endpoint (`api_jsonrpc.php`) in a generic
//! [`ZabbixClient::call`] plus the typed operations hostsync needs:
//! template and host group lookup, host listing, creation and deletion.
//! [`ZabbixClient`] implements [`hostsync_core::MonitoringInventory`].

pub mod client;
pub mod config;
mod error;
pub mod hosts;

pub use client::ZabbixClient;
pub use config::{AuthMode, ZabbixConfig, DEFAULT_AGENT_PORT};
pub use error::ZabbixError;
pub use hosts::{host_create_params, AGENT_INTERFACE_TYPE};

/// Result type for zabbix-rpc operations
pub type Result<T> = std::result::Result<T, ZabbixError>;
