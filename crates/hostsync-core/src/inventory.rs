//! Inventory seams for hostsync
//!
//! These traits define the two sides of a sync:
//! - `DirectorySource`: where computers are discovered (LDAP / AD)
//! - `MonitoringInventory`: where hosts are monitored (Zabbix)
//!
//! Both traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Result type for inventory operations
pub type SyncResult<T> = std::result::Result<T, SyncError>;

// ---------------------------------------------------------------------------
// DirectorySource: computer discovery
// ---------------------------------------------------------------------------

/// Read-only view of the directory's computer objects.
///
/// Implementations are constructed with their connection settings and
/// release any session they open before returning.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    /// List the network host name of every computer object in scope.
    ///
    /// Entries without a host name are skipped. Order is the directory's
    /// result order.
    async fn list_computer_host_names(&self) -> SyncResult<Vec<String>>;
}

// ---------------------------------------------------------------------------
// MonitoringInventory: monitored hosts
// ---------------------------------------------------------------------------

/// A host as known to the monitoring system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredHost {
    /// Monitoring-side identifier (Zabbix `hostid`)
    pub host_id: String,
    /// Technical host name (Zabbix `host`)
    pub host_name: String,
    /// Interface addresses reported alongside the host
    #[serde(default)]
    pub addresses: Vec<String>,
}

impl MonitoredHost {
    pub fn new(host_id: impl Into<String>, host_name: impl Into<String>) -> Self {
        MonitoredHost {
            host_id: host_id.into(),
            host_name: host_name.into(),
            addresses: Vec::new(),
        }
    }
}

/// Read/write access to the monitoring system's host inventory.
///
/// Guarantees:
/// - `resolve_*` take the first match when several objects share a name and
///   fail with `SyncError::NotFound` when none does.
/// - `list_group_hosts` returns an empty Vec, never an error, for an empty group.
/// - Remote error envelopes surface as `SyncError::RemoteApi`.
#[async_trait]
pub trait MonitoringInventory: Send + Sync {
    /// Look up a template identifier by exact technical name.
    async fn resolve_template_id(&self, name: &str) -> SyncResult<String>;

    /// Look up a host group identifier by exact name.
    async fn resolve_group_id(&self, name: &str) -> SyncResult<String>;

    /// List every host belonging to the given group.
    async fn list_group_hosts(&self, group_id: &str) -> SyncResult<Vec<MonitoredHost>>;

    /// Create a DNS-addressed agent host in the group, linked to the template.
    async fn create_host(&self, host_name: &str, group_id: &str, template_id: &str)
        -> SyncResult<()>;

    /// Delete a host by identifier.
    async fn delete_host(&self, host_id: &str) -> SyncResult<()>;
}
