//! In-memory fakes for the inventory traits (testing only)
//!
//! Provides `MemoryDirectory` and `MemoryInventory` that satisfy the trait
//! contracts without a directory server or a monitoring API, plus failure
//! injection for exercising the apply policies.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{RemoteFault, SyncError};
use crate::inventory::*;

// ---------------------------------------------------------------------------
// MemoryDirectory
// ---------------------------------------------------------------------------

/// Directory backed by a fixed list of host names.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    hosts: Vec<String>,
    failure: Option<SyncError>,
}

impl MemoryDirectory {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MemoryDirectory {
            hosts: hosts.into_iter().map(Into::into).collect(),
            failure: None,
        }
    }

    /// Make every listing fail with `err`.
    pub fn failing(err: SyncError) -> Self {
        MemoryDirectory {
            hosts: Vec::new(),
            failure: Some(err),
        }
    }
}

#[async_trait]
impl DirectorySource for MemoryDirectory {
    async fn list_computer_host_names(&self) -> SyncResult<Vec<String>> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(self.hosts.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryInventory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct StoredHost {
    host: MonitoredHost,
    group_id: String,
    template_id: Option<String>,
}

#[derive(Debug, Default)]
struct InventoryState {
    templates: Vec<(String, String)>,
    groups: Vec<(String, String)>,
    hosts: Vec<StoredHost>,
    next_host_id: u64,
    template_failure: Option<SyncError>,
    create_failures: HashMap<String, SyncError>,
    delete_failures: HashMap<String, SyncError>,
    calls: Vec<String>,
}

/// Monitoring inventory backed by in-memory templates, groups and hosts.
///
/// Host ids are allocated from 10001 upwards. Creating a host whose name is
/// already taken fails with a `RemoteApi` fault, as the real API does.
#[derive(Debug)]
pub struct MemoryInventory {
    state: Mutex<InventoryState>,
}

impl Default for MemoryInventory {
    fn default() -> Self {
        MemoryInventory {
            state: Mutex::new(InventoryState {
                next_host_id: 10001,
                ..Default::default()
            }),
        }
    }
}

impl MemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(self, name: &str, template_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .templates
            .push((name.to_string(), template_id.to_string()));
        self
    }

    pub fn with_group(self, name: &str, group_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .groups
            .push((name.to_string(), group_id.to_string()));
        self
    }

    pub fn with_host(self, group_id: &str, host_id: &str, host_name: &str) -> Self {
        self.state.lock().unwrap().hosts.push(StoredHost {
            host: MonitoredHost::new(host_id, host_name),
            group_id: group_id.to_string(),
            template_id: None,
        });
        self
    }

    /// Make template lookups fail with `err`.
    pub fn fail_template_lookup(self, err: SyncError) -> Self {
        self.state.lock().unwrap().template_failure = Some(err);
        self
    }

    /// Make `create_host` fail with `err` for the given host name.
    pub fn fail_create(self, host_name: &str, err: SyncError) -> Self {
        self.state
            .lock()
            .unwrap()
            .create_failures
            .insert(host_name.to_string(), err);
        self
    }

    /// Make `delete_host` fail with `err` for the given host id.
    pub fn fail_delete(self, host_id: &str, err: SyncError) -> Self {
        self.state
            .lock()
            .unwrap()
            .delete_failures
            .insert(host_id.to_string(), err);
        self
    }

    /// Host names currently in a group, in insertion order.
    pub fn host_names(&self, group_id: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .hosts
            .iter()
            .filter(|h| h.group_id == group_id)
            .map(|h| h.host.host_name.clone())
            .collect()
    }

    /// Template linked to a host at creation, if any.
    pub fn template_of(&self, host_name: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .hosts
            .iter()
            .find(|h| h.host.host_name == host_name)
            .and_then(|h| h.template_id.clone())
    }

    /// Every call received, rendered as `"<method> <argument>"`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls whose method matches `method`.
    pub fn calls_to(&self, method: &str) -> usize {
        let prefix = format!("{} ", method);
        self.calls()
            .iter()
            .filter(|c| c.starts_with(&prefix))
            .count()
    }
}

#[async_trait]
impl MonitoringInventory for MemoryInventory {
    async fn resolve_template_id(&self, name: &str) -> SyncResult<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("template.get {}", name));
        if let Some(err) = &state.template_failure {
            return Err(err.clone());
        }
        state
            .templates
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| id.clone())
            .ok_or_else(|| SyncError::not_found("template", name))
    }

    async fn resolve_group_id(&self, name: &str) -> SyncResult<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("hostgroup.get {}", name));
        state
            .groups
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| id.clone())
            .ok_or_else(|| SyncError::not_found("host group", name))
    }

    async fn list_group_hosts(&self, group_id: &str) -> SyncResult<Vec<MonitoredHost>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("host.get {}", group_id));
        Ok(state
            .hosts
            .iter()
            .filter(|h| h.group_id == group_id)
            .map(|h| h.host.clone())
            .collect())
    }

    async fn create_host(
        &self,
        host_name: &str,
        group_id: &str,
        template_id: &str,
    ) -> SyncResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("host.create {}", host_name));
        if let Some(err) = state.create_failures.get(host_name) {
            return Err(err.clone());
        }
        if state.hosts.iter().any(|h| h.host.host_name == host_name) {
            return Err(SyncError::RemoteApi(RemoteFault {
                code: -32602,
                message: "Invalid params.".to_string(),
                data: serde_json::Value::String(format!(
                    "Host with the same name \"{}\" already exists.",
                    host_name
                )),
            }));
        }
        let host_id = state.next_host_id.to_string();
        state.next_host_id += 1;
        state.hosts.push(StoredHost {
            host: MonitoredHost::new(host_id, host_name),
            group_id: group_id.to_string(),
            template_id: Some(template_id.to_string()),
        });
        Ok(())
    }

    async fn delete_host(&self, host_id: &str) -> SyncResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("host.delete {}", host_id));
        if let Some(err) = state.delete_failures.get(host_id) {
            return Err(err.clone());
        }
        let before = state.hosts.len();
        state.hosts.retain(|h| h.host.host_id != host_id);
        if state.hosts.len() == before {
            return Err(SyncError::RemoteApi(RemoteFault {
                code: -32500,
                message: "Application error.".to_string(),
                data: serde_json::Value::String(
                    "No permissions to referred object or it does not exist!".to_string(),
                ),
            }));
        }
        Ok(())
    }
}
