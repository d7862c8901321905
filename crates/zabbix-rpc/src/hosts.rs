//! Typed host, host group and template operations
//!
//! Thin projections over [`ZabbixClient::call`], plus the
//! [`MonitoringInventory`] implementation used by the sync engine.

use async_trait::async_trait;
use hostsync_core::{MonitoredHost, MonitoringInventory, SyncError, SyncResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::client::ZabbixClient;
use crate::error::ZabbixError;
use crate::Result;

/// Interface type for a Zabbix agent interface
pub const AGENT_INTERFACE_TYPE: u8 = 1;

#[derive(Debug, Deserialize)]
struct TemplateRow {
    templateid: String,
}

#[derive(Debug, Deserialize)]
struct GroupRow {
    groupid: String,
}

#[derive(Debug, Deserialize)]
struct InterfaceRow {
    #[serde(default)]
    ip: String,
}

#[derive(Debug, Deserialize)]
struct HostRow {
    hostid: String,
    host: String,
    #[serde(default)]
    interfaces: Vec<InterfaceRow>,
}

impl From<HostRow> for MonitoredHost {
    fn from(row: HostRow) -> Self {
        MonitoredHost {
            host_id: row.hostid,
            host_name: row.host,
            addresses: row
                .interfaces
                .into_iter()
                .map(|i| i.ip)
                .filter(|ip| !ip.is_empty())
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct HostIds {
    #[serde(default)]
    hostids: Vec<String>,
}

/// Decode a `*.get` result. Missing or empty results decode to an empty Vec.
fn rows<T: DeserializeOwned>(result: Value) -> Result<Vec<T>> {
    match &result {
        Value::Null => return Ok(Vec::new()),
        Value::Object(map) if map.is_empty() => return Ok(Vec::new()),
        Value::Array(_) => {}
        other => {
            return Err(ZabbixError::Decode(format!(
                "expected an array result, got {}",
                other
            )))
        }
    }
    Ok(serde_json::from_value(result)?)
}

/// Ids from a `host.create` / `host.delete` result.
///
/// The write already succeeded once no error envelope came back, so an
/// unexpected shape only costs the ids.
fn host_ids(result: Value) -> Vec<String> {
    if result.as_object().is_some_and(|map| map.is_empty()) {
        return Vec::new();
    }
    match serde_json::from_value::<HostIds>(result) {
        Ok(ids) => ids.hostids,
        Err(err) => {
            warn!(error = %err, "Unexpected host write result, ignoring host ids");
            Vec::new()
        }
    }
}

/// Parameters for `host.create`: one DNS-addressed agent interface.
pub fn host_create_params(host_name: &str, group_id: &str, template_id: &str, port: u16) -> Value {
    json!({
        "host": host_name,
        "interfaces": [{
            "type": AGENT_INTERFACE_TYPE,
            "main": 1,
            "useip": 0,
            "ip": "",
            "dns": host_name,
            "port": port.to_string(),
        }],
        "groups": [{"groupid": group_id}],
        "templates": [{"templateid": template_id}],
    })
}

impl ZabbixClient {
    /// Resolve a template id by technical name. First match wins.
    pub async fn resolve_template_id(&self, name: &str) -> Result<String> {
        let result = self
            .call(
                "template.get",
                json!({"filter": {"host": [name]}, "output": "extend"}),
            )
            .await?;
        let templates: Vec<TemplateRow> = rows(result)?;
        if templates.len() > 1 {
            debug!(template = %name, matches = templates.len(), "Several templates match, using the first");
        }
        templates
            .into_iter()
            .next()
            .map(|t| t.templateid)
            .ok_or_else(|| ZabbixError::NotFound {
                kind: "template",
                name: name.to_string(),
            })
    }

    /// Resolve a host group id by name. First match wins.
    pub async fn resolve_group_id(&self, name: &str) -> Result<String> {
        let result = self
            .call(
                "hostgroup.get",
                json!({"filter": {"name": [name]}, "output": "extend"}),
            )
            .await?;
        let groups: Vec<GroupRow> = rows(result)?;
        groups
            .into_iter()
            .next()
            .map(|g| g.groupid)
            .ok_or_else(|| ZabbixError::NotFound {
                kind: "host group",
                name: name.to_string(),
            })
    }

    /// List the hosts of a group with their interface addresses.
    pub async fn list_group_hosts(&self, group_id: &str) -> Result<Vec<MonitoredHost>> {
        let result = self
            .call(
                "host.get",
                json!({
                    "output": ["host", "hostid"],
                    "selectInterfaces": ["ip"],
                    "groupids": group_id,
                }),
            )
            .await?;
        let hosts: Vec<HostRow> = rows(result)?;
        Ok(hosts.into_iter().map(MonitoredHost::from).collect())
    }

    /// Create a host; returns the new host id when the server reports one.
    pub async fn create_host(
        &self,
        host_name: &str,
        group_id: &str,
        template_id: &str,
    ) -> Result<Option<String>> {
        let params = host_create_params(host_name, group_id, template_id, self.config().agent_port);
        let result = self.call("host.create", params).await?;
        let host_id = host_ids(result).into_iter().next();
        info!(host = %host_name, host_id = host_id.as_deref().unwrap_or("?"), "Created Zabbix host");
        Ok(host_id)
    }

    /// Delete a host by id.
    pub async fn delete_host(&self, host_id: &str) -> Result<()> {
        let result = self.call("host.delete", json!([host_id])).await?;
        let deleted = host_ids(result);
        info!(host_id = %host_id, deleted = deleted.len(), "Deleted Zabbix host");
        Ok(())
    }

    /// Server API version (`apiinfo.version`, sent without credentials).
    pub async fn api_version(&self) -> Result<String> {
        match self.call_unauthenticated("apiinfo.version", json!([])).await? {
            Value::String(version) => Ok(version),
            other => Err(ZabbixError::Decode(format!(
                "expected a version string, got {}",
                other
            ))),
        }
    }
}

#[async_trait]
impl MonitoringInventory for ZabbixClient {
    async fn resolve_template_id(&self, name: &str) -> SyncResult<String> {
        ZabbixClient::resolve_template_id(self, name)
            .await
            .map_err(SyncError::from)
    }

    async fn resolve_group_id(&self, name: &str) -> SyncResult<String> {
        ZabbixClient::resolve_group_id(self, name)
            .await
            .map_err(SyncError::from)
    }

    async fn list_group_hosts(&self, group_id: &str) -> SyncResult<Vec<MonitoredHost>> {
        ZabbixClient::list_group_hosts(self, group_id)
            .await
            .map_err(SyncError::from)
    }

    async fn create_host(
        &self,
        host_name: &str,
        group_id: &str,
        template_id: &str,
    ) -> SyncResult<()> {
        ZabbixClient::create_host(self, host_name, group_id, template_id)
            .await
            .map(|_| ())
            .map_err(SyncError::from)
    }

    async fn delete_host(&self, host_id: &str) -> SyncResult<()> {
        ZabbixClient::delete_host(self, host_id)
            .await
            .map_err(SyncError::from)
    }
}
