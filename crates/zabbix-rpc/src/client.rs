//! JSON-RPC transport for the Zabbix API
//!
//! Every call is a single `POST` of a JSON-RPC 2.0 envelope to the configured
//! endpoint. Error envelopes are unwrapped into [`ZabbixError::RemoteApi`].

use std::sync::atomic::{AtomicU64, Ordering};

use hostsync_core::RemoteFault;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::config::{AuthMode, ZabbixConfig};
use crate::error::ZabbixError;
use crate::Result;

const JSONRPC_VERSION: &str = "2.0";

/// Longest response body echoed back in a `Status` error
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth: Option<&'a str>,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    jsonrpc: Option<String>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl RpcResponse {
    /// A JSON object counts as an envelope only if it carries a JSON-RPC member.
    fn is_envelope(&self) -> bool {
        self.jsonrpc.is_some() || self.result.is_some() || self.error.is_some()
    }
}

/// Zabbix API client
pub struct ZabbixClient {
    config: ZabbixConfig,
    http_client: reqwest::Client,
    next_id: AtomicU64,
}

impl ZabbixClient {
    /// Create a new client. Fails if the configuration is invalid.
    pub fn new(config: ZabbixConfig) -> Result<Self> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .user_agent(concat!("hostsync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(ZabbixClient {
            config,
            http_client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn config(&self) -> &ZabbixConfig {
        &self.config
    }

    /// Call an API method with the configured credentials.
    ///
    /// `Value::Null` params are sent as `{}`. Returns the `result` member, or
    /// an empty object when the server omits it.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        self.send(method, params, true).await
    }

    /// Call a method that must be sent without credentials (`apiinfo.version`).
    pub async fn call_unauthenticated(&self, method: &str, params: Value) -> Result<Value> {
        self.send(method, params, false).await
    }

    #[instrument(skip(self, params), fields(id))]
    async fn send(&self, method: &str, params: Value, authenticated: bool) -> Result<Value> {
        let params = if params.is_null() { json!({}) } else { params };
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::Span::current().record("id", id);

        let auth = match (authenticated, self.config.auth_mode) {
            (true, AuthMode::Envelope) => Some(self.config.auth_token.as_str()),
            _ => None,
        };
        let envelope = RpcRequest {
            jsonrpc: JSONRPC_VERSION,
            method,
            params: &params,
            auth,
            id,
        };

        let mut request = self.http_client.post(&self.config.api_url).json(&envelope);
        if authenticated && self.config.auth_mode == AuthMode::Header {
            request = request.bearer_auth(&self.config.auth_token);
        }

        debug!("Sending Zabbix API request");
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        let envelope = match serde_json::from_str::<RpcResponse>(&body) {
            Ok(envelope) if envelope.is_envelope() => envelope,
            Ok(_) | Err(_) if !status.is_success() => {
                return Err(status_error(status, &body));
            }
            Ok(_) => {
                return Err(ZabbixError::Decode(format!(
                    "response is not a JSON-RPC envelope: {}",
                    truncate(&body, MAX_ERROR_BODY)
                )))
            }
            Err(err) => return Err(err.into()),
        };

        if let Some(error) = envelope.error {
            debug!(error = %error, "Zabbix API returned an error envelope");
            return Err(ZabbixError::RemoteApi(remote_fault(error)));
        }
        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        Ok(envelope.result.unwrap_or_else(|| json!({})))
    }
}

fn status_error(status: reqwest::StatusCode, body: &str) -> ZabbixError {
    ZabbixError::Status {
        status: status.as_u16(),
        body: truncate(body, MAX_ERROR_BODY),
    }
}

/// Interpret an `error` member, keeping the raw value when it is not the
/// usual `{code, message, data}` object.
fn remote_fault(error: Value) -> RemoteFault {
    match serde_json::from_value::<RemoteFault>(error.clone()) {
        Ok(fault) => fault,
        Err(_) => RemoteFault {
            code: 0,
            message: "unrecognised error payload".to_string(),
            data: error,
        },
    }
}

fn truncate(body: &str, max: usize) -> String {
    if body.len() <= max {
        return body.to_string();
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let params = json!({"output": "extend"});
        let envelope = RpcRequest {
            jsonrpc: JSONRPC_VERSION,
            method: "template.get",
            params: &params,
            auth: Some("token"),
            id: 1,
        };
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            json!({
                "jsonrpc": "2.0",
                "method": "template.get",
                "params": {"output": "extend"},
                "auth": "token",
                "id": 1
            })
        );
    }

    #[test]
    fn test_envelope_omits_missing_auth() {
        let params = json!([]);
        let envelope = RpcRequest {
            jsonrpc: JSONRPC_VERSION,
            method: "apiinfo.version",
            params: &params,
            auth: None,
            id: 7,
        };
        let value = serde_json::to_value(&envelope).unwrap();
        assert!(value.get("auth").is_none());
    }

    #[test]
    fn test_remote_fault_from_standard_payload() {
        let fault = remote_fault(json!({
            "code": -32602,
            "message": "Invalid params.",
            "data": "Invalid parameter \"/1\": unexpected parameter \"foo\"."
        }));
        assert_eq!(fault.code, -32602);
        assert_eq!(fault.message, "Invalid params.");
    }

    #[test]
    fn test_remote_fault_from_odd_payload_keeps_raw_value() {
        let fault = remote_fault(json!("Session terminated"));
        assert_eq!(fault.data, json!("Session terminated"));
    }

    #[test]
    fn test_plain_json_object_is_not_an_envelope() {
        let response: RpcResponse =
            serde_json::from_value(json!({"detail": "upstream unavailable"})).unwrap();
        assert!(!response.is_envelope());

        let response: RpcResponse = serde_json::from_value(json!({"jsonrpc": "2.0", "id": 1})).unwrap();
        assert!(response.is_envelope());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        let truncated = truncate("ééééé", 3);
        assert!(truncated.starts_with('é'));
        assert!(truncated.ends_with('…'));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = ZabbixClient::new(ZabbixConfig::new("nope", "token"));
        assert!(matches!(result, Err(ZabbixError::InvalidConfig(_))));
    }
}
