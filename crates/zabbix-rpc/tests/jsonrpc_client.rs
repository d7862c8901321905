//! Integration tests for the Zabbix client using wiremock.
//!
//! These tests run the client against a mock `api_jsonrpc.php` endpoint and
//! cover the envelope, both auth modes, result unwrapping, error envelopes
//! and every typed operation the sync engine relies on.

use hostsync_core::{MonitoringInventory, SyncError};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use zabbix_rpc::{AuthMode, ZabbixClient, ZabbixConfig, ZabbixError};

// =============================================================================
// Test Helpers
// =============================================================================

const TOKEN: &str = "test-token-123";

fn client_for(server: &MockServer) -> ZabbixClient {
    client_with_mode(server, AuthMode::Envelope)
}

fn client_with_mode(server: &MockServer, mode: AuthMode) -> ZabbixClient {
    let config = ZabbixConfig::new(&format!("{}/api_jsonrpc.php", server.uri()), TOKEN)
        .with_auth_mode(mode)
        .with_agent_port(10051);
    ZabbixClient::new(config).unwrap()
}

fn ok(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "result": result, "id": 1}))
}

fn fault() -> Value {
    json!({
        "code": -32602,
        "message": "Invalid params.",
        "data": "Not authorised."
    })
}

fn error_envelope() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "error": fault(), "id": 1}))
}

async fn mock_method(server: &MockServer, rpc_method: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/api_jsonrpc.php"))
        .and(body_partial_json(json!({"method": rpc_method})))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn requests(server: &MockServer) -> Vec<Request> {
    server.received_requests().await.unwrap()
}

fn body(request: &Request) -> Value {
    request.body_json::<Value>().unwrap()
}

fn assert_remote_fault(err: ZabbixError) {
    match err {
        ZabbixError::RemoteApi(fault) => {
            assert_eq!(fault.code, -32602);
            assert_eq!(fault.message, "Invalid params.");
            assert_eq!(fault.data, json!("Not authorised."));
        }
        other => panic!("expected RemoteApi, got {:?}", other),
    }
}

// =============================================================================
// Envelope
// =============================================================================

#[tokio::test]
async fn test_call_sends_jsonrpc_envelope() {
    let server = MockServer::start().await;
    mock_method(&server, "host.get", ok(json!([]))).await;

    let client = client_for(&server);
    let result = client.call("host.get", json!({"output": "extend"})).await.unwrap();
    assert_eq!(result, json!([]));

    let sent = body(&requests(&server).await[0]);
    assert_eq!(sent["jsonrpc"], "2.0");
    assert_eq!(sent["method"], "host.get");
    assert_eq!(sent["params"], json!({"output": "extend"}));
    assert_eq!(sent["auth"], TOKEN);
    assert_eq!(sent["id"], 1);
}

#[tokio::test]
async fn test_request_ids_increase() {
    let server = MockServer::start().await;
    mock_method(&server, "host.get", ok(json!([]))).await;

    let client = client_for(&server);
    client.call("host.get", Value::Null).await.unwrap();
    client.call("host.get", Value::Null).await.unwrap();

    let ids: Vec<Value> = requests(&server)
        .await
        .iter()
        .map(|r| body(r)["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!(1), json!(2)]);
}

#[tokio::test]
async fn test_null_params_are_sent_as_empty_object() {
    let server = MockServer::start().await;
    mock_method(&server, "hostgroup.get", ok(json!([]))).await;

    client_for(&server)
        .call("hostgroup.get", Value::Null)
        .await
        .unwrap();

    assert_eq!(body(&requests(&server).await[0])["params"], json!({}));
}

#[tokio::test]
async fn test_missing_result_defaults_to_empty_object() {
    let server = MockServer::start().await;
    mock_method(
        &server,
        "host.get",
        ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1})),
    )
    .await;

    let result = client_for(&server)
        .call("host.get", json!({}))
        .await
        .unwrap();
    assert_eq!(result, json!({}));
}

#[tokio::test]
async fn test_header_auth_mode_uses_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api_jsonrpc.php"))
        .and(header("Authorization", "Bearer test-token-123"))
        .respond_with(ok(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    client_with_mode(&server, AuthMode::Header)
        .call("host.get", json!({}))
        .await
        .unwrap();

    let sent = body(&requests(&server).await[0]);
    assert!(sent.get("auth").is_none());
}

#[tokio::test]
async fn test_api_version_is_sent_without_credentials() {
    let server = MockServer::start().await;
    mock_method(&server, "apiinfo.version", ok(json!("7.0.5"))).await;

    let version = client_for(&server).api_version().await.unwrap();
    assert_eq!(version, "7.0.5");

    let request = &requests(&server).await[0];
    assert!(body(request).get("auth").is_none());
    assert!(request.headers.get("authorization").is_none());
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn test_error_envelope_surfaces_remote_fault() {
    let server = MockServer::start().await;
    mock_method(&server, "host.get", error_envelope()).await;

    let err = client_for(&server)
        .call("host.get", json!({}))
        .await
        .unwrap_err();
    assert_remote_fault(err);
}

#[tokio::test]
async fn test_http_error_without_envelope_is_status_error() {
    let server = MockServer::start().await;
    mock_method(
        &server,
        "host.get",
        ResponseTemplate::new(502).set_body_string("Bad Gateway"),
    )
    .await;

    let err = client_for(&server)
        .call("host.get", json!({}))
        .await
        .unwrap_err();
    match err {
        ZabbixError::Status { status, body } => {
            assert_eq!(status, 502);
            assert_eq!(body, "Bad Gateway");
        }
        other => panic!("expected Status, got {:?}", other),
    }
}

fn upstream_unavailable() -> ResponseTemplate {
    ResponseTemplate::new(502).set_body_json(json!({"detail": "upstream unavailable"}))
}

#[tokio::test]
async fn test_http_error_with_plain_json_body_fails_delete() {
    let server = MockServer::start().await;
    mock_method(&server, "host.delete", upstream_unavailable()).await;

    let err = client_for(&server).delete_host("10084").await.unwrap_err();
    assert!(matches!(err, ZabbixError::Status { status: 502, .. }));
}

#[tokio::test]
async fn test_http_error_with_plain_json_body_fails_listing() {
    let server = MockServer::start().await;
    mock_method(&server, "host.get", upstream_unavailable()).await;
    mock_method(&server, "hostgroup.get", upstream_unavailable()).await;

    let client = client_for(&server);
    let err = client.list_group_hosts("22").await.unwrap_err();
    assert!(matches!(err, ZabbixError::Status { status: 502, .. }));

    let err: SyncError = MonitoringInventory::resolve_group_id(&client, "Discovered hosts")
        .await
        .unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_http_error_with_envelope_but_no_error_is_status_error() {
    let server = MockServer::start().await;
    mock_method(
        &server,
        "host.delete",
        ResponseTemplate::new(503).set_body_json(json!({"jsonrpc": "2.0", "id": 1})),
    )
    .await;

    let err = client_for(&server).delete_host("10084").await.unwrap_err();
    assert!(matches!(err, ZabbixError::Status { status: 503, .. }));
}

#[tokio::test]
async fn test_plain_json_success_body_is_decode_error() {
    let server = MockServer::start().await;
    mock_method(
        &server,
        "host.get",
        ResponseTemplate::new(200).set_body_json(json!({"detail": "maintenance"})),
    )
    .await;

    let err = client_for(&server).list_group_hosts("22").await.unwrap_err();
    assert!(matches!(err, ZabbixError::Decode(_)));
}

#[tokio::test]
async fn test_non_json_success_body_is_decode_error() {
    let server = MockServer::start().await;
    mock_method(
        &server,
        "host.get",
        ResponseTemplate::new(200).set_body_string("<html>login</html>"),
    )
    .await;

    let err = client_for(&server)
        .call("host.get", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ZabbixError::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    drop(server);

    let err: SyncError = MonitoringInventory::resolve_group_id(&client, "Discovered hosts")
        .await
        .unwrap_err();
    assert!(err.is_retryable());
}

// =============================================================================
// Template and group lookup
// =============================================================================

#[tokio::test]
async fn test_resolve_template_id_sends_filter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "template.get",
            "params": {"filter": {"host": ["Windows by Zabbix agent"]}, "output": "extend"}
        })))
        .respond_with(ok(json!([{"templateid": "10081", "host": "Windows by Zabbix agent"}])))
        .expect(1)
        .mount(&server)
        .await;

    let id = client_for(&server)
        .resolve_template_id("Windows by Zabbix agent")
        .await
        .unwrap();
    assert_eq!(id, "10081");
}

#[tokio::test]
async fn test_resolve_template_id_takes_first_match() {
    let server = MockServer::start().await;
    mock_method(
        &server,
        "template.get",
        ok(json!([{"templateid": "1"}, {"templateid": "2"}])),
    )
    .await;

    let id = client_for(&server).resolve_template_id("dup").await.unwrap();
    assert_eq!(id, "1");
}

#[tokio::test]
async fn test_resolve_template_id_not_found() {
    let server = MockServer::start().await;
    mock_method(&server, "template.get", ok(json!([]))).await;

    let err = client_for(&server)
        .resolve_template_id("Missing template")
        .await
        .unwrap_err();
    assert!(matches!(err, ZabbixError::NotFound { kind: "template", .. }));
}

#[tokio::test]
async fn test_resolve_template_id_remote_error() {
    let server = MockServer::start().await;
    mock_method(&server, "template.get", error_envelope()).await;

    let err = client_for(&server)
        .resolve_template_id("Windows by Zabbix agent")
        .await
        .unwrap_err();
    assert_remote_fault(err);
}

#[tokio::test]
async fn test_resolve_group_id_sends_filter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "hostgroup.get",
            "params": {"filter": {"name": ["Discovered hosts"]}}
        })))
        .respond_with(ok(json!([{"groupid": "5", "name": "Discovered hosts"}])))
        .expect(1)
        .mount(&server)
        .await;

    let id = client_for(&server)
        .resolve_group_id("Discovered hosts")
        .await
        .unwrap();
    assert_eq!(id, "5");
}

#[tokio::test]
async fn test_resolve_group_id_not_found_through_trait() {
    let server = MockServer::start().await;
    mock_method(&server, "hostgroup.get", ok(json!([]))).await;

    let client = client_for(&server);
    let err = MonitoringInventory::resolve_group_id(&client, "Nope")
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::NotFound { ref name, .. } if name == "Nope"));
}

#[tokio::test]
async fn test_resolve_group_id_remote_error() {
    let server = MockServer::start().await;
    mock_method(&server, "hostgroup.get", error_envelope()).await;

    let err = client_for(&server)
        .resolve_group_id("Discovered hosts")
        .await
        .unwrap_err();
    assert_remote_fault(err);
}

// =============================================================================
// Host listing
// =============================================================================

#[tokio::test]
async fn test_list_group_hosts_projects_records() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "host.get",
            "params": {
                "output": ["host", "hostid"],
                "selectInterfaces": ["ip"],
                "groupids": "5"
            }
        })))
        .respond_with(ok(json!([
            {"hostid": "10084", "host": "web01.corp.local", "interfaces": [{"ip": "10.0.0.5"}]},
            {"hostid": "10085", "host": "web02.corp.local", "interfaces": [{"ip": ""}]}
        ])))
        .mount(&server)
        .await;

    let hosts = client_for(&server).list_group_hosts("5").await.unwrap();
    assert_eq!(hosts.len(), 2);
    assert_eq!(hosts[0].host_id, "10084");
    assert_eq!(hosts[0].host_name, "web01.corp.local");
    assert_eq!(hosts[0].addresses, vec!["10.0.0.5".to_string()]);
    assert!(hosts[1].addresses.is_empty());
}

#[tokio::test]
async fn test_list_group_hosts_empty_group() {
    let server = MockServer::start().await;
    mock_method(&server, "host.get", ok(json!([]))).await;

    let hosts = client_for(&server).list_group_hosts("5").await.unwrap();
    assert!(hosts.is_empty());
}

// =============================================================================
// Host writes
// =============================================================================

#[tokio::test]
async fn test_create_host_sends_agent_interface() {
    let server = MockServer::start().await;
    mock_method(&server, "host.create", ok(json!({"hostids": ["10105"]}))).await;

    let host_id = client_for(&server)
        .create_host("web03.corp.local", "5", "10081")
        .await
        .unwrap();
    assert_eq!(host_id.as_deref(), Some("10105"));

    let sent = body(&requests(&server).await[0]);
    assert_eq!(
        sent["params"],
        json!({
            "host": "web03.corp.local",
            "interfaces": [{
                "type": 1,
                "main": 1,
                "useip": 0,
                "ip": "",
                "dns": "web03.corp.local",
                "port": "10051"
            }],
            "groups": [{"groupid": "5"}],
            "templates": [{"templateid": "10081"}]
        })
    );
}

#[tokio::test]
async fn test_create_host_remote_error_through_trait() {
    let server = MockServer::start().await;
    mock_method(&server, "host.create", error_envelope()).await;

    let client = client_for(&server);
    let err = MonitoringInventory::create_host(&client, "web03", "5", "10081")
        .await
        .unwrap_err();
    match err {
        SyncError::RemoteApi(fault) => assert_eq!(fault.data, json!("Not authorised.")),
        other => panic!("expected RemoteApi, got {:?}", other),
    }
}

#[tokio::test]
async fn test_delete_host_sends_id_array() {
    let server = MockServer::start().await;
    mock_method(&server, "host.delete", ok(json!({"hostids": ["10084"]}))).await;

    client_for(&server).delete_host("10084").await.unwrap();

    let sent = body(&requests(&server).await[0]);
    assert_eq!(sent["params"], json!(["10084"]));
}

#[tokio::test]
async fn test_host_writes_accept_unexpected_result_shape() {
    let server = MockServer::start().await;
    mock_method(&server, "host.create", ok(json!(true))).await;
    mock_method(&server, "host.delete", ok(json!({"deleted": 1}))).await;

    let client = client_for(&server);
    let host_id = client
        .create_host("web01.corp.local", "22", "10081")
        .await
        .unwrap();
    assert_eq!(host_id, None);
    client.delete_host("10084").await.unwrap();
}

#[tokio::test]
async fn test_delete_host_remote_error() {
    let server = MockServer::start().await;
    mock_method(&server, "host.delete", error_envelope()).await;

    let err = client_for(&server).delete_host("10084").await.unwrap_err();
    assert_remote_fault(err);
}
