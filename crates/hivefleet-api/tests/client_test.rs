#![allow(clippy::unwrap_used)]
// Integration tests for `HiveClient` using wiremock.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hivefleet_api::{Error, HiveClient, MinerAction, TransportConfig, WorkerCommand};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, HiveClient) {
    let server = MockServer::start().await;
    let token = SecretString::from("test-token".to_string());
    let client = HiveClient::new(
        &format!("{}/api/v2", server.uri()),
        &token,
        &TransportConfig::default(),
    )
    .unwrap();
    (server, client)
}

fn worker_body() -> serde_json::Value {
    json!({
        "id": 7,
        "name": "rig1",
        "farm_id": 3,
        "stats": { "gpus_online": 2, "gpus_offline": 1, "online": true },
        "versions": { "hive": "1.2" },
        "needs_upgrade": false
    })
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_list_farms_unwraps_envelope_and_sends_bearer() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/farms"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": 3, "name": "Main farm", "workers_count": 2 },
                { "id": 4, "name": "Backup" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let farms = client.list_farms().await.unwrap();

    assert_eq!(farms.len(), 2);
    assert_eq!(farms[0].name, "Main farm");
    assert_eq!(farms[0].workers_count, Some(2));
    assert_eq!(farms[1].id, 4);
    assert_eq!(farms[1].workers_count, None);
}

#[tokio::test]
async fn test_list_workers() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/farms/3/workers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [worker_body()]
        })))
        .mount(&server)
        .await;

    let workers = client.list_workers(3).await.unwrap();

    assert_eq!(workers.len(), 1);
    assert_eq!(workers[0].id, 7);
    assert_eq!(workers[0].versions.hive, "1.2");
}

#[tokio::test]
async fn test_get_worker_without_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/farms/3/workers/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(worker_body()))
        .mount(&server)
        .await;

    let worker = client.get_worker(3, 7).await.unwrap();
    let stats = worker.stats.unwrap();

    assert_eq!(worker.name, "rig1");
    assert_eq!(worker.farm_id, 3);
    assert_eq!(stats.gpus_online, 2);
    assert_eq!(stats.gpus_offline, 1);
    assert!(stats.online);
    assert!(!worker.needs_upgrade);
}

#[tokio::test]
async fn test_get_account_profile() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/account/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 11,
            "login": "miner",
            "name": "Satoshi",
            "email": "s@example.com"
        })))
        .mount(&server)
        .await;

    let profile = client.get_account_profile().await.unwrap();

    assert_eq!(profile.id, 11);
    assert_eq!(profile.login, "miner");
    assert_eq!(profile.email.as_deref(), Some("s@example.com"));
}

#[tokio::test]
async fn test_send_miner_command_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/farms/3/workers/7/command"))
        .and(body_json(json!({ "command": "miner", "data": { "action": "start" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "commands": [1] })))
        .expect(1)
        .mount(&server)
        .await;

    client
        .send_command(3, 7, &WorkerCommand::Miner(MinerAction::Start))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_send_shutdown_command_without_data() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/farms/3/workers/7/command"))
        .and(body_json(json!({ "command": "shutdown" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client
        .send_command(3, 7, &WorkerCommand::Shutdown)
        .await
        .unwrap();
}

// ── Error-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_is_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/account/profile"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Unauthenticated." })),
        )
        .mount(&server)
        .await;

    let result = client.get_account_profile().await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_server_error_carries_status_and_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/farms/3/workers/7"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let err = client.get_worker(3, 7).await.unwrap_err();

    match err {
        Error::Api { status, ref body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_command_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/farms/3/workers/99/command"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not found" })))
        .mount(&server)
        .await;

    let err = client
        .send_command(3, 99, &WorkerCommand::Reboot)
        .await
        .unwrap_err();

    assert!(
        matches!(err, Error::Api { status: 404, .. }),
        "expected 404, got: {err:?}"
    );
}

#[tokio::test]
async fn test_missing_needs_upgrade_is_deserialization_error() {
    let (server, client) = setup().await;

    let mut body = worker_body();
    body.as_object_mut().unwrap().remove("needs_upgrade");

    Mock::given(method("GET"))
        .and(path("/api/v2/farms/3/workers/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let result = client.get_worker(3, 7).await;

    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}
