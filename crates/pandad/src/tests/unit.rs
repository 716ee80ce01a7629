//! Unit tests for request dispatch and bootstrap wiring.

use std::sync::Arc;
use std::time::Duration;

use rstest::rstest;
use serde_json::{Value, json};

use panda_config::{BackendKind, FailurePolicy};

use crate::backends::{BackendClient, BackendStartupError, MockBackendFactory};
use crate::bootstrap::{BootstrapError, bootstrap_with};
use crate::dispatch::Dispatcher;
use crate::health::MockHealthReporter;

use super::support::{CallLog, FakeBackend, TestConfigLoader, registry_of};

fn dispatcher(log: &CallLog, policy: FailurePolicy, broken: Option<&str>) -> Dispatcher {
    let backends = [
        ("celestia", BackendKind::Blob),
        ("ethereum", BackendKind::Evm),
        ("gnosis", BackendKind::Evm),
    ]
    .into_iter()
    .map(|(name, kind)| {
        let backend = FakeBackend::new(name, kind, log);
        if broken == Some(name) {
            backend.failing("node unavailable")
        } else {
            backend
        }
    });
    Dispatcher::new(Arc::new(registry_of(backends)), policy, Duration::from_secs(5))
}

async fn send(dispatcher: &Dispatcher, body: &str) -> (Value, String) {
    let response = dispatcher.dispatch(body.as_bytes()).await;
    let raw = serde_json::to_string(&response).expect("serialise response");
    let value = serde_json::from_str(&raw).expect("response is JSON");
    (value, raw)
}

fn receipt(backend: &str, content: &str) -> Value {
    json!({"backend": backend, "call": "submit", "content": content})
}

#[tokio::test]
async fn submit_results_follow_target_order() {
    let log = CallLog::default();
    let dispatcher = dispatcher(&log, FailurePolicy::FailFast, None);
    let body = r#"{"jsonrpc":"2.0","id":1,"method":"panda.submitBlob","params":[
        {"data":"A","targets":[{"name":"celestia","namespace":"0x01"},{"name":"ethereum","address":"0x1"}]}
    ]}"#;

    let (response, _) = send(&dispatcher, body).await;

    assert_eq!(response["jsonrpc"], "2.0");
    assert_eq!(response["id"], 1);
    assert_eq!(
        response["result"],
        json!([receipt("celestia", "A"), receipt("ethereum", "A")])
    );
    assert_eq!(log.entries(), ["celestia:submit:A", "ethereum:submit:A"]);
}

#[tokio::test]
async fn unknown_targets_leave_no_slot() {
    let log = CallLog::default();
    let dispatcher = dispatcher(&log, FailurePolicy::FailFast, None);
    let body = r#"{"id":2,"method":"panda.submitBlob","params":[
        {"data":"A","targets":[{"name":"polygon"}]},
        {"data":"B","das":[{"name":"gnosis","address":"0x2"}]}
    ]}"#;

    let (response, _) = send(&dispatcher, body).await;

    assert_eq!(response["result"], json!([receipt("gnosis", "B")]));
}

#[tokio::test]
async fn fail_fast_reports_completed_receipts_and_never_calls_later_targets() {
    let log = CallLog::default();
    let dispatcher = dispatcher(&log, FailurePolicy::FailFast, Some("ethereum"));
    let body = r#"{"id":"req-9","method":"panda.submitBlob","params":[
        {"data":"A","targets":[{"name":"celestia"},{"name":"ethereum"},{"name":"gnosis"}]}
    ]}"#;

    let (response, _) = send(&dispatcher, body).await;

    assert_eq!(response["id"], "req-9");
    assert!(response.get("result").is_none());
    let error = &response["error"];
    assert_eq!(error["code"], -32000);
    assert_eq!(error["data"]["completed"], json!([receipt("celestia", "A")]));
    assert_eq!(error["data"]["failed"]["item"], 0);
    assert_eq!(error["data"]["failed"]["target"], 1);
    assert_eq!(error["data"]["failed"]["backend"], "ethereum");
    assert_eq!(log.count_for("gnosis"), 0);
}

#[tokio::test]
async fn continue_on_error_tags_every_slot() {
    let log = CallLog::default();
    let dispatcher = dispatcher(&log, FailurePolicy::ContinueOnError, Some("ethereum"));
    let body = r#"{"id":3,"method":"panda.submitBlob","params":[
        {"data":"A","targets":[{"name":"celestia"},{"name":"ethereum"},{"name":"gnosis"}]}
    ]}"#;

    let (response, _) = send(&dispatcher, body).await;

    let result = response["result"].as_array().expect("tagged result list");
    let statuses: Vec<&str> = result
        .iter()
        .filter_map(|slot| slot["status"].as_str())
        .collect();
    assert_eq!(statuses, ["ok", "error", "ok"]);
    assert_eq!(result[1]["backend"], "ethereum");
    assert!(
        result[1]["error"]["message"]
            .as_str()
            .is_some_and(|message| message.contains("node unavailable"))
    );
    assert_eq!(log.count_for("gnosis"), 1);
}

#[tokio::test]
async fn proofs_come_only_from_proof_capable_backends() {
    let log = CallLog::default();
    let dispatcher = dispatcher(&log, FailurePolicy::FailFast, None);
    let body = r#"{"id":4,"method":"panda.getProof","params":[
        {"height":100,"name":"celestia"},
        {"height":101,"name":"ethereum","verifyOn":"gnosis"}
    ]}"#;

    let (response, _) = send(&dispatcher, body).await;

    assert_eq!(
        response["result"],
        json!([{"backend": "ethereum", "call": "getProof", "content": "101"}])
    );
    assert_eq!(log.entries(), ["ethereum:getProof:101"]);
}

#[tokio::test]
async fn proofs_accept_the_wrapped_params_layout() {
    let log = CallLog::default();
    let dispatcher = dispatcher(&log, FailurePolicy::FailFast, None);
    let body = r#"{"id":5,"method":"panda.getProof","params":["ignored",[{"height":7,"name":"gnosis"}]]}"#;

    let (response, _) = send(&dispatcher, body).await;

    assert_eq!(log.entries(), ["gnosis:getProof:7"]);
    assert_eq!(response["result"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn elapsed_request_budget_reports_pending_calls() {
    let log = CallLog::default();
    let registry = registry_of([
        FakeBackend::new("celestia", BackendKind::Blob, &log),
        FakeBackend::new("ethereum", BackendKind::Evm, &log),
    ]);
    let dispatcher = Dispatcher::new(Arc::new(registry), FailurePolicy::FailFast, Duration::ZERO);
    let body = r#"{"id":6,"method":"panda.submitBlob","params":[
        {"data":"A","targets":[{"name":"celestia"},{"name":"ethereum"}]}
    ]}"#;

    let (response, _) = send(&dispatcher, body).await;

    assert_eq!(response["error"]["code"], -32001);
    assert_eq!(response["error"]["data"]["completed"], json!([]));
    assert_eq!(
        response["error"]["data"]["pending"],
        json!([
            {"item": 0, "target": 0, "backend": "celestia"},
            {"item": 0, "target": 1, "backend": "ethereum"},
        ])
    );
    assert!(log.entries().is_empty());
}

#[rstest]
#[case(r#""abc""#)]
#[case("7")]
#[case(r#"{"x":1}"#)]
#[case("[1, 2]")]
#[case("-0.5e3")]
#[tokio::test]
async fn ids_are_echoed_byte_for_byte(#[case] id: &str) {
    let log = CallLog::default();
    let dispatcher = dispatcher(&log, FailurePolicy::FailFast, None);

    let ok = format!(r#"{{"id":{id},"method":"panda.submitBlob","params":[{{"data":"A","targets":[]}}]}}"#);
    let (_, raw) = send(&dispatcher, &ok).await;
    assert!(raw.contains(&format!(r#""id":{id}"#)), "id not echoed in {raw}");

    let failing = format!(r#"{{"id":{id},"method":"panda.unknown"}}"#);
    let (error, raw_error) = send(&dispatcher, &failing).await;
    assert_eq!(error["error"]["code"], -32601, "unexpected response {raw_error}");
    assert!(
        raw_error.contains(&format!(r#""id":{id}"#)),
        "id not echoed in {raw_error}"
    );
}

#[rstest]
#[case(r#"{"id":1,"method":"panda.submitblob","params":[]}"#, -32601, "1")]
#[case(r#"{"jsonrpc":"2.0","id":7,"method":"panda.unknown"}"#, -32601, "7")]
#[case(r#"{"id":1,"method":"panda.getProof"}"#, -32600, "1")]
#[case(r#"{"id":1,"method":"panda.submitBlob","params":[]}"#, -32602, "1")]
#[case(r#"{"id":1,"method":"panda.submitBlob","params":{"data":"A"}}"#, -32602, "1")]
#[case(r#"{"id":1,"method":"panda.getProof","params":[{"name":"ethereum"}]}"#, -32602, "1")]
#[case(r#"{"id":1,"params":[]}"#, -32600, "1")]
#[case(r#"[{"id":1,"method":"panda.submitBlob","params":[]}]"#, -32600, "null")]
#[case(r#"{"id":1,"method":"#, -32700, "null")]
#[case("", -32700, "null")]
#[tokio::test]
async fn malformed_requests_map_to_error_codes(
    #[case] body: &str,
    #[case] code: i64,
    #[case] id: &str,
) {
    let log = CallLog::default();
    let dispatcher = dispatcher(&log, FailurePolicy::FailFast, None);

    let (response, raw) = send(&dispatcher, body).await;

    assert_eq!(response["error"]["code"], code, "unexpected response {raw}");
    assert!(raw.contains(&format!(r#""id":{id}"#)), "id not echoed in {raw}");
    assert!(log.entries().is_empty());
}

#[test]
fn bootstrap_registers_every_configured_backend() {
    let log = CallLog::default();
    let mut factory = MockBackendFactory::new();
    factory.expect_build().times(3).returning(move |definition, _| {
        let backend = FakeBackend::new(&definition.key(), definition.kind, &log);
        Ok(Arc::new(backend) as Arc<dyn BackendClient>)
    });
    let mut reporter = MockHealthReporter::new();
    reporter.expect_bootstrap_starting().times(1).return_const(());
    reporter
        .expect_backend_registered()
        .times(3)
        .return_const(());
    reporter.expect_bootstrap_succeeded().times(1).return_const(());

    let gateway = bootstrap_with(&TestConfigLoader::new(), Arc::new(reporter), &factory)
        .expect("bootstrap succeeds");

    let dispatcher = gateway.dispatcher();
    let kinds: Vec<(String, BackendKind)> = dispatcher
        .registry()
        .iter()
        .map(|backend| (backend.name().to_owned(), backend.kind()))
        .collect();
    assert_eq!(
        kinds,
        [
            ("celestia".to_owned(), BackendKind::Blob),
            ("ethereum".to_owned(), BackendKind::Evm),
            ("gnosis".to_owned(), BackendKind::Evm),
        ]
    );
}

#[test]
fn bootstrap_stops_at_the_first_backend_that_fails_to_build() {
    let mut factory = MockBackendFactory::new();
    factory
        .expect_build()
        .times(1)
        .returning(|definition, _| Err(BackendStartupError::new(definition.key(), "unreachable")));
    let mut reporter = MockHealthReporter::new();
    reporter.expect_bootstrap_starting().times(1).return_const(());
    reporter.expect_backend_failed().times(1).return_const(());
    reporter.expect_bootstrap_failed().times(1).return_const(());

    let error = bootstrap_with(&TestConfigLoader::new(), Arc::new(reporter), &factory)
        .expect_err("bootstrap must fail");

    match error {
        BootstrapError::Backend { source } => assert_eq!(source.name, "celestia"),
        other => panic!("unexpected error: {other}"),
    }
}
