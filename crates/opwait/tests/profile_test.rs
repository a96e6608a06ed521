mod common;

use common::{ScriptedProbe, Step, completion_table, count};
use opwait::{
    Completion, OperationPoller, Phase, PollProfiles, ResourceTimeouts, StatusTable, WaitError,
    status,
};
use serde_json::json;
use std::fs;
use std::time::Duration;
use tokio::time::Instant;

const PROFILES: &str = r#"
defaults:
  interval-secs: 30
  timeout-secs: 600
operations:
  graph-create:
    timeout-secs: 3600
    stabilize: 3
  graph-delete:
    stabilize: 3
    not-found-is-success: true
  apig-ingress-eip:
    delay-secs: 10
    interval-secs: 5
    stabilize: 2
"#;

#[tokio::test(start_paused = true)]
async fn test_graph_create_profile() {
    let profiles = PollProfiles::from_yaml_str(PROFILES).unwrap();
    let config = profiles.resolve("graph-create").unwrap();

    let probe = ScriptedProbe::new([
        Step::Body(json!({ "graph": { "status": 100 } })),
        Step::Body(json!({ "graph": { "status": 200 } })),
    ]);
    let calls = probe.calls();
    let classifier = StatusTable::new()
        .success(["200"])
        .failure(["300", "303", "800"])
        .with_extractor(status::json_status("graph.status"));

    let start = Instant::now();
    let done = OperationPoller::new(probe, classifier, config)
        .label("graph-create/g-42")
        .wait()
        .await
        .unwrap();

    assert_eq!(
        done.response(),
        Some(&json!({ "graph": { "status": 200 } }))
    );
    // One pending probe plus three stable successes, 30s apart
    assert_eq!(count(&calls), 4);
    assert_eq!(start.elapsed(), Duration::from_secs(120));
}

#[tokio::test(start_paused = true)]
async fn test_asymmetric_delay_profile() {
    let profiles = PollProfiles::from_yaml_str(PROFILES).unwrap();
    let config = profiles.resolve("apig-ingress-eip").unwrap();

    let probe = ScriptedProbe::statuses(&["COMPLETED"]);
    let start = Instant::now();
    OperationPoller::new(probe, completion_table(), config)
        .wait()
        .await
        .unwrap();

    // 10s delay, then one 5s interval for the second success
    assert_eq!(start.elapsed(), Duration::from_secs(15));
}

#[tokio::test(start_paused = true)]
async fn test_delete_phase_from_resource_timeouts() {
    let timeouts = ResourceTimeouts::new(
        Duration::from_secs(30 * 60),
        Duration::from_secs(30 * 60),
        Duration::from_secs(5 * 60),
    );
    let config = timeouts
        .poll_config(Phase::Delete)
        .with_interval(Duration::from_secs(10));

    let probe = ScriptedProbe::new([
        Step::Body(json!({ "status": "DELETING" })),
        Step::NotFound,
    ]);
    let classifier = StatusTable::new()
        .pending(["DELETING"])
        .failure(["ERROR"])
        .with_extractor(status::json_status("status"));

    let done = OperationPoller::new(probe, classifier, config)
        .wait()
        .await
        .unwrap();
    assert_eq!(done, Completion::NotFound);
}

#[tokio::test(start_paused = true)]
async fn test_caller_message_distinguishes_timeout() {
    let timeouts = ResourceTimeouts::default();
    let config = timeouts
        .poll_config(Phase::Create)
        .with_interval(Duration::from_secs(60));

    let err = OperationPoller::new(
        ScriptedProbe::statuses(&["PENDING"]),
        completion_table(),
        config,
    )
    .wait()
    .await
    .unwrap_err();

    let message = match &err {
        WaitError::Timeout { .. } => format!(
            "timed out waiting for the {} of cluster c-1; it may still finish",
            Phase::Create
        ),
        WaitError::OperationFailed { status, .. } => format!(
            "error waiting for the {} of cluster c-1 to complete: status {}",
            Phase::Create,
            status
        ),
        other => format!("error waiting for cluster c-1: {}", other),
    };
    assert_eq!(
        message,
        "timed out waiting for the Create of cluster c-1; it may still finish"
    );
    assert!(matches!(err, WaitError::Timeout { attempts: 10, .. }));
}

#[test]
fn test_profiles_from_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("opwait.yaml");
    fs::write(&path, PROFILES).unwrap();

    let profiles = PollProfiles::load(&path).unwrap();
    assert_eq!(profiles.operations.len(), 3);
    assert!(profiles.resolve("graph-delete").unwrap().not_found_is_success);
    assert!(profiles.resolve("cluster-restart").is_err());
}
