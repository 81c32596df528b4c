//! Shared helpers for the HTTP integration tests
//!
//! Jobs run against a stand-in runner: a small shell script that accepts the
//! runner's command line, exports the `-e` pairs, exposes the structured
//! output path as `$OUT` and then sources the submitted "script". Tests
//! therefore submit shell snippets that print whatever the real runner would.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use stampede_orchestrator::{api, config::Config, state::AppState};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

const FAKE_RUNNER: &str = r#"#!/bin/sh
[ "$1" = "run" ] || { echo "expected 'run', got '$1'" >&2; exit 64; }
shift
while [ $# -gt 0 ]; do
  case "$1" in
    -e) export "$2"; shift 2 ;;
    --out) OUT="${2#json=}"; shift 2 ;;
    *) SCRIPT="$1"; shift ;;
  esac
done
export OUT
. "$SCRIPT"
"#;

pub struct TestEnv {
    _root: TempDir,
    pub state: AppState,
    pub app: Router,
    pub scripts_dir: PathBuf,
    pub results_dir: PathBuf,
}

pub fn test_env() -> TestEnv {
    test_env_with(|_| {})
}

/// Builds an isolated orchestrator; `customize` runs after the defaults are set
pub fn test_env_with(customize: impl FnOnce(&mut Config)) -> TestEnv {
    let root = tempfile::tempdir().unwrap();
    let scripts_dir = root.path().join("scripts");
    let results_dir = root.path().join("results");
    std::fs::create_dir_all(&scripts_dir).unwrap();
    std::fs::create_dir_all(&results_dir).unwrap();

    let runner = root.path().join("fake-runner.sh");
    std::fs::write(&runner, FAKE_RUNNER).unwrap();

    let mut config = Config {
        bind_addr: "127.0.0.1:0".to_string(),
        scripts_dir: scripts_dir.clone(),
        results_dir: results_dir.clone(),
        runner_command: format!("/bin/sh {}", runner.display()),
        runner_scripts_path: scripts_dir.display().to_string(),
        runner_results_path: results_dir.display().to_string(),
        ..Config::default()
    };
    customize(&mut config);

    let state = AppState::new(config);
    let app = api::create_router(state.clone());

    TestEnv {
        _root: root,
        state,
        app,
        scripts_dir,
        results_dir,
    }
}

/// Sends a request and returns the status and raw body
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(app, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

pub async fn post_raw(app: &Router, uri: &str, body: impl Into<Body>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

/// Submits a script and returns the new job id
pub async fn submit(app: &Router, script: &str, env: Value) -> String {
    let body = serde_json::json!({ "script": script, "env": env });
    let (status, json) = post_raw(app, "/api/k6-test/run", body.to_string()).await;
    assert_eq!(status, StatusCode::OK, "submission rejected: {json}");
    assert_eq!(json["status"], "submitted");
    json["jobId"].as_str().unwrap().to_string()
}

pub async fn status(app: &Router, id: &str) -> Value {
    let (code, json) = get_json(app, &format!("/api/k6-test/status/{id}")).await;
    assert_eq!(code, StatusCode::OK);
    json
}

/// Polls until the job is completed or failed
pub async fn wait_for_terminal(app: &Router, id: &str) -> Value {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(15);
    loop {
        let json = status(app, id).await;
        if json["status"] == "completed" || json["status"] == "failed" {
            return json;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job {id} never finished: {json}"
        );
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

/// Console summary in the runner's end-of-test format
pub const SUMMARY: &str = "\
     checks_succeeded...: 98.00% 49 out of 50
     http_req_duration..: avg=12.5ms min=3ms med=10ms max=80ms p(90)=20ms p(95)=30ms
     http_req_failed....: 2.00%  1 out of 50
     http_reqs..........: 50     4.9/s
running (0m10.2s), 0/5 VUs, 50 complete and 0 interrupted iterations";

/// Shell snippet printing [`SUMMARY`] on stdout
pub fn print_summary() -> String {
    format!("cat <<'SUMMARY_EOF'\n{SUMMARY}\nSUMMARY_EOF\n")
}
