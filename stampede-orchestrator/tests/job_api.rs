#![cfg(unix)]

mod common;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::*;
use serde_json::{Value, json};
use tokio::task::JoinSet;

fn assert_aligned(series: &Value) {
    let series = series.as_object().unwrap();
    let len = series["timestamps"].as_array().unwrap().len();
    for (name, values) in series {
        assert_eq!(values.as_array().unwrap().len(), len, "series {name}");
    }
}

#[tokio::test]
async fn test_submit_returns_fresh_id_and_immediate_status() {
    let env = test_env();

    let first = submit(&env.app, "sleep 0.2", json!({})).await;
    let second = submit(&env.app, "sleep 0.2", json!({})).await;
    assert_ne!(first, second);

    let snapshot = status(&env.app, &first).await;
    assert_eq!(snapshot["jobId"], first.as_str());
    assert!(
        snapshot["status"] == "submitted" || snapshot["status"] == "running",
        "unexpected status {snapshot}"
    );

    assert!(env.scripts_dir.join(format!("{first}.js")).is_file());
}

#[tokio::test]
async fn test_structured_output_wins_over_console_summary() {
    let env = test_env();
    let script = format!(
        r#"cat > "$OUT" <<'JSON'
{{
  "metrics": {{
    "http_req_duration": {{ "avg": 7.25, "p(95)": 11.0, "count": 40, "duration": 8000 }},
    "vus": {{ "max": 5 }}
  }},
  "time_series": [
    {{ "metric": "http_req_duration", "value": 7.0, "timestamp": 2000 }},
    {{ "metric": "http_req_duration", "value": 6.0, "timestamp": 1000 }},
    {{ "metric": "vus", "value": 5, "timestamp": 3000 }}
  ]
}}
JSON
{}"#,
        print_summary()
    );

    let id = submit(&env.app, &script, json!({})).await;
    let done = wait_for_terminal(&env.app, &id).await;

    assert_eq!(done["status"], "completed", "{done}");
    assert_eq!(done["provenance"], "measured");
    assert_eq!(done["metrics"]["http_req_duration"]["avg"], 7.25);
    assert_eq!(done["metrics"]["http_req_duration"]["p95"], 11.0);
    assert_eq!(done["metrics"]["http_req_duration"]["rate"], 5.0);
    assert!(done["metrics"].get("http_reqs").is_none());
    assert!(done.get("error").is_none());

    let series = &done["timeSeries"];
    assert_eq!(series["timestamps"], json!([1000.0, 2000.0, 3000.0]));
    assert_eq!(series["http_req_duration"], json!([6.0, 7.0, null]));
    assert_eq!(series["vus"], json!([null, null, 5.0]));
    assert_aligned(series);
}

#[tokio::test]
async fn test_scenario_env_reaches_runner() {
    let env = test_env();
    let script = r#"echo "     http_req_duration..: avg=${VUS}.5ms min=1ms med=2ms max=3ms"
echo "     http_reqs..........: 20     2.0/s"
echo "running (0m${DURATION}.0s), 0/${VUS} VUs, 20 complete and 0 interrupted iterations"
"#;

    let id = submit(&env.app, script, json!({ "DURATION": "9", "VUS": "4" })).await;
    let done = wait_for_terminal(&env.app, &id).await;

    assert_eq!(done["status"], "completed", "{done}");
    assert_eq!(done["metrics"]["http_req_duration"]["avg"], 4.5);
    assert_eq!(done["provenance"], "synthetic");

    let series = &done["timeSeries"];
    assert_aligned(series);
    let timestamps = series["timestamps"].as_array().unwrap();
    assert_eq!(timestamps.len(), 10);
    assert_eq!(timestamps[9], 9000.0);

    let start: DateTime<Utc> = serde_json::from_value(done["startTime"].clone()).unwrap();
    let end: DateTime<Utc> = serde_json::from_value(done["endTime"].clone()).unwrap();
    assert!(end >= start);
}

#[tokio::test]
async fn test_env_values_passed_verbatim() {
    let env = test_env();
    let script = r#"[ "$TARGET" = "http://svc/a b?x=1&y='2'" ] || exit 5
echo "     http_reqs..........: 1     1.0/s"
"#;

    let id = submit(
        &env.app,
        script,
        json!({ "TARGET": "http://svc/a b?x=1&y='2'" }),
    )
    .await;
    let done = wait_for_terminal(&env.app, &id).await;
    assert_eq!(done["status"], "completed", "{done}");
}

#[tokio::test]
async fn test_deleted_output_file_falls_back_to_console() {
    let env = test_env();
    let script = format!(
        "printf '{{\"metrics\": {{}}}}' > \"$OUT\"\nrm -f \"$OUT\"\n{}",
        print_summary()
    );

    let id = submit(&env.app, &script, json!({})).await;
    let done = wait_for_terminal(&env.app, &id).await;

    assert_eq!(done["status"], "completed", "{done}");
    assert_eq!(done["provenance"], "synthetic");
    assert_eq!(done["metrics"]["http_req_duration"]["avg"], 12.5);
    assert_eq!(done["metrics"]["http_reqs"]["count"], 50.0);
    assert_eq!(done["metrics"]["checks"]["succeeded"], 49.0);
    assert!(!env.results_dir.join(format!("{id}-output.json")).exists());
    assert_aligned(&done["timeSeries"]);
}

#[tokio::test]
async fn test_threshold_exit_code_is_completed_with_warning() {
    let env = test_env();
    let script = format!("{{\n{}}} >&2\nexit 99\n", print_summary());

    let id = submit(&env.app, &script, json!({})).await;
    let done = wait_for_terminal(&env.app, &id).await;

    assert_eq!(done["status"], "completed", "{done}");
    assert_eq!(
        done["thresholdWarning"],
        "Test completed but some performance thresholds were exceeded"
    );
    assert!(done.get("error").is_none());
    assert_eq!(done["metrics"]["http_req_failed"]["total"], 50.0);
}

#[tokio::test]
async fn test_other_exit_code_fails_with_output() {
    let env = test_env();

    let id = submit(&env.app, "echo boom\nexit 3", json!({})).await;
    let done = wait_for_terminal(&env.app, &id).await;

    assert_eq!(done["status"], "failed");
    let error = done["error"].as_str().unwrap();
    assert!(error.starts_with("Process exited with code 3: "), "{error}");
    assert!(error.contains("boom"));
    assert!(done.get("metrics").is_none());
    assert!(done.get("thresholdWarning").is_none());
}

#[tokio::test]
async fn test_signal_termination_fails() {
    let env = test_env();

    let id = submit(&env.app, "kill -9 $$", json!({})).await;
    let done = wait_for_terminal(&env.app, &id).await;

    assert_eq!(done["status"], "failed");
    assert!(done["error"].as_str().unwrap().contains("signal"));
}

#[tokio::test]
async fn test_control_bytes_in_output_file_are_stripped() {
    let env = test_env();
    let script =
        r#"printf '{"metrics":\001{"http_reqs":\033{"count":\177 5,\237"duration":1000}}}' > "$OUT""#;

    let id = submit(&env.app, script, json!({})).await;
    let done = wait_for_terminal(&env.app, &id).await;

    assert_eq!(done["status"], "completed", "{done}");
    assert_eq!(done["provenance"], "measured");
    assert_eq!(done["metrics"]["http_reqs"]["count"], 5.0);
    assert_eq!(done["metrics"]["http_reqs"]["rate"], 5.0);
}

#[tokio::test]
async fn test_nothing_extractable_keeps_completed_with_error() {
    let env = test_env();

    let id = submit(&env.app, "echo 'no summary here'", json!({})).await;
    let done = wait_for_terminal(&env.app, &id).await;

    assert_eq!(done["status"], "completed");
    assert!(done["error"].as_str().unwrap().contains("extraction failed"));
    assert!(done.get("metrics").is_none());
    assert!(done.get("provenance").is_none());
}

#[tokio::test]
async fn test_progress_reported_from_output() {
    let env = test_env();
    let script = r#"echo "default   [  42% ] 1 VUs  0m01.0s/0m02.4s"
sleep 0.3
echo "     http_reqs..........: 3     1.0/s"
"#;

    let id = submit(&env.app, script, json!({})).await;
    let done = wait_for_terminal(&env.app, &id).await;

    assert_eq!(done["status"], "completed", "{done}");
    assert_eq!(done["progress"], 42.0);
}

#[tokio::test]
async fn test_launch_error_fails_job() {
    let env = test_env_with(|config| {
        config.runner_command = "/nonexistent/stampede-runner".to_string();
    });

    let id = submit(&env.app, "exit 0", json!({})).await;
    let done = wait_for_terminal(&env.app, &id).await;

    assert_eq!(done["status"], "failed");
    assert!(
        done["error"]
            .as_str()
            .unwrap()
            .starts_with("Failed to launch runner")
    );
    assert!(done.get("endTime").is_some());
}

#[tokio::test]
async fn test_concurrent_submissions_are_isolated() {
    let env = test_env();
    let script = r#"echo "     http_reqs..........: ${N}     1.0/s""#;

    let mut set = JoinSet::new();
    for n in 1..=8 {
        let app = env.app.clone();
        set.spawn(async move {
            let id = submit(&app, script, json!({ "N": n.to_string() })).await;
            (n, id)
        });
    }

    let mut submitted = Vec::new();
    while let Some(result) = set.join_next().await {
        submitted.push(result.unwrap());
    }

    for (n, id) in &submitted {
        let done = wait_for_terminal(&env.app, id).await;
        assert_eq!(done["status"], "completed", "{done}");
        assert_eq!(done["metrics"]["http_reqs"]["count"], f64::from(*n));
    }
    assert_eq!(env.state.registry.len(), 8);
}

#[tokio::test]
async fn test_status_reads_are_stable() {
    let env = test_env();
    let id = submit(&env.app, &print_summary(), json!({})).await;
    wait_for_terminal(&env.app, &id).await;

    let uri = format!("/api/k6-test/status/{id}");
    let (_, first) = get(&env.app, &uri).await;
    let (_, second) = get(&env.app, &uri).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_unknown_and_malformed_ids_are_not_found() {
    let env = test_env();

    for id in [uuid::Uuid::new_v4().to_string(), "not-a-uuid".to_string()] {
        let snapshot = status(&env.app, &id).await;
        assert_eq!(snapshot, json!({ "jobId": id, "status": "not_found" }));
    }
}

#[tokio::test]
async fn test_malformed_body_creates_no_job() {
    let env = test_env();

    for body in ["not json", r#"{"env": {}}"#, r#"{"script": 5}"#] {
        let (code, json) = post_raw(&env.app, "/api/k6-test/run", body).await;
        assert_eq!(code, StatusCode::BAD_REQUEST, "{body}");
        assert!(json["error"].is_string());
    }

    assert!(env.state.registry.is_empty());
    assert_eq!(std::fs::read_dir(&env.scripts_dir).unwrap().count(), 0);
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let env = test_env_with(|config| config.max_body_bytes = 64);
    let body = json!({ "script": "x".repeat(256) }).to_string();

    let (code, json) = post_raw(&env.app, "/api/k6-test/run", body).await;
    assert_eq!(code, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(json["error"].is_string());
    assert!(env.state.registry.is_empty());
}
