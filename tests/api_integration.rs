//! Integration tests for the HTTP API
//!
//! Requests go through the router with `oneshot`; signals are scripted

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use pretty_assertions::assert_eq;
use proctor::core::{create_router, FsEvidenceStore, ManualClock, MemoryLedger, Proctor, ScriptedSignals};
use proctor::types::Observation;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];

struct TestApp {
    router: Router,
    clock: Arc<ManualClock>,
    signals: Arc<ScriptedSignals>,
    root: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

fn create_test_app(name: &str) -> TestApp {
    let root = std::env::temp_dir().join(format!(
        "proctor_api_{}_{}_{}",
        name,
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    let clock = Arc::new(ManualClock::new());
    let signals = Arc::new(ScriptedSignals::new(Observation::attentive()));
    let ledger = Arc::new(MemoryLedger::new());
    let store = FsEvidenceStore::new(&root, ledger.clone());
    let proctor = Proctor::new(signals.clone(), Arc::new(store), ledger).with_clock(clock.clone());

    TestApp { router: create_router(Arc::new(proctor)), clock, signals, root }
}

impl TestApp {
    async fn get(&self, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = self
            .router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let (status, body) = self.get(uri).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn post_raw(&self, uri: &str, body: String) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.post_raw(uri, body.to_string()).await
    }
}

fn encoded_jpeg() -> String {
    STANDARD.encode(JPEG)
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app("health");
    let (status, json) = app.get_json("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], proctor::VERSION);
    assert_eq!(json["subjects_active"], 0);
}

#[tokio::test]
async fn test_analyze_frame() {
    let app = create_test_app("analyze");
    let (status, json) = app
        .post("/proctor/analyze", json!({"student_id": "s1", "image": encoded_jpeg()}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["student_id"], "s1");
    assert_eq!(json["face_present"], true);
    assert_eq!(json["face_count"], 1);
    assert_eq!(json["head_direction"], "center");
    assert_eq!(json["eye_direction"], "center");
    assert_eq!(json["eyes_closed"], false);
    assert_eq!(json["phone_detected"], false);
    assert_eq!(json["hand_detected"], false);
    assert_eq!(json["score"], 0);
    assert_eq!(json["status"], "NORMAL");
}

#[tokio::test]
async fn test_analyze_accepts_data_url_and_subject_alias() {
    let app = create_test_app("dataurl");
    let image = format!("data:image/jpeg;base64,{}", encoded_jpeg());
    let (status, json) = app
        .post("/proctor/analyze", json!({"subject_id": "s9", "image": image}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["student_id"], "s9");
}

#[tokio::test]
async fn test_analyze_rejects_bad_input_without_state_change() {
    let app = create_test_app("badinput");
    let not_image = STANDARD.encode(b"hello world");
    let cases = [
        (json!({"image": encoded_jpeg()}), "student_id missing"),
        (json!({"student_id": "s1"}), "image missing"),
        (json!({"student_id": "s1", "image": ""}), "image missing"),
        (json!({"student_id": "s1", "image": "!!!not base64!!!"}), ""),
        (json!({"student_id": "s1", "image": not_image}), ""),
        (json!({"student_id": "", "image": encoded_jpeg()}), "student_id missing"),
    ];

    for (body, message) in cases {
        let (status, json) = app.post("/proctor/analyze", body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {}", body);
        assert!(json["error"].is_string());
        if !message.is_empty() {
            assert_eq!(json["error"], message);
        }
    }

    let (_, dashboard) = app.get_json("/proctor/dashboard-data").await;
    assert_eq!(dashboard, json!([]));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = create_test_app("malformed");
    let (status, json) = app.post_raw("/proctor/reset-score", "{oops".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_reset_score() {
    let app = create_test_app("reset");
    app.clock.set(1.0);
    app.post("/proctor/tab-event", json!({"student_id": "s1", "event_type": "copy_paste"}))
        .await;

    let (status, json) = app.post("/proctor/reset-score", json!({"student_id": "s1"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({"message": "Score reset", "student_id": "s1", "score": 0, "status": "NORMAL"})
    );

    let (_, dashboard) = app.get_json("/proctor/dashboard-data").await;
    assert_eq!(dashboard, json!([{"student_id": "s1", "score": 0, "status": "NORMAL"}]));
}

#[tokio::test]
async fn test_reset_unknown_and_missing() {
    let app = create_test_app("resetunknown");

    let (status, json) = app.post("/proctor/reset-score", json!({"student_id": "ghost"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["score"], 0);

    let (status, json) = app.post("/proctor/reset-score", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "student_id missing");
}

#[tokio::test]
async fn test_tab_event() {
    let app = create_test_app("tab");
    app.clock.set(4.0);

    let (status, json) = app
        .post(
            "/proctor/tab-event",
            json!({"student_id": "s1", "event_type": "fullscreen_exit", "tab_switch_count": 1}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["event"], "fullscreen_exit");
    assert_eq!(json["score"], 25);
    assert_eq!(json["status"], "SUSPICIOUS");

    // Inside the cooldown nothing lands
    app.clock.set(4.2);
    let (_, json) = app
        .post("/proctor/tab-event", json!({"student_id": "s1", "event_type": "copy_paste"}))
        .await;
    assert_eq!(json["score"], 25);

    let (status, _) = app.post("/proctor/tab-event", json!({"event_type": "tab_switch"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_dashboard_lists_all_students() {
    let app = create_test_app("dashboard");
    for id in ["b", "a"] {
        app.post("/proctor/analyze", json!({"student_id": id, "image": encoded_jpeg()}))
            .await;
    }

    let (status, json) = app.get_json("/proctor/dashboard-data").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!([
            {"student_id": "a", "score": 0, "status": "NORMAL"},
            {"student_id": "b", "score": 0, "status": "NORMAL"}
        ])
    );
}

#[tokio::test]
async fn test_evidence_flow() {
    let app = create_test_app("evidence");

    let (status, json) = app.get_json("/proctor/evidence-list").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!([]));

    app.post("/proctor/tab-event", json!({"student_id": "s1", "event_type": "multiple_monitors"}))
        .await;
    let (_, analyzed) = app
        .post("/proctor/analyze", json!({"student_id": "s1", "image": encoded_jpeg()}))
        .await;
    assert_eq!(analyzed["status"], "CHEATING");
    assert_eq!(analyzed["evidence_captured"], true);

    let (_, list) = app.get_json("/proctor/evidence-list").await;
    let items = list.as_array().unwrap();
    assert_eq!(items.len(), 1);
    let filename = items[0]["image"].as_str().unwrap().to_string();
    assert!(filename.starts_with("s1_"));

    let (status, bytes) = app.get(&format!("/proctor/evidence/{}", filename)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, JPEG.to_vec());
}

#[tokio::test]
async fn test_evidence_file_errors() {
    let app = create_test_app("evidencefile");

    let (status, json) = app.get_json("/proctor/evidence/missing_2026-01-01_00-00-00.jpg").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].is_string());

    let (status, _) = app.get_json("/proctor/evidence/notes.txt").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get_json("/proctor/evidence/..%2Fsecret.jpg").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_student_status() {
    let app = create_test_app("status");

    let (status, _) = app.get_json("/proctor/status/nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.signals.set(Observation::attentive());
    app.post("/proctor/tab-event", json!({"student_id": "s1", "event_type": "right_click"}))
        .await;

    let (status, json) = app.get_json("/proctor/status/s1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["score"], 10);
    assert_eq!(json["status"], "NORMAL");
    assert_eq!(json["risk_level"], "MEDIUM");
    assert_eq!(json["learning_phase"], true);
    assert_eq!(json["penalties_applied"], 1);
}
