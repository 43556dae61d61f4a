//! HTTP + WebSocket API for Proctor
//!
//! Endpoints:
//! - POST /proctor/analyze - Score one webcam frame
//! - POST /proctor/reset-score - Reset a student
//! - GET /proctor/dashboard-data - Score and status of every student
//! - POST /proctor/tab-event - Browser-side violation report
//! - GET /proctor/evidence-list - Stored evidence images
//! - GET /proctor/evidence/{filename} - One evidence image
//! - GET /proctor/status/{student_id} - Detailed scorer status
//! - WS /proctor/ws - Live score updates
//! - GET /health - Health check

use axum::{
    extract::{
        rejection::JsonRejection,
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::config::ProctorConfig;
use crate::core::{AnalysisOutput, Proctor, TabEvent, TabEventOutcome};
use crate::error::{ProctorError, ProctorResult};
use crate::types::{DetailedStatus, Frame, ScoreUpdate, Status, SubjectSummary};

/// Shared handler state
pub type AppState = Arc<Proctor>;

/// Analyze frame request
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default, alias = "subject_id")]
    pub student_id: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Reset request
#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    #[serde(default, alias = "subject_id")]
    pub student_id: Option<String>,
}

/// Reset response
#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub message: String,
    pub student_id: String,
    pub score: u32,
    pub status: Status,
}

/// Tab event request
#[derive(Debug, Deserialize)]
pub struct TabEventRequest {
    #[serde(default, alias = "subject_id")]
    pub student_id: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub tab_switch_count: Option<u32>,
    #[serde(default)]
    pub total_away_time: Option<f64>,
}

/// Evidence list entry
#[derive(Debug, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub image: String,
}

/// Health response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub subjects_active: usize,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ProctorError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProctorError::NotFound(_) => StatusCode::NOT_FOUND,
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

/// Create the API router
pub fn create_router(proctor: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/proctor/analyze", post(analyze))
        .route("/proctor/reset-score", post(reset_score))
        .route("/proctor/dashboard-data", get(dashboard_data))
        .route("/proctor/tab-event", post(tab_event))
        .route("/proctor/evidence-list", get(evidence_list))
        .route("/proctor/evidence/:filename", get(evidence_image))
        .route("/proctor/status/:student_id", get(student_status))
        .route("/proctor/ws", get(websocket_handler))
        .with_state(proctor)
}

/// Health check endpoint
async fn health(State(proctor): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        subjects_active: proctor.students_active().await,
    })
}

/// Score one frame
async fn analyze(
    State(proctor): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ProctorResult<Json<AnalysisOutput>> {
    let Json(req) = payload.map_err(malformed)?;
    let student_id = required(req.student_id, "student_id")?;
    let image = req
        .image
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ProctorError::MissingField("image".to_string()))?;

    // Decode before touching any student state
    let frame = Frame::from_base64(&image)?;
    debug!(student_id = %student_id, bytes = frame.len(), "frame received");

    Ok(Json(proctor.analyze(&student_id, frame).await))
}

/// Reset a student's score
async fn reset_score(
    State(proctor): State<AppState>,
    payload: Result<Json<ResetRequest>, JsonRejection>,
) -> ProctorResult<Json<ResetResponse>> {
    let Json(req) = payload.map_err(malformed)?;
    let student_id = required(req.student_id, "student_id")?;

    proctor.reset(&student_id).await;

    Ok(Json(ResetResponse {
        message: "Score reset".to_string(),
        student_id,
        score: 0,
        status: Status::Normal,
    }))
}

/// Every student's score and status
async fn dashboard_data(State(proctor): State<AppState>) -> Json<Vec<SubjectSummary>> {
    Json(proctor.dashboard().await)
}

/// Browser-side violation report
async fn tab_event(
    State(proctor): State<AppState>,
    payload: Result<Json<TabEventRequest>, JsonRejection>,
) -> ProctorResult<Json<TabEventOutcome>> {
    let Json(req) = payload.map_err(malformed)?;
    let student_id = required(req.student_id, "student_id")?;

    let outcome = proctor
        .tab_event(TabEvent {
            student_id,
            event_type: req.event_type,
            tab_switch_count: req.tab_switch_count.unwrap_or(0),
            total_away_time: req.total_away_time.unwrap_or(0.0),
        })
        .await;

    Ok(Json(outcome))
}

/// Stored evidence filenames
async fn evidence_list(State(proctor): State<AppState>) -> ProctorResult<Json<Vec<EvidenceItem>>> {
    let items = proctor
        .evidence_list()?
        .into_iter()
        .map(|image| EvidenceItem { image })
        .collect();
    Ok(Json(items))
}

/// Raw evidence image
async fn evidence_image(
    State(proctor): State<AppState>,
    Path(filename): Path<String>,
) -> ProctorResult<impl IntoResponse> {
    let (bytes, content_type) = proctor.evidence_image(&filename)?;
    Ok((StatusCode::OK, [(header::CONTENT_TYPE, content_type)], bytes))
}

/// Detailed scorer status
async fn student_status(
    State(proctor): State<AppState>,
    Path(student_id): Path<String>,
) -> ProctorResult<Json<DetailedStatus>> {
    proctor
        .detailed_status(&student_id)
        .await
        .map(Json)
        .ok_or(ProctorError::NotFound(student_id))
}

/// WebSocket handler for live updates
async fn websocket_handler(
    State(proctor): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let rx = proctor.subscribe();
    ws.on_upgrade(move |socket| handle_websocket(socket, rx))
}

/// Forward updates until either side goes away
async fn handle_websocket(socket: WebSocket, mut rx: broadcast::Receiver<ScoreUpdate>) {
    let (mut sender, mut receiver) = socket.split();

    let mut forward = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(update) => {
                    let json = match serde_json::to_string(&update) {
                        Ok(json) => json,
                        Err(e) => {
                            warn!(error = %e, "failed to encode update");
                            continue;
                        }
                    };
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "live feed subscriber lagging");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut inbound = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut forward => inbound.abort(),
        _ = &mut inbound => forward.abort(),
    }
}

fn required(value: Option<String>, field: &str) -> ProctorResult<String> {
    value
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ProctorError::MissingField(field.to_string()))
}

fn malformed(rejection: JsonRejection) -> ProctorError {
    ProctorError::Malformed(rejection.body_text())
}

/// Run the API server
pub async fn run_server(config: &ProctorConfig, proctor: AppState) -> ProctorResult<()> {
    let router = create_router(proctor);
    let listener = tokio::net::TcpListener::bind(&config.addr).await?;

    info!(
        addr = %config.addr,
        evidence_dir = %config.evidence_dir.display(),
        signal_timeout_ms = config.signal_timeout.as_millis() as u64,
        "proctor API listening"
    );
    println!("Proctor API running on {}", config.addr);
    println!("  POST /proctor/analyze          - Score a frame");
    println!("  POST /proctor/reset-score      - Reset a student");
    println!("  GET  /proctor/dashboard-data   - All students");
    println!("  POST /proctor/tab-event        - Browser violation");
    println!("  GET  /proctor/evidence-list    - Evidence images");
    println!("  GET  /proctor/evidence/:file   - One image");
    println!("  GET  /proctor/status/:id       - Detailed status");
    println!("  WS   /proctor/ws               - Live updates");
    println!("  GET  /health                   - Health check");

    axum::serve(listener, router).await?;
    Ok(())
}
