//! Proctor: per-student orchestration
//!
//! One frame cycle:
//! detectors (outside any lock) → lock student → clock → filters → scorer →
//! evidence trigger → unlock → evidence capture → ledger → live update

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::ProctorConfig;
use crate::core::{
    gather_signals, Clock, EvidenceSink, FsEvidenceStore, JsonlLedger, Ledger, SessionRegistry,
    SignalProvider, SystemClock,
};
use crate::error::ProctorResult;
use crate::types::{
    DetailedStatus, EventRecord, EyeDirection, Frame, HeadDirection, ScoreUpdate, Status,
    StudentRecord, SubjectSummary, UpdateSource, ViolationKind,
};
use crate::{AWAY_TIME_LIMIT_SECS, EVIDENCE_REASON, TAB_SWITCH_LIMIT};

/// Response for one analyzed frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub student_id: String,
    pub face_present: Option<bool>,
    pub face_count: Option<u32>,
    pub head_direction: Option<HeadDirection>,
    pub eye_direction: Option<EyeDirection>,
    pub eyes_closed: Option<bool>,
    pub phone_detected: Option<bool>,
    pub hand_detected: Option<bool>,
    pub score: u32,
    pub status: Status,
    pub evidence_captured: bool,
}

/// Browser-side violation report
#[derive(Debug, Clone, Default)]
pub struct TabEvent {
    pub student_id: String,
    pub event_type: Option<String>,
    pub tab_switch_count: u32,
    pub total_away_time: f64,
}

impl TabEvent {
    /// Violations this report maps to, in application order
    pub fn violations(&self) -> Vec<ViolationKind> {
        let mut kinds = Vec::new();
        if let Some(kind) = self.event_type.as_deref().and_then(|e| e.parse().ok()) {
            kinds.push(kind);
        }
        if self.tab_switch_count >= TAB_SWITCH_LIMIT {
            kinds.push(ViolationKind::RepeatedTabSwitches);
        }
        if self.total_away_time >= AWAY_TIME_LIMIT_SECS {
            kinds.push(ViolationKind::ProlongedAbsence);
        }
        kinds
    }
}

/// Response for a tab event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabEventOutcome {
    pub event: Option<String>,
    pub score: u32,
    pub status: Status,
    /// Violations that got past the cooldown
    pub applied: Vec<ViolationKind>,
}

/// The proctoring service core
#[derive(Debug)]
pub struct Proctor {
    registry: SessionRegistry,
    signals: Arc<dyn SignalProvider>,
    evidence: Arc<dyn EvidenceSink>,
    ledger: Arc<dyn Ledger>,
    clock: Arc<dyn Clock>,
    signal_timeout: Duration,
    updates: broadcast::Sender<ScoreUpdate>,
}

impl Proctor {
    pub fn new(
        signals: Arc<dyn SignalProvider>,
        evidence: Arc<dyn EvidenceSink>,
        ledger: Arc<dyn Ledger>,
    ) -> Self {
        let defaults = ProctorConfig::default();
        let (updates, _) = broadcast::channel(defaults.update_capacity);
        Self {
            registry: SessionRegistry::new(),
            signals,
            evidence,
            ledger,
            clock: Arc::new(SystemClock),
            signal_timeout: defaults.signal_timeout,
            updates,
        }
    }

    /// Filesystem evidence store and JSONL ledger under the configured directory
    pub fn from_config(config: &ProctorConfig, signals: Arc<dyn SignalProvider>) -> Self {
        let ledger: Arc<dyn Ledger> = Arc::new(JsonlLedger::new(config.ledger_dir()));
        let evidence = Arc::new(FsEvidenceStore::new(&config.evidence_dir, Arc::clone(&ledger)));
        let (updates, _) = broadcast::channel(config.update_capacity.max(1));

        Self {
            updates,
            signal_timeout: config.signal_timeout,
            ..Self::new(signals, evidence, ledger)
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_signal_timeout(mut self, timeout: Duration) -> Self {
        self.signal_timeout = timeout;
        self
    }

    // =========================================================================
    // FRAMES
    // =========================================================================

    /// Score one frame for a student
    pub async fn analyze(&self, student_id: &str, frame: Frame) -> AnalysisOutput {
        let raw = gather_signals(&self.signals, &frame, self.signal_timeout).await;

        let handle = self.session(student_id).await;
        let outcome = {
            let mut session = handle.lock().await;
            let now = self.clock.now();
            session.observe(raw, now)
        };

        let mut evidence_captured = false;
        if outcome.capture_evidence {
            match self.evidence.save_evidence(&frame, student_id, outcome.score, EVIDENCE_REASON) {
                Ok(record) => {
                    evidence_captured = true;
                    info!(student_id, image = %record.image_name, "cheating evidence stored");
                }
                Err(e) => warn!(student_id, error = %e, "evidence capture failed"),
            }
        }

        if outcome.status_changed() {
            info!(
                student_id,
                from = outcome.previous_status.unwrap_or(Status::Normal).as_str(),
                to = outcome.status.as_str(),
                score = outcome.score,
                "status changed"
            );
            self.record_event(
                student_id,
                outcome.score,
                outcome.status,
                format!(
                    "status {} -> {}",
                    outcome.previous_status.unwrap_or(Status::Normal),
                    outcome.status
                ),
            );
        }

        let mut update = ScoreUpdate::new(student_id, outcome.score, outcome.status, UpdateSource::Frame);
        update.evidence_captured = evidence_captured;
        self.publish(update);

        let obs = outcome.observation;
        AnalysisOutput {
            student_id: student_id.to_string(),
            face_present: obs.face.map(|f| f.present),
            face_count: obs.face.map(|f| f.count),
            head_direction: obs.head,
            eye_direction: obs.eyes.map(|e| e.direction),
            eyes_closed: obs.eyes.map(|e| e.closed),
            phone_detected: obs.phone.map(|p| p.present),
            hand_detected: obs.hand.map(|h| h.present),
            score: outcome.score,
            status: outcome.status,
            evidence_captured,
        }
    }

    // =========================================================================
    // TAB EVENTS
    // =========================================================================

    /// Apply a browser-side report through the cooldown-gated penalty path
    pub async fn tab_event(&self, event: TabEvent) -> TabEventOutcome {
        let kinds = event.violations();

        let handle = self.session(&event.student_id).await;
        let (applied, score, status) = {
            let mut session = handle.lock().await;
            let now = self.clock.now();
            let applied: Vec<ViolationKind> = kinds
                .into_iter()
                .filter(|kind| session.scorer.add_instant_violation(*kind, now))
                .collect();
            (applied, session.scorer.score(), session.scorer.status())
        };

        for kind in &applied {
            self.record_event(&event.student_id, score, status, kind.to_string());
        }
        self.publish(ScoreUpdate::new(&event.student_id, score, status, UpdateSource::TabEvent));

        TabEventOutcome { event: event.event_type, score, status, applied }
    }

    // =========================================================================
    // ADMIN
    // =========================================================================

    /// Reset a student to a fresh session. Unknown ids are a no-op.
    pub async fn reset(&self, student_id: &str) -> bool {
        let existed = self.registry.reset(student_id, self.clock.now()).await;
        if existed {
            info!(student_id, "score reset");
            self.record_event(student_id, 0, Status::Normal, "reset".to_string());
            self.publish(ScoreUpdate::new(student_id, 0, Status::Normal, UpdateSource::Reset));
        }
        existed
    }

    pub async fn dashboard(&self) -> Vec<SubjectSummary> {
        self.registry.list().await
    }

    pub async fn detailed_status(&self, student_id: &str) -> Option<DetailedStatus> {
        self.registry.detailed(student_id).await
    }

    pub async fn students_active(&self) -> usize {
        self.registry.len().await
    }

    pub fn evidence_list(&self) -> ProctorResult<Vec<String>> {
        self.evidence.list()
    }

    pub fn evidence_image(&self, filename: &str) -> ProctorResult<(Vec<u8>, &'static str)> {
        self.evidence.read(filename)
    }

    /// Live score updates
    pub fn subscribe(&self) -> broadcast::Receiver<ScoreUpdate> {
        self.updates.subscribe()
    }

    // =========================================================================
    // INTERNAL HELPERS
    // =========================================================================

    async fn session(&self, student_id: &str) -> crate::core::SessionHandle {
        let (handle, created) = self.registry.get_or_create(student_id, self.clock.now()).await;
        if created {
            info!(student_id, "new student session");
            let record = StudentRecord { student_id: student_id.to_string(), first_seen: Utc::now() };
            if let Err(e) = self.ledger.record_student(&record) {
                warn!(student_id, error = %e, "failed to record student");
            }
        }
        handle
    }

    fn record_event(&self, student_id: &str, score: u32, status: Status, reason: String) {
        let record = EventRecord {
            student_id: student_id.to_string(),
            timestamp: Utc::now(),
            score,
            status,
            reason,
        };
        if let Err(e) = self.ledger.record_event(&record) {
            warn!(student_id, error = %e, "failed to record event");
        }
    }

    fn publish(&self, update: ScoreUpdate) {
        // No subscribers is fine
        let _ = self.updates.send(update);
    }
}
