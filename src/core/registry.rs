//! Session Registry: one scorer per student
//!
//! The map lock is held only for lookup and insert. Each session has its own
//! mutex, so scoring one student never blocks another.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};

use crate::core::{EvidenceTrigger, SignalFilters, SuspicionScorer};
use crate::types::{DetailedStatus, Observation, Status, SubjectSummary};

/// Result of one frame cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Signals after per-student filtering
    pub observation: Observation,
    pub score: u32,
    pub status: Status,
    pub previous_status: Option<Status>,
    /// Entered CHEATING this cycle
    pub capture_evidence: bool,
}

impl CycleOutcome {
    /// A student with no previous cycle counts as NORMAL
    pub fn status_changed(&self) -> bool {
        self.previous_status.unwrap_or(Status::Normal) != self.status
    }
}

/// Everything kept per student
#[derive(Debug)]
pub struct Session {
    pub student_id: String,
    pub first_seen: DateTime<Utc>,
    pub scorer: SuspicionScorer,
    pub filters: SignalFilters,
    pub trigger: EvidenceTrigger,
}

impl Session {
    pub fn new(student_id: impl Into<String>, now: Instant) -> Self {
        Self {
            student_id: student_id.into(),
            first_seen: Utc::now(),
            scorer: SuspicionScorer::new(now),
            filters: SignalFilters::default(),
            trigger: EvidenceTrigger::new(),
        }
    }

    /// Filter, score and evaluate the evidence trigger for one frame
    pub fn observe(&mut self, raw: Observation, now: Instant) -> CycleOutcome {
        let observation = self.filters.apply(raw);
        self.scorer.observe(&observation, now);

        let status = self.scorer.status();
        let previous_status = self.trigger.previous();
        let capture_evidence = self.trigger.observe(status);

        CycleOutcome {
            observation,
            score: self.scorer.score(),
            status,
            previous_status,
            capture_evidence,
        }
    }

    /// Fresh scorer, fresh filters, no previous status. `first_seen` is kept.
    pub fn reset(&mut self, now: Instant) {
        self.scorer.reset(now);
        self.filters = SignalFilters::default();
        self.trigger.clear();
    }

    pub fn summary(&self) -> SubjectSummary {
        SubjectSummary {
            student_id: self.student_id.clone(),
            score: self.scorer.score(),
            status: self.scorer.status(),
        }
    }
}

pub type SessionHandle = Arc<Mutex<Session>>;

/// Student id → session
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing session, or a new one in the learning phase.
    /// The flag is true when the session was created by this call.
    pub async fn get_or_create(&self, student_id: &str, now: Instant) -> (SessionHandle, bool) {
        if let Some(handle) = self.get(student_id).await {
            return (handle, false);
        }

        let mut sessions = self.sessions.write().await;
        // Another request may have inserted it between the two locks
        if let Some(handle) = sessions.get(student_id) {
            return (Arc::clone(handle), false);
        }
        let handle = Arc::new(Mutex::new(Session::new(student_id, now)));
        sessions.insert(student_id.to_string(), Arc::clone(&handle));
        (handle, true)
    }

    pub async fn get(&self, student_id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(student_id).cloned()
    }

    /// Reset a known student; unknown ids are ignored. Returns whether one existed.
    pub async fn reset(&self, student_id: &str, now: Instant) -> bool {
        match self.get(student_id).await {
            Some(handle) => {
                handle.lock().await.reset(now);
                true
            }
            None => false,
        }
    }

    /// Snapshot of every student, sorted by id
    pub async fn list(&self) -> Vec<SubjectSummary> {
        let handles: Vec<SessionHandle> = self.sessions.read().await.values().cloned().collect();

        let mut rows = Vec::with_capacity(handles.len());
        for handle in handles {
            rows.push(handle.lock().await.summary());
        }
        rows.sort_by(|a, b| a.student_id.cmp(&b.student_id));
        rows
    }

    pub async fn detailed(&self, student_id: &str) -> Option<DetailedStatus> {
        let handle = self.get(student_id).await?;
        let session = handle.lock().await;
        Some(session.scorer.detailed_status())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
