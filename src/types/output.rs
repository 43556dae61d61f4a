//! Output structures for the API, live feed and terminal

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::types::{RiskLevel, Status};

/// What caused a score update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateSource {
    Frame,
    TabEvent,
    Reset,
}

/// Score/status after one update, broadcast to live subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreUpdate {
    pub timestamp: DateTime<Utc>,
    pub student_id: String,
    pub score: u32,
    pub status: Status,
    pub source: UpdateSource,
    /// Evidence was captured during this update
    #[serde(default)]
    pub evidence_captured: bool,
}

impl ScoreUpdate {
    pub fn new(student_id: impl Into<String>, score: u32, status: Status, source: UpdateSource) -> Self {
        Self {
            timestamp: Utc::now(),
            student_id: student_id.into(),
            score,
            status,
            source,
            evidence_captured: false,
        }
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let color = self.status.color_code();
        let reset = Status::color_reset();
        let marker = if self.evidence_captured { " | evidence" } else { "" };

        format!(
            "{}{} score={} | status={}{}{}",
            color, self.student_id, self.score, self.status, marker, reset
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "student={} | score={} | status={} | evidence={}",
            self.student_id, self.score, self.status, self.evidence_captured
        )
    }
}

/// Dashboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectSummary {
    pub student_id: String,
    pub score: u32,
    pub status: Status,
}

/// Diagnostic view of one scorer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedStatus {
    pub score: u32,
    pub status: Status,
    pub learning_phase: bool,
    pub suspicious_patterns: u32,
    pub risk_level: RiskLevel,
    pub penalties_applied: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reason: Option<String>,
}
