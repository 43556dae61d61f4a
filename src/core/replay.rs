//! Offline replay of recorded signal streams
//!
//! Input is JSON lines, one record per line:
//!   {"t": 4.0, "student_id": "s1", "signals": {"face": {"present": false, "count": 0}}}
//!   {"t": 6.5, "student_id": "s1", "violation": "tab_switch"}
//!
//! Every record is scored at `base + t`, so a replay is deterministic.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::BufRead;
use std::time::{Duration, Instant};

use crate::core::Session;
use crate::error::{ProctorError, ProctorResult};
use crate::types::{Observation, Status, ViolationKind};

/// One recorded input
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayRecord {
    /// Seconds since the start of the recording
    pub t: f64,
    #[serde(alias = "subject_id")]
    pub student_id: String,
    #[serde(default)]
    pub signals: Option<Observation>,
    #[serde(default)]
    pub violation: Option<String>,
}

/// Scorer state after one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayStep {
    pub line: usize,
    pub student_id: String,
    pub score: u32,
    pub status: Status,
    pub evidence: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<ViolationKind>,
    /// A violation record that lost to the cooldown
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub suppressed: bool,
}

/// Replays records against per-student sessions on a synthetic clock
#[derive(Debug)]
pub struct Replayer {
    base: Instant,
    sessions: HashMap<String, Session>,
    line: usize,
}

impl Default for Replayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Replayer {
    pub fn new() -> Self {
        Self::with_base(Instant::now())
    }

    pub fn with_base(base: Instant) -> Self {
        Self { base, sessions: HashMap::new(), line: 0 }
    }

    /// Parse and apply one line. Blank lines yield `None`.
    pub fn apply_line(&mut self, line: &str) -> ProctorResult<Option<ReplayStep>> {
        self.line += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let record: ReplayRecord = serde_json::from_str(trimmed)
            .map_err(|e| ProctorError::Malformed(format!("line {}: {}", self.line, e)))?;
        self.apply(record).map(Some)
    }

    /// Apply one parsed record
    pub fn apply(&mut self, record: ReplayRecord) -> ProctorResult<ReplayStep> {
        if !record.t.is_finite() || record.t < 0.0 {
            return Err(ProctorError::Malformed(format!(
                "line {}: t must be a non-negative number",
                self.line
            )));
        }
        let now = Duration::try_from_secs_f64(record.t)
            .ok()
            .and_then(|offset| self.base.checked_add(offset))
            .ok_or_else(|| ProctorError::Malformed(format!("line {}: t out of range", self.line)))?;

        let violation = match record.violation.as_deref() {
            Some(name) => Some(name.parse::<ViolationKind>().map_err(|_| {
                ProctorError::Malformed(format!("line {}: unknown violation {}", self.line, name))
            })?),
            None => None,
        };
        if violation.is_none() && record.signals.is_none() {
            return Err(ProctorError::Malformed(format!(
                "line {}: needs signals or violation",
                self.line
            )));
        }

        let session = self
            .sessions
            .entry(record.student_id.clone())
            .or_insert_with(|| Session::new(record.student_id.clone(), now));

        let mut suppressed = false;
        if let Some(kind) = violation {
            suppressed = !session.scorer.add_instant_violation(kind, now);
        }

        let mut evidence = false;
        if let Some(observation) = record.signals {
            evidence = session.observe(observation, now).capture_evidence;
        }

        Ok(ReplayStep {
            line: self.line,
            student_id: record.student_id,
            score: session.scorer.score(),
            status: session.scorer.status(),
            evidence,
            violation,
            suppressed,
        })
    }

    /// Replay a whole stream, stopping at the first bad record
    pub fn run<R: BufRead>(&mut self, reader: R) -> ProctorResult<Vec<ReplayStep>> {
        let mut steps = Vec::new();
        for line in reader.lines() {
            if let Some(step) = self.apply_line(&line?)? {
                steps.push(step);
            }
        }
        Ok(steps)
    }

    pub fn session(&self, student_id: &str) -> Option<&Session> {
        self.sessions.get(student_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABSENT: &str = r#""signals": {"face": {"present": false, "count": 0}}"#;

    fn line(t: f64, rest: &str) -> String {
        format!(r#"{{"t": {}, "student_id": "s1", {}}}"#, t, rest)
    }

    #[test]
    fn test_no_face_scenario() {
        let input = [line(0.0, ABSENT), line(4.0, ABSENT), line(5.6, ABSENT)].join("\n");
        let steps = Replayer::new().run(input.as_bytes()).unwrap();

        assert_eq!(steps.len(), 3);
        assert_eq!(steps[1].score, 0);
        assert_eq!(steps[2].score, 25);
        assert_eq!(steps[2].status, Status::Suspicious);
    }

    #[test]
    fn test_violation_and_cooldown() {
        let mut replayer = Replayer::new();
        let first = replayer.apply_line(&line(4.0, r#""violation": "copy_paste""#)).unwrap().unwrap();
        assert_eq!(first.score, 30);
        assert_eq!(first.violation, Some(ViolationKind::CopyPaste));
        assert!(!first.suppressed);

        let second = replayer.apply_line(&line(4.2, r#""violation": "tab_switch""#)).unwrap().unwrap();
        assert_eq!(second.score, 30);
        assert!(second.suppressed);
    }

    #[test]
    fn test_subject_id_alias_and_blank_lines() {
        let mut replayer = Replayer::new();
        assert!(replayer.apply_line("   ").unwrap().is_none());
        let step = replayer
            .apply_line(r#"{"t": 1, "subject_id": "x", "signals": {}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(step.student_id, "x");
        assert_eq!(step.line, 2);
        assert!(replayer.session("x").is_some());
    }

    #[test]
    fn test_bad_records_rejected() {
        let mut replayer = Replayer::new();
        assert!(matches!(replayer.apply_line("{not json"), Err(ProctorError::Malformed(_))));
        assert!(matches!(
            replayer.apply_line(&line(1.0, r#""violation": "teleport""#)),
            Err(ProctorError::Malformed(_))
        ));
        assert!(matches!(
            replayer.apply_line(r#"{"t": 1, "student_id": "s1"}"#),
            Err(ProctorError::Malformed(_))
        ));
        assert!(matches!(
            replayer.apply_line(&line(-1.0, ABSENT)),
            Err(ProctorError::Malformed(_))
        ));
        match replayer.apply_line(r#"{"t": 1e300, "student_id": "s1", "signals": {}}"#) {
            Err(ProctorError::Malformed(msg)) => assert!(msg.ends_with("t out of range")),
            other => panic!("expected out of range error, got {:?}", other),
        }
        assert!(replayer.session("s1").is_none());
    }
}
