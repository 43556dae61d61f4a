//! Append-only records of students, scored events and evidence

use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::ProctorResult;
use crate::types::{EventRecord, EvidenceRecord, StudentRecord};

/// Durable store for proctoring records
pub trait Ledger: Send + Sync + std::fmt::Debug {
    fn record_student(&self, record: &StudentRecord) -> ProctorResult<()>;
    fn record_event(&self, record: &EventRecord) -> ProctorResult<()>;
    fn record_evidence(&self, record: &EvidenceRecord) -> ProctorResult<()>;
}

/// Newline-delimited JSON files, one per record kind
#[derive(Debug)]
pub struct JsonlLedger {
    dir: PathBuf,
    // Serializes appends from concurrent requests
    write_lock: Mutex<()>,
}

impl JsonlLedger {
    pub const STUDENTS_FILE: &'static str = "students.jsonl";
    pub const EVENTS_FILE: &'static str = "events.jsonl";
    pub const EVIDENCE_FILE: &'static str = "evidence.jsonl";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), write_lock: Mutex::new(()) }
    }

    fn append<T: Serialize>(&self, file: &str, record: &T) -> ProctorResult<()> {
        let line = serde_json::to_string(record)?;
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        std::fs::create_dir_all(&self.dir)?;
        let mut out = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(file))?;
        writeln!(out, "{}", line)?;
        Ok(())
    }
}

impl Ledger for JsonlLedger {
    fn record_student(&self, record: &StudentRecord) -> ProctorResult<()> {
        self.append(Self::STUDENTS_FILE, record)
    }

    fn record_event(&self, record: &EventRecord) -> ProctorResult<()> {
        self.append(Self::EVENTS_FILE, record)
    }

    fn record_evidence(&self, record: &EvidenceRecord) -> ProctorResult<()> {
        self.append(Self::EVIDENCE_FILE, record)
    }
}

/// In-memory ledger for tests
#[derive(Debug, Default)]
pub struct MemoryLedger {
    students: Mutex<Vec<StudentRecord>>,
    events: Mutex<Vec<EventRecord>>,
    evidence: Mutex<Vec<EvidenceRecord>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn students(&self) -> Vec<StudentRecord> {
        self.students.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn events(&self) -> Vec<EventRecord> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn evidence(&self) -> Vec<EvidenceRecord> {
        self.evidence.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Ledger for MemoryLedger {
    fn record_student(&self, record: &StudentRecord) -> ProctorResult<()> {
        self.students.lock().unwrap_or_else(|e| e.into_inner()).push(record.clone());
        Ok(())
    }

    fn record_event(&self, record: &EventRecord) -> ProctorResult<()> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).push(record.clone());
        Ok(())
    }

    fn record_evidence(&self, record: &EvidenceRecord) -> ProctorResult<()> {
        self.evidence.lock().unwrap_or_else(|e| e.into_inner()).push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Status;
    use chrono::Utc;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "proctor_ledger_{}_{}_{}",
            name,
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_jsonl_appends_lines() {
        let dir = temp_dir("append");
        let ledger = JsonlLedger::new(&dir);

        for score in [10, 40] {
            ledger
                .record_event(&EventRecord {
                    student_id: "s1".to_string(),
                    timestamp: Utc::now(),
                    score,
                    status: Status::from_score(score),
                    reason: "test".to_string(),
                })
                .unwrap();
        }

        let content = std::fs::read_to_string(dir.join(JsonlLedger::EVENTS_FILE)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let second: EventRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.score, 40);
        assert_eq!(second.status, Status::Cheating);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_memory_ledger_keeps_records() {
        let ledger = MemoryLedger::new();
        ledger
            .record_student(&StudentRecord { student_id: "a".to_string(), first_seen: Utc::now() })
            .unwrap();
        assert_eq!(ledger.students().len(), 1);
        assert!(ledger.events().is_empty());
    }
}
