//! Evidence capture
//!
//! Key invariant: capture fires only on the transition INTO CHEATING,
//! never again while the student stays there.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::core::Ledger;
use crate::error::{ProctorError, ProctorResult};
use crate::types::{EvidenceRecord, Frame, ImageFormat, Status};

lazy_static! {
    /// Anything that may not appear in a stored filename
    static ref RE_UNSAFE_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_.-]").unwrap();

    /// Evidence files the API is allowed to serve
    static ref RE_EVIDENCE_FILE: Regex = Regex::new(
        r"^[A-Za-z0-9_.-]+\.(?i:jpg|jpeg|png)$"
    ).unwrap();
}

/// Edge detector over a student's status
#[derive(Debug, Clone, Default)]
pub struct EvidenceTrigger {
    previous: Option<Status>,
}

impl EvidenceTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the status of this cycle; true when evidence should be captured
    pub fn observe(&mut self, current: Status) -> bool {
        let fire = current == Status::Cheating && self.previous != Some(Status::Cheating);
        self.previous = Some(current);
        fire
    }

    pub fn previous(&self) -> Option<Status> {
        self.previous
    }

    pub fn clear(&mut self) {
        self.previous = None;
    }
}

/// Evidence capture collaborator
pub trait EvidenceSink: Send + Sync + std::fmt::Debug {
    /// Store the frame and its log entry; returns the stored record
    fn save_evidence(
        &self,
        frame: &Frame,
        student_id: &str,
        score: u32,
        reason: &str,
    ) -> ProctorResult<EvidenceRecord>;

    /// Stored image filenames
    fn list(&self) -> ProctorResult<Vec<String>>;

    /// Bytes and content type of a stored image
    fn read(&self, filename: &str) -> ProctorResult<(Vec<u8>, &'static str)>;
}

/// Filesystem evidence store:
/// `{root}/images/*.jpg|png`, `{root}/logs/events.log`, plus a ledger record.
#[derive(Debug)]
pub struct FsEvidenceStore {
    root: PathBuf,
    ledger: Arc<dyn Ledger>,
}

impl FsEvidenceStore {
    pub const LOG_FILE: &'static str = "events.log";

    pub fn new(root: impl Into<PathBuf>, ledger: Arc<dyn Ledger>) -> Self {
        Self { root: root.into(), ledger }
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join("images")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    fn append_log(&self, line: &str) -> ProctorResult<()> {
        std::fs::create_dir_all(self.logs_dir())?;
        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.logs_dir().join(Self::LOG_FILE))?;
        writeln!(log, "{}", line)?;
        Ok(())
    }
}

impl EvidenceSink for FsEvidenceStore {
    fn save_evidence(
        &self,
        frame: &Frame,
        student_id: &str,
        score: u32,
        reason: &str,
    ) -> ProctorResult<EvidenceRecord> {
        let timestamp = Utc::now();
        let ts_str = timestamp_label(&timestamp);
        let image_name = evidence_filename(student_id, &timestamp, frame.format().extension());

        std::fs::create_dir_all(self.images_dir())?;
        std::fs::write(self.images_dir().join(&image_name), frame.bytes())?;

        let digest = to_hex(&sha256(frame.bytes()));
        self.append_log(&format!(
            "{} | {} | score={} | reason={} | image={} | sha256={}",
            ts_str, student_id, score, reason, image_name, digest
        ))?;

        let record = EvidenceRecord {
            student_id: student_id.to_string(),
            image_name,
            timestamp,
            score,
            reason: reason.to_string(),
            sha256: digest,
        };
        self.ledger.record_evidence(&record)?;

        info!(student_id, score, image = %record.image_name, "evidence captured");
        Ok(record)
    }

    fn list(&self) -> ProctorResult<Vec<String>> {
        let dir = self.images_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if is_valid_evidence_name(&name) {
                files.push(name);
            }
        }
        files.sort();
        Ok(files)
    }

    fn read(&self, filename: &str) -> ProctorResult<(Vec<u8>, &'static str)> {
        if !is_valid_evidence_name(filename) {
            return Err(ProctorError::InvalidFilename(filename.to_string()));
        }
        let path = self.images_dir().join(filename);
        if !path.is_file() {
            return Err(ProctorError::NotFound(filename.to_string()));
        }
        let bytes = std::fs::read(&path)?;
        Ok((bytes, content_type_for(&path)))
    }
}

/// `{student}_{YYYY-mm-dd_HH-MM-SS}.{ext}` with unsafe characters replaced
pub fn evidence_filename(student_id: &str, timestamp: &DateTime<Utc>, extension: &str) -> String {
    let safe_id = RE_UNSAFE_CHARS.replace_all(student_id, "_");
    format!("{}_{}.{}", safe_id, timestamp_label(timestamp), extension)
}

/// Only plain image names, no separators or traversal
pub fn is_valid_evidence_name(name: &str) -> bool {
    RE_EVIDENCE_FILE.is_match(name) && !name.starts_with('.')
}

fn timestamp_label(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d_%H-%M-%S").to_string()
}

fn content_type_for(path: &Path) -> &'static str {
    let format = match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()) {
        Some(ext) if ext == "png" => ImageFormat::Png,
        _ => ImageFormat::Jpeg,
    };
    format.content_type()
}

/// SHA-256 helper
fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MemoryLedger;
    use chrono::TimeZone;

    fn temp_root(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "proctor_evidence_{}_{}_{}",
            name,
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn jpeg() -> Frame {
        Frame::from_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3]).unwrap()
    }

    #[test]
    fn test_trigger_fires_once_per_entry() {
        let mut trigger = EvidenceTrigger::new();
        let statuses = [
            (Status::Normal, false),
            (Status::Cheating, true),
            (Status::Cheating, false),
            (Status::Cheating, false),
            (Status::Cheating, false),
            (Status::Suspicious, false),
            (Status::Cheating, true),
        ];
        for (status, expected) in statuses {
            assert_eq!(trigger.observe(status), expected, "at {:?}", status);
        }
    }

    #[test]
    fn test_trigger_fires_on_first_cycle_if_cheating() {
        let mut trigger = EvidenceTrigger::new();
        assert!(trigger.observe(Status::Cheating));
    }

    #[test]
    fn test_trigger_clear() {
        let mut trigger = EvidenceTrigger::new();
        trigger.observe(Status::Cheating);
        trigger.clear();
        assert_eq!(trigger.previous(), None);
        assert!(trigger.observe(Status::Cheating));
    }

    #[test]
    fn test_filename_format() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(evidence_filename("stu42", &ts, "jpg"), "stu42_2026-03-04_05-06-07.jpg");
        assert_eq!(evidence_filename("../etc/x", &ts, "png"), ".._etc_x_2026-03-04_05-06-07.png");
    }

    #[test]
    fn test_name_validation() {
        assert!(is_valid_evidence_name("stu_2026-01-01_00-00-00.jpg"));
        assert!(is_valid_evidence_name("a.PNG"));
        assert!(!is_valid_evidence_name("../secret.jpg"));
        assert!(!is_valid_evidence_name("dir/file.jpg"));
        assert!(!is_valid_evidence_name("notes.txt"));
        assert!(!is_valid_evidence_name(".hidden.jpg"));
    }

    #[test]
    fn test_save_writes_image_log_and_record() {
        let root = temp_root("save");
        let ledger = Arc::new(MemoryLedger::new());
        let store = FsEvidenceStore::new(&root, ledger.clone());

        let record = store.save_evidence(&jpeg(), "stu1", 40, "Suspicious behavior detected").unwrap();

        assert!(record.image_name.starts_with("stu1_"));
        assert!(record.image_name.ends_with(".jpg"));
        assert_eq!(record.sha256.len(), 64);

        let (bytes, content_type) = store.read(&record.image_name).unwrap();
        assert_eq!(bytes, jpeg().bytes());
        assert_eq!(content_type, "image/jpeg");

        let log = std::fs::read_to_string(store.logs_dir().join(FsEvidenceStore::LOG_FILE)).unwrap();
        assert_eq!(log.lines().count(), 1);
        assert!(log.contains("| stu1 | score=40 | reason=Suspicious behavior detected"));

        assert_eq!(ledger.evidence().len(), 1);
        assert_eq!(store.list().unwrap(), vec![record.image_name.clone()]);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_list_empty_when_missing() {
        let store = FsEvidenceStore::new(temp_root("missing"), Arc::new(MemoryLedger::new()));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_read_rejects_traversal_and_missing() {
        let store = FsEvidenceStore::new(temp_root("read"), Arc::new(MemoryLedger::new()));
        assert!(matches!(store.read("../x.jpg"), Err(ProctorError::InvalidFilename(_))));
        assert!(matches!(store.read("nope.jpg"), Err(ProctorError::NotFound(_))));
    }
}
