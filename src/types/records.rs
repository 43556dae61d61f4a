//! Append-only records written to the ledger

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::types::Status;

/// A student seen for the first time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub student_id: String,
    pub first_seen: DateTime<Utc>,
}

/// A scored event: status change or instant violation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub student_id: String,
    pub timestamp: DateTime<Utc>,
    pub score: u32,
    pub status: Status,
    pub reason: String,
}

/// A captured evidence image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub student_id: String,
    pub image_name: String,
    pub timestamp: DateTime<Utc>,
    pub score: u32,
    pub reason: String,
    /// Hex SHA-256 of the stored image bytes
    pub sha256: String,
}
