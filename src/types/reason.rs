//! Reason codes for applied penalties

use serde::{Deserialize, Serialize};
use crate::types::ViolationKind;

/// Why a penalty was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // P001: Face
    // =========================================================================
    /// No face for the sustain window
    P001_NO_FACE,
    /// More than one face for the sustain window
    P001_MULTIPLE_FACES,

    // =========================================================================
    // P002: Head
    // =========================================================================
    P002_HEAD_DOWN,
    P002_HEAD_TURNED,

    // =========================================================================
    // P003: Eyes
    // =========================================================================
    P003_EYES_CLOSED,
    P003_EYES_DIVERTED,

    // =========================================================================
    // P004: Phone
    // =========================================================================
    /// Phone visible while the head is turned away
    P004_PHONE_WITH_HEAD_TURNED,
    /// Phone visible, head facing the screen
    P004_PHONE_VISIBLE,

    // =========================================================================
    // P005: Instant violations
    // =========================================================================
    P005_INSTANT(ViolationKind),
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::P001_NO_FACE => "P001_NO_FACE",
            Self::P001_MULTIPLE_FACES => "P001_MULTIPLE_FACES",
            Self::P002_HEAD_DOWN => "P002_HEAD_DOWN",
            Self::P002_HEAD_TURNED => "P002_HEAD_TURNED",
            Self::P003_EYES_CLOSED => "P003_EYES_CLOSED",
            Self::P003_EYES_DIVERTED => "P003_EYES_DIVERTED",
            Self::P004_PHONE_WITH_HEAD_TURNED => "P004_PHONE_WITH_HEAD_TURNED",
            Self::P004_PHONE_VISIBLE => "P004_PHONE_VISIBLE",
            Self::P005_INSTANT(_) => "P005_INSTANT",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> String {
        match self {
            Self::P001_NO_FACE => "Face not visible".to_string(),
            Self::P001_MULTIPLE_FACES => "More than one face in frame".to_string(),
            Self::P002_HEAD_DOWN => "Head turned down".to_string(),
            Self::P002_HEAD_TURNED => "Head turned sideways".to_string(),
            Self::P003_EYES_CLOSED => "Eyes closed".to_string(),
            Self::P003_EYES_DIVERTED => "Gaze away from screen".to_string(),
            Self::P004_PHONE_WITH_HEAD_TURNED => "Phone in view with head turned".to_string(),
            Self::P004_PHONE_VISIBLE => "Phone in view".to_string(),
            Self::P005_INSTANT(kind) => format!("Instant violation: {}", kind),
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
