//! Proctor: suspicion scoring for monitored exam sessions
//!
//! Frames → signal provider → per-student SuspicionScorer → status + evidence trigger

pub mod config;
pub mod core;
pub mod error;
pub mod types;

pub use error::{ProctorError, ProctorResult};

// =============================================================================
// STATUS THRESHOLDS [C]
// =============================================================================

/// Score at or above which a student is CHEATING
pub const CHEATING_THRESHOLD: u32 = 35;

/// Score at or above which a student is SUSPICIOUS
pub const SUSPICIOUS_THRESHOLD: u32 = 15;

/// Diagnostic risk scale, independent of status
pub const RISK_HIGH_THRESHOLD: u32 = 25;
pub const RISK_MEDIUM_THRESHOLD: u32 = 10;

// =============================================================================
// TIMING [C] - seconds
// =============================================================================

/// Baseline learning window after creation, no penalties while it runs
pub const LEARNING_DURATION_SECS: f64 = 3.0;

/// Minimum gap between any two applied penalties (all categories share it)
pub const PENALTY_COOLDOWN_SECS: f64 = 0.5;

/// Idle time before one point of decay
pub const DECAY_INTERVAL_SECS: f64 = 10.0;

/// Rolling window for the pattern counter
pub const PATTERN_WINDOW_SECS: f64 = 30.0;

/// Penalties inside one window before the multiplier kicks in
pub const PATTERN_THRESHOLD: u32 = 3;

/// Multiplier applied once the pattern threshold is reached
pub const PATTERN_MULTIPLIER: f64 = 2.0;

/// Sustain durations per category
pub const NO_FACE_SUSTAIN_SECS: f64 = 1.5;
pub const MULTIPLE_FACE_SUSTAIN_SECS: f64 = 1.0;
pub const HEAD_SUSTAIN_SECS: f64 = 1.5;
pub const EYE_SUSTAIN_SECS: f64 = 2.0;
pub const PHONE_COMBO_SUSTAIN_SECS: f64 = 0.5;

// =============================================================================
// BASE PENALTIES [C] - before pattern multiplier
// =============================================================================

pub const PENALTY_NO_FACE: u32 = 25;
pub const PENALTY_MULTIPLE_FACES: u32 = 30;
pub const PENALTY_HEAD_DOWN: u32 = 15;
pub const PENALTY_HEAD_SIDE: u32 = 12;
pub const PENALTY_EYES_CLOSED: u32 = 12;
pub const PENALTY_EYES_DIVERTED: u32 = 8;
pub const PENALTY_PHONE_COMBO: u32 = 50;
pub const PENALTY_PHONE_ALONE: u32 = 20;

// =============================================================================
// SIGNAL FILTERS [C]
// =============================================================================

/// Consecutive phone detections before a phone is reported
pub const REQUIRED_PHONE_FRAMES: u32 = 3;

/// Consecutive frames before the smoothed head direction switches
pub const HEAD_SWITCH_FRAMES: u32 = 2;

// =============================================================================
// TAB EVENTS [C]
// =============================================================================

/// Tab switch count that counts as repeated switching
pub const TAB_SWITCH_LIMIT: u32 = 3;

/// Seconds away from the exam tab that count as prolonged absence
pub const AWAY_TIME_LIMIT_SECS: f64 = 5.0;

/// Reason string attached to evidence captured on entering CHEATING
pub const EVIDENCE_REASON: &str = "Suspicious behavior detected";

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
