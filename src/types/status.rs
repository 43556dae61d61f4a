//! Student status and diagnostic risk level

use serde::{Deserialize, Serialize};
use crate::{
    CHEATING_THRESHOLD, SUSPICIOUS_THRESHOLD,
    RISK_HIGH_THRESHOLD, RISK_MEDIUM_THRESHOLD,
};

/// Discrete status derived from the suspicion score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Score below 15
    Normal,
    /// Score 15..35
    Suspicious,
    /// Score 35 and up, evidence is captured on entry
    Cheating,
}

impl Status {
    /// Classify a score
    pub fn from_score(score: u32) -> Self {
        if score >= CHEATING_THRESHOLD {
            Status::Cheating
        } else if score >= SUSPICIOUS_THRESHOLD {
            Status::Suspicious
        } else {
            Status::Normal
        }
    }

    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            Status::Normal => "\x1b[32m",     // Green
            Status::Suspicious => "\x1b[33m", // Yellow
            Status::Cheating => "\x1b[31m",   // Red
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Normal => "NORMAL",
            Status::Suspicious => "SUSPICIOUS",
            Status::Cheating => "CHEATING",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Risk level reported in detailed status.
///
/// Uses its own thresholds (25 / 10), which do not line up with [`Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: u32) -> Self {
        if score >= RISK_HIGH_THRESHOLD {
            RiskLevel::High
        } else if score >= RISK_MEDIUM_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}
