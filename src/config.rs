//! Service configuration

use std::path::PathBuf;
use std::time::Duration;

/// Default HTTP bind address
pub const DEFAULT_ADDR: &str = "127.0.0.1:5000";

/// Default root for evidence images, logs and ledger files
pub const DEFAULT_EVIDENCE_DIR: &str = "./evidence";

/// Default per-detector timeout (milliseconds)
pub const DEFAULT_SIGNAL_TIMEOUT_MS: u64 = 2000;

/// Default live-update channel capacity
pub const DEFAULT_UPDATE_CAPACITY: usize = 100;

/// Runtime settings for the proctoring service
#[derive(Debug, Clone)]
pub struct ProctorConfig {
    pub addr: String,
    pub evidence_dir: PathBuf,
    pub signal_timeout: Duration,
    pub update_capacity: usize,
}

impl Default for ProctorConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            evidence_dir: PathBuf::from(DEFAULT_EVIDENCE_DIR),
            signal_timeout: Duration::from_millis(DEFAULT_SIGNAL_TIMEOUT_MS),
            update_capacity: DEFAULT_UPDATE_CAPACITY,
        }
    }
}

impl ProctorConfig {
    /// Ledger files live next to the evidence
    pub fn ledger_dir(&self) -> PathBuf {
        self.evidence_dir.join("ledger")
    }
}
