//! Time source for the scorers

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Supplies the instant a scorer update happens at
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-driven clock for tests and replays
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    current: Mutex<Instant>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        let origin = Instant::now();
        Self { origin, current: Mutex::new(origin) }
    }

    /// Move forward by `secs`
    pub fn advance(&self, secs: f64) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += Duration::from_secs_f64(secs);
    }

    /// Jump to `secs` after the origin
    pub fn set(&self, secs: f64) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = self.origin + Duration::from_secs_f64(secs);
    }

    /// Seconds since the origin
    pub fn elapsed_secs(&self) -> f64 {
        self.now().duration_since(self.origin).as_secs_f64()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}
