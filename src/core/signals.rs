//! Signal provider seam
//!
//! Detectors (face mesh, head pose, eye aspect ratio, hand landmarks, phone
//! detection) live outside this crate. They are blocking and slow, so they run
//! on the blocking pool, concurrently, each under a timeout.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

use crate::types::{
    EyeDirection, EyeSignal, FaceSignal, Frame, HandSignal, HeadDirection, Observation, PhoneSignal,
};

/// The five per-frame detectors
pub trait SignalProvider: Send + Sync + std::fmt::Debug + 'static {
    fn detect_face(&self, frame: &Frame) -> FaceSignal;
    fn head_direction(&self, frame: &Frame) -> HeadDirection;
    fn eye_behavior(&self, frame: &Frame) -> EyeSignal;
    fn detect_hand(&self, frame: &Frame) -> HandSignal;
    fn detect_phone(&self, frame: &Frame) -> PhoneSignal;
}

/// Run all detectors on one frame.
///
/// A detector that times out or panics yields `None` for its category.
pub async fn gather_signals(
    provider: &Arc<dyn SignalProvider>,
    frame: &Frame,
    timeout: Duration,
) -> Observation {
    let (face, head, eyes, hand, phone) = tokio::join!(
        bounded("face", timeout, detector(provider, frame, |p, f| p.detect_face(f))),
        bounded("head", timeout, detector(provider, frame, |p, f| p.head_direction(f))),
        bounded("eyes", timeout, detector(provider, frame, |p, f| p.eye_behavior(f))),
        bounded("hand", timeout, detector(provider, frame, |p, f| p.detect_hand(f))),
        bounded("phone", timeout, detector(provider, frame, |p, f| p.detect_phone(f))),
    );

    Observation { face, head, eyes, hand, phone }
}

fn detector<T: Send + 'static>(
    provider: &Arc<dyn SignalProvider>,
    frame: &Frame,
    detect: fn(&dyn SignalProvider, &Frame) -> T,
) -> impl FnOnce() -> T + Send + 'static {
    let provider = Arc::clone(provider);
    let frame = frame.clone();
    move || detect(provider.as_ref(), &frame)
}

async fn bounded<T, F>(category: &'static str, limit: Duration, call: F) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    match tokio::time::timeout(limit, tokio::task::spawn_blocking(call)).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            warn!(category, error = %e, "signal provider failed");
            None
        }
        Err(_) => {
            warn!(category, timeout_ms = limit.as_millis() as u64, "signal provider timed out");
            None
        }
    }
}

/// Provider that always reports an attentive student.
///
/// Used by the server binary when no detector backend is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeutralSignals;

impl SignalProvider for NeutralSignals {
    fn detect_face(&self, _frame: &Frame) -> FaceSignal {
        FaceSignal::single()
    }

    fn head_direction(&self, _frame: &Frame) -> HeadDirection {
        HeadDirection::Center
    }

    fn eye_behavior(&self, _frame: &Frame) -> EyeSignal {
        EyeSignal::open(EyeDirection::Center)
    }

    fn detect_hand(&self, _frame: &Frame) -> HandSignal {
        HandSignal::none()
    }

    fn detect_phone(&self, _frame: &Frame) -> PhoneSignal {
        PhoneSignal::none()
    }
}

/// Provider that returns whatever observation it was last given.
///
/// Categories left as `None` in the script fall back to the neutral answer.
#[derive(Debug, Default)]
pub struct ScriptedSignals {
    current: Mutex<Observation>,
}

impl ScriptedSignals {
    pub fn new(initial: Observation) -> Self {
        Self { current: Mutex::new(initial) }
    }

    pub fn set(&self, observation: Observation) {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = observation;
    }

    fn current(&self) -> Observation {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SignalProvider for ScriptedSignals {
    fn detect_face(&self, frame: &Frame) -> FaceSignal {
        self.current().face.unwrap_or_else(|| NeutralSignals.detect_face(frame))
    }

    fn head_direction(&self, frame: &Frame) -> HeadDirection {
        self.current().head.unwrap_or_else(|| NeutralSignals.head_direction(frame))
    }

    fn eye_behavior(&self, frame: &Frame) -> EyeSignal {
        self.current().eyes.unwrap_or_else(|| NeutralSignals.eye_behavior(frame))
    }

    fn detect_hand(&self, frame: &Frame) -> HandSignal {
        self.current().hand.unwrap_or_else(|| NeutralSignals.detect_hand(frame))
    }

    fn detect_phone(&self, frame: &Frame) -> PhoneSignal {
        self.current().phone.unwrap_or_else(|| NeutralSignals.detect_phone(frame))
    }
}
