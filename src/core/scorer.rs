//! Suspicion Scorer: per-student penalty state machine
//!
//! Rules:
//! - No frame penalties during the 3s learning phase
//! - Each category needs its condition to hold for a sustain window before it fires
//! - One cooldown (0.5s) gates ALL categories together
//! - Clean categories decay the score by 1 after 10s without activity
//! - 3+ penalties inside the 30s pattern window double frame penalties
//!
//! Every operation takes the current `Instant` so the machine is deterministic.
//! The cross-category coupling is easy to trip over: a head penalty landing
//! 0.2s after a face penalty is dropped, and only the first clean category per
//! cycle (face → head → eye → phone) gets to decay.

use std::time::{Duration, Instant};
use tracing::{debug, info};
use crate::{
    LEARNING_DURATION_SECS, PENALTY_COOLDOWN_SECS, DECAY_INTERVAL_SECS,
    PATTERN_WINDOW_SECS, PATTERN_THRESHOLD, PATTERN_MULTIPLIER,
    NO_FACE_SUSTAIN_SECS, MULTIPLE_FACE_SUSTAIN_SECS, HEAD_SUSTAIN_SECS,
    EYE_SUSTAIN_SECS, PHONE_COMBO_SUSTAIN_SECS,
    PENALTY_NO_FACE, PENALTY_MULTIPLE_FACES, PENALTY_HEAD_DOWN, PENALTY_HEAD_SIDE,
    PENALTY_EYES_CLOSED, PENALTY_EYES_DIVERTED, PENALTY_PHONE_COMBO, PENALTY_PHONE_ALONE,
};
use crate::types::{
    DetailedStatus, EyeDirection, HeadDirection, Observation, ReasonCode, RiskLevel, Status,
    ViolationKind,
};

/// Suspicion scoring state for one student
#[derive(Debug, Clone)]
pub struct SuspicionScorer {
    score: u32,
    learning_phase: bool,
    learn_start: Instant,
    /// Last penalty or decay
    last_activity_time: Instant,
    /// None until the first penalty lands
    last_penalty_time: Option<Instant>,
    cooldown: Duration,
    // Sustain timers: "condition has held since"
    no_face_start: Option<Instant>,
    multiple_face_start: Option<Instant>,
    head_start: Option<Instant>,
    eye_start: Option<Instant>,
    phone_combo_start: Option<Instant>,
    suspicious_patterns: u32,
    pattern_reset_time: Instant,
    last_reason: Option<ReasonCode>,
    penalties_applied: u64,
}

impl SuspicionScorer {
    /// Create a scorer in the learning phase
    pub fn new(now: Instant) -> Self {
        Self {
            score: 0,
            learning_phase: true,
            learn_start: now,
            last_activity_time: now,
            last_penalty_time: None,
            cooldown: Duration::from_secs_f64(PENALTY_COOLDOWN_SECS),
            no_face_start: None,
            multiple_face_start: None,
            head_start: None,
            eye_start: None,
            phone_combo_start: None,
            suspicious_patterns: 0,
            pattern_reset_time: now,
            last_reason: None,
            penalties_applied: 0,
        }
    }

    /// Reset to a freshly created scorer
    pub fn reset(&mut self, now: Instant) {
        *self = Self::new(now);
    }

    // =========================================================================
    // LEARNING
    // =========================================================================

    /// Leave the learning phase once the baseline window has elapsed
    pub fn learn_baseline(&mut self, now: Instant) {
        if self.learning_phase && since(now, self.learn_start) >= secs(LEARNING_DURATION_SECS) {
            self.learning_phase = false;
            debug!("baseline learning finished");
        }
    }

    /// Run one observation cycle in the fixed order face → head → eye → phone.
    ///
    /// A category with no signal this cycle is skipped. The phone combo needs
    /// both the phone and head signals.
    pub fn observe(&mut self, observation: &Observation, now: Instant) {
        self.learn_baseline(now);

        if let Some(face) = observation.face {
            self.update_face_status(face.present, face.count, now);
        }
        if let Some(head) = observation.head {
            self.update_head_pose(head, now);
        }
        if let Some(eyes) = observation.eyes {
            self.update_eye_behavior(eyes.direction, eyes.closed, now);
        }
        if let (Some(phone), Some(head)) = (observation.phone, observation.head) {
            let hand_present = observation.hand.map(|h| h.present).unwrap_or(false);
            self.update_hand_phone_head_combo(hand_present, phone.present, head, now);
        }
    }

    // =========================================================================
    // FACE
    // =========================================================================

    pub fn update_face_status(&mut self, face_present: bool, face_count: u32, now: Instant) {
        if self.learning_phase {
            return;
        }

        let multiplier = self.check_pattern_multiplier(now);

        if !face_present {
            self.multiple_face_start = None;
            if sustained(&mut self.no_face_start, now, secs(NO_FACE_SUSTAIN_SECS)) {
                self.penalize(scaled(PENALTY_NO_FACE, multiplier), ReasonCode::P001_NO_FACE, now);
            }
        } else if face_count > 1 {
            self.no_face_start = None;
            if sustained(&mut self.multiple_face_start, now, secs(MULTIPLE_FACE_SUSTAIN_SECS)) {
                self.penalize(
                    scaled(PENALTY_MULTIPLE_FACES, multiplier),
                    ReasonCode::P001_MULTIPLE_FACES,
                    now,
                );
            }
        } else {
            self.no_face_start = None;
            self.multiple_face_start = None;
            self.decay_score(now);
        }
    }

    // =========================================================================
    // HEAD
    // =========================================================================

    pub fn update_head_pose(&mut self, direction: HeadDirection, now: Instant) {
        if self.learning_phase {
            return;
        }

        let multiplier = self.check_pattern_multiplier(now);

        if direction.is_turned() {
            if sustained(&mut self.head_start, now, secs(HEAD_SUSTAIN_SECS)) {
                let (base, reason) = if direction == HeadDirection::Down {
                    (PENALTY_HEAD_DOWN, ReasonCode::P002_HEAD_DOWN)
                } else {
                    (PENALTY_HEAD_SIDE, ReasonCode::P002_HEAD_TURNED)
                };
                self.penalize(scaled(base, multiplier), reason, now);
            }
        } else {
            self.head_start = None;
            self.decay_score(now);
        }
    }

    // =========================================================================
    // EYES
    // =========================================================================

    pub fn update_eye_behavior(&mut self, direction: EyeDirection, closed: bool, now: Instant) {
        if self.learning_phase {
            return;
        }

        let multiplier = self.check_pattern_multiplier(now);

        if direction.is_diverted() || closed {
            if sustained(&mut self.eye_start, now, secs(EYE_SUSTAIN_SECS)) {
                let (base, reason) = if closed {
                    (PENALTY_EYES_CLOSED, ReasonCode::P003_EYES_CLOSED)
                } else {
                    (PENALTY_EYES_DIVERTED, ReasonCode::P003_EYES_DIVERTED)
                };
                self.penalize(scaled(base, multiplier), reason, now);
            }
        } else {
            self.eye_start = None;
            self.decay_score(now);
        }
    }

    // =========================================================================
    // PHONE + HEAD
    // =========================================================================

    /// Phone with a turned head needs 0.5s; a phone alone is penalized on every
    /// call the cooldown lets through.
    pub fn update_hand_phone_head_combo(
        &mut self,
        hand_present: bool,
        phone_present: bool,
        head_direction: HeadDirection,
        now: Instant,
    ) {
        if self.learning_phase {
            return;
        }

        let multiplier = self.check_pattern_multiplier(now);

        if phone_present && head_direction.is_turned() {
            if sustained(&mut self.phone_combo_start, now, secs(PHONE_COMBO_SUSTAIN_SECS)) {
                self.penalize(
                    scaled(PENALTY_PHONE_COMBO, multiplier),
                    ReasonCode::P004_PHONE_WITH_HEAD_TURNED,
                    now,
                );
            }
        } else if phone_present {
            self.phone_combo_start = None;
            debug!(hand_present, "phone visible with head facing screen");
            self.penalize(
                scaled(PENALTY_PHONE_ALONE, multiplier),
                ReasonCode::P004_PHONE_VISIBLE,
                now,
            );
        } else {
            self.phone_combo_start = None;
            self.decay_score(now);
        }
    }

    // =========================================================================
    // INSTANT VIOLATIONS
    // =========================================================================

    /// Apply a fixed-table penalty. Only the cooldown applies: no learning
    /// gate, no sustain, no multiplier. Returns whether it landed.
    pub fn add_instant_violation(&mut self, kind: ViolationKind, now: Instant) -> bool {
        self.penalize(kind.penalty(), ReasonCode::P005_INSTANT(kind), now)
    }

    // =========================================================================
    // INTERNAL HELPERS
    // =========================================================================

    fn can_penalize(&self, now: Instant) -> bool {
        match self.last_penalty_time {
            Some(last) => since(now, last) >= self.cooldown,
            None => true,
        }
    }

    /// Add points unless the shared cooldown is still running. Blocked
    /// penalties are dropped.
    fn penalize(&mut self, points: u32, reason: ReasonCode, now: Instant) -> bool {
        if !self.can_penalize(now) {
            debug!(reason = reason.code(), points, "penalty dropped by cooldown");
            return false;
        }

        self.score = self.score.saturating_add(points);
        self.last_penalty_time = Some(now);
        self.last_activity_time = now;
        self.suspicious_patterns += 1;
        self.penalties_applied += 1;
        self.last_reason = Some(reason);

        info!(
            reason = reason.code(),
            points,
            score = self.score,
            patterns = self.suspicious_patterns,
            "penalty applied"
        );
        true
    }

    fn decay_score(&mut self, now: Instant) {
        if since(now, self.last_activity_time) >= secs(DECAY_INTERVAL_SECS) {
            self.score = self.score.saturating_sub(1);
            self.last_activity_time = now;
        }
    }

    fn check_pattern_multiplier(&mut self, now: Instant) -> f64 {
        if since(now, self.pattern_reset_time) >= secs(PATTERN_WINDOW_SECS) {
            self.suspicious_patterns = 0;
            self.pattern_reset_time = now;
        }

        if self.suspicious_patterns >= PATTERN_THRESHOLD {
            PATTERN_MULTIPLIER
        } else {
            1.0
        }
    }

    // =========================================================================
    // STATUS
    // =========================================================================

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn status(&self) -> Status {
        Status::from_score(self.score)
    }

    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.score)
    }

    pub fn learning_phase(&self) -> bool {
        self.learning_phase
    }

    pub fn suspicious_patterns(&self) -> u32 {
        self.suspicious_patterns
    }

    pub fn last_reason(&self) -> Option<ReasonCode> {
        self.last_reason
    }

    pub fn penalties_applied(&self) -> u64 {
        self.penalties_applied
    }

    pub fn detailed_status(&self) -> DetailedStatus {
        DetailedStatus {
            score: self.score,
            status: self.status(),
            learning_phase: self.learning_phase,
            suspicious_patterns: self.suspicious_patterns,
            risk_level: self.risk_level(),
            penalties_applied: self.penalties_applied,
            last_reason: self.last_reason.map(|r| r.to_string()),
        }
    }
}

/// Start the timer, or report (and clear) once it has run for `required`
fn sustained(timer: &mut Option<Instant>, now: Instant, required: Duration) -> bool {
    match *timer {
        None => {
            *timer = Some(now);
            false
        }
        Some(start) if since(now, start) >= required => {
            *timer = None;
            true
        }
        Some(_) => false,
    }
}

/// Base penalty times multiplier, truncated toward zero
fn scaled(base: u32, multiplier: f64) -> u32 {
    (base as f64 * multiplier) as u32
}

fn secs(value: f64) -> Duration {
    Duration::from_secs_f64(value)
}

fn since(now: Instant, earlier: Instant) -> Duration {
    now.saturating_duration_since(earlier)
}

// =============================================================================
// TESTS
// =============================================================================
