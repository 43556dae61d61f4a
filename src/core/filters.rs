//! Per-student temporal filters applied to raw detector output
//!
//! Each student gets their own instances: smoothing state shared across
//! students would make one student's frames change another's signals.

use crate::{HEAD_SWITCH_FRAMES, REQUIRED_PHONE_FRAMES};
use crate::types::{HeadDirection, Observation, PhoneSignal, Point};

/// Head-direction hysteresis.
///
/// `no_face` passes straight through. Switching between visible directions
/// needs the new direction on consecutive frames, so with the default
/// `HEAD_SWITCH_FRAMES` a new direction reaches the scorer one frame late.
#[derive(Debug, Clone)]
pub struct HeadSmoother {
    current: Option<HeadDirection>,
    candidate: Option<(HeadDirection, u32)>,
    required: u32,
}

impl Default for HeadSmoother {
    fn default() -> Self {
        Self::new(HEAD_SWITCH_FRAMES)
    }
}

impl HeadSmoother {
    pub fn new(required: u32) -> Self {
        Self { current: None, candidate: None, required: required.max(1) }
    }

    pub fn apply(&mut self, raw: HeadDirection) -> HeadDirection {
        match self.current {
            _ if raw == HeadDirection::NoFace => self.adopt(raw),
            None | Some(HeadDirection::NoFace) => self.adopt(raw),
            Some(current) if current == raw => {
                self.candidate = None;
                current
            }
            Some(current) => {
                let seen = match self.candidate {
                    Some((direction, count)) if direction == raw => count + 1,
                    _ => 1,
                };
                if seen >= self.required {
                    self.adopt(raw)
                } else {
                    self.candidate = Some((raw, seen));
                    current
                }
            }
        }
    }

    fn adopt(&mut self, direction: HeadDirection) -> HeadDirection {
        self.current = Some(direction);
        self.candidate = None;
        direction
    }
}

/// Phone sustained-frame counter
#[derive(Debug, Clone)]
pub struct PhoneDebouncer {
    consecutive: u32,
    last_position: Option<Point>,
    required: u32,
}

impl Default for PhoneDebouncer {
    fn default() -> Self {
        Self::new(REQUIRED_PHONE_FRAMES)
    }
}

impl PhoneDebouncer {
    pub fn new(required: u32) -> Self {
        Self { consecutive: 0, last_position: None, required: required.max(1) }
    }

    pub fn apply(&mut self, raw: PhoneSignal) -> PhoneSignal {
        if raw.present {
            self.consecutive += 1;
            self.last_position = raw.position;
        } else {
            self.consecutive = 0;
            self.last_position = None;
        }

        if self.consecutive >= self.required {
            PhoneSignal { present: true, position: self.last_position }
        } else {
            PhoneSignal::none()
        }
    }
}

/// All filters for one student
#[derive(Debug, Clone, Default)]
pub struct SignalFilters {
    pub head: HeadSmoother,
    pub phone: PhoneDebouncer,
}

impl SignalFilters {
    /// Filter a raw observation. Missing signals leave filter state untouched.
    pub fn apply(&mut self, raw: Observation) -> Observation {
        Observation {
            head: raw.head.map(|h| self.head.apply(h)),
            phone: raw.phone.map(|p| self.phone.apply(p)),
            ..raw
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_needs_three_frames() {
        let mut debouncer = PhoneDebouncer::default();
        assert!(!debouncer.apply(PhoneSignal::at(10, 10)).present);
        assert!(!debouncer.apply(PhoneSignal::at(11, 10)).present);
        let third = debouncer.apply(PhoneSignal::at(12, 10));
        assert!(third.present);
        assert_eq!(third.position, Some(Point { x: 12, y: 10 }));
    }

    #[test]
    fn test_phone_gap_resets_count() {
        let mut debouncer = PhoneDebouncer::default();
        debouncer.apply(PhoneSignal::at(1, 1));
        debouncer.apply(PhoneSignal::at(1, 1));
        debouncer.apply(PhoneSignal::none());
        assert!(!debouncer.apply(PhoneSignal::at(1, 1)).present);
    }

    #[test]
    fn test_head_first_direction_adopted() {
        let mut smoother = HeadSmoother::default();
        assert_eq!(smoother.apply(HeadDirection::Left), HeadDirection::Left);
    }

    #[test]
    fn test_head_switch_needs_consecutive_frames() {
        let mut smoother = HeadSmoother::default();
        smoother.apply(HeadDirection::Center);
        assert_eq!(smoother.apply(HeadDirection::Left), HeadDirection::Center);
        assert_eq!(smoother.apply(HeadDirection::Left), HeadDirection::Left);
    }

    #[test]
    fn test_head_single_frame_jitter_ignored() {
        let mut smoother = HeadSmoother::default();
        smoother.apply(HeadDirection::Center);
        assert_eq!(smoother.apply(HeadDirection::Right), HeadDirection::Center);
        assert_eq!(smoother.apply(HeadDirection::Center), HeadDirection::Center);
        assert_eq!(smoother.apply(HeadDirection::Right), HeadDirection::Center);
    }

    #[test]
    fn test_head_no_face_is_immediate() {
        let mut smoother = HeadSmoother::default();
        smoother.apply(HeadDirection::Center);
        assert_eq!(smoother.apply(HeadDirection::NoFace), HeadDirection::NoFace);
        // Coming back from no_face is immediate too
        assert_eq!(smoother.apply(HeadDirection::Down), HeadDirection::Down);
    }

    #[test]
    fn test_filters_are_independent_per_instance() {
        let mut a = SignalFilters::default();
        let mut b = SignalFilters::default();
        let phone = Observation::attentive().with_phone(PhoneSignal::at(3, 3));

        a.apply(phone);
        a.apply(phone);
        // b has seen nothing, a's count must not leak into it
        let from_b = b.apply(phone);
        assert!(!from_b.phone.unwrap().present);
        let from_a = a.apply(phone);
        assert!(from_a.phone.unwrap().present);
    }

    #[test]
    fn test_missing_signal_keeps_state() {
        let mut filters = SignalFilters::default();
        let phone = Observation::attentive().with_phone(PhoneSignal::at(3, 3));
        filters.apply(phone);
        filters.apply(phone);
        let gap = Observation { phone: None, ..phone };
        assert!(filters.apply(gap).phone.is_none());
        assert!(filters.apply(phone).phone.unwrap().present);
    }
}
