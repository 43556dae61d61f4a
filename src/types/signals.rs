//! Behavioral signals produced per frame

use serde::{Deserialize, Serialize};

/// Head orientation category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadDirection {
    Left,
    Right,
    Down,
    Center,
    NoFace,
}

impl HeadDirection {
    /// Left, right or down
    pub fn is_turned(&self) -> bool {
        matches!(self, HeadDirection::Left | HeadDirection::Right | HeadDirection::Down)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HeadDirection::Left => "left",
            HeadDirection::Right => "right",
            HeadDirection::Down => "down",
            HeadDirection::Center => "center",
            HeadDirection::NoFace => "no_face",
        }
    }
}

/// Gaze category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EyeDirection {
    Left,
    Right,
    Center,
    NoFace,
}

impl EyeDirection {
    /// Left or right
    pub fn is_diverted(&self) -> bool {
        matches!(self, EyeDirection::Left | EyeDirection::Right)
    }
}

/// Pixel position of a detection center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Face presence and number of valid faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceSignal {
    pub present: bool,
    pub count: u32,
}

impl FaceSignal {
    pub fn absent() -> Self {
        Self { present: false, count: 0 }
    }

    pub fn single() -> Self {
        Self { present: true, count: 1 }
    }

    pub fn many(count: u32) -> Self {
        Self { present: count > 0, count }
    }
}

/// Gaze direction plus closed-eye flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EyeSignal {
    pub direction: EyeDirection,
    pub closed: bool,
}

impl EyeSignal {
    pub fn open(direction: EyeDirection) -> Self {
        Self { direction, closed: false }
    }

    pub fn closed() -> Self {
        Self { direction: EyeDirection::Center, closed: true }
    }
}

/// Hand presence and averaged center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandSignal {
    pub present: bool,
    pub position: Option<Point>,
}

impl HandSignal {
    pub fn none() -> Self {
        Self { present: false, position: None }
    }

    pub fn at(x: i32, y: i32) -> Self {
        Self { present: true, position: Some(Point { x, y }) }
    }
}

/// Phone presence and box center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneSignal {
    pub present: bool,
    pub position: Option<Point>,
}

impl PhoneSignal {
    pub fn none() -> Self {
        Self { present: false, position: None }
    }

    pub fn at(x: i32, y: i32) -> Self {
        Self { present: true, position: Some(Point { x, y }) }
    }
}

/// One frame's worth of signals.
///
/// `None` means the provider gave no answer for that category this cycle
/// (timed out or failed); the scorer skips the category instead of guessing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(default)]
    pub face: Option<FaceSignal>,
    #[serde(default)]
    pub head: Option<HeadDirection>,
    #[serde(default)]
    pub eyes: Option<EyeSignal>,
    #[serde(default)]
    pub hand: Option<HandSignal>,
    #[serde(default)]
    pub phone: Option<PhoneSignal>,
}

impl Observation {
    /// Single face, looking at the screen, nothing in hand
    pub fn attentive() -> Self {
        Self {
            face: Some(FaceSignal::single()),
            head: Some(HeadDirection::Center),
            eyes: Some(EyeSignal::open(EyeDirection::Center)),
            hand: Some(HandSignal::none()),
            phone: Some(PhoneSignal::none()),
        }
    }

    /// Nobody in front of the camera
    pub fn empty_seat() -> Self {
        Self {
            face: Some(FaceSignal::absent()),
            head: Some(HeadDirection::NoFace),
            eyes: Some(EyeSignal::open(EyeDirection::NoFace)),
            hand: Some(HandSignal::none()),
            phone: Some(PhoneSignal::none()),
        }
    }

    pub fn with_face(mut self, face: FaceSignal) -> Self {
        self.face = Some(face);
        self
    }

    pub fn with_head(mut self, head: HeadDirection) -> Self {
        self.head = Some(head);
        self
    }

    pub fn with_eyes(mut self, eyes: EyeSignal) -> Self {
        self.eyes = Some(eyes);
        self
    }

    pub fn with_hand(mut self, hand: HandSignal) -> Self {
        self.hand = Some(hand);
        self
    }

    pub fn with_phone(mut self, phone: PhoneSignal) -> Self {
        self.phone = Some(phone);
        self
    }
}
