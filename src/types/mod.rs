//! Core types for Proctor

mod status;
mod signals;
mod frame;
mod output;
mod reason;
mod records;
mod violation;

pub use status::{Status, RiskLevel};
pub use signals::{
    HeadDirection, EyeDirection, Point, FaceSignal, EyeSignal, HandSignal, PhoneSignal, Observation,
};
pub use frame::{Frame, ImageFormat};
pub use output::{ScoreUpdate, UpdateSource, SubjectSummary, DetailedStatus};
pub use reason::ReasonCode;
pub use records::{StudentRecord, EventRecord, EvidenceRecord};
pub use violation::ViolationKind;
