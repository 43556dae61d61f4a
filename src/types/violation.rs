//! Instant violations and their fixed penalty table

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Browser-side violations reported outside the frame stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    TabSwitch,
    FullscreenExit,
    CopyPaste,
    RightClick,
    MultipleMonitors,
    /// Tab switch count reached the limit
    RepeatedTabSwitches,
    /// Accumulated time away from the exam tab reached the limit
    ProlongedAbsence,
}

impl ViolationKind {
    pub const ALL: [ViolationKind; 7] = [
        ViolationKind::TabSwitch,
        ViolationKind::FullscreenExit,
        ViolationKind::CopyPaste,
        ViolationKind::RightClick,
        ViolationKind::MultipleMonitors,
        ViolationKind::RepeatedTabSwitches,
        ViolationKind::ProlongedAbsence,
    ];

    /// Points added when the violation lands (no multiplier)
    pub fn penalty(&self) -> u32 {
        match self {
            ViolationKind::TabSwitch => 15,
            ViolationKind::FullscreenExit => 25,
            ViolationKind::CopyPaste => 30,
            ViolationKind::RightClick => 10,
            ViolationKind::MultipleMonitors => 35,
            ViolationKind::RepeatedTabSwitches => 20,
            ViolationKind::ProlongedAbsence => 20,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::TabSwitch => "tab_switch",
            ViolationKind::FullscreenExit => "fullscreen_exit",
            ViolationKind::CopyPaste => "copy_paste",
            ViolationKind::RightClick => "right_click",
            ViolationKind::MultipleMonitors => "multiple_monitors",
            ViolationKind::RepeatedTabSwitches => "repeated_tab_switches",
            ViolationKind::ProlongedAbsence => "prolonged_absence",
        }
    }
}

impl FromStr for ViolationKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ViolationKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or(())
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
