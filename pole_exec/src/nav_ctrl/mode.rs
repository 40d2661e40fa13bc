//! Distance band control modes

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::Params;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The control mode of the planner.
///
/// All modes except `EmergencyStop` are chosen from the distance to the
/// target. `EmergencyStop` is only ever set by the safety supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlMode {
    EmergencyStop,
    Backward,
    Stop,
    Tracking,
    Forward
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ControlMode {
    fn default() -> Self {
        ControlMode::Stop
    }
}

impl ControlMode {
    /// Select the mode for the given distance to the target.
    pub fn from_distance(distance_m: f64, params: &Params) -> Self {
        if distance_m < params.backward_below_m {
            ControlMode::Backward
        }
        else if distance_m < params.stop_below_m {
            ControlMode::Stop
        }
        else if distance_m < params.tracking_below_m {
            ControlMode::Tracking
        }
        else {
            ControlMode::Forward
        }
    }

    /// Mode transition function.
    ///
    /// Returns the new mode and whether the planner's memory must be reset,
    /// which is the case whenever the mode changes.
    pub fn transition(self, distance_m: f64, params: &Params) -> (ControlMode, bool) {
        let new = Self::from_distance(distance_m, params);
        (new, new != self)
    }

    /// Short name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlMode::EmergencyStop => "EMG",
            ControlMode::Backward => "BWD",
            ControlMode::Stop => "STP",
            ControlMode::Tracking => "TRK",
            ControlMode::Forward => "FWD"
        }
    }
}
