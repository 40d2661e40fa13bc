//! Parameters structure for LocoCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::controller::ParamsError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Locomotion control.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Params {

    // ---- GEOMETRY ----

    /// The radius of the drive wheels.
    ///
    /// Units: meters.
    pub wheel_radius_m: f64,

    /// Distance between the contact points of the two drive wheels.
    ///
    /// Units: meters.
    pub track_width_m: f64,

    // ---- CAPABILITIES ----

    /// Maximum absolute wheel rate, also used as the feed-forward scale.
    ///
    /// Units: radians/second
    pub max_wheel_rate_rads: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            wheel_radius_m: 0.0575,
            track_width_m: 0.257,
            max_wheel_rate_rads: 28.0
        }
    }
}

impl Params {
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        ParamsError::check_positive("loco_ctrl.wheel_radius_m", self.wheel_radius_m)?;
        ParamsError::check_positive("loco_ctrl.track_width_m", self.track_width_m)?;
        ParamsError::check_positive("loco_ctrl.max_wheel_rate_rads", self.max_wheel_rate_rads)?;

        Ok(())
    }
}
