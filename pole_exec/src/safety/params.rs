//! Safety supervisor parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::controller::ParamsError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the safety supervisor.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Params {
    /// At or below this distance the robot stops immediately.
    ///
    /// Units: meters
    pub hard_min_distance_m: f64,

    /// Above this bearing magnitude the robot stops immediately.
    ///
    /// Units: degrees
    pub hard_max_bearing_deg: f64,

    /// Bearing magnitude which may only be exceeded for `soft_bearing_hold_ms`.
    ///
    /// Units: degrees
    pub soft_max_bearing_deg: f64,

    /// How long the soft bearing limit may be exceeded for before stopping.
    ///
    /// Units: milliseconds
    pub soft_bearing_hold_ms: u32,

    /// Above this distance the speed demand is capped.
    ///
    /// Units: meters
    pub far_distance_m: f64,

    /// Speed cap applied beyond `far_distance_m`.
    ///
    /// Units: meters/second
    pub far_max_speed_ms: f64,

    /// Minimum time spent stopped before the stop may be released.
    ///
    /// Units: milliseconds
    pub release_dwell_ms: u32,

    /// Lower distance bound for release.
    ///
    /// Units: meters
    pub release_min_distance_m: f64,

    /// Upper distance bound for release.
    ///
    /// Units: meters
    pub release_max_distance_m: f64,

    /// Duration of the ramp applied to the references after a release.
    ///
    /// Units: milliseconds
    pub release_ramp_ms: u32
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            hard_min_distance_m: 0.10,
            hard_max_bearing_deg: 100.0,
            soft_max_bearing_deg: 25.0,
            soft_bearing_hold_ms: 2000,
            far_distance_m: 1.5,
            far_max_speed_ms: 0.25,
            release_dwell_ms: 1000,
            release_min_distance_m: 0.20,
            release_max_distance_m: 1.5,
            release_ramp_ms: 400
        }
    }
}

impl Params {
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        ParamsError::check_positive("safety.hard_min_distance_m", self.hard_min_distance_m)?;
        ParamsError::check_positive("safety.soft_max_bearing_deg", self.soft_max_bearing_deg)?;
        ParamsError::check_positive("safety.far_max_speed_ms", self.far_max_speed_ms)?;

        if self.soft_max_bearing_deg >= self.hard_max_bearing_deg {
            return Err(ParamsError::BadOrdering(format!(
                "safety.soft_max_bearing_deg ({}) must be below hard_max_bearing_deg ({})",
                self.soft_max_bearing_deg, self.hard_max_bearing_deg
            )))
        }

        if !(self.hard_min_distance_m < self.release_min_distance_m
            && self.release_min_distance_m < self.release_max_distance_m)
        {
            return Err(ParamsError::BadOrdering(format!(
                "safety release band [{}, {}] must lie above hard_min_distance_m ({})",
                self.release_min_distance_m,
                self.release_max_distance_m,
                self.hard_min_distance_m
            )))
        }

        Ok(())
    }
}
