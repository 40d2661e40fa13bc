//! Navigation control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use crate::controller::ParamsError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for navigation control
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Params {

    // ---- MODE BANDS ----

    /// Below this distance the robot backs away from the target.
    ///
    /// Units: meters
    pub backward_below_m: f64,

    /// Below this distance (and above `backward_below_m`) the robot holds
    /// still.
    ///
    /// Units: meters
    pub stop_below_m: f64,

    /// Below this distance (and above `stop_below_m`) the robot tracks the
    /// tracking setpoint, above it the robot follows forwards.
    ///
    /// Units: meters
    pub tracking_below_m: f64,

    // ---- DISTANCE CONTROL ----

    /// Fixed speed demand in the backward band.
    ///
    /// Units: meters/second
    pub backward_speed_ms: f64,

    /// Distance held in the tracking band.
    ///
    /// Units: meters
    pub tracking_setpoint_m: f64,

    /// Symmetric limit on the tracking band speed demand.
    ///
    /// Units: meters/second
    pub tracking_max_speed_ms: f64,

    /// Distance held in the forward band.
    ///
    /// Units: meters
    pub forward_setpoint_m: f64,

    /// Distance error proportional gain
    pub k_p_dis: f64,

    /// Distance error derivative gain
    pub k_d_dis: f64,

    // ---- SPEED SHAPING ----

    /// Positive speed demands below this value are raised to it.
    ///
    /// Units: meters/second
    pub min_forward_speed_ms: f64,

    /// Speed limit with the target dead ahead.
    ///
    /// Units: meters/second
    pub max_speed_ms: f64,

    /// Lowest value the bearing-dependent speed limit falls to.
    ///
    /// Units: meters/second
    pub base_speed_ms: f64,

    /// Maximum linear acceleration.
    ///
    /// Units: meters/second^2
    pub max_accel_mss: f64,

    // ---- TURNING ----

    /// Bearings at or below this magnitude are treated as dead ahead.
    ///
    /// Units: radians
    pub bearing_deadzone_rad: f64,

    /// Tightest allowed turn radius.
    ///
    /// Units: meters
    pub min_turn_radius_m: f64,

    /// Absolute limit on the turn rate demand.
    ///
    /// Units: radians/second
    pub max_turn_rate_rads: f64,

    /// Maximum angular acceleration.
    ///
    /// Units: radians/second^2
    pub max_turn_accel_radss: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            backward_below_m: 0.20,
            stop_below_m: 0.60,
            tracking_below_m: 0.80,
            backward_speed_ms: -0.3,
            tracking_setpoint_m: 0.70,
            tracking_max_speed_ms: 0.2,
            forward_setpoint_m: 0.80,
            k_p_dis: 1.0,
            k_d_dis: 0.4,
            min_forward_speed_ms: 0.12,
            max_speed_ms: 0.35,
            base_speed_ms: 0.1,
            max_accel_mss: 0.3,
            bearing_deadzone_rad: 0.01,
            min_turn_radius_m: 0.15,
            max_turn_rate_rads: 1.0,
            max_turn_accel_radss: 2.0
        }
    }
}

impl Params {
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if !(self.backward_below_m < self.stop_below_m
            && self.stop_below_m < self.tracking_below_m)
        {
            return Err(ParamsError::BadOrdering(format!(
                "nav_ctrl mode bands must be increasing, found {} < {} < {}",
                self.backward_below_m, self.stop_below_m, self.tracking_below_m
            )))
        }

        if self.backward_speed_ms > 0.0 {
            return Err(ParamsError::OutOfRange(
                "nav_ctrl.backward_speed_ms", self.backward_speed_ms))
        }

        ParamsError::check_positive("nav_ctrl.tracking_max_speed_ms", self.tracking_max_speed_ms)?;
        ParamsError::check_non_negative("nav_ctrl.k_p_dis", self.k_p_dis)?;
        ParamsError::check_non_negative("nav_ctrl.k_d_dis", self.k_d_dis)?;
        ParamsError::check_non_negative("nav_ctrl.min_forward_speed_ms", self.min_forward_speed_ms)?;
        ParamsError::check_positive("nav_ctrl.max_speed_ms", self.max_speed_ms)?;
        ParamsError::check_positive("nav_ctrl.base_speed_ms", self.base_speed_ms)?;
        ParamsError::check_positive("nav_ctrl.max_accel_mss", self.max_accel_mss)?;
        ParamsError::check_non_negative("nav_ctrl.bearing_deadzone_rad", self.bearing_deadzone_rad)?;
        ParamsError::check_positive("nav_ctrl.min_turn_radius_m", self.min_turn_radius_m)?;
        ParamsError::check_positive("nav_ctrl.max_turn_rate_rads", self.max_turn_rate_rads)?;
        ParamsError::check_positive("nav_ctrl.max_turn_accel_radss", self.max_turn_accel_radss)?;

        Ok(())
    }
}
