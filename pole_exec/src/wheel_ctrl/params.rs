//! Wheel control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::controller::ParamsError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the per-wheel rate controllers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Params {

    // ---- PID ----

    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,

    /// Time constant of the derivative filter.
    ///
    /// Units: seconds
    pub deriv_filter_tau_s: f64,

    /// Symmetric limit on the PID correction.
    ///
    /// Units: timer ticks
    pub pid_output_limit_ticks: f64,

    /// Back-calculation anti-windup gain
    pub k_b: f64,

    /// The integral is held at zero for this long after boot.
    ///
    /// Units: milliseconds
    pub integral_freeze_ms: u32,

    // ---- FEED-FORWARD ----

    /// Gain on the rate-proportional feed-forward.
    pub k_ff: f64,

    /// Constant feed-forward applied in the direction of the demand, as a
    /// fraction of the PWM period. Covers the motor breakaway duty, with
    /// `k_ff` scaled so the total reaches the maximum duty at the maximum
    /// wheel rate.
    pub k_ff_offset: f64,

    // ---- ENCODERS ----

    /// Encoder counts per wheel revolution, after quadrature decoding.
    pub counts_per_rev: f64,

    /// Time constant of the measured rate filter.
    ///
    /// Units: seconds
    pub encoder_filter_tau_s: f64,

    /// Period used when the measured period is not positive.
    ///
    /// Units: seconds
    pub nominal_dt_s: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            k_p: 0.5,
            k_i: 0.3,
            k_d: 0.05,
            deriv_filter_tau_s: 0.02,
            pid_output_limit_ticks: 100.0,
            k_b: 0.1,
            integral_freeze_ms: 300,
            k_ff: 0.8,
            k_ff_offset: 0.07,
            counts_per_rev: 2800.0,
            encoder_filter_tau_s: 0.03,
            nominal_dt_s: 0.01
        }
    }
}

impl Params {
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        ParamsError::check_non_negative("wheel_ctrl.k_p", self.k_p)?;
        ParamsError::check_non_negative("wheel_ctrl.k_i", self.k_i)?;
        ParamsError::check_non_negative("wheel_ctrl.k_d", self.k_d)?;
        ParamsError::check_non_negative("wheel_ctrl.deriv_filter_tau_s", self.deriv_filter_tau_s)?;
        ParamsError::check_positive("wheel_ctrl.pid_output_limit_ticks", self.pid_output_limit_ticks)?;
        ParamsError::check_non_negative("wheel_ctrl.k_b", self.k_b)?;
        ParamsError::check_non_negative("wheel_ctrl.k_ff", self.k_ff)?;
        ParamsError::check_ratio("wheel_ctrl.k_ff_offset", self.k_ff_offset)?;
        ParamsError::check_positive("wheel_ctrl.counts_per_rev", self.counts_per_rev)?;
        ParamsError::check_non_negative("wheel_ctrl.encoder_filter_tau_s", self.encoder_filter_tau_s)?;
        ParamsError::check_positive("wheel_ctrl.nominal_dt_s", self.nominal_dt_s)?;

        Ok(())
    }
}
