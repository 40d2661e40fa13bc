//! Controller parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Internal
use crate::{bias, input_gate, loco_ctrl, nav_ctrl, pwm, safety, wheel_ctrl};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the whole controller, one section per module.
///
/// Any field missing from a parameter file takes its compiled-in default.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ControllerParams {
    pub input_gate: input_gate::Params,
    pub nav_ctrl: nav_ctrl::Params,
    pub safety: safety::Params,
    pub loco_ctrl: loco_ctrl::Params,
    pub wheel_ctrl: wheel_ctrl::Params,
    pub bias: bias::Params,
    pub pwm: pwm::Params,
    pub sched: SchedParams
}

/// Scheduling parameters of the tick.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedParams {
    /// Period of the inner loop.
    ///
    /// Units: milliseconds
    pub inner_period_ms: u32,

    /// Number of inner ticks per outer tick.
    pub outer_divider: u32,

    /// Time after boot during which the motors are held stopped.
    ///
    /// Units: milliseconds
    pub boot_settle_ms: u32,

    /// Turn rate limit applied during the soft-start window.
    ///
    /// Units: radians/second
    pub soft_start_max_turn_rate_rads: f64
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised when validating controller parameters.
#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("Parameter {0} must be greater than zero, found {1}")]
    NotPositive(&'static str, f64),

    #[error("Parameter {0} must not be negative, found {1}")]
    Negative(&'static str, f64),

    #[error("Parameter {0} must be a ratio between 0 and 1, found {1}")]
    NotARatio(&'static str, f64),

    #[error("Parameter {0} must not be zero")]
    Zero(&'static str),

    #[error("Parameter {0} is out of range, found {1}")]
    OutOfRange(&'static str, f64),

    #[error("Parameters are in the wrong order: {0}")]
    BadOrdering(String)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ControllerParams {
    /// Check every section of the parameters.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        self.input_gate.are_valid()?;
        self.nav_ctrl.are_valid()?;
        self.safety.are_valid()?;
        self.loco_ctrl.are_valid()?;
        self.wheel_ctrl.are_valid()?;
        self.bias.are_valid()?;
        self.pwm.are_valid()?;
        self.sched.are_valid()?;

        Ok(())
    }
}

impl Default for SchedParams {
    fn default() -> Self {
        Self {
            inner_period_ms: 10,
            outer_divider: 5,
            boot_settle_ms: 50,
            soft_start_max_turn_rate_rads: 1.0
        }
    }
}

impl SchedParams {
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        ParamsError::check_nonzero("sched.inner_period_ms", self.inner_period_ms)?;
        ParamsError::check_nonzero("sched.outer_divider", self.outer_divider)?;
        ParamsError::check_positive(
            "sched.soft_start_max_turn_rate_rads",
            self.soft_start_max_turn_rate_rads
        )?;

        Ok(())
    }

    /// Period of the inner loop in seconds.
    pub fn inner_dt_s(&self) -> f64 {
        self.inner_period_ms as f64 / 1000.0
    }

    /// Period of the outer loop in seconds.
    pub fn outer_dt_s(&self) -> f64 {
        self.inner_dt_s() * self.outer_divider as f64
    }
}

impl ParamsError {
    pub fn check_positive(name: &'static str, value: f64) -> Result<(), ParamsError> {
        if value > 0.0 {
            Ok(())
        }
        else {
            Err(ParamsError::NotPositive(name, value))
        }
    }

    pub fn check_non_negative(name: &'static str, value: f64) -> Result<(), ParamsError> {
        if value >= 0.0 {
            Ok(())
        }
        else {
            Err(ParamsError::Negative(name, value))
        }
    }

    pub fn check_ratio(name: &'static str, value: f64) -> Result<(), ParamsError> {
        if (0.0..=1.0).contains(&value) {
            Ok(())
        }
        else {
            Err(ParamsError::NotARatio(name, value))
        }
    }

    pub fn check_nonzero(name: &'static str, value: u32) -> Result<(), ParamsError> {
        if value != 0 {
            Ok(())
        }
        else {
            Err(ParamsError::Zero(name))
        }
    }
}
