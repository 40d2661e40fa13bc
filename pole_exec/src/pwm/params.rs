//! PWM output shaper parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::controller::ParamsError;
use crate::loco_ctrl::NUM_WHEELS;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the PWM output stage.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Params {
    /// Timer ticks in one PWM period.
    pub period_ticks: u32,

    /// Largest duty that may be commanded, as a fraction of the period.
    pub max_duty_ratio: f64,

    /// Smallest non-zero duty, as a fraction of the period.
    pub min_duty_ratio: f64,

    /// Duty which must be exceeded to start driving a stopped motor.
    pub deadband_on_ratio: f64,

    /// Duty below which a driven motor stops.
    pub deadband_off_ratio: f64,

    /// Length of the soft-start window after boot.
    ///
    /// Units: milliseconds
    pub soft_start_ms: u32,

    /// Duty cap during the soft-start window, as a fraction of the period.
    pub soft_start_cap_ratio: f64,

    /// Motors whose positive command must be written as a negative duty
    /// because of how they are mounted, in wheel index order.
    pub invert_output: [bool; NUM_WHEELS]
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            period_ticks: 1000,
            max_duty_ratio: 0.35,
            min_duty_ratio: 0.07,
            deadband_on_ratio: 0.05,
            deadband_off_ratio: 0.03,
            soft_start_ms: 500,
            soft_start_cap_ratio: 0.60,
            invert_output: [false, true]
        }
    }
}

impl Params {
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        ParamsError::check_nonzero("pwm.period_ticks", self.period_ticks)?;
        ParamsError::check_ratio("pwm.max_duty_ratio", self.max_duty_ratio)?;
        ParamsError::check_ratio("pwm.min_duty_ratio", self.min_duty_ratio)?;
        ParamsError::check_ratio("pwm.deadband_on_ratio", self.deadband_on_ratio)?;
        ParamsError::check_ratio("pwm.deadband_off_ratio", self.deadband_off_ratio)?;
        ParamsError::check_ratio("pwm.soft_start_cap_ratio", self.soft_start_cap_ratio)?;

        if self.deadband_off_ratio > self.deadband_on_ratio {
            return Err(ParamsError::BadOrdering(format!(
                "pwm.deadband_off_ratio ({}) must not exceed deadband_on_ratio ({})",
                self.deadband_off_ratio, self.deadband_on_ratio
            )))
        }

        if self.min_duty_ratio > self.max_duty_ratio {
            return Err(ParamsError::BadOrdering(format!(
                "pwm.min_duty_ratio ({}) must not exceed max_duty_ratio ({})",
                self.min_duty_ratio, self.max_duty_ratio
            )))
        }

        Ok(())
    }
}
