//! Bias learner parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::controller::ParamsError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the adaptive bias learner.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Params {
    /// Learning only happens while the turn rate demand is below this.
    ///
    /// Units: radians/second
    pub straight_turn_rate_rads: f64,

    /// Weight of the previous average in the residual moving average. The
    /// new residual has weight `1 - ema_retain`.
    pub ema_retain: f64,

    /// Number of learning cycles between bias updates.
    pub update_period_cycles: u32,

    /// The bias is only updated if the averaged residual exceeds this.
    ///
    /// Units: radians/second
    pub activation_threshold_rads: f64,

    /// Scale from normalised residual to bias adjustment.
    pub adjustment_scale: f64,

    /// Fraction of the left wheel's adjustment applied, in the opposite
    /// sense, to the right wheel.
    pub opposite_ratio: f64,

    /// Limit on the magnitude of each wheel's bias.
    ///
    /// Units: timer ticks
    pub max_bias_ticks: f64,

    /// Whether learning is active at boot.
    pub enabled_at_boot: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            straight_turn_rate_rads: 0.03,
            ema_retain: 0.999,
            update_period_cycles: 5,
            activation_threshold_rads: 0.5,
            adjustment_scale: 1.5,
            opposite_ratio: 0.2,
            max_bias_ticks: 15.0,
            enabled_at_boot: true
        }
    }
}

impl Params {
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        ParamsError::check_positive("bias.straight_turn_rate_rads", self.straight_turn_rate_rads)?;
        ParamsError::check_ratio("bias.ema_retain", self.ema_retain)?;
        ParamsError::check_nonzero("bias.update_period_cycles", self.update_period_cycles)?;
        ParamsError::check_non_negative("bias.activation_threshold_rads", self.activation_threshold_rads)?;
        ParamsError::check_non_negative("bias.adjustment_scale", self.adjustment_scale)?;
        ParamsError::check_ratio("bias.opposite_ratio", self.opposite_ratio)?;
        ParamsError::check_non_negative("bias.max_bias_ticks", self.max_bias_ticks)?;

        Ok(())
    }
}
