//! Parameters structure for the sensor input gate

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::controller::ParamsError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the sensor input gate.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Params {
    /// Lowest distance which will be passed on, lower readings are clamped.
    ///
    /// Units: meters
    pub distance_min_m: f64,

    /// Highest distance which will be passed on, higher readings are clamped.
    ///
    /// Units: meters
    pub distance_max_m: f64,

    /// Age after which the last range reading is considered stale.
    ///
    /// Units: milliseconds
    pub range_timeout_ms: u32,

    /// Age after which the last bearing reading is considered stale.
    ///
    /// Units: milliseconds
    pub bearing_timeout_ms: u32
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            distance_min_m: 0.1,
            distance_max_m: 2.0,
            range_timeout_ms: 200,
            bearing_timeout_ms: 300
        }
    }
}

impl Params {
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        ParamsError::check_positive("input_gate.distance_min_m", self.distance_min_m)?;

        if self.distance_max_m <= self.distance_min_m {
            return Err(ParamsError::BadOrdering(format!(
                "input_gate.distance_max_m ({}) must exceed distance_min_m ({})",
                self.distance_max_m, self.distance_min_m
            )))
        }

        ParamsError::check_nonzero("input_gate.range_timeout_ms", self.range_timeout_ms)?;
        ParamsError::check_nonzero("input_gate.bearing_timeout_ms", self.bearing_timeout_ms)?;

        Ok(())
    }
}
