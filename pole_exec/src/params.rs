//! # Pole Executable Parameters
//!
//! Parameters of the simulation executable. The controller itself is
//! configured separately through `ControllerParams`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::hal::sim::PlantParams;

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoleExecParams {
    /// Period between range sensor readings.
    ///
    /// Units: milliseconds
    pub range_period_ms: u32,

    /// Period between bearing sensor readings.
    ///
    /// Units: milliseconds
    pub bearing_period_ms: u32,

    /// Name of the tick archive file within the session's archive directory.
    pub tick_archive_name: String,

    /// The simulated plant.
    pub plant: PlantParams
}

impl Default for PoleExecParams {
    fn default() -> Self {
        Self {
            range_period_ms: 100,
            bearing_period_ms: 50,
            tick_archive_name: String::from("ticks.csv"),
            plant: PlantParams::default()
        }
    }
}
