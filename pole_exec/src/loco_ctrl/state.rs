//! Implementations for the LocoCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::{Params, NUM_WHEELS};
use crate::nav_ctrl::VelocityReference;
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Locomotion control module state
#[derive(Debug, Clone, Default)]
pub struct LocoCtrl {
    pub(crate) params: Params
}

/// Output demand from LocoCtrl that the wheel controllers must track.
#[derive(Clone, Copy, Default, Serialize, Debug, PartialEq)]
pub struct OutputData {
    /// Drive rate demand of each wheel, positive drives the base forwards.
    ///
    /// Units: radians/second
    pub wheel_rate_rads: [f64; NUM_WHEELS]
}

/// Status report for LocoCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    pub wheel_rate_limited: [bool; NUM_WHEELS]
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LocoCtrl {
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    pub fn max_wheel_rate_rads(&self) -> f64 {
        self.params.max_wheel_rate_rads
    }
}

impl State for LocoCtrl {
    type InputData = VelocityReference;
    type OutputData = OutputData;
    type StatusReport = StatusReport;

    /// Perform cyclic processing of Locomotion Control.
    fn proc(&mut self, input_data: &VelocityReference) -> (OutputData, StatusReport) {
        let (wheel_rate_rads, wheel_rate_limited) = self.calc_skid_steer(input_data);

        trace!("LocoCtrl output: {:?}", wheel_rate_rads);

        (
            OutputData { wheel_rate_rads },
            StatusReport { wheel_rate_limited }
        )
    }

    /// LocoCtrl holds no memory between cycles.
    fn reset(&mut self) {}
}
