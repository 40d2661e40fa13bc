//! PWM output shaper state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::Params;
use crate::{
    hal::{MotorOutput, PinState},
    loco_ctrl::NUM_WHEELS
};
use util::{maths::clamp_abs, module::State};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// PWM shaper module state
#[derive(Debug, Clone)]
pub struct PwmShaper {
    params: Params,

    /// Deadband memory, true while a motor is being driven.
    driving: [bool; NUM_WHEELS]
}

/// Input data to the shaper.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// Drive command of each wheel in the wheel's own frame.
    ///
    /// Units: timer ticks
    pub cmd_ticks: [f64; NUM_WHEELS],

    /// True inside the soft-start window.
    pub soft_start: bool
}

/// Status report of the shaper.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    /// Signed command after shaping, in the motor's frame.
    ///
    /// Units: timer ticks
    pub shaped_ticks: [f64; NUM_WHEELS],

    pub min_duty_applied: [bool; NUM_WHEELS],
    pub deadband_zeroed: [bool; NUM_WHEELS],
    pub soft_start_capped: [bool; NUM_WHEELS]
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PwmShaper {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            driving: [false; NUM_WHEELS]
        }
    }

    /// Outputs which stop both motors. Clears the deadband memory so the
    /// motors must pass the on threshold to restart.
    pub fn stop(&mut self) -> [MotorOutput; NUM_WHEELS] {
        self.driving = [false; NUM_WHEELS];
        [MotorOutput::stopped(); NUM_WHEELS]
    }

    /// Apply the hysteretic deadband to one motor.
    fn deadband(&mut self, wheel: usize, cmd: f64) -> f64 {
        let period = self.params.period_ticks as f64;
        let on = self.params.deadband_on_ratio * period;
        let off = self.params.deadband_off_ratio * period;

        if self.driving[wheel] {
            if cmd.abs() < off {
                self.driving[wheel] = false;
                return 0.0
            }
        }
        else if cmd.abs() > on {
            self.driving[wheel] = true;
        }
        else {
            return 0.0
        }

        cmd
    }
}

impl State for PwmShaper {
    type InputData = InputData;
    type OutputData = [MotorOutput; NUM_WHEELS];
    type StatusReport = StatusReport;

    fn proc(&mut self, input_data: &InputData) -> ([MotorOutput; NUM_WHEELS], StatusReport) {
        let mut outputs = [MotorOutput::stopped(); NUM_WHEELS];
        let mut report = StatusReport::default();

        let period = self.params.period_ticks as f64;
        let min_ticks = self.params.min_duty_ratio * period;
        let max_ticks = self.params.max_duty_ratio * period;
        let soft_cap = (self.params.soft_start_cap_ratio * period) as u32;

        for i in 0..NUM_WHEELS {
            let mut cmd = if self.params.invert_output[i] {
                -input_data.cmd_ticks[i]
            }
            else {
                input_data.cmd_ticks[i]
            };

            if cmd != 0.0 && cmd.abs() < min_ticks {
                cmd = min_ticks.copysign(cmd);
                report.min_duty_applied[i] = true;
            }

            let after_deadband = self.deadband(i, cmd);
            report.deadband_zeroed[i] = after_deadband == 0.0 && cmd != 0.0;
            cmd = clamp_abs(after_deadband, max_ticks);

            let mut duty_ticks = cmd.abs() as u32;
            if input_data.soft_start && duty_ticks > soft_cap {
                duty_ticks = soft_cap;
                report.soft_start_capped[i] = true;
            }

            outputs[i] = MotorOutput {
                duty_ticks,
                dir: if cmd >= 0.0 { PinState::Set } else { PinState::Reset }
            };
            report.shaped_ticks[i] = cmd;
        }

        trace!("PwmShaper outputs: {:?}", outputs);

        (outputs, report)
    }

    fn reset(&mut self) {
        self.driving = [false; NUM_WHEELS];
    }
}
