//! Controller state and per-tick report

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use crate::{
    hal::{MotorOutput, PinState},
    input_gate::Staleness,
    loco_ctrl::{Side, NUM_WHEELS},
    nav_ctrl::{ControlMode, VelocityReference},
    safety::StopCause
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// State shared between the inner and outer loops of the controller.
#[derive(Debug, Clone)]
pub struct ControllerState {
    /// Number of ticks executed.
    pub num_ticks: u64,

    /// Time the controller was created.
    ///
    /// Units: milliseconds
    pub boot_ms: u32,

    pub mode: ControlMode,

    /// Velocity reference after the safety supervisor, held between outer
    /// ticks.
    pub refs: VelocityReference,

    /// Wheel rate demands from the mixer, held between outer ticks.
    ///
    /// Units: radians/second
    pub wheel_rate_ref_rads: [f64; NUM_WHEELS],

    /// Filtered measured wheel rates.
    ///
    /// Units: radians/second
    pub wheel_rate_meas_rads: [f64; NUM_WHEELS],

    pub estop: bool,
    pub stop_cause: Option<StopCause>,

    /// Staleness of the inputs at the last tick.
    pub staleness: Staleness,

    /// Learned bias of each wheel.
    ///
    /// Units: timer ticks
    pub bias_ticks: [f64; NUM_WHEELS],

    /// Saturated wheel controller command in the wheel's frame.
    ///
    /// Units: timer ticks
    pub cmd_ticks: [f64; NUM_WHEELS],

    /// Outputs written to the motor driver at the last tick.
    pub outputs: [MotorOutput; NUM_WHEELS]
}

/// Flat record of one tick, suitable for writing as a CSV row.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub time_ms: u32,
    pub num_ticks: u64,

    /// True if the outer loop ran on this tick.
    pub outer: bool,

    pub distance_m: f64,
    pub bearing_deg: f64,
    pub stale_range: bool,
    pub stale_bearing: bool,

    pub mode: ControlMode,
    pub estop: bool,
    pub stop_cause: Option<StopCause>,

    pub v_ref_ms: f64,
    pub w_ref_rads: f64,

    pub rate_ref_l_rads: f64,
    pub rate_ref_r_rads: f64,
    pub rate_meas_l_rads: f64,
    pub rate_meas_r_rads: f64,

    pub bias_l_ticks: f64,
    pub bias_r_ticks: f64,

    pub cmd_l_ticks: f64,
    pub cmd_r_ticks: f64,

    pub duty_l_ticks: u32,
    pub duty_r_ticks: u32,
    pub dir_l: PinState,
    pub dir_r: PinState,

    pub integral_frozen: bool,
    pub soft_start: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ControllerState {
    pub fn new(boot_ms: u32) -> Self {
        Self {
            num_ticks: 0,
            boot_ms,
            mode: ControlMode::default(),
            refs: VelocityReference::zero(),
            wheel_rate_ref_rads: [0.0; NUM_WHEELS],
            wheel_rate_meas_rads: [0.0; NUM_WHEELS],
            estop: false,
            stop_cause: None,
            staleness: Staleness::default(),
            bias_ticks: [0.0; NUM_WHEELS],
            cmd_ticks: [0.0; NUM_WHEELS],
            outputs: [MotorOutput::stopped(); NUM_WHEELS]
        }
    }
}

impl TickReport {
    /// Flatten the state after a tick into a report.
    pub(crate) fn from_state(
        state: &ControllerState,
        time_ms: u32,
        outer: bool,
        distance_m: f64,
        bearing_deg: f64,
        integral_frozen: bool,
        soft_start: bool
    ) -> Self {
        let l = Side::Left.index();
        let r = Side::Right.index();

        Self {
            time_ms,
            num_ticks: state.num_ticks,
            outer,
            distance_m,
            bearing_deg,
            stale_range: state.staleness.range,
            stale_bearing: state.staleness.bearing,
            mode: state.mode,
            estop: state.estop,
            stop_cause: state.stop_cause,
            v_ref_ms: state.refs.v_ms,
            w_ref_rads: state.refs.w_rads,
            rate_ref_l_rads: state.wheel_rate_ref_rads[l],
            rate_ref_r_rads: state.wheel_rate_ref_rads[r],
            rate_meas_l_rads: state.wheel_rate_meas_rads[l],
            rate_meas_r_rads: state.wheel_rate_meas_rads[r],
            bias_l_ticks: state.bias_ticks[l],
            bias_r_ticks: state.bias_ticks[r],
            cmd_l_ticks: state.cmd_ticks[l],
            cmd_r_ticks: state.cmd_ticks[r],
            duty_l_ticks: state.outputs[l].duty_ticks,
            duty_r_ticks: state.outputs[r].duty_ticks,
            dir_l: state.outputs[l].dir,
            dir_r: state.outputs[r].dir,
            integral_frozen,
            soft_start
        }
    }
}
