//! # Controller
//!
//! The controller owns every module and the state shared between them, and
//! runs both loops from a single periodic [`Controller::tick`]:
//!
//! 1. Read the navigation snapshot and check it for staleness. Stale inputs
//!    zero the references and trip the emergency stop.
//! 2. Inner loop, every tick: encoder rates, bias learning, wheel PID and
//!    PWM shaping, then the motor driver write.
//! 3. Outer loop, every `outer_divider` ticks with fresh inputs: the planner,
//!    the safety supervisor, then the mixer. A stop entered here is written
//!    to the motor driver before the tick returns.
//!
//! The tick is infallible. Faults are handled by stopping the motors, never
//! by returning errors.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod rate_divider;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace};

// Internal
pub use params::*;
pub use rate_divider::*;
pub use state::*;

use crate::{
    bias::{self, BiasLearner},
    hal::Hardware,
    input_gate::{NavInput, Snapshot},
    loco_ctrl::{LocoCtrl, NUM_WHEELS},
    nav_ctrl::{self, ControlMode, NavCtrl, VelocityReference},
    pwm::{self, PwmShaper},
    safety::{self, SafetySupervisor, StopCause},
    wheel_ctrl::{self, DriveScale, EncoderSpeed, WheelCtrl}
};
use util::{
    maths::clamp_abs,
    module::State,
    time::ms_since
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The dual rate motion controller.
#[derive(Debug, Clone)]
pub struct Controller {
    params: ControllerParams,
    state: ControllerState,
    divider: RateDivider,

    nav_ctrl: NavCtrl,
    safety: SafetySupervisor,
    loco_ctrl: LocoCtrl,
    encoders: [EncoderSpeed; NUM_WHEELS],
    wheel_ctrl: WheelCtrl,
    bias: BiasLearner,
    pwm: PwmShaper
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Controller {
    /// Build a controller which booted at `boot_ms`.
    ///
    /// The parameters are validated first, an invalid set is rejected.
    pub fn new(params: ControllerParams, boot_ms: u32) -> Result<Self, ParamsError> {
        params.are_valid()?;

        let period_ticks = params.pwm.period_ticks as f64;
        let max_wheel_rate_rads = params.loco_ctrl.max_wheel_rate_rads;

        let encoder = EncoderSpeed::new(
            params.wheel_ctrl.counts_per_rev,
            params.wheel_ctrl.encoder_filter_tau_s,
            params.wheel_ctrl.nominal_dt_s
        );

        let scale = DriveScale {
            period_ticks,
            max_duty_ratio: params.pwm.max_duty_ratio,
            max_wheel_rate_rads
        };

        info!(
            "Controller initialised: inner period {} ms, outer divider {}",
            params.sched.inner_period_ms, params.sched.outer_divider
        );

        Ok(Self {
            state: ControllerState::new(boot_ms),
            divider: RateDivider::new(params.sched.outer_divider),
            nav_ctrl: NavCtrl::new(params.nav_ctrl.clone(), params.sched.outer_dt_s()),
            safety: SafetySupervisor::new(params.safety.clone()),
            loco_ctrl: LocoCtrl::new(params.loco_ctrl.clone()),
            encoders: [encoder.clone(), encoder],
            wheel_ctrl: WheelCtrl::new(params.wheel_ctrl.clone(), scale),
            bias: BiasLearner::new(params.bias.clone(), max_wheel_rate_rads, period_ticks),
            pwm: PwmShaper::new(params.pwm.clone()),
            params
        })
    }

    pub fn params(&self) -> &ControllerParams {
        &self.params
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Turn bias learning on, clearing any learned biases.
    pub fn enable_bias_learning(&mut self) {
        self.bias.enable();
    }

    /// Execute one inner tick at `now_ms`.
    pub fn tick<H: Hardware>(
        &mut self,
        now_ms: u32,
        shared: &Snapshot<NavInput>,
        hw: &mut H
    ) -> TickReport {
        self.state.num_ticks += 1;

        let since_boot_ms = ms_since(now_ms, self.state.boot_ms);
        let outer = self.divider.step();
        let soft_start = since_boot_ms < self.params.pwm.soft_start_ms;
        let settling = since_boot_ms < self.params.sched.boot_settle_ms;
        let integral_frozen = since_boot_ms < self.params.wheel_ctrl.integral_freeze_ms;

        // ---- INPUT ----

        let input = shared.read();
        self.state.staleness = input.staleness(now_ms, &self.params.input_gate);
        let stale = self.state.staleness.any();

        if stale {
            if self.safety.trip(StopCause::StaleInput, now_ms) {
                debug!("Stale inputs: {:?}", self.state.staleness);
            }
            self.state.refs = VelocityReference::zero();
            self.state.wheel_rate_ref_rads = [0.0; NUM_WHEELS];
            self.nav_ctrl.commit(VelocityReference::zero());
            self.sync_estop();
        }

        // ---- INNER LOOP ----

        let counts = hw.read_counts();
        let mut dt_s = self.params.wheel_ctrl.nominal_dt_s;
        for i in 0..NUM_WHEELS {
            let sample = self.encoders[i].update(counts[i], now_ms);
            self.state.wheel_rate_meas_rads[i] = sample.rate_rads;
            dt_s = sample.dt_s;
        }

        let outputs = if self.state.estop || settling {
            self.state.cmd_ticks = [0.0; NUM_WHEELS];
            self.pwm.stop()
        }
        else {
            let (bias_ticks, _) = self.bias.proc(&bias::InputData {
                w_ref_rads: self.state.refs.w_rads,
                rate_ref_rads: self.state.wheel_rate_ref_rads,
                rate_meas_rads: self.state.wheel_rate_meas_rads
            });
            self.state.bias_ticks = bias_ticks;

            let (wc_out, _) = self.wheel_ctrl.proc(&wheel_ctrl::InputData {
                rate_ref_rads: self.state.wheel_rate_ref_rads,
                rate_meas_rads: self.state.wheel_rate_meas_rads,
                bias_ticks,
                dt_s,
                integral_frozen
            });
            self.state.cmd_ticks = wc_out.cmd_ticks;

            let (outputs, _) = self.pwm.proc(&pwm::InputData {
                cmd_ticks: wc_out.cmd_ticks,
                soft_start
            });

            outputs
        };

        hw.write(&outputs);
        self.state.outputs = outputs;

        // ---- OUTER LOOP ----

        if outer && !stale {
            let (planned, _) = self.nav_ctrl.proc(&nav_ctrl::InputData {
                distance_m: input.distance_m,
                bearing_deg: input.bearing_deg
            });

            let (mut refs, _) = self.safety.proc(&safety::InputData {
                now_ms,
                distance_m: input.distance_m,
                bearing_deg: input.bearing_deg,
                refs: planned
            });

            if soft_start {
                refs.w_rads = clamp_abs(refs.w_rads, self.params.sched.soft_start_max_turn_rate_rads);
            }

            self.nav_ctrl.commit(refs);
            if self.sync_estop() {
                let outputs = self.pwm.stop();
                hw.write(&outputs);
                self.state.cmd_ticks = [0.0; NUM_WHEELS];
                self.state.outputs = outputs;
            }

            let (loco_out, _) = self.loco_ctrl.proc(&refs);

            self.state.refs = refs;
            self.state.wheel_rate_ref_rads = loco_out.wheel_rate_rads;

            trace!(
                "Outer tick: v = {:.3} m/s, w = {:.3} rad/s, wheels = {:?}",
                refs.v_ms, refs.w_rads, loco_out.wheel_rate_rads
            );
        }

        self.state.mode = self.nav_ctrl.mode();

        TickReport::from_state(
            &self.state,
            now_ms,
            outer,
            input.distance_m,
            input.bearing_deg,
            integral_frozen,
            soft_start
        )
    }

    /// Bring the controller state in line with the supervisor. On entering
    /// the emergency stop the wheel integrators and biases are cleared.
    ///
    /// Returns `true` if the emergency stop was entered.
    fn sync_estop(&mut self) -> bool {
        let estop = self.safety.is_estop();
        let entered = estop && !self.state.estop;

        if entered {
            self.wheel_ctrl.reset();
            self.bias.reset();
            self.state.bias_ticks = [0.0; NUM_WHEELS];
        }
        if estop {
            self.nav_ctrl.set_mode(ControlMode::EmergencyStop);
        }

        self.state.estop = estop;
        self.state.stop_cause = self.safety.cause();

        entered
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        hal::{sim::{PlantParams, SimPlant}, MotorOutput, PinState},
        input_gate::InputGate
    };

    /// Closed loop rig of a controller, its sensors and the simulated plant.
    struct Rig {
        ctrl: Controller,
        plant: SimPlant,
        gate: InputGate,
        shared: Snapshot<NavInput>,
        now_ms: u32,
        range_dropout: bool,
        bearing_dropout: bool,
        last: Option<TickReport>
    }

    impl Rig {
        fn new(distance_m: f64, bearing_deg: f64) -> Self {
            Self::with_params(ControllerParams::default(), distance_m, bearing_deg)
        }

        fn with_params(params: ControllerParams, distance_m: f64, bearing_deg: f64) -> Self {
            let plant = SimPlant::new(PlantParams {
                initial_target_distance_m: distance_m,
                initial_target_bearing_deg: bearing_deg,
                ..PlantParams::default()
            });

            Self {
                gate: InputGate::new(params.input_gate.clone()),
                ctrl: Controller::new(params, 0).unwrap(),
                plant,
                shared: Snapshot::default(),
                now_ms: 0,
                range_dropout: false,
                bearing_dropout: false,
                last: None
            }
        }

        /// Run for `duration_ms`, calling `check` with every report.
        fn run_with<F: FnMut(&TickReport, &SimPlant)>(&mut self, duration_ms: u32, mut check: F) {
            let end_ms = self.now_ms + duration_ms;

            while self.now_ms < end_ms {
                if !self.range_dropout && self.now_ms % 100 == 0 {
                    self.gate.submit_distance(
                        &self.shared, self.plant.measure_distance_m(), self.now_ms
                    ).unwrap();
                }
                if !self.bearing_dropout && self.now_ms % 50 == 0 {
                    self.gate.submit_bearing(
                        &self.shared, self.plant.measure_bearing_deg(), self.now_ms
                    ).unwrap();
                }

                let report = self.ctrl.tick(self.now_ms, &self.shared, &mut self.plant);
                check(&report, &self.plant);
                self.last = Some(report);

                self.plant.step(0.01);
                self.now_ms += 10;
            }
        }

        fn run(&mut self, duration_ms: u32) -> TickReport {
            self.run_with(duration_ms, |_, _| ());
            self.last.clone().unwrap()
        }
    }

    fn assert_stopped(report: &TickReport) {
        assert_eq!(report.v_ref_ms, 0.0);
        assert_eq!(report.w_ref_rads, 0.0);
        assert_eq!(report.duty_l_ticks, 0);
        assert_eq!(report.duty_r_ticks, 0);
        assert_eq!(report.dir_l, PinState::Reset);
        assert_eq!(report.dir_r, PinState::Reset);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let mut params = ControllerParams::default();
        params.loco_ctrl.track_width_m = 0.0;

        assert!(Controller::new(params, 0).is_err());
    }

    #[test]
    fn test_outer_loop_rate() {
        let mut rig = Rig::new(0.8, 0.0);
        let mut outer = Vec::new();
        rig.run_with(100, |rpt, _| outer.push(rpt.outer));

        assert_eq!(
            outer,
            vec![true, false, false, false, false, true, false, false, false, false]
        );
    }

    #[test]
    fn test_boot_settle_holds_motors() {
        let mut rig = Rig::new(1.2, 0.0);

        rig.run_with(50, |rpt, _| {
            assert_eq!(rpt.duty_l_ticks, 0);
            assert_eq!(rpt.duty_r_ticks, 0);
            assert!(rpt.soft_start);
            assert!(rpt.integral_frozen);
        });

        // Target is far away so the base must start driving
        let report = rig.run(300);
        assert!(!report.estop);
        assert!(report.v_ref_ms > 0.0);
        assert!(report.duty_l_ticks > 0);
        assert!(report.duty_r_ticks > 0);
        assert_eq!(report.dir_l, PinState::Set);
        assert_eq!(report.dir_r, PinState::Reset);
    }

    #[test]
    fn test_too_close_stops() {
        let mut rig = Rig::new(0.05, 0.0);

        let report = rig.run(100);

        assert!(report.estop);
        assert_eq!(report.stop_cause, Some(StopCause::TooClose));
        assert_eq!(report.mode, ControlMode::EmergencyStop);
        assert_eq!(report.distance_m, 0.1);
        assert_stopped(&report);
    }

    #[test]
    fn test_at_setpoint_holds_still() {
        let mut rig = Rig::new(0.8, 0.0);

        let report = rig.run(2000);

        assert!(!report.estop);
        assert_eq!(report.mode, ControlMode::Forward);
        assert_eq!(report.v_ref_ms, 0.0);
        assert_eq!(report.w_ref_rads, 0.0);
        assert_eq!(report.duty_l_ticks, 0);
        assert_eq!(report.duty_r_ticks, 0);
    }

    #[test]
    fn test_sustained_large_bearing_stops() {
        let mut rig = Rig::new(0.8, 30.0);

        let report = rig.run(1900);
        assert!(!report.estop);
        assert_eq!(report.w_ref_rads, 0.0);

        let report = rig.run(300);
        assert!(report.estop);
        assert_eq!(report.stop_cause, Some(StopCause::SustainedLargeAngle));
        assert_stopped(&report);
    }

    #[test]
    fn test_hard_bearing_stops_immediately() {
        let mut rig = Rig::new(1.0, 120.0);

        let report = rig.run(10);

        assert!(report.estop);
        assert_eq!(report.stop_cause, Some(StopCause::HardAngle));
        assert_stopped(&report);
    }

    #[test]
    fn test_stale_input_stops_and_recovers() {
        let mut rig = Rig::new(1.0, 0.0);

        let mut driven = false;
        rig.run_with(1000, |rpt, _| {
            assert!(!rpt.estop);
            driven |= rpt.duty_l_ticks > 0 && rpt.duty_r_ticks > 0;
        });
        assert!(driven);

        rig.range_dropout = true;
        rig.bearing_dropout = true;

        let report = rig.run(300);
        assert!(report.stale_range);
        assert!(report.stale_bearing);
        assert!(report.estop);
        assert_eq!(report.stop_cause, Some(StopCause::StaleInput));
        assert_eq!(report.bias_l_ticks, 0.0);
        assert_eq!(report.bias_r_ticks, 0.0);
        assert_stopped(&report);

        rig.range_dropout = false;
        rig.bearing_dropout = false;

        // Dwell still holds the stop just after the inputs return
        let report = rig.run(200);
        assert!(!report.stale_range);
        assert!(report.estop);

        let report = rig.run(1500);
        assert!(!report.estop);
        assert_eq!(report.stop_cause, None);
        assert_ne!(report.mode, ControlMode::EmergencyStop);
    }

    #[test]
    fn test_only_range_stale_stops() {
        let mut rig = Rig::new(1.0, 0.0);
        rig.run(500);

        rig.range_dropout = true;
        let report = rig.run(300);

        assert!(report.stale_range);
        assert!(!report.stale_bearing);
        assert!(report.estop);
        assert_stopped(&report);
    }

    #[test]
    fn test_hard_stop_written_on_same_tick() {
        let mut rig = Rig::new(1.2, 0.0);
        let report = rig.run(1000);
        assert!(report.duty_l_ticks > 0);
        assert!(report.duty_r_ticks > 0);

        // Target jumps behind the robot just before an outer tick
        rig.plant.place_target(1.0, 120.0);
        let report = rig.run(10);

        assert!(report.outer);
        assert!(report.estop);
        assert_eq!(report.stop_cause, Some(StopCause::HardAngle));
        assert_stopped(&report);
        assert_eq!(rig.plant.outputs(), [MotorOutput::stopped(); NUM_WHEELS]);
    }

    #[test]
    fn test_follows_walking_target() {
        const SPEED_MS: f64 = 0.15;

        let mut rig = Rig::new(1.0, 0.0);
        rig.plant.set_target_velocity(SPEED_MS, 0.0);

        // Proportional distance control trails a walking target by v/Kp
        let nav = &rig.ctrl.params().nav_ctrl;
        let expected_m = nav.forward_setpoint_m + SPEED_MS / nav.k_p_dis;

        let mut num_ticks = 0;
        rig.run_with(10_000, |rpt, plant| {
            num_ticks += 1;
            assert!(!rpt.estop);

            // Settled
            if num_ticks > 500 {
                let d = plant.true_distance_m();
                assert!((d - expected_m).abs() < 0.03, "distance {} m", d);
                assert!(plant.true_bearing_deg().abs() < 10.0);
                assert!((rpt.rate_ref_l_rads - rpt.rate_meas_l_rads).abs() < 0.6);
                assert!((rpt.rate_ref_r_rads - rpt.rate_meas_r_rads).abs() < 0.6);
            }
        });

        assert!(rig.plant.robot().x_m > 1.2);
    }

    #[test]
    fn test_holds_stationary_target() {
        let mut rig = Rig::new(1.2, 0.0);
        let setpoint_m = rig.ctrl.params().nav_ctrl.tracking_setpoint_m;

        let mut num_ticks = 0;
        rig.run_with(30_000, |rpt, plant| {
            num_ticks += 1;
            assert!(!rpt.estop);
            assert!(plant.true_bearing_deg().abs() < 10.0);

            if num_ticks > 1000 {
                let d = plant.true_distance_m();
                assert!((d - setpoint_m).abs() < 0.03, "distance {} m", d);
            }
        });
    }

    #[test]
    fn test_soft_start_limits_turn_rate() {
        let mut params = ControllerParams::default();
        params.nav_ctrl.max_turn_rate_rads = 3.0;
        params.sched.soft_start_max_turn_rate_rads = 0.05;
        let mut rig = Rig::with_params(params, 1.0, 20.0);

        let mut max_w = 0.0f64;
        rig.run_with(500, |rpt, _| {
            assert!(rpt.soft_start);
            max_w = max_w.max(rpt.w_ref_rads.abs());
        });

        assert!(max_w <= 0.05 + 1e-12);
        assert!(max_w > 0.05 - 1e-9);
    }

    #[test]
    fn test_enable_bias_learning_clears_biases() {
        let mut rig = Rig::new(1.0, 0.0);
        rig.run(200);

        rig.ctrl.enable_bias_learning();
        assert!(rig.ctrl.bias.is_enabled());
        assert_eq!(rig.ctrl.bias.bias_ticks(), [0.0; NUM_WHEELS]);
    }
}
