//! Wheel control state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::{Params, PidController};
use crate::loco_ctrl::NUM_WHEELS;
use util::{maths::clamp_abs, module::State};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Scaling between wheel rates and timer ticks, shared by the feed-forward
/// and the saturation.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DriveScale {
    /// Timer ticks in one PWM period.
    pub period_ticks: f64,

    /// Largest fraction of the period that may be commanded.
    pub max_duty_ratio: f64,

    /// Wheel rate which maps onto the full commandable duty.
    ///
    /// Units: radians/second
    pub max_wheel_rate_rads: f64
}

/// Wheel control module state
#[derive(Debug, Clone)]
pub struct WheelCtrl {
    params: Params,
    scale: DriveScale,
    pids: [PidController; NUM_WHEELS]
}

/// Input data to wheel control.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// Rate demand of each wheel.
    ///
    /// Units: radians/second
    pub rate_ref_rads: [f64; NUM_WHEELS],

    /// Filtered measured rate of each wheel.
    ///
    /// Units: radians/second
    pub rate_meas_rads: [f64; NUM_WHEELS],

    /// Learned bias of each wheel.
    ///
    /// Units: timer ticks
    pub bias_ticks: [f64; NUM_WHEELS],

    /// Time since the previous cycle.
    ///
    /// Units: seconds
    pub dt_s: f64,

    /// If true the integrals are held at zero.
    pub integral_frozen: bool
}

/// Output of wheel control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OutputData {
    /// Saturated drive command of each wheel in the wheel's own frame.
    ///
    /// Units: timer ticks
    pub cmd_ticks: [f64; NUM_WHEELS]
}

/// Status report for wheel control processing.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    pub error_rads: [f64; NUM_WHEELS],
    pub ff_ticks: [f64; NUM_WHEELS],
    pub pid_ticks: [f64; NUM_WHEELS],
    pub unsat_ticks: [f64; NUM_WHEELS],
    pub saturated: [bool; NUM_WHEELS],
    pub integral_blocked: [bool; NUM_WHEELS],
    pub integral: [f64; NUM_WHEELS]
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DriveScale {
    /// Largest command magnitude.
    ///
    /// Units: timer ticks
    pub fn max_cmd_ticks(&self) -> f64 {
        self.period_ticks * self.max_duty_ratio
    }
}

impl WheelCtrl {
    pub fn new(params: Params, scale: DriveScale) -> Self {
        let pid = PidController::new(
            params.k_p, params.k_i, params.k_d, params.deriv_filter_tau_s);

        Self {
            params,
            scale,
            pids: [pid.clone(), pid]
        }
    }

    pub fn pid(&self, wheel: usize) -> &PidController {
        &self.pids[wheel]
    }

    /// Feed-forward command for a rate demand.
    pub fn calc_feed_forward(&self, rate_ref_rads: f64) -> f64 {
        let mut ff = (rate_ref_rads / self.scale.max_wheel_rate_rads)
            * self.params.k_ff
            * self.scale.max_cmd_ticks();

        if rate_ref_rads != 0.0 {
            ff += rate_ref_rads.signum() * self.params.k_ff_offset * self.scale.period_ticks;
        }

        ff
    }
}

impl State for WheelCtrl {
    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;

    fn proc(&mut self, input_data: &InputData) -> (OutputData, StatusReport) {
        let mut output = OutputData::default();
        let mut report = StatusReport::default();

        let dt_s = if input_data.dt_s > 0.0 {
            input_data.dt_s
        }
        else {
            self.params.nominal_dt_s
        };
        let max_cmd = self.scale.max_cmd_ticks();
        let integrate = !input_data.integral_frozen;

        for i in 0..NUM_WHEELS {
            let rate_ref = input_data.rate_ref_rads[i];
            let error = rate_ref - input_data.rate_meas_rads[i];

            let ff = self.calc_feed_forward(rate_ref);

            let pid = &mut self.pids[i];
            if !integrate {
                pid.clear_integral();
            }
            let correction = clamp_abs(
                pid.get(error, dt_s, integrate),
                self.params.pid_output_limit_ticks
            );

            let unsat = ff + correction + input_data.bias_ticks[i];
            let sat = clamp_abs(unsat, max_cmd);

            if integrate {
                // Conditional integration
                let blocked = (unsat > max_cmd && error > 0.0)
                    || (unsat < -max_cmd && error < 0.0);
                if blocked {
                    pid.unwind(error * dt_s);
                }
                report.integral_blocked[i] = blocked;

                pid.back_calculate(sat - unsat, self.params.k_b);
            }

            output.cmd_ticks[i] = sat;

            report.error_rads[i] = error;
            report.ff_ticks[i] = ff;
            report.pid_ticks[i] = correction;
            report.unsat_ticks[i] = unsat;
            report.saturated[i] = sat != unsat;
            report.integral[i] = pid.integral();
        }

        trace!(
            "WheelCtrl: ref = {:?}, meas = {:?}, cmd = {:?}",
            input_data.rate_ref_rads, input_data.rate_meas_rads, output.cmd_ticks
        );

        (output, report)
    }

    fn reset(&mut self) {
        for pid in self.pids.iter_mut() {
            pid.reset();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        hal::{sim::{PlantParams, SimPlant}, EncoderReader, MotorDriver},
        pwm::{self, PwmShaper},
        wheel_ctrl::EncoderSpeed
    };

    fn scale() -> DriveScale {
        DriveScale {
            period_ticks: 1000.0,
            max_duty_ratio: 0.35,
            max_wheel_rate_rads: 28.0
        }
    }

    fn input(rate_ref: f64, rate_meas: f64) -> InputData {
        InputData {
            rate_ref_rads: [rate_ref; NUM_WHEELS],
            rate_meas_rads: [rate_meas; NUM_WHEELS],
            bias_ticks: [0.0; NUM_WHEELS],
            dt_s: 0.01,
            integral_frozen: false
        }
    }

    /// Both wheel loops closed through the encoders, the shaper and the
    /// simulated motors.
    struct WheelRig {
        wc: WheelCtrl,
        encoders: [EncoderSpeed; NUM_WHEELS],
        shaper: PwmShaper,
        plant: SimPlant,
        now_ms: u32
    }

    impl WheelRig {
        fn new() -> Self {
            let params = Params::default();
            let encoder = EncoderSpeed::new(
                params.counts_per_rev, params.encoder_filter_tau_s, params.nominal_dt_s);

            Self {
                wc: WheelCtrl::new(params, scale()),
                encoders: [encoder.clone(), encoder],
                shaper: PwmShaper::new(pwm::Params::default()),
                plant: SimPlant::new(PlantParams::default()),
                now_ms: 0
            }
        }

        /// One 10 ms cycle with the same demand on both wheels. Returns the
        /// measured rates and the wheel commands.
        fn cycle(&mut self, rate_ref: f64) -> ([f64; NUM_WHEELS], OutputData) {
            let counts = self.plant.read_counts();
            let mut inp = input(rate_ref, 0.0);
            for i in 0..NUM_WHEELS {
                let sample = self.encoders[i].update(counts[i], self.now_ms);
                inp.rate_meas_rads[i] = sample.rate_rads;
                inp.dt_s = sample.dt_s;
            }

            let (out, _) = self.wc.proc(&inp);
            let (outputs, _) = self.shaper.proc(&pwm::InputData {
                cmd_ticks: out.cmd_ticks,
                soft_start: false
            });

            self.plant.write(&outputs);
            self.plant.step(0.01);
            self.now_ms += 10;

            (inp.rate_meas_rads, out)
        }
    }

    #[test]
    fn test_idle() {
        let mut wc = WheelCtrl::new(Params::default(), scale());
        let (out, rpt) = wc.proc(&input(0.0, 0.0));
        assert_eq!(out.cmd_ticks, [0.0, 0.0]);
        assert_eq!(rpt.saturated, [false, false]);
    }

    #[test]
    fn test_feed_forward() {
        let params = Params {
            k_ff: 1.0,
            k_ff_offset: 0.02,
            ..Params::default()
        };
        let wc = WheelCtrl::new(params, scale());

        assert_eq!(wc.calc_feed_forward(0.0), 0.0);
        assert!((wc.calc_feed_forward(14.0) - (175.0 + 20.0)).abs() < 1e-9);
        assert!((wc.calc_feed_forward(-28.0) - -(350.0 + 20.0)).abs() < 1e-9);

        // Defaults start at the breakaway duty and end at the maximum duty
        let wc = WheelCtrl::new(Params::default(), scale());
        assert!((wc.calc_feed_forward(1e-6) - 70.0).abs() < 1e-3);
        assert!((wc.calc_feed_forward(28.0) - 350.0).abs() < 1e-9);
        assert!((wc.calc_feed_forward(-28.0) - -350.0).abs() < 1e-9);
    }

    #[test]
    fn test_tracking_is_feed_forward_plus_bias() {
        let mut wc = WheelCtrl::new(Params::default(), scale());

        let mut inp = input(14.0, 14.0);
        inp.bias_ticks = [5.0, -3.0];

        let (out, _) = wc.proc(&inp);
        assert!((out.cmd_ticks[0] - 215.0).abs() < 1e-9);
        assert!((out.cmd_ticks[1] - 207.0).abs() < 1e-9);
    }

    #[test]
    fn test_conditional_integration() {
        // Back-calculation off so only the conditional integration acts
        let params = Params {
            k_b: 0.0,
            ..Params::default()
        };
        let mut wc = WheelCtrl::new(params, scale());

        for _ in 0..500 {
            let (out, rpt) = wc.proc(&input(28.0, 0.0));
            assert_eq!(out.cmd_ticks, [350.0, 350.0]);
            assert_eq!(rpt.integral_blocked, [true, true]);
        }
        assert_eq!(wc.pid(0).integral(), 0.0);
    }

    #[test]
    fn test_windup_bounded_and_recovers() {
        let params = Params::default();
        let bound = params.pid_output_limit_ticks / params.k_i;
        let mut rig = WheelRig::new();

        // Full rate is beyond the weaker right motor, so the drive saturates
        let mut saturated = false;
        for _ in 0..500 {
            let (_, out) = rig.cycle(28.0);
            saturated |= out.cmd_ticks.iter().any(|c| c.abs() >= 350.0);
            for i in 0..NUM_WHEELS {
                assert!(rig.wc.pid(i).integral().abs() < bound);
            }
        }
        assert!(saturated);

        // Both wheels are back tracking within half a second of the step down
        for n in 0..150 {
            let (meas, out) = rig.cycle(10.0);
            if n >= 50 {
                for i in 0..NUM_WHEELS {
                    assert!((10.0 - meas[i]).abs() < 1.0, "wheel {} at {} rad/s", i, meas[i]);
                    assert!(out.cmd_ticks[i].abs() < 350.0);
                }
            }
        }
    }

    #[test]
    fn test_tracks_through_plant() {
        let mut rig = WheelRig::new();

        for n in 0..300 {
            let (meas, _) = rig.cycle(5.0);
            if n >= 100 {
                for i in 0..NUM_WHEELS {
                    assert!((5.0 - meas[i]).abs() < 0.5, "wheel {} at {} rad/s", i, meas[i]);
                }
            }
        }
    }

    #[test]
    fn test_integral_freeze() {
        let mut wc = WheelCtrl::new(Params::default(), scale());

        let mut inp = input(5.0, 0.0);
        inp.integral_frozen = true;

        for _ in 0..30 {
            let (_, rpt) = wc.proc(&inp);
            assert_eq!(rpt.integral, [0.0, 0.0]);
        }

        inp.integral_frozen = false;
        let (_, rpt) = wc.proc(&inp);
        assert!((rpt.integral[0] - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_bad_dt() {
        let mut wc = WheelCtrl::new(Params::default(), scale());

        let mut inp = input(5.0, 0.0);
        inp.dt_s = -0.01;
        let (_, rpt) = wc.proc(&inp);
        assert!((rpt.integral[0] - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_reset() {
        let mut wc = WheelCtrl::new(Params::default(), scale());
        for _ in 0..10 {
            wc.proc(&input(5.0, 0.0));
        }
        assert!(wc.pid(1).integral() > 0.0);

        wc.reset();
        assert_eq!(wc.pid(0).integral(), 0.0);
        assert_eq!(wc.pid(1).integral(), 0.0);
    }
}
