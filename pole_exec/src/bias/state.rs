//! Bias learner state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use serde::Serialize;

// Internal
use super::Params;
use crate::loco_ctrl::{Side, NUM_WHEELS};
use util::{maths::clamp_abs, module::State};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Bias learner module state
#[derive(Debug, Clone)]
pub struct BiasLearner {
    params: Params,

    /// Timer ticks per PWM period.
    period_ticks: f64,

    /// Wheel rate the residual is normalised by.
    ///
    /// Units: radians/second
    max_wheel_rate_rads: f64,

    enabled: bool,

    /// Moving average of the straight line residual.
    ///
    /// Units: radians/second
    residual_avg_rads: f64,

    /// Learning cycles since the last update.
    update_counter: u32,

    /// Bias of each wheel in its own frame.
    ///
    /// Units: timer ticks
    bias_ticks: [f64; NUM_WHEELS]
}

/// Input data to the bias learner.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// Turn rate demand of the base.
    ///
    /// Units: radians/second
    pub w_ref_rads: f64,

    /// Rate demand of each wheel.
    ///
    /// Units: radians/second
    pub rate_ref_rads: [f64; NUM_WHEELS],

    /// Measured rate of each wheel.
    ///
    /// Units: radians/second
    pub rate_meas_rads: [f64; NUM_WHEELS]
}

/// Status report of the bias learner.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    /// True if the base was driving straight so the residual was sampled.
    pub sampled: bool,

    /// True if the biases were changed this cycle.
    pub updated: bool,

    /// Current average residual.
    ///
    /// Units: radians/second
    pub residual_avg_rads: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl BiasLearner {
    pub fn new(params: Params, max_wheel_rate_rads: f64, period_ticks: f64) -> Self {
        let enabled = params.enabled_at_boot;

        Self {
            params,
            period_ticks,
            max_wheel_rate_rads,
            enabled,
            residual_avg_rads: 0.0,
            update_counter: 0,
            bias_ticks: [0.0; NUM_WHEELS]
        }
    }

    /// Turn learning on, starting again from zero bias.
    pub fn enable(&mut self) {
        info!("Bias learning enabled");
        self.enabled = true;
        self.reset();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn bias_ticks(&self) -> [f64; NUM_WHEELS] {
        self.bias_ticks
    }

    /// Nudge the biases towards cancelling the averaged residual.
    ///
    /// A positive residual means the right wheel is running fast relative to
    /// the left.
    fn update_biases(&mut self) {
        let avg = self.residual_avg_rads;
        let adjustment = (avg.abs() / self.max_wheel_rate_rads)
            * self.period_ticks
            * self.params.adjustment_scale;

        let (left, right) = if avg > 0.0 {
            (adjustment, -adjustment * self.params.opposite_ratio)
        }
        else {
            (-adjustment, adjustment * self.params.opposite_ratio)
        };

        let l = Side::Left.index();
        let r = Side::Right.index();
        self.bias_ticks[l] = clamp_abs(self.bias_ticks[l] + left, self.params.max_bias_ticks);
        self.bias_ticks[r] = clamp_abs(self.bias_ticks[r] + right, self.params.max_bias_ticks);

        debug!(
            "Bias update: residual = {:.3} rad/s, bias = [{:.2}, {:.2}] ticks",
            avg, self.bias_ticks[l], self.bias_ticks[r]
        );
    }
}

impl State for BiasLearner {
    type InputData = InputData;
    type OutputData = [f64; NUM_WHEELS];
    type StatusReport = StatusReport;

    fn proc(&mut self, input_data: &InputData) -> ([f64; NUM_WHEELS], StatusReport) {
        let mut report = StatusReport::default();

        if input_data.w_ref_rads.abs() < self.params.straight_turn_rate_rads {
            let l = Side::Left.index();
            let r = Side::Right.index();

            let residual = (input_data.rate_meas_rads[r] - input_data.rate_meas_rads[l])
                - (input_data.rate_ref_rads[r] - input_data.rate_ref_rads[l]);

            self.residual_avg_rads = self.params.ema_retain * self.residual_avg_rads
                + (1.0 - self.params.ema_retain) * residual;
            report.sampled = true;

            self.update_counter += 1;
            if self.update_counter >= self.params.update_period_cycles {
                self.update_counter = 0;

                if self.enabled
                    && self.residual_avg_rads.abs() > self.params.activation_threshold_rads
                {
                    self.update_biases();
                    report.updated = true;
                }
            }
        }

        report.residual_avg_rads = self.residual_avg_rads;

        (self.bias_ticks, report)
    }

    /// Clear the learned biases and residual, the enable flag is kept.
    fn reset(&mut self) {
        self.residual_avg_rads = 0.0;
        self.update_counter = 0;
        self.bias_ticks = [0.0; NUM_WHEELS];
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn learner() -> BiasLearner {
        BiasLearner::new(Params::default(), 28.0, 1000.0)
    }

    fn straight(meas_l: f64, meas_r: f64) -> InputData {
        InputData {
            w_ref_rads: 0.0,
            rate_ref_rads: [10.0, 10.0],
            rate_meas_rads: [meas_l, meas_r]
        }
    }

    #[test]
    fn test_right_fast_moves_biases_apart() {
        let mut bl = learner();

        let mut first_update = None;
        for i in 0..1000 {
            let (_, rpt) = bl.proc(&straight(9.0, 11.0));
            if rpt.updated && first_update.is_none() {
                first_update = Some(i);
            }
        }

        // The average needs a few hundred cycles to pass the threshold
        assert!(first_update.unwrap() > 250);

        let [l, r] = bl.bias_ticks();
        assert!(l > 0.0);
        assert!(r < 0.0);
        assert!(l <= 15.0 && r >= -15.0);
    }

    #[test]
    fn test_left_fast_moves_biases_apart() {
        let mut bl = learner();

        for _ in 0..1000 {
            bl.proc(&straight(11.0, 9.0));
        }

        let [l, r] = bl.bias_ticks();
        assert!(l < 0.0);
        assert!(r > 0.0);
        assert!(l >= -15.0 && r <= 15.0);
    }

    #[test]
    fn test_gated_while_turning() {
        let mut bl = learner();

        let mut inp = straight(9.0, 11.0);
        inp.w_ref_rads = 0.5;

        for _ in 0..1000 {
            let (bias, rpt) = bl.proc(&inp);
            assert!(!rpt.sampled);
            assert_eq!(bias, [0.0, 0.0]);
        }
    }

    #[test]
    fn test_residual_relative_to_reference() {
        let mut bl = learner();

        // A commanded differential which is tracked exactly is not a bias
        for _ in 0..1000 {
            let (bias, _) = bl.proc(&InputData {
                w_ref_rads: 0.02,
                rate_ref_rads: [9.0, 11.0],
                rate_meas_rads: [9.0, 11.0]
            });
            assert_eq!(bias, [0.0, 0.0]);
        }
    }

    #[test]
    fn test_disabled_and_enable() {
        let params = Params {
            enabled_at_boot: false,
            ..Params::default()
        };
        let mut bl = BiasLearner::new(params, 28.0, 1000.0);

        for _ in 0..1000 {
            bl.proc(&straight(9.0, 11.0));
        }
        assert_eq!(bl.bias_ticks(), [0.0, 0.0]);

        bl.enable();
        assert!(bl.is_enabled());
        let (_, rpt) = bl.proc(&straight(10.0, 10.0));
        assert_eq!(rpt.residual_avg_rads, 0.0);
    }
}
