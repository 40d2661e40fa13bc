//! # Wheel rate PID controller
//!
//! A PID controller with a low pass filtered derivative and hooks for the
//! anti-windup schemes used by the wheel controller.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use super::LowPassFilter;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Previous error
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64,

    /// Filter applied to the error derivative
    deriv_filter: LowPassFilter
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {

    /// Create a new controller with the given gains and derivative filter
    /// time constant.
    pub fn new(k_p: f64, k_i: f64, k_d: f64, deriv_tau_s: f64) -> Self {
        Self {
            k_p, k_i, k_d,
            integral: 0f64,
            prev_error: None,
            deriv_filter: LowPassFilter::new(deriv_tau_s)
        }
    }

    /// Get the value of the controller for the given error, `dt_s` seconds
    /// after the previous call.
    ///
    /// If `integrate` is false the error is not accumulated this call.
    pub fn get(&mut self, error: f64, dt_s: f64, integrate: bool) -> f64 {
        if integrate {
            self.integral += error * dt_s;
        }

        // With no previous error there is no derivative, taking the error
        // itself would kick the output on the first call.
        let deriv_raw = match self.prev_error {
            Some(e) => (error - e) / dt_s,
            None => 0f64
        };
        let deriv = self.deriv_filter.update(deriv_raw, dt_s);

        self.prev_error = Some(error);

        self.k_p * error
            + self.k_i * self.integral
            + self.k_d * deriv
    }

    /// Remove an amount previously accumulated into the integral.
    pub fn unwind(&mut self, amount: f64) {
        self.integral -= amount;
    }

    /// Back-calculation anti-windup.
    ///
    /// `excess` is the saturated output minus the unsaturated output, which
    /// is fed back into the integral with gain `k_b`. Does nothing if the
    /// controller has no integral action.
    pub fn back_calculate(&mut self, excess: f64, k_b: f64) {
        if self.k_i > 0.0 {
            self.integral += excess * k_b / self.k_i;
        }
    }

    /// Zero the integral, keeping the derivative memory.
    pub fn clear_integral(&mut self) {
        self.integral = 0.0;
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// Clear all memory.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
        self.deriv_filter.reset();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_proportional() {
        let mut pid = PidController::new(2.0, 0.0, 0.0, 0.0);
        assert_eq!(pid.get(1.5, 0.01, true), 3.0);
        assert_eq!(pid.get(-0.5, 0.01, true), -1.0);
    }

    #[test]
    fn test_integral() {
        let mut pid = PidController::new(0.0, 1.0, 0.0, 0.0);

        for _ in 0..100 {
            pid.get(2.0, 0.01, true);
        }
        assert!((pid.integral() - 2.0).abs() < 1e-9);

        // Frozen integration keeps the integral where it is
        pid.get(2.0, 0.01, false);
        assert!((pid.integral() - 2.0).abs() < 1e-9);

        pid.unwind(0.5);
        assert!((pid.integral() - 1.5).abs() < 1e-9);

        pid.clear_integral();
        assert_eq!(pid.integral(), 0.0);
    }

    #[test]
    fn test_derivative_filtered() {
        let mut pid = PidController::new(0.0, 0.0, 1.0, 0.02);

        // No kick on the first call
        assert_eq!(pid.get(5.0, 0.01, true), 0.0);

        // A step in error is smoothed, 1/3 of the raw derivative passes
        let out = pid.get(6.0, 0.01, true);
        assert!((out - 100.0 / 3.0).abs() < 1e-9);

        // Constant error decays the derivative
        let out = pid.get(6.0, 0.01, true);
        assert!(out < 100.0 / 3.0 && out > 0.0);
    }

    #[test]
    fn test_back_calculation() {
        let mut pid = PidController::new(0.5, 0.3, 0.0, 0.0);
        pid.get(1.0, 0.1, true);

        pid.back_calculate(-3.0, 0.1);
        assert!((pid.integral() - (0.1 - 1.0)).abs() < 1e-9);

        // No integral action, no back-calculation
        let mut pd = PidController::new(0.5, 0.0, 0.0, 0.0);
        pd.back_calculate(-3.0, 0.1);
        assert_eq!(pd.integral(), 0.0);
    }

    #[test]
    fn test_reset() {
        let mut pid = PidController::new(1.0, 1.0, 1.0, 0.02);
        pid.get(1.0, 0.01, true);
        pid.get(3.0, 0.01, true);

        pid.reset();
        assert_eq!(pid.integral(), 0.0);
        assert_eq!(pid.get(1.0, 0.01, true), 1.0 + 0.01);
    }
}
