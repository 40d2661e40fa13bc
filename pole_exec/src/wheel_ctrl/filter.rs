//! First order low pass filter

use serde::Serialize;
use util::maths::lowpass_alpha;

/// A first order low pass filter with a fixed time constant and variable
/// sample period.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LowPassFilter {
    /// Time constant.
    ///
    /// Units: seconds
    tau_s: f64,

    state: f64
}

impl LowPassFilter {
    pub fn new(tau_s: f64) -> Self {
        Self { tau_s, state: 0.0 }
    }

    /// Push a new sample taken `dt_s` after the previous one and return the
    /// filtered value.
    pub fn update(&mut self, input: f64, dt_s: f64) -> f64 {
        let alpha = lowpass_alpha(self.tau_s, dt_s);
        self.state += alpha * (input - self.state);
        self.state
    }

    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}
