//! Wheel rate estimation from quadrature counts

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use super::LowPassFilter;
use util::time::{ms_to_s, signed_ms_since};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Estimates the rate of one wheel from its free-running encoder counter.
#[derive(Debug, Clone, Serialize)]
pub struct EncoderSpeed {
    counts_per_rev: f64,

    /// Period substituted when the measured period is not positive.
    ///
    /// Units: seconds
    nominal_dt_s: f64,

    filter: LowPassFilter,

    /// Counter value and time of the previous sample.
    prev: Option<(i32, u32)>
}

/// One estimate of the wheel rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EncoderSample {
    /// Filtered wheel rate.
    ///
    /// Units: radians/second
    pub rate_rads: f64,

    /// Period the estimate was computed over.
    ///
    /// Units: seconds
    pub dt_s: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl EncoderSpeed {
    pub fn new(counts_per_rev: f64, filter_tau_s: f64, nominal_dt_s: f64) -> Self {
        Self {
            counts_per_rev,
            nominal_dt_s,
            filter: LowPassFilter::new(filter_tau_s),
            prev: None
        }
    }

    /// Push a new counter reading taken at `now_ms`.
    ///
    /// The first reading only initialises the estimator and gives a rate of
    /// zero over the nominal period.
    pub fn update(&mut self, counts: i32, now_ms: u32) -> EncoderSample {
        let (prev_counts, prev_ms) = match self.prev.replace((counts, now_ms)) {
            Some(p) => p,
            None => return EncoderSample {
                rate_rads: 0.0,
                dt_s: self.nominal_dt_s
            }
        };

        let mut dt_s = ms_to_s(signed_ms_since(now_ms, prev_ms));
        if dt_s <= 0.0 {
            dt_s = self.nominal_dt_s;
        }

        // The hardware counter wraps, so the difference must too
        let delta = counts.wrapping_sub(prev_counts);
        let raw_rads = delta as f64 * std::f64::consts::TAU / (self.counts_per_rev * dt_s);

        EncoderSample {
            rate_rads: self.filter.update(raw_rads, dt_s),
            dt_s
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const CPR: f64 = 2800.0;

    #[test]
    fn test_first_sample_initialises() {
        let mut enc = EncoderSpeed::new(CPR, 0.0, 0.01);

        let s = enc.update(12345, 40);
        assert_eq!(s, EncoderSample { rate_rads: 0.0, dt_s: 0.01 });
    }

    #[test]
    fn test_rate() {
        let mut enc = EncoderSpeed::new(CPR, 0.0, 0.01);

        enc.update(0, 0);
        // 28 counts in 10 ms is one hundredth of a revolution
        let s = enc.update(28, 10);
        assert!((s.rate_rads - std::f64::consts::TAU).abs() < 1e-9);
        assert!((s.dt_s - 0.01).abs() < 1e-12);

        let s = enc.update(0, 20);
        assert!((s.rate_rads + std::f64::consts::TAU).abs() < 1e-9);
    }

    #[test]
    fn test_counter_wrap() {
        let mut enc = EncoderSpeed::new(CPR, 0.0, 0.01);

        enc.update(i32::MAX - 10, 0);
        let s = enc.update(i32::MIN + 17, 10);
        assert!((s.rate_rads - std::f64::consts::TAU).abs() < 1e-9);
    }

    #[test]
    fn test_bad_dt_uses_nominal() {
        let mut enc = EncoderSpeed::new(CPR, 0.0, 0.01);

        enc.update(0, 100);
        let s = enc.update(28, 100);
        assert_eq!(s.dt_s, 0.01);
        assert!((s.rate_rads - std::f64::consts::TAU).abs() < 1e-9);

        // Time going backwards
        let s = enc.update(56, 90);
        assert_eq!(s.dt_s, 0.01);
    }
}
