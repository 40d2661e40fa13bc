//! Safety supervisor state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace, warn};
use serde::Serialize;

// Internal
use super::{Params, StopCause};
use crate::nav_ctrl::VelocityReference;
use util::{module::State, time::ms_since};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Safety supervisor module state
#[derive(Debug, Clone)]
pub struct SafetySupervisor {
    params: Params,

    estop: bool,

    cause: Option<StopCause>,

    /// Time the current emergency stop was entered.
    estop_start_ms: Option<u32>,

    /// Time the bearing first exceeded the soft limit.
    large_angle_start_ms: Option<u32>,

    /// Time the current release ramp started.
    ramp_start_ms: Option<u32>
}

/// Input data to the supervisor.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// Current time.
    ///
    /// Units: milliseconds
    pub now_ms: u32,

    /// Distance to the target.
    ///
    /// Units: meters
    pub distance_m: f64,

    /// Bearing to the target.
    ///
    /// Units: degrees
    pub bearing_deg: f64,

    /// References produced by the planner this cycle.
    pub refs: VelocityReference
}

/// Status report for the supervisor.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    /// True if the emergency stop is active after processing.
    pub estop: bool,

    /// Cause of the active emergency stop.
    pub cause: Option<StopCause>,

    /// True if the emergency stop was entered this cycle.
    pub entered: bool,

    /// True if the emergency stop was released this cycle.
    pub released: bool,

    /// True if the far distance speed cap was applied.
    pub speed_capped: bool,

    /// Scale applied to the references by the release ramp, 1 outside a ramp.
    pub ramp_factor: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SafetySupervisor {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            estop: false,
            cause: None,
            estop_start_ms: None,
            large_angle_start_ms: None,
            ramp_start_ms: None
        }
    }

    pub fn is_estop(&self) -> bool {
        self.estop
    }

    pub fn cause(&self) -> Option<StopCause> {
        self.cause
    }

    /// Enter the emergency stop.
    ///
    /// Returns `true` if the stop was entered by this call, or `false` if it
    /// was already active, in which case the original cause and dwell timer
    /// are kept.
    pub fn trip(&mut self, cause: StopCause, now_ms: u32) -> bool {
        if self.estop {
            return false
        }

        warn!("Emergency stop entered, cause: {:?}", cause);

        self.estop = true;
        self.cause = Some(cause);
        self.estop_start_ms = Some(now_ms);
        self.ramp_start_ms = None;

        true
    }

    /// True if the target is back inside the envelope which allows release.
    fn release_allowed(&self, distance_m: f64, bearing_abs_deg: f64) -> bool {
        distance_m >= self.params.release_min_distance_m
            && distance_m <= self.params.release_max_distance_m
            && bearing_abs_deg <= self.params.soft_max_bearing_deg
    }
}

impl State for SafetySupervisor {
    type InputData = InputData;
    type OutputData = VelocityReference;
    type StatusReport = StatusReport;

    fn proc(&mut self, input_data: &InputData) -> (VelocityReference, StatusReport) {
        let now_ms = input_data.now_ms;
        let distance_m = input_data.distance_m;
        let bearing_abs_deg = input_data.bearing_deg.abs();

        let mut report = StatusReport {
            ramp_factor: 1.0,
            ..StatusReport::default()
        };
        let mut refs = input_data.refs;

        // ---- DISTANCE ----

        if distance_m <= self.params.hard_min_distance_m {
            report.entered |= self.trip(StopCause::TooClose, now_ms);
        }
        else if distance_m > self.params.far_distance_m
            && refs.v_ms > self.params.far_max_speed_ms
        {
            refs.v_ms = self.params.far_max_speed_ms;
            report.speed_capped = true;
        }

        // ---- BEARING ----

        if bearing_abs_deg > self.params.hard_max_bearing_deg {
            report.entered |= self.trip(StopCause::HardAngle, now_ms);
        }

        if bearing_abs_deg > self.params.soft_max_bearing_deg {
            let start = *self.large_angle_start_ms.get_or_insert(now_ms);
            if ms_since(now_ms, start) > self.params.soft_bearing_hold_ms {
                report.entered |= self.trip(StopCause::SustainedLargeAngle, now_ms);
            }
        }
        else {
            self.large_angle_start_ms = None;
        }

        // ---- RELEASE ----

        if self.estop {
            let start = *self.estop_start_ms.get_or_insert(now_ms);

            if ms_since(now_ms, start) > self.params.release_dwell_ms
                && self.release_allowed(distance_m, bearing_abs_deg)
            {
                info!(
                    "Emergency stop released after {} ms (cause was {:?})",
                    ms_since(now_ms, start), self.cause
                );
                self.estop = false;
                self.cause = None;
                self.estop_start_ms = None;
                self.ramp_start_ms = Some(now_ms);
                report.released = true;
            }
        }

        // ---- RAMP ----

        if let Some(ramp_start) = self.ramp_start_ms {
            let elapsed_ms = ms_since(now_ms, ramp_start);

            if elapsed_ms >= self.params.release_ramp_ms {
                self.ramp_start_ms = None;
            }
            else {
                report.ramp_factor =
                    elapsed_ms as f64 / self.params.release_ramp_ms as f64;
                refs = refs.scaled(report.ramp_factor);
            }
        }

        if self.estop {
            refs = VelocityReference::zero();
        }

        report.estop = self.estop;
        report.cause = self.cause;

        trace!(
            "Safety: estop = {}, ramp = {:.2}, v = {:.3} m/s, w = {:.3} rad/s",
            self.estop, report.ramp_factor, refs.v_ms, refs.w_rads
        );

        (refs, report)
    }

    fn reset(&mut self) {
        *self = Self::new(self.params.clone());
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const PERIOD_MS: u32 = 50;

    fn refs(v_ms: f64, w_rads: f64) -> VelocityReference {
        VelocityReference { v_ms, w_rads }
    }

    fn step(
        sup: &mut SafetySupervisor,
        now_ms: u32,
        distance_m: f64,
        bearing_deg: f64,
        planned: VelocityReference
    ) -> (VelocityReference, StatusReport) {
        sup.proc(&InputData { now_ms, distance_m, bearing_deg, refs: planned })
    }

    #[test]
    fn test_hard_distance() {
        let mut sup = SafetySupervisor::new(Params::default());

        let (out, rpt) = step(&mut sup, 0, 0.1, 0.0, refs(0.2, 0.3));
        assert_eq!(out, VelocityReference::zero());
        assert!(rpt.estop && rpt.entered);
        assert_eq!(rpt.cause, Some(StopCause::TooClose));
    }

    #[test]
    fn test_hard_angle_regardless_of_distance() {
        for &d in &[0.3, 0.9, 1.4, 2.0] {
            let mut sup = SafetySupervisor::new(Params::default());
            let (out, rpt) = step(&mut sup, 0, d, -120.0, refs(0.2, 0.3));
            assert_eq!(out, VelocityReference::zero());
            assert_eq!(rpt.cause, Some(StopCause::HardAngle));
        }
    }

    #[test]
    fn test_far_speed_cap() {
        let mut sup = SafetySupervisor::new(Params::default());

        let (out, rpt) = step(&mut sup, 0, 1.8, 0.0, refs(0.35, 0.1));
        assert_eq!(out, refs(0.25, 0.1));
        assert!(rpt.speed_capped);

        let (out, _) = step(&mut sup, 50, 1.8, 0.0, refs(0.2, 0.1));
        assert_eq!(out, refs(0.2, 0.1));
    }

    #[test]
    fn test_sustained_large_angle() {
        let mut sup = SafetySupervisor::new(Params::default());

        // 30 degrees held, trips only once the hold time is exceeded
        let mut tripped_at = None;
        for i in 0..60 {
            let now = i * PERIOD_MS;
            let (_, rpt) = step(&mut sup, now, 0.8, 30.0, refs(0.1, 0.1));
            if rpt.entered {
                tripped_at = Some(now);
                assert_eq!(rpt.cause, Some(StopCause::SustainedLargeAngle));
            }
        }
        assert_eq!(tripped_at, Some(2050));
    }

    #[test]
    fn test_large_angle_timer_resets() {
        let mut sup = SafetySupervisor::new(Params::default());

        for i in 0..200 {
            let now = i * PERIOD_MS;
            // Dip back under the soft limit every second
            let bearing = if i % 20 == 0 { 10.0 } else { 30.0 };
            let (_, rpt) = step(&mut sup, now, 0.8, bearing, refs(0.1, 0.1));
            assert!(!rpt.estop);
        }
    }

    #[test]
    fn test_release_dwell_and_ramp() {
        let params = Params::default();
        let mut sup = SafetySupervisor::new(params.clone());

        step(&mut sup, 0, 0.05, 0.0, refs(0.0, 0.0));
        assert!(sup.is_estop());

        // Nominal conditions return but the dwell has not passed
        let mut now = 0;
        while now <= params.release_dwell_ms {
            now += PERIOD_MS;
            let (out, rpt) = step(&mut sup, now, 0.8, 0.0, refs(0.2, 0.1));
            if now <= params.release_dwell_ms {
                assert!(rpt.estop);
                assert_eq!(out, VelocityReference::zero());
            }
            else {
                assert!(rpt.released);
                assert_eq!(out, VelocityReference::zero());
            }
        }

        // References rise monotonically back to the planner's values
        let mut prev = 0.0;
        for _ in 0..10 {
            now += PERIOD_MS;
            let (out, rpt) = step(&mut sup, now, 0.8, 0.0, refs(0.2, 0.1));
            assert!(!rpt.estop);
            assert!(out.v_ms >= prev);
            prev = out.v_ms;
        }
        assert_eq!(prev, 0.2);
    }

    #[test]
    fn test_no_release_out_of_bounds() {
        let mut sup = SafetySupervisor::new(Params::default());

        sup.trip(StopCause::StaleInput, 0);

        for i in 1..100 {
            let (_, rpt) = step(&mut sup, i * PERIOD_MS, 1.7, 0.0, refs(0.2, 0.0));
            assert!(rpt.estop);
            assert_eq!(rpt.cause, Some(StopCause::StaleInput));
        }

        let (_, rpt) = step(&mut sup, 100 * PERIOD_MS, 1.2, 5.0, refs(0.2, 0.0));
        assert!(rpt.released);
    }

    #[test]
    fn test_trip_keeps_first_cause() {
        let mut sup = SafetySupervisor::new(Params::default());

        assert!(sup.trip(StopCause::StaleInput, 10));
        assert!(!sup.trip(StopCause::TooClose, 20));
        assert_eq!(sup.cause(), Some(StopCause::StaleInput));
    }
}
