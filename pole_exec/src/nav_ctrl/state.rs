//! Navigation control state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use serde::Serialize;

// Internal
use super::{ControlMode, Params, VelocityReference};
use util::{
    maths::{clamp_abs, slew_rate_limit},
    module::State
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Navigation control module state
#[derive(Debug, Clone)]
pub struct NavCtrl {
    params: Params,

    /// Period between calls to `proc`.
    ///
    /// Units: seconds
    dt_s: f64,

    mode: ControlMode,

    /// References of the previous cycle, after any safety override.
    prev: VelocityReference,

    /// Distance error of the previous cycle.
    e_dis_prev: f64
}

/// Input data to navigation control.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// Distance to the target.
    ///
    /// Units: meters
    pub distance_m: f64,

    /// Bearing to the target.
    ///
    /// Units: degrees
    pub bearing_deg: f64
}

/// Status report for navigation control processing.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    /// True if the mode changed this cycle.
    pub mode_changed: bool,

    /// True if the minimum forward speed was applied.
    pub floor_applied: bool,

    /// True if the bearing-dependent speed limit was applied.
    pub angle_limited: bool,

    /// True if the linear acceleration limit was applied.
    pub accel_limited: bool,

    /// True if the curvature was saturated at the minimum turn radius.
    pub radius_limited: bool,

    /// True if the turn rate or angular acceleration limit was applied.
    pub turn_rate_limited: bool,

    /// Commanded curvature.
    ///
    /// Units: 1/meters
    pub curvature_m: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl NavCtrl {
    /// Create a new instance which will be processed every `dt_s` seconds.
    pub fn new(params: Params, dt_s: f64) -> Self {
        Self {
            params,
            dt_s,
            mode: ControlMode::default(),
            prev: VelocityReference::zero(),
            e_dis_prev: 0.0
        }
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    /// Force the mode, used by the safety supervisor to record an emergency
    /// stop. The next distance-based mode will differ and so reset the
    /// planner's memory.
    pub fn set_mode(&mut self, mode: ControlMode) {
        if mode != self.mode {
            debug!("NavCtrl mode forced {} -> {}", self.mode.as_str(), mode.as_str());
        }
        self.mode = mode;
    }

    /// Record the references actually applied this cycle, which the slew
    /// limits of the next cycle are computed against.
    pub fn commit(&mut self, applied: VelocityReference) {
        self.prev = applied;
    }

    /// Linear speed demand of the distance controller for the current mode.
    fn calc_distance_speed(&mut self, distance_m: f64) -> f64 {
        let p = &self.params;

        match self.mode {
            ControlMode::Backward => p.backward_speed_ms,
            ControlMode::Stop | ControlMode::EmergencyStop => 0.0,
            ControlMode::Tracking => {
                let e_dis = distance_m - p.tracking_setpoint_m;
                let de_dis = (e_dis - self.e_dis_prev) / self.dt_s;
                self.e_dis_prev = e_dis;

                clamp_abs(p.k_p_dis * e_dis + p.k_d_dis * de_dis, p.tracking_max_speed_ms)
            },
            ControlMode::Forward => {
                let e_dis = distance_m - p.forward_setpoint_m;
                let de_dis = (e_dis - self.e_dis_prev) / self.dt_s;
                self.e_dis_prev = e_dis;

                (p.k_p_dis * e_dis + p.k_d_dis * de_dis).max(0.0)
            }
        }
    }

    /// Curvature of the arc through the target, saturated at the minimum turn
    /// radius. Returns the curvature and whether it was saturated.
    fn calc_curvature(&self, distance_m: f64, bearing_rad: f64) -> (f64, bool) {
        if bearing_rad.abs() <= self.params.bearing_deadzone_rad {
            return (0.0, false)
        }

        let curv_m = 2.0 * bearing_rad.sin() / distance_m;

        if 1.0 / curv_m.abs() < self.params.min_turn_radius_m {
            (bearing_rad.signum() / self.params.min_turn_radius_m, true)
        }
        else {
            (curv_m, false)
        }
    }
}

impl State for NavCtrl {
    type InputData = InputData;
    type OutputData = VelocityReference;
    type StatusReport = StatusReport;

    fn proc(&mut self, input_data: &InputData) -> (VelocityReference, StatusReport) {
        let mut report = StatusReport::default();
        let distance_m = input_data.distance_m;
        let bearing_rad = input_data.bearing_deg.to_radians();

        // ---- MODE ----

        let (mode, reset) = self.mode.transition(distance_m, &self.params);
        if reset {
            debug!(
                "NavCtrl mode {} -> {} (d = {:.3} m, v_prev = {:.3} m/s)",
                self.mode.as_str(), mode.as_str(), distance_m, self.prev.v_ms
            );
            self.prev.v_ms = 0.0;
            self.e_dis_prev = 0.0;
            report.mode_changed = true;
        }
        self.mode = mode;

        // ---- LINEAR ----

        let mut v_ms = self.calc_distance_speed(distance_m);

        if v_ms > 0.0 && v_ms < self.params.min_forward_speed_ms {
            v_ms = self.params.min_forward_speed_ms;
            report.floor_applied = true;
        }

        let v_bearing_limit = (self.params.max_speed_ms
            * (1.0 - bearing_rad.abs() / std::f64::consts::FRAC_PI_2))
            .max(self.params.base_speed_ms);
        if v_ms > v_bearing_limit {
            v_ms = v_bearing_limit;
            report.angle_limited = true;
        }

        let v_slewed = slew_rate_limit(
            v_ms, self.prev.v_ms, self.params.max_accel_mss * self.dt_s);
        report.accel_limited = v_slewed != v_ms;
        v_ms = v_slewed;

        // ---- ANGULAR ----

        let (curv_m, radius_limited) = self.calc_curvature(distance_m, bearing_rad);
        report.curvature_m = curv_m;
        report.radius_limited = radius_limited;

        let w_demand = v_ms * curv_m;
        let w_rads = slew_rate_limit(
            clamp_abs(w_demand, self.params.max_turn_rate_rads),
            self.prev.w_rads,
            self.params.max_turn_accel_radss * self.dt_s
        );
        report.turn_rate_limited = w_rads != w_demand;

        let output = VelocityReference { v_ms, w_rads };

        trace!(
            "NavCtrl {}: d = {:.3} m, theta = {:.1} deg -> v = {:.3} m/s, w = {:.3} rad/s",
            self.mode.as_str(), distance_m, input_data.bearing_deg, v_ms, w_rads
        );

        (output, report)
    }

    fn reset(&mut self) {
        self.mode = ControlMode::default();
        self.prev = VelocityReference::zero();
        self.e_dis_prev = 0.0;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const DT: f64 = 0.05;

    fn run(nav: &mut NavCtrl, distance_m: f64, bearing_deg: f64) -> (VelocityReference, StatusReport) {
        let (out, rpt) = nav.proc(&InputData { distance_m, bearing_deg });
        nav.commit(out);
        (out, rpt)
    }

    #[test]
    fn test_forward_at_setpoint_is_still() {
        let mut nav = NavCtrl::new(Params::default(), DT);

        for _ in 0..50 {
            let (out, _) = run(&mut nav, 0.80, 0.0);
            assert_eq!(out.v_ms, 0.0);
            assert_eq!(out.w_rads, 0.0);
        }
        assert_eq!(nav.mode(), ControlMode::Forward);
    }

    #[test]
    fn test_slew_rate_law() {
        let params = Params::default();
        let max_step = params.max_accel_mss * DT;
        let mut nav = NavCtrl::new(params, DT);

        let mut prev = 0.0;
        for i in 0..100 {
            // Target walks away then comes back
            let d = if i < 50 { 2.0 } else { 0.85 };
            let (out, _) = run(&mut nav, d, 0.0);
            assert!((out.v_ms - prev).abs() <= max_step + 1e-12);
            prev = out.v_ms;
        }
    }

    #[test]
    fn test_converges_to_fixed_point() {
        let mut nav = NavCtrl::new(Params::default(), DT);

        let mut outputs = vec![];
        for _ in 0..200 {
            outputs.push(run(&mut nav, 0.75, 0.0).0);
        }

        // Tracking band with a small positive error settles on the floor
        let last = outputs[outputs.len() - 1];
        assert!((last.v_ms - 0.12).abs() < 1e-9);
        assert_eq!(last.w_rads, 0.0);
        for o in &outputs[150..] {
            assert_eq!(*o, last);
        }
    }

    #[test]
    fn test_backward_band() {
        let mut nav = NavCtrl::new(Params::default(), DT);

        let mut v = 0.0;
        for _ in 0..40 {
            v = run(&mut nav, 0.15, 0.0).0.v_ms;
        }
        assert!((v - -0.3).abs() < 1e-9);
        assert_eq!(nav.mode(), ControlMode::Backward);
    }

    #[test]
    fn test_mode_change_resets_speed_memory() {
        let mut nav = NavCtrl::new(Params::default(), DT);

        for _ in 0..40 {
            run(&mut nav, 2.0, 0.0);
        }
        assert!(nav.prev.v_ms > 0.3);

        // Stepping into the stop band restarts the slew from zero
        let (out, rpt) = run(&mut nav, 0.4, 0.0);
        assert!(rpt.mode_changed);
        assert_eq!(out.v_ms, 0.0);
    }

    #[test]
    fn test_curvature_and_turn_limits() {
        let params = Params::default();
        let nav = NavCtrl::new(params.clone(), DT);

        // Dead ahead
        assert_eq!(nav.calc_curvature(1.0, 0.005), (0.0, false));

        // Gentle bearing
        let (k, lim) = nav.calc_curvature(1.0, 0.2);
        assert!((k - 2.0 * 0.2f64.sin()).abs() < 1e-12);
        assert!(!lim);

        // Close and well off axis saturates at the minimum radius
        let (k, lim) = nav.calc_curvature(0.2, -1.0);
        assert!((k - -1.0 / params.min_turn_radius_m).abs() < 1e-12);
        assert!(lim);
    }

    #[test]
    fn test_turn_rate_bounded() {
        let params = Params::default();
        let max_w_step = params.max_turn_accel_radss * DT;
        let mut nav = NavCtrl::new(params.clone(), DT);

        let mut prev_w = 0.0;
        for _ in 0..100 {
            let (out, _) = run(&mut nav, 1.9, 45.0);
            assert!(out.w_rads.abs() <= params.max_turn_rate_rads + 1e-12);
            assert!((out.w_rads - prev_w).abs() <= max_w_step + 1e-12);
            assert!(out.w_rads >= 0.0);
            prev_w = out.w_rads;
        }
    }

    #[test]
    fn test_bearing_speed_limit() {
        let mut nav = NavCtrl::new(Params::default(), DT);

        // Far off axis the speed limit falls to the base speed
        let mut v = 0.0;
        for _ in 0..100 {
            let (out, _) = run(&mut nav, 2.0, 85.0);
            v = out.v_ms;
        }
        assert!((v - 0.1).abs() < 1e-9);
    }
}
