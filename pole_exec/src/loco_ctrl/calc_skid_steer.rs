//! Skid steer calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal imports
use super::{LocoCtrl, Side, NUM_WHEELS};
use crate::nav_ctrl::VelocityReference;
use util::maths::clamp_abs;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LocoCtrl {

    /// Perform the skid steer calculations.
    ///
    /// Returns the rate demand of each wheel, in index order, and whether each
    /// demand was limited.
    pub(crate) fn calc_skid_steer(
        &self,
        refs: &VelocityReference
    ) -> ([f64; NUM_WHEELS], [bool; NUM_WHEELS]) {
        let half_track_m = self.params.track_width_m / 2.0;
        let max_rate = self.params.max_wheel_rate_rads;

        let mut rates = [0f64; NUM_WHEELS];
        let mut limited = [false; NUM_WHEELS];

        for side in Side::ALL.iter() {
            let i = side.index();

            let rim_speed_ms = match side {
                Side::Left => refs.v_ms - refs.w_rads * half_track_m,
                Side::Right => refs.v_ms + refs.w_rads * half_track_m
            };

            let demand = rim_speed_ms / self.params.wheel_radius_m;
            rates[i] = clamp_abs(demand, max_rate);
            limited[i] = rates[i] != demand;
        }

        (rates, limited)
    }
}
