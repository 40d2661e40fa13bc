//! # Navigation control module
//!
//! Navigation control is the outer loop planner. It turns the distance and
//! bearing to the target into a linear and angular velocity demand for the
//! base. The linear demand comes from a per-band distance controller, the
//! angular demand from the curvature of the arc which passes through the
//! target.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod mode;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

pub use mode::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Body velocity demand of the base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct VelocityReference {
    /// Linear velocity, positive forwards.
    ///
    /// Units: meters/second
    pub v_ms: f64,

    /// Angular velocity, positive to the left.
    ///
    /// Units: radians/second
    pub w_rads: f64
}

impl VelocityReference {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Scale both components by the same factor.
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            v_ms: self.v_ms * factor,
            w_rads: self.w_rads * factor
        }
    }
}
