//! Locomotion control module
//!
//! Converts the body velocity reference into wheel rate demands for the two
//! drive wheels of the differential base.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;
mod calc_skid_steer;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of drive wheels on the base.
pub const NUM_WHEELS: usize = 2;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Side of the base a wheel is mounted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    Left,
    Right
}

impl Side {
    /// Both sides in index order.
    pub const ALL: [Side; NUM_WHEELS] = [Side::Left, Side::Right];

    /// Index of this side into per-wheel arrays.
    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1
        }
    }
}
