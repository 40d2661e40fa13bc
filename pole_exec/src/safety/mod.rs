//! # Safety supervisor module
//!
//! The supervisor runs after the planner on every outer cycle and may override
//! its references. It owns the emergency stop state, which is entered
//! immediately on a hard violation, or after a soft violation has persisted,
//! and is only left after a minimum dwell with the target back inside the
//! nominal envelope. On release the references are ramped back in.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Reason the emergency stop was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopCause {
    /// The range or bearing reading timed out.
    StaleInput,

    /// The target came within the hard minimum distance.
    TooClose,

    /// The bearing exceeded the hard limit.
    HardAngle,

    /// The bearing exceeded the soft limit for too long.
    SustainedLargeAngle
}
