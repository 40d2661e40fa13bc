//! # Adaptive bias learner
//!
//! Learns a constant drive bias for each wheel which cancels the mismatch
//! between the two motors. While the base is commanded to drive straight the
//! difference between the measured and demanded rate differential is
//! averaged, and once it grows large enough the biases are nudged to push the
//! slow wheel harder and the fast wheel less.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;
