//! # PWM output shaper
//!
//! Turns the signed drive commands of the wheel controller into the duty and
//! direction pin of each motor driver channel.
//!
//! In order the shaper applies the motor polarity, snaps small commands up
//! to the minimum duty, applies a hysteretic deadband, saturates to the
//! maximum duty and, just after boot, caps the duty for a soft start.

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
