//! # Wheel control module
//!
//! Inner loop rate control of the two drive wheels. Each wheel is driven by
//! a feed-forward on its rate demand plus a PID correction on the measured
//! rate error plus the learned bias, saturated to the maximum duty.
//!
//! Two anti-windup schemes act on the integral:
//! - conditional integration, which undoes the cycle's accumulation when the
//!   command is saturated in the direction the error is pushing,
//! - back-calculation, which bleeds off the integral in proportion to how far
//!   the command was saturated.
//!
//! All commands here are in each wheel's own frame, positive driving the
//! base forwards. Hardware polarity is applied when the command is written
//! to the motor.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod encoder;
mod filter;
mod params;
mod pid;
mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use encoder::*;
pub use filter::*;
pub use params::*;
pub use pid::*;
pub use state::*;
