//! # Pole follower library.
//!
//! This library holds the motion controller of the pole follower, so that the
//! executable, the benchmarks and other crates in the workspace can all run
//! the same tick.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// Sensor input gate - validates, clamps and timestamps the range and bearing
pub mod input_gate;

/// Navigation control - the outer loop curvature planner
pub mod nav_ctrl;

/// Safety supervisor - emergency stop with hysteretic release
pub mod safety;

/// Locomotion control - mixes the body velocity into wheel rates
pub mod loco_ctrl;

/// Wheel control - the inner loop wheel rate controllers and encoder estimators
pub mod wheel_ctrl;

/// Bias learner - learns the drive imbalance between the two wheels
pub mod bias;

/// PWM shaper - turns wheel commands into motor driver outputs
pub mod pwm;

/// Hardware abstraction - motor driver and encoder traits, plus the simulated plant
pub mod hal;

/// Controller - owns the modules and runs the dual rate tick
pub mod controller;

/// Executable parameters
pub mod params;
