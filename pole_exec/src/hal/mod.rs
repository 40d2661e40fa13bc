//! # Hardware abstraction
//!
//! The controller only talks to the motors and encoders through the traits
//! in this module, so the same tick runs against the real drivers or the
//! simulated plant.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod sim;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use crate::loco_ctrl::NUM_WHEELS;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Level of a motor driver direction pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PinState {
    Set,
    Reset
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The command written to one motor driver channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MotorOutput {
    /// Compare value of the PWM channel.
    ///
    /// Units: timer ticks
    pub duty_ticks: u32,

    /// Direction pin, `Set` for a non-negative command.
    pub dir: PinState
}

impl MotorOutput {
    /// Zero duty with the direction pin reset.
    pub fn stopped() -> Self {
        Self {
            duty_ticks: 0,
            dir: PinState::Reset
        }
    }

    /// Duty with the sign given by the direction pin.
    pub fn signed_duty(&self) -> f64 {
        match self.dir {
            PinState::Set => self.duty_ticks as f64,
            PinState::Reset => -(self.duty_ticks as f64)
        }
    }
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Writes duty and direction to the motor driver channels.
pub trait MotorDriver {
    /// Write the outputs of both channels, in wheel index order.
    fn write(&mut self, outputs: &[MotorOutput; NUM_WHEELS]);
}

/// Reads the free-running quadrature counters of the wheel encoders.
pub trait EncoderReader {
    /// Current counter values, in wheel index order.
    fn read_counts(&mut self) -> [i32; NUM_WHEELS];
}

/// Everything the tick needs from the hardware.
pub trait Hardware: MotorDriver + EncoderReader {}

impl<T: MotorDriver + EncoderReader> Hardware for T {}
