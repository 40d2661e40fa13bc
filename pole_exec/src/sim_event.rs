//! # Simulation event processor
//!
//! Executes the timed events of a scenario script against the simulated plant
//! and the controller.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;
use serde::Deserialize;

use pole_lib::{controller::Controller, hal::sim::SimPlant};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An event in a scenario script.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum SimEvent {
    /// Set the walking speed and turn rate of the target.
    TargetVel {
        speed_ms: f64,
        turn_rate_rads: f64
    },

    /// Teleport the target relative to the robot.
    TargetJump {
        distance_m: f64,
        bearing_deg: f64
    },

    /// Stop the given sensors from producing readings.
    SensorDropout {
        #[serde(default)]
        range: bool,

        #[serde(default)]
        bearing: bool
    },

    /// Bring every sensor back.
    SensorRestore,

    /// Turn bias learning back on from zero bias.
    ReenableBias
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Availability of the simulated sensors.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorLink {
    pub range_dropout: bool,
    pub bearing_dropout: bool
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a single scenario event.
pub fn exec(
    event: &SimEvent,
    plant: &mut SimPlant,
    link: &mut SensorLink,
    ctrl: &mut Controller
) {
    info!("Executing event: {:?}", event);

    match *event {
        SimEvent::TargetVel { speed_ms, turn_rate_rads } => {
            plant.set_target_velocity(speed_ms, turn_rate_rads)
        },
        SimEvent::TargetJump { distance_m, bearing_deg } => {
            plant.place_target(distance_m, bearing_deg)
        },
        SimEvent::SensorDropout { range, bearing } => {
            link.range_dropout |= range;
            link.bearing_dropout |= bearing;
        },
        SimEvent::SensorRestore => *link = SensorLink::default(),
        SimEvent::ReenableBias => ctrl.enable_bias_learning()
    }
}
