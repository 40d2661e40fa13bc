//! # Simulated plant
//!
//! A differential drive base with first order motors and quadrature
//! encoders, chasing a target which moves as a unicycle. Stands in for the
//! hardware when running the controller on the desktop.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

// Internal
use super::{EncoderReader, MotorDriver, MotorOutput};
use crate::loco_ctrl::{Side, NUM_WHEELS};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the simulated plant.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlantParams {
    /// Units: meters
    pub wheel_radius_m: f64,

    /// Units: meters
    pub track_width_m: f64,

    /// Encoder counts per wheel revolution after quadrature decoding.
    pub counts_per_rev: f64,

    /// Steady state wheel rate per tick of duty above the stall duty, for
    /// each motor. Unequal values model mismatched motors.
    ///
    /// Units: radians/second/tick
    pub rate_per_tick_rads: [f64; NUM_WHEELS],

    /// Duty below which the motors do not turn. The controller's minimum
    /// duty and feed-forward offset are matched to this.
    ///
    /// Units: timer ticks
    pub stall_ticks: f64,

    /// Time constant of the motor response.
    ///
    /// Units: seconds
    pub motor_time_constant_s: f64,

    /// Motors which turn their wheel backwards for a `Set` direction pin.
    pub invert_motor: [bool; NUM_WHEELS],

    /// Resolution of the range sensor.
    ///
    /// Units: meters
    pub distance_resolution_m: f64,

    /// Resolution of the bearing sensor.
    ///
    /// Units: degrees
    pub bearing_resolution_deg: f64,

    /// Units: meters
    pub initial_target_distance_m: f64,

    /// Units: degrees
    pub initial_target_bearing_deg: f64
}

/// A position and heading in the plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Pose2D {
    pub x_m: f64,
    pub y_m: f64,

    /// Heading, anticlockwise from the x axis.
    pub heading_rad: f64
}

/// The simulated plant.
#[derive(Debug, Clone)]
pub struct SimPlant {
    params: PlantParams,

    /// Last outputs written by the controller.
    outputs: [MotorOutput; NUM_WHEELS],

    /// Units: radians/second
    wheel_rate_rads: [f64; NUM_WHEELS],

    /// Accumulated encoder counts, kept fractional so slow wheels still count.
    counts: [f64; NUM_WHEELS],

    robot: Pose2D,
    target: Pose2D,

    /// Units: meters/second
    target_speed_ms: f64,

    /// Units: radians/second
    target_turn_rate_rads: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for PlantParams {
    fn default() -> Self {
        Self {
            wheel_radius_m: 0.0575,
            track_width_m: 0.257,
            counts_per_rev: 2800.0,
            rate_per_tick_rads: [0.1, 0.095],
            stall_ticks: 70.0,
            motor_time_constant_s: 0.08,
            invert_motor: [false, true],
            distance_resolution_m: 0.01,
            bearing_resolution_deg: 1.0,
            initial_target_distance_m: 0.8,
            initial_target_bearing_deg: 0.0
        }
    }
}

impl SimPlant {
    pub fn new(params: PlantParams) -> Self {
        let mut plant = Self {
            outputs: [MotorOutput::stopped(); NUM_WHEELS],
            wheel_rate_rads: [0.0; NUM_WHEELS],
            counts: [0.0; NUM_WHEELS],
            robot: Pose2D::default(),
            target: Pose2D::default(),
            target_speed_ms: 0.0,
            target_turn_rate_rads: 0.0,
            params
        };

        plant.place_target(
            plant.params.initial_target_distance_m,
            plant.params.initial_target_bearing_deg
        );

        plant
    }

    /// Move the target to a position relative to the robot. The target is
    /// left facing the same way as the robot.
    pub fn place_target(&mut self, distance_m: f64, bearing_deg: f64) {
        let angle = self.robot.heading_rad + bearing_deg.to_radians();

        self.target = Pose2D {
            x_m: self.robot.x_m + distance_m * angle.cos(),
            y_m: self.robot.y_m + distance_m * angle.sin(),
            heading_rad: self.robot.heading_rad
        };
    }

    /// Set the speed and turn rate the target walks with.
    pub fn set_target_velocity(&mut self, speed_ms: f64, turn_rate_rads: f64) {
        self.target_speed_ms = speed_ms;
        self.target_turn_rate_rads = turn_rate_rads;
    }

    /// Advance the plant by `dt_s`.
    pub fn step(&mut self, dt_s: f64) {
        let alpha = if self.params.motor_time_constant_s > 0.0 {
            1.0 - (-dt_s / self.params.motor_time_constant_s).exp()
        }
        else {
            1.0
        };

        // ---- MOTORS AND ENCODERS ----

        for i in 0..NUM_WHEELS {
            let mut drive = self.outputs[i].signed_duty();
            if self.params.invert_motor[i] {
                drive = -drive;
            }

            let steady_rate = drive.signum()
                * (drive.abs() - self.params.stall_ticks).max(0.0)
                * self.params.rate_per_tick_rads[i];
            self.wheel_rate_rads[i] += alpha * (steady_rate - self.wheel_rate_rads[i]);

            self.counts[i] += self.wheel_rate_rads[i] * dt_s * self.params.counts_per_rev / TAU;
        }

        // ---- ROBOT ----

        let rim_l = self.wheel_rate_rads[Side::Left.index()] * self.params.wheel_radius_m;
        let rim_r = self.wheel_rate_rads[Side::Right.index()] * self.params.wheel_radius_m;
        let v_ms = 0.5 * (rim_l + rim_r);
        let w_rads = (rim_r - rim_l) / self.params.track_width_m;

        integrate_unicycle(&mut self.robot, v_ms, w_rads, dt_s);

        // ---- TARGET ----

        integrate_unicycle(
            &mut self.target,
            self.target_speed_ms,
            self.target_turn_rate_rads,
            dt_s
        );
    }

    /// True distance from the robot to the target.
    pub fn true_distance_m(&self) -> f64 {
        (self.target.x_m - self.robot.x_m).hypot(self.target.y_m - self.robot.y_m)
    }

    /// True bearing of the target from the robot's heading, positive to the
    /// left, in the range [-180, 180).
    pub fn true_bearing_deg(&self) -> f64 {
        let abs_angle = (self.target.y_m - self.robot.y_m)
            .atan2(self.target.x_m - self.robot.x_m);

        wrap_pi(abs_angle - self.robot.heading_rad).to_degrees()
    }

    /// Distance as reported by the range sensor.
    pub fn measure_distance_m(&self) -> f64 {
        quantise(self.true_distance_m(), self.params.distance_resolution_m)
    }

    /// Bearing as reported by the bearing sensor.
    pub fn measure_bearing_deg(&self) -> f64 {
        quantise(self.true_bearing_deg(), self.params.bearing_resolution_deg)
    }

    pub fn robot(&self) -> Pose2D {
        self.robot
    }

    pub fn target(&self) -> Pose2D {
        self.target
    }

    pub fn wheel_rate_rads(&self) -> [f64; NUM_WHEELS] {
        self.wheel_rate_rads
    }

    pub fn outputs(&self) -> [MotorOutput; NUM_WHEELS] {
        self.outputs
    }
}

impl MotorDriver for SimPlant {
    fn write(&mut self, outputs: &[MotorOutput; NUM_WHEELS]) {
        self.outputs = *outputs;
    }
}

impl EncoderReader for SimPlant {
    fn read_counts(&mut self) -> [i32; NUM_WHEELS] {
        // Hardware counters are 32 bit and wrap
        let mut counts = [0i32; NUM_WHEELS];
        for i in 0..NUM_WHEELS {
            counts[i] = self.counts[i].round() as i64 as i32;
        }
        counts
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn integrate_unicycle(pose: &mut Pose2D, v_ms: f64, w_rads: f64, dt_s: f64) {
    // Midpoint heading keeps arcs closed over many steps
    let mid_heading = pose.heading_rad + 0.5 * w_rads * dt_s;

    pose.x_m += v_ms * dt_s * mid_heading.cos();
    pose.y_m += v_ms * dt_s * mid_heading.sin();
    pose.heading_rad = wrap_pi(pose.heading_rad + w_rads * dt_s);
}

/// Wrap an angle into [-pi, pi).
fn wrap_pi(angle_rad: f64) -> f64 {
    (angle_rad + PI).rem_euclid(TAU) - PI
}

fn quantise(value: f64, resolution: f64) -> f64 {
    if resolution > 0.0 {
        (value / resolution).round() * resolution
    }
    else {
        value
    }
}
