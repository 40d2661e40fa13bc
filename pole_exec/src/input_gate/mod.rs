//! # Sensor input gate
//!
//! The gate sits between the sensor parsers and the controller. Accepted
//! readings are clamped into the safe envelope, timestamped and written into
//! the shared [`Snapshot`] which the tick reads once per outer cycle.
//!
//! Readings which are not finite numbers are dropped. The previous value and
//! its timestamp are kept, so a sensor which only produces garbage will go
//! stale and stop the robot.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod shared;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;
use thiserror::Error;

// Internal
pub use params::*;
pub use shared::*;
use util::{maths::clamp, time::ms_since};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The latest navigation readings along with the time they were accepted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NavInput {
    /// Distance to the target, clamped into the gate's range.
    ///
    /// Units: meters
    pub distance_m: f64,

    /// Bearing of the target, positive to the left, zero dead ahead.
    ///
    /// Units: degrees
    pub bearing_deg: f64,

    /// Time the distance was last accepted, `None` if never received.
    ///
    /// Units: milliseconds
    pub distance_time_ms: Option<u32>,

    /// Time the bearing was last accepted, `None` if never received.
    ///
    /// Units: milliseconds
    pub bearing_time_ms: Option<u32>
}

/// Staleness of each of the inputs at a given time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Staleness {
    pub range: bool,
    pub bearing: bool
}

/// Validates readings and writes them into the shared snapshot.
#[derive(Debug, Clone, Default)]
pub struct InputGate {
    params: Params
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum GateError {
    #[error("Rejected a non-finite distance reading ({0})")]
    NonFiniteDistance(f64),

    #[error("Rejected a non-finite bearing reading ({0})")]
    NonFiniteBearing(f64)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for NavInput {
    fn default() -> Self {
        Self {
            distance_m: 0.8,
            bearing_deg: 0.0,
            distance_time_ms: None,
            bearing_time_ms: None
        }
    }
}

impl NavInput {
    /// Determine which inputs are stale at `now_ms`.
    ///
    /// An input is stale if it has never been received or if its age is
    /// strictly greater than its timeout.
    pub fn staleness(&self, now_ms: u32, params: &Params) -> Staleness {
        Staleness {
            range: is_older_than(self.distance_time_ms, now_ms, params.range_timeout_ms),
            bearing: is_older_than(self.bearing_time_ms, now_ms, params.bearing_timeout_ms)
        }
    }

    /// True if either input is stale.
    pub fn is_stale(&self, now_ms: u32, params: &Params) -> bool {
        let s = self.staleness(now_ms, params);
        s.range || s.bearing
    }
}

impl Staleness {
    pub fn any(&self) -> bool {
        self.range || self.bearing
    }
}

impl InputGate {
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Accept a new distance reading.
    ///
    /// On success returns the value actually stored after clamping.
    pub fn submit_distance(
        &self,
        shared: &Snapshot<NavInput>,
        distance_m: f64,
        now_ms: u32
    ) -> Result<f64, GateError> {
        if !distance_m.is_finite() {
            trace!("Dropping distance reading {}", distance_m);
            return Err(GateError::NonFiniteDistance(distance_m))
        }

        let clamped = clamp(
            &distance_m,
            &self.params.distance_min_m,
            &self.params.distance_max_m
        );

        shared.modify(|input| {
            input.distance_m = clamped;
            input.distance_time_ms = Some(now_ms);
        });

        Ok(clamped)
    }

    /// Accept a new bearing reading. The bearing is stored as given.
    pub fn submit_bearing(
        &self,
        shared: &Snapshot<NavInput>,
        bearing_deg: f64,
        now_ms: u32
    ) -> Result<f64, GateError> {
        if !bearing_deg.is_finite() {
            trace!("Dropping bearing reading {}", bearing_deg);
            return Err(GateError::NonFiniteBearing(bearing_deg))
        }

        shared.modify(|input| {
            input.bearing_deg = bearing_deg;
            input.bearing_time_ms = Some(now_ms);
        });

        Ok(bearing_deg)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Ages are taken on the wrapping clock. A reading stamped no more than
/// `timeout_ms` after `now_ms` (the sensor context preempting the tick) is
/// fresh, anything further ahead is an old reading seen across the wrap.
fn is_older_than(stamp_ms: Option<u32>, now_ms: u32, timeout_ms: u32) -> bool {
    match stamp_ms {
        Some(t) => {
            ms_since(now_ms, t) > timeout_ms && ms_since(t, now_ms) > timeout_ms
        },
        None => true
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_distance_clamped() {
        let gate = InputGate::default();
        let shared = Snapshot::new(NavInput::default());

        assert_eq!(gate.submit_distance(&shared, 0.05, 10), Ok(0.1));
        assert_eq!(shared.read().distance_m, 0.1);
        assert_eq!(gate.submit_distance(&shared, 5.0, 20), Ok(2.0));
        assert_eq!(gate.submit_distance(&shared, 0.75, 30), Ok(0.75));

        let input = shared.read();
        assert_eq!(input.distance_m, 0.75);
        assert_eq!(input.distance_time_ms, Some(30));
    }

    #[test]
    fn test_bearing_verbatim() {
        let gate = InputGate::default();
        let shared = Snapshot::new(NavInput::default());

        assert_eq!(gate.submit_bearing(&shared, -135.0, 5), Ok(-135.0));
        assert_eq!(shared.read().bearing_deg, -135.0);
    }

    #[test]
    fn test_malformed_dropped() {
        let gate = InputGate::default();
        let shared = Snapshot::new(NavInput::default());

        gate.submit_distance(&shared, 1.0, 100).unwrap();
        gate.submit_bearing(&shared, 12.0, 100).unwrap();

        assert!(gate.submit_distance(&shared, f64::NAN, 150).is_err());
        assert_eq!(
            gate.submit_bearing(&shared, f64::INFINITY, 150),
            Err(GateError::NonFiniteBearing(f64::INFINITY))
        );

        let input = shared.read();
        assert_eq!(input.distance_m, 1.0);
        assert_eq!(input.distance_time_ms, Some(100));
        assert_eq!(input.bearing_deg, 12.0);
        assert_eq!(input.bearing_time_ms, Some(100));

        // Nothing new arrives so the old values go stale
        let params = Params::default();
        assert!(!input.is_stale(300, &params));
        assert!(input.staleness(301, &params).range);
        assert!(!input.staleness(301, &params).bearing);
    }

    #[test]
    fn test_staleness() {
        let params = Params::default();
        let mut input = NavInput::default();

        // Never received
        assert!(input.is_stale(0, &params));

        input.distance_time_ms = Some(1000);
        input.bearing_time_ms = Some(1000);

        assert!(!input.is_stale(1200, &params));
        assert_eq!(
            input.staleness(1201, &params),
            Staleness { range: true, bearing: false }
        );
        assert!(input.staleness(1301, &params).bearing);

        // Readings stamped just after the tick's time are fresh
        assert!(!input.is_stale(995, &params));
    }

    #[test]
    fn test_staleness_across_wrap() {
        let params = Params::default();
        let input = NavInput {
            distance_time_ms: Some(u32::MAX - 50),
            bearing_time_ms: Some(u32::MAX - 50),
            ..NavInput::default()
        };

        assert!(!input.is_stale(100, &params));
        assert!(input.staleness(150, &params).range);
    }

    #[test]
    fn test_staleness_very_old_reading() {
        let params = Params::default();
        let input = NavInput {
            distance_time_ms: Some(0),
            bearing_time_ms: Some(0),
            ..NavInput::default()
        };

        // Older than half the clock range
        assert!(input.is_stale((1 << 31) + 1000, &params));
        assert_eq!(
            input.staleness(u32::MAX - 1000, &params),
            Staleness { range: true, bearing: true }
        );

        // Only a small skew ahead of the tick counts as fresh
        assert!(!input.is_stale(u32::MAX - 100, &params));
        assert!(input.staleness(u32::MAX - 250, &params).range);
    }
}
