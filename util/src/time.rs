//! General time utility functions
//!
//! Controller time is a free-running millisecond counter which wraps at
//! `u32::MAX`, so all differences must be taken with the helpers here rather
//! than plain subtraction.

use chrono;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Number of milliseconds in a second
pub const MILLIS_PER_SECOND: f64 = 1000.0;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Milliseconds elapsed between `then_ms` and `now_ms` on a wrapping clock.
pub fn ms_since(now_ms: u32, then_ms: u32) -> u32 {
    now_ms.wrapping_sub(then_ms)
}

/// Signed difference `now_ms - then_ms` on a wrapping clock.
///
/// Negative if `now_ms` is behind `then_ms`, which indicates a clock fault
/// rather than a wrap.
pub fn signed_ms_since(now_ms: u32, then_ms: u32) -> i32 {
    now_ms.wrapping_sub(then_ms) as i32
}

/// Convert milliseconds into seconds.
pub fn ms_to_s(ms: i32) -> f64 {
    ms as f64 / MILLIS_PER_SECOND
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ms_since_wraps() {
        assert_eq!(ms_since(10, 5), 5);
        assert_eq!(ms_since(4, u32::MAX - 5), 10);
        assert_eq!(signed_ms_since(5, 10), -5);
        assert_eq!(signed_ms_since(4, u32::MAX - 5), 10);
    }

    #[test]
    fn test_ms_to_s() {
        assert_eq!(ms_to_s(10), 0.01);
        assert_eq!(ms_to_s(-500), -0.5);
    }
}
