//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value into `[min, max]`.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Clamp a value into `[-limit, limit]`.
pub fn clamp_abs<T>(value: T, limit: T) -> T
where
    T: Float
{
    clamp(&value, &-limit, &limit)
}

/// Limit the change from `prev` to `target` to at most `max_step` in either
/// direction.
pub fn slew_rate_limit<T>(target: T, prev: T, max_step: T) -> T
where
    T: Float
{
    prev + clamp_abs(target - prev, max_step)
}

/// Smoothing factor of a first order low pass filter with time constant `tau`
/// sampled every `dt`.
///
/// A non-positive time constant disables the filter (factor of 1).
pub fn lowpass_alpha<T>(tau: T, dt: T) -> T
where
    T: Float
{
    if tau <= T::zero() {
        T::one()
    }
    else {
        dt / (tau + dt)
    }
}
