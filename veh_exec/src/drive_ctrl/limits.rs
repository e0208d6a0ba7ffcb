//! Twist saturation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::warn;

use super::{DriveConfig, MotionParams};
use comms_if::eqpt::drive::Twist;
use util::maths::abs_clamp;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Clamp a twist to the unlimited maxima of the drive base.
///
/// Non-finite components are replaced by zero.
pub fn clamp_unlimited(cmd: &Twist, motion: &MotionParams) -> Twist {
    Twist::new(
        abs_clamp(finite_or_zero(cmd.linear_x), motion.max_unlimited_speed_ms),
        abs_clamp(
            finite_or_zero(cmd.angular_z),
            motion.max_unlimited_angular_rate_rads,
        ),
    )
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        warn!("Non-finite twist component {} replaced by 0", value);
        0.0
    }
}

/// The maximum speed allowed at the given angular rate.
///
/// The envelope starts at `max_controller_speed_ms` when going straight and decreases linearly
/// with the magnitude of the rate, reaching zero at
/// `max_controller_angular_rate_rads / speed_reduction_gain`. It is never negative and never
/// above `max_speed_ms`.
pub fn speed_envelope(
    angular_rate_rads: f64,
    max_speed_ms: f64,
    motion: &MotionParams,
    speed_reduction_gain: f64,
) -> f64 {
    let slope = -motion.max_controller_speed_ms / motion.max_controller_angular_rate_rads;
    let envelope =
        slope * angular_rate_rads.abs() * speed_reduction_gain + motion.max_controller_speed_ms;

    envelope.max(0.0).min(max_speed_ms)
}

/// Saturate a twist.
///
/// The twist is first clamped to the unlimited maxima, zeroing any non-finite component. The speed is then limited by the
/// [`speed_envelope`] of the resulting angular rate, and the angular rate is limited to
/// `max_angular_rate_rads`.
pub fn limit_twist(
    cmd: &Twist,
    max_speed_ms: f64,
    max_angular_rate_rads: f64,
    config: &DriveConfig,
) -> Twist {
    let unlimited = clamp_unlimited(cmd, &config.motion);

    let envelope = speed_envelope(
        unlimited.angular_z,
        max_speed_ms,
        &config.motion,
        config.gains.speed_reduction_gain,
    );

    Twist::new(
        abs_clamp(unlimited.linear_x, envelope),
        abs_clamp(unlimited.angular_z, max_angular_rate_rads),
    )
}
