//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value into the range `[min, max]`.
///
/// Unlike `f64::clamp` this will not panic if `min > max`, in which case `min` wins. Callers
/// building limits from live parameters rely on this.
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

/// Clamp a value into the symmetric range `[-limit, limit]`.
pub fn abs_clamp<T>(value: T, limit: T) -> T
where
    T: Float
{
    clamp(&value, &-limit, &limit)
}

/// Convert an angle or rate in radians into degrees, using `value / pi * 180`.
pub fn rad_to_deg<T>(value: T) -> T
where
    T: Float
{
    let pi_t: T = T::from(std::f64::consts::PI).unwrap_or_else(T::nan);
    let half_turn: T = T::from(180.0).unwrap_or_else(T::nan);

    value / pi_t * half_turn
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
/// 
/// This function is taken from the std library as num is missing it.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Wrap an angle into the range `[-pi, pi)`.
pub fn wrap_pi<T>(value: T) -> T
where
    T: Float
{
    let pi_t: T = T::from(std::f64::consts::PI).unwrap_or_else(T::nan);
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap_or_else(T::nan);

    rem_euclid(value + pi_t, tau_t) - pi_t
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(&2.0, &-1.0, &1.0), 1.0);
        assert_eq!(clamp(&-2.0, &-1.0, &1.0), -1.0);
        assert_eq!(clamp(&0.5, &-1.0, &1.0), 0.5);

        // Inverted range, min wins
        assert_eq!(clamp(&0.5, &1.0, &0.0), 1.0);

        assert_eq!(abs_clamp(3.0, 2.5), 2.5);
        assert_eq!(abs_clamp(-3.0, 2.5), -2.5);
    }

    #[test]
    fn test_rad_to_deg() {
        const PI: f64 = std::f64::consts::PI;

        assert!((rad_to_deg(PI) - 180.0).abs() < 1e-12);
        assert!((rad_to_deg(-PI / 2.0) + 90.0).abs() < 1e-12);
    }

    #[test]
    fn test_wrap_pi() {
        const PI: f64 = std::f64::consts::PI;
        const TAU: f64 = std::f64::consts::TAU;

        assert!((wrap_pi(0.5) - 0.5).abs() < 1e-12);
        assert!((wrap_pi(0.5 + TAU) - 0.5).abs() < 1e-12);
        assert!((wrap_pi(-0.5 - 2.0 * TAU) + 0.5).abs() < 1e-12);
        assert!((wrap_pi(PI + 0.25) - (-PI + 0.25)).abs() < 1e-12);
    }
}
