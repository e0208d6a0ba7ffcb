//! # Geometry utilities
//!
//! Small vector and quaternion helpers shared by the path smoother and the drive controller.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{UnitQuaternion, Vector3};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Threshold under which a vector is considered to have no direction.
pub const DIRECTION_EPSILON: f64 = 1e-12;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// The vehicle's forward axis in its own body frame.
pub fn forward_axis() -> Vector3<f64> {
    Vector3::x()
}

/// Compute the accumulated distance (arc length) to each point along the path.
///
/// The first element is always zero and the last is the total length of the path. An empty path
/// gives an empty table.
pub fn accumulated_distances(points: &[Vector3<f64>]) -> Vec<f64> {
    let mut dists = Vec::with_capacity(points.len());

    if points.is_empty() {
        return dists;
    }

    dists.push(0.0);
    for pair in points.windows(2) {
        let prev = dists[dists.len() - 1];
        dists.push(prev + (pair[1] - pair[0]).norm());
    }

    dists
}

/// Linearly interpolate between `a` and `b`, with `frac = 0` giving `a` and `frac = 1` giving `b`.
pub fn lerp(a: &Vector3<f64>, b: &Vector3<f64>, frac: f64) -> Vector3<f64> {
    a + (b - a) * frac
}

/// The Gaussian kernel weight between two sample times with bandwidth `sigma`.
pub fn gaussian_weight(t0: f64, t1: f64, sigma: f64) -> f64 {
    (-(t0 - t1).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Return the shortest-arc rotation taking the direction of `from` onto the direction of `to`.
///
/// If either vector has no direction the identity is returned. Anti-parallel vectors have no
/// unique shortest arc, in that case a half turn about Z+ is used since a ground vehicle turns
/// about its vertical axis.
pub fn shortest_arc(from: &Vector3<f64>, to: &Vector3<f64>) -> UnitQuaternion<f64> {
    if from.norm() < DIRECTION_EPSILON || to.norm() < DIRECTION_EPSILON {
        return UnitQuaternion::identity();
    }

    match UnitQuaternion::rotation_between(from, to) {
        Some(q) => q,
        None => UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::PI),
    }
}

/// Unit vector pointing from `from` to `to`, or `None` if the points coincide.
pub fn direction(from: &Vector3<f64>, to: &Vector3<f64>) -> Option<Vector3<f64>> {
    (to - from).try_normalize(DIRECTION_EPSILON)
}
