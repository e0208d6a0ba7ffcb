//! Path smoother state and processing

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, log_enabled, Level};
use nalgebra::{UnitQuaternion, Vector3};
use serde::Serialize;

// Internal
use super::*;
use crate::geom::{self, accumulated_distances, forward_axis, gaussian_weight, shortest_arc};
use comms_if::tc::path::{PathRequest, PathResponse};
use util::params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The path smoother.
///
/// Holds no state between calls apart from its parameters, so a single instance can serve any
/// number of requests.
#[derive(Debug, Clone)]
pub struct PathSmoother {
    params: PathSmootherParams,
}

/// A point of the resampled path.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sample {
    /// Virtual time of the sample, i.e. the arc length along the original path.
    ///
    /// Units: meters
    pub t_m: f64,

    /// Position of the sample on the original path.
    pub position_m: Vector3<f64>,
}

/// A smoothed trajectory.
#[derive(Debug, Clone, Serialize)]
pub struct SmoothedPath {
    /// Smoothed positions, the first and last of which are the original end waypoints.
    pub positions_m: Vec<Vector3<f64>>,

    /// Orientation at each position.
    pub orientations: Vec<UnitQuaternion<f64>>,

    /// True if the path should be traversed facing backwards.
    pub reverse: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PathSmoother {
    /// Create a new smoother from the given parameters.
    pub fn new(params: PathSmootherParams) -> Result<Self, PathSmootherError> {
        params.validate()?;

        Ok(Self { params })
    }

    /// Create a new smoother, loading the parameters from the given file relative to the
    /// parameters directory.
    pub fn init(params_path: &str) -> Result<Self, PathSmootherError> {
        let params: PathSmootherParams =
            params::load(params_path).map_err(PathSmootherError::ParamLoadError)?;

        Self::new(params)
    }

    pub fn params(&self) -> &PathSmootherParams {
        &self.params
    }

    /// Smooth the given waypoint path.
    ///
    /// The first and last orientations of the output are exactly `start_orientation` and
    /// `end_orientation`. If `forbid_reverse` is set the path is never traversed backwards,
    /// otherwise that is decided by [`PathSmoother::detect_reverse`] when the parameters allow it.
    pub fn smooth(
        &self,
        path: &[Vector3<f64>],
        start_orientation: &UnitQuaternion<f64>,
        end_orientation: &UnitQuaternion<f64>,
        forbid_reverse: bool,
    ) -> Result<SmoothedPath, PathSmootherError> {
        validate_path(path)?;

        let dists = accumulated_distances(path);
        let total_m = match dists.last() {
            Some(&d) => d,
            None => return Err(PathSmootherError::NotEnoughPoints(path.len())),
        };

        if total_m <= MIN_PATH_LENGTH_M {
            return Err(PathSmootherError::ZeroLengthPath);
        }

        let samples = resample(&dists, path, self.params.discretisation_m);
        let positions_m = smooth_positions(&samples, path, self.params.smoothness_m);

        debug!(
            "Smoothing path of {} points and {:.3} m into {} samples",
            path.len(),
            total_m,
            samples.len()
        );

        let reverse = if self.params.allow_reverse_paths && !forbid_reverse {
            self.detect_reverse(total_m, &positions_m, start_orientation, end_orientation)
        } else {
            false
        };

        let orientations =
            compute_orientations(&positions_m, start_orientation, end_orientation, reverse);

        let smoothed = SmoothedPath {
            positions_m,
            orientations,
            reverse,
        };

        if log_enabled!(Level::Debug) {
            let headings = smoothed.headings();
            debug!(
                "Smoothed path headings: start {:.3} rad, end {:.3} rad, range [{:.3}, {:.3}] rad",
                headings[0],
                headings[headings.len() - 1],
                headings.iter().cloned().fold(std::f64::INFINITY, f64::min),
                headings.iter().cloned().fold(std::f64::NEG_INFINITY, f64::max)
            );
        }

        Ok(smoothed)
    }

    /// Smooth the path described by a request message.
    pub fn smooth_request(&self, request: &PathRequest) -> Result<PathResponse, PathSmootherError> {
        self.smooth(
            &request.points_m,
            &request.start_orientation,
            &request.end_orientation,
            request.forbid_reverse,
        )
        .map(SmoothedPath::into_response)
    }

    /// Decide whether the vehicle is already facing backwards along a short path.
    ///
    /// The path is reversed if it is shorter than [`REVERSE_MAX_LENGTH_M`] and the vehicle's
    /// forward axis points against the direction of travel at both the start and the end.
    pub fn detect_reverse(
        &self,
        total_m: f64,
        positions_m: &[Vector3<f64>],
        start_orientation: &UnitQuaternion<f64>,
        end_orientation: &UnitQuaternion<f64>,
    ) -> bool {
        let n = positions_m.len();
        if n < 2 {
            return false;
        }

        let forward = forward_axis();

        // Direction of travel at each end, reversed. A degenerate end has no direction and can't
        // vote for reversing.
        let start_proj = match geom::direction(&positions_m[1], &positions_m[0]) {
            Some(d) => d.dot(&(start_orientation * forward)),
            None => return false,
        };
        let end_proj = match geom::direction(&positions_m[n - 1], &positions_m[n - 2]) {
            Some(d) => d.dot(&(end_orientation * forward)),
            None => return false,
        };

        debug!(
            "Reverse check: length {:.3} m, start projection {:.3}, end projection {:.3}",
            total_m, start_proj, end_proj
        );

        let dist_ok = total_m < REVERSE_MAX_LENGTH_M;
        let reverse = dist_ok && start_proj > 0.0 && end_proj > 0.0;

        if reverse {
            info!(
                "Path will be traversed in reverse (dist = {}, start = {}, end = {})",
                dist_ok,
                start_proj > 0.0,
                end_proj > 0.0
            );
        }

        reverse
    }
}

impl SmoothedPath {
    pub fn len(&self) -> usize {
        self.positions_m.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions_m.is_empty()
    }

    /// Heading (yaw about Z+, angle to the +ve X axis) of each orientation, in radians.
    pub fn headings(&self) -> Vec<f64> {
        self.orientations.iter().map(|q| q.euler_angles().2).collect()
    }

    pub fn into_response(self) -> PathResponse {
        PathResponse {
            positions_m: self.positions_m,
            orientations: self.orientations,
            reverse: self.reverse,
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Resample the path every `step_m` along its arc length.
///
/// `dists` must be the accumulated distance table of `path`. The final sample is always the last
/// waypoint at the total length, whether or not it falls on a step.
pub fn resample(dists: &[f64], path: &[Vector3<f64>], step_m: f64) -> Vec<Sample> {
    let (total_m, last) = match (dists.last(), path.last()) {
        (Some(&d), Some(&p)) => (d, p),
        _ => return Vec::new(),
    };

    let mut samples = Vec::with_capacity((total_m / step_m) as usize + 2);

    // Index of the segment containing the current sample. Only ever moves forward, and may skip
    // several segments at once when they are shorter than the step.
    let mut seg = 0;
    let mut k = 0usize;

    loop {
        let t_m = k as f64 * step_m;
        if t_m >= total_m {
            break;
        }

        while seg + 2 < dists.len() && t_m > dists[seg + 1] {
            seg += 1;
        }

        let seg_len_m = dists[seg + 1] - dists[seg];
        let position_m = if seg_len_m > MIN_PATH_LENGTH_M {
            geom::lerp(&path[seg], &path[seg + 1], (t_m - dists[seg]) / seg_len_m)
        } else {
            path[seg]
        };

        samples.push(Sample { t_m, position_m });
        k += 1;
    }

    samples.push(Sample {
        t_m: total_m,
        position_m: last,
    });

    samples
}

/// Gaussian-smooth the interior samples.
///
/// Each interior output is the kernel-weighted average over *all* samples. The first and last
/// outputs are copied from the path's end waypoints.
pub fn smooth_positions(
    samples: &[Sample],
    path: &[Vector3<f64>],
    sigma_m: f64,
) -> Vec<Vector3<f64>> {
    let (first, last) = match (path.first(), path.last()) {
        (Some(&f), Some(&l)) => (f, l),
        _ => return Vec::new(),
    };

    let mut positions_m = Vec::with_capacity(samples.len());
    positions_m.push(first);

    for i in 1..samples.len().saturating_sub(1) {
        let t_i = samples[i].t_m;

        let mut weight_sum = 0.0;
        let mut p = Vector3::zeros();
        for s in samples {
            let w = gaussian_weight(t_i, s.t_m, sigma_m);
            weight_sum += w;
            p += s.position_m * w;
        }

        // The sample's own weight is 1 so the sum is never zero
        positions_m.push(p / weight_sum);
    }

    positions_m.push(last);

    positions_m
}

/// Orientation of every point of the smoothed path.
///
/// Interior points face along the forward difference of the positions, or against it when
/// reversing, so that the vehicle's forward axis points backwards along the path.
pub fn compute_orientations(
    positions_m: &[Vector3<f64>],
    start_orientation: &UnitQuaternion<f64>,
    end_orientation: &UnitQuaternion<f64>,
    reverse: bool,
) -> Vec<UnitQuaternion<f64>> {
    let n = positions_m.len();
    let forward = forward_axis();

    (0..n)
        .map(|i| {
            if i == 0 {
                *start_orientation
            } else if i == n - 1 {
                *end_orientation
            } else if reverse {
                shortest_arc(&forward, &(positions_m[i] - positions_m[i + 1]))
            } else {
                shortest_arc(&forward, &(positions_m[i + 1] - positions_m[i]))
            }
        })
        .collect()
}

/// Check the path has enough points and all of them are finite.
fn validate_path(path: &[Vector3<f64>]) -> Result<(), PathSmootherError> {
    if path.len() < 2 {
        return Err(PathSmootherError::NotEnoughPoints(path.len()));
    }

    if let Some(i) = path
        .iter()
        .position(|p| !p.iter().all(|c| c.is_finite()))
    {
        return Err(PathSmootherError::NonFinitePoint(i));
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn straight_path() -> Vec<Vector3<f64>> {
        vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
        ]
    }

    fn l_path() -> Vec<Vector3<f64>> {
        vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 0.7, 0.0),
            Vector3::new(1.8, 1.3, 0.2),
        ]
    }

    fn yaw(rad: f64) -> UnitQuaternion<f64> {
        UnitQuaternion::from_euler_angles(0.0, 0.0, rad)
    }

    #[test]
    fn test_resample_straight() {
        let path = straight_path();
        let dists = accumulated_distances(&path);
        let samples = resample(&dists, &path, 0.05);

        // 0.00 to 1.95 in steps, then the forced sample at 2.0
        assert_eq!(samples.len(), 41);
        assert_eq!(samples[0].t_m, 0.0);
        assert_eq!(samples[0].position_m, path[0]);
        assert_eq!(samples[40].t_m, 2.0);
        assert_eq!(samples[40].position_m, path[2]);

        for (k, s) in samples.iter().enumerate().take(40) {
            assert_relative_eq!(s.t_m, k as f64 * 0.05, epsilon = 1e-12);
            assert_relative_eq!(s.position_m.x, s.t_m, epsilon = 1e-12);
        }
        for pair in samples.windows(2) {
            assert!(pair[1].t_m > pair[0].t_m);
        }
    }

    #[test]
    fn test_resample_skips_short_segments() {
        // Ten 1 cm segments followed by a long one, several segments fit in each step
        let mut path: Vec<Vector3<f64>> = (0..=10)
            .map(|i| Vector3::new(i as f64 * 0.01, 0.0, 0.0))
            .collect();
        path.push(Vector3::new(0.1, 1.0, 0.0));

        let dists = accumulated_distances(&path);
        let samples = resample(&dists, &path, 0.05);

        assert_relative_eq!(samples[1].position_m, Vector3::new(0.05, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(samples[2].position_m, Vector3::new(0.1, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(samples[3].position_m, Vector3::new(0.1, 0.05, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_resample_duplicate_points() {
        let path = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.2, 0.0, 0.0),
            Vector3::new(0.2, 0.0, 0.0),
            Vector3::new(0.2, 0.2, 0.0),
        ];
        let dists = accumulated_distances(&path);
        let samples = resample(&dists, &path, 0.05);

        assert_eq!(samples.len(), 9);
        for s in samples.iter() {
            assert!(s.position_m.iter().all(|c| c.is_finite()));
        }
        assert_relative_eq!(samples[5].position_m, Vector3::new(0.2, 0.05, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_smooth_straight_example() {
        let smoother = PathSmoother::new(PathSmootherParams::new(false)).unwrap();
        let path = straight_path();
        let start = yaw(0.3);
        let end = yaw(-0.2);

        let smoothed = smoother.smooth(&path, &start, &end, false).unwrap();

        assert_eq!(smoothed.len(), 41);
        assert_eq!(smoothed.orientations.len(), 41);
        assert!(!smoothed.reverse);

        // Pinned ends
        assert_eq!(smoothed.positions_m[0], path[0]);
        assert_eq!(smoothed.positions_m[40], path[2]);
        assert_eq!(smoothed.orientations[0], start);
        assert_eq!(smoothed.orientations[40], end);

        // A straight line stays straight and the interior faces along it
        for p in smoothed.positions_m.iter() {
            assert_relative_eq!(p.y, 0.0, epsilon = 1e-12);
            assert_relative_eq!(p.z, 0.0, epsilon = 1e-12);
        }
        for q in smoothed.orientations[1..40].iter() {
            assert_relative_eq!(q.angle(), 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_smooth_short_path() {
        let smoother = PathSmoother::new(PathSmootherParams::new(true)).unwrap();
        let path = vec![Vector3::new(1.0, 1.0, 0.0), Vector3::new(1.03, 1.0, 0.0)];

        let smoothed = smoother
            .smooth(&path, &yaw(0.0), &yaw(0.1), false)
            .unwrap();

        assert_eq!(smoothed.positions_m, path);
        assert_eq!(smoothed.orientations, vec![yaw(0.0), yaw(0.1)]);
    }

    #[test]
    fn test_smooth_is_convex_combination() {
        let smoother = PathSmoother::new(PathSmootherParams::new(false)).unwrap();
        let path = l_path();
        let start = yaw(0.0);
        let end = yaw(0.6);

        let dists = accumulated_distances(&path);
        let samples = resample(&dists, &path, 0.05);
        let smoothed = smoother.smooth(&path, &start, &end, false).unwrap();

        assert_eq!(smoothed.len(), samples.len());
        assert_eq!(smoothed.positions_m[0], path[0]);
        assert_eq!(smoothed.positions_m[smoothed.len() - 1], path[3]);
        assert_eq!(smoothed.orientations[0], start);
        assert_eq!(smoothed.orientations[smoothed.len() - 1], end);

        for axis in 0..3 {
            let min = samples
                .iter()
                .map(|s| s.position_m[axis])
                .fold(std::f64::INFINITY, f64::min);
            let max = samples
                .iter()
                .map(|s| s.position_m[axis])
                .fold(std::f64::NEG_INFINITY, f64::max);

            for p in smoothed.positions_m.iter() {
                assert!(p[axis] >= min - 1e-12 && p[axis] <= max + 1e-12);
            }
        }

        // The corner gets rounded off
        let corner = smoothed
            .positions_m
            .iter()
            .map(|p| (p - path[1]).norm())
            .fold(std::f64::INFINITY, f64::min);
        assert!(corner > 0.01);
    }

    #[test]
    fn test_smooth_rejects_bad_paths() {
        let smoother = PathSmoother::new(PathSmootherParams::new(true)).unwrap();
        let q = UnitQuaternion::identity();

        assert!(matches!(
            smoother.smooth(&[Vector3::new(0.0, 0.0, 0.0)], &q, &q, false),
            Err(PathSmootherError::NotEnoughPoints(1))
        ));
        assert!(matches!(
            smoother.smooth(
                &[Vector3::new(1.0, 2.0, 0.0), Vector3::new(1.0, 2.0, 0.0)],
                &q,
                &q,
                false
            ),
            Err(PathSmootherError::ZeroLengthPath)
        ));
        assert!(matches!(
            smoother.smooth(
                &[Vector3::new(0.0, 0.0, 0.0), Vector3::new(std::f64::NAN, 0.0, 0.0)],
                &q,
                &q,
                false
            ),
            Err(PathSmootherError::NonFinitePoint(1))
        ));
    }

    #[test]
    fn test_reverse_detection() {
        let path = vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0)];
        let backwards = yaw(PI);

        let smoother = PathSmoother::new(PathSmootherParams::new(true)).unwrap();

        // Facing backwards at both ends of a short path
        let smoothed = smoother.smooth(&path, &backwards, &backwards, false).unwrap();
        assert!(smoothed.reverse);
        assert_eq!(smoothed.orientations[0], backwards);
        assert_eq!(smoothed.orientations[smoothed.len() - 1], backwards);
        for q in smoothed.orientations[1..smoothed.len() - 1].iter() {
            assert_relative_eq!(q * forward_axis(), -forward_axis(), epsilon = 1e-9);
        }

        // Forbidden for this call
        let smoothed = smoother.smooth(&path, &backwards, &backwards, true).unwrap();
        assert!(!smoothed.reverse);

        // Facing forwards
        let smoothed = smoother.smooth(&path, &yaw(0.0), &yaw(0.0), false).unwrap();
        assert!(!smoothed.reverse);

        // Only the start facing backwards
        let smoothed = smoother.smooth(&path, &backwards, &yaw(0.0), false).unwrap();
        assert!(!smoothed.reverse);

        // Sideways has no projection either way
        let smoothed = smoother
            .smooth(&path, &yaw(FRAC_PI_2), &yaw(FRAC_PI_2), false)
            .unwrap();
        assert!(!smoothed.reverse);

        // Too long
        let long_path = straight_path();
        let smoothed = smoother
            .smooth(&long_path, &backwards, &backwards, false)
            .unwrap();
        assert!(!smoothed.reverse);
    }

    #[test]
    fn test_reverse_disabled_by_params() {
        let path = vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0)];
        let backwards = yaw(PI);

        let smoother = PathSmoother::new(PathSmootherParams::new(false)).unwrap();
        let smoothed = smoother.smooth(&path, &backwards, &backwards, false).unwrap();

        assert!(!smoothed.reverse);
        for q in smoothed.orientations[1..smoothed.len() - 1].iter() {
            assert_relative_eq!(q.angle(), 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_smooth_request() {
        let smoother = PathSmoother::new(PathSmootherParams::new(true)).unwrap();
        let request = PathRequest {
            points_m: straight_path(),
            start_orientation: yaw(0.0),
            end_orientation: yaw(0.0),
            forbid_reverse: false,
        };

        let response = smoother.smooth_request(&request).unwrap();
        assert_eq!(response.positions_m.len(), 41);
        assert_eq!(response.orientations.len(), 41);
        assert!(!response.reverse);
    }

    #[test]
    fn test_headings() {
        let smoother = PathSmoother::new(PathSmootherParams::new(false)).unwrap();
        let path = vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0)];

        let smoothed = smoother.smooth(&path, &yaw(0.0), &yaw(0.0), false).unwrap();
        let headings = smoothed.headings();

        assert_eq!(headings.len(), smoothed.len());
        assert_relative_eq!(headings[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(headings[10], FRAC_PI_2, epsilon = 1e-9);
    }
}
