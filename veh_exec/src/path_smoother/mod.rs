//! # Path smoother module
//!
//! The path smoother turns a sparse sequence of waypoints into a densely sampled reference
//! trajectory of positions and orientations.
//!
//! The waypoints are first resampled at a fixed spacing `S` along their arc length, treating the
//! arc length as a "virtual time". Every interior sample is then replaced by a Gaussian-weighted
//! average of all samples (a kernel regression with bandwidth `sigma`). The first and last points
//! are pinned to the original waypoints so the trajectory always starts and ends exactly where it
//! was asked to.
//!
//! Orientations of the interior points come from the forward difference of the smoothed
//! positions, while the first and last orientations are given by the caller.
//!
//! For short paths the smoother can decide that the vehicle is already facing backwards along
//! the path at both ends, in which case the path is traversed in reverse. This is a heuristic
//! tuned on the vehicle, not a physical law.
//!
//! # Complexity
//!
//! Smoothing is O(n^2) in the number of samples `n = length / S`. A 10 m path at the default
//! 5 cm spacing is 200 samples, or 40 000 kernel evaluations. The discretisation should be sized
//! with this in mind for long paths.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default spacing between resampled points along the path.
///
/// Units: meters
pub const DEFAULT_DISCRETISATION_M: f64 = 0.05;

/// Default bandwidth of the Gaussian smoothing kernel.
///
/// Units: meters
pub const DEFAULT_SMOOTHNESS_M: f64 = 0.125;

/// Paths shorter than this are considered to have no length at all.
///
/// Units: meters
pub const MIN_PATH_LENGTH_M: f64 = 1e-9;

/// Paths shorter than this may be traversed in reverse.
///
/// Units: meters
pub const REVERSE_MAX_LENGTH_M: f64 = 1.5;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during path smoothing.
#[derive(Debug, thiserror::Error)]
pub enum PathSmootherError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid path smoother parameters: {0}")]
    InvalidParams(String),

    #[error("A path must have at least 2 points, found {0}")]
    NotEnoughPoints(usize),

    #[error("Path point {0} is not finite")]
    NonFinitePoint(usize),

    #[error("The path has zero length")]
    ZeroLengthPath,
}
