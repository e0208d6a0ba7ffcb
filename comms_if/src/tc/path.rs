//! # Path smoothing request and response

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A request to smooth a waypoint path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathRequest {
    /// The waypoints in traversal order. At least two are required.
    pub points_m: Vec<Vector3<f64>>,

    /// The orientation the trajectory shall start with.
    pub start_orientation: UnitQuaternion<f64>,

    /// The orientation the trajectory shall end with.
    pub end_orientation: UnitQuaternion<f64>,

    /// If true the path will never be traversed backwards, whatever the geometry. Should be set
    /// when the vehicle is too far from the start of the path for the heuristic to mean anything.
    #[serde(default)]
    pub forbid_reverse: bool,
}

/// The smoothed trajectory produced for a [`PathRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathResponse {
    pub positions_m: Vec<Vector3<f64>>,

    pub orientations: Vec<UnitQuaternion<f64>>,

    /// True if the vehicle should traverse the path facing backwards.
    pub reverse: bool,
}
