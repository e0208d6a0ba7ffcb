//! # Drive base commands and diagnostics
//!
//! The drive base of the vehicle is a differential-drive chassis which accepts a single linear
//! speed and a single angular rate. Every control step emits one [`Twist`], and every PD control
//! step also emits one [`PdOut`] record.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A velocity command for the drive base.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Twist {
    /// Linear speed along the vehicle's forward axis.
    ///
    /// Units: meters/second
    pub linear_x: f64,

    /// Angular rate about the vehicle's Z+ (upwards) axis. Follows the right hand rule, so a
    /// positive rate turns the vehicle to the left.
    ///
    /// Units: radians/second
    pub angular_z: f64,
}

/// Diagnostic output of a single PD control step.
///
/// This record is write-only, nothing in the controller reads it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdOut {
    /// The time at which the step was executed
    pub timestamp: DateTime<Utc>,

    /// Time difference between this step and the previous one.
    ///
    /// Units: seconds
    pub dt: f64,

    /// Position error used by the step.
    ///
    /// Units: meters
    pub e_position: f64,

    /// Angle error used by the step, after any y-symmetric folding.
    ///
    /// Units: radians
    pub e_angle: f64,

    /// Units: meters/second
    pub de_position_dt: f64,

    /// Units: radians/second
    pub de_angle_dt: f64,

    /// Speed demand before saturation.
    ///
    /// Units: meters/second
    pub speed: f64,

    /// Angular rate demand before saturation.
    ///
    /// Units: radians/second
    pub z_twist: f64,

    /// Angular rate demand after saturation.
    ///
    /// Units: radians/second
    pub z_twist_real: f64,

    /// Angular rate demand before saturation.
    ///
    /// Units: degrees/second
    pub z_twist_deg: f64,

    /// Speed demand after saturation.
    ///
    /// Units: meters/second
    pub speed_real: f64,

    /// Angular rate demand after saturation.
    ///
    /// Units: degrees/second
    pub z_twist_deg_real: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Twist {
    /// Create a new twist from a linear speed and angular rate.
    pub fn new(linear_x: f64, angular_z: f64) -> Self {
        Self {
            linear_x,
            angular_z,
        }
    }

    /// The zero twist, i.e. a full stop.
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.linear_x == 0.0 && self.angular_z == 0.0
    }
}
