//! # Drive control module
//!
//! Drive control converts tracking errors into velocity commands for the differential-drive
//! chassis. The main control law is a pair of PD controllers, one acting on the angle error and
//! producing the angular rate demand, the other acting on the position error and producing the
//! speed demand.
//!
//! Every command leaving the module is saturated by [`limit_twist`]. The speed limit is a
//! trapezoidal envelope of the angular rate: full speed is only allowed when going straight, and
//! it decays linearly as the turn tightens, reaching zero at
//! `max_controller_angular_rate / speed_reduction_gain`. The angular rate itself is only limited
//! by the configured maximum and is never reduced because of the speed.
//!
//! The derivative terms are computed against the errors of the previous call on the same
//! [`DriveCtrl`] instance. [`DriveCtrl::reset_session`] must be called whenever a new path or
//! target is started so that the first derivative isn't taken against an unrelated error.
//!
//! The motion parameters and gains live in a [`ConfigStore`], which can be shared with the tuning
//! channel. Each control call works on a single snapshot of the store.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod config_store;
mod limits;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use config_store::*;
pub use limits::*;
pub use params::*;
pub use state::*;

use comms_if::tc::pd_params::PdProfile;
use util::{archive::ArchiveError, params::LoadError};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Angle errors this far outside of `[-pi, pi]` are reported as invalid.
///
/// Units: radians
pub const INVALID_ANGLE_MARGIN_RAD: f64 = 1e-2;

/// Gain applied to `angle / distance` by the proportional motion command.
pub const PROPORTIONAL_ANGULAR_GAIN: f64 = 1.5;

/// Further reduction of the proportional angular gain when reversing.
pub const PROPORTIONAL_REVERSE_FACTOR: f64 = 0.25;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during DriveCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum DriveCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(LoadError),

    #[error("Invalid configuration: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Could not initialise the archives: {0}")]
    ArchiveError(#[from] ArchiveError),

    /// The time step must be strictly positive for the derivative terms to exist.
    #[error("Invalid time step {0} s, expected a finite value greater than zero")]
    InvalidDt(f64),

    /// The proportional motion command divides by the distance to the carrot.
    #[error("Invalid carrot distance {0} m, expected a finite value greater than zero")]
    InvalidDistance(f64),

    #[error("Tracking errors must be finite, found angle {0} rad and position {1} m")]
    NonFiniteError(f64, f64),

    #[error("Commanded speed must be finite, found {0} m/s")]
    InvalidCommandedSpeed(f64),

    /// The control law produced a non-finite speed or angular rate demand.
    #[error("Non-finite demand: speed {0} m/s, angular rate {1} rad/s")]
    NonFiniteDemand(f64, f64),
}

/// Errors in the motion parameters or gains.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid motion parameter: {0}")]
    InvalidMotionParam(String),

    #[error("Invalid gain: {0}")]
    InvalidGain(String),

    /// A tuning update following another profile's schema was received.
    #[error("Received {found} parameters but the {expected} profile is active")]
    ProfileMismatch {
        expected: PdProfile,
        found: PdProfile,
    },

    /// The profile is fixed at load time.
    #[error("Cannot change the PD profile from {from} to {to} at runtime")]
    ProfileChange { from: PdProfile, to: PdProfile },
}
