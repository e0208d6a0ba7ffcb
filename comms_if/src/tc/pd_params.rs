//! # PD parameter tuning messages
//!
//! The drive controller's gains can be changed at runtime by the tuning channel. Which schema the
//! channel speaks is fixed once, at load time, by the profile named in the drive control
//! parameters.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt, str::FromStr};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Name of the default PD parameter profile
pub const DEFAULT_PROFILE_NAME: &str = "PdParams";

/// Name of the Argo PD parameter profile
pub const ARGO_PROFILE_NAME: &str = "PdParamsArgo";

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The PD parameter profile, selecting which tuning schema is accepted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PdProfile {
    Default,
    Argo,
}

/// A gain update arriving from the tuning channel.
///
/// Serialised as `{"profile": "PdParams", "params": { ... }}`, the tag being the profile name.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "profile", content = "params")]
pub enum PdParamsUpdate {
    #[serde(rename = "PdParams")]
    Default(DefaultPdParams),

    #[serde(rename = "PdParamsArgo")]
    Argo(ArgoPdParams),
}

#[derive(Debug, Error, PartialEq)]
pub enum PdProfileError {
    /// Unknown profiles are never defaulted, the vehicle must refuse to start instead.
    #[error("Unrecognised PD parameter profile \"{0}\", expected \"PdParams\" or \"PdParamsArgo\"")]
    UnknownProfile(String),
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Tuning schema of the default profile.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultPdParams {
    pub kp_angle: f64,
    pub kd_angle: f64,
    pub kp_position: f64,
    pub kd_position: f64,
    pub speed_reduction_gain: f64,
}

/// Tuning schema of the Argo profile.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgoPdParams {
    pub kp_angle: f64,
    pub kd_angle: f64,
    pub kp_position: f64,
    pub kd_position: f64,
    pub speed_reduction_gain: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl PdProfile {
    /// The name of the profile as used in parameter files.
    pub fn name(&self) -> &'static str {
        match self {
            PdProfile::Default => DEFAULT_PROFILE_NAME,
            PdProfile::Argo => ARGO_PROFILE_NAME,
        }
    }
}

impl FromStr for PdProfile {
    type Err = PdProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            DEFAULT_PROFILE_NAME => Ok(PdProfile::Default),
            ARGO_PROFILE_NAME => Ok(PdProfile::Argo),
            _ => Err(PdProfileError::UnknownProfile(String::from(s))),
        }
    }
}

impl TryFrom<String> for PdProfile {
    type Error = PdProfileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PdProfile> for String {
    fn from(profile: PdProfile) -> Self {
        String::from(profile.name())
    }
}

impl fmt::Display for PdProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl PdParamsUpdate {
    /// The profile whose schema this update follows.
    pub fn profile(&self) -> PdProfile {
        match self {
            PdParamsUpdate::Default(_) => PdProfile::Default,
            PdParamsUpdate::Argo(_) => PdProfile::Argo,
        }
    }

    /// Flatten the update into `[kp_angle, kd_angle, kp_position, kd_position,
    /// speed_reduction_gain]`.
    pub fn values(&self) -> [f64; 5] {
        match self {
            PdParamsUpdate::Default(p) => [
                p.kp_angle,
                p.kd_angle,
                p.kp_position,
                p.kd_position,
                p.speed_reduction_gain,
            ],
            PdParamsUpdate::Argo(p) => [
                p.kp_angle,
                p.kd_angle,
                p.kp_position,
                p.kd_position,
                p.speed_reduction_gain,
            ],
        }
    }
}
