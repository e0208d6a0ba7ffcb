//! Drive control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use super::ConfigError;
use comms_if::tc::pd_params::{PdParamsUpdate, PdProfile};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the drive controller, as read from the parameter file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriveCtrlParams {
    pub motion: MotionParams,

    /// Initial gains, the defaults are used for any missing table.
    #[serde(default)]
    pub gains: PdGains,
}

/// Limits and behaviour of the drive base.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionParams {
    /// Maximum speed the controller will command.
    ///
    /// Units: meters/second
    pub max_controller_speed_ms: f64,

    /// Maximum speed accepted by unlimited twist execution.
    ///
    /// Units: meters/second
    pub max_unlimited_speed_ms: f64,

    /// Maximum angular rate the controller will command.
    ///
    /// Units: radians/second
    pub max_controller_angular_rate_rads: f64,

    /// Maximum angular rate accepted by unlimited twist execution.
    ///
    /// Units: radians/second
    pub max_unlimited_angular_rate_rads: f64,

    /// Tuning schema accepted by the tuning channel. Unknown names are rejected at load.
    pub pd_profile: PdProfile,

    /// If true the vehicle is treated as symmetric about its Y axis, so angle errors beyond a
    /// quarter turn are tracked by driving backwards instead of turning around.
    #[serde(default)]
    pub y_symmetric: bool,

    /// Speed used by motion commands which don't specify one.
    ///
    /// Units: meters/second
    pub commanded_speed_ms: f64,
}

/// Gains of the PD controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdGains {
    pub kp_angle: f64,
    pub kd_angle: f64,
    pub kp_position: f64,
    pub kd_position: f64,

    /// How quickly the speed envelope closes as the angular rate increases.
    pub speed_reduction_gain: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotionParams {
    /// Check the limits are usable.
    ///
    /// All maxima must be finite and positive, and the unlimited maxima may not be below the
    /// controller ones.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let maxima = [
            ("max_controller_speed_ms", self.max_controller_speed_ms),
            ("max_unlimited_speed_ms", self.max_unlimited_speed_ms),
            (
                "max_controller_angular_rate_rads",
                self.max_controller_angular_rate_rads,
            ),
            (
                "max_unlimited_angular_rate_rads",
                self.max_unlimited_angular_rate_rads,
            ),
        ];

        for (name, value) in maxima.iter() {
            if !(value.is_finite() && *value > 0.0) {
                return Err(ConfigError::InvalidMotionParam(format!(
                    "{} must be finite and positive, found {}",
                    name, value
                )));
            }
        }

        if self.max_unlimited_speed_ms < self.max_controller_speed_ms {
            return Err(ConfigError::InvalidMotionParam(format!(
                "max_unlimited_speed_ms ({}) is below max_controller_speed_ms ({})",
                self.max_unlimited_speed_ms, self.max_controller_speed_ms
            )));
        }

        if self.max_unlimited_angular_rate_rads < self.max_controller_angular_rate_rads {
            return Err(ConfigError::InvalidMotionParam(format!(
                "max_unlimited_angular_rate_rads ({}) is below max_controller_angular_rate_rads ({})",
                self.max_unlimited_angular_rate_rads, self.max_controller_angular_rate_rads
            )));
        }

        if !self.commanded_speed_ms.is_finite() {
            return Err(ConfigError::InvalidMotionParam(format!(
                "commanded_speed_ms must be finite, found {}",
                self.commanded_speed_ms
            )));
        }

        Ok(())
    }
}

impl PdGains {
    /// Check all gains are finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let gains = [
            ("kp_angle", self.kp_angle),
            ("kd_angle", self.kd_angle),
            ("kp_position", self.kp_position),
            ("kd_position", self.kd_position),
            ("speed_reduction_gain", self.speed_reduction_gain),
        ];

        match gains.iter().find(|(_, v)| !v.is_finite()) {
            Some((name, value)) => Err(ConfigError::InvalidGain(format!(
                "{} must be finite, found {}",
                name, value
            ))),
            None => Ok(()),
        }
    }
}

impl Default for PdGains {
    fn default() -> Self {
        Self {
            kp_angle: 2.0,
            kd_angle: 0.5,
            kp_position: 0.5,
            kd_position: 0.0,
            speed_reduction_gain: 2.0,
        }
    }
}

impl From<PdParamsUpdate> for PdGains {
    fn from(update: PdParamsUpdate) -> Self {
        let [kp_angle, kd_angle, kp_position, kd_position, speed_reduction_gain] = update.values();

        Self {
            kp_angle,
            kd_angle,
            kp_position,
            kd_position,
            speed_reduction_gain,
        }
    }
}
