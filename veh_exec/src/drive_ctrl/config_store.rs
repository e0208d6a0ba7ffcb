//! Shared configuration store
//!
//! The store holds the motion parameters and gains. It is shared between the controller and the
//! tuning channel, which may run on another thread. Readers always take a whole snapshot so a
//! control step never mixes old and new gains.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::info;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// Internal
use super::{ConfigError, DriveCtrlParams, MotionParams, PdGains};
use comms_if::tc::pd_params::PdParamsUpdate;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A consistent view of the drive configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveConfig {
    pub motion: MotionParams,
    pub gains: PdGains,
}

/// Handle to the shared configuration. Cloning the handle shares the underlying store.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    inner: Arc<Mutex<DriveConfig>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DriveConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.motion.validate()?;
        self.gains.validate()
    }
}

impl From<DriveCtrlParams> for DriveConfig {
    fn from(params: DriveCtrlParams) -> Self {
        Self {
            motion: params.motion,
            gains: params.gains,
        }
    }
}

impl ConfigStore {
    /// Create a new store, validating the initial configuration.
    pub fn new(config: DriveConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            inner: Arc::new(Mutex::new(config)),
        })
    }

    /// Get a copy of the current configuration.
    pub fn snapshot(&self) -> DriveConfig {
        *self.lock()
    }

    /// Apply a gain update from the tuning channel.
    ///
    /// The update must follow the schema of the active profile and all of its values must be
    /// finite, otherwise the store is left untouched. Returns the new gains.
    pub fn apply(&self, update: PdParamsUpdate) -> Result<PdGains, ConfigError> {
        let gains = PdGains::from(update);
        gains.validate()?;

        let mut config = self.lock();

        if update.profile() != config.motion.pd_profile {
            return Err(ConfigError::ProfileMismatch {
                expected: config.motion.pd_profile,
                found: update.profile(),
            });
        }

        config.gains = gains;

        info!(
            "PD gains updated: kp_angle = {}, kd_angle = {}, kp_position = {}, kd_position = {}, \
             speed_reduction_gain = {}",
            gains.kp_angle,
            gains.kd_angle,
            gains.kp_position,
            gains.kd_position,
            gains.speed_reduction_gain
        );

        Ok(gains)
    }

    /// Replace the motion parameters. The PD profile can't be changed this way.
    pub fn set_motion_params(&self, motion: MotionParams) -> Result<(), ConfigError> {
        motion.validate()?;

        let mut config = self.lock();

        if motion.pd_profile != config.motion.pd_profile {
            return Err(ConfigError::ProfileChange {
                from: config.motion.pd_profile,
                to: motion.pd_profile,
            });
        }

        config.motion = motion;
        info!("Motion parameters updated");

        Ok(())
    }

    /// Set the speed used by motion commands which don't specify one.
    pub fn set_commanded_speed(&self, speed_ms: f64) -> Result<(), ConfigError> {
        if !speed_ms.is_finite() {
            return Err(ConfigError::InvalidMotionParam(format!(
                "commanded_speed_ms must be finite, found {}",
                speed_ms
            )));
        }

        self.lock().motion.commanded_speed_ms = speed_ms;

        Ok(())
    }

    // Every write is a single assignment of validated values, so a poisoned store is still usable.
    fn lock(&self) -> MutexGuard<'_, DriveConfig> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::tc::pd_params::{ArgoPdParams, DefaultPdParams, PdProfile};

    fn test_config() -> DriveConfig {
        DriveConfig {
            motion: MotionParams {
                max_controller_speed_ms: 1.0,
                max_unlimited_speed_ms: 2.0,
                max_controller_angular_rate_rads: 1.0,
                max_unlimited_angular_rate_rads: 2.0,
                pd_profile: PdProfile::Default,
                y_symmetric: false,
                commanded_speed_ms: 0.5,
            },
            gains: PdGains::default(),
        }
    }

    fn default_update(kp_angle: f64) -> PdParamsUpdate {
        PdParamsUpdate::Default(DefaultPdParams {
            kp_angle,
            kd_angle: 0.1,
            kp_position: 0.2,
            kd_position: 0.3,
            speed_reduction_gain: 1.0,
        })
    }

    #[test]
    fn test_apply_update() {
        let store = ConfigStore::new(test_config()).unwrap();
        let shared = store.clone();

        let gains = shared.apply(default_update(3.0)).unwrap();
        assert_eq!(gains.kp_angle, 3.0);

        // Visible through every handle
        assert_eq!(store.snapshot().gains, gains);
    }

    #[test]
    fn test_apply_rejects_other_profile() {
        let store = ConfigStore::new(test_config()).unwrap();

        let update = PdParamsUpdate::Argo(ArgoPdParams {
            kp_angle: 9.0,
            kd_angle: 9.0,
            kp_position: 9.0,
            kd_position: 9.0,
            speed_reduction_gain: 9.0,
        });

        assert_eq!(
            store.apply(update),
            Err(ConfigError::ProfileMismatch {
                expected: PdProfile::Default,
                found: PdProfile::Argo
            })
        );
        assert_eq!(store.snapshot().gains, PdGains::default());
    }

    #[test]
    fn test_apply_rejects_non_finite() {
        let store = ConfigStore::new(test_config()).unwrap();

        assert!(store.apply(default_update(std::f64::NAN)).is_err());
        assert_eq!(store.snapshot().gains, PdGains::default());
    }

    #[test]
    fn test_set_motion_params() {
        let store = ConfigStore::new(test_config()).unwrap();

        let mut motion = test_config().motion;
        motion.y_symmetric = true;
        store.set_motion_params(motion).unwrap();
        assert!(store.snapshot().motion.y_symmetric);

        motion.pd_profile = PdProfile::Argo;
        assert!(matches!(
            store.set_motion_params(motion),
            Err(ConfigError::ProfileChange { .. })
        ));

        store.set_commanded_speed(0.25).unwrap();
        assert_eq!(store.snapshot().motion.commanded_speed_ms, 0.25);
        assert!(store.set_commanded_speed(std::f64::NAN).is_err());
    }

    #[test]
    fn test_new_validates() {
        let mut config = test_config();
        config.motion.max_controller_speed_ms = -1.0;

        assert!(ConfigStore::new(config).is_err());
    }
}
