//! Drive controller state and control laws

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use chrono::Utc;
use log::{debug, info, trace, warn};
use serde::Serialize;
use std::f64::consts::{FRAC_PI_2, PI};

// Internal
use super::*;
use comms_if::eqpt::drive::{PdOut, Twist};
use util::{
    archive::{Archived, Archiver},
    maths::rad_to_deg,
    params,
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The drive controller.
///
/// Each instance carries the error history of one tracking session, so two controllers sharing
/// a [`ConfigStore`] never see each other's derivatives.
pub struct DriveCtrl {
    store: ConfigStore,

    error_state: ErrorState,

    last_twist: Option<Twist>,
    last_pd_out: Option<PdOut>,

    pending_twist: Option<Twist>,
    pending_pd_out: Option<PdOut>,

    arch_twist: Archiver,
    arch_pd_out: Archiver,
}

/// Errors of the previous PD control step. `None` at the start of a session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorState {
    pub prev_e_angle: Option<f64>,
    pub prev_e_position: Option<f64>,
}

/// Archive row for emitted twists.
#[derive(Serialize)]
struct TwistRecord {
    time_s: f64,
    linear_x: f64,
    angular_z: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DriveCtrl {
    /// Create a new controller using the given configuration store.
    pub fn new(store: ConfigStore) -> Self {
        Self {
            store,
            error_state: ErrorState::default(),
            last_twist: None,
            last_pd_out: None,
            pending_twist: None,
            pending_pd_out: None,
            arch_twist: Archiver::default(),
            arch_pd_out: Archiver::default(),
        }
    }

    /// Create a new controller with its own store, loading the parameters from the given file
    /// relative to the parameters directory.
    pub fn init(params_path: &str) -> Result<Self, DriveCtrlError> {
        let params: DriveCtrlParams =
            params::load(params_path).map_err(DriveCtrlError::ParamLoadError)?;

        info!(
            "DriveCtrl using the {} profile",
            params.motion.pd_profile
        );

        Self::from_params(params)
    }

    pub fn from_params(params: DriveCtrlParams) -> Result<Self, DriveCtrlError> {
        let store = ConfigStore::new(DriveConfig::from(params))?;

        Ok(Self::new(store))
    }

    /// Start archiving twists and PD outputs into the session.
    pub fn init_archive(&mut self, session: &Session) -> Result<(), DriveCtrlError> {
        self.arch_twist = Archiver::from_path(session, "drive_ctrl/twist.csv")?;
        self.arch_pd_out = Archiver::from_path(session, "drive_ctrl/pd_out.csv")?;

        Ok(())
    }

    /// The configuration store used by this controller.
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn error_state(&self) -> &ErrorState {
        &self.error_state
    }

    /// The last twist emitted by the controller.
    pub fn last_twist(&self) -> Option<&Twist> {
        self.last_twist.as_ref()
    }

    /// The diagnostics of the last PD control step.
    pub fn last_pd_out(&self) -> Option<&PdOut> {
        self.last_pd_out.as_ref()
    }

    /// Forget the errors of the previous step. Must be called when a new path is started.
    pub fn reset_session(&mut self) {
        debug!("DriveCtrl session reset");
        self.error_state = ErrorState::default();
    }

    /// Execute a twist limited only by the unlimited maxima of the drive base.
    pub fn execute_unlimited_twist(&mut self, cmd: &Twist) -> Twist {
        let config = self.store.snapshot();

        let twist = clamp_unlimited(cmd, &config.motion);
        self.emit(twist)
    }

    /// Execute a twist limited by the controller maxima and the speed envelope.
    pub fn execute_twist(&mut self, cmd: &Twist) -> Twist {
        let config = self.store.snapshot();

        let twist = limit_twist(
            cmd,
            config.motion.max_controller_speed_ms,
            config.motion.max_controller_angular_rate_rads,
            &config,
        );
        self.emit(twist)
    }

    /// Saturate a twist using the current configuration, without emitting it.
    pub fn limit_twist(&self, cmd: &Twist, max_speed_ms: f64, max_angular_rate_rads: f64) -> Twist {
        limit_twist(cmd, max_speed_ms, max_angular_rate_rads, &self.store.snapshot())
    }

    /// Run one step of the PD controller.
    ///
    /// The speed demand is capped to the magnitude of `commanded_speed_ms` before saturation.
    /// If `dt` isn't finite and positive, any input isn't finite, or the demands overflow, an
    /// error is returned and the error state is unchanged.
    pub fn execute_pd_controlled_motion_command(
        &mut self,
        e_angle: f64,
        e_position: f64,
        dt: f64,
        commanded_speed_ms: f64,
    ) -> Result<(Twist, PdOut), DriveCtrlError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(DriveCtrlError::InvalidDt(dt));
        }
        if !(e_angle.is_finite() && e_position.is_finite()) {
            return Err(DriveCtrlError::NonFiniteError(e_angle, e_position));
        }
        if !commanded_speed_ms.is_finite() {
            return Err(DriveCtrlError::InvalidCommandedSpeed(commanded_speed_ms));
        }

        let config = self.store.snapshot();
        let gains = config.gains;

        let e_angle = if config.motion.y_symmetric {
            fold_y_symmetric(e_angle)
        } else {
            e_angle
        };

        // First step of a session has no derivative
        let de_angle_dt = (e_angle - self.error_state.prev_e_angle.unwrap_or(e_angle)) / dt;
        let de_position_dt =
            (e_position - self.error_state.prev_e_position.unwrap_or(e_position)) / dt;

        let mut speed = gains.kp_position * e_position + gains.kd_position * de_position_dt;
        let z_angular_rate = gains.kp_angle * e_angle + gains.kd_angle * de_angle_dt;

        // A tiny dt can overflow the derivatives, and 0 * inf is NaN
        if !(speed.is_finite() && z_angular_rate.is_finite()) {
            return Err(DriveCtrlError::NonFiniteDemand(speed, z_angular_rate));
        }

        if speed.abs() > commanded_speed_ms.abs() {
            speed = speed.signum() * commanded_speed_ms.abs();
        }

        let twist = limit_twist(
            &Twist::new(speed, z_angular_rate),
            config.motion.max_controller_speed_ms,
            config.motion.max_controller_angular_rate_rads,
            &config,
        );

        let pd_out = PdOut {
            timestamp: Utc::now(),
            dt,
            e_position,
            e_angle,
            de_position_dt,
            de_angle_dt,
            speed,
            z_twist: z_angular_rate,
            z_twist_real: twist.angular_z,
            z_twist_deg: rad_to_deg(z_angular_rate),
            speed_real: twist.linear_x,
            z_twist_deg_real: rad_to_deg(twist.angular_z),
        };

        self.error_state = ErrorState {
            prev_e_angle: Some(e_angle),
            prev_e_position: Some(e_position),
        };

        trace!(
            "PD step: e_angle {:.4}, e_position {:.4}, twist ({:.4}, {:.4})",
            e_angle,
            e_position,
            twist.linear_x,
            twist.angular_z
        );

        self.last_pd_out = Some(pd_out.clone());
        self.pending_pd_out = Some(pd_out.clone());

        Ok((self.emit(twist), pd_out))
    }

    /// Run one step of the PD controller from a motion command.
    ///
    /// The relative angle drives the angle loop and the signed carrot distance drives the
    /// position loop. Angles outside of `[-pi, pi]` are reported but still used.
    pub fn execute_motion_command(
        &mut self,
        relative_angle: f64,
        orientation_error: f64,
        distance: f64,
        speed_ms: f64,
        signed_carrot_distance: f64,
        dt: f64,
    ) -> Result<(Twist, PdOut), DriveCtrlError> {
        trace!(
            "Motion command: relative angle {:.4}, orientation error {:.4}, distance {:.4}, \
             speed {:.4}",
            relative_angle,
            orientation_error,
            distance,
            speed_ms
        );

        if relative_angle.abs() > PI + INVALID_ANGLE_MARGIN_RAD {
            warn!("Invalid angle was given: {} rad", relative_angle);
        }

        let commanded_speed_ms = if speed_ms.abs() < std::f64::EPSILON {
            info!("Commanded speed is zero, only turning on the spot");
            0.0
        } else {
            speed_ms
        };

        self.execute_pd_controlled_motion_command(
            relative_angle,
            signed_carrot_distance,
            dt,
            commanded_speed_ms,
        )
    }

    /// Proportional motion command, steering towards the carrot at a fixed speed.
    ///
    /// A negative speed means reversing, in which case the orientation error is used with a
    /// reduced gain.
    pub fn execute_proportional_motion_command(
        &mut self,
        relative_angle: f64,
        orientation_error: f64,
        distance: f64,
        speed_ms: f64,
    ) -> Result<Twist, DriveCtrlError> {
        if !(distance.is_finite() && distance > 0.0) {
            return Err(DriveCtrlError::InvalidDistance(distance));
        }

        let angular_z = if speed_ms < 0.0 {
            orientation_error / distance * PROPORTIONAL_ANGULAR_GAIN * PROPORTIONAL_REVERSE_FACTOR
        } else {
            relative_angle / distance * PROPORTIONAL_ANGULAR_GAIN
        };

        Ok(self.execute_twist(&Twist::new(speed_ms, angular_z)))
    }

    /// Stop the vehicle. The error state is kept.
    pub fn stop(&mut self) -> Twist {
        debug!("DriveCtrl stop");
        self.emit(Twist::zero())
    }

    fn emit(&mut self, twist: Twist) -> Twist {
        self.last_twist = Some(twist);
        self.pending_twist = Some(twist);
        twist
    }
}

impl Archived for DriveCtrl {
    fn write(&mut self) -> Result<(), util::archive::ArchiveError> {
        if let Some(twist) = self.pending_twist.take() {
            self.arch_twist.serialise(TwistRecord {
                time_s: session::get_elapsed_seconds(),
                linear_x: twist.linear_x,
                angular_z: twist.angular_z,
            })?;
        }

        if let Some(pd_out) = self.pending_pd_out.take() {
            self.arch_pd_out.serialise(pd_out)?;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Fold an angle error for a vehicle symmetric about its Y axis.
///
/// Errors beyond a quarter turn are moved by half a turn so that the vehicle tracks them with its
/// back instead of turning around.
pub fn fold_y_symmetric(e_angle: f64) -> f64 {
    if e_angle > FRAC_PI_2 {
        e_angle - PI
    } else if e_angle < -FRAC_PI_2 {
        e_angle + PI
    } else {
        e_angle
    }
}
