//! # Vehicle executable
//!
//! Smooths a path request and optionally replays a recorded trace of tracking errors through the
//! drive controller.
//!
//! ```text
//! veh_exec <path_request.json> [--errors <trace.csv>] [--pd-params <update.json>]
//! ```
//!
//! The smoothed trajectory is written to `trajectory.json` in the session directory, and the
//! controller outputs are archived under `arch/drive_ctrl/`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use log::{debug, info};
use serde::{de::DeserializeOwned, Deserialize};
use std::{fs::File, path::{Path, PathBuf}};
use structopt::StructOpt;

// Internal
use comms_if::tc::{path::PathRequest, pd_params::PdParamsUpdate};
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    session::Session,
};
use veh_lib::{drive_ctrl::DriveCtrl, path_smoother::PathSmoother};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "veh_exec", about = "Vehicle motion control executable")]
struct Opt {
    /// JSON path request to smooth
    #[structopt(parse(from_os_str))]
    path_request: PathBuf,

    /// CSV trace of tracking errors to replay through the drive controller
    #[structopt(long, parse(from_os_str))]
    errors: Option<PathBuf>,

    /// JSON PD parameter update applied before anything else runs
    #[structopt(long, parse(from_os_str))]
    pd_params: Option<PathBuf>,
}

/// One row of a tracking error trace.
#[derive(Debug, Deserialize)]
struct ErrorTraceRow {
    relative_angle: f64,
    orientation_error: f64,
    distance: f64,

    /// The configured commanded speed is used if empty.
    speed: Option<f64>,

    signed_carrot_distance: f64,
    dt: f64,
}

// ---------------------------------------------------------------------------
// MAIN
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("veh_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    info!("Vehicle Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI arguments: {:?}", opt);

    // ---- INITIALISE MODULES ----

    let path_smoother =
        PathSmoother::init("path_smoother.toml").wrap_err("Failed to initialise PathSmoother")?;
    info!("PathSmoother init complete");

    let mut drive_ctrl =
        DriveCtrl::init("drive_ctrl.toml").wrap_err("Failed to initialise DriveCtrl")?;
    drive_ctrl
        .init_archive(&session)
        .wrap_err("Failed to initialise the DriveCtrl archives")?;
    info!("DriveCtrl init complete\n");

    // ---- TUNING ----

    if let Some(ref path) = opt.pd_params {
        let update: PdParamsUpdate = load_json(path)?;
        drive_ctrl
            .store()
            .apply(update)
            .wrap_err("Failed to apply the PD parameter update")?;
    }

    // ---- PATH SMOOTHING ----

    let request: PathRequest = load_json(&opt.path_request)?;
    let response = path_smoother
        .smooth_request(&request)
        .wrap_err("Failed to smooth the path")?;

    info!(
        "Smoothed path of {} waypoints into {} points (reverse: {})",
        request.points_m.len(),
        response.positions_m.len(),
        response.reverse
    );

    let traj_path = session
        .save_json("trajectory.json", &response)
        .wrap_err("Failed to save the trajectory")?;
    info!("Trajectory saved to {:?}", traj_path);

    // ---- ERROR REPLAY ----

    if let Some(ref path) = opt.errors {
        replay_errors(&mut drive_ctrl, path)?;
    }

    info!("End of execution");

    Ok(())
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a JSON file into the given type.
fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).wrap_err_with(|| format!("Cannot open {:?}", path))?;

    serde_json::from_reader(file).wrap_err_with(|| format!("Cannot parse {:?}", path))
}

/// Feed every row of an error trace through the drive controller, then stop.
fn replay_errors(drive_ctrl: &mut DriveCtrl, path: &Path) -> Result<()> {
    let mut reader =
        csv::Reader::from_path(path).wrap_err_with(|| format!("Cannot open {:?}", path))?;

    drive_ctrl.reset_session();

    let mut num_rows = 0;

    for (i, row) in reader.deserialize::<ErrorTraceRow>().enumerate() {
        let row = row.wrap_err_with(|| format!("Invalid error trace row {}", i + 1))?;

        let speed = match row.speed {
            Some(s) => s,
            None => drive_ctrl.store().snapshot().motion.commanded_speed_ms,
        };

        let (twist, _) = drive_ctrl
            .execute_motion_command(
                row.relative_angle,
                row.orientation_error,
                row.distance,
                speed,
                row.signed_carrot_distance,
                row.dt,
            )
            .wrap_err_with(|| format!("Motion command failed on row {}", i + 1))?;

        debug!(
            "Row {}: twist ({:.3} m/s, {:.3} rad/s)",
            i + 1,
            twist.linear_x,
            twist.angular_z
        );

        drive_ctrl
            .write()
            .wrap_err("Failed to write the DriveCtrl archives")?;
        num_rows += 1;
    }

    if num_rows == 0 {
        return Err(eyre!("The error trace {:?} contains no rows", path));
    }

    drive_ctrl.stop();
    drive_ctrl
        .write()
        .wrap_err("Failed to write the DriveCtrl archives")?;

    info!("Replayed {} error trace rows", num_rows);

    Ok(())
}
