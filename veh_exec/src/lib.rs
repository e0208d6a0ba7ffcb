//! # Vehicle motion control library
//!
//! Core of the vehicle's motion control, turning waypoint paths into smooth trajectories and
//! tracking errors into velocity commands.
//!
//! - [`path_smoother`] resamples a waypoint path, smooths it and assigns an orientation to each
//!   point, deciding whether short paths should be traversed in reverse.
//! - [`drive_ctrl`] runs the PD controller and saturates every command to the drive base limits.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod drive_ctrl;
pub mod geom;
pub mod path_smoother;
