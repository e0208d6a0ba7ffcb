//! # Telecommand module
//!
//! This module provides the inbound side of the communications interface: path requests into the
//! smoother and PD gain updates from the tuning channel.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod path;
pub mod pd_params;
