//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the vehicle software. Nothing in here knows
//! about the transport the messages travel over, only their content.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Requests and tuning updates sent to the vehicle
pub mod tc;

/// Command and diagnostic definitions for equipment (like the drive base)
pub mod eqpt;
