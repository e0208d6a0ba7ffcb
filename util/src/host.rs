//! Host platform utility functions

use std::{env, path::PathBuf};

/// Name of the environment variable holding the root of the software tree.
pub const SW_ROOT_ENV_VAR: &str = "VEH_SW_ROOT";

/// Get the root directory of the software, as set by the `VEH_SW_ROOT` environment variable.
///
/// The parameter and session directories live underneath this root.
pub fn get_veh_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
