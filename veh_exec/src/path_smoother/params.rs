//! Path smoother parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use super::{PathSmootherError, DEFAULT_DISCRETISATION_M, DEFAULT_SMOOTHNESS_M};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the path smoother
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathSmootherParams {
    /// If false the smoother will never decide to traverse a path in reverse.
    pub allow_reverse_paths: bool,

    /// Spacing between resampled points along the path.
    ///
    /// Units: meters
    #[serde(default = "default_discretisation_m")]
    pub discretisation_m: f64,

    /// Bandwidth (standard deviation) of the Gaussian smoothing kernel.
    ///
    /// Units: meters
    #[serde(default = "default_smoothness_m")]
    pub smoothness_m: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PathSmootherParams {
    /// Default parameters, only the reverse path setting needs choosing.
    pub fn new(allow_reverse_paths: bool) -> Self {
        Self {
            allow_reverse_paths,
            discretisation_m: DEFAULT_DISCRETISATION_M,
            smoothness_m: DEFAULT_SMOOTHNESS_M,
        }
    }

    /// Check the parameters are usable.
    pub fn validate(&self) -> Result<(), PathSmootherError> {
        if !(self.discretisation_m.is_finite() && self.discretisation_m > 0.0) {
            return Err(PathSmootherError::InvalidParams(format!(
                "discretisation_m must be finite and positive, found {}",
                self.discretisation_m
            )));
        }
        if !(self.smoothness_m.is_finite() && self.smoothness_m > 0.0) {
            return Err(PathSmootherError::InvalidParams(format!(
                "smoothness_m must be finite and positive, found {}",
                self.smoothness_m
            )));
        }

        Ok(())
    }
}

fn default_discretisation_m() -> f64 {
    DEFAULT_DISCRETISATION_M
}

fn default_smoothness_m() -> f64 {
    DEFAULT_SMOOTHNESS_M
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_params_defaults() {
        let params: PathSmootherParams =
            util::params::from_str("allow_reverse_paths = true").unwrap();

        assert_eq!(params, PathSmootherParams::new(true));
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_params_validate() {
        let mut params = PathSmootherParams::new(false);
        params.discretisation_m = 0.0;
        assert!(params.validate().is_err());

        let mut params = PathSmootherParams::new(false);
        params.smoothness_m = std::f64::NAN;
        assert!(params.validate().is_err());
    }
}
