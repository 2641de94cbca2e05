//! # rapport configuration
//!
//! Validated configuration for the report-queueing simulator.
//!
//! ## Features
//! - **Fail-fast validation**: degenerate parameters (zero step width,
//!   negative rate, empty device pool) never reach the engine
//! - **Layered loading**: defaults, then `config/rapport.yaml`, then
//!   `RAPPORT_*` environment variables
//! - **Profile overrides**: the service-time range is a deployment
//!   parameter, not a constant

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod error;
mod validation;

pub use error::ConfigError;

/// Uniform sampling range for service durations, in simulation time units.
///
/// Deployment profiles differ here (an office desk runs [1, 5], a field
/// station [5, 10]), which is why the range is configuration and not a
/// constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServiceRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ServiceRange {
    fn default() -> Self {
        Self { min: 1.0, max: 5.0 }
    }
}

/// Complete parameter set for one simulation run.
///
/// All parameters are required for the engine to start; the serde defaults
/// only fill in the canonical office profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SimulationConfig {
    /// Expected arrivals per unit of simulation time.
    #[serde(default = "default_lambda_rate")]
    #[validate(custom(function = validation::validate_rate))]
    pub lambda_rate: f64,

    /// Total simulated time to cover before the run ends.
    #[serde(default = "default_duration")]
    #[validate(custom(function = validation::validate_positive_finite))]
    pub duration: f64,

    /// Width of one clock step. Smaller steps give finer-grained, noisier
    /// arrival rounds for the same rate.
    #[serde(default = "default_delta")]
    #[validate(custom(function = validation::validate_positive_finite))]
    pub delta: f64,

    /// Capacity of the pending-report buffer.
    #[serde(default = "default_buffer_size")]
    #[validate(range(min = 1, max = 1024))]
    pub buffer_size: usize,

    /// Number of serving devices (`O1..On`).
    #[serde(default = "default_devices")]
    #[validate(range(min = 1, max = 64))]
    pub devices: usize,

    /// Number of report sources (`S1..Sn`).
    #[serde(default = "default_sources")]
    #[validate(range(min = 1, max = 64))]
    pub sources: usize,

    /// Service-time sampling range for this deployment profile.
    #[serde(default)]
    #[validate(custom(function = validation::validate_service_range))]
    pub service_range: ServiceRange,

    /// Seed for the samplers. Unset means OS entropy, set means the run is
    /// reproducible bit for bit.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_lambda_rate() -> f64 {
    0.6
}

fn default_duration() -> f64 {
    20.0
}

fn default_delta() -> f64 {
    0.5
}

fn default_buffer_size() -> usize {
    8
}

fn default_devices() -> usize {
    3
}

fn default_sources() -> usize {
    4
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            lambda_rate: default_lambda_rate(),
            duration: default_duration(),
            delta: default_delta(),
            buffer_size: default_buffer_size(),
            devices: default_devices(),
            sources: default_sources(),
            service_range: ServiceRange::default(),
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default values
    /// 2. `config/rapport.yaml` if present
    /// 3. `RAPPORT_*` environment variables (`__` separates nesting, e.g.
    ///    `RAPPORT_SERVICE_RANGE__MAX=10`)
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(SimulationConfig::default()));

        if Path::new("config/rapport.yaml").exists() {
            figment = figment.merge(Yaml::file("config/rapport.yaml"));
        }

        figment
            .merge(Env::prefixed("RAPPORT_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }

    /// Load configuration from a specific path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(
                path.to_string_lossy().to_string(),
            )));
        }

        Figment::from(Serialized::defaults(SimulationConfig::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("RAPPORT_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }

    /// Re-run validation, e.g. after programmatic field overrides.
    pub fn ensure_valid(&self) -> Result<(), ConfigError> {
        self.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = SimulationConfig::default();
        config.validate().expect("default config should validate");
    }

    #[test]
    fn zero_delta_is_rejected() {
        let config = SimulationConfig {
            delta: 0.0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.ensure_valid(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn negative_rate_is_rejected() {
        let config = SimulationConfig {
            lambda_rate: -0.5,
            ..SimulationConfig::default()
        };
        assert!(config.ensure_valid().is_err());
    }

    #[test]
    fn zero_rate_is_a_legal_no_arrival_profile() {
        let config = SimulationConfig {
            lambda_rate: 0.0,
            ..SimulationConfig::default()
        };
        config.ensure_valid().expect("zero rate is legal");
    }

    #[test]
    fn zero_devices_and_zero_buffer_are_rejected() {
        let no_devices = SimulationConfig {
            devices: 0,
            ..SimulationConfig::default()
        };
        assert!(no_devices.ensure_valid().is_err());

        let no_buffer = SimulationConfig {
            buffer_size: 0,
            ..SimulationConfig::default()
        };
        assert!(no_buffer.ensure_valid().is_err());
    }

    #[test]
    fn inverted_service_range_is_rejected() {
        let config = SimulationConfig {
            service_range: ServiceRange { min: 9.0, max: 2.0 },
            ..SimulationConfig::default()
        };
        assert!(config.ensure_valid().is_err());
    }

    #[test]
    fn missing_file_is_a_descriptive_error() {
        let err = SimulationConfig::load_from_path("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn yaml_profile_overrides_defaults() {
        let dir = std::env::temp_dir().join("rapport-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("field.yaml");
        std::fs::write(
            &path,
            "lambda_rate: 1.2\nservice_range:\n  min: 5.0\n  max: 10.0\nseed: 7\n",
        )
        .unwrap();

        let config = SimulationConfig::load_from_path(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.lambda_rate, 1.2);
        assert_eq!(config.service_range, ServiceRange { min: 5.0, max: 10.0 });
        assert_eq!(config.seed, Some(7));
        // Untouched fields keep their defaults.
        assert_eq!(config.buffer_size, 8);
        assert_eq!(config.devices, 3);
    }

    #[test]
    fn invalid_yaml_profile_fails_validation_not_extraction() {
        let dir = std::env::temp_dir().join("rapport-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.yaml");
        std::fs::write(&path, "delta: -1.0\n").unwrap();

        let err = SimulationConfig::load_from_path(&path).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
