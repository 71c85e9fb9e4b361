//
// Dometrack - Telescope dome following
// Copyright (c) 2026 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Program configuration.
//!
//! Read from a YAML file; every value is optional and falls back to its default.
//!

use crate::algorithm::{self, FollowingConfig};
use crate::controller::ControllerConfig;
use crate::vignetting::{self, UnknownShutterPolicy, VignetteConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const CONFIG_FILE_NAME: &str = "dometrack.yaml";

/// Seconds.
const DEFAULT_COMMAND_TIMEOUT: f64 = 120.0;
/// Seconds.
const DEFAULT_HEARTBEAT_INTERVAL: f64 = 1.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown algorithm \"{name}\" (available: {known})")]
    UnknownAlgorithm{ name: String, known: String },

    #[error("invalid value of {name}: {value}")]
    InvalidThreshold{ name: String, value: f64 },

    #[error("invalid vignetting configuration: {0}")]
    InvalidVignetting(String),

    #[error("configuration cannot be changed while following")]
    WhileFollowing,

    #[error("cannot read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error)
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AlgorithmSection {
    /// Degrees.
    pub max_delta_azimuth: f64,
    /// Degrees.
    pub max_delta_elevation: f64
}

impl Default for AlgorithmSection {
    fn default() -> AlgorithmSection {
        AlgorithmSection{
            max_delta_azimuth: algorithm::DEFAULT_MAX_DELTA_AZIMUTH,
            max_delta_elevation: algorithm::DEFAULT_MAX_DELTA_ELEVATION
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct VignettingSection {
    /// Degrees.
    pub azimuth_partial: f64,
    /// Degrees.
    pub azimuth_full: f64,
    /// Open fraction.
    pub shutter_partial: f64,
    /// Open fraction.
    pub shutter_full: f64,
    pub unknown_shutter: UnknownShutterPolicy,
    /// Seconds.
    pub max_telemetry_age: f64,
    pub scale_azimuth_by_elevation: bool
}

impl Default for VignettingSection {
    fn default() -> VignettingSection {
        VignettingSection{
            azimuth_partial: vignetting::DEFAULT_AZIMUTH_PARTIAL,
            azimuth_full: vignetting::DEFAULT_AZIMUTH_FULL,
            shutter_partial: vignetting::DEFAULT_SHUTTER_PARTIAL,
            shutter_full: vignetting::DEFAULT_SHUTTER_FULL,
            unknown_shutter: UnknownShutterPolicy::default(),
            max_telemetry_age: vignetting::DEFAULT_MAX_TELEMETRY_AGE.as_secs_f64(),
            scale_azimuth_by_elevation: true
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Configuration {
    pub algorithm_name: String,
    pub algorithm_config: AlgorithmSection,
    pub enable_elevation_motion: bool,
    /// Seconds.
    pub command_timeout: f64,
    /// Seconds.
    pub heartbeat_interval: f64,
    pub vignetting: VignettingSection
}

impl Default for Configuration {
    fn default() -> Configuration {
        Configuration{
            algorithm_name: algorithm::DEFAULT_ALGORITHM_NAME.to_string(),
            algorithm_config: AlgorithmSection::default(),
            enable_elevation_motion: false,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            vignetting: VignettingSection::default()
        }
    }
}

impl Configuration {
    pub fn from_yaml(text: &str) -> Result<Configuration, ConfigError> {
        // an empty document means "all defaults"
        if text.trim().is_empty() { return Ok(Configuration::default()); }

        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Configuration, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = Configuration::from_yaml(&text)?;
        log::info!("loaded configuration from {}", path.display());

        Ok(config)
    }

    /// Loads the configuration from the default location; falls back to defaults if it cannot be loaded.
    pub fn load_default() -> Configuration {
        let file_path = config_file_path();
        match Configuration::load(&file_path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("failed to load configuration from {} ({}); using defaults", file_path.display(), e);
                Configuration::default()
            }
        }
    }

    /// Validates the configuration and converts it to the controller's representation.
    pub fn controller_config(&self) -> Result<ControllerConfig, ConfigError> {
        let controller_config = ControllerConfig{
            following: FollowingConfig{
                algorithm_name: self.algorithm_name.clone(),
                max_delta_azimuth_deg: self.algorithm_config.max_delta_azimuth,
                max_delta_elevation_deg: self.algorithm_config.max_delta_elevation,
                enable_elevation_motion: self.enable_elevation_motion
            },
            vignetting: VignetteConfig{
                azimuth_partial_deg: self.vignetting.azimuth_partial,
                azimuth_full_deg: self.vignetting.azimuth_full,
                shutter_partial_fraction: self.vignetting.shutter_partial,
                shutter_full_fraction: self.vignetting.shutter_full,
                unknown_shutter: self.vignetting.unknown_shutter,
                max_telemetry_age: seconds("vignetting.max_telemetry_age", self.vignetting.max_telemetry_age)?,
                scale_azimuth_by_elevation: self.vignetting.scale_azimuth_by_elevation
            },
            command_timeout: seconds("command_timeout", self.command_timeout)?
        };
        controller_config.validate()?;

        Ok(controller_config)
    }

    pub fn heartbeat_interval(&self) -> Result<Duration, ConfigError> {
        seconds("heartbeat_interval", self.heartbeat_interval)
    }
}

/// Converts a positive number of seconds to `Duration`.
fn seconds(name: &str, value: f64) -> Result<Duration, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(Duration::from_secs_f64(value))
    } else {
        Err(ConfigError::InvalidThreshold{ name: name.to_string(), value })
    }
}

pub fn config_file_path() -> PathBuf {
    dirs::config_dir().unwrap_or_default().join(CONFIG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_empty_document_use_defaults() {
        let config = Configuration::from_yaml("").unwrap();
        assert_eq!(Configuration::default(), config);

        let controller_config = config.controller_config().unwrap();
        assert_eq!("deadband", controller_config.following.algorithm_name);
        assert_eq!(3.5, controller_config.following.max_delta_azimuth_deg);
        assert_eq!(4.0, controller_config.following.max_delta_elevation_deg);
        assert!(!controller_config.following.enable_elevation_motion);
        assert_eq!(Duration::from_secs(120), controller_config.command_timeout);
        assert_eq!(Duration::from_secs(1), config.heartbeat_interval().unwrap());
    }

    #[test]
    fn given_partial_document_fill_in_defaults() {
        let config = Configuration::from_yaml(
r#"
algorithm_name: simple
algorithm_config:
  max_delta_azimuth: 5
enable_elevation_motion: true
vignetting:
  unknown_shutter: not_vignetted
"#
        ).unwrap();

        assert_eq!("simple", config.algorithm_name);
        assert_eq!(5.0, config.algorithm_config.max_delta_azimuth);
        assert_eq!(algorithm::DEFAULT_MAX_DELTA_ELEVATION, config.algorithm_config.max_delta_elevation);
        assert!(config.enable_elevation_motion);
        assert_eq!(UnknownShutterPolicy::NotVignetted, config.vignetting.unknown_shutter);
        assert_eq!(vignetting::DEFAULT_AZIMUTH_PARTIAL, config.vignetting.azimuth_partial);
        assert!(config.controller_config().is_ok());
    }

    #[test]
    fn given_unknown_field_fail() {
        assert!(matches!(Configuration::from_yaml("max_delta_azimuth: 5\n"), Err(ConfigError::Parse(_))));
        assert!(matches!(
            Configuration::from_yaml("algorithm_config:\n  max_delta_azimut: 5\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn given_unknown_algorithm_fail_validation() {
        let config = Configuration::from_yaml("algorithm_name: predictive\n").unwrap();
        assert!(matches!(config.controller_config(), Err(ConfigError::UnknownAlgorithm{ .. })));
    }

    #[test]
    fn given_negative_threshold_fail_validation() {
        let config = Configuration::from_yaml("algorithm_config:\n  max_delta_elevation: -1\n").unwrap();
        assert!(matches!(config.controller_config(), Err(ConfigError::InvalidThreshold{ .. })));
    }

    #[test]
    fn given_non_positive_durations_fail_validation() {
        let config = Configuration::from_yaml("command_timeout: 0\n").unwrap();
        assert!(matches!(config.controller_config(), Err(ConfigError::InvalidThreshold{ .. })));

        let config = Configuration::from_yaml("heartbeat_interval: -2.5\n").unwrap();
        assert!(config.heartbeat_interval().is_err());
    }

    #[test]
    fn given_missing_file_fail_with_io_error() {
        let path = std::env::temp_dir().join("dometrack_nonexistent_dir").join("none.yaml");
        assert!(matches!(Configuration::load(&path), Err(ConfigError::Io(_))));
    }
}
