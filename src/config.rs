//! Configuration management for the gesture runtime
//!
//! Runtime policy that is not part of the trained model lives here and is
//! loaded from JSON, so debounce timing and queue sizes can be tuned without
//! recompiling. Model data itself is loaded separately as a
//! `ModelDescriptor`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub postprocess: PostprocessConfig,
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Prediction debounce policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostprocessConfig {
    /// When false, every prediction is emitted raw
    pub enabled: bool,
    /// Minimum time between two debounced emissions
    pub timeout_ms: u64,
    /// Sentinel class for "no gesture recognised"
    pub unknown_class: usize,
    /// Sentinel class for "at rest"
    pub idle_class: usize,
    /// Classes emitted on every prediction, bypassing the timeout
    pub repeatable_classes: Vec<usize>,
}

impl Default for PostprocessConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 800,
            unknown_class: 0,
            idle_class: 9,
            // Rotation right / left
            repeatable_classes: vec![7, 8],
        }
    }
}

/// Sensor feed parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Frames buffered between the sensor producer and the pipeline
    pub queue_capacity: usize,
    /// Values per sensor frame (3-axis accel + 3-axis gyro)
    pub axes: usize,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            axes: 6,
        }
    }
}

/// Inference thread parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Log a heartbeat every N inferences (0 disables it)
    pub log_every_n_inferences: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_every_n_inferences: 100,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration, or the defaults if the file is missing or
    /// its JSON is invalid
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the assets directory
    pub fn load() -> Self {
        Self::load_from_file("assets/gesture_config.json")
    }
}
