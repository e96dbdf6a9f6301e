//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and field is optional; missing values fall back to the
//! defaults below.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{PadwatchError, Result};
use crate::source::{
    LEFT_THUMB_DEADZONE, MAX_SLOTS, RIGHT_THUMB_DEADZONE, THUMB_MAX, TRIGGER_MAX,
    TRIGGER_THRESHOLD,
};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub controller: ControllerConfig,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Deadzones and trigger thresholds, as fractions of full scale
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ControllerConfig {
    #[serde(default = "default_left_thumb_deadzone")]
    pub left_thumb_deadzone: f32,

    #[serde(default = "default_right_thumb_deadzone")]
    pub right_thumb_deadzone: f32,

    #[serde(default = "default_trigger_threshold")]
    pub left_trigger_threshold: f32,

    #[serde(default = "default_trigger_threshold")]
    pub right_trigger_threshold: f32,
}

/// Observation loop configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Number of slots probed at startup
    #[serde(default = "default_max_slots")]
    pub max_slots: u8,

    /// Dispatch per-key transitions
    #[serde(default)]
    pub keystrokes: bool,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily log files. Empty logs to the console only.
    #[serde(default)]
    pub directory: String,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

// Default value functions
fn default_left_thumb_deadzone() -> f32 { f32::from(LEFT_THUMB_DEADZONE) / THUMB_MAX as f32 }
fn default_right_thumb_deadzone() -> f32 { f32::from(RIGHT_THUMB_DEADZONE) / THUMB_MAX as f32 }
fn default_trigger_threshold() -> f32 { f32::from(TRIGGER_THRESHOLD) / TRIGGER_MAX as f32 }

fn default_interval_ms() -> u64 { 5 }
fn default_max_slots() -> u8 { MAX_SLOTS }

fn default_log_level() -> String { "info".to_string() }
fn default_file_prefix() -> String { "padwatch.log".to_string() }

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            left_thumb_deadzone: default_left_thumb_deadzone(),
            right_thumb_deadzone: default_right_thumb_deadzone(),
            left_trigger_threshold: default_trigger_threshold(),
            right_trigger_threshold: default_trigger_threshold(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_slots: default_max_slots(),
            keystrokes: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
            file_prefix: default_file_prefix(),
        }
    }
}

fn invalid(message: impl std::fmt::Display) -> PadwatchError {
    PadwatchError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use padwatch::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a TOML string
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Deadzones and thresholds must leave some travel
        for (name, value) in [
            ("left_thumb_deadzone", self.controller.left_thumb_deadzone),
            ("right_thumb_deadzone", self.controller.right_thumb_deadzone),
            ("left_trigger_threshold", self.controller.left_trigger_threshold),
            ("right_trigger_threshold", self.controller.right_trigger_threshold),
        ] {
            if !(0.0..1.0).contains(&value) {
                return Err(invalid(format!("{} must be in [0.0, 1.0)", name)));
            }
        }

        if self.polling.interval_ms == 0 || self.polling.interval_ms > 1000 {
            return Err(invalid("interval_ms must be between 1 and 1000"));
        }

        if self.polling.max_slots == 0 || self.polling.max_slots > MAX_SLOTS {
            return Err(invalid(format!("max_slots must be between 1 and {}", MAX_SLOTS)));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(invalid(format!(
                "log level must be one of: {}",
                LOG_LEVELS.join(", ")
            )));
        }

        if !self.logging.directory.is_empty() && self.logging.file_prefix.is_empty() {
            return Err(invalid("file_prefix cannot be empty when a log directory is set"));
        }

        Ok(())
    }
}
