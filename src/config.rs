//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and field is optional; an empty file yields
//! [`Config::default()`].

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{PadscopeError, Result};
use crate::scene::{Paint, PRESSED_PAINT};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub frame: FrameConfig,

    #[serde(default)]
    pub thresholds: ThresholdConfig,

    #[serde(default)]
    pub binding: BindingConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub asset: AssetConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Input device configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DeviceConfig {
    /// Pin a single `/dev/input/eventN` node. Empty means auto-detect.
    #[serde(default)]
    pub device_path: String,

    #[serde(default = "default_rescan_interval_ms")]
    pub rescan_interval_ms: u64,
}

/// Frame loop configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FrameConfig {
    #[serde(default = "default_refresh_hz")]
    pub refresh_hz: u32,
}

/// Pressed-state thresholds, per input class
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ThresholdConfig {
    /// Threshold for digital buttons.
    #[serde(default = "default_digital_threshold")]
    pub digital: f32,

    /// Threshold for the analog trigger slots.
    #[serde(default = "default_analog_trigger_threshold")]
    pub analog_trigger: f32,

    /// Button indices treated as analog triggers (left, right).
    #[serde(default = "default_trigger_indices")]
    pub trigger_indices: Vec<usize>,
}

/// One index-to-node entry of the binding table
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ButtonMapping {
    pub index: usize,
    pub node: String,
}

/// Button-to-model binding configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BindingConfig {
    #[serde(default = "default_pressed_color")]
    pub pressed_color: Paint,

    #[serde(default = "default_button_map")]
    pub buttons: Vec<ButtonMapping>,
}

/// 2D indicator configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DisplayConfig {
    /// Offset of a stick dot at full deflection.
    #[serde(default = "default_stick_scale")]
    pub stick_scale: f32,
}

/// Model asset configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AssetConfig {
    #[serde(default = "default_asset_path")]
    pub path: String,
}

/// Which renderer draws the frames
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Terminal,
    Headless,
}

/// Renderer configuration
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct RenderConfig {
    #[serde(default)]
    pub mode: RenderMode,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for the log file while the terminal renderer owns the screen.
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

// Default value functions
fn default_rescan_interval_ms() -> u64 { 1000 }

fn default_refresh_hz() -> u32 { 60 }

fn default_digital_threshold() -> f32 { 0.01 }
fn default_analog_trigger_threshold() -> f32 { 0.1 }
fn default_trigger_indices() -> Vec<usize> { vec![6, 7] }

fn default_pressed_color() -> Paint { PRESSED_PAINT }

fn default_stick_scale() -> f32 { 25.0 }

fn default_asset_path() -> String { "assets/ps4_controller.json".to_string() }

fn default_log_level() -> String { "info".to_string() }
fn default_log_dir() -> String { "./logs".to_string() }

/// Standard-gamepad button order mapped onto the bundled model's node names.
fn default_button_map() -> Vec<ButtonMapping> {
    [
        (0, "button_cross"),
        (1, "button_circle"),
        (2, "button_square"),
        (3, "button_triangle"),
        (4, "button_l1"),
        (5, "button_r1"),
        (6, "button_l2"),
        (7, "button_r2"),
        (8, "button_share"),
        (9, "button_options"),
        (10, "button_l3"),
        (11, "button_r3"),
        (12, "button_dpad_up"),
        (13, "button_dpad_down"),
        (14, "button_dpad_left"),
        (15, "button_dpad_right"),
        (16, "button_ps"),
        (17, "button_touchpad"),
    ]
    .into_iter()
    .map(|(index, node)| ButtonMapping {
        index,
        node: node.to_string(),
    })
    .collect()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_path: String::new(),
            rescan_interval_ms: default_rescan_interval_ms(),
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self { refresh_hz: default_refresh_hz() }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            digital: default_digital_threshold(),
            analog_trigger: default_analog_trigger_threshold(),
            trigger_indices: default_trigger_indices(),
        }
    }
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            pressed_color: default_pressed_color(),
            buttons: default_button_map(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { stick_scale: default_stick_scale() }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self { path: default_asset_path() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: default_log_dir(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
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
    /// use padscope::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to built-in defaults
    ///
    /// A file that exists but fails to parse or validate is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            Self::load(path)
        } else {
            info!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.device.rescan_interval_ms == 0 || self.device.rescan_interval_ms > 60000 {
            return Err(invalid("rescan_interval_ms must be between 1 and 60000"));
        }

        if self.frame.refresh_hz == 0 || self.frame.refresh_hz > 240 {
            return Err(invalid("refresh_hz must be between 1 and 240"));
        }

        for (name, value) in [
            ("digital", self.thresholds.digital),
            ("analog_trigger", self.thresholds.analog_trigger),
        ] {
            if !(0.0..1.0).contains(&value) {
                return Err(invalid(format!("{} threshold must be in [0.0, 1.0)", name)));
            }
        }

        if self.thresholds.trigger_indices.len() != 2 {
            return Err(invalid(
                "trigger_indices must list exactly two button indices (left, right)",
            ));
        }

        if self.thresholds.trigger_indices[0] == self.thresholds.trigger_indices[1] {
            return Err(invalid("trigger_indices must be distinct"));
        }

        // Duplicate indices and names are allowed; empty names can never resolve.
        if let Some(mapping) = self.binding.buttons.iter().find(|m| m.node.trim().is_empty()) {
            return Err(invalid(format!(
                "binding for button {} has an empty node name",
                mapping.index
            )));
        }

        if !(self.display.stick_scale.is_finite() && self.display.stick_scale > 0.0) {
            return Err(invalid("stick_scale must be a positive number"));
        }

        if self.asset.path.is_empty() {
            return Err(invalid("asset path cannot be empty"));
        }

        if self.render.mode == RenderMode::Terminal && self.logging.log_dir.is_empty() {
            return Err(invalid("log_dir cannot be empty with the terminal renderer"));
        }

        Ok(())
    }
}

fn invalid(msg: impl std::fmt::Display) -> PadscopeError {
    PadscopeError::Config(toml::de::Error::custom(msg))
}
