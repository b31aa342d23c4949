//! Drawing surface configuration.
//!
//! Defaults match the stock surface (4:3, 2px red lines, 50px grid).
//! Configuration can be loaded from a flat `key = value` file, environment
//! variables, or built programmatically.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Settings for one drawing surface.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawboardConfig {
    /// Surface width over height; fixed for the surface's lifetime
    pub aspect_ratio: f64,
    /// Stroke width of new line segments, in canvas pixels
    pub line_width: f64,
    /// Stroke colour of new line segments
    pub line_color: String,
    /// Distance between grid lines, in canvas pixels
    pub grid_spacing: f64,
    /// Distance of markers A and B from the origin, in canvas pixels
    pub marker_offset: f64,
    /// Wheel delta that changes the zoom by 1.0
    pub wheel_divisor: f64,
}

impl Default for DrawboardConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: 4.0 / 3.0,
            line_width: 2.0,
            line_color: "red".to_string(),
            grid_spacing: 50.0,
            marker_offset: 100.0,
            wheel_divisor: 1000.0,
        }
    }
}

const ENV_ASPECT_RATIO: &str = "DRAWBOARD_ASPECT_RATIO";
const ENV_LINE_WIDTH: &str = "DRAWBOARD_LINE_WIDTH";
const ENV_LINE_COLOR: &str = "DRAWBOARD_LINE_COLOR";
const ENV_GRID_SPACING: &str = "DRAWBOARD_GRID_SPACING";
const ENV_MARKER_OFFSET: &str = "DRAWBOARD_MARKER_OFFSET";
const ENV_WHEEL_DIVISOR: &str = "DRAWBOARD_WHEEL_DIVISOR";

impl DrawboardConfig {
    /// Sets the aspect ratio.
    ///
    /// Like every numeric builder, keeps the current value when given a
    /// non-finite or non-positive one.
    pub fn with_aspect_ratio(mut self, aspect_ratio: f64) -> Self {
        self.aspect_ratio = positive_or(self.aspect_ratio, aspect_ratio, "aspect_ratio");
        self
    }

    /// Sets the stroke width and colour of new segments.
    pub fn with_line(mut self, width: f64, color: impl Into<String>) -> Self {
        self.line_width = positive_or(self.line_width, width, "line_width");
        self.line_color = color.into();
        self
    }

    /// Sets the grid spacing.
    pub fn with_grid_spacing(mut self, spacing: f64) -> Self {
        self.grid_spacing = positive_or(self.grid_spacing, spacing, "grid_spacing");
        self
    }

    /// Sets the marker offset.
    pub fn with_marker_offset(mut self, offset: f64) -> Self {
        self.marker_offset = positive_or(self.marker_offset, offset, "marker_offset");
        self
    }

    /// Sets the wheel divisor.
    pub fn with_wheel_divisor(mut self, divisor: f64) -> Self {
        self.wheel_divisor = positive_or(self.wheel_divisor, divisor, "wheel_divisor");
        self
    }

    /// Returns the default config file location for the current platform.
    ///
    /// - Linux: ~/.config/drawboard/drawboard.conf
    /// - macOS: ~/Library/Application Support/drawboard/drawboard.conf
    /// - Windows: %APPDATA%\drawboard\drawboard.conf
    pub fn default_config_path() -> PathBuf {
        match dirs::config_dir() {
            Some(dir) => dir.join("drawboard").join("drawboard.conf"),
            None => PathBuf::from("drawboard.conf"),
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// Environment variables:
    /// - `DRAWBOARD_ASPECT_RATIO`: decimal or `W/H` (default: 4/3)
    /// - `DRAWBOARD_LINE_WIDTH`: stroke width in pixels (default: 2)
    /// - `DRAWBOARD_LINE_COLOR`: stroke colour (default: red)
    /// - `DRAWBOARD_GRID_SPACING`: grid spacing in pixels (default: 50)
    /// - `DRAWBOARD_MARKER_OFFSET`: marker offset in pixels (default: 100)
    /// - `DRAWBOARD_WHEEL_DIVISOR`: wheel delta per zoom unit (default: 1000)
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] naming the first variable that
    /// does not hold a positive number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var(ENV_ASPECT_RATIO) {
            config.aspect_ratio = parse_ratio(&val, ENV_ASPECT_RATIO)?;
        }
        if let Ok(val) = std::env::var(ENV_LINE_WIDTH) {
            config.line_width = parse_positive(&val, ENV_LINE_WIDTH)?;
        }
        if let Ok(val) = std::env::var(ENV_LINE_COLOR) {
            config.line_color = parse_color(&val, ENV_LINE_COLOR)?;
        }
        if let Ok(val) = std::env::var(ENV_GRID_SPACING) {
            config.grid_spacing = parse_positive(&val, ENV_GRID_SPACING)?;
        }
        if let Ok(val) = std::env::var(ENV_MARKER_OFFSET) {
            config.marker_offset = parse_positive(&val, ENV_MARKER_OFFSET)?;
        }
        if let Ok(val) = std::env::var(ENV_WHEEL_DIVISOR) {
            config.wheel_divisor = parse_positive(&val, ENV_WHEEL_DIVISOR)?;
        }

        Ok(config)
    }

    /// Loads configuration from a `key = value` file.
    ///
    /// ```text
    /// aspect_ratio = 4/3
    /// line_width = 2
    /// line_color = "red"
    /// grid_spacing = 50
    /// marker_offset = 100
    /// wheel_divisor = 1000
    /// ```
    ///
    /// Missing keys keep their defaults; unknown keys are ignored.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        contents.parse()
    }

    /// Saves configuration, creating parent directories as needed.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_file_contents())?;
        Ok(())
    }

    fn to_file_contents(&self) -> String {
        format!(
            "# drawboard configuration\n\
             aspect_ratio = {}\n\
             line_width = {}\n\
             line_color = \"{}\"\n\
             grid_spacing = {}\n\
             marker_offset = {}\n\
             wheel_divisor = {}\n",
            self.aspect_ratio,
            self.line_width,
            self.line_color,
            self.grid_spacing,
            self.marker_offset,
            self.wheel_divisor
        )
    }
}

impl std::str::FromStr for DrawboardConfig {
    type Err = ConfigError;

    fn from_str(contents: &str) -> Result<Self, Self::Err> {
        let mut config = Self::default();

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim().trim_matches('"');

            match key {
                "aspect_ratio" => config.aspect_ratio = parse_ratio(value, key)?,
                "line_width" => config.line_width = parse_positive(value, key)?,
                "line_color" => config.line_color = parse_color(value, key)?,
                "grid_spacing" => config.grid_spacing = parse_positive(value, key)?,
                "marker_offset" => config.marker_offset = parse_positive(value, key)?,
                "wheel_divisor" => config.wheel_divisor = parse_positive(value, key)?,
                _ => log::debug!("ignoring unknown config key {key:?}"),
            }
        }

        Ok(config)
    }
}

fn positive_or(current: f64, value: f64, key: &str) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        log::warn!("ignoring invalid {key} {value}, keeping {current}");
        current
    }
}

fn parse_positive(value: &str, key: &str) -> Result<f64, ConfigError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
        .ok_or_else(|| ConfigError::InvalidValue(key.to_string()))
}

/// Accepts a plain number or `W/H`.
fn parse_ratio(value: &str, key: &str) -> Result<f64, ConfigError> {
    match value.split_once('/') {
        Some((width, height)) => {
            let ratio = parse_positive(width, key)? / parse_positive(height, key)?;
            Ok(ratio)
        }
        None => parse_positive(value, key),
    }
}

fn parse_color(value: &str, key: &str) -> Result<String, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::InvalidValue(key.to_string()));
    }
    Ok(value.to_string())
}

/// Errors that can occur during configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid value for a configuration key or variable
    #[error("invalid value for configuration key: {0}")]
    InvalidValue(String),
    /// I/O error reading or writing the configuration file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
