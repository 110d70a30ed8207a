use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    compositor::{ScreenLayout, VerticalAnchor},
    error::{ConfigError, LayoutError, Result},
    source::{Orientation, SourceMode},
};

/// Main configuration for dual-wallpaper
///
/// Every section falls back to its defaults, so a config file only needs
/// the values that differ.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the wallpaper comes from
    pub source: SourceConfig,

    /// Physical panel sizes and gap
    pub layout: LayoutConfig,

    /// Where and how the panels are written
    pub output: OutputConfig,

    /// External tool that sets the wallpapers
    pub applier: ApplierConfig,

    /// Directory of the loaded config file, used to resolve relative paths
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file (or JSON, by extension)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let mut config: Config = if is_json {
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?
        };

        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            key: "config".to_string(),
            value: e.to_string(),
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.source.validate()?;
        self.layout.to_layout()?;
        self.output.validate()?;
        self.applier.validate()?;
        Ok(())
    }

    /// Resolve a possibly relative path against the config file's directory
    pub fn resolve_path<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        let path = path.as_ref();
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Output directory with relative paths resolved
    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.output.dir)
    }
}

/// Image source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Provider strategy
    pub mode: SourceMode,

    /// Pexels API key; empty or missing means fall back to Reddit
    pub api_key: Option<String>,

    /// Search query
    pub theme: String,

    /// Minimum acceptable image width
    pub min_width: u32,

    /// Minimum acceptable image height
    pub min_height: u32,

    /// Preferred photo orientation for search
    pub orientation: Orientation,

    /// Use a local fixture image instead of the network
    pub test_mode: bool,

    /// Fixture image path, required with `test_mode`
    pub test_image: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            mode: SourceMode::Pexels,
            api_key: None,
            theme: "black and white minimalist".to_string(),
            min_width: 1920,
            min_height: 1695,
            orientation: Orientation::Landscape,
            test_mode: false,
            test_image: None,
        }
    }
}

impl SourceConfig {
    /// The API key, if it is actually set
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    fn validate(&self) -> Result<()> {
        if self.test_mode && self.test_image.is_none() {
            return Err(ConfigError::MissingKey {
                key: "source.test_image".to_string(),
            }
            .into());
        }

        if self.theme.trim().is_empty() && !self.test_mode {
            return Err(ConfigError::InvalidValue {
                key: "source.theme".to_string(),
                value: format!("{:?}", self.theme),
            }
            .into());
        }

        Ok(())
    }
}

/// Panel geometry as written in the config file
///
/// Values are signed so that zero or negative entries surface as layout
/// errors rather than parse failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub upper_width: i64,
    pub upper_height: i64,
    pub lower_width: i64,
    pub lower_height: i64,
    pub offset_px: i64,
    pub vertical_anchor: VerticalAnchor,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            upper_width: 1920,
            upper_height: 1080,
            lower_width: 1920,
            lower_height: 515,
            offset_px: 100,
            vertical_anchor: VerticalAnchor::Top,
        }
    }
}

impl LayoutConfig {
    /// Convert to a validated [`ScreenLayout`]
    pub fn to_layout(&self) -> Result<ScreenLayout> {
        let upper = (
            panel_dimension("upper_width", self.upper_width)?,
            panel_dimension("upper_height", self.upper_height)?,
        );
        let lower = (
            panel_dimension("lower_width", self.lower_width)?,
            panel_dimension("lower_height", self.lower_height)?,
        );
        let offset_px = u32::try_from(self.offset_px)
            .map_err(|_| LayoutError::invalid("offset_px", self.offset_px))?;

        let layout = ScreenLayout::new(upper, lower, offset_px)?;
        layout.canvas()?;
        Ok(layout)
    }
}

fn panel_dimension(field: &str, value: i64) -> Result<u32> {
    match u32::try_from(value) {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(LayoutError::invalid(field, value).into()),
    }
}

/// Output file settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for the two panel images
    pub dir: PathBuf,

    /// JPEG quality (1-100)
    pub jpeg_quality: u8,

    /// File name of the upper panel image
    pub upper_name: String,

    /// File name of the lower panel image
    pub lower_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./temp"),
            jpeg_quality: 95,
            upper_name: "wallpaper_upper.jpg".to_string(),
            lower_name: "wallpaper_lower.jpg".to_string(),
        }
    }
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::InvalidValue {
                key: "output.jpeg_quality".to_string(),
                value: self.jpeg_quality.to_string(),
            }
            .into());
        }

        if self.upper_name.is_empty() || self.upper_name == self.lower_name {
            return Err(ConfigError::InvalidValue {
                key: "output.upper_name".to_string(),
                value: self.upper_name.clone(),
            }
            .into());
        }

        Ok(())
    }
}

/// Wallpaper applier settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplierConfig {
    /// Executable invoked as `<exe> -m <monitor> <file>`; unset means persist only
    pub exe_path: Option<PathBuf>,

    /// Pause between setting the upper and lower wallpaper (milliseconds)
    pub delay_ms: u64,

    /// Per-call timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for ApplierConfig {
    fn default() -> Self {
        Self {
            exe_path: None,
            delay_ms: 1000,
            timeout_secs: 10,
        }
    }
}

impl ApplierConfig {
    fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "applier.timeout_secs".to_string(),
                value: self.timeout_secs.to_string(),
            }
            .into());
        }
        Ok(())
    }
}
