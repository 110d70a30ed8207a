use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the dual-wallpaper library
#[derive(Error, Debug)]
pub enum WallpaperError {
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    #[error("Image source error: {0}")]
    Source(#[from] SourceError),

    #[error("Wallpaper apply error: {0}")]
    Apply(#[from] ApplyError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Screen layout errors
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Invalid screen layout: {field} = {value}")]
    InvalidLayout { field: String, value: String },
}

/// Image decoding, encoding and persistence errors
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Invalid source image: {reason}")]
    InvalidImage { reason: String },

    #[error("Image encoding failed: {reason}")]
    EncodeFailed { reason: String },

    #[error("Failed to save image: {path}: {reason}")]
    SaveFailed { path: String, reason: String },
}

/// Image source errors
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("{provider} unavailable: {reason}")]
    Unavailable { provider: String, reason: String },

    #[error("{provider} returned no image of at least {min_width}x{min_height}")]
    NoSuitableImage {
        provider: String,
        min_width: u32,
        min_height: u32,
    },

    #[error("Fixture image not found: {path}")]
    FixtureNotFound { path: String },
}

/// Wallpaper applier errors
#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("Wallpaper executable not found: {path}")]
    ExecutableNotFound { path: PathBuf },

    #[error("Wallpaper file not found: {path}")]
    MissingFile { path: PathBuf },

    #[error("Setting wallpaper on monitor {monitor} failed: {stderr}")]
    CommandFailed { monitor: u8, stderr: String },

    #[error("Setting wallpaper on monitor {monitor} timed out after {seconds}s")]
    TimedOut { monitor: u8, seconds: u64 },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}: {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {key}")]
    MissingKey { key: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using WallpaperError
pub type Result<T> = std::result::Result<T, WallpaperError>;

impl LayoutError {
    pub fn invalid<F: Into<String>, V: ToString>(field: F, value: V) -> Self {
        Self::InvalidLayout {
            field: field.into(),
            value: value.to_string(),
        }
    }
}

impl ImageError {
    pub fn invalid<S: Into<String>>(reason: S) -> Self {
        Self::InvalidImage {
            reason: reason.into(),
        }
    }
}

impl SourceError {
    pub fn unavailable<P: Into<String>, R: ToString>(provider: P, reason: R) -> Self {
        Self::Unavailable {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }
}

impl WallpaperError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            // IO errors might be temporary
            Self::Io(_) => true,
            // Another fetch may return a different, usable image
            Self::Source(SourceError::Unavailable { .. }) => true,
            Self::Source(SourceError::NoSuitableImage { .. }) => true,
            Self::Image(ImageError::InvalidImage { .. }) => true,
            Self::Apply(ApplyError::TimedOut { .. }) => true,
            // Layout and configuration errors are bugs in the setup
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Layout(LayoutError::InvalidLayout { field, value }) => {
                format!(
                    "Screen layout value '{}' = {} is invalid. Panel sizes must be positive and the offset non-negative.",
                    field, value
                )
            }
            Self::Source(SourceError::Unavailable { provider, .. }) => {
                format!("Could not download a wallpaper from {}. Check your network connection and API key.", provider)
            }
            Self::Source(SourceError::FixtureNotFound { path }) => {
                format!("Test image '{}' not found.", path)
            }
            Self::Apply(ApplyError::ExecutableNotFound { path }) => {
                format!("Wallpaper tool '{}' not found. Check applier.exe_path in your configuration.", path.display())
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
