//! # Dual-Wallpaper
//!
//! Fetch one image and split it into two wallpapers for a laptop whose two
//! screens are stacked vertically with a fixed gap between them.
//!
//! The source is scaled once, uniformly, to cover the combined area of both
//! panels plus the gap, then cut into an upper and a lower panel that share
//! the same horizontal window. Shown on the physical screens, the two images
//! read as one continuous picture.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dual_wallpaper::{config::Config, pipeline::WallpaperEngine};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::from_file("config.toml")?;
//! let engine = WallpaperEngine::from_config(&config)?;
//!
//! let report = engine.run().await?;
//! println!("Saved {:?} and {:?}", report.saved.upper, report.saved.lower);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`compositor`] - Cover scaling and the two-panel crop (pure, no I/O)
//! - [`source`] - Image sources: Pexels, Reddit or a local fixture
//! - [`wallpaper`] - Saving panels and applying them as backgrounds
//! - [`pipeline`] - The sequential fetch → compose → persist → apply run
//! - [`config`] - Configuration management

pub mod compositor;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod source;
pub mod wallpaper;

// Re-export commonly used types for convenience
pub use crate::{
    compositor::{compose, CompositeResult, Compositor, ScreenLayout, SourceImage},
    config::Config,
    error::{Result, WallpaperError},
    pipeline::WallpaperEngine,
    wallpaper::WallpaperApplier,
};
