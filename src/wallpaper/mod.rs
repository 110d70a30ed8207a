//! # Wallpaper Output
//!
//! Persists the composed panels and hands them to whatever sets the
//! desktop backgrounds. The applier always receives the upper panel first.

pub mod applier;
pub mod store;

pub use applier::{
    applier_from_config, ExternalCommandApplier, NoopApplier, WallpaperApplier, LOWER_MONITOR,
    UPPER_MONITOR,
};
pub use store::{SavedWallpapers, WallpaperStore};
