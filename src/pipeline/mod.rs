//! # Wallpaper Pipeline
//!
//! Ties the image source, compositor, store and applier together into a
//! single fetch → compose → persist → apply run.

pub mod engine;

pub use engine::{RunReport, WallpaperEngine};
