//! # Dual-Screen Compositor
//!
//! Turns one source image into two panel wallpapers for a pair of
//! vertically stacked screens separated by a fixed pixel gap.
//!
//! ## Algorithm
//!
//! 1. Build the combined canvas: `max(upper_width, lower_width)` wide and
//!    `upper_height + offset_px + lower_height` tall.
//! 2. Cover-scale the source onto the canvas with one uniform factor.
//! 3. Center the canvas horizontally in the scaled source.
//! 4. Cut the upper panel at the top of the canvas and the lower panel
//!    `upper_height + offset_px` below it, sharing the same `x` offset.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dual_wallpaper::compositor::{compose, ScreenLayout, SourceImage};
//!
//! # fn main() -> anyhow::Result<()> {
//! let bytes = std::fs::read("photo.jpg")?;
//! let source = SourceImage::decode(&bytes)?;
//! let layout = ScreenLayout::new((1920, 1080), (1920, 515), 100)?;
//!
//! let result = compose(&source, &layout)?;
//! result.upper_output.save("upper.png")?;
//! result.lower_output.save("lower.png")?;
//! # Ok(())
//! # }
//! ```

pub mod compose;
pub mod layout;
pub mod types;

pub use compose::{compose, Compositor};
pub use layout::{Canvas, CropPlan, Rect, ScreenLayout, VerticalAnchor};
pub use types::{encode_jpeg, CompositeResult, SourceImage};
