use std::borrow::Cow;

use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::debug;

use crate::compositor::layout::{CropPlan, Rect, ScreenLayout, VerticalAnchor};
use crate::compositor::types::{CompositeResult, SourceImage};
use crate::error::{ImageError, Result};

/// Splits one source image into upper and lower panel wallpapers
///
/// The source is cover-scaled onto the combined canvas (both panels plus
/// the gap) with a single scale factor, then both panels are cut from the
/// same horizontal window so content lines up across the seam.
#[derive(Debug, Clone, Copy)]
pub struct Compositor {
    anchor: VerticalAnchor,
    filter: FilterType,
}

impl Default for Compositor {
    fn default() -> Self {
        Self {
            anchor: VerticalAnchor::Top,
            // Bicubic
            filter: FilterType::CatmullRom,
        }
    }
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_anchor(mut self, anchor: VerticalAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Compute the crop geometry without touching pixels
    pub fn plan(&self, source: &SourceImage, layout: &ScreenLayout) -> Result<CropPlan> {
        let (width, height) = source.dimensions();
        CropPlan::compute(width, height, layout, self.anchor)
    }

    /// Produce the two panel images
    ///
    /// # Errors
    ///
    /// `InvalidLayout` when any panel dimension is zero, `InvalidImage` when
    /// the source has no pixels.
    pub fn compose(&self, source: &SourceImage, layout: &ScreenLayout) -> Result<CompositeResult> {
        let plan = self.plan(source, layout)?;
        self.compose_planned(source, &plan)
    }

    /// Produce the two panel images from an already computed plan
    ///
    /// # Errors
    ///
    /// `InvalidImage` when the plan was computed for a different source size.
    pub fn compose_planned(&self, source: &SourceImage, plan: &CropPlan) -> Result<CompositeResult> {
        let (width, height) = source.dimensions();
        if (width, height) != (plan.source_width, plan.source_height) {
            return Err(ImageError::invalid(format!(
                "plan computed for {}x{}, source is {}x{}",
                plan.source_width, plan.source_height, width, height
            ))
            .into());
        }

        debug!(
            "Scaling {}x{} by {:.3} to {}x{}",
            width, height, plan.scale, plan.scaled_width, plan.scaled_height
        );

        let (window, target) = plan.sampling_window();
        if plan.is_oversized() {
            debug!(
                "Resampling source window {:?} to {}x{} at ({}, {})",
                window, target.width, target.height, target.x, target.y
            );
        }

        let region: Cow<'_, RgbImage> = if (window.width, window.height) == (width, height) {
            Cow::Borrowed(source.as_image())
        } else {
            Cow::Owned(
                imageops::crop_imm(
                    source.as_image(),
                    window.x,
                    window.y,
                    window.width,
                    window.height,
                )
                .to_image(),
            )
        };

        let scaled: Cow<'_, RgbImage> = if region.dimensions() != (target.width, target.height) {
            Cow::Owned(imageops::resize(
                region.as_ref(),
                target.width,
                target.height,
                self.filter,
            ))
        } else {
            region
        };

        debug!(
            "Cropping upper at ({}, {}), lower at ({}, {})",
            plan.upper.x, plan.upper.y, plan.lower.x, plan.lower.y
        );

        let upper_output = crop_panel(scaled.as_ref(), plan.upper, target);
        let lower_output = crop_panel(scaled.as_ref(), plan.lower, target);

        Ok(CompositeResult {
            upper_output,
            lower_output,
            x_offset: plan.x_offset,
            upper_rect: plan.upper,
            lower_rect: plan.lower,
        })
    }
}

/// Cut a panel given in scaled-source coordinates out of the resampled `target` window
fn crop_panel(scaled: &RgbImage, panel: Rect, target: Rect) -> RgbImage {
    let local = Rect::new(
        panel.x.saturating_sub(target.x),
        panel.y.saturating_sub(target.y),
        panel.width,
        panel.height,
    )
    .clamp_within(scaled.width(), scaled.height());

    imageops::crop_imm(scaled, local.x, local.y, local.width, local.height).to_image()
}

/// Compose with the default compositor (top anchor, bicubic resampling)
pub fn compose(source: &SourceImage, layout: &ScreenLayout) -> Result<CompositeResult> {
    Compositor::default().compose(source, layout)
}
