use serde::{Deserialize, Serialize};

use crate::error::{ImageError, LayoutError, Result};

/// Physical arrangement of the two stacked panels
///
/// `offset_px` is the visual gap between the bottom edge of the upper panel
/// and the top edge of the lower panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenLayout {
    pub upper_width: u32,
    pub upper_height: u32,
    pub lower_width: u32,
    pub lower_height: u32,
    pub offset_px: u32,
}

impl ScreenLayout {
    /// Create a validated layout
    pub fn new(
        upper: (u32, u32),
        lower: (u32, u32),
        offset_px: u32,
    ) -> Result<Self> {
        let layout = Self {
            upper_width: upper.0,
            upper_height: upper.1,
            lower_width: lower.0,
            lower_height: lower.1,
            offset_px,
        };
        layout.validate()?;
        Ok(layout)
    }

    /// Check that every panel dimension is positive
    pub fn validate(&self) -> Result<()> {
        let dimensions = [
            ("upper_width", self.upper_width),
            ("upper_height", self.upper_height),
            ("lower_width", self.lower_width),
            ("lower_height", self.lower_height),
        ];

        for (field, value) in dimensions {
            if value == 0 {
                return Err(LayoutError::invalid(field, value).into());
            }
        }

        Ok(())
    }

    /// The combined virtual canvas spanning both panels and the gap
    pub fn canvas(&self) -> Result<Canvas> {
        self.validate()?;

        let height = self
            .upper_height
            .checked_add(self.offset_px)
            .and_then(|h| h.checked_add(self.lower_height))
            .ok_or_else(|| LayoutError::invalid("offset_px", self.offset_px))?;

        Ok(Canvas {
            width: self.upper_width.max(self.lower_width),
            height,
        })
    }

    /// Top edge of the lower panel within the canvas
    pub fn lower_top(&self) -> u32 {
        self.upper_height.saturating_add(self.offset_px)
    }
}

/// Conceptual rectangle covering both panels plus the gap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

/// Axis-aligned pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Shift the rectangle back inside `bounds_width x bounds_height`
    ///
    /// Only the position moves; the size is kept.
    pub fn clamp_within(self, bounds_width: u32, bounds_height: u32) -> Self {
        Self {
            x: self.x.min(bounds_width.saturating_sub(self.width)),
            y: self.y.min(bounds_height.saturating_sub(self.height)),
            ..self
        }
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// Where the canvas sits vertically inside the scaled source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAnchor {
    /// Canvas starts at the top row of the scaled source
    #[default]
    Top,
    /// Vertical overflow is split evenly above and below
    Center,
}

/// Widest kernel radius among `image`'s filters (Lanczos3), in source pixels
const FILTER_SUPPORT: f64 = 3.0;

/// Scaled buffers up to this multiple of the canvas area are resampled whole
pub const MAX_OVERSCAN: u64 = 4;

/// Scale and crop geometry for one composition
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CropPlan {
    pub source_width: u32,
    pub source_height: u32,
    pub canvas: Canvas,
    pub scale: f64,
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub x_offset: u32,
    pub y_offset: u32,
    pub upper: Rect,
    pub lower: Rect,
}

impl CropPlan {
    /// Compute the cover scale and both panel rectangles for a source size
    pub fn compute(
        source_width: u32,
        source_height: u32,
        layout: &ScreenLayout,
        anchor: VerticalAnchor,
    ) -> Result<Self> {
        let canvas = layout.canvas()?;

        if source_width == 0 || source_height == 0 {
            return Err(ImageError::invalid(format!(
                "source has zero dimension ({}x{})",
                source_width, source_height
            ))
            .into());
        }

        let scale = f64::max(
            f64::from(canvas.width) / f64::from(source_width),
            f64::from(canvas.height) / f64::from(source_height),
        );

        // Rounding may land a hair short of the canvas; never go below it.
        let scaled_width = scaled_dimension(source_width, scale).max(canvas.width);
        let scaled_height = scaled_dimension(source_height, scale).max(canvas.height);

        let x_offset = (scaled_width - canvas.width) / 2;
        let y_offset = match anchor {
            VerticalAnchor::Top => 0,
            VerticalAnchor::Center => (scaled_height - canvas.height) / 2,
        };

        let upper = Rect::new(x_offset, y_offset, layout.upper_width, layout.upper_height)
            .clamp_within(scaled_width, scaled_height);
        let lower = Rect::new(
            x_offset,
            y_offset + layout.lower_top(),
            layout.lower_width,
            layout.lower_height,
        )
        .clamp_within(scaled_width, scaled_height);

        Ok(Self {
            source_width,
            source_height,
            canvas,
            scale,
            scaled_width,
            scaled_height,
            x_offset,
            y_offset,
            upper,
            lower,
        })
    }

    /// Whether the full scaled source is much larger than the canvas
    pub fn is_oversized(&self) -> bool {
        let scaled = u64::from(self.scaled_width) * u64::from(self.scaled_height);
        let canvas = u64::from(self.canvas.width) * u64::from(self.canvas.height);
        scaled > canvas.saturating_mul(MAX_OVERSCAN)
    }

    /// Source region to resample and the scaled rectangle it maps onto
    ///
    /// Normally that is the whole source onto the whole scaled size. For
    /// oversized plans only the canvas window, padded by the filter
    /// support, is mapped back into source pixels, so the resampled buffer
    /// stays close to the canvas size.
    pub fn sampling_window(&self) -> (Rect, Rect) {
        if !self.is_oversized() {
            return (
                Rect::new(0, 0, self.source_width, self.source_height),
                Rect::new(0, 0, self.scaled_width, self.scaled_height),
            );
        }

        let pad = (FILTER_SUPPORT * self.scale.recip().max(1.0)).ceil() as u32 + 1;
        let (sx, sw, dx, dw) = window_axis(
            self.x_offset,
            self.canvas.width,
            self.source_width,
            self.scaled_width,
            self.scale,
            pad,
        );
        let (sy, sh, dy, dh) = window_axis(
            self.y_offset,
            self.canvas.height,
            self.source_height,
            self.scaled_height,
            self.scale,
            pad,
        );

        (Rect::new(sx, sy, sw, sh), Rect::new(dx, dy, dw, dh))
    }
}

/// One axis of the sampling window: `(source_start, source_len, scaled_start, scaled_len)`
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn window_axis(
    offset: u32,
    extent: u32,
    source_len: u32,
    scaled_len: u32,
    scale: f64,
    pad: u32,
) -> (u32, u32, u32, u32) {
    let end = ((f64::from(offset) + f64::from(extent)) / scale).ceil() as u32;
    let end = end.saturating_add(pad).min(source_len);
    let start = ((f64::from(offset) / scale).floor() as u32)
        .saturating_sub(pad)
        .min(end.saturating_sub(1));

    // The last source pixel ends exactly on the scaled edge
    let edge = |s: u32| {
        if s >= source_len {
            scaled_len
        } else {
            (f64::from(s) * scale).round() as u32
        }
    };
    let scaled_start = edge(start).min(offset);
    let scaled_end = edge(end).max(offset + extent);

    (start, end - start, scaled_start, scaled_end - scaled_start)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scaled_dimension(length: u32, scale: f64) -> u32 {
    let scaled = (f64::from(length) * scale).round();
    if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        (scaled as u32).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WallpaperError;

    fn laptop_layout() -> ScreenLayout {
        ScreenLayout::new((800, 500), (800, 500), 20).unwrap()
    }

    #[test]
    fn test_canvas_spans_both_panels_and_gap() {
        let canvas = laptop_layout().canvas().unwrap();
        assert_eq!(canvas, Canvas { width: 800, height: 1020 });
    }

    #[test]
    fn test_canvas_uses_wider_panel() {
        let layout = ScreenLayout::new((1920, 1080), (1600, 515), 100).unwrap();
        let canvas = layout.canvas().unwrap();
        assert_eq!(canvas.width, 1920);
        assert_eq!(canvas.height, 1695);
    }

    #[test]
    fn test_zero_dimension_is_invalid_layout() {
        let result = ScreenLayout::new((800, 500), (800, 0), 20);
        match result {
            Err(WallpaperError::Layout(LayoutError::InvalidLayout { field, .. })) => {
                assert_eq!(field, "lower_height");
            }
            other => panic!("expected InvalidLayout, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_offset_is_valid() {
        assert!(ScreenLayout::new((800, 500), (800, 500), 0).is_ok());
    }

    #[test]
    fn test_canvas_height_overflow_is_invalid_layout() {
        let layout = ScreenLayout {
            upper_width: 10,
            upper_height: u32::MAX,
            lower_width: 10,
            lower_height: 10,
            offset_px: 1,
        };
        assert!(matches!(layout.canvas(), Err(WallpaperError::Layout(_))));
    }

    #[test]
    fn test_plan_for_square_source() {
        let plan = CropPlan::compute(1000, 1000, &laptop_layout(), VerticalAnchor::Top).unwrap();

        assert!((plan.scale - 1.02).abs() < 1e-9);
        assert_eq!((plan.scaled_width, plan.scaled_height), (1020, 1020));
        assert_eq!(plan.x_offset, 110);
        assert_eq!(plan.upper, Rect::new(110, 0, 800, 500));
        assert_eq!(plan.lower, Rect::new(110, 520, 800, 500));
    }

    #[test]
    fn test_small_source_is_upsampled() {
        let plan = CropPlan::compute(200, 200, &laptop_layout(), VerticalAnchor::Top).unwrap();

        assert!(plan.scale > 1.0);
        assert!((plan.scale - 5.1).abs() < 1e-9);
        assert_eq!((plan.scaled_width, plan.scaled_height), (1020, 1020));
        assert_eq!(plan.upper.x, plan.lower.x);
    }

    #[test]
    fn test_wide_source_is_cropped_horizontally() {
        let plan = CropPlan::compute(4000, 1000, &laptop_layout(), VerticalAnchor::Top).unwrap();

        assert_eq!(plan.scaled_height, 1020);
        assert_eq!(plan.scaled_width, 4080);
        assert_eq!(plan.x_offset, (4080 - 800) / 2);
        assert_eq!(plan.upper.y, 0);
        assert_eq!(plan.lower.y, 520);
    }

    #[test]
    fn test_tall_source_anchors() {
        let layout = laptop_layout();

        let top = CropPlan::compute(800, 3000, &layout, VerticalAnchor::Top).unwrap();
        assert_eq!((top.scaled_width, top.scaled_height), (800, 3000));
        assert_eq!(top.x_offset, 0);
        assert_eq!(top.upper.y, 0);
        let full = Rect::new(0, 0, 800, 3000);
        assert_eq!(top.sampling_window(), (full, full));

        let center = CropPlan::compute(800, 3000, &layout, VerticalAnchor::Center).unwrap();
        assert_eq!(center.y_offset, (3000 - 1020) / 2);
        assert_eq!(center.upper.y, center.y_offset);
        assert_eq!(center.lower.y, center.y_offset + 520);
    }

    #[test]
    fn test_narrow_lower_panel_shares_crop_window() {
        let layout = ScreenLayout::new((1000, 500), (800, 500), 20).unwrap();
        let plan = CropPlan::compute(2000, 1000, &layout, VerticalAnchor::Top).unwrap();

        assert_eq!(plan.upper.x, plan.lower.x);
        assert!(plan.lower.right() <= plan.scaled_width);
        assert!(plan.upper.right() <= plan.scaled_width);
    }

    #[test]
    fn test_plan_rectangles_stay_in_bounds() {
        let layout = ScreenLayout::new((1920, 1080), (1920, 515), 100).unwrap();
        for (w, h) in [(1, 1), (3, 7), (1919, 1694), (6000, 4000), (1366, 768), (333, 2000)] {
            let plan = CropPlan::compute(w, h, &layout, VerticalAnchor::Top).unwrap();
            assert!(plan.upper.right() <= plan.scaled_width, "{}x{}", w, h);
            assert!(plan.lower.right() <= plan.scaled_width, "{}x{}", w, h);
            assert!(plan.lower.bottom() <= plan.scaled_height, "{}x{}", w, h);
        }
    }

    #[test]
    fn test_zero_source_dimension_is_invalid_image() {
        let result = CropPlan::compute(0, 100, &laptop_layout(), VerticalAnchor::Top);
        assert!(matches!(result, Err(WallpaperError::Image(ImageError::InvalidImage { .. }))));
    }

    #[test]
    fn test_rect_clamp_within() {
        let rect = Rect::new(221, 521, 800, 500).clamp_within(1020, 1020);
        assert_eq!(rect, Rect::new(220, 520, 800, 500));

        let untouched = Rect::new(10, 10, 100, 100).clamp_within(1020, 1020);
        assert_eq!(untouched, Rect::new(10, 10, 100, 100));
    }

    #[test]
    fn test_lower_top_saturates_on_unvalidated_layout() {
        assert_eq!(laptop_layout().lower_top(), 520);

        let layout = ScreenLayout {
            upper_width: 10,
            upper_height: u32::MAX,
            lower_width: 10,
            lower_height: 10,
            offset_px: 5,
        };
        assert_eq!(layout.lower_top(), u32::MAX);
    }

    #[test]
    fn test_regular_plan_samples_whole_source() {
        let plan = CropPlan::compute(1000, 1000, &laptop_layout(), VerticalAnchor::Top).unwrap();

        assert!(!plan.is_oversized());
        assert_eq!(
            plan.sampling_window(),
            (Rect::new(0, 0, 1000, 1000), Rect::new(0, 0, 1020, 1020))
        );
    }

    #[test]
    fn test_extreme_aspect_plan_samples_small_window() {
        let plan = CropPlan::compute(1, 4000, &laptop_layout(), VerticalAnchor::Top).unwrap();
        assert_eq!((plan.scaled_width, plan.scaled_height), (800, 3_200_000));
        assert!(plan.is_oversized());

        let (window, target) = plan.sampling_window();
        assert_eq!(window, Rect::new(0, 0, 1, 6));
        assert_eq!(target, Rect::new(0, 0, 800, 4800));
    }

    #[test]
    fn test_sampling_window_covers_canvas() {
        let layout = laptop_layout();
        for (w, h) in [(1, 4000), (4000, 1), (37, 211), (13, 9000), (9000, 13), (2, 2)] {
            for anchor in [VerticalAnchor::Top, VerticalAnchor::Center] {
                let plan = CropPlan::compute(w, h, &layout, anchor).unwrap();
                let (window, target) = plan.sampling_window();

                assert!(window.right() <= w && window.bottom() <= h, "{}x{}", w, h);
                assert!(window.width > 0 && window.height > 0, "{}x{}", w, h);
                assert!(target.x <= plan.x_offset, "{}x{}", w, h);
                assert!(target.y <= plan.y_offset, "{}x{}", w, h);
                assert!(target.right() >= plan.x_offset + plan.canvas.width, "{}x{}", w, h);
                assert!(target.bottom() >= plan.y_offset + plan.canvas.height, "{}x{}", w, h);

                let area = u64::from(target.width) * u64::from(target.height);
                let canvas = u64::from(plan.canvas.width) * u64::from(plan.canvas.height);
                assert!(area <= canvas * 16, "{}x{} samples {} pixels", w, h, area);
            }
        }
    }
}
