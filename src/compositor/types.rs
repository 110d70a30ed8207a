use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops;
use image::{ColorType, DynamicImage, ImageBuffer, Rgb, RgbImage};
use tracing::debug;

use crate::compositor::layout::Rect;
use crate::error::{ImageError, Result};

/// Background used when flattening transparent sources
const FLATTEN_BACKGROUND: [u8; 3] = [255, 255, 255];

/// Immutable decoded source raster
///
/// Wraps an RGB buffer. Sources with an alpha channel are flattened onto
/// white when decoded, so every pixel is opaque.
#[derive(Clone, Debug)]
pub struct SourceImage {
    buffer: RgbImage,
}

impl SourceImage {
    /// Wrap an already decoded RGB buffer
    pub fn new(buffer: RgbImage) -> Result<Self> {
        if buffer.width() == 0 || buffer.height() == 0 {
            return Err(ImageError::invalid(format!(
                "decoded image is {}x{}",
                buffer.width(),
                buffer.height()
            ))
            .into());
        }
        Ok(Self { buffer })
    }

    /// Decode raw encoded bytes (JPEG, PNG, WebP)
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| ImageError::invalid(format!("could not decode image: {}", e)))?;
        Self::from_dynamic(image)
    }

    /// Convert any colour mode to RGB, flattening alpha onto white
    pub fn from_dynamic(image: DynamicImage) -> Result<Self> {
        let color = image.color();
        let buffer = if color.has_alpha() {
            debug!("Flattening {:?} image onto white background", color);
            flatten_onto(&image, FLATTEN_BACKGROUND)
        } else {
            match image {
                DynamicImage::ImageRgb8(img) => img,
                other => {
                    debug!("Converting image from {:?} to RGB", color);
                    other.to_rgb8()
                }
            }
        };
        Self::new(buffer)
    }

    /// Create a source filled with one colour, mostly useful in tests and previews
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Result<Self> {
        Self::new(ImageBuffer::from_pixel(width, height, Rgb(color)))
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    pub fn as_image(&self) -> &RgbImage {
        &self.buffer
    }
}

fn flatten_onto(image: &DynamicImage, background: [u8; 3]) -> RgbImage {
    let rgba = image.to_rgba8();
    ImageBuffer::from_fn(rgba.width(), rgba.height(), |x, y| {
        let pixel = rgba.get_pixel(x, y);
        let alpha = u16::from(pixel[3]);
        let mut out = [0u8; 3];
        for (channel, value) in out.iter_mut().enumerate() {
            let fg = u16::from(pixel[channel]);
            let bg = u16::from(background[channel]);
            // (fg * a + bg * (255 - a)) / 255, rounded
            *value = ((fg * alpha + bg * (255 - alpha) + 127) / 255) as u8;
        }
        Rgb(out)
    })
}

/// The two screen-sized output rasters, upper first
#[derive(Clone, Debug)]
pub struct CompositeResult {
    pub upper_output: RgbImage,
    pub lower_output: RgbImage,
    /// Shared horizontal crop offset within the scaled source
    pub x_offset: u32,
    pub upper_rect: Rect,
    pub lower_rect: Rect,
}

impl CompositeResult {
    /// Encode both panels as JPEG, upper first
    pub fn encode_jpeg(&self, quality: u8) -> Result<(Vec<u8>, Vec<u8>)> {
        Ok((
            encode_jpeg(&self.upper_output, quality)?,
            encode_jpeg(&self.lower_output, quality)?,
        ))
    }

    /// Lay both panels out as they are physically mounted
    ///
    /// Panels are placed at their crop positions relative to the shared
    /// window, with the gap and any width difference left black.
    pub fn stitched_preview(&self) -> RgbImage {
        let left = self.upper_rect.x.min(self.lower_rect.x);
        let top = self.upper_rect.y;
        let width = self.upper_rect.right().max(self.lower_rect.right()) - left;
        let height = self.lower_rect.bottom() - top;

        let mut canvas = RgbImage::new(width, height);
        imageops::replace(
            &mut canvas,
            &self.upper_output,
            i64::from(self.upper_rect.x - left),
            0,
        );
        imageops::replace(
            &mut canvas,
            &self.lower_output,
            i64::from(self.lower_rect.x - left),
            i64::from(self.lower_rect.y - top),
        );
        canvas
    }
}

/// Encode an RGB buffer as JPEG at the given quality (1-100)
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    encoder
        .encode(image.as_raw(), image.width(), image.height(), ColorType::Rgb8)
        .map_err(|e| ImageError::EncodeFailed {
            reason: e.to_string(),
        })?;
    Ok(bytes.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgba, RgbaImage};

    fn encode_png(image: DynamicImage) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageOutputFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let rgb = RgbImage::from_pixel(12, 7, Rgb([10, 20, 30]));
        let source = SourceImage::decode(&encode_png(DynamicImage::ImageRgb8(rgb))).unwrap();

        assert_eq!(source.dimensions(), (12, 7));
        assert_eq!(source.as_image().get_pixel(3, 3), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_transparent_pixels_flatten_to_white() {
        let mut rgba = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        rgba.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        rgba.put_pixel(1, 0, Rgba([0, 0, 0, 128]));

        let source = SourceImage::decode(&encode_png(DynamicImage::ImageRgba8(rgba))).unwrap();
        let img = source.as_image();

        assert_eq!(img.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(img.get_pixel(2, 2), &Rgb([0, 0, 0]));
        let half = img.get_pixel(1, 0)[0];
        assert!((126..=128).contains(&half), "got {}", half);
    }

    #[test]
    fn test_grayscale_converted_to_rgb() {
        let gray = image::GrayImage::from_pixel(5, 5, image::Luma([77]));
        let source = SourceImage::from_dynamic(DynamicImage::ImageLuma8(gray)).unwrap();
        assert_eq!(source.as_image().get_pixel(0, 0), &Rgb([77, 77, 77]));
    }

    #[test]
    fn test_garbage_bytes_are_invalid_image() {
        let result = SourceImage::decode(b"definitely not an image");
        assert!(matches!(
            result,
            Err(crate::error::WallpaperError::Image(ImageError::InvalidImage { .. }))
        ));
    }

    #[test]
    fn test_empty_buffer_is_invalid_image() {
        assert!(SourceImage::new(RgbImage::new(0, 10)).is_err());
    }

    #[test]
    fn test_encode_jpeg_decodes_back_to_same_size() {
        let image = RgbImage::from_pixel(64, 32, Rgb([200, 100, 50]));
        let bytes = encode_jpeg(&image, 95).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 32));
    }

    #[test]
    fn test_composite_encodes_upper_first() {
        let result = CompositeResult {
            upper_output: RgbImage::from_pixel(48, 30, Rgb([250, 10, 10])),
            lower_output: RgbImage::from_pixel(40, 12, Rgb([10, 10, 250])),
            x_offset: 0,
            upper_rect: Rect::new(0, 0, 48, 30),
            lower_rect: Rect::new(0, 40, 40, 12),
        };

        let (upper, lower) = result.encode_jpeg(90).unwrap();
        let upper = image::load_from_memory(&upper).unwrap().to_rgb8();
        let lower = image::load_from_memory(&lower).unwrap().to_rgb8();

        assert_eq!(upper.dimensions(), (48, 30));
        assert_eq!(lower.dimensions(), (40, 12));
        assert!(upper.get_pixel(20, 15)[0] > 200);
        assert!(lower.get_pixel(20, 6)[2] > 200);
    }

    #[test]
    fn test_stitched_preview_leaves_gap_black() {
        let result = CompositeResult {
            upper_output: RgbImage::from_pixel(10, 4, Rgb([255, 0, 0])),
            lower_output: RgbImage::from_pixel(8, 3, Rgb([0, 255, 0])),
            x_offset: 5,
            upper_rect: Rect::new(5, 0, 10, 4),
            lower_rect: Rect::new(5, 6, 8, 3),
        };

        let preview = result.stitched_preview();
        assert_eq!(preview.dimensions(), (10, 9));
        assert_eq!(preview.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(preview.get_pixel(0, 4), &Rgb([0, 0, 0]));
        assert_eq!(preview.get_pixel(0, 6), &Rgb([0, 255, 0]));
        assert_eq!(preview.get_pixel(9, 6), &Rgb([0, 0, 0]));
    }
}
