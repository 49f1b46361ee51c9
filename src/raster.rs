use crate::error::{ExportError, Result};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage, RgbaImage};

pub use crate::config::RasterOptions;

/// A captured bitmap, stored as packed 8-bit RGB
///
/// Only built through `from_rgb`/`from_encoded`, so both dimensions are
/// nonzero and the buffer matches them.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
}

impl RasterImage {
    /// Wrap raw RGB pixels; the buffer must hold exactly `width * height` pixels
    pub fn from_rgb(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ExportError::Rasterization(format!(
                "empty image {}x{}",
                width, height
            )));
        }
        if rgb.len() != width as usize * height as usize * 3 {
            return Err(ExportError::Rasterization(format!(
                "pixel buffer of {} bytes does not match {}x{}",
                rgb.len(),
                width,
                height
            )));
        }
        Ok(Self { width, height, rgb })
    }

    /// Decode an encoded screenshot, optionally resample it to `target`
    /// pixels, and flatten any transparency onto `background`.
    pub fn from_encoded(bytes: &[u8], target: Option<(u32, u32)>, background: [u8; 3]) -> Result<Self> {
        let mut rgba = image::load_from_memory(bytes)?.to_rgba8();

        if let Some((width, height)) = target {
            if width > 0 && height > 0 && (width, height) != rgba.dimensions() {
                ::log::debug!(
                    "Resampling capture from {:?} to {}x{}",
                    rgba.dimensions(),
                    width,
                    height
                );
                rgba = imageops::resize(&rgba, width, height, FilterType::Lanczos3);
            }
        }

        let flat = flatten(&rgba, background);
        Self::from_rgb(flat.width(), flat.height(), flat.into_raw())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Packed RGB bytes, row by row
    pub fn pixels(&self) -> &[u8] {
        &self.rgb
    }

    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }
}

fn flatten(rgba: &RgbaImage, background: [u8; 3]) -> RgbImage {
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let px = rgba.get_pixel(x, y).0;
        let alpha = px[3] as u32;
        Rgb(std::array::from_fn(|i| {
            ((px[i] as u32 * alpha + background[i] as u32 * (255 - alpha) + 127) / 255) as u8
        }))
    })
}

/// Turns a located element into a bitmap
#[allow(async_fn_in_trait)]
pub trait Rasterizer<N> {
    async fn rasterize(&self, node: &N, options: &RasterOptions) -> Result<RasterImage>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png(width: u32, height: u32, pixel: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba(pixel));
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_transparent_pixels_take_background() {
        let bytes = png(4, 2, [0, 0, 0, 0]);
        let image = RasterImage::from_encoded(&bytes, None, [255, 255, 255]).unwrap();
        assert_eq!((image.width(), image.height()), (4, 2));
        assert!(image.pixels().iter().all(|&b| b == 255));
        assert!(image.is_landscape());
    }

    #[test]
    fn test_opaque_pixels_are_kept() {
        let bytes = png(1, 1, [10, 20, 30, 255]);
        let image = RasterImage::from_encoded(&bytes, None, [255, 255, 255]).unwrap();
        assert_eq!(image.pixels(), &[10, 20, 30]);
    }

    #[test]
    fn test_resample_to_target() {
        let bytes = png(10, 20, [50, 50, 50, 255]);
        let image = RasterImage::from_encoded(&bytes, Some((20, 40)), [255, 255, 255]).unwrap();
        assert_eq!((image.width(), image.height()), (20, 40));
        assert_eq!(image.pixels().len(), 20 * 40 * 3);
        assert!(!image.is_landscape());
    }

    #[test]
    fn test_garbage_is_rasterization_error() {
        let result = RasterImage::from_encoded(b"not an image", None, [0, 0, 0]);
        assert!(matches!(result, Err(ExportError::Rasterization(_))));
    }

    #[test]
    fn test_buffer_size_checked() {
        assert!(RasterImage::from_rgb(2, 2, vec![0; 11]).is_err());
        assert!(RasterImage::from_rgb(0, 2, Vec::new()).is_err());
        assert!(RasterImage::from_rgb(2, 2, vec![0; 12]).is_ok());
    }
}
