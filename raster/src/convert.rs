//! Conversion from and to [`image`] buffers.
//!
//! Packed pixels are BGRA,
//! whereas the `image` crate works in RGBA,
//! so the red and blue channels are swapped on the way.

use ::image::{DynamicImage, RgbaImage};
use snafu::OptionExt;

use crate::buffer::{pixel_count, try_alloc};
use crate::{
    pack_bgra, InvalidDimensionsSnafu, NotRenderedSnafu, PixelBuffer, RenderedImage, Result,
};

impl PixelBuffer {
    /// Convert the raster into an RGBA image.
    pub fn to_rgba_image(&self) -> Result<RgbaImage> {
        let (width, height) = self.dimensions();
        let mut bytes = self.to_bytes()?;
        for pixel in bytes.chunks_exact_mut(4) {
            pixel.swap(0, 2);
        }
        let len = bytes.len();
        RgbaImage::from_raw(width, height, bytes).context(InvalidDimensionsSnafu {
            width,
            height,
            len,
        })
    }

    /// Create a raster out of an RGBA image.
    pub fn from_rgba_image(image: &RgbaImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        let count = pixel_count(width, height, image.as_raw().len())?;
        let mut pixels = try_alloc(count)?;
        for (packed, rgba) in pixels.iter_mut().zip(image.pixels()) {
            let [r, g, b, a] = rgba.0;
            *packed = pack_bgra([b, g, r, a]);
        }
        PixelBuffer::new(width, height, pixels)
    }
}

impl RenderedImage {
    /// Convert the rendered output into a dynamic image.
    pub fn to_dynamic_image(&self) -> Result<DynamicImage> {
        let output = self.output().context(NotRenderedSnafu)?;
        Ok(DynamicImage::ImageRgba8(output.to_rgba_image()?))
    }
}
