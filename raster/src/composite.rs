//! Compositing of graphic layers onto a rendered image.
//!
//! Layers are painted in the given order,
//! each one overwriting whatever lies underneath it
//! (no alpha blending takes place).
//! This is intended for graphic annotations,
//! which are opaque or do not overlap.
//!
//! Every layer must fit entirely inside the destination.
//! All layers are checked before the first pixel is written,
//! so a rejected call leaves the destination untouched.

use byteorder::{ByteOrder, LittleEndian};
use snafu::ensure;
use tracing::{debug, trace};

use crate::buffer::BYTES_PER_PIXEL;
use crate::{InvalidDimensionsSnafu, OutOfBoundsSnafu, PixelBuffer, Result};

/// A rendered graphic layer
/// and its placement in the destination image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Layer {
    buffer: PixelBuffer,
    offset_x: u32,
    offset_y: u32,
}

impl Layer {
    /// Place the given pixels with their top-left corner
    /// at `(offset_x, offset_y)` of the destination.
    pub fn new(buffer: PixelBuffer, offset_x: u32, offset_y: u32) -> Self {
        Layer {
            buffer,
            offset_x,
            offset_y,
        }
    }

    /// The pixels of the layer, already scaled to the destination.
    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    /// The column and row of the destination
    /// where the layer's top-left pixel goes.
    pub fn offset(&self) -> (u32, u32) {
        (self.offset_x, self.offset_y)
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    fn fits_in(&self, dest_width: u32, dest_height: u32) -> bool {
        let fits = |offset: u32, len: u32, bound: u32| {
            offset.checked_add(len).is_some_and(|end| end <= bound)
        };
        fits(self.offset_x, self.width(), dest_width)
            && fits(self.offset_y, self.height(), dest_height)
    }
}

/// A graphic object which can be rendered
/// into a layer over a displayed image,
/// such as an overlay or a presentation state annotation.
///
/// Implementors decide how the graphic is drawn and scaled;
/// this crate only places the resulting pixels.
pub trait Graphic {
    /// Render the graphic into a positioned layer.
    fn render_layer(&self) -> Result<Layer>;
}

impl Graphic for Layer {
    fn render_layer(&self) -> Result<Layer> {
        Ok(self.clone())
    }
}

fn check_bounds(layers: &[Layer], dest_width: u32, dest_height: u32) -> Result<()> {
    for (index, layer) in layers.iter().enumerate() {
        if !layer.fits_in(dest_width, dest_height) {
            debug!(index, dest_width, dest_height, "layer placement rejected");
            return OutOfBoundsSnafu {
                index,
                x: layer.offset_x,
                y: layer.offset_y,
                width: layer.width(),
                height: layer.height(),
                dest_width,
                dest_height,
            }
            .fail();
        }
    }
    Ok(())
}

/// Paint the given layers onto a pixel buffer, in order.
///
/// Fails with [`OutOfBounds`](crate::Error::OutOfBounds)
/// if any of the layers does not fit in the destination,
/// in which case nothing is written.
pub fn composite(destination: &mut PixelBuffer, layers: &[Layer]) -> Result<()> {
    let (dest_width, dest_height) = destination.dimensions();
    check_bounds(layers, dest_width, dest_height)?;

    let dest_width = dest_width as usize;
    let dst = destination.pixels_mut();
    for layer in layers {
        let (x, y) = layer.offset();
        trace!(x, y, width = layer.width(), height = layer.height(), "drawing layer");

        let len = layer.width() as usize;
        let mut offset = dest_width * y as usize + x as usize;
        for row in layer.buffer.rows() {
            dst[offset..offset + len].copy_from_slice(row);
            offset += dest_width;
        }
    }
    Ok(())
}

/// Paint the given layers onto a raster in byte form, in order.
///
/// The destination is taken to be `dest_width` pixels wide,
/// 4 bytes per pixel,
/// with as many rows as its length allows.
/// Each layer is copied row by row,
/// starting at byte `stride * offset_y + 4 * offset_x`.
///
/// Fails with [`InvalidDimensions`](crate::Error::InvalidDimensions)
/// if the destination length is not a non-zero multiple of the row stride,
/// or [`OutOfBounds`](crate::Error::OutOfBounds)
/// if any of the layers does not fit.
/// Nothing is written in either case.
pub fn composite_bytes(destination: &mut [u8], dest_width: u32, layers: &[Layer]) -> Result<()> {
    let len = destination.len();
    let stride = (dest_width as usize)
        .checked_mul(BYTES_PER_PIXEL)
        .unwrap_or(0);
    let dest_height = len.checked_div(stride).unwrap_or(0).min(u32::MAX as usize) as u32;
    // a zero stride covers both a zero width and an overflowing one
    ensure!(
        stride > 0 && len > 0 && len % stride == 0,
        InvalidDimensionsSnafu {
            width: dest_width,
            height: dest_height,
            len,
        }
    );
    check_bounds(layers, dest_width, dest_height)?;

    for layer in layers {
        let (x, y) = layer.offset();
        trace!(x, y, width = layer.width(), height = layer.height(), "drawing layer");

        let src_stride = layer.buffer.stride();
        let mut offset = stride * y as usize + BYTES_PER_PIXEL * x as usize;
        for row in layer.buffer.rows() {
            LittleEndian::write_u32_into(row, &mut destination[offset..offset + src_stride]);
            offset += stride;
        }
    }
    Ok(())
}
