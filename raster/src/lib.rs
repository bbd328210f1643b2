//! This crate contains the geometry stage of DICOM image rendering:
//! turning a frame of packed 32-bit pixels,
//! as produced by a windowing and LUT renderer,
//! into the rotated and flipped raster which is displayed,
//! and painting graphic annotation layers on top of it.
//!
//! The crate works exclusively on raw packed-pixel buffers with explicit
//! dimensions ([`PixelBuffer`]).
//! Building a platform bitmap out of the result is left to the caller,
//! although conversion to [`image`] buffers is available
//! through the `image` Cargo feature.
//!
//! Rotations are always axis-aligned.
//! Any angle in degrees is normalized and mapped to one of four
//! discrete rotations (see [`Rotation::from_degrees`]),
//! so that every transform is a pixel permutation
//! with no interpolation involved.
//!
//! # Examples
//!
//! ```
//! # use dicom_raster::{Flip, PixelBuffer, Rotation};
//! # fn main() -> Result<(), dicom_raster::Error> {
//! let buffer = PixelBuffer::new(3, 2, vec![1, 2, 3, 4, 5, 6])?;
//! let rotated = dicom_raster::transform(buffer, Rotation::from_degrees(90), Flip::NONE)?;
//!
//! assert_eq!(rotated.dimensions(), (2, 3));
//! assert_eq!(rotated.pixels(), &[4, 1, 5, 2, 6, 3]);
//! #   Ok(())
//! # }
//! ```
//!
//! Compositing layers onto a rendered image:
//!
//! ```
//! # use dicom_raster::{Layer, PixelBuffer};
//! # fn main() -> Result<(), dicom_raster::Error> {
//! let mut frame = PixelBuffer::filled(3, 3, 0)?;
//! let marker = Layer::new(PixelBuffer::filled(1, 1, 0xFF00_FF00)?, 1, 1);
//! dicom_raster::composite(&mut frame, &[marker])?;
//!
//! assert_eq!(frame.pixel(1, 1), Some(0xFF00_FF00));
//! #   Ok(())
//! # }
//! ```
use snafu::Snafu;
use std::collections::TryReserveError;

pub mod buffer;
pub mod composite;
#[cfg(feature = "image")]
mod convert;
pub mod render;
pub mod transform;

pub use buffer::{pack_bgra, unpack_bgra, PixelBuffer, BYTES_PER_PIXEL};
pub use composite::{composite, composite_bytes, Graphic, Layer};
pub use render::{GraphicFn, RenderOptions, RenderedImage};
pub use transform::{flip, rotate, transform, transform_bytes, transform_raw, Flip, Rotation};

/// An error which may occur when manipulating a pixel buffer.
///
/// When an operation fails,
/// no output buffer is produced
/// and destination buffers are left untouched.
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// The given dimensions are not positive,
    /// or do not match the length of the pixel buffer.
    #[snafu(display(
        "Invalid raster dimensions {}x{} for a buffer of {} bytes",
        width,
        height,
        len
    ))]
    InvalidDimensions { width: u32, height: u32, len: usize },

    /// A layer does not fit entirely in the destination buffer.
    #[snafu(display(
        "Layer #{} ({}x{} at {},{}) does not fit in a {}x{} destination",
        index,
        width,
        height,
        x,
        y,
        dest_width,
        dest_height
    ))]
    OutOfBounds {
        index: usize,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        dest_width: u32,
        dest_height: u32,
    },

    /// An intermediate buffer could not be allocated.
    #[snafu(display("Could not allocate a buffer of {} pixels", len))]
    Allocation {
        len: usize,
        source: TryReserveError,
    },

    /// Graphics were drawn before the image was rendered.
    #[snafu(display("Image has not been rendered yet"))]
    NotRendered,

    /// A graphic could not be rendered into a layer.
    #[snafu(display("Could not render graphic layer"))]
    RenderGraphic {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
