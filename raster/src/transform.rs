//! Axis-aligned geometry transformations of pixel buffers.
//!
//! The rendering pipeline applies a [`Rotation`] first
//! and a [`Flip`] afterwards.
//! Both are pure permutations of the pixels:
//! the input buffer is consumed
//! and a new buffer with updated dimensions is returned.

#[cfg(feature = "rayon")]
use rayon::iter::{IndexedParallelIterator, ParallelIterator};
#[cfg(feature = "rayon")]
use rayon::slice::ParallelSliceMut;
use tracing::{debug, trace};

use crate::buffer::try_alloc;
use crate::{PixelBuffer, Result};

/// One of the four axis-aligned rotations of an image.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Rotation {
    /// No rotation
    #[default]
    Identity,
    /// 90 degrees clockwise,
    /// swapping width and height
    Clockwise90,
    /// 180 degrees
    Half,
    /// 270 degrees clockwise (90 degrees counter-clockwise),
    /// swapping width and height
    Clockwise270,
}

impl Rotation {
    /// Map an angle in degrees to a discrete rotation.
    ///
    /// The angle is first normalized into `[0, 360)`
    /// with a Euclidean remainder,
    /// so that negative angles rotate counter-clockwise
    /// (`-90` is the same as `270`).
    /// Note that viewers which take a truncating remainder instead
    /// leave every negative angle unrotated.
    /// The normalized angle then picks the rotation by range:
    ///
    /// | degrees      | rotation                                  |
    /// |--------------|-------------------------------------------|
    /// | `0`          | [`Identity`](Rotation::Identity)          |
    /// | `(0, 90]`    | [`Clockwise90`](Rotation::Clockwise90)    |
    /// | `(90, 180]`  | [`Half`](Rotation::Half)                  |
    /// | `(180, 270]` | [`Clockwise270`](Rotation::Clockwise270)  |
    /// | `(270, 360)` | [`Identity`](Rotation::Identity)          |
    /// | `-90`        | [`Clockwise270`](Rotation::Clockwise270)  |
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            1..=90 => Rotation::Clockwise90,
            91..=180 => Rotation::Half,
            181..=270 => Rotation::Clockwise270,
            _ => Rotation::Identity,
        }
    }

    /// The canonical angle of this rotation in degrees.
    pub fn degrees(self) -> i32 {
        match self {
            Rotation::Identity => 0,
            Rotation::Clockwise90 => 90,
            Rotation::Half => 180,
            Rotation::Clockwise270 => 270,
        }
    }

    /// Whether this rotation exchanges the width and height of the image.
    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Clockwise90 | Rotation::Clockwise270)
    }
}

/// Mirroring of an image, applied after rotation.
///
/// Row reversal is applied before column reversal.
/// In terms of the `flipX`/`flipY` flags of a display pipeline,
/// `flipX` reverses the order of the rows
/// and `flipY` reverses the order of the pixels within each row.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Flip {
    /// Reverse the order of the rows (top to bottom).
    pub reverse_rows: bool,
    /// Reverse the order of the pixels within each row (left to right).
    pub reverse_columns: bool,
}

impl Flip {
    /// Do not flip anything.
    pub const NONE: Flip = Flip {
        reverse_rows: false,
        reverse_columns: false,
    };

    /// Build a flip out of the `flipX` and `flipY` display flags.
    pub fn new(flip_x: bool, flip_y: bool) -> Self {
        Flip {
            reverse_rows: flip_x,
            reverse_columns: flip_y,
        }
    }

    /// Whether this flip leaves the image as is.
    pub fn is_none(self) -> bool {
        !self.reverse_rows && !self.reverse_columns
    }
}

/// Fill a new `out_width` by `out_height` raster
/// by fetching each output pixel at `(x, y)`
/// from the source index given by `source_index`.
fn remap<F>(src: &[u32], out_width: u32, out_height: u32, source_index: F) -> Result<Vec<u32>>
where
    F: Fn(usize, usize) -> usize + Sync,
{
    let mut out = try_alloc(out_width as usize * out_height as usize)?;
    let fill_row = |(y, row): (usize, &mut [u32])| {
        for (x, pixel) in row.iter_mut().enumerate() {
            *pixel = src[source_index(x, y)];
        }
    };

    #[cfg(feature = "rayon")]
    out.par_chunks_mut(out_width as usize)
        .enumerate()
        .for_each(fill_row);
    #[cfg(not(feature = "rayon"))]
    out.chunks_mut(out_width as usize)
        .enumerate()
        .for_each(fill_row);

    Ok(out)
}

/// Rotate a pixel buffer.
///
/// The identity rotation returns the same buffer without copying.
/// For the others a new buffer is allocated:
///
/// - 90°: each source column, from left to right,
///   becomes an output row, read from the bottom up;
/// - 180°: the rows are read from the bottom up,
///   each one from right to left;
/// - 270°: each source column, from right to left,
///   becomes an output row, read from the top down.
pub fn rotate(buffer: PixelBuffer, rotation: Rotation) -> Result<PixelBuffer> {
    let (width, height) = buffer.dimensions();
    trace!(width, height, ?rotation, "rotating pixel buffer");

    let src = buffer.pixels();
    let (w, h) = (width as usize, height as usize);
    match rotation {
        Rotation::Identity => Ok(buffer),
        Rotation::Clockwise90 => {
            let pixels = remap(src, height, width, |x, y| (h - 1 - x) * w + y)?;
            Ok(PixelBuffer::from_parts(height, width, pixels))
        }
        Rotation::Half => {
            let pixels = remap(src, width, height, |x, y| (h - 1 - y) * w + (w - 1 - x))?;
            Ok(PixelBuffer::from_parts(width, height, pixels))
        }
        Rotation::Clockwise270 => {
            let pixels = remap(src, height, width, |x, y| x * w + (w - 1 - y))?;
            Ok(PixelBuffer::from_parts(height, width, pixels))
        }
    }
}

/// Mirror a pixel buffer.
///
/// Row reversal and column reversal are applied in this order,
/// each step allocating a new buffer only if requested.
pub fn flip(buffer: PixelBuffer, flip: Flip) -> Result<PixelBuffer> {
    let (width, height) = buffer.dimensions();
    let (w, h) = (width as usize, height as usize);
    trace!(width, height, ?flip, "flipping pixel buffer");

    let buffer = if flip.reverse_rows {
        let pixels = remap(buffer.pixels(), width, height, |x, y| (h - 1 - y) * w + x)?;
        PixelBuffer::from_parts(width, height, pixels)
    } else {
        buffer
    };

    let buffer = if flip.reverse_columns {
        let pixels = remap(buffer.pixels(), width, height, |x, y| y * w + (w - 1 - x))?;
        PixelBuffer::from_parts(width, height, pixels)
    } else {
        buffer
    };

    Ok(buffer)
}

/// Rotate and then flip a pixel buffer.
pub fn transform(buffer: PixelBuffer, rotation: Rotation, flip: Flip) -> Result<PixelBuffer> {
    let rotated = rotate(buffer, rotation)?;
    self::flip(rotated, flip)
}

/// Rotate and flip a raw vector of packed pixels.
///
/// `rotation` is an angle in degrees,
/// mapped as described in [`Rotation::from_degrees`],
/// and `flip_x`, `flip_y` are the display flags described in [`Flip`].
/// Returns the new pixels followed by the new width and height.
///
/// Fails with [`InvalidDimensions`](crate::Error::InvalidDimensions)
/// before any copy is made
/// if the dimensions do not describe the given pixels.
pub fn transform_raw(
    pixels: Vec<u32>,
    width: u32,
    height: u32,
    rotation: i32,
    flip_x: bool,
    flip_y: bool,
) -> Result<(Vec<u32>, u32, u32)> {
    let buffer = match PixelBuffer::new(width, height, pixels) {
        Ok(buffer) => buffer,
        Err(e) => {
            debug!("rejected transform: {}", e);
            return Err(e);
        }
    };
    let out = transform(
        buffer,
        Rotation::from_degrees(rotation),
        Flip::new(flip_x, flip_y),
    )?;
    Ok(out.into_raw())
}

/// Rotate and flip a raster in byte form,
/// 4 bytes per pixel.
///
/// Returns the transformed bytes followed by the new width and height.
pub fn transform_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
    rotation: i32,
    flip_x: bool,
    flip_y: bool,
) -> Result<(Vec<u8>, u32, u32)> {
    let buffer = match PixelBuffer::from_bytes(width, height, bytes) {
        Ok(buffer) => buffer,
        Err(e) => {
            debug!("rejected transform: {}", e);
            return Err(e);
        }
    };
    let out = transform(
        buffer,
        Rotation::from_degrees(rotation),
        Flip::new(flip_x, flip_y),
    )?;
    let (width, height) = out.dimensions();
    Ok((out.to_bytes()?, width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use rstest::rstest;

    const A: u32 = 0xA;
    const B: u32 = 0xB;
    const C: u32 = 0xC;
    const D: u32 = 0xD;

    fn square() -> PixelBuffer {
        PixelBuffer::new(2, 2, vec![A, B, C, D]).unwrap()
    }

    /// 3 columns, 2 rows
    fn wide() -> PixelBuffer {
        PixelBuffer::new(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap()
    }

    #[rstest]
    #[case(0, Rotation::Identity)]
    #[case(1, Rotation::Clockwise90)]
    #[case(90, Rotation::Clockwise90)]
    #[case(91, Rotation::Half)]
    #[case(180, Rotation::Half)]
    #[case(181, Rotation::Clockwise270)]
    #[case(270, Rotation::Clockwise270)]
    #[case(271, Rotation::Identity)]
    #[case(359, Rotation::Identity)]
    #[case(360, Rotation::Identity)]
    #[case(450, Rotation::Clockwise90)]
    #[case(-90, Rotation::Clockwise270)]
    #[case(-180, Rotation::Half)]
    #[case(-270, Rotation::Clockwise90)]
    fn degrees_to_rotation(#[case] degrees: i32, #[case] expected: Rotation) {
        assert_eq!(Rotation::from_degrees(degrees), expected);
    }

    #[test]
    fn rotate_square_90() {
        let out = rotate(square(), Rotation::Clockwise90).unwrap();
        assert_eq!(out.dimensions(), (2, 2));
        assert_eq!(out.pixels(), &[C, A, D, B]);
    }

    #[test]
    fn rotate_square_180() {
        let out = rotate(square(), Rotation::Half).unwrap();
        assert_eq!(out.pixels(), &[D, C, B, A]);
    }

    #[test]
    fn rotate_square_270() {
        let out = rotate(square(), Rotation::Clockwise270).unwrap();
        assert_eq!(out.pixels(), &[B, D, A, C]);
    }

    #[test]
    fn rotate_wide_swaps_dimensions() {
        // 1 2 3      4 1
        // 4 5 6  ->  5 2
        //            6 3
        let out = rotate(wide(), Rotation::Clockwise90).unwrap();
        assert_eq!(out.dimensions(), (2, 3));
        assert_eq!(out.pixels(), &[4, 1, 5, 2, 6, 3]);

        // 1 2 3      3 6
        // 4 5 6  ->  2 5
        //            1 4
        let out = rotate(wide(), Rotation::Clockwise270).unwrap();
        assert_eq!(out.dimensions(), (2, 3));
        assert_eq!(out.pixels(), &[3, 6, 2, 5, 1, 4]);

        let out = rotate(wide(), Rotation::Half).unwrap();
        assert_eq!(out.dimensions(), (3, 2));
        assert_eq!(out.pixels(), &[6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn flip_rows_then_columns() {
        let out = flip(wide(), Flip::new(true, false)).unwrap();
        assert_eq!(out.pixels(), &[4, 5, 6, 1, 2, 3]);

        let out = flip(wide(), Flip::new(false, true)).unwrap();
        assert_eq!(out.pixels(), &[3, 2, 1, 6, 5, 4]);

        let out = flip(wide(), Flip::new(true, true)).unwrap();
        assert_eq!(out.pixels(), &[6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn single_row_and_column() {
        let row = PixelBuffer::new(4, 1, vec![1, 2, 3, 4]).unwrap();
        let out = rotate(row, Rotation::Clockwise90).unwrap();
        assert_eq!(out.dimensions(), (1, 4));
        assert_eq!(out.pixels(), &[1, 2, 3, 4]);

        let out = rotate(out, Rotation::Clockwise90).unwrap();
        assert_eq!(out.dimensions(), (4, 1));
        assert_eq!(out.pixels(), &[4, 3, 2, 1]);
    }

    #[test]
    fn transform_raw_rejects_mismatched_length() {
        let err = transform_raw(vec![0; 5], 2, 3, 90, false, false).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidDimensions {
                width: 2,
                height: 3,
                len: 20
            }
        ));
        let err = transform_raw(vec![], 0, 0, 0, false, false).unwrap_err();
        assert!(matches!(err, Error::InvalidDimensions { .. }));
    }

    #[test]
    fn transform_bytes_rotates_whole_pixels() {
        // 2x1: [1 2 3 4] [5 6 7 8]
        let bytes = [1, 2, 3, 4, 5, 6, 7, 8];
        let (out, width, height) = transform_bytes(&bytes, 2, 1, 90, false, false).unwrap();
        assert_eq!((width, height), (1, 2));
        assert_eq!(out, bytes);

        let (out, width, height) = transform_bytes(&bytes, 2, 1, 0, false, true).unwrap();
        assert_eq!((width, height), (2, 1));
        assert_eq!(out, [5, 6, 7, 8, 1, 2, 3, 4]);

        assert!(transform_bytes(&bytes[..7], 2, 1, 0, false, false).is_err());
    }
}
