//! Packed-pixel raster buffers.
//!
//! A [`PixelBuffer`] is a row-major sequence of 32-bit pixels
//! with explicit dimensions.
//! In byte form every pixel takes [`BYTES_PER_PIXEL`] bytes,
//! stored in little endian order,
//! so that a pixel packed from `[b, g, r, a]`
//! serializes back to the same four bytes.

use byteorder::{ByteOrder, LittleEndian};
use snafu::{ensure, OptionExt, ResultExt};

use crate::{AllocationSnafu, InvalidDimensionsSnafu, Result};

/// The number of bytes of a single packed pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Pack four channel bytes in BGRA order into a single pixel.
#[inline]
pub fn pack_bgra(bgra: [u8; 4]) -> u32 {
    u32::from_le_bytes(bgra)
}

/// Unpack a pixel into its four channel bytes in BGRA order.
#[inline]
pub fn unpack_bgra(pixel: u32) -> [u8; 4] {
    pixel.to_le_bytes()
}

/// Calculate the number of pixels of a raster,
/// failing if either dimension is zero or the product overflows.
pub(crate) fn pixel_count(width: u32, height: u32, len: usize) -> Result<usize> {
    ensure!(
        width > 0 && height > 0,
        InvalidDimensionsSnafu { width, height, len }
    );
    (width as usize)
        .checked_mul(height as usize)
        .filter(|count| count.checked_mul(BYTES_PER_PIXEL).is_some())
        .context(InvalidDimensionsSnafu { width, height, len })
}

/// Allocate a zeroed pixel vector,
/// reporting allocation failure instead of aborting.
pub(crate) fn try_alloc(len: usize) -> Result<Vec<u32>> {
    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(len)
        .context(AllocationSnafu { len })?;
    pixels.resize(len, 0);
    Ok(pixels)
}

/// A raster of packed 32-bit pixels in row-major order.
///
/// The buffer always satisfies `pixels.len() == width * height`,
/// with both dimensions greater than zero.
/// Transformations consume the buffer and return a new one,
/// so that the dimensions are never out of sync with the pixel layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl PixelBuffer {
    /// Create a pixel buffer out of packed pixels.
    ///
    /// Fails with [`InvalidDimensions`](crate::Error::InvalidDimensions)
    /// if either dimension is zero
    /// or the number of pixels is not `width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<u32>) -> Result<Self> {
        let len = pixels.len().saturating_mul(BYTES_PER_PIXEL);
        let count = pixel_count(width, height, len)?;
        ensure!(
            pixels.len() == count,
            InvalidDimensionsSnafu { width, height, len }
        );
        Ok(PixelBuffer {
            width,
            height,
            pixels,
        })
    }

    /// Create a pixel buffer by unpacking a byte sequence,
    /// 4 bytes per pixel.
    pub fn from_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self> {
        let count = pixel_count(width, height, bytes.len())?;
        ensure!(
            bytes.len() == count * BYTES_PER_PIXEL,
            InvalidDimensionsSnafu {
                width,
                height,
                len: bytes.len()
            }
        );
        let mut pixels = try_alloc(count)?;
        LittleEndian::read_u32_into(bytes, &mut pixels);
        Ok(PixelBuffer {
            width,
            height,
            pixels,
        })
    }

    /// Create a pixel buffer with every pixel set to the same value.
    pub fn filled(width: u32, height: u32, pixel: u32) -> Result<Self> {
        let count = pixel_count(width, height, 0)?;
        let mut pixels = try_alloc(count)?;
        if pixel != 0 {
            pixels.fill(pixel);
        }
        Ok(PixelBuffer {
            width,
            height,
            pixels,
        })
    }

    /// Construct a buffer whose invariants were already checked.
    pub(crate) fn from_parts(width: u32, height: u32, pixels: Vec<u32>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize);
        PixelBuffer {
            width,
            height,
            pixels,
        }
    }

    /// The width of the raster in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The height of the raster in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The width and height of the raster, in this order.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The number of bytes per row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    /// The total length of the raster in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.pixels.len() * BYTES_PER_PIXEL
    }

    /// Get the pixel at the given coordinates,
    /// or `None` if they are out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// The packed pixels, in row-major order.
    #[inline]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Mutable access to the packed pixels.
    ///
    /// The number of pixels cannot be changed through this slice,
    /// so the dimensions remain valid.
    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    /// Iterate over the rows of the raster.
    pub fn rows(&self) -> std::slice::ChunksExact<'_, u32> {
        self.pixels.chunks_exact(self.width as usize)
    }

    /// Serialize the raster into a new byte vector.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let len = self.byte_len();
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(len)
            .context(AllocationSnafu { len: self.pixels.len() })?;
        bytes.resize(len, 0);
        self.write_bytes_into(&mut bytes);
        Ok(bytes)
    }

    /// Serialize the raster into an existing byte slice.
    ///
    /// # Panics
    ///
    /// Panics if `dst` is not exactly [`byte_len`](Self::byte_len) bytes long.
    pub fn write_bytes_into(&self, dst: &mut [u8]) {
        LittleEndian::write_u32_into(&self.pixels, dst);
    }

    /// Decompose the buffer into its dimensions and packed pixels.
    pub fn into_raw(self) -> (Vec<u32>, u32, u32) {
        (self.pixels, self.width, self.height)
    }
}
