//! Display rendering of a decoded image frame.
//!
//! A [`RenderedImage`] keeps the source raster of a frame,
//! as written by a windowing renderer,
//! separately from the displayed output,
//! so that the same frame can be rendered again
//! with different [`RenderOptions`].

use snafu::{OptionExt, ResultExt};
use tracing::debug;

use crate::transform::{transform, Flip, Rotation};
use crate::{composite, Graphic, NotRenderedSnafu, PixelBuffer, RenderGraphicSnafu, Result};

/// Options for rendering an image for display.
///
/// # Example
///
/// ```
/// # use dicom_raster::{Flip, RenderOptions, Rotation};
/// let options = RenderOptions::new().with_rotation(90).flip_y();
/// assert_eq!(options.rotation(), Rotation::Clockwise90);
/// assert_eq!(options.flip(), Flip::new(false, true));
/// ```
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RenderOptions {
    rotation: i32,
    flip_x: bool,
    flip_y: bool,
}

impl RenderOptions {
    /// Create a new set of options:
    /// no rotation and no flipping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rotate the image by the given angle in degrees,
    /// as mapped by [`Rotation::from_degrees`].
    pub fn with_rotation(mut self, degrees: i32) -> Self {
        self.rotation = degrees;
        self
    }

    /// Reverse the order of the rows.
    pub fn flip_x(mut self) -> Self {
        self.flip_x = true;
        self
    }

    /// Reverse the order of the pixels in each row.
    pub fn flip_y(mut self) -> Self {
        self.flip_y = true;
        self
    }

    pub fn rotation(&self) -> Rotation {
        Rotation::from_degrees(self.rotation)
    }

    pub fn flip(&self) -> Flip {
        Flip::new(self.flip_x, self.flip_y)
    }
}

/// A decoded frame and its rendered output.
///
/// Cloning the image performs a deep copy
/// of both the source and the output.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedImage {
    source: PixelBuffer,
    output: Option<PixelBuffer>,
}

impl RenderedImage {
    /// Create an image with a zeroed source raster,
    /// to be filled in through [`source_mut`](Self::source_mut).
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Ok(RenderedImage {
            source: PixelBuffer::filled(width, height, 0)?,
            output: None,
        })
    }

    /// Create an image out of an existing source raster.
    pub fn from_buffer(source: PixelBuffer) -> Self {
        RenderedImage {
            source,
            output: None,
        }
    }

    /// Create an image out of a source raster in byte form.
    pub fn from_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self> {
        Ok(Self::from_buffer(PixelBuffer::from_bytes(width, height, bytes)?))
    }

    pub fn source(&self) -> &PixelBuffer {
        &self.source
    }

    /// Mutable access to the source pixels.
    ///
    /// Changes only become visible on the next call to
    /// [`render`](Self::render).
    pub fn source_mut(&mut self) -> &mut [u32] {
        self.source.pixels_mut()
    }

    /// The last rendered output, if any.
    pub fn output(&self) -> Option<&PixelBuffer> {
        self.output.as_ref()
    }

    /// Rotate and flip the source raster into a new output,
    /// replacing any previous output (and the graphics drawn on it).
    pub fn render(&mut self, options: &RenderOptions) -> Result<&PixelBuffer> {
        let output = transform(self.source.clone(), options.rotation(), options.flip())?;
        debug!(
            width = output.width(),
            height = output.height(),
            "rendered image"
        );
        Ok(self.output.insert(output))
    }

    /// Render each of the given graphics
    /// and draw them over the current output, in order.
    ///
    /// All graphics are rendered before anything is drawn,
    /// so on failure the output is left as it was.
    pub fn draw_graphics<'a, I>(&mut self, graphics: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a dyn Graphic>,
    {
        let output = self.output.as_mut().context(NotRenderedSnafu)?;
        let layers = graphics
            .into_iter()
            .map(|graphic| graphic.render_layer())
            .collect::<Result<Vec<_>>>()?;
        composite(output, &layers)
    }

    /// The rendered output in byte form,
    /// 4 bytes per pixel.
    pub fn output_bytes(&self) -> Result<Vec<u8>> {
        self.output.as_ref().context(NotRenderedSnafu)?.to_bytes()
    }
}

/// Adapt an external rendering function as a [`Graphic`].
///
/// Any error returned by the function is reported as
/// [`RenderGraphic`](crate::Error::RenderGraphic).
pub struct GraphicFn<F>(pub F);

impl<F, E> Graphic for GraphicFn<F>
where
    F: Fn() -> Result<crate::Layer, E>,
    E: std::error::Error + Send + Sync + 'static,
{
    fn render_layer(&self) -> Result<crate::Layer> {
        (self.0)()
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
            .context(RenderGraphicSnafu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Layer};

    fn image() -> RenderedImage {
        RenderedImage::from_buffer(PixelBuffer::new(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap())
    }

    #[derive(Debug)]
    struct Broken;

    impl std::fmt::Display for Broken {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("broken graphic")
        }
    }

    impl std::error::Error for Broken {}

    #[test]
    fn default_options_render_the_source() {
        let mut image = image();
        let out = image.render(&RenderOptions::new()).unwrap();
        assert_eq!(out.dimensions(), (3, 2));
        assert_eq!(out.pixels(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn render_rotates_then_flips() {
        let mut image = image();
        // rotated: 4 1 / 5 2 / 6 3, then rows reversed
        let out = image
            .render(&RenderOptions::new().with_rotation(90).flip_x())
            .unwrap();
        assert_eq!(out.dimensions(), (2, 3));
        assert_eq!(out.pixels(), &[6, 3, 5, 2, 4, 1]);

        // the source is kept for the next render
        assert_eq!(image.source().pixels(), &[1, 2, 3, 4, 5, 6]);
        let out = image.render(&RenderOptions::new().flip_y()).unwrap();
        assert_eq!(out.pixels(), &[3, 2, 1, 6, 5, 4]);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn oversized_image_reports_allocation_failure() {
        let err = RenderedImage::new(u32::MAX, 1 << 29).unwrap_err();
        assert!(matches!(err, Error::Allocation { .. }), "{:?}", err);
    }

    #[test]
    fn graphics_need_a_rendered_image() {
        let mut image = image();
        let dot = Layer::new(PixelBuffer::filled(1, 1, 9).unwrap(), 0, 0);
        let err = image.draw_graphics([&dot as &dyn Graphic]).unwrap_err();
        assert!(matches!(err, Error::NotRendered));
        assert!(matches!(image.output_bytes(), Err(Error::NotRendered)));
    }

    #[test]
    fn graphics_are_drawn_on_the_output() {
        let mut image = image();
        image.render(&RenderOptions::new().with_rotation(90)).unwrap();

        let dot = Layer::new(PixelBuffer::filled(1, 1, 9).unwrap(), 1, 2);
        image.draw_graphics([&dot as &dyn Graphic]).unwrap();
        let out = image.output().unwrap();
        assert_eq!(out.pixels(), &[4, 1, 5, 2, 6, 9]);

        let bytes = image.output_bytes().unwrap();
        assert_eq!(bytes.len(), 6 * 4);
        assert_eq!(&bytes[20..24], &[9, 0, 0, 0]);
    }

    #[test]
    fn failing_graphic_leaves_output_untouched() {
        let mut image = image();
        image.render(&RenderOptions::new()).unwrap();

        let dot = Layer::new(PixelBuffer::filled(1, 1, 9).unwrap(), 0, 0);
        let broken = GraphicFn(|| Err::<Layer, _>(Broken));
        let err = image
            .draw_graphics([&dot as &dyn Graphic, &broken as &dyn Graphic])
            .unwrap_err();
        assert!(matches!(err, Error::RenderGraphic { .. }), "{:?}", err);
        assert_eq!(image.output().unwrap().pixels(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn new_image_is_writable() {
        let mut image = RenderedImage::new(2, 1).unwrap();
        image.source_mut().copy_from_slice(&[7, 8]);
        let out = image
            .render(&RenderOptions::new().with_rotation(180))
            .unwrap();
        assert_eq!(out.pixels(), &[8, 7]);

        let copy = image.clone();
        assert_eq!(copy, image);
    }
}
