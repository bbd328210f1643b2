#![no_main]
use byteorder::ReadBytesExt;
use dicom_raster::{composite, Layer, PixelBuffer};
use libfuzzer_sys::fuzz_target;
use std::error::Error;

fuzz_target!(|data: &[u8]| {
    let _ = fuzz(data);
});

/// Build a destination and a few solid layers out of raw bytes,
/// then check that compositing either succeeds or leaves the destination as is.
fn fuzz(data: &[u8]) -> Result<(), Box<dyn Error>> {
    let reader = &mut (&data[..]);

    let width = u32::from(reader.read_u8()?);
    let height = u32::from(reader.read_u8()?);
    let mut dest = PixelBuffer::filled(width, height, 0)?;

    let mut layers = Vec::new();
    while let (Ok(w), Ok(h), Ok(x), Ok(y)) = (
        reader.read_u8(),
        reader.read_u8(),
        reader.read_u8(),
        reader.read_u8(),
    ) {
        let fill = layers.len() as u32 + 1;
        layers.push(Layer::new(
            PixelBuffer::filled(u32::from(w), u32::from(h), fill)?,
            u32::from(x),
            u32::from(y),
        ));
    }

    let before = dest.clone();
    if composite(&mut dest, &layers).is_err() {
        assert_eq!(dest, before);
    }

    Ok(())
}
