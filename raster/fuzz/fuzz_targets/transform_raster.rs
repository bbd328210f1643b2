#![no_main]
use byteorder::{LittleEndian as LE, ReadBytesExt};
use dicom_raster::transform_bytes;
use libfuzzer_sys::fuzz_target;
use std::error::Error;

fuzz_target!(|data: &[u8]| {
    let _ = fuzz(data);
});

/// Read a small header (dimensions, angle and flip flags)
/// and treat the remaining bytes as the raster.
fn fuzz(data: &[u8]) -> Result<(), Box<dyn Error>> {
    let reader = &mut (&data[..]);

    let width = u32::from(reader.read_u8()?);
    let height = u32::from(reader.read_u8()?);
    let rotation = reader.read_i16::<LE>()?;
    let flags = reader.read_u8()?;

    let pixels = *reader;
    let result = transform_bytes(
        pixels,
        width,
        height,
        i32::from(rotation),
        flags & 1 != 0,
        flags & 2 != 0,
    );

    let valid = width > 0 && height > 0 && pixels.len() == (width * height * 4) as usize;
    match result {
        Ok((out, out_width, out_height)) => {
            assert!(valid);
            assert_eq!(out.len(), pixels.len());
            assert_eq!(out_width * out_height, width * height);
        }
        Err(_) => assert!(!valid),
    }

    Ok(())
}
