//! PNG output: 8-bit RGB through the `image` crate's PNG encoder.

use std::io::{self, Write};

use ::image::codecs::png::PngEncoder;
use ::image::{ExtendedColorType, ImageEncoder, ImageError};

/// Encode `pixels` (row-major RGB) as a PNG straight into `dest`.
pub fn write_png(dest: &mut dyn Write, width: u32, height: u32, pixels: &[u8]) -> io::Result<()> {
    let expected = u64::from(width)
        .checked_mul(u64::from(height))
        .and_then(|n| n.checked_mul(3));
    if expected != Some(pixels.len() as u64) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("png buffer of {} bytes does not match {width}x{height} RGB", pixels.len()),
        ));
    }

    PngEncoder::new(dest)
        .write_image(pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| match e {
            ImageError::IoError(e) => e,
            other => io::Error::other(other),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(png: &[u8]) -> ::image::RgbImage {
        ::image::load_from_memory_with_format(png, ::image::ImageFormat::Png)
            .unwrap()
            .to_rgb8()
    }

    #[test]
    fn test_png_roundtrips_pixels() {
        let pixels: Vec<u8> = (0..18).collect();
        let mut out = Vec::new();
        write_png(&mut out, 3, 2, &pixels).unwrap();

        assert!(out.starts_with(b"\x89PNG\r\n\x1a\n"));
        assert_eq!(&out[12..16], b"IHDR");
        // bit depth 8, color type 2 (RGB)
        assert_eq!(&out[24..26], &[8, 2]);

        let image = decode(&out);
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.into_raw(), pixels);
    }

    #[test]
    fn test_rejects_short_buffer() {
        let mut out = Vec::new();
        let err = write_png(&mut out, 2, 2, &[0u8; 11]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(out.is_empty());
    }
}
