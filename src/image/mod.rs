//! Image encoders and the sink abstraction the render pipeline writes through.
//!
//! The format is chosen from the destination extension (case-insensitive):
//! - `.png`: 8-bit RGB PNG (requires the `png` feature)
//! - `.ppm`, or a path with no `.` at all: binary PPM (`P6`)

use std::io::Write;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use crate::error::RenderError;

#[cfg(feature = "png")]
pub mod png;
pub mod ppm;

/// Output image encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Ppm,
    Png,
}

impl ImageFormat {
    /// Pick the encoding for a destination path.
    pub fn from_path(path: &Path) -> Result<Self, RenderError> {
        let bytes = path.as_os_str().as_bytes();

        if ends_with_ignore_case(bytes, b".png") {
            if cfg!(feature = "png") {
                return Ok(Self::Png);
            }
            return Err(RenderError::Validation(format!(
                "png output for '{}' requires the png feature",
                path.display()
            )));
        }
        if ends_with_ignore_case(bytes, b".ppm") || !bytes.contains(&b'.') {
            return Ok(Self::Ppm);
        }

        Err(RenderError::Validation(format!(
            "unsupported output extension for '{}' (use .ppm or .png)",
            path.display()
        )))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ppm => "ppm",
            Self::Png => "png",
        }
    }
}

fn ends_with_ignore_case(haystack: &[u8], suffix: &[u8]) -> bool {
    haystack.len() >= suffix.len()
        && haystack[haystack.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

/// Reject a pixel buffer that does not hold exactly `width * height` RGB triples.
pub fn check_pixel_buffer(width: u32, height: u32, pixels: &[u8]) -> Result<(), RenderError> {
    let expected = u64::from(width)
        .checked_mul(u64::from(height))
        .and_then(|n| n.checked_mul(3))
        .ok_or_else(|| RenderError::Overflow(format!("pixel count for {width}x{height}")))?;

    if width == 0 || height == 0 || pixels.len() as u64 != expected {
        return Err(RenderError::Validation(format!(
            "pixel buffer of {} bytes does not match {width}x{height} RGB",
            pixels.len()
        )));
    }
    Ok(())
}

/// Destination for rendered pages.
///
/// The pipeline opens (and alias-checks) the file itself and hands the sink an
/// already-truncated writer, so a sink never touches the filesystem by path.
pub trait ImageSink {
    /// Validate that `path` can be written by this sink. Called before any
    /// output is opened.
    fn check_path(&self, _path: &Path) -> Result<(), RenderError> {
        Ok(())
    }

    /// Encode one page into `dest`. `path` is for format selection and messages.
    fn write_image(
        &mut self,
        path: &Path,
        dest: &mut dyn Write,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<(), RenderError>;
}

/// Sink that encodes PPM or PNG according to the destination extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatSink;

impl ImageSink for FormatSink {
    fn check_path(&self, path: &Path) -> Result<(), RenderError> {
        ImageFormat::from_path(path).map(|_| ())
    }

    fn write_image(
        &mut self,
        path: &Path,
        dest: &mut dyn Write,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<(), RenderError> {
        let format = ImageFormat::from_path(path)?;
        check_pixel_buffer(width, height, pixels)?;

        let result = match format {
            ImageFormat::Ppm => ppm::write_ppm(dest, width, height, pixels),
            #[cfg(feature = "png")]
            ImageFormat::Png => png::write_png(dest, width, height, pixels),
            #[cfg(not(feature = "png"))]
            ImageFormat::Png => {
                return Err(RenderError::Validation("png support is not compiled in".into()))
            }
        };
        result.map_err(|e| RenderError::io(format!("failed to write {}", format.name()), path, e))
    }
}
