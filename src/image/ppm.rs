//! Binary PPM (`P6`) writer.

use std::io::{self, Write};

/// Write `P6\n{w} {h}\n255\n` followed by the raw row-major RGB bytes.
pub fn write_ppm(dest: &mut dyn Write, width: u32, height: u32, pixels: &[u8]) -> io::Result<()> {
    write!(dest, "P6\n{width} {height}\n255\n")?;
    dest.write_all(pixels)
}
