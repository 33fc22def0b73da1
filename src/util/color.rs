//! Byte value to RGB palette.
//!
//! Each byte class gets its own primary channel so the classes stay apart at a
//! glance, and intensity within a class tracks the byte value:
//! - `0x00`: black
//! - `0x01..=0x1F`: green, 32..=255
//! - `0x20..=0x7E`: blue, 32..=255
//! - `0x7F..=0xFF`: red, 32..=255

/// Lowest channel intensity for a non-null byte.
pub const CHANNEL_MIN: u8 = 32;

/// Highest channel intensity.
pub const CHANNEL_MAX: u8 = 255;

/// Scale `pos` in `0..=span` onto `min..=max`, rounding to nearest.
#[inline]
pub const fn scale_channel(min: u8, max: u8, pos: u32, span: u32) -> u8 {
    if span == 0 {
        return max;
    }
    let delta = (max - min) as u32;
    (min as u32 + (pos * delta + span / 2) / span) as u8
}

const fn rgb_for(v: u8) -> [u8; 3] {
    match v {
        0x00 => [0, 0, 0],
        0x01..=0x1F => [0, scale_channel(CHANNEL_MIN, CHANNEL_MAX, (v - 0x01) as u32, 30), 0],
        0x20..=0x7E => [0, 0, scale_channel(CHANNEL_MIN, CHANNEL_MAX, (v - 0x20) as u32, 94)],
        0x7F..=0xFF => [scale_channel(CHANNEL_MIN, CHANNEL_MAX, (v - 0x7F) as u32, 128), 0, 0],
    }
}

const fn generate_palette_lut() -> [[u8; 3]; 256] {
    let mut lut = [[0u8; 3]; 256];
    let mut i = 0usize;
    while i < 256 {
        lut[i] = rgb_for(i as u8);
        i += 1;
    }
    lut
}

/// Palette lookup table (computed at compile time).
static PALETTE_LUT: [[u8; 3]; 256] = generate_palette_lut();

/// RGB color for one byte.
#[inline(always)]
pub fn byte_to_rgb(v: u8) -> [u8; 3] {
    PALETTE_LUT[v as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_edges() {
        assert_eq!(byte_to_rgb(0x00), [0, 0, 0]);
        assert_eq!(byte_to_rgb(0x01), [0, 32, 0]);
        assert_eq!(byte_to_rgb(0x1F), [0, 255, 0]);
        assert_eq!(byte_to_rgb(0x20), [0, 0, 32]);
        assert_eq!(byte_to_rgb(0x7E), [0, 0, 255]);
        assert_eq!(byte_to_rgb(0x7F), [32, 0, 0]);
        assert_eq!(byte_to_rgb(0xFF), [255, 0, 0]);
    }

    #[test]
    fn test_palette_midpoint_rounding() {
        // 'P' sits 48 of 94 steps into the printable range.
        assert_eq!(byte_to_rgb(b'P'), [0, 0, 146]);
    }

    #[test]
    fn test_intensity_is_monotonic_within_class() {
        let ranges: [(u8, u8, usize); 3] = [(0x01, 0x1F, 1), (0x20, 0x7E, 2), (0x7F, 0xFF, 0)];
        for (lo, hi, channel) in ranges {
            let mut prev = 0u8;
            for v in lo..=hi {
                let rgb = byte_to_rgb(v);
                assert!(rgb[channel] >= prev, "palette dips at {v:#04x}");
                assert_eq!(rgb.iter().filter(|&&c| c != 0).count(), 1);
                prev = rgb[channel];
            }
        }
    }
}
