//! Byte-level classification and per-page statistics.
//!
//! Every byte falls into exactly one class:
//! - null: `0x00`
//! - low control: `0x01..=0x1F`
//! - printable ASCII: `0x20..=0x7E`
//! - high: `0x7F..=0xFF`
//!
//! Classification goes through a 256-byte table computed at compile time.

use std::ops::AddAssign;

/// Byte class, in legend column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ByteClass {
    Null = 0,
    Low = 1,
    Ascii = 2,
    High = 3,
}

const fn generate_byte_class_lut() -> [ByteClass; 256] {
    let mut lut = [ByteClass::High; 256];
    let mut i = 0usize;
    while i < 256 {
        lut[i] = if i == 0 {
            ByteClass::Null
        } else if i <= 0x1F {
            ByteClass::Low
        } else if i <= 0x7E {
            ByteClass::Ascii
        } else {
            ByteClass::High
        };
        i += 1;
    }
    lut
}

/// Static byte classification lookup table (computed at compile time).
static BYTE_CLASS_LUT: [ByteClass; 256] = generate_byte_class_lut();

impl ByteClass {
    #[inline(always)]
    pub fn of(byte: u8) -> Self {
        BYTE_CLASS_LUT[byte as usize]
    }
}

/// Byte counts per class. Additive and order-independent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByteStats {
    pub total: u64,
    pub null: u64,
    pub low: u64,
    pub ascii: u64,
    pub high: u64,
}

impl ByteStats {
    /// Count one byte.
    #[inline]
    pub fn record(&mut self, byte: u8) {
        self.total += 1;
        match ByteClass::of(byte) {
            ByteClass::Null => self.null += 1,
            ByteClass::Low => self.low += 1,
            ByteClass::Ascii => self.ascii += 1,
            ByteClass::High => self.high += 1,
        }
    }

    /// Count every byte of a chunk.
    pub fn record_slice(&mut self, data: &[u8]) {
        let mut counts = [0u64; 4];
        for &byte in data {
            counts[ByteClass::of(byte) as usize] += 1;
        }
        self.total += data.len() as u64;
        self.null += counts[ByteClass::Null as usize];
        self.low += counts[ByteClass::Low as usize];
        self.ascii += counts[ByteClass::Ascii as usize];
        self.high += counts[ByteClass::High as usize];
    }

    /// Build stats for a whole buffer.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut stats = Self::default();
        stats.record_slice(data);
        stats
    }

    /// Add another set of counts into this one.
    #[inline]
    pub fn merge(&mut self, other: &Self) {
        self.total += other.total;
        self.null += other.null;
        self.low += other.low;
        self.ascii += other.ascii;
        self.high += other.high;
    }

    /// The five counts in legend column order.
    #[inline]
    pub fn columns(&self) -> [u64; 5] {
        [self.total, self.null, self.low, self.ascii, self.high]
    }
}

impl AddAssign for ByteStats {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
