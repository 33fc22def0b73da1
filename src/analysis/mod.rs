//! Byte analysis.
//!
//! Classification of raw bytes into the four legend classes and the additive
//! per-page counters built on it.

pub mod byte;

pub use byte::{ByteClass, ByteStats};
