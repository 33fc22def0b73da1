//! Utility functions shared across the crate.
//!
//! This module provides common utilities for:
//! - The byte palette
//! - Human-readable formatting

pub mod color;
pub mod format;

pub use color::byte_to_rgb;
pub use format::{format_bytes, format_percent};
