//! Render configuration

use std::env;

use crate::error::RenderError;

/// Environment variable holding the pixel buffer cap in bytes.
pub const MAX_IMAGE_BYTES_ENV: &str = "HILBERTVIZ_MAX_IMAGE_BYTES";

/// Default pixel buffer cap (256 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 256 * 1024 * 1024;

/// Default input read chunk (64 KiB).
pub const DEFAULT_READ_CHUNK_BYTES: usize = 64 * 1024;

/// Settings captured once per render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// Largest page pixel buffer allowed, in bytes. `0` disables the cap.
    pub max_image_bytes: u64,
    /// Size of each input read.
    pub read_chunk_bytes: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            read_chunk_bytes: DEFAULT_READ_CHUNK_BYTES,
        }
    }
}

impl RenderConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, RenderError> {
        let raw = match env::var(MAX_IMAGE_BYTES_ENV) {
            Ok(value) => Some(value),
            Err(env::VarError::NotPresent) => None,
            Err(env::VarError::NotUnicode(value)) => {
                return Err(RenderError::Config(format!(
                    "invalid {MAX_IMAGE_BYTES_ENV}='{}' (expected unsigned decimal bytes)",
                    value.to_string_lossy()
                )))
            }
        };

        Ok(Self {
            max_image_bytes: parse_max_image_bytes(raw.as_deref())?,
            ..Self::default()
        })
    }

    /// Whether a buffer of `bytes` is within the cap.
    #[inline]
    pub fn allows_image_bytes(&self, bytes: u64) -> bool {
        self.max_image_bytes == 0 || bytes <= self.max_image_bytes
    }
}

/// Parse the cap value. Unset or empty means the default.
///
/// Only plain ASCII digits are accepted: no sign, whitespace, or separators.
pub fn parse_max_image_bytes(raw: Option<&str>) -> Result<u64, RenderError> {
    let text = match raw {
        None | Some("") => return Ok(DEFAULT_MAX_IMAGE_BYTES),
        Some(text) => text,
    };

    let invalid = || {
        RenderError::Config(format!(
            "invalid {MAX_IMAGE_BYTES_ENV}='{text}' (expected unsigned decimal bytes)"
        ))
    };

    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    text.bytes().try_fold(0u64, |acc, b| {
        acc.checked_mul(10)
            .and_then(|acc| acc.checked_add(u64::from(b - b'0')))
            .ok_or_else(invalid)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.max_image_bytes, 268_435_456);
        assert_eq!(config.read_chunk_bytes, 65_536);
    }

    #[test]
    fn test_parse_accepts_plain_digits() {
        assert_eq!(parse_max_image_bytes(None).unwrap(), DEFAULT_MAX_IMAGE_BYTES);
        assert_eq!(parse_max_image_bytes(Some("")).unwrap(), DEFAULT_MAX_IMAGE_BYTES);
        assert_eq!(parse_max_image_bytes(Some("0")).unwrap(), 0);
        assert_eq!(parse_max_image_bytes(Some("1024")).unwrap(), 1024);
        assert_eq!(
            parse_max_image_bytes(Some("18446744073709551615")).unwrap(),
            u64::MAX
        );
    }

    #[test]
    fn test_parse_rejects_anything_else() {
        for bad in ["-1", "+5", " 5", "5 ", "1_000", "0x10", "12k", "18446744073709551616"] {
            let err = parse_max_image_bytes(Some(bad)).unwrap_err();
            assert!(matches!(err, RenderError::Config(_)), "accepted {bad:?}");
            assert!(err.to_string().contains(MAX_IMAGE_BYTES_ENV));
        }
    }

    #[test]
    fn test_zero_cap_is_unlimited() {
        let config = RenderConfig {
            max_image_bytes: 0,
            ..RenderConfig::default()
        };
        assert!(config.allows_image_bytes(u64::MAX));

        let capped = RenderConfig {
            max_image_bytes: 48,
            ..RenderConfig::default()
        };
        assert!(capped.allows_image_bytes(48));
        assert!(!capped.allows_image_bytes(49));
    }
}
