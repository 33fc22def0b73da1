//! Error types for the render pipeline.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::hilbert::CurveError;

/// Everything that can stop a render.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Bad offset/length/order/dimensions, conflicting options, unsupported
    /// extension, or a slice that needs `--paginate`.
    #[error("{0}")]
    Validation(String),

    #[error("arithmetic overflow: {0}")]
    Overflow(String),

    #[error("resource limit: {0}")]
    ResourceLimit(String),

    #[error("{context} '{}': {source}", path.display())]
    Io {
        context: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Alias(String),

    /// An in-range index failed to map. Indicates a bug, not bad input.
    #[error("mapping invariant violated: {0}")]
    MappingInvariant(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl RenderError {
    pub fn io(context: impl Into<String>, path: &Path, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            path: path.to_path_buf(),
            source,
        }
    }

    /// Convert a curve failure raised while resolving geometry.
    pub fn from_planning(err: CurveError) -> Self {
        match err {
            CurveError::Overflow => Self::Overflow(err.to_string()),
            other => Self::Validation(other.to_string()),
        }
    }

    /// Convert a curve failure raised while painting page index `d`.
    pub fn from_mapping(err: CurveError, d: u64) -> Self {
        Self::MappingInvariant(format!("curve mapping failed at index {d}: {err}"))
    }

    /// Whether this error is an alias refusal.
    pub fn is_alias(&self) -> bool {
        matches!(self, Self::Alias(_))
    }
}
