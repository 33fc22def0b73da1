//! Bounded reader over `[offset, offset + length)` of the input file.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::alias::FileIdentity;
use crate::error::RenderError;

/// An open input positioned at the slice start.
///
/// The slice bounds are validated against the size reported by `fstat` on the
/// open handle, so a later rename of the path cannot change what is read.
#[derive(Debug)]
pub struct SliceStream {
    file: File,
    path: PathBuf,
    identity: FileIdentity,
    total: u64,
    remaining: u64,
}

impl SliceStream {
    /// Open `path` and seek to `offset`. `length: None` reads to EOF.
    pub fn open(path: &Path, offset: u64, length: Option<u64>) -> Result<Self, RenderError> {
        let mut file =
            File::open(path).map_err(|e| RenderError::io("failed to open input", path, e))?;
        let metadata = file
            .metadata()
            .map_err(|e| RenderError::io("failed to stat opened input", path, e))?;
        let identity = FileIdentity::from_metadata(&metadata);
        let total = slice_len(metadata.len(), offset, length)?;

        file.seek(SeekFrom::Start(offset))
            .map_err(|e| RenderError::io("failed to seek input", path, e))?;

        debug!(path = %path.display(), offset, total, "opened input slice");
        Ok(Self {
            file,
            path: path.to_path_buf(),
            identity,
            total,
            remaining: total,
        })
    }

    /// Identity of the open handle (not of whatever the path names now).
    #[inline]
    pub fn identity(&self) -> FileIdentity {
        self.identity
    }

    /// Slice length in bytes.
    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Slice bytes not yet read.
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Fill `buf` completely from the slice.
    ///
    /// Asking for more than [`remaining`](Self::remaining) is rejected. A file
    /// that shrank after open surfaces as an "unexpected EOF" error.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), RenderError> {
        let want = buf.len() as u64;
        if want > self.remaining {
            return Err(RenderError::Validation(format!(
                "read of {want} bytes exceeds remaining slice ({} bytes)",
                self.remaining
            )));
        }

        self.file.read_exact(buf).map_err(|e| {
            let context = if e.kind() == io::ErrorKind::UnexpectedEof {
                "unexpected EOF while reading input stream"
            } else {
                "failed while reading input stream"
            };
            RenderError::io(context, &self.path, e)
        })?;

        self.remaining -= want;
        Ok(())
    }

    /// Check that the descriptor still answers `fstat`, then release it.
    ///
    /// The release itself goes through `Drop` and reports nothing.
    pub fn finish(self) -> Result<(), RenderError> {
        self.file.metadata().map_err(|e| {
            RenderError::io("input stream became invalid before release", &self.path, e)
        })?;
        debug!(path = %self.path.display(), unread = self.remaining, "released input slice");
        Ok(())
    }
}

/// Validate a slice against the file size and return its length.
pub fn slice_len(file_size: u64, offset: u64, length: Option<u64>) -> Result<u64, RenderError> {
    if offset > file_size {
        return Err(RenderError::Validation(format!(
            "offset ({offset}) exceeds file size ({file_size})"
        )));
    }

    match length {
        None => Ok(file_size - offset),
        Some(length) => match offset.checked_add(length) {
            Some(end) if end <= file_size => Ok(length),
            _ => Err(RenderError::Validation(format!(
                "slice [offset={offset}, length={length}] is outside file size ({file_size})"
            ))),
        },
    }
}
