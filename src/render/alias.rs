//! Destructive-alias protection for output and legend paths.
//!
//! Two layers:
//! - [`AliasGuard::preflight`] compares every destination path against the
//!   input and against each other before any buffer is allocated.
//! - [`AliasGuard::open_checked`] opens a destination without truncating,
//!   compares the identity of the opened descriptor, and only then truncates.
//!   A path swapped to the input between the two steps is caught here.

use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File, Metadata, OpenOptions};
use std::os::unix::fs::MetadataExt;
use std::path::{Component, Path, PathBuf};

use tracing::warn;

use super::paths::page_output_path;
use crate::error::RenderError;

const ALIAS_PREFIX: &str = "refusing destructive path alias";

/// Device and inode of a file object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    pub dev: u64,
    pub ino: u64,
}

impl FileIdentity {
    #[inline]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        }
    }

    /// `fstat` of an open handle.
    pub fn of_file(file: &File) -> std::io::Result<Self> {
        file.metadata().map(|m| Self::from_metadata(&m))
    }

    /// `stat` of a path, following symlinks. `None` if it cannot be stat'ed.
    pub fn of_path(path: &Path) -> Option<Self> {
        fs::metadata(path).ok().map(|m| Self::from_metadata(&m))
    }
}

/// Which destination a path is for. Used in messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Legend,
    /// 1-based page number.
    Page(u64),
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legend => f.write_str("legend"),
            Self::Page(n) => write!(f, "output page {n}"),
        }
    }
}

/// Canonical parent directory joined with the final component.
///
/// The final component itself is not resolved, so this works for files that
/// do not exist yet. `None` when the parent cannot be resolved.
pub fn normalize(path: &Path) -> Option<PathBuf> {
    let name = match path.components().next_back()? {
        Component::Normal(name) => name,
        _ => return None,
    };
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::canonicalize(parent).ok().map(|dir| dir.join(name))
}

/// Whether two paths name the same file: same string, same `stat`
/// identity, or same normalized path.
pub fn paths_alias(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    if let (Some(ia), Some(ib)) = (FileIdentity::of_path(a), FileIdentity::of_path(b)) {
        if ia == ib {
            return true;
        }
    }
    matches!((normalize(a), normalize(b)), (Some(na), Some(nb)) if na == nb)
}

/// Guards writes against clobbering the input.
#[derive(Debug, Clone)]
pub struct AliasGuard {
    input_path: PathBuf,
    input: FileIdentity,
}

impl AliasGuard {
    /// `input` must come from the open input handle.
    pub fn new(input_path: &Path, input: FileIdentity) -> Self {
        Self {
            input_path: input_path.to_path_buf(),
            input,
        }
    }

    fn refuse(&self, message: String) -> RenderError {
        warn!(input = %self.input_path.display(), "{message}");
        RenderError::Alias(message)
    }

    fn refuse_input(&self, role: Role, path: &Path) -> RenderError {
        self.refuse(format!(
            "{ALIAS_PREFIX}: {role} path '{}' aliases input '{}'",
            path.display(),
            self.input_path.display()
        ))
    }

    /// Reject `path` if it names the input.
    pub fn check_destination(&self, role: Role, path: &Path) -> Result<(), RenderError> {
        let aliased = path == self.input_path
            || FileIdentity::of_path(path) == Some(self.input)
            || matches!(
                (normalize(path), normalize(&self.input_path)),
                (Some(a), Some(b)) if a == b
            );
        if aliased {
            return Err(self.refuse_input(role, path));
        }
        Ok(())
    }

    /// Check every page path and the legend path before anything is written.
    pub fn preflight(
        &self,
        output_base: &Path,
        page_count: u64,
        legend: Option<&Path>,
    ) -> Result<(), RenderError> {
        if let Some(legend) = legend {
            self.check_destination(Role::Legend, legend)?;
        }

        // Page names differ by construction; only existing links can collide.
        let mut seen: HashMap<FileIdentity, u64> = HashMap::new();

        for index in 0..page_count.max(1) {
            let page = index + 1;
            let path = page_output_path(output_base, index, page_count);
            self.check_destination(Role::Page(page), &path)?;

            if let Some(legend) = legend {
                if paths_alias(&path, legend) {
                    return Err(self.refuse(format!(
                        "{ALIAS_PREFIX}: {} path '{}' aliases legend path '{}'",
                        Role::Page(page),
                        path.display(),
                        legend.display()
                    )));
                }
            }

            if let Some(identity) = FileIdentity::of_path(&path) {
                if let Some(&other) = seen.get(&identity) {
                    return Err(self.refuse(format!(
                        "{ALIAS_PREFIX}: {} path '{}' aliases {}",
                        Role::Page(page),
                        path.display(),
                        Role::Page(other)
                    )));
                }
                seen.insert(identity, page);
            }
        }

        Ok(())
    }

    /// Open `path` for writing, verify the descriptor is not the input (nor
    /// any identity in `avoid`), then truncate it.
    ///
    /// On a match the file is closed untouched.
    pub fn open_checked(
        &self,
        role: Role,
        path: &Path,
        avoid: &[(Role, FileIdentity)],
    ) -> Result<(File, FileIdentity), RenderError> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| RenderError::io(format!("failed to open {role}"), path, e))?;

        let identity = FileIdentity::of_file(&file)
            .map_err(|e| RenderError::io(format!("failed to stat opened {role}"), path, e))?;

        if identity == self.input {
            return Err(self.refuse_input(role, path));
        }
        if let Some((other, _)) = avoid.iter().find(|(_, id)| *id == identity) {
            return Err(self.refuse(format!(
                "{ALIAS_PREFIX}: {role} path '{}' aliases {other} path",
                path.display()
            )));
        }

        file.set_len(0)
            .map_err(|e| RenderError::io(format!("failed to truncate {role}"), path, e))?;
        Ok((file, identity))
    }
}
