//! Output path derivation for pages and the legend.

use std::ffi::OsString;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};

/// Suffix appended to the output path to form the default legend path.
pub const LEGEND_SUFFIX: &str = ".legend.txt";

const MIN_PAGE_DIGITS: usize = 4;
const MAX_PAGE_DIGITS: usize = 32;

#[inline]
fn decimal_digits(mut n: u64) -> usize {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

/// Path for page `page_index` (0-based) of `page_count`.
///
/// A single page keeps the base path. Otherwise `_pageNNNN` (1-based, zero
/// padded to at least four digits) goes before the extension of the final
/// component, or at the end when that component has no dot:
///
/// ```
/// use std::path::Path;
/// use hilbertviz::render::paths::page_output_path;
///
/// assert_eq!(page_output_path(Path::new("out.ppm"), 0, 3), Path::new("out_page0001.ppm"));
/// assert_eq!(page_output_path(Path::new("a.d/out"), 2, 3), Path::new("a.d/out_page0003"));
/// ```
pub fn page_output_path(base: &Path, page_index: u64, page_count: u64) -> PathBuf {
    if page_count <= 1 {
        return base.to_path_buf();
    }

    let bytes = base.as_os_str().as_bytes();
    let name_start = bytes.iter().rposition(|&b| b == b'/').map_or(0, |i| i + 1);
    let split = bytes[name_start..]
        .iter()
        .rposition(|&b| b == b'.')
        .map_or(bytes.len(), |i| name_start + i);

    let width = decimal_digits(page_count).clamp(MIN_PAGE_DIGITS, MAX_PAGE_DIGITS);
    let tag = format!("_page{:0width$}", page_index.saturating_add(1));

    let mut out = Vec::with_capacity(bytes.len() + tag.len());
    out.extend_from_slice(&bytes[..split]);
    out.extend_from_slice(tag.as_bytes());
    out.extend_from_slice(&bytes[split..]);
    PathBuf::from(OsString::from_vec(out))
}

/// `<output>.legend.txt`
pub fn default_legend_path(output: &Path) -> PathBuf {
    let mut path = output.as_os_str().to_os_string();
    path.push(LEGEND_SUFFIX);
    PathBuf::from(path)
}
