//! Sidecar legend: render parameters plus per-page byte class counts.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::geometry::Plan;
use super::RenderRequest;
use crate::analysis::ByteStats;
use crate::error::RenderError;

/// Column header line, matching the order of [`ByteStats::columns`].
pub const LEGEND_COLUMNS: &str =
    "columns=page_index,page_bytes,null_bytes,low_bytes,ascii_bytes,high_bytes";

/// Buffered legend writer.
pub struct LegendWriter<W: Write> {
    out: BufWriter<W>,
    path: PathBuf,
}

impl<W: Write> LegendWriter<W> {
    pub fn new(dest: W, path: &Path) -> Self {
        Self {
            out: BufWriter::new(dest),
            path: path.to_path_buf(),
        }
    }

    fn fail(&self, context: &str) -> impl FnOnce(std::io::Error) -> RenderError + '_ {
        let context = context.to_string();
        move |e| RenderError::io(context, &self.path, e)
    }

    /// Write the key/value header and the columns line.
    pub fn write_header(
        &mut self,
        request: &RenderRequest,
        plan: &Plan,
        input_bytes: u64,
    ) -> Result<(), RenderError> {
        let geometry = &plan.geometry;
        let order = geometry
            .order
            .map_or_else(|| "n/a".to_string(), |o| o.to_string());
        let length = if request.length.is_some() {
            "explicit"
        } else {
            "until_eof"
        };

        let text = format!(
            "# hilbertviz legend\n\
             input={}\n\
             output_base={}\n\
             layout={}\n\
             offset={}\n\
             length={length}\n\
             order={order}\n\
             width={}\n\
             height={}\n\
             capacity_per_page={}\n\
             page_count={}\n\
             input_bytes={input_bytes}\n\
             {LEGEND_COLUMNS}\n",
            request.input_path.display(),
            request.output_path.display(),
            request.layout.name(),
            request.offset,
            geometry.width,
            geometry.height,
            geometry.capacity,
            plan.page_count,
        );
        let result = self.out.write_all(text.as_bytes());
        result.map_err(self.fail("failed to write legend header"))
    }

    /// Append the row for page `page_index` (0-based).
    pub fn write_page(&mut self, page_index: u64, stats: &ByteStats) -> Result<(), RenderError> {
        let [total, null, low, ascii, high] = stats.columns();
        let result = writeln!(
            self.out,
            "{},{total},{null},{low},{ascii},{high}",
            page_index + 1
        );
        result.map_err(self.fail("failed while writing legend page stats"))
    }

    /// Append the `total` row.
    pub fn write_total(&mut self, stats: &ByteStats) -> Result<(), RenderError> {
        let [total, null, low, ascii, high] = stats.columns();
        let result = writeln!(self.out, "total,{total},{null},{low},{ascii},{high}");
        result.map_err(self.fail("failed while writing legend totals"))
    }

    /// Flush buffered output and hand back the destination.
    pub fn finish(self) -> Result<W, RenderError> {
        let path = self.path;
        self.out
            .into_inner()
            .map_err(|e| RenderError::io("failed to close legend output", &path, e.into_error()))
    }
}
