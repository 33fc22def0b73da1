//! Streaming render pipeline.
//!
//! A render reads the requested slice of the input in fixed-size chunks,
//! classifies and paints every byte at its curve position, and writes one
//! image per page (plus an optional legend). Every destination is checked
//! against the input twice: once by path before any work, and once by the
//! identity of the opened descriptor right before truncation.

pub mod alias;
pub mod geometry;
pub mod legend;
pub mod paths;
pub mod stream;

use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, info};

use crate::analysis::ByteStats;
use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::hilbert::Curve;
use crate::image::{FormatSink, ImageSink};
use crate::util::color::byte_to_rgb;
use crate::util::format::format_bytes;

pub use alias::{AliasGuard, FileIdentity, Role};
pub use geometry::{plan, plan_report, Geometry, Plan, PlanReport, RectSuggestion};
pub use legend::LegendWriter;
pub use paths::{default_legend_path, page_output_path};
pub use stream::SliceStream;

/// Curve family used to lay out pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Square Hilbert curve, `2^order` per side.
    #[default]
    Hilbert,
    /// Generalized Hilbert curve over explicit `WxH` dimensions.
    RectHilbert,
}

impl Layout {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hilbert => "hilbert",
            Self::RectHilbert => "rect-hilbert",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hilbert" => Ok(Self::Hilbert),
            "rect-hilbert" => Ok(Self::RectHilbert),
            other => Err(format!(
                "invalid layout '{other}' (expected 'hilbert' or 'rect-hilbert')"
            )),
        }
    }
}

/// Page size for the rect layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Dimensions {
    type Err = String;

    /// `WxH` or `WXH`, both positive decimal integers.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid dimensions '{s}' (expected <W>x<H> with positive integers)");
        let parse_side = |text: &str| -> Result<u32, String> {
            if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            match text.parse::<u32>() {
                Ok(0) | Err(_) => Err(invalid()),
                Ok(n) => Ok(n),
            }
        };

        let (w, h) = s.split_once(['x', 'X']).ok_or_else(invalid)?;
        Ok(Self {
            width: parse_side(w)?,
            height: parse_side(h)?,
        })
    }
}

/// One render invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub input_path: PathBuf,
    pub offset: u64,
    /// `None` reads to EOF.
    pub length: Option<u64>,
    /// Base output path; pages derive from it when there is more than one.
    pub output_path: PathBuf,
    pub legend: bool,
    /// Defaults to `<output_path>.legend.txt` when the legend is enabled.
    pub legend_path: Option<PathBuf>,
    pub layout: Layout,
    /// `None` picks the order automatically.
    pub order: Option<u32>,
    pub dimensions: Option<Dimensions>,
    pub paginate: bool,
    pub strict_adjacency: bool,
}

impl RenderRequest {
    /// A square auto-order request for the whole input.
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            offset: 0,
            length: None,
            output_path: output_path.into(),
            legend: false,
            legend_path: None,
            layout: Layout::Hilbert,
            order: None,
            dimensions: None,
            paginate: false,
            strict_adjacency: false,
        }
    }

    /// Legend destination, if the legend is enabled.
    pub fn effective_legend_path(&self) -> Option<PathBuf> {
        if !self.legend {
            return None;
        }
        Some(
            self.legend_path
                .clone()
                .unwrap_or_else(|| default_legend_path(&self.output_path)),
        )
    }
}

/// Outcome of a successful render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderResult {
    pub order: Option<u32>,
    pub side: Option<u32>,
    pub width: u32,
    pub height: u32,
    pub capacity: u64,
    pub input_bytes: u64,
    pub page_count: u64,
}

/// Render pipeline bound to a configuration and an image sink.
pub struct Renderer<S = FormatSink> {
    config: RenderConfig,
    sink: S,
}

impl Renderer<FormatSink> {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            sink: FormatSink,
        }
    }
}

impl<S: ImageSink> Renderer<S> {
    /// Replace the image sink.
    pub fn with_sink<T: ImageSink>(self, sink: T) -> Renderer<T> {
        Renderer {
            config: self.config,
            sink,
        }
    }

    /// Render `request`.
    pub fn render(&mut self, request: &RenderRequest) -> Result<RenderResult, RenderError> {
        let mut stream =
            SliceStream::open(&request.input_path, request.offset, request.length)?;
        let guard = AliasGuard::new(&request.input_path, stream.identity());
        let total = stream.total();

        let plan = plan(request, total)?;
        let geometry = plan.geometry;
        let curve = geometry.curve()?;
        let legend_path = request.effective_legend_path();

        guard.preflight(&request.output_path, plan.page_count, legend_path.as_deref())?;
        // Page suffixes keep the extension, so the first page speaks for all.
        self.sink
            .check_path(&page_output_path(&request.output_path, 0, plan.page_count))?;

        let pixel_bytes = geometry.pixel_bytes()?;
        if !self.config.allows_image_bytes(pixel_bytes) {
            return Err(RenderError::ResourceLimit(format!(
                "image buffer ({pixel_bytes} bytes) exceeds configured cap ({} bytes); set {} to raise/disable (0) the cap",
                self.config.max_image_bytes,
                crate::config::MAX_IMAGE_BYTES_ENV
            )));
        }
        let pixel_len = usize::try_from(pixel_bytes).map_err(|_| {
            RenderError::ResourceLimit(format!(
                "image buffer ({pixel_bytes} bytes) is too large for this platform"
            ))
        })?;

        let mut pixels = alloc_zeroed(pixel_len, "image buffer")?;
        let chunk_len = self
            .config
            .read_chunk_bytes
            .max(1)
            .min(usize::try_from(geometry.capacity).unwrap_or(usize::MAX));
        let mut chunk = alloc_zeroed(chunk_len, "read buffer")?;

        let mut legend = None;
        let mut avoid = Vec::with_capacity(1);
        if let Some(path) = legend_path.as_deref() {
            let (file, identity) = guard.open_checked(Role::Legend, path, &[])?;
            avoid.push((Role::Legend, identity));
            let mut writer = LegendWriter::new(file, path);
            writer.write_header(request, &plan, total)?;
            legend = Some(writer);
        }

        let mut totals = ByteStats::default();
        for index in 0..plan.page_count {
            pixels.fill(0);
            let page_bytes = stream.remaining().min(geometry.capacity);
            let stats = paint_page(&mut stream, &curve, page_bytes, &mut chunk, &mut pixels)?;
            totals += stats;

            let path = page_output_path(&request.output_path, index, plan.page_count);
            let (file, _) = guard.open_checked(Role::Page(index + 1), &path, &avoid)?;
            let mut out = BufWriter::new(file);
            self.sink
                .write_image(&path, &mut out, geometry.width, geometry.height, &pixels)?;
            finish_page(out, &path)?;

            if let Some(writer) = legend.as_mut() {
                writer.write_page(index, &stats)?;
            }
            debug!(
                page = index + 1,
                of = plan.page_count,
                bytes = stats.total,
                path = %path.display(),
                "wrote page"
            );
        }

        if let Some(mut writer) = legend {
            writer.write_total(&totals)?;
            writer.finish()?;
        }

        stream.finish()?;

        let result = RenderResult {
            order: geometry.order,
            side: geometry.side(),
            width: geometry.width,
            height: geometry.height,
            capacity: geometry.capacity,
            input_bytes: total,
            page_count: plan.page_count,
        };
        info!(
            input = %request.input_path.display(),
            output = %request.output_path.display(),
            bytes = total,
            size = %format_bytes(total),
            pages = plan.page_count,
            "render complete"
        );
        Ok(result)
    }
}

fn alloc_zeroed(len: usize, what: &str) -> Result<Vec<u8>, RenderError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| {
        RenderError::ResourceLimit(format!("failed to allocate {what} ({len} bytes)"))
    })?;
    buf.resize(len, 0);
    Ok(buf)
}

/// Read `page_bytes` from the stream and paint them into `pixels`.
fn paint_page(
    stream: &mut SliceStream,
    curve: &Curve,
    page_bytes: u64,
    chunk: &mut [u8],
    pixels: &mut [u8],
) -> Result<ByteStats, RenderError> {
    let mut stats = ByteStats::default();
    let width = curve.width() as usize;
    let mut d = 0u64;

    while d < page_bytes {
        let len = usize::try_from(page_bytes - d).map_or(chunk.len(), |left| left.min(chunk.len()));
        let buf = &mut chunk[..len];
        stream.read_exact(buf)?;
        stats.record_slice(buf);

        for &value in buf.iter() {
            let (x, y) = curve.d2xy(d).map_err(|e| RenderError::from_mapping(e, d))?;
            let at = (y as usize)
                .checked_mul(width)
                .and_then(|row| row.checked_add(x as usize))
                .and_then(|px| px.checked_mul(3))
                .filter(|&at| at.checked_add(3).is_some_and(|end| end <= pixels.len()))
                .ok_or_else(|| {
                    RenderError::MappingInvariant(format!(
                        "index {d} mapped to ({x}, {y}) outside the pixel buffer"
                    ))
                })?;
            pixels[at..at + 3].copy_from_slice(&byte_to_rgb(value));
            d += 1;
        }
    }

    Ok(stats)
}

fn finish_page(out: BufWriter<File>, path: &Path) -> Result<(), RenderError> {
    out.into_inner()
        .map(drop)
        .map_err(|e| RenderError::io("failed to close output page", path, e.into_error()))
}

/// Render with the environment configuration and the extension-based sink.
pub fn render_file(request: &RenderRequest) -> Result<RenderResult, RenderError> {
    let config = RenderConfig::from_env()?;
    Renderer::new(config).render(request)
}

/// Dry run: open the input slice and report the plan without writing anything.
pub fn plan_request(request: &RenderRequest) -> Result<PlanReport, RenderError> {
    let stream = SliceStream::open(&request.input_path, request.offset, request.length)?;
    let report = plan_report(request, stream.total())?;
    stream.finish()?;
    Ok(report)
}
