//! hilbertviz command-line interface.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use hilbertviz::render::PlanReport;
use hilbertviz::util::format_percent;
use hilbertviz::{plan_request, render_file, Dimensions, Layout, RenderRequest, RenderResult};

/// Render a binary file slice as a Hilbert-curve image.
#[derive(Parser, Debug)]
#[command(name = "hilbertviz", version, about)]
struct Cli {
    /// Input file
    input: PathBuf,

    /// Output image path (.ppm or .png)
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Hilbert order (1..16)
    #[arg(
        short = 'n',
        long,
        value_parser = clap::value_parser!(u32).range(1..=16),
        overrides_with = "auto_order"
    )]
    order: Option<u32>,

    /// Auto-pick the smallest order that fits the data (default)
    #[arg(short = 'a', long, overrides_with = "order")]
    auto_order: bool,

    /// Read input starting at this byte offset
    #[arg(short = 'f', long, default_value_t = 0)]
    offset: u64,

    /// Read only this many bytes from the offset
    #[arg(short = 'l', long)]
    length: Option<u64>,

    /// Emit multiple pages when the input exceeds one image
    #[arg(short = 'p', long)]
    paginate: bool,

    /// Write a sidecar legend (default: <output>.legend.txt)
    #[arg(short = 'g', long)]
    legend: bool,

    /// Explicit legend path (implies --legend)
    #[arg(short = 'G', long)]
    legend_path: Option<PathBuf>,

    /// Layout: hilbert or rect-hilbert
    #[arg(long, default_value_t = Layout::Hilbert)]
    layout: Layout,

    /// Page dimensions for rect-hilbert, as <W>x<H>
    #[arg(long)]
    dimensions: Option<Dimensions>,

    /// Reject dimensions whose parity forces a diagonal step
    #[arg(long)]
    strict_adjacency: bool,

    /// Print planning details without writing any output
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Cli {
    fn request(&self) -> RenderRequest {
        RenderRequest {
            input_path: self.input.clone(),
            offset: self.offset,
            length: self.length,
            output_path: self.output.clone(),
            legend: self.legend || self.legend_path.is_some(),
            legend_path: self.legend_path.clone(),
            layout: self.layout,
            order: if self.auto_order { None } else { self.order },
            dimensions: self.dimensions,
            paginate: self.paginate,
            strict_adjacency: self.strict_adjacency,
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn summary(request: &RenderRequest, result: &RenderResult) -> String {
    let out = request.output_path.display();
    let shape = match (result.order, result.side) {
        (Some(order), Some(side)) => format!("order={order}, side={side}"),
        _ => format!(
            "layout=rect-hilbert, dimensions={}x{}",
            result.width, result.height
        ),
    };

    if result.page_count <= 1 {
        format!(
            "Wrote {out} ({shape}, input-bytes={}, capacity={})",
            result.input_bytes, result.capacity
        )
    } else {
        format!(
            "Wrote {} pages based on {out} ({shape}, input-bytes={}, capacity/page={})",
            result.page_count, result.input_bytes, result.capacity
        )
    }
}

fn report_text(report: &PlanReport) -> String {
    use std::fmt::Write;

    let geometry = &report.geometry;
    let mut out = String::new();
    let _ = writeln!(out, "Dry run:");
    let _ = writeln!(out, "  layout: {}", report.layout);
    let _ = writeln!(out, "  slice_bytes: {}", report.slice_bytes);
    if let Some(order) = geometry.order {
        let _ = writeln!(out, "  order: {order}");
    }
    let _ = writeln!(out, "  dimensions: {}x{}", geometry.width, geometry.height);
    let _ = writeln!(out, "  capacity_per_page: {}", geometry.capacity);
    let _ = writeln!(out, "  page_count: {}", report.page_count);
    let _ = writeln!(
        out,
        "  utilization_first_page: {}",
        format_percent(report.utilization)
    );

    if report.parity_warning {
        let _ = writeln!(
            out,
            "  warning: odd/even parity may require a diagonal step in 2D rectangular traversal."
        );
    }
    if report.strict_rejected {
        let _ = writeln!(out, "  strict-adjacency: REJECTED (choose parity-safe dimensions).");
    }
    if geometry.order.is_none() {
        let _ = writeln!(out, "Suggestions:");
        for s in &report.suggestions {
            let _ = writeln!(out, "  - {}: {}x{}", s.label, s.width, s.height);
        }
    }
    out
}

fn dry_run(request: &RenderRequest) -> Result<()> {
    let report = plan_request(request)?;
    print!("{}", report_text(&report));
    Ok(())
}

fn render(request: &RenderRequest) -> Result<()> {
    let result = render_file(request)?;
    println!("{}", summary(request, &result));
    if let Some(legend) = request.effective_legend_path() {
        println!("Wrote legend {}", legend.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let request = cli.request();
    let (label, outcome) = if cli.dry_run {
        ("Dry run failed", dry_run(&request))
    } else {
        ("Render failed", render(&request))
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("{e:?}");
            eprintln!("{label}: {e}");
            ExitCode::FAILURE
        }
    }
}
