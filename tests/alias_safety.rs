//! Destructive-alias protection, end to end.
//!
//! Every case checks two things: the render fails with an alias error, and
//! the input bytes are unchanged afterwards.

use std::fs;
use std::io::Write;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use hilbertviz::image::{FormatSink, ImageSink};
use hilbertviz::render::page_output_path;
use hilbertviz::{RenderConfig, RenderError, RenderRequest, Renderer};

const INPUT: &[u8] = b"0123456789";

fn setup() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let input = dir.path().join("input.bin");
    fs::write(&input, INPUT).unwrap();
    (dir, input)
}

fn paged(input: &Path, output: PathBuf) -> RenderRequest {
    RenderRequest {
        order: Some(1),
        paginate: true,
        ..RenderRequest::new(input, output)
    }
}

fn assert_alias(result: Result<hilbertviz::RenderResult, RenderError>, input: &Path) -> String {
    let err = result.expect_err("render should refuse the alias");
    assert!(err.is_alias(), "expected alias error, got: {err}");
    let text = err.to_string();
    assert!(text.starts_with("refusing destructive path alias"), "{text}");
    assert_eq!(fs::read(input).unwrap(), INPUT, "input was modified");
    text
}

fn render(request: &RenderRequest) -> Result<hilbertviz::RenderResult, RenderError> {
    Renderer::new(RenderConfig::default()).render(request)
}

#[test]
fn test_output_equal_to_input() {
    let (_dir, input) = setup();
    let request = RenderRequest::new(&input, &input);
    let text = assert_alias(render(&request), &input);
    assert!(text.contains("output page 1"));
}

#[test]
fn test_output_spelled_differently() {
    let (dir, input) = setup();
    fs::create_dir(dir.path().join("sub")).unwrap();
    let dotted = dir.path().join("sub").join("..").join("input.bin");
    assert_alias(render(&RenderRequest::new(&input, dotted)), &input);
}

#[test]
fn test_legend_equal_to_input() {
    let (dir, input) = setup();
    let request = RenderRequest {
        legend: true,
        legend_path: Some(input.clone()),
        ..RenderRequest::new(&input, dir.path().join("out.ppm"))
    };
    let text = assert_alias(render(&request), &input);
    assert!(text.contains("legend path"));
    assert!(!dir.path().join("out.ppm").exists());
}

#[test]
fn test_output_symlink_to_input() {
    let (dir, input) = setup();
    let link = dir.path().join("link.ppm");
    symlink(&input, &link).unwrap();
    assert_alias(render(&RenderRequest::new(&input, &link)), &input);
}

#[test]
fn test_output_hard_link_to_input() {
    let (dir, input) = setup();
    let link = dir.path().join("hard.ppm");
    fs::hard_link(&input, &link).unwrap();
    assert_alias(render(&RenderRequest::new(&input, &link)), &input);
}

#[test]
fn test_legend_equal_to_single_page() {
    let (dir, input) = setup();
    let out = dir.path().join("out.ppm");
    let request = RenderRequest {
        legend: true,
        legend_path: Some(out.clone()),
        ..RenderRequest::new(&input, &out)
    };
    let text = assert_alias(render(&request), &input);
    assert!(text.contains("aliases legend path"));
    assert!(!out.exists());
}

#[test]
fn test_legend_symlink_to_input() {
    let (dir, input) = setup();
    let legend = dir.path().join("legend.txt");
    symlink(&input, &legend).unwrap();

    let request = RenderRequest {
        legend: true,
        legend_path: Some(legend),
        ..RenderRequest::new(&input, dir.path().join("out.ppm"))
    };
    let text = assert_alias(render(&request), &input);
    assert!(text.contains("legend path"), "{text}");
    assert!(text.contains("aliases input"), "{text}");
    assert!(!dir.path().join("out.ppm").exists());
}

#[test]
fn test_legend_hard_link_to_input() {
    let (dir, input) = setup();
    let legend = dir.path().join("legend.txt");
    fs::hard_link(&input, &legend).unwrap();

    let request = RenderRequest {
        legend: true,
        legend_path: Some(legend),
        ..RenderRequest::new(&input, dir.path().join("out.ppm"))
    };
    let text = assert_alias(render(&request), &input);
    assert!(text.contains("aliases input"), "{text}");
}

#[test]
fn test_legend_equal_to_generated_page() {
    let (dir, input) = setup();
    let base = dir.path().join("out.ppm");
    let request = RenderRequest {
        legend: true,
        legend_path: Some(page_output_path(&base, 1, 3)),
        ..paged(&input, base.clone())
    };

    let text = assert_alias(render(&request), &input);
    assert!(text.contains("output page 2"), "{text}");
    assert!(text.contains("aliases legend path"), "{text}");
    for index in 0..3 {
        assert!(!page_output_path(&base, index, 3).exists());
    }
}

#[test]
fn test_generated_page_name_equal_to_input() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("out_page0002.ppm");
    fs::write(&input, INPUT).unwrap();

    let request = paged(&input, dir.path().join("out.ppm"));
    let text = assert_alias(render(&request), &input);
    assert!(text.contains("output page 2"), "{text}");
    // Preflight runs before anything is opened for writing.
    assert!(!dir.path().join("out_page0001.ppm").exists());
}

#[test]
fn test_unrelated_outputs_render() {
    let (dir, input) = setup();
    let request = RenderRequest {
        legend: true,
        ..paged(&input, dir.path().join("out.ppm"))
    };
    let result = render(&request).unwrap();
    assert_eq!(result.page_count, 3);
    assert_eq!(fs::read(&input).unwrap(), INPUT);
}

/// Sink that swaps a later page path for a link while page 1 is written.
struct SwapSink {
    inner: FormatSink,
    target: PathBuf,
    link_to: PathBuf,
    hard: bool,
    pages: usize,
}

impl ImageSink for SwapSink {
    fn check_path(&self, path: &Path) -> Result<(), RenderError> {
        self.inner.check_path(path)
    }

    fn write_image(
        &mut self,
        path: &Path,
        dest: &mut dyn Write,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<(), RenderError> {
        self.pages += 1;
        if self.pages == 1 {
            if self.hard {
                fs::hard_link(&self.link_to, &self.target).unwrap();
            } else {
                symlink(&self.link_to, &self.target).unwrap();
            }
        }
        self.inner.write_image(path, dest, width, height, pixels)
    }
}

#[test]
fn test_page_swapped_to_input_after_preflight() {
    let (dir, input) = setup();
    let base = dir.path().join("out.ppm");
    let sink = SwapSink {
        inner: FormatSink,
        target: page_output_path(&base, 1, 3),
        link_to: input.clone(),
        hard: false,
        pages: 0,
    };

    let mut renderer = Renderer::new(RenderConfig::default()).with_sink(sink);
    let text = assert_alias(renderer.render(&paged(&input, base.clone())), &input);
    assert!(text.contains("output page 2"), "{text}");

    // Page 1 was written before the swap was noticed; page 3 never was.
    assert_eq!(fs::read(page_output_path(&base, 0, 3)).unwrap().len(), 23);
    assert!(!page_output_path(&base, 2, 3).exists());
}

#[test]
fn test_page_swapped_to_legend_after_preflight() {
    let (dir, input) = setup();
    let base = dir.path().join("out.ppm");
    let legend = dir.path().join("legend.txt");
    let sink = SwapSink {
        inner: FormatSink,
        target: page_output_path(&base, 1, 3),
        link_to: legend.clone(),
        hard: true,
        pages: 0,
    };

    let request = RenderRequest {
        legend: true,
        legend_path: Some(legend.clone()),
        ..paged(&input, base)
    };
    let mut renderer = Renderer::new(RenderConfig::default()).with_sink(sink);
    let text = assert_alias(renderer.render(&request), &input);
    assert!(text.contains("aliases legend path"), "{text}");
}
