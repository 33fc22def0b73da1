//! hilbertviz - deterministic Hilbert-curve fingerprint images for binary files.
//!
//! Each byte of an input slice is placed at its position along a space-filling
//! curve and painted with a color derived from its value:
//! - Square Hilbert curves (`2^order` per side) or generalized Hilbert curves
//!   over arbitrary `WxH` rectangles
//! - Automatic order selection and pagination for large slices
//! - PPM and PNG output, plus an optional per-page byte class legend
//! - Refuses to write any output that would clobber the input file
//!
//! The entry points are [`render::render_file`] and [`render::Renderer`].

pub mod analysis;
pub mod config;
pub mod error;
pub mod hilbert;
pub mod image;
pub mod render;
pub mod util;

pub use config::RenderConfig;
pub use error::RenderError;
pub use render::{
    plan_request, render_file, Dimensions, Layout, RenderRequest, RenderResult, Renderer,
};
