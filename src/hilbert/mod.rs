//! Space-filling curve indexers.
//!
//! This module provides:
//! - Square Hilbert curves over `2^order x 2^order` grids
//! - Generalized Hilbert curves over arbitrary `width x height` rectangles
//! - [`Curve`], which dispatches between the two by direct match

pub mod curve;
pub mod rect;

pub use curve::{
    capacity_for_order, d2xy, pick_smallest_order, side_for_order, xy2d, SquareCurve, SquareFit,
    MAX_ORDER, MIN_ORDER,
};
pub use rect::{
    gilbert_d2xy, gilbert_d2xy_with_limit, unavoidable_diagonal, RectCurve, DEFAULT_MAX_DEPTH,
};

/// Failures from curve math. None of these wrap or truncate silently.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CurveError {
    #[error("invalid order {order} (allowed {MIN_ORDER}..{MAX_ORDER})")]
    InvalidOrder { order: u32 },

    #[error("index {index} is outside curve capacity {capacity}")]
    IndexOutOfRange { index: u64, capacity: u64 },

    #[error("{bytes} bytes exceed max order {max_order} capacity ({max_capacity} bytes)")]
    ExceedsMaxCapacity {
        bytes: u64,
        max_order: u32,
        max_capacity: u64,
    },

    #[error("dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("mapped coordinate ({x}, {y}) is outside {width}x{height}")]
    CoordinateOutOfRange {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },

    #[error("arithmetic overflow in curve computation")]
    Overflow,

    #[error("curve split produced an empty region")]
    EmptyRegion,

    #[error("curve recursion exceeded depth limit {limit}")]
    DepthExceeded { limit: u32 },
}

/// The curve used to lay out one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    Square(SquareCurve),
    Rect(RectCurve),
}

impl Curve {
    #[inline]
    pub fn width(&self) -> u32 {
        match self {
            Self::Square(c) => c.side(),
            Self::Rect(c) => c.width(),
        }
    }

    #[inline]
    pub fn height(&self) -> u32 {
        match self {
            Self::Square(c) => c.side(),
            Self::Rect(c) => c.height(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> u64 {
        match self {
            Self::Square(c) => c.capacity(),
            Self::Rect(c) => c.capacity(),
        }
    }

    /// Map a page-local index to its pixel.
    #[inline]
    pub fn d2xy(&self, d: u64) -> Result<(u32, u32), CurveError> {
        match self {
            Self::Square(c) => c.d2xy(d),
            Self::Rect(c) => c.d2xy(d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_matches_underlying_curves() {
        let square = Curve::Square(SquareCurve::new(3).unwrap());
        assert_eq!((square.width(), square.height(), square.capacity()), (8, 8, 64));
        assert_eq!(square.d2xy(17).unwrap(), d2xy(3, 17).unwrap());

        let rect = Curve::Rect(RectCurve::new(7, 4).unwrap());
        assert_eq!((rect.width(), rect.height(), rect.capacity()), (7, 4, 28));
        assert_eq!(rect.d2xy(20).unwrap(), gilbert_d2xy(7, 4, 20).unwrap());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CurveError::InvalidOrder { order: 20 }.to_string(),
            "invalid order 20 (allowed 1..16)"
        );
        assert!(CurveError::Overflow.to_string().contains("overflow"));
    }
}
