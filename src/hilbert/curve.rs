//! Square Hilbert curve: mapping between a linear index and (x, y) on a
//! `2^order x 2^order` grid.
//!
//! The Hilbert curve is a space-filling curve that provides good locality preservation,
//! making it ideal for visualizing sequential binary data in 2D space.
//!
//! Orders are bounded to `MIN_ORDER..=MAX_ORDER`; every entry point validates the
//! order and index instead of silently wrapping.

use super::CurveError;

/// Smallest supported curve order (2x2 grid).
pub const MIN_ORDER: u32 = 1;

/// Largest supported curve order (65536x65536 grid).
pub const MAX_ORDER: u32 = 16;

/// Resolved square geometry for one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquareFit {
    pub order: u32,
    pub side: u32,
    pub capacity: u64,
}

/// A validated square Hilbert curve of a fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquareCurve {
    order: u32,
    side: u32,
    capacity: u64,
}

impl SquareCurve {
    /// Create a curve for `order`, failing outside `MIN_ORDER..=MAX_ORDER`.
    pub fn new(order: u32) -> Result<Self, CurveError> {
        Ok(Self {
            order,
            side: side_for_order(order)?,
            capacity: capacity_for_order(order)?,
        })
    }

    #[inline]
    pub fn order(&self) -> u32 {
        self.order
    }

    #[inline]
    pub fn side(&self) -> u32 {
        self.side
    }

    #[inline]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Map a curve index to its cell.
    #[inline]
    pub fn d2xy(&self, d: u64) -> Result<(u32, u32), CurveError> {
        if d >= self.capacity {
            return Err(CurveError::IndexOutOfRange {
                index: d,
                capacity: self.capacity,
            });
        }
        Ok(d2xy_unchecked(self.side, d))
    }

    /// Map a cell back to its curve index.
    #[inline]
    pub fn xy2d(&self, x: u32, y: u32) -> Result<u64, CurveError> {
        if x >= self.side || y >= self.side {
            return Err(CurveError::CoordinateOutOfRange {
                x: i64::from(x),
                y: i64::from(y),
                width: self.side,
                height: self.side,
            });
        }
        Ok(xy2d_unchecked(self.side, x, y))
    }
}

#[inline]
fn check_order(order: u32) -> Result<(), CurveError> {
    if (MIN_ORDER..=MAX_ORDER).contains(&order) {
        Ok(())
    } else {
        Err(CurveError::InvalidOrder { order })
    }
}

/// Grid side length for `order` (`2^order`).
pub fn side_for_order(order: u32) -> Result<u32, CurveError> {
    check_order(order)?;
    Ok(1u32 << order)
}

/// Number of cells for `order` (`4^order`).
pub fn capacity_for_order(order: u32) -> Result<u64, CurveError> {
    check_order(order)?;
    Ok(1u64 << (2 * order))
}

/// Pick the smallest order whose capacity holds `byte_count` bytes.
///
/// Zero bytes still resolve to `MIN_ORDER`, so an empty slice renders one 2x2 page.
pub fn pick_smallest_order(byte_count: u64) -> Result<SquareFit, CurveError> {
    for order in MIN_ORDER..=MAX_ORDER {
        let capacity = capacity_for_order(order)?;
        if byte_count <= capacity {
            return Ok(SquareFit {
                order,
                side: side_for_order(order)?,
                capacity,
            });
        }
    }

    Err(CurveError::ExceedsMaxCapacity {
        bytes: byte_count,
        max_order: MAX_ORDER,
        max_capacity: capacity_for_order(MAX_ORDER)?,
    })
}

/// Convert distance along the curve to (x, y) coordinates.
///
/// # Arguments
/// * `order` - Curve order (`MIN_ORDER..=MAX_ORDER`)
/// * `d` - Distance along the curve, must be below `4^order`
pub fn d2xy(order: u32, d: u64) -> Result<(u32, u32), CurveError> {
    SquareCurve::new(order)?.d2xy(d)
}

/// Convert (x, y) coordinates to distance along the curve.
pub fn xy2d(order: u32, x: u32, y: u32) -> Result<u64, CurveError> {
    SquareCurve::new(order)?.xy2d(x, y)
}

/// Rotate/flip a quadrant appropriately for the Hilbert curve transformation.
///
/// `n` is the current sub-square size; reflection is `n - 1 - v`, which stays in
/// range because callers only rotate coordinates already bounded by `n`.
#[inline(always)]
fn rot(n: u32, x: &mut u32, y: &mut u32, rx: u32, ry: u32) {
    if ry == 0 {
        if rx == 1 {
            *x = n - 1 - *x;
            *y = n - 1 - *y;
        }
        std::mem::swap(x, y);
    }
}

#[inline]
fn d2xy_unchecked(side: u32, d: u64) -> (u32, u32) {
    let mut x = 0u32;
    let mut y = 0u32;
    let mut s = 1u32;
    let mut t = d;

    while s < side {
        let rx = ((t / 2) & 1) as u32;
        let ry = ((t ^ u64::from(rx)) & 1) as u32;

        rot(s, &mut x, &mut y, rx, ry);

        x += s * rx;
        y += s * ry;
        t /= 4;
        s <<= 1;
    }

    (x, y)
}

#[inline]
fn xy2d_unchecked(side: u32, mut x: u32, mut y: u32) -> u64 {
    let mut d = 0u64;
    let mut s = side / 2;

    while s > 0 {
        let rx = u32::from((x & s) > 0);
        let ry = u32::from((y & s) > 0);
        d += u64::from(s) * u64::from(s) * u64::from((3 * rx) ^ ry);
        // Reduce into the current quadrant before rotating so `rot` never underflows.
        x &= s - 1;
        y &= s - 1;
        rot(s, &mut x, &mut y, rx, ry);
        s /= 2;
    }

    d
}
