//! Generalized Hilbert curve over arbitrary `width x height` rectangles.
//!
//! The curve is described by an origin and two axis-aligned direction vectors
//! `a` (major) and `b` (minor). Each step either walks a one-cell-thick strip or
//! splits the region in two ("wide" regions) or three ("squarish" regions), nudging
//! odd halves by one cell so the path stays connected across the split.
//!
//! Every recursive call is in tail position, so the descent runs as a loop with an
//! explicit depth counter. All arithmetic is checked; any overflow aborts the
//! lookup with [`CurveError::Overflow`] instead of wrapping.

use super::CurveError;

/// Default bound on split depth. Real inputs need far less (the depth grows with
/// `log2` of the larger side), this only stops pathological descents.
pub const DEFAULT_MAX_DEPTH: u32 = 256;

/// A validated rectangular curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RectCurve {
    width: u32,
    height: u32,
    capacity: u64,
    max_depth: u32,
}

impl RectCurve {
    /// Create a curve for a `width x height` grid with the default depth limit.
    pub fn new(width: u32, height: u32) -> Result<Self, CurveError> {
        if width == 0 || height == 0 {
            return Err(CurveError::InvalidDimensions { width, height });
        }
        let capacity = u64::from(width)
            .checked_mul(u64::from(height))
            .ok_or(CurveError::Overflow)?;

        Ok(Self {
            width,
            height,
            capacity,
            max_depth: DEFAULT_MAX_DEPTH,
        })
    }

    /// Override the split depth limit.
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Map a curve index to its cell.
    pub fn d2xy(&self, d: u64) -> Result<(u32, u32), CurveError> {
        if d >= self.capacity {
            return Err(CurveError::IndexOutOfRange {
                index: d,
                capacity: self.capacity,
            });
        }

        let w = i64::from(self.width);
        let h = i64::from(self.height);
        let start = if self.width >= self.height {
            Frame::new(w, 0, 0, h)
        } else {
            Frame::new(0, h, w, 0)
        };

        let (x, y) = locate(start, d, self.max_depth)?;
        match (u32::try_from(x), u32::try_from(y)) {
            (Ok(cx), Ok(cy)) if cx < self.width && cy < self.height => Ok((cx, cy)),
            _ => Err(CurveError::CoordinateOutOfRange {
                x,
                y,
                width: self.width,
                height: self.height,
            }),
        }
    }
}

/// Map `d` on a `width x height` grid with the default depth limit.
pub fn gilbert_d2xy(width: u32, height: u32, d: u64) -> Result<(u32, u32), CurveError> {
    RectCurve::new(width, height)?.d2xy(d)
}

/// Map `d` on a `width x height` grid with an explicit depth limit.
pub fn gilbert_d2xy_with_limit(
    width: u32,
    height: u32,
    d: u64,
    max_depth: u32,
) -> Result<(u32, u32), CurveError> {
    RectCurve::new(width, height)?
        .with_max_depth(max_depth)
        .d2xy(d)
}

/// True when the grid cannot be covered without at least one diagonal step:
/// the larger side is odd and the smaller side is even.
#[inline]
pub fn unavoidable_diagonal(width: u32, height: u32) -> bool {
    let (larger, smaller) = if height > width {
        (height, width)
    } else {
        (width, height)
    };
    larger % 2 == 1 && smaller % 2 == 0
}

/// Current sub-region: origin plus major/minor direction vectors.
#[derive(Debug, Clone, Copy)]
struct Frame {
    x: i64,
    y: i64,
    ax: i64,
    ay: i64,
    bx: i64,
    by: i64,
}

impl Frame {
    fn new(ax: i64, ay: i64, bx: i64, by: i64) -> Self {
        Self {
            x: 0,
            y: 0,
            ax,
            ay,
            bx,
            by,
        }
    }
}

#[inline]
fn add(a: i64, b: i64) -> Result<i64, CurveError> {
    a.checked_add(b).ok_or(CurveError::Overflow)
}

#[inline]
fn sub(a: i64, b: i64) -> Result<i64, CurveError> {
    a.checked_sub(b).ok_or(CurveError::Overflow)
}

#[inline]
fn mul(a: i64, b: i64) -> Result<i64, CurveError> {
    a.checked_mul(b).ok_or(CurveError::Overflow)
}

#[inline]
fn neg(a: i64) -> Result<i64, CurveError> {
    a.checked_neg().ok_or(CurveError::Overflow)
}

/// Cell extent of a vector (`|u + v|`; one component is always zero).
#[inline]
fn extent(u: i64, v: i64) -> Result<u64, CurveError> {
    let sum = add(u, v)?;
    let abs = sum.checked_abs().ok_or(CurveError::Overflow)?;
    Ok(abs.unsigned_abs())
}

fn dims(ax: i64, ay: i64, bx: i64, by: i64) -> Result<(u64, u64), CurveError> {
    let w = extent(ax, ay)?;
    let h = extent(bx, by)?;
    if w == 0 || h == 0 {
        return Err(CurveError::EmptyRegion);
    }
    Ok((w, h))
}

fn cells(ax: i64, ay: i64, bx: i64, by: i64) -> Result<u64, CurveError> {
    let (w, h) = dims(ax, ay, bx, by)?;
    w.checked_mul(h).ok_or(CurveError::Overflow)
}

/// Walk `steps` cells from the origin along a unit direction.
fn walk(x: i64, y: i64, dx: i64, dy: i64, steps: u64) -> Result<(i64, i64), CurveError> {
    let steps = i64::try_from(steps).map_err(|_| CurveError::Overflow)?;
    Ok((add(x, mul(dx, steps)?)?, add(y, mul(dy, steps)?)?))
}

fn locate(mut f: Frame, mut d: u64, max_depth: u32) -> Result<(i64, i64), CurveError> {
    let mut depth = 0u32;

    loop {
        if depth > max_depth {
            return Err(CurveError::DepthExceeded { limit: max_depth });
        }

        let (w, h) = dims(f.ax, f.ay, f.bx, f.by)?;
        let total = w.checked_mul(h).ok_or(CurveError::Overflow)?;
        if d >= total {
            return Err(CurveError::IndexOutOfRange {
                index: d,
                capacity: total,
            });
        }

        let (dax, day) = (f.ax.signum(), f.ay.signum());
        let (dbx, dby) = (f.bx.signum(), f.by.signum());

        if h == 1 {
            return walk(f.x, f.y, dax, day, d);
        }
        if w == 1 {
            return walk(f.x, f.y, dbx, dby, d);
        }

        // Floor division toward negative infinity for negative vectors.
        let (mut ax2, mut ay2) = (f.ax.div_euclid(2), f.ay.div_euclid(2));
        let (mut bx2, mut by2) = (f.bx.div_euclid(2), f.by.div_euclid(2));
        let (w2, h2) = dims(ax2, ay2, bx2, by2)?;

        let wide = w.checked_mul(2).ok_or(CurveError::Overflow)?
            > h.checked_mul(3).ok_or(CurveError::Overflow)?;

        if wide {
            if w2 % 2 == 1 && w > 2 {
                ax2 = add(ax2, dax)?;
                ay2 = add(ay2, day)?;
            }

            let first = cells(ax2, ay2, f.bx, f.by)?;
            if d < first {
                f.ax = ax2;
                f.ay = ay2;
            } else {
                f.x = add(f.x, ax2)?;
                f.y = add(f.y, ay2)?;
                f.ax = sub(f.ax, ax2)?;
                f.ay = sub(f.ay, ay2)?;
                d -= first;
            }
        } else {
            if h2 % 2 == 1 && h > 2 {
                bx2 = add(bx2, dbx)?;
                by2 = add(by2, dby)?;
            }

            let bx_rest = sub(f.bx, bx2)?;
            let by_rest = sub(f.by, by2)?;
            let first = cells(bx2, by2, ax2, ay2)?;
            let second = cells(f.ax, f.ay, bx_rest, by_rest)?;
            let first_two = first.checked_add(second).ok_or(CurveError::Overflow)?;

            if d < first {
                f = Frame {
                    x: f.x,
                    y: f.y,
                    ax: bx2,
                    ay: by2,
                    bx: ax2,
                    by: ay2,
                };
            } else if d < first_two {
                f = Frame {
                    x: add(f.x, bx2)?,
                    y: add(f.y, by2)?,
                    ax: f.ax,
                    ay: f.ay,
                    bx: bx_rest,
                    by: by_rest,
                };
                d -= first;
            } else {
                // Mirrored strip: starts at the far corner of the half-height band.
                let x3 = add(add(f.x, sub(f.ax, dax)?)?, sub(bx2, dbx)?)?;
                let y3 = add(add(f.y, sub(f.ay, day)?)?, sub(by2, dby)?)?;
                f = Frame {
                    x: x3,
                    y: y3,
                    ax: neg(bx2)?,
                    ay: neg(by2)?,
                    bx: neg(sub(f.ax, ax2)?)?,
                    by: neg(sub(f.ay, ay2)?)?,
                };
                d -= first_two;
            }
        }

        depth += 1;
    }
}
