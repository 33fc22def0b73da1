//! Page geometry planning: curve kind, size, per-page capacity and page count.

use tracing::debug;

use super::{Layout, RenderRequest};
use crate::error::RenderError;
use crate::hilbert::{
    capacity_for_order, pick_smallest_order, side_for_order, unavoidable_diagonal, Curve,
    RectCurve, SquareCurve, MAX_ORDER,
};

/// Square order used for every page when auto order meets `--paginate` and
/// the slice does not fit one page of this order.
pub const DEFAULT_PAGE_ORDER: u32 = 12;

/// Resolved per-page geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// `Some` in square mode only.
    pub order: Option<u32>,
    pub width: u32,
    pub height: u32,
    pub capacity: u64,
}

impl Geometry {
    /// Side length in square mode.
    #[inline]
    pub fn side(&self) -> Option<u32> {
        self.order.map(|_| self.width)
    }

    /// Build the curve that maps page-local indices onto this geometry.
    pub fn curve(&self) -> Result<Curve, RenderError> {
        match self.order {
            Some(order) => SquareCurve::new(order)
                .map(Curve::Square)
                .map_err(RenderError::from_planning),
            None => RectCurve::new(self.width, self.height)
                .map(Curve::Rect)
                .map_err(RenderError::from_planning),
        }
    }

    /// Bytes needed for one RGB page buffer.
    pub fn pixel_bytes(&self) -> Result<u64, RenderError> {
        self.capacity.checked_mul(3).ok_or_else(|| {
            RenderError::Overflow(format!(
                "image size for {}x{} pixels",
                self.width, self.height
            ))
        })
    }
}

/// Geometry plus the number of pages the slice needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub geometry: Geometry,
    pub page_count: u64,
}

/// `ceil(total / capacity)`, never less than one page.
#[inline]
pub fn page_count(total: u64, capacity: u64) -> u64 {
    if capacity == 0 {
        return 1;
    }
    total.div_ceil(capacity).max(1)
}

fn square_geometry(order: u32) -> Result<Geometry, RenderError> {
    let side = side_for_order(order).map_err(RenderError::from_planning)?;
    let capacity = capacity_for_order(order).map_err(RenderError::from_planning)?;
    Ok(Geometry {
        order: Some(order),
        width: side,
        height: side,
        capacity,
    })
}

/// Validate option combinations and resolve the geometry for `total` bytes.
///
/// Does not apply the strict-adjacency or capacity checks; [`plan`] adds those.
pub fn resolve_geometry(request: &RenderRequest, total: u64) -> Result<Geometry, RenderError> {
    match request.layout {
        Layout::Hilbert => {
            if request.dimensions.is_some() {
                return Err(RenderError::Validation(
                    "dimensions are only supported with --layout rect-hilbert".into(),
                ));
            }
            if request.strict_adjacency {
                return Err(RenderError::Validation(
                    "strict adjacency is only supported with --layout rect-hilbert".into(),
                ));
            }

            if let Some(order) = request.order {
                return square_geometry(order);
            }

            if request.paginate {
                let page = square_geometry(DEFAULT_PAGE_ORDER)?;
                if total > page.capacity {
                    return Ok(page);
                }
            }

            let fit = pick_smallest_order(total).map_err(|_| {
                RenderError::Validation(format!(
                    "input slice ({total} bytes) exceeds max order {MAX_ORDER} capacity; use --paginate"
                ))
            })?;
            Ok(Geometry {
                order: Some(fit.order),
                width: fit.side,
                height: fit.side,
                capacity: fit.capacity,
            })
        }
        Layout::RectHilbert => {
            if request.order.is_some() {
                return Err(RenderError::Validation(
                    "--order is only supported with --layout hilbert".into(),
                ));
            }
            let dims = request.dimensions.ok_or_else(|| {
                RenderError::Validation("rect-hilbert layout requires explicit dimensions".into())
            })?;
            if dims.width == 0 || dims.height == 0 {
                return Err(RenderError::Validation(
                    "dimensions must be positive for rect-hilbert layout".into(),
                ));
            }
            let capacity = u64::from(dims.width)
                .checked_mul(u64::from(dims.height))
                .ok_or_else(|| {
                    RenderError::Overflow(format!("dimension capacity for {dims}"))
                })?;
            Ok(Geometry {
                order: None,
                width: dims.width,
                height: dims.height,
                capacity,
            })
        }
    }
}

/// Choose geometry and page count for a slice of `total` bytes.
pub fn plan(request: &RenderRequest, total: u64) -> Result<Plan, RenderError> {
    let geometry = resolve_geometry(request, total)?;

    if geometry.order.is_none()
        && request.strict_adjacency
        && unavoidable_diagonal(geometry.width, geometry.height)
    {
        return Err(RenderError::Validation(format!(
            "strict adjacency rejects dimensions {}x{} (odd larger side with even smaller side requires a diagonal step)",
            geometry.width, geometry.height
        )));
    }

    if total > geometry.capacity && !request.paginate {
        return Err(RenderError::Validation(format!(
            "input slice ({total} bytes) exceeds selected capacity ({} bytes); use --paginate",
            geometry.capacity
        )));
    }

    let plan = Plan {
        geometry,
        page_count: page_count(total, geometry.capacity),
    };
    debug!(
        layout = request.layout.name(),
        order = ?geometry.order,
        width = geometry.width,
        height = geometry.height,
        capacity = geometry.capacity,
        pages = plan.page_count,
        "planned geometry"
    );
    Ok(plan)
}

/// One alternative size offered by the dry run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RectSuggestion {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
}

#[inline]
fn round_up_even(n: u64) -> u64 {
    n + (n & 1)
}

/// Parity-safe and better-fitting alternatives to `width x height`.
pub fn rect_suggestions(total: u64, width: u32, height: u32) -> Vec<RectSuggestion> {
    let mut out = Vec::with_capacity(3);
    let fits = |n: u64| n > 0 && n <= u64::from(u32::MAX);

    let even_w = round_up_even(u64::from(width));
    let even_h = round_up_even(u64::from(height));
    if (even_w != u64::from(width) || even_h != u64::from(height)) && fits(even_w) && fits(even_h)
    {
        out.push(RectSuggestion {
            label: "nearest-even",
            width: even_w as u32,
            height: even_h as u32,
        });
    }

    if height > 0 {
        let needed_w = round_up_even(total.div_ceil(u64::from(height)));
        if fits(needed_w) {
            out.push(RectSuggestion {
                label: "fit-by-width",
                width: needed_w as u32,
                height,
            });
        }
    }

    if width > 0 {
        let needed_h = round_up_even(total.div_ceil(u64::from(width)));
        if fits(needed_h) {
            out.push(RectSuggestion {
                label: "fit-by-height",
                width,
                height: needed_h as u32,
            });
        }
    }

    out
}

/// What a render would do, without doing it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanReport {
    pub layout: Layout,
    pub slice_bytes: u64,
    pub geometry: Geometry,
    pub page_count: u64,
    /// Share of the first page filled, in percent.
    pub utilization: f64,
    pub parity_warning: bool,
    pub strict_rejected: bool,
    pub suggestions: Vec<RectSuggestion>,
}

/// Build the dry-run report for a slice of `total` bytes.
///
/// Unlike [`plan`], an oversized slice without `--paginate` and a strict
/// adjacency violation are reported, not raised.
pub fn plan_report(request: &RenderRequest, total: u64) -> Result<PlanReport, RenderError> {
    let geometry = resolve_geometry(request, total)?;
    let rect = geometry.order.is_none();
    let parity_warning = rect && unavoidable_diagonal(geometry.width, geometry.height);

    let utilization = if total == 0 {
        0.0
    } else {
        total.min(geometry.capacity) as f64 * 100.0 / geometry.capacity as f64
    };

    Ok(PlanReport {
        layout: request.layout,
        slice_bytes: total,
        geometry,
        page_count: page_count(total, geometry.capacity),
        utilization,
        parity_warning,
        strict_rejected: parity_warning && request.strict_adjacency,
        suggestions: if rect {
            rect_suggestions(total, geometry.width, geometry.height)
        } else {
            Vec::new()
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Dimensions;

    fn square(order: Option<u32>, paginate: bool) -> RenderRequest {
        RenderRequest {
            order,
            paginate,
            ..RenderRequest::new("in.bin", "out.ppm")
        }
    }

    fn rect(width: u32, height: u32, strict: bool) -> RenderRequest {
        RenderRequest {
            layout: Layout::RectHilbert,
            dimensions: Some(Dimensions { width, height }),
            strict_adjacency: strict,
            paginate: true,
            ..RenderRequest::new("in.bin", "out.ppm")
        }
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 4), 1);
        assert_eq!(page_count(4, 4), 1);
        assert_eq!(page_count(5, 4), 2);
        assert_eq!(page_count(10, 4), 3);
        assert_eq!(page_count(u64::MAX, 1), u64::MAX);
    }

    #[test]
    fn test_auto_order_picks_smallest() {
        let p = plan(&square(None, false), 4).unwrap();
        assert_eq!(p.geometry.order, Some(1));
        assert_eq!(p.page_count, 1);

        let p = plan(&square(None, false), 0).unwrap();
        assert_eq!((p.geometry.width, p.page_count), (2, 1));

        assert_eq!(plan(&square(None, false), 5).unwrap().geometry.order, Some(2));
    }

    #[test]
    fn test_auto_order_with_pagination_uses_default_page_order() {
        let big = (1u64 << 24) + 1;
        let p = plan(&square(None, true), big).unwrap();
        assert_eq!(p.geometry.order, Some(DEFAULT_PAGE_ORDER));
        assert_eq!(p.geometry.capacity, 1 << 24);
        assert_eq!(p.page_count, 2);

        // Fits one default page: smallest order still wins.
        assert_eq!(plan(&square(None, true), 100).unwrap().geometry.order, Some(4));
    }

    #[test]
    fn test_auto_order_over_max_needs_paginate() {
        let err = plan(&square(None, false), (1u64 << 32) + 1).unwrap_err();
        assert!(err.to_string().contains("use --paginate"));
    }

    #[test]
    fn test_explicit_order() {
        let p = plan(&square(Some(1), true), 10).unwrap();
        assert_eq!(p.geometry.capacity, 4);
        assert_eq!(p.page_count, 3);

        let err = plan(&square(Some(1), false), 10).unwrap_err();
        assert!(err.to_string().contains("exceeds selected capacity (4 bytes)"));

        let err = plan(&square(Some(17), false), 1).unwrap_err();
        assert!(matches!(err, RenderError::Validation(msg) if msg.contains("invalid order 17")));
    }

    #[test]
    fn test_square_rejects_rect_options() {
        let mut req = square(None, false);
        req.dimensions = Some(Dimensions { width: 2, height: 2 });
        assert!(plan(&req, 1).is_err());

        let mut req = square(None, false);
        req.strict_adjacency = true;
        let err = plan(&req, 1).unwrap_err();
        assert!(err.to_string().contains("only supported with --layout rect-hilbert"));
    }

    #[test]
    fn test_rect_plan() {
        let p = plan(&rect(5, 3, false), 31).unwrap();
        assert_eq!(p.geometry.order, None);
        assert_eq!(p.geometry.side(), None);
        assert_eq!(p.geometry.capacity, 15);
        assert_eq!(p.page_count, 3);
    }

    #[test]
    fn test_rect_validation() {
        let mut req = rect(5, 3, false);
        req.dimensions = None;
        assert!(plan(&req, 1).unwrap_err().to_string().contains("requires explicit dimensions"));

        assert!(plan(&rect(0, 3, false), 1).is_err());

        let mut req = rect(5, 3, false);
        req.order = Some(2);
        assert!(plan(&req, 1).is_err());
    }

    #[test]
    fn test_rect_capacity_is_u64() {
        let p = plan(&rect(u32::MAX, u32::MAX, false), 1).unwrap();
        assert_eq!(p.geometry.capacity, u64::from(u32::MAX) * u64::from(u32::MAX));
        assert!(matches!(
            p.geometry.pixel_bytes(),
            Err(RenderError::Overflow(_))
        ));
    }

    #[test]
    fn test_strict_adjacency() {
        let err = plan(&rect(5, 4, true), 1).unwrap_err();
        assert!(err.to_string().contains("strict adjacency rejects dimensions 5x4"));
        plan(&rect(5, 5, true), 1).unwrap();
        plan(&rect(6, 4, true), 1).unwrap();
        plan(&rect(5, 4, false), 1).unwrap();
    }

    #[test]
    fn test_rect_suggestions() {
        let s = rect_suggestions(100, 7, 5);
        assert_eq!(
            s,
            vec![
                RectSuggestion { label: "nearest-even", width: 8, height: 6 },
                RectSuggestion { label: "fit-by-width", width: 20, height: 5 },
                RectSuggestion { label: "fit-by-height", width: 7, height: 16 },
            ]
        );

        // Already even and an empty slice: nothing to offer.
        assert!(rect_suggestions(0, 4, 4).is_empty());
    }

    #[test]
    fn test_plan_report() {
        let report = plan_report(&rect(5, 4, true), 10).unwrap();
        assert!(report.parity_warning);
        assert!(report.strict_rejected);
        assert_eq!(report.utilization, 50.0);
        assert_eq!(report.suggestions.len(), 3);

        let report = plan_report(&square(Some(1), false), 10).unwrap();
        assert_eq!(report.page_count, 3);
        assert_eq!(report.utilization, 100.0);
        assert!(report.suggestions.is_empty());
    }
}
