// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry helpers shared by surfaces.

use core::f64::consts::TAU;

use kurbo::{Arc, BezPath, PathEl, Point, Vec2};

/// Tolerance used when flattening arcs and stroke outlines.
pub(crate) const TOLERANCE: f64 = 0.1;

/// Build a circular arc path with canvas `arc()` semantics.
///
/// The returned path starts with a `MoveTo` at the arc start point. Sweeps of a
/// full turn or more (in the requested direction) produce a complete circle.
pub fn arc_path(
    center: Point,
    radius: f64,
    start_angle: f64,
    end_angle: f64,
    anticlockwise: bool,
) -> BezPath {
    let sweep = canvas_sweep(start_angle, end_angle, anticlockwise);
    let radius = radius.max(0.0);
    let arc = Arc {
        center,
        radii: Vec2::new(radius, radius),
        start_angle,
        sweep_angle: sweep,
        x_rotation: 0.0,
    };
    let start = center + Vec2::new(radius * start_angle.cos(), radius * start_angle.sin());

    let mut path = BezPath::new();
    path.move_to(start);
    for el in arc.append_iter(TOLERANCE) {
        path.push(el);
    }
    path
}

fn canvas_sweep(start: f64, end: f64, anticlockwise: bool) -> f64 {
    let raw = end - start;
    if anticlockwise {
        if raw <= -TAU {
            -TAU
        } else {
            let s = raw % TAU;
            if s > 0.0 { s - TAU } else { s }
        }
    } else if raw >= TAU {
        TAU
    } else {
        let s = raw % TAU;
        if s < 0.0 { s + TAU } else { s }
    }
}

/// Map every point of a path element through `xf`.
pub(crate) fn transform_el(xf: kurbo::Affine, el: PathEl) -> PathEl {
    match el {
        PathEl::MoveTo(p) => PathEl::MoveTo(xf * p),
        PathEl::LineTo(p) => PathEl::LineTo(xf * p),
        PathEl::QuadTo(p1, p) => PathEl::QuadTo(xf * p1, xf * p),
        PathEl::CurveTo(p1, p2, p) => PathEl::CurveTo(xf * p1, xf * p2, xf * p),
        PathEl::ClosePath => PathEl::ClosePath,
    }
}

/// Copy `path`, closing every open subpath so the fill covers its interior.
pub(crate) fn closed_for_fill(path: &BezPath) -> BezPath {
    let mut out = BezPath::new();
    let mut open = false;
    for el in path.elements() {
        match el {
            PathEl::MoveTo(_) => {
                if open {
                    out.push(PathEl::ClosePath);
                }
                open = false;
            }
            PathEl::ClosePath => open = false,
            _ => open = true,
        }
        out.push(*el);
    }
    if open {
        out.push(PathEl::ClosePath);
    }
    out
}
