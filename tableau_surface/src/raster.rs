// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CPU raster surface with pixel read-back.
//!
//! Geometry is kept in device space as it is built, so a path may mix segments
//! added under different transforms exactly like a canvas context does.
//! Coverage is decided per pixel by sampling the pixel center against the
//! non-zero winding rule. There is no antialiasing: a solid color drawn at full
//! alpha lands in the buffer bit-exact, which the hit-test index relies on.

use core::ops::Range;

use kurbo::{Affine, BezPath, PathEl, Point, Rect, Shape, Stroke, StrokeOpts};
use peniko::Brush;

use crate::geom::{TOLERANCE, arc_path, closed_for_fill, transform_el};
use crate::{StateStack, Surface};

/// A straight-alpha RGBA8 pixel buffer implementing [`Surface`].
#[derive(Clone, Debug, Default)]
pub struct RasterSurface {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
    state: StateStack,
    path: BezPath,
    subpath_open: bool,
}

impl RasterSurface {
    /// Raw pixel rows, top to bottom.
    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }

    /// The current path in device coordinates.
    pub fn device_path(&self) -> &BezPath {
        &self.path
    }

    fn push_el(&mut self, el: PathEl) {
        let el = transform_el(self.state.current().transform, el);
        match el {
            PathEl::MoveTo(_) => self.subpath_open = true,
            PathEl::ClosePath => self.subpath_open = false,
            _ => {
                if !self.subpath_open {
                    // Canvas semantics: a segment with no current point starts a subpath.
                    if let PathEl::LineTo(p) = el {
                        self.path.move_to(p);
                        self.subpath_open = true;
                        return;
                    }
                    self.subpath_open = true;
                }
            }
        }
        self.path.push(el);
    }

    fn paint_region(&mut self, region: &BezPath, brush: &Brush) {
        if self.is_empty() {
            return;
        }
        let Brush::Solid(color) = brush else {
            tracing::debug!("raster surface paints solid brushes only; skipping");
            return;
        };
        let rgba = color.to_rgba8();
        let alpha = f64::from(rgba.a) / 255.0 * self.state.current().global_alpha;
        if alpha <= 0.0 {
            return;
        }
        let src = [rgba.r, rgba.g, rgba.b];

        let bounds = region.bounding_box();
        let width = self.width;
        for y in span(bounds.y0, bounds.y1, self.height) {
            for x in span(bounds.x0, bounds.x1, width) {
                let center = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                if region.contains(center) {
                    let idx = y as usize * width as usize + x as usize;
                    self.pixels[idx] = blend(src, alpha, self.pixels[idx]);
                }
            }
        }
    }
}

/// Pixel indices whose centers may fall inside `[lo, hi]`.
fn span(lo: f64, hi: f64, limit: u32) -> Range<u32> {
    if !(lo.is_finite() && hi.is_finite()) || hi < 0.0 {
        return 0..0;
    }
    let start = lo.floor().max(0.0);
    let end = hi.ceil().min(f64::from(limit));
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "both values are clamped into [0, limit] before the cast"
    )]
    let range = (start as u32)..(end.max(start) as u32);
    range
}

/// Source-over compositing of a straight-alpha color onto a straight-alpha pixel.
fn blend(src: [u8; 3], alpha: f64, dst: [u8; 4]) -> [u8; 4] {
    if alpha >= 1.0 {
        return [src[0], src[1], src[2], 255];
    }
    let dst_a = f64::from(dst[3]) / 255.0;
    let out_a = alpha + dst_a * (1.0 - alpha);
    if out_a <= 0.0 {
        return [0, 0, 0, 0];
    }
    let channel = |s: u8, d: u8| {
        let v = (f64::from(s) * alpha + f64::from(d) * dst_a * (1.0 - alpha)) / out_a;
        to_u8(v)
    };
    [
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        to_u8(out_a * 255.0),
    ]
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is rounded and clamped into the u8 range first"
)]
fn to_u8(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

impl Surface for RasterSurface {
    fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0; 4]; width as usize * height as usize],
            ..Self::default()
        }
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn save(&mut self) {
        self.state.save();
    }

    fn restore(&mut self) {
        self.state.restore();
    }

    fn save_depth(&self) -> usize {
        self.state.depth()
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.state.concat(Affine::translate((dx, dy)));
    }

    fn rotate(&mut self, radians: f64) {
        self.state.concat(Affine::rotate(radians));
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.state.concat(Affine::scale_non_uniform(sx, sy));
    }

    fn transform(&self) -> Affine {
        self.state.current().transform
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.state.set_global_alpha(alpha);
    }

    fn global_alpha(&self) -> f64 {
        self.state.current().global_alpha
    }

    fn set_fill_brush(&mut self, brush: &Brush) {
        self.state.current_mut().fill = brush.clone();
    }

    fn set_stroke_brush(&mut self, brush: &Brush) {
        self.state.current_mut().stroke = brush.clone();
    }

    fn set_line_width(&mut self, width: f64) {
        if width.is_finite() && width > 0.0 {
            self.state.current_mut().line_width = width;
        }
    }

    fn begin_path(&mut self) {
        self.path = BezPath::new();
        self.subpath_open = false;
    }

    fn move_to(&mut self, p: Point) {
        self.push_el(PathEl::MoveTo(p));
    }

    fn line_to(&mut self, p: Point) {
        self.push_el(PathEl::LineTo(p));
    }

    fn quad_to(&mut self, p1: Point, p: Point) {
        self.push_el(PathEl::QuadTo(p1, p));
    }

    fn curve_to(&mut self, p1: Point, p2: Point, p: Point) {
        self.push_el(PathEl::CurveTo(p1, p2, p));
    }

    fn arc(
        &mut self,
        center: Point,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    ) {
        let arc = arc_path(center, radius, start_angle, end_angle, anticlockwise);
        for (i, el) in arc.elements().iter().enumerate() {
            match *el {
                PathEl::MoveTo(p) if i == 0 && self.subpath_open => self.line_to(p),
                el => self.push_el(el),
            }
        }
    }

    fn close_path(&mut self) {
        if self.subpath_open {
            self.push_el(PathEl::ClosePath);
        }
    }

    fn fill(&mut self) {
        let region = closed_for_fill(&self.path);
        let brush = self.state.current().fill.clone();
        self.paint_region(&region, &brush);
    }

    fn stroke(&mut self) {
        let current = self.state.current();
        let scale = current.transform.determinant().abs().sqrt();
        let width = current.line_width * scale;
        if !(width.is_finite() && width > 0.0) {
            return;
        }
        let brush = current.stroke.clone();
        let outline = kurbo::stroke(
            self.path.iter(),
            &Stroke::new(width),
            &StrokeOpts::default(),
            TOLERANCE,
        );
        self.paint_region(&outline, &brush);
    }

    fn clear(&mut self) {
        self.pixels.fill([0; 4]);
    }

    fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}

impl RasterSurface {
    /// Device-space bounds covered by the current path, if any.
    pub fn path_bounds(&self) -> Option<Rect> {
        if self.path.elements().is_empty() {
            None
        } else {
            Some(self.path.bounding_box())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::TAU;
    use peniko::Color;

    fn solid(r: u8, g: u8, b: u8) -> Brush {
        Brush::Solid(Color::from_rgba8(r, g, b, 255))
    }

    #[test]
    fn fill_rect_is_bit_exact() {
        let mut s = RasterSurface::with_size(20, 20);
        s.set_fill_brush(&solid(1, 2, 3));
        s.begin_path();
        s.rect(Rect::new(2.0, 2.0, 10.0, 10.0));
        s.fill();

        assert_eq!(s.pixel(2, 2), Some([1, 2, 3, 255]));
        assert_eq!(s.pixel(9, 9), Some([1, 2, 3, 255]));
        assert_eq!(s.pixel(10, 10), Some([0, 0, 0, 0]));
        assert_eq!(s.pixel(1, 5), Some([0, 0, 0, 0]));
    }

    #[test]
    fn transform_applies_to_path_points() {
        let mut s = RasterSurface::with_size(40, 40);
        s.translate(20.0, 20.0);
        s.scale(2.0, 2.0);
        s.set_fill_brush(&solid(9, 9, 9));
        s.begin_path();
        s.rect(Rect::new(0.0, 0.0, 5.0, 5.0));
        s.fill();

        assert_eq!(s.pixel(21, 21), Some([9, 9, 9, 255]));
        assert_eq!(s.pixel(29, 29), Some([9, 9, 9, 255]));
        assert_eq!(s.pixel(31, 31), Some([0, 0, 0, 0]));
        assert_eq!(s.pixel(19, 19), Some([0, 0, 0, 0]));
    }

    #[test]
    fn stroke_covers_outline_not_interior() {
        let mut s = RasterSurface::with_size(40, 40);
        s.set_stroke_brush(&solid(200, 0, 0));
        s.set_line_width(4.0);
        s.begin_path();
        s.rect(Rect::new(10.0, 10.0, 30.0, 30.0));
        s.stroke();

        assert_eq!(s.pixel(10, 20), Some([200, 0, 0, 255]));
        assert_eq!(s.pixel(20, 20), Some([0, 0, 0, 0]));
    }

    #[test]
    fn arc_fills_a_disc() {
        let mut s = RasterSurface::with_size(30, 30);
        s.set_fill_brush(&solid(0, 255, 0));
        s.begin_path();
        s.arc(Point::new(15.0, 15.0), 10.0, 0.0, TAU, false);
        s.close_path();
        s.fill();

        assert_eq!(s.pixel(15, 15), Some([0, 255, 0, 255]));
        assert_eq!(s.pixel(15, 6), Some([0, 255, 0, 255]));
        assert_eq!(s.pixel(1, 1), Some([0, 0, 0, 0]));
    }

    #[test]
    fn global_alpha_blends() {
        let mut s = RasterSurface::with_size(4, 4);
        s.set_global_alpha(0.5);
        s.set_fill_brush(&solid(255, 255, 255));
        s.begin_path();
        s.rect(Rect::new(0.0, 0.0, 4.0, 4.0));
        s.fill();

        assert_eq!(s.pixel(1, 1), Some([255, 255, 255, 128]));
    }

    #[test]
    fn zero_sized_surface_ignores_draws() {
        let mut s = RasterSurface::with_size(0, 0);
        s.begin_path();
        s.rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        s.fill();
        s.stroke();
        assert!(s.pixels().is_empty());
        assert_eq!(s.pixel(0, 0), None);
    }

    #[test]
    fn clear_resets_pixels() {
        let mut s = RasterSurface::with_size(4, 4);
        s.set_fill_brush(&solid(5, 5, 5));
        s.begin_path();
        s.rect(Rect::new(0.0, 0.0, 4.0, 4.0));
        s.fill();
        s.clear();
        assert!(s.pixels().iter().all(|p| *p == [0, 0, 0, 0]));
    }

    #[test]
    fn non_solid_brushes_are_skipped() {
        let mut s = RasterSurface::with_size(4, 4);
        let gradient = peniko::Gradient::new_linear((0.0, 0.0), (4.0, 0.0));
        s.set_fill_brush(&Brush::Gradient(gradient));
        s.begin_path();
        s.rect(Rect::new(0.0, 0.0, 4.0, 4.0));
        s.fill();
        assert_eq!(s.pixel(1, 1), Some([0, 0, 0, 0]));
    }
}
