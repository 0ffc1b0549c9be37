// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! State-tracing surface for tests and debugging.

use kurbo::{Affine, Point, Vec2};
use peniko::Brush;

use crate::{StateSnapshot, StateStack, Surface};

/// One call made against a [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceOp {
    /// [`Surface::save`].
    Save,
    /// [`Surface::restore`].
    Restore,
    /// [`Surface::translate`].
    Translate(Vec2),
    /// [`Surface::rotate`].
    Rotate(f64),
    /// [`Surface::scale`].
    Scale(Vec2),
    /// [`Surface::set_global_alpha`].
    SetGlobalAlpha(f64),
    /// [`Surface::set_fill_brush`].
    SetFill(Brush),
    /// [`Surface::set_stroke_brush`].
    SetStroke(Brush),
    /// [`Surface::set_line_width`].
    SetLineWidth(f64),
    /// [`Surface::begin_path`].
    BeginPath,
    /// [`Surface::move_to`].
    MoveTo(Point),
    /// [`Surface::line_to`].
    LineTo(Point),
    /// [`Surface::quad_to`].
    QuadTo(Point, Point),
    /// [`Surface::curve_to`].
    CurveTo(Point, Point, Point),
    /// [`Surface::arc`].
    Arc {
        /// Arc center.
        center: Point,
        /// Arc radius.
        radius: f64,
        /// Start angle in radians.
        start_angle: f64,
        /// End angle in radians.
        end_angle: f64,
        /// Sweep direction.
        anticlockwise: bool,
    },
    /// [`Surface::close_path`].
    ClosePath,
    /// [`Surface::fill`].
    Fill,
    /// [`Surface::stroke`].
    Stroke,
    /// [`Surface::clear`].
    Clear,
}

/// A recorded call and the drawing state right after it was applied.
#[derive(Clone, Debug)]
pub struct Recorded {
    /// The call.
    pub op: SurfaceOp,
    /// Drawing state after applying `op`.
    pub state: StateSnapshot,
}

/// Surface that records calls instead of producing pixels.
///
/// This surface:
/// - tracks the drawing state exactly like a raster surface would,
/// - records a [`Recorded`] entry per call, in order,
/// - never keeps pixels, so [`Surface::pixel`] always returns `None`.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    state: StateStack,
    events: Vec<Recorded>,
}

impl RecordingSurface {
    /// Returns the recorded calls in order.
    pub fn events(&self) -> &[Recorded] {
        &self.events
    }

    /// Forget recorded calls; the drawing state is kept.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&SurfaceOp) -> bool) -> usize {
        self.events.iter().filter(|e| pred(&e.op)).count()
    }

    /// Recorded fills and strokes, with the state they were drawn under.
    pub fn paints(&self) -> impl Iterator<Item = &Recorded> {
        self.events
            .iter()
            .filter(|e| matches!(e.op, SurfaceOp::Fill | SurfaceOp::Stroke))
    }

    fn push(&mut self, op: SurfaceOp) {
        let state = self.state.snapshot();
        self.events.push(Recorded { op, state });
    }
}

impl Surface for RecordingSurface {
    fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
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
        self.push(SurfaceOp::Save);
    }

    fn restore(&mut self) {
        self.state.restore();
        self.push(SurfaceOp::Restore);
    }

    fn save_depth(&self) -> usize {
        self.state.depth()
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.state.concat(Affine::translate((dx, dy)));
        self.push(SurfaceOp::Translate(Vec2::new(dx, dy)));
    }

    fn rotate(&mut self, radians: f64) {
        self.state.concat(Affine::rotate(radians));
        self.push(SurfaceOp::Rotate(radians));
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.state.concat(Affine::scale_non_uniform(sx, sy));
        self.push(SurfaceOp::Scale(Vec2::new(sx, sy)));
    }

    fn transform(&self) -> Affine {
        self.state.current().transform
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.state.set_global_alpha(alpha);
        self.push(SurfaceOp::SetGlobalAlpha(alpha));
    }

    fn global_alpha(&self) -> f64 {
        self.state.current().global_alpha
    }

    fn set_fill_brush(&mut self, brush: &Brush) {
        self.state.current_mut().fill = brush.clone();
        self.push(SurfaceOp::SetFill(brush.clone()));
    }

    fn set_stroke_brush(&mut self, brush: &Brush) {
        self.state.current_mut().stroke = brush.clone();
        self.push(SurfaceOp::SetStroke(brush.clone()));
    }

    fn set_line_width(&mut self, width: f64) {
        self.state.current_mut().line_width = width;
        self.push(SurfaceOp::SetLineWidth(width));
    }

    fn begin_path(&mut self) {
        self.push(SurfaceOp::BeginPath);
    }

    fn move_to(&mut self, p: Point) {
        self.push(SurfaceOp::MoveTo(p));
    }

    fn line_to(&mut self, p: Point) {
        self.push(SurfaceOp::LineTo(p));
    }

    fn quad_to(&mut self, p1: Point, p: Point) {
        self.push(SurfaceOp::QuadTo(p1, p));
    }

    fn curve_to(&mut self, p1: Point, p2: Point, p: Point) {
        self.push(SurfaceOp::CurveTo(p1, p2, p));
    }

    fn arc(
        &mut self,
        center: Point,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    ) {
        self.push(SurfaceOp::Arc {
            center,
            radius,
            start_angle,
            end_angle,
            anticlockwise,
        });
    }

    fn close_path(&mut self) {
        self.push(SurfaceOp::ClosePath);
    }

    fn fill(&mut self) {
        self.push(SurfaceOp::Fill);
    }

    fn stroke(&mut self) {
        self.push(SurfaceOp::Stroke);
    }

    fn clear(&mut self) {
        self.push(SurfaceOp::Clear);
    }

    fn pixel(&self, _x: u32, _y: u32) -> Option<[u8; 4]> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peniko::Color;

    #[test]
    fn records_state_after_each_call() {
        let mut s = RecordingSurface::with_size(10, 10);
        s.save();
        s.translate(5.0, 6.0);
        s.set_global_alpha(0.25);
        s.set_fill_brush(&Brush::Solid(Color::WHITE));
        s.begin_path();
        s.move_to(Point::ORIGIN);
        s.fill();
        s.restore();

        assert_eq!(s.events().len(), 8);
        let fill = s.paints().next().expect("one fill recorded");
        assert_eq!(fill.state.transform, Affine::translate((5.0, 6.0)));
        assert_eq!(fill.state.global_alpha, 0.25);
        assert_eq!(fill.state.save_depth, 1);

        let last = s.events().last().expect("restore recorded");
        assert_eq!(last.op, SurfaceOp::Restore);
        assert_eq!(last.state.save_depth, 0);
        assert_eq!(last.state.transform, Affine::IDENTITY);
    }

    #[test]
    fn count_filters_ops() {
        let mut s = RecordingSurface::with_size(1, 1);
        s.save();
        s.save();
        s.restore();
        s.clear();
        assert_eq!(s.count(|op| matches!(op, SurfaceOp::Save)), 2);
        assert_eq!(s.count(|op| matches!(op, SurfaceOp::Restore)), 1);
        assert_eq!(s.count(|op| matches!(op, SurfaceOp::Clear)), 1);
    }

    #[test]
    fn clear_events_keeps_state() {
        let mut s = RecordingSurface::with_size(1, 1);
        s.scale(2.0, 3.0);
        s.clear_events();
        assert!(s.events().is_empty());
        assert_eq!(s.transform(), Affine::scale_non_uniform(2.0, 3.0));
    }

    #[test]
    fn never_reports_pixels() {
        let s = RecordingSurface::with_size(4, 4);
        assert_eq!(s.pixel(0, 0), None);
    }
}
