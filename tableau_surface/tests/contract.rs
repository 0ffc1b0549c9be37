// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The same drawing script against both surfaces.

use core::f64::consts::FRAC_PI_2;

use kurbo::{Affine, Point, Rect};
use peniko::{Brush, Color};
use tableau_surface::{RasterSurface, RecordingSurface, Surface, SurfaceOp};

fn red() -> Brush {
    Brush::Solid(Color::from_rgba8(255, 0, 0, 255))
}

/// Draws a 10x10 square at (10, 10) under nested transforms and returns the
/// transform and alpha in effect at the fill.
fn script<S: Surface>(s: &mut S) -> (Affine, f64) {
    s.save();
    s.translate(20.0, 0.0);
    s.save();
    s.rotate(FRAC_PI_2);
    s.set_global_alpha(0.5);
    s.set_fill_brush(&red());
    s.begin_path();
    s.rect(Rect::new(10.0, -10.0, 20.0, 0.0));
    let at_fill = (s.transform(), s.global_alpha());
    s.fill();
    s.restore();
    s.restore();
    at_fill
}

#[test]
fn both_surfaces_track_identical_state() {
    let mut rec = RecordingSurface::with_size(40, 40);
    let mut ras = RasterSurface::with_size(40, 40);
    let (rec_xf, rec_alpha) = script(&mut rec);
    let (ras_xf, ras_alpha) = script(&mut ras);
    assert_eq!(rec_xf, ras_xf);
    assert_eq!(rec_alpha, ras_alpha);
    assert_eq!(rec.save_depth(), 0);
    assert_eq!(ras.save_depth(), 0);
    assert_eq!(rec.transform(), Affine::IDENTITY);
    assert_eq!(ras.global_alpha(), 1.0);
}

#[test]
fn recording_keeps_state_per_call() {
    let mut rec = RecordingSurface::with_size(40, 40);
    script(&mut rec);
    assert_eq!(rec.count(|op| matches!(op, SurfaceOp::Save)), 2);
    assert_eq!(rec.count(|op| matches!(op, SurfaceOp::Restore)), 2);
    let fill = rec.paints().next().unwrap();
    assert_eq!(fill.state.global_alpha, 0.5);
    assert_eq!(fill.state.save_depth, 2);
    assert_eq!(rec.pixel(0, 0), None);
}

#[test]
fn raster_blends_under_global_alpha() {
    let mut ras = RasterSurface::with_size(40, 40);
    script(&mut ras);
    // Rotating (10..20, -10..0) a quarter turn lands on (0..10, 10..20),
    // then the translate shifts it to (20..30, 10..20).
    assert_eq!(ras.pixel(25, 15), Some([255, 0, 0, 128]));
    assert_eq!(ras.pixel(15, 15), Some([0, 0, 0, 0]));
}

#[test]
fn unbalanced_restore_is_ignored() {
    let mut ras = RasterSurface::with_size(4, 4);
    ras.translate(1.0, 1.0);
    ras.restore();
    assert_eq!(ras.save_depth(), 0);
    assert_eq!(ras.transform(), Affine::translate((1.0, 1.0)));
}

#[test]
fn clear_resets_pixels_but_not_state() {
    let mut ras = RasterSurface::with_size(8, 8);
    ras.set_fill_brush(&red());
    ras.begin_path();
    ras.rect(Rect::new(0.0, 0.0, 8.0, 8.0));
    ras.fill();
    assert_eq!(ras.pixel(4, 4), Some([255, 0, 0, 255]));
    ras.save();
    ras.clear();
    assert_eq!(ras.pixel(4, 4), Some([0, 0, 0, 0]));
    assert_eq!(ras.save_depth(), 1);
}

#[test]
fn zero_sized_surfaces_draw_nothing() {
    let mut ras = RasterSurface::with_size(0, 5);
    assert!(ras.is_empty());
    ras.set_fill_brush(&red());
    ras.begin_path();
    ras.move_to(Point::new(0.0, 0.0));
    ras.line_to(Point::new(5.0, 0.0));
    ras.line_to(Point::new(5.0, 5.0));
    ras.fill();
    assert_eq!(ras.pixel(0, 0), None);
}
