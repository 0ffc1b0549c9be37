// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tableau Surface: the immediate-mode drawing contract underneath the scene graph.
//!
//! ## Overview
//!
//! Everything above this crate (the transform compositor, the hit-test index,
//! layer redraws) talks to pixels exclusively through the [`Surface`] trait.
//! The trait mirrors a classic 2D canvas context:
//!
//! - state: [`Surface::save`] / [`Surface::restore`] with stack discipline,
//! - transforms: [`Surface::translate`], [`Surface::rotate`], [`Surface::scale`],
//! - paths: [`Surface::begin_path`], [`Surface::move_to`], [`Surface::line_to`],
//!   [`Surface::quad_to`], [`Surface::curve_to`], [`Surface::arc`], [`Surface::close_path`],
//! - painting: [`Surface::fill`] / [`Surface::stroke`] with the current brushes,
//!   line width and global alpha,
//! - read-back: [`Surface::pixel`], which must be bit-exact for solid colors at
//!   full alpha so hit-test colors decode to the ids that painted them.
//!
//! ## Implementations
//!
//! - [`RecordingSurface`]: records every call together with a [`StateSnapshot`].
//!   It does not rasterize; it exists for tests and debugging that want to assert
//!   on emitted calls and the drawing state at the time each call was applied.
//! - [`RasterSurface`]: a small CPU pixel buffer. Fills use the non-zero rule with
//!   pixel-center sampling and no antialiasing, strokes are converted to outlines
//!   with [`kurbo::stroke`]. It is intended for hit-test buffers and headless use.
//!
//! ## Minimal example
//!
//! ```
//! use kurbo::{Point, Rect};
//! use peniko::{Brush, Color};
//! use tableau_surface::{RasterSurface, Surface};
//!
//! let mut surface = RasterSurface::with_size(32, 32);
//! surface.save();
//! surface.translate(4.0, 4.0);
//! surface.set_fill_brush(&Brush::Solid(Color::from_rgba8(0, 0, 255, 255)));
//! surface.begin_path();
//! surface.rect(Rect::new(0.0, 0.0, 8.0, 8.0));
//! surface.fill();
//! surface.restore();
//!
//! assert_eq!(surface.pixel(6, 6), Some([0, 0, 255, 255]));
//! assert_eq!(surface.pixel(20, 20), Some([0, 0, 0, 0]));
//! ```

mod geom;
mod raster;
mod recording;
mod state;

pub use geom::arc_path;
pub use raster::RasterSurface;
pub use recording::{Recorded, RecordingSurface, SurfaceOp};
pub use state::{DrawState, StateSnapshot, StateStack};

use kurbo::{Affine, Point, Rect};
use peniko::Brush;

/// An immediate-mode 2D drawing surface.
///
/// All coordinates passed to path methods are in user space, i.e. they are
/// mapped through the current transform at the time of the call.
///
/// The trait is object safe (apart from [`Surface::with_size`]), so shape draw
/// procedures receive a `&mut dyn Surface` and never see the concrete type.
pub trait Surface {
    /// Create a cleared surface of the given pixel dimensions.
    ///
    /// A zero width or height is allowed; every draw on such a surface is a no-op.
    fn with_size(width: u32, height: u32) -> Self
    where
        Self: Sized;

    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// Push a copy of the current drawing state.
    fn save(&mut self);

    /// Pop the most recently saved drawing state.
    ///
    /// Restoring with nothing saved leaves the state untouched.
    fn restore(&mut self);

    /// Number of currently saved states.
    fn save_depth(&self) -> usize;

    /// Pre-multiply the current transform by a translation.
    fn translate(&mut self, dx: f64, dy: f64);

    /// Pre-multiply the current transform by a rotation (radians, clockwise in y-down space).
    fn rotate(&mut self, radians: f64);

    /// Pre-multiply the current transform by a non-uniform scale.
    fn scale(&mut self, sx: f64, sy: f64);

    /// The current user-to-device transform.
    fn transform(&self) -> Affine;

    /// Set the global alpha applied to subsequent fills and strokes.
    fn set_global_alpha(&mut self, alpha: f64);

    /// The current global alpha.
    fn global_alpha(&self) -> f64;

    /// Set the brush used by [`Surface::fill`].
    fn set_fill_brush(&mut self, brush: &Brush);

    /// Set the brush used by [`Surface::stroke`].
    fn set_stroke_brush(&mut self, brush: &Brush);

    /// Set the stroke width in user units.
    fn set_line_width(&mut self, width: f64);

    /// Discard the current path.
    fn begin_path(&mut self);

    /// Start a new subpath.
    fn move_to(&mut self, p: Point);

    /// Add a straight segment.
    fn line_to(&mut self, p: Point);

    /// Add a quadratic Bézier segment.
    fn quad_to(&mut self, p1: Point, p: Point);

    /// Add a cubic Bézier segment.
    fn curve_to(&mut self, p1: Point, p2: Point, p: Point);

    /// Add a circular arc with canvas semantics.
    ///
    /// If the current subpath is open, a straight segment connects it to the arc start.
    fn arc(
        &mut self,
        center: Point,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    );

    /// Close the current subpath.
    fn close_path(&mut self);

    /// Fill the current path with the fill brush (non-zero rule).
    fn fill(&mut self);

    /// Stroke the current path with the stroke brush and line width.
    fn stroke(&mut self);

    /// Reset every pixel to transparent black. Drawing state is kept.
    fn clear(&mut self);

    /// Read back one pixel as straight (non-premultiplied) RGBA8.
    ///
    /// Returns `None` for out-of-range coordinates and for surfaces that do not
    /// keep pixels.
    fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]>;

    /// Add a closed axis-aligned rectangle subpath.
    fn rect(&mut self, rect: Rect) {
        self.move_to(Point::new(rect.x0, rect.y0));
        self.line_to(Point::new(rect.x1, rect.y0));
        self.line_to(Point::new(rect.x1, rect.y1));
        self.line_to(Point::new(rect.x0, rect.y1));
        self.close_path();
    }

    /// Returns `true` when the surface has no pixels to draw into.
    fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}
