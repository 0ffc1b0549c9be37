// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer bookkeeping for one drag: grab offset, deltas and the constrained,
//! bounded target position.
//!
//! ```
//! use kurbo::{Point, Vec2};
//! use tableau_drag::DragGesture;
//! use tableau_scene::{DragBounds, DragConstraint, NodeConfig, Stage};
//!
//! let mut stage = Stage::new(10, 10);
//! let layer = stage.add_layer(&NodeConfig::default()).unwrap();
//!
//! // Grab a node sitting at (40, 40) by the pixel (45, 42).
//! let mut drag = DragGesture::new(layer, Point::new(45.0, 42.0), Point::new(40.0, 40.0));
//! assert_eq!(drag.grab_offset, Vec2::new(5.0, 2.0));
//!
//! assert_eq!(drag.update(Point::new(50.0, 42.0)), Vec2::new(5.0, 0.0));
//! assert_eq!(drag.total_offset(Point::new(50.0, 42.0)), Vec2::new(5.0, 0.0));
//!
//! let bounds = DragBounds::new(0.0, 100.0, 100.0, 0.0);
//! assert_eq!(
//!     drag.target(Point::new(155.0, 70.0), DragConstraint::Horizontal, Some(&bounds)),
//!     Point::new(100.0, 40.0),
//! );
//! ```

use kurbo::{Point, Vec2};
use tableau_scene::{DragBounds, DragConstraint, NodeId};

/// Tracks one drag from pointer-down to pointer-up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragGesture {
    /// The node being moved.
    pub node: NodeId,
    /// Pointer position minus the node's absolute position at the start.
    pub grab_offset: Vec2,
    /// Absolute position of the node when the drag began.
    pub start_position: Point,
    /// Pointer position when the drag began.
    pub start_pointer: Point,
    /// Latest pointer position.
    pub last_pointer: Point,
}

impl DragGesture {
    /// Start tracking a drag of `node`, grabbed at `pointer` while the node
    /// sits at `position` (both in stage pixels).
    pub fn new(node: NodeId, pointer: Point, position: Point) -> Self {
        Self {
            node,
            grab_offset: pointer - position,
            start_position: position,
            start_pointer: pointer,
            last_pointer: pointer,
        }
    }

    /// Record a new pointer position, returning the movement since the last one.
    pub fn update(&mut self, pointer: Point) -> Vec2 {
        let delta = pointer - self.last_pointer;
        self.last_pointer = pointer;
        delta
    }

    /// Pointer movement since the drag began.
    pub fn total_offset(&self, pointer: Point) -> Vec2 {
        pointer - self.start_pointer
    }

    /// Where the node goes for `pointer`: keep the grab offset, pin the
    /// constrained axis to the start position, then clamp into `bounds`.
    pub fn target(
        &self,
        pointer: Point,
        constraint: DragConstraint,
        bounds: Option<&DragBounds>,
    ) -> Point {
        let mut p = pointer - self.grab_offset;
        match constraint {
            DragConstraint::None => {}
            DragConstraint::Horizontal => p.y = self.start_position.y,
            DragConstraint::Vertical => p.x = self.start_position.x,
        }
        bounds.map_or(p, |b| b.clamp(p))
    }
}
