// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tableau Drag: pointer dragging for [`tableau_scene`] stages.
//!
//! A [`DragController`] turns pointer input into node repositioning:
//!
//! - Pointer-down on a shape starts dragging its nearest draggable
//!   ancestor-or-self, if that node listens for input. The grab offset between
//!   pointer and node is kept for the whole drag.
//! - Each move sets the node's absolute position, pins the axis named by its
//!   [`DragConstraint`](tableau_scene::DragConstraint) and clamps into its
//!   [`DragBounds`](tableau_scene::DragBounds).
//! - Redraws go through a [`tableau_animation::Scheduler`]: the drag keeps one
//!   animation registered that repaints the node's layer on ticks after it
//!   moved, at most once per [`DragConfig::min_redraw_interval`] (20 ms by
//!   default). Ending the drag repaints once more.
//! - One drag at a time; a second start is rejected or preempts the first per
//!   [`ConcurrentDragPolicy`].
//!
//! `dragstart`, `dragmove` and `dragend` are dispatched through a
//! [`tableau_responder::Router`].
//!
//! ## Example
//!
//! ```
//! use kurbo::Point;
//! use peniko::Color;
//! use tableau_animation::Scheduler;
//! use tableau_drag::DragController;
//! use tableau_responder::Router;
//! use tableau_scene::{DragBounds, NodeConfig, ShapeKind, ShapeNode, ShapeStyle, Stage};
//!
//! let mut stage = Stage::new(200, 200);
//! let layer = stage.add_layer(&NodeConfig::default()).unwrap();
//! let mut config = NodeConfig::at(50.0, 50.0);
//! config.draggable = Some(true);
//! config.drag_bounds = Some(DragBounds::new(0.0, 100.0, 100.0, 0.0));
//! let knob = stage
//!     .add_shape(
//!         layer,
//!         ShapeNode::new(ShapeKind::rect(10.0, 10.0), ShapeStyle::filled(Color::BLACK)),
//!         &config,
//!     )
//!     .unwrap();
//! stage.draw();
//!
//! let mut router = Router::new();
//! let mut scheduler = Scheduler::new();
//! let mut drag = DragController::new();
//! assert_eq!(
//!     drag.pointer_down(&mut stage, &mut router, &mut scheduler, Point::new(50.0, 50.0), 0.0),
//!     Ok(Some(knob))
//! );
//! drag.pointer_move(&mut stage, &mut router, &mut scheduler, Point::new(150.0, 60.0), 30.0);
//! assert_eq!(stage.absolute_position(knob), Some(Point::new(100.0, 60.0)));
//!
//! // The host's frame timer drives the redraw.
//! assert_eq!(scheduler.tick(&mut stage, 32.0).as_slice(), [layer]);
//! assert_eq!(stage.intersection(Point::new(105.0, 65.0)), Some(knob));
//!
//! let up = Point::new(150.0, 60.0);
//! assert_eq!(drag.pointer_up(&mut stage, &mut router, &mut scheduler, up, 40.0), Some(knob));
//! assert!(!drag.is_dragging());
//! assert_eq!(scheduler.active_count(), 0);
//! ```

mod controller;
mod error;
mod gesture;

pub use controller::{ConcurrentDragPolicy, DragConfig, DragController};
pub use error::DragError;
pub use gesture::DragGesture;
