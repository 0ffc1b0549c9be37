// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tableau Scene: a retained 2D scene graph over an immediate-mode [`Surface`].
//!
//! Build a tree of positioned, transformable nodes under a [`Stage`] and let the
//! stage repaint them, answer point queries and look them up by selector.
//!
//! - [`Stage`]: owns every node in an arena addressed by [`NodeId`], the id and
//!   name registries of attached nodes, the staging set of detached nodes, and
//!   the two surfaces of each layer.
//! - Node types: the stage root holds layers; layers and groups hold groups and
//!   shapes; shapes are leaves drawing a [`ShapeKind`] with a [`ShapeStyle`].
//! - [`NodeAttrs`]: position, scale, rotation, pivot offset, opacity and the
//!   visible / listening / draggable [`NodeFlags`], configured through
//!   [`NodeConfig`] and [`ShapeConfig`].
//!
//! ## Drawing
//!
//! [`Stage::draw_layer`] clears a layer's scene and hit surfaces and repaints
//! both in one traversal. Per visible shape the ancestor chain is replayed on the
//! surface (save, translate, pivot, rotate, scale, global alpha), the shape's
//! draw procedure runs, and the surface is restored to its prior depth. A failing
//! draw procedure is logged with `tracing` and its siblings still draw.
//!
//! ## Hit testing
//!
//! Listening shapes are painted on the hit surface in a flat color encoding their
//! id (see [`hit_color`]). [`Stage::intersection`] reads one pixel per layer, top
//! layer first, and decodes it. Queries never redraw.
//!
//! ## Selectors
//!
//! [`Stage::get`] accepts `#id`, `.name` and type selectors (`Layer`, `Group`,
//! `Shape`, `Rect`, `Circle`, ...), comma separated.
//!
//! ## Example
//!
//! ```
//! use kurbo::Point;
//! use peniko::Color;
//! use tableau_scene::{NodeConfig, ShapeKind, ShapeNode, ShapeStyle, Stage};
//!
//! let mut stage = Stage::new(200, 200);
//! let layer = stage.add_layer(&NodeConfig::default()).unwrap();
//! let group = stage.add_group(layer, &NodeConfig::at(10.0, 10.0)).unwrap();
//! let dot = stage
//!     .add_shape(
//!         group,
//!         ShapeNode::new(ShapeKind::circle(8.0), ShapeStyle::filled(Color::BLACK)),
//!         &NodeConfig::at(5.0, 5.0).with_id("dot"),
//!     )
//!     .unwrap();
//!
//! assert_eq!(stage.absolute_position(dot), Some(Point::new(15.0, 15.0)));
//! assert_eq!(stage.get(stage.root(), "#dot"), vec![dot]);
//!
//! stage.draw();
//! assert_eq!(stage.intersection(Point::new(15.0, 15.0)), Some(dot));
//! assert_eq!(stage.intersection(Point::new(150.0, 150.0)), None);
//! ```

mod attrs;
mod compositor;
mod error;
mod hit;
mod node;
mod registry;
mod selector;
mod serialize;
mod shape;
mod stage;
mod transform;
mod types;

pub use attrs::{NodeAttrs, NodeConfig, PartialXY};
pub use error::{DrawError, SceneError};
pub use hit::{MAX_HIT_ID, decode_hit_color, hit_color};
pub use node::{Node, NodeKind};
pub use selector::Selector;
pub use shape::{
    DEFAULT_STROKE_WIDTH, DrawPass, DrawShape, ShapeConfig, ShapeContext, ShapeKind, ShapeNode,
    ShapeStyle, css_color, parse_css_color,
};
pub use stage::{LayerCanvas, NodeChain, Stage};
pub use types::{DragBounds, DragConstraint, NodeFlags, NodeId, NodeType};

pub use tableau_surface::Surface;
