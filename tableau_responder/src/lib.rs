// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tableau Responder: event routing for [`tableau_scene`] stages.
//!
//! A [`Router`] keeps handler tables keyed by [`NodeId`](tableau_scene::NodeId)
//! and turns input into dispatch sequences:
//!
//! - Positional input (`pointer_*`, `touch_*`) is resolved to a shape with the
//!   stage's hit-test index. Input over background is dropped.
//! - Key input goes to the focused node.
//! - Handlers run on the target, then on each ancestor up to the stage, for
//!   the bubbling families (pointer, touch, click/tap, drag). Other types,
//!   including custom ones, reach the target only.
//! - Any handler can call [`Event::stop_propagation`]; the remaining handlers on
//!   that node still run, ancestors do not.
//!
//! Handlers receive the stage mutably and may edit the scene; dispatch itself
//! never does.
//!
//! ## Example
//!
//! ```
//! use kurbo::Point;
//! use peniko::Color;
//! use std::{cell::RefCell, rc::Rc};
//! use tableau_responder::Router;
//! use tableau_scene::{NodeConfig, ShapeKind, ShapeNode, ShapeStyle, Stage};
//!
//! let mut stage = Stage::new(100, 100);
//! let layer = stage.add_layer(&NodeConfig::default()).unwrap();
//! let button = stage
//!     .add_shape(
//!         layer,
//!         ShapeNode::new(ShapeKind::rect(40.0, 20.0), ShapeStyle::filled(Color::BLACK)),
//!         &NodeConfig::at(10.0, 10.0),
//!     )
//!     .unwrap();
//! stage.draw();
//!
//! let clicks = Rc::new(RefCell::new(0));
//! let mut router = Router::new();
//! let seen = clicks.clone();
//! router.on(layer, "click.toolbar", move |ev, _| {
//!     assert_eq!(ev.target, button);
//!     *seen.borrow_mut() += 1;
//! });
//!
//! router.pointer_down(&mut stage, Point::new(20.0, 20.0), 0.0);
//! router.pointer_up(&mut stage, Point::new(21.0, 20.0), 50.0);
//! assert_eq!(*clicks.borrow(), 1);
//!
//! router.off(layer, ".toolbar");
//! assert_eq!(router.listener_count(layer), 0);
//! ```

pub mod dispatcher;
mod router;
mod types;

pub use router::{Callback, ListenerId, Router, RouterConfig};
pub use types::{Dispatch, Event, EventType, Outcome, Phase};
