// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag sessions end to end: hit testing, positioning, throttling, policies.

use std::cell::RefCell;
use std::rc::Rc;

use kurbo::Point;
use peniko::Color;
use tableau_animation::{LoopState, Scheduler};
use tableau_drag::{ConcurrentDragPolicy, DragConfig, DragController, DragError};
use tableau_responder::{Event, Router};
use tableau_scene::{
    DragBounds, DragConstraint, NodeConfig, NodeId, ShapeKind, ShapeNode, ShapeStyle, Stage,
};
use tableau_surface::{RecordingSurface, SurfaceOp};

type Rec = RecordingSurface;

fn draggable(x: f64, y: f64) -> NodeConfig {
    let mut config = NodeConfig::at(x, y);
    config.draggable = Some(true);
    config
}

fn square() -> ShapeNode {
    ShapeNode::new(ShapeKind::rect(10.0, 10.0), ShapeStyle::filled(Color::BLACK))
}

fn recording() -> (Stage<Rec>, NodeId, NodeId, NodeId) {
    let mut stage: Stage<Rec> = Stage::with_size(200, 200);
    let layer = stage.add_layer(&NodeConfig::default()).unwrap();
    let a = stage.add_shape(layer, square(), &draggable(0.0, 0.0)).unwrap();
    let b = stage.add_shape(layer, square(), &draggable(50.0, 0.0)).unwrap();
    (stage, layer, a, b)
}

fn clears(stage: &Stage<Rec>, layer: NodeId) -> usize {
    stage
        .canvas(layer)
        .unwrap()
        .scene
        .count(|op| matches!(op, SurfaceOp::Clear))
}

#[test]
fn bounds_clamp_x_150_to_100() {
    let mut stage = Stage::new(200, 200);
    let layer = stage.add_layer(&NodeConfig::default()).unwrap();
    let mut config = draggable(20.0, 20.0);
    config.drag_bounds = Some(DragBounds::new(0.0, 100.0, 100.0, 0.0));
    let node = stage.add_shape(layer, square(), &config).unwrap();
    stage.draw();

    let mut router = Router::new();
    let mut scheduler = Scheduler::new();
    let mut drag = DragController::new();
    let down = Point::new(20.0, 20.0);
    assert_eq!(
        drag.pointer_down(&mut stage, &mut router, &mut scheduler, down, 0.0),
        Ok(Some(node))
    );
    let far = Point::new(150.0, 40.0);
    assert_eq!(
        drag.pointer_move(&mut stage, &mut router, &mut scheduler, far, 16.0),
        Some(Point::new(100.0, 40.0))
    );
    drag.pointer_up(&mut stage, &mut router, &mut scheduler, far, 32.0);

    // The hit index follows the final position.
    assert_eq!(stage.intersection(Point::new(105.0, 45.0)), Some(node));
    assert_eq!(stage.intersection(Point::new(25.0, 25.0)), None);
}

#[test]
fn grabbing_a_child_drags_the_draggable_group() {
    let mut stage = Stage::new(200, 200);
    let layer = stage.add_layer(&NodeConfig::default()).unwrap();
    let mut group_config = draggable(30.0, 30.0);
    group_config.scale = Some(tableau_scene::PartialXY::new(2.0, 2.0));
    let group = stage.add_group(layer, &group_config).unwrap();
    let child = stage
        .add_shape(group, square(), &NodeConfig::at(5.0, 5.0))
        .unwrap();
    stage.draw();

    let mut router = Router::new();
    let mut scheduler = Scheduler::new();
    let mut drag = DragController::new();
    // The child covers stage pixels 40..60 on both axes.
    assert_eq!(
        drag.pointer_down(&mut stage, &mut router, &mut scheduler, Point::new(45.0, 45.0), 0.0),
        Ok(Some(group))
    );
    drag.pointer_move(&mut stage, &mut router, &mut scheduler, Point::new(55.0, 65.0), 16.0);
    assert_eq!(stage.position(group), Some(Point::new(40.0, 50.0)));
    assert_eq!(stage.absolute_position(child), Some(Point::new(50.0, 60.0)));
}

#[test]
fn nested_nodes_move_in_stage_coordinates() {
    let (mut stage, layer, _, _) = recording();
    let group = stage.add_group(layer, &NodeConfig::at(100.0, 100.0)).unwrap();
    let inner = stage.add_shape(group, square(), &draggable(0.0, 0.0)).unwrap();

    let mut router = Router::new();
    let mut scheduler = Scheduler::new();
    let mut drag = DragController::new();
    drag.begin(&mut stage, &mut router, &mut scheduler, inner, Point::new(102.0, 103.0), 0.0)
        .unwrap();
    drag.pointer_move(&mut stage, &mut router, &mut scheduler, Point::new(112.0, 123.0), 16.0);
    assert_eq!(stage.absolute_position(inner), Some(Point::new(110.0, 120.0)));
    assert_eq!(stage.position(inner), Some(Point::new(10.0, 20.0)));
}

#[test]
fn constraints_pin_an_axis() {
    for (constraint, expected) in [
        (DragConstraint::Horizontal, Point::new(30.0, 0.0)),
        (DragConstraint::Vertical, Point::new(0.0, 40.0)),
        (DragConstraint::None, Point::new(30.0, 40.0)),
    ] {
        let (mut stage, _, a, _) = recording();
        stage.attrs_mut(a).unwrap().drag_constraint = constraint;
        let mut router = Router::new();
        let mut scheduler = Scheduler::new();
        let mut drag = DragController::new();
        drag.begin(&mut stage, &mut router, &mut scheduler, a, Point::ORIGIN, 0.0)
            .unwrap();
        assert_eq!(
            drag.pointer_move(&mut stage, &mut router, &mut scheduler, Point::new(30.0, 40.0), 1.0),
            Some(expected),
            "{constraint:?}"
        );
    }
}

#[test]
fn moves_alone_do_not_redraw() {
    let (mut stage, layer, a, _) = recording();
    let mut router = Router::new();
    let mut scheduler = Scheduler::new();
    let mut drag = DragController::new();
    drag.begin(&mut stage, &mut router, &mut scheduler, a, Point::ORIGIN, 0.0)
        .unwrap();
    assert_eq!(scheduler.state(), LoopState::Running);
    assert_eq!(drag.animation().map(|id| scheduler.is_running(id)), Some(true));

    drag.pointer_move(&mut stage, &mut router, &mut scheduler, Point::new(4.0, 0.0), 1.0);
    assert_eq!(clears(&stage, layer), 0);
    assert_eq!(scheduler.tick(&mut stage, 2.0).as_slice(), [layer]);
    assert_eq!(clears(&stage, layer), 1);
}

#[test]
fn scheduler_ticks_throttle_redraws() {
    let (mut stage, layer, a, _) = recording();
    let mut router = Router::new();
    let mut scheduler = Scheduler::new();
    let mut drag = DragController::new();
    drag.begin(&mut stage, &mut router, &mut scheduler, a, Point::ORIGIN, 0.0)
        .unwrap();

    // A move and a tick every 5ms. The first tick sees no movement; after
    // that redraws land at 5, 25 and 45.
    for step in 0..10 {
        let t = f64::from(step) * 5.0;
        drag.pointer_move(&mut stage, &mut router, &mut scheduler, Point::new(t, 0.0), t);
        scheduler.tick(&mut stage, t);
    }
    assert_eq!(clears(&stage, layer), 3);

    // A trailing move is picked up by ticks alone once the interval passes.
    drag.pointer_move(&mut stage, &mut router, &mut scheduler, Point::new(50.0, 0.0), 50.0);
    assert!(scheduler.tick(&mut stage, 60.0).is_empty());
    assert_eq!(scheduler.tick(&mut stage, 65.0).as_slice(), [layer]);
    assert_eq!(clears(&stage, layer), 4);

    // Nothing moved since.
    assert!(scheduler.tick(&mut stage, 100.0).is_empty());
    assert_eq!(clears(&stage, layer), 4);
}

#[test]
fn the_redraw_interval_is_configurable() {
    let (mut stage, layer, a, _) = recording();
    let mut router = Router::new();
    let mut scheduler = Scheduler::new();
    let mut drag = DragController::with_config(DragConfig {
        min_redraw_interval: 0.0,
        ..DragConfig::default()
    });
    drag.begin(&mut stage, &mut router, &mut scheduler, a, Point::ORIGIN, 0.0)
        .unwrap();
    for step in 1..=4 {
        let t = f64::from(step);
        drag.pointer_move(&mut stage, &mut router, &mut scheduler, Point::new(t, 0.0), t);
        scheduler.tick(&mut stage, t);
    }
    assert_eq!(clears(&stage, layer), 4);
}

#[test]
fn release_redraws_and_stops_the_animation() {
    let (mut stage, layer, a, _) = recording();
    let mut router = Router::new();
    let mut scheduler = Scheduler::new();
    let mut drag = DragController::new();
    drag.begin(&mut stage, &mut router, &mut scheduler, a, Point::ORIGIN, 0.0)
        .unwrap();
    drag.pointer_move(&mut stage, &mut router, &mut scheduler, Point::new(1.0, 0.0), 1.0);
    scheduler.tick(&mut stage, 1.0);
    drag.pointer_move(&mut stage, &mut router, &mut scheduler, Point::new(2.0, 0.0), 2.0);
    assert!(scheduler.tick(&mut stage, 2.0).is_empty());
    assert_eq!(clears(&stage, layer), 1);

    let up = Point::new(2.0, 0.0);
    assert_eq!(drag.pointer_up(&mut stage, &mut router, &mut scheduler, up, 3.0), Some(a));
    assert_eq!(clears(&stage, layer), 2);
    assert_eq!(drag.animation(), None);
    assert_eq!(scheduler.active_count(), 0);
    assert_eq!(scheduler.state(), LoopState::Idle);
    assert_eq!(
        drag.pointer_up(&mut stage, &mut router, &mut scheduler, Point::ORIGIN, 4.0),
        None
    );
}

#[test]
fn a_stopped_animation_is_restarted_by_the_next_move() {
    let (mut stage, layer, a, _) = recording();
    let mut router = Router::new();
    let mut scheduler = Scheduler::new();
    let mut drag = DragController::new();
    drag.begin(&mut stage, &mut router, &mut scheduler, a, Point::ORIGIN, 0.0)
        .unwrap();
    scheduler.stop_all();
    assert_eq!(scheduler.state(), LoopState::Idle);

    drag.pointer_move(&mut stage, &mut router, &mut scheduler, Point::new(7.0, 0.0), 10.0);
    assert_eq!(scheduler.state(), LoopState::Running);
    assert_eq!(scheduler.tick(&mut stage, 11.0).as_slice(), [layer]);
}

#[test]
fn reject_policy_keeps_the_first_drag() {
    let (mut stage, _, a, b) = recording();
    let mut router = Router::new();
    let mut scheduler = Scheduler::new();
    let mut drag = DragController::new();
    drag.begin(&mut stage, &mut router, &mut scheduler, a, Point::ORIGIN, 0.0)
        .unwrap();
    assert_eq!(
        drag.begin(&mut stage, &mut router, &mut scheduler, b, Point::new(50.0, 0.0), 1.0),
        Err(DragError::AlreadyDragging(a))
    );
    assert_eq!(drag.dragged_node(), Some(a));
    assert_eq!(scheduler.active_count(), 1);
}

#[test]
fn preempt_policy_ends_the_first_drag() {
    let (mut stage, _, a, b) = recording();
    let ends = Rc::new(RefCell::new(Vec::new()));
    let mut router = Router::new();
    let log = ends.clone();
    router.on(stage.root(), "dragend", move |ev: &mut Event, _: &mut Stage<Rec>| {
        log.borrow_mut().push(ev.target);
    });

    let mut scheduler = Scheduler::new();
    let mut drag = DragController::with_config(DragConfig {
        policy: ConcurrentDragPolicy::Preempt,
        ..DragConfig::default()
    });
    drag.begin(&mut stage, &mut router, &mut scheduler, a, Point::ORIGIN, 0.0)
        .unwrap();
    let first = drag.animation().unwrap();
    drag.begin(&mut stage, &mut router, &mut scheduler, b, Point::new(50.0, 0.0), 1.0)
        .unwrap();
    assert_eq!(drag.dragged_node(), Some(b));
    assert_eq!(*ends.borrow(), [a]);
    assert!(!scheduler.is_running(first));
    assert_eq!(scheduler.active_count(), 1);
}

#[test]
fn lifecycle_events_bubble_in_order() {
    let (mut stage, layer, a, _) = recording();
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut router = Router::new();
    for node in [a, layer] {
        let log = log.clone();
        router.on(
            node,
            "dragstart dragmove dragend",
            move |ev: &mut Event, _: &mut Stage<Rec>| {
                log.borrow_mut().push((ev.kind.to_string(), ev.current_target));
            },
        );
    }
    let mut scheduler = Scheduler::new();
    let mut drag = DragController::new();
    drag.begin(&mut stage, &mut router, &mut scheduler, a, Point::ORIGIN, 0.0)
        .unwrap();
    drag.pointer_move(&mut stage, &mut router, &mut scheduler, Point::new(3.0, 3.0), 5.0);
    drag.pointer_up(&mut stage, &mut router, &mut scheduler, Point::new(3.0, 3.0), 10.0);
    let names: Vec<_> = log.borrow().iter().map(|(k, n)| (k.clone(), *n)).collect();
    assert_eq!(
        names,
        [
            ("dragstart".to_string(), a),
            ("dragstart".to_string(), layer),
            ("dragmove".to_string(), a),
            ("dragmove".to_string(), layer),
            ("dragend".to_string(), a),
            ("dragend".to_string(), layer),
        ]
    );
}

#[test]
fn cancel_puts_the_node_back() {
    let (mut stage, layer, _, b) = recording();
    let mut router = Router::new();
    let mut scheduler = Scheduler::new();
    let mut drag = DragController::new();
    drag.begin(&mut stage, &mut router, &mut scheduler, b, Point::new(52.0, 2.0), 0.0)
        .unwrap();
    drag.pointer_move(&mut stage, &mut router, &mut scheduler, Point::new(80.0, 40.0), 10.0);
    assert_eq!(stage.position(b), Some(Point::new(78.0, 38.0)));
    assert_eq!(drag.cancel(&mut stage, &mut router, &mut scheduler, 20.0), Some(b));
    assert_eq!(stage.position(b), Some(Point::new(50.0, 0.0)));
    assert!(!drag.is_dragging());
    assert_eq!(clears(&stage, layer), 1);
    assert_eq!(scheduler.state(), LoopState::Idle);
}

#[test]
fn ineligible_nodes_do_not_start() {
    let (mut stage, layer, a, _) = recording();
    let mut router = Router::new();
    let mut scheduler = Scheduler::new();
    let mut drag = DragController::new();

    assert_eq!(
        drag.begin(&mut stage, &mut router, &mut scheduler, layer, Point::ORIGIN, 0.0),
        Err(DragError::NotDraggable(layer))
    );

    stage.attrs_mut(layer).unwrap().set_listening(false);
    assert_eq!(
        drag.begin(&mut stage, &mut router, &mut scheduler, a, Point::ORIGIN, 0.0),
        Err(DragError::NotListening(a))
    );

    let staged = stage.create_shape(square(), &draggable(0.0, 0.0));
    assert_eq!(
        drag.begin(&mut stage, &mut router, &mut scheduler, staged, Point::ORIGIN, 0.0),
        Err(DragError::Detached(staged))
    );

    stage.destroy(staged).unwrap();
    assert_eq!(
        drag.begin(&mut stage, &mut router, &mut scheduler, staged, Point::ORIGIN, 0.0),
        Err(DragError::UnknownNode(staged))
    );
    assert!(!drag.is_dragging());
    assert_eq!(scheduler.state(), LoopState::Idle);
}

#[test]
fn destroying_the_dragged_node_ends_the_drag() {
    let (mut stage, _, a, _) = recording();
    let mut router = Router::new();
    let mut scheduler = Scheduler::new();
    let mut drag = DragController::new();
    drag.begin(&mut stage, &mut router, &mut scheduler, a, Point::ORIGIN, 0.0)
        .unwrap();
    stage.destroy(a).unwrap();
    assert_eq!(
        drag.pointer_move(&mut stage, &mut router, &mut scheduler, Point::new(5.0, 5.0), 1.0),
        None
    );
    assert!(!drag.is_dragging());
    assert_eq!(scheduler.active_count(), 0);
}

#[test]
fn ticks_retire_the_animation_of_a_destroyed_node() {
    let (mut stage, _, a, _) = recording();
    let mut router = Router::new();
    let mut scheduler = Scheduler::new();
    let mut drag = DragController::new();
    drag.begin(&mut stage, &mut router, &mut scheduler, a, Point::ORIGIN, 0.0)
        .unwrap();
    stage.destroy(a).unwrap();
    assert!(scheduler.tick(&mut stage, 16.0).is_empty());
    assert_eq!(scheduler.state(), LoopState::Idle);
}

#[test]
fn pointer_down_on_background_or_static_shapes_is_ignored() {
    let mut stage = Stage::new(100, 100);
    let layer = stage.add_layer(&NodeConfig::default()).unwrap();
    stage
        .add_shape(layer, square(), &NodeConfig::default())
        .unwrap();
    stage.draw();
    let mut router = Router::new();
    let mut scheduler = Scheduler::new();
    let mut drag = DragController::new();
    assert_eq!(
        drag.pointer_down(&mut stage, &mut router, &mut scheduler, Point::new(5.0, 5.0), 0.0),
        Ok(None)
    );
    assert_eq!(
        drag.pointer_down(&mut stage, &mut router, &mut scheduler, Point::new(50.0, 50.0), 0.0),
        Ok(None)
    );
    assert_eq!(scheduler.active_count(), 0);
}
