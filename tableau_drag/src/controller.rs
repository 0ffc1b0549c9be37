// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drag state machine.

use kurbo::Point;
use tableau_animation::{Animation, AnimationId, Frame, Scheduler, Tick};
use tableau_responder::{Event, EventType, Router};
use tableau_scene::{NodeId, Stage, Surface};

use crate::error::DragError;
use crate::gesture::DragGesture;

/// What happens when a drag starts while another is in progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConcurrentDragPolicy {
    /// Refuse the new drag with [`DragError::AlreadyDragging`].
    #[default]
    Reject,
    /// End the current drag (firing its `dragend`) and start the new one.
    Preempt,
}

/// Drag tunables.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragConfig {
    /// Minimum time between layer redraws while moving, in milliseconds.
    pub min_redraw_interval: f64,
    /// Policy for a second drag start.
    pub policy: ConcurrentDragPolicy,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            min_redraw_interval: 20.0,
            policy: ConcurrentDragPolicy::Reject,
        }
    }
}

/// Moves one node at a time under the pointer.
///
/// `Idle` until a drag begins on a draggable, listening node; `Dragging` until
/// pointer-up or cancel. Moves set the node's absolute position, honoring its
/// drag constraint and bounds.
///
/// Redraws are driven by the [`Scheduler`]: while dragging, the controller
/// keeps one animation registered that targets the dragged node. Each tick it
/// redraws the node's layer if the node moved since the last redraw and at
/// least [`DragConfig::min_redraw_interval`] has passed. Ending the drag stops
/// the animation and redraws once more.
///
/// Lifecycle events `dragstart`, `dragmove` and `dragend` are dispatched
/// through the [`Router`] and bubble.
#[derive(Clone, Debug, Default)]
pub struct DragController {
    config: DragConfig,
    active: Option<DragGesture>,
    animation: Option<AnimationId>,
}

impl DragController {
    /// An idle controller with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// An idle controller with `config`.
    pub fn with_config(config: DragConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The configuration.
    pub fn config(&self) -> DragConfig {
        self.config
    }

    /// Whether a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    /// The node being dragged.
    pub fn dragged_node(&self) -> Option<NodeId> {
        self.active.map(|g| g.node)
    }

    /// The gesture in progress.
    pub fn gesture(&self) -> Option<&DragGesture> {
        self.active.as_ref()
    }

    /// The scheduler animation redrawing the current drag.
    pub fn animation(&self) -> Option<AnimationId> {
        self.animation
    }

    /// Start dragging `node`, grabbed at `pointer` (stage pixels).
    pub fn begin<S: Surface + 'static>(
        &mut self,
        stage: &mut Stage<S>,
        router: &mut Router<S>,
        scheduler: &mut Scheduler<S>,
        node: NodeId,
        pointer: Point,
        time: f64,
    ) -> Result<(), DragError> {
        let attrs = stage.attrs(node).ok_or(DragError::UnknownNode(node))?;
        if !attrs.draggable() {
            return Err(DragError::NotDraggable(node));
        }
        if !stage.is_attached(node) {
            return Err(DragError::Detached(node));
        }
        if !stage.is_listening(node) {
            return Err(DragError::NotListening(node));
        }
        if let Some(current) = self.dragged_node() {
            match self.config.policy {
                ConcurrentDragPolicy::Reject => {
                    tracing::debug!(
                        node = ?node,
                        current = ?current,
                        "drag rejected: already dragging"
                    );
                    return Err(DragError::AlreadyDragging(current));
                }
                ConcurrentDragPolicy::Preempt => {
                    tracing::debug!(node = ?node, current = ?current, "drag preempted");
                    self.finish(stage, router, scheduler, pointer, time);
                }
            }
        }

        let position = stage
            .absolute_position(node)
            .ok_or(DragError::UnknownNode(node))?;
        self.active = Some(DragGesture::new(node, pointer, position));
        self.animation = Some(scheduler.start(self.redraw_animation(node, position), time));
        tracing::debug!(node = ?node, ?pointer, "drag started");
        router.dispatch(
            stage,
            Event::new(EventType::DragStart, node).at(pointer).with_time(time),
        );
        Ok(())
    }

    /// Pointer pressed: start dragging the nearest draggable ancestor-or-self
    /// of the shape under `pointer`. Returns the dragged node, or `None` when
    /// nothing draggable is there.
    pub fn pointer_down<S: Surface + 'static>(
        &mut self,
        stage: &mut Stage<S>,
        router: &mut Router<S>,
        scheduler: &mut Scheduler<S>,
        pointer: Point,
        time: f64,
    ) -> Result<Option<NodeId>, DragError> {
        let Some(hit) = stage.intersection(pointer) else {
            return Ok(None);
        };
        let root = stage.root();
        let Some(node) = stage
            .path_to_root(hit)
            .into_iter()
            .take_while(|n| *n != root)
            .find(|n| stage.attrs(*n).is_some_and(|a| a.draggable()))
        else {
            return Ok(None);
        };
        self.begin(stage, router, scheduler, node, pointer, time)?;
        Ok(Some(node))
    }

    /// Pointer moved: reposition the dragged node. Returns its new absolute
    /// position, or `None` when idle.
    ///
    /// The layer is not redrawn here; the next scheduler tick picks the move
    /// up. A dragged node that disappeared ends the drag silently.
    pub fn pointer_move<S: Surface + 'static>(
        &mut self,
        stage: &mut Stage<S>,
        router: &mut Router<S>,
        scheduler: &mut Scheduler<S>,
        pointer: Point,
        time: f64,
    ) -> Option<Point> {
        let gesture = self.active.as_mut()?;
        let node = gesture.node;
        let Some(attrs) = stage.attrs(node) else {
            tracing::warn!(node = ?node, "dragged node vanished; drag dropped");
            self.reset(scheduler);
            return None;
        };
        gesture.update(pointer);
        let target = gesture.target(pointer, attrs.drag_constraint, attrs.drag_bounds.as_ref());
        let start = gesture.start_position;
        if let Err(err) = stage.set_absolute_position(node, target) {
            tracing::warn!(node = ?node, error = %err, "drag move failed");
            return None;
        }
        tracing::trace!(node = ?node, ?target, "drag move");
        if self.animation.is_none_or(|id| !scheduler.is_running(id)) {
            tracing::debug!(node = ?node, "drag redraw animation restarted");
            self.animation = Some(scheduler.start(self.redraw_animation(node, start), time));
        }
        router.dispatch(
            stage,
            Event::new(EventType::DragMove, node).at(pointer).with_time(time),
        );
        stage.absolute_position(node)
    }

    /// Pointer released: end the drag, redraw the node's layer and fire
    /// `dragend`. Returns the node that was dragged.
    pub fn pointer_up<S: Surface + 'static>(
        &mut self,
        stage: &mut Stage<S>,
        router: &mut Router<S>,
        scheduler: &mut Scheduler<S>,
        pointer: Point,
        time: f64,
    ) -> Option<NodeId> {
        self.finish(stage, router, scheduler, pointer, time)
    }

    /// Abandon the drag: put the node back where it started, redraw and fire
    /// `dragend`. Returns the node that was dragged.
    pub fn cancel<S: Surface + 'static>(
        &mut self,
        stage: &mut Stage<S>,
        router: &mut Router<S>,
        scheduler: &mut Scheduler<S>,
        time: f64,
    ) -> Option<NodeId> {
        let gesture = self.active?;
        if stage.contains(gesture.node)
            && let Err(err) = stage.set_absolute_position(gesture.node, gesture.start_position)
        {
            tracing::warn!(node = ?gesture.node, error = %err, "drag cancel failed");
        }
        tracing::debug!(node = ?gesture.node, "drag cancelled");
        self.finish(stage, router, scheduler, gesture.last_pointer, time)
    }

    /// Per-frame redraw policy for one drag: redraw when the node moved since
    /// the last redraw and the minimum interval has passed.
    fn redraw_animation<S: Surface + 'static>(
        &self,
        node: NodeId,
        drawn_at: Point,
    ) -> Animation<S> {
        let min_interval = self.config.min_redraw_interval;
        let mut drawn = drawn_at;
        let mut last_redraw: Option<f64> = None;
        Animation::new()
            .on_frame(move |frame: &Frame, stage: &mut Stage<S>| {
                let Some(position) = stage.absolute_position(node) else {
                    return Tick::Finish;
                };
                let due = last_redraw.is_none_or(|t| frame.last_time - t >= min_interval);
                if position == drawn || !due {
                    return Tick::Skip;
                }
                drawn = position;
                last_redraw = Some(frame.last_time);
                Tick::Redraw
            })
            .redraw(node)
    }

    fn finish<S: Surface + 'static>(
        &mut self,
        stage: &mut Stage<S>,
        router: &mut Router<S>,
        scheduler: &mut Scheduler<S>,
        pointer: Point,
        time: f64,
    ) -> Option<NodeId> {
        let node = self.dragged_node()?;
        self.reset(scheduler);
        if stage.contains(node)
            && let Err(err) = stage.draw_node(node)
        {
            tracing::warn!(node = ?node, error = %err, "drag redraw failed");
        }
        tracing::debug!(node = ?node, "drag ended");
        router.dispatch(
            stage,
            Event::new(EventType::DragEnd, node).at(pointer).with_time(time),
        );
        Some(node)
    }

    fn reset<S: Surface + 'static>(&mut self, scheduler: &mut Scheduler<S>) {
        if let Some(id) = self.animation.take() {
            scheduler.stop(id);
        }
        self.active = None;
    }
}
