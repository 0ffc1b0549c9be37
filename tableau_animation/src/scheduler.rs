// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The frame loop: active animations, adaptive interval and redraw batching.

use core::fmt;

use smallvec::SmallVec;
use tableau_scene::{NodeId, Stage, Surface};
use tableau_surface::RasterSurface;

use crate::animation::{Animation, AnimationId, Frame, FrameCallback, Tick};

/// The host's timing primitive: run the next frame after about `delay_ms`.
///
/// When the delay elapses the host calls [`Scheduler::tick`].
pub trait Timer {
    /// Request one frame callback.
    fn schedule(&mut self, delay_ms: f64);
}

impl<F: FnMut(f64)> Timer for F {
    fn schedule(&mut self, delay_ms: f64) {
        self(delay_ms);
    }
}

/// Interval adaptation parameters, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchedulerConfig {
    /// Target interval when the scheduler is created.
    pub initial_interval: f64,
    /// Lower bound of the target interval.
    pub min_interval: f64,
    /// Upper bound of the target interval.
    pub max_interval: f64,
    /// Added to the interval after a frame that arrived late.
    pub behind_step: f64,
    /// Removed from the interval after a frame that arrived early.
    pub ahead_step: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_interval: 1000.0 / 60.0,
            min_interval: 1000.0 / 120.0,
            max_interval: 100.0,
            behind_step: 1.0,
            ahead_step: 0.5,
        }
    }
}

/// Whether the frame loop is scheduling frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LoopState {
    /// No active animations; no frames are requested.
    #[default]
    Idle,
    /// At least one animation is active.
    Running,
}

struct Record<S> {
    id: AnimationId,
    callback: Option<FrameCallback<S>>,
    target: Option<NodeId>,
}

/// Layers repainted by one tick; a handful at most.
pub type RedrawSet = SmallVec<[NodeId; 4]>;

/// Drives animations and repaints what they touch, once per layer per frame.
///
/// Animations run in the order they were started. A tick runs every callback
/// first, then redraws the distinct layers their targets resolve to.
pub struct Scheduler<S = RasterSurface> {
    config: SchedulerConfig,
    records: Vec<Record<S>>,
    next_id: u64,
    state: LoopState,
    frame: Frame,
    interval: f64,
    timer: Option<Box<dyn Timer>>,
}

impl<S> fmt::Debug for Scheduler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("state", &self.state)
            .field("active", &self.records.len())
            .field("frame", &self.frame)
            .field("interval", &self.interval)
            .field("timer", &self.timer.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: Surface> Default for Scheduler<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Surface> Scheduler<S> {
    /// An idle scheduler with the default configuration and no timer.
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// An idle scheduler with `config` and no timer.
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            config,
            records: Vec::new(),
            next_id: 0,
            state: LoopState::Idle,
            frame: Frame::default(),
            interval: config
                .initial_interval
                .clamp(config.min_interval, config.max_interval),
            timer: None,
        }
    }

    /// Attach the timer used to request frames.
    pub fn with_timer(mut self, timer: impl Timer + 'static) -> Self {
        self.timer = Some(Box::new(timer));
        self
    }

    /// The configuration.
    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    /// Current loop state.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// The shared frame record.
    pub fn frame(&self) -> Frame {
        self.frame
    }

    /// The current target interval between frames.
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Number of active animations.
    pub fn active_count(&self) -> usize {
        self.records.len()
    }

    /// Whether the animation is still active.
    pub fn is_running(&self, id: AnimationId) -> bool {
        self.records.iter().any(|r| r.id == id)
    }

    /// Start an animation at timestamp `now`. The first start of an idle loop
    /// resets the frame record and requests a frame.
    pub fn start(&mut self, animation: Animation<S>, now: f64) -> AnimationId {
        self.next_id += 1;
        let id = AnimationId(self.next_id);
        self.records.push(Record {
            id,
            callback: animation.callback,
            target: animation.target,
        });
        if self.state == LoopState::Idle {
            self.state = LoopState::Running;
            self.frame.reset(now);
            tracing::debug!(interval = self.interval, "frame loop started");
            self.request_frame();
        }
        id
    }

    /// Remove an animation. Returns whether it was active.
    pub fn stop(&mut self, id: AnimationId) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        let removed = self.records.len() != before;
        if removed {
            self.idle_if_empty();
        }
        removed
    }

    /// Remove every animation.
    pub fn stop_all(&mut self) {
        self.records.clear();
        self.idle_if_empty();
    }

    /// Run one frame at timestamp `now`: advance the frame record, run every
    /// callback, then redraw the distinct layers requested. Returns the layers
    /// drawn.
    ///
    /// A tick arriving after the loop went idle does nothing.
    pub fn tick(&mut self, stage: &mut Stage<S>, now: f64) -> RedrawSet {
        if self.state == LoopState::Idle {
            tracing::trace!("tick on idle loop ignored");
            return RedrawSet::new();
        }
        self.frame.advance(now);
        let frame = self.frame;

        let mut targets: SmallVec<[NodeId; 8]> = SmallVec::new();
        let mut finished: SmallVec<[AnimationId; 4]> = SmallVec::new();
        for record in &mut self.records {
            let tick = match &mut record.callback {
                Some(callback) => callback(&frame, stage),
                None => Tick::Redraw,
            };
            if tick == Tick::Finish {
                finished.push(record.id);
            }
            if tick != Tick::Skip
                && let Some(target) = record.target
                && !targets.contains(&target)
            {
                targets.push(target);
            }
        }
        if !finished.is_empty() {
            self.records.retain(|r| !finished.contains(&r.id));
        }

        let mut layers = RedrawSet::new();
        for target in targets {
            if !stage.contains(target) {
                tracing::warn!(node = ?target, "stale redraw target skipped");
                continue;
            }
            for layer in stage.redraw_layers(target) {
                if !layers.contains(&layer) {
                    layers.push(layer);
                }
            }
        }
        for layer in &layers {
            if let Err(err) = stage.draw_layer(*layer) {
                tracing::warn!(node = ?layer, error = %err, "layer redraw failed");
            }
        }
        tracing::trace!(
            time = frame.time,
            time_diff = frame.time_diff,
            redrawn = layers.len(),
            "frame"
        );

        self.adapt_interval(frame.time_diff);
        if !self.idle_if_empty() {
            self.request_frame();
        }
        layers
    }

    fn adapt_interval(&mut self, time_diff: f64) {
        if time_diff <= 0.0 {
            return;
        }
        let c = &self.config;
        if time_diff > self.interval {
            self.interval = (self.interval + c.behind_step).min(c.max_interval);
        } else if time_diff < self.interval {
            self.interval = (self.interval - c.ahead_step).max(c.min_interval);
        }
    }

    fn idle_if_empty(&mut self) -> bool {
        if self.records.is_empty() && self.state == LoopState::Running {
            self.state = LoopState::Idle;
            tracing::debug!(time = self.frame.time, "frame loop idle");
        }
        self.state == LoopState::Idle
    }

    fn request_frame(&mut self) {
        if let Some(timer) = &mut self.timer {
            timer.schedule(self.interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tableau_scene::NodeConfig;
    use tableau_surface::RecordingSurface;

    fn stage() -> (Stage<RecordingSurface>, NodeId) {
        let mut stage: Stage<RecordingSurface> = Stage::with_size(8, 8);
        let layer = stage.add_layer(&NodeConfig::default()).unwrap();
        (stage, layer)
    }

    #[test]
    fn starts_and_stops_the_loop() {
        let mut scheduler: Scheduler<RecordingSurface> = Scheduler::new();
        assert_eq!(scheduler.state(), LoopState::Idle);
        let id = scheduler.start(Animation::new(), 0.0);
        assert_eq!(scheduler.state(), LoopState::Running);
        assert!(scheduler.is_running(id));
        assert!(scheduler.stop(id));
        assert!(!scheduler.stop(id));
        assert_eq!(scheduler.state(), LoopState::Idle);
    }

    #[test]
    fn ids_are_monotonic() {
        let mut scheduler: Scheduler<RecordingSurface> = Scheduler::new();
        let a = scheduler.start(Animation::new(), 0.0);
        scheduler.stop(a);
        let b = scheduler.start(Animation::new(), 0.0);
        assert!(b > a);
    }

    #[test]
    fn callbacks_see_elapsed_time() {
        let (mut stage, _) = stage();
        let mut scheduler = Scheduler::new();
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let log = seen.clone();
        scheduler.start(
            Animation::new().on_frame(move |frame, _| {
                log.borrow_mut().push((frame.time, frame.time_diff));
                Tick::Skip
            }),
            1000.0,
        );
        scheduler.tick(&mut stage, 1016.0);
        scheduler.tick(&mut stage, 1040.0);
        assert_eq!(*seen.borrow(), [(16.0, 16.0), (40.0, 24.0)]);
        assert_eq!(scheduler.frame().last_time, 1040.0);
    }

    #[test]
    fn finish_redraws_once_more_then_goes_idle() {
        let (mut stage, layer) = stage();
        let mut scheduler = Scheduler::new();
        let id = scheduler.start(
            Animation::new()
                .on_frame(|_, _| Tick::Finish)
                .redraw(layer),
            0.0,
        );
        assert_eq!(scheduler.tick(&mut stage, 16.0).as_slice(), [layer]);
        assert!(!scheduler.is_running(id));
        assert_eq!(scheduler.state(), LoopState::Idle);
        assert!(scheduler.tick(&mut stage, 32.0).is_empty());
    }

    #[test]
    fn skip_leaves_the_target_alone() {
        let (mut stage, layer) = stage();
        let mut scheduler = Scheduler::new();
        scheduler.start(Animation::new().on_frame(|_, _| Tick::Skip).redraw(layer), 0.0);
        assert!(scheduler.tick(&mut stage, 16.0).is_empty());
    }

    #[test]
    fn stale_targets_are_skipped() {
        let (mut stage, layer) = stage();
        let group = stage.add_group(layer, &NodeConfig::default()).unwrap();
        let mut scheduler = Scheduler::new();
        scheduler.start(Animation::new().redraw(group), 0.0);
        stage.destroy(group).unwrap();
        assert!(scheduler.tick(&mut stage, 16.0).is_empty());
        assert_eq!(scheduler.state(), LoopState::Running);
    }

    #[test]
    fn interval_tracks_frame_arrival() {
        let (mut stage, _) = stage();
        let mut scheduler = Scheduler::new();
        scheduler.start(Animation::new(), 0.0);
        let start = scheduler.interval();

        // Late frames push the interval up one step each.
        scheduler.tick(&mut stage, 40.0);
        scheduler.tick(&mut stage, 80.0);
        assert_eq!(scheduler.interval(), start + 2.0);

        // Early frames pull it down half a step each.
        scheduler.tick(&mut stage, 81.0);
        assert_eq!(scheduler.interval(), start + 1.5);
    }

    #[test]
    fn interval_stays_within_bounds() {
        let (mut stage, _) = stage();
        let config = SchedulerConfig {
            initial_interval: 10.0,
            min_interval: 9.0,
            max_interval: 11.0,
            behind_step: 1.0,
            ahead_step: 0.5,
        };
        let mut scheduler = Scheduler::with_config(config);
        scheduler.start(Animation::new(), 0.0);
        for t in 1..=5 {
            scheduler.tick(&mut stage, f64::from(t) * 100.0);
        }
        assert_eq!(scheduler.interval(), 11.0);
        for t in 1..=10 {
            scheduler.tick(&mut stage, 500.0 + f64::from(t));
        }
        assert_eq!(scheduler.interval(), 9.0);
    }

    #[test]
    fn timer_is_asked_for_each_frame() {
        let (mut stage, _) = stage();
        let delays = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let log = delays.clone();
        let mut scheduler = Scheduler::new().with_timer(move |d: f64| log.borrow_mut().push(d));
        let id = scheduler.start(Animation::new(), 0.0);
        scheduler.tick(&mut stage, 16.0);
        scheduler.stop(id);
        scheduler.tick(&mut stage, 32.0);
        assert_eq!(delays.borrow().len(), 2);
    }
}
