// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Animation records and frame timing.

use core::fmt;

use tableau_scene::{NodeId, Stage};
use tableau_surface::RasterSurface;

/// Identifies one started animation. Ids are never reused by a scheduler.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationId(pub(crate) u64);

impl AnimationId {
    /// The raw id.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Frame timing shared by every animation of a scheduler, in milliseconds.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Frame {
    /// Time elapsed since the loop started running.
    pub time: f64,
    /// Time since the previous tick.
    pub time_diff: f64,
    /// Timestamp of the latest tick.
    pub last_time: f64,
}

impl Frame {
    /// Frames per second implied by the last delta, or zero before the first.
    pub fn frame_rate(&self) -> f64 {
        if self.time_diff > 0.0 {
            1000.0 / self.time_diff
        } else {
            0.0
        }
    }

    /// Restart the record at `now`.
    pub(crate) fn reset(&mut self, now: f64) {
        *self = Self {
            time: 0.0,
            time_diff: 0.0,
            last_time: now,
        };
    }

    /// Advance to `now`. Clocks that step backwards count as a zero delta.
    pub(crate) fn advance(&mut self, now: f64) {
        self.time_diff = (now - self.last_time).max(0.0);
        self.last_time = now;
        self.time += self.time_diff;
    }
}

/// What an animation wants after one frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Tick {
    /// Redraw the animation's target this frame.
    #[default]
    Redraw,
    /// Nothing visible changed; leave the target alone.
    Skip,
    /// Redraw the target once more, then stop.
    Finish,
}

/// Per-frame callback. It may edit the stage; redraws happen after every
/// callback of the frame has run.
pub type FrameCallback<S> = Box<dyn FnMut(&Frame, &mut Stage<S>) -> Tick>;

/// An animation waiting to be started on a [`Scheduler`](crate::Scheduler).
///
/// Both parts are optional: without a callback every frame redraws the target,
/// without a target the callback runs but nothing is redrawn for it.
pub struct Animation<S = RasterSurface> {
    pub(crate) callback: Option<FrameCallback<S>>,
    pub(crate) target: Option<NodeId>,
}

impl<S> Default for Animation<S> {
    fn default() -> Self {
        Self {
            callback: None,
            target: None,
        }
    }
}

impl<S> fmt::Debug for Animation<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animation")
            .field("callback", &self.callback.is_some())
            .field("target", &self.target)
            .finish()
    }
}

impl<S> Animation<S> {
    /// An animation with neither callback nor target.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `callback` once per frame.
    pub fn on_frame(
        mut self,
        callback: impl FnMut(&Frame, &mut Stage<S>) -> Tick + 'static,
    ) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Redraw `node` (its layer, or every layer for the stage root) after
    /// frames that ask for it.
    pub fn redraw(mut self, node: NodeId) -> Self {
        self.target = Some(node);
        self
    }

    /// The redraw target.
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }
}
