// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tableau Animation: a self-correcting frame loop for [`tableau_scene`] stages.
//!
//! A [`Scheduler`] owns the active [`Animation`]s of one stage. Starting the
//! first animation moves the loop from [`LoopState::Idle`] to
//! [`LoopState::Running`] and asks the host's [`Timer`] for a frame; each
//! [`Scheduler::tick`] then:
//!
//! 1. advances the shared [`Frame`] record (elapsed time, delta, timestamp),
//! 2. runs every callback in start order,
//! 3. redraws each layer named by a redraw target exactly once,
//! 4. nudges the target interval (up after late frames, down after early ones),
//! 5. requests the next frame, or goes idle when no animation is left.
//!
//! ## Example
//!
//! ```
//! use tableau_animation::{Animation, LoopState, Scheduler, Tick};
//! use tableau_scene::{NodeConfig, Stage};
//!
//! let mut stage = Stage::new(64, 64);
//! let layer = stage.add_layer(&NodeConfig::default()).unwrap();
//! let group = stage.add_group(layer, &NodeConfig::default()).unwrap();
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.start(
//!     Animation::new()
//!         .on_frame(move |frame, stage| {
//!             stage.attrs_mut(group).unwrap().position.x = frame.time / 10.0;
//!             if frame.time >= 100.0 { Tick::Finish } else { Tick::Redraw }
//!         })
//!         .redraw(group),
//!     0.0,
//! );
//!
//! let mut now = 0.0;
//! while scheduler.state() == LoopState::Running {
//!     now += 16.0;
//!     assert_eq!(scheduler.tick(&mut stage, now).as_slice(), [layer]);
//! }
//! assert_eq!(stage.position(group).unwrap().x, 11.2);
//! ```

mod animation;
mod scheduler;

pub use animation::{Animation, AnimationId, Frame, FrameCallback, Tick};
pub use scheduler::{LoopState, RedrawSet, Scheduler, SchedulerConfig, Timer};
