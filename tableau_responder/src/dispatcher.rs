// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatcher helper: walk a dispatch sequence and honor stop outcomes.
//!
//! - Entries are processed in order: the target first, then its ancestors.
//! - [`Outcome::Stop`] skips every remaining entry.
//! - Returns `true` if propagation was stopped.
//!
//! Sequences are produced by [`bubble_path`] from a node's path to the stage.
//!
//! ## Minimal example
//!
//! ```
//! use tableau_responder::dispatcher;
//! use tableau_responder::{Outcome, Phase};
//! use tableau_scene::{NodeConfig, Stage};
//!
//! let mut stage = Stage::new(10, 10);
//! let layer = stage.add_layer(&NodeConfig::default()).unwrap();
//! let group = stage.add_group(layer, &NodeConfig::default()).unwrap();
//!
//! let seq = dispatcher::bubble_path(&stage.path_to_root(group));
//! let mut seen = Vec::new();
//! let stopped = dispatcher::run(&seq, &mut (), |d, _| {
//!     seen.push((d.phase, d.node));
//!     Outcome::Continue
//! });
//!
//! assert!(!stopped);
//! assert_eq!(seen, vec![
//!     (Phase::Target, group),
//!     (Phase::Bubble, layer),
//!     (Phase::Bubble, stage.root()),
//! ]);
//! ```

use smallvec::SmallVec;
use tableau_scene::NodeId;

use crate::types::{Dispatch, Outcome};

/// A dispatch sequence; the target plus a handful of ancestors fits inline.
pub type DispatchSeq = SmallVec<[Dispatch; 8]>;

/// Build a sequence from a node-first path: the first entry is the target,
/// the rest bubble.
pub fn bubble_path(path: &[NodeId]) -> DispatchSeq {
    path.iter()
        .enumerate()
        .map(|(i, node)| {
            if i == 0 {
                Dispatch::target(*node)
            } else {
                Dispatch::bubble(*node)
            }
        })
        .collect()
}

/// Run a handler over a dispatch sequence.
///
/// - [`Outcome::Continue`]: keep going.
/// - [`Outcome::Stop`]: abort propagation immediately.
///
/// Returns `true` when a handler stopped propagation.
///
/// Multiple listeners per node are proxied inside `handler`; the router runs
/// all of a node's listeners before reporting the node's outcome.
pub fn run<E>(
    seq: &[Dispatch],
    event: &mut E,
    mut handler: impl FnMut(&Dispatch, &mut E) -> Outcome,
) -> bool {
    for d in seq {
        match handler(d, event) {
            Outcome::Continue => {}
            Outcome::Stop => return true,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Phase;
    use tableau_scene::{NodeConfig, Stage};
    use tableau_surface::RecordingSurface;

    fn chain() -> (Stage<RecordingSurface>, DispatchSeq) {
        let mut stage: Stage<RecordingSurface> = Stage::with_size(4, 4);
        let layer = stage.add_layer(&NodeConfig::default()).unwrap();
        let outer = stage.add_group(layer, &NodeConfig::default()).unwrap();
        let inner = stage.add_group(outer, &NodeConfig::default()).unwrap();
        let seq = bubble_path(&stage.path_to_root(inner));
        (stage, seq)
    }

    #[test]
    fn continue_through_all() {
        let (_stage, seq) = chain();
        let mut seen = 0;
        let stopped = run(&seq, &mut (), |_, _| {
            seen += 1;
            Outcome::Continue
        });
        assert!(!stopped);
        assert_eq!(seen, seq.len());
    }

    #[test]
    fn only_the_first_entry_is_the_target() {
        let (_stage, seq) = chain();
        assert_eq!(seq[0].phase, Phase::Target);
        assert!(seq[1..].iter().all(|d| d.phase == Phase::Bubble));
    }

    #[test]
    fn stop_at_target_skips_ancestors() {
        let (_stage, seq) = chain();
        let mut seen = Vec::new();
        let stopped = run(&seq, &mut (), |d, _| {
            seen.push(d.node);
            Outcome::Stop
        });
        assert!(stopped);
        assert_eq!(seen, vec![seq[0].node]);
    }

    #[test]
    fn stop_in_bubble_aborts_remaining() {
        let (_stage, seq) = chain();
        let mut seen = Vec::new();
        run(&seq, &mut seen, |d, seen| {
            seen.push(d.node);
            if seen.len() == 2 {
                Outcome::Stop
            } else {
                Outcome::Continue
            }
        });
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn empty_sequence_is_a_no_op() {
        assert!(!run(&[], &mut (), |_, _| Outcome::Stop));
    }
}
