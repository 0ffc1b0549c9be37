// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawing state shared by the surface implementations.

use kurbo::Affine;
use peniko::{Brush, Color};
use smallvec::SmallVec;

/// The mutable drawing state saved and restored by [`crate::Surface::save`].
#[derive(Clone, Debug, PartialEq)]
pub struct DrawState {
    /// Current user-to-device transform.
    pub transform: Affine,
    /// Global alpha in `[0, 1]`.
    pub global_alpha: f64,
    /// Brush used by fills.
    pub fill: Brush,
    /// Brush used by strokes.
    pub stroke: Brush,
    /// Stroke width in user units.
    pub line_width: f64,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            global_alpha: 1.0,
            fill: Brush::Solid(Color::BLACK),
            stroke: Brush::Solid(Color::BLACK),
            line_width: 1.0,
        }
    }
}

/// Current state plus the stack of saved states.
#[derive(Clone, Debug, Default)]
pub struct StateStack {
    current: DrawState,
    saved: SmallVec<[DrawState; 8]>,
}

impl StateStack {
    /// The state in effect.
    pub fn current(&self) -> &DrawState {
        &self.current
    }

    /// Mutable access to the state in effect.
    pub fn current_mut(&mut self) -> &mut DrawState {
        &mut self.current
    }

    /// Number of saved states.
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    /// Push a copy of the current state.
    pub fn save(&mut self) {
        self.saved.push(self.current.clone());
    }

    /// Pop the last saved state. Returns `false` if nothing was saved.
    pub fn restore(&mut self) -> bool {
        match self.saved.pop() {
            Some(state) => {
                self.current = state;
                true
            }
            None => {
                tracing::warn!("restore without a matching save; ignored");
                false
            }
        }
    }

    /// Pre-multiply the current transform.
    pub fn concat(&mut self, xf: Affine) {
        self.current.transform = self.current.transform * xf;
    }

    /// Set the global alpha, clamped into `[0, 1]`.
    pub fn set_global_alpha(&mut self, alpha: f64) {
        self.current.global_alpha = if alpha.is_nan() {
            1.0
        } else {
            alpha.clamp(0.0, 1.0)
        };
    }

    /// Capture a snapshot for recording.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            transform: self.current.transform,
            global_alpha: self.current.global_alpha,
            line_width: self.current.line_width,
            fill: self.current.fill.clone(),
            stroke: self.current.stroke.clone(),
            save_depth: self.saved.len(),
        }
    }
}

/// Snapshot of the drawing state at the time a call was recorded.
#[derive(Clone, Debug, PartialEq)]
pub struct StateSnapshot {
    /// Current transform.
    pub transform: Affine,
    /// Current global alpha.
    pub global_alpha: f64,
    /// Current stroke width in user units.
    pub line_width: f64,
    /// Current fill brush.
    pub fill: Brush,
    /// Current stroke brush.
    pub stroke: Brush,
    /// Number of saved states on the stack.
    pub save_depth: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_restore_round_trips_transform_and_alpha() {
        let mut stack = StateStack::default();
        stack.save();
        stack.concat(Affine::translate((3.0, 4.0)));
        stack.set_global_alpha(0.5);
        assert_eq!(stack.depth(), 1);

        assert!(stack.restore());
        assert_eq!(stack.current().transform, Affine::IDENTITY);
        assert_eq!(stack.current().global_alpha, 1.0);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn unmatched_restore_is_ignored() {
        let mut stack = StateStack::default();
        stack.concat(Affine::scale(2.0));
        assert!(!stack.restore());
        assert_eq!(stack.current().transform, Affine::scale(2.0));
    }

    #[test]
    fn global_alpha_is_clamped() {
        let mut stack = StateStack::default();
        stack.set_global_alpha(3.0);
        assert_eq!(stack.current().global_alpha, 1.0);
        stack.set_global_alpha(-1.0);
        assert_eq!(stack.current().global_alpha, 0.0);
        stack.set_global_alpha(f64::NAN);
        assert_eq!(stack.current().global_alpha, 1.0);
    }
}
