// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Color-indexed hit testing.
//!
//! Every listening shape is painted a second time on its layer's hit surface
//! in a flat, fully opaque color that encodes its [`NodeId`] as 24-bit RGB.
//! A point query reads one pixel back and decodes it. Queries never redraw, so
//! results reflect the last draw of each layer.

use kurbo::Point;
use peniko::Color;
use tableau_surface::Surface;

use crate::node::NodeKind;
use crate::{NodeId, Stage};

/// Largest node id that has a hit color.
pub const MAX_HIT_ID: u32 = 0x00FF_FFFF;

/// The hit color of a node, or `None` when the id does not fit in 24 bits.
pub fn hit_color(id: NodeId) -> Option<Color> {
    let raw = id.get();
    if raw == 0 || raw > MAX_HIT_ID {
        return None;
    }
    let [_, r, g, b] = raw.to_be_bytes();
    Some(Color::from_rgba8(r, g, b, 255))
}

/// Decode a hit-surface pixel. Transparent or partially covered pixels are
/// background.
pub fn decode_hit_color(pixel: [u8; 4]) -> Option<NodeId> {
    let [r, g, b, a] = pixel;
    if a != 255 {
        return None;
    }
    let raw = u32::from_be_bytes([0, r, g, b]);
    (raw != 0).then_some(NodeId(raw))
}

impl<S: Surface> Stage<S> {
    /// The topmost shape under `point` (stage pixels), checking layers from the
    /// top down. Hidden and non-listening layers are skipped.
    pub fn intersection(&self, point: Point) -> Option<NodeId> {
        self.layers()
            .iter()
            .rev()
            .filter(|layer| self.is_visible(**layer) && self.is_listening(**layer))
            .find_map(|layer| self.layer_intersection(*layer, point))
    }

    /// The shape under `point` on one layer's hit surface.
    ///
    /// Returns `None` for background, for points outside the surface, and for
    /// colors whose node no longer exists or is no longer attached.
    pub fn layer_intersection(&self, layer: NodeId, point: Point) -> Option<NodeId> {
        let canvas = self.canvases.get(&layer)?;
        if !(point.x >= 0.0 && point.y >= 0.0) || !point.is_finite() {
            return None;
        }
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "non-negative finite coordinates; out-of-range reads return None"
        )]
        let (x, y) = (point.x.floor() as u32, point.y.floor() as u32);
        let id = decode_hit_color(canvas.hit.pixel(x, y)?)?;
        let node = self.nodes.get(&id)?;
        if !matches!(node.kind, NodeKind::Shape(_)) || !self.is_attached(id) {
            tracing::trace!(node = ?id, "stale hit color ignored");
            return None;
        }
        Some(id)
    }
}
