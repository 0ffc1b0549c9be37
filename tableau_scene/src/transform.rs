// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Absolute transform, position, opacity and effective flags.

use kurbo::{Affine, Point, Vec2};
use tableau_surface::Surface;

use crate::node::NodeKind;
use crate::{NodeId, SceneError, Stage};

/// Determinants smaller than this make a parent transform non-invertible.
const MIN_DETERMINANT: f64 = 1e-12;

impl<S: Surface> Stage<S> {
    /// Transform from a node's local space to stage pixels, as used for drawing.
    ///
    /// Composes every local transform from the topmost ancestor down to the
    /// node, then the stage's own scale. The stage position does not
    /// contribute.
    pub fn absolute_transform(&self, id: NodeId) -> Option<Affine> {
        let chain = self.chain_transform(id)?;
        let root = self.nodes.get(&self.root)?;
        Some(if root.attrs.scale != Vec2::new(1.0, 1.0) {
            chain * Affine::scale_non_uniform(root.attrs.scale.x, root.attrs.scale.y)
        } else {
            chain
        })
    }

    /// Local transforms from the topmost ancestor down to the node, without
    /// the stage scale.
    fn chain_transform(&self, id: NodeId) -> Option<Affine> {
        if !self.contains(id) {
            return None;
        }
        let mut xf = Affine::IDENTITY;
        for n in self.chain_from_top(id) {
            let node = self.nodes.get(&n)?;
            if !matches!(node.kind, NodeKind::Stage) {
                xf = xf * node.attrs.local_transform();
            }
        }
        Some(xf)
    }

    fn parent_transform(&self, id: NodeId) -> Affine {
        self.parent(id)
            .and_then(|p| self.chain_transform(p))
            .unwrap_or(Affine::IDENTITY)
    }

    /// A node's position in stage pixels: where its local origin is drawn.
    ///
    /// The stage scale is applied after the whole chain, so it scales geometry
    /// about each shape's origin and never moves the origin itself.
    pub fn absolute_position(&self, id: NodeId) -> Option<Point> {
        let position = self.attrs(id)?.position;
        Some(self.parent_transform(id) * position)
    }

    /// Move a node so its position lands on `point` in stage pixels.
    ///
    /// Under a degenerate parent transform (for example a zero scale) the node is
    /// left where it is.
    pub fn set_absolute_position(&mut self, id: NodeId, point: Point) -> Result<(), SceneError> {
        self.node_ref(id)?;
        let parent = self.parent_transform(id);
        if parent.determinant().abs() < MIN_DETERMINANT {
            tracing::warn!(node = ?id, "parent transform is not invertible; position unchanged");
            return Ok(());
        }
        self.node_mut(id)?.attrs.position = parent.inverse() * point;
        Ok(())
    }

    /// Product of the opacities from the topmost ancestor down to the node.
    pub fn absolute_opacity(&self, id: NodeId) -> Option<f64> {
        if !self.contains(id) {
            return None;
        }
        Some(
            self.path_to_root(id)
                .iter()
                .filter_map(|n| self.attrs(*n))
                .map(|a| a.opacity)
                .product(),
        )
    }

    /// Whether the node and every ancestor are visible.
    pub fn is_visible(&self, id: NodeId) -> bool {
        let path = self.path_to_root(id);
        !path.is_empty()
            && path
                .iter()
                .all(|n| self.attrs(*n).is_some_and(|a| a.visible()))
    }

    /// Whether the node and every ancestor listen for input.
    pub fn is_listening(&self, id: NodeId) -> bool {
        let path = self.path_to_root(id);
        !path.is_empty()
            && path
                .iter()
                .all(|n| self.attrs(*n).is_some_and(|a| a.listening()))
    }
}
