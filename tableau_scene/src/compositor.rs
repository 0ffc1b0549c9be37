// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer redraws: the transform compositor.
//!
//! Each visible shape is drawn with its whole ancestor chain replayed on the
//! surface: one `save` per chain node followed by that node's translate,
//! pivot, rotate and scale, then the global alpha for the accumulated opacity.
//! After the shape's draw procedure the surface is restored to the depth it
//! had before, so nothing leaks into the next shape.

use kurbo::{Point, Vec2};
use peniko::Color;
use smallvec::SmallVec;
use tableau_surface::Surface;

use crate::hit::hit_color;
use crate::node::{Node, NodeKind};
use crate::shape::{DrawPass, ShapeNode};
use crate::stage::{LayerCanvas, NodeChain};
use crate::{NodeId, SceneError, Stage};

impl<S: Surface> Stage<S> {
    /// Redraw every attached layer.
    pub fn draw(&mut self) {
        let layers: SmallVec<[NodeId; 4]> = self.layers().iter().copied().collect();
        for layer in layers {
            self.render_layer(layer);
        }
    }

    /// Clear and repaint one layer's scene and hit surfaces.
    ///
    /// A staged layer is not drawn.
    pub fn draw_layer(&mut self, layer: NodeId) -> Result<(), SceneError> {
        if !matches!(self.node_ref(layer)?.kind, NodeKind::Layer) {
            return Err(SceneError::NotALayer(layer));
        }
        if !self.is_attached(layer) {
            tracing::debug!(node = ?layer, "staged layer not drawn");
            return Ok(());
        }
        self.render_layer(layer);
        Ok(())
    }

    /// Redraw whatever displays `id`: its layer, or every layer for the root.
    ///
    /// Staged nodes have nothing to redraw.
    pub fn draw_node(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.node_ref(id)?;
        for layer in self.redraw_layers(id) {
            self.render_layer(layer);
        }
        Ok(())
    }

    /// The layers that [`Stage::draw_node`] would repaint for `id`.
    pub fn redraw_layers(&self, id: NodeId) -> SmallVec<[NodeId; 4]> {
        if id == self.root {
            self.layers().iter().copied().collect()
        } else if self.is_attached(id) {
            self.layer_of(id).into_iter().collect()
        } else {
            SmallVec::new()
        }
    }

    /// Clear both surfaces of a layer without repainting.
    pub fn clear_layer(&mut self, layer: NodeId) -> Result<(), SceneError> {
        let canvas = self
            .canvases
            .get_mut(&layer)
            .ok_or(SceneError::NotALayer(layer))?;
        canvas.scene.clear();
        canvas.hit.clear();
        Ok(())
    }

    fn render_layer(&mut self, layer: NodeId) {
        let Some(mut canvas) = self.canvases.remove(&layer) else {
            tracing::warn!(node = ?layer, "layer has no surfaces");
            return;
        };
        canvas.scene.clear();
        canvas.hit.clear();
        if canvas.scene.is_empty() {
            tracing::trace!(node = ?layer, "zero-sized layer skipped");
        } else if self.is_visible(layer) {
            let listening = self.is_listening(self.root);
            let mut chain = NodeChain::new();
            self.walk(layer, listening, &mut chain, &mut canvas);
            tracing::trace!(node = ?layer, "layer drawn");
        }
        self.canvases.insert(layer, canvas);
    }

    fn walk(
        &self,
        id: NodeId,
        listening: bool,
        chain: &mut NodeChain,
        canvas: &mut LayerCanvas<S>,
    ) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        if !node.attrs.visible() {
            return;
        }
        let listening = listening && node.attrs.listening();
        chain.push(id);
        match &node.kind {
            NodeKind::Shape(shape) => self.draw_shape(node, shape, listening, chain, canvas),
            _ => {
                for child in &node.children {
                    self.walk(*child, listening, chain, canvas);
                }
            }
        }
        chain.pop();
    }

    fn draw_shape(
        &self,
        node: &Node,
        shape: &ShapeNode,
        listening: bool,
        chain: &[NodeId],
        canvas: &mut LayerCanvas<S>,
    ) {
        self.compose(&mut canvas.scene, chain, shape, DrawPass::Scene, Color::TRANSPARENT);
        if !listening {
            return;
        }
        match hit_color(node.id) {
            Some(color) => self.compose(&mut canvas.hit, chain, shape, DrawPass::Hit, color),
            None => tracing::warn!(
                node = ?node.id,
                "hit color space exhausted; shape is not hit-testable"
            ),
        }
    }

    fn compose(
        &self,
        surface: &mut S,
        chain: &[NodeId],
        shape: &ShapeNode,
        pass: DrawPass,
        hit: Color,
    ) {
        let base = surface.save_depth();
        let Some(root) = self.nodes.get(&self.root) else {
            return;
        };
        let mut opacity = root.attrs.opacity;
        let stage_scale = root.attrs.scale;

        for id in chain {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            let attrs = &node.attrs;
            surface.save();
            if attrs.position != Point::ORIGIN {
                surface.translate(attrs.position.x, attrs.position.y);
            }
            if attrs.offset != Vec2::ZERO {
                surface.translate(attrs.offset.x, attrs.offset.y);
            }
            if attrs.rotation != 0.0 {
                surface.rotate(attrs.rotation);
            }
            if attrs.scale != Vec2::new(1.0, 1.0) {
                surface.scale(attrs.scale.x, attrs.scale.y);
            }
            if attrs.offset != Vec2::ZERO {
                surface.translate(-attrs.offset.x, -attrs.offset.y);
            }
            opacity *= attrs.opacity;
            if pass == DrawPass::Scene && opacity != 1.0 {
                surface.set_global_alpha(opacity);
            }
        }
        if stage_scale != Vec2::new(1.0, 1.0) {
            surface.save();
            surface.scale(stage_scale.x, stage_scale.y);
        }

        if let Err(err) = shape.draw(surface, pass, hit) {
            tracing::warn!(node = ?chain.last(), ?pass, error = %err, "shape draw failed");
        }
        while surface.save_depth() > base {
            surface.restore();
        }
    }
}
