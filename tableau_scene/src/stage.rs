// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The stage: node arena, structure, identity and staging.

use hashbrown::{HashMap, HashSet};
use kurbo::{Point, Vec2};
use smallvec::SmallVec;
use tableau_surface::{RasterSurface, Surface};

use crate::attrs::{NodeAttrs, NodeConfig};
use crate::node::{Node, NodeKind};
use crate::registry::Registry;
use crate::shape::{ShapeConfig, ShapeNode};
use crate::types::NodeId;
use crate::SceneError;

/// A short list of node ids, typically an ancestor chain.
pub type NodeChain = SmallVec<[NodeId; 8]>;

/// The two surfaces owned by a layer.
#[derive(Debug)]
pub struct LayerCanvas<S> {
    /// Visible surface.
    pub scene: S,
    /// Hit-test surface, same size as `scene`.
    pub hit: S,
}

impl<S: Surface> LayerCanvas<S> {
    fn new(width: u32, height: u32) -> Self {
        Self {
            scene: S::with_size(width, height),
            hit: S::with_size(width, height),
        }
    }
}

/// Root of a scene: owns every node it created, the layer surfaces, the id and
/// name registries and the staging set.
///
/// Nodes are addressed by [`NodeId`]. A node is either attached (a descendant of
/// [`Stage::root`]) or staged (created, or removed, and not currently attached).
/// Only attached nodes appear in the registries used by selectors.
///
/// The surface type is a parameter so tests can swap in a recording surface;
/// [`Stage::new`] uses [`RasterSurface`].
#[derive(Debug)]
pub struct Stage<S = RasterSurface> {
    pub(crate) nodes: HashMap<NodeId, Node>,
    pub(crate) root: NodeId,
    next_id: u32,
    pub(crate) registry: Registry,
    pub(crate) staged: HashSet<NodeId>,
    pub(crate) canvases: HashMap<NodeId, LayerCanvas<S>>,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl Stage<RasterSurface> {
    /// Create a stage whose layers rasterize into CPU pixel buffers.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_size(width, height)
    }
}

impl<S: Surface> Stage<S> {
    /// Create an empty stage of the given pixel size.
    pub fn with_size(width: u32, height: u32) -> Self {
        let root = NodeId(1);
        let mut nodes = HashMap::new();
        nodes.insert(root, Node::new(root, NodeKind::Stage));
        Self {
            nodes,
            root,
            next_id: 2,
            registry: Registry::default(),
            staged: HashSet::new(),
            canvases: HashMap::new(),
            width,
            height,
        }
    }

    /// The stage root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Resize the stage and every layer's surfaces.
    ///
    /// Surface contents are discarded; draw again to repaint.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        for canvas in self.canvases.values_mut() {
            *canvas = LayerCanvas::new(width, height);
        }
        tracing::debug!(width, height, "stage resized");
    }

    /// Number of live nodes, the root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Look up a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Whether the node exists (it may be staged).
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub(crate) fn node_ref(&self, id: NodeId) -> Result<&Node, SceneError> {
        self.nodes.get(&id).ok_or(SceneError::UnknownNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        self.nodes.get_mut(&id).ok_or(SceneError::UnknownNode(id))
    }

    // --- creation -------------------------------------------------------

    fn insert(&mut self, kind: NodeKind, config: &NodeConfig) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        let mut node = Node::new(id, kind);
        node.attrs.apply(config);
        node.user_id.clone_from(&config.id);
        node.name.clone_from(&config.name);
        if matches!(node.kind, NodeKind::Layer) {
            self.canvases
                .insert(id, LayerCanvas::new(self.width, self.height));
        }
        self.nodes.insert(id, node);
        self.staged.insert(id);
        tracing::trace!(node = ?id, "node created");
        id
    }

    /// Create a staged layer.
    pub fn create_layer(&mut self, config: &NodeConfig) -> NodeId {
        self.insert(NodeKind::Layer, config)
    }

    /// Create a staged group.
    pub fn create_group(&mut self, config: &NodeConfig) -> NodeId {
        self.insert(NodeKind::Group, config)
    }

    /// Create a staged shape.
    pub fn create_shape(&mut self, shape: ShapeNode, config: &NodeConfig) -> NodeId {
        self.insert(NodeKind::Shape(shape), config)
    }

    /// Create a staged built-in shape from its type tag and configuration.
    pub fn create_shape_from_config(
        &mut self,
        type_name: &str,
        config: &ShapeConfig,
    ) -> Result<NodeId, SceneError> {
        let shape = ShapeNode::from_config(type_name, config)?;
        Ok(self.create_shape(shape, &config.node))
    }

    /// Create a layer and attach it on top of the existing ones.
    pub fn add_layer(&mut self, config: &NodeConfig) -> Result<NodeId, SceneError> {
        let layer = self.create_layer(config);
        if let Err(err) = self.add(self.root, layer) {
            self.discard(layer);
            return Err(err);
        }
        Ok(layer)
    }

    /// Create a group and append it to `parent`.
    pub fn add_group(&mut self, parent: NodeId, config: &NodeConfig) -> Result<NodeId, SceneError> {
        let group = self.create_group(config);
        if let Err(err) = self.add(parent, group) {
            self.discard(group);
            return Err(err);
        }
        Ok(group)
    }

    /// Create a shape and append it to `parent`.
    pub fn add_shape(
        &mut self,
        parent: NodeId,
        shape: ShapeNode,
        config: &NodeConfig,
    ) -> Result<NodeId, SceneError> {
        let id = self.create_shape(shape, config);
        if let Err(err) = self.add(parent, id) {
            self.discard(id);
            return Err(err);
        }
        Ok(id)
    }

    fn discard(&mut self, id: NodeId) {
        self.nodes.remove(&id);
        self.staged.remove(&id);
        self.canvases.remove(&id);
    }

    // --- structure queries -----------------------------------------------

    /// Parent of a node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    /// Children of a node, back to front. Empty for unknown nodes.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    /// Position of a node among its siblings.
    pub fn index(&self, id: NodeId) -> Option<usize> {
        self.nodes.get(&id).map(|n| n.index)
    }

    /// Layers attached to the stage, bottom to top.
    pub fn layers(&self) -> &[NodeId] {
        self.children(self.root)
    }

    /// Ancestors of a node, nearest first, ending at the topmost one.
    pub fn ancestors(&self, id: NodeId) -> NodeChain {
        let mut out = NodeChain::new();
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            out.push(p);
            cur = self.parent(p);
        }
        out
    }

    /// The node followed by its ancestors: the bubbling path.
    pub fn path_to_root(&self, id: NodeId) -> NodeChain {
        if !self.contains(id) {
            return NodeChain::new();
        }
        let mut out = self.ancestors(id);
        out.insert(0, id);
        out
    }

    /// Topmost ancestor first, ending at the node itself.
    pub(crate) fn chain_from_top(&self, id: NodeId) -> NodeChain {
        let mut chain = self.path_to_root(id);
        chain.reverse();
        chain
    }

    /// Whether `id` is a strict descendant of `ancestor`.
    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.parent(p);
        }
        false
    }

    /// Whether the node is the root or one of its descendants.
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root || self.is_descendant_of(id, self.root)
    }

    /// Whether the node is currently staged.
    pub fn is_staged(&self, id: NodeId) -> bool {
        self.staged.contains(&id)
    }

    /// Nodes that exist but are not attached, in creation order.
    pub fn staged(&self) -> Vec<NodeId> {
        let mut out: Vec<_> = self.staged.iter().copied().collect();
        out.sort_unstable();
        out
    }

    /// The layer containing a node (the node itself if it is a layer).
    pub fn layer_of(&self, id: NodeId) -> Option<NodeId> {
        self.path_to_root(id)
            .into_iter()
            .find(|n| matches!(self.nodes.get(n).map(|n| &n.kind), Some(NodeKind::Layer)))
    }

    /// The node and all its descendants, in pre-order.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    // --- structure mutation ----------------------------------------------

    /// Append `child` to `parent`, moving it from any previous parent.
    ///
    /// Attaching a staged subtree registers it; a user id already taken by an
    /// attached node is rejected with [`SceneError::DuplicateId`] and nothing changes.
    pub fn add(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        if child == self.root {
            return Err(SceneError::RootImmutable);
        }
        let child_type = self.node_ref(child)?.node_type();
        self.node_ref(parent)?
            .kind
            .accepts(child_type)
            .map_err(|reason| SceneError::InvalidParent {
                parent,
                child,
                reason,
            })?;
        if parent == child || self.is_descendant_of(parent, child) {
            return Err(SceneError::InvalidParent {
                parent,
                child,
                reason: "a node cannot be placed inside itself",
            });
        }

        let was_attached = self.is_attached(child);
        let will_attach = self.is_attached(parent);
        if will_attach && !was_attached {
            self.check_ids(child)?;
        }

        self.unlink(child);
        let index = match self.nodes.get_mut(&parent) {
            Some(p) => {
                p.children.push(child);
                p.children.len() - 1
            }
            None => return Err(SceneError::UnknownNode(parent)),
        };
        if let Some(c) = self.nodes.get_mut(&child) {
            c.parent = Some(parent);
            c.index = index;
        }

        match (was_attached, will_attach) {
            (false, true) => self.attach_subtree(child),
            (true, false) => self.detach_subtree(child),
            _ => {}
        }
        tracing::trace!(node = ?child, parent = ?parent, index, "node added");
        Ok(())
    }

    /// Reparent a node; same as [`Stage::add`].
    pub fn move_to(&mut self, id: NodeId, new_parent: NodeId) -> Result<(), SceneError> {
        self.add(new_parent, id)
    }

    /// Detach a node from its parent, keeping it (and its subtree) staged for reuse.
    pub fn remove(&mut self, id: NodeId) -> Result<(), SceneError> {
        if id == self.root {
            return Err(SceneError::RootImmutable);
        }
        if self.node_ref(id)?.parent.is_none() {
            return Ok(());
        }
        let was_attached = self.is_attached(id);
        self.unlink(id);
        if was_attached {
            self.detach_subtree(id);
        }
        tracing::trace!(node = ?id, "node removed");
        Ok(())
    }

    /// Remove a node and delete its whole subtree.
    pub fn destroy(&mut self, id: NodeId) -> Result<(), SceneError> {
        if id == self.root {
            return Err(SceneError::RootImmutable);
        }
        self.node_ref(id)?;
        let was_attached = self.is_attached(id);
        let doomed = self.subtree(id);
        self.unlink(id);
        for n in doomed {
            if let Some(node) = self.nodes.remove(&n) {
                if was_attached {
                    self.registry.unregister(&node);
                }
            }
            self.staged.remove(&n);
            self.canvases.remove(&n);
        }
        tracing::trace!(node = ?id, "node destroyed");
        Ok(())
    }

    /// Destroy every child of a node.
    pub fn destroy_children(&mut self, id: NodeId) -> Result<(), SceneError> {
        let children = self.node_ref(id)?.children.clone();
        for child in children {
            self.destroy(child)?;
        }
        Ok(())
    }

    fn unlink(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.retain(|c| *c != id);
        }
        if let Some(n) = self.nodes.get_mut(&id) {
            n.parent = None;
            n.index = 0;
        }
        self.reindex(parent);
    }

    fn reindex(&mut self, parent: NodeId) {
        let Some(p) = self.nodes.get_mut(&parent) else {
            return;
        };
        let children = core::mem::take(&mut p.children);
        for (i, c) in children.iter().enumerate() {
            if let Some(n) = self.nodes.get_mut(c) {
                n.index = i;
            }
        }
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children = children;
        }
    }

    fn check_ids(&self, subtree: NodeId) -> Result<(), SceneError> {
        let mut seen: HashMap<&str, NodeId> = HashMap::new();
        for n in self.subtree(subtree) {
            let Some(id) = self.nodes.get(&n).and_then(|n| n.user_id.as_deref()) else {
                continue;
            };
            let existing = self
                .registry
                .by_id(id)
                .or_else(|| seen.get(id).copied());
            if let Some(existing) = existing {
                tracing::warn!(node = ?n, ?existing, id, "duplicate id rejected");
                return Err(SceneError::DuplicateId {
                    id: id.to_owned(),
                    existing,
                });
            }
            seen.insert(id, n);
        }
        Ok(())
    }

    fn attach_subtree(&mut self, id: NodeId) {
        for n in self.subtree(id) {
            self.staged.remove(&n);
            if let Some(node) = self.nodes.get(&n) {
                self.registry.register(node);
            }
        }
    }

    fn detach_subtree(&mut self, id: NodeId) {
        for n in self.subtree(id) {
            self.staged.insert(n);
            if let Some(node) = self.nodes.get(&n) {
                self.registry.unregister(node);
            }
        }
    }

    // --- z-order -----------------------------------------------------------

    /// Move a node to `z` among its siblings (clamped), shifting the others.
    pub fn set_z_index(&mut self, id: NodeId, z: usize) -> Result<(), SceneError> {
        let node = self.node_ref(id)?;
        let Some(parent) = node.parent else {
            tracing::warn!(node = ?id, "node has no parent; z-index ignored");
            return Ok(());
        };
        let from = node.index;
        if let Some(p) = self.nodes.get_mut(&parent) {
            let to = z.min(p.children.len().saturating_sub(1));
            if to == from {
                return Ok(());
            }
            let moved = p.children.remove(from);
            p.children.insert(to, moved);
        }
        self.reindex(parent);
        Ok(())
    }

    /// Draw a node above all its siblings.
    pub fn move_to_top(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.set_z_index(id, usize::MAX)
    }

    /// Draw a node below all its siblings.
    pub fn move_to_bottom(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.set_z_index(id, 0)
    }

    /// Swap a node with the sibling above it.
    pub fn move_up(&mut self, id: NodeId) -> Result<(), SceneError> {
        let index = self.node_ref(id)?.index;
        self.set_z_index(id, index.saturating_add(1))
    }

    /// Swap a node with the sibling below it.
    pub fn move_down(&mut self, id: NodeId) -> Result<(), SceneError> {
        let index = self.node_ref(id)?.index;
        self.set_z_index(id, index.saturating_sub(1))
    }

    // --- identity ------------------------------------------------------------

    /// Set or clear a node's user id.
    ///
    /// Fails with [`SceneError::DuplicateId`] when another attached node holds it.
    /// The registries only index descendants of the root, so the root's own id
    /// is stored but never registered, and selectors never return the root.
    pub fn set_user_id(&mut self, id: NodeId, user_id: Option<String>) -> Result<(), SceneError> {
        let registered = id != self.root && self.is_attached(id);
        let old = self.node_ref(id)?.user_id.clone();
        if registered
            && let Some(new) = user_id.as_deref()
            && let Some(existing) = self.registry.by_id(new)
            && existing != id
        {
            tracing::warn!(node = ?id, ?existing, id = new, "duplicate id rejected");
            return Err(SceneError::DuplicateId {
                id: new.to_owned(),
                existing,
            });
        }
        if registered {
            if let Some(old) = &old {
                self.registry.remove_id(id, old);
            }
            if let Some(new) = &user_id {
                self.registry.insert_id(id, new);
            }
        }
        self.node_mut(id)?.user_id = user_id;
        Ok(())
    }

    /// Set or clear a node's name (whitespace separates several names).
    pub fn set_name(&mut self, id: NodeId, name: Option<String>) -> Result<(), SceneError> {
        let registered = id != self.root && self.is_attached(id);
        let old = self.node_ref(id)?.name.clone();
        if registered {
            if let Some(old) = &old {
                self.registry.remove_names(id, old);
            }
            if let Some(new) = &name {
                self.registry.insert_names(id, new);
            }
        }
        self.node_mut(id)?.name = name;
        Ok(())
    }

    // --- attributes ----------------------------------------------------------

    /// A node's attributes.
    pub fn attrs(&self, id: NodeId) -> Option<&NodeAttrs> {
        self.nodes.get(&id).map(|n| &n.attrs)
    }

    /// Mutable access to a node's attributes.
    ///
    /// Changes take effect on the next draw of the node's layer.
    pub fn attrs_mut(&mut self, id: NodeId) -> Option<&mut NodeAttrs> {
        self.nodes.get_mut(&id).map(|n| &mut n.attrs)
    }

    /// A shape node's geometry and style.
    pub fn shape(&self, id: NodeId) -> Option<&ShapeNode> {
        self.nodes.get(&id).and_then(Node::shape)
    }

    /// Mutable access to a shape node's geometry and style.
    pub fn shape_mut(&mut self, id: NodeId) -> Option<&mut ShapeNode> {
        match self.nodes.get_mut(&id).map(|n| &mut n.kind) {
            Some(NodeKind::Shape(shape)) => Some(shape),
            _ => None,
        }
    }

    /// Apply the keys present in `config`, identity included.
    pub fn set_attrs(&mut self, id: NodeId, config: &NodeConfig) -> Result<(), SceneError> {
        if let Some(user_id) = &config.id {
            self.set_user_id(id, Some(user_id.clone()))?;
        }
        if let Some(name) = &config.name {
            self.set_name(id, Some(name.clone()))?;
        }
        self.node_mut(id)?.attrs.apply(config);
        Ok(())
    }

    /// Apply node and shape keys. Shape keys are ignored for non-shape nodes.
    pub fn set_shape_attrs(&mut self, id: NodeId, config: &ShapeConfig) -> Result<(), SceneError> {
        if let Some(shape) = self.shape_mut(id) {
            let mut updated = shape.clone();
            updated.apply(config)?;
            *shape = updated;
        }
        self.set_attrs(id, &config.node)
    }

    fn with_attrs(&mut self, id: NodeId, f: impl FnOnce(&mut NodeAttrs)) -> Result<(), SceneError> {
        f(&mut self.node_mut(id)?.attrs);
        Ok(())
    }

    /// Position relative to the parent.
    pub fn position(&self, id: NodeId) -> Option<Point> {
        self.attrs(id).map(|a| a.position)
    }

    /// Set the position relative to the parent.
    pub fn set_position(&mut self, id: NodeId, position: Point) -> Result<(), SceneError> {
        self.with_attrs(id, |a| a.position = position)
    }

    /// Shift the position.
    pub fn move_by(&mut self, id: NodeId, delta: Vec2) -> Result<(), SceneError> {
        self.with_attrs(id, |a| a.move_by(delta))
    }

    /// Add to the rotation, in radians.
    pub fn rotate(&mut self, id: NodeId, radians: f64) -> Result<(), SceneError> {
        self.with_attrs(id, |a| a.rotate(radians))
    }

    /// Add to the rotation, in degrees.
    pub fn rotate_deg(&mut self, id: NodeId, degrees: f64) -> Result<(), SceneError> {
        self.with_attrs(id, |a| a.rotate(degrees.to_radians()))
    }

    /// Make a node visible.
    pub fn show(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.with_attrs(id, |a| a.set_visible(true))
    }

    /// Hide a node and its subtree.
    pub fn hide(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.with_attrs(id, |a| a.set_visible(false))
    }

    // --- surfaces ------------------------------------------------------------

    /// The surfaces of a layer.
    pub fn canvas(&self, layer: NodeId) -> Option<&LayerCanvas<S>> {
        self.canvases.get(&layer)
    }

    /// Mutable access to the surfaces of a layer.
    pub fn canvas_mut(&mut self, layer: NodeId) -> Option<&mut LayerCanvas<S>> {
        self.canvases.get_mut(&layer)
    }
}
