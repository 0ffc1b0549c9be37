// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::attrs::NodeAttrs;
use crate::shape::ShapeNode;
use crate::types::{NodeId, NodeType};

/// What a node is, with the data only that role carries.
#[derive(Clone, Debug)]
pub enum NodeKind {
    /// The stage root.
    Stage,
    /// A layer; its surfaces live in the stage.
    Layer,
    /// A plain container.
    Group,
    /// A drawable leaf.
    Shape(ShapeNode),
}

impl NodeKind {
    /// The structural role.
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Stage => NodeType::Stage,
            Self::Layer => NodeType::Layer,
            Self::Group => NodeType::Group,
            Self::Shape(_) => NodeType::Shape,
        }
    }

    /// Whether `child` may be placed directly under a node of this kind.
    pub(crate) fn accepts(&self, child: NodeType) -> Result<(), &'static str> {
        match (self.node_type(), child) {
            (NodeType::Stage, NodeType::Layer) => Ok(()),
            (NodeType::Stage, _) => Err("a stage only holds layers"),
            (NodeType::Layer | NodeType::Group, NodeType::Group | NodeType::Shape) => Ok(()),
            (NodeType::Layer | NodeType::Group, _) => {
                Err("layers and groups only hold groups and shapes")
            }
            (NodeType::Shape, _) => Err("shapes cannot have children"),
        }
    }
}

/// A node in a stage's arena.
///
/// Nodes are only reachable through their [`Stage`](crate::Stage); structural
/// fields are maintained by it and exposed read-only here.
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) kind: NodeKind,
    pub(crate) attrs: NodeAttrs,
    pub(crate) user_id: Option<String>,
    pub(crate) name: Option<String>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) index: usize,
}

impl Node {
    pub(crate) fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            attrs: NodeAttrs::default(),
            user_id: None,
            name: None,
            parent: None,
            children: Vec::new(),
            index: 0,
        }
    }

    /// Stage-assigned id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Structural role.
    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    /// Role-specific data.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Shape data, for shape nodes.
    pub fn shape(&self) -> Option<&ShapeNode> {
        match &self.kind {
            NodeKind::Shape(shape) => Some(shape),
            _ => None,
        }
    }

    /// The type tag selectors match against: the shape type for shapes, the
    /// node type otherwise.
    pub fn type_name(&self) -> &str {
        match &self.kind {
            NodeKind::Shape(shape) => shape.kind.type_name(),
            kind => kind.node_type().as_str(),
        }
    }

    /// Attributes.
    pub fn attrs(&self) -> &NodeAttrs {
        &self.attrs
    }

    /// User id, if any.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// User name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether `name` is one of this node's whitespace-separated names.
    pub fn has_name(&self, name: &str) -> bool {
        self.name
            .as_deref()
            .is_some_and(|n| n.split_whitespace().any(|part| part == name))
    }

    /// Parent, when attached to a container.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children, back to front.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Position in the parent's child list; zero when there is no parent.
    pub fn index(&self) -> usize {
        self.index
    }
}
