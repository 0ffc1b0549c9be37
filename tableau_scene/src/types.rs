// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the scene graph: node identifiers, flags, and drag settings.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Identifier for a node in a [`Stage`](crate::Stage).
///
/// Ids are assigned monotonically by the stage that creates the node and are
/// never reused while that stage lives, so a stale `NodeId` can never alias a
/// newer node. The stage root is always `NodeId(1)`.
///
/// The integer value doubles as the hit-test key: it is encoded into the
/// flat color a shape is painted with on its layer's hit surface.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The raw integer value.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags::bitflags! {
    /// Node flags controlling visibility, input and dragging.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node is drawn. An invisible container hides its whole subtree.
        const VISIBLE   = 0b0000_0001;
        /// Node participates in hit testing.
        const LISTENING = 0b0000_0010;
        /// Node can be dragged by the pointer.
        const DRAGGABLE = 0b0000_0100;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::LISTENING
    }
}

/// The structural role of a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// Tree root bound to the drawing surfaces.
    Stage,
    /// Container owning a scene surface and a hit surface.
    Layer,
    /// Plain container.
    Group,
    /// Drawable leaf.
    Shape,
}

impl NodeType {
    /// Type tag used by selectors and serialization.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stage => "Stage",
            Self::Layer => "Layer",
            Self::Group => "Group",
            Self::Shape => "Shape",
        }
    }

    /// Whether nodes of this type may own children.
    pub const fn is_container(self) -> bool {
        !matches!(self, Self::Shape)
    }
}

/// Axis restriction applied while dragging.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragConstraint {
    /// Free movement.
    #[default]
    None,
    /// Only x changes; y stays where the drag started.
    Horizontal,
    /// Only y changes; x stays where the drag started.
    Vertical,
}

/// Rectangle the absolute position of a dragged node is clamped into.
///
/// Each side is optional; missing sides do not clamp.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragBounds {
    /// Minimum y.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
    /// Maximum x.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<f64>,
    /// Maximum y.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<f64>,
    /// Minimum x.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
}

impl DragBounds {
    /// Bounds with all four sides set.
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top: Some(top),
            right: Some(right),
            bottom: Some(bottom),
            left: Some(left),
        }
    }

    /// Clamp a point into the bounds.
    pub fn clamp(&self, mut p: kurbo::Point) -> kurbo::Point {
        if let Some(left) = self.left {
            p.x = p.x.max(left);
        }
        if let Some(right) = self.right {
            p.x = p.x.min(right);
        }
        if let Some(top) = self.top {
            p.y = p.y.max(top);
        }
        if let Some(bottom) = self.bottom {
            p.y = p.y.min(bottom);
        }
        p
    }
}
