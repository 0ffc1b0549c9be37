// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::NodeId;

/// Errors produced by structural operations, configuration and deserialization.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// The node does not exist in this stage (never created, or destroyed).
    #[error("node {0} not found")]
    UnknownNode(NodeId),
    /// A user id is already taken by another attached node.
    #[error("id `{id}` is already used by node {existing}")]
    DuplicateId {
        /// The conflicting user id.
        id: String,
        /// The node currently holding it.
        existing: NodeId,
    },
    /// The requested parent cannot hold the child.
    #[error("{child} cannot be placed under {parent}: {reason}")]
    InvalidParent {
        /// Intended parent.
        parent: NodeId,
        /// Intended child.
        child: NodeId,
        /// Why the placement was refused.
        reason: &'static str,
    },
    /// The operation needs a layer.
    #[error("node {0} is not a layer")]
    NotALayer(NodeId),
    /// The stage root cannot be removed, destroyed or reparented.
    #[error("the stage root cannot be detached or destroyed")]
    RootImmutable,
    /// Deserialization met a node or shape type it does not know how to build.
    #[error("unknown node type `{0}`")]
    UnknownNodeType(String),
    /// Deserialization input does not have the expected shape.
    #[error("malformed node object: {0}")]
    MalformedObject(&'static str),
    /// A configuration object failed to parse.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
    /// A color string could not be parsed.
    #[error("invalid color `{0}`")]
    InvalidColor(String),
}

/// Failure reported by a shape's draw procedure.
///
/// Draw errors never abort a layer redraw; the compositor logs them and moves on
/// to the next shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DrawError {
    /// The shape lacks the geometry it needs (for example a line with one point).
    #[error("shape has no drawable geometry")]
    MissingGeometry,
    /// Any other failure, with a description.
    #[error("draw failed: {0}")]
    Failed(String),
}
