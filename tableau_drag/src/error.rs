// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use tableau_scene::NodeId;

/// Why a drag could not start.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DragError {
    /// Another drag holds the controller and the policy is to reject.
    #[error("node {0} is already being dragged")]
    AlreadyDragging(NodeId),
    /// The node does not have the draggable flag.
    #[error("node {0} is not draggable")]
    NotDraggable(NodeId),
    /// The node or one of its ancestors ignores input.
    #[error("node {0} is not listening")]
    NotListening(NodeId),
    /// The node is staged, not part of the stage tree.
    #[error("node {0} is not attached to the stage")]
    Detached(NodeId),
    /// No such node.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
}
