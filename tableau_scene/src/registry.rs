// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Id and name registries of attached nodes.

use hashbrown::HashMap;

use crate::node::Node;
use crate::types::NodeId;

/// Lookup tables for nodes currently attached under a stage root.
#[derive(Clone, Debug, Default)]
pub(crate) struct Registry {
    ids: HashMap<String, NodeId>,
    names: HashMap<String, Vec<NodeId>>,
}

impl Registry {
    /// Node holding `id`, if any.
    pub(crate) fn by_id(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }

    /// Nodes carrying `name`, in registration order.
    pub(crate) fn by_name(&self, name: &str) -> &[NodeId] {
        self.names
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub(crate) fn register(&mut self, node: &Node) {
        if let Some(id) = &node.user_id {
            self.ids.insert(id.clone(), node.id);
        }
        if let Some(name) = &node.name {
            self.insert_names(node.id, name);
        }
    }

    pub(crate) fn unregister(&mut self, node: &Node) {
        if let Some(id) = &node.user_id {
            self.remove_id(node.id, id);
        }
        if let Some(name) = &node.name {
            self.remove_names(node.id, name);
        }
    }

    pub(crate) fn insert_id(&mut self, node: NodeId, id: &str) {
        self.ids.insert(id.to_owned(), node);
    }

    pub(crate) fn remove_id(&mut self, node: NodeId, id: &str) {
        if self.ids.get(id) == Some(&node) {
            self.ids.remove(id);
        }
    }

    pub(crate) fn insert_names(&mut self, node: NodeId, names: &str) {
        for name in names.split_whitespace() {
            let list = self.names.entry(name.to_owned()).or_default();
            if !list.contains(&node) {
                list.push(node);
            }
        }
    }

    pub(crate) fn remove_names(&mut self, node: NodeId, names: &str) {
        for name in names.split_whitespace() {
            if let Some(list) = self.names.get_mut(name) {
                list.retain(|n| *n != node);
                if list.is_empty() {
                    self.names.remove(name);
                }
            }
        }
    }
}
