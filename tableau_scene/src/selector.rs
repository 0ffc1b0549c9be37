// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Selector queries: `#id`, `.name` and type tags.

use smallvec::SmallVec;
use tableau_surface::Surface;

use crate::{NodeId, Stage};

/// One parsed selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selector<'a> {
    /// `#id`: the node with that user id.
    Id(&'a str),
    /// `.name`: nodes carrying that name.
    Name(&'a str),
    /// `Type`: nodes whose node type or shape type matches.
    Type(&'a str),
}

impl<'a> Selector<'a> {
    /// Parse a single selector. Returns `None` for malformed input.
    pub fn parse(input: &'a str) -> Option<Self> {
        let input = input.trim();
        let (ctor, body): (fn(&'a str) -> Self, &'a str) =
            if let Some(rest) = input.strip_prefix('#') {
                (Self::Id, rest)
            } else if let Some(rest) = input.strip_prefix('.') {
                (Self::Name, rest)
            } else {
                (Self::Type, input)
            };
        let valid = !body.is_empty()
            && body
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-');
        valid.then(|| ctor(body))
    }
}

impl<S: Surface> Stage<S> {
    /// Descendants of `root` matching `selector`, in tree order. `root` itself
    /// is never part of the result, so the stage cannot be selected.
    ///
    /// Comma-separated selectors are unioned. Malformed selectors match nothing.
    /// For attached roots, `#id` and `.name` go through the stage registries, so
    /// staged nodes never match; for a staged root the subtree is searched.
    pub fn get(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = Vec::new();
        for part in selector.split(',') {
            let Some(sel) = Selector::parse(part) else {
                tracing::debug!(selector = part, "malformed selector");
                continue;
            };
            for id in self.select(root, sel) {
                if !out.contains(&id) {
                    out.push(id);
                }
            }
        }
        out.sort_by_cached_key(|id| self.tree_path(*id));
        out
    }

    /// The first match of [`Stage::get`].
    pub fn get_one(&self, root: NodeId, selector: &str) -> Option<NodeId> {
        self.get(root, selector).into_iter().next()
    }

    fn select(&self, root: NodeId, sel: Selector<'_>) -> Vec<NodeId> {
        let registered = self.is_attached(root);
        match sel {
            Selector::Id(id) if registered => self
                .registry
                .by_id(id)
                .filter(|n| self.is_descendant_of(*n, root))
                .into_iter()
                .collect(),
            Selector::Name(name) if registered => self
                .registry
                .by_name(name)
                .iter()
                .copied()
                .filter(|n| self.is_descendant_of(*n, root))
                .collect(),
            _ => self.descendants(root).filter(|n| self.matches(*n, sel)).collect(),
        }
    }

    fn descendants(&self, root: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.subtree(root).into_iter().skip(1)
    }

    fn matches(&self, id: NodeId, sel: Selector<'_>) -> bool {
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        match sel {
            Selector::Id(want) => node.user_id() == Some(want),
            Selector::Name(want) => node.has_name(want),
            Selector::Type(want) => {
                node.node_type().as_str() == want || node.type_name() == want
            }
        }
    }

    /// Sibling indices from the topmost ancestor down; orders nodes by tree position.
    fn tree_path(&self, id: NodeId) -> SmallVec<[usize; 8]> {
        let mut path: SmallVec<[usize; 8]> = self
            .path_to_root(id)
            .iter()
            .filter_map(|n| self.nodes.get(n))
            .filter(|n| n.parent.is_some())
            .map(|n| n.index)
            .collect();
        path.reverse();
        path
    }
}
