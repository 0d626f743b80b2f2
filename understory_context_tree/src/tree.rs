// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: structure, updates, context queries.

use alloc::vec::Vec;

use crate::types::{NodeId, SlotKey};

impl<V> Default for ContextTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Containment tree whose nodes carry keyed context slots.
///
/// Values provided on a node are visible to the node itself and to every
/// descendant, until a nearer node provides its own value for the same key.
pub struct ContextTree<V> {
    nodes: Vec<Option<Node<V>>>, // slots
    generations: Vec<u32>,       // last generation per slot (persists across frees)
    free_list: Vec<usize>,
}

impl<V> core::fmt::Debug for ContextTree<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.len();
        let free = self.free_list.len();
        f.debug_struct("ContextTree")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &free)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
struct Node<V> {
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    slots: Vec<(SlotKey, V)>,
}

impl<V> Node<V> {
    fn new(generation: u32) -> Self {
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            slots: Vec::new(),
        }
    }

    fn slot(&self, key: SlotKey) -> Option<&V> {
        self.slots.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

impl<V> ContextTree<V> {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Returns true if the tree has no live nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a new node as a child of `parent` (or as a root if `None`).
    ///
    /// A stale `parent` is treated like `None`.
    pub fn insert(&mut self, parent: Option<NodeId>) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        let id = NodeId::new(idx, generation);
        if let Some(p) = parent.filter(|p| self.is_alive(*p)) {
            self.link_parent(id, p);
        }
        id
    }

    /// Remove a node (and its subtree) from the tree, dropping every context value it held.
    pub fn remove(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        if let Some(parent) = self.node(id).and_then(|n| n.parent) {
            self.unlink_parent(id, parent);
        }
        let children = self.node(id).map(|n| n.children.clone()).unwrap_or_default();
        for child in children {
            self.remove(child);
        }
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    /// Reparent `id` under `new_parent` (or make it a root if `None`).
    ///
    /// Returns `false` without changing anything if either id is stale or if the
    /// move would create a cycle.
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        if let Some(p) = new_parent
            && (!self.is_alive(p) || self.is_ancestor_or_self(id, p))
        {
            return false;
        }
        if let Some(parent) = self.node(id).and_then(|n| n.parent) {
            self.unlink_parent(id, parent);
        }
        if let Some(p) = new_parent {
            self.link_parent(id, p);
        }
        true
    }

    /// Returns true if `id` refers to a live node.
    ///
    /// A `NodeId` is considered live if its slot exists and its generation matches
    /// the current generation stored in that slot.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Parent of `id`, or `None` for roots and stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    /// Children of `id` in insertion order; empty for stale ids.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        match self.node(id) {
            Some(n) => &n.children,
            None => &[],
        }
    }

    /// Path from the root to `id` (inclusive). Empty for stale ids.
    pub fn path_to_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = self.ancestors(id).collect();
        out.reverse();
        out
    }

    /// Set the value of `key` on `id`, returning the value it replaced on that node.
    ///
    /// Does nothing for stale ids.
    pub fn provide(&mut self, id: NodeId, key: SlotKey, value: V) -> Option<V> {
        let node = self.node_mut(id)?;
        if let Some((_, slot)) = node.slots.iter_mut().find(|(k, _)| *k == key) {
            return Some(core::mem::replace(slot, value));
        }
        node.slots.push((key, value));
        None
    }

    /// Nearest value for `key`, looking at `id` first and then each ancestor.
    pub fn lookup(&self, id: NodeId, key: SlotKey) -> Option<&V> {
        self.ancestors(id)
            .find_map(|a| self.node(a).and_then(|n| n.slot(key)))
    }

    /// Value for `key` set on `id` itself, ignoring ancestors.
    pub fn lookup_own(&self, id: NodeId, key: SlotKey) -> Option<&V> {
        self.node(id)?.slot(key)
    }

    /// Remove and return the value for `key` set on `id` itself.
    pub fn take(&mut self, id: NodeId, key: SlotKey) -> Option<V> {
        let node = self.node_mut(id)?;
        let pos = node.slots.iter().position(|(k, _)| *k == key)?;
        Some(node.slots.remove(pos).1)
    }

    /// Iterate `id` and its ancestors, innermost first. Empty for stale ids.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let start = self.is_alive(id).then_some(id);
        core::iter::successors(start, move |cur| self.parent_of(*cur))
    }

    // --- internals ---

    fn node(&self, id: NodeId) -> Option<&Node<V>> {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .filter(|n| n.generation == id.1)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<V>> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    fn link_parent(&mut self, id: NodeId, parent: NodeId) {
        if let Some(p) = self.node_mut(parent) {
            p.children.push(id);
        }
        if let Some(n) = self.node_mut(id) {
            n.parent = Some(parent);
        }
    }

    fn unlink_parent(&mut self, id: NodeId, parent: NodeId) {
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|c| *c != id);
        }
        if let Some(n) = self.node_mut(id) {
            n.parent = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    const THEME: SlotKey = "theme";

    #[test]
    fn lookup_walks_to_nearest_provider() {
        let mut tree: ContextTree<u32> = ContextTree::new();
        let root = tree.insert(None);
        let mid = tree.insert(Some(root));
        let leaf = tree.insert(Some(mid));

        assert_eq!(tree.lookup(leaf, THEME), None);
        tree.provide(root, THEME, 1);
        assert_eq!(tree.lookup(leaf, THEME), Some(&1), "leaf inherits from root");

        tree.provide(mid, THEME, 2);
        assert_eq!(tree.lookup(leaf, THEME), Some(&2), "nearer provider wins");
        assert_eq!(tree.lookup(root, THEME), Some(&1), "ancestors do not see descendants");
        assert_eq!(tree.lookup_own(leaf, THEME), None);
    }

    #[test]
    fn provide_replaces_and_take_removes() {
        let mut tree: ContextTree<u32> = ContextTree::new();
        let root = tree.insert(None);
        let child = tree.insert(Some(root));
        tree.provide(root, THEME, 1);
        assert_eq!(tree.provide(child, THEME, 5), None);
        assert_eq!(tree.provide(child, THEME, 6), Some(5));
        assert_eq!(tree.take(child, THEME), Some(6));
        assert_eq!(tree.lookup(child, THEME), Some(&1), "falls back to ancestor after take");
    }

    #[test]
    fn liveness_insert_remove_reuse() {
        let mut tree: ContextTree<u32> = ContextTree::new();
        let root = tree.insert(None);
        let a = tree.insert(Some(root));
        tree.provide(a, THEME, 3);

        tree.remove(a);
        assert!(!tree.is_alive(a));
        assert_eq!(tree.lookup(a, THEME), None, "stale ids see nothing");
        assert!(tree.children_of(root).is_empty());

        let b = tree.insert(Some(root));
        assert!(tree.is_alive(b));
        assert!(!tree.is_alive(a));
        if a.slot() == b.slot() {
            assert!(b.generation() > a.generation(), "generation must increase on reuse");
        }
        assert_eq!(tree.lookup_own(b, THEME), None, "reused slot starts empty");
    }

    #[test]
    fn remove_drops_subtree() {
        let mut tree: ContextTree<u32> = ContextTree::new();
        let root = tree.insert(None);
        let a = tree.insert(Some(root));
        let b = tree.insert(Some(a));
        let c = tree.insert(Some(b));
        tree.remove(a);
        assert!(tree.is_alive(root));
        assert!(!tree.is_alive(a) && !tree.is_alive(b) && !tree.is_alive(c));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn reparent_changes_inherited_context() {
        let mut tree: ContextTree<u32> = ContextTree::new();
        let left = tree.insert(None);
        let right = tree.insert(None);
        let child = tree.insert(Some(left));
        tree.provide(left, THEME, 1);
        tree.provide(right, THEME, 2);
        assert_eq!(tree.lookup(child, THEME), Some(&1));

        assert!(tree.reparent(child, Some(right)));
        assert_eq!(tree.lookup(child, THEME), Some(&2));
        assert_eq!(tree.children_of(left), &[] as &[NodeId]);
        assert_eq!(tree.children_of(right), &[child]);
    }

    #[test]
    fn reparent_rejects_cycles() {
        let mut tree: ContextTree<u32> = ContextTree::new();
        let root = tree.insert(None);
        let child = tree.insert(Some(root));
        let grandchild = tree.insert(Some(child));
        assert!(!tree.reparent(root, Some(grandchild)), "moving under a descendant is a cycle");
        assert!(!tree.reparent(child, Some(child)), "a node cannot parent itself");
        assert_eq!(tree.path_to_root(grandchild), vec![root, child, grandchild]);
    }

    #[test]
    fn insert_under_stale_parent_makes_root() {
        let mut tree: ContextTree<u32> = ContextTree::new();
        let gone = tree.insert(None);
        tree.remove(gone);
        let orphan = tree.insert(Some(gone));
        assert_eq!(tree.parent_of(orphan), None);
        assert_eq!(tree.path_to_root(orphan), vec![orphan]);
    }
}
