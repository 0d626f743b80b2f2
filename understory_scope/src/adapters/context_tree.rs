// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapter helpers for Understory Context Tree.
//!
//! ## Feature
//!
//! Enable with `context_tree_adapter`.
//!
//! ## Notes
//!
//! [`NodeContext`] binds a [`ContextStore`] to one tree node: reads return the
//! nearest registry provided by the node or an ancestor, writes land on the node.
//! A stale [`NodeId`] reads as an empty context and drops writes.

use understory_context_tree::{ContextTree, NodeId};

use crate::context::{ContextKey, ContextStore};
use crate::error::ScopeError;
use crate::registry::Registry;
use crate::resolver::{ResolvedScope, ScopeResolver};

/// Context of a single node in a [`ContextTree`] of registries.
#[derive(Debug)]
pub struct NodeContext<'t> {
    tree: &'t mut ContextTree<Registry>,
    node: NodeId,
}

impl<'t> NodeContext<'t> {
    /// Bind `node` of `tree`.
    pub fn new(tree: &'t mut ContextTree<Registry>, node: NodeId) -> Self {
        Self { tree, node }
    }

    /// The bound node.
    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl ContextStore for NodeContext<'_> {
    fn read(&self, key: ContextKey) -> Option<Registry> {
        self.tree.lookup(self.node, key.as_str()).cloned()
    }

    fn write(&mut self, key: ContextKey, registry: Registry) {
        self.tree.provide(self.node, key.as_str(), registry);
    }
}

/// Resolve a scope for `node`, as the node would while it is being built.
///
/// A newly created registry is provided on `node`, so `node` and its
/// descendants see it as their active scope.
pub fn resolve_at(
    resolver: &ScopeResolver<'_>,
    tree: &mut ContextTree<Registry>,
    node: NodeId,
    position: Option<&str>,
) -> Result<ResolvedScope, ScopeError> {
    resolver.resolve_in(&mut NodeContext::new(tree, node), position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FeatureRegistry;

    #[test]
    fn siblings_get_independent_scopes() {
        let features = FeatureRegistry::new();
        let resolver = ScopeResolver::new(&features);
        let mut tree = ContextTree::new();
        let board = tree.insert(None);
        let left = tree.insert(Some(board));
        let right = tree.insert(Some(board));

        let board_scope = resolve_at(&resolver, &mut tree, board, Some("Board")).unwrap();
        let l = resolve_at(&resolver, &mut tree, left, Some("Tile")).unwrap();
        let r = resolve_at(&resolver, &mut tree, right, Some("Tile")).unwrap();

        assert_ne!(l.active, r.active, "each tile node owns its own registry");
        assert_eq!(l.parent.as_ref(), Some(&board_scope.active));
        assert_eq!(r.parent.as_ref(), Some(&board_scope.active));
    }

    #[test]
    fn nested_scope_records_parent_on_its_node() {
        let features = FeatureRegistry::new();
        let resolver = ScopeResolver::new(&features);
        let mut tree = ContextTree::new();
        let board = tree.insert(None);
        let tile = tree.insert(Some(board));

        let outer = resolve_at(&resolver, &mut tree, board, Some("Board")).unwrap();
        assert!(
            tree.lookup_own(board, ContextKey::ParentRegistry.as_str()).is_none(),
            "a root scope has no parent"
        );
        let inner = resolve_at(&resolver, &mut tree, tile, Some("Tile")).unwrap();

        assert_eq!(
            tree.lookup_own(tile, ContextKey::Registry.as_str()),
            Some(&inner.active)
        );
        assert_eq!(
            tree.lookup_own(tile, ContextKey::ParentRegistry.as_str()),
            Some(&outer.active)
        );
        let context = NodeContext::new(&mut tree, tile);
        assert_eq!(ScopeResolver::parent(&context), Some(outer.active.clone()));
        assert_eq!(context.read(ContextKey::Registry), Some(inner.active));
    }

    #[test]
    fn descendants_inherit_active_scope() {
        let features = FeatureRegistry::new();
        let resolver = ScopeResolver::new(&features);
        let mut tree = ContextTree::new();
        let tile = tree.insert(None);
        let label = tree.insert(Some(tile));

        let created = resolve_at(&resolver, &mut tree, tile, Some("Tile")).unwrap();
        let inherited = resolve_at(&resolver, &mut tree, label, None).unwrap();
        assert!(inherited.is_reused());
        assert_eq!(inherited.active, created.active);
        assert!(
            tree.lookup_own(label, ContextKey::Registry.as_str()).is_none(),
            "reuse must not write to the descendant"
        );
    }

    #[test]
    fn stale_node_reads_empty_context() {
        let features = FeatureRegistry::new();
        let resolver = ScopeResolver::new(&features);
        let mut tree = ContextTree::new();
        let node = tree.insert(None);
        tree.remove(node);
        assert!(matches!(
            resolve_at(&resolver, &mut tree, node, None),
            Err(ScopeError::NoActiveScope)
        ));
    }
}
