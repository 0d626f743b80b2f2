// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the context tree: node identifiers and slot keys.

/// Identifier for a node in the tree.
///
/// This is a small, copyable handle that stays stable while the node lives and
/// becomes invalid once the node is removed.
/// It consists of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On insert, a fresh slot is allocated with generation `1`.
/// - On remove, the slot is freed; any existing `NodeId` that pointed to that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `NodeId`.
///
/// Use [`ContextTree::is_alive`](crate::ContextTree::is_alive) to check whether a `NodeId`
/// still refers to a live node. Stale ids never alias a different live node because the
/// generation must match.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Slot index of this id. Only meaningful together with [`NodeId::generation`].
    pub const fn slot(self) -> u32 {
        self.0
    }

    /// Generation of this id.
    pub const fn generation(self) -> u32 {
        self.1
    }
}

/// Key naming a context slot.
///
/// Keys are compared by value, so two crates that agree on the same string
/// share the slot.
pub type SlotKey = &'static str;
