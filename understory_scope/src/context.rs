// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host's context-storage capability.
//!
//! The resolver never walks a tree itself. It reads and writes two well-known
//! keys through a [`ContextStore`] that the host scopes to "the node currently
//! being built". See [`adapters`](crate::adapters) for a ready-made store over
//! `understory_context_tree`.

use crate::registry::Registry;

/// Well-known context keys.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ContextKey {
    /// The registry active at this position.
    Registry,
    /// The registry that was active here before the current one was created.
    ParentRegistry,
}

impl ContextKey {
    /// Key as stored by hosts that key their context by string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Registry => "registry",
            Self::ParentRegistry => "parentRegistry",
        }
    }
}

/// Read/write access to the context of the current node.
///
/// Implementations decide how values are inherited; typically a read returns
/// the nearest value provided by the node or one of its ancestors, and a write
/// lands on the node itself.
pub trait ContextStore {
    /// Value visible under `key`, if any.
    fn read(&self, key: ContextKey) -> Option<Registry>;
    /// Provide `registry` under `key` for this node and its descendants.
    fn write(&mut self, key: ContextKey, registry: Registry);
}

/// A flat store holding one value per key.
///
/// Useful for hosts without a hierarchy (or for tests): every read sees the
/// last write.
#[derive(Clone, Debug, Default)]
pub struct ContextSlots {
    registry: Option<Registry>,
    parent: Option<Registry>,
}

impl ContextSlots {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContextStore for ContextSlots {
    fn read(&self, key: ContextKey) -> Option<Registry> {
        match key {
            ContextKey::Registry => self.registry.clone(),
            ContextKey::ParentRegistry => self.parent.clone(),
        }
    }

    fn write(&mut self, key: ContextKey, registry: Registry) {
        match key {
            ContextKey::Registry => self.registry = Some(registry),
            ContextKey::ParentRegistry => self.parent = Some(registry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_have_stable_names() {
        assert_eq!(ContextKey::Registry.as_str(), "registry");
        assert_eq!(ContextKey::ParentRegistry.as_str(), "parentRegistry");
    }

    #[test]
    fn slots_keep_last_write_per_key() {
        let mut slots = ContextSlots::new();
        assert!(slots.read(ContextKey::Registry).is_none());
        let a = Registry::new("A");
        let b = Registry::new("B");
        slots.write(ContextKey::Registry, a.clone());
        slots.write(ContextKey::Registry, b.clone());
        slots.write(ContextKey::ParentRegistry, a.clone());
        assert_eq!(slots.read(ContextKey::Registry), Some(b));
        assert_eq!(slots.read(ContextKey::ParentRegistry), Some(a));
    }
}
