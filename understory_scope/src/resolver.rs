// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scope resolution: reuse the active registry or create a linked child.
//!
//! ## Rules
//!
//! Given the registry active at the current position (if any) and an optional
//! position name `P`:
//!
//! - Active registry and no `P`, or `P` equal to the active scope name: reuse it.
//!   The returned parent is the active registry itself.
//! - No active registry and no `P`: [`ScopeError::NoActiveScope`].
//! - Otherwise: create `Registry(P)`, run the features registered for `P`
//!   against it, and return it with the previously active registry as parent.
//!
//! [`ScopeResolver::resolve`] takes the active registry explicitly.
//! [`ScopeResolver::resolve_in`] reads it from a [`ContextStore`] and writes the
//! new registry (and its parent) back, so descendants inherit it.

use crate::context::{ContextKey, ContextStore};
use crate::error::ScopeError;
use crate::feature::FeatureRegistry;
use crate::registry::Registry;

/// Result of a resolution: the registry to use and the one active before it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedScope {
    /// Registry in force for the caller.
    pub active: Registry,
    /// Registry that was active when `active` was resolved; `None` for a new root scope.
    pub parent: Option<Registry>,
}

impl ResolvedScope {
    /// Returns true if resolution reused an existing registry.
    pub fn is_reused(&self) -> bool {
        self.parent
            .as_ref()
            .is_some_and(|parent| parent.ptr_eq(&self.active))
    }
}

/// Resolves scopes, running features for every registry it creates.
#[derive(Clone, Copy, Debug)]
pub struct ScopeResolver<'a> {
    features: &'a FeatureRegistry,
}

impl<'a> ScopeResolver<'a> {
    /// Create a resolver that attaches `features` to new scopes.
    pub fn new(features: &'a FeatureRegistry) -> Self {
        Self { features }
    }

    /// Resolve against an explicitly supplied active registry.
    pub fn resolve(
        &self,
        active: Option<&Registry>,
        position: Option<&str>,
    ) -> Result<ResolvedScope, ScopeError> {
        if position.is_some_and(str::is_empty) {
            return Err(ScopeError::EmptyPositionName);
        }
        match (active, position) {
            (Some(current), None) => Ok(Self::reuse(current)),
            (Some(current), Some(p)) if current.scope_name() == p => Ok(Self::reuse(current)),
            (None, None) => Err(ScopeError::NoActiveScope),
            (_, Some(p)) => {
                let fresh = Registry::new(p);
                let attached = self.features.run_for(p, &fresh)?;
                tracing::debug!(
                    action = "create_scope",
                    scope = p,
                    parent = active.map(Registry::scope_name),
                    features = attached,
                    "created scope"
                );
                Ok(ResolvedScope {
                    active: fresh,
                    parent: active.cloned(),
                })
            }
        }
    }

    /// Resolve against the registry visible in `store`, writing a newly created
    /// registry (and its parent) back into it.
    ///
    /// A reused registry leaves the store untouched.
    pub fn resolve_in(
        &self,
        store: &mut impl ContextStore,
        position: Option<&str>,
    ) -> Result<ResolvedScope, ScopeError> {
        let active = store.read(ContextKey::Registry);
        let resolved = self.resolve(active.as_ref(), position)?;
        if !resolved.is_reused() {
            store.write(ContextKey::Registry, resolved.active.clone());
            if let Some(parent) = &resolved.parent {
                store.write(ContextKey::ParentRegistry, parent.clone());
            }
        }
        Ok(resolved)
    }

    /// Registry visible in `store`, without resolving anything.
    pub fn current(store: &impl ContextStore) -> Option<Registry> {
        store.read(ContextKey::Registry)
    }

    /// Parent recorded in `store` for the visible registry.
    pub fn parent(store: &impl ContextStore) -> Option<Registry> {
        store.read(ContextKey::ParentRegistry)
    }

    fn reuse(current: &Registry) -> ResolvedScope {
        tracing::trace!(
            action = "reuse_scope",
            scope = current.scope_name(),
            "reused active scope"
        );
        ResolvedScope {
            active: current.clone(),
            parent: Some(current.clone()),
        }
    }
}
