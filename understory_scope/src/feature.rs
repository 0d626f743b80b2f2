// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Feature table: callbacks that attach to every new scope of a position.
//!
//! A feature is a cross-cutting observer. Registering it under a position name
//! (for example `"Tile"`) means that every time the
//! [`ScopeResolver`](crate::resolver::ScopeResolver) creates a registry for that
//! position, the callback runs against the fresh registry before the caller sees
//! it, typically to subscribe handlers held with
//! [`Retention::Strong`](crate::registry::Retention::Strong).
//!
//! Entries are append-only; populate the table during setup, before the first
//! scope for the position is created.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::ScopeError;
use crate::registry::Registry;

/// Callback run against each newly created registry of a position.
pub type InitCallback = Rc<dyn Fn(&Registry) -> Result<(), ScopeError>>;

struct Feature {
    label: Rc<str>,
    callback: InitCallback,
}

/// Position name → ordered feature callbacks.
#[derive(Default)]
pub struct FeatureRegistry {
    by_position: HashMap<Rc<str>, Vec<Feature>>,
}

impl fmt::Debug for FeatureRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (position, features) in &self.by_position {
            let labels: Vec<&str> = features.iter().map(|feat| &*feat.label).collect();
            map.entry(&&**position, &labels);
        }
        map.finish()
    }
}

impl FeatureRegistry {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `callback` to the features of `position`.
    ///
    /// `label` only appears in diagnostics.
    pub fn register(
        &mut self,
        position: &str,
        label: &str,
        callback: impl Fn(&Registry) -> Result<(), ScopeError> + 'static,
    ) -> Result<(), ScopeError> {
        if position.is_empty() {
            return Err(ScopeError::EmptyPositionName);
        }
        let features = self.by_position.entry(Rc::from(position)).or_default();
        features.push(Feature {
            label: Rc::from(label),
            callback: Rc::new(callback),
        });
        tracing::debug!(
            action = "register_feature",
            position,
            feature = label,
            total = features.len(),
            "registered feature"
        );
        Ok(())
    }

    /// Run every feature of `position` against `registry`, in registration order.
    ///
    /// Stops at the first failing callback and returns its error. On success,
    /// returns the number of callbacks run.
    pub fn run_for(&self, position: &str, registry: &Registry) -> Result<usize, ScopeError> {
        let Some(features) = self.by_position.get(position) else {
            return Ok(0);
        };
        for feature in features {
            tracing::debug!(
                action = "run_features",
                position,
                feature = %feature.label,
                "attaching feature"
            );
            (feature.callback)(registry).inspect_err(|err| {
                tracing::warn!(
                    position,
                    feature = %feature.label,
                    error = %err,
                    "feature failed to attach"
                );
            })?;
        }
        Ok(features.len())
    }

    /// Labels of the features registered for `position`, in registration order.
    pub fn labels_for(&self, position: &str) -> Vec<&str> {
        self.by_position
            .get(position)
            .map(|features| features.iter().map(|f| &*f.label).collect())
            .unwrap_or_default()
    }

    /// Returns true if any feature is registered for `position`.
    pub fn has_features(&self, position: &str) -> bool {
        self.by_position
            .get(position)
            .is_some_and(|features| !features.is_empty())
    }

    /// Remove every feature.
    pub fn clear(&mut self) {
        self.by_position.clear();
    }
}
