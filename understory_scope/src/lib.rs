// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_scope --heading-base-level=0

//! Understory Scope: scoped, hierarchical publish/subscribe for UI trees.
//!
//! ## Overview
//!
//! Nodes of a containment hierarchy exchange typed, named notifications through
//! per-scope registries instead of a global bus.
//! A node asks the [`ScopeResolver`](crate::resolver::ScopeResolver) for "the registry
//! for position P" (or "whatever is active here"), then subscribes and publishes on
//! that registry or on its parent.
//! Nothing propagates implicitly between scopes.
//!
//! ## Pieces
//!
//! - [`EventCatalog`](crate::event::EventCatalog) declares [`EventKind`](crate::event::EventKind)s and rejects duplicate names.
//! - [`Registry`](crate::registry::Registry) holds ordered subscriptions per event name and fans out
//!   [`EventEnvelope`](crate::event::EventEnvelope)s synchronously.
//!   Handlers are held weakly by default; stale ones are pruned lazily on publish.
//! - [`ScopeResolver`](crate::resolver::ScopeResolver) reuses or creates registries and links each new
//!   one to the registry that was active before it.
//! - [`FeatureRegistry`](crate::feature::FeatureRegistry) runs callbacks against every new registry created
//!   for a position, so cross-cutting observers attach to each instance of a recurring scope.
//! - [`ContextStore`](crate::context::ContextStore) is the host's per-node context capability.
//!   The `context_tree_adapter` feature provides one over `understory_context_tree`.
//!
//! ## Threading
//!
//! Everything here is single-threaded (`Rc`/`RefCell`) and intended to run on the
//! host's build/update thread.
//!
//! ## Diagnostics
//!
//! Lifecycle notices (declarations, scope creation, feature attachment, pruning) are
//! emitted as `tracing` events carrying an `action` field. Install a subscriber to see them.
//!
//! ## Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use understory_scope::context::ContextSlots;
//! use understory_scope::event::{EventCatalog, EventEnvelope};
//! use understory_scope::feature::FeatureRegistry;
//! use understory_scope::registry::{Handler, SubscribeOptions};
//! use understory_scope::resolver::ScopeResolver;
//!
//! let mut catalog = EventCatalog::new();
//! let selected = catalog.declare::<u32>("selected").unwrap();
//!
//! // A feature that counts selections on every tile.
//! let total = Rc::new(Cell::new(0));
//! let mut features = FeatureRegistry::new();
//! let counter = Rc::clone(&total);
//! let kind = selected.clone();
//! features
//!     .register("Tile", "selection-count", move |registry| {
//!         let counter = Rc::clone(&counter);
//!         registry.subscribe_fn(&kind, move |_: &EventEnvelope<u32>| counter.set(counter.get() + 1))?;
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let resolver = ScopeResolver::new(&features);
//! let mut context = ContextSlots::new();
//! let tile = resolver.resolve_in(&mut context, Some("Tile")).unwrap().active;
//!
//! // A node-owned handler, held weakly by the registry.
//! let last = Rc::new(Cell::new(0));
//! let sink = Rc::clone(&last);
//! let on_select = Handler::new(move |e: &EventEnvelope<u32>| sink.set(*e.value()));
//! tile.subscribe(&selected, &on_select, SubscribeOptions::default()).unwrap();
//!
//! tile.publish(&selected.make(4)).unwrap();
//! assert_eq!((last.get(), total.get()), (4, 1));
//!
//! // Dropping the node's handler unsubscribes it on the next publish.
//! drop(on_select);
//! tile.publish(&selected.make(5)).unwrap();
//! assert_eq!((last.get(), total.get()), (4, 2));
//! assert_eq!(tile.subscriber_count(&selected), 1);
//! ```

pub mod adapters;
pub mod context;
pub mod error;
pub mod event;
pub mod feature;
pub mod registry;
pub mod resolver;

pub use error::ScopeError;
