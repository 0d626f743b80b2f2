// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_context_tree --heading-base-level=0

//! Understory Context Tree: a containment tree with inherited, keyed context slots.
//!
//! UI toolkits commonly let a node "provide" a value that every descendant can read
//! without threading it through each intermediate node.
//! This crate models just that part of a widget tree:
//!
//! - Nodes form a hierarchy and are addressed by generational [`NodeId`]s.
//! - Each node may hold values under [`SlotKey`]s.
//! - [`ContextTree::lookup`] returns the nearest value for a key, starting at the node itself and walking toward the root.
//!
//! It does not know what the values mean. Higher layers (for example `understory_scope`)
//! store their own handles in it.
//!
//! ## API overview
//!
//! - [`ContextTree`]: container managing nodes and their context slots.
//! - [`NodeId`]: generational handle of a node.
//!
//! Key operations:
//! - [`ContextTree::insert`] / [`ContextTree::remove`] / [`ContextTree::reparent`]
//! - [`ContextTree::provide`] / [`ContextTree::take`]
//! - [`ContextTree::lookup`] and [`ContextTree::lookup_own`]
//!
//! ### Minimal usage
//!
//! ```
//! use understory_context_tree::ContextTree;
//!
//! let mut tree: ContextTree<&str> = ContextTree::new();
//! let app = tree.insert(None);
//! let panel = tree.insert(Some(app));
//! let button = tree.insert(Some(panel));
//!
//! tree.provide(app, "theme", "light");
//! tree.provide(panel, "theme", "dark");
//!
//! assert_eq!(tree.lookup(button, "theme"), Some(&"dark"));
//! assert_eq!(tree.lookup(app, "theme"), Some(&"light"));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod tree;
mod types;

pub use tree::ContextTree;
pub use types::{NodeId, SlotKey};
