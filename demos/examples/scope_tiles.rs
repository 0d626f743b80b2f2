// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Feature auto-attach over a context tree.
//!
//! A board holds several tiles. A "hover-stats" feature registered for the
//! `Tile` position attaches to every tile scope as it is created, and forwards
//! each hover to the board scope, which the tile reaches through its parent.
//!
//! Run:
//! - `cargo run -p understory_demos --example scope_tiles`

use std::cell::RefCell;
use std::rc::Rc;

use understory_context_tree::ContextTree;
use understory_scope::ScopeError;
use understory_scope::adapters::context_tree::resolve_at;
use understory_scope::event::{EventCatalog, EventEnvelope};
use understory_scope::feature::FeatureRegistry;
use understory_scope::registry::Registry;
use understory_scope::resolver::ScopeResolver;

fn main() -> Result<(), ScopeError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .init();

    let mut catalog = EventCatalog::new();
    let hovered = catalog.declare::<u32>("hovered")?;
    let tile_hovered = catalog.declare::<String>("tileHovered")?;

    let mut features = FeatureRegistry::new();
    {
        let hovered = hovered.clone();
        features.register("Tile", "hover-stats", move |registry| {
            registry.subscribe_fn(&hovered, |e: &EventEnvelope<u32>| {
                println!("  [hover-stats] tile hovered {} times", e.value());
            })?;
            Ok(())
        })?;
    }
    let resolver = ScopeResolver::new(&features);

    // board
    // ├── tile-0
    // ├── tile-1
    // └── tile-2
    let mut tree: ContextTree<Registry> = ContextTree::new();
    let board = tree.insert(None);
    let tiles: Vec<_> = (0..3).map(|_| tree.insert(Some(board))).collect();

    let board_scope = resolve_at(&resolver, &mut tree, board, Some("Board"))?.active;
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let _board_listener = board_scope.subscribe_fn(&tile_hovered, move |e: &EventEnvelope<String>| {
        sink.borrow_mut().push(e.value().clone());
    })?;

    for (i, &node) in tiles.iter().enumerate() {
        let resolved = resolve_at(&resolver, &mut tree, node, Some("Tile"))?;
        let tile = resolved.active;
        println!("tile-{i}: {:?}", tile);
        tile.publish(&hovered.make(i as u32 + 1))?;
        if let Some(parent) = resolved.parent {
            parent.publish(&tile_hovered.make(format!("tile-{i}")))?;
        }
    }

    println!("board saw: {:?}", log.borrow());
    assert_eq!(log.borrow().len(), tiles.len());
    Ok(())
}
