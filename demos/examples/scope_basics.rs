// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scope basics.
//!
//! Declare event kinds, resolve a scope, subscribe with and without a predicate,
//! and watch a weakly held handler disappear once its owner is dropped.
//!
//! Run:
//! - `cargo run -p understory_demos --example scope_basics`

use std::rc::Rc;

use understory_scope::ScopeError;
use understory_scope::context::ContextSlots;
use understory_scope::event::{EventCatalog, EventEnvelope};
use understory_scope::feature::FeatureRegistry;
use understory_scope::registry::{Handler, SubscribeOptions};
use understory_scope::resolver::ScopeResolver;

fn main() -> Result<(), ScopeError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::TRACE)
        .init();

    let mut catalog = EventCatalog::new();
    let volume = catalog.declare::<u8>("volume")?;
    // Redeclaring a name is a programming error.
    if let Err(err) = catalog.declare::<u8>("volume") {
        println!("expected failure: {err}");
    }

    let features = FeatureRegistry::new();
    let resolver = ScopeResolver::new(&features);
    let mut context = ContextSlots::new();
    let player = resolver.resolve_in(&mut context, Some("Player"))?.active;

    let any = Handler::new(|e: &EventEnvelope<u8>| println!("volume -> {}", e.value()));
    let loud = Handler::new(|e: &EventEnvelope<u8>| println!("  loud! ({})", e.value()));
    player.subscribe(&volume, &any, SubscribeOptions::default())?;
    player.subscribe(
        &volume,
        &loud,
        SubscribeOptions::<u8>::default().predicate(|e| *e.value() > 80),
    )?;

    for level in [20, 90] {
        player.publish(&volume.make(level))?;
    }

    // The node owning `loud` goes away; the registry only observed it.
    drop(loud);
    player.publish(&volume.make(95))?;
    println!(
        "subscribers left for `{}`: {}",
        volume.name(),
        player.subscriber_count(&volume)
    );
    assert_eq!(player.subscriber_count(&volume), 1);
    assert_eq!(Rc::strong_count(&any), 1, "weak retention does not own the handler");
    Ok(())
}
