// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error taxonomy shared by the catalog, registry, resolver and feature table.

use std::error::Error;

/// Boxed error returned by a fallible [`Handler`](crate::registry::Handler).
pub type HandlerError = Box<dyn Error + 'static>;

/// Errors surfaced by this crate.
///
/// `DuplicateEventName` and `NoActiveScope` are programming errors: they are
/// reported immediately and never retried.
#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    /// An event kind with this name was already declared in the catalog.
    #[error("event `{name}` is already declared")]
    DuplicateEventName {
        /// The colliding name.
        name: String,
    },
    /// Event names must not be empty.
    #[error("event name must not be empty")]
    EmptyEventName,
    /// Position identifiers must not be empty.
    #[error("position name must not be empty")]
    EmptyPositionName,
    /// No position identifier was given and no scope is active to reuse.
    #[error("no active scope to reuse and no position name given")]
    NoActiveScope,
    /// An event name was used with two different payload types.
    #[error("event `{event}` carries `{expected}` payloads, not `{found}`")]
    PayloadMismatch {
        /// Event name.
        event: String,
        /// Payload type already bound to the name.
        expected: &'static str,
        /// Payload type of the offending call.
        found: &'static str,
    },
    /// A handler failed; the rest of that dispatch pass was skipped.
    #[error("handler for event `{event}` failed")]
    Handler {
        /// Event being dispatched.
        event: String,
        /// The handler's error.
        #[source]
        source: HandlerError,
    },
}
