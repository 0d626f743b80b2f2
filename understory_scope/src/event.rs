// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event envelopes, event kinds, and the catalog that keeps kind names unique.
//!
//! ## Overview
//!
//! An [`EventKind`] is declared once per logical notification through
//! [`EventCatalog::declare`]. The kind stamps payloads into [`EventEnvelope`]s,
//! which are what [`Registry::publish`](crate::registry::Registry::publish) fans out.
//!
//! ## Duplicate names
//!
//! Redeclaring a name is fatal: [`EventCatalog::declare`] returns
//! [`ScopeError::DuplicateEventName`] and leaves the catalog untouched.

use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::error::ScopeError;

/// A named notification carrying a payload of type `T`.
///
/// Immutable once constructed.
#[derive(Clone, PartialEq, Eq)]
pub struct EventEnvelope<T> {
    name: Rc<str>,
    value: T,
}

impl<T> EventEnvelope<T> {
    /// Wrap `value` under the event name `name`.
    ///
    /// Prefer [`EventKind::make`] when a declared kind exists; this constructor
    /// exists for string-keyed callers.
    pub fn new(name: impl Into<Rc<str>>, value: T) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Event name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Payload.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Consume the envelope, returning the payload.
    pub fn into_value(self) -> T {
        self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for EventEnvelope<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEnvelope")
            .field("name", &&*self.name)
            .field("value", &self.value)
            .finish()
    }
}

/// A declared, typed event name.
///
/// Obtained from [`EventCatalog::declare`]. Cloning is cheap and shares the name.
pub struct EventKind<T> {
    name: Rc<str>,
    _payload: PhantomData<fn(T) -> T>,
}

impl<T> EventKind<T> {
    /// Name of this kind.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stamp `value` into an envelope carrying this kind's name.
    pub fn make(&self, value: T) -> EventEnvelope<T> {
        EventEnvelope {
            name: Rc::clone(&self.name),
            value,
        }
    }
}

impl<T> Clone for EventKind<T> {
    fn clone(&self) -> Self {
        Self {
            name: Rc::clone(&self.name),
            _payload: PhantomData,
        }
    }
}

impl<T> fmt::Debug for EventKind<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventKind")
            .field("name", &&*self.name)
            .field("payload", &std::any::type_name::<T>())
            .finish()
    }
}

/// Anything that names an event: a string or a declared [`EventKind`].
///
/// Used by [`Registry::subscribe`](crate::registry::Registry::subscribe) and friends,
/// which key their tables by the bare name.
pub trait EventName {
    /// The bare event name.
    fn event_name(&self) -> &str;
}

impl EventName for str {
    fn event_name(&self) -> &str {
        self
    }
}

impl EventName for String {
    fn event_name(&self) -> &str {
        self
    }
}

impl<T> EventName for EventKind<T> {
    fn event_name(&self) -> &str {
        self.name()
    }
}

impl<N: EventName + ?Sized> EventName for &N {
    fn event_name(&self) -> &str {
        (**self).event_name()
    }
}

/// Set of declared event names.
///
/// There is no process-wide instance: the application owns one catalog and
/// declares all of its kinds through it during setup.
#[derive(Debug, Default)]
pub struct EventCatalog {
    names: HashSet<Rc<str>>,
}

impl EventCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a new event kind named `name`.
    ///
    /// Fails with [`ScopeError::EmptyEventName`] for `""` and with
    /// [`ScopeError::DuplicateEventName`] if `name` was declared before.
    pub fn declare<T>(&mut self, name: &str) -> Result<EventKind<T>, ScopeError> {
        if name.is_empty() {
            return Err(ScopeError::EmptyEventName);
        }
        if self.names.contains(name) {
            return Err(ScopeError::DuplicateEventName {
                name: name.to_owned(),
            });
        }
        let name: Rc<str> = Rc::from(name);
        self.names.insert(Rc::clone(&name));
        tracing::debug!(
            action = "declare",
            event = %name,
            payload = std::any::type_name::<T>(),
            "declared event kind"
        );
        Ok(EventKind {
            name,
            _payload: PhantomData,
        })
    }

    /// Returns true if `name` has been declared.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of declared names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if nothing has been declared.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Forget every declared name.
    ///
    /// Kinds handed out earlier keep working; their names merely become
    /// declarable again.
    pub fn clear(&mut self) {
        self.names.clear();
    }
}
