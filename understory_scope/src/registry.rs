// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-scope handler table: subscribe, publish, filter, prune.
//!
//! ## Overview
//!
//! A [`Registry`] keeps, for every event name, an ordered list of subscriptions.
//! [`Registry::publish`] walks the list for the envelope's name in insertion order
//! and calls each live handler whose predicate accepts the envelope.
//! Nothing propagates to parent or child scopes; callers pick the registry they
//! publish on.
//!
//! ## Retention
//!
//! Handlers are owned by the caller as `Rc<Handler<T>>`.
//! - [`Retention::Weak`] (the default) stores a `Weak`: once the caller drops its
//!   last `Rc`, the subscription is stale. The next publish for that name skips it
//!   and removes it.
//! - [`Retention::Strong`] stores a clone of the `Rc`, keeping the handler (and
//!   whatever it captures) alive as long as the registry. Meant for long-lived
//!   features, not for transient tree nodes.
//!
//! ## Re-entrancy
//!
//! `publish` dispatches over a snapshot of the list and holds no borrow while
//! handlers run, so a handler may subscribe, unsubscribe or publish on the same
//! registry. Subscriptions added or removed during a pass take effect on the next pass.
//! Publishing the same name from its own handler recurses without a guard.
//!
//! ## Failures
//!
//! A handler error stops the pass: later subscribers are not called and the error
//! is returned as [`ScopeError::Handler`]. Stale subscriptions seen before the
//! failure are still pruned.

use std::any::{Any, TypeId, type_name};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::{HandlerError, ScopeError};
use crate::event::{EventEnvelope, EventName};

/// A subscribed callback for envelopes carrying `T`.
///
/// Construct with [`Handler::new`] or [`Handler::fallible`]; both return the
/// `Rc` the caller keeps to control the handler's lifetime.
pub struct Handler<T> {
    callback: Box<dyn Fn(&EventEnvelope<T>) -> Result<(), HandlerError>>,
}

impl<T: 'static> Handler<T> {
    /// Wrap an infallible callback.
    pub fn new(f: impl Fn(&EventEnvelope<T>) + 'static) -> Rc<Self> {
        Rc::new(Self {
            callback: Box::new(move |env: &EventEnvelope<T>| -> Result<(), HandlerError> {
                f(env);
                Ok(())
            }),
        })
    }

    /// Wrap a callback whose error aborts the dispatch pass.
    pub fn fallible<E>(f: impl Fn(&EventEnvelope<T>) -> Result<(), E> + 'static) -> Rc<Self>
    where
        E: Into<HandlerError>,
    {
        Rc::new(Self {
            callback: Box::new(move |env: &EventEnvelope<T>| -> Result<(), HandlerError> {
                f(env).map_err(Into::into)
            }),
        })
    }

    /// Invoke the callback directly.
    pub fn call(&self, envelope: &EventEnvelope<T>) -> Result<(), HandlerError> {
        (self.callback)(envelope)
    }
}

impl<T> fmt::Debug for Handler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("payload", &type_name::<T>())
            .finish_non_exhaustive()
    }
}

/// Narrows delivery to envelopes it accepts. Must not mutate state.
pub type Predicate<T> = Rc<dyn Fn(&EventEnvelope<T>) -> bool>;

/// Whether the registry keeps a handler alive.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Retention {
    /// Observe the handler without owning it.
    #[default]
    Weak,
    /// Own the handler for the registry's lifetime.
    Strong,
}

/// Options for [`Registry::subscribe`].
///
/// ```
/// use understory_scope::registry::{Retention, SubscribeOptions};
///
/// let opts = SubscribeOptions::<u32>::strong().predicate(|e| *e.value() > 3);
/// assert_eq!(opts.retention(), Retention::Strong);
/// ```
pub struct SubscribeOptions<T> {
    retain: Retention,
    predicate: Option<Predicate<T>>,
}

impl<T> Default for SubscribeOptions<T> {
    fn default() -> Self {
        Self {
            retain: Retention::default(),
            predicate: None,
        }
    }
}

impl<T> SubscribeOptions<T> {
    /// Weak retention, no predicate.
    pub fn weak() -> Self {
        Self::default()
    }

    /// Strong retention, no predicate.
    pub fn strong() -> Self {
        Self::default().retain(Retention::Strong)
    }

    /// Set the retention.
    #[must_use]
    pub fn retain(mut self, retain: Retention) -> Self {
        self.retain = retain;
        self
    }

    /// Only deliver envelopes for which `predicate` returns true.
    #[must_use]
    pub fn predicate(mut self, predicate: impl Fn(&EventEnvelope<T>) -> bool + 'static) -> Self {
        self.predicate = Some(Rc::new(predicate));
        self
    }

    /// Configured retention.
    pub fn retention(&self) -> Retention {
        self.retain
    }
}

impl<T> fmt::Debug for SubscribeOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscribeOptions")
            .field("retain", &self.retain)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

enum HandlerRef<T> {
    Strong(Rc<Handler<T>>),
    Weak(Weak<Handler<T>>),
}

impl<T> HandlerRef<T> {
    fn resolve(&self) -> Option<Rc<Handler<T>>> {
        match self {
            Self::Strong(h) => Some(Rc::clone(h)),
            Self::Weak(w) => w.upgrade(),
        }
    }

    fn points_to(&self, handler: &Rc<Handler<T>>) -> bool {
        match self {
            Self::Strong(h) => Rc::ptr_eq(h, handler),
            Self::Weak(w) => std::ptr::eq(w.as_ptr(), Rc::as_ptr(handler)),
        }
    }
}

struct Subscription<T> {
    handler: HandlerRef<T>,
    predicate: Option<Predicate<T>>,
}

/// Type-erased view of a `Subscription<T>`, so one table can hold every payload type.
trait Record {
    fn is_stale(&self) -> bool;
    fn as_any(&self) -> &dyn Any;
}

impl<T: 'static> Record for Subscription<T> {
    fn is_stale(&self) -> bool {
        match &self.handler {
            HandlerRef::Strong(_) => false,
            HandlerRef::Weak(w) => w.strong_count() == 0,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// Records are compared by address of the subscription itself, not by handler.
fn same_record(a: &Rc<dyn Record>, b: &Rc<dyn Record>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

struct EventSlot {
    payload: TypeId,
    payload_name: &'static str,
    subscriptions: Vec<Rc<dyn Record>>,
}

impl EventSlot {
    fn new<T: 'static>() -> Self {
        Self {
            payload: TypeId::of::<T>(),
            payload_name: type_name::<T>(),
            subscriptions: Vec::new(),
        }
    }

    fn check<T: 'static>(&self, event: &str) -> Result<(), ScopeError> {
        if self.payload == TypeId::of::<T>() {
            Ok(())
        } else {
            Err(ScopeError::PayloadMismatch {
                event: event.to_owned(),
                expected: self.payload_name,
                found: type_name::<T>(),
            })
        }
    }
}

struct Inner {
    scope_name: Rc<str>,
    events: RefCell<HashMap<Rc<str>, EventSlot>>,
}

/// Handler table for one scope.
///
/// `Registry` is a cheap handle: clones share the same table, and equality is
/// instance identity.
#[derive(Clone)]
pub struct Registry {
    inner: Rc<Inner>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let events = self.inner.events.borrow();
        let subscriptions: usize = events.values().map(|s| s.subscriptions.len()).sum();
        f.debug_struct("Registry")
            .field("scope_name", &&*self.inner.scope_name)
            .field("events", &events.len())
            .field("subscriptions", &subscriptions)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Registry {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Registry {}

impl Registry {
    /// Create an empty registry for the scope `scope_name`.
    ///
    /// Scopes attached to a hierarchy are normally created by
    /// [`ScopeResolver`](crate::resolver::ScopeResolver), which also runs features.
    pub fn new(scope_name: impl Into<Rc<str>>) -> Self {
        Self {
            inner: Rc::new(Inner {
                scope_name: scope_name.into(),
                events: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Name of the scope (the position identifier it was created for).
    pub fn scope_name(&self) -> &str {
        &self.inner.scope_name
    }

    /// Returns true if both handles refer to the same registry.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Append a subscription for `event`.
    ///
    /// The first subscription for a name binds that name to payload type `T`
    /// in this registry; a later call with another type fails with
    /// [`ScopeError::PayloadMismatch`]. The binding ends once the name has no
    /// subscriptions left.
    pub fn subscribe<T: 'static>(
        &self,
        event: impl EventName,
        handler: &Rc<Handler<T>>,
        options: SubscribeOptions<T>,
    ) -> Result<(), ScopeError> {
        let name = event.event_name();
        if name.is_empty() {
            return Err(ScopeError::EmptyEventName);
        }
        let handler_ref = match options.retain {
            Retention::Strong => HandlerRef::Strong(Rc::clone(handler)),
            Retention::Weak => HandlerRef::Weak(Rc::downgrade(handler)),
        };
        let record: Rc<dyn Record> = Rc::new(Subscription {
            handler: handler_ref,
            predicate: options.predicate,
        });

        let mut events = self.inner.events.borrow_mut();
        let slot = events
            .entry(Rc::from(name))
            .or_insert_with(EventSlot::new::<T>);
        if slot.subscriptions.is_empty() {
            *slot = EventSlot::new::<T>();
        }
        slot.check::<T>(name)?;
        slot.subscriptions.push(record);
        tracing::trace!(
            action = "subscribe",
            scope = %self.inner.scope_name,
            event = name,
            retain = ?options.retain,
            subscribers = slot.subscriptions.len(),
            "subscribed handler"
        );
        Ok(())
    }

    /// Subscribe a closure, held strongly, and return its handler.
    ///
    /// Keep the returned `Rc` if you want to [`unsubscribe`](Self::unsubscribe) later.
    pub fn subscribe_fn<T: 'static>(
        &self,
        event: impl EventName,
        f: impl Fn(&EventEnvelope<T>) + 'static,
    ) -> Result<Rc<Handler<T>>, ScopeError> {
        let handler = Handler::new(f);
        self.subscribe(event, &handler, SubscribeOptions::strong())?;
        Ok(handler)
    }

    /// Remove every subscription of `handler` to `event`. Returns how many were removed.
    pub fn unsubscribe<T: 'static>(&self, event: impl EventName, handler: &Rc<Handler<T>>) -> usize {
        let name = event.event_name();
        let mut events = self.inner.events.borrow_mut();
        let Some(slot) = events.get_mut(name) else {
            return 0;
        };
        let before = slot.subscriptions.len();
        slot.subscriptions.retain(|record| {
            !record
                .as_any()
                .downcast_ref::<Subscription<T>>()
                .is_some_and(|sub| sub.handler.points_to(handler))
        });
        let removed = before - slot.subscriptions.len();
        if slot.subscriptions.is_empty() {
            events.remove(name);
        }
        if removed > 0 {
            tracing::debug!(
                action = "unsubscribe",
                scope = %self.inner.scope_name,
                event = name,
                removed,
                "removed subscriptions"
            );
        }
        removed
    }

    /// Deliver `envelope` to this registry's subscribers for its name.
    ///
    /// Subscribers run synchronously, in subscription order, and all of them
    /// have returned when this does. Publishing a name nobody subscribed to is
    /// a no-op.
    pub fn publish<T: 'static>(&self, envelope: &EventEnvelope<T>) -> Result<(), ScopeError> {
        let name = envelope.name();
        let snapshot = {
            let events = self.inner.events.borrow();
            let Some(slot) = events.get(name).filter(|slot| !slot.subscriptions.is_empty())
            else {
                tracing::trace!(
                    scope = %self.inner.scope_name,
                    event = name,
                    "no subscribers"
                );
                return Ok(());
            };
            slot.check::<T>(name)?;
            slot.subscriptions.clone()
        };

        let mut stale: Vec<Rc<dyn Record>> = Vec::new();
        let mut outcome = Ok(());
        for record in &snapshot {
            let Some(sub) = record.as_any().downcast_ref::<Subscription<T>>() else {
                continue;
            };
            let Some(handler) = sub.handler.resolve() else {
                stale.push(Rc::clone(record));
                continue;
            };
            if let Some(predicate) = &sub.predicate
                && !predicate(envelope)
            {
                continue;
            }
            if let Err(source) = handler.call(envelope) {
                tracing::warn!(
                    scope = %self.inner.scope_name,
                    event = name,
                    error = %source,
                    "handler failed; aborting dispatch"
                );
                outcome = Err(ScopeError::Handler {
                    event: name.to_owned(),
                    source,
                });
                break;
            }
        }

        if !stale.is_empty() {
            self.compact(name, &stale);
        }
        outcome
    }

    /// Drop every stale weak subscription, for all event names. Returns how many were removed.
    ///
    /// `publish` already prunes lazily; this is for hosts that want to reclaim
    /// memory for names that are rarely published.
    pub fn prune_stale(&self) -> usize {
        let mut events = self.inner.events.borrow_mut();
        let mut removed = 0;
        events.retain(|_, slot| {
            let before = slot.subscriptions.len();
            slot.subscriptions.retain(|record| !record.is_stale());
            removed += before - slot.subscriptions.len();
            !slot.subscriptions.is_empty()
        });
        if removed > 0 {
            tracing::debug!(
                action = "prune",
                scope = %self.inner.scope_name,
                removed,
                "pruned stale subscriptions"
            );
        }
        removed
    }

    /// Number of subscriptions recorded for `event`, including stale ones not yet pruned.
    pub fn subscriber_count(&self, event: impl EventName) -> usize {
        self.inner
            .events
            .borrow()
            .get(event.event_name())
            .map_or(0, |slot| slot.subscriptions.len())
    }

    /// Names with at least one recorded subscription in this registry, sorted.
    ///
    /// Stale weak subscriptions count until they are pruned.
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .events
            .borrow()
            .keys()
            .map(|n| n.to_string())
            .collect();
        names.sort_unstable();
        names
    }

    fn compact(&self, name: &str, stale: &[Rc<dyn Record>]) {
        let mut events = self.inner.events.borrow_mut();
        let Some(slot) = events.get_mut(name) else {
            return;
        };
        let before = slot.subscriptions.len();
        slot.subscriptions
            .retain(|record| !stale.iter().any(|s| same_record(s, record)));
        let removed = before - slot.subscriptions.len();
        if slot.subscriptions.is_empty() {
            events.remove(name);
        }
        tracing::debug!(
            action = "prune",
            scope = %self.inner.scope_name,
            event = name,
            removed,
            "pruned stale subscriptions"
        );
    }
}
