//! The typed publish/subscribe broker.
//!
//! This module provides [`Broker`], the central dispatcher that routes
//! published payloads to registered handlers based on the payload's type
//! lineage.
//!
//! # Dispatch Walk
//!
//! A publish proceeds in a fixed order on the calling thread:
//!
//! 1. An absent payload fails with [`PublishError::NullPayload`] before
//!    anything else runs.
//! 2. The `publishing` hooks fire unconditionally.
//! 3. The payload's lineage is walked most specific first. Each level takes a
//!    point-in-time snapshot of that type's subscriptions and invokes the
//!    matching ones in registration order.
//! 4. On full success the `published` hooks fire exactly once.
//!
//! Dispatch is **fail-fast**: the first handler error aborts the current
//! level, skips every broader level, suppresses the `published` hooks, and
//! surfaces to the caller. Handlers are deliberately not isolated from each
//! other - a broken handler must not be silently skipped over.
//!
//! # Concurrency
//!
//! `Broker` is `Send + Sync`. Subscribe, unsubscribe, and publish may be
//! called concurrently from any threads; snapshots decouple an in-flight
//! publish from concurrent registry mutation, and independent publishes never
//! serialize against each other. There is no scheduler underneath: handlers
//! run synchronously on whichever thread called `publish`.
//!
//! # Example
//!
//! ```rust
//! use std::any::Any;
//! use cascade::{Broker, Event, EventPayload, Handler};
//!
//! #[derive(Debug)]
//! struct AppEvent;
//! impl Event for AppEvent {
//!     type Parent = AppEvent;
//! }
//!
//! #[derive(Debug)]
//! struct UserRegistered { name: &'static str }
//! impl Event for UserRegistered {
//!     type Parent = AppEvent;
//! }
//!
//! let broker = Broker::new();
//!
//! // Fires for UserRegistered and any other AppEvent descendant.
//! broker.subscribe::<AppEvent>(Handler::closure(|_sender, payload| {
//!     println!("audit: {}", payload.event_name());
//!     Ok(())
//! }));
//!
//! // Fires only for UserRegistered payloads named "ada".
//! broker.subscribe_where::<UserRegistered>(
//!     |payload| payload.downcast_ref::<UserRegistered>().is_some_and(|e| e.name == "ada"),
//!     Handler::closure(|_, _| Ok(())),
//! );
//!
//! broker.publish(&(), Some(&UserRegistered { name: "ada" }))?;
//! # Ok::<(), cascade::PublishError>(())
//! ```

use std::any::{Any, TypeId};

use crate::error::PublishError;
use crate::event::{Event, EventPayload};
use crate::handler::{Handler, Predicate};
use crate::hooks::Broadcast;
use crate::registry::Registry;

/// Type-hierarchy-aware publish/subscribe dispatcher.
pub struct Broker {
    registry: Registry,
    publishing: Broadcast,
    published: Broadcast,
}

impl Broker {
    /// Creates a broker with no subscriptions and no hooks.
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            publishing: Broadcast::new(),
            published: Broadcast::new(),
        }
    }

    /// Subscribes `handler` to event type `E`.
    ///
    /// The handler also fires for every descendant of `E`. Subscribing the
    /// same handler twice yields two entries, both of which fire.
    pub fn subscribe<E: Event>(&self, handler: Handler) {
        self.registry.subscribe(TypeId::of::<E>(), None, handler);
    }

    /// Subscribes `handler` to event type `E`, gated by `predicate`.
    ///
    /// The predicate is evaluated against the payload at dispatch time; the
    /// handler fires only if it returns `true`.
    pub fn subscribe_where<E: Event>(
        &self,
        predicate: impl Fn(&dyn EventPayload) -> bool + Send + Sync + 'static,
        handler: Handler,
    ) {
        self.registry
            .subscribe(TypeId::of::<E>(), Some(std::sync::Arc::new(predicate)), handler);
    }

    /// Subscribes `handler` under a runtime type id, for callers that resolve
    /// event types dynamically.
    pub fn subscribe_raw(
        &self,
        event_type: TypeId,
        predicate: Option<Predicate>,
        handler: Handler,
    ) {
        self.registry.subscribe(event_type, predicate, handler);
    }

    /// Removes every subscription whose handler is identity-equal to
    /// `handler`, across all event types and regardless of predicates.
    ///
    /// Returns `true` if at least one entry was removed. Unsubscribing an
    /// unknown handler is a no-op returning `false`.
    pub fn unsubscribe(&self, handler: &Handler) -> bool {
        self.registry.unsubscribe(handler.id())
    }

    /// Hooks fired before any handler, for every publish with a payload.
    pub fn publishing(&self) -> &Broadcast {
        &self.publishing
    }

    /// Hooks fired after a fully successful dispatch, exactly once.
    pub fn published(&self) -> &Broadcast {
        &self.published
    }

    /// Number of subscriptions currently registered for exactly `E`.
    pub fn subscription_count<E: Event>(&self) -> usize {
        self.registry.subscription_count(TypeId::of::<E>())
    }

    /// Publishes `payload` to every matching subscription.
    ///
    /// See the module docs for the dispatch walk and the fail-fast contract.
    /// `sender` is an opaque origin tag forwarded to handlers and hooks;
    /// callers with nothing meaningful to pass use `&()`.
    ///
    /// # Errors
    ///
    /// - [`PublishError::NullPayload`] if `payload` is `None`; no hook fires.
    /// - [`PublishError::Handler`] carrying the first handler error.
    pub fn publish(
        &self,
        sender: &dyn Any,
        payload: Option<&dyn EventPayload>,
    ) -> Result<(), PublishError> {
        let payload = payload.ok_or(PublishError::NullPayload)?;
        self.publishing.emit(sender, payload);

        log::trace!("dispatching {}", payload.event_name());
        for level in payload.lineage() {
            for entry in self.registry.snapshot(level) {
                if entry.matches(payload) {
                    entry
                        .handler()
                        .invoke(sender, payload)
                        .map_err(PublishError::Handler)?;
                }
            }
        }

        self.published.emit(sender, payload);
        Ok(())
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}
