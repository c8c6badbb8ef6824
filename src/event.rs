//! Event types and their lineage.
//!
//! This module defines [`Event`], the trait implemented by every publishable
//! type, and [`EventPayload`], the object-safe view a handler receives.
//!
//! # Hierarchy Model
//!
//! Rust has no struct inheritance, so the type hierarchy is declared
//! explicitly: every event names its parent through the `Parent` associated
//! type, and a hierarchy root names itself. The *lineage* of an event is the
//! ordered chain of `TypeId`s from the concrete type up to the root, and it
//! drives dispatch: the broker visits each level in order, most specific
//! first, so narrowly-scoped handlers react before cross-cutting ones.
//!
//! The chain is assembled by a monomorphized walk over `Parent` links - a few
//! vector pushes, no runtime reflection. A root terminates the walk because
//! its parent resolves to the type already at the end of the chain.
//!
//! # Example
//!
//! ```rust
//! use cascade::Event;
//!
//! #[derive(Debug)]
//! struct DomainEvent;
//! impl Event for DomainEvent {
//!     type Parent = DomainEvent; // hierarchy root
//! }
//!
//! #[derive(Debug)]
//! struct OrderPlaced { order_id: u64 }
//! impl Event for OrderPlaced {
//!     type Parent = DomainEvent;
//! }
//!
//! // Most specific first, root last.
//! let chain = <OrderPlaced as Event>::lineage();
//! assert_eq!(chain.len(), 2);
//! # let _ = OrderPlaced { order_id: 1 }.order_id;
//! ```

use std::any::{Any, TypeId, type_name};

/// A publishable event type with an explicit place in a type hierarchy.
///
/// Implementors declare their parent via [`Event::Parent`]; a root declares
/// itself. Subscriptions registered on any ancestor type receive descendants
/// at dispatch time.
///
/// Events must be:
/// - `'static`: No borrowed data
/// - `Send + Sync`: Payloads may cross threads between publisher and broker
pub trait Event: Any + Send + Sync {
    /// The parent event type; a hierarchy root sets `Parent = Self`.
    type Parent: Event;

    /// Returns the ancestor chain for this type, from most specific (`Self`)
    /// to least specific (the hierarchy root).
    ///
    /// The chain always contains at least one element and never contains
    /// duplicates.
    fn lineage() -> Vec<TypeId>
    where
        Self: Sized,
    {
        let mut chain = vec![TypeId::of::<Self>()];
        push_ancestors::<Self::Parent>(&mut chain);
        chain
    }
}

/// Appends `E` and its ancestors to the chain, stopping at the root.
///
/// A root's parent resolves back to the root itself, which is exactly the id
/// already at the end of the chain.
fn push_ancestors<E: Event>(chain: &mut Vec<TypeId>) {
    if chain.contains(&TypeId::of::<E>()) {
        return;
    }
    chain.push(TypeId::of::<E>());
    push_ancestors::<E::Parent>(chain);
}

/// Object-safe view of an event payload, as seen by handlers and hooks.
///
/// Every [`Event`] implements this automatically. Handlers receive payloads
/// as `&dyn EventPayload` because a handler subscribed on an ancestor level
/// must accept any descendant; use [`downcast_ref`](dyn EventPayload::downcast_ref)
/// to recover a concrete type.
pub trait EventPayload: Any + Send + Sync {
    /// The ancestor chain of the concrete payload type, most specific first.
    fn lineage(&self) -> Vec<TypeId>;

    /// Upcast to `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Full type name of the concrete payload, for diagnostics.
    fn event_name(&self) -> &'static str;
}

impl<E: Event> EventPayload for E {
    fn lineage(&self) -> Vec<TypeId> {
        E::lineage()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn event_name(&self) -> &'static str {
        type_name::<E>()
    }
}

impl dyn EventPayload {
    /// Returns a reference to the concrete payload if it is exactly `E`.
    ///
    /// Note this matches the concrete type only - a payload published as a
    /// descendant does not downcast to an ancestor type.
    #[inline]
    pub fn downcast_ref<E: Event>(&self) -> Option<&E> {
        self.as_any().downcast_ref::<E>()
    }

    /// Returns `true` if the concrete payload type is exactly `E`.
    #[inline]
    pub fn is<E: Event>(&self) -> bool {
        self.as_any().is::<E>()
    }
}
