//! Typed in-process event broker with hierarchy-aware dispatch.
//!
//! `cascade` routes published event payloads to registered handlers based on
//! the payload's type hierarchy, optionally filtered by per-subscription
//! predicates, with transaction-scoped publishing on top.
//!
//! # Overview
//!
//! - **Hierarchy dispatch**: events declare an explicit parent type; a
//!   publish walks the payload's lineage most specific first, so handlers on
//!   a concrete type run before cross-cutting handlers on its ancestors.
//! - **Identity-based unsubscription**: a handler is removed from every event
//!   type it was registered under, matched by callable identity and never by
//!   predicate.
//! - **Snapshot reads**: each lineage level dispatches over a point-in-time
//!   copy of that type's subscription list, so concurrent subscribe and
//!   unsubscribe calls never perturb an in-flight publish.
//! - **Fail-fast**: the first handler error aborts the rest of the dispatch
//!   and surfaces to the publisher unchanged.
//! - **Transactions**: [`Broker::publish_in_transaction`] opens caller-owned
//!   resources for the duration of a publish, closes exactly what it opened,
//!   and completes or rolls back an explicit [`TransactionScope`].
//!
//! Everything is synchronous: handlers run on the publishing thread, in
//! sequence, with no runtime underneath.
//!
//! # Example
//!
//! ```rust
//! use cascade::{Broker, Event, EventPayload, Handler};
//!
//! #[derive(Debug)]
//! struct AppEvent;
//! impl Event for AppEvent {
//!     type Parent = AppEvent;
//! }
//!
//! #[derive(Debug)]
//! struct OrderPlaced { total_cents: u64 }
//! impl Event for OrderPlaced {
//!     type Parent = AppEvent;
//! }
//!
//! let broker = Broker::new();
//! broker.subscribe::<AppEvent>(Handler::closure(|_, payload| {
//!     println!("observed {}", payload.event_name());
//!     Ok(())
//! }));
//!
//! broker.publish(&(), Some(&OrderPlaced { total_cents: 1299 }))?;
//! # Ok::<(), cascade::PublishError>(())
//! ```

pub mod broker;
pub mod error;
pub mod event;
pub mod handler;
pub mod hooks;
mod registry;
pub mod transaction;

pub use broker::Broker;
pub use error::PublishError;
pub use event::{Event, EventPayload};
pub use handler::{Handler, HandlerError, HandlerId, HandlerResult, Predicate};
pub use hooks::{Broadcast, HookId};
pub use registry::Subscription;
pub use transaction::{ResourceError, SharedResource, TransactionScope};
