//! Handlers: callables with a derivable identity.
//!
//! A [`Handler`] couples the callable invoked at dispatch time with a
//! [`HandlerId`] used for unsubscription. Identity is structural and never
//! considers the event type or predicate a handler was registered under:
//!
//! - [`Handler::from_fn`] and [`Handler::bound`] derive identity from the
//!   function pointer (plus the receiver's address for bound methods), so two
//!   independently built handlers over the same function compare equal.
//! - [`Handler::closure`] derives identity from the closure's allocation, so
//!   only clones of the same `Handler` compare equal.
//!
//! Handlers return a `Result`: an `Err` aborts the in-flight publish
//! immediately (fail-fast) and surfaces to the publisher.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::event::EventPayload;

/// Error raised by a handler; propagated verbatim to the publisher.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result of a single handler invocation.
pub type HandlerResult = Result<(), HandlerError>;

/// Optional per-subscription filter, evaluated against the payload at
/// dispatch time. Absence means "always matches".
pub type Predicate = Arc<dyn Fn(&dyn EventPayload) -> bool + Send + Sync>;

type HandlerFn = dyn Fn(&dyn Any, &dyn EventPayload) -> HandlerResult + Send + Sync;

/// Structural identity of a handler.
///
/// `Eq` and `Hash` are consistent: identity-equal handlers hash equally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerId {
    /// A function pointer, optionally bound to a receiver. Free functions use
    /// receiver address 0.
    Bound { receiver: usize, method: usize },
    /// A closure, identified by its allocation address. Clones share the
    /// allocation and therefore the identity.
    Closure(usize),
}

/// A registered callable: invoked with `(sender, payload)` during dispatch,
/// removed by identity during unsubscription.
///
/// Cloning is cheap and preserves identity - a clone unsubscribes the
/// original.
#[derive(Clone)]
pub struct Handler {
    id: HandlerId,
    call: Arc<HandlerFn>,
}

impl Handler {
    /// Wraps a free function. Identity is the function pointer, so handlers
    /// built twice from the same function are identity-equal.
    pub fn from_fn(f: fn(&dyn Any, &dyn EventPayload) -> HandlerResult) -> Self {
        Self {
            id: HandlerId::Bound {
                receiver: 0,
                method: f as usize,
            },
            call: Arc::new(move |sender, payload| f(sender, payload)),
        }
    }

    /// Wraps a method bound to a shared receiver. Identity is the pair of
    /// receiver address and function pointer, so binding the same method to
    /// the same receiver twice yields identity-equal handlers.
    ///
    /// The handler keeps the receiver alive for as long as it is registered.
    pub fn bound<T: Send + Sync + 'static>(
        receiver: &Arc<T>,
        method: fn(&T, &dyn Any, &dyn EventPayload) -> HandlerResult,
    ) -> Self {
        let target = Arc::clone(receiver);
        Self {
            id: HandlerId::Bound {
                receiver: Arc::as_ptr(receiver) as usize,
                method: method as usize,
            },
            call: Arc::new(move |sender, payload| method(&target, sender, payload)),
        }
    }

    /// Wraps a closure. Identity is the closure instance itself: only clones
    /// of the returned `Handler` compare equal to it.
    pub fn closure(
        f: impl Fn(&dyn Any, &dyn EventPayload) -> HandlerResult + Send + Sync + 'static,
    ) -> Self {
        let call: Arc<HandlerFn> = Arc::new(f);
        let id = HandlerId::Closure(Arc::as_ptr(&call) as *const () as usize);
        Self { id, call }
    }

    /// The structural identity of this handler.
    #[inline]
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Invoke the underlying callable.
    #[inline]
    pub(crate) fn invoke(&self, sender: &dyn Any, payload: &dyn EventPayload) -> HandlerResult {
        (self.call)(sender, payload)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Handler {}

impl Hash for Handler {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.id).finish()
    }
}
