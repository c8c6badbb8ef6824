//! Transaction-scoped publishing.
//!
//! [`Broker::publish_in_transaction`] wraps a publish in a caller-supplied
//! transactional boundary and keeps a caller-supplied set of shared resources
//! open for its duration:
//!
//! 1. Every resource that is not already open is opened and recorded in a
//!    local opened-by-me set; already-open resources are left untouched.
//! 2. The publish runs.
//! 3. Exactly the recorded resources are closed again, success or not. A
//!    close failure is logged and never alters the publish outcome.
//! 4. The scope is completed only if the publish succeeded, and rolled back
//!    otherwise - commit is an explicit call, never inferred from drop.
//!
//! Both the scope and the resources are external collaborators: the broker
//! sees them only through the [`TransactionScope`] and [`SharedResource`]
//! traits and never owns them.

use std::any::Any;

use crate::broker::Broker;
use crate::error::PublishError;
use crate::event::EventPayload;

/// Error raised by a resource handle while opening or closing.
pub type ResourceError = Box<dyn std::error::Error + Send + Sync>;

/// An externally owned resource handle (e.g. a connection) that must be open
/// while a transactional publish runs.
pub trait SharedResource: Send + Sync {
    /// Whether the resource is currently open.
    fn is_open(&self) -> bool;

    /// Opens the resource. Only called when [`is_open`](Self::is_open) is
    /// `false`.
    fn open(&self) -> Result<(), ResourceError>;

    /// Closes the resource. Only called for resources the broker itself
    /// opened and that are still open.
    fn close(&self) -> Result<(), ResourceError>;
}

/// A transactional boundary under which handler-side resource work commits or
/// rolls back atomically with the publish.
///
/// The broker calls exactly one of the two methods, at most once, after the
/// resource close pass.
pub trait TransactionScope {
    /// Marks the transactional work as complete (commit).
    fn complete(&mut self);

    /// Discards the transactional work.
    fn rollback(&mut self);
}

impl Broker {
    /// Publishes `payload` inside `scope`, keeping `resources` open for the
    /// duration of the dispatch.
    ///
    /// Failure modes are those of [`Broker::publish`], plus
    /// [`PublishError::Resource`] when a closed resource cannot be opened.
    /// Whatever the outcome, resources this call opened are closed again
    /// (close failures are logged, not returned), and the scope is completed
    /// on success or rolled back on failure.
    pub fn publish_in_transaction(
        &self,
        sender: &dyn Any,
        payload: Option<&dyn EventPayload>,
        scope: &mut dyn TransactionScope,
        resources: &[&dyn SharedResource],
    ) -> Result<(), PublishError> {
        let mut opened: Vec<&dyn SharedResource> = Vec::new();
        let result = self.open_and_publish(sender, payload, resources, &mut opened);

        for resource in opened {
            // A handler may have closed it already.
            if !resource.is_open() {
                continue;
            }
            if let Err(err) = resource.close() {
                log::error!("cannot close shared resource: {err}");
            }
        }

        match result {
            Ok(()) => {
                scope.complete();
                Ok(())
            }
            Err(err) => {
                scope.rollback();
                Err(err)
            }
        }
    }

    fn open_and_publish<'a>(
        &self,
        sender: &dyn Any,
        payload: Option<&dyn EventPayload>,
        resources: &[&'a dyn SharedResource],
        opened: &mut Vec<&'a dyn SharedResource>,
    ) -> Result<(), PublishError> {
        for resource in resources {
            if !resource.is_open() {
                resource.open().map_err(PublishError::Resource)?;
                opened.push(*resource);
            }
        }
        self.publish(sender, payload)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use super::*;
    use crate::event::Event;
    use crate::handler::Handler;

    #[derive(Debug)]
    struct Saved;
    impl Event for Saved {
        type Parent = Saved;
    }

    #[derive(Default)]
    struct FakeConnection {
        open: AtomicBool,
        opens: AtomicU32,
        closes: AtomicU32,
        fail_close: bool,
    }

    impl FakeConnection {
        fn opened() -> Self {
            Self {
                open: AtomicBool::new(true),
                ..Self::default()
            }
        }
    }

    impl SharedResource for FakeConnection {
        fn is_open(&self) -> bool {
            self.open.load(Ordering::SeqCst)
        }

        fn open(&self) -> Result<(), ResourceError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            self.open.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn close(&self) -> Result<(), ResourceError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            if self.fail_close {
                return Err("close refused".into());
            }
            self.open.store(false, Ordering::SeqCst);
            Ok(())
        }
    }

    /// A resource that cannot be opened at all.
    struct BrokenResource;

    impl SharedResource for BrokenResource {
        fn is_open(&self) -> bool {
            false
        }

        fn open(&self) -> Result<(), ResourceError> {
            Err("no route to host".into())
        }

        fn close(&self) -> Result<(), ResourceError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeScope {
        completed: u32,
        rolled_back: u32,
    }

    impl TransactionScope for FakeScope {
        fn complete(&mut self) {
            self.completed += 1;
        }

        fn rollback(&mut self) {
            self.rolled_back += 1;
        }
    }

    // ==================== Resource lifecycle ====================

    #[test]
    fn opens_only_closed_resources_and_recloses_them() {
        let broker = Broker::new();
        let already_open = FakeConnection::opened();
        let closed = FakeConnection::default();
        let mut scope = FakeScope::default();

        broker
            .publish_in_transaction(&(), Some(&Saved), &mut scope, &[&already_open, &closed])
            .unwrap();

        // The pre-opened resource was never touched.
        assert!(already_open.is_open());
        assert_eq!(already_open.opens.load(Ordering::SeqCst), 0);
        assert_eq!(already_open.closes.load(Ordering::SeqCst), 0);

        // The closed one was opened for the publish and closed afterwards.
        assert!(!closed.is_open());
        assert_eq!(closed.opens.load(Ordering::SeqCst), 1);
        assert_eq!(closed.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn resources_are_open_while_handlers_run() {
        let broker = Broker::new();
        let connection = std::sync::Arc::new(FakeConnection::default());
        let observed = std::sync::Arc::new(AtomicBool::new(false));
        let conn = std::sync::Arc::clone(&connection);
        let seen = std::sync::Arc::clone(&observed);
        broker.subscribe::<Saved>(Handler::closure(move |_, _| {
            seen.store(conn.is_open(), Ordering::SeqCst);
            Ok(())
        }));
        let mut scope = FakeScope::default();

        broker
            .publish_in_transaction(&(), Some(&Saved), &mut scope, &[&*connection])
            .unwrap();

        assert!(observed.load(Ordering::SeqCst));
        assert!(!connection.is_open());
    }

    #[test]
    fn resource_closed_by_a_handler_is_not_reclosed() {
        let broker = Broker::new();
        let connection = std::sync::Arc::new(FakeConnection::default());
        let conn = std::sync::Arc::clone(&connection);
        broker.subscribe::<Saved>(Handler::closure(move |_, _| conn.close()));
        let mut scope = FakeScope::default();

        broker
            .publish_in_transaction(&(), Some(&Saved), &mut scope, &[&*connection])
            .unwrap();

        assert_eq!(connection.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn close_failure_does_not_mask_success_or_skip_other_resources() {
        let broker = Broker::new();
        let stubborn = FakeConnection {
            fail_close: true,
            ..FakeConnection::default()
        };
        let cooperative = FakeConnection::default();
        let mut scope = FakeScope::default();

        broker
            .publish_in_transaction(&(), Some(&Saved), &mut scope, &[&stubborn, &cooperative])
            .unwrap();

        assert_eq!(stubborn.closes.load(Ordering::SeqCst), 1);
        assert!(!cooperative.is_open());
        assert_eq!(scope.completed, 1);
        assert_eq!(scope.rolled_back, 0);
    }

    // ==================== Scope outcome ====================

    #[test]
    fn scope_completes_exactly_once_on_success() {
        let broker = Broker::new();
        let mut scope = FakeScope::default();

        broker
            .publish_in_transaction(&(), Some(&Saved), &mut scope, &[])
            .unwrap();

        assert_eq!(scope.completed, 1);
        assert_eq!(scope.rolled_back, 0);
    }

    #[test]
    fn handler_failure_rolls_back_and_still_closes_resources() {
        let broker = Broker::new();
        broker.subscribe::<Saved>(Handler::closure(|_, _| Err("constraint violated".into())));
        let connection = FakeConnection::default();
        let mut scope = FakeScope::default();

        let err = broker
            .publish_in_transaction(&(), Some(&Saved), &mut scope, &[&connection])
            .unwrap_err();

        assert!(matches!(err, PublishError::Handler(_)));
        assert!(!connection.is_open());
        assert_eq!(connection.closes.load(Ordering::SeqCst), 1);
        assert_eq!(scope.completed, 0);
        assert_eq!(scope.rolled_back, 1);
    }

    #[test]
    fn null_payload_rolls_back_after_closing_resources() {
        let broker = Broker::new();
        let connection = FakeConnection::default();
        let mut scope = FakeScope::default();

        let err = broker
            .publish_in_transaction(&(), None, &mut scope, &[&connection])
            .unwrap_err();

        assert!(matches!(err, PublishError::NullPayload));
        assert!(!connection.is_open());
        assert_eq!(scope.completed, 0);
        assert_eq!(scope.rolled_back, 1);
    }

    #[test]
    fn open_failure_aborts_and_closes_what_was_already_opened() {
        let broker = Broker::new();
        let first = FakeConnection::default();
        let broken = BrokenResource;
        let mut scope = FakeScope::default();

        let err = broker
            .publish_in_transaction(&(), Some(&Saved), &mut scope, &[&first, &broken])
            .unwrap_err();

        assert!(matches!(err, PublishError::Resource(_)));
        assert!(!first.is_open());
        assert_eq!(first.closes.load(Ordering::SeqCst), 1);
        assert_eq!(scope.completed, 0);
        assert_eq!(scope.rolled_back, 1);
    }
}
