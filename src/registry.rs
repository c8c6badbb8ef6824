//! Per-type subscription storage.
//!
//! [`Registry`] maps each event `TypeId` to the ordered list of subscriptions
//! registered for it. Storage is a sharded concurrent map, so exclusion
//! between mutation and reads holds at the granularity of a single event
//! type's row, and reads hand out point-in-time copies: a publish walking the
//! hierarchy sees, per level, exactly the subscriptions that existed when
//! that level was snapshotted. Concurrent subscribe/unsubscribe calls never
//! perturb an in-flight dispatch.
//!
//! Rows exist only for types that have been subscribed to; a row emptied by
//! unsubscription is dropped.

use std::any::TypeId;

use dashmap::DashMap;

use crate::event::EventPayload;
use crate::handler::{Handler, HandlerId, Predicate};

/// One registration record: handler plus optional predicate.
///
/// Entries are immutable once added - they are only ever copied out by
/// snapshots or removed by unsubscription.
#[derive(Clone)]
pub struct Subscription {
    handler: Handler,
    predicate: Option<Predicate>,
}

impl Subscription {
    pub(crate) fn new(handler: Handler, predicate: Option<Predicate>) -> Self {
        Self { handler, predicate }
    }

    /// The registered handler.
    #[inline]
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Whether this entry carries a predicate.
    #[inline]
    pub fn is_filtered(&self) -> bool {
        self.predicate.is_some()
    }

    /// Evaluates the predicate against the payload; no predicate always
    /// matches.
    pub(crate) fn matches(&self, payload: &dyn EventPayload) -> bool {
        match &self.predicate {
            Some(predicate) => predicate(payload),
            None => true,
        }
    }
}

/// Thread-safe map from event type to its ordered subscription list.
pub(crate) struct Registry {
    rows: DashMap<TypeId, Vec<Subscription>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
        }
    }

    /// Appends an entry to the given type's row, creating the row if absent.
    /// Duplicates are allowed and yield independent entries.
    pub fn subscribe(&self, event_type: TypeId, predicate: Option<Predicate>, handler: Handler) {
        self.rows
            .entry(event_type)
            .or_default()
            .push(Subscription::new(handler, predicate));
    }

    /// Returns a point-in-time copy of the row for `event_type`, in
    /// registration order; empty if the type was never subscribed to.
    ///
    /// The copy is taken under the row's shard lock, so it is atomic with
    /// respect to concurrent mutation of that row.
    pub fn snapshot(&self, event_type: TypeId) -> Vec<Subscription> {
        self.rows
            .get(&event_type)
            .map(|row| row.clone())
            .unwrap_or_default()
    }

    /// Removes every entry across every row whose handler is identity-equal
    /// to `id`, regardless of predicate or event type. Rows left empty are
    /// dropped. Returns whether anything was removed; a miss is a no-op.
    pub fn unsubscribe(&self, id: HandlerId) -> bool {
        let mut removed = false;
        self.rows.retain(|_, row| {
            let before = row.len();
            row.retain(|entry| entry.handler.id() != id);
            removed |= row.len() != before;
            !row.is_empty()
        });
        removed
    }

    /// Number of entries currently registered for `event_type`.
    pub fn subscription_count(&self, event_type: TypeId) -> usize {
        self.rows.get(&event_type).map_or(0, |row| row.len())
    }

    /// `true` if no type has any registered entry.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
