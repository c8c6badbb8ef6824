//! Broadcast hook lists for the `publishing`/`published` seams.
//!
//! A [`Broadcast`] is an ordered list of listeners that all fire for every
//! emitted payload, with no type filtering. Listeners attach and detach
//! independently of the type-keyed subscription registry; attach returns a
//! [`HookId`] that the caller keeps for detaching.
//!
//! Hooks observe dispatch, they cannot steer it: the callable signature is
//! infallible, so a hook can neither filter a payload nor abort a publish.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::event::EventPayload;

type HookFn = dyn Fn(&dyn Any, &dyn EventPayload) + Send + Sync;

/// Token identifying an attached hook, returned by [`Broadcast::attach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(u64);

/// An ordered, thread-safe list of unconditional listeners.
pub struct Broadcast {
    next_id: AtomicU64,
    hooks: Mutex<Vec<(HookId, Arc<HookFn>)>>,
}

impl Broadcast {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            hooks: Mutex::new(Vec::new()),
        }
    }

    /// Attaches a listener and returns its detach token. Listeners fire in
    /// attach order.
    pub fn attach(&self, hook: impl Fn(&dyn Any, &dyn EventPayload) + Send + Sync + 'static) -> HookId {
        let id = HookId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.hooks.lock().unwrap().push((id, Arc::new(hook)));
        id
    }

    /// Detaches the listener with the given token. Returns `false` if it was
    /// already detached.
    pub fn detach(&self, id: HookId) -> bool {
        let mut hooks = self.hooks.lock().unwrap();
        let before = hooks.len();
        hooks.retain(|(hook_id, _)| *hook_id != id);
        hooks.len() != before
    }

    /// Number of currently attached listeners.
    pub fn len(&self) -> usize {
        self.hooks.lock().unwrap().len()
    }

    /// `true` if no listener is attached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invokes every attached listener with `(sender, payload)`.
    ///
    /// The list is copied out under the lock and invoked outside it, so a
    /// listener may attach or detach hooks without deadlocking.
    pub(crate) fn emit(&self, sender: &dyn Any, payload: &dyn EventPayload) {
        let snapshot: Vec<Arc<HookFn>> = self
            .hooks
            .lock()
            .unwrap()
            .iter()
            .map(|(_, hook)| Arc::clone(hook))
            .collect();
        for hook in snapshot {
            hook(sender, payload);
        }
    }
}
