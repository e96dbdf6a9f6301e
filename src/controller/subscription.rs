//! Subscriber lists for session notifications.
//!
//! Dispatch works on a snapshot of the list: handlers are cloned out under the
//! lock and invoked after it is released. A handler may therefore subscribe or
//! unsubscribe (itself or anyone else) while being called; the change applies
//! from the next dispatch on.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Token returned by `subscribe`, used to detach later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Ordered list of handlers of type `H`.
pub struct Subscribers<H: ?Sized> {
    next_id: AtomicU64,
    entries: Mutex<Vec<(SubscriptionId, Arc<H>)>>,
}

impl<H: ?Sized> Default for Subscribers<H> {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl<H: ?Sized> Subscribers<H> {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Arc<H>)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a handler. Handlers are called in subscription order.
    pub fn subscribe(&self, handler: Arc<H>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries().push((id, handler));
        id
    }

    /// Remove a handler. Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    /// Handlers subscribed right now, in order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<H>> {
        self.entries()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect()
    }

}

#[cfg(test)]
impl<H: ?Sized> Subscribers<H> {
    fn len(&self) -> usize {
        self.entries().len()
    }

    fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
