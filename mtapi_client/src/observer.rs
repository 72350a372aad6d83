//! Observer registries keyed by subscription handle.
//!
//! Registration and delivery may happen concurrently from any thread.
//! Delivery works on a snapshot taken under the lock, so an observer can
//! (un)subscribe from inside its own callback. A panicking observer is
//! logged and skipped; the remaining observers still run.
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::warn;

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

/// Handle returned by every `on_*` registration; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    fn next() -> Self {
        SubscriptionId(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed))
    }
}

/// Ordered list of observers of one notification kind.
pub struct ObserverRegistry<F: ?Sized> {
    entries: Mutex<Vec<(SubscriptionId, Arc<F>)>>,
}

impl<F: ?Sized> Default for ObserverRegistry<F> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl<F: ?Sized> ObserverRegistry<F> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an observer; it is called after every observer registered before it.
    pub fn register(&self, observer: Arc<F>) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.lock().push((id, observer));
        id
    }

    /// Removes an observer. Returns `false` if the handle is not registered here.
    pub fn unregister(&self, id: SubscriptionId) -> bool {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    /// Calls `deliver` once per observer, in registration order.
    pub fn notify(&self, kind: &str, deliver: impl Fn(&F)) {
        let snapshot: Vec<Arc<F>> = self
            .lock()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in snapshot {
            if panic::catch_unwind(AssertUnwindSafe(|| deliver(&observer))).is_err() {
                warn!("A {} observer panicked; continuing with the rest", kind);
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Arc<F>)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Listener = dyn Fn(u32) + Send + Sync;

    #[test]
    fn delivers_in_registration_order() {
        let registry: ObserverRegistry<Listener> = ObserverRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for tag in ["a", "b", "c"] {
            let seen = Arc::clone(&seen);
            registry.register(Arc::new(move |v: u32| seen.lock().unwrap().push((tag, v))));
        }
        registry.notify("test", |observer| observer(5));
        assert_eq!(*seen.lock().unwrap(), vec![("a", 5), ("b", 5), ("c", 5)]);
    }

    #[test]
    fn unregister_removes_only_that_observer() {
        let registry: ObserverRegistry<Listener> = ObserverRegistry::new();
        let first = registry.register(Arc::new(|_: u32| {}));
        let second = registry.register(Arc::new(|_: u32| {}));
        assert_ne!(first, second);
        assert!(registry.unregister(first));
        assert!(!registry.unregister(first));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn panicking_observer_does_not_stop_delivery() {
        let registry: ObserverRegistry<Listener> = ObserverRegistry::new();
        let hits = Arc::new(AtomicU64::new(0));
        registry.register(Arc::new(|_: u32| panic!("observer failure")));
        let counter = Arc::clone(&hits);
        registry.register(Arc::new(move |_: u32| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        registry.notify("test", |observer| observer(1));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
