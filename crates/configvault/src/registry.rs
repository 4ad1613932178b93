//! Managed registry of change handlers with unsubscribe-on-drop handles.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, Weak},
};

type Handler = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    handlers: BTreeMap<u64, Handler>,
}

/// Change handlers in subscription order, dispatched synchronously.
#[derive(Default)]
pub(crate) struct ChangeRegistry {
    inner: Mutex<RegistryInner>,
}

impl ChangeRegistry {
    /// Register `handler` and hand back the handle that keeps it alive.
    pub(crate) fn subscribe(
        registry: &Arc<Self>,
        handler: impl Fn() + Send + Sync + 'static,
    ) -> Subscription {
        let id = {
            let mut inner = registry.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.handlers.insert(id, Arc::new(handler));
            id
        };
        Subscription {
            id,
            registry: Arc::downgrade(registry),
        }
    }

    /// Invoke every live handler. A panicking handler is logged and skipped
    /// so it cannot starve the ones registered after it.
    pub(crate) fn dispatch(&self) {
        let snapshot: Vec<Handler> = self.lock().handlers.values().cloned().collect();
        for handler in snapshot {
            if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler())).is_err() {
                tracing::warn!("config change handler panicked");
            }
        }
    }

    fn unregister(&self, id: u64) {
        self.lock().handlers.remove(&id);
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            // Handlers run outside the lock, so the map is never left torn.
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Keeps one change handler registered; dropping it unsubscribes.
#[must_use = "dropping a Subscription immediately unsubscribes its handler"]
pub struct Subscription {
    id: u64,
    registry: Weak<ChangeRegistry>,
}

impl Subscription {
    /// Unsubscribe now; equivalent to dropping the handle.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(self.id);
        }
    }
}
