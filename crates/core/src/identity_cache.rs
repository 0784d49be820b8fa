//! Process-wide map from [`MediaId`] to the live record instance.
//!
//! Loaders consult the cache before building a record so that repeated
//! loads of the same row hand out one shared instance.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::types::MediaId;

/// Key-value store of shared media records.
///
/// Values are handed out as `Arc`s; the cache and every caller alias the
/// same instance. Eviction is entirely up to the implementation.
pub trait IdentityCache<T>: Send + Sync {
    fn get(&self, id: MediaId) -> Option<Arc<T>>;
    fn put(&self, id: MediaId, value: Arc<T>);
}

/// Map size below which [`WeakIdentityCache`] never sweeps.
pub const MIN_SWEEP_THRESHOLD: usize = 64;

/// Identity cache holding weak references.
///
/// An entry lives as long as some caller still holds the record. A dead
/// entry is dropped when a lookup finds it, or by a full sweep once the map
/// reaches a threshold that doubles with the live count after each sweep,
/// so bulk inserts stay amortized O(1).
pub struct WeakIdentityCache<T> {
    inner: Mutex<Entries<T>>,
}

struct Entries<T> {
    map: HashMap<MediaId, Weak<T>>,
    sweep_at: usize,
}

impl<T> Entries<T> {
    fn sweep(&mut self) {
        self.map.retain(|_, weak| weak.strong_count() > 0);
        self.sweep_at = (self.map.len() * 2).max(MIN_SWEEP_THRESHOLD);
    }
}

impl<T> WeakIdentityCache<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Entries {
                map: HashMap::new(),
                sweep_at: MIN_SWEEP_THRESHOLD,
            }),
        }
    }

    /// Number of entries whose record is still alive.
    pub fn len(&self) -> usize {
        self.lock()
            .map
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A poisoned map is still structurally valid; keep serving it.
    fn lock(&self) -> MutexGuard<'_, Entries<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for WeakIdentityCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync> IdentityCache<T> for WeakIdentityCache<T> {
    fn get(&self, id: MediaId) -> Option<Arc<T>> {
        let mut entries = self.lock();
        let found = entries.map.get(&id)?.upgrade();
        if found.is_none() {
            entries.map.remove(&id);
        }
        found
    }

    fn put(&self, id: MediaId, value: Arc<T>) {
        let mut entries = self.lock();
        if entries.map.len() >= entries.sweep_at {
            entries.sweep();
            tracing::trace!(live = entries.map.len(), "Swept identity cache");
        }
        entries.map.insert(id, Arc::downgrade(&value));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
