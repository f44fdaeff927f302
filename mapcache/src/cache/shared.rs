//! Mutex-guarded handle for sharing one cache between threads.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use super::loader::MapDataLoader;
use super::map_data_cache::MapDataCache;

/// Cloneable handle to a [`MapDataCache`] behind a mutex.
///
/// Holding the guard from [`lock`](Self::lock) across several calls makes a
/// read-modify-write sequence atomic with respect to other handles.
pub struct SharedMapDataCache<L> {
    inner: Arc<Mutex<MapDataCache<L>>>,
}

impl<L> Clone for SharedMapDataCache<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: MapDataLoader> SharedMapDataCache<L> {
    pub fn new(cache: MapDataCache<L>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    /// Locks the cache until the guard is dropped.
    pub fn lock(&self) -> MutexGuard<'_, MapDataCache<L>> {
        self.inner.lock()
    }

    /// Runs `f` with exclusive access to the cache.
    pub fn with<R>(&self, f: impl FnOnce(&mut MapDataCache<L>) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }
}

impl<L: MapDataLoader> From<MapDataCache<L>> for SharedMapDataCache<L> {
    fn from(cache: MapDataCache<L>) -> Self {
        Self::new(cache)
    }
}
