//! Lazily-populated table of per-key mutual-exclusion handles.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// One exclusive lock per key, created on first use and never evicted.
///
/// Callers for the same key serialize; callers for distinct keys never block
/// each other beyond the brief table lookup. Evicting a handle while another
/// caller still holds it would let two callers mutate the same key, so handles
/// live for the lifetime of the table.
///
/// The guarded value is `()`: the lock protects a check-then-write sequence
/// against the storage collaborator, not in-memory data. Poisoning is ignored
/// for the same reason.
#[derive(Debug)]
pub struct LockTable<K> {
    handles: RwLock<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> LockTable<K> {
    pub fn new() -> Self {
        Self {
            handles: RwLock::new(HashMap::new()),
        }
    }
}

impl<K> Default for LockTable<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> LockTable<K>
where
    K: Copy + Eq + Hash + Ord + core::fmt::Debug,
{
    /// Return the handle for `key`, creating it on first access.
    ///
    /// Double-checked: a shared read covers the common case, and the write
    /// path re-checks through `entry` so racing creators share one handle.
    pub fn handle(&self, key: K) -> Arc<Mutex<()>> {
        {
            let handles = self.handles.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(handle) = handles.get(&key) {
                return handle.clone();
            }
        }

        let mut handles = self.handles.write().unwrap_or_else(PoisonError::into_inner);
        handles
            .entry(key)
            .or_insert_with(|| {
                tracing::debug!(key = ?key, "lock handle created");
                Arc::new(Mutex::new(()))
            })
            .clone()
    }

    /// Run `f` while holding the lock for `key`.
    pub fn with_lock<R>(&self, key: K, f: impl FnOnce() -> R) -> R {
        let handle = self.handle(key);
        let _guard = lock(&handle);
        f()
    }

    /// Run `f` while holding the locks for every key in `keys`.
    ///
    /// Locks are taken in ascending key order (duplicates collapsed), so two
    /// callers with overlapping key sets cannot deadlock.
    pub fn with_locks<R>(&self, keys: impl IntoIterator<Item = K>, f: impl FnOnce() -> R) -> R {
        let mut keys: Vec<K> = keys.into_iter().collect();
        keys.sort();
        keys.dedup();

        let handles: Vec<Arc<Mutex<()>>> = keys.iter().map(|k| self.handle(*k)).collect();
        let _guards: Vec<MutexGuard<'_, ()>> = handles.iter().map(|h| lock(h)).collect();
        f()
    }

    /// Number of keys that have ever been locked.
    pub fn len(&self) -> usize {
        self.handles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock(handle: &Mutex<()>) -> MutexGuard<'_, ()> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}
