//! Concurrent key-value store
//!
//! `SyncMap` is the substrate for the queue table and the consumer table:
//! a `HashMap` behind an `RwLock`, tuned for read-heavy, write-occasional
//! access. Reads proceed concurrently with other reads; any write excludes
//! everything else on the same map instance.
//!
//! Lock poisoning (a panic on another thread while it held the guard)
//! propagates the panic rather than limping on with state of unknown
//! consistency.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

/// Typed, catchable condition for the must-exist accessor
/// [`SyncMap::get_required`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("key not found")]
pub struct KeyNotFound;

#[derive(Debug)]
pub struct SyncMap<K, V> {
    inner: RwLock<HashMap<K, V>>,
}

impl<K, V> Default for SyncMap<K, V> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash, V> SyncMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. Returns the previous value, if any.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.inner.write().unwrap().insert(key, value)
    }

    /// Remove the entry. Returns whether it existed.
    pub fn remove(&self, key: &K) -> bool {
        self.inner.write().unwrap().remove(key).is_some()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.inner.read().unwrap().contains_key(key)
    }

    pub fn clear(&self) {
        self.inner.write().unwrap().clear()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().is_empty()
    }

    /// Run `f` against the value under the read lock, without cloning.
    pub fn with<R>(&self, key: &K, f: impl FnOnce(&V) -> R) -> Option<R> {
        self.inner.read().unwrap().get(key).map(f)
    }

    /// Run `f` against the value under the write lock, mutating in place.
    pub fn with_mut<R>(&self, key: &K, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        self.inner.write().unwrap().get_mut(key).map(f)
    }

    /// Visit every entry under the read lock.
    pub fn for_each(&self, mut f: impl FnMut(&K, &V)) {
        for (key, value) in self.inner.read().unwrap().iter() {
            f(key, value);
        }
    }
}

impl<K: Eq + Hash, V: Clone> SyncMap<K, V> {
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.read().unwrap().get(key).cloned()
    }

    /// Like [`get`](Self::get), but absence is a typed failure instead of
    /// an `Option`, for call sites where the key is contractually present.
    pub fn get_required(&self, key: &K) -> Result<V, KeyNotFound> {
        self.get(key).ok_or(KeyNotFound)
    }

    /// Fetch the value for `key`, lazily inserting a default built by
    /// `make` if the key is absent. The returned clone is taken while the
    /// write lock is held, so two racing callers observe the same entry.
    pub fn get_or_insert_with(&self, key: K, make: impl FnOnce() -> V) -> V {
        if let Some(existing) = self.get(&key) {
            return existing;
        }
        self.inner
            .write()
            .unwrap()
            .entry(key)
            .or_insert_with(make)
            .clone()
    }
}
