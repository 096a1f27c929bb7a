use std::{collections::HashMap, hash::Hash, sync::Arc};

use log::debug;
use parking_lot::{RwLock, RwLockUpgradableReadGuard};

/// A write-once, read-many cache keyed by type identity.
///
/// Entries are built on first access and never invalidated. Builders run
/// without any lock held; if two threads race on the same key, both may
/// build, but only the first value stored is ever observed and the other is
/// dropped.
pub struct TypeCache<K, V> {
    entries: RwLock<HashMap<K, Arc<V>>>,
}

impl<K, V> Default for TypeCache<K, V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash, V> TypeCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries.read_recursive().get(key).cloned()
    }

    /// Returns the cached value for `key`, building and storing it if absent.
    ///
    /// # A note on concurrency
    /// The read lock is released before `build` runs, so `build` may itself
    /// use other caches. Insertion uses the upgradable read pattern: the
    /// presence check and the insertion happen under the same lock.
    pub fn get_or_build<E>(
        &self,
        key: K,
        build: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        let built = Arc::new(build()?);

        let entries = self.entries.upgradable_read();
        if let Some(existing) = entries.get(&key) {
            debug!("Discarding a redundant concurrent build; keeping the first stored value.");
            return Ok(Arc::clone(existing));
        }

        let mut entries = RwLockUpgradableReadGuard::upgrade(entries);
        entries.insert(key, Arc::clone(&built));
        Ok(built)
    }

    pub fn len(&self) -> usize {
        self.entries.read_recursive().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::{
        convert::Infallible,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
    };

    use super::*;

    #[test]
    fn builds_once_then_serves_cached() {
        let cache = TypeCache::<&str, usize>::new();
        let calls = AtomicUsize::new(0);
        let build = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Infallible>(42)
        };

        let a = cache.get_or_build("a", build).unwrap();
        let b = cache
            .get_or_build("a", || Ok::<_, Infallible>(0))
            .unwrap();
        assert_eq!(*a, 42);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_builds_are_not_cached() {
        let cache = TypeCache::<u32, u32>::new();
        assert!(cache.get_or_build(1, || Err("boom")).is_err());
        assert!(cache.is_empty());
        assert_eq!(*cache.get_or_build(1, || Ok::<_, &str>(7)).unwrap(), 7);
    }

    #[test]
    fn concurrent_first_access_converges() {
        let cache = Arc::new(TypeCache::<u32, Vec<u32>>::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    cache
                        .get_or_build(7, || Ok::<_, Infallible>(vec![i]))
                        .unwrap()
                })
            })
            .collect();

        let values: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for value in &values {
            assert!(Arc::ptr_eq(value, &values[0]));
        }
        assert_eq!(cache.len(), 1);
    }
}
