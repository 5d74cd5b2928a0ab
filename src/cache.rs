//! Two-tier lazy instance cache.
//!
//! A [`LifetimeCache`] maps `(type, name)` keys to lazily built instances.
//! Structure is created under short write guards (tier 1: the per-type bucket,
//! tier 2: the per-name entry); construction itself happens under the entry's
//! own once-guard, so only callers asking for the *same* key ever wait on a
//! build, and unrelated types resolve concurrently.

use std::borrow::Cow;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use crate::internal::{violation, HashMap};
use crate::key::{Key, TypeKey};
use crate::registration::AnyArc;

/// A single lazily initialised slot.
///
/// Transitions from empty to initialised exactly once and never changes
/// afterwards.
#[derive(Default)]
pub(crate) struct CacheEntry {
    cell: OnceCell<AnyArc>,
}

impl CacheEntry {
    pub(crate) fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

/// Entries for one abstract type, keyed by registration name.
#[derive(Default)]
struct Bucket {
    entries: RwLock<HashMap<Cow<'static, str>, Arc<CacheEntry>>>,
}

impl Bucket {
    fn entry(&self, name: &Cow<'static, str>) -> Arc<CacheEntry> {
        {
            let entries = self.entries.read();
            if let Some(entry) = entries.get(name.as_ref()) {
                return Arc::clone(entry);
            }
        }

        // Re-checked under the write guard: another caller may have won the race.
        let mut entries = self.entries.write();
        Arc::clone(entries.entry(name.clone()).or_default())
    }
}

/// Concurrent lazy value store keyed by `(type, name)`.
///
/// Guarantees that the build function for a key runs at most once per cache
/// instance, even when many threads request the key for the first time
/// simultaneously.
///
/// # Examples
///
/// ```rust
/// use tiered_di::{Key, LifetimeCache, TypeKind};
/// use std::sync::Arc;
///
/// let cache = LifetimeCache::new();
/// let key = Key::of::<String>(TypeKind::Concrete);
///
/// let first = cache.get_or_build(&key, || Arc::new("built".to_string()));
/// let second = cache.get_or_build(&key, || Arc::new("never".to_string()));
///
/// assert!(Arc::ptr_eq(&first, &second));
/// assert_eq!(cache.len(), 1);
/// ```
///
/// # Re-entrancy
///
/// A build function that requests its own key from the same cache deadlocks.
/// No cycle detection is performed.
#[derive(Default)]
pub struct LifetimeCache {
    buckets: RwLock<HashMap<TypeKey, Arc<Bucket>>>,
}

impl LifetimeCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached instance for `key`, building it with `build` first
    /// if the key has never been initialised in this cache.
    ///
    /// # Panics
    ///
    /// Panics with a [`ContractViolation`](crate::ContractViolation) if the
    /// entry already holds a value of a different type than `T`.
    pub fn get_or_build<T, F>(&self, key: &Key, build: F) -> Arc<T>
    where
        T: ?Sized + Send + Sync + 'static,
        F: FnOnce() -> Arc<T>,
    {
        let any = self.get_or_build_any(key, || Arc::new(build()) as AnyArc);
        downcast_instance::<T>(key, any)
    }

    /// Returns the instance stored under `key` without building it.
    pub fn get<T>(&self, key: &Key) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.peek(key).map(|any| downcast_instance::<T>(key, any))
    }

    /// Returns `true` if `key` has an initialised entry.
    pub fn contains(&self, key: &Key) -> bool {
        self.peek(key).is_some()
    }

    /// Number of initialised entries.
    pub fn len(&self) -> usize {
        self.buckets
            .read()
            .values()
            .map(|bucket| {
                bucket
                    .entries
                    .read()
                    .values()
                    .filter(|entry| entry.is_initialized())
                    .count()
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn get_or_build_any<F>(&self, key: &Key, build: F) -> AnyArc
    where
        F: FnOnce() -> AnyArc,
    {
        let entry = self.bucket(key.type_key()).entry(key.name_cow());

        if let Some(value) = entry.cell.get() {
            tracing::trace!(key = %key, "cache hit");
            return Arc::clone(value);
        }

        // Tier 3: the entry's own guard. Concurrent callers for this key block
        // here until the first build completes; a panicking build leaves the
        // entry empty so a later call retries.
        Arc::clone(entry.cell.get_or_init(|| {
            tracing::trace!(key = %key, "building instance");
            build()
        }))
    }

    fn peek(&self, key: &Key) -> Option<AnyArc> {
        let bucket = self.buckets.read().get(key.type_key()).cloned()?;
        let entry = bucket.entries.read().get(key.name()).cloned()?;
        entry.cell.get().cloned()
    }

    fn bucket(&self, type_key: &TypeKey) -> Arc<Bucket> {
        {
            let buckets = self.buckets.read();
            if let Some(bucket) = buckets.get(type_key) {
                return Arc::clone(bucket);
            }
        }

        let mut buckets = self.buckets.write();
        Arc::clone(buckets.entry(*type_key).or_default())
    }
}

impl std::fmt::Debug for LifetimeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifetimeCache")
            .field("types", &self.buckets.read().len())
            .field("initialized", &self.len())
            .finish()
    }
}

/// Recovers the `Arc<T>` stored inside a type-erased cache value.
pub(crate) fn downcast_instance<T>(key: &Key, any: AnyArc) -> Arc<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    match any.downcast_ref::<Arc<T>>() {
        Some(instance) => Arc::clone(instance),
        None => violation(key, std::any::type_name::<T>()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::TypeKind;
    use crate::ContractViolation;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn builds_once_per_key() {
        let cache = LifetimeCache::new();
        let key = Key::of::<u32>(TypeKind::Concrete);
        let calls = AtomicUsize::new(0);

        for _ in 0..5 {
            let value = cache.get_or_build(&key, || {
                calls.fetch_add(1, Ordering::SeqCst);
                Arc::new(7u32)
            });
            assert_eq!(*value, 7);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn names_are_independent_entries() {
        let cache = LifetimeCache::new();
        let a = cache.get_or_build(&Key::named::<String>(TypeKind::Concrete, "a"), || Arc::new("a".to_string()));
        let b = cache.get_or_build(&Key::named::<String>(TypeKind::Concrete, "b"), || Arc::new("b".to_string()));

        assert_eq!(a.as_str(), "a");
        assert_eq!(b.as_str(), "b");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn peek_does_not_build() {
        let cache = LifetimeCache::new();
        let key = Key::of::<u8>(TypeKind::Concrete);

        assert!(cache.get::<u8>(&key).is_none());
        assert!(cache.is_empty());

        cache.get_or_build(&key, || Arc::new(1u8));
        assert_eq!(cache.get::<u8>(&key).as_deref(), Some(&1));
        assert!(cache.contains(&key));
    }

    #[test]
    fn panicking_build_leaves_entry_empty() {
        let cache = LifetimeCache::new();
        let key = Key::of::<u16>(TypeKind::Concrete);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            cache.get_or_build::<u16, _>(&key, || panic!("factory failed"))
        }));
        assert!(result.is_err());
        assert!(!cache.contains(&key));

        let value = cache.get_or_build(&key, || Arc::new(3u16));
        assert_eq!(*value, 3);
    }

    #[test]
    fn concurrent_first_access_builds_once() {
        let cache = Arc::new(LifetimeCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(16));
        let key = Key::of::<Vec<u8>>(TypeKind::Concrete);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                let barrier = Arc::clone(&barrier);
                let key = key.clone();
                thread::spawn(move || {
                    barrier.wait();
                    cache.get_or_build(&key, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(std::time::Duration::from_millis(5));
                        Arc::new(vec![1u8, 2, 3])
                    })
                })
            })
            .collect();

        let values: Vec<Arc<Vec<u8>>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(values.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn mismatched_type_is_a_contract_violation() {
        let cache = LifetimeCache::new();
        let key = Key::of::<u32>(TypeKind::Concrete);
        cache.get_or_build(&key, || Arc::new(1u32));

        let payload = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            cache.get::<String>(&key)
        }))
        .expect_err("type mismatch must panic");
        assert!(payload.downcast_ref::<ContractViolation>().is_some());
    }
}
