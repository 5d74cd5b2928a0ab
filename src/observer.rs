//! Diagnostic observers for resolution events.
//!
//! Observers are attached to the root container and shared by every scope
//! created from it. Hooks run synchronously on the resolving thread, so they
//! should be cheap.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::key::Key;
use crate::lifetime::Lifetime;

/// Hooks invoked around each resolution.
///
/// # Examples
///
/// ```rust
/// use tiered_di::{Container, DiObserver, Key, Lifetime, Resolver};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct CountingObserver {
///     builds: AtomicUsize,
/// }
///
/// impl DiObserver for CountingObserver {
///     fn resolving(&self, _key: &Key) {}
///     fn resolved(&self, _key: &Key, _lifetime: Lifetime, _duration: Duration) {}
///     fn built(&self, _key: &Key, _lifetime: Lifetime) {
///         self.builds.fetch_add(1, Ordering::Relaxed);
///     }
/// }
///
/// let observer = Arc::new(CountingObserver::default());
/// let container = Container::new();
/// container.add_observer(observer.clone());
/// container.add_singleton_factory::<u32, _>(|_| 7).unwrap();
///
/// container.get_required::<u32>();
/// container.get_required::<u32>();
/// assert_eq!(observer.builds.load(Ordering::Relaxed), 1);
/// ```
pub trait DiObserver: Send + Sync {
    /// Called before the key is looked up.
    fn resolving(&self, key: &Key);

    /// Called after a successful resolution, whether or not a build happened.
    fn resolved(&self, key: &Key, lifetime: Lifetime, duration: Duration);

    /// Called once for every factory chain actually executed.
    fn built(&self, _key: &Key, _lifetime: Lifetime) {}
}

#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    #[inline]
    pub(crate) fn resolving(&self, key: &Key) {
        for observer in &self.observers {
            observer.resolving(key);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, key: &Key, lifetime: Lifetime, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(key, lifetime, duration);
        }
    }

    #[inline]
    pub(crate) fn built(&self, key: &Key, lifetime: Lifetime) {
        for observer in &self.observers {
            observer.built(key, lifetime);
        }
    }
}

/// Emits every resolution event through `tracing`.
///
/// Attached automatically when
/// [`ContainerConfig::trace_resolutions`](crate::ContainerConfig) is set.
pub struct TracingObserver {
    label: String,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self::with_label("root")
    }

    /// Tags every event with `label`, usually the container's configured label.
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiObserver for TracingObserver {
    fn resolving(&self, key: &Key) {
        tracing::trace!(container = %self.label, key = %key, "resolving");
    }

    fn resolved(&self, key: &Key, lifetime: Lifetime, duration: Duration) {
        tracing::debug!(
            container = %self.label,
            key = %key,
            %lifetime,
            elapsed_us = duration.as_micros() as u64,
            "resolved"
        );
    }

    fn built(&self, key: &Key, lifetime: Lifetime) {
        tracing::debug!(container = %self.label, key = %key, %lifetime, "built");
    }
}

/// Counts resolutions and builds.
///
/// Useful for asserting caching behaviour: a singleton resolved any number of
/// times from any number of scopes should report exactly one build.
#[derive(Default)]
pub struct MetricsObserver {
    resolution_count: AtomicU64,
    build_count: AtomicU64,
    total_resolution_time: AtomicU64,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolution_count(&self) -> u64 {
        self.resolution_count.load(Ordering::Relaxed)
    }

    pub fn build_count(&self) -> u64 {
        self.build_count.load(Ordering::Relaxed)
    }

    pub fn total_resolution_time(&self) -> Duration {
        Duration::from_nanos(self.total_resolution_time.load(Ordering::Relaxed))
    }

    pub fn average_resolution_time(&self) -> Option<Duration> {
        let count = self.resolution_count();
        if count == 0 {
            return None;
        }
        Some(Duration::from_nanos(
            self.total_resolution_time.load(Ordering::Relaxed) / count,
        ))
    }

    pub fn reset(&self) {
        self.resolution_count.store(0, Ordering::Relaxed);
        self.build_count.store(0, Ordering::Relaxed);
        self.total_resolution_time.store(0, Ordering::Relaxed);
    }
}

impl DiObserver for MetricsObserver {
    fn resolving(&self, _key: &Key) {}

    fn resolved(&self, _key: &Key, _lifetime: Lifetime, duration: Duration) {
        self.resolution_count.fetch_add(1, Ordering::Relaxed);
        self.total_resolution_time
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    fn built(&self, _key: &Key, _lifetime: Lifetime) {
        self.build_count.fetch_add(1, Ordering::Relaxed);
    }
}
