//! The container: one node of a scope tree.
//!
//! Every node shares the global registry, the singleton cache, the
//! configuration and the observers of the root it descends from. Each node
//! owns its scoped cache; child scopes additionally own a local registry for
//! their scoped registrations.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use crate::cache::LifetimeCache;
use crate::config::ContainerConfig;
use crate::descriptors::ServiceDescriptor;
use crate::error::{DiError, DiResult};
use crate::key::{Key, TypeKind};
use crate::lifetime::Lifetime;
use crate::observer::{DiObserver, Observers, TracingObserver};
use crate::registration::{AnyArc, Definition, Registry};
use crate::traits::ResolverCore;

mod register;
mod scope;

/// Runtime dependency injection container.
///
/// Cloning is cheap and yields a handle to the *same* node: clones share the
/// scoped cache. Use [`create_scope`](Container::create_scope) for a new node.
///
/// Dependency cycles are not detected: a singleton or scoped factory that
/// resolves its own key blocks forever on its own pending build.
///
/// # Examples
///
/// ```rust
/// use tiered_di::{Container, Resolver};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
///
/// struct FixedClock;
/// impl Clock for FixedClock {
///     fn now(&self) -> u64 { 1_700_000_000 }
/// }
///
/// struct Audit { clock: Arc<dyn Clock> }
///
/// let container = Container::new();
/// container.add_singleton_trait_factory::<dyn Clock, _>(|_| Arc::new(FixedClock)).unwrap();
/// container
///     .add_scoped_factory::<Audit, _>(|c| Audit { clock: c.get_required_trait::<dyn Clock>() })
///     .unwrap();
///
/// let request = container.create_scope();
/// let audit = request.get_required::<Audit>();
/// assert_eq!(audit.clock.now(), 1_700_000_000);
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    pub(crate) global: Arc<Registry>,
    /// `None` on the root: the root registers straight into `global`.
    pub(crate) local: Option<Registry>,
    pub(crate) singletons: Arc<LifetimeCache>,
    pub(crate) scoped: LifetimeCache,
    pub(crate) shared: Arc<Shared>,
    pub(crate) depth: usize,
}

/// State fixed at root creation and shared by the whole tree.
pub(crate) struct Shared {
    pub(crate) config: ContainerConfig,
    // Replaced wholesale on `add_observer` so resolutions never hold the lock
    // while user hooks run.
    pub(crate) observers: RwLock<Arc<Observers>>,
}

impl Container {
    /// Creates an empty root container with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    /// Creates an empty root container.
    pub fn with_config(config: ContainerConfig) -> Self {
        let mut observers = Observers::default();
        if config.trace_resolutions {
            observers.add(Arc::new(TracingObserver::with_label(config.label.clone())));
        }
        tracing::debug!(container = %config.label, "container created");

        Self {
            inner: Arc::new(ContainerInner {
                global: Arc::new(Registry::new()),
                local: None,
                singletons: Arc::new(LifetimeCache::new()),
                scoped: LifetimeCache::new(),
                shared: Arc::new(Shared {
                    config,
                    observers: RwLock::new(Arc::new(observers)),
                }),
                depth: 0,
            }),
        }
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.inner.shared.config
    }

    /// Attaches an observer to the whole tree this container belongs to.
    pub fn add_observer(&self, observer: Arc<dyn DiObserver>) {
        let mut slot = self.inner.shared.observers.write();
        let mut observers = Observers::clone(&slot);
        observers.add(observer);
        *slot = Arc::new(observers);
    }

    fn observers(&self) -> Arc<Observers> {
        Arc::clone(&self.inner.shared.observers.read())
    }

    /// Finds the definition for `key`: the scope's own registry first, then
    /// the shared one.
    pub(crate) fn lookup(&self, key: &Key) -> Option<Definition> {
        if let Some(local) = &self.inner.local {
            if let Some(definition) = local.get(key) {
                return Some(definition);
            }
        }
        self.inner.global.get(key)
    }

    fn resolve_with(&self, key: &Key, observers: &Observers) -> DiResult<(AnyArc, Lifetime)> {
        let definition = self
            .lookup(key)
            .ok_or_else(|| DiError::not_registered(key))?;
        let lifetime = definition.lifetime;

        let build = || {
            let value = definition.chain.build_any(self);
            observers.built(key, lifetime);
            value
        };

        let value = match lifetime {
            Lifetime::Singleton => self.inner.singletons.get_or_build_any(key, build),
            Lifetime::Scoped => self.inner.scoped.get_or_build_any(key, build),
            Lifetime::Transient => build(),
        };
        Ok((value, lifetime))
    }

    /// Every definition reachable from this container, the scope's own first.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        let describe = |key: Key, definition: &Definition, local: bool| ServiceDescriptor {
            key,
            lifetime: definition.lifetime,
            kind: definition.kind,
            decorators: definition.decorator_count(),
            local,
        };

        let mut descriptors = Vec::new();
        if let Some(local) = &self.inner.local {
            descriptors.extend(local.read().iter().map(|(key, def)| describe(key, def, true)));
        }
        descriptors.extend(
            self.inner
                .global
                .read()
                .iter()
                .map(|(key, def)| describe(key, def, false)),
        );
        descriptors
    }

    /// Returns `true` if `T` is registered under `name` (empty for the default).
    pub fn contains<T: ?Sized + 'static>(&self, name: impl Into<Cow<'static, str>>) -> bool {
        self.lookup(&Key::named::<T>(TypeKind::Concrete, name)).is_some()
    }

    pub fn contains_trait<T: ?Sized + 'static>(&self, name: impl Into<Cow<'static, str>>) -> bool {
        self.lookup(&Key::named::<T>(TypeKind::Trait, name)).is_some()
    }

    /// Number of definitions reachable from this container.
    pub fn len(&self) -> usize {
        let local = self.inner.local.as_ref().map_or(0, Registry::len);
        local + self.inner.global.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Singleton instances built so far, across the whole tree.
    pub fn singleton_instances(&self) -> usize {
        self.inner.singletons.len()
    }

    /// Scoped instances built so far in this container.
    pub fn scoped_instances(&self) -> usize {
        self.inner.scoped.len()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverCore for Container {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        let observers = self.observers();
        if !observers.has_observers() {
            return self.resolve_with(key, &observers).map(|(value, _)| value);
        }

        observers.resolving(key);
        let started = Instant::now();
        let (value, lifetime) = self.resolve_with(key, &observers)?;
        observers.resolved(key, lifetime, started.elapsed());
        Ok(value)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("label", &self.inner.shared.config.label)
            .field("depth", &self.inner.depth)
            .field("local", &self.inner.local.as_ref().map_or(0, Registry::len))
            .field("global", &self.inner.global.len())
            .field("singletons", &self.inner.singletons)
            .field("scoped", &self.inner.scoped)
            .field("observers", &self.observers().len())
            .finish()
    }
}
