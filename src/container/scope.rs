//! Scope creation.

use std::sync::Arc;

use super::{Container, ContainerInner};
use crate::cache::LifetimeCache;
use crate::registration::Registry;

impl Container {
    /// Creates a child scope.
    ///
    /// The child shares this container's global registry, singleton cache,
    /// configuration and observers, and starts with an empty local registry
    /// and an empty scoped cache. Scoped registrations of this container are
    /// not inherited: a child sees only its own plus the shared ones.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tiered_di::{Container, Resolver};
    /// use std::sync::Arc;
    ///
    /// struct Session;
    ///
    /// let root = Container::new();
    /// root.add_scoped_factory::<Session, _>(|_| Session).unwrap();
    ///
    /// let first = root.create_scope();
    /// let second = root.create_scope();
    /// assert!(!Arc::ptr_eq(
    ///     &first.get_required::<Session>(),
    ///     &second.get_required::<Session>(),
    /// ));
    /// assert_eq!(first.depth(), 1);
    /// ```
    pub fn create_scope(&self) -> Container {
        let depth = self.inner.depth + 1;
        tracing::debug!(container = %self.inner.shared.config.label, depth, "scope created");

        Container {
            inner: Arc::new(ContainerInner {
                global: Arc::clone(&self.inner.global),
                local: Some(Registry::new()),
                singletons: Arc::clone(&self.inner.singletons),
                scoped: LifetimeCache::new(),
                shared: Arc::clone(&self.inner.shared),
                depth,
            }),
        }
    }

    /// `true` for a container made by [`Container::new`] or
    /// [`Container::with_config`].
    pub fn is_root(&self) -> bool {
        self.inner.local.is_none()
    }

    /// Number of `create_scope` calls between the root and this container.
    pub fn depth(&self) -> usize {
        self.inner.depth
    }

    /// `true` if both handles share one singleton cache, i.e. belong to the
    /// same scope tree.
    pub fn same_tree(&self, other: &Container) -> bool {
        Arc::ptr_eq(&self.inner.singletons, &other.inner.singletons)
    }
}
