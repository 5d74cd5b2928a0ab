//! Registration and decoration.
//!
//! Registrations on the root, and singleton or transient registrations on
//! any scope, land in the registry shared by the whole tree. Scoped
//! registrations made on a child scope stay in that scope's local registry.
//! A key may only be registered once across everything a container can see.

use std::borrow::Cow;
use std::sync::Arc;

use super::Container;
use crate::decoration::{into_decorator, ServiceDecorator};
use crate::error::{DiError, DiResult};
use crate::key::{Key, TypeKey, TypeKind};
use crate::lifetime::Lifetime;
use crate::registration::{Decorator, Definition, Factory, Registry};

impl Container {
    // ----- Concrete types -----

    /// Registers a pre-built singleton value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tiered_di::{Container, Resolver};
    ///
    /// let container = Container::new();
    /// container.add_singleton(8080u16).unwrap();
    /// assert!(container.add_singleton(9090u16).is_err());
    /// assert_eq!(*container.get_required::<u16>(), 8080);
    /// ```
    pub fn add_singleton<T: Send + Sync + 'static>(&self, value: T) -> DiResult<()> {
        let value = Arc::new(value);
        self.register_arc::<T, _>(Lifetime::Singleton, TypeKind::Concrete, "", move |_| {
            Arc::clone(&value)
        })
    }

    pub fn add_named_singleton<T: Send + Sync + 'static>(
        &self,
        name: impl Into<Cow<'static, str>>,
        value: T,
    ) -> DiResult<()> {
        let value = Arc::new(value);
        self.register_arc::<T, _>(Lifetime::Singleton, TypeKind::Concrete, name, move |_| {
            Arc::clone(&value)
        })
    }

    /// Registers a pre-built value that is visible to this container only.
    ///
    /// On a child scope the value goes into the scope's own registry, which is
    /// the usual way to hand per-request data to scoped services.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tiered_di::{Container, Resolver};
    ///
    /// struct RequestContext { path: String }
    ///
    /// let root = Container::new();
    /// let request = root.create_scope();
    /// request.add_scoped(RequestContext { path: "/ready".into() }).unwrap();
    ///
    /// assert_eq!(request.get_required::<RequestContext>().path, "/ready");
    /// assert!(root.get::<RequestContext>().is_err());
    /// ```
    pub fn add_scoped<T: Send + Sync + 'static>(&self, value: T) -> DiResult<()> {
        let value = Arc::new(value);
        self.register_arc::<T, _>(Lifetime::Scoped, TypeKind::Concrete, "", move |_| {
            Arc::clone(&value)
        })
    }

    /// Registers a factory built once per scope tree.
    pub fn add_singleton_factory<T, F>(&self, factory: F) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> T + Send + Sync + 'static,
    {
        self.register(Lifetime::Singleton, "", factory)
    }

    /// Registers a factory built once per scope.
    pub fn add_scoped_factory<T, F>(&self, factory: F) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> T + Send + Sync + 'static,
    {
        self.register(Lifetime::Scoped, "", factory)
    }

    /// Registers a factory run on every resolution.
    pub fn add_transient_factory<T, F>(&self, factory: F) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> T + Send + Sync + 'static,
    {
        self.register(Lifetime::Transient, "", factory)
    }

    pub fn add_named_singleton_factory<T, F>(
        &self,
        name: impl Into<Cow<'static, str>>,
        factory: F,
    ) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> T + Send + Sync + 'static,
    {
        self.register(Lifetime::Singleton, name, factory)
    }

    pub fn add_named_scoped_factory<T, F>(
        &self,
        name: impl Into<Cow<'static, str>>,
        factory: F,
    ) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> T + Send + Sync + 'static,
    {
        self.register(Lifetime::Scoped, name, factory)
    }

    pub fn add_named_transient_factory<T, F>(
        &self,
        name: impl Into<Cow<'static, str>>,
        factory: F,
    ) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> T + Send + Sync + 'static,
    {
        self.register(Lifetime::Transient, name, factory)
    }

    /// Registers a concrete factory with the lifetime given as a value.
    pub fn register<T, F>(
        &self,
        lifetime: Lifetime,
        name: impl Into<Cow<'static, str>>,
        factory: F,
    ) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> T + Send + Sync + 'static,
    {
        self.register_arc::<T, _>(lifetime, TypeKind::Concrete, name, move |c| {
            Arc::new(factory(c))
        })
    }

    // ----- Capabilities (trait objects) -----

    /// Registers a pre-built capability implementation as a singleton.
    pub fn add_singleton_trait<T>(&self, value: Arc<T>) -> DiResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.register_trait::<T, _>(Lifetime::Singleton, "", move |_| Arc::clone(&value))
    }

    /// Registers a capability factory built once per scope tree.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tiered_di::{Container, Resolver};
    /// use std::sync::Arc;
    ///
    /// trait Store: Send + Sync {
    ///     fn name(&self) -> &'static str;
    /// }
    ///
    /// struct Memory;
    /// impl Store for Memory {
    ///     fn name(&self) -> &'static str { "memory" }
    /// }
    ///
    /// let container = Container::new();
    /// container.add_singleton_trait_factory::<dyn Store, _>(|_| Arc::new(Memory)).unwrap();
    ///
    /// let a = container.get_required_trait::<dyn Store>();
    /// let b = container.create_scope().get_required_trait::<dyn Store>();
    /// assert!(Arc::ptr_eq(&a, &b));
    /// ```
    pub fn add_singleton_trait_factory<T, F>(&self, factory: F) -> DiResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Container) -> Arc<T> + Send + Sync + 'static,
    {
        self.register_trait(Lifetime::Singleton, "", factory)
    }

    pub fn add_scoped_trait_factory<T, F>(&self, factory: F) -> DiResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Container) -> Arc<T> + Send + Sync + 'static,
    {
        self.register_trait(Lifetime::Scoped, "", factory)
    }

    pub fn add_transient_trait_factory<T, F>(&self, factory: F) -> DiResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Container) -> Arc<T> + Send + Sync + 'static,
    {
        self.register_trait(Lifetime::Transient, "", factory)
    }

    pub fn add_named_singleton_trait_factory<T, F>(
        &self,
        name: impl Into<Cow<'static, str>>,
        factory: F,
    ) -> DiResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Container) -> Arc<T> + Send + Sync + 'static,
    {
        self.register_trait(Lifetime::Singleton, name, factory)
    }

    pub fn add_named_scoped_trait_factory<T, F>(
        &self,
        name: impl Into<Cow<'static, str>>,
        factory: F,
    ) -> DiResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Container) -> Arc<T> + Send + Sync + 'static,
    {
        self.register_trait(Lifetime::Scoped, name, factory)
    }

    pub fn add_named_transient_trait_factory<T, F>(
        &self,
        name: impl Into<Cow<'static, str>>,
        factory: F,
    ) -> DiResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Container) -> Arc<T> + Send + Sync + 'static,
    {
        self.register_trait(Lifetime::Transient, name, factory)
    }

    /// Registers a capability factory with the lifetime given as a value.
    pub fn register_trait<T, F>(
        &self,
        lifetime: Lifetime,
        name: impl Into<Cow<'static, str>>,
        factory: F,
    ) -> DiResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Container) -> Arc<T> + Send + Sync + 'static,
    {
        self.register_arc::<T, _>(lifetime, TypeKind::Trait, name, factory)
    }

    fn register_arc<T, F>(
        &self,
        lifetime: Lifetime,
        kind: TypeKind,
        name: impl Into<Cow<'static, str>>,
        factory: F,
    ) -> DiResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Container) -> Arc<T> + Send + Sync + 'static,
    {
        let key = Key::named::<T>(kind, name);
        let factory: Factory<T> = Arc::new(factory);
        self.insert_definition(key, Definition::new(lifetime, kind, factory))
    }

    /// Check-and-insert under the write guards of every registry this
    /// container can see, taken global first, so competing registrations of
    /// one key leave exactly one winner.
    fn insert_definition(&self, key: Key, definition: Definition) -> DiResult<()> {
        let mut global = self.inner.global.write();
        let mut local = self.inner.local.as_ref().map(Registry::write);

        let taken = local.as_ref().map_or(false, |local| local.contains(&key));
        if taken || global.contains(&key) {
            tracing::debug!(key = %key, "duplicate registration rejected");
            return Err(DiError::already_registered(&key));
        }

        let lifetime = definition.lifetime;
        let target = match (local.as_deref_mut(), lifetime) {
            (Some(local), Lifetime::Scoped) => {
                local.insert(key.clone(), definition);
                "local"
            }
            _ => {
                global.insert(key.clone(), definition);
                "global"
            }
        };
        tracing::debug!(key = %key, %lifetime, registry = target, depth = self.inner.depth, "registered");
        Ok(())
    }

    // ----- Decoration -----

    /// Appends `decorator` to every definition of the capability `T`.
    ///
    /// Decoration is type-wide: all names registered for `T` are decorated.
    /// If this scope registered `T` itself, only its local definitions are
    /// decorated; otherwise the shared ones are. Decorators run in the order
    /// they were added, each wrapping the previous result. Instances already
    /// cached are not rebuilt.
    ///
    /// # Errors
    ///
    /// * [`DiError::DecoratorBeforeFactory`] if nothing is registered for `T`
    /// * [`DiError::DecoratedMustBeInterface`] if `T` was registered as a
    ///   concrete type
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tiered_di::{Container, Resolver};
    /// use std::sync::Arc;
    ///
    /// trait Handler: Send + Sync {
    ///     fn handle(&self) -> String;
    /// }
    ///
    /// struct Index;
    /// impl Handler for Index {
    ///     fn handle(&self) -> String { "index".into() }
    /// }
    ///
    /// struct Logged(Arc<dyn Handler>);
    /// impl Handler for Logged {
    ///     fn handle(&self) -> String { format!("logged({})", self.0.handle()) }
    /// }
    ///
    /// let container = Container::new();
    /// container
    ///     .add_named_transient_trait_factory::<dyn Handler, _>("/", |_| Arc::new(Index))
    ///     .unwrap();
    /// container
    ///     .decorate::<dyn Handler, _>(|inner, _| Arc::new(Logged(inner)))
    ///     .unwrap();
    ///
    /// let handler = container.get_named_trait::<dyn Handler>("/").unwrap();
    /// assert_eq!(handler.handle(), "logged(index)");
    /// ```
    pub fn decorate<T, F>(&self, decorator: F) -> DiResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>, &Container) -> Arc<T> + Send + Sync + 'static,
    {
        self.decorate_impl::<T>(Arc::new(decorator))
    }

    /// Like [`decorate`](Container::decorate), taking a [`ServiceDecorator`].
    pub fn decorate_with<T, D>(&self, decorator: D) -> DiResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
        D: ServiceDecorator<T> + 'static,
    {
        self.decorate_impl::<T>(into_decorator(decorator))
    }

    fn decorate_impl<T>(&self, decorator: Decorator<T>) -> DiResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let type_key = TypeKey::of::<T>(TypeKind::Trait);
        let type_name = type_key.type_name();

        let mut global = self.inner.global.write();
        let mut local = self.inner.local.as_ref().map(Registry::write);

        let (definitions, target) = match local
            .as_deref_mut()
            .and_then(|local| local.definitions_of_mut(&type_key))
        {
            Some(definitions) => (definitions, "local"),
            None => match global.definitions_of_mut(&type_key) {
                Some(definitions) => (definitions, "global"),
                None => return Err(DiError::DecoratorBeforeFactory { type_name }),
            },
        };

        if definitions.values().any(|definition| definition.kind != TypeKind::Trait) {
            return Err(DiError::DecoratedMustBeInterface { type_name });
        }

        for (name, definition) in definitions.iter_mut() {
            let key = Key::new(type_key, name.clone());
            *definition = definition.decorated::<T>(&key, Arc::clone(&decorator));
        }
        tracing::debug!(
            type_name,
            registry = target,
            definitions = definitions.len(),
            "decorator added"
        );
        Ok(())
    }
}
