//! Resolver traits for service resolution.

use std::borrow::Cow;
use std::sync::Arc;

use crate::cache::downcast_instance;
use crate::error::DiResult;
use crate::key::{Key, TypeKind};
use crate::registration::AnyArc;

/// Core resolver trait for object-safe service resolution.
///
/// Looks the key up in the scope chain, dispatches on the definition's
/// lifetime and returns the instance type-erased. Most users should use the
/// [`Resolver`] trait instead, which provides typed methods on top of this one.
pub trait ResolverCore: Send + Sync {
    /// Resolves a single service by key.
    ///
    /// # Returns
    ///
    /// * `Ok(AnyArc)` - The resolved `Arc<T>`, boxed as `Arc<dyn Any>`
    /// * `Err(DiError::FactoryNotRegistered)` - Nothing is registered for the key
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc>;
}

/// High-level resolver interface with generic methods for type-safe service resolution.
///
/// Concrete types and trait objects resolve through the same methods; the
/// `*_trait` spellings exist for readability at call sites that resolve a
/// capability.
///
/// # Examples
///
/// ```
/// use tiered_di::{Container, Resolver};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {
///     fn log(&self, msg: &str) -> String;
/// }
///
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {
///     fn log(&self, msg: &str) -> String {
///         format!("LOG: {}", msg)
///     }
/// }
///
/// let container = Container::new();
/// container.add_singleton(42usize).unwrap();
/// container
///     .add_singleton_trait_factory::<dyn Logger, _>(|_| Arc::new(ConsoleLogger))
///     .unwrap();
///
/// let number = container.get_required::<usize>();
/// assert_eq!(*number, 42);
///
/// let logger = container.get_required_trait::<dyn Logger>();
/// assert_eq!(logger.log("resolved"), "LOG: resolved");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves the default registration of `T`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tiered_di::{Container, Resolver};
    ///
    /// let container = Container::new();
    /// container.add_singleton("configuration".to_string()).unwrap();
    ///
    /// let config = container.get::<String>().unwrap();
    /// assert_eq!(&*config, "configuration");
    /// ```
    fn get<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        resolve_typed::<T, _>(self, Key::of::<T>(TypeKind::Concrete))
    }

    /// Resolves the registration of `T` under `name`.
    fn get_named<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: impl Into<Cow<'static, str>>,
    ) -> DiResult<Arc<T>> {
        resolve_typed::<T, _>(self, Key::named::<T>(TypeKind::Concrete, name))
    }

    /// Resolves the default implementation of a capability.
    fn get_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        resolve_typed::<T, _>(self, Key::of::<T>(TypeKind::Trait))
    }

    /// Resolves the implementation of a capability registered under `name`.
    fn get_named_trait<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: impl Into<Cow<'static, str>>,
    ) -> DiResult<Arc<T>> {
        resolve_typed::<T, _>(self, Key::named::<T>(TypeKind::Trait, name))
    }

    /// Like [`get`](Self::get), panicking if the service is not registered.
    fn get_required<T: ?Sized + Send + Sync + 'static>(&self) -> Arc<T> {
        self.get::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e))
    }

    fn get_named_required<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: impl Into<Cow<'static, str>>,
    ) -> Arc<T> {
        let name = name.into();
        self.get_named::<T>(name.clone()).unwrap_or_else(|e| {
            panic!("Failed to resolve named {} ({}): {}", std::any::type_name::<T>(), name, e)
        })
    }

    fn get_required_trait<T: ?Sized + Send + Sync + 'static>(&self) -> Arc<T> {
        self.get_trait::<T>().unwrap_or_else(|e| {
            panic!("Failed to resolve trait {}: {}", std::any::type_name::<T>(), e)
        })
    }

    fn get_named_trait_required<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: impl Into<Cow<'static, str>>,
    ) -> Arc<T> {
        let name = name.into();
        self.get_named_trait::<T>(name.clone()).unwrap_or_else(|e| {
            panic!("Failed to resolve named trait {} ({}): {}", std::any::type_name::<T>(), name, e)
        })
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}

fn resolve_typed<T, R>(resolver: &R, key: Key) -> DiResult<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
    R: ResolverCore + ?Sized,
{
    let any = resolver.resolve_any(&key)?;
    Ok(downcast_instance::<T>(&key, any))
}
