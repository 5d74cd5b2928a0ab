//! Named decorator types.
//!
//! A decorator wraps the instance produced by a definition's factory in
//! another implementation of the same capability. Closures passed to
//! [`Container::decorate`](crate::Container::decorate) cover most cases; this
//! trait is for decorators that carry their own state or are reused across
//! containers.

use std::sync::Arc;

use crate::container::Container;
use crate::registration::Decorator;

/// A reusable decorator for the capability `T`.
///
/// # Examples
///
/// ```rust
/// use tiered_di::{Container, Resolver, ServiceDecorator};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct Plain;
/// impl Greeter for Plain {
///     fn greet(&self) -> String { "hello".into() }
/// }
///
/// struct Prefixed { prefix: String, inner: Arc<dyn Greeter> }
/// impl Greeter for Prefixed {
///     fn greet(&self) -> String { format!("{}{}", self.prefix, self.inner.greet()) }
/// }
///
/// struct PrefixDecorator(&'static str);
/// impl ServiceDecorator<dyn Greeter> for PrefixDecorator {
///     fn decorate(&self, original: Arc<dyn Greeter>, _: &Container) -> Arc<dyn Greeter> {
///         Arc::new(Prefixed { prefix: self.0.to_string(), inner: original })
///     }
/// }
///
/// let container = Container::new();
/// container
///     .add_transient_trait_factory::<dyn Greeter, _>(|_| Arc::new(Plain))
///     .unwrap();
/// container.decorate_with::<dyn Greeter, _>(PrefixDecorator("> ")).unwrap();
///
/// assert_eq!(container.get_required_trait::<dyn Greeter>().greet(), "> hello");
/// ```
pub trait ServiceDecorator<T: ?Sized + Send + Sync + 'static>: Send + Sync {
    /// Wraps `original`. `container` is the container performing the build.
    fn decorate(&self, original: Arc<T>, container: &Container) -> Arc<T>;
}

impl<T, D> ServiceDecorator<T> for Arc<D>
where
    T: ?Sized + Send + Sync + 'static,
    D: ServiceDecorator<T> + ?Sized,
{
    fn decorate(&self, original: Arc<T>, container: &Container) -> Arc<T> {
        (**self).decorate(original, container)
    }
}

pub(crate) fn into_decorator<T, D>(decorator: D) -> Decorator<T>
where
    T: ?Sized + Send + Sync + 'static,
    D: ServiceDecorator<T> + 'static,
{
    Arc::new(move |original: Arc<T>, container: &Container| decorator.decorate(original, container))
}
