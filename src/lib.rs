//! # tiered-di
//!
//! Runtime dependency injection with hierarchical scopes, decorator chains
//! and a lock-tiered lazy instance cache.
//!
//! ## Features
//!
//! - **Three lifetimes**: Singleton (one per scope tree), Scoped (one per scope), Transient (one per resolution)
//! - **Named registrations**: any `(type, name)` pair is an independent target
//! - **Trait objects**: capabilities resolve as `Arc<dyn Trait>` through the same API as concrete types
//! - **Decorators**: wrap every registration of a capability, applied in registration order
//! - **At-most-once construction**: concurrent first resolutions of a key build it exactly once
//!
//! ## Quick Start
//!
//! ```rust
//! use tiered_di::{Container, Resolver};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let container = Container::new();
//! container
//!     .add_singleton(Database {
//!         connection_string: "postgres://localhost".to_string(),
//!     })
//!     .unwrap();
//! container
//!     .add_transient_factory::<UserService, _>(|c| UserService {
//!         db: c.get_required::<Database>(),
//!     })
//!     .unwrap();
//!
//! let user_service = container.get_required::<UserService>();
//! assert_eq!(user_service.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Scopes
//!
//! A scope shares its root's registrations and singletons but owns its scoped
//! instances, and can register scoped values of its own:
//!
//! ```rust
//! use tiered_di::{Container, Resolver};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! struct RequestId(usize);
//!
//! let counter = Arc::new(AtomicUsize::new(0));
//! let root = Container::new();
//! let next = counter.clone();
//! root.add_scoped_factory::<RequestId, _>(move |_| {
//!     RequestId(next.fetch_add(1, Ordering::SeqCst))
//! })
//! .unwrap();
//!
//! let scope1 = root.create_scope();
//! let scope2 = root.create_scope();
//!
//! assert_eq!(scope1.get_required::<RequestId>().0, 0);
//! assert_eq!(scope2.get_required::<RequestId>().0, 1);
//! assert_eq!(scope1.get_required::<RequestId>().0, 0);
//! ```
//!
//! ## Decorators
//!
//! ```rust
//! use tiered_di::{Container, Resolver};
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn line(&self, message: &str) -> String;
//! }
//!
//! struct Plain;
//! impl Logger for Plain {
//!     fn line(&self, message: &str) -> String {
//!         message.to_string()
//!     }
//! }
//!
//! struct Timestamped(Arc<dyn Logger>);
//! impl Logger for Timestamped {
//!     fn line(&self, message: &str) -> String {
//!         format!("[00:00] {}", self.0.line(message))
//!     }
//! }
//!
//! let container = Container::new();
//! container.add_singleton_trait_factory::<dyn Logger, _>(|_| Arc::new(Plain)).unwrap();
//! container
//!     .decorate::<dyn Logger, _>(|inner, _| Arc::new(Timestamped(inner)))
//!     .unwrap();
//!
//! let logger = container.get_required_trait::<dyn Logger>();
//! assert_eq!(logger.line("ready"), "[00:00] ready");
//! ```

pub mod cache;
pub mod config;
pub mod container;
pub mod decoration;
pub mod descriptors;
pub mod error;
pub mod key;
pub mod lifetime;
pub mod observer;
pub mod traits;

// Internal modules
mod internal;
mod registration;

pub use cache::LifetimeCache;
pub use config::ContainerConfig;
pub use container::Container;
pub use decoration::ServiceDecorator;
pub use descriptors::ServiceDescriptor;
pub use error::{DiError, DiResult};
pub use internal::ContractViolation;
pub use key::{Key, TypeKey, TypeKind};
pub use lifetime::Lifetime;
pub use observer::{DiObserver, MetricsObserver, TracingObserver};
pub use traits::{Resolver, ResolverCore};
