//! Service descriptors for introspection and diagnostics.

use crate::key::{Key, TypeKind};
use crate::lifetime::Lifetime;

/// A registered definition as seen from one container.
///
/// Returned by [`Container::descriptors`](crate::Container::descriptors).
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    pub key: Key,
    pub lifetime: Lifetime,
    /// How the type was registered; only `Trait` definitions accept decorators.
    pub kind: TypeKind,
    /// Number of decorators currently appended to the factory.
    pub decorators: usize,
    /// `true` if the definition lives in the scope's own registry rather than
    /// the registry shared by the whole tree.
    pub local: bool,
}

impl ServiceDescriptor {
    pub fn service_name(&self) -> Option<&str> {
        self.key.service_name()
    }

    pub fn type_name(&self) -> &'static str {
        self.key.display_name()
    }

    pub fn is_named(&self) -> bool {
        self.service_name().is_some()
    }

    pub fn is_decorated(&self) -> bool {
        self.decorators > 0
    }
}
