//! Service key types for the dependency injection container.

use std::any::TypeId;
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Whether a registered type is a capability (trait object) or a concrete type.
///
/// Only capability types can be decorated: a decorator returns a different
/// implementation of the same capability, which is impossible for a concrete
/// struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A concrete type such as a struct, enum or primitive.
    Concrete,
    /// A capability type, normally `dyn Trait`.
    Trait,
}

/// Identifier of an abstract type.
///
/// Equality and hashing only look at the `TypeId`; the type name is kept for
/// diagnostics and the kind records how the type was registered.
#[derive(Debug, Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    type_name: &'static str,
    kind: TypeKind,
}

impl TypeKey {
    /// Builds the key for `T` with the given kind.
    #[inline(always)]
    pub fn of<T: ?Sized + 'static>(kind: TypeKind) -> Self {
        Self {
            id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            kind,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The `std::any::type_name` of the keyed type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }
}

impl PartialEq for TypeKey {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Key for service storage and lookup: an abstract type plus an optional name.
///
/// The empty name is the default (unnamed) registration. Distinct
/// `(type, name)` pairs are independent resolution targets.
///
/// # Examples
///
/// ```rust
/// use tiered_di::{Key, TypeKind};
///
/// let unnamed = Key::of::<u32>(TypeKind::Concrete);
/// let named = Key::named::<u32>(TypeKind::Concrete, "port");
///
/// assert_eq!(unnamed.service_name(), None);
/// assert_eq!(named.service_name(), Some("port"));
/// assert_ne!(unnamed, named);
/// assert_eq!(named.to_string(), "u32[port]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    type_key: TypeKey,
    name: Cow<'static, str>,
}

impl Key {
    /// Creates a key from its parts.
    pub fn new(type_key: TypeKey, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            type_key,
            name: name.into(),
        }
    }

    /// Key of the default (unnamed) registration of `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>(kind: TypeKind) -> Self {
        Self::new(TypeKey::of::<T>(kind), "")
    }

    /// Key of the registration of `T` under `name`.
    #[inline]
    pub fn named<T: ?Sized + 'static>(kind: TypeKind, name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(TypeKey::of::<T>(kind), name)
    }

    pub fn type_key(&self) -> &TypeKey {
        &self.type_key
    }

    /// Get the type or trait name for display.
    pub fn display_name(&self) -> &'static str {
        self.type_key.type_name
    }

    /// The raw name; empty for the default registration.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the service name for named services, or `None` for unnamed services.
    pub fn service_name(&self) -> Option<&str> {
        if self.name.is_empty() {
            None
        } else {
            Some(&self.name)
        }
    }

    pub(crate) fn name_cow(&self) -> &Cow<'static, str> {
        &self.name
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.service_name() {
            Some(name) => write!(f, "{}[{}]", self.display_name(), name),
            None => f.write_str(self.display_name()),
        }
    }
}
