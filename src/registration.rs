//! Service registration types: build chains, definitions and the registry.

use std::any::Any;
use std::borrow::Cow;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::container::Container;
use crate::internal::{violation, HashMap};
use crate::key::{Key, TypeKey, TypeKind};
use crate::lifetime::Lifetime;

// Type-erased Arc for storage. Instances are stored as `Arc<T>` boxed inside
// this, so sized types and trait objects share one representation.
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

/// Builds the base instance of a definition.
pub(crate) type Factory<T> = Arc<dyn Fn(&Container) -> Arc<T> + Send + Sync>;

/// Wraps the previous step's instance in another implementation of `T`.
pub(crate) type Decorator<T> = Arc<dyn Fn(Arc<T>, &Container) -> Arc<T> + Send + Sync>;

/// Factory plus the decorators appended to it, in registration order.
pub(crate) struct BuildChain<T: ?Sized> {
    factory: Factory<T>,
    decorators: Vec<Decorator<T>>,
}

impl<T: ?Sized> Clone for BuildChain<T> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            decorators: self.decorators.clone(),
        }
    }
}

impl<T: ?Sized + Send + Sync + 'static> BuildChain<T> {
    pub(crate) fn new(factory: Factory<T>) -> Self {
        Self {
            factory,
            decorators: Vec::new(),
        }
    }

    /// Returns a copy of this chain with `decorator` appended.
    pub(crate) fn with_decorator(&self, decorator: Decorator<T>) -> Self {
        let mut chain = self.clone();
        chain.decorators.push(decorator);
        chain
    }

    /// Runs the factory, then folds every decorator over the result.
    pub(crate) fn build(&self, container: &Container) -> Arc<T> {
        let base = (self.factory)(container);
        self.decorators
            .iter()
            .fold(base, |value, decorator| decorator(value, container))
    }
}

/// Object-safe view of a [`BuildChain`] for storage in the registry.
pub(crate) trait ErasedChain: Send + Sync {
    fn build_any(&self, container: &Container) -> AnyArc;
    fn decorator_count(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
}

impl<T: ?Sized + Send + Sync + 'static> ErasedChain for BuildChain<T> {
    fn build_any(&self, container: &Container) -> AnyArc {
        Arc::new(self.build(container))
    }

    fn decorator_count(&self) -> usize {
        self.decorators.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A registered construction rule.
///
/// The chain is an immutable snapshot; decoration replaces it with a longer
/// one, so resolutions that already cloned the definition are unaffected.
#[derive(Clone)]
pub(crate) struct Definition {
    pub(crate) lifetime: Lifetime,
    pub(crate) kind: TypeKind,
    pub(crate) chain: Arc<dyn ErasedChain>,
}

impl Definition {
    pub(crate) fn new<T: ?Sized + Send + Sync + 'static>(
        lifetime: Lifetime,
        kind: TypeKind,
        factory: Factory<T>,
    ) -> Self {
        Self {
            lifetime,
            kind,
            chain: Arc::new(BuildChain::new(factory)),
        }
    }

    /// Returns this definition with `decorator` appended to its chain.
    pub(crate) fn decorated<T: ?Sized + Send + Sync + 'static>(
        &self,
        key: &Key,
        decorator: Decorator<T>,
    ) -> Self {
        let chain = match self.chain.as_any().downcast_ref::<BuildChain<T>>() {
            Some(chain) => chain,
            None => violation(key, std::any::type_name::<T>()),
        };
        Self {
            lifetime: self.lifetime,
            kind: self.kind,
            chain: Arc::new(chain.with_decorator(decorator)),
        }
    }

    pub(crate) fn decorator_count(&self) -> usize {
        self.chain.decorator_count()
    }
}

/// Definitions registered under one abstract type, keyed by name.
pub(crate) type NamedDefinitions = HashMap<Cow<'static, str>, Definition>;

/// Two-level map from abstract type to named definitions.
#[derive(Default)]
pub(crate) struct DefinitionMap {
    types: HashMap<TypeKey, NamedDefinitions>,
}

impl DefinitionMap {
    pub(crate) fn get(&self, key: &Key) -> Option<&Definition> {
        self.types
            .get(key.type_key())
            .and_then(|named| named.get(key.name()))
    }

    pub(crate) fn contains(&self, key: &Key) -> bool {
        self.get(key).is_some()
    }

    /// Inserts without checking for an existing entry; callers check first.
    pub(crate) fn insert(&mut self, key: Key, definition: Definition) {
        let type_key = *key.type_key();
        self.types
            .entry(type_key)
            .or_default()
            .insert(key.name_cow().clone(), definition);
    }

    /// Every definition registered for `type_key`, across all names.
    pub(crate) fn definitions_of_mut(&mut self, type_key: &TypeKey) -> Option<&mut NamedDefinitions> {
        self.types.get_mut(type_key)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (Key, &Definition)> + '_ {
        self.types.iter().flat_map(|(type_key, named)| {
            named
                .iter()
                .map(move |(name, definition)| (Key::new(*type_key, name.clone()), definition))
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.types.values().map(|named| named.len()).sum()
    }
}

/// Lock-protected definition set.
///
/// One instance is shared by a whole scope tree (the global registry); each
/// child scope additionally owns a private one for its scoped registrations.
#[derive(Default)]
pub(crate) struct Registry {
    map: RwLock<DefinitionMap>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, DefinitionMap> {
        self.map.read()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, DefinitionMap> {
        self.map.write()
    }

    /// Clones the definition for `key` out of the registry.
    #[inline]
    pub(crate) fn get(&self, key: &Key) -> Option<Definition> {
        self.map.read().get(key).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.map.read().len()
    }
}
