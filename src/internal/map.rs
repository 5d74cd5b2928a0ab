//! Map type shared by the registry and the lifetime caches.

#[cfg(feature = "ahash")]
pub(crate) type HashMap<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;

#[cfg(not(feature = "ahash"))]
pub(crate) type HashMap<K, V> = std::collections::HashMap<K, V>;
