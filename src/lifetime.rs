//! Service lifetime definitions.

use std::fmt;

/// Service lifetimes controlling instance caching behavior.
///
/// # Examples
///
/// ```rust
/// use tiered_di::{Container, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct Repository { db_url: String }
/// struct RequestModel { id: u32 }
///
/// let container = Container::new();
///
/// // Singleton: one instance for the whole scope tree
/// container.add_singleton(Database { url: "postgres://localhost".to_string() }).unwrap();
///
/// // Scoped: one instance per scope
/// container.add_scoped_factory::<Repository, _>(|c| {
///     let db = c.get_required::<Database>();
///     Repository { db_url: db.url.clone() }
/// }).unwrap();
///
/// // Transient: new instance every time
/// container.add_transient_factory::<RequestModel, _>(|_| RequestModel { id: 12345 }).unwrap();
///
/// let db1 = container.get_required::<Database>();
/// let scope1 = container.create_scope();
/// let db2 = scope1.get_required::<Database>();
/// assert!(Arc::ptr_eq(&db1, &db2));
///
/// let repo1a = scope1.get_required::<Repository>();
/// let repo1b = scope1.get_required::<Repository>();
/// assert!(Arc::ptr_eq(&repo1a, &repo1b));
///
/// let scope2 = container.create_scope();
/// let repo2 = scope2.get_required::<Repository>();
/// assert!(!Arc::ptr_eq(&repo1a, &repo2));
///
/// let model1 = scope1.get_required::<RequestModel>();
/// let model2 = scope1.get_required::<RequestModel>();
/// assert!(!Arc::ptr_eq(&model1, &model2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// One instance per scope tree.
    ///
    /// Built on first resolution from any node of the tree and cached in the
    /// singleton cache that the root and every descendant share.
    Singleton,
    /// One instance per scope.
    ///
    /// Cached in the resolving container's own scoped cache, which is never
    /// shared with its parent or children.
    Scoped,
    /// New instance per resolution, never cached.
    ///
    /// The factory and every decorator run again on each call.
    Transient,
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Lifetime::Singleton => "Singleton",
            Lifetime::Scoped => "Scoped",
            Lifetime::Transient => "Transient",
        })
    }
}
