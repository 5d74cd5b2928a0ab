use tiered_di::{Container, DiError, Resolver};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[test]
fn test_scoped_lifetime() {
    #[derive(Debug, Clone)]
    struct RequestContext {
        id: String,
    }

    let counter = Arc::new(Mutex::new(0));
    let counter_clone = counter.clone();

    let container = Container::new();
    container
        .add_scoped_factory::<RequestContext, _>(move |_| {
            let mut c = counter_clone.lock().unwrap();
            *c += 1;
            RequestContext {
                id: format!("req-{}", *c),
            }
        })
        .unwrap();

    let scope1 = container.create_scope();
    let scope2 = container.create_scope();

    let ctx1a = scope1.get_required::<RequestContext>();
    let ctx1b = scope1.get_required::<RequestContext>();
    let ctx2a = scope2.get_required::<RequestContext>();
    let ctx2b = scope2.get_required::<RequestContext>();

    // Same instance within same scope
    assert!(Arc::ptr_eq(&ctx1a, &ctx1b));
    assert!(Arc::ptr_eq(&ctx2a, &ctx2b));

    // Different instances across scopes
    assert!(!Arc::ptr_eq(&ctx1a, &ctx2a));
    assert_eq!(ctx1a.id, "req-1");
    assert_eq!(ctx2a.id, "req-2");
}

#[test]
fn test_scoped_resolves_on_root_with_its_own_cache() {
    struct Session;

    let container = Container::new();
    container.add_scoped_factory::<Session, _>(|_| Session).unwrap();

    let scope1 = container.create_scope();
    let scope2 = container.create_scope();
    let from_scope1 = scope1.get_required::<Session>();
    let from_scope2 = scope2.get_required::<Session>();

    assert!(!Arc::ptr_eq(&from_scope1, &from_scope2));
    // The root never resolved it, so its scoped cache is untouched.
    assert_eq!(container.scoped_instances(), 0);

    let from_root = container.get_required::<Session>();
    assert!(Arc::ptr_eq(&from_root, &container.get_required::<Session>()));
    assert!(!Arc::ptr_eq(&from_root, &from_scope1));
    assert!(!Arc::ptr_eq(&from_root, &from_scope2));
    assert_eq!(container.scoped_instances(), 1);
}

#[test]
fn test_singleton_shared_across_scope_tree() {
    struct Database;

    let builds = Arc::new(AtomicUsize::new(0));
    let builds_clone = builds.clone();

    let container = Container::new();
    container
        .add_singleton_factory::<Database, _>(move |_| {
            builds_clone.fetch_add(1, Ordering::SeqCst);
            Database
        })
        .unwrap();

    let child = container.create_scope();
    let grandchild = child.create_scope();

    let a = grandchild.get_required::<Database>();
    let b = container.get_required::<Database>();
    let c = container.create_scope().get_required::<Database>();

    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&b, &c));
    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert_eq!(container.singleton_instances(), 1);
    assert_eq!(grandchild.singleton_instances(), 1);
}

#[test]
fn test_singleton_registered_in_scope_is_global() {
    let container = Container::new();
    let scope = container.create_scope();
    scope.add_singleton(7u32).unwrap();

    assert_eq!(*container.get_required::<u32>(), 7);
    assert_eq!(*container.create_scope().get_required::<u32>(), 7);
}

#[test]
fn test_scoped_value_registered_in_scope_stays_local() {
    struct RequestContext {
        path: &'static str,
    }
    struct Handler {
        context: Arc<RequestContext>,
    }

    let container = Container::new();
    container
        .add_scoped_factory::<Handler, _>(|c| Handler {
            context: c.get_required::<RequestContext>(),
        })
        .unwrap();

    let first = container.create_scope();
    first.add_scoped(RequestContext { path: "/" }).unwrap();
    let second = container.create_scope();
    second.add_scoped(RequestContext { path: "/ready" }).unwrap();

    assert_eq!(first.get_required::<Handler>().context.path, "/");
    assert_eq!(second.get_required::<Handler>().context.path, "/ready");
    assert!(matches!(
        container.get::<RequestContext>(),
        Err(DiError::FactoryNotRegistered { .. })
    ));
}

#[test]
fn test_local_registrations_are_not_inherited() {
    let container = Container::new();
    let parent = container.create_scope();
    parent.add_scoped(1u8).unwrap();

    let child = parent.create_scope();
    assert!(child.get::<u8>().is_err());
    assert_eq!(*parent.get_required::<u8>(), 1);
}

#[test]
fn test_registering_in_root_and_scope_fails() {
    struct SomeStruct;

    let container = Container::new();
    container.add_scoped_factory::<SomeStruct, _>(|_| SomeStruct).unwrap();

    let scope = container.create_scope();
    let err = scope.add_scoped_factory::<SomeStruct, _>(|_| SomeStruct).unwrap_err();
    assert!(matches!(err, DiError::FactoryAlreadyRegistered { .. }));
}

#[test]
fn test_same_definition_once_per_scope() {
    struct SomeStruct;

    let container = Container::new();
    let first = container.create_scope();
    first.add_scoped_factory::<SomeStruct, _>(|_| SomeStruct).unwrap();

    let second = container.create_scope();
    second.add_scoped_factory::<SomeStruct, _>(|_| SomeStruct).unwrap();

    assert!(first.add_scoped_factory::<SomeStruct, _>(|_| SomeStruct).is_err());
    assert!(!Arc::ptr_eq(
        &first.get_required::<SomeStruct>(),
        &second.get_required::<SomeStruct>()
    ));
    assert!(container.get::<SomeStruct>().is_err());
}

#[test]
fn test_scoped_named_definitions_per_scope() {
    let container = Container::new();
    container
        .add_named_scoped_factory::<String, _>("x", |_| "x".to_string())
        .unwrap();
    container
        .add_named_scoped_factory::<String, _>("y", |_| "y".to_string())
        .unwrap();

    let scope1 = container.create_scope();
    let scope2 = container.create_scope();

    let x1 = scope1.get_named_required::<String>("x");
    let x2 = scope2.get_named_required::<String>("x");
    let y1 = scope1.get_named_required::<String>("y");

    assert!(!Arc::ptr_eq(&x1, &x2));
    assert!(Arc::ptr_eq(&x1, &scope1.get_named_required::<String>("x")));
    assert_eq!(*y1, "y");
}

#[test]
fn test_cached_build_sees_the_triggering_scope() {
    struct Tenant(&'static str);
    struct Report {
        tenant: Arc<Tenant>,
    }

    let container = Container::new();
    container
        .add_singleton_factory::<Report, _>(|c| Report {
            tenant: c.get_required::<Tenant>(),
        })
        .unwrap();

    let acme = container.create_scope();
    acme.add_scoped(Tenant("acme")).unwrap();
    let globex = container.create_scope();
    globex.add_scoped(Tenant("globex")).unwrap();

    // First build happens in `acme`; later resolutions reuse it everywhere.
    assert_eq!(acme.get_required::<Report>().tenant.0, "acme");
    assert_eq!(globex.get_required::<Report>().tenant.0, "acme");
}

#[test]
fn test_scope_metadata() {
    let container = Container::new();
    let child = container.create_scope();
    let grandchild = child.create_scope();

    assert!(container.is_root());
    assert!(!child.is_root());
    assert_eq!(container.depth(), 0);
    assert_eq!(grandchild.depth(), 2);
    assert!(grandchild.same_tree(&container));
    assert!(!container.same_tree(&Container::new()));
}

#[test]
fn test_clone_is_the_same_node() {
    struct Session;

    let container = Container::new();
    container.add_scoped_factory::<Session, _>(|_| Session).unwrap();

    let scope = container.create_scope();
    let handle = scope.clone();
    assert!(Arc::ptr_eq(
        &scope.get_required::<Session>(),
        &handle.get_required::<Session>()
    ));
}
