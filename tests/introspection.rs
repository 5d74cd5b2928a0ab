use tiered_di::{
    Container, ContainerConfig, DiObserver, Key, Lifetime, MetricsObserver, Resolver, TypeKind,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

trait Handler: Send + Sync {}
struct Index;
impl Handler for Index {}

#[test]
fn test_descriptors_list_local_then_shared() {
    let container = Container::new();
    container.add_singleton(1u32).unwrap();
    container
        .add_named_transient_trait_factory::<dyn Handler, _>("/", |_| Arc::new(Index))
        .unwrap();

    let scope = container.create_scope();
    scope.add_scoped("request".to_string()).unwrap();

    let descriptors = scope.descriptors();
    assert_eq!(descriptors.len(), 3);

    let first = &descriptors[0];
    assert!(first.local);
    assert_eq!(first.type_name(), std::any::type_name::<String>());
    assert_eq!(first.lifetime, Lifetime::Scoped);
    assert!(!first.is_named());

    let handler = descriptors
        .iter()
        .find(|d| d.kind == TypeKind::Trait)
        .expect("handler descriptor");
    assert_eq!(handler.service_name(), Some("/"));
    assert!(!handler.local);
    assert!(!handler.is_decorated());

    // The root sees the shared definitions only.
    assert_eq!(container.descriptors().len(), 2);
    assert!(container.descriptors().iter().all(|d| !d.local));
}

#[test]
fn test_contains() {
    let container = Container::new();
    container.add_named_singleton("port", 8080u16).unwrap();
    container
        .add_transient_trait_factory::<dyn Handler, _>(|_| Arc::new(Index))
        .unwrap();

    assert!(container.contains::<u16>("port"));
    assert!(!container.contains::<u16>(""));
    assert!(container.contains_trait::<dyn Handler>(""));
    assert!(!container.is_empty());
    assert_eq!(container.len(), 2);
    assert!(Container::new().is_empty());
}

#[test]
fn test_contains_with_runtime_names() {
    let container = Container::new();
    container
        .add_named_transient_trait_factory::<dyn Handler, _>("/ready", |_| Arc::new(Index))
        .unwrap();

    let path = format!("/{}", "ready");
    assert!(container.contains_trait::<dyn Handler>(path.clone()));
    assert!(!container.contains_trait::<dyn Handler>(format!("{}/", path)));
    assert!(!container.contains::<u16>(String::new()));
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl DiObserver for Recorder {
    fn resolving(&self, key: &Key) {
        self.events.lock().unwrap().push(format!("resolving {}", key));
    }

    fn resolved(&self, key: &Key, lifetime: Lifetime, _duration: Duration) {
        self.events
            .lock()
            .unwrap()
            .push(format!("resolved {} {}", key, lifetime));
    }

    fn built(&self, key: &Key, lifetime: Lifetime) {
        self.events.lock().unwrap().push(format!("built {} {}", key, lifetime));
    }
}

#[test]
fn test_observer_sees_builds_and_resolutions() {
    let recorder = Arc::new(Recorder::default());
    let container = Container::new();
    container.add_observer(recorder.clone());
    container.add_named_singleton_factory::<u8, _>("n", |_| 1).unwrap();

    container.get_named_required::<u8>("n");
    container.create_scope().get_named_required::<u8>("n");

    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec![
            "resolving u8[n]",
            "built u8[n] Singleton",
            "resolved u8[n] Singleton",
            "resolving u8[n]",
            "resolved u8[n] Singleton",
        ]
    );
}

#[test]
fn test_observers_are_shared_by_scopes() {
    let metrics = Arc::new(MetricsObserver::new());
    let container = Container::new();
    let scope = container.create_scope();

    // Attached after the scope was created, through the scope.
    scope.add_observer(metrics.clone());
    container.add_transient_factory::<u8, _>(|_| 0).unwrap();

    container.get_required::<u8>();
    scope.get_required::<u8>();
    assert_eq!(metrics.resolution_count(), 2);
    assert_eq!(metrics.build_count(), 2);
}

#[test]
fn test_failed_resolution_is_not_reported_as_resolved() {
    let metrics = Arc::new(MetricsObserver::new());
    let container = Container::new();
    container.add_observer(metrics.clone());

    assert!(container.get::<u8>().is_err());
    assert_eq!(metrics.resolution_count(), 0);
}

#[test]
fn test_config_is_shared_by_the_tree() {
    let config = ContainerConfig::default()
        .with_label("billing")
        .with_trace_resolutions(true);
    let container = Container::with_config(config.clone());
    let scope = container.create_scope().create_scope();

    assert_eq!(scope.config(), &config);
    assert!(format!("{:?}", scope).contains("billing"));
}

#[test]
fn test_tracing_observer_does_not_change_results() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let container =
            Container::with_config(ContainerConfig::default().with_trace_resolutions(true));
        container.add_singleton_factory::<String, _>(|_| "traced".into()).unwrap();
        container
            .add_named_transient_trait_factory::<dyn Handler, _>("/", |_| Arc::new(Index))
            .unwrap();
        container.decorate::<dyn Handler, _>(|inner, _| inner).unwrap();

        assert_eq!(*container.get_required::<String>(), "traced");
        assert!(container.create_scope().get_named_trait::<dyn Handler>("/").is_ok());
    });
}

#[cfg(feature = "config")]
#[test]
fn test_config_from_json() {
    let config = ContainerConfig::from_json(r#"{ "label": "api", "trace_resolutions": false }"#).unwrap();
    let container = Container::with_config(config);
    assert_eq!(container.config().label, "api");
}
