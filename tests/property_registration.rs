//! Property-based tests for registration and resolution
//!
//! These tests use proptest to generate random registration plans and verify
//! invariants that should hold for all of them.

use tiered_di::{Container, DiError, Lifetime, Resolver};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug)]
struct TestService {
    id: u32,
}

fn lifetime() -> impl Strategy<Value = Lifetime> {
    prop_oneof![
        Just(Lifetime::Singleton),
        Just(Lifetime::Scoped),
        Just(Lifetime::Transient),
    ]
}

// Property: the first registration of a name wins, every repeat is rejected
proptest! {
    #[test]
    fn first_registration_wins(names in prop::collection::vec("[a-d]{0,2}", 1..20)) {
        let container = Container::new();
        let mut seen = HashSet::new();

        for (id, name) in names.iter().enumerate() {
            let id = id as u32;
            let result = container.add_named_singleton_factory::<TestService, _>(
                name.clone(),
                move |_| TestService { id },
            );
            if seen.insert(name.clone()) {
                prop_assert!(result.is_ok());
            } else {
                let is_duplicate = matches!(result, Err(DiError::FactoryAlreadyRegistered { .. }));
                prop_assert!(is_duplicate);
            }
        }

        for name in &seen {
            let first = names.iter().position(|n| n == name).unwrap() as u32;
            let resolved = container.get_named_required::<TestService>(name.clone());
            prop_assert_eq!(resolved.id, first);
        }
        prop_assert_eq!(container.len(), seen.len());
    }
}

// Property: instance sharing follows the lifetime, whatever the scope depth
proptest! {
    #[test]
    fn sharing_follows_lifetime(lifetime in lifetime(), depth in 0usize..4) {
        let container = Container::new();
        container
            .register::<TestService, _>(lifetime, "", |_| TestService { id: 1 })
            .unwrap();

        let mut scope = container.clone();
        for _ in 0..depth {
            scope = scope.create_scope();
        }
        let sibling = container.create_scope();

        let a = scope.get_required::<TestService>();
        let b = scope.get_required::<TestService>();
        let other = sibling.get_required::<TestService>();

        match lifetime {
            Lifetime::Singleton => {
                prop_assert!(Arc::ptr_eq(&a, &b));
                prop_assert!(Arc::ptr_eq(&a, &other));
            }
            Lifetime::Scoped => {
                prop_assert!(Arc::ptr_eq(&a, &b));
                prop_assert!(!Arc::ptr_eq(&a, &other));
            }
            Lifetime::Transient => {
                prop_assert!(!Arc::ptr_eq(&a, &b));
                prop_assert!(!Arc::ptr_eq(&a, &other));
            }
        }
    }
}

// Property: N decorators compose in registration order
proptest! {
    #[test]
    fn decorators_compose_in_order(tags in prop::collection::vec("[a-z]{1,3}", 0..8)) {
        trait Describe: Send + Sync {
            fn describe(&self) -> String;
        }
        struct Base;
        impl Describe for Base {
            fn describe(&self) -> String {
                "base".to_string()
            }
        }
        struct Tagged(String, Arc<dyn Describe>);
        impl Describe for Tagged {
            fn describe(&self) -> String {
                format!("{}({})", self.0, self.1.describe())
            }
        }

        let container = Container::new();
        container
            .add_transient_trait_factory::<dyn Describe, _>(|_| Arc::new(Base))
            .unwrap();
        for tag in &tags {
            let tag = tag.clone();
            container
                .decorate::<dyn Describe, _>(move |inner, _| Arc::new(Tagged(tag.clone(), inner)))
                .unwrap();
        }

        let expected = tags
            .iter()
            .fold("base".to_string(), |acc, tag| format!("{}({})", tag, acc));
        prop_assert_eq!(container.get_required_trait::<dyn Describe>().describe(), expected);
    }
}

// Property: a scope can register any key the shared registry lacks, once
proptest! {
    #[test]
    fn scope_registration_respects_shared_keys(shared in any::<bool>(), scopes in 1usize..5) {
        let container = Container::new();
        if shared {
            container.add_scoped_factory::<TestService, _>(|_| TestService { id: 0 }).unwrap();
        }

        for i in 0..scopes {
            let scope = container.create_scope();
            let id = i as u32 + 1;
            let result = scope.add_scoped_factory::<TestService, _>(move |_| TestService { id });
            prop_assert_eq!(result.is_ok(), !shared);
            let expected = if shared { 0 } else { id };
            prop_assert_eq!(scope.get_required::<TestService>().id, expected);
        }
    }
}
