#![no_main]

use libfuzzer_sys::fuzz_target;
use std::collections::HashSet;
use std::sync::Arc;
use tiered_di::{Container, DiError, Lifetime, Resolver};

trait Tagged: Send + Sync {
    fn tag(&self) -> u8;
}

struct Plain(u8);

impl Tagged for Plain {
    fn tag(&self) -> u8 {
        self.0
    }
}

const NAMES: [&str; 4] = ["", "a", "b", "/ready"];

// Each byte pair is one operation against a root and one child scope; the
// outcome is checked against a model of which keys each registry holds.
fuzz_target!(|data: &[u8]| {
    let root = Container::new();
    let scope = root.create_scope();
    let mut shared: HashSet<&str> = HashSet::new();
    let mut local: HashSet<&str> = HashSet::new();

    for op in data.chunks_exact(2) {
        let name = NAMES[(op[1] % 4) as usize];
        let on_scope = op[1] & 0x80 != 0;
        let target = if on_scope { &scope } else { &root };

        match op[0] % 4 {
            0 | 1 | 2 => {
                let lifetime = match op[0] % 3 {
                    0 => Lifetime::Singleton,
                    1 => Lifetime::Scoped,
                    _ => Lifetime::Transient,
                };
                let value = op[1];
                let result = target.register_trait::<dyn Tagged, _>(lifetime, name, move |_| {
                    Arc::new(Plain(value))
                });

                let visible = shared.contains(name) || (on_scope && local.contains(name));
                if visible {
                    assert!(matches!(result, Err(DiError::FactoryAlreadyRegistered { .. })));
                } else {
                    assert!(result.is_ok());
                    if on_scope && lifetime == Lifetime::Scoped {
                        local.insert(name);
                    } else {
                        shared.insert(name);
                    }
                }
            }
            _ => {
                let result = target.decorate::<dyn Tagged, _>(|inner, _| inner);
                let has_any = !shared.is_empty() || (on_scope && !local.is_empty());
                assert_eq!(result.is_ok(), has_any);
            }
        }
    }

    for name in NAMES {
        assert_eq!(root.get_named_trait::<dyn Tagged>(name).is_ok(), shared.contains(name));
        assert_eq!(
            scope.get_named_trait::<dyn Tagged>(name).is_ok(),
            shared.contains(name) || local.contains(name)
        );
    }
});
