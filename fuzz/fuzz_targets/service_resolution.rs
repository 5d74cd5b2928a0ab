#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tiered_di::{Container, Lifetime, Resolver};

struct Service;

// Byte 0 picks the lifetime; every following byte resolves from one of a
// small tree of scopes. Build counts must match the lifetime's sharing rule.
fuzz_target!(|data: &[u8]| {
    let Some((&selector, ops)) = data.split_first() else {
        return;
    };
    let lifetime = match selector % 3 {
        0 => Lifetime::Singleton,
        1 => Lifetime::Scoped,
        _ => Lifetime::Transient,
    };

    let builds = Arc::new(AtomicUsize::new(0));
    let counter = builds.clone();
    let root = Container::new();
    root.register::<Service, _>(lifetime, "", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Service
    })
    .unwrap();

    let child = root.create_scope();
    let nodes = [root.clone(), child.clone(), child.create_scope(), root.create_scope()];
    let mut touched = [false; 4];

    for &op in ops {
        let index = (op % 4) as usize;
        touched[index] = true;
        let first = nodes[index].get_required::<Service>();
        let second = nodes[index].get_required::<Service>();
        assert_eq!(Arc::ptr_eq(&first, &second), lifetime != Lifetime::Transient);
    }

    let expected = match lifetime {
        Lifetime::Singleton => usize::from(!ops.is_empty()),
        Lifetime::Scoped => touched.iter().filter(|t| **t).count(),
        Lifetime::Transient => ops.len() * 2,
    };
    assert_eq!(builds.load(Ordering::SeqCst), expected);
});
