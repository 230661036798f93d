//! Integration tests for resolution from many threads at once.
//!
//! Resolvers share one runtime. Class initialization, call-site binding and loader bookkeeping
//! must converge to a single result however the threads interleave.

mod common;

use std::{sync::Arc, thread};

use common::Fixture;
use vmlink::prelude::*;

const THREADS: usize = 8;

#[test]
fn test_concurrent_static_calls_initialize_once() {
    let fixture = Fixture::new();
    let circle = fixture.class("demo/Circle");
    let shape = fixture.class("demo/Shape");

    let mut pool = PoolBuilder::new(&circle);
    let shape_ref = pool.class("demo/Shape");
    let unit = pool.method_ref(shape_ref, "unit", "()Ldemo/Shape;");
    let count = pool.field_ref(shape_ref, "COUNT", "I");
    let pool = pool.build();

    thread::scope(|scope| {
        for index in 0..THREADS {
            let runtime = &fixture.runtime;
            let pool = &pool;
            let shape = &shape;
            scope.spawn(move || {
                let resolver = runtime.resolver();
                if index % 2 == 0 {
                    let call = resolver
                        .resolve_invoke(pool, unit, InvokeKind::Static, None)
                        .unwrap();
                    assert_eq!(call.selected_method().name, "unit");
                } else {
                    resolver
                        .resolve_field(pool, count, FieldAccessKind::GetStatic, false)
                        .unwrap();
                }
                // Whoever returns saw the class fully initialized
                assert!(shape.is_initialized());
            });
        }
    });

    assert_eq!(fixture.initializations_of("demo/Shape"), 1);
    assert_eq!(fixture.initializations_of("java/lang/Object"), 1);
}

#[test]
fn test_concurrent_call_site_binding_converges() {
    let fixture = Fixture::new();
    let circle = fixture.class("demo/Circle");

    let mut pool = PoolBuilder::new(&circle);
    let bootstrap = pool.bootstrap(common::bootstrap_specifier(&fixture.runtime));
    let site = pool.invoke_dynamic(bootstrap, "apply", "()Ljava/util/function/Supplier;");
    let pool = pool.build();

    let results: Vec<CallInfo> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let runtime = &fixture.runtime;
                let pool = &pool;
                scope.spawn(move || {
                    runtime
                        .resolver()
                        .resolve_invoke(pool, site, InvokeKind::Dynamic, None)
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    // Racing bootstraps are allowed, but everyone gets the binding installed first
    let bound = pool.call_site(site).unwrap();
    let appendix = bound.appendix.clone().unwrap();
    for call in &results {
        assert!(Arc::ptr_eq(call.appendix().unwrap(), &appendix));
        assert_eq!(call.selected_method().token, bound.method.token);
    }
    assert!(fixture.bootstraps() >= 1);
    assert!(fixture.bootstraps() <= THREADS);

    // Once bound, the bootstrap method never runs again
    let before = fixture.bootstraps();
    fixture
        .runtime
        .resolver()
        .resolve_invoke(&pool, site, InvokeKind::Dynamic, None)
        .unwrap();
    assert_eq!(fixture.bootstraps(), before);
}

#[test]
fn test_concurrent_dependency_recording() {
    let fixture = Fixture::new();
    let registry = fixture.runtime.registry();
    let app = registry.create_loader("app", LoaderId::BOOTSTRAP);
    let plugin = registry.create_loader("plugin", LoaderId::BOOTSTRAP);

    let service = ClassBuilder::new("demo/Service")
        .with_loader(plugin)
        .method("run", "()V", AccessFlags::PUBLIC)
        .define(registry)
        .unwrap();
    registry.register_initiating_loader(app, &service).unwrap();
    let clients: Vec<ClassTypeRc> = (0..THREADS)
        .map(|index| {
            ClassBuilder::new(&format!("app/Client{index}"))
                .with_loader(app)
                .define(registry)
                .unwrap()
        })
        .collect();

    thread::scope(|scope| {
        for client in &clients {
            let runtime = &fixture.runtime;
            let service = &service;
            scope.spawn(move || {
                let mut pool = PoolBuilder::new(client);
                let service_ref = pool.class("demo/Service");
                let run = pool.method_ref(service_ref, "run", "()V");
                let pool = pool.build();
                let receiver = Oop::new(service.clone(), "service");
                let call = runtime
                    .resolver()
                    .resolve_invoke(&pool, run, InvokeKind::Virtual, Some(&receiver))
                    .unwrap();
                assert_eq!(call.selected_method().holder_name(), "demo/Service");
            });
        }
    });

    // One edge, however many classes of the loader raced to record it
    assert_eq!(registry.loaders().dependencies(app), vec![plugin]);
}

#[test]
fn test_concurrent_linking_assigns_one_vtable() {
    let fixture = Fixture::new();
    let shape = fixture.class("demo/Shape");
    let square = fixture.class("demo/Square");

    let indexes: Vec<VtableIndex> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let runtime = &fixture.runtime;
                let shape = &shape;
                let square = &square;
                scope.spawn(move || {
                    let link = LinkInfo::new(shape, "area", "()D", square);
                    runtime
                        .resolver()
                        .resolve_virtual_vtable_index(square, &link)
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    assert!(indexes[0].is_slot());
    assert!(indexes.iter().all(|index| *index == indexes[0]));
    let slot = indexes[0].slot().unwrap();
    assert_eq!(
        square.method_at_vtable(slot).map(|method| method.holder_name()),
        Some("demo/Square".to_string())
    );
}
