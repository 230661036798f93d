//! Benchmarks for link resolution.
//!
//! Measures the resolver paths an interpreter hits on every not-yet-cached call site:
//! - Virtual calls through the vtable
//! - Interface calls by lookup from the receiver
//! - Static calls of an already initialized class
//! - Field resolution
//! - Bound dynamic call sites
//! - Linking a class hierarchy in parallel

extern crate vmlink;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use std::{hint::black_box, sync::Arc};
use vmlink::prelude::*;

const DEPTH: usize = 8;

/// A chain `bench/Level0 <- bench/Level1 <- ...` where every level overrides `work()I`,
/// and every level implements `bench/Task`.
fn hierarchy(registry: &ClassRegistry) -> Vec<ClassTypeRc> {
    ClassBuilder::interface("bench/Task")
        .method("run", "(I)I", AccessFlags::PUBLIC | AccessFlags::ABSTRACT)
        .define(registry)
        .unwrap();

    let mut classes = Vec::with_capacity(DEPTH);
    for level in 0..DEPTH {
        let name = format!("bench/Level{level}");
        let mut builder = ClassBuilder::new(&name)
            .field("state", "J", AccessFlags::PROTECTED)
            .field("INSTANCES", "I", AccessFlags::PUBLIC | AccessFlags::STATIC)
            .method("work", "()I", AccessFlags::PUBLIC)
            .method("helper", "(Ljava/lang/Object;)V", AccessFlags::PUBLIC | AccessFlags::STATIC);
        if level == 0 {
            builder = builder
                .implements("bench/Task")
                .method("run", "(I)I", AccessFlags::PUBLIC);
        } else {
            builder = builder.extends(&format!("bench/Level{}", level - 1));
        }
        classes.push(builder.define(registry).unwrap());
    }
    classes
}

fn runtime() -> (Runtime, Vec<ClassTypeRc>) {
    let registry = ClassRegistry::new().unwrap();
    let classes = hierarchy(&registry);
    registry.link_all().unwrap();
    let runtime = RuntimeBuilder::new()
        .registry(Arc::new(registry))
        .build()
        .unwrap();
    (runtime, classes)
}

/// Benchmark virtual dispatch of a method overridden at every level.
fn bench_virtual_call(c: &mut Criterion) {
    let (runtime, classes) = runtime();
    let root = &classes[0];
    let leaf = &classes[DEPTH - 1];
    let receiver = Oop::new(leaf.clone(), "leaf");
    let resolver = runtime.resolver();

    c.bench_function("resolve_virtual_call", |b| {
        b.iter(|| {
            let link = LinkInfo::new(root, "work", "()I", leaf);
            let call = resolver
                .resolve_virtual_call(Some(&receiver), leaf, black_box(&link), true)
                .unwrap();
            black_box(call)
        });
    });
}

/// Benchmark interface dispatch found at the root of the chain.
fn bench_interface_call(c: &mut Criterion) {
    let (runtime, classes) = runtime();
    let task = runtime
        .registry()
        .find_class("bench/Task", LoaderId::BOOTSTRAP)
        .unwrap();
    let leaf = &classes[DEPTH - 1];
    let receiver = Oop::new(leaf.clone(), "leaf");
    let resolver = runtime.resolver();

    c.bench_function("resolve_interface_call", |b| {
        b.iter(|| {
            let link = LinkInfo::new(&task, "run", "(I)I", leaf);
            let call = resolver
                .resolve_interface_call(Some(&receiver), leaf, black_box(&link), true)
                .unwrap();
            black_box(call)
        });
    });
}

/// Benchmark a static call through the pool of the deepest class.
fn bench_static_call(c: &mut Criterion) {
    let (runtime, classes) = runtime();
    let leaf = &classes[DEPTH - 1];
    let mut pool = PoolBuilder::new(leaf);
    let class_ref = pool.class("bench/Level0");
    let helper = pool.method_ref(class_ref, "helper", "(Ljava/lang/Object;)V");
    let pool = pool.build();
    let resolver = runtime.resolver();
    resolver
        .resolve_invoke(&pool, helper, InvokeKind::Static, None)
        .unwrap();

    c.bench_function("resolve_invokestatic", |b| {
        b.iter(|| {
            let call = resolver
                .resolve_invoke(&pool, black_box(helper), InvokeKind::Static, None)
                .unwrap();
            black_box(call)
        });
    });
}

/// Benchmark resolving an inherited field.
fn bench_field(c: &mut Criterion) {
    let (runtime, classes) = runtime();
    let leaf = &classes[DEPTH - 1];
    let mut pool = PoolBuilder::new(leaf);
    let class_ref = pool.class(&leaf.name);
    let state = pool.field_ref(class_ref, "state", "J");
    let pool = pool.build();
    let resolver = runtime.resolver();

    c.bench_function("resolve_field", |b| {
        b.iter(|| {
            let info = resolver
                .resolve_field(&pool, black_box(state), FieldAccessKind::GetField, false)
                .unwrap();
            black_box(info)
        });
    });
}

/// Benchmark method handle intrinsic linking, which synthesizes once and then hits the cache.
fn bench_handle_intrinsic(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let handle = runtime.registry().method_handle_class().unwrap();
    let resolver = runtime.compiler_resolver();

    c.bench_function("resolve_handle_call_intrinsic", |b| {
        b.iter(|| {
            let link = LinkInfo::unchecked(&handle, "invokeBasic", "(Ljava/lang/String;J)I");
            let call = resolver.resolve_handle_call(black_box(&link)).unwrap();
            black_box(call)
        });
    });
}

/// Benchmark building vtables for a fresh hierarchy.
fn bench_link_all(c: &mut Criterion) {
    c.bench_function("link_all", |b| {
        b.iter_batched(
            || {
                let registry = ClassRegistry::new().unwrap();
                hierarchy(&registry);
                registry
            },
            |registry| {
                registry.link_all().unwrap();
                black_box(registry)
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_virtual_call,
    bench_interface_call,
    bench_static_call,
    bench_field,
    bench_handle_intrinsic,
    bench_link_all
);
criterion_main!(benches);
