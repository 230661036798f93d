//! Class hierarchies used across the unit tests.

use std::sync::Arc;

use crate::{
    metadata::{
        flags::AccessFlags,
        typesystem::{ClassBuilder, ClassRegistry},
    },
    runtime::{Runtime, RuntimeBuilder},
    test::factories::runtime::RecordingMethodHandles,
};

/// A bootstrapped registry with a small shape hierarchy on the bootstrap loader:
///
/// - `demo/Shape`: public abstract class, `protected int sides`, `public abstract double area()`
/// - `demo/Drawable`: interface, `public abstract void draw()`, `public static final int COLOR`
/// - `demo/Circle`: extends `Shape`, implements `Drawable`, `private double radius`,
///   implements `area()` and `draw()`
pub fn shapes_registry() -> ClassRegistry {
    let registry = ClassRegistry::new().unwrap();
    let public = AccessFlags::PUBLIC;
    let abstract_ = AccessFlags::ABSTRACT;

    ClassBuilder::new("demo/Shape")
        .with_flags(public | AccessFlags::SUPER | abstract_)
        .field("sides", "I", AccessFlags::PROTECTED)
        .method("area", "()D", public | abstract_)
        .define(&registry)
        .unwrap();

    ClassBuilder::interface("demo/Drawable")
        .method("draw", "()V", public | abstract_)
        .field("COLOR", "I", public | AccessFlags::STATIC | AccessFlags::FINAL)
        .define(&registry)
        .unwrap();

    ClassBuilder::new("demo/Circle")
        .extends("demo/Shape")
        .implements("demo/Drawable")
        .field("radius", "D", AccessFlags::PRIVATE)
        .method("area", "()D", public)
        .method("draw", "()V", public)
        .define(&registry)
        .unwrap();

    registry
}

/// A runtime over [`shapes_registry`] whose method handle factory records its up-calls
pub fn shapes_runtime() -> Runtime {
    RuntimeBuilder::new()
        .registry(Arc::new(shapes_registry()))
        .method_handles(RecordingMethodHandles::default())
        .build()
        .unwrap()
}
