//! Member lookup primitives used by the resolver.
//!
//! These combine the class-metadata queries into the search orders method resolution needs.
//! None of them checks access or raises an error: absence is `None`, and the resolver decides
//! what it means.

use crate::metadata::{
    method::{MethodRc, VtableIndex},
    typesystem::ClassTypeRc,
};

/// Searches `class` and its superclasses.
///
/// Arrays see exactly what their superclass declares. For other classes a signature-polymorphic
/// method is never returned while method handles are enabled: calls to it are linked through a
/// synthesized intrinsic or adapter instead.
#[must_use]
pub fn lookup_method_in_classes(
    class: &ClassTypeRc,
    name: &str,
    signature: &str,
    enable_invoke_dynamic: bool,
) -> Option<MethodRc> {
    let found = class.uncached_lookup_method(name, signature);
    if class.is_array() {
        return found;
    }
    found.filter(|method| !(enable_invoke_dynamic && method.intrinsic.is_signature_polymorphic()))
}

/// Searches `class` and its superclasses for the first instance method, skipping static
/// methods that hide it.
///
/// A static method on the root of the hierarchy is returned as is, so callers report the
/// static-ness mismatch instead of a missing method.
#[must_use]
pub fn lookup_instance_method_in_classes(
    class: &ClassTypeRc,
    name: &str,
    signature: &str,
) -> Option<MethodRc> {
    let mut found = class.uncached_lookup_method(name, signature);
    while let Some(method) = found.as_ref().filter(|method| method.is_static()) {
        match method.holder().and_then(|holder| holder.super_class.clone()) {
            Some(super_class) => found = super_class.uncached_lookup_method(name, signature),
            None => break,
        }
    }
    found
}

/// Searches every interface `class` implements, directly or indirectly
#[must_use]
pub fn lookup_method_in_interfaces(
    class: &ClassTypeRc,
    name: &str,
    signature: &str,
) -> Option<MethodRc> {
    class.lookup_method_in_all_interfaces(name, signature)
}

/// Dispatch slot of the miranda entry for `name` and `signature` in the vtable of `class`, or
/// [`VtableIndex::Invalid`] if there is none (or `class` is not linked)
#[must_use]
pub fn vtable_index_of_miranda(class: &ClassTypeRc, name: &str, signature: &str) -> VtableIndex {
    class
        .vtable()
        .and_then(|vtable| vtable.index_of_miranda(name, signature))
        .map_or(VtableIndex::Invalid, VtableIndex::Slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{
        flags::AccessFlags,
        loader::LoaderId,
        typesystem::{ClassBuilder, ClassRegistry},
    };

    #[test]
    fn test_polymorphic_methods_are_hidden() {
        let registry = ClassRegistry::new().unwrap();
        let handle = registry.method_handle_class().unwrap();
        let descriptor = "([Ljava/lang/Object;)Ljava/lang/Object;";

        assert!(lookup_method_in_classes(&handle, "invoke", descriptor, true).is_none());
        assert!(lookup_method_in_classes(&handle, "invoke", descriptor, false).is_some());
        assert!(lookup_method_in_classes(&handle, "type", "()Ljava/lang/invoke/MethodType;", true).is_some());
    }

    #[test]
    fn test_arrays_see_object_methods() {
        let registry = ClassRegistry::new().unwrap();
        let array = registry.resolve_class("[I", LoaderId::BOOTSTRAP).unwrap();
        let clone = lookup_method_in_classes(&array, "clone", "()Ljava/lang/Object;", true).unwrap();
        assert_eq!(clone.holder_name(), "java/lang/Object");
    }

    #[test]
    fn test_static_methods_are_skipped_for_instance_lookup() {
        let registry = ClassRegistry::new().unwrap();
        let base = ClassBuilder::new("demo/Base")
            .method("run", "()V", AccessFlags::PUBLIC)
            .define(&registry)
            .unwrap();
        let derived = ClassBuilder::new("demo/Derived")
            .extends("demo/Base")
            .method("run", "()V", AccessFlags::PUBLIC | AccessFlags::STATIC)
            .define(&registry)
            .unwrap();

        let any = lookup_method_in_classes(&derived, "run", "()V", true).unwrap();
        assert!(any.is_static());
        let instance = lookup_instance_method_in_classes(&derived, "run", "()V").unwrap();
        assert_eq!(instance.token, base.find_method("run", "()V").unwrap().token);
        assert!(lookup_instance_method_in_classes(&derived, "walk", "()V").is_none());
    }

    #[test]
    fn test_static_method_on_root_is_kept() {
        let registry = ClassRegistry::new().unwrap();
        let isolated = registry.create_loader("isolated", LoaderId::BOOTSTRAP);
        let root = ClassBuilder::new("java/lang/Object")
            .with_loader(isolated)
            .without_super()
            .method("run", "()V", AccessFlags::PUBLIC | AccessFlags::STATIC)
            .define(&registry)
            .unwrap();

        let found = lookup_instance_method_in_classes(&root, "run", "()V").unwrap();
        assert!(found.is_static());
        assert_eq!(found.holder_name(), "java/lang/Object");
    }

    #[test]
    fn test_miranda_index() {
        let registry = ClassRegistry::new().unwrap();
        ClassBuilder::interface("demo/Task")
            .method("run", "()V", AccessFlags::PUBLIC | AccessFlags::ABSTRACT)
            .define(&registry)
            .unwrap();
        let task = ClassBuilder::new("demo/AbstractTask")
            .with_flags(AccessFlags::PUBLIC | AccessFlags::ABSTRACT)
            .implements("demo/Task")
            .define(&registry)
            .unwrap();

        assert_eq!(vtable_index_of_miranda(&task, "run", "()V"), VtableIndex::Invalid);
        registry.link_class(&task).unwrap();
        assert!(vtable_index_of_miranda(&task, "run", "()V").is_slot());
        assert!(lookup_method_in_interfaces(&task, "run", "()V").is_some());
    }
}
