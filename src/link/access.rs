//! Accessibility checks.
//!
//! Pure predicates over the class hierarchy deciding whether a class may refer to another class
//! or to one of its members, plus the checked variants the resolver calls, which turn a denial
//! into [`Error::IllegalAccess`].
//!
//! | Target | Rule |
//! |--------|------|
//! | class | public, or in the same runtime package; arrays check their bottom element class |
//! | public member | always |
//! | protected member | from subclasses (for instance members only through a compatible reference), or the same package |
//! | package-private member | the same package |
//! | private member | the declaring class only |
//!
//! `clone` inherited by an array class from `java/lang/Object` is treated as public.

use crate::{
    metadata::{
        field::FieldRc,
        flags::AccessFlags,
        method::MethodRc,
        symbols,
        typesystem::{ClassType, ClassTypeRc},
    },
    Error, Result,
};

/// Returns `true` if `current` may refer to class `target`
#[must_use]
pub fn verify_class_access(current: &ClassType, target: &ClassTypeRc) -> bool {
    let Some(bottom) = target.bottom_class() else {
        // Primitive arrays are accessible from everywhere
        return true;
    };
    bottom.token == current.token || bottom.is_public() || bottom.is_same_package(current)
}

/// Returns `true` if `current` may access a member with `flags` declared by `holder`, referenced
/// through `resolved`
///
/// ## Arguments
/// * 'current'  - Class containing the reference
/// * 'resolved' - Class named by the reference
/// * 'holder'   - Class declaring the member
/// * 'flags'    - Access flags of the member
#[must_use]
pub fn verify_member_access(
    current: &ClassType,
    resolved: &ClassType,
    holder: &ClassType,
    flags: AccessFlags,
) -> bool {
    if current.token == holder.token || flags.is_public() {
        return true;
    }

    if flags.is_protected()
        && current.is_subclass_of(holder)
        && (flags.is_static()
            || current.token == resolved.token
            || holder.token == resolved.token
            || current.is_subclass_of(resolved)
            || resolved.is_subclass_of(current))
    {
        return true;
    }

    !flags.is_private() && current.is_same_package(holder)
}

/// Checks that `current` may refer to class `target`
///
/// # Errors
/// Returns [`Error::IllegalAccess`] if access is denied.
pub fn check_klass_accessibility(current: &ClassTypeRc, target: &ClassTypeRc) -> Result<()> {
    if verify_class_access(current, target) {
        Ok(())
    } else {
        Err(Error::IllegalAccess(format!(
            "tried to access class {} from class {}",
            target.external_name(),
            current.external_name()
        )))
    }
}

/// Checks that `current` may call `method`, declared by `holder` and referenced through
/// `resolved`
///
/// # Errors
/// Returns [`Error::IllegalAccess`] if access is denied.
pub fn check_method_accessibility(
    current: &ClassTypeRc,
    resolved: &ClassTypeRc,
    holder: &ClassTypeRc,
    method: &MethodRc,
) -> Result<()> {
    let mut flags = method.flags;
    if method.name == symbols::CLONE
        && holder.name == symbols::OBJECT
        && holder.super_class.is_none()
        && resolved.is_array()
    {
        flags = flags.as_public();
    }

    if verify_member_access(current, resolved, holder, flags) {
        Ok(())
    } else {
        Err(Error::IllegalAccess(format!(
            "tried to access method {}.{}{} from class {}",
            holder.external_name(),
            method.name,
            method.signature,
            current.external_name()
        )))
    }
}

/// Checks that `current` may access `field`, declared by `holder` and referenced through
/// `resolved`
///
/// # Errors
/// Returns [`Error::IllegalAccess`] if access is denied.
pub fn check_field_accessibility(
    current: &ClassTypeRc,
    resolved: &ClassTypeRc,
    holder: &ClassTypeRc,
    field: &FieldRc,
) -> Result<()> {
    if verify_member_access(current, resolved, holder, field.flags) {
        Ok(())
    } else {
        Err(Error::IllegalAccess(format!(
            "tried to access field {}.{} from class {}",
            holder.external_name(),
            field.name,
            current.external_name()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{
        loader::LoaderId,
        typesystem::{ClassBuilder, ClassRegistry},
    };

    fn class(registry: &ClassRegistry, name: &str) -> ClassTypeRc {
        registry.resolve_class(name, LoaderId::BOOTSTRAP).unwrap()
    }

    fn hierarchy() -> ClassRegistry {
        let registry = ClassRegistry::new().unwrap();
        ClassBuilder::new("lib/Base")
            .method("open", "()V", AccessFlags::PUBLIC)
            .method("hook", "()V", AccessFlags::PROTECTED)
            .method("shared", "()V", AccessFlags::PROTECTED | AccessFlags::STATIC)
            .method("local", "()V", AccessFlags::empty())
            .method("secret", "()V", AccessFlags::PRIVATE)
            .define(&registry)
            .unwrap();
        ClassBuilder::new("lib/Neighbor").define(&registry).unwrap();
        ClassBuilder::new("lib/Internal")
            .with_flags(AccessFlags::SUPER)
            .define(&registry)
            .unwrap();
        ClassBuilder::new("app/Derived")
            .extends("lib/Base")
            .define(&registry)
            .unwrap();
        ClassBuilder::new("app/Sibling")
            .extends("lib/Base")
            .define(&registry)
            .unwrap();
        registry
    }

    #[test]
    fn test_class_access() {
        let registry = hierarchy();
        let neighbor = class(&registry, "lib/Neighbor");
        let derived = class(&registry, "app/Derived");
        let internal = class(&registry, "lib/Internal");

        assert!(verify_class_access(&neighbor, &internal));
        assert!(!verify_class_access(&derived, &internal));
        assert!(verify_class_access(&derived, &class(&registry, "[I")));
        assert!(!verify_class_access(&derived, &class(&registry, "[[Llib/Internal;")));

        let error = check_klass_accessibility(&derived, &internal).unwrap_err();
        assert_eq!(
            error.to_string(),
            "IllegalAccessError: tried to access class lib.Internal from class app.Derived"
        );
    }

    #[test]
    fn test_member_access_by_visibility() {
        let registry = hierarchy();
        let base = class(&registry, "lib/Base");
        let neighbor = class(&registry, "lib/Neighbor");
        let derived = class(&registry, "app/Derived");
        let method = |name: &str| base.find_method(name, "()V").unwrap();

        for name in ["open", "hook", "local"] {
            assert!(check_method_accessibility(&neighbor, &base, &base, &method(name)).is_ok());
        }
        assert!(check_method_accessibility(&neighbor, &base, &base, &method("secret")).is_err());
        assert!(check_method_accessibility(&base, &base, &base, &method("secret")).is_ok());

        assert!(check_method_accessibility(&derived, &derived, &base, &method("hook")).is_ok());
        assert!(check_method_accessibility(&derived, &derived, &base, &method("local")).is_err());
        let error = check_method_accessibility(&derived, &base, &base, &method("secret"))
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "IllegalAccessError: tried to access method lib.Base.secret()V from class app.Derived"
        );
    }

    #[test]
    fn test_protected_requires_compatible_reference() {
        let registry = hierarchy();
        let base = class(&registry, "lib/Base");
        let derived = class(&registry, "app/Derived");
        let sibling = class(&registry, "app/Sibling");
        let hook = base.find_method("hook", "()V").unwrap();
        let shared = base.find_method("shared", "()V").unwrap();

        // Through the declaring class or a subclass of the caller
        assert!(verify_member_access(&derived, &base, &base, hook.flags));
        assert!(verify_member_access(&derived, &derived, &base, hook.flags));
        // Through an unrelated subclass
        assert!(!verify_member_access(&derived, &sibling, &base, hook.flags));
        // Static members are exempt
        assert!(verify_member_access(&derived, &sibling, &base, shared.flags));
    }

    #[test]
    fn test_protected_through_superclass_of_caller() {
        let registry = hierarchy();
        let leaf = ClassBuilder::new("app/Leaf")
            .extends("app/Derived")
            .define(&registry)
            .unwrap();
        let base = class(&registry, "lib/Base");
        let derived = class(&registry, "app/Derived");
        let hook = base.find_method("hook", "()V").unwrap();

        // `super.hook()` in app/Leaf names app/Derived, a superclass of the caller
        assert!(check_method_accessibility(&leaf, &derived, &base, &hook).is_ok());
        // The reverse direction still needs a compatible reference
        assert!(check_method_accessibility(&derived, &leaf, &base, &hook).is_ok());
        assert!(
            check_method_accessibility(&leaf, &class(&registry, "app/Sibling"), &base, &hook)
                .is_err()
        );
    }

    #[test]
    fn test_array_clone_is_public() {
        let registry = hierarchy();
        let object = registry.object_class().unwrap();
        let derived = class(&registry, "app/Derived");
        let neighbor = class(&registry, "lib/Neighbor");
        let clone = object.find_method("clone", "()Ljava/lang/Object;").unwrap();
        let array = class(&registry, "[Llib/Neighbor;");

        assert!(check_method_accessibility(&derived, &array, &object, &clone).is_ok());
        // Protected access through an unrelated class is still denied
        assert!(check_method_accessibility(&derived, &neighbor, &object, &clone).is_err());
    }

    #[test]
    fn test_field_access_message() {
        let registry = ClassRegistry::new().unwrap();
        let holder = ClassBuilder::new("lib/Box")
            .field("value", "I", AccessFlags::PRIVATE)
            .define(&registry)
            .unwrap();
        let caller = ClassBuilder::new("app/User").define(&registry).unwrap();
        let field = holder.find_local_field("value", "I").unwrap();

        let error = check_field_accessibility(&caller, &holder, &holder, &field).unwrap_err();
        assert_eq!(
            error.to_string(),
            "IllegalAccessError: tried to access field lib.Box.value from class app.User"
        );
    }
}
