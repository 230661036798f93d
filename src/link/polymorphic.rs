//! Linking of signature-polymorphic methods.
//!
//! `java/lang/invoke/MethodHandle` declares a handful of native methods whose descriptor is
//! decided per call site. A call to one of them is never linked to the declaration:
//!
//! - the *intrinsics* (`invokeBasic`, `linkTo*`) resolve to a method the registry synthesizes
//!   for the erased call-site signature; the static linkers keep the exact type of their
//!   trailing `MemberName` argument
//! - the *generic invokers* (`invoke`, `invokeExact`) are linked by the language runtime, which
//!   returns an adapter together with an appendix and a method type. Threads that must not
//!   re-enter the language runtime, and lookups that cannot carry an appendix, get no result.

use tracing::{debug, trace};

use crate::{
    metadata::{
        flags::AccessFlags,
        method::IntrinsicId,
        signatures, symbols,
        typesystem::ClassTypeRc,
    },
    runtime::{config::ThreadRole, methodhandles::LinkedTarget, Runtime},
    Result,
};

/// Intrinsic identity of `name` on `class`.
///
/// Besides the well-known names, any other native varargs method declared by the class counts
/// as a generic invoker.
#[must_use]
pub fn signature_polymorphic_name_id(class: &ClassTypeRc, name: &str) -> IntrinsicId {
    let known = IntrinsicId::for_name(name);
    if known != IntrinsicId::None {
        return known;
    }
    let generic = AccessFlags::NATIVE | AccessFlags::VARARGS;
    if class
        .methods
        .iter()
        .any(|method| method.name == name && method.flags.contains(generic))
    {
        IntrinsicId::InvokeGeneric
    } else {
        IntrinsicId::None
    }
}

/// Links a call to a signature-polymorphic method of `class`.
///
/// Returns `Ok(None)` when the name is not signature polymorphic, when method handles are
/// disabled, or when the generic invoker path is not allowed for this lookup.
///
/// ## Arguments
/// * 'runtime'        - Registry, configuration and method handle factory
/// * 'role'           - Kind of the resolving thread
/// * 'class'          - Class named by the reference
/// * 'name'           - Method name
/// * 'full_signature' - Descriptor at the call site
/// * 'current'        - Class containing the call site
/// * 'want_appendix'  - The caller can bind an appendix (generic invokers need one)
///
/// # Errors
/// - [`crate::Error::Internal`] if no intrinsic template exists for the erased signature
/// - [`crate::Error::Malformed`] for an invalid descriptor
/// - Any error of the language runtime while spinning a generic adapter
pub fn lookup_polymorphic_method(
    runtime: &Runtime,
    role: ThreadRole,
    class: &ClassTypeRc,
    name: &str,
    full_signature: &str,
    current: Option<&ClassTypeRc>,
    want_appendix: bool,
) -> Result<Option<LinkedTarget>> {
    let iid = signature_polymorphic_name_id(class, name);
    trace!(
        iid = %iid,
        class = %class.name,
        name,
        signature = full_signature,
        "lookup_polymorphic_method"
    );

    let is_method_handle = class.name == symbols::METHOD_HANDLE && class.loader.is_bootstrap();
    if !runtime.config().enable_invoke_dynamic || !is_method_handle || iid == IntrinsicId::None {
        return Ok(None);
    }

    if iid.is_signature_polymorphic_intrinsic() {
        let keep_last_arg = iid.is_signature_polymorphic_static();
        let basic_signature = signatures::basic_type_signature(full_signature, keep_last_arg)?;
        trace!(name, signature = full_signature, basic = %basic_signature, "erased polymorphic signature");

        let method = runtime
            .registry()
            .find_method_handle_intrinsic(iid, &basic_signature)?;
        debug_assert!(method.is_method_handle_intrinsic());
        debug_assert_eq!(method.signature, basic_signature);
        debug!(intrinsic = %iid, method = %method.qualified_name(), "linked polymorphic call to intrinsic");
        return Ok(Some(LinkedTarget::method(method)));
    }

    if iid == IntrinsicId::InvokeGeneric && role.can_call_java() && want_appendix {
        let target = runtime.method_handles().link_method(
            runtime.registry(),
            class,
            name,
            full_signature,
            current,
        )?;
        debug!(
            method = %target.method.qualified_name(),
            appendix = target.appendix.is_some(),
            "linked polymorphic call through the language runtime"
        );
        return Ok(Some(target));
    }

    trace!(iid = %iid, role = %role, "polymorphic lookup skipped");
    Ok(None)
}
