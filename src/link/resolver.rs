//! The link resolver.
//!
//! Turns symbolic method references into [`CallInfo`]s. Every invoke kind resolves in up to two
//! phases:
//!
//! - **link time**: structural checks that depend only on the reference (class or interface,
//!   static-ness, access, loader constraints). The result can be cached per call site.
//! - **run time**: selection of the implementation for a concrete receiver class, through the
//!   vtable or a lookup from the receiver.
//!
//! Handle and dynamic calls bypass the ordinary lookup and link through the signature-polymorphic
//! protocol in [`crate::link::polymorphic`].
//!
//! The `_or_null` entry points run the same algorithms for callers that only want to know whether
//! resolution would succeed (compilers, mostly): failures are logged at `trace` level and
//! reported as `None`.
//!
//! # Examples
//!
//! ```rust
//! use vmlink::prelude::*;
//!
//! let runtime = Runtime::new()?;
//! let registry = runtime.registry();
//! let object = registry.object_class()?;
//! let caller = ClassBuilder::new("app/Main").define(registry)?;
//!
//! let resolver = runtime.resolver();
//! let link = LinkInfo::new(&object, "hashCode", "()I", &caller);
//! let receiver = Oop::new(caller.clone(), "main");
//! let call = resolver.resolve_virtual_call(Some(&receiver), &caller, &link, true)?;
//! assert_eq!(call.selected_method().holder_name(), "java/lang/Object");
//! assert!(call.vtable_index().is_slot());
//! # Ok::<(), vmlink::Error>(())
//! ```

use tracing::{debug, trace};

use crate::{
    link::{
        access::check_method_accessibility,
        callinfo::CallInfo,
        lookup::{
            lookup_instance_method_in_classes, lookup_method_in_classes,
            lookup_method_in_interfaces, vtable_index_of_miranda,
        },
        polymorphic::lookup_polymorphic_method,
    },
    metadata::{
        constantpool::ConstantPool,
        method::{MethodRc, VtableIndex},
        typesystem::ClassTypeRc,
    },
    runtime::{
        config::ThreadRole,
        methodhandles::{BootstrapSpecifier, LinkedTarget},
        oop::OopRc,
        Runtime,
    },
    Error, Result,
};

/// A symbolic method reference together with the class it is resolved from.
///
/// Access checks and loader constraints only apply when the reference carries a current class
/// and access checking is enabled.
#[derive(Debug, Clone, Copy)]
pub struct LinkInfo<'a> {
    /// Class named by the reference
    pub resolved_class: &'a ClassTypeRc,
    /// Member name
    pub name: &'a str,
    /// Member descriptor
    pub signature: &'a str,
    /// Class containing the reference
    pub current_class: Option<&'a ClassTypeRc>,
    /// Whether access and loader constraints are checked
    pub check_access: bool,
}

impl<'a> LinkInfo<'a> {
    /// A reference made from `current_class`, with access checking
    #[must_use]
    pub fn new(
        resolved_class: &'a ClassTypeRc,
        name: &'a str,
        signature: &'a str,
        current_class: &'a ClassTypeRc,
    ) -> Self {
        LinkInfo {
            resolved_class,
            name,
            signature,
            current_class: Some(current_class),
            check_access: true,
        }
    }

    /// A reference without a referring class; nothing is access checked
    #[must_use]
    pub fn unchecked(resolved_class: &'a ClassTypeRc, name: &'a str, signature: &'a str) -> Self {
        LinkInfo {
            resolved_class,
            name,
            signature,
            current_class: None,
            check_access: false,
        }
    }

    /// Enable or disable access checking
    #[must_use]
    pub fn with_access_check(mut self, check_access: bool) -> Self {
        self.check_access = check_access;
        self
    }

    /// The same member referenced through `resolved_class`
    #[must_use]
    pub fn through(mut self, resolved_class: &'a ClassTypeRc) -> Self {
        self.resolved_class = resolved_class;
        self
    }

    /// The referring class, if access checking applies
    #[must_use]
    pub fn access_context(&self) -> Option<&'a ClassTypeRc> {
        if self.check_access {
            self.current_class
        } else {
            None
        }
    }

    /// `pkg.Class.name(signature)` of the reference
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!(
            "{}.{}{}",
            self.resolved_class.external_name(),
            self.name,
            self.signature
        )
    }

    fn qualified_name_in(&self, class: &ClassTypeRc) -> String {
        format!("{}.{}{}", class.external_name(), self.name, self.signature)
    }
}

pub(crate) fn holder_of(method: &MethodRc) -> Result<ClassTypeRc> {
    method
        .holder()
        .ok_or_else(|| malformed_error!("Method {}{} has no holder", method.name, method.signature))
}

/// Resolves method references on behalf of one kind of thread.
///
/// Created through [`Runtime::resolver`] or [`Runtime::compiler_resolver`]. A resolver holds no
/// state of its own; everything it caches lives in the registry or the constant pool.
#[derive(Clone, Copy)]
pub struct LinkResolver<'a> {
    runtime: &'a Runtime,
    role: ThreadRole,
}

impl<'a> LinkResolver<'a> {
    pub(crate) fn new(runtime: &'a Runtime, role: ThreadRole) -> Self {
        LinkResolver { runtime, role }
    }

    /// The runtime this resolver works on
    #[must_use]
    pub fn runtime(&self) -> &'a Runtime {
        self.runtime
    }

    /// The kind of thread this resolver runs on
    #[must_use]
    pub fn role(&self) -> ThreadRole {
        self.role
    }

    /// Resolves a method reference to a class.
    ///
    /// Searches the class and its superclasses, then (for non-array classes) every implemented
    /// interface, and finally tries to link a signature-polymorphic call. A failure of that last
    /// step does not fail the resolution by itself; it becomes the cause of the
    /// [`Error::NoSuchMethod`] reported when nothing was found.
    ///
    /// # Errors
    /// - [`Error::IncompatibleClassChange`] if the reference names an interface
    /// - [`Error::NoSuchMethod`] if no method matches
    /// - [`Error::AbstractMethod`] if the match is abstract but the class is concrete
    /// - [`Error::IllegalAccess`] or [`Error::LoaderConstraint`] when access checking applies
    pub fn resolve_method(&self, link: &LinkInfo<'_>) -> Result<MethodRc> {
        let class = link.resolved_class;
        if class.is_interface() {
            return Err(Error::IncompatibleClassChange(format!(
                "Found interface {}, but class was expected",
                class.external_name()
            )));
        }

        let enable_invoke_dynamic = self.runtime.config().enable_invoke_dynamic;
        let mut found = lookup_method_in_classes(class, link.name, link.signature, enable_invoke_dynamic);
        let mut cause = None;
        if found.is_none() && !class.is_array() {
            found = lookup_method_in_interfaces(class, link.name, link.signature);
            if found.is_none() {
                match lookup_polymorphic_method(
                    self.runtime,
                    self.role,
                    class,
                    link.name,
                    link.signature,
                    link.current_class,
                    false,
                ) {
                    Ok(target) => found = target.map(|target| target.method),
                    Err(error) => {
                        trace!(error = %error, "polymorphic fallback failed");
                        cause = Some(Box::new(error));
                    }
                }
            }
        }

        let Some(method) = found else {
            return Err(Error::NoSuchMethod {
                message: link.qualified_name(),
                cause,
            });
        };

        if method.is_abstract() && !class.is_abstract() {
            return Err(Error::AbstractMethod(link.qualified_name()));
        }

        if let Some(current) = link.access_context() {
            let holder = holder_of(&method)?;
            check_method_accessibility(current, class, &holder, &method)?;
            self.check_method_loader_constraints(link, &method, "method")?;
        }

        Ok(method)
    }

    /// Resolves a method reference to an interface.
    ///
    /// The interface and the methods of `java/lang/Object` it inherits are searched first, then
    /// the superinterfaces. Interface methods are public, so only loader constraints are checked.
    ///
    /// # Errors
    /// - [`Error::IncompatibleClassChange`] if the reference names a class
    /// - [`Error::NoSuchMethod`] if no method matches
    /// - [`Error::LoaderConstraint`] when access checking applies
    pub fn resolve_interface_method(&self, link: &LinkInfo<'_>) -> Result<MethodRc> {
        let class = link.resolved_class;
        if !class.is_interface() {
            return Err(Error::IncompatibleClassChange(format!(
                "Found class {}, but interface was expected",
                class.external_name()
            )));
        }

        let method = lookup_instance_method_in_classes(class, link.name, link.signature)
            .or_else(|| lookup_method_in_interfaces(class, link.name, link.signature))
            .ok_or_else(|| Error::no_such_method(link.qualified_name()))?;

        if link.access_context().is_some() {
            self.check_method_loader_constraints(link, &method, "interface method")?;
        }
        Ok(method)
    }

    /// Checks that the referring class and the declaring class of `method` agree on every class
    /// named by the method's signature.
    ///
    /// `method_type` names the kind of reference in the error message.
    ///
    /// # Errors
    /// Returns [`Error::LoaderConstraint`] on disagreement.
    pub fn check_method_loader_constraints(
        &self,
        link: &LinkInfo<'_>,
        method: &MethodRc,
        method_type: &str,
    ) -> Result<()> {
        let Some(current) = link.current_class else {
            return Ok(());
        };
        let holder = holder_of(method)?;
        let registry = self.runtime.registry();
        let Some(failed) =
            registry.check_signature_loaders(&method.signature, current.loader, holder.loader)?
        else {
            return Ok(());
        };

        let loaders = registry.loaders();
        Err(Error::LoaderConstraint(format!(
            "loader constraint violation: when resolving {} \"{}\" the class loader (instance of {}) \
             of the current class, {}, and the class loader (instance of {}) for the method's \
             defining class, {}, have different Class objects for the type {} used in the signature",
            method_type,
            link.qualified_name(),
            loaders.name_of(current.loader),
            current.name,
            loaders.name_of(holder.loader),
            link.resolved_class.name,
            failed
        )))
    }

    /// Link-time phase of `invokestatic`
    ///
    /// # Errors
    /// Errors of [`Self::resolve_method`], or [`Error::IncompatibleClassChange`] for an instance
    /// method.
    pub fn linktime_resolve_static_method(&self, link: &LinkInfo<'_>) -> Result<MethodRc> {
        let method = self.resolve_method(link)?;
        if !method.is_static() {
            return Err(Error::IncompatibleClassChange(format!(
                "Expected static method {}",
                link.qualified_name()
            )));
        }
        Ok(method)
    }

    /// Resolves `invokestatic`.
    ///
    /// With `initialize_class` the declaring class is initialized if necessary and the method
    /// is resolved again from it afterwards.
    ///
    /// # Errors
    /// Errors of the link-time phase, and initialization errors of the declaring class.
    pub fn resolve_static_call(
        &self,
        link: &LinkInfo<'_>,
        initialize_class: bool,
    ) -> Result<CallInfo> {
        let mut method = self.linktime_resolve_static_method(link)?;
        let mut holder = holder_of(&method)?;

        if initialize_class && !holder.is_initialized() {
            self.runtime.initialize(&holder)?;
            let declared = holder.clone();
            method = self.linktime_resolve_static_method(&link.through(&declared))?;
            holder = holder_of(&method)?;
        }

        trace!(method = %method.qualified_name(), "resolved static call");
        Ok(CallInfo::new_static(holder, method))
    }

    /// Link-time phase of `invokespecial`
    ///
    /// # Errors
    /// Errors of [`Self::resolve_method`]; [`Error::NoSuchMethod`] for a constructor that is
    /// inherited rather than declared by the referenced class;
    /// [`Error::IncompatibleClassChange`] for a static method.
    pub fn linktime_resolve_special_method(&self, link: &LinkInfo<'_>) -> Result<MethodRc> {
        let method = self.resolve_method(link)?;

        if method.is_object_initializer() && holder_of(&method)?.token != link.resolved_class.token
        {
            return Err(Error::no_such_method(format!(
                "{}: method {}{} not found",
                link.resolved_class.external_name(),
                link.name,
                link.signature
            )));
        }

        if method.is_static() {
            return Err(Error::IncompatibleClassChange(format!(
                "Expecting non-static method {}",
                link.qualified_name()
            )));
        }
        Ok(method)
    }

    /// Run-time phase of `invokespecial`.
    ///
    /// A super call from a class compiled with the `ACC_SUPER` semantics (or from any class while
    /// non-virtual calls are disallowed) selects the implementation visible from the caller's
    /// superclass instead of the resolved method.
    ///
    /// # Errors
    /// - [`Error::AbstractMethod`] if the super lookup finds nothing, or selects an abstract method
    /// - [`Error::LoaderConstraint`] if a re-selected method violates loader constraints
    /// - [`Error::IncompatibleClassChange`] if the selected method is static
    pub fn runtime_resolve_special_method(
        &self,
        resolved_method: &MethodRc,
        link: &LinkInfo<'_>,
    ) -> Result<CallInfo> {
        let mut selected = resolved_method.clone();

        if let Some(current) = link.access_context() {
            let holder = holder_of(resolved_method)?;
            let legacy_super =
                current.is_super() || !self.runtime.config().allow_nonvirtual_calls;
            if legacy_super
                && current.token != holder.token
                && current.is_subclass_of(&holder)
                && !resolved_method.is_object_initializer()
            {
                selected = current
                    .super_class
                    .as_ref()
                    .and_then(|super_class| {
                        lookup_instance_method_in_classes(super_class, link.name, link.signature)
                    })
                    .ok_or_else(|| Error::AbstractMethod(link.qualified_name()))?;

                if selected.token != resolved_method.token {
                    trace!(
                        resolved = %resolved_method.qualified_name(),
                        selected = %selected.qualified_name(),
                        "super call re-selected"
                    );
                    self.check_method_loader_constraints(link, &selected, "method")?;
                }
            }
        }

        if selected.is_static() {
            return Err(Error::IncompatibleClassChange(format!(
                "Expecting non-static method {}",
                link.qualified_name()
            )));
        }
        if selected.is_abstract() {
            return Err(Error::AbstractMethod(link.qualified_name()));
        }

        Ok(CallInfo::new_static(link.resolved_class.clone(), selected))
    }

    /// Resolves `invokespecial`
    ///
    /// # Errors
    /// Errors of both phases.
    pub fn resolve_special_call(&self, link: &LinkInfo<'_>) -> Result<CallInfo> {
        let method = self.linktime_resolve_special_method(link)?;
        self.runtime_resolve_special_method(&method, link)
    }

    /// Link-time phase of `invokevirtual`
    ///
    /// # Errors
    /// Errors of [`Self::resolve_method`], or [`Error::IncompatibleClassChange`] for a static
    /// method.
    pub fn linktime_resolve_virtual_method(&self, link: &LinkInfo<'_>) -> Result<MethodRc> {
        let method = self.resolve_method(link)?;
        if method.is_static() {
            return Err(Error::IncompatibleClassChange(format!(
                "Expecting non-static method {}",
                link.qualified_name()
            )));
        }
        Ok(method)
    }

    /// Run-time phase of `invokevirtual`: selects the implementation through the receiver's
    /// vtable.
    ///
    /// Methods inherited from an interface by an abstract class are dispatched through their
    /// miranda slot. Methods that can never be overridden bind directly.
    ///
    /// ## Arguments
    /// * 'resolved_method'         - Result of the link-time phase
    /// * 'receiver'                - The receiver object, if there is one
    /// * 'receiver_class'          - Class of the receiver
    /// * 'link'                    - The reference
    /// * 'check_null_and_abstract' - Raise on a null receiver or an abstract selection
    ///
    /// # Errors
    /// - [`Error::NullPointer`] for a missing receiver when checking
    /// - [`Error::IncompatibleClassChange`] if the receiver class is not a subtype of the
    ///   referenced class
    /// - [`Error::AbstractMethod`] if no implementation is found, or an abstract one when checking
    /// - Linking errors of the referenced or receiver class
    pub fn runtime_resolve_virtual_method(
        &self,
        resolved_method: &MethodRc,
        receiver: Option<&OopRc>,
        receiver_class: &ClassTypeRc,
        link: &LinkInfo<'_>,
        check_null_and_abstract: bool,
    ) -> Result<CallInfo> {
        if check_null_and_abstract && receiver.is_none() {
            return Err(Error::NullPointer);
        }

        let registry = self.runtime.registry();
        registry.link_class(link.resolved_class)?;
        registry.link_class(receiver_class)?;
        if !receiver_class.is_subtype_of(link.resolved_class) {
            return Err(Error::IncompatibleClassChange(format!(
                "Class {} is not a subclass of {}",
                receiver_class.external_name(),
                link.resolved_class.external_name()
            )));
        }

        let holder = holder_of(resolved_method)?;
        let (vtable_index, selected) = if holder.is_interface() {
            let index = vtable_index_of_miranda(link.resolved_class, link.name, link.signature);
            let selected = index
                .slot()
                .and_then(|slot| receiver_class.method_at_vtable(slot));
            (index, selected)
        } else {
            let index = resolved_method.vtable_index();
            assert!(
                index != VtableIndex::NonVirtual || resolved_method.can_be_statically_bound(),
                "overridable method {} bound without a vtable slot",
                resolved_method.qualified_name()
            );
            let selected = match index {
                VtableIndex::NonVirtual => Some(resolved_method.clone()),
                VtableIndex::Slot(slot) => receiver_class.method_at_vtable(slot),
                VtableIndex::Invalid => None,
            };
            (index, selected)
        };

        let Some(selected) = selected else {
            return Err(Error::AbstractMethod(link.qualified_name()));
        };
        if check_null_and_abstract && selected.is_abstract() {
            return Err(Error::AbstractMethod(link.qualified_name()));
        }

        trace!(
            receiver = %receiver_class.name,
            selected = %selected.qualified_name(),
            index = %vtable_index,
            "selected virtual target"
        );
        Ok(CallInfo::new_virtual(
            link.resolved_class.clone(),
            receiver_class.clone(),
            resolved_method.clone(),
            selected,
            vtable_index,
        ))
    }

    /// Resolves `invokevirtual` for a receiver of class `receiver_class`
    ///
    /// # Errors
    /// Errors of both phases.
    pub fn resolve_virtual_call(
        &self,
        receiver: Option<&OopRc>,
        receiver_class: &ClassTypeRc,
        link: &LinkInfo<'_>,
        check_null_and_abstract: bool,
    ) -> Result<CallInfo> {
        let method = self.linktime_resolve_virtual_method(link)?;
        self.runtime_resolve_virtual_method(
            &method,
            receiver,
            receiver_class,
            link,
            check_null_and_abstract,
        )
    }

    /// Link-time phase of `invokeinterface`
    ///
    /// # Errors
    /// Errors of [`Self::resolve_interface_method`].
    pub fn linktime_resolve_interface_method(&self, link: &LinkInfo<'_>) -> Result<MethodRc> {
        self.resolve_interface_method(link)
    }

    /// Run-time phase of `invokeinterface`: looks the method up from the receiver class.
    ///
    /// # Errors
    /// - [`Error::NullPointer`] for a missing receiver when checking
    /// - [`Error::IncompatibleClassChange`] if the receiver does not implement the interface
    /// - [`Error::AbstractMethod`] if no implementation is found, or an abstract one when checking
    /// - [`Error::IllegalAccess`] if the implementation is not public
    pub fn runtime_resolve_interface_method(
        &self,
        resolved_method: &MethodRc,
        receiver: Option<&OopRc>,
        receiver_class: &ClassTypeRc,
        link: &LinkInfo<'_>,
        check_null_and_abstract: bool,
    ) -> Result<CallInfo> {
        if check_null_and_abstract && receiver.is_none() {
            return Err(Error::NullPointer);
        }

        if !receiver_class.is_subtype_of(link.resolved_class) {
            return Err(Error::IncompatibleClassChange(format!(
                "Class {} does not implement the requested interface {}",
                receiver_class.external_name(),
                link.resolved_class.external_name()
            )));
        }
        self.runtime.registry().link_class(receiver_class)?;

        let selected = lookup_instance_method_in_classes(receiver_class, link.name, link.signature)
            .ok_or_else(|| Error::AbstractMethod(link.qualified_name_in(receiver_class)))?;
        if !selected.is_public() {
            return Err(Error::IllegalAccess(link.qualified_name_in(receiver_class)));
        }
        if check_null_and_abstract && selected.is_abstract() {
            return Err(Error::AbstractMethod(link.qualified_name_in(receiver_class)));
        }

        trace!(
            receiver = %receiver_class.name,
            selected = %selected.qualified_name(),
            "selected interface target"
        );
        Ok(CallInfo::new_interface(
            link.resolved_class.clone(),
            receiver_class.clone(),
            resolved_method.clone(),
            selected,
        ))
    }

    /// Resolves `invokeinterface` for a receiver of class `receiver_class`
    ///
    /// # Errors
    /// Errors of both phases.
    pub fn resolve_interface_call(
        &self,
        receiver: Option<&OopRc>,
        receiver_class: &ClassTypeRc,
        link: &LinkInfo<'_>,
        check_null_and_abstract: bool,
    ) -> Result<CallInfo> {
        let method = self.linktime_resolve_interface_method(link)?;
        self.runtime_resolve_interface_method(
            &method,
            receiver,
            receiver_class,
            link,
            check_null_and_abstract,
        )
    }

    /// Resolves a call to a signature-polymorphic method of `java/lang/invoke/MethodHandle`.
    ///
    /// Intrinsics link to a synthesized method; generic invokers link to an adapter produced by
    /// the language runtime, with an appendix and a method type.
    ///
    /// # Errors
    /// - [`Error::NoSuchMethod`] if the method is not signature polymorphic, or the generic
    ///   invoker cannot be linked on this thread
    /// - [`Error::IllegalAccess`] if the caller may not call the intrinsic
    /// - Errors of the language runtime
    pub fn resolve_handle_call(&self, link: &LinkInfo<'_>) -> Result<CallInfo> {
        let target = lookup_polymorphic_method(
            self.runtime,
            self.role,
            link.resolved_class,
            link.name,
            link.signature,
            link.current_class,
            true,
        )?
        .ok_or_else(|| Error::no_such_method(link.qualified_name()))?;

        if target.method.intrinsic.is_signature_polymorphic_intrinsic() {
            if let Some(current) = link.access_context() {
                let holder = holder_of(&target.method)?;
                check_method_accessibility(current, link.resolved_class, &holder, &target.method)?;
            }
        }

        debug!(
            method = %target.method.qualified_name(),
            appendix = target.appendix.is_some(),
            "resolved handle call"
        );
        Ok(CallInfo::new_handle(link.resolved_class.clone(), &target))
    }

    /// Links the dynamic call site at `index` of `pool`.
    ///
    /// A bound call site is returned as it is. Otherwise the bootstrap method runs and its
    /// result is installed in the pool; when several threads bind the same site concurrently,
    /// all of them return the binding that was installed first.
    ///
    /// # Errors
    /// - [`Error::BootstrapMethod`], wrapping any other failure of the bootstrap method as cause
    /// - [`Error::Internal`] if the bootstrap method would run on a thread that cannot call Java
    /// - [`Error::Malformed`] for a bad call-site or bootstrap entry
    pub fn resolve_dynamic_call(&self, pool: &ConstantPool, index: usize) -> Result<CallInfo> {
        let site = pool.invoke_dynamic_at(index)?;
        let method_handle = self.runtime.registry().method_handle_class()?;
        if let Some(bound) = pool.call_site(index) {
            trace!(holder = %pool.holder().name, index, "call site already bound");
            return Ok(CallInfo::new_handle(method_handle, &bound));
        }

        let bootstrap = pool.bootstrap_at(site.bootstrap_index)?;
        let target = self.bootstrap_call_site(bootstrap, site.name, site.signature, pool.holder())?;
        let installed = pool.install_call_site(index, target)?;
        Ok(CallInfo::new_handle(method_handle, &installed))
    }

    fn bootstrap_call_site(
        &self,
        bootstrap: &BootstrapSpecifier,
        name: &str,
        signature: &str,
        current: &ClassTypeRc,
    ) -> Result<LinkedTarget> {
        if !self.role.can_call_java() {
            return Err(Error::Internal(format!(
                "cannot run bootstrap method for {name}{signature} on a {} thread",
                self.role
            )));
        }

        let target = self
            .runtime
            .method_handles()
            .link_call_site(self.runtime.registry(), current, bootstrap, name, signature)
            .map_err(|error| match error {
                Error::BootstrapMethod { .. } => error,
                other => Error::BootstrapMethod {
                    message: format!(
                        "call site initialization exception for {name}{signature} in {}",
                        current.external_name()
                    ),
                    cause: Box::new(other),
                },
            })?;

        debug!(
            caller = %current.name,
            name,
            signature,
            method = %target.method.qualified_name(),
            "linked dynamic call site"
        );
        Ok(target)
    }

    fn suppress<T>(&self, operation: &'static str, link: &LinkInfo<'_>, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                trace!(
                    operation,
                    reference = %link.qualified_name(),
                    error = %error,
                    "resolution failed, no result"
                );
                None
            }
        }
    }

    /// [`Self::linktime_resolve_virtual_method`], or `None` on failure
    #[must_use]
    pub fn linktime_resolve_virtual_method_or_null(&self, link: &LinkInfo<'_>) -> Option<MethodRc> {
        self.suppress(
            "linktime_resolve_virtual_method",
            link,
            self.linktime_resolve_virtual_method(link),
        )
    }

    /// [`Self::linktime_resolve_interface_method`], or `None` on failure
    #[must_use]
    pub fn linktime_resolve_interface_method_or_null(
        &self,
        link: &LinkInfo<'_>,
    ) -> Option<MethodRc> {
        self.suppress(
            "linktime_resolve_interface_method",
            link,
            self.linktime_resolve_interface_method(link),
        )
    }

    /// The method a virtual call would select for `receiver_class`, or `None` on failure.
    ///
    /// Abstract selections are returned as they are.
    #[must_use]
    pub fn resolve_virtual_call_or_null(
        &self,
        receiver_class: &ClassTypeRc,
        link: &LinkInfo<'_>,
    ) -> Option<MethodRc> {
        self.suppress(
            "resolve_virtual_call",
            link,
            self.resolve_virtual_call(None, receiver_class, link, false),
        )
        .map(|call| call.selected_method().clone())
    }

    /// The method an interface call would select for `receiver_class`, or `None` on failure.
    #[must_use]
    pub fn resolve_interface_call_or_null(
        &self,
        receiver_class: &ClassTypeRc,
        link: &LinkInfo<'_>,
    ) -> Option<MethodRc> {
        self.suppress(
            "resolve_interface_call",
            link,
            self.resolve_interface_call(None, receiver_class, link, false),
        )
        .map(|call| call.selected_method().clone())
    }

    /// The dispatch index of a virtual call, or [`VtableIndex::Invalid`] on failure
    #[must_use]
    pub fn resolve_virtual_vtable_index(
        &self,
        receiver_class: &ClassTypeRc,
        link: &LinkInfo<'_>,
    ) -> VtableIndex {
        self.suppress(
            "resolve_virtual_vtable_index",
            link,
            self.resolve_virtual_call(None, receiver_class, link, false),
        )
        .map_or(VtableIndex::Invalid, |call| call.vtable_index())
    }

    /// The target of a static call, or `None` on failure. Never initializes a class.
    #[must_use]
    pub fn resolve_static_call_or_null(&self, link: &LinkInfo<'_>) -> Option<MethodRc> {
        self.suppress(
            "resolve_static_call",
            link,
            self.resolve_static_call(link, false),
        )
        .map(|call| call.selected_method().clone())
    }

    /// The target of a special call, or `None` on failure
    #[must_use]
    pub fn resolve_special_call_or_null(&self, link: &LinkInfo<'_>) -> Option<MethodRc> {
        self.suppress("resolve_special_call", link, self.resolve_special_call(link))
            .map(|call| call.selected_method().clone())
    }
}
