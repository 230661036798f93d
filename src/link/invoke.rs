//! Constant-pool entry points for the invoke bytecodes.
//!
//! These decode the symbolic reference at a pool index, resolve its class through the pool
//! (which records loader dependencies and checks class access) and hand over to the resolver
//! operation for the invoke kind. `invokedynamic` additionally binds the call site in the pool,
//! so the bootstrap method of a site runs to completion at most once per successful binding.

use tracing::{debug, trace};

use crate::{
    link::{
        access::check_klass_accessibility,
        callinfo::{CallInfo, InvokeKind},
        resolver::{LinkInfo, LinkResolver},
    },
    metadata::{
        constantpool::{ConstantPool, MemberRef, MemberRefKind},
        method::MethodRc,
        typesystem::ClassTypeRc,
    },
    runtime::{init::InitState, oop::OopRc},
    Error, Result,
};

impl LinkResolver<'_> {
    /// Resolves the invoke of `kind` at `index` of `pool`.
    ///
    /// `receiver` is only consulted for `invokevirtual` and `invokeinterface`; a missing receiver
    /// raises [`Error::NullPointer`] after the link-time checks passed.
    ///
    /// # Errors
    /// Any error of the resolver operation for `kind`, and [`Error::Malformed`] for a pool
    /// entry of the wrong category.
    pub fn resolve_invoke(
        &self,
        pool: &ConstantPool,
        index: usize,
        kind: InvokeKind,
        receiver: Option<&OopRc>,
    ) -> Result<CallInfo> {
        trace!(holder = %pool.holder().name, index, kind = %kind, "resolve_invoke");
        match kind {
            InvokeKind::Static => self.resolve_invokestatic(pool, index),
            InvokeKind::Special => self.resolve_invokespecial(pool, index),
            InvokeKind::Virtual => self.resolve_invokevirtual(pool, index, receiver),
            InvokeKind::Interface => self.resolve_invokeinterface(pool, index, receiver),
            InvokeKind::Handle => self.resolve_invokehandle(pool, index),
            InvokeKind::Dynamic => self.resolve_invokedynamic(pool, index),
        }
    }

    fn resolve_pool<'p>(
        &self,
        pool: &'p ConstantPool,
        index: usize,
    ) -> Result<(ClassTypeRc, MemberRef<'p>)> {
        let member = pool.member_ref_at(index)?;
        if member.kind == MemberRefKind::Field {
            return Err(malformed_error!(
                "Constant pool entry {} is a field reference, expected a method",
                index
            ));
        }
        let class = pool.resolve_class_at(self.runtime().registry(), member.class_index)?;
        Ok((class, member))
    }

    /// `invokestatic`; initializes the declaring class
    ///
    /// # Errors
    /// See [`LinkResolver::resolve_static_call`].
    pub fn resolve_invokestatic(&self, pool: &ConstantPool, index: usize) -> Result<CallInfo> {
        let (class, member) = self.resolve_pool(pool, index)?;
        let link = LinkInfo::new(&class, member.name, member.signature, pool.holder());
        self.resolve_static_call(&link, true)
    }

    /// `invokespecial`
    ///
    /// # Errors
    /// See [`LinkResolver::resolve_special_call`].
    pub fn resolve_invokespecial(&self, pool: &ConstantPool, index: usize) -> Result<CallInfo> {
        let (class, member) = self.resolve_pool(pool, index)?;
        let link = LinkInfo::new(&class, member.name, member.signature, pool.holder());
        self.resolve_special_call(&link)
    }

    /// `invokevirtual` on `receiver`
    ///
    /// # Errors
    /// See [`LinkResolver::resolve_virtual_call`].
    pub fn resolve_invokevirtual(
        &self,
        pool: &ConstantPool,
        index: usize,
        receiver: Option<&OopRc>,
    ) -> Result<CallInfo> {
        let (class, member) = self.resolve_pool(pool, index)?;
        let link = LinkInfo::new(&class, member.name, member.signature, pool.holder());
        let method = self.linktime_resolve_virtual_method(&link)?;
        let receiver = receiver.ok_or(Error::NullPointer)?;
        self.runtime_resolve_virtual_method(&method, Some(receiver), receiver.class(), &link, true)
    }

    /// `invokeinterface` on `receiver`
    ///
    /// # Errors
    /// See [`LinkResolver::resolve_interface_call`].
    pub fn resolve_invokeinterface(
        &self,
        pool: &ConstantPool,
        index: usize,
        receiver: Option<&OopRc>,
    ) -> Result<CallInfo> {
        let (class, member) = self.resolve_pool(pool, index)?;
        let link = LinkInfo::new(&class, member.name, member.signature, pool.holder());
        let method = self.linktime_resolve_interface_method(&link)?;
        let receiver = receiver.ok_or(Error::NullPointer)?;
        self.runtime_resolve_interface_method(&method, Some(receiver), receiver.class(), &link, true)
    }

    /// A call to a signature-polymorphic method of `java/lang/invoke/MethodHandle`
    ///
    /// # Errors
    /// See [`LinkResolver::resolve_handle_call`].
    pub fn resolve_invokehandle(&self, pool: &ConstantPool, index: usize) -> Result<CallInfo> {
        let (class, member) = self.resolve_pool(pool, index)?;
        let link = LinkInfo::new(&class, member.name, member.signature, pool.holder());
        self.resolve_handle_call(&link)
    }

    /// `invokedynamic`, see [`LinkResolver::resolve_dynamic_call`].
    ///
    /// # Errors
    /// - [`Error::Internal`] if method handles are disabled
    /// - [`Error::BootstrapMethod`] if the bootstrap method fails
    /// - [`Error::Malformed`] for a bad call-site or bootstrap entry
    pub fn resolve_invokedynamic(&self, pool: &ConstantPool, index: usize) -> Result<CallInfo> {
        if !self.runtime().config().enable_invoke_dynamic {
            return Err(Error::Internal(
                "invokedynamic instructions not enabled".to_string(),
            ));
        }

        self.resolve_dynamic_call(pool, index)
    }

    /// Method lookup on behalf of a compiler.
    ///
    /// Checks that `accessor` may access `holder`, then runs the `_or_null` operation for
    /// `kind`. Static methods of classes whose initialization has not started are not returned,
    /// since calling them requires the initialization barrier of the interpreter.
    ///
    /// # Errors
    /// - [`Error::IllegalAccess`] if `holder` is not accessible from `accessor`
    /// - [`Error::Malformed`] for handle and dynamic kinds, which have no declared target
    pub fn lookup_method_for_compiler(
        &self,
        accessor: &ClassTypeRc,
        holder: &ClassTypeRc,
        name: &str,
        signature: &str,
        kind: InvokeKind,
    ) -> Result<Option<MethodRc>> {
        check_klass_accessibility(accessor, holder)?;
        let link = LinkInfo::new(holder, name, signature, accessor);

        let method = match kind {
            InvokeKind::Static => self.resolve_static_call_or_null(&link).filter(|method| {
                method
                    .holder()
                    .is_some_and(|declared| declared.init_state() >= InitState::BeingInitialized)
            }),
            InvokeKind::Special => self.resolve_special_call_or_null(&link),
            InvokeKind::Interface => self.linktime_resolve_interface_method_or_null(&link),
            InvokeKind::Virtual => self.linktime_resolve_virtual_method_or_null(&link),
            InvokeKind::Handle | InvokeKind::Dynamic => {
                return Err(malformed_error!("No declared method to look up for {}", kind));
            }
        };

        debug!(
            accessor = %accessor.name,
            reference = %link.qualified_name(),
            kind = %kind,
            found = method.is_some(),
            "compiler method lookup"
        );
        Ok(method)
    }
}
