//! Results of invoke and field resolution.
//!
//! [`CallInfo`] describes how a call site dispatches: the method the symbolic reference resolved
//! to, the method actually selected (for a given receiver, when there is one), and the dispatch
//! index the interpreter uses for subsequent calls. [`FieldAccessInfo`] carries what an
//! interpreter needs to access a resolved field.
//!
//! Both are plain values created per resolution request.

use std::fmt;

use strum::{Display, EnumIter};

use crate::{
    metadata::{
        field::FieldRc,
        flags::AccessFlags,
        method::{MethodRc, VtableIndex},
        signatures::BasicType,
        symbols,
        typesystem::ClassTypeRc,
    },
    runtime::{methodhandles::LinkedTarget, oop::OopRc},
};

/// Invoke bytecode kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum InvokeKind {
    /// `invokestatic`
    #[strum(serialize = "invokestatic")]
    Static,
    /// `invokespecial`
    #[strum(serialize = "invokespecial")]
    Special,
    /// `invokevirtual`
    #[strum(serialize = "invokevirtual")]
    Virtual,
    /// `invokeinterface`
    #[strum(serialize = "invokeinterface")]
    Interface,
    /// `invokehandle`, a call to a signature-polymorphic method
    #[strum(serialize = "invokehandle")]
    Handle,
    /// `invokedynamic`
    #[strum(serialize = "invokedynamic")]
    Dynamic,
}

impl InvokeKind {
    /// Returns `true` if the call has a receiver
    #[must_use]
    pub fn has_receiver(&self) -> bool {
        matches!(
            self,
            InvokeKind::Special | InvokeKind::Virtual | InvokeKind::Interface | InvokeKind::Handle
        )
    }
}

/// Field access bytecode kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum FieldAccessKind {
    /// `getstatic`
    #[strum(serialize = "getstatic")]
    GetStatic,
    /// `putstatic`
    #[strum(serialize = "putstatic")]
    PutStatic,
    /// `getfield`
    #[strum(serialize = "getfield")]
    GetField,
    /// `putfield`
    #[strum(serialize = "putfield")]
    PutField,
}

impl FieldAccessKind {
    /// Returns `true` for static field accesses
    #[must_use]
    pub fn is_static(&self) -> bool {
        matches!(self, FieldAccessKind::GetStatic | FieldAccessKind::PutStatic)
    }

    /// Returns `true` for writes
    #[must_use]
    pub fn is_put(&self) -> bool {
        matches!(self, FieldAccessKind::PutStatic | FieldAccessKind::PutField)
    }
}

/// Outcome of resolving an invoke.
///
/// The resolved and the selected method always have the same signature. The dispatch index is a
/// vtable slot, [`VtableIndex::NonVirtual`] for calls that bind directly, or
/// [`VtableIndex::Invalid`] for interface calls that are dispatched by lookup.
#[derive(Clone)]
pub struct CallInfo {
    resolved_class: ClassTypeRc,
    selected_class: ClassTypeRc,
    resolved_method: MethodRc,
    selected_method: MethodRc,
    vtable_index: VtableIndex,
    appendix: Option<OopRc>,
    method_type: Option<OopRc>,
}

impl CallInfo {
    fn common(
        resolved_class: ClassTypeRc,
        selected_class: ClassTypeRc,
        resolved_method: MethodRc,
        selected_method: MethodRc,
        vtable_index: VtableIndex,
    ) -> Self {
        assert_eq!(
            resolved_method.signature, selected_method.signature,
            "resolved and selected method signatures must correspond"
        );
        CallInfo {
            resolved_class,
            selected_class,
            resolved_method,
            selected_method,
            vtable_index,
            appendix: None,
            method_type: None,
        }
    }

    /// A directly bound call to `method`
    pub(crate) fn new_static(resolved_class: ClassTypeRc, method: MethodRc) -> Self {
        Self::common(
            resolved_class.clone(),
            resolved_class,
            method.clone(),
            method,
            VtableIndex::NonVirtual,
        )
    }

    /// An interface call. Methods of `java/lang/Object` reached through an interface keep their
    /// vtable index, every other interface call is dispatched by lookup.
    pub(crate) fn new_interface(
        resolved_class: ClassTypeRc,
        selected_class: ClassTypeRc,
        resolved_method: MethodRc,
        selected_method: MethodRc,
    ) -> Self {
        let declared_on_object = resolved_method
            .holder()
            .is_some_and(|holder| holder.name == symbols::OBJECT && holder.loader.is_bootstrap());
        let vtable_index = if declared_on_object {
            resolved_method.vtable_index()
        } else {
            VtableIndex::Invalid
        };
        Self::common(
            resolved_class,
            selected_class,
            resolved_method,
            selected_method,
            vtable_index,
        )
    }

    /// A virtual call through slot `vtable_index`, or a directly bound one for
    /// [`VtableIndex::NonVirtual`]
    pub(crate) fn new_virtual(
        resolved_class: ClassTypeRc,
        selected_class: ClassTypeRc,
        resolved_method: MethodRc,
        selected_method: MethodRc,
        vtable_index: VtableIndex,
    ) -> Self {
        assert!(
            vtable_index != VtableIndex::Invalid,
            "virtual call without a dispatch index"
        );
        Self::common(
            resolved_class,
            selected_class,
            resolved_method,
            selected_method,
            vtable_index,
        )
    }

    /// A call through a method handle intrinsic, adapter or dynamic call site
    pub(crate) fn new_handle(method_handle_class: ClassTypeRc, target: &LinkedTarget) -> Self {
        let mut info = Self::common(
            method_handle_class.clone(),
            method_handle_class,
            target.method.clone(),
            target.method.clone(),
            VtableIndex::NonVirtual,
        );
        info.appendix = target.appendix.clone();
        info.method_type = target.method_type.clone();
        info
    }

    /// The class named by the symbolic reference (or the holder of a static method)
    #[must_use]
    pub fn resolved_class(&self) -> &ClassTypeRc {
        &self.resolved_class
    }

    /// The class supplying the implementation
    #[must_use]
    pub fn selected_class(&self) -> &ClassTypeRc {
        &self.selected_class
    }

    /// The method found at link time
    #[must_use]
    pub fn resolved_method(&self) -> &MethodRc {
        &self.resolved_method
    }

    /// The method to call
    #[must_use]
    pub fn selected_method(&self) -> &MethodRc {
        &self.selected_method
    }

    /// Dispatch index for subsequent calls through this site
    #[must_use]
    pub fn vtable_index(&self) -> VtableIndex {
        self.vtable_index
    }

    /// Trailing argument of handle and dynamic calls
    #[must_use]
    pub fn appendix(&self) -> Option<&OopRc> {
        self.appendix.as_ref()
    }

    /// Method type of handle and dynamic calls
    #[must_use]
    pub fn method_type(&self) -> Option<&OopRc> {
        self.method_type.as_ref()
    }

    /// Returns `true` if the call carries an appendix
    #[must_use]
    pub fn has_appendix(&self) -> bool {
        self.appendix.is_some()
    }
}

impl fmt::Debug for CallInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallInfo")
            .field("resolved_class", &self.resolved_class.name)
            .field("selected_class", &self.selected_class.name)
            .field("resolved_method", &self.resolved_method.qualified_name())
            .field("selected_method", &self.selected_method.qualified_name())
            .field("vtable_index", &self.vtable_index)
            .field("appendix", &self.appendix)
            .field("method_type", &self.method_type)
            .finish()
    }
}

/// Outcome of resolving a field access
#[derive(Clone)]
pub struct FieldAccessInfo {
    holder: ClassTypeRc,
    field: FieldRc,
}

impl FieldAccessInfo {
    pub(crate) fn new(holder: ClassTypeRc, field: FieldRc) -> Self {
        FieldAccessInfo { holder, field }
    }

    /// Declaring class of the field
    #[must_use]
    pub fn holder(&self) -> &ClassTypeRc {
        &self.holder
    }

    /// The resolved field
    #[must_use]
    pub fn field(&self) -> &FieldRc {
        &self.field
    }

    /// Field name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.field.name
    }

    /// Declaration index within the holder
    #[must_use]
    pub fn index(&self) -> usize {
        self.field.index
    }

    /// Byte offset within the instance, or within the static storage for static fields
    #[must_use]
    pub fn offset(&self) -> usize {
        self.field.offset
    }

    /// Basic type of the field
    #[must_use]
    pub fn basic_type(&self) -> BasicType {
        self.field.basic_type
    }

    /// Access flags of the field
    #[must_use]
    pub fn flags(&self) -> AccessFlags {
        self.field.flags
    }
}

impl fmt::Debug for FieldAccessInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAccessInfo")
            .field("holder", &self.holder.name)
            .field("name", &self.field.name)
            .field("index", &self.field.index)
            .field("offset", &self.field.offset)
            .field("basic_type", &self.field.basic_type)
            .field("flags", &self.field.flags)
            .finish()
    }
}
