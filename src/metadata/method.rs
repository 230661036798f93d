//! Method metadata.
//!
//! A [`Method`] is owned by its declaring [`crate::metadata::typesystem::ClassType`] and keeps a
//! weak reference back to it. Its virtual-dispatch index is written exactly once, while the
//! declaring class is linked, and read lock-free afterwards.

use std::{
    fmt,
    sync::{Arc, OnceLock},
};

use strum::{Display, EnumIter};

use crate::metadata::{
    flags::AccessFlags,
    symbols,
    token::Token,
    typesystem::{ClassTypeRc, ClassTypeRef},
};

/// Reference-counted [`Method`]
pub type MethodRc = Arc<Method>;

/// Virtual-dispatch index of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VtableIndex {
    /// Slot in the vtable of the declaring class and all its subclasses
    Slot(usize),
    /// The method can never be overridden and is called directly
    NonVirtual,
    /// No index has been assigned
    Invalid,
}

impl VtableIndex {
    /// The slot number, if this is a valid slot
    #[must_use]
    pub fn slot(&self) -> Option<usize> {
        match self {
            VtableIndex::Slot(slot) => Some(*slot),
            _ => None,
        }
    }

    /// Returns `true` for a valid slot
    #[must_use]
    pub fn is_slot(&self) -> bool {
        matches!(self, VtableIndex::Slot(_))
    }
}

impl fmt::Display for VtableIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VtableIndex::Slot(slot) => write!(f, "{slot}"),
            VtableIndex::NonVirtual => write!(f, "nonvirtual"),
            VtableIndex::Invalid => write!(f, "invalid"),
        }
    }
}

/// Intrinsic identity of a method.
///
/// Everything except `None` marks a signature-polymorphic method of
/// `java/lang/invoke/MethodHandle`, either as declared or as synthesized by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter)]
pub enum IntrinsicId {
    /// A regular method
    #[default]
    #[strum(serialize = "_none")]
    None,
    /// `invoke` / `invokeExact`, linked through the language runtime
    #[strum(serialize = "_invokeGeneric")]
    InvokeGeneric,
    /// `invokeBasic`
    #[strum(serialize = "_invokeBasic")]
    InvokeBasic,
    /// `linkToVirtual`
    #[strum(serialize = "_linkToVirtual")]
    LinkToVirtual,
    /// `linkToStatic`
    #[strum(serialize = "_linkToStatic")]
    LinkToStatic,
    /// `linkToSpecial`
    #[strum(serialize = "_linkToSpecial")]
    LinkToSpecial,
    /// `linkToInterface`
    #[strum(serialize = "_linkToInterface")]
    LinkToInterface,
}

impl IntrinsicId {
    /// Maps a well-known method handle member name to its intrinsic
    #[must_use]
    pub fn for_name(name: &str) -> IntrinsicId {
        match name {
            symbols::INVOKE | symbols::INVOKE_EXACT => IntrinsicId::InvokeGeneric,
            symbols::INVOKE_BASIC => IntrinsicId::InvokeBasic,
            symbols::LINK_TO_VIRTUAL => IntrinsicId::LinkToVirtual,
            symbols::LINK_TO_STATIC => IntrinsicId::LinkToStatic,
            symbols::LINK_TO_SPECIAL => IntrinsicId::LinkToSpecial,
            symbols::LINK_TO_INTERFACE => IntrinsicId::LinkToInterface,
            _ => IntrinsicId::None,
        }
    }

    /// Canonical member name of a synthesized intrinsic
    #[must_use]
    pub fn method_name(&self) -> &'static str {
        match self {
            IntrinsicId::None => "",
            IntrinsicId::InvokeGeneric => symbols::INVOKE,
            IntrinsicId::InvokeBasic => symbols::INVOKE_BASIC,
            IntrinsicId::LinkToVirtual => symbols::LINK_TO_VIRTUAL,
            IntrinsicId::LinkToStatic => symbols::LINK_TO_STATIC,
            IntrinsicId::LinkToSpecial => symbols::LINK_TO_SPECIAL,
            IntrinsicId::LinkToInterface => symbols::LINK_TO_INTERFACE,
        }
    }

    /// Signature-polymorphic: the erased signature is decided per call site
    #[must_use]
    pub fn is_signature_polymorphic(&self) -> bool {
        *self != IntrinsicId::None
    }

    /// Resolved without an up-call into the language runtime
    #[must_use]
    pub fn is_signature_polymorphic_intrinsic(&self) -> bool {
        self.is_signature_polymorphic() && *self != IntrinsicId::InvokeGeneric
    }

    /// The static linkers, whose trailing argument selects the target
    #[must_use]
    pub fn is_signature_polymorphic_static(&self) -> bool {
        matches!(
            self,
            IntrinsicId::LinkToVirtual
                | IntrinsicId::LinkToStatic
                | IntrinsicId::LinkToSpecial
                | IntrinsicId::LinkToInterface
        )
    }
}

/// A method declared by a class or interface, or synthesized as method handle intrinsic.
pub struct Method {
    /// Identity of the method inside the registry
    pub token: Token,
    /// Simple name, e.g. `toString` or `<init>`
    pub name: String,
    /// Method descriptor, e.g. `(I)Ljava/lang/String;`
    pub signature: String,
    /// Access flags
    pub flags: AccessFlags,
    /// Intrinsic identity, `IntrinsicId::None` for regular methods
    pub intrinsic: IntrinsicId,
    holder: ClassTypeRef,
    vtable_index: OnceLock<VtableIndex>,
}

impl Method {
    /// Creates a method owned by `holder`; the vtable index is assigned when the holder links.
    #[must_use]
    pub fn new(
        token: Token,
        name: String,
        signature: String,
        flags: AccessFlags,
        intrinsic: IntrinsicId,
        holder: ClassTypeRef,
    ) -> Self {
        Method {
            token,
            name,
            signature,
            flags,
            intrinsic,
            holder,
            vtable_index: OnceLock::new(),
        }
    }

    /// The declaring class, `None` once it has been dropped
    #[must_use]
    pub fn holder(&self) -> Option<ClassTypeRc> {
        self.holder.upgrade()
    }

    /// Internal name of the declaring class
    #[must_use]
    pub fn holder_name(&self) -> String {
        self.holder
            .name()
            .unwrap_or_else(|| "<unloaded>".to_string())
    }

    /// `Holder.name(signature)` in external form, as used in error messages
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!(
            "{}.{}{}",
            symbols::external_name(&self.holder_name()),
            self.name,
            self.signature
        )
    }

    /// Virtual-dispatch index, `VtableIndex::Invalid` before the holder is linked
    #[must_use]
    pub fn vtable_index(&self) -> VtableIndex {
        self.vtable_index
            .get()
            .copied()
            .unwrap_or(VtableIndex::Invalid)
    }

    /// Assigns the dispatch index, later assignments are ignored
    pub(crate) fn set_vtable_index(&self, index: VtableIndex) {
        let _ = self.vtable_index.set(index);
    }

    /// Returns `true` if `name` and `signature` match exactly
    #[must_use]
    pub fn matches(&self, name: &str, signature: &str) -> bool {
        self.name == name && self.signature == signature
    }

    /// Returns `true` if the method is `static`
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.is_static()
    }

    /// Returns `true` if the method is `abstract`
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.flags.is_abstract()
    }

    /// Returns `true` if the method is `final`
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.flags.is_final()
    }

    /// Returns `true` if the method is `public`
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.flags.is_public()
    }

    /// Returns `true` if the method is `private`
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.flags.is_private()
    }

    /// Returns `true` if the method is `native`
    #[must_use]
    pub fn is_native(&self) -> bool {
        self.flags.contains(AccessFlags::NATIVE)
    }

    /// Returns `true` for instance initializers
    #[must_use]
    pub fn is_object_initializer(&self) -> bool {
        self.name == symbols::OBJECT_INITIALIZER
    }

    /// Returns `true` for the static initializer
    #[must_use]
    pub fn is_class_initializer(&self) -> bool {
        self.name == symbols::CLASS_INITIALIZER
    }

    /// Returns `true` for methods synthesized by the registry for polymorphic call sites
    #[must_use]
    pub fn is_method_handle_intrinsic(&self) -> bool {
        self.intrinsic.is_signature_polymorphic_intrinsic()
            && self.flags.contains(AccessFlags::SYNTHETIC)
    }

    /// Returns `true` if no override can ever replace this method
    #[must_use]
    pub fn can_be_statically_bound(&self) -> bool {
        self.is_final() || self.vtable_index() == VtableIndex::NonVirtual
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("token", &self.token)
            .field("name", &self.qualified_name())
            .field("flags", &self.flags)
            .field("vtable_index", &self.vtable_index())
            .finish()
    }
}
