//! Field metadata.

use std::{fmt, sync::Arc};

use crate::metadata::{
    flags::AccessFlags,
    signatures::BasicType,
    symbols,
    token::Token,
    typesystem::{ClassTypeRc, ClassTypeRef},
};

/// Reference-counted [`Field`]
pub type FieldRc = Arc<Field>;

/// A field declared by a class or interface.
///
/// `index` is the position among the declaring class's fields; `offset` is the byte offset in
/// the instance (for instance fields) or in the class's static storage (for static fields).
pub struct Field {
    /// Identity of the field inside the registry
    pub token: Token,
    /// Simple name
    pub name: String,
    /// Field descriptor, e.g. `Ljava/lang/String;`
    pub signature: String,
    /// Access flags
    pub flags: AccessFlags,
    /// Basic type derived from the descriptor
    pub basic_type: BasicType,
    /// Position among the declared fields of the holder
    pub index: usize,
    /// Byte offset inside the instance or static storage
    pub offset: usize,
    holder: ClassTypeRef,
}

impl Field {
    /// Creates a field owned by `holder`
    #[must_use]
    pub fn new(
        token: Token,
        name: String,
        signature: String,
        flags: AccessFlags,
        basic_type: BasicType,
        index: usize,
        offset: usize,
        holder: ClassTypeRef,
    ) -> Self {
        Field {
            token,
            name,
            signature,
            flags,
            basic_type,
            index,
            offset,
            holder,
        }
    }

    /// The declaring class, `None` once it has been dropped
    #[must_use]
    pub fn holder(&self) -> Option<ClassTypeRc> {
        self.holder.upgrade()
    }

    /// Returns `true` if `name` and `signature` match exactly
    #[must_use]
    pub fn matches(&self, name: &str, signature: &str) -> bool {
        self.name == name && self.signature == signature
    }

    /// Returns `true` if the field is `static`
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.is_static()
    }

    /// Returns `true` if the field is `final`
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.flags.is_final()
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let holder = self
            .holder
            .name()
            .map_or_else(|| "<unloaded>".to_string(), |name| symbols::external_name(&name));
        write!(f, "Field({holder}.{}:{} @{})", self.name, self.signature, self.offset)
    }
}
