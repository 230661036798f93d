//! Access and property flags of classes, methods and fields.
//!
//! The values are the ones used by the class file format, so flags read by a class-file
//! parser can be handed to the builders unchanged via [`AccessFlags::from_bits_truncate`].
//! Bits that share a value between classes and members (`SUPER` / `SYNCHRONIZED`) are only
//! defined under the meaning the resolver needs.

use bitflags::bitflags;

/// Bitmask for the visibility part of the flags
pub const ACCESS_VISIBILITY_MASK: u16 = 0x0007;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    /// Access flags of a class, method or field
    pub struct AccessFlags: u16 {
        /// Accessible from everywhere
        const PUBLIC = 0x0001;
        /// Accessible only from the declaring class
        const PRIVATE = 0x0002;
        /// Accessible from subclasses and the same runtime package
        const PROTECTED = 0x0004;
        /// Member belongs to the class, not to instances
        const STATIC = 0x0008;
        /// Class cannot be subclassed, method cannot be overridden, field cannot be written
        /// outside of its initializer
        const FINAL = 0x0010;
        /// Class uses the modern `invokespecial` semantics for super calls
        const SUPER = 0x0020;
        /// Method takes a variable number of arguments
        const VARARGS = 0x0080;
        /// Method is implemented outside of bytecode
        const NATIVE = 0x0100;
        /// Class is an interface
        const INTERFACE = 0x0200;
        /// Class cannot be instantiated, method has no implementation
        const ABSTRACT = 0x0400;
        /// Not present in the source, generated by a compiler or the runtime
        const SYNTHETIC = 0x1000;
    }
}

impl AccessFlags {
    /// Returns `true` if the `PUBLIC` bit is set
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.contains(AccessFlags::PUBLIC)
    }

    /// Returns `true` if the `PRIVATE` bit is set
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.contains(AccessFlags::PRIVATE)
    }

    /// Returns `true` if the `PROTECTED` bit is set
    #[must_use]
    pub fn is_protected(&self) -> bool {
        self.contains(AccessFlags::PROTECTED)
    }

    /// Returns `true` if no visibility bit is set (package access)
    #[must_use]
    pub fn is_package_private(&self) -> bool {
        self.bits() & ACCESS_VISIBILITY_MASK == 0
    }

    /// Returns `true` if the `STATIC` bit is set
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.contains(AccessFlags::STATIC)
    }

    /// Returns `true` if the `FINAL` bit is set
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.contains(AccessFlags::FINAL)
    }

    /// Returns `true` if the `ABSTRACT` bit is set
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.contains(AccessFlags::ABSTRACT)
    }

    /// Returns `true` if the `INTERFACE` bit is set
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.contains(AccessFlags::INTERFACE)
    }

    /// Returns `true` if the `SUPER` bit is set
    #[must_use]
    pub fn is_super(&self) -> bool {
        self.contains(AccessFlags::SUPER)
    }

    /// Returns a copy with the visibility replaced by `PUBLIC`
    #[must_use]
    pub fn as_public(self) -> Self {
        (self - AccessFlags::PRIVATE - AccessFlags::PROTECTED) | AccessFlags::PUBLIC
    }
}
