//! Loaded classes and the queries the resolver runs against them.
//!
//! This module provides the class-metadata side of resolution: the immutable description of a
//! loaded class or interface, its members, and the write-once dispatch table computed when the
//! class is linked.
//!
//! # Key Components
//!
//! - [`ClassType`]: A loaded class, interface or array class
//! - [`ClassRegistry`]: Token arena and loader dictionary owning every class
//! - [`ClassBuilder`]: Fluent description of a class to define
//! - [`Vtable`]: Virtual-dispatch table, including miranda slots
//!
//! # Lookup primitives
//!
//! | Query | Search order |
//! |-------|--------------|
//! | [`ClassType::find_method`] | declared methods only |
//! | [`ClassType::uncached_lookup_method`] | the class, then its superclass chain |
//! | [`ClassType::lookup_method_in_all_interfaces`] | transitive interfaces, public instance methods only |
//! | [`ClassType::find_field`] | declared fields, superinterfaces recursively, then the superclass |
//!
//! # Examples
//!
//! ```rust
//! use vmlink::metadata::{flags::AccessFlags, typesystem::{ClassBuilder, ClassRegistry}};
//!
//! let registry = ClassRegistry::new()?;
//! let shape = ClassBuilder::new("demo/Shape")
//!     .with_flags(AccessFlags::PUBLIC | AccessFlags::ABSTRACT)
//!     .method("area", "()D", AccessFlags::PUBLIC | AccessFlags::ABSTRACT)
//!     .define(&registry)?;
//!
//! assert!(shape.uncached_lookup_method("hashCode", "()I").is_some());
//! assert!(shape.find_method("hashCode", "()I").is_none());
//! # Ok::<(), vmlink::Error>(())
//! ```

mod base;
mod builder;
mod registry;
mod vtable;

use std::{
    fmt,
    sync::{Arc, Mutex, OnceLock},
};

pub use base::{ArrayElement, ClassKind, ClassTypeRef};
pub use builder::{ClassBuilder, MemberSpec};
pub use registry::{ClassRegistry, OBJECT_HEADER_SIZE};
pub use vtable::Vtable;

use crate::{
    metadata::{
        field::FieldRc,
        flags::AccessFlags,
        loader::LoaderId,
        method::MethodRc,
        symbols,
        token::Token,
    },
    runtime::init::{InitMonitor, InitState},
};

/// Reference to a `ClassType`
pub type ClassTypeRc = Arc<ClassType>;

/// A loaded class, interface or array class.
///
/// Everything except the vtable and the initialization state is fixed when the registry defines
/// the class. Superclass and interfaces are strong references; members point back to the class
/// through a [`ClassTypeRef`].
pub struct ClassType {
    /// Identity inside the registry
    pub token: Token,
    /// Internal name, e.g. `java/lang/String` or `[I`
    pub name: String,
    /// Defining loader
    pub loader: LoaderId,
    /// Access flags
    pub flags: AccessFlags,
    /// Class, interface or array
    pub kind: ClassKind,
    /// Direct superclass, `None` only for `java/lang/Object`
    pub super_class: Option<ClassTypeRc>,
    /// Directly implemented (or extended, for interfaces) interfaces
    pub interfaces: Vec<ClassTypeRc>,
    /// Every interface implemented directly or through superclasses and superinterfaces,
    /// without duplicates
    pub transitive_interfaces: Vec<ClassTypeRc>,
    /// Declared methods in declaration order
    pub methods: Vec<MethodRc>,
    /// Declared fields in declaration order
    pub fields: Vec<FieldRc>,
    /// Size of an instance, including inherited fields and the object header
    pub instance_size: usize,
    /// Size of the static field storage
    pub static_size: usize,
    vtable: OnceLock<Vtable>,
    pub(crate) link_lock: Mutex<()>,
    pub(crate) init: InitMonitor,
}

impl ClassType {
    /// Creates a class in the `Allocated` state. Used by the registry.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        token: Token,
        name: String,
        loader: LoaderId,
        flags: AccessFlags,
        kind: ClassKind,
        super_class: Option<ClassTypeRc>,
        interfaces: Vec<ClassTypeRc>,
        methods: Vec<MethodRc>,
        fields: Vec<FieldRc>,
        instance_size: usize,
        static_size: usize,
    ) -> Self {
        let transitive_interfaces = Self::collect_transitive(super_class.as_ref(), &interfaces);
        ClassType {
            token,
            name,
            loader,
            flags,
            kind,
            super_class,
            interfaces,
            transitive_interfaces,
            methods,
            fields,
            instance_size,
            static_size,
            vtable: OnceLock::new(),
            link_lock: Mutex::new(()),
            init: InitMonitor::new(),
        }
    }

    fn collect_transitive(
        super_class: Option<&ClassTypeRc>,
        interfaces: &[ClassTypeRc],
    ) -> Vec<ClassTypeRc> {
        let mut result: Vec<ClassTypeRc> = Vec::new();
        let mut push = |candidate: &ClassTypeRc| {
            if !result.iter().any(|known| known.token == candidate.token) {
                result.push(candidate.clone());
            }
        };

        if let Some(super_class) = super_class {
            for interface in &super_class.transitive_interfaces {
                push(interface);
            }
        }
        for interface in interfaces {
            push(interface);
            for inherited in &interface.transitive_interfaces {
                push(inherited);
            }
        }
        result
    }

    /// Name with `.` separators, as used in error messages
    #[must_use]
    pub fn external_name(&self) -> String {
        symbols::external_name(&self.name)
    }

    /// Returns `true` for interfaces
    #[must_use]
    pub fn is_interface(&self) -> bool {
        matches!(self.kind, ClassKind::Interface)
    }

    /// Returns `true` for array classes
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self.kind, ClassKind::Array(_))
    }

    /// Returns `true` if the class is `abstract` (interfaces always are)
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.flags.is_abstract()
    }

    /// Returns `true` if the class is `final`
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.flags.is_final()
    }

    /// Returns `true` if the class is `public`
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.flags.is_public()
    }

    /// Returns `true` if the class was compiled with modern `invokespecial` semantics
    #[must_use]
    pub fn is_super(&self) -> bool {
        self.flags.is_super()
    }

    /// Element of an array class
    #[must_use]
    pub fn element(&self) -> Option<&ArrayElement> {
        match &self.kind {
            ClassKind::Array(element) => Some(element),
            _ => None,
        }
    }

    /// The innermost element class of an array of references, `None` for primitive arrays.
    /// Non-array classes return themselves.
    #[must_use]
    pub fn bottom_class<'a>(self: &'a ClassTypeRc) -> Option<&'a ClassTypeRc> {
        let mut current = self;
        loop {
            match &current.kind {
                ClassKind::Array(ArrayElement::Class(element)) => current = element,
                ClassKind::Array(ArrayElement::Primitive(_)) => return None,
                _ => return Some(current),
            }
        }
    }

    /// Runtime package: defining loader plus package name. Arrays belong to the package of
    /// their bottom element class, primitive arrays to the unnamed package of the bootstrap
    /// loader.
    #[must_use]
    pub fn runtime_package(&self) -> (LoaderId, &str) {
        match &self.kind {
            ClassKind::Array(ArrayElement::Class(element)) => element.runtime_package(),
            ClassKind::Array(ArrayElement::Primitive(_)) => (LoaderId::BOOTSTRAP, ""),
            _ => {
                let package = self.name.rfind('/').map_or("", |pos| &self.name[..pos]);
                (self.loader, package)
            }
        }
    }

    /// Returns `true` if both classes are in the same runtime package
    #[must_use]
    pub fn is_same_package(&self, other: &ClassType) -> bool {
        self.runtime_package() == other.runtime_package()
    }

    /// Returns `true` if `other` is this class or one of its superclasses
    #[must_use]
    pub fn is_subclass_of(&self, other: &ClassType) -> bool {
        let mut current = self;
        loop {
            if current.token == other.token {
                return true;
            }
            match &current.super_class {
                Some(super_class) => current = super_class,
                None => return false,
            }
        }
    }

    /// Returns `true` if `interface` is this type or one of its transitive interfaces
    #[must_use]
    pub fn implements_interface(&self, interface: &ClassType) -> bool {
        self.token == interface.token
            || self
                .transitive_interfaces
                .iter()
                .any(|known| known.token == interface.token)
    }

    /// Assignment compatibility of this type to `other`
    #[must_use]
    pub fn is_subtype_of(&self, other: &ClassType) -> bool {
        if self.token == other.token {
            return true;
        }
        match (&self.kind, &other.kind) {
            (ClassKind::Array(mine), ClassKind::Array(theirs)) => match (mine, theirs) {
                (ArrayElement::Primitive(a), ArrayElement::Primitive(b)) => a == b,
                (ArrayElement::Class(a), ArrayElement::Class(b)) => a.is_subtype_of(b),
                _ => false,
            },
            (_, ClassKind::Interface) => self.implements_interface(other),
            (_, ClassKind::Array(_)) => false,
            _ => self.is_subclass_of(other),
        }
    }

    /// Declared method matching `name` and `signature`
    #[must_use]
    pub fn find_method(&self, name: &str, signature: &str) -> Option<MethodRc> {
        self.methods
            .iter()
            .find(|method| method.matches(name, signature))
            .cloned()
    }

    /// First method matching `name` and `signature` on this class or its superclass chain,
    /// static methods included
    #[must_use]
    pub fn uncached_lookup_method(&self, name: &str, signature: &str) -> Option<MethodRc> {
        let mut current = self;
        loop {
            if let Some(method) = current.find_method(name, signature) {
                return Some(method);
            }
            match &current.super_class {
                Some(super_class) => current = super_class,
                None => return None,
            }
        }
    }

    /// First public instance method matching `name` and `signature` declared by one of the
    /// transitive interfaces
    #[must_use]
    pub fn lookup_method_in_all_interfaces(
        &self,
        name: &str,
        signature: &str,
    ) -> Option<MethodRc> {
        self.transitive_interfaces.iter().find_map(|interface| {
            interface
                .find_method(name, signature)
                .filter(|method| method.is_public() && !method.is_static())
        })
    }

    /// Declared field matching `name` and `signature`
    #[must_use]
    pub fn find_local_field(&self, name: &str, signature: &str) -> Option<FieldRc> {
        self.fields
            .iter()
            .find(|field| field.matches(name, signature))
            .cloned()
    }

    /// Field lookup in resolution order: declared fields, then the direct superinterfaces
    /// (recursively), then the superclass
    #[must_use]
    pub fn find_field(&self, name: &str, signature: &str) -> Option<FieldRc> {
        if let Some(field) = self.find_local_field(name, signature) {
            return Some(field);
        }
        for interface in &self.interfaces {
            if let Some(field) = interface.find_field(name, signature) {
                return Some(field);
            }
        }
        self.super_class
            .as_ref()
            .and_then(|super_class| super_class.find_field(name, signature))
    }

    /// The dispatch table, `None` before the class is linked
    #[must_use]
    pub fn vtable(&self) -> Option<&Vtable> {
        self.vtable.get()
    }

    /// Returns `true` once the dispatch table is installed
    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.vtable.get().is_some()
    }

    pub(crate) fn install_vtable(&self, vtable: Vtable) {
        let _ = self.vtable.set(vtable);
    }

    /// Method in dispatch slot `index`
    #[must_use]
    pub fn method_at_vtable(&self, index: usize) -> Option<MethodRc> {
        self.vtable()
            .and_then(|vtable| vtable.method_at(index))
            .cloned()
    }

    /// Current initialization state
    #[must_use]
    pub fn init_state(&self) -> InitState {
        self.init.state()
    }

    /// Returns `true` once the static initializer completed successfully
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.init_state() == InitState::FullyInitialized
    }
}

impl fmt::Debug for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassType")
            .field("token", &self.token)
            .field("name", &self.name)
            .field("loader", &self.loader)
            .field("flags", &self.flags)
            .field("state", &self.init_state())
            .finish_non_exhaustive()
    }
}
