//! Builder for class definitions.
//!
//! This module provides the [`ClassBuilder`] struct, a fluent description of a class or interface
//! that the [`ClassRegistry`] turns into a loaded [`ClassType`](super::ClassType). Class-file
//! parsing is outside of this crate; whoever parses class files hands the result to the registry
//! through this builder.
//!
//! # Example
//!
//! ```rust
//! use vmlink::metadata::{flags::AccessFlags, loader::LoaderId, typesystem::{ClassBuilder, ClassRegistry}};
//!
//! let registry = ClassRegistry::new()?;
//! let app = registry.create_loader("app", LoaderId::BOOTSTRAP);
//!
//! let greeter = ClassBuilder::new("demo/Greeter")
//!     .with_loader(app)
//!     .method("<init>", "()V", AccessFlags::PUBLIC)
//!     .method("greet", "(Ljava/lang/String;)V", AccessFlags::PUBLIC)
//!     .field("count", "I", AccessFlags::PRIVATE | AccessFlags::STATIC)
//!     .define(&registry)?;
//!
//! assert_eq!(greeter.loader, app);
//! # Ok::<(), vmlink::Error>(())
//! ```

use crate::{
    metadata::{
        flags::AccessFlags,
        loader::LoaderId,
        symbols,
        typesystem::{ClassRegistry, ClassTypeRc},
    },
    Result,
};

/// Name, descriptor and flags of a member to declare
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSpec {
    /// Simple name
    pub name: String,
    /// Field or method descriptor
    pub signature: String,
    /// Access flags
    pub flags: AccessFlags,
}

/// Provides a fluent API for describing a class to define
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    pub(crate) name: String,
    pub(crate) loader: LoaderId,
    pub(crate) flags: AccessFlags,
    pub(crate) super_name: Option<String>,
    pub(crate) interfaces: Vec<String>,
    pub(crate) methods: Vec<MemberSpec>,
    pub(crate) fields: Vec<MemberSpec>,
}

impl ClassBuilder {
    /// Describe a public class extending `java/lang/Object`, defined by the bootstrap loader
    ///
    /// ## Arguments
    /// * 'name' - Internal name of the class, e.g. `com/acme/Widget`
    pub fn new(name: &str) -> Self {
        ClassBuilder {
            name: name.to_string(),
            loader: LoaderId::BOOTSTRAP,
            flags: AccessFlags::PUBLIC | AccessFlags::SUPER,
            super_name: (name != symbols::OBJECT).then(|| symbols::OBJECT.to_string()),
            interfaces: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Describe a public interface
    ///
    /// ## Arguments
    /// * 'name' - Internal name of the interface
    pub fn interface(name: &str) -> Self {
        ClassBuilder::new(name)
            .with_flags(AccessFlags::PUBLIC | AccessFlags::INTERFACE | AccessFlags::ABSTRACT)
    }

    /// Set the defining loader
    #[must_use]
    pub fn with_loader(mut self, loader: LoaderId) -> Self {
        self.loader = loader;
        self
    }

    /// Replace the access flags
    #[must_use]
    pub fn with_flags(mut self, flags: AccessFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the superclass by internal name
    #[must_use]
    pub fn extends(mut self, super_name: &str) -> Self {
        self.super_name = Some(super_name.to_string());
        self
    }

    /// Remove the superclass, only valid for the root class
    #[must_use]
    pub fn without_super(mut self) -> Self {
        self.super_name = None;
        self
    }

    /// Add a directly implemented interface
    #[must_use]
    pub fn implements(mut self, interface: &str) -> Self {
        self.interfaces.push(interface.to_string());
        self
    }

    /// Declare a method
    #[must_use]
    pub fn method(mut self, name: &str, signature: &str, flags: AccessFlags) -> Self {
        self.methods.push(MemberSpec {
            name: name.to_string(),
            signature: signature.to_string(),
            flags,
        });
        self
    }

    /// Declare a field
    #[must_use]
    pub fn field(mut self, name: &str, signature: &str, flags: AccessFlags) -> Self {
        self.fields.push(MemberSpec {
            name: name.to_string(),
            signature: signature.to_string(),
            flags,
        });
        self
    }

    /// Internal name of the described class
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Define the described class in `registry`
    ///
    /// # Errors
    /// See [`ClassRegistry::define_class`].
    pub fn define(self, registry: &ClassRegistry) -> Result<ClassTypeRc> {
        registry.define_class(self)
    }
}
