use std::sync::{Arc, Weak};

use crate::metadata::{
    signatures::BasicType,
    token::Token,
    typesystem::{ClassType, ClassTypeRc},
};

/// A smart reference to a `ClassType` that automatically handles weak references
/// to prevent circular reference memory leaks between classes and their members
#[derive(Clone, Debug)]
pub struct ClassTypeRef {
    weak_ref: Weak<ClassType>,
}

impl ClassTypeRef {
    /// Create a new `ClassTypeRef` from a strong reference
    pub fn new(strong_ref: &ClassTypeRc) -> Self {
        Self {
            weak_ref: Arc::downgrade(strong_ref),
        }
    }

    /// Create a new `ClassTypeRef` from a weak reference, used while the class is constructed
    pub fn from_weak(weak_ref: Weak<ClassType>) -> Self {
        Self { weak_ref }
    }

    /// A reference that never upgrades
    #[must_use]
    pub fn dangling() -> Self {
        Self {
            weak_ref: Weak::new(),
        }
    }

    /// Get a strong reference to the type, returning None if the type has been dropped
    #[must_use]
    pub fn upgrade(&self) -> Option<ClassTypeRc> {
        self.weak_ref.upgrade()
    }

    /// Check if the referenced type is still alive
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.weak_ref.strong_count() > 0
    }

    /// Get the token of the referenced type (if still alive)
    #[must_use]
    pub fn token(&self) -> Option<Token> {
        self.upgrade().map(|t| t.token)
    }

    /// Get the name of the referenced type (if still alive)
    #[must_use]
    pub fn name(&self) -> Option<String> {
        self.upgrade().map(|t| t.name.clone())
    }
}

impl From<ClassTypeRc> for ClassTypeRef {
    fn from(strong_ref: ClassTypeRc) -> Self {
        Self::new(&strong_ref)
    }
}

/// Element of an array class
#[derive(Clone, Debug)]
pub enum ArrayElement {
    /// Array of a primitive type, e.g. `[I`
    Primitive(BasicType),
    /// Array of references, e.g. `[Ljava/lang/String;` or `[[I`
    Class(ClassTypeRc),
}

/// The category of a class
#[derive(Clone, Debug)]
pub enum ClassKind {
    /// A regular class
    Instance,
    /// An interface
    Interface,
    /// An array class, created on demand by the registry
    Array(ArrayElement),
}
