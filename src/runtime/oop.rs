//! Opaque heap object handles.
//!
//! The resolver never looks inside objects; it only needs the class of a receiver and a way to
//! carry appendix, method type and bootstrap values around. An [`Oop`] is exactly that: a class
//! plus a label for diagnostics.

use std::{fmt, sync::Arc};

use crate::metadata::typesystem::ClassTypeRc;

/// Reference-counted [`Oop`]
pub type OopRc = Arc<Oop>;

/// A heap object as seen by the resolver
pub struct Oop {
    class: ClassTypeRc,
    label: String,
}

impl Oop {
    /// Creates an object of class `class`
    ///
    /// ## Arguments
    /// * 'class' - Runtime class of the object
    /// * 'label' - Free-form description, used in logs
    pub fn new(class: ClassTypeRc, label: impl Into<String>) -> OopRc {
        Arc::new(Oop {
            class,
            label: label.into(),
        })
    }

    /// Runtime class of the object
    #[must_use]
    pub fn class(&self) -> &ClassTypeRc {
        &self.class
    }

    /// Diagnostic label
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for Oop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.class.name, self.label)
    }
}
