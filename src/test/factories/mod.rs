//! Factory methods for resolver test data.

pub mod classes;
pub mod runtime;
