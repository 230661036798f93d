//! Class metadata for link resolution.
//!
//! This module holds everything the resolver reads: the classes loaded into a
//! [`typesystem::ClassRegistry`], their methods and fields, the descriptors those members carry,
//! the class loaders that defined them and the constraints recorded between those loaders.
//!
//! # Key Components
//!
//! - [`typesystem`] - Class representation, the registry owning all classes, vtables
//! - [`method`] / [`field`] - Members with their flags and dispatch information
//! - [`signatures`] - Field and method descriptor parsing
//! - [`loader`] - Class loaders and the dependencies recorded between them
//! - [`constraints`] - The loader constraint table
//! - [`constantpool`] - Symbolic references of a class and their resolution caches
//! - [`token`] - Identifiers of classes and members
//!
//! # Examples
//!
//! ```rust
//! use vmlink::metadata::{flags::AccessFlags, loader::LoaderId, typesystem::{ClassBuilder, ClassRegistry}};
//!
//! let registry = ClassRegistry::new()?;
//! let point = ClassBuilder::new("demo/Point")
//!     .field("x", "I", AccessFlags::PRIVATE)
//!     .method("length", "()D", AccessFlags::PUBLIC)
//!     .define(&registry)?;
//!
//! assert_eq!(registry.find_class("demo/Point", LoaderId::BOOTSTRAP).unwrap().token, point.token);
//! assert!(point.find_field("x", "I").is_some());
//! # Ok::<(), vmlink::Error>(())
//! ```

/// Implementation of per-class constant pools
pub mod constantpool;
/// Implementation of the loader constraint table
pub mod constraints;
/// Implementation of fields
pub mod field;
/// Access flags of classes and members
pub mod flags;
/// Implementation of class loaders and their dependencies
pub mod loader;
/// Implementation of methods
pub mod method;
/// Implementation of field and method descriptors
pub mod signatures;
/// Well-known class and member names
pub mod symbols;
/// Commonly used metadata token type
pub mod token;
/// Implementation of the class type system
pub mod typesystem;
