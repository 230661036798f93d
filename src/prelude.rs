//! # vmlink Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the vmlink library. Import this module to get quick access to the essential
//! types for defining classes and resolving references against them.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all vmlink operations
pub use crate::Error;

/// The result type used throughout vmlink
pub use crate::Result;

// ================================================================================================
// Runtime
// ================================================================================================

/// Runtime context and its construction
pub use crate::runtime::{ResolverConfig, Runtime, RuntimeBuilder, ThreadRole};

/// Class initialization
pub use crate::runtime::{ClassInitializer, InitState, NoopInitializer};

/// Method handle collaborator and its results
pub use crate::runtime::{
    BootstrapSpecifier, LinkedTarget, MethodHandleFactory, UnavailableMethodHandles,
};

/// Heap object references
pub use crate::runtime::{Oop, OopRc};

// ================================================================================================
// Metadata
// ================================================================================================

/// Class type system
pub use crate::metadata::typesystem::{ClassBuilder, ClassRegistry, ClassType, ClassTypeRc};

/// Members
pub use crate::metadata::{
    field::{Field, FieldRc},
    method::{Method, MethodRc, VtableIndex},
};

/// Access flags
pub use crate::metadata::flags::AccessFlags;

/// Class loaders
pub use crate::metadata::loader::LoaderId;

/// Constant pools
pub use crate::metadata::constantpool::{ConstantPool, PoolBuilder};

/// Metadata token type
pub use crate::metadata::token::Token;

/// Descriptor basic types
pub use crate::metadata::signatures::BasicType;

// ================================================================================================
// Link Resolution
// ================================================================================================

/// Resolver and its inputs
pub use crate::link::{LinkInfo, LinkResolver};

/// Resolution results and the bytecodes they are requested for
pub use crate::link::{CallInfo, FieldAccessInfo, FieldAccessKind, InvokeKind};
