// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![allow(clippy::too_many_arguments)]

//! # vmlink
//!
//! Symbolic link resolution for JVM-style managed runtimes.
//!
//! `vmlink` implements the part of a virtual machine that turns the symbolic references of a
//! class file (a class name plus a member name and descriptor) into the members an interpreter
//! or compiler actually calls or accesses. It covers method and field lookup along the
//! language's search orders, accessibility rules, loader constraints between class loaders,
//! virtual and interface dispatch selection, calls to signature-polymorphic method handle
//! methods, dynamic call sites, and class initialization as a side effect of resolution.
//!
//! ## Features
//!
//! - **Link-time and run-time phases** for `invokestatic`, `invokespecial`, `invokevirtual`,
//!   `invokeinterface`, method handle calls and `invokedynamic`
//! - **Loader constraints** recorded per class name and checked on every cross-loader reference
//! - **Vtables with miranda slots**, computed once when a class is linked
//! - **Thread-safe** registry, constant pool caches and class initialization
//! - **Compiler-friendly** `_or_null` entry points that never raise and never run user code
//!
//! ## Quick Start
//!
//! ```rust
//! use vmlink::prelude::*;
//!
//! let runtime = Runtime::new()?;
//! let registry = runtime.registry();
//!
//! let shape = ClassBuilder::new("demo/Shape")
//!     .with_flags(AccessFlags::PUBLIC | AccessFlags::ABSTRACT)
//!     .method("area", "()D", AccessFlags::PUBLIC | AccessFlags::ABSTRACT)
//!     .define(registry)?;
//! let square = ClassBuilder::new("demo/Square")
//!     .extends("demo/Shape")
//!     .method("area", "()D", AccessFlags::PUBLIC)
//!     .define(registry)?;
//!
//! let mut pool = PoolBuilder::new(&square);
//! let shape_ref = pool.class("demo/Shape");
//! let area = pool.method_ref(shape_ref, "area", "()D");
//! let pool = pool.build();
//!
//! let receiver = Oop::new(square.clone(), "square");
//! let call = runtime
//!     .resolver()
//!     .resolve_invoke(&pool, area, InvokeKind::Virtual, Some(&receiver))?;
//! assert_eq!(call.selected_method().holder_name(), "demo/Square");
//! # Ok::<(), vmlink::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`metadata`]: classes, members, descriptors, loaders, loader constraints and the constant
//!   pool, owned by the [`metadata::typesystem::ClassRegistry`]
//! - [`runtime`]: the [`runtime::Runtime`] context with configuration, class initialization and
//!   the method handle collaborator
//! - [`link`]: the [`link::LinkResolver`] and its results
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`]. Every language-level failure maps to the
//! exception the virtual machine raises for it, see [`Error::exception_class`].

#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust
/// use vmlink::prelude::*;
///
/// let runtime = RuntimeBuilder::new().config(ResolverConfig::legacy()).build()?;
/// assert!(!runtime.config().enable_invoke_dynamic);
/// # Ok::<(), vmlink::Error>(())
/// ```
pub mod prelude;

/// Class metadata the resolver runs against.
///
/// # Key Components
///
/// - [`metadata::typesystem`] - Classes, the registry owning them, vtables
/// - [`metadata::method`] / [`metadata::field`] - Members and their dispatch information
/// - [`metadata::signatures`] - Descriptor parsing and basic-type erasure
/// - [`metadata::loader`] / [`metadata::constraints`] - Class loaders, their dependencies and
///   the loader constraint table
/// - [`metadata::constantpool`] - Symbolic references of a class and their resolution caches
pub mod metadata;

/// Runtime context: configuration, class initialization and method handle up-calls.
pub mod runtime;

/// Link resolution of method and field references.
pub mod link;

/// `vmlink` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `vmlink` Error type
///
/// # Examples
///
/// ```rust
/// use vmlink::{prelude::*, Error};
///
/// let runtime = Runtime::new()?;
/// let object = runtime.registry().object_class()?;
/// let link = LinkInfo::unchecked(&object, "missing", "()V");
/// match runtime.resolver().resolve_method(&link) {
///     Err(Error::NoSuchMethod { message, .. }) => assert_eq!(message, "java.lang.Object.missing()V"),
///     other => panic!("unexpected {other:?}"),
/// }
/// # Ok::<(), vmlink::Error>(())
/// ```
pub use error::Error;
