//! Symbolic link resolution.
//!
//! This module turns the symbolic references of a class (method and field references in its
//! constant pool) into the concrete members and dispatch information an interpreter or
//! compiler needs to execute a call or field access.
//!
//! # Key Components
//!
//! - [`LinkResolver`]: link-time and run-time resolution for every invoke kind
//! - [`CallInfo`] / [`FieldAccessInfo`]: results of invoke and field resolution
//! - [`access`]: accessibility rules for classes and members
//! - [`lookup`]: member search orders over the class hierarchy
//! - [`polymorphic`]: linking of signature-polymorphic `MethodHandle` calls
//!
//! # Resolution by invoke kind
//!
//! | Kind | Link time | Run time |
//! |------|-----------|----------|
//! | `invokestatic` | method resolution, must be static | initialize the declaring class |
//! | `invokespecial` | method resolution, constructors must be declared | super-call re-selection |
//! | `invokevirtual` | method resolution, must not be static | vtable (or miranda) slot of the receiver |
//! | `invokeinterface` | interface method resolution | lookup from the receiver class |
//! | `invokehandle` | signature-polymorphic linking | - |
//! | `invokedynamic` | bootstrap method, bound once per call site | - |

pub mod access;
pub mod callinfo;
mod field;
mod invoke;
pub mod lookup;
pub mod polymorphic;
mod resolver;

pub use callinfo::{CallInfo, FieldAccessInfo, FieldAccessKind, InvokeKind};
pub use resolver::{LinkInfo, LinkResolver};
