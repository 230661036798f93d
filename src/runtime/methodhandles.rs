//! Up-calls into the language runtime's method handle machinery.
//!
//! Generic method handle invokers (`MethodHandle.invoke`, `invokeExact`) and dynamic call sites
//! are linked by code running in the language runtime itself: it synthesizes an adapter method
//! and hands back an *appendix* object, and the method type the adapter was specialized for.
//! The resolver reaches that code through the [`MethodHandleFactory`] trait.

use std::fmt;

use crate::{
    metadata::{method::MethodRc, symbols, typesystem::{ClassRegistry, ClassTypeRc}},
    runtime::oop::OopRc,
    Error, Result,
};

/// Outcome of linking a method handle invoker or a dynamic call site
#[derive(Clone)]
pub struct LinkedTarget {
    /// The adapter or intrinsic to call
    pub method: MethodRc,
    /// Extra trailing argument pushed by the invocation stub
    pub appendix: Option<OopRc>,
    /// Method type the target was specialized for
    pub method_type: Option<OopRc>,
}

impl LinkedTarget {
    /// A target without appendix and method type
    #[must_use]
    pub fn method(method: MethodRc) -> Self {
        LinkedTarget {
            method,
            appendix: None,
            method_type: None,
        }
    }

    /// A target with its appendix and method type
    #[must_use]
    pub fn with_appendix(method: MethodRc, appendix: OopRc, method_type: OopRc) -> Self {
        LinkedTarget {
            method,
            appendix: Some(appendix),
            method_type: Some(method_type),
        }
    }
}

impl fmt::Debug for LinkedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedTarget")
            .field("method", &self.method.qualified_name())
            .field("appendix", &self.appendix)
            .field("method_type", &self.method_type)
            .finish()
    }
}

/// Bootstrap method and static arguments of a dynamic call site
#[derive(Debug, Clone)]
pub struct BootstrapSpecifier {
    /// The bootstrap method handle
    pub method: OopRc,
    /// Static arguments, already resolved to objects
    pub static_args: Vec<OopRc>,
}

/// The language runtime's method handle linkage entry points.
///
/// Implementations run user code (bootstrap methods, lambda form spinning). They are only ever
/// called from threads allowed to re-enter the language runtime.
pub trait MethodHandleFactory: Send + Sync {
    /// Links a generic invoker such as `MethodHandle.invoke` for one call-site signature.
    ///
    /// ## Arguments
    /// * 'registry'  - Class registry of the runtime
    /// * 'holder'    - Class declaring the invoker
    /// * 'name'      - Invoker name
    /// * 'signature' - Full signature at the call site
    /// * 'caller'    - Class containing the call site
    ///
    /// # Errors
    /// Any error of the adapter generation.
    fn link_method(
        &self,
        registry: &ClassRegistry,
        holder: &ClassTypeRc,
        name: &str,
        signature: &str,
        caller: Option<&ClassTypeRc>,
    ) -> Result<LinkedTarget>;

    /// Runs the bootstrap method of a dynamic call site and links its target.
    ///
    /// # Errors
    /// Any error thrown by the bootstrap method.
    fn link_call_site(
        &self,
        registry: &ClassRegistry,
        caller: &ClassTypeRc,
        bootstrap: &BootstrapSpecifier,
        name: &str,
        signature: &str,
    ) -> Result<LinkedTarget>;
}

/// Factory of a runtime without a method handle implementation; every up-call fails
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableMethodHandles;

impl UnavailableMethodHandles {
    fn unavailable() -> Error {
        Error::NoClassDefFound(symbols::external_name(symbols::METHOD_HANDLE_NATIVES))
    }
}

impl MethodHandleFactory for UnavailableMethodHandles {
    fn link_method(
        &self,
        _registry: &ClassRegistry,
        _holder: &ClassTypeRc,
        _name: &str,
        _signature: &str,
        _caller: Option<&ClassTypeRc>,
    ) -> Result<LinkedTarget> {
        Err(Self::unavailable())
    }

    fn link_call_site(
        &self,
        _registry: &ClassRegistry,
        _caller: &ClassTypeRc,
        _bootstrap: &BootstrapSpecifier,
        _name: &str,
        _signature: &str,
    ) -> Result<LinkedTarget> {
        Err(Self::unavailable())
    }
}
