//! Runtime context of the resolver.
//!
//! A [`Runtime`] bundles everything resolution needs besides the symbolic reference itself:
//!
//! - the [`ClassRegistry`] with all loaded classes, loaders and loader constraints
//! - the [`ResolverConfig`]
//! - the [`ClassInitializer`] that runs static initializers
//! - the [`MethodHandleFactory`] answering up-calls for generic invokers and dynamic call sites
//!
//! Resolvers borrow the runtime; they are cheap and are created per thread through
//! [`Runtime::resolver`] or [`Runtime::compiler_resolver`].
//!
//! # Examples
//!
//! ```rust
//! use vmlink::prelude::*;
//!
//! let runtime = RuntimeBuilder::new()
//!     .config(ResolverConfig::default().with_nonvirtual_calls(true))
//!     .build()?;
//! let object = runtime.registry().object_class()?;
//! runtime.initialize(&object)?;
//! assert!(object.is_initialized());
//! # Ok::<(), vmlink::Error>(())
//! ```

pub mod config;
pub mod init;
pub mod methodhandles;
pub mod oop;

use std::sync::Arc;

pub use config::{ResolverConfig, ThreadRole};
pub use init::{ClassInitializer, InitState, NoopInitializer};
pub use methodhandles::{
    BootstrapSpecifier, LinkedTarget, MethodHandleFactory, UnavailableMethodHandles,
};
pub use oop::{Oop, OopRc};

use crate::{
    link::LinkResolver,
    metadata::typesystem::{ClassRegistry, ClassTypeRc},
    Result,
};

/// Registry, configuration and collaborators shared by all resolvers
pub struct Runtime {
    registry: Arc<ClassRegistry>,
    config: ResolverConfig,
    initializer: Arc<dyn ClassInitializer>,
    method_handles: Arc<dyn MethodHandleFactory>,
}

impl Runtime {
    /// A runtime with default configuration and collaborators
    ///
    /// # Errors
    /// See [`ClassRegistry::new`].
    pub fn new() -> Result<Self> {
        RuntimeBuilder::new().build()
    }

    /// The class registry
    #[must_use]
    pub fn registry(&self) -> &Arc<ClassRegistry> {
        &self.registry
    }

    /// The configuration
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// The method handle factory
    #[must_use]
    pub fn method_handles(&self) -> &dyn MethodHandleFactory {
        self.method_handles.as_ref()
    }

    /// A resolver for a thread executing bytecode
    #[must_use]
    pub fn resolver(&self) -> LinkResolver<'_> {
        LinkResolver::new(self, ThreadRole::Java)
    }

    /// A resolver for a compiler thread; it never calls into the language runtime
    #[must_use]
    pub fn compiler_resolver(&self) -> LinkResolver<'_> {
        LinkResolver::new(self, ThreadRole::Compiler)
    }

    /// Initialize `class` and its superclasses
    ///
    /// # Errors
    /// Linking errors, [`crate::Error::ExceptionInInitializer`] or
    /// [`crate::Error::NoClassDefFound`] for a class in the error state.
    pub fn initialize(&self, class: &ClassTypeRc) -> Result<()> {
        init::initialize(&self.registry, class, self.initializer.as_ref())
    }
}

/// Fluent construction of a [`Runtime`]
pub struct RuntimeBuilder {
    registry: Option<Arc<ClassRegistry>>,
    config: ResolverConfig,
    initializer: Arc<dyn ClassInitializer>,
    method_handles: Arc<dyn MethodHandleFactory>,
}

impl RuntimeBuilder {
    /// Default configuration, no-op initializer, no method handle support
    #[must_use]
    pub fn new() -> Self {
        RuntimeBuilder {
            registry: None,
            config: ResolverConfig::default(),
            initializer: Arc::new(NoopInitializer),
            method_handles: Arc::new(UnavailableMethodHandles),
        }
    }

    /// Use an existing registry instead of bootstrapping a new one
    #[must_use]
    pub fn registry(mut self, registry: Arc<ClassRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the configuration
    #[must_use]
    pub fn config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the static initializer runner
    #[must_use]
    pub fn initializer(mut self, initializer: impl ClassInitializer + 'static) -> Self {
        self.initializer = Arc::new(initializer);
        self
    }

    /// Set the method handle factory
    #[must_use]
    pub fn method_handles(mut self, factory: impl MethodHandleFactory + 'static) -> Self {
        self.method_handles = Arc::new(factory);
        self
    }

    /// Build the runtime
    ///
    /// # Errors
    /// See [`ClassRegistry::new`].
    pub fn build(self) -> Result<Runtime> {
        let registry = match self.registry {
            Some(registry) => registry,
            None => Arc::new(ClassRegistry::new()?),
        };
        Ok(Runtime {
            registry,
            config: self.config,
            initializer: self.initializer,
            method_handles: self.method_handles,
        })
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
