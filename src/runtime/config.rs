//! Resolver configuration
//!
//! This module provides the options that used to be process-wide switches in a virtual machine
//! and are passed to the resolver explicitly here.

use strum::{Display, EnumIter};

/// Configuration of a [`crate::runtime::Runtime`] and every resolver it creates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Enable method handle and dynamic call sites. When disabled, a signature-polymorphic
    /// method is resolved like any other native method and never through an intrinsic.
    pub enable_invoke_dynamic: bool,

    /// Allow `invokespecial` to bind to a superclass method without re-selecting it from the
    /// caller's superclass, for callers compiled without the `ACC_SUPER` flag
    pub allow_nonvirtual_calls: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            enable_invoke_dynamic: true,
            allow_nonvirtual_calls: false,
        }
    }
}

impl ResolverConfig {
    /// Configuration for a runtime without method handle support
    #[must_use]
    pub fn legacy() -> Self {
        Self {
            enable_invoke_dynamic: false,
            allow_nonvirtual_calls: false,
        }
    }

    /// Enable or disable handle and dynamic call sites
    #[must_use]
    pub fn with_invoke_dynamic(mut self, enabled: bool) -> Self {
        self.enable_invoke_dynamic = enabled;
        self
    }

    /// Enable or disable non-virtual super calls for `ACC_SUPER`-less callers
    #[must_use]
    pub fn with_nonvirtual_calls(mut self, allowed: bool) -> Self {
        self.allow_nonvirtual_calls = allowed;
        self
    }
}

/// The kind of thread a resolver runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ThreadRole {
    /// A thread executing bytecode, may call into the language runtime
    #[strum(serialize = "java")]
    Java,
    /// A compiler background thread, must never re-enter the language runtime
    #[strum(serialize = "compiler")]
    Compiler,
}

impl ThreadRole {
    /// Returns `true` if the thread may perform up-calls into the language runtime
    #[must_use]
    pub fn can_call_java(&self) -> bool {
        matches!(self, ThreadRole::Java)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();
        assert!(config.enable_invoke_dynamic);
        assert!(!config.allow_nonvirtual_calls);
        assert!(!ResolverConfig::legacy().enable_invoke_dynamic);
    }

    #[test]
    fn test_builders() {
        let config = ResolverConfig::default()
            .with_invoke_dynamic(false)
            .with_nonvirtual_calls(true);
        assert!(!config.enable_invoke_dynamic);
        assert!(config.allow_nonvirtual_calls);
    }

    #[test]
    fn test_thread_roles() {
        assert!(ThreadRole::Java.can_call_java());
        assert!(!ThreadRole::Compiler.can_call_java());
        assert_eq!(ThreadRole::Compiler.to_string(), "compiler");
    }
}
