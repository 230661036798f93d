//! Test doubles for the runtime collaborators.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use crate::{
    metadata::{
        flags::AccessFlags,
        loader::LoaderId,
        signatures, symbols,
        typesystem::{ClassBuilder, ClassRegistry, ClassTypeRc},
    },
    runtime::{
        methodhandles::{BootstrapSpecifier, LinkedTarget, MethodHandleFactory},
        oop::Oop,
    },
    Error, Result,
};

/// Method handle factory that spins one adapter class per up-call and counts the up-calls.
///
/// Adapters take the call-site arguments plus the appendix, erased to basic types.
#[derive(Debug, Default)]
pub struct RecordingMethodHandles {
    /// Number of generic invokers linked
    pub invokers: Arc<AtomicUsize>,
    /// Number of bootstrap methods run
    pub call_sites: Arc<AtomicUsize>,
    spun: AtomicUsize,
    fail: bool,
}

impl RecordingMethodHandles {
    /// A factory whose up-calls all fail with an `IllegalAccessError`
    pub fn failing() -> Self {
        RecordingMethodHandles {
            fail: true,
            ..Default::default()
        }
    }

    fn spin_adapter(
        &self,
        registry: &ClassRegistry,
        name: &str,
        signature: &str,
    ) -> Result<LinkedTarget> {
        if self.fail {
            return Err(Error::IllegalAccess(format!("no adapter for {name}{signature}")));
        }

        let close = signature
            .rfind(')')
            .ok_or_else(|| malformed_error!("Invalid method descriptor {}", signature))?;
        let with_appendix = format!(
            "{}L{};{}",
            &signature[..close],
            symbols::OBJECT,
            &signature[close..]
        );
        let erased = signatures::basic_type_signature(&with_appendix, false)?;

        let serial = self.spun.fetch_add(1, Ordering::SeqCst);
        let holder = ClassBuilder::new(&format!("java/lang/invoke/LambdaForm$MH{serial}"))
            .with_flags(AccessFlags::FINAL | AccessFlags::SUPER)
            .method(name, &erased, AccessFlags::STATIC | AccessFlags::FINAL)
            .define(registry)?;
        let method = holder
            .find_method(name, &erased)
            .ok_or_else(|| Error::Internal(format!("adapter {name}{erased} was not defined")))?;

        let appendix = Oop::new(registry.object_class()?, format!("{name} appendix"));
        let method_type = Oop::new(
            registry.resolve_class(symbols::METHOD_TYPE, LoaderId::BOOTSTRAP)?,
            signature,
        );
        Ok(LinkedTarget::with_appendix(method, appendix, method_type))
    }
}

impl MethodHandleFactory for RecordingMethodHandles {
    fn link_method(
        &self,
        registry: &ClassRegistry,
        _holder: &ClassTypeRc,
        name: &str,
        signature: &str,
        _caller: Option<&ClassTypeRc>,
    ) -> Result<LinkedTarget> {
        self.invokers.fetch_add(1, Ordering::SeqCst);
        self.spin_adapter(registry, name, signature)
    }

    fn link_call_site(
        &self,
        registry: &ClassRegistry,
        _caller: &ClassTypeRc,
        _bootstrap: &BootstrapSpecifier,
        name: &str,
        signature: &str,
    ) -> Result<LinkedTarget> {
        self.call_sites.fetch_add(1, Ordering::SeqCst);
        self.spin_adapter(registry, name, signature)
    }
}
