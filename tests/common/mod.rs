//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    thread,
    time::Duration,
};

use tracing_subscriber::EnvFilter;
use vmlink::{metadata::symbols, prelude::*};

/// Installs a test-writer subscriber when `RUST_LOG` is set. Later calls are no-ops.
pub fn init_tracing() {
    if std::env::var("RUST_LOG").is_err() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A small class hierarchy with an abstract class, an interface and two implementations:
///
/// ```text
/// demo/Shape (abstract)    demo/Drawable (interface)
///    |-- demo/Circle  implements Drawable
///    `-- demo/Square  implements Drawable, inherits draw() from Shape
/// demo/Lambdas             holds the targets bound by call sites
/// ```
pub fn define_shapes(registry: &ClassRegistry) -> Result<()> {
    ClassBuilder::new("demo/Drawable")
        .with_flags(AccessFlags::PUBLIC | AccessFlags::INTERFACE | AccessFlags::ABSTRACT)
        .method("draw", "()V", AccessFlags::PUBLIC | AccessFlags::ABSTRACT)
        .method("scale", "(I)V", AccessFlags::PUBLIC | AccessFlags::ABSTRACT)
        .define(registry)?;
    ClassBuilder::new("demo/Shape")
        .with_flags(AccessFlags::PUBLIC | AccessFlags::SUPER | AccessFlags::ABSTRACT)
        .field("sides", "I", AccessFlags::PROTECTED)
        .field("COUNT", "I", AccessFlags::PUBLIC | AccessFlags::STATIC)
        .method("<init>", "()V", AccessFlags::PUBLIC)
        .method("area", "()D", AccessFlags::PUBLIC | AccessFlags::ABSTRACT)
        .method("draw", "()V", AccessFlags::PUBLIC)
        .method("describe", "()Ljava/lang/String;", AccessFlags::PUBLIC)
        .method("unit", "()Ldemo/Shape;", AccessFlags::PUBLIC | AccessFlags::STATIC)
        .define(registry)?;
    ClassBuilder::new("demo/Circle")
        .extends("demo/Shape")
        .implements("demo/Drawable")
        .field("radius", "D", AccessFlags::PRIVATE)
        .method("<init>", "()V", AccessFlags::PUBLIC)
        .method("area", "()D", AccessFlags::PUBLIC)
        .method("draw", "()V", AccessFlags::PUBLIC)
        .method("scale", "(I)V", AccessFlags::PUBLIC)
        .method("describe", "()Ljava/lang/String;", AccessFlags::PUBLIC)
        .define(registry)?;
    ClassBuilder::new("demo/Square")
        .extends("demo/Shape")
        .implements("demo/Drawable")
        .method("<init>", "()V", AccessFlags::PUBLIC)
        .method("area", "()D", AccessFlags::PUBLIC)
        .define(registry)?;
    ClassBuilder::new("demo/Lambdas")
        .with_flags(AccessFlags::FINAL | AccessFlags::SUPER)
        .method(
            "lambda$0",
            "(Ljava/lang/Object;)Ljava/lang/Object;",
            AccessFlags::PRIVATE | AccessFlags::STATIC,
        )
        .define(registry)?;
    Ok(())
}

/// Looks up a class defined by the bootstrap loader
pub fn class(runtime: &Runtime, name: &str) -> ClassTypeRc {
    runtime
        .registry()
        .find_class(name, LoaderId::BOOTSTRAP)
        .unwrap_or_else(|| panic!("{name} is not defined"))
}

/// Runtime over [`define_shapes`] that records what it initializes and bootstraps
pub struct Fixture {
    pub runtime: Runtime,
    /// Names of the classes whose static initializer ran, in order
    pub initialized: Arc<Mutex<Vec<String>>>,
    /// Number of bootstrap method runs
    pub call_sites: Arc<AtomicUsize>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(ResolverConfig::default())
    }

    pub fn with_config(config: ResolverConfig) -> Self {
        init_tracing();
        let registry = ClassRegistry::new().unwrap();
        define_shapes(&registry).unwrap();

        let initialized = Arc::new(Mutex::new(Vec::new()));
        let log = initialized.clone();
        let bootstrap = LambdaFactory::default();
        let call_sites = bootstrap.call_sites.clone();

        let runtime = RuntimeBuilder::new()
            .registry(Arc::new(registry))
            .config(config)
            .initializer(move |class: &ClassTypeRc| {
                thread::sleep(Duration::from_millis(2));
                log.lock().unwrap().push(class.name.clone());
                Ok(())
            })
            .method_handles(bootstrap)
            .build()
            .unwrap();
        Fixture {
            runtime,
            initialized,
            call_sites,
        }
    }

    pub fn class(&self, name: &str) -> ClassTypeRc {
        class(&self.runtime, name)
    }

    /// How often the static initializer of `name` ran
    pub fn initializations_of(&self, name: &str) -> usize {
        self.initialized
            .lock()
            .unwrap()
            .iter()
            .filter(|initialized| initialized.as_str() == name)
            .count()
    }

    pub fn bootstraps(&self) -> usize {
        self.call_sites.load(Ordering::SeqCst)
    }
}

/// Binds every call site to `demo/Lambdas.lambda$0` and counts the bootstrap runs
#[derive(Debug, Default)]
pub struct LambdaFactory {
    pub call_sites: Arc<AtomicUsize>,
}

impl MethodHandleFactory for LambdaFactory {
    fn link_method(
        &self,
        _registry: &ClassRegistry,
        _holder: &ClassTypeRc,
        name: &str,
        signature: &str,
        _caller: Option<&ClassTypeRc>,
    ) -> Result<LinkedTarget> {
        Err(Error::IllegalAccess(format!("no invoker for {name}{signature}")))
    }

    fn link_call_site(
        &self,
        registry: &ClassRegistry,
        caller: &ClassTypeRc,
        _bootstrap: &BootstrapSpecifier,
        _name: &str,
        signature: &str,
    ) -> Result<LinkedTarget> {
        self.call_sites.fetch_add(1, Ordering::SeqCst);
        let lambdas = registry.resolve_class("demo/Lambdas", caller.loader)?;
        let method = lambdas
            .find_method("lambda$0", "(Ljava/lang/Object;)Ljava/lang/Object;")
            .ok_or_else(|| Error::no_such_method("demo.Lambdas.lambda$0"))?;
        let appendix = Oop::new(registry.object_class()?, "call site");
        let method_type = Oop::new(
            registry.resolve_class(symbols::METHOD_TYPE, LoaderId::BOOTSTRAP)?,
            signature,
        );
        Ok(LinkedTarget::with_appendix(method, appendix, method_type))
    }
}

/// A bootstrap specifier with a placeholder method handle
pub fn bootstrap_specifier(runtime: &Runtime) -> BootstrapSpecifier {
    let handle = runtime.registry().method_handle_class().unwrap();
    BootstrapSpecifier {
        method: Oop::new(handle, "LambdaMetafactory.metafactory"),
        static_args: Vec::new(),
    }
}
