//! Class initialization state machine.
//!
//! Every class carries an [`InitMonitor`]: its [`InitState`] plus the thread currently running
//! the static initializer, guarded by a mutex and a condition variable.
//!
//! ```text
//! Allocated -> Loaded -> Linked -> BeingInitialized -> FullyInitialized
//!                                                   \-> InitializationError
//! ```
//!
//! Only one thread runs the static initializer of a class. Other threads block until it
//! finishes; the initializing thread itself may re-enter (a static initializer calling a static
//! method of its own class) and proceeds immediately. A class whose initializer failed stays in
//! the error state; everyone but the thread that observed the failure gets
//! `NoClassDefFoundError`.

use std::{
    sync::{Condvar, Mutex},
    thread::{self, ThreadId},
};

use strum::{Display, EnumIter};
use tracing::{debug, trace};

use crate::{
    metadata::typesystem::{ClassRegistry, ClassTypeRc},
    Error, Result,
};

/// Initialization state of a class, in lifecycle order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter)]
pub enum InitState {
    /// Created, not yet registered
    #[strum(serialize = "allocated")]
    Allocated,
    /// Registered with its defining loader
    #[strum(serialize = "loaded")]
    Loaded,
    /// Dispatch table computed
    #[strum(serialize = "linked")]
    Linked,
    /// A thread is running the static initializer
    #[strum(serialize = "being_initialized")]
    BeingInitialized,
    /// The static initializer completed
    #[strum(serialize = "fully_initialized")]
    FullyInitialized,
    /// The static initializer failed, terminal
    #[strum(serialize = "initialization_error")]
    InitializationError,
}

struct InitInner {
    state: InitState,
    thread: Option<ThreadId>,
}

/// Per-class initialization lock and state
pub struct InitMonitor {
    inner: Mutex<InitInner>,
    condvar: Condvar,
}

impl InitMonitor {
    /// A monitor in the `Allocated` state
    #[must_use]
    pub fn new() -> Self {
        InitMonitor {
            inner: Mutex::new(InitInner {
                state: InitState::Allocated,
                thread: None,
            }),
            condvar: Condvar::new(),
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> InitState {
        lock!(self.inner).state
    }

    /// The thread running the static initializer, if any
    #[must_use]
    pub fn initializing_thread(&self) -> Option<ThreadId> {
        lock!(self.inner).thread
    }

    /// Moves forward through the states preceding initialization; never moves backwards and
    /// never touches a class that started initializing.
    pub(crate) fn advance(&self, state: InitState) {
        let mut inner = lock!(self.inner);
        if inner.state < state && inner.state < InitState::BeingInitialized {
            inner.state = state;
        }
    }
}

impl Default for InitMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the static initializer of a class.
///
/// The runtime calls this at most once per class, on the thread that won the right to
/// initialize it, after the superclass has been initialized.
pub trait ClassInitializer: Send + Sync {
    /// Execute `<clinit>` of `class`
    ///
    /// # Errors
    /// Any error, which puts `class` into the erroneous state.
    fn run_static_initializer(&self, class: &ClassTypeRc) -> Result<()>;
}

impl<F> ClassInitializer for F
where
    F: Fn(&ClassTypeRc) -> Result<()> + Send + Sync,
{
    fn run_static_initializer(&self, class: &ClassTypeRc) -> Result<()> {
        self(class)
    }
}

/// Initializer for runtimes without bytecode execution; every `<clinit>` succeeds
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInitializer;

impl ClassInitializer for NoopInitializer {
    fn run_static_initializer(&self, _class: &ClassTypeRc) -> Result<()> {
        Ok(())
    }
}

/// Initializes `class`, linking it first and initializing its superclass before it.
///
/// Blocks while another thread initializes the class, returns immediately if the calling thread
/// is the one initializing it.
///
/// # Errors
/// - Linking errors of the class or its superclasses
/// - [`Error::ExceptionInInitializer`] for the thread whose initializer call failed
/// - [`Error::NoClassDefFound`] for any later attempt on a class in the error state
pub(crate) fn initialize(
    registry: &ClassRegistry,
    class: &ClassTypeRc,
    initializer: &dyn ClassInitializer,
) -> Result<()> {
    if class.is_initialized() {
        return Ok(());
    }
    registry.link_class(class)?;

    let current = thread::current().id();
    {
        let mut inner = lock!(class.init.inner);
        loop {
            match inner.state {
                InitState::FullyInitialized => return Ok(()),
                InitState::InitializationError => {
                    return Err(Error::NoClassDefFound(format!(
                        "Could not initialize class {}",
                        class.external_name()
                    )));
                }
                InitState::BeingInitialized if inner.thread == Some(current) => return Ok(()),
                InitState::BeingInitialized => {
                    trace!(class = %class.name, "waiting for initialization by another thread");
                    inner = wait!(class.init.condvar, inner);
                }
                _ => {
                    inner.state = InitState::BeingInitialized;
                    inner.thread = Some(current);
                    break;
                }
            }
        }
    }
    trace!(class = %class.name, "initialization started");

    let result = run_initialization(registry, class, initializer);

    let state = if result.is_ok() {
        InitState::FullyInitialized
    } else {
        InitState::InitializationError
    };
    {
        let mut inner = lock!(class.init.inner);
        inner.state = state;
        inner.thread = None;
    }
    class.init.condvar.notify_all();
    debug!(class = %class.name, state = %state, "initialization finished");

    result
}

fn run_initialization(
    registry: &ClassRegistry,
    class: &ClassTypeRc,
    initializer: &dyn ClassInitializer,
) -> Result<()> {
    if !class.is_interface() {
        if let Some(super_class) = &class.super_class {
            initialize(registry, super_class, initializer)?;
        }
    }

    initializer
        .run_static_initializer(class)
        .map_err(|cause| {
            if cause.is_linkage_error() {
                cause
            } else {
                Error::ExceptionInInitializer {
                    class: class.external_name(),
                    cause: Box::new(cause),
                }
            }
        })
}
