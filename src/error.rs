use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Most variants correspond one-to-one to a language-level exception that the interpreter or
/// compiler must raise on behalf of the resolver. The remaining variants report malformed input
/// handed to the resolver by its collaborators (bad descriptors, bad constant-pool indices) or
/// failures of internal synchronization.
///
/// # Error Categories
///
/// ## Structural mismatch
/// - [`Error::IncompatibleClassChange`] - class found where an interface was expected (or vice
///   versa), static-ness mismatch, receiver not implementing the resolved interface
///
/// ## Not found
/// - [`Error::NoSuchMethod`] - no member after the full search, optionally carrying the failure
///   of the polymorphic-signature fallback as nested cause
/// - [`Error::NoSuchField`] - no field after the full search
/// - [`Error::NoClassDefFound`] - a symbolic class reference could not be resolved, or the class
///   is in the erroneous initialization state
///
/// ## Abstract target
/// - [`Error::AbstractMethod`] - the selected member has no implementation
///
/// ## Access denied
/// - [`Error::IllegalAccess`] - visibility rule violation
///
/// ## Loader inconsistency
/// - [`Error::LoaderConstraint`] - two loaders disagree on a signature's component type
/// - [`Error::BootstrapMethod`] - binding of a dynamic call site failed
///
/// ## Other language-level failures
/// - [`Error::NullPointer`] - null receiver, only when the caller asked for the check
/// - [`Error::ExceptionInInitializer`] - the static initializer of a class failed
/// - [`Error::Internal`] - internal error of the language runtime (missing intrinsic template)
///
/// # Examples
///
/// ```rust
/// use vmlink::Error;
///
/// let error = Error::AbstractMethod("Shape.area()D".to_string());
/// assert_eq!(error.exception_class(), "java/lang/AbstractMethodError");
/// assert!(error.is_linkage_error());
/// ```
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// A type of the wrong category was found where a member reference expected a class or an
    /// interface, or the static-ness of a member does not match the access.
    #[error("IncompatibleClassChangeError: {0}")]
    IncompatibleClassChange(String),

    /// No method matched after the complete search order.
    ///
    /// When the polymorphic-signature fallback failed while searching, its error is kept as
    /// the nested cause.
    #[error("NoSuchMethodError: {message}")]
    NoSuchMethod {
        /// `Class.name(signature)` of the reference that failed
        message: String,
        /// Failure of the fallback lookup, if there was one
        #[source]
        cause: Option<Box<Error>>,
    },

    /// No field matched after the complete search order.
    #[error("NoSuchFieldError: {0}")]
    NoSuchField(String),

    /// The selected method is abstract, or no implementation was found at run-time.
    #[error("AbstractMethodError: {0}")]
    AbstractMethod(String),

    /// A visibility rule was violated.
    #[error("IllegalAccessError: {0}")]
    IllegalAccess(String),

    /// Two class loaders resolve a name used in a signature to different classes.
    #[error("LinkageError: {0}")]
    LoaderConstraint(String),

    /// Binding a dynamic call site failed.
    #[error("BootstrapMethodError: {message}")]
    BootstrapMethod {
        /// Description of the call site
        message: String,
        /// The original failure of the bootstrap protocol
        #[source]
        cause: Box<Error>,
    },

    /// The receiver of an instance call was null.
    #[error("NullPointerException")]
    NullPointer,

    /// A class could not be found, or it is in the erroneous initialization state.
    #[error("NoClassDefFoundError: {0}")]
    NoClassDefFound(String),

    /// The static initializer of a class failed.
    #[error("ExceptionInInitializerError: {class}")]
    ExceptionInInitializer {
        /// External name of the class whose initializer failed
        class: String,
        /// The failure raised by the initializer
        #[source]
        cause: Box<Error>,
    },

    /// Internal error of the language runtime.
    #[error("InternalError: {0}")]
    Internal(String),

    /// Input handed to the resolver is damaged and could not be interpreted.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Failed to lock target.
    #[error("Failed to lock target")]
    LockError,
}

impl Error {
    /// Builds a [`Error::NoSuchMethod`] without nested cause.
    pub fn no_such_method(message: impl Into<String>) -> Self {
        Error::NoSuchMethod {
            message: message.into(),
            cause: None,
        }
    }

    /// Binary name of the exception class the interpreter has to raise for this error.
    ///
    /// `Malformed` and `LockError` are reported as `java/lang/InternalError`; they never
    /// originate from user code.
    #[must_use]
    pub fn exception_class(&self) -> &'static str {
        match self {
            Error::IncompatibleClassChange(_) => "java/lang/IncompatibleClassChangeError",
            Error::NoSuchMethod { .. } => "java/lang/NoSuchMethodError",
            Error::NoSuchField(_) => "java/lang/NoSuchFieldError",
            Error::AbstractMethod(_) => "java/lang/AbstractMethodError",
            Error::IllegalAccess(_) => "java/lang/IllegalAccessError",
            Error::LoaderConstraint(_) => "java/lang/LinkageError",
            Error::BootstrapMethod { .. } => "java/lang/BootstrapMethodError",
            Error::NullPointer => "java/lang/NullPointerException",
            Error::NoClassDefFound(_) => "java/lang/NoClassDefFoundError",
            Error::ExceptionInInitializer { .. } => "java/lang/ExceptionInInitializerError",
            Error::Internal(_) | Error::Malformed { .. } | Error::LockError => {
                "java/lang/InternalError"
            }
        }
    }

    /// Returns `true` for the errors that are subclasses of `java/lang/LinkageError`.
    #[must_use]
    pub fn is_linkage_error(&self) -> bool {
        matches!(
            self,
            Error::IncompatibleClassChange(_)
                | Error::NoSuchMethod { .. }
                | Error::NoSuchField(_)
                | Error::AbstractMethod(_)
                | Error::IllegalAccess(_)
                | Error::LoaderConstraint(_)
                | Error::BootstrapMethod { .. }
                | Error::NoClassDefFound(_)
                | Error::ExceptionInInitializer { .. }
        )
    }

    /// The nested cause carried by this error, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&Error> {
        match self {
            Error::NoSuchMethod { cause, .. } => cause.as_deref(),
            Error::BootstrapMethod { cause, .. } | Error::ExceptionInInitializer { cause, .. } => {
                Some(cause)
            }
            _ => None,
        }
    }
}
