//! Well-known class and member names the resolver compares against.

/// Root of the class hierarchy
pub const OBJECT: &str = "java/lang/Object";
/// Marker interface implemented by every array class
pub const CLONEABLE: &str = "java/lang/Cloneable";
/// Second marker interface implemented by every array class
pub const SERIALIZABLE: &str = "java/io/Serializable";
/// Holder of the signature-polymorphic methods
pub const METHOD_HANDLE: &str = "java/lang/invoke/MethodHandle";
/// Class of the method-type values bound to handle and dynamic call sites
pub const METHOD_TYPE: &str = "java/lang/invoke/MethodType";
/// Entry class of the language runtime's method-handle up-calls
pub const METHOD_HANDLE_NATIVES: &str = "java/lang/invoke/MethodHandleNatives";

/// Instance initializer name
pub const OBJECT_INITIALIZER: &str = "<init>";
/// Static initializer name
pub const CLASS_INITIALIZER: &str = "<clinit>";
/// `Object.clone`, public on arrays
pub const CLONE: &str = "clone";

/// Generic invoker with type-checking semantics
pub const INVOKE: &str = "invoke";
/// Generic invoker requiring an exact type match
pub const INVOKE_EXACT: &str = "invokeExact";
/// Basic invoker without type checks
pub const INVOKE_BASIC: &str = "invokeBasic";
/// Static linker for virtual targets
pub const LINK_TO_VIRTUAL: &str = "linkToVirtual";
/// Static linker for static targets
pub const LINK_TO_STATIC: &str = "linkToStatic";
/// Static linker for special targets
pub const LINK_TO_SPECIAL: &str = "linkToSpecial";
/// Static linker for interface targets
pub const LINK_TO_INTERFACE: &str = "linkToInterface";

/// Converts an internal name (`java/lang/Object`) to its external form (`java.lang.Object`)
#[must_use]
pub fn external_name(name: &str) -> String {
    name.replace('/', ".")
}
