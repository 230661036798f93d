//! Central class registry.
//!
//! This module provides the `ClassRegistry`, the thread-safe owner of every loaded class. It is
//! the arena the rest of the crate hands out `Arc` handles from, and the dictionary that answers
//! "which class does loader L see under name N".
//!
//! # Registry Architecture
//!
//! - **Token-based storage**: primary arena keyed by class token (`SkipMap`)
//! - **Loader dictionary**: `(loader, name)` to class, for defining and initiating loaders
//!   (`DashMap`)
//! - **Loaders**: the loader tree with its dependency lists
//! - **Loader constraints**: the global constraint table
//! - **Intrinsic cache**: synthesized method handle intrinsics per basic signature
//!
//! # Thread Safety
//!
//! The registry is designed for concurrent resolution:
//! - Lock-free data structures for primary storage (`SkipMap`)
//! - Concurrent hash maps for indices (`DashMap`)
//! - Atomic operations for token generation
//! - Linking is serialized per class; dispatch tables are immutable once installed
//!
//! # Bootstrap classes
//!
//! A new registry already contains, on the bootstrap loader, `java/lang/Object`,
//! `java/lang/Cloneable`, `java/io/Serializable`, `java/lang/invoke/MethodHandle` with its
//! signature-polymorphic declarations, and `java/lang/invoke/MethodType`.

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use crossbeam_skiplist::SkipMap;
use dashmap::{mapref::entry::Entry, DashMap};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::{
    metadata::{
        constraints::LoaderConstraintTable,
        field::{Field, FieldRc},
        flags::AccessFlags,
        loader::{LoaderId, LoaderRegistry},
        method::{IntrinsicId, Method, MethodRc, VtableIndex},
        signatures::{self, BasicType},
        symbols,
        token::{Token, TABLE_CLASS, TABLE_FIELD, TABLE_METHOD},
        typesystem::{
            ArrayElement, ClassBuilder, ClassKind, ClassType, ClassTypeRc, ClassTypeRef, Vtable,
        },
    },
    runtime::init::InitState,
    Error, Result,
};

/// Size of the object header preceding the first instance field
pub const OBJECT_HEADER_SIZE: usize = 16;

/// Descriptor shared by the declared signature-polymorphic methods
const POLYMORPHIC_DESCRIPTOR: &str = "([Ljava/lang/Object;)Ljava/lang/Object;";

/// Owner of every loaded class, the loader tree and the loader constraints.
pub struct ClassRegistry {
    classes: SkipMap<Token, ClassTypeRc>,
    dictionary: DashMap<(LoaderId, String), ClassTypeRc>,
    next_class: AtomicU32,
    next_method: AtomicU32,
    next_field: AtomicU32,
    loaders: LoaderRegistry,
    constraints: LoaderConstraintTable,
    intrinsics: DashMap<(IntrinsicId, String), MethodRc>,
}

impl ClassRegistry {
    /// Create a registry with the bootstrap classes defined
    ///
    /// # Errors
    /// Returns an error if the bootstrap class definitions are rejected, which indicates a bug.
    pub fn new() -> Result<Self> {
        let registry = ClassRegistry {
            classes: SkipMap::new(),
            dictionary: DashMap::new(),
            next_class: AtomicU32::new(1),
            next_method: AtomicU32::new(1),
            next_field: AtomicU32::new(1),
            loaders: LoaderRegistry::new(),
            constraints: LoaderConstraintTable::new(),
            intrinsics: DashMap::new(),
        };
        registry.initialize_bootstrap_classes()?;
        Ok(registry)
    }

    fn initialize_bootstrap_classes(&self) -> Result<()> {
        let public = AccessFlags::PUBLIC;
        let native = AccessFlags::NATIVE;
        let final_ = AccessFlags::FINAL;

        ClassBuilder::new(symbols::OBJECT)
            .without_super()
            .method(symbols::OBJECT_INITIALIZER, "()V", public)
            .method("getClass", "()Ljava/lang/Class;", public | final_ | native)
            .method("hashCode", "()I", public | native)
            .method("equals", "(Ljava/lang/Object;)Z", public)
            .method(
                symbols::CLONE,
                "()Ljava/lang/Object;",
                AccessFlags::PROTECTED | native,
            )
            .method("toString", "()Ljava/lang/String;", public)
            .method("notify", "()V", public | final_ | native)
            .method("wait", "()V", public | final_)
            .method("finalize", "()V", AccessFlags::PROTECTED)
            .define(self)?;

        ClassBuilder::interface(symbols::CLONEABLE).define(self)?;
        ClassBuilder::interface(symbols::SERIALIZABLE).define(self)?;

        let generic = public | final_ | native | AccessFlags::VARARGS;
        let linker = AccessFlags::STATIC | native;
        ClassBuilder::new(symbols::METHOD_HANDLE)
            .with_flags(public | AccessFlags::SUPER | AccessFlags::ABSTRACT)
            .method(symbols::INVOKE_EXACT, POLYMORPHIC_DESCRIPTOR, generic)
            .method(symbols::INVOKE, POLYMORPHIC_DESCRIPTOR, generic)
            .method(symbols::INVOKE_BASIC, POLYMORPHIC_DESCRIPTOR, final_ | native)
            .method(symbols::LINK_TO_VIRTUAL, POLYMORPHIC_DESCRIPTOR, linker)
            .method(symbols::LINK_TO_STATIC, POLYMORPHIC_DESCRIPTOR, linker)
            .method(symbols::LINK_TO_SPECIAL, POLYMORPHIC_DESCRIPTOR, linker)
            .method(symbols::LINK_TO_INTERFACE, POLYMORPHIC_DESCRIPTOR, linker)
            .method("type", "()Ljava/lang/invoke/MethodType;", public)
            .define(self)?;

        ClassBuilder::new(symbols::METHOD_TYPE)
            .with_flags(public | final_ | AccessFlags::SUPER)
            .define(self)?;

        Ok(())
    }

    fn next_token(counter: &AtomicU32, table: u8) -> Token {
        Token::from_parts(table, counter.fetch_add(1, Ordering::Relaxed))
    }

    /// The loader tree
    #[must_use]
    pub fn loaders(&self) -> &LoaderRegistry {
        &self.loaders
    }

    /// The global loader constraint table
    #[must_use]
    pub fn constraints(&self) -> &LoaderConstraintTable {
        &self.constraints
    }

    /// Register a new class loader
    ///
    /// ## Arguments
    /// * 'name'   - Diagnostic name
    /// * 'parent' - Loader to delegate to
    pub fn create_loader(&self, name: &str, parent: LoaderId) -> LoaderId {
        self.loaders.create(name, parent)
    }

    /// Get a class by token
    #[must_use]
    pub fn get(&self, token: &Token) -> Option<ClassTypeRc> {
        self.classes.get(token).map(|entry| entry.value().clone())
    }

    /// Number of classes in the registry, array classes included
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if the registry holds no class
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// All classes, in token order
    #[must_use]
    pub fn all_classes(&self) -> Vec<ClassTypeRc> {
        self.classes
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn bootstrap_class(&self, name: &str) -> Result<ClassTypeRc> {
        self.find_class(name, LoaderId::BOOTSTRAP)
            .ok_or_else(|| Error::NoClassDefFound(symbols::external_name(name)))
    }

    /// `java/lang/Object`
    ///
    /// # Errors
    /// Never fails on a registry created by [`ClassRegistry::new`].
    pub fn object_class(&self) -> Result<ClassTypeRc> {
        self.bootstrap_class(symbols::OBJECT)
    }

    /// `java/lang/invoke/MethodHandle`
    ///
    /// # Errors
    /// Never fails on a registry created by [`ClassRegistry::new`].
    pub fn method_handle_class(&self) -> Result<ClassTypeRc> {
        self.bootstrap_class(symbols::METHOD_HANDLE)
    }

    /// The class `loader` sees under `name`, without loading anything.
    ///
    /// A class registered for `loader` itself (as defining or initiating loader) wins; otherwise
    /// the parent chain is asked from the bootstrap loader downwards.
    #[must_use]
    pub fn find_class(&self, name: &str, loader: LoaderId) -> Option<ClassTypeRc> {
        let key = (loader, name.to_string());
        if let Some(found) = self.dictionary.get(&key) {
            return Some(found.value().clone());
        }
        self.loaders
            .chain(loader)
            .into_iter()
            .skip(1)
            .rev()
            .find_map(|ancestor| {
                self.dictionary
                    .get(&(ancestor, name.to_string()))
                    .map(|found| found.value().clone())
            })
    }

    /// Resolve `name` as seen from `loader`, creating array classes on demand.
    ///
    /// A class found through a parent is registered with `loader` as initiating loader.
    ///
    /// # Errors
    /// - [`Error::NoClassDefFound`] if no loader on the chain defines the class
    /// - [`Error::LoaderConstraint`] if registering the initiating loader violates a constraint
    /// - [`Error::Malformed`] for an invalid array descriptor
    pub fn resolve_class(&self, name: &str, loader: LoaderId) -> Result<ClassTypeRc> {
        if name.starts_with('[') {
            return self.array_class(name, loader);
        }
        match self.find_class(name, loader) {
            Some(class) => {
                self.register_initiating_loader(loader, &class)?;
                Ok(class)
            }
            None => Err(Error::NoClassDefFound(symbols::external_name(name))),
        }
    }

    /// Record `loader` as initiating loader of `class`, i.e. `loader` answers requests for the
    /// class's name with this class. Used by class-loading collaborators whose loaders delegate
    /// outside of their parent chain.
    ///
    /// # Errors
    /// Returns [`Error::LoaderConstraint`] if a recorded constraint binds the name to a different
    /// class for `loader`, or if `loader` already sees another class under that name.
    pub fn register_initiating_loader(&self, loader: LoaderId, class: &ClassTypeRc) -> Result<()> {
        if class.loader == loader {
            return Ok(());
        }
        match self.dictionary.entry((loader, class.name.clone())) {
            Entry::Occupied(existing) => {
                if existing.get().token == class.token {
                    Ok(())
                } else {
                    Err(Error::LoaderConstraint(format!(
                        "loader {} already sees a different class named {}",
                        self.loaders.name_of(loader),
                        class.external_name()
                    )))
                }
            }
            Entry::Vacant(vacant) => {
                if !self
                    .constraints
                    .check_or_bind(&class.name, loader, class.token)
                {
                    warn!(loader = %loader, class = %class.name, "initiating loader violates loader constraint");
                    return Err(Error::LoaderConstraint(format!(
                        "loader constraint violation: loader {} resolving {} sees a different \
                         class than the one its constraint requires",
                        self.loaders.name_of(loader),
                        class.external_name()
                    )));
                }
                vacant.insert(class.clone());
                Ok(())
            }
        }
    }

    /// Define a class described by `spec`.
    ///
    /// Superclass and interfaces are resolved through the defining loader. The new class is in
    /// the `Loaded` state; it is linked on first use or by [`ClassRegistry::link_all`].
    ///
    /// # Errors
    /// - [`Error::NoClassDefFound`] if the superclass or an interface cannot be found
    /// - [`Error::IncompatibleClassChange`] if the superclass is an interface or final, or an
    ///   implemented type is not an interface
    /// - [`Error::LoaderConstraint`] for a duplicate definition or a constraint violation
    /// - [`Error::Malformed`] for invalid names or descriptors
    pub fn define_class(&self, spec: ClassBuilder) -> Result<ClassTypeRc> {
        if spec.name.is_empty() || spec.name.starts_with('[') || spec.name.contains(';') {
            return Err(malformed_error!("Invalid class name '{}'", spec.name));
        }
        if self.loaders.get(spec.loader).is_none() {
            return Err(malformed_error!("Unknown class loader {}", spec.loader));
        }

        let external = symbols::external_name(&spec.name);
        let super_class = match &spec.super_name {
            Some(super_name) => {
                let super_class = self.resolve_class(super_name, spec.loader)?;
                if super_class.is_interface() || super_class.is_array() {
                    return Err(Error::IncompatibleClassChange(format!(
                        "class {external} has interface {} as super class",
                        super_class.external_name()
                    )));
                }
                if super_class.is_final() {
                    return Err(Error::IncompatibleClassChange(format!(
                        "class {external} cannot inherit from final class {}",
                        super_class.external_name()
                    )));
                }
                self.loaders
                    .record_dependency(spec.loader, super_class.loader);
                Some(super_class)
            }
            None if spec.name == symbols::OBJECT => None,
            None => {
                return Err(malformed_error!("Class {} has no super class", spec.name));
            }
        };

        let mut interfaces = Vec::with_capacity(spec.interfaces.len());
        for interface_name in &spec.interfaces {
            let interface = self.resolve_class(interface_name, spec.loader)?;
            if !interface.is_interface() {
                return Err(Error::IncompatibleClassChange(format!(
                    "class {external} can not implement {}, because it is not an interface",
                    interface.external_name()
                )));
            }
            self.loaders.record_dependency(spec.loader, interface.loader);
            interfaces.push(interface);
        }

        let mut field_types = Vec::with_capacity(spec.fields.len());
        for field in &spec.fields {
            field_types.push(signatures::parse_field(&field.signature)?.basic);
        }
        for method in &spec.methods {
            signatures::parse_method(&method.signature)?;
        }

        let is_interface = spec.flags.is_interface();
        let kind = if is_interface {
            ClassKind::Interface
        } else {
            ClassKind::Instance
        };
        let is_method_handle =
            spec.name == symbols::METHOD_HANDLE && spec.loader.is_bootstrap();

        let mut instance_offset = super_class
            .as_ref()
            .map_or(OBJECT_HEADER_SIZE, |super_class| super_class.instance_size);
        let mut static_offset = 0;
        let mut layout = Vec::with_capacity(spec.fields.len());
        for (field, basic) in spec.fields.iter().zip(&field_types) {
            let size = basic.size_in_bytes();
            let cursor = if field.flags.is_static() {
                &mut static_offset
            } else {
                &mut instance_offset
            };
            *cursor = cursor.next_multiple_of(size);
            layout.push(*cursor);
            *cursor += size;
        }
        let instance_size = instance_offset.next_multiple_of(8);

        let key = (spec.loader, spec.name.clone());
        let class = match self.dictionary.entry(key) {
            Entry::Occupied(_) => {
                return Err(Error::LoaderConstraint(format!(
                    "loader {}: attempted duplicate class definition for {external}",
                    self.loaders.name_of(spec.loader)
                )));
            }
            Entry::Vacant(vacant) => {
                let token = Self::next_token(&self.next_class, TABLE_CLASS);
                if !self
                    .constraints
                    .check_or_bind(&spec.name, spec.loader, token)
                {
                    warn!(loader = %spec.loader, class = %spec.name, "definition violates loader constraint");
                    return Err(Error::LoaderConstraint(format!(
                        "loader constraint violation: loader {} wants to load class {external}, \
                         but a different class with the same name is already constrained",
                        self.loaders.name_of(spec.loader)
                    )));
                }

                let class = Arc::new_cyclic(|weak| {
                    let holder = ClassTypeRef::from_weak(weak.clone());
                    let methods = spec
                        .methods
                        .iter()
                        .map(|method| {
                            let intrinsic = if is_method_handle
                                && method.flags.contains(AccessFlags::NATIVE)
                            {
                                IntrinsicId::for_name(&method.name)
                            } else {
                                IntrinsicId::None
                            };
                            Arc::new(Method::new(
                                Self::next_token(&self.next_method, TABLE_METHOD),
                                method.name.clone(),
                                method.signature.clone(),
                                method.flags,
                                intrinsic,
                                holder.clone(),
                            ))
                        })
                        .collect();
                    let fields: Vec<FieldRc> = spec
                        .fields
                        .iter()
                        .zip(field_types.iter().zip(&layout))
                        .enumerate()
                        .map(|(index, (field, (basic, offset)))| {
                            Arc::new(Field::new(
                                Self::next_token(&self.next_field, TABLE_FIELD),
                                field.name.clone(),
                                field.signature.clone(),
                                field.flags,
                                *basic,
                                index,
                                *offset,
                                holder.clone(),
                            ))
                        })
                        .collect();

                    ClassType::new(
                        token,
                        spec.name.clone(),
                        spec.loader,
                        spec.flags,
                        kind,
                        super_class,
                        interfaces,
                        methods,
                        fields,
                        instance_size,
                        static_offset,
                    )
                });
                vacant.insert(class.clone());
                class
            }
        };

        self.classes.insert(class.token, class.clone());
        class.init.advance(InitState::Loaded);
        debug!(class = %class.name, loader = %class.loader, token = %class.token, "defined class");
        Ok(class)
    }

    /// The array class `name` (e.g. `[[Ljava/lang/String;`) as seen from `loader`.
    ///
    /// Array classes are defined by the loader of their element class (the bootstrap loader for
    /// primitive elements), extend `java/lang/Object`, implement `java/lang/Cloneable` and
    /// `java/io/Serializable`, and need no initialization.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] for an invalid descriptor and [`Error::NoClassDefFound`] if
    /// the element class cannot be resolved.
    pub fn array_class(&self, name: &str, loader: LoaderId) -> Result<ClassTypeRc> {
        let parsed = signatures::parse_field(name)?;
        if parsed.basic != BasicType::Array {
            return Err(malformed_error!("Not an array descriptor - {}", name));
        }
        let element_descriptor = &name[1..];
        let element_type = signatures::parse_field(element_descriptor)?;
        let element = match element_type.basic {
            BasicType::Array => {
                ArrayElement::Class(self.array_class(element_descriptor, loader)?)
            }
            BasicType::Object => match element_type.class_name() {
                Some(class_name) => ArrayElement::Class(self.resolve_class(class_name, loader)?),
                None => return Err(malformed_error!("Invalid array element in {}", name)),
            },
            primitive => ArrayElement::Primitive(primitive),
        };

        let (defining, visibility) = match &element {
            ArrayElement::Class(class) => (
                class.loader,
                if class.is_public() {
                    AccessFlags::PUBLIC
                } else {
                    AccessFlags::empty()
                },
            ),
            ArrayElement::Primitive(_) => (LoaderId::BOOTSTRAP, AccessFlags::PUBLIC),
        };

        if let Some(existing) = self.dictionary.get(&(defining, name.to_string())) {
            let existing = existing.value().clone();
            self.register_initiating_loader(loader, &existing)?;
            return Ok(existing);
        }

        let object = self.object_class()?;
        let interfaces = vec![
            self.bootstrap_class(symbols::CLONEABLE)?,
            self.bootstrap_class(symbols::SERIALIZABLE)?,
        ];

        let class = match self.dictionary.entry((defining, name.to_string())) {
            Entry::Occupied(existing) => existing.get().clone(),
            Entry::Vacant(vacant) => {
                let class = Arc::new(ClassType::new(
                    Self::next_token(&self.next_class, TABLE_CLASS),
                    name.to_string(),
                    defining,
                    visibility | AccessFlags::FINAL | AccessFlags::ABSTRACT,
                    ClassKind::Array(element),
                    Some(object),
                    interfaces,
                    Vec::new(),
                    Vec::new(),
                    OBJECT_HEADER_SIZE,
                    0,
                ));
                self.classes.insert(class.token, class.clone());
                class.init.advance(InitState::FullyInitialized);
                vacant.insert(class.clone());
                debug!(class = %class.name, loader = %defining, "created array class");
                class
            }
        };

        self.register_initiating_loader(loader, &class)?;
        Ok(class)
    }

    /// Link `class`: link its superclass and interfaces, then compute and install its vtable.
    ///
    /// Idempotent; concurrent callers compute the table once.
    ///
    /// # Errors
    /// Returns [`Error::IncompatibleClassChange`] if the class overrides a final method.
    pub fn link_class(&self, class: &ClassTypeRc) -> Result<()> {
        if class.is_linked() {
            return Ok(());
        }
        if let Some(super_class) = &class.super_class {
            self.link_class(super_class)?;
        }
        for interface in &class.interfaces {
            self.link_class(interface)?;
        }

        let _guard = lock!(class.link_lock);
        if class.is_linked() {
            return Ok(());
        }
        let vtable = Vtable::build(class)?;
        let slots = vtable.len();
        class.install_vtable(vtable);
        class.init.advance(InitState::Linked);
        debug!(class = %class.name, slots, "linked class");
        Ok(())
    }

    /// Link every class in the registry, in parallel.
    ///
    /// # Errors
    /// Returns the first linking error encountered.
    pub fn link_all(&self) -> Result<()> {
        self.all_classes()
            .par_iter()
            .try_for_each(|class| self.link_class(class))
    }

    /// Check that `loader1` and `loader2` agree on every class named by `signature`, recording
    /// the agreement as loader constraints.
    ///
    /// Returns the internal name of the first class they disagree on.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] for an invalid descriptor.
    pub fn check_signature_loaders(
        &self,
        signature: &str,
        loader1: LoaderId,
        loader2: LoaderId,
    ) -> Result<Option<String>> {
        if loader1 == loader2 {
            return Ok(None);
        }
        for name in signatures::referenced_class_names(signature)? {
            let class1 = self.find_class(name, loader1).map(|class| class.token);
            let class2 = self.find_class(name, loader2).map(|class| class.token);
            if !self
                .constraints
                .add_constraint(name, loader1, class1, loader2, class2)
            {
                warn!(class = name, loader1 = %loader1, loader2 = %loader2, "loader constraint violated");
                return Ok(Some(name.to_string()));
            }
        }
        Ok(None)
    }

    /// The synthesized intrinsic `iid` for an erased signature, created on first request.
    ///
    /// # Errors
    /// Returns [`Error::Internal`] if `iid` has no intrinsic template: the generic invoker, a
    /// non-polymorphic id, or a static linker without its trailing argument.
    pub fn find_method_handle_intrinsic(
        &self,
        iid: IntrinsicId,
        basic_signature: &str,
    ) -> Result<MethodRc> {
        if !iid.is_signature_polymorphic_intrinsic() {
            return Err(Error::Internal(format!("no intrinsic template for {iid}")));
        }
        if iid.is_signature_polymorphic_static() {
            let parsed = signatures::parse_method(basic_signature)?;
            if !parsed.params.last().is_some_and(|last| last.basic.is_reference()) {
                return Err(Error::Internal(format!(
                    "{iid} requires a trailing MemberName argument, got {basic_signature}"
                )));
            }
        }

        let key = (iid, basic_signature.to_string());
        if let Some(existing) = self.intrinsics.get(&key) {
            return Ok(existing.value().clone());
        }

        let holder = self.method_handle_class()?;
        let mut flags = AccessFlags::FINAL | AccessFlags::NATIVE | AccessFlags::SYNTHETIC;
        if iid.is_signature_polymorphic_static() {
            flags |= AccessFlags::STATIC;
        }
        let method = self
            .intrinsics
            .entry(key)
            .or_insert_with(|| {
                let method = Arc::new(Method::new(
                    Self::next_token(&self.next_method, TABLE_METHOD),
                    iid.method_name().to_string(),
                    basic_signature.to_string(),
                    flags,
                    iid,
                    ClassTypeRef::new(&holder),
                ));
                method.set_vtable_index(VtableIndex::NonVirtual);
                debug!(intrinsic = %iid, signature = basic_signature, "synthesized method handle intrinsic");
                method
            })
            .value()
            .clone();
        Ok(method)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn test_bootstrap_classes() {
        let registry = ClassRegistry::new().unwrap();
        let object = registry.object_class().unwrap();
        assert!(object.super_class.is_none());
        assert!(object.token.is_class());

        let handle = registry.method_handle_class().unwrap();
        let invoke = handle.find_method("invoke", POLYMORPHIC_DESCRIPTOR).unwrap();
        assert_eq!(invoke.intrinsic, IntrinsicId::InvokeGeneric);
        let link = handle
            .find_method("linkToStatic", POLYMORPHIC_DESCRIPTOR)
            .unwrap();
        assert_eq!(link.intrinsic, IntrinsicId::LinkToStatic);
        assert_eq!(
            handle
                .find_method("type", "()Ljava/lang/invoke/MethodType;")
                .unwrap()
                .intrinsic,
            IntrinsicId::None
        );
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn test_parent_first_lookup_and_initiating_loader() {
        let registry = ClassRegistry::new().unwrap();
        let app = registry.create_loader("app", LoaderId::BOOTSTRAP);
        let child = registry.create_loader("child", app);
        let widget = ClassBuilder::new("demo/Widget")
            .with_loader(app)
            .define(&registry)
            .unwrap();

        assert!(registry.find_class("demo/Widget", LoaderId::BOOTSTRAP).is_none());
        let seen = registry.resolve_class("demo/Widget", child).unwrap();
        assert_eq!(seen.token, widget.token);
        assert_eq!(seen.loader, app);

        let missing = registry.resolve_class("demo/Missing", child).unwrap_err();
        assert!(matches!(missing, Error::NoClassDefFound(ref name) if name == "demo.Missing"));
    }

    #[test]
    fn test_duplicate_definition_rejected() {
        let registry = ClassRegistry::new().unwrap();
        ClassBuilder::new("demo/Once").define(&registry).unwrap();
        let error = ClassBuilder::new("demo/Once").define(&registry).unwrap_err();
        assert!(matches!(error, Error::LoaderConstraint(_)));
    }

    #[test]
    fn test_invalid_hierarchies() {
        let registry = ClassRegistry::new().unwrap();
        ClassBuilder::interface("demo/Api").define(&registry).unwrap();
        ClassBuilder::new("demo/Leaf")
            .with_flags(AccessFlags::PUBLIC | AccessFlags::FINAL)
            .define(&registry)
            .unwrap();

        let extends_interface = ClassBuilder::new("demo/A")
            .extends("demo/Api")
            .define(&registry)
            .unwrap_err();
        assert!(matches!(extends_interface, Error::IncompatibleClassChange(_)));

        let extends_final = ClassBuilder::new("demo/B")
            .extends("demo/Leaf")
            .define(&registry)
            .unwrap_err();
        assert!(matches!(extends_final, Error::IncompatibleClassChange(_)));

        let implements_class = ClassBuilder::new("demo/C")
            .implements("demo/Leaf")
            .define(&registry)
            .unwrap_err();
        assert!(matches!(implements_class, Error::IncompatibleClassChange(_)));

        let bad_descriptor = ClassBuilder::new("demo/D")
            .method("m", "(Q)V", AccessFlags::PUBLIC)
            .define(&registry)
            .unwrap_err();
        assert!(matches!(bad_descriptor, Error::Malformed { .. }));
    }

    #[test]
    fn test_field_layout() {
        let registry = ClassRegistry::new().unwrap();
        let base = ClassBuilder::new("demo/Point")
            .field("flag", "Z", AccessFlags::PRIVATE)
            .field("x", "J", AccessFlags::PRIVATE)
            .field("COUNT", "I", AccessFlags::STATIC)
            .define(&registry)
            .unwrap();
        let derived = ClassBuilder::new("demo/Point3")
            .extends("demo/Point")
            .field("z", "I", AccessFlags::PRIVATE)
            .define(&registry)
            .unwrap();

        let offsets: Vec<_> = base.fields.iter().map(|f| (f.index, f.offset)).collect();
        assert_eq!(offsets, vec![(0, 16), (1, 24), (2, 0)]);
        assert_eq!(base.instance_size, 32);
        assert_eq!(base.static_size, 4);
        assert_eq!(derived.fields[0].offset, 32);
        assert_eq!(derived.fields[0].basic_type, BasicType::Int);
    }

    #[test]
    fn test_array_classes_are_shared() {
        let registry = ClassRegistry::new().unwrap();
        let app = registry.create_loader("app", LoaderId::BOOTSTRAP);
        let widget = ClassBuilder::new("demo/Widget")
            .with_loader(app)
            .define(&registry)
            .unwrap();

        let ints = registry.resolve_class("[I", app).unwrap();
        assert_eq!(ints.loader, LoaderId::BOOTSTRAP);
        assert!(ints.is_initialized());
        assert_eq!(
            registry.resolve_class("[I", LoaderId::BOOTSTRAP).unwrap().token,
            ints.token
        );

        let widgets = registry.resolve_class("[[Ldemo/Widget;", app).unwrap();
        assert_eq!(widgets.loader, widget.loader);
        assert!(widgets.is_abstract() && widgets.is_final() && widgets.is_public());
        assert!(registry.resolve_class("[V", app).is_err());
        assert!(registry.resolve_class("[Ldemo/Nope;", app).is_err());
    }

    #[test]
    fn test_intrinsics_are_cached() {
        let registry = ClassRegistry::new().unwrap();
        let first = registry
            .find_method_handle_intrinsic(IntrinsicId::InvokeBasic, "(I)I")
            .unwrap();
        let second = registry
            .find_method_handle_intrinsic(IntrinsicId::InvokeBasic, "(I)I")
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.is_method_handle_intrinsic());
        assert_eq!(first.vtable_index(), VtableIndex::NonVirtual);

        let link = registry
            .find_method_handle_intrinsic(
                IntrinsicId::LinkToStatic,
                "(ILjava/lang/invoke/MemberName;)V",
            )
            .unwrap();
        assert!(link.is_static());

        assert!(matches!(
            registry.find_method_handle_intrinsic(IntrinsicId::LinkToStatic, "()V"),
            Err(Error::Internal(_))
        ));
        assert!(matches!(
            registry.find_method_handle_intrinsic(IntrinsicId::InvokeGeneric, "()V"),
            Err(Error::Internal(_))
        ));
    }

    #[test]
    fn test_link_all_in_parallel() {
        let registry = ClassRegistry::new().unwrap();
        for index in 0..32 {
            ClassBuilder::new(&format!("demo/C{index}"))
                .method("run", "()V", AccessFlags::PUBLIC)
                .define(&registry)
                .unwrap();
        }
        registry.link_all().unwrap();
        assert!(registry.all_classes().iter().all(|class| class.is_linked()));
    }

    #[test]
    fn test_concurrent_array_creation_converges() {
        let registry = ClassRegistry::new().unwrap();
        let tokens: Vec<Token> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        registry
                            .resolve_class("[Ljava/lang/Object;", LoaderId::BOOTSTRAP)
                            .unwrap()
                            .token
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(tokens.windows(2).all(|pair| pair[0] == pair[1]));
    }
}
