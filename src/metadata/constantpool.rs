//! Symbolic references of a class.
//!
//! The constant pool of a class holds the symbolic references its bytecode uses: class names,
//! method, interface method and field references, and dynamic call sites with their bootstrap
//! specifiers. Entries are immutable; the pool caches what resolution produced:
//!
//! - resolved classes, one write-once slot per class entry
//! - call-site bindings, one write-once slot per dynamic call site
//!
//! Both caches converge: when threads race, the first installed value wins and every thread
//! continues with it.
//!
//! # Examples
//!
//! ```rust
//! use vmlink::metadata::{constantpool::PoolBuilder, flags::AccessFlags, typesystem::{ClassBuilder, ClassRegistry}};
//!
//! let registry = ClassRegistry::new()?;
//! let caller = ClassBuilder::new("demo/Caller").define(&registry)?;
//!
//! let mut builder = PoolBuilder::new(&caller);
//! let object = builder.class("java/lang/Object");
//! let hash = builder.method_ref(object, "hashCode", "()I");
//! let pool = builder.build();
//!
//! assert_eq!(pool.member_ref_at(hash)?.name, "hashCode");
//! assert_eq!(pool.resolve_class_at(&registry, object)?.name, "java/lang/Object");
//! # Ok::<(), vmlink::Error>(())
//! ```

use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::{
    link::access,
    metadata::typesystem::{ClassRegistry, ClassTypeRc},
    runtime::methodhandles::{BootstrapSpecifier, LinkedTarget},
    Error, Result,
};

/// One constant pool entry
#[derive(Debug, Clone)]
pub enum PoolEntry {
    /// Unused slot, index 0 is always empty
    Empty,
    /// A class reference
    Class {
        /// Internal name or array descriptor
        name: String,
    },
    /// A method reference to a class
    MethodRef {
        /// Index of the class entry
        class_index: usize,
        /// Method name
        name: String,
        /// Method descriptor
        signature: String,
    },
    /// A method reference to an interface
    InterfaceMethodRef {
        /// Index of the class entry
        class_index: usize,
        /// Method name
        name: String,
        /// Method descriptor
        signature: String,
    },
    /// A field reference
    FieldRef {
        /// Index of the class entry
        class_index: usize,
        /// Field name
        name: String,
        /// Field descriptor
        signature: String,
    },
    /// A dynamic call site
    InvokeDynamic {
        /// Index of the bootstrap entry
        bootstrap_index: usize,
        /// Call-site name
        name: String,
        /// Call-site descriptor
        signature: String,
    },
    /// Bootstrap method and static arguments
    Bootstrap(BootstrapSpecifier),
}

/// Category of a member reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRefKind {
    /// `MethodRef`
    Method,
    /// `InterfaceMethodRef`
    InterfaceMethod,
    /// `FieldRef`
    Field,
}

/// Borrowed view of a member reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberRef<'a> {
    /// Reference category
    pub kind: MemberRefKind,
    /// Index of the class entry
    pub class_index: usize,
    /// Member name
    pub name: &'a str,
    /// Member descriptor
    pub signature: &'a str,
}

/// Borrowed view of a dynamic call site entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicRef<'a> {
    /// Index of the bootstrap entry
    pub bootstrap_index: usize,
    /// Call-site name
    pub name: &'a str,
    /// Call-site descriptor
    pub signature: &'a str,
}

/// The constant pool of one class
pub struct ConstantPool {
    holder: ClassTypeRc,
    entries: Vec<PoolEntry>,
    resolved_classes: Vec<OnceLock<ClassTypeRc>>,
    call_sites: Vec<OnceLock<Arc<LinkedTarget>>>,
}

impl ConstantPool {
    /// The class owning this pool
    #[must_use]
    pub fn holder(&self) -> &ClassTypeRc {
        &self.holder
    }

    /// Number of entries, including the empty entry 0
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the pool has no entries besides entry 0
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    /// Entry at `index`
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if `index` is out of bounds.
    pub fn entry(&self, index: usize) -> Result<&PoolEntry> {
        self.entries.get(index).ok_or_else(|| {
            malformed_error!(
                "Constant pool index {} out of bounds in {}",
                index,
                self.holder.name
            )
        })
    }

    /// Name of the class entry at `index`
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if the entry is not a class reference.
    pub fn klass_name_at(&self, index: usize) -> Result<&str> {
        match self.entry(index)? {
            PoolEntry::Class { name } => Ok(name.as_str()),
            other => Err(malformed_error!(
                "Expected class entry at {}, found {:?}",
                index,
                other
            )),
        }
    }

    /// Member reference at `index`
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if the entry is not a method, interface method or field
    /// reference.
    pub fn member_ref_at(&self, index: usize) -> Result<MemberRef<'_>> {
        let (kind, class_index, name, signature) = match self.entry(index)? {
            PoolEntry::MethodRef {
                class_index,
                name,
                signature,
            } => (MemberRefKind::Method, class_index, name, signature),
            PoolEntry::InterfaceMethodRef {
                class_index,
                name,
                signature,
            } => (MemberRefKind::InterfaceMethod, class_index, name, signature),
            PoolEntry::FieldRef {
                class_index,
                name,
                signature,
            } => (MemberRefKind::Field, class_index, name, signature),
            other => {
                return Err(malformed_error!(
                    "Expected member reference at {}, found {:?}",
                    index,
                    other
                ))
            }
        };
        Ok(MemberRef {
            kind,
            class_index: *class_index,
            name,
            signature,
        })
    }

    /// Class name of the member reference at `index`
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] for an invalid member reference.
    pub fn klass_ref_name_at(&self, index: usize) -> Result<&str> {
        let member = self.member_ref_at(index)?;
        self.klass_name_at(member.class_index)
    }

    /// Dynamic call site at `index`
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if the entry is not a dynamic call site.
    pub fn invoke_dynamic_at(&self, index: usize) -> Result<DynamicRef<'_>> {
        match self.entry(index)? {
            PoolEntry::InvokeDynamic {
                bootstrap_index,
                name,
                signature,
            } => Ok(DynamicRef {
                bootstrap_index: *bootstrap_index,
                name,
                signature,
            }),
            other => Err(malformed_error!(
                "Expected invokedynamic entry at {}, found {:?}",
                index,
                other
            )),
        }
    }

    /// Bootstrap specifier at `index`
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if the entry is not a bootstrap specifier.
    pub fn bootstrap_at(&self, index: usize) -> Result<&BootstrapSpecifier> {
        match self.entry(index)? {
            PoolEntry::Bootstrap(specifier) => Ok(specifier),
            other => Err(malformed_error!(
                "Expected bootstrap entry at {}, found {:?}",
                index,
                other
            )),
        }
    }

    /// The class resolved for entry `index`, if resolution already happened
    #[must_use]
    pub fn resolved_class_at(&self, index: usize) -> Option<ClassTypeRc> {
        self.resolved_classes.get(index).and_then(|slot| slot.get().cloned())
    }

    /// Resolve the class entry at `index` through the holder's loader.
    ///
    /// Records the loader dependency and checks that the holder may access the class. The result
    /// is cached in the pool.
    ///
    /// # Errors
    /// - [`Error::Malformed`] if the entry is not a class reference
    /// - [`Error::NoClassDefFound`] if the class cannot be found
    /// - [`Error::IllegalAccess`] if the holder cannot access the class
    pub fn resolve_class_at(&self, registry: &ClassRegistry, index: usize) -> Result<ClassTypeRc> {
        if let Some(resolved) = self.resolved_class_at(index) {
            return Ok(resolved);
        }

        let name = self.klass_name_at(index)?;
        let class = registry.resolve_class(name, self.holder.loader)?;
        registry
            .loaders()
            .record_dependency(self.holder.loader, class.loader);
        if !access::verify_class_access(&self.holder, &class) {
            return Err(Error::IllegalAccess(format!(
                "tried to access class {} from class {}",
                class.external_name(),
                self.holder.external_name()
            )));
        }

        let slot = &self.resolved_classes[index];
        Ok(slot.get_or_init(|| class).clone())
    }

    /// The binding of the dynamic call site at `index`, if bound
    #[must_use]
    pub fn call_site(&self, index: usize) -> Option<Arc<LinkedTarget>> {
        self.call_sites.get(index).and_then(|slot| slot.get().cloned())
    }

    /// Install the binding of the dynamic call site at `index`.
    ///
    /// The first binding installed wins; the installed binding is returned, which may differ from
    /// `target` when another thread bound the site concurrently.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if the entry is not a dynamic call site.
    pub fn install_call_site(&self, index: usize, target: LinkedTarget) -> Result<Arc<LinkedTarget>> {
        self.invoke_dynamic_at(index)?;
        let slot = &self.call_sites[index];
        let mut installed_here = false;
        let installed = slot
            .get_or_init(|| {
                installed_here = true;
                Arc::new(target)
            })
            .clone();
        if installed_here {
            debug!(holder = %self.holder.name, index, method = %installed.method.qualified_name(), "bound call site");
        }
        Ok(installed)
    }
}

/// Builder assembling a [`ConstantPool`]; every `add` returns the index of the new entry
pub struct PoolBuilder {
    holder: ClassTypeRc,
    entries: Vec<PoolEntry>,
}

impl PoolBuilder {
    /// An empty pool for `holder`
    #[must_use]
    pub fn new(holder: &ClassTypeRc) -> Self {
        PoolBuilder {
            holder: holder.clone(),
            entries: vec![PoolEntry::Empty],
        }
    }

    fn push(&mut self, entry: PoolEntry) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    /// Add a class reference
    pub fn class(&mut self, name: &str) -> usize {
        self.push(PoolEntry::Class {
            name: name.to_string(),
        })
    }

    /// Add a method reference
    pub fn method_ref(&mut self, class_index: usize, name: &str, signature: &str) -> usize {
        self.push(PoolEntry::MethodRef {
            class_index,
            name: name.to_string(),
            signature: signature.to_string(),
        })
    }

    /// Add an interface method reference
    pub fn interface_method_ref(&mut self, class_index: usize, name: &str, signature: &str) -> usize {
        self.push(PoolEntry::InterfaceMethodRef {
            class_index,
            name: name.to_string(),
            signature: signature.to_string(),
        })
    }

    /// Add a field reference
    pub fn field_ref(&mut self, class_index: usize, name: &str, signature: &str) -> usize {
        self.push(PoolEntry::FieldRef {
            class_index,
            name: name.to_string(),
            signature: signature.to_string(),
        })
    }

    /// Add a bootstrap specifier
    pub fn bootstrap(&mut self, specifier: BootstrapSpecifier) -> usize {
        self.push(PoolEntry::Bootstrap(specifier))
    }

    /// Add a dynamic call site
    pub fn invoke_dynamic(&mut self, bootstrap_index: usize, name: &str, signature: &str) -> usize {
        self.push(PoolEntry::InvokeDynamic {
            bootstrap_index,
            name: name.to_string(),
            signature: signature.to_string(),
        })
    }

    /// Finish the pool
    #[must_use]
    pub fn build(self) -> ConstantPool {
        let len = self.entries.len();
        ConstantPool {
            holder: self.holder,
            entries: self.entries,
            resolved_classes: (0..len).map(|_| OnceLock::new()).collect(),
            call_sites: (0..len).map(|_| OnceLock::new()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::{flags::AccessFlags, loader::LoaderId, typesystem::ClassBuilder},
        runtime::oop::Oop,
    };

    #[test]
    fn test_entry_kinds_are_checked() {
        let registry = ClassRegistry::new().unwrap();
        let caller = ClassBuilder::new("demo/Caller").define(&registry).unwrap();
        let mut builder = PoolBuilder::new(&caller);
        let object = builder.class("java/lang/Object");
        let field = builder.field_ref(object, "x", "I");
        let pool = builder.build();

        assert_eq!(pool.len(), 3);
        assert_eq!(pool.member_ref_at(field).unwrap().kind, MemberRefKind::Field);
        assert_eq!(pool.klass_ref_name_at(field).unwrap(), "java/lang/Object");
        assert!(matches!(pool.member_ref_at(object), Err(Error::Malformed { .. })));
        assert!(matches!(pool.klass_name_at(0), Err(Error::Malformed { .. })));
        assert!(matches!(pool.entry(42), Err(Error::Malformed { .. })));
        assert!(pool.invoke_dynamic_at(field).is_err());
    }

    #[test]
    fn test_class_resolution_is_cached_and_records_dependency() {
        let registry = ClassRegistry::new().unwrap();
        let lib = registry.create_loader("lib", LoaderId::BOOTSTRAP);
        let app = registry.create_loader("app", LoaderId::BOOTSTRAP);
        let helper = ClassBuilder::new("lib/Helper")
            .with_loader(lib)
            .define(&registry)
            .unwrap();
        let caller = ClassBuilder::new("app/Main")
            .with_loader(app)
            .define(&registry)
            .unwrap();
        registry.register_initiating_loader(app, &helper).unwrap();

        let mut builder = PoolBuilder::new(&caller);
        let index = builder.class("lib/Helper");
        let pool = builder.build();

        assert!(pool.resolved_class_at(index).is_none());
        let resolved = pool.resolve_class_at(&registry, index).unwrap();
        assert_eq!(resolved.token, helper.token);
        assert_eq!(pool.resolved_class_at(index).unwrap().token, helper.token);
        assert_eq!(registry.loaders().dependencies(app), vec![lib]);
    }

    #[test]
    fn test_inaccessible_class() {
        let registry = ClassRegistry::new().unwrap();
        ClassBuilder::new("secret/Hidden")
            .with_flags(AccessFlags::SUPER)
            .define(&registry)
            .unwrap();
        let caller = ClassBuilder::new("demo/Caller").define(&registry).unwrap();

        let mut builder = PoolBuilder::new(&caller);
        let index = builder.class("secret/Hidden");
        let pool = builder.build();
        let error = pool.resolve_class_at(&registry, index).unwrap_err();
        assert!(
            matches!(error, Error::IllegalAccess(ref message) if message == "tried to access class secret.Hidden from class demo.Caller")
        );
        assert!(pool.resolved_class_at(index).is_none());
    }

    #[test]
    fn test_first_call_site_binding_wins() {
        let registry = ClassRegistry::new().unwrap();
        let caller = ClassBuilder::new("demo/Caller").define(&registry).unwrap();
        let handle = registry.method_handle_class().unwrap();
        let mut builder = PoolBuilder::new(&caller);
        let bsm = builder.bootstrap(BootstrapSpecifier {
            method: Oop::new(handle.clone(), "bsm"),
            static_args: Vec::new(),
        });
        let site = builder.invoke_dynamic(bsm, "run", "()V");
        let pool = builder.build();

        let first = LinkedTarget::method(handle.methods[0].clone());
        let second = LinkedTarget::method(handle.methods[1].clone());
        let installed = pool.install_call_site(site, first).unwrap();
        let again = pool.install_call_site(site, second).unwrap();
        assert!(Arc::ptr_eq(&installed, &again));
        assert_eq!(again.method.token, handle.methods[0].token);
        assert!(pool.install_call_site(bsm, LinkedTarget::method(handle.methods[0].clone())).is_err());
        assert_eq!(pool.bootstrap_at(bsm).unwrap().method.label(), "bsm");
    }
}
