//! Virtual-dispatch tables.
//!
//! A vtable is computed once, when its class is linked, from the already linked superclass:
//!
//! 1. The superclass slots are inherited unchanged.
//! 2. Every declared instance method either overrides the inherited slots it can see (same
//!    name and descriptor, and the inherited method is public, protected or package-private in
//!    the same runtime package) or, if it overrides nothing, gets a new slot. Static, private,
//!    initializer and non-overriding final methods get `VtableIndex::NonVirtual` instead.
//! 3. Interface methods that neither the class nor its superclasses implement are appended as
//!    *miranda* slots, so that a virtual call resolved against an abstract class can still be
//!    dispatched through the interface contract.
//!
//! Interfaces and array classes share the slots of `java/lang/Object`.

use crate::{
    metadata::{
        method::{MethodRc, VtableIndex},
        typesystem::ClassType,
    },
    Error, Result,
};

/// Dispatch table of a linked class.
#[derive(Debug, Clone, Default)]
pub struct Vtable {
    slots: Vec<MethodRc>,
}

impl Vtable {
    /// Computes the table of `class` and assigns the dispatch index of its declared methods.
    ///
    /// The superclass must be linked. Indices are only assigned once the whole table has been
    /// computed successfully.
    ///
    /// # Errors
    /// Returns [`Error::IncompatibleClassChange`] if a declared method overrides a final method,
    /// or [`Error::Internal`] if the superclass has not been linked.
    pub(crate) fn build(class: &ClassType) -> Result<Vtable> {
        let mut slots = match &class.super_class {
            Some(super_class) => match super_class.vtable() {
                Some(vtable) => vtable.slots.clone(),
                None => {
                    return Err(Error::Internal(format!(
                        "superclass {} of {} is not linked",
                        super_class.external_name(),
                        class.external_name()
                    )))
                }
            },
            None => Vec::new(),
        };

        let mut assignments: Vec<(MethodRc, VtableIndex)> = Vec::new();
        for method in &class.methods {
            if method.is_static()
                || method.is_private()
                || method.is_object_initializer()
                || method.is_class_initializer()
            {
                assignments.push((method.clone(), VtableIndex::NonVirtual));
                continue;
            }
            if class.is_interface() || class.is_array() {
                continue;
            }

            // Final methods never get a slot, so they have to be found by name
            let overridden_final = class
                .super_class
                .as_ref()
                .and_then(|super_class| {
                    super_class.uncached_lookup_method(&method.name, &method.signature)
                })
                .filter(|inherited| {
                    inherited.is_final()
                        && !inherited.is_static()
                        && Self::can_override(inherited, class)
                });
            if let Some(inherited) = overridden_final {
                return Err(Error::IncompatibleClassChange(format!(
                    "class {} overrides final method {}",
                    class.external_name(),
                    inherited.qualified_name()
                )));
            }

            let mut first_slot = None;
            for (slot, inherited) in slots.iter_mut().enumerate() {
                if !inherited.matches(&method.name, &method.signature) {
                    continue;
                }
                if !Self::can_override(inherited, class) {
                    continue;
                }
                *inherited = method.clone();
                first_slot.get_or_insert(slot);
            }

            let index = match first_slot {
                Some(slot) => VtableIndex::Slot(slot),
                None if method.is_final() || class.is_final() => VtableIndex::NonVirtual,
                None => {
                    slots.push(method.clone());
                    VtableIndex::Slot(slots.len() - 1)
                }
            };
            assignments.push((method.clone(), index));
        }

        if !class.is_interface() && !class.is_array() {
            for interface in &class.transitive_interfaces {
                for candidate in &interface.methods {
                    if candidate.is_static()
                        || candidate.is_private()
                        || candidate.is_class_initializer()
                    {
                        continue;
                    }
                    let implemented = class
                        .uncached_lookup_method(&candidate.name, &candidate.signature)
                        .is_some_and(|found| !found.is_static());
                    let present = slots
                        .iter()
                        .any(|slot| slot.matches(&candidate.name, &candidate.signature));
                    if !implemented && !present {
                        slots.push(candidate.clone());
                    }
                }
            }
        }

        for (method, index) in assignments {
            method.set_vtable_index(index);
        }
        Ok(Vtable { slots })
    }

    /// An inherited method can be overridden by a method of `class` if it is visible to it
    fn can_override(inherited: &MethodRc, class: &ClassType) -> bool {
        if inherited.is_public() || inherited.flags.is_protected() {
            return true;
        }
        if inherited.is_private() {
            return false;
        }
        inherited
            .holder()
            .is_some_and(|holder| holder.is_same_package(class))
    }

    /// Number of slots
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the table has no slots
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Method in slot `index`
    #[must_use]
    pub fn method_at(&self, index: usize) -> Option<&MethodRc> {
        self.slots.get(index)
    }

    /// Iterates over the slots in index order
    pub fn iter(&self) -> impl Iterator<Item = &MethodRc> {
        self.slots.iter()
    }

    /// Returns `true` if slot `index` holds an interface method no class implements
    #[must_use]
    pub fn is_miranda_entry_at(&self, index: usize) -> bool {
        self.slots
            .get(index)
            .and_then(|method| method.holder())
            .is_some_and(|holder| holder.is_interface())
    }

    /// Slot of the miranda entry for `name` and `signature`, searched from the end
    #[must_use]
    pub fn index_of_miranda(&self, name: &str, signature: &str) -> Option<usize> {
        (0..self.slots.len())
            .rev()
            .find(|&index| {
                self.is_miranda_entry_at(index) && self.slots[index].matches(name, signature)
            })
    }
}
