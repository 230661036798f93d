//! Field resolution.

use tracing::trace;

use crate::{
    link::{
        access::check_field_accessibility,
        callinfo::{FieldAccessInfo, FieldAccessKind},
        resolver::LinkResolver,
    },
    metadata::{
        constantpool::{ConstantPool, MemberRefKind},
        field::FieldRc,
        typesystem::ClassTypeRc,
    },
    Error, Result,
};

impl LinkResolver<'_> {
    /// Resolves the field reference at `index` of `pool` for an access of `kind`.
    ///
    /// The field is searched in the referenced class, its interfaces and its superclasses. A
    /// static access initializes the declaring class unless `check_only` is set, which callers
    /// use to ask whether the access is legal without side effects.
    ///
    /// ## Arguments
    /// * 'pool'       - Constant pool of the referring class
    /// * 'index'      - Index of a field reference
    /// * 'kind'       - The access bytecode
    /// * 'check_only' - Do not initialize the declaring class
    ///
    /// # Errors
    /// - [`Error::NoSuchField`] if the referenced class cannot be found or has no such field
    /// - [`Error::IllegalAccess`] if the referenced class or the field is not accessible, or for
    ///   a write to a final field of another class
    /// - [`Error::IncompatibleClassChange`] if static-ness and access kind differ
    /// - [`Error::LoaderConstraint`] if the loaders disagree on the field type
    /// - Initialization errors of the declaring class
    /// - [`Error::Malformed`] if `index` is not a field reference
    pub fn resolve_field(
        &self,
        pool: &ConstantPool,
        index: usize,
        kind: FieldAccessKind,
        check_only: bool,
    ) -> Result<FieldAccessInfo> {
        let member = pool.member_ref_at(index)?;
        if member.kind != MemberRefKind::Field {
            return Err(malformed_error!(
                "Constant pool entry {} is not a field reference",
                index
            ));
        }

        let registry = self.runtime().registry();
        let resolved_class = pool
            .resolve_class_at(registry, member.class_index)
            .map_err(|error| match error {
                Error::NoClassDefFound(_) => {
                    trace!(field = member.name, error = %error, "field holder unresolvable");
                    Error::NoSuchField(member.name.to_string())
                }
                other => other,
            })?;

        let field = resolved_class
            .find_field(member.name, member.signature)
            .ok_or_else(|| Error::NoSuchField(member.name.to_string()))?;
        let holder = field.holder().ok_or_else(|| {
            malformed_error!("Field {} has no holder", field.name)
        })?;

        let current = pool.holder();
        check_field_accessibility(current, &resolved_class, &holder, &field)?;

        if kind.is_static() != field.is_static() {
            return Err(Error::IncompatibleClassChange(format!(
                "Expected {} field {}.{}",
                if kind.is_static() { "static" } else { "non-static" },
                resolved_class.external_name(),
                field.name
            )));
        }

        if kind.is_put() && field.is_final() && holder.token != current.token {
            return Err(Error::IllegalAccess(format!(
                "Update to final field {}.{} attempted from {}",
                holder.external_name(),
                field.name,
                current.external_name()
            )));
        }

        if kind.is_static() && !check_only {
            self.runtime().initialize(&holder)?;
        }

        self.check_field_loader_constraints(current, &holder, &field)?;

        trace!(
            field = %field.name,
            holder = %holder.name,
            access = %kind,
            "resolved field"
        );
        Ok(FieldAccessInfo::new(holder, field))
    }

    /// Checks that the referring class and the declaring class of `field` agree on its type.
    ///
    /// # Errors
    /// Returns [`Error::LoaderConstraint`] on disagreement.
    pub fn check_field_loader_constraints(
        &self,
        referring: &ClassTypeRc,
        holder: &ClassTypeRc,
        field: &FieldRc,
    ) -> Result<()> {
        let registry = self.runtime().registry();
        let Some(failed) =
            registry.check_signature_loaders(&field.signature, referring.loader, holder.loader)?
        else {
            return Ok(());
        };

        let loaders = registry.loaders();
        Err(Error::LoaderConstraint(format!(
            "loader constraint violation: when resolving field \"{}\" the class loader (instance \
             of {}) of the referring class, {}, and the class loader (instance of {}) for the \
             field's resolved type, {}, have different Class objects for that type",
            field.name,
            loaders.name_of(referring.loader),
            referring.name,
            loaders.name_of(holder.loader),
            failed
        )))
    }
}
