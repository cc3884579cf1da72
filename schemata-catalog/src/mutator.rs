use crate::config::EngineConfig;
use crate::error::{Error, Result, StoreError, ValidationError};
use crate::{Catalog, CatalogTrx, ColPos, Column, ColumnAlter, ColumnAttributes, ColumnSpec, TableID};
use log::{info, warn};
use schemata_datatype::{RawOptions, TypeCatalog, TypeKind, TypeOptions};
use std::str::FromStr;

/// Partial update of a column. Absent fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ColumnPatch {
    pub name: Option<String>,
    pub ty: Option<String>,
    pub type_options: Option<RawOptions>,
}

impl ColumnPatch {
    #[inline]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[inline]
    pub fn ty(mut self, ty: impl Into<String>) -> Self {
        self.ty = Some(ty.into());
        self
    }

    #[inline]
    pub fn type_options(mut self, type_options: RawOptions) -> Self {
        self.type_options = Some(type_options);
        self
    }
}

/// Creates, alters and drops single columns.
///
/// All input is validated before a DDL transaction starts. Failures
/// raised by the store during the transaction roll it back and are
/// reported in the caller-facing error taxonomy.
pub struct ColumnMutator<'a, C> {
    catalog: &'a C,
    types: &'a TypeCatalog,
    config: &'a EngineConfig,
}

impl<'a, C: Catalog> ColumnMutator<'a, C> {
    #[inline]
    pub fn new(catalog: &'a C, types: &'a TypeCatalog, config: &'a EngineConfig) -> Self {
        ColumnMutator {
            catalog,
            types,
            config,
        }
    }

    pub fn create(
        &self,
        table_id: TableID,
        name: &str,
        ty: &str,
        raw_options: Option<&RawOptions>,
    ) -> Result<Column> {
        validate_name(name, self.config)?;
        let ty = resolve_type(ty)?;
        let options = self.types.validate_options(ty, raw_options)?;
        crate::require_table(self.catalog, table_id)?;

        let mut trx = self.catalog.begin_ddl(table_id).map_err(store_rejected)?;
        if trx.exists_column(name) {
            return Err(ValidationError::DuplicateName(name.to_string()).into());
        }
        let spec = ColumnSpec::new(name, ty, ColumnAttributes::NULLABLE).with_options(options);
        let column = trx.add_column(spec).map_err(store_rejected)?;
        trx.commit().map_err(store_rejected)?;
        info!(
            "created column {} {} at position {} of table {}",
            name, ty, column.pos, table_id
        );
        Ok(column)
    }

    /// Apply the patch in one transaction. Returns `None` if the patch
    /// leaves the column as it is, in which case nothing is committed.
    pub fn update(
        &self,
        table_id: TableID,
        pos: ColPos,
        patch: &ColumnPatch,
    ) -> Result<Option<Column>> {
        if let Some(name) = &patch.name {
            validate_name(name, self.config)?;
        }
        let new_ty = patch.ty.as_deref().map(resolve_type).transpose()?;
        crate::require_table(self.catalog, table_id)?;

        let mut trx = self.catalog.begin_ddl(table_id).map_err(store_rejected)?;
        let current = trx
            .find_column(pos)
            .cloned()
            .ok_or(Error::ColumnNotFound { table_id, pos })?;
        let mut alter = ColumnAlter::default();
        if let Some(name) = &patch.name {
            if name.as_str() != current.name.as_str() {
                if trx.exists_column(name) {
                    return Err(ValidationError::DuplicateName(name.clone()).into());
                }
                alter = alter.rename(name);
            }
        }
        let target = new_ty.unwrap_or(current.ty);
        if target != current.ty && !self.types.has_cast(current.ty, target) {
            return Err(ValidationError::InvalidCast {
                from: current.ty.name(),
                to: target.name(),
                reason: "no cast is defined between these types".to_string(),
            }
            .into());
        }
        let options = match &patch.type_options {
            Some(raw) => Some(self.types.validate_options(target, Some(raw))?),
            // options of another type never carry over.
            None if target != current.ty => Some(TypeOptions::empty()),
            None => None,
        };
        if let Some(options) = options {
            alter = alter.retype(target, options);
        }
        if alter.is_empty() {
            return Ok(None);
        }
        let column = match trx.alter_column(pos, alter) {
            Ok(column) => column,
            Err(StoreError::Cast(e)) => {
                warn!(
                    "store rejected cast of column {} from {} to {}: {}",
                    pos, current.ty, target, e
                );
                return Err(ValidationError::InvalidCast {
                    from: current.ty.name(),
                    to: target.name(),
                    reason: e.to_string(),
                }
                .into());
            }
            Err(e) => return Err(store_rejected(e)),
        };
        trx.commit().map_err(store_rejected)?;
        info!("updated column {} of table {}", pos, table_id);
        Ok(Some(column))
    }

    pub fn delete(&self, table_id: TableID, pos: ColPos) -> Result<Column> {
        crate::require_table(self.catalog, table_id)?;
        let mut trx = self.catalog.begin_ddl(table_id).map_err(store_rejected)?;
        if trx.find_column(pos).is_none() {
            return Err(Error::ColumnNotFound { table_id, pos });
        }
        let column = trx.drop_column(pos).map_err(store_rejected)?;
        trx.commit().map_err(store_rejected)?;
        info!(
            "deleted column {} at position {} of table {}",
            column.name.as_str(),
            pos,
            table_id
        );
        Ok(column)
    }
}

#[inline]
pub(crate) fn validate_name(name: &str, config: &EngineConfig) -> Result<()> {
    if name.is_empty() || name.len() > config.max_name_len {
        return Err(ValidationError::InvalidName(name.to_string()).into());
    }
    Ok(())
}

#[inline]
pub(crate) fn resolve_type(name: &str) -> Result<TypeKind> {
    Ok(TypeKind::from_str(name)?)
}

/// Report a failure raised by the store inside a transaction.
#[inline]
pub(crate) fn store_rejected(e: StoreError) -> Error {
    warn!("store rejected schema change: {}", e);
    Error::from(e)
}
