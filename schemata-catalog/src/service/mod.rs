
use crate::config::EngineConfig;
use crate::descriptor::ColumnDescriptor;
use crate::duplicate::{ColumnDuplicator, DuplicateOptions};
use crate::error::{Result, ValidationError};
use crate::introspect::Introspector;
use crate::mutator::{ColumnMutator, ColumnPatch};
use crate::notify::{MutationEvent, MutationKind, MutationListener, Notifier};
use crate::{Catalog, ColPos, Column, TableID};
use schemata_datatype::{RawOptions, TypeCatalog};
use std::sync::Arc;

/// Column creation request as received from a transport layer.
///
/// Any of the duplication fields turns the request into a duplication
/// of `source_column`, otherwise `name` and `ty` describe a new column.
#[derive(Debug, Clone, Default)]
pub struct ColumnRequest {
    pub name: Option<String>,
    pub ty: Option<String>,
    pub type_options: Option<RawOptions>,
    pub source_column: Option<ColPos>,
    pub copy_source_data: Option<bool>,
    pub copy_source_constraints: Option<bool>,
}

impl ColumnRequest {
    #[inline]
    fn is_duplication(&self) -> bool {
        self.source_column.is_some()
            || self.copy_source_data.is_some()
            || self.copy_source_constraints.is_some()
    }
}

/// Entry point of all column operations on a shared catalog.
pub struct ColumnService<C> {
    catalog: Arc<C>,
    types: TypeCatalog,
    config: EngineConfig,
    notifier: Notifier,
}

impl<C: Catalog> ColumnService<C> {
    #[inline]
    pub fn new(catalog: Arc<C>) -> Self {
        ColumnService {
            catalog,
            types: TypeCatalog::global().clone(),
            config: EngineConfig::default(),
            notifier: Notifier::default(),
        }
    }

    #[inline]
    pub fn with_config(catalog: Arc<C>, config: EngineConfig) -> Result<Self> {
        let types = config.build_type_catalog()?;
        Ok(ColumnService {
            catalog,
            types,
            config,
            notifier: Notifier::default(),
        })
    }

    #[inline]
    pub fn catalog(&self) -> &Arc<C> {
        &self.catalog
    }

    #[inline]
    pub fn types(&self) -> &TypeCatalog {
        &self.types
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn subscribe(&self, listener: Arc<dyn MutationListener>) {
        self.notifier.subscribe(listener);
    }

    pub fn list_columns(&self, table_id: TableID) -> Result<Vec<ColumnDescriptor>> {
        let columns = Introspector::new(&*self.catalog).list_columns(table_id)?;
        Ok(columns.iter().map(|c| self.describe(c)).collect())
    }

    pub fn get_column(&self, table_id: TableID, pos: ColPos) -> Result<ColumnDescriptor> {
        let column = Introspector::new(&*self.catalog).get_column(table_id, pos)?;
        Ok(self.describe(&column))
    }

    pub fn create_column(
        &self,
        table_id: TableID,
        name: &str,
        ty: &str,
        type_options: Option<&RawOptions>,
    ) -> Result<ColumnDescriptor> {
        let column = self.mutator().create(table_id, name, ty, type_options)?;
        Ok(self.committed(column, MutationKind::Created))
    }

    pub fn duplicate_column(
        &self,
        table_id: TableID,
        source: ColPos,
        new_name: Option<&str>,
        copy_data: bool,
        copy_constraints: bool,
    ) -> Result<ColumnDescriptor> {
        let opts = DuplicateOptions {
            new_name: new_name.map(String::from),
            copy_data,
            copy_constraints,
        };
        let column = ColumnDuplicator::new(&*self.catalog, &self.config)
            .duplicate(table_id, source, &opts)?;
        Ok(self.committed(column, MutationKind::Duplicated))
    }

    pub fn update_column(
        &self,
        table_id: TableID,
        pos: ColPos,
        patch: &ColumnPatch,
    ) -> Result<ColumnDescriptor> {
        match self.mutator().update(table_id, pos, patch)? {
            Some(column) => Ok(self.committed(column, MutationKind::Updated)),
            None => self.get_column(table_id, pos),
        }
    }

    pub fn delete_column(&self, table_id: TableID, pos: ColPos) -> Result<()> {
        let column = self.mutator().delete(table_id, pos)?;
        self.publish(&column, MutationKind::Deleted);
        Ok(())
    }

    /// Create a column or duplicate one, depending on which fields
    /// the request carries. All missing required fields are reported
    /// together.
    pub fn create_or_duplicate(
        &self,
        table_id: TableID,
        req: ColumnRequest,
    ) -> Result<ColumnDescriptor> {
        if req.is_duplication() {
            let source = req
                .source_column
                .ok_or(ValidationError::MissingRequiredField(vec!["source_column"]))?;
            return self.duplicate_column(
                table_id,
                source,
                req.name.as_deref(),
                req.copy_source_data.unwrap_or(true),
                req.copy_source_constraints.unwrap_or(true),
            );
        }
        match (req.name, req.ty) {
            (Some(name), Some(ty)) => {
                self.create_column(table_id, &name, &ty, req.type_options.as_ref())
            }
            (name, ty) => {
                let mut missing = vec![];
                if name.is_none() {
                    missing.push("name");
                }
                if ty.is_none() {
                    missing.push("type");
                }
                Err(ValidationError::MissingRequiredField(missing).into())
            }
        }
    }

    #[inline]
    fn mutator(&self) -> ColumnMutator<'_, C> {
        ColumnMutator::new(&*self.catalog, &self.types, &self.config)
    }

    #[inline]
    fn describe(&self, column: &Column) -> ColumnDescriptor {
        ColumnDescriptor::new(column, &self.types)
    }

    #[inline]
    fn publish(&self, column: &Column, kind: MutationKind) {
        self.notifier.notify(MutationEvent {
            table_id: column.table_id,
            position: column.pos,
            kind,
        });
    }

    /// Publish a committed mutation and describe the column as the
    /// catalog holds it afterwards.
    #[inline]
    fn committed(&self, column: Column, kind: MutationKind) -> ColumnDescriptor {
        self.publish(&column, kind);
        let column = Introspector::new(&*self.catalog)
            .get_column(column.table_id, column.pos)
            // already dropped by a later writer.
            .unwrap_or(column);
        self.describe(&column)
    }
}
