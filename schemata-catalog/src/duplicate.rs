use crate::config::EngineConfig;
use crate::error::{Error, Result, ValidationError};
use crate::mutator::{store_rejected, validate_name};
use crate::{Catalog, CatalogTrx, ColPos, Column, ColumnAlter, ColumnAttributes, ColumnSpec, TableID};
use log::info;

/// Parameters of a column duplication.
#[derive(Debug, Clone, Default)]
pub struct DuplicateOptions {
    // generated from the source name if absent.
    pub new_name: Option<String>,
    pub copy_data: bool,
    pub copy_constraints: bool,
}

/// Creates a new column from the definition of an existing one,
/// optionally carrying its data and constraints, in one transaction.
pub struct ColumnDuplicator<'a, C> {
    catalog: &'a C,
    config: &'a EngineConfig,
}

impl<'a, C: Catalog> ColumnDuplicator<'a, C> {
    #[inline]
    pub fn new(catalog: &'a C, config: &'a EngineConfig) -> Self {
        ColumnDuplicator { catalog, config }
    }

    pub fn duplicate(
        &self,
        table_id: TableID,
        source: ColPos,
        opts: &DuplicateOptions,
    ) -> Result<Column> {
        if let Some(name) = &opts.new_name {
            validate_name(name, self.config)?;
        }
        crate::require_table(self.catalog, table_id)?;

        let mut trx = self.catalog.begin_ddl(table_id).map_err(store_rejected)?;
        let src = trx
            .find_column(source)
            .cloned()
            .ok_or(Error::SourceColumnNotFound {
                table_id,
                pos: source,
            })?;
        let name = match &opts.new_name {
            Some(name) => {
                if trx.exists_column(name) {
                    return Err(ValidationError::DuplicateName(name.clone()).into());
                }
                name.clone()
            }
            None => {
                let name = self.generate_name(&trx, src.name.as_str());
                validate_name(&name, self.config)?;
                name
            }
        };
        let (attr, default) = if opts.copy_constraints {
            (src.copyable_attributes(), src.default.clone())
        } else {
            (ColumnAttributes::NULLABLE, None)
        };

        let mut spec = ColumnSpec::new(&name, src.ty, attr).with_options(src.options.clone());
        spec.default = default;
        let column = if opts.copy_data {
            // constraints apply once the data is in place.
            spec.column_attributes = ColumnAttributes::NULLABLE;
            let column = trx.add_column(spec).map_err(store_rejected)?;
            trx.copy_column_data(src.pos, column.pos)
                .map_err(store_rejected)?;
            if attr != column.attr {
                trx.alter_column(column.pos, ColumnAlter::default().attributes(attr))
                    .map_err(store_rejected)?
            } else {
                column
            }
        } else {
            trx.add_column(spec).map_err(store_rejected)?
        };
        trx.commit().map_err(store_rejected)?;
        info!(
            "duplicated column {} of table {} to {} at position {}",
            src.pos, table_id, name, column.pos
        );
        Ok(column)
    }

    /// Smallest `<source><sep><n>` with n >= 1 that no column uses.
    #[inline]
    fn generate_name<T: CatalogTrx>(&self, trx: &T, source: &str) -> String {
        let sep = &self.config.duplicate_name_separator;
        (1..)
            .map(|n| format!("{}{}{}", source, sep, n))
            .find(|name| !trx.exists_column(name))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TableSpec;
    use crate::mem_impl::MemCatalog;
    use schemata_datatype::{Datum, TypeKind, TypeOptions};

    fn test_catalog() -> (MemCatalog, TableID) {
        let catalog = MemCatalog::default();
        let table_id = catalog
            .create_table(TableSpec::new(
                "t1",
                vec![
                    ColumnSpec::new("c0", TypeKind::Integer, ColumnAttributes::PRIMARY_KEY),
                    ColumnSpec::new("c1", TypeKind::Integer, ColumnAttributes::empty())
                        .with_default(Datum::Int(0)),
                    ColumnSpec::new("c2", TypeKind::Varchar, ColumnAttributes::NULLABLE)
                        .with_options(TypeOptions::from_iter([("length", 12i64)])),
                ],
            ))
            .unwrap();
        catalog
            .insert_rows(
                table_id,
                vec![
                    vec![Datum::Int(1), Datum::Int(10), Datum::text("a")],
                    vec![Datum::Int(2), Datum::Int(10), Datum::Null],
                ],
            )
            .unwrap();
        (catalog, table_id)
    }

    fn named(name: &str) -> DuplicateOptions {
        DuplicateOptions {
            new_name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_duplicate_definition_only() {
        let (catalog, table_id) = test_catalog();
        let config = EngineConfig::default();
        let dup = ColumnDuplicator::new(&catalog, &config);
        let column = dup.duplicate(table_id, ColPos::from(2), &named("c2_copy")).unwrap();
        assert_eq!(column.ty, TypeKind::Varchar);
        assert_eq!(column.options.get_int("length"), Some(12));
        assert_eq!(column.pos, ColPos::from(3));
        assert!(column.nullable());
        assert_eq!(
            catalog.scan_column(table_id, column.pos).unwrap(),
            vec![Datum::Null, Datum::Null]
        );
    }

    #[test]
    fn test_duplicate_with_data() {
        let (catalog, table_id) = test_catalog();
        let config = EngineConfig::default();
        let dup = ColumnDuplicator::new(&catalog, &config);
        let opts = DuplicateOptions {
            copy_data: true,
            ..named("c2_copy")
        };
        let column = dup.duplicate(table_id, ColPos::from(2), &opts).unwrap();
        assert_eq!(
            catalog.scan_column(table_id, column.pos).unwrap(),
            vec![Datum::text("a"), Datum::Null]
        );
    }

    #[test]
    fn test_duplicate_with_constraints() {
        let (catalog, table_id) = test_catalog();
        let config = EngineConfig::default();
        let dup = ColumnDuplicator::new(&catalog, &config);

        // not null with default fills existing rows.
        let opts = DuplicateOptions {
            copy_constraints: true,
            ..named("c1_copy")
        };
        let column = dup.duplicate(table_id, ColPos::from(1), &opts).unwrap();
        assert!(!column.nullable());
        assert_eq!(column.default, Some(Datum::Int(0)));
        assert_eq!(
            catalog.scan_column(table_id, column.pos).unwrap(),
            vec![Datum::Int(0), Datum::Int(0)]
        );

        // primary key is never copied, unique is.
        let opts = DuplicateOptions {
            copy_constraints: true,
            copy_data: true,
            ..named("c0_copy")
        };
        let column = dup.duplicate(table_id, ColPos::from(0), &opts).unwrap();
        assert!(!column.primary_key());
        assert!(!column.nullable());
        assert!(column.attr.contains(ColumnAttributes::UNIQUE));

        // not null without default cannot be satisfied by existing rows.
        let opts = DuplicateOptions {
            copy_constraints: true,
            ..named("c0_copy2")
        };
        let err = dup.duplicate(table_id, ColPos::from(0), &opts).unwrap_err();
        assert_eq!(
            err,
            Error::Validation(ValidationError::NotNullViolation("c0_copy2".to_string()))
        );
        // copied data satisfies not null.
        let opts = DuplicateOptions {
            copy_constraints: true,
            copy_data: true,
            ..named("c1_copy2")
        };
        let column = dup.duplicate(table_id, ColPos::from(1), &opts).unwrap();
        assert_eq!(
            catalog.scan_column(table_id, column.pos).unwrap(),
            vec![Datum::Int(10), Datum::Int(10)]
        );
        assert_eq!(catalog.all_columns_in_table(table_id).unwrap().len(), 6);
    }

    #[test]
    fn test_duplicate_generated_name() {
        let (catalog, table_id) = test_catalog();
        let config = EngineConfig::default();
        let dup = ColumnDuplicator::new(&catalog, &config);
        let opts = DuplicateOptions::default();
        let first = dup.duplicate(table_id, ColPos::from(2), &opts).unwrap();
        assert_eq!(first.name.as_str(), "c2_1");
        let second = dup.duplicate(table_id, ColPos::from(2), &opts).unwrap();
        assert_eq!(second.name.as_str(), "c2_2");

        let config = EngineConfig::default().duplicate_name_separator("$");
        let dup = ColumnDuplicator::new(&catalog, &config);
        let third = dup.duplicate(table_id, ColPos::from(2), &opts).unwrap();
        assert_eq!(third.name.as_str(), "c2$1");
    }

    #[test]
    fn test_duplicate_errors() {
        let (catalog, table_id) = test_catalog();
        let config = EngineConfig::default();
        let dup = ColumnDuplicator::new(&catalog, &config);
        let err = dup
            .duplicate(table_id, ColPos::from(3000), &named("x"))
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert!(err.to_string().contains("3000"));
        let err = dup
            .duplicate(table_id, ColPos::from(0), &named("c1"))
            .unwrap_err();
        assert_eq!(
            err,
            Error::Validation(ValidationError::DuplicateName("c1".to_string()))
        );
        assert_eq!(catalog.all_columns_in_table(table_id).unwrap().len(), 3);
    }
}
