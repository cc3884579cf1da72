use crate::error::{Error, Result};
use crate::{Catalog, ColPos, Column, TableID};

/// Read-only access to committed column definitions.
pub struct Introspector<'a, C> {
    catalog: &'a C,
}

impl<'a, C: Catalog> Introspector<'a, C> {
    #[inline]
    pub fn new(catalog: &'a C) -> Self {
        Introspector { catalog }
    }

    /// Returns all columns of the table in ascending position order.
    #[inline]
    pub fn list_columns(&self, table_id: TableID) -> Result<Vec<Column>> {
        let mut columns = self
            .catalog
            .all_columns_in_table(table_id)
            .ok_or(Error::TableNotFound(table_id))?;
        columns.sort_by_key(|c| c.pos);
        Ok(columns)
    }

    #[inline]
    pub fn get_column(&self, table_id: TableID, pos: ColPos) -> Result<Column> {
        crate::require_table(self.catalog, table_id)?;
        self.catalog
            .find_column(table_id, pos)
            .ok_or(Error::ColumnNotFound { table_id, pos })
    }
}
