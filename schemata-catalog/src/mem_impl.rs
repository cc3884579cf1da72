use crate::error::{StoreError, StoreResult};
use crate::{
    Catalog, CatalogTrx, ColPos, Column, ColumnAlter, ColumnAttributes, ColumnSpec, ObjID, Table,
    TableID, TableSpec,
};
use indexmap::IndexMap;
use log::debug;
use parking_lot::{Condvar, Mutex, RwLock};
use schemata_datatype::datum::cast;
use schemata_datatype::{Datum, TypeKind};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory catalog holding table definitions and row data.
///
/// Committed state lives behind a `RwLock`. Writers of a single table,
/// i.e. DDL transactions and row inserts, are serialized by a per-table
/// lock so staged changes never race with each other.
#[derive(Debug, Default)]
pub struct MemCatalog {
    inner: RwLock<Inner>,
    // tables with an active writer.
    busy_tables: Mutex<HashSet<TableID>>,
    table_released: Condvar,
    obj_id_gen: AtomicU64,
}

impl MemCatalog {
    #[inline]
    fn next_obj_id(&self) -> ObjID {
        self.obj_id_gen.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Wait until no one else writes the table, then mark it busy.
    #[inline]
    fn lock_table(&self, table_id: TableID) -> TableLock<'_> {
        let mut busy = self.busy_tables.lock();
        while busy.contains(&table_id) {
            self.table_released.wait(&mut busy);
        }
        busy.insert(table_id);
        TableLock {
            catalog: self,
            table_id,
        }
    }
}

struct TableLock<'a> {
    catalog: &'a MemCatalog,
    table_id: TableID,
}

impl Drop for TableLock<'_> {
    #[inline]
    fn drop(&mut self) {
        let mut busy = self.catalog.busy_tables.lock();
        busy.remove(&self.table_id);
        self.catalog.table_released.notify_all();
    }
}

#[derive(Debug, Default)]
struct Inner {
    tables: IndexMap<TableID, TableDetails>,
}

impl Inner {
    #[inline]
    fn exists_table(&self, table_name: &str) -> bool {
        self.tables
            .values()
            .any(|t| t.table.name.as_str() == table_name)
    }

    #[inline]
    fn find_table(&self, table_id: TableID) -> Option<Table> {
        self.tables.get(&table_id).map(|td| td.table.clone())
    }

    #[inline]
    fn all_columns_in_table(&self, table_id: TableID) -> Option<Vec<Column>> {
        self.tables.get(&table_id).map(|td| td.columns.clone())
    }

    #[inline]
    fn find_column(&self, table_id: TableID, pos: ColPos) -> Option<Column> {
        self.tables
            .get(&table_id)
            .and_then(|td| td.find_column(pos).cloned())
    }

    #[inline]
    fn scan_column(&self, table_id: TableID, pos: ColPos) -> StoreResult<Vec<Datum>> {
        let details = self
            .tables
            .get(&table_id)
            .ok_or(StoreError::TableNotExists(table_id))?;
        let column = details
            .find_column(pos)
            .ok_or(StoreError::ColumnNotExists(pos))?;
        Ok(details.data.get(&column.id).cloned().unwrap_or_default())
    }
}

#[derive(Debug, Clone)]
struct TableDetails {
    table: Table,
    // ordered by position.
    columns: Vec<Column>,
    rows: usize,
    data: HashMap<ObjID, Vec<Datum>>,
    next_pos: ColPos,
}

impl TableDetails {
    #[inline]
    fn find_column(&self, pos: ColPos) -> Option<&Column> {
        self.columns.iter().find(|c| c.pos == pos)
    }

    #[inline]
    fn column_idx(&self, pos: ColPos) -> StoreResult<usize> {
        self.columns
            .iter()
            .position(|c| c.pos == pos)
            .ok_or(StoreError::ColumnNotExists(pos))
    }

    #[inline]
    fn exists_column(&self, column_name: &str) -> bool {
        self.columns.iter().any(|c| c.name.as_str() == column_name)
    }

    #[inline]
    fn values(&self, column: &Column) -> &[Datum] {
        self.data.get(&column.id).map(|v| &v[..]).unwrap_or(&[])
    }
}

/// Verify the values satisfy not-null and unique constraints of the column.
fn check_constraints(column: &Column, values: &[Datum]) -> StoreResult<()> {
    let not_null = !column.nullable() || column.primary_key();
    if not_null && values.iter().any(|v| v.is_null()) {
        return Err(StoreError::NotNullViolation(column.name.as_str().to_string()));
    }
    if column
        .attr
        .intersects(ColumnAttributes::UNIQUE | ColumnAttributes::PRIMARY_KEY)
    {
        let mut seen = HashSet::with_capacity(values.len());
        for v in values.iter().filter(|v| !v.is_null()) {
            if !seen.insert(unique_key(v)) {
                return Err(StoreError::UniqueViolation(column.name.as_str().to_string()));
            }
        }
    }
    Ok(())
}

/// Key under which two values collide in a unique column.
#[inline]
fn unique_key(value: &Datum) -> String {
    match value {
        Datum::Numeric(n) => n.normalize().to_string(),
        Datum::Float(f) if *f == 0.0 => "0".to_string(),
        v => v.to_string(),
    }
}

/// The type a value would have if it were a column of its own.
#[inline]
fn natural_kind(value: &Datum, fallback: TypeKind) -> TypeKind {
    match value {
        Datum::Null => fallback,
        Datum::Bool(_) => TypeKind::Boolean,
        Datum::Int(_) => TypeKind::BigInt,
        Datum::Float(_) => TypeKind::DoublePrecision,
        Datum::Numeric(_) => TypeKind::Numeric,
        Datum::Text(_) => TypeKind::Text,
        Datum::Interval(_) => TypeKind::Interval,
    }
}

impl Catalog for MemCatalog {
    type Trx<'a> = MemTrx<'a>;

    #[inline]
    fn create_table(&self, table_spec: TableSpec) -> StoreResult<TableID> {
        let mut inner = self.inner.write();
        if inner.exists_table(table_spec.table_name.as_str()) {
            return Err(StoreError::TableAlreadyExists(
                table_spec.table_name.as_str().to_string(),
            ));
        }
        let table_id = self.next_obj_id();
        let table = Table {
            id: table_id,
            name: table_spec.table_name,
        };
        let mut columns = Vec::with_capacity(table_spec.columns.len());
        let mut data = HashMap::with_capacity(table_spec.columns.len());
        let mut next_pos = ColPos::from(0);
        for c in table_spec.columns {
            if columns.iter().any(|e: &Column| e.name == c.column_name) {
                return Err(StoreError::ColumnAlreadyExists(
                    c.column_name.as_str().to_string(),
                ));
            }
            let id = self.next_obj_id();
            columns.push(Column {
                id,
                table_id,
                name: c.column_name,
                ty: c.column_type,
                options: c.column_options,
                pos: next_pos,
                attr: c.column_attributes,
                default: c.default,
            });
            data.insert(id, vec![]);
            next_pos = next_pos.next();
        }
        debug!("created table {} with {} columns", table_id, columns.len());
        inner.tables.insert(
            table_id,
            TableDetails {
                table,
                columns,
                rows: 0,
                data,
                next_pos,
            },
        );
        Ok(table_id)
    }

    #[inline]
    fn find_table(&self, table_id: TableID) -> Option<Table> {
        let inner = self.inner.read();
        inner.find_table(table_id)
    }

    #[inline]
    fn all_columns_in_table(&self, table_id: TableID) -> Option<Vec<Column>> {
        let inner = self.inner.read();
        inner.all_columns_in_table(table_id)
    }

    #[inline]
    fn find_column(&self, table_id: TableID, pos: ColPos) -> Option<Column> {
        let inner = self.inner.read();
        inner.find_column(table_id, pos)
    }

    fn insert_rows(&self, table_id: TableID, rows: Vec<Vec<Datum>>) -> StoreResult<usize> {
        let _lock = self.lock_table(table_id);
        let mut inner = self.inner.write();
        let details = inner
            .tables
            .get_mut(&table_id)
            .ok_or(StoreError::TableNotExists(table_id))?;
        let n_cols = details.columns.len();
        // convert everything before touching committed data.
        let mut converted: Vec<Vec<Datum>> = details
            .columns
            .iter()
            .map(|c| details.values(c).to_vec())
            .collect();
        for row in &rows {
            if row.len() != n_cols {
                return Err(StoreError::RowArityMismatch {
                    expected: n_cols,
                    actual: row.len(),
                });
            }
            for ((value, column), values) in row.iter().zip(&details.columns).zip(&mut converted) {
                let source = natural_kind(value, column.ty);
                values.push(cast(value, source, column.ty, &column.options)?);
            }
        }
        for (column, values) in details.columns.iter().zip(&converted) {
            check_constraints(column, values)?;
        }
        for (column, values) in details.columns.iter().zip(converted) {
            details.data.insert(column.id, values);
        }
        details.rows += rows.len();
        Ok(rows.len())
    }

    #[inline]
    fn scan_column(&self, table_id: TableID, pos: ColPos) -> StoreResult<Vec<Datum>> {
        let inner = self.inner.read();
        inner.scan_column(table_id, pos)
    }

    fn begin_ddl(&self, table_id: TableID) -> StoreResult<Self::Trx<'_>> {
        let lock = self.lock_table(table_id);
        let staged = {
            let inner = self.inner.read();
            inner
                .tables
                .get(&table_id)
                .cloned()
                .ok_or(StoreError::TableNotExists(table_id))?
        };
        debug!("begin ddl on table {}", table_id);
        Ok(MemTrx {
            catalog: self,
            staged,
            committed: false,
            _lock: lock,
        })
    }
}

/// DDL transaction of `MemCatalog`.
///
/// Works on a private copy of the table, which replaces the committed
/// one on commit.
pub struct MemTrx<'a> {
    catalog: &'a MemCatalog,
    staged: TableDetails,
    committed: bool,
    _lock: TableLock<'a>,
}

impl CatalogTrx for MemTrx<'_> {
    #[inline]
    fn table_id(&self) -> TableID {
        self.staged.table.id
    }

    #[inline]
    fn columns(&self) -> &[Column] {
        &self.staged.columns
    }

    fn add_column(&mut self, spec: ColumnSpec) -> StoreResult<Column> {
        if self.staged.exists_column(spec.column_name.as_str()) {
            return Err(StoreError::ColumnAlreadyExists(
                spec.column_name.as_str().to_string(),
            ));
        }
        let column = Column {
            id: self.catalog.next_obj_id(),
            table_id: self.staged.table.id,
            name: spec.column_name,
            ty: spec.column_type,
            options: spec.column_options,
            pos: self.staged.next_pos,
            attr: spec.column_attributes,
            default: spec.default,
        };
        let fill = column.default.clone().unwrap_or(Datum::Null);
        let values = vec![fill; self.staged.rows];
        check_constraints(&column, &values)?;
        self.staged.next_pos = column.pos.next();
        self.staged.data.insert(column.id, values);
        self.staged.columns.push(column.clone());
        Ok(column)
    }

    fn alter_column(&mut self, pos: ColPos, alter: ColumnAlter) -> StoreResult<Column> {
        let idx = self.staged.column_idx(pos)?;
        let mut column = self.staged.columns[idx].clone();
        if let Some(name) = alter.name {
            if name != column.name && self.staged.exists_column(name.as_str()) {
                return Err(StoreError::ColumnAlreadyExists(name.as_str().to_string()));
            }
            column.name = name;
        }
        let mut values = self.staged.values(&column).to_vec();
        if let Some((ty, options)) = alter.retype {
            values = values
                .iter()
                .map(|v| cast(v, column.ty, ty, &options))
                .collect::<Result<Vec<_>, _>>()?;
            if let Some(default) = column.default.take() {
                column.default = Some(cast(&default, column.ty, ty, &options)?);
            }
            column.ty = ty;
            column.options = options;
        }
        if let Some(attr) = alter.attributes {
            column.attr = attr;
        }
        if let Some(default) = alter.default {
            column.default = default;
        }
        check_constraints(&column, &values)?;
        self.staged.data.insert(column.id, values);
        self.staged.columns[idx] = column.clone();
        Ok(column)
    }

    fn drop_column(&mut self, pos: ColPos) -> StoreResult<Column> {
        let idx = self.staged.column_idx(pos)?;
        let column = self.staged.columns.remove(idx);
        self.staged.data.remove(&column.id);
        Ok(column)
    }

    fn copy_column_data(&mut self, src: ColPos, dst: ColPos) -> StoreResult<()> {
        let src = &self.staged.columns[self.staged.column_idx(src)?];
        let dst = &self.staged.columns[self.staged.column_idx(dst)?];
        let values = self
            .staged
            .values(src)
            .iter()
            .map(|v| cast(v, src.ty, dst.ty, &dst.options))
            .collect::<Result<Vec<_>, _>>()?;
        check_constraints(dst, &values)?;
        let dst_id = dst.id;
        self.staged.data.insert(dst_id, values);
        Ok(())
    }

    fn commit(mut self) -> StoreResult<()> {
        let table_id = self.staged.table.id;
        let mut inner = self.catalog.inner.write();
        let details = inner
            .tables
            .get_mut(&table_id)
            .ok_or(StoreError::TableNotExists(table_id))?;
        std::mem::swap(details, &mut self.staged);
        self.committed = true;
        debug!("commit ddl on table {}", table_id);
        Ok(())
    }
}

impl Drop for MemTrx<'_> {
    #[inline]
    fn drop(&mut self) {
        if !self.committed {
            debug!("rollback ddl on table {}", self.staged.table.id);
        }
    }
}
