pub mod config;
pub mod descriptor;
pub mod duplicate;
pub mod error;
pub mod introspect;
pub mod mem_impl;
pub mod mutator;
pub mod notify;
pub mod service;
pub mod spec;

use crate::error::{Result, StoreResult};
use bitflags::bitflags;
use schemata_datatype::{Datum, TypeKind, TypeOptions};
use semistr::SemiStr;
use serde::Serialize;

pub use spec::*;

pub type ObjID = u64;
pub type TableID = ObjID;
pub type ColumnID = ObjID;

/// Catalog maintains metadata and data of tables.
/// It could be shared between threads.
///
/// Reads only observe committed state. Every schema change goes through
/// a `CatalogTrx`, which holds the table-scoped DDL lock until it is
/// committed or dropped.
pub trait Catalog: Send + Sync {
    type Trx<'a>: CatalogTrx
    where
        Self: 'a;

    fn create_table(&self, table_spec: TableSpec) -> StoreResult<TableID>;

    fn find_table(&self, table_id: TableID) -> Option<Table>;

    /// Returns committed columns of the table ordered by position,
    /// or None if the table does not exist.
    fn all_columns_in_table(&self, table_id: TableID) -> Option<Vec<Column>>;

    fn find_column(&self, table_id: TableID, pos: ColPos) -> Option<Column>;

    /// Insert rows, each row lists values of all columns in position order.
    fn insert_rows(&self, table_id: TableID, rows: Vec<Vec<Datum>>) -> StoreResult<usize>;

    /// Returns committed values of a single column in row order.
    fn scan_column(&self, table_id: TableID, pos: ColPos) -> StoreResult<Vec<Datum>>;

    /// Begin a DDL transaction on given table.
    /// Blocks until no other DDL transaction is active on the same table.
    fn begin_ddl(&self, table_id: TableID) -> StoreResult<Self::Trx<'_>>;
}

/// Transactional DDL on a single table.
///
/// Changes are staged and become visible atomically on `commit()`.
/// Dropping the transaction without commit discards all of them.
pub trait CatalogTrx {
    fn table_id(&self) -> TableID;

    /// Columns as staged in this transaction, ordered by position.
    fn columns(&self) -> &[Column];

    #[inline]
    fn find_column(&self, pos: ColPos) -> Option<&Column> {
        self.columns().iter().find(|c| c.pos == pos)
    }

    #[inline]
    fn exists_column(&self, column_name: &str) -> bool {
        self.columns().iter().any(|c| c.name.as_str() == column_name)
    }

    /// Add a column at the next unused position. Existing rows receive
    /// the default value, or null if there is none.
    fn add_column(&mut self, spec: ColumnSpec) -> StoreResult<Column>;

    /// Alter a column in place. Position and table never change.
    fn alter_column(&mut self, pos: ColPos, alter: ColumnAlter) -> StoreResult<Column>;

    fn drop_column(&mut self, pos: ColPos) -> StoreResult<Column>;

    /// Copy values of column `src` into column `dst`, converting to
    /// the type of `dst`.
    fn copy_column_data(&mut self, src: ColPos, dst: ColPos) -> StoreResult<()>;

    fn commit(self) -> StoreResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub id: TableID,
    pub name: SemiStr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub id: ColumnID,
    pub table_id: TableID,
    pub name: SemiStr,
    pub ty: TypeKind,
    pub options: TypeOptions,
    pub pos: ColPos,
    pub attr: ColumnAttributes,
    pub default: Option<Datum>,
}

impl Column {
    #[inline]
    pub fn nullable(&self) -> bool {
        self.attr.contains(ColumnAttributes::NULLABLE)
    }

    #[inline]
    pub fn primary_key(&self) -> bool {
        self.attr.contains(ColumnAttributes::PRIMARY_KEY)
    }

    /// Constraints that travel with a column when it is duplicated.
    /// Primary key is never copied, a column copied from a primary key
    /// keeps its not-null and unique semantics.
    #[inline]
    pub fn copyable_attributes(&self) -> ColumnAttributes {
        let mut attr = self.attr & (ColumnAttributes::NULLABLE | ColumnAttributes::UNIQUE);
        if self.primary_key() {
            attr.remove(ColumnAttributes::NULLABLE);
            attr.insert(ColumnAttributes::UNIQUE);
        }
        attr
    }
}

/// ColPos is the position of a column in its table.
/// It is assigned once when the column is created and is never reused,
/// so it stays valid after sibling columns are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ColPos(u32);

impl ColPos {
    #[inline]
    pub fn value(&self) -> u32 {
        self.0
    }

    #[inline]
    pub fn next(self) -> ColPos {
        ColPos(self.0 + 1)
    }
}

impl From<u32> for ColPos {
    fn from(src: u32) -> Self {
        ColPos(src)
    }
}

impl std::fmt::Display for ColPos {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

bitflags! {
    pub struct ColumnAttributes: u32 {
        // whether value can be null.
        const NULLABLE = 0x01;
        // whether it is (part of) the primary key.
        const PRIMARY_KEY = 0x02;
        // whether values must be distinct.
        const UNIQUE = 0x04;
    }
}

/// Resolve a table or fail with NotFound.
#[inline]
pub(crate) fn require_table<C: Catalog>(catalog: &C, table_id: TableID) -> Result<Table> {
    catalog
        .find_table(table_id)
        .ok_or(error::Error::TableNotFound(table_id))
}
