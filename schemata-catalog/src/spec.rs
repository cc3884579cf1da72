use crate::ColumnAttributes;
use schemata_datatype::{Datum, TypeKind, TypeOptions};
use semistr::SemiStr;

#[derive(Debug, Clone)]
pub struct TableSpec {
    pub table_name: SemiStr,
    pub columns: Vec<ColumnSpec>,
}

impl TableSpec {
    #[inline]
    pub fn new(table_name: &str, columns: Vec<ColumnSpec>) -> Self {
        Self {
            table_name: SemiStr::new(table_name),
            columns,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub column_name: SemiStr,
    pub column_type: TypeKind,
    pub column_options: TypeOptions,
    pub column_attributes: ColumnAttributes,
    pub default: Option<Datum>,
}

impl ColumnSpec {
    #[inline]
    pub fn new(column_name: &str, column_type: TypeKind, column_attributes: ColumnAttributes) -> Self {
        Self {
            column_name: SemiStr::new(column_name),
            column_type,
            column_options: TypeOptions::empty(),
            column_attributes,
            default: None,
        }
    }

    #[inline]
    pub fn with_options(mut self, column_options: TypeOptions) -> Self {
        self.column_options = column_options;
        self
    }

    #[inline]
    pub fn with_default(mut self, default: Datum) -> Self {
        self.default = Some(default);
        self
    }
}

/// In-place change of a single column. Absent fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ColumnAlter {
    pub name: Option<SemiStr>,
    // new type together with its options.
    pub retype: Option<(TypeKind, TypeOptions)>,
    pub attributes: Option<ColumnAttributes>,
    // Some(None) drops the default.
    pub default: Option<Option<Datum>>,
}

impl ColumnAlter {
    #[inline]
    pub fn rename(mut self, name: &str) -> Self {
        self.name = Some(SemiStr::new(name));
        self
    }

    #[inline]
    pub fn retype(mut self, ty: TypeKind, options: TypeOptions) -> Self {
        self.retype = Some((ty, options));
        self
    }

    #[inline]
    pub fn attributes(mut self, attributes: ColumnAttributes) -> Self {
        self.attributes = Some(attributes);
        self
    }

    #[inline]
    pub fn default_value(mut self, default: Option<Datum>) -> Self {
        self.default = Some(default);
        self
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.retype.is_none()
            && self.attributes.is_none()
            && self.default.is_none()
    }
}
