use crate::{ColPos, Column};
use schemata_datatype::{TypeCatalog, TypeOptions};
use serde::Serialize;

/// Caller-facing view of a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: &'static str,
    // None if the column carries no options.
    pub type_options: Option<TypeOptions>,
    pub position: ColPos,
    pub nullable: bool,
    pub primary_key: bool,
    // None if the type does not take part in cast analysis.
    pub valid_target_types: Option<Vec<&'static str>>,
}

impl ColumnDescriptor {
    #[inline]
    pub fn new(column: &Column, types: &TypeCatalog) -> Self {
        let type_options = if column.options.is_empty() {
            None
        } else {
            Some(column.options.clone())
        };
        ColumnDescriptor {
            name: column.name.as_str().to_string(),
            ty: column.ty.name(),
            type_options,
            position: column.pos,
            nullable: column.nullable(),
            primary_key: column.primary_key(),
            valid_target_types: types.valid_target_types(column.ty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ColumnAttributes;
    use schemata_datatype::TypeKind;
    use semistr::SemiStr;

    fn column(ty: TypeKind, options: TypeOptions, attr: ColumnAttributes) -> Column {
        Column {
            id: 2,
            table_id: 1,
            name: SemiStr::new("mycolumn"),
            ty,
            options,
            pos: ColPos::from(3),
            attr,
            default: None,
        }
    }

    #[test]
    fn test_descriptor_from_column() {
        let types = TypeCatalog::global();
        let desc = ColumnDescriptor::new(
            &column(TypeKind::Integer, TypeOptions::empty(), ColumnAttributes::PRIMARY_KEY),
            types,
        );
        assert_eq!(desc.name, "mycolumn");
        assert_eq!(desc.ty, "INTEGER");
        assert_eq!(desc.type_options, None);
        assert_eq!(desc.position, ColPos::from(3));
        assert!(!desc.nullable);
        assert!(desc.primary_key);
        assert_eq!(desc.valid_target_types, None);

        let options = TypeOptions::from_iter([("length", 8i64)]);
        let desc = ColumnDescriptor::new(
            &column(TypeKind::Varchar, options.clone(), ColumnAttributes::NULLABLE),
            types,
        );
        assert_eq!(desc.type_options, Some(options));
        assert!(desc.nullable);
        assert!(desc.valid_target_types.unwrap().contains(&"BOOLEAN"));
    }

    #[test]
    fn test_descriptor_serialize() {
        let types = TypeCatalog::global();
        let desc = ColumnDescriptor::new(
            &column(TypeKind::Varchar, TypeOptions::empty(), ColumnAttributes::NULLABLE),
            types,
        );
        let s = toml::to_string(&desc).unwrap();
        assert!(s.contains("type = \"VARCHAR\""));
        assert!(s.contains("position = 3"));
        assert!(s.contains("nullable = true"));
        assert!(s.contains("\"mathesar_types.email\""));
        assert!(!s.contains("type_options"));
    }
}
