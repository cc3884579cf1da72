pub mod cast;
pub mod catalog;
pub mod datum;
pub mod error;
pub mod options;

pub use cast::CastGraph;
pub use catalog::{TypeCatalog, TypeEntry};
pub use datum::{Datum, Interval, Numeric};
pub use options::*;

use crate::error::Error;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// TypeKind is the closed set of column types the engine understands.
/// Every type name coming from a caller is resolved into one of these
/// variants once, at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TypeKind {
    SmallInt = 1,
    Integer = 2,
    BigInt = 3,
    Numeric = 4,
    Decimal = 5,
    Real = 6,
    DoublePrecision = 7,
    Float = 8,
    Boolean = 9,
    Char = 10,
    Varchar = 11,
    Text = 12,
    Interval = 13,
    Email = 14,
}

impl TypeKind {
    pub const ALL: [TypeKind; 14] = [
        TypeKind::SmallInt,
        TypeKind::Integer,
        TypeKind::BigInt,
        TypeKind::Numeric,
        TypeKind::Decimal,
        TypeKind::Real,
        TypeKind::DoublePrecision,
        TypeKind::Float,
        TypeKind::Boolean,
        TypeKind::Char,
        TypeKind::Varchar,
        TypeKind::Text,
        TypeKind::Interval,
        TypeKind::Email,
    ];

    /// SQL name of the type, as stored in the catalog and shown to callers.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            TypeKind::SmallInt => "SMALLINT",
            TypeKind::Integer => "INTEGER",
            TypeKind::BigInt => "BIGINT",
            TypeKind::Numeric => "NUMERIC",
            TypeKind::Decimal => "DECIMAL",
            TypeKind::Real => "REAL",
            TypeKind::DoublePrecision => "DOUBLE PRECISION",
            TypeKind::Float => "FLOAT",
            TypeKind::Boolean => "BOOLEAN",
            TypeKind::Char => "CHAR",
            TypeKind::Varchar => "VARCHAR",
            TypeKind::Text => "TEXT",
            TypeKind::Interval => "INTERVAL",
            TypeKind::Email => "mathesar_types.email",
        }
    }

    #[inline]
    pub const fn category(self) -> TypeCategory {
        match self {
            TypeKind::SmallInt | TypeKind::Integer | TypeKind::BigInt => TypeCategory::Integer,
            TypeKind::Numeric | TypeKind::Decimal => TypeCategory::ExactNumeric,
            TypeKind::Real | TypeKind::DoublePrecision | TypeKind::Float => {
                TypeCategory::ApproxNumeric
            }
            TypeKind::Boolean => TypeCategory::Boolean,
            TypeKind::Char | TypeKind::Varchar | TypeKind::Text => TypeCategory::String,
            TypeKind::Interval => TypeCategory::Interval,
            TypeKind::Email => TypeCategory::Email,
        }
    }

    #[inline]
    pub fn is_numeric(self) -> bool {
        matches!(
            self.category(),
            TypeCategory::Integer | TypeCategory::ExactNumeric | TypeCategory::ApproxNumeric
        )
    }
}

impl fmt::Display for TypeKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TypeKind {
    type Err = Error;

    /// Builtin SQL names match case-insensitively, custom types
    /// (e.g. `mathesar_types.email`) only match exactly.
    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeKind::ALL
            .iter()
            .find(|k| k.name() == s)
            .or_else(|| {
                TypeKind::ALL.iter().find(|k| {
                    k.category() != TypeCategory::Email && k.name().eq_ignore_ascii_case(s)
                })
            })
            .copied()
            .ok_or_else(|| Error::UnknownType(s.to_string()))
    }
}

impl Serialize for TypeKind {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Coarse grouping of types, used by cast rules and type enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Integer,
    ExactNumeric,
    ApproxNumeric,
    Boolean,
    String,
    Interval,
    Email,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_kind_from_str() {
        assert_eq!(TypeKind::from_str("NUMERIC").unwrap(), TypeKind::Numeric);
        assert_eq!(TypeKind::from_str("varchar").unwrap(), TypeKind::Varchar);
        assert_eq!(
            TypeKind::from_str("double precision").unwrap(),
            TypeKind::DoublePrecision
        );
        assert_eq!(
            TypeKind::from_str("mathesar_types.email").unwrap(),
            TypeKind::Email
        );
        assert!(TypeKind::from_str("MATHESAR_TYPES.EMAIL").is_err());
        assert!(matches!(
            TypeKind::from_str("JSONB"),
            Err(Error::UnknownType(name)) if name == "JSONB"
        ));
    }

    #[test]
    fn test_type_kind_names_unique() {
        for (i, a) in TypeKind::ALL.iter().enumerate() {
            for b in &TypeKind::ALL[i + 1..] {
                assert_ne!(a.name(), b.name());
            }
            assert_eq!(*a as usize, i + 1);
        }
    }
}
