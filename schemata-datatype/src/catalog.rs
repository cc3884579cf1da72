use crate::cast::CastGraph;
use crate::error::{Error, OptionError, Result};
use crate::options::{
    CHAR_OPTIONS, FLOAT_OPTIONS, INTERVAL_OPTIONS, NO_OPTIONS, NUMERIC_OPTIONS, OptionSchema,
    RawOptions, TypeOptions,
};
use crate::{TypeCategory, TypeKind};
use std::str::FromStr;
use std::sync::OnceLock;

/// Catalog entry of a single column type.
#[derive(Debug, Clone)]
pub struct TypeEntry {
    pub kind: TypeKind,
    pub category: TypeCategory,
    pub options: OptionSchema,
    // whether columns of this type expose their cast targets.
    pub computes_targets: bool,
}

impl TypeEntry {
    #[inline]
    pub fn builtin(kind: TypeKind) -> Self {
        let options = match kind {
            TypeKind::Numeric | TypeKind::Decimal => NUMERIC_OPTIONS,
            TypeKind::Float => FLOAT_OPTIONS,
            TypeKind::Char | TypeKind::Varchar => CHAR_OPTIONS,
            TypeKind::Interval => INTERVAL_OPTIONS,
            _ => NO_OPTIONS,
        };
        let category = kind.category();
        TypeEntry {
            kind,
            category,
            options,
            computes_targets: category == TypeCategory::String,
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

/// TypeCatalog is the registry of supported column types together with
/// the cast graph between them. It is immutable once built, and the
/// builtin instance is shared process-wide via `TypeCatalog::global()`.
#[derive(Debug, Clone)]
pub struct TypeCatalog {
    // indexed by TypeKind discriminant minus one.
    entries: Vec<TypeEntry>,
    casts: CastGraph,
}

impl Default for TypeCatalog {
    #[inline]
    fn default() -> Self {
        TypeCatalog::builtin()
    }
}

impl TypeCatalog {
    #[inline]
    pub fn builtin() -> Self {
        TypeCatalog {
            entries: TypeKind::ALL.iter().map(|k| TypeEntry::builtin(*k)).collect(),
            casts: CastGraph::builtin(),
        }
    }

    #[inline]
    pub fn global() -> &'static TypeCatalog {
        static CATALOG: OnceLock<TypeCatalog> = OnceLock::new();
        CATALOG.get_or_init(TypeCatalog::builtin)
    }

    /// Replace the cast graph.
    #[inline]
    pub fn with_casts(mut self, casts: CastGraph) -> Self {
        self.casts = casts;
        self
    }

    /// Enroll exactly the given types in cast target computation.
    #[inline]
    pub fn with_cast_analysis<I: IntoIterator<Item = TypeKind>>(mut self, kinds: I) -> Self {
        for entry in &mut self.entries {
            entry.computes_targets = false;
        }
        for kind in kinds {
            self.entries[kind as usize - 1].computes_targets = true;
        }
        self
    }

    /// Enroll the types with given names in cast target computation.
    pub fn with_cast_analysis_names<S: AsRef<str>>(self, names: &[S]) -> Result<Self> {
        let kinds = names
            .iter()
            .map(|n| TypeKind::from_str(n.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.with_cast_analysis(kinds))
    }

    #[inline]
    pub fn entry(&self, kind: TypeKind) -> &TypeEntry {
        &self.entries[kind as usize - 1]
    }

    /// Resolve a type name into its catalog entry.
    #[inline]
    pub fn lookup(&self, name: &str) -> Result<&TypeEntry> {
        TypeKind::from_str(name).map(|k| self.entry(k))
    }

    #[inline]
    pub fn entries(&self) -> &[TypeEntry] {
        &self.entries
    }

    #[inline]
    pub fn casts(&self) -> &CastGraph {
        &self.casts
    }

    /// Returns legal cast targets of the type.
    /// Types not enrolled in cast analysis have no computed targets.
    #[inline]
    pub fn legal_targets(&self, kind: TypeKind) -> &[TypeKind] {
        if self.entry(kind).computes_targets {
            self.casts.targets(kind)
        } else {
            &[]
        }
    }

    /// Returns names of legal cast targets, or None if the type does
    /// not take part in cast analysis.
    #[inline]
    pub fn valid_target_types(&self, kind: TypeKind) -> Option<Vec<&'static str>> {
        if self.entry(kind).computes_targets {
            Some(self.legal_targets(kind).iter().map(|t| t.name()).collect())
        } else {
            None
        }
    }

    /// Whether a column of `source` may be retyped to `target` as far as
    /// the catalog knows. The store may still reject it.
    #[inline]
    pub fn has_cast(&self, source: TypeKind, target: TypeKind) -> bool {
        self.casts.has_edge(source, target)
    }

    #[inline]
    pub fn validate_options(
        &self,
        kind: TypeKind,
        raw: Option<&RawOptions>,
    ) -> std::result::Result<TypeOptions, OptionError> {
        self.entry(kind).options.validate(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_entries() {
        let catalog = TypeCatalog::builtin();
        assert_eq!(catalog.entries().len(), TypeKind::ALL.len());
        for kind in TypeKind::ALL {
            assert_eq!(catalog.entry(kind).kind, kind);
        }
        let numeric = catalog.lookup("NUMERIC").unwrap();
        assert_eq!(numeric.category, TypeCategory::ExactNumeric);
        assert!(numeric.options.field("precision").is_some());
        assert!(numeric.options.field("scale").is_some());
        assert!(catalog.lookup("INTEGER").unwrap().options.fields.is_empty());
        assert!(matches!(
            catalog.lookup("nonexistent"),
            Err(Error::UnknownType(_))
        ));
    }

    #[test]
    fn test_legal_targets_enrollment() {
        let catalog = TypeCatalog::builtin();
        assert!(catalog.legal_targets(TypeKind::Integer).is_empty());
        assert_eq!(catalog.valid_target_types(TypeKind::Integer), None);
        // the edges still exist, they are only not exposed.
        assert!(catalog.has_cast(TypeKind::Integer, TypeKind::Numeric));

        let targets = catalog.valid_target_types(TypeKind::Varchar).unwrap();
        assert_eq!(targets.len(), 9);
        assert_eq!(targets[0], "BOOLEAN");
        assert_eq!(targets[8], "mathesar_types.email");
        // stable across calls.
        assert_eq!(
            catalog.valid_target_types(TypeKind::Varchar).unwrap(),
            targets
        );
    }

    #[test]
    fn test_cast_analysis_override() {
        let catalog = TypeCatalog::builtin()
            .with_cast_analysis_names(&["INTEGER"])
            .unwrap();
        assert!(catalog.valid_target_types(TypeKind::Integer).is_some());
        assert!(catalog.valid_target_types(TypeKind::Varchar).is_none());
        assert!(TypeCatalog::builtin()
            .with_cast_analysis_names(&["NOPE"])
            .is_err());
    }

    #[test]
    fn test_validate_options_by_kind() {
        let catalog = TypeCatalog::global();
        let raw = RawOptions::from_iter([("length", 10)]);
        let opts = catalog
            .validate_options(TypeKind::Varchar, Some(&raw))
            .unwrap();
        assert_eq!(opts.get_int("length"), Some(10));
        assert_eq!(
            catalog.validate_options(TypeKind::Text, Some(&raw)),
            Err(OptionError::UnknownOption("length".to_string()))
        );
    }
}
