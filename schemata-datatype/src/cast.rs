use crate::TypeKind;
use std::collections::HashMap;

const INTEGER_TARGETS: &[TypeKind] = &[
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
];

const NUMBER_TARGETS: &[TypeKind] = &[
    TypeKind::SmallInt,
    TypeKind::Integer,
    TypeKind::BigInt,
    TypeKind::Numeric,
    TypeKind::Decimal,
    TypeKind::Real,
    TypeKind::DoublePrecision,
    TypeKind::Float,
    TypeKind::Char,
    TypeKind::Varchar,
    TypeKind::Text,
];

const BOOLEAN_TARGETS: &[TypeKind] = &[
    TypeKind::Boolean,
    TypeKind::Integer,
    TypeKind::Char,
    TypeKind::Varchar,
    TypeKind::Text,
];

const VARCHAR_TARGETS: &[TypeKind] = &[
    TypeKind::Boolean,
    TypeKind::Decimal,
    TypeKind::DoublePrecision,
    TypeKind::Float,
    TypeKind::Interval,
    TypeKind::Numeric,
    TypeKind::Real,
    TypeKind::Varchar,
    TypeKind::Email,
];

const CHAR_TARGETS: &[TypeKind] = &[
    TypeKind::Boolean,
    TypeKind::Char,
    TypeKind::Decimal,
    TypeKind::DoublePrecision,
    TypeKind::Float,
    TypeKind::Interval,
    TypeKind::Numeric,
    TypeKind::Real,
    TypeKind::Varchar,
    TypeKind::Email,
];

const TEXT_TARGETS: &[TypeKind] = &[
    TypeKind::Boolean,
    TypeKind::Decimal,
    TypeKind::DoublePrecision,
    TypeKind::Float,
    TypeKind::Interval,
    TypeKind::Numeric,
    TypeKind::Real,
    TypeKind::Text,
    TypeKind::Varchar,
    TypeKind::Email,
];

const INTERVAL_TARGETS: &[TypeKind] = &[
    TypeKind::Interval,
    TypeKind::Char,
    TypeKind::Varchar,
    TypeKind::Text,
];

const EMAIL_TARGETS: &[TypeKind] = &[
    TypeKind::Email,
    TypeKind::Char,
    TypeKind::Varchar,
    TypeKind::Text,
];

/// Explicit outgoing edges of every type. Nothing is derived:
/// an edge A -> B says nothing about B -> A or A -> C.
pub const BUILTIN_CAST_EDGES: &[(TypeKind, &[TypeKind])] = &[
    (TypeKind::SmallInt, INTEGER_TARGETS),
    (TypeKind::Integer, INTEGER_TARGETS),
    (TypeKind::BigInt, INTEGER_TARGETS),
    (TypeKind::Numeric, NUMBER_TARGETS),
    (TypeKind::Decimal, NUMBER_TARGETS),
    (TypeKind::Real, NUMBER_TARGETS),
    (TypeKind::DoublePrecision, NUMBER_TARGETS),
    (TypeKind::Float, NUMBER_TARGETS),
    (TypeKind::Boolean, BOOLEAN_TARGETS),
    (TypeKind::Char, CHAR_TARGETS),
    (TypeKind::Varchar, VARCHAR_TARGETS),
    (TypeKind::Text, TEXT_TARGETS),
    (TypeKind::Interval, INTERVAL_TARGETS),
    (TypeKind::Email, EMAIL_TARGETS),
];

/// CastGraph is a directed graph over column types.
/// An edge `A -> B` means a column of type `A` may be retyped to `B`
/// without failing at the catalog layer.
///
/// Targets of each source are kept sorted by type name, so callers
/// always observe the same order.
#[derive(Debug, Clone, Default)]
pub struct CastGraph {
    edges: HashMap<TypeKind, Vec<TypeKind>>,
}

impl CastGraph {
    #[inline]
    pub fn builtin() -> Self {
        Self::from_edges(BUILTIN_CAST_EDGES.iter().map(|(s, ts)| (*s, ts.iter().copied())))
    }

    pub fn from_edges<I, T>(edges: I) -> Self
    where
        I: IntoIterator<Item = (TypeKind, T)>,
        T: IntoIterator<Item = TypeKind>,
    {
        let mut graph = CastGraph::default();
        for (source, targets) in edges {
            for target in targets {
                graph.add_edge(source, target);
            }
        }
        graph
    }

    #[inline]
    pub fn add_edge(&mut self, source: TypeKind, target: TypeKind) {
        let targets = self.edges.entry(source).or_default();
        if let Err(idx) = targets.binary_search_by(|t| t.name().cmp(target.name())) {
            targets.insert(idx, target);
        }
    }

    /// Returns types reachable by one edge from `source`, ordered by name.
    #[inline]
    pub fn targets(&self, source: TypeKind) -> &[TypeKind] {
        self.edges.get(&source).map(|ts| &ts[..]).unwrap_or(&[])
    }

    #[inline]
    pub fn has_edge(&self, source: TypeKind, target: TypeKind) -> bool {
        self.targets(source).contains(&target)
    }

    /// Total number of edges.
    #[inline]
    pub fn len(&self) -> usize {
        self.edges.values().map(|ts| ts.len()).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varchar_targets() {
        let graph = CastGraph::builtin();
        let names: Vec<_> = graph
            .targets(TypeKind::Varchar)
            .iter()
            .map(|t| t.name())
            .collect();
        assert_eq!(
            names,
            vec![
                "BOOLEAN",
                "DECIMAL",
                "DOUBLE PRECISION",
                "FLOAT",
                "INTERVAL",
                "NUMERIC",
                "REAL",
                "VARCHAR",
                "mathesar_types.email",
            ]
        );
    }

    #[test]
    fn test_edges_are_directed() {
        let graph = CastGraph::builtin();
        assert!(graph.has_edge(TypeKind::Varchar, TypeKind::Email));
        assert!(graph.has_edge(TypeKind::Email, TypeKind::Varchar));
        assert!(graph.has_edge(TypeKind::Varchar, TypeKind::Interval));
        assert!(!graph.has_edge(TypeKind::Interval, TypeKind::Numeric));
        assert!(!graph.has_edge(TypeKind::Integer, TypeKind::Email));
        // no transitivity: INTEGER -> VARCHAR -> email, but not INTEGER -> email.
        assert!(graph.has_edge(TypeKind::Integer, TypeKind::Varchar));
    }

    #[test]
    fn test_add_edge_dedup() {
        let mut graph = CastGraph::default();
        assert!(graph.is_empty());
        graph.add_edge(TypeKind::Text, TypeKind::Varchar);
        graph.add_edge(TypeKind::Text, TypeKind::Boolean);
        graph.add_edge(TypeKind::Text, TypeKind::Varchar);
        assert_eq!(graph.len(), 2);
        assert_eq!(
            graph.targets(TypeKind::Text),
            &[TypeKind::Boolean, TypeKind::Varchar]
        );
        assert!(graph.targets(TypeKind::Integer).is_empty());
    }
}
