use crate::error::OptionError;
use indexmap::IndexMap;
use serde::Serialize;

/// Value of a type option as supplied by a caller, before validation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<i64> for RawValue {
    #[inline]
    fn from(src: i64) -> Self {
        RawValue::Int(src)
    }
}

impl From<i32> for RawValue {
    #[inline]
    fn from(src: i32) -> Self {
        RawValue::Int(src as i64)
    }
}

impl From<f64> for RawValue {
    #[inline]
    fn from(src: f64) -> Self {
        RawValue::Float(src)
    }
}

impl From<bool> for RawValue {
    #[inline]
    fn from(src: bool) -> Self {
        RawValue::Bool(src)
    }
}

impl From<&str> for RawValue {
    #[inline]
    fn from(src: &str) -> Self {
        RawValue::Str(src.to_string())
    }
}

impl From<String> for RawValue {
    #[inline]
    fn from(src: String) -> Self {
        RawValue::Str(src)
    }
}

impl RawValue {
    /// Interpret the value as an integer. Strings holding an integer and
    /// floats without fraction are accepted, as form-encoded input
    /// carries every value as a string.
    #[inline]
    fn as_int(&self) -> Option<i64> {
        match self {
            RawValue::Int(i) => Some(*i),
            RawValue::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
            RawValue::Str(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }
}

/// Unvalidated option mapping, keyed by option name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawOptions(IndexMap<String, RawValue>);

impl RawOptions {
    #[inline]
    pub fn new() -> Self {
        RawOptions::default()
    }

    #[inline]
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        self.0.insert(key.into(), value.into());
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.0.get(key)
    }
}

impl<K: Into<String>, V: Into<RawValue>> FromIterator<(K, V)> for RawOptions {
    #[inline]
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        RawOptions(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Validated option value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Int(i64),
    Str(String),
}

impl From<i64> for OptionValue {
    #[inline]
    fn from(src: i64) -> Self {
        OptionValue::Int(src)
    }
}

impl From<&str> for OptionValue {
    #[inline]
    fn from(src: &str) -> Self {
        OptionValue::Str(src.to_string())
    }
}

/// Validated options of a column type.
/// Keys are always names declared in the option schema of the type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TypeOptions(IndexMap<&'static str, OptionValue>);

impl TypeOptions {
    #[inline]
    pub fn empty() -> Self {
        TypeOptions::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.0.get(key)
    }

    #[inline]
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.0.get(key) {
            Some(OptionValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    #[inline]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(OptionValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &OptionValue)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }
}

impl<V: Into<OptionValue>> FromIterator<(&'static str, V)> for TypeOptions {
    #[inline]
    fn from_iter<T: IntoIterator<Item = (&'static str, V)>>(iter: T) -> Self {
        TypeOptions(iter.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// Constraint on the value of a single option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionConstraint {
    /// Integer within the inclusive range.
    IntRange { min: i64, max: i64 },
    /// One of the listed keywords, matched case-insensitively.
    OneOf(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: &'static str,
    pub constraint: OptionConstraint,
}

/// Constraint spanning multiple options, checked after every
/// option passed its own check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossConstraint {
    /// `scale` requires `precision` and must not exceed it.
    ScaleWithinPrecision {
        precision: &'static str,
        scale: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSchema {
    pub fields: &'static [OptionSpec],
    pub cross: &'static [CrossConstraint],
}

pub const NO_OPTIONS: OptionSchema = OptionSchema {
    fields: &[],
    cross: &[],
};

pub const OPT_PRECISION: &str = "precision";
pub const OPT_SCALE: &str = "scale";
pub const OPT_LENGTH: &str = "length";
pub const OPT_FIELDS: &str = "fields";

pub const MAX_NUMERIC_PRECISION: i64 = 1000;
pub const MAX_FLOAT_PRECISION: i64 = 53;
pub const MAX_CHAR_LENGTH: i64 = 10_485_760;
pub const MAX_INTERVAL_PRECISION: i64 = 6;

pub const INTERVAL_FIELDS: &[&str] = &[
    "YEAR",
    "MONTH",
    "DAY",
    "HOUR",
    "MINUTE",
    "SECOND",
    "YEAR TO MONTH",
    "DAY TO HOUR",
    "DAY TO MINUTE",
    "DAY TO SECOND",
    "HOUR TO MINUTE",
    "HOUR TO SECOND",
    "MINUTE TO SECOND",
];

pub const NUMERIC_OPTIONS: OptionSchema = OptionSchema {
    fields: &[
        OptionSpec {
            name: OPT_PRECISION,
            constraint: OptionConstraint::IntRange {
                min: 1,
                max: MAX_NUMERIC_PRECISION,
            },
        },
        OptionSpec {
            name: OPT_SCALE,
            constraint: OptionConstraint::IntRange {
                min: 0,
                max: MAX_NUMERIC_PRECISION,
            },
        },
    ],
    cross: &[CrossConstraint::ScaleWithinPrecision {
        precision: OPT_PRECISION,
        scale: OPT_SCALE,
    }],
};

pub const FLOAT_OPTIONS: OptionSchema = OptionSchema {
    fields: &[OptionSpec {
        name: OPT_PRECISION,
        constraint: OptionConstraint::IntRange {
            min: 1,
            max: MAX_FLOAT_PRECISION,
        },
    }],
    cross: &[],
};

pub const CHAR_OPTIONS: OptionSchema = OptionSchema {
    fields: &[OptionSpec {
        name: OPT_LENGTH,
        constraint: OptionConstraint::IntRange {
            min: 1,
            max: MAX_CHAR_LENGTH,
        },
    }],
    cross: &[],
};

pub const INTERVAL_OPTIONS: OptionSchema = OptionSchema {
    fields: &[
        OptionSpec {
            name: OPT_FIELDS,
            constraint: OptionConstraint::OneOf(INTERVAL_FIELDS),
        },
        OptionSpec {
            name: OPT_PRECISION,
            constraint: OptionConstraint::IntRange {
                min: 0,
                max: MAX_INTERVAL_PRECISION,
            },
        },
    ],
    cross: &[],
};

impl OptionSchema {
    #[inline]
    pub fn field(&self, name: &str) -> Option<&OptionSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validate raw options against this schema.
    ///
    /// Checks run in three passes and stop at the first failure:
    /// 1. every key must be declared by the schema,
    /// 2. every present value must satisfy its own constraint,
    /// 3. cross-field constraints.
    ///
    /// Null values are treated as absent. The result is ordered
    /// as the schema declares its options.
    pub fn validate(&self, raw: Option<&RawOptions>) -> Result<TypeOptions, OptionError> {
        let raw = match raw {
            None => return Ok(TypeOptions::empty()),
            Some(raw) => raw,
        };
        if let Some((key, _)) = raw.iter().find(|(k, _)| self.field(k).is_none()) {
            return Err(OptionError::UnknownOption(key.to_string()));
        }
        let mut res = IndexMap::with_capacity(raw.0.len());
        for spec in self.fields {
            let value = match raw.get(spec.name) {
                None | Some(RawValue::Null) => continue,
                Some(value) => value,
            };
            let value = check_constraint(spec, value)
                .ok_or_else(|| OptionError::InvalidValue(spec.name.to_string()))?;
            res.insert(spec.name, value);
        }
        let opts = TypeOptions(res);
        for cross in self.cross {
            check_cross_constraint(cross, &opts)?;
        }
        Ok(opts)
    }
}

#[inline]
fn check_constraint(spec: &OptionSpec, value: &RawValue) -> Option<OptionValue> {
    match spec.constraint {
        OptionConstraint::IntRange { min, max } => value
            .as_int()
            .filter(|v| (min..=max).contains(v))
            .map(OptionValue::Int),
        OptionConstraint::OneOf(keywords) => match value {
            RawValue::Str(s) => {
                // collapse inner whitespace so "day  to second" is accepted.
                let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
                keywords
                    .iter()
                    .find(|k| k.eq_ignore_ascii_case(&normalized))
                    .map(|k| OptionValue::Str(k.to_string()))
            }
            _ => None,
        },
    }
}

#[inline]
fn check_cross_constraint(cross: &CrossConstraint, opts: &TypeOptions) -> Result<(), OptionError> {
    match *cross {
        CrossConstraint::ScaleWithinPrecision { precision, scale } => {
            match (opts.get_int(precision), opts.get_int(scale)) {
                (None, Some(_)) => Err(OptionError::ConstraintViolation(format!(
                    "{scale} cannot be specified without {precision}"
                ))),
                (Some(p), Some(s)) if s > p => Err(OptionError::ConstraintViolation(format!(
                    "{scale} {s} must not be greater than {precision} {p}"
                ))),
                _ => Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_options_valid() {
        let raw = RawOptions::from_iter([("precision", 5), ("scale", 3)]);
        let opts = NUMERIC_OPTIONS.validate(Some(&raw)).unwrap();
        assert_eq!(
            opts,
            TypeOptions::from_iter([("precision", 5i64), ("scale", 3i64)])
        );
        // order follows the schema, not the input.
        let raw = RawOptions::from_iter([("scale", 1), ("precision", 3)]);
        let opts = NUMERIC_OPTIONS.validate(Some(&raw)).unwrap();
        let keys: Vec<_> = opts.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["precision", "scale"]);
    }

    #[test]
    fn test_absent_options() {
        assert!(NUMERIC_OPTIONS.validate(None).unwrap().is_empty());
        assert!(NUMERIC_OPTIONS
            .validate(Some(&RawOptions::new()))
            .unwrap()
            .is_empty());
        let raw = RawOptions::from_iter([("precision", RawValue::Null)]);
        assert!(NUMERIC_OPTIONS.validate(Some(&raw)).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_option() {
        let raw = RawOptions::from_iter([("nonoption", 34)]);
        assert_eq!(
            NUMERIC_OPTIONS.validate(Some(&raw)),
            Err(OptionError::UnknownOption("nonoption".to_string()))
        );
        // unknown key is reported before any invalid value.
        let mut raw = RawOptions::new();
        raw.insert("precision", "asd");
        raw.insert("nonoption", 34);
        assert_eq!(
            NUMERIC_OPTIONS.validate(Some(&raw)),
            Err(OptionError::UnknownOption("nonoption".to_string()))
        );
        assert!(matches!(
            NO_OPTIONS.validate(Some(&RawOptions::from_iter([("length", 3)]))),
            Err(OptionError::UnknownOption(_))
        ));
    }

    #[test]
    fn test_invalid_value() {
        for raw in [
            RawOptions::from_iter([("precision", "asd")]),
            RawOptions::from_iter([("precision", true)]),
            RawOptions::from_iter([("precision", 1.5)]),
            RawOptions::from_iter([("precision", 0)]),
            RawOptions::from_iter([("precision", 1001)]),
        ] {
            assert_eq!(
                NUMERIC_OPTIONS.validate(Some(&raw)),
                Err(OptionError::InvalidValue("precision".to_string()))
            );
        }
        // invalid value is reported before cross-field violation.
        let raw = RawOptions::from_iter([("precision", RawValue::from(5)), ("scale", "x".into())]);
        assert_eq!(
            NUMERIC_OPTIONS.validate(Some(&raw)),
            Err(OptionError::InvalidValue("scale".to_string()))
        );
    }

    #[test]
    fn test_form_encoded_integers() {
        let raw = RawOptions::from_iter([("precision", " 7 "), ("scale", "2")]);
        let opts = NUMERIC_OPTIONS.validate(Some(&raw)).unwrap();
        assert_eq!(opts.get_int("precision"), Some(7));
        assert_eq!(opts.get_int("scale"), Some(2));
    }

    #[test]
    fn test_scale_constraints() {
        let raw = RawOptions::from_iter([("precision", 5), ("scale", 8)]);
        assert!(matches!(
            NUMERIC_OPTIONS.validate(Some(&raw)),
            Err(OptionError::ConstraintViolation(_))
        ));
        let raw = RawOptions::from_iter([("scale", 2)]);
        assert!(matches!(
            NUMERIC_OPTIONS.validate(Some(&raw)),
            Err(OptionError::ConstraintViolation(_))
        ));
        let raw = RawOptions::from_iter([("precision", 5), ("scale", 5)]);
        assert!(NUMERIC_OPTIONS.validate(Some(&raw)).is_ok());
    }

    #[test]
    fn test_interval_fields() {
        let raw = RawOptions::from_iter([("fields", "day  to second")]);
        let opts = INTERVAL_OPTIONS.validate(Some(&raw)).unwrap();
        assert_eq!(opts.get_str("fields"), Some("DAY TO SECOND"));
        let raw = RawOptions::from_iter([("fields", "fortnight")]);
        assert_eq!(
            INTERVAL_OPTIONS.validate(Some(&raw)),
            Err(OptionError::InvalidValue("fields".to_string()))
        );
        let raw = RawOptions::from_iter([("fields", 3)]);
        assert!(INTERVAL_OPTIONS.validate(Some(&raw)).is_err());
    }
}
