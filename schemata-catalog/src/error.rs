use crate::{ColPos, TableID};
use schemata_datatype::error::{CastError, Error as DataTypeError, OptionError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors reported to callers of the column operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("table {0} not found")]
    TableNotFound(TableID),
    #[error("column {pos} not found in table {table_id}")]
    ColumnNotFound { table_id: TableID, pos: ColPos },
    #[error("source column {pos} not found in table {table_id}")]
    SourceColumnNotFound { table_id: TableID, pos: ColPos },
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("internal error: {0}")]
    InternalError(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Internal,
}

impl Error {
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::TableNotFound(_)
            | Error::ColumnNotFound { .. }
            | Error::SourceColumnNotFound { .. } => ErrorKind::NotFound,
            Error::Validation(_) => ErrorKind::Validation,
            Error::InternalError(_) | Error::InvalidConfig(_) => ErrorKind::Internal,
        }
    }

    #[inline]
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Error::Validation(e) => Some(e),
            _ => None,
        }
    }
}

/// Caller supplied something the engine refuses.
/// Every variant can be attributed to a single field of the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field(s): {}", .0.join(", "))]
    MissingRequiredField(Vec<&'static str>),
    #[error("type '{0}' is not supported")]
    UnknownType(String),
    #[error("unknown type option '{0}'")]
    UnknownOption(String),
    #[error("invalid value for type option '{0}'")]
    InvalidOptionValue(String),
    #[error("{0}")]
    OptionConstraintViolation(String),
    #[error("invalid column name '{0}'")]
    InvalidName(String),
    #[error("column '{0}' already exists")]
    DuplicateName(String),
    #[error("cannot cast column from {from} to {to}: {reason}")]
    InvalidCast {
        from: &'static str,
        to: &'static str,
        reason: String,
    },
    #[error("column '{0}' contains null values")]
    NotNullViolation(String),
    #[error("column '{0}' contains duplicate values")]
    UniqueViolation(String),
}

impl From<OptionError> for ValidationError {
    #[inline]
    fn from(src: OptionError) -> Self {
        match src {
            OptionError::UnknownOption(key) => ValidationError::UnknownOption(key),
            OptionError::InvalidValue(key) => ValidationError::InvalidOptionValue(key),
            OptionError::ConstraintViolation(desc) => {
                ValidationError::OptionConstraintViolation(desc)
            }
        }
    }
}

impl From<OptionError> for Error {
    #[inline]
    fn from(src: OptionError) -> Self {
        Error::Validation(ValidationError::from(src))
    }
}

impl From<DataTypeError> for Error {
    #[inline]
    fn from(src: DataTypeError) -> Self {
        match src {
            DataTypeError::UnknownType(name) => {
                Error::Validation(ValidationError::UnknownType(name))
            }
            DataTypeError::Option(e) => Error::from(e),
            DataTypeError::Cast(e) => Error::InternalError(e.to_string()),
        }
    }
}

/// Errors raised by the catalog store while executing DDL or DML.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("table {0} not exists")]
    TableNotExists(TableID),
    #[error("table '{0}' already exists")]
    TableAlreadyExists(String),
    #[error("column {0} not exists")]
    ColumnNotExists(ColPos),
    #[error("column '{0}' already exists")]
    ColumnAlreadyExists(String),
    #[error("{0}")]
    Cast(#[from] CastError),
    #[error("null value in column '{0}' violates not-null constraint")]
    NotNullViolation(String),
    #[error("duplicate value in column '{0}' violates unique constraint")]
    UniqueViolation(String),
    #[error("row has {actual} values, but table has {expected} columns")]
    RowArityMismatch { expected: usize, actual: usize },
}

impl From<StoreError> for Error {
    /// Re-classify a store failure into the caller-facing taxonomy.
    #[inline]
    fn from(src: StoreError) -> Self {
        match src {
            StoreError::TableNotExists(table_id) => Error::TableNotFound(table_id),
            StoreError::ColumnAlreadyExists(name) => {
                Error::Validation(ValidationError::DuplicateName(name))
            }
            StoreError::Cast(e) => {
                let (from, to) = match &e {
                    CastError::Unsupported { from, to }
                    | CastError::InvalidValue {
                        from, target: to, ..
                    }
                    | CastError::OutOfRange {
                        from, target: to, ..
                    } => (*from, *to),
                };
                Error::Validation(ValidationError::InvalidCast {
                    from,
                    to,
                    reason: e.to_string(),
                })
            }
            StoreError::NotNullViolation(name) => {
                Error::Validation(ValidationError::NotNullViolation(name))
            }
            StoreError::UniqueViolation(name) => {
                Error::Validation(ValidationError::UniqueViolation(name))
            }
            e @ (StoreError::TableAlreadyExists(_)
            | StoreError::ColumnNotExists(_)
            | StoreError::RowArityMismatch { .. }) => Error::InternalError(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind() {
        assert_eq!(Error::TableNotFound(1).kind(), ErrorKind::NotFound);
        let e = Error::SourceColumnNotFound {
            table_id: 1,
            pos: ColPos::from(3000),
        };
        assert_eq!(e.kind(), ErrorKind::NotFound);
        assert!(e.to_string().contains("not found"));
        assert!(e.to_string().contains("3000"));
        let e = Error::from(OptionError::InvalidValue("precision".to_string()));
        assert_eq!(e.kind(), ErrorKind::Validation);
        assert_eq!(
            e.validation(),
            Some(&ValidationError::InvalidOptionValue("precision".to_string()))
        );
    }

    #[test]
    fn test_missing_fields_message() {
        let e = ValidationError::MissingRequiredField(vec!["name", "type"]);
        assert_eq!(e.to_string(), "missing required field(s): name, type");
    }

    #[test]
    fn test_store_error_reclassified() {
        let e = Error::from(StoreError::Cast(CastError::Unsupported {
            from: "INTEGER",
            to: "mathesar_types.email",
        }));
        assert!(matches!(
            e,
            Error::Validation(ValidationError::InvalidCast {
                from: "INTEGER",
                to: "mathesar_types.email",
                ..
            })
        ));
        let e = Error::from(StoreError::Cast(CastError::OutOfRange {
            value: "1234.5".to_string(),
            from: "VARCHAR",
            target: "NUMERIC",
        }));
        assert_eq!(
            e,
            Error::Validation(ValidationError::InvalidCast {
                from: "VARCHAR",
                to: "NUMERIC",
                reason: "value '1234.5' out of range for type NUMERIC".to_string(),
            })
        );
        let e = Error::from(StoreError::ColumnAlreadyExists("c".to_string()));
        assert_eq!(
            e,
            Error::Validation(ValidationError::DuplicateName("c".to_string()))
        );
        let e = Error::from(StoreError::RowArityMismatch {
            expected: 2,
            actual: 3,
        });
        assert_eq!(e.kind(), ErrorKind::Internal);
        let e = Error::from(StoreError::TableNotExists(9));
        assert_eq!(e, Error::TableNotFound(9));
    }
}
