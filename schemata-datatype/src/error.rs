use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("type '{0}' is not supported")]
    UnknownType(String),
    #[error("{0}")]
    Option(#[from] OptionError),
    #[error("{0}")]
    Cast(#[from] CastError),
}

/// Errors of type options validation, reported in the order
/// the checks are applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("unknown option '{0}'")]
    UnknownOption(String),
    #[error("invalid value for option '{0}'")]
    InvalidValue(String),
    #[error("{0}")]
    ConstraintViolation(String),
}

/// Errors raised by the store when converting column values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CastError {
    #[error("cannot cast type {from} to {to}")]
    Unsupported {
        from: &'static str,
        to: &'static str,
    },
    #[error("invalid input '{value}' for type {target}")]
    InvalidValue {
        value: String,
        from: &'static str,
        target: &'static str,
    },
    #[error("value '{value}' out of range for type {target}")]
    OutOfRange {
        value: String,
        from: &'static str,
        target: &'static str,
    },
}
