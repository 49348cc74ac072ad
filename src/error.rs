use thiserror::Error;

/// Errors raised while flattening a value into parameters.
#[derive(Debug, Error)]
pub enum Error {
    /// A container was reached twice by identity in a single call.
    ///
    /// Carries the flat key at which the container was revisited.
    #[error("circular reference detected at key: {key}")]
    CycleDetected { key: String },
    /// A date format pattern contained an invalid specifier.
    #[error("invalid date format pattern: '{0}'")]
    InvalidDateFormat(String),
    /// Custom message, raised by `Serialize` implementations.
    #[error("{0}")]
    Custom(String),
    /// The serialized type cannot be represented as a `Value`.
    #[error("unsupported type for serialization: map keys must be scalars")]
    Unsupported,
}

impl Error {
    pub(crate) fn cycle(key: &str) -> Self {
        Error::CycleDetected {
            key: key.to_string(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
