use crate::params::MissingFields;

/// Core protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("validation failed: {0}")]
    Validation(#[from] MissingFields),

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
