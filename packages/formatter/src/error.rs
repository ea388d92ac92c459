//! Error types
//!
//! Configuration problems are rejected eagerly while validating an
//! [`Options`](crate::options::Options) record, before any tokenization
//! begins. Formatting itself can only fail when an embedded sub-formatter
//! reports an error; malformed markup is never an error.

use thiserror::Error;

/// Raised while constructing or validating an options record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("unknown value `{value}` for option `{option}`")]
    UnknownValue { option: &'static str, value: String },

    #[error("option `{option}` must be greater than zero")]
    NonPositive { option: &'static str },

    #[error("invalid configuration record: {0}")]
    Malformed(String),
}

/// Raised by a formatting call.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error(transparent)]
    Options(#[from] OptionsError),

    /// An embedded script/style formatter reported a failure. Raised by the
    /// caller-supplied callback and propagated unchanged.
    #[error("embedded {language} formatter failed: {message}")]
    Embedded {
        language: &'static str,
        message: String,
    },
}
