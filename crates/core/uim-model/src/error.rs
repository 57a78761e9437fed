/// Errors raised by `uim-model`'s mutation and lookup APIs (§7).
///
/// Codec-time errors (`FormatError`, `UnsupportedVersion`) live in
/// `uim-codec`, which wraps this enum for the `ConsistencyError` case.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("{what} {id} not found")]
    NotFound { what: &'static str, id: String },

    #[error("node {0} is already attached to a parent")]
    AlreadyAttached(String),

    #[error("uri {0:?} is already registered in this model")]
    DuplicateUri(String),

    #[error("stroke {0} must be registered in the main tree before it can appear in a view")]
    MissingStrokeInMainTree(String),

    #[error("{field} {value} is out of range {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("consistency error: {0}")]
    Consistency(String),
}
