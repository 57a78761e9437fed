/// Errors raised while parsing or validating identifiers.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("identifier {0:?} is not 32 hex characters (with or without dashes)")]
    MalformedIdentifier(String),
}
