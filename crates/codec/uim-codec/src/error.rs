/// Errors raised while reading or writing a RIFF-framed Universal Ink
/// Model document (§4.9, §7).
///
/// Model-level invariant violations surface here as
/// [`CodecError::Consistency`], wrapping the [`uim_model::ModelError`]
/// that `uim-model` itself raised; everything about the RIFF framing,
/// compression, and protobuf layer is specific to this crate.
#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error("malformed container: {0}")]
    FormatError(String),

    #[error("unsupported container version {found:?}, expected one of {supported:?}")]
    UnsupportedVersion {
        found: String,
        supported: &'static [&'static str],
    },

    #[error("consistency error: {0}")]
    Consistency(#[from] uim_model::ModelError),

    #[error("{what} {id} not found")]
    NotFound { what: &'static str, id: String },

    #[error("chunk {0:?} already present in this container")]
    AlreadyAttached(String),

    #[error("uri {0:?} is already registered")]
    DuplicateUri(String),

    #[error("{field} {value} is out of range {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("protobuf decode error in {chunk} chunk: {source}")]
    ProtoDecode {
        chunk: &'static str,
        #[source]
        source: prost::DecodeError,
    },

    #[error("unsupported compression tag {0:#x}")]
    UnsupportedCompression(u8),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CodecError>;
