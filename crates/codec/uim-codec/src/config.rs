//! Codec-time configuration (ambient "Configuration" concern): how
//! strictly to validate on decode, and what compression to apply to
//! each chunk's payload.

/// Compression applied to an individual chunk payload (§4.9 "HEAD
/// compression tag").
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Compression {
    #[default]
    None,
    Zip,
    Lzma,
}

impl Compression {
    pub(crate) fn tag(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Zip => 1,
            Self::Lzma => 2,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::None),
            1 => Some(Self::Zip),
            2 => Some(Self::Lzma),
            _ => None,
        }
    }
}

/// The shape of a container's chunk payloads (§4.9 "HEAD content-type
/// tag"). The encoder only ever writes [`Self::Protobuf`]; the other
/// variants are recognized on read so a decoder can raise a clear error
/// instead of failing a protobuf parse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ContentType {
    #[default]
    Protobuf,
    Json,
    Text,
    Binary,
}

impl ContentType {
    pub(crate) fn tag(self) -> u8 {
        match self {
            Self::Protobuf => 0,
            Self::Json => 1,
            Self::Text => 2,
            Self::Binary => 3,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Protobuf),
            1 => Some(Self::Json),
            2 => Some(Self::Text),
            3 => Some(Self::Binary),
            _ => None,
        }
    }
}

/// Options controlling [`crate::decode`].
#[derive(Clone, Copy, Debug)]
pub struct DecodeOptions {
    /// When `true`, a model that fails [`uim_model::InkModel::validate`]
    /// after decoding is returned anyway instead of raising
    /// [`crate::CodecError::Consistency`] (§7 "lenient mode").
    pub lenient: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { lenient: false }
    }
}

impl DecodeOptions {
    pub fn strict() -> Self {
        Self { lenient: false }
    }

    pub fn lenient() -> Self {
        Self { lenient: true }
    }
}

/// Options controlling [`crate::encode`]. `encode` always writes the
/// current 3.1.0 container (§1 Non-goals: no 3.0.0 writer); only the
/// compression tag is caller-selectable.
#[derive(Clone, Copy, Debug, Default)]
pub struct EncodeOptions {
    pub compression: Compression,
}
