use std::fmt;
use std::str::FromStr;

use crate::IdentityError;

/// A 128-bit identifier, tagged with how it came to be.
///
/// Random identifiers are drawn uniformly at construction time and *are*
/// the identity of the thing they name (strokes, sensor-data frames, tree
/// nodes). Hashed identifiers are a deterministic digest of a value
/// object's contents (environments, devices, channels, contexts,
/// path-point-properties): two value objects with equal content always
/// produce equal hashed identifiers.
///
/// Map keys in this crate family are always the 128-bit value, never Rust
/// object identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Identifier {
    Random(u128),
    Hashed(u128),
}

impl Identifier {
    /// The raw 128-bit value, regardless of kind.
    #[inline]
    pub fn value(self) -> u128 {
        match self {
            Self::Random(v) | Self::Hashed(v) => v,
        }
    }

    #[inline]
    pub fn is_random(self) -> bool {
        matches!(self, Self::Random(_))
    }

    #[inline]
    pub fn is_hashed(self) -> bool {
        matches!(self, Self::Hashed(_))
    }

    /// Lowercase 32-char hex, no separators.
    pub fn to_s_form(self) -> String {
        format!("{:032x}", self.value())
    }

    /// Lowercase 8-4-4-4-12 hex, dash-separated.
    pub fn to_h_form(self) -> String {
        let s = self.to_s_form();
        format!(
            "{}-{}-{}-{}-{}",
            &s[0..8],
            &s[8..12],
            &s[12..16],
            &s[16..20],
            &s[20..32]
        )
    }

    /// Parses either an S-form (32 hex chars) or H-form (8-4-4-4-12) string
    /// into a raw 128-bit value. Does not know (and cannot know, from the
    /// string alone) whether the value was originally random or hashed —
    /// callers reconstruct the tagged [`Identifier`] from context.
    pub fn parse_value(s: &str) -> Result<u128, IdentityError> {
        let hex: String = s.chars().filter(|c| *c != '-').collect();
        if hex.len() != 32 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(IdentityError::MalformedIdentifier(s.to_owned()));
        }
        u128::from_str_radix(&hex, 16)
            .map_err(|_| IdentityError::MalformedIdentifier(s.to_owned()))
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Random(_) => write!(f, "Identifier::Random({})", self.to_h_form()),
            Self::Hashed(_) => write!(f, "Identifier::Hashed({})", self.to_h_form()),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_h_form())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Identifier {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_h_form())
    }
}

/// A mutable-leaf identity: strokes, sensor-data frames, tree nodes, named
/// entities. Drawn uniformly at random; never recomputed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RandomId(Identifier);

impl RandomId {
    pub fn new() -> Self {
        Self(Identifier::Random(rand::random()))
    }

    #[inline]
    pub fn id(self) -> Identifier {
        self.0
    }

    #[inline]
    pub fn from_u128(value: u128) -> Self {
        Self(Identifier::Random(value))
    }

    pub fn to_s_form(self) -> String {
        self.0.to_s_form()
    }

    pub fn to_h_form(self) -> String {
        self.0.to_h_form()
    }
}

impl Default for RandomId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RandomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RandomId({})", self.to_h_form())
    }
}

impl fmt::Display for RandomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_h_form())
    }
}

impl FromStr for RandomId {
    type Err = IdentityError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_u128(Identifier::parse_value(s)?))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RandomId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

/// A value-object identity: the deterministic MD5-derived digest of a
/// value object's canonical component list (§3.1, §4.1). Never drawn at
/// random; always produced by [`crate::HashBuilder::finish`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HashId(Identifier);

impl HashId {
    pub(crate) fn from_digest(value: u128) -> Self {
        Self(Identifier::Hashed(value))
    }

    #[inline]
    pub fn id(self) -> Identifier {
        self.0
    }

    #[inline]
    pub fn from_u128(value: u128) -> Self {
        Self(Identifier::Hashed(value))
    }

    pub fn to_s_form(self) -> String {
        self.0.to_s_form()
    }

    pub fn to_h_form(self) -> String {
        self.0.to_h_form()
    }
}

impl fmt::Debug for HashId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashId({})", self.to_h_form())
    }
}

impl fmt::Display for HashId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_h_form())
    }
}

impl FromStr for HashId {
    type Err = IdentityError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_u128(Identifier::parse_value(s)?))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for HashId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s_form_and_h_form_round_trip() {
        let id = RandomId::new();
        let s = id.to_s_form();
        assert_eq!(s.len(), 32);
        let h = id.to_h_form();
        assert_eq!(h.len(), 36);
        assert_eq!(Identifier::parse_value(&s).unwrap(), id.id().value());
        assert_eq!(Identifier::parse_value(&h).unwrap(), id.id().value());
    }

    #[test]
    fn random_ids_are_not_equal() {
        assert_ne!(RandomId::new(), RandomId::new());
    }

    #[test]
    fn rejects_malformed() {
        assert!(Identifier::parse_value("not-an-id").is_err());
        assert!(Identifier::parse_value("00112233445566778899aabbccddee").is_err());
    }
}
