use md5::{Digest as _, Md5};

use crate::HashId;

/// Builds the tagged, NUL-separated component stream that §4.1 hashes with
/// MD5 into a [`HashId`].
///
/// ```
/// use uim_identity::HashBuilder;
///
/// let a = HashBuilder::new("Environment").push_str("k").push_str("v").finish();
/// let b = HashBuilder::new("Environment").push_str("k").push_str("v").finish();
/// assert_eq!(a, b);
/// ```
pub struct HashBuilder {
    data: Vec<u8>,
}

impl HashBuilder {
    pub fn new(tag: &str) -> Self {
        let mut data = Vec::with_capacity(64);
        data.extend_from_slice(tag.as_bytes());
        data.push(0);
        Self { data }
    }

    /// Appends a raw UTF-8 component, separator included.
    pub fn push_str(mut self, s: &str) -> Self {
        self.data.extend_from_slice(s.as_bytes());
        self.data.push(0);
        self
    }

    /// Appends an absent optional component: still contributes the
    /// separator so that `None` and `Some("")` are distinguishable from
    /// the surrounding fixed tag/component layout is not, by design —
    /// absent components hash identically to empty ones, as prescribed by
    /// §4.1's "absent optional components contribute an empty token".
    pub fn push_opt_str(self, s: Option<&str>) -> Self {
        self.push_str(s.unwrap_or(""))
    }

    pub fn push_int(self, v: i64) -> Self {
        self.push_str(&v.to_string())
    }

    pub fn push_opt_int(self, v: Option<i64>) -> Self {
        match v {
            Some(v) => self.push_int(v),
            None => self.push_str(""),
        }
    }

    /// Canonicalizes to six decimal digits, trimming trailing zeros (and a
    /// trailing decimal point), per §4.1.
    pub fn push_float(self, v: f64) -> Self {
        self.push_str(&canonical_float(v))
    }

    pub fn push_opt_float(self, v: Option<f64>) -> Self {
        match v {
            Some(v) => self.push_float(v),
            None => self.push_str(""),
        }
    }

    pub fn finish(self) -> HashId {
        let digest = Md5::digest(&self.data);
        let bytes: [u8; 16] = digest.into();
        HashId::from_digest(u128::from_be_bytes(bytes))
    }
}

fn canonical_float(v: f64) -> String {
    if v == 0.0 {
        return "0".to_owned();
    }
    let s = format!("{v:.6}");
    let trimmed = s.trim_end_matches('0');
    let trimmed = trimmed.trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_owned()
    } else {
        trimmed.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_content_hashes_equal() {
        let a = HashBuilder::new("Environment")
            .push_str("os")
            .push_str("windows")
            .finish();
        let b = HashBuilder::new("Environment")
            .push_str("os")
            .push_str("windows")
            .finish();
        assert_eq!(a, b);
    }

    #[test]
    fn changing_a_component_changes_the_id() {
        let a = HashBuilder::new("Environment").push_str("os").finish();
        let b = HashBuilder::new("Environment").push_str("linux").finish();
        assert_ne!(a, b);
    }

    #[test]
    fn absent_optional_hashes_like_empty_string() {
        let a = HashBuilder::new("SensorChannel").push_opt_str(None).finish();
        let b = HashBuilder::new("SensorChannel")
            .push_opt_str(Some(""))
            .finish();
        assert_eq!(a, b);
    }

    #[test]
    fn float_canonicalization_trims_trailing_zeros() {
        assert_eq!(canonical_float(1.5), "1.5");
        assert_eq!(canonical_float(1.0), "1");
        assert_eq!(canonical_float(0.0), "0");
        assert_eq!(canonical_float(-0.0), "0");
        assert_eq!(canonical_float(0.123456789), "0.123457");
    }

    #[test]
    fn different_tags_produce_different_ids_for_same_components() {
        let a = HashBuilder::new("InputDevice").push_str("x").finish();
        let b = HashBuilder::new("InputContext").push_str("x").finish();
        assert_ne!(a, b);
    }
}
