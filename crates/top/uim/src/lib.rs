//! Universal Ink Model: the top-level facade over the workspace's model
//! and codec crates (§6 "External interfaces").
//!
//! This crate re-exports the public surface a consumer actually needs —
//! the document model, its identifiers and errors, and the three entry
//! points for moving bytes in and out of a [`InkModel`] — so that typical
//! callers depend on `uim` alone rather than reaching into `uim-model`,
//! `uim-codec`, `uim-identity`, and `uim-units` individually.

use std::path::Path;

pub use uim_codec::{Compression, ContentType, DecodeOptions, EncodeOptions};
pub use uim_codec::{CodecError, Result};
pub use uim_identity::{HashId, Identifier, IdentityError, PrecisionScheme, RandomId};
pub use uim_model::{ink, input, semantic, sensor, tree};
pub use uim_model::{InkModel, ModelError, Version};
pub use uim_units::{convert, Matrix4, Unit, UnitsError};

/// Parses a `.uim` byte stream into an [`InkModel`] (§6 "parse").
pub fn parse(bytes: &[u8], options: DecodeOptions) -> Result<InkModel> {
    uim_codec::decode(bytes, options)
}

/// Serializes `model` as a `.uim` byte stream (§6 "encode").
pub fn encode(model: &InkModel, options: EncodeOptions) -> Result<Vec<u8>> {
    uim_codec::encode(model, options)
}

/// Reads and parses a protobuf-JSON document (§6 "parse_json", §4.9 "File
/// extensions" `.json`). Read-only, current-version only.
pub fn parse_json(path: impl AsRef<Path>) -> Result<InkModel> {
    let text = std::fs::read_to_string(path)?;
    uim_codec::decode_json(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uim_model::ink::{LayoutMask, PathPointProperties, Spline, Style};
    use uim_model::tree::InkNode;

    #[test]
    fn facade_encode_and_parse_round_trip() {
        let mut model = InkModel::new();
        let spline = Spline {
            layout_mask: LayoutMask::new(LayoutMask::XY).unwrap(),
            values: vec![0.0, 0.0, 1.0, 1.0],
        };
        let stroke = ink::Stroke::new(spline, Style::new(PathPointProperties::default(), None));
        let stroke_id = model.add_stroke(stroke);
        model
            .attach_main_tree(InkNode::new_group(vec![InkNode::new_stroke_ref(stroke_id, None)]))
            .unwrap();

        let bytes = encode(&model, EncodeOptions::default()).unwrap();
        let restored = parse(&bytes, DecodeOptions::strict()).unwrap();
        assert_eq!(restored.strokes.len(), 1);
    }

    #[test]
    fn parse_json_reads_a_file_from_disk() {
        let dir = std::env::temp_dir().join(format!("uim-facade-test-{}", RandomId::new()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("empty.json");
        std::fs::write(&path, "{}").unwrap();

        let model = parse_json(&path).unwrap();
        assert!(model.strokes.is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }
}
