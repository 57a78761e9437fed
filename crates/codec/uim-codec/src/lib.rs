//! RIFF/protobuf codec for Universal Ink Model documents (§4.9): reads
//! and writes the `.uim` container format, normalizing both the current
//! 3.1.0 layout and the legacy 3.0.0 single-message layout into the same
//! [`uim_model::InkModel`].
//!
//! This crate owns byte-level framing, compression, and the protobuf
//! wire mapping; every cross-reference invariant (I1-I5) is
//! [`uim_model::InkModel::validate`]'s job, not this one's.

mod compression;
mod config;
mod convert;
mod error;
mod riff;

/// The legacy WILL 2.0 reader is out of scope (§1 Non-goals, §6): this
/// module exists only so the crate's public tree matches the documented
/// file-extension/MIME surface without pretending to support it.
pub mod will {}

pub use config::{Compression, ContentType, DecodeOptions, EncodeOptions};
pub use error::{CodecError, Result};

use prost::Message;
use uim_model::{semantic, InkModel, Version};

use riff::{Chunk, ChunkWriter};

/// Serializes `model` as a `.uim` byte stream (§4.9 "Encoder contract"):
/// validates I1-I5, then writes the fixed chunk order under one RIFF
/// envelope. Always writes the current 3.1.0 container layout (§1
/// Non-goals: no writer for the legacy 3.0.0 single-message layout;
/// that format is read-only, see [`decode_legacy`]).
pub fn encode(model: &InkModel, options: EncodeOptions) -> Result<Vec<u8>> {
    model.validate()?;

    let mut writer = ChunkWriter::new();
    writer.push(
        riff::HEAD,
        vec![
            3,
            1,
            0,
            0,
            ContentType::Protobuf.tag(),
            options.compression.tag(),
            0,
            0,
        ],
    );

    // DATA carries no payload of its own in the current layout; it only
    // marks where the chunk body begins (§4.9).
    writer.push(riff::DATA, Vec::new());
    push_section(&mut writer, riff::INPT, &input_section_proto(model), options.compression)?;
    push_section(
        &mut writer,
        riff::BRSH,
        &convert::brushes::to_proto(&model.brushes),
        options.compression,
    )?;
    push_section(&mut writer, riff::INKD, &ink_data_proto(model), options.compression)?;
    push_section(
        &mut writer,
        riff::INKS,
        &ink_structure_proto(model),
        options.compression,
    )?;
    push_section(
        &mut writer,
        riff::KNWG,
        &convert::triples::to_proto(&model.triples),
        options.compression,
    )?;
    push_section(&mut writer, riff::PRPS, &properties_proto(model), options.compression)?;

    let bytes = writer.finish();
    tracing::debug!(bytes = bytes.len(), version = "3.1.0", "encoded uim document");
    Ok(bytes)
}

/// Parses a `.uim` byte stream into an [`InkModel`] (§4.9 "Failure
/// semantics of the codec"), upgrading a legacy 3.0.0 document into the
/// current in-memory shape along the way.
pub fn decode(bytes: &[u8], options: DecodeOptions) -> Result<InkModel> {
    let chunks = riff::read_chunks(bytes)?;
    let head = riff::find(&chunks, riff::HEAD)
        .ok_or_else(|| CodecError::FormatError("missing HEAD chunk".into()))?;
    if head.payload.len() != 8 {
        return Err(CodecError::FormatError(format!(
            "HEAD chunk has {} bytes, expected 8",
            head.payload.len()
        )));
    }

    let major = head.payload[0];
    let minor = head.payload[1];
    let patch = head.payload[2];
    let content_type = ContentType::from_tag(head.payload[4]).ok_or_else(|| {
        CodecError::FormatError(format!("unknown content-type tag {:#x}", head.payload[4]))
    })?;
    if content_type != ContentType::Protobuf {
        return Err(CodecError::FormatError(format!(
            "RIFF decode only supports protobuf-framed documents, found {content_type:?}"
        )));
    }
    let compression = Compression::from_tag(head.payload[5])
        .ok_or(CodecError::UnsupportedCompression(head.payload[5]))?;

    let version = match (major, minor, patch) {
        (3, 1, 0) => Version::V3_1_0,
        (3, 0, 0) => Version::V3_0_0,
        _ => {
            return Err(CodecError::UnsupportedVersion {
                found: format!("{major}.{minor}.{patch}"),
                supported: &["3.0.0", "3.1.0"],
            })
        }
    };

    let mut model = match version {
        Version::V3_1_0 => decode_current(&chunks, compression)?,
        Version::V3_0_0 => decode_legacy(&chunks, compression)?,
    };
    model.version = version;

    if let Err(err) = model.validate() {
        if options.lenient {
            tracing::warn!(error = %err, "lenient decode: returning a model that failed validation");
        } else {
            return Err(err.into());
        }
    }

    Ok(model)
}

fn decode_current(chunks: &[Chunk], compression: Compression) -> Result<InkModel> {
    let input_section: uim_proto::InputSection = chunk_message(chunks, riff::INPT, compression, "INPT")?;
    let brushes: uim_proto::Brushes = chunk_message(chunks, riff::BRSH, compression, "BRSH")?;
    let ink_data: uim_proto::InkData = chunk_message(chunks, riff::INKD, compression, "INKD")?;
    let ink_structure: uim_proto::InkStructure =
        chunk_message(chunks, riff::INKS, compression, "INKS")?;
    let triples: uim_proto::TripleStore = chunk_message(chunks, riff::KNWG, compression, "KNWG")?;
    let properties: uim_proto::Properties = chunk_message(chunks, riff::PRPS, compression, "PRPS")?;

    assemble_model(
        false,
        input_section.input_configuration.unwrap_or_default(),
        input_section.sensor_data.unwrap_or_default(),
        brushes,
        ink_data,
        ink_structure,
        triples,
        properties,
    )
}

fn decode_legacy(chunks: &[Chunk], compression: Compression) -> Result<InkModel> {
    let doc: uim_proto::LegacyDocument = chunk_message(chunks, riff::DATA, compression, "DATA")?;
    assemble_model(
        true,
        doc.input_configuration.unwrap_or_default(),
        doc.sensor_data.unwrap_or_default(),
        doc.brushes.unwrap_or_default(),
        doc.ink_data.unwrap_or_default(),
        doc.ink_structure.unwrap_or_default(),
        doc.triples.unwrap_or_default(),
        doc.properties.unwrap_or_default(),
    )
}

/// Builds an [`InkModel`] from the decoded section messages, in the
/// order the model's own invariants require: strokes before trees, trees
/// before the triples that name their nodes (§4.8, §4.7). `legacy`
/// selects the 3.0.0 subject-URI rewrite (§4.7 "legacy 3.0.0 form").
fn assemble_model(
    legacy: bool,
    input_configuration: uim_proto::InputConfiguration,
    sensor_data: uim_proto::SensorDataStore,
    brushes: uim_proto::Brushes,
    ink_data: uim_proto::InkData,
    ink_structure: uim_proto::InkStructure,
    triples: uim_proto::TripleStore,
    properties: uim_proto::Properties,
) -> Result<InkModel> {
    let mut model = InkModel::new();

    let properties = convert::properties::from_proto(&properties)?;
    model.properties = properties.entries;
    model.unit_scale_factor = properties.unit_scale_factor;
    model.transform = properties.transform;

    model.input_config = convert::input::from_proto(&input_configuration)?;
    model.sensor_data = convert::sensor_data::from_proto(&sensor_data, &model.input_config)?;
    model.brushes = convert::brushes::from_proto(&brushes)?;

    let palette: Vec<_> = ink_data
        .properties
        .iter()
        .map(convert::ink_data::properties_from_proto)
        .collect();
    for stroke_proto in &ink_data.strokes {
        let stroke = convert::ink_data::stroke_from_proto(stroke_proto, &palette)?;
        model.add_stroke(stroke);
    }

    if let Some(main_tree_proto) = &ink_structure.main_tree {
        let tree = convert::ink_structure::main_tree_from_proto(main_tree_proto)?;
        if let Some(root) = tree.root() {
            model.attach_main_tree(root.clone())?;
        }
    }
    for view_proto in &ink_structure.views {
        let tree = convert::ink_structure::view_tree_from_proto(view_proto)?;
        if let (Some(name), Some(root)) = (tree.name(), tree.root()) {
            model.attach_view(name.to_owned(), root.clone())?;
        }
    }

    for triple in &triples.triples {
        let subject = if legacy {
            semantic::upgrade_legacy_uri(&triple.subject)
        } else {
            triple.subject.clone()
        };
        model.add_triple(semantic::Triple::new(
            subject,
            triple.predicate.clone(),
            triple.object.clone(),
        ))?;
    }

    Ok(model)
}

fn input_section_proto(model: &InkModel) -> uim_proto::InputSection {
    uim_proto::InputSection {
        input_configuration: Some(convert::input::to_proto(&model.input_config)),
        sensor_data: Some(convert::sensor_data::to_proto(&model.sensor_data)),
    }
}

fn ink_data_proto(model: &InkModel) -> uim_proto::InkData {
    let properties = model
        .path_point_properties
        .iter()
        .map(|(_, properties)| convert::ink_data::properties_to_proto(properties))
        .collect();

    let strokes = model
        .strokes
        .iter()
        .map(|(_, stroke)| {
            let index = model
                .path_point_properties
                .index_of(stroke.style.properties.id())
                .expect("InkModel::add_stroke keeps the palette current") as u32;
            convert::ink_data::stroke_to_proto(stroke, index)
        })
        .collect();

    uim_proto::InkData { strokes, properties }
}

fn ink_structure_proto(model: &InkModel) -> uim_proto::InkStructure {
    uim_proto::InkStructure {
        main_tree: Some(convert::ink_structure::tree_to_proto(model.main_tree())),
        views: model.views().map(convert::ink_structure::tree_to_proto).collect(),
    }
}

fn properties_proto(model: &InkModel) -> uim_proto::Properties {
    convert::properties::to_proto(&convert::properties::Properties {
        entries: model.properties.clone(),
        unit_scale_factor: model.unit_scale_factor,
        transform: model.transform,
    })
}

fn push_section<M: Message>(
    writer: &mut ChunkWriter,
    tag: &[u8; 4],
    message: &M,
    compression: Compression,
) -> Result<()> {
    let bytes = message.encode_to_vec();
    let compressed = compression::compress(compression, &bytes)?;
    writer.push(tag, compressed);
    Ok(())
}

fn chunk_message<M: Message + Default>(
    chunks: &[Chunk],
    tag: &[u8; 4],
    compression: Compression,
    name: &'static str,
) -> Result<M> {
    let chunk = riff::find(chunks, tag)
        .ok_or_else(|| CodecError::FormatError(format!("missing {name} chunk")))?;
    let bytes = compression::decompress(compression, &chunk.payload)?;
    M::decode(bytes.as_slice()).map_err(|source| CodecError::ProtoDecode { chunk: name, source })
}

/// Reads a protobuf-JSON document (§4.9 "File extensions", `.json`): the
/// current-version section messages serialized through serde_json
/// instead of the binary wire format. Read-only, 3.1.0 only.
pub fn decode_json(json: &str) -> Result<InkModel> {
    let doc: uim_proto::LegacyDocument = serde_json::from_str(json)
        .map_err(|source| CodecError::FormatError(format!("invalid protobuf-JSON document: {source}")))?;
    assemble_model(
        false,
        doc.input_configuration.unwrap_or_default(),
        doc.sensor_data.unwrap_or_default(),
        doc.brushes.unwrap_or_default(),
        doc.ink_data.unwrap_or_default(),
        doc.ink_structure.unwrap_or_default(),
        doc.triples.unwrap_or_default(),
        doc.properties.unwrap_or_default(),
    )
}
