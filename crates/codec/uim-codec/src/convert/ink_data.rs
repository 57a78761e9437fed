//! INKD chunk conversion: [`uim_model::ink`] strokes/splines <-> [`uim_proto`].
//!
//! Strokes get the full §4.5 treatment: position/size/rotation/scale/offset
//! columns are delta-coded zigzag varints when a non-zero
//! [`PrecisionScheme`] applies, plain floats otherwise; colour columns are
//! always unsigned bytes.

use uim_identity::PrecisionScheme;
use uim_model::ink::{LayoutMask, PathPointProperties, SensorDataMapping, Spline, Stroke, Style};
use uim_model::input::SensorChannelType;

use crate::error::{CodecError, Result};

use super::id::{
    hash_id_from_proto, hash_id_to_proto, opt_random_id_from_proto, opt_random_id_to_proto,
    random_id_from_proto, random_id_to_proto,
};

// ---------------------------------------------------------------------
// Column classification (§4.5).

#[derive(Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Position,
    Size,
    Rotation,
    Scale,
    Offset,
    Color,
}

fn bit_kind(bit: u32) -> ColumnKind {
    match bit {
        LayoutMask::X | LayoutMask::Y | LayoutMask::Z | LayoutMask::TANGENT_X | LayoutMask::TANGENT_Y => {
            ColumnKind::Position
        }
        LayoutMask::SIZE => ColumnKind::Size,
        LayoutMask::ROTATION => ColumnKind::Rotation,
        LayoutMask::SCALE_X | LayoutMask::SCALE_Y | LayoutMask::SCALE_Z => ColumnKind::Scale,
        LayoutMask::OFFSET_X | LayoutMask::OFFSET_Y | LayoutMask::OFFSET_Z => ColumnKind::Offset,
        LayoutMask::RED | LayoutMask::GREEN | LayoutMask::BLUE | LayoutMask::ALPHA => {
            ColumnKind::Color
        }
        other => unreachable!("layout mask bit {other:#x} has no column kind"),
    }
}

/// `(row offset, kind)` for every column in a spline row, in ascending
/// bit order (§4.5).
fn column_plan(mask: LayoutMask) -> Vec<(usize, ColumnKind)> {
    mask.columns()
        .into_iter()
        .enumerate()
        .map(|(offset, bit)| (offset, bit_kind(bit)))
        .collect()
}

fn precision_digits(precision: PrecisionScheme, kind: ColumnKind) -> u8 {
    match kind {
        ColumnKind::Position => precision.position(),
        ColumnKind::Size => precision.size(),
        ColumnKind::Rotation => precision.rotation(),
        ColumnKind::Scale => precision.scale(),
        ColumnKind::Offset => precision.offset(),
        ColumnKind::Color => 0,
    }
}

/// `round(value * 255)`, clamped, round-half-to-even (§9 Open Question c).
fn color_to_byte(value: f32) -> u32 {
    let scaled = (value.clamp(0.0, 1.0) as f64 * 255.0).round_ties_even();
    scaled.clamp(0.0, 255.0) as u32
}

fn byte_to_color(byte: u32) -> f32 {
    (byte.min(255) as f32) / 255.0
}

fn quantize(value: f32, digits: u8) -> i64 {
    (value as f64 * PrecisionScheme::scale_factor_for(digits)).round() as i64
}

fn dequantize(value: i64, digits: u8) -> f32 {
    (value as f64 / PrecisionScheme::scale_factor_for(digits)) as f32
}

/// Delta-codes a column's samples: absolute first value, then successive
/// differences (§4.5 "delta-encoded across samples for each attribute
/// stream").
fn delta_encode(values: &[i64]) -> Vec<i64> {
    let mut out = Vec::with_capacity(values.len());
    let mut previous = 0i64;
    for (i, value) in values.iter().enumerate() {
        out.push(if i == 0 { *value } else { value - previous });
        previous = *value;
    }
    out
}

fn delta_decode(deltas: &[i64]) -> Vec<i64> {
    let mut out = Vec::with_capacity(deltas.len());
    let mut running = 0i64;
    for (i, delta) in deltas.iter().enumerate() {
        running = if i == 0 { *delta } else { running + delta };
        out.push(running);
    }
    out
}

pub(crate) fn stroke_spline_to_proto(
    spline: &Spline,
    precision: Option<PrecisionScheme>,
) -> uim_proto::StrokeSpline {
    let row_len = spline.layout_mask.stride();
    let point_count = spline.point_count();
    let plan = column_plan(spline.layout_mask);
    let quantizing = precision.is_some_and(|p| !p.is_zero());

    let mut float_columns = Vec::new();
    let mut quantized_columns = Vec::new();
    let mut color_columns = Vec::new();

    for (offset, kind) in plan {
        let column: Vec<f32> = (0..point_count)
            .map(|point| spline.values[point * row_len + offset])
            .collect();
        match kind {
            ColumnKind::Color => {
                color_columns.extend(column.into_iter().map(color_to_byte));
            }
            _ if quantizing => {
                let digits = precision_digits(precision.expect("checked above"), kind);
                let ints: Vec<i64> = column.iter().map(|v| quantize(*v, digits)).collect();
                quantized_columns.extend(delta_encode(&ints));
            }
            _ => float_columns.extend(column),
        }
    }

    uim_proto::StrokeSpline {
        layout_mask: spline.layout_mask.bits(),
        point_count: point_count as u32,
        float_columns,
        quantized_columns,
        color_columns,
    }
}

pub(crate) fn stroke_spline_from_proto(
    proto: &uim_proto::StrokeSpline,
    precision: Option<PrecisionScheme>,
) -> Result<Spline> {
    let layout_mask = LayoutMask::new(proto.layout_mask)?;
    let point_count = proto.point_count as usize;
    let row_len = layout_mask.stride();
    let plan = column_plan(layout_mask);
    let quantizing = precision.is_some_and(|p| !p.is_zero());

    let mut values = vec![0.0f32; row_len * point_count];
    let mut float_cursor = 0usize;
    let mut quantized_cursor = 0usize;
    let mut color_cursor = 0usize;

    for (offset, kind) in plan {
        match kind {
            ColumnKind::Color => {
                let bytes = proto
                    .color_columns
                    .get(color_cursor..color_cursor + point_count)
                    .ok_or_else(|| {
                        CodecError::FormatError("stroke spline color column truncated".into())
                    })?;
                for (point, byte) in bytes.iter().enumerate() {
                    values[point * row_len + offset] = byte_to_color(*byte);
                }
                color_cursor += point_count;
            }
            _ if quantizing => {
                let digits = precision_digits(precision.expect("checked above"), kind);
                let deltas = proto
                    .quantized_columns
                    .get(quantized_cursor..quantized_cursor + point_count)
                    .ok_or_else(|| {
                        CodecError::FormatError("stroke spline quantized column truncated".into())
                    })?;
                let ints = delta_decode(deltas);
                for (point, value) in ints.iter().enumerate() {
                    values[point * row_len + offset] = dequantize(*value, digits);
                }
                quantized_cursor += point_count;
            }
            _ => {
                let column = proto
                    .float_columns
                    .get(float_cursor..float_cursor + point_count)
                    .ok_or_else(|| {
                        CodecError::FormatError("stroke spline float column truncated".into())
                    })?;
                for (point, value) in column.iter().enumerate() {
                    values[point * row_len + offset] = *value;
                }
                float_cursor += point_count;
            }
        }
    }

    let spline = Spline {
        layout_mask,
        values,
    };
    spline.validate()?;
    Ok(spline)
}

pub(crate) fn properties_to_proto(properties: &PathPointProperties) -> uim_proto::PathPointProperties {
    uim_proto::PathPointProperties {
        size: properties.size,
        red: properties.red,
        green: properties.green,
        blue: properties.blue,
        alpha: properties.alpha,
        rotation: properties.rotation,
        scale_x: properties.scale_x,
        scale_y: properties.scale_y,
        scale_z: properties.scale_z,
        offset_x: properties.offset_x,
        offset_y: properties.offset_y,
        offset_z: properties.offset_z,
    }
}

pub(crate) fn properties_from_proto(proto: &uim_proto::PathPointProperties) -> PathPointProperties {
    PathPointProperties {
        size: proto.size,
        red: proto.red,
        green: proto.green,
        blue: proto.blue,
        alpha: proto.alpha,
        rotation: proto.rotation,
        scale_x: proto.scale_x,
        scale_y: proto.scale_y,
        scale_z: proto.scale_z,
        offset_x: proto.offset_x,
        offset_y: proto.offset_y,
        offset_z: proto.offset_z,
    }
}

/// `properties_index` is this style's position in the model's
/// deduplicated [`uim_model::ink::PathPointPropertiesRepository`]
/// palette (§4.5 "indexed style palette"), resolved by the caller.
fn style_to_proto(style: &Style, properties_index: u32) -> uim_proto::Style {
    // The default render-mode-uri is never written out; absence on the
    // wire means "apply the default" on decode.
    let render_mode_uri = (style.render_mode_uri != Style::DEFAULT_RENDER_MODE_URI)
        .then(|| style.render_mode_uri.clone());
    uim_proto::Style {
        properties_index,
        brush_uri: style.brush_uri.clone(),
        particles_random_seed: style.particles_random_seed,
        render_mode_uri,
    }
}

/// Resolves `proto.properties_index` against `palette`, the INKD chunk's
/// decoded `InkData.properties` (§4.5 "indexed style palette").
fn style_from_proto(proto: &uim_proto::Style, palette: &[PathPointProperties]) -> Result<Style> {
    let properties = palette
        .get(proto.properties_index as usize)
        .cloned()
        .ok_or_else(|| {
            CodecError::FormatError(format!(
                "style references palette index {} but the palette has {} entries",
                proto.properties_index,
                palette.len()
            ))
        })?;
    let mut style = Style::new(properties, proto.brush_uri.clone());
    style.particles_random_seed = proto.particles_random_seed;
    if let Some(render_mode_uri) = &proto.render_mode_uri {
        style.render_mode_uri = render_mode_uri.clone();
    }
    Ok(style)
}

fn sensor_data_mapping_to_proto(mapping: &SensorDataMapping) -> Vec<uim_proto::SensorDataMappingEntry> {
    mapping
        .iter()
        .map(|(kind, channel_id)| uim_proto::SensorDataMappingEntry {
            channel_type_uri: kind.as_uri(),
            channel_id: Some(hash_id_to_proto(channel_id)),
        })
        .collect()
}

fn sensor_data_mapping_from_proto(entries: &[uim_proto::SensorDataMappingEntry]) -> Option<SensorDataMapping> {
    if entries.is_empty() {
        return None;
    }
    let mut mapping = SensorDataMapping::new();
    for entry in entries {
        if let Some(channel_id) = entry.channel_id.as_ref().map(hash_id_from_proto) {
            mapping.set(SensorChannelType::from_uri(&entry.channel_type_uri), channel_id);
        }
    }
    Some(mapping)
}

fn precision_to_proto(precision: PrecisionScheme) -> uim_proto::PrecisionScheme {
    uim_proto::PrecisionScheme {
        position: precision.position() as u32,
        size: precision.size() as u32,
        rotation: precision.rotation() as u32,
        scale: precision.scale() as u32,
        offset: precision.offset() as u32,
    }
}

fn precision_from_proto(proto: &uim_proto::PrecisionScheme) -> PrecisionScheme {
    PrecisionScheme::new(
        proto.position as u8,
        proto.size as u8,
        proto.rotation as u8,
        proto.scale as u8,
        proto.offset as u8,
    )
}

/// `properties_index` is the stroke's style's position in the model's
/// style-properties palette (§4.5 "indexed style palette"), resolved by
/// the caller against [`uim_model::ink::PathPointPropertiesRepository`].
pub(crate) fn stroke_to_proto(stroke: &Stroke, properties_index: u32) -> uim_proto::Stroke {
    // A zero-valued scheme is written as absent (§4.2 "encoder writes the
    // scheme only when any subfield is non-zero").
    let precision = stroke.precision.filter(|p| !p.is_zero());
    let sensor_data_mapping = stroke
        .sensor_data_mapping
        .as_ref()
        .map(sensor_data_mapping_to_proto)
        .unwrap_or_default();
    uim_proto::Stroke {
        id: Some(random_id_to_proto(stroke.id())),
        sensor_data_id: opt_random_id_to_proto(stroke.sensor_data_id),
        sensor_data_offset: stroke.sensor_data_offset,
        precision: precision.map(precision_to_proto),
        spline: Some(stroke_spline_to_proto(&stroke.spline, precision)),
        style: Some(style_to_proto(&stroke.style, properties_index)),
        random_seed: stroke.random_seed,
        sensor_data_mapping,
    }
}

/// `palette` is the INKD chunk's decoded `InkData.properties` table,
/// which every stroke's `Style.properties_index` is resolved against.
pub(crate) fn stroke_from_proto(proto: &uim_proto::Stroke, palette: &[PathPointProperties]) -> Result<Stroke> {
    let id = proto
        .id
        .as_ref()
        .map(random_id_from_proto)
        .unwrap_or_else(uim_identity::RandomId::new);
    let precision = proto.precision.as_ref().map(precision_from_proto);
    let spline = stroke_spline_from_proto(
        proto
            .spline
            .as_ref()
            .ok_or_else(|| CodecError::FormatError("stroke missing spline".into()))?,
        precision,
    )?;
    let style = match &proto.style {
        Some(style) => style_from_proto(style, palette)?,
        None => Style::new(PathPointProperties::default(), None),
    };

    let mut stroke = Stroke::new(spline, style);
    stroke = Stroke::with_id(id, stroke);
    stroke.sensor_data_id = opt_random_id_from_proto(&proto.sensor_data_id);
    stroke.sensor_data_offset = proto.sensor_data_offset;
    stroke.precision = precision;
    stroke.random_seed = proto.random_seed;
    stroke.sensor_data_mapping = sensor_data_mapping_from_proto(&proto.sensor_data_mapping);
    Ok(stroke)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unquantized_stroke_spline_round_trips() {
        let mask = LayoutMask::new(LayoutMask::XY | LayoutMask::SIZE | LayoutMask::RED).unwrap();
        let spline = Spline {
            layout_mask: mask,
            values: vec![0.0, 0.0, 1.0, 0.5, 1.0, 1.0, 2.0, 0.25],
        };
        let proto = stroke_spline_to_proto(&spline, None);
        let restored = stroke_spline_from_proto(&proto, None).unwrap();
        assert_eq!(restored.layout_mask, spline.layout_mask);
        assert_eq!(restored.point_count(), spline.point_count());
        for i in 0..spline.values.len() {
            assert!((restored.values[i] - spline.values[i]).abs() < 0.01);
        }
    }

    #[test]
    fn quantized_stroke_spline_round_trips_within_precision() {
        let mask = LayoutMask::new(LayoutMask::XY).unwrap();
        let values: Vec<f32> = (0..1000).map(|i| i as f32 * 0.0175).collect();
        let mut rows = Vec::with_capacity(values.len() * 2);
        for v in &values {
            rows.push(*v);
            rows.push(0.0);
        }
        let spline = Spline {
            layout_mask: mask,
            values: rows,
        };
        let precision = PrecisionScheme::new(2, 1, 0, 0, 0);
        let proto = stroke_spline_to_proto(&spline, Some(precision));
        assert!(proto.float_columns.is_empty());
        let restored = stroke_spline_from_proto(&proto, Some(precision)).unwrap();
        for i in 0..values.len() {
            assert!((restored.values[i * 2] - values[i]).abs() < 0.005);
        }
    }

    #[test]
    fn color_bytes_round_trip_within_one_255th() {
        assert_eq!(color_to_byte(1.0), 255);
        assert_eq!(color_to_byte(0.0), 0);
        assert!((byte_to_color(color_to_byte(0.6)) - 0.6).abs() < 1.0 / 255.0);
    }

    fn sample_stroke() -> Stroke {
        let spline = Spline {
            layout_mask: LayoutMask::new(LayoutMask::XY).unwrap(),
            values: vec![0.0, 0.0, 1.0, 1.0],
        };
        let mut properties = PathPointProperties::default();
        properties.size = 2.0;
        Stroke::new(spline, Style::new(properties, Some("app://brush".into())))
    }

    #[test]
    fn stroke_round_trips_through_an_indexed_style_palette() {
        let stroke = sample_stroke();
        let palette = vec![stroke.style.properties];
        let proto = stroke_to_proto(&stroke, 0);
        assert_eq!(proto.style.as_ref().unwrap().properties_index, 0);

        let restored = stroke_from_proto(&proto, &palette).unwrap();
        assert_eq!(restored.style.properties, stroke.style.properties);
        assert_eq!(restored.style.brush_uri, stroke.style.brush_uri);
    }

    #[test]
    fn stroke_from_proto_rejects_an_out_of_range_palette_index() {
        let stroke = sample_stroke();
        let proto = stroke_to_proto(&stroke, 3);
        let err = stroke_from_proto(&proto, &[]).unwrap_err();
        assert!(matches!(err, CodecError::FormatError(_)));
    }

    #[test]
    fn sensor_data_mapping_round_trips() {
        use uim_identity::HashId;

        let mut stroke = sample_stroke();
        let mut mapping = SensorDataMapping::new();
        mapping.set(SensorChannelType::Pressure, HashId::from_u128(7));
        stroke.sensor_data_mapping = Some(mapping);

        let palette = vec![stroke.style.properties];
        let proto = stroke_to_proto(&stroke, 0);
        assert_eq!(proto.sensor_data_mapping.len(), 1);

        let restored = stroke_from_proto(&proto, &palette).unwrap();
        let restored_mapping = restored.sensor_data_mapping.unwrap();
        assert_eq!(restored_mapping.get(&SensorChannelType::Pressure), Some(HashId::from_u128(7)));
    }

    #[test]
    fn absent_sensor_data_mapping_round_trips_to_none() {
        let stroke = sample_stroke();
        let palette = vec![stroke.style.properties];
        let proto = stroke_to_proto(&stroke, 0);
        let restored = stroke_from_proto(&proto, &palette).unwrap();
        assert!(restored.sensor_data_mapping.is_none());
    }
}
