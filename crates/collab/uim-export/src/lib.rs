//! Serialize-to-JSON / sensor-CSV export (§6 "External interfaces",
//! external collaborator). Read-only transforms over an [`InkModel`]'s
//! public value types; never mutates the model or writes to disk itself.

use std::fmt::Write as _;

use thiserror::Error;
use uim_identity::RandomId;
use uim_model::ink::{LayoutMask, Stroke};
use uim_model::input::SensorChannelType;
use uim_model::sensor::ChannelData;
use uim_model::tree::InkNode;
use uim_model::InkModel;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExportError {
    #[error("failed to render JSON: {0}")]
    Json(String),
    #[error("csv column {0:?} is not a known spline or sensor attribute")]
    UnknownColumn(&'static str),
    #[error("stroke is missing column {0:?} and the missing-data policy is THROW")]
    MissingColumn(&'static str),
}

#[derive(serde::Serialize)]
struct ExportedView<'a> {
    name: &'a str,
    root: Option<&'a InkNode>,
}

#[derive(serde::Serialize)]
struct ExportedDocument<'a> {
    unit_scale_factor: f64,
    transform: uim_units::Matrix4,
    properties: &'a [(String, String)],
    strokes: Vec<&'a Stroke>,
    vector_brushes: Vec<&'a uim_model::ink::VectorBrush>,
    raster_brushes: Vec<&'a uim_model::ink::RasterBrush>,
    main_tree: Option<&'a InkNode>,
    views: Vec<ExportedView<'a>>,
    triples: Vec<&'a uim_model::semantic::Triple>,
}

/// Renders `model`'s public value types as a JSON document (§6
/// "Serialize-to-JSON"). This is a plain data dump, not the protobuf-JSON
/// wire format `uim_codec::decode_json` reads.
pub fn to_json(model: &InkModel) -> Result<String, ExportError> {
    let document = ExportedDocument {
        unit_scale_factor: model.unit_scale_factor,
        transform: model.transform,
        properties: &model.properties,
        strokes: model.strokes.iter().map(|(_, stroke)| stroke).collect(),
        vector_brushes: model.brushes.vector_brushes().collect(),
        raster_brushes: model.brushes.raster_brushes().collect(),
        main_tree: model.main_tree().root(),
        views: model
            .views()
            .map(|view| ExportedView {
                name: view.name().unwrap_or(""),
                root: view.root(),
            })
            .collect(),
        triples: model.triples.iter().collect(),
    };
    serde_json::to_string_pretty(&document).map_err(|err| ExportError::Json(err.to_string()))
}

/// How a column absent from a stroke's own data is handled in a
/// strided-array export (§4.5 "strided-array export").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingPolicy {
    /// Fill the cell with `0`.
    FillWithZeros,
    /// Fill the cell with `NaN`.
    FillWithNan,
    /// Drop the stroke from the export entirely.
    SkipStroke,
    /// Fail the export.
    Throw,
}

/// Where a resolved column reads its values from: a fixed offset into
/// every point of the stroke's own spline, or a channel of the sensor
/// frame the stroke references.
enum ColumnSource<'a> {
    Spline(usize),
    Sensor(&'a ChannelData),
}

/// Exports `stroke`'s requested attribute layout as one strided `f64`
/// array, row-major with stride `layout.len()` (§4.5 "strided-array
/// export"). Spline-plane attributes (`X`, `Y`, `Z`, `SIZE`, colours,
/// rotations, scales, offsets, tangents) are read from `stroke.spline`;
/// sensor-plane attributes (`TIMESTAMP`, `PRESSURE`, `ALTITUDE`,
/// `AZIMUTH`, `RADIUS_X`, `RADIUS_Y`) are read from the sensor frame
/// `stroke.sensor_data_id` points at, via `stroke.sensor_data_mapping`
/// if set or by matching the frame's declared channel types otherwise.
/// Returns `Ok(None)` under [`MissingPolicy::SkipStroke`] when a
/// requested column isn't available for this stroke at all.
pub fn stroke_strided_export(
    model: &InkModel,
    stroke: &Stroke,
    layout: &[&'static str],
    missing: MissingPolicy,
) -> Result<Option<Vec<f64>>, ExportError> {
    let columns = match resolve_columns(model, stroke, layout, missing)? {
        Some(columns) => columns,
        None => return Ok(None),
    };

    let mut out = Vec::with_capacity(stroke.spline.point_count() * layout.len());
    for point_index in 0..stroke.spline.point_count() {
        for column in &columns {
            out.push(sample(stroke, column, point_index, missing));
        }
    }
    Ok(Some(out))
}

/// Exports every stroke in `model`, in `model.strokes`'s iteration
/// order, as one strided array each (§4.5, §6 "strided-array exports
/// (stroke-level and model-level)"). Strokes dropped under
/// [`MissingPolicy::SkipStroke`] are simply absent from the result.
pub fn model_strided_export(
    model: &InkModel,
    layout: &[&'static str],
    missing: MissingPolicy,
) -> Result<Vec<(RandomId, Vec<f64>)>, ExportError> {
    let mut out = Vec::new();
    for (id, stroke) in model.strokes.iter() {
        if let Some(values) = stroke_strided_export(model, stroke, layout, missing)? {
            out.push((id, values));
        }
    }
    Ok(out)
}

/// Exports `stroke`'s requested layout as CSV, one row per point (§4.5
/// "strided-array export"). Built on [`stroke_strided_export`]; `Ok(None)`
/// signals the same [`MissingPolicy::SkipStroke`] skip.
pub fn to_csv(
    model: &InkModel,
    stroke: &Stroke,
    layout: &[&'static str],
    missing: MissingPolicy,
) -> Result<Option<String>, ExportError> {
    let values = match stroke_strided_export(model, stroke, layout, missing)? {
        Some(values) => values,
        None => return Ok(None),
    };

    let mut out = String::new();
    writeln!(out, "{}", layout.join(",")).expect("String writes never fail");
    for row in values.chunks(layout.len()) {
        let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
        writeln!(out, "{}", cells.join(",")).expect("String writes never fail");
    }
    Ok(Some(out))
}

fn resolve_columns<'a>(
    model: &'a InkModel,
    stroke: &Stroke,
    layout: &[&'static str],
    missing: MissingPolicy,
) -> Result<Option<Vec<Option<ColumnSource<'a>>>>, ExportError> {
    let mut columns = Vec::with_capacity(layout.len());
    for &column in layout {
        let source = resolve_column(model, stroke, column)?;
        if source.is_none() {
            match missing {
                MissingPolicy::Throw => return Err(ExportError::MissingColumn(column)),
                MissingPolicy::SkipStroke => return Ok(None),
                MissingPolicy::FillWithZeros | MissingPolicy::FillWithNan => {}
            }
        }
        columns.push(source);
    }
    Ok(Some(columns))
}

fn resolve_column<'a>(
    model: &'a InkModel,
    stroke: &Stroke,
    column: &'static str,
) -> Result<Option<ColumnSource<'a>>, ExportError> {
    if let Some(bit) = spline_bit(column) {
        let mask = stroke.spline.layout_mask;
        if !mask.contains(bit) {
            return Ok(None);
        }
        let position = mask.columns().iter().position(|&b| b == bit).expect("checked above");
        return Ok(Some(ColumnSource::Spline(position)));
    }
    if let Some(kind) = sensor_kind(column) {
        return Ok(resolve_sensor_channel(model, stroke, &kind).map(ColumnSource::Sensor));
    }
    Err(ExportError::UnknownColumn(column))
}

/// Resolves a sensor attribute to the channel that supplies it: the
/// stroke's explicit mapping if it names one, else whichever of the
/// frame's channels declares that type in `model.input_config`.
fn resolve_sensor_channel<'a>(
    model: &'a InkModel,
    stroke: &Stroke,
    kind: &SensorChannelType,
) -> Option<&'a ChannelData> {
    let frame = model.sensor_data.get(stroke.sensor_data_id?).ok()?;
    if let Some(mapping) = &stroke.sensor_data_mapping {
        if let Some(channel_id) = mapping.get(kind) {
            return frame.channel(channel_id);
        }
    }
    frame.data_channels.iter().find(|channel| {
        model
            .input_config
            .channel(channel.sensor_channel_id)
            .map(|declared| &declared.channel_type == kind)
            .unwrap_or(false)
    })
}

fn sample(stroke: &Stroke, source: &Option<ColumnSource<'_>>, point_index: usize, missing: MissingPolicy) -> f64 {
    match source {
        Some(ColumnSource::Spline(i)) => {
            stroke.spline.point(point_index).expect("index within point_count")[*i] as f64
        }
        Some(ColumnSource::Sensor(channel)) => {
            let offset = stroke.sensor_data_offset as usize + point_index;
            channel.values.get(offset).copied().unwrap_or(fill_value(missing))
        }
        None => fill_value(missing),
    }
}

fn fill_value(missing: MissingPolicy) -> f64 {
    match missing {
        MissingPolicy::FillWithNan => f64::NAN,
        _ => 0.0,
    }
}

/// Resolves a named spline column (`"X"`, `"Y"`, or any [`LayoutMask`]
/// bit name) to its [`LayoutMask`] bit.
fn spline_bit(column: &str) -> Option<u32> {
    Some(match column {
        "X" => LayoutMask::X,
        "Y" => LayoutMask::Y,
        "Z" => LayoutMask::Z,
        "SIZE" => LayoutMask::SIZE,
        "RED" => LayoutMask::RED,
        "GREEN" => LayoutMask::GREEN,
        "BLUE" => LayoutMask::BLUE,
        "ALPHA" => LayoutMask::ALPHA,
        "ROTATION" => LayoutMask::ROTATION,
        "SCALE_X" => LayoutMask::SCALE_X,
        "SCALE_Y" => LayoutMask::SCALE_Y,
        "SCALE_Z" => LayoutMask::SCALE_Z,
        "OFFSET_X" => LayoutMask::OFFSET_X,
        "OFFSET_Y" => LayoutMask::OFFSET_Y,
        "OFFSET_Z" => LayoutMask::OFFSET_Z,
        "TANGENT_X" => LayoutMask::TANGENT_X,
        "TANGENT_Y" => LayoutMask::TANGENT_Y,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uim_model::ink::{PathPointProperties, Spline, Style};
    use uim_model::input::{Metric, SensorChannel, SensorDataType};
    use uim_model::sensor::{InkState, SensorData};
    use uim_model::tree::InkNode;

    fn sample_stroke() -> Stroke {
        let mask = LayoutMask::new(LayoutMask::XY | LayoutMask::SIZE).unwrap();
        let spline = Spline {
            layout_mask: mask,
            values: vec![0.0, 0.0, 1.0, 1.0, 1.0, 2.0],
        };
        Stroke::new(spline, Style::new(PathPointProperties::default(), None))
    }

    #[test]
    fn json_export_round_trips_basic_shape() {
        let mut model = InkModel::new();
        let stroke_id = model.add_stroke(sample_stroke());
        model
            .attach_main_tree(InkNode::new_group(vec![InkNode::new_stroke_ref(stroke_id, None)]))
            .unwrap();

        let json = to_json(&model).unwrap();
        assert!(json.contains("\"unit_scale_factor\""));
        assert!(json.contains("\"main_tree\""));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["strokes"].as_array().unwrap().len() == 1);
    }

    #[test]
    fn csv_export_uses_requested_column_order() {
        let model = InkModel::new();
        let stroke = sample_stroke();
        let csv = to_csv(&model, &stroke, &["X", "Y", "SIZE"], MissingPolicy::FillWithZeros)
            .unwrap()
            .unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("X,Y,SIZE"));
        assert_eq!(lines.next(), Some("0,0,1"));
        assert_eq!(lines.next(), Some("1,1,2"));
    }

    #[test]
    fn csv_export_fills_missing_columns_per_policy() {
        let model = InkModel::new();
        let stroke = sample_stroke();
        let csv = to_csv(&model, &stroke, &["X", "RED"], MissingPolicy::FillWithZeros)
            .unwrap()
            .unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("X,RED"));
        assert_eq!(lines.next(), Some("0,0"));
    }

    #[test]
    fn csv_export_fills_missing_columns_with_nan() {
        let model = InkModel::new();
        let stroke = sample_stroke();
        let csv = to_csv(&model, &stroke, &["RED"], MissingPolicy::FillWithNan)
            .unwrap()
            .unwrap();
        assert_eq!(csv.lines().nth(1), Some("NaN"));
    }

    #[test]
    fn missing_column_skips_the_stroke_under_skip_stroke_policy() {
        let model = InkModel::new();
        let stroke = sample_stroke();
        let csv = to_csv(&model, &stroke, &["RED"], MissingPolicy::SkipStroke).unwrap();
        assert!(csv.is_none());
    }

    #[test]
    fn missing_column_throws_under_throw_policy() {
        let model = InkModel::new();
        let stroke = sample_stroke();
        let err = to_csv(&model, &stroke, &["RED"], MissingPolicy::Throw).unwrap_err();
        assert!(matches!(err, ExportError::MissingColumn("RED")));
    }

    #[test]
    fn csv_export_rejects_unknown_column_names() {
        let model = InkModel::new();
        let stroke = sample_stroke();
        let err = to_csv(&model, &stroke, &["NOT_A_COLUMN"], MissingPolicy::FillWithZeros).unwrap_err();
        assert!(matches!(err, ExportError::UnknownColumn("NOT_A_COLUMN")));
    }

    fn sample_channel(channel_type: SensorChannelType) -> SensorChannel {
        SensorChannel {
            channel_type,
            metric: Metric::Force,
            resolution: 1.0,
            min: 0.0,
            max: 1.0,
            precision: 2,
            index: 0,
            name: "channel".to_owned(),
            data_type: SensorDataType::Float32,
            provider_id: None,
            device_id: None,
        }
    }

    #[test]
    fn sensor_column_resolves_by_declared_channel_type_without_a_mapping() {
        let mut model = InkModel::new();
        let channel = sample_channel(SensorChannelType::Pressure);
        let channel_id = model.input_config.add_channel(channel);

        let frame = SensorData::new(
            uim_identity::HashId::from_u128(1),
            InkState::Plane,
            0.0,
            vec![uim_model::sensor::ChannelData::new(channel_id, vec![0.1, 0.2, 0.3])],
        );
        let frame_id = model.sensor_data.insert(frame);

        let mut stroke = sample_stroke();
        stroke.sensor_data_id = Some(frame_id);
        let csv = to_csv(&model, &stroke, &["PRESSURE"], MissingPolicy::Throw)
            .unwrap()
            .unwrap();
        let mut lines = csv.lines().skip(1);
        assert_eq!(lines.next(), Some("0.1"));
        assert_eq!(lines.next(), Some("0.2"));
    }

    #[test]
    fn sensor_column_resolves_through_an_explicit_mapping() {
        use uim_model::ink::SensorDataMapping;

        let mut model = InkModel::new();
        // Two identically-typed channels; only the mapping disambiguates.
        let wrong = model.input_config.add_channel(sample_channel(SensorChannelType::Pressure));
        let right = model.input_config.add_channel(sample_channel(SensorChannelType::Pressure));

        let frame = SensorData::new(
            uim_identity::HashId::from_u128(1),
            InkState::Plane,
            0.0,
            vec![
                uim_model::sensor::ChannelData::new(wrong, vec![9.0, 9.0]),
                uim_model::sensor::ChannelData::new(right, vec![5.0, 6.0]),
            ],
        );
        let frame_id = model.sensor_data.insert(frame);

        let mut stroke = sample_stroke();
        stroke.sensor_data_id = Some(frame_id);
        let mut mapping = SensorDataMapping::new();
        mapping.set(SensorChannelType::Pressure, right);
        stroke.sensor_data_mapping = Some(mapping);

        let csv = to_csv(&model, &stroke, &["PRESSURE"], MissingPolicy::Throw)
            .unwrap()
            .unwrap();
        assert_eq!(csv.lines().nth(1), Some("5"));
    }

    #[test]
    fn model_level_export_skips_dropped_strokes_but_keeps_the_rest() {
        let mut model = InkModel::new();
        let complete = model.add_stroke(sample_stroke());
        let mut incomplete_spline_stroke = sample_stroke();
        incomplete_spline_stroke.spline.layout_mask = LayoutMask::new(LayoutMask::XY).unwrap();
        incomplete_spline_stroke.spline.values = vec![0.0, 0.0, 1.0, 1.0];
        model.add_stroke(incomplete_spline_stroke);

        let exported = model_strided_export(&model, &["X", "Y", "SIZE"], MissingPolicy::SkipStroke).unwrap();
        assert_eq!(exported.len(), 1);
        assert_eq!(exported[0].0, complete);
    }
}
