//! DATA chunk conversion: [`uim_model::sensor`] <-> [`uim_proto`].

use uim_model::input::InputConfigRepository;
use uim_model::sensor::{ChannelData, InkState, SensorData, SensorDataRepository};

use crate::error::{CodecError, Result};

use super::id::{hash_id_from_proto, hash_id_to_proto, random_id_from_proto, random_id_to_proto};

fn state_to_proto(state: InkState) -> i32 {
    use uim_proto::InkState as P;
    (match state {
        InkState::Plane => P::Plane,
        InkState::Hovering => P::Hovering,
        InkState::InVolume => P::InVolume,
        InkState::VolumeHovering => P::VolumeHovering,
        InkState::StartTracking => P::StartTracking,
        InkState::StopTracking => P::StopTracking,
    }) as i32
}

fn state_from_proto(tag: i32) -> Result<InkState> {
    use uim_proto::InkState as P;
    match P::try_from(tag) {
        Ok(P::Plane) => Ok(InkState::Plane),
        Ok(P::Hovering) => Ok(InkState::Hovering),
        Ok(P::InVolume) => Ok(InkState::InVolume),
        Ok(P::VolumeHovering) => Ok(InkState::VolumeHovering),
        Ok(P::StartTracking) => Ok(InkState::StartTracking),
        Ok(P::StopTracking) => Ok(InkState::StopTracking),
        _ => Err(CodecError::FormatError(format!("unknown ink state tag {tag}"))),
    }
}

pub(crate) fn to_proto(repo: &SensorDataRepository) -> uim_proto::SensorDataStore {
    uim_proto::SensorDataStore {
        frames: repo
            .iter()
            .map(|(id, frame)| uim_proto::SensorData {
                id: Some(random_id_to_proto(id)),
                input_context_id: Some(hash_id_to_proto(frame.input_context_id)),
                state: state_to_proto(frame.state),
                timestamp_ms_first_sample: frame.timestamp_ms_first_sample,
                data_channels: frame
                    .data_channels
                    .iter()
                    .map(|channel| uim_proto::ChannelData {
                        sensor_channel_id: Some(hash_id_to_proto(channel.sensor_channel_id)),
                        deltas: channel.deltas(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

pub(crate) fn from_proto(
    proto: &uim_proto::SensorDataStore,
    input_config: &InputConfigRepository,
) -> Result<SensorDataRepository> {
    let mut repo = SensorDataRepository::new();
    for frame in &proto.frames {
        let input_context_id = frame
            .input_context_id
            .as_ref()
            .map(hash_id_from_proto)
            .ok_or_else(|| CodecError::FormatError("sensor data frame missing input_context_id".into()))?;
        let data_channels = frame
            .data_channels
            .iter()
            .map(|channel| {
                let sensor_channel_id = channel
                    .sensor_channel_id
                    .as_ref()
                    .map(hash_id_from_proto)
                    .ok_or_else(|| {
                        CodecError::FormatError("channel data missing sensor_channel_id".into())
                    })?;
                let data = ChannelData::from_deltas(sensor_channel_id, &channel.deltas);
                if let Ok(sensor_channel) = input_config.channel(sensor_channel_id) {
                    for value in &data.values {
                        if !sensor_channel.in_bounds(*value) {
                            return Err(CodecError::OutOfRange {
                                field: "sensor channel value",
                                value: *value,
                                min: sensor_channel.min,
                                max: sensor_channel.max,
                            });
                        }
                    }
                }
                Ok(data)
            })
            .collect::<Result<Vec<_>>>()?;
        let mut data = SensorData::new(
            input_context_id,
            state_from_proto(frame.state)?,
            frame.timestamp_ms_first_sample,
            data_channels,
        );
        if let Some(id) = &frame.id {
            // Preserve the document's original frame identity rather than
            // minting a fresh one, so strokes referencing it still resolve.
            data = preserve_id(data, random_id_from_proto(id));
        }
        repo.insert(data);
    }
    Ok(repo)
}

fn preserve_id(data: SensorData, id: uim_identity::RandomId) -> SensorData {
    // `SensorData` only grants a fresh id through `new`; decoding needs to
    // restore exactly the id the document was written with.
    uim_model::sensor::SensorData::with_id(id, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uim_model::input::{Metric, SensorChannel, SensorChannelType, SensorDataType};

    fn pressure_channel() -> SensorChannel {
        SensorChannel {
            channel_type: SensorChannelType::Pressure,
            metric: Metric::Normalized,
            resolution: 1.0,
            min: 0.0,
            max: 1.0,
            precision: 2,
            index: 0,
            name: "pressure".to_owned(),
            data_type: SensorDataType::Float32,
            provider_id: None,
            device_id: None,
        }
    }

    fn frame_with_values(sensor_channel_id: uim_identity::HashId, values: &[f64]) -> uim_proto::SensorDataStore {
        uim_proto::SensorDataStore {
            frames: vec![uim_proto::SensorData {
                id: None,
                input_context_id: Some(hash_id_to_proto(uim_identity::HashId::from_u128(1))),
                state: state_to_proto(InkState::Plane),
                timestamp_ms_first_sample: 0.0,
                data_channels: vec![uim_proto::ChannelData {
                    sensor_channel_id: Some(hash_id_to_proto(sensor_channel_id)),
                    deltas: ChannelData::new(sensor_channel_id, values.to_vec()).deltas(),
                }],
            }],
        }
    }

    #[test]
    fn in_bounds_values_decode_successfully() {
        let channel = pressure_channel();
        let channel_id = channel.id();
        let mut config = InputConfigRepository::new();
        config.add_channel(channel);

        let proto = frame_with_values(channel_id, &[0.0, 0.5, 1.0]);
        assert!(from_proto(&proto, &config).is_ok());
    }

    #[test]
    fn out_of_bounds_value_is_rejected() {
        let channel = pressure_channel();
        let channel_id = channel.id();
        let mut config = InputConfigRepository::new();
        config.add_channel(channel);

        let proto = frame_with_values(channel_id, &[0.0, 1.5]);
        let err = from_proto(&proto, &config).unwrap_err();
        assert!(matches!(err, CodecError::OutOfRange { .. }));
    }
}
