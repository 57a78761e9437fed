//! INPT chunk conversion: [`uim_model::input`] <-> [`uim_proto`].

use uim_model::input::{
    Environment, InkInputProvider, InkInputProviderType, InputConfigRepository, InputContext,
    InputDevice, Metric, SensorChannel, SensorChannelType, SensorChannelsContext, SensorContext,
    SensorDataType,
};

use crate::error::{CodecError, Result};

use super::id::{
    hash_id_from_proto, hash_id_to_proto, opt_hash_id_from_proto, opt_hash_id_to_proto,
};

fn properties_to_proto(properties: &[(String, String)]) -> Vec<uim_proto::Property> {
    properties
        .iter()
        .map(|(key, value)| uim_proto::Property {
            key: key.clone(),
            value: value.clone(),
        })
        .collect()
}

fn properties_from_proto(properties: &[uim_proto::Property]) -> Vec<(String, String)> {
    properties
        .iter()
        .map(|p| (p.key.clone(), p.value.clone()))
        .collect()
}

fn provider_type_to_proto(ty: InkInputProviderType) -> i32 {
    use uim_proto::InkInputProviderType as P;
    (match ty {
        InkInputProviderType::Pen => P::Pen,
        InkInputProviderType::Touch => P::Touch,
        InkInputProviderType::Mouse => P::Mouse,
        InkInputProviderType::Controller => P::Controller,
    }) as i32
}

fn provider_type_from_proto(tag: i32) -> Result<InkInputProviderType> {
    use uim_proto::InkInputProviderType as P;
    match P::try_from(tag) {
        Ok(P::Pen) => Ok(InkInputProviderType::Pen),
        Ok(P::Touch) => Ok(InkInputProviderType::Touch),
        Ok(P::Mouse) => Ok(InkInputProviderType::Mouse),
        Ok(P::Controller) => Ok(InkInputProviderType::Controller),
        _ => Err(CodecError::FormatError(format!(
            "unknown input provider type tag {tag}"
        ))),
    }
}

fn metric_to_proto(metric: Metric) -> i32 {
    use uim_proto::Metric as P;
    (match metric {
        Metric::Length => P::Length,
        Metric::Time => P::Time,
        Metric::Force => P::Force,
        Metric::Angle => P::Angle,
        Metric::Normalized => P::Normalized,
    }) as i32
}

fn metric_from_proto(tag: i32) -> Result<Metric> {
    use uim_proto::Metric as P;
    match P::try_from(tag) {
        Ok(P::Length) => Ok(Metric::Length),
        Ok(P::Time) => Ok(Metric::Time),
        Ok(P::Force) => Ok(Metric::Force),
        Ok(P::Angle) => Ok(Metric::Angle),
        Ok(P::Normalized) => Ok(Metric::Normalized),
        _ => Err(CodecError::FormatError(format!("unknown metric tag {tag}"))),
    }
}

fn data_type_to_proto(dt: SensorDataType) -> i32 {
    use uim_proto::SensorDataType as P;
    (match dt {
        SensorDataType::Float32 => P::Float32,
        SensorDataType::Float64 => P::Float64,
        SensorDataType::Int32 => P::Int32,
        SensorDataType::Int64 => P::Int64,
    }) as i32
}

fn data_type_from_proto(tag: i32) -> Result<SensorDataType> {
    use uim_proto::SensorDataType as P;
    match P::try_from(tag) {
        Ok(P::Float32) => Ok(SensorDataType::Float32),
        Ok(P::Float64) => Ok(SensorDataType::Float64),
        Ok(P::Int32) => Ok(SensorDataType::Int32),
        Ok(P::Int64) => Ok(SensorDataType::Int64),
        _ => Err(CodecError::FormatError(format!(
            "unknown sensor data type tag {tag}"
        ))),
    }
}

pub(crate) fn to_proto(repo: &InputConfigRepository) -> uim_proto::InputConfiguration {
    uim_proto::InputConfiguration {
        environments: repo
            .environments()
            .map(|(_, env)| uim_proto::Environment {
                properties: properties_to_proto(&env.properties),
            })
            .collect(),
        providers: repo
            .providers()
            .map(|(_, provider)| uim_proto::InkInputProvider {
                provider_type: provider_type_to_proto(provider.provider_type),
                properties: properties_to_proto(&provider.properties),
            })
            .collect(),
        devices: repo
            .devices()
            .map(|(_, device)| uim_proto::InputDevice {
                properties: properties_to_proto(&device.properties),
            })
            .collect(),
        channels: repo
            .channels()
            .map(|(_, channel)| uim_proto::SensorChannel {
                channel_type_uri: channel.channel_type.as_uri(),
                metric: metric_to_proto(channel.metric),
                resolution: channel.resolution,
                min: channel.min,
                max: channel.max,
                precision: channel.precision as u32,
                index: channel.index,
                name: channel.name.clone(),
                data_type: data_type_to_proto(channel.data_type),
                provider_id: opt_hash_id_to_proto(channel.provider_id),
                device_id: opt_hash_id_to_proto(channel.device_id),
            })
            .collect(),
        channels_contexts: repo
            .channels_contexts()
            .map(|(_, ctx)| uim_proto::SensorChannelsContext {
                channels: ctx.channels.iter().map(|id| hash_id_to_proto(*id)).collect(),
                sampling_rate_hint: ctx.sampling_rate_hint,
                latency_ms: ctx.latency_ms,
                provider_id: opt_hash_id_to_proto(ctx.provider_id),
                device_id: opt_hash_id_to_proto(ctx.device_id),
            })
            .collect(),
        sensor_contexts: repo
            .sensor_contexts()
            .map(|(_, ctx)| uim_proto::SensorContext {
                channels_contexts: ctx
                    .channels_contexts
                    .iter()
                    .map(|id| hash_id_to_proto(*id))
                    .collect(),
            })
            .collect(),
        input_contexts: repo
            .input_contexts()
            .map(|(_, ctx)| uim_proto::InputContext {
                environment_id: Some(hash_id_to_proto(ctx.environment_id)),
                sensor_context_id: Some(hash_id_to_proto(ctx.sensor_context_id)),
            })
            .collect(),
    }
}

pub(crate) fn from_proto(proto: &uim_proto::InputConfiguration) -> Result<InputConfigRepository> {
    let mut repo = InputConfigRepository::new();

    for env in &proto.environments {
        repo.add_environment(Environment::new(properties_from_proto(&env.properties)));
    }
    for provider in &proto.providers {
        repo.add_provider(InkInputProvider::new(
            provider_type_from_proto(provider.provider_type)?,
            properties_from_proto(&provider.properties),
        ));
    }
    for device in &proto.devices {
        repo.add_device(InputDevice::new(properties_from_proto(&device.properties)));
    }
    for channel in &proto.channels {
        repo.add_channel(SensorChannel {
            channel_type: SensorChannelType::from_uri(&channel.channel_type_uri),
            metric: metric_from_proto(channel.metric)?,
            resolution: channel.resolution,
            min: channel.min,
            max: channel.max,
            precision: channel.precision as u8,
            index: channel.index,
            name: channel.name.clone(),
            data_type: data_type_from_proto(channel.data_type)?,
            provider_id: opt_hash_id_from_proto(&channel.provider_id),
            device_id: opt_hash_id_from_proto(&channel.device_id),
        });
    }
    for ctx in &proto.channels_contexts {
        repo.add_channels_context(SensorChannelsContext {
            channels: ctx.channels.iter().map(hash_id_from_proto).collect(),
            sampling_rate_hint: ctx.sampling_rate_hint,
            latency_ms: ctx.latency_ms,
            provider_id: opt_hash_id_from_proto(&ctx.provider_id),
            device_id: opt_hash_id_from_proto(&ctx.device_id),
        })?;
    }
    for ctx in &proto.sensor_contexts {
        repo.add_sensor_context(SensorContext {
            channels_contexts: ctx.channels_contexts.iter().map(hash_id_from_proto).collect(),
        })?;
    }
    for ctx in &proto.input_contexts {
        let environment_id = ctx
            .environment_id
            .as_ref()
            .map(hash_id_from_proto)
            .ok_or_else(|| CodecError::FormatError("input context missing environment_id".into()))?;
        let sensor_context_id = ctx
            .sensor_context_id
            .as_ref()
            .map(hash_id_from_proto)
            .ok_or_else(|| {
                CodecError::FormatError("input context missing sensor_context_id".into())
            })?;
        repo.add_input_context(InputContext {
            environment_id,
            sensor_context_id,
        })?;
    }

    Ok(repo)
}
