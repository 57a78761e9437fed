//! Input configuration model (§3.2, §4.3): environments, input providers,
//! input devices, sensor channels, and the two sensor/input context tiers
//! built on top of them. Every value here is content-addressed (Hash-Id).

use uim_identity::{HashBuilder, HashId};

use crate::error::ModelError;
use crate::repo::OrderedRepo;

/// Ordered `(key, value)` string pairs. Kept as a vector, not a map:
/// iteration order feeds the Hash-Id (§9 "Dynamic config maps").
pub type Properties = Vec<(String, String)>;

fn hash_properties(builder: HashBuilder, properties: &Properties) -> HashBuilder {
    let mut builder = builder.push_int(properties.len() as i64);
    for (k, v) in properties {
        builder = builder.push_str(k).push_str(v);
    }
    builder
}

// ---------------------------------------------------------------------

/// Ordered list of `(key, value)` string pairs describing the capture
/// environment (OS, app id, ...).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Environment {
    pub properties: Properties,
}

impl Environment {
    pub fn new(properties: Properties) -> Self {
        Self { properties }
    }

    pub fn id(&self) -> HashId {
        hash_properties(HashBuilder::new("Environment"), &self.properties).finish()
    }
}

// ---------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InkInputProviderType {
    Pen,
    Touch,
    Mouse,
    Controller,
}

impl InkInputProviderType {
    fn tag(self) -> &'static str {
        match self {
            Self::Pen => "PEN",
            Self::Touch => "TOUCH",
            Self::Mouse => "MOUSE",
            Self::Controller => "CONTROLLER",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InkInputProvider {
    pub provider_type: InkInputProviderType,
    pub properties: Properties,
}

impl InkInputProvider {
    pub fn new(provider_type: InkInputProviderType, properties: Properties) -> Self {
        Self {
            provider_type,
            properties,
        }
    }

    pub fn id(&self) -> HashId {
        let builder =
            HashBuilder::new("InkInputProvider").push_str(self.provider_type.tag());
        hash_properties(builder, &self.properties).finish()
    }
}

// ---------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InputDevice {
    pub properties: Properties,
}

impl InputDevice {
    pub fn new(properties: Properties) -> Self {
        Self { properties }
    }

    pub fn id(&self) -> HashId {
        hash_properties(HashBuilder::new("InputDevice"), &self.properties).finish()
    }
}

// ---------------------------------------------------------------------

/// The physical quantity a [`SensorChannel`] measures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Metric {
    Length,
    Time,
    Force,
    Angle,
    Normalized,
}

impl Metric {
    fn tag(self) -> &'static str {
        match self {
            Self::Length => "LENGTH",
            Self::Time => "TIME",
            Self::Force => "FORCE",
            Self::Angle => "ANGLE",
            Self::Normalized => "NORMALIZED",
        }
    }
}

/// The kind of value a channel carries. The type is formally a URI
/// (§3.2); well-known sensor attributes are named variants, anything else
/// round-trips through [`SensorChannelType::Other`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SensorChannelType {
    Timestamp,
    Pressure,
    Altitude,
    Azimuth,
    RadiusX,
    RadiusY,
    Rotation,
    Other(String),
}

impl SensorChannelType {
    pub fn as_uri(&self) -> String {
        let suffix = match self {
            Self::Timestamp => "timestamp",
            Self::Pressure => "pressure",
            Self::Altitude => "altitude",
            Self::Azimuth => "azimuth",
            Self::RadiusX => "radiusx",
            Self::RadiusY => "radiusy",
            Self::Rotation => "rotation",
            Self::Other(uri) => return uri.clone(),
        };
        format!("will://input/3.0/channel/{suffix}")
    }

    pub fn from_uri(uri: &str) -> Self {
        match uri {
            "will://input/3.0/channel/timestamp" => Self::Timestamp,
            "will://input/3.0/channel/pressure" => Self::Pressure,
            "will://input/3.0/channel/altitude" => Self::Altitude,
            "will://input/3.0/channel/azimuth" => Self::Azimuth,
            "will://input/3.0/channel/radiusx" => Self::RadiusX,
            "will://input/3.0/channel/radiusy" => Self::RadiusY,
            "will://input/3.0/channel/rotation" => Self::Rotation,
            other => Self::Other(other.to_owned()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorChannel {
    pub channel_type: SensorChannelType,
    pub metric: Metric,
    /// Power-of-10 resolution scale applied on the wire.
    pub resolution: f64,
    pub min: f64,
    pub max: f64,
    /// Decimal digits of precision.
    pub precision: u8,
    pub index: u32,
    pub name: String,
    pub data_type: SensorDataType,
    pub provider_id: Option<HashId>,
    pub device_id: Option<HashId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SensorDataType {
    Float32,
    Float64,
    Int32,
    Int64,
}

impl SensorDataType {
    fn tag(self) -> &'static str {
        match self {
            Self::Float32 => "FLOAT32",
            Self::Float64 => "FLOAT64",
            Self::Int32 => "INT32",
            Self::Int64 => "INT64",
        }
    }
}

impl SensorChannel {
    pub fn id(&self) -> HashId {
        HashBuilder::new("SensorChannel")
            .push_str(&self.channel_type.as_uri())
            .push_str(self.metric.tag())
            .push_float(self.resolution)
            .push_float(self.min)
            .push_float(self.max)
            .push_int(self.precision as i64)
            .push_int(self.index as i64)
            .push_str(&self.name)
            .push_str(self.data_type.tag())
            .push_opt_str(self.provider_id.map(|id| id.to_s_form()).as_deref())
            .push_opt_str(self.device_id.map(|id| id.to_s_form()).as_deref())
            .finish()
    }

    /// `true` when `value` lies within `[min, max]`, the check enforced
    /// on every decoded sample (§8 "Channel value bounds").
    pub fn in_bounds(&self, value: f64) -> bool {
        if !self.min.is_finite() || !self.max.is_finite() {
            return true;
        }
        (self.min..=self.max).contains(&value)
    }
}

// ---------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorChannelsContext {
    pub channels: Vec<HashId>,
    pub sampling_rate_hint: Option<f64>,
    pub latency_ms: Option<f64>,
    pub provider_id: Option<HashId>,
    pub device_id: Option<HashId>,
}

impl SensorChannelsContext {
    pub fn id(&self) -> HashId {
        let mut builder = HashBuilder::new("SensorChannelsContext")
            .push_int(self.channels.len() as i64);
        for channel in &self.channels {
            builder = builder.push_str(&channel.to_s_form());
        }
        builder
            .push_opt_float(self.sampling_rate_hint)
            .push_opt_float(self.latency_ms)
            .push_opt_str(self.provider_id.map(|id| id.to_s_form()).as_deref())
            .push_opt_str(self.device_id.map(|id| id.to_s_form()).as_deref())
            .finish()
    }
}

// ---------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorContext {
    pub channels_contexts: Vec<HashId>,
}

impl SensorContext {
    pub fn id(&self) -> HashId {
        let mut builder =
            HashBuilder::new("SensorContext").push_int(self.channels_contexts.len() as i64);
        for ctx in &self.channels_contexts {
            builder = builder.push_str(&ctx.to_s_form());
        }
        builder.finish()
    }
}

// ---------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InputContext {
    pub environment_id: HashId,
    pub sensor_context_id: HashId,
}

impl InputContext {
    pub fn id(&self) -> HashId {
        HashBuilder::new("InputContext")
            .push_str(&self.environment_id.to_s_form())
            .push_str(&self.sensor_context_id.to_s_form())
            .finish()
    }
}

// ---------------------------------------------------------------------

/// Holds every input-configuration value object in the model, content
/// addressed (§4.3). Insertions are idempotent on Hash-Id.
#[derive(Debug, Default)]
pub struct InputConfigRepository {
    environments: OrderedRepo<u128, Environment>,
    providers: OrderedRepo<u128, InkInputProvider>,
    devices: OrderedRepo<u128, InputDevice>,
    channels: OrderedRepo<u128, SensorChannel>,
    channel_contexts: OrderedRepo<u128, SensorChannelsContext>,
    sensor_contexts: OrderedRepo<u128, SensorContext>,
    input_contexts: OrderedRepo<u128, InputContext>,
}

impl InputConfigRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once any provider, device, or sensor context has been added.
    pub fn has_configuration(&self) -> bool {
        !self.providers.is_empty() || !self.devices.is_empty() || !self.sensor_contexts.is_empty()
    }

    pub fn add_environment(&mut self, env: Environment) -> HashId {
        let id = env.id();
        self.environments.insert(id.id().value(), env);
        id
    }

    pub fn environment(&self, id: HashId) -> Result<&Environment, ModelError> {
        self.environments
            .get(id.id().value())
            .ok_or_else(|| not_found("Environment", id))
    }

    pub fn environments(&self) -> impl Iterator<Item = (HashId, &Environment)> {
        self.environments
            .iter()
            .map(|(value, env)| (HashId::from_u128(value), env))
    }

    pub fn add_provider(&mut self, provider: InkInputProvider) -> HashId {
        let id = provider.id();
        self.providers.insert(id.id().value(), provider);
        id
    }

    pub fn provider(&self, id: HashId) -> Result<&InkInputProvider, ModelError> {
        self.providers
            .get(id.id().value())
            .ok_or_else(|| not_found("InkInputProvider", id))
    }

    pub fn providers(&self) -> impl Iterator<Item = (HashId, &InkInputProvider)> {
        self.providers
            .iter()
            .map(|(value, provider)| (HashId::from_u128(value), provider))
    }

    pub fn add_device(&mut self, device: InputDevice) -> HashId {
        let id = device.id();
        self.devices.insert(id.id().value(), device);
        id
    }

    pub fn device(&self, id: HashId) -> Result<&InputDevice, ModelError> {
        self.devices
            .get(id.id().value())
            .ok_or_else(|| not_found("InputDevice", id))
    }

    pub fn devices(&self) -> impl Iterator<Item = (HashId, &InputDevice)> {
        self.devices
            .iter()
            .map(|(value, device)| (HashId::from_u128(value), device))
    }

    pub fn add_channel(&mut self, channel: SensorChannel) -> HashId {
        let id = channel.id();
        self.channels.insert(id.id().value(), channel);
        id
    }

    pub fn channel(&self, id: HashId) -> Result<&SensorChannel, ModelError> {
        self.channels
            .get(id.id().value())
            .ok_or_else(|| not_found("SensorChannel", id))
    }

    pub fn channels(&self) -> impl Iterator<Item = (HashId, &SensorChannel)> {
        self.channels
            .iter()
            .map(|(value, channel)| (HashId::from_u128(value), channel))
    }

    pub fn add_channels_context(&mut self, ctx: SensorChannelsContext) -> Result<HashId, ModelError> {
        for channel_id in &ctx.channels {
            self.channel(*channel_id)?;
        }
        let id = ctx.id();
        self.channel_contexts.insert(id.id().value(), ctx);
        Ok(id)
    }

    pub fn channels_context(&self, id: HashId) -> Result<&SensorChannelsContext, ModelError> {
        self.channel_contexts
            .get(id.id().value())
            .ok_or_else(|| not_found("SensorChannelsContext", id))
    }

    pub fn channels_contexts(&self) -> impl Iterator<Item = (HashId, &SensorChannelsContext)> {
        self.channel_contexts
            .iter()
            .map(|(value, ctx)| (HashId::from_u128(value), ctx))
    }

    pub fn add_sensor_context(&mut self, ctx: SensorContext) -> Result<HashId, ModelError> {
        for ctx_id in &ctx.channels_contexts {
            self.channels_context(*ctx_id)?;
        }
        let id = ctx.id();
        self.sensor_contexts.insert(id.id().value(), ctx);
        Ok(id)
    }

    pub fn sensor_context(&self, id: HashId) -> Result<&SensorContext, ModelError> {
        self.sensor_contexts
            .get(id.id().value())
            .ok_or_else(|| not_found("SensorContext", id))
    }

    pub fn sensor_contexts(&self) -> impl Iterator<Item = (HashId, &SensorContext)> {
        self.sensor_contexts
            .iter()
            .map(|(value, ctx)| (HashId::from_u128(value), ctx))
    }

    pub fn add_input_context(&mut self, ctx: InputContext) -> Result<HashId, ModelError> {
        self.environment(ctx.environment_id)?;
        self.sensor_context(ctx.sensor_context_id)?;
        let id = ctx.id();
        self.input_contexts.insert(id.id().value(), ctx);
        Ok(id)
    }

    pub fn input_context(&self, id: HashId) -> Result<&InputContext, ModelError> {
        self.input_contexts
            .get(id.id().value())
            .ok_or_else(|| not_found("InputContext", id))
    }

    pub fn input_contexts(&self) -> impl Iterator<Item = (HashId, &InputContext)> {
        self.input_contexts
            .iter()
            .map(|(value, ctx)| (HashId::from_u128(value), ctx))
    }
}

fn not_found(what: &'static str, id: HashId) -> ModelError {
    ModelError::NotFound {
        what,
        id: id.to_h_form(),
    }
}
