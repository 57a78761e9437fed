//! Sensor data model (§3.3, §4.4): raw per-stroke capture frames, stored as
//! delta-encoded channels against an [`crate::input::InputContext`].

use uim_identity::RandomId;

use crate::error::ModelError;
use crate::repo::OrderedRepo;
use uim_identity::HashId;

/// Pen state at the moment a stroke's sensor frame was captured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InkState {
    Plane,
    Hovering,
    InVolume,
    VolumeHovering,
    StartTracking,
    StopTracking,
}

/// One channel's worth of samples for a sensor-data frame.
///
/// On the wire every channel is delta-encoded (§4.4): the `TIMESTAMP`
/// channel stores an absolute first sample followed by successive deltas,
/// every other channel stores successive deltas scaled by its
/// [`crate::input::SensorChannel::resolution`]. In memory we always keep
/// the decoded absolute values; encode/decode of the delta form is a
/// codec-layer concern.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelData {
    pub sensor_channel_id: HashId,
    pub values: Vec<f64>,
}

impl ChannelData {
    pub fn new(sensor_channel_id: HashId, values: Vec<f64>) -> Self {
        Self {
            sensor_channel_id,
            values,
        }
    }

    /// Deltas against the previous sample; the first element is the
    /// absolute value itself. Empty input yields an empty delta stream.
    pub fn deltas(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.values.len());
        let mut previous = 0.0;
        for (i, value) in self.values.iter().enumerate() {
            if i == 0 {
                out.push(*value);
            } else {
                out.push(value - previous);
            }
            previous = *value;
        }
        out
    }

    /// Reconstructs absolute values from a delta stream produced by
    /// [`Self::deltas`].
    pub fn from_deltas(sensor_channel_id: HashId, deltas: &[f64]) -> Self {
        let mut values = Vec::with_capacity(deltas.len());
        let mut running = 0.0;
        for (i, delta) in deltas.iter().enumerate() {
            running = if i == 0 { *delta } else { running + delta };
            values.push(running);
        }
        Self {
            sensor_channel_id,
            values,
        }
    }
}

/// A single capture frame: one stroke's worth of raw sensor samples,
/// immutable once stored (§4.4 "sensor data is never mutated after
/// insertion").
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorData {
    id: RandomId,
    pub input_context_id: HashId,
    pub state: InkState,
    pub timestamp_ms_first_sample: f64,
    pub data_channels: Vec<ChannelData>,
}

impl SensorData {
    pub fn new(
        input_context_id: HashId,
        state: InkState,
        timestamp_ms_first_sample: f64,
        data_channels: Vec<ChannelData>,
    ) -> Self {
        Self {
            id: RandomId::new(),
            input_context_id,
            state,
            timestamp_ms_first_sample,
            data_channels,
        }
    }

    pub fn id(&self) -> RandomId {
        self.id
    }

    /// Rebuilds a frame under a specific id, for the codec layer
    /// restoring the identity a document was written with rather than
    /// minting a fresh one on decode.
    pub fn with_id(id: RandomId, mut data: Self) -> Self {
        data.id = id;
        data
    }

    pub fn channel(&self, sensor_channel_id: HashId) -> Option<&ChannelData> {
        self.data_channels
            .iter()
            .find(|c| c.sensor_channel_id == sensor_channel_id)
    }
}

/// Owns every [`SensorData`] frame in the model, keyed by its `RandomId`.
#[derive(Debug, Default)]
pub struct SensorDataRepository {
    frames: OrderedRepo<u128, SensorData>,
}

impl SensorDataRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, data: SensorData) -> RandomId {
        let id = data.id();
        self.frames.insert(id.id().value(), data);
        id
    }

    pub fn get(&self, id: RandomId) -> Result<&SensorData, ModelError> {
        self.frames
            .get(id.id().value())
            .ok_or_else(|| ModelError::NotFound {
                what: "SensorData",
                id: id.to_h_form(),
            })
    }

    pub fn contains(&self, id: RandomId) -> bool {
        self.frames.contains(id.id().value())
    }

    pub fn iter(&self) -> impl Iterator<Item = (RandomId, &SensorData)> {
        self.frames
            .iter()
            .map(|(value, data)| (RandomId::from_u128(value), data))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
