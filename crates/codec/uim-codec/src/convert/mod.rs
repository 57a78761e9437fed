//! Per-chunk conversions between [`uim_model`] types and the generated
//! [`uim_proto`] protobuf messages. Each submodule owns exactly one RIFF
//! chunk's payload shape.

pub(crate) mod brushes;
pub(crate) mod id;
pub(crate) mod ink_data;
pub(crate) mod ink_structure;
pub(crate) mod input;
pub(crate) mod properties;
pub(crate) mod sensor_data;
pub(crate) mod triples;
