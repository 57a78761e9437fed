//! Identity and hashing for the Universal Ink Model (§3.1, §4.1, §4.2 of the
//! model specification).
//!
//! Two identifier kinds share one 128-bit [`Identifier`] representation:
//! [`RandomId`] for mutable leaves (strokes, sensor-data frames, tree
//! nodes) and [`HashId`] for value objects addressed by content
//! (environment, device, channel, channel-context, sensor-context,
//! input-context, path-point-properties). [`PrecisionScheme`] packs the
//! five per-channel-family fixed-point precisions used by the ink-data
//! codec.

mod error;
mod hash;
mod id;
mod precision;

pub use error::IdentityError;
pub use hash::HashBuilder;
pub use id::{HashId, Identifier, RandomId};
pub use precision::PrecisionScheme;
