//! Unit conversions and affine matrices shared across the Universal Ink
//! Model (§6 "Units & axes").

mod matrix;
mod units;

pub use matrix::Matrix4;
pub use units::{convert, Unit, UnitsError};
