use std::fmt;
use std::str::FromStr;

/// The physical (or normalized) dimension a [`Unit`] belongs to.
///
/// Conversion is only defined within a dimension; §6 requires every pair
/// *within* a supported dimension to convert, not every pair across all
/// fifteen units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Dimension {
    Length,
    Time,
    Angle,
    Force,
    Normalized,
}

/// One of the fifteen units named in §6: length, time, angle, force, and
/// the two normalized-value units (percentage and logical/unit-interval).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Unit {
    M,
    Cm,
    Mm,
    In,
    Pt,
    Pc,
    Dip,
    S,
    Ms,
    Ns,
    Rad,
    Deg,
    N,
    Percentage,
    Logical,
}

impl Unit {
    fn dimension(self) -> Dimension {
        match self {
            Self::M | Self::Cm | Self::Mm | Self::In | Self::Pt | Self::Pc | Self::Dip => {
                Dimension::Length
            }
            Self::S | Self::Ms | Self::Ns => Dimension::Time,
            Self::Rad | Self::Deg => Dimension::Angle,
            Self::N => Dimension::Force,
            Self::Percentage | Self::Logical => Dimension::Normalized,
        }
    }

    /// Factor that converts one unit of `self` into the dimension's base
    /// unit (meters, seconds, radians, newtons, percentage-points).
    fn to_base_factor(self) -> f64 {
        const IN_IN_M: f64 = 0.0254;
        match self {
            Self::M => 1.0,
            Self::Cm => 0.01,
            Self::Mm => 0.001,
            Self::In => IN_IN_M,
            Self::Pt => IN_IN_M / 72.0,
            Self::Pc => IN_IN_M / 6.0,
            // 1 DIP (device-independent pixel) = 1/96 inch.
            Self::Dip => IN_IN_M / 96.0,
            Self::S => 1.0,
            Self::Ms => 0.001,
            Self::Ns => 1e-9,
            Self::Rad => 1.0,
            Self::Deg => std::f64::consts::PI / 180.0,
            Self::N => 1.0,
            Self::Percentage => 1.0,
            // 1 logical unit (0..1) equals 100 percentage-points.
            Self::Logical => 100.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::M => "M",
            Self::Cm => "CM",
            Self::Mm => "MM",
            Self::In => "IN",
            Self::Pt => "PT",
            Self::Pc => "PC",
            Self::Dip => "DIP",
            Self::S => "S",
            Self::Ms => "MS",
            Self::Ns => "NS",
            Self::Rad => "RAD",
            Self::Deg => "DEG",
            Self::N => "N",
            Self::Percentage => "PERCENTAGE",
            Self::Logical => "LOGICAL",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = UnitsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "M" => Self::M,
            "CM" => Self::Cm,
            "MM" => Self::Mm,
            "IN" => Self::In,
            "PT" => Self::Pt,
            "PC" => Self::Pc,
            "DIP" => Self::Dip,
            "S" => Self::S,
            "MS" => Self::Ms,
            "NS" => Self::Ns,
            "RAD" => Self::Rad,
            "DEG" => Self::Deg,
            "N" => Self::N,
            "PERCENTAGE" => Self::Percentage,
            "LOGICAL" => Self::Logical,
            _ => return Err(UnitsError::UnknownUnit(s.to_owned())),
        })
    }
}

/// Errors raised while converting or parsing [`Unit`]s.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum UnitsError {
    #[error("cannot convert {from} to {to}: different physical dimensions")]
    IncompatibleUnits { from: Unit, to: Unit },

    #[error("unknown unit {0:?}")]
    UnknownUnit(String),
}

/// Converts `value`, expressed in `from`, into `to`. Fails if the two units
/// are not in the same dimension (e.g. length vs. time).
pub fn convert(from: Unit, to: Unit, value: f64) -> Result<f64, UnitsError> {
    if from.dimension() != to.dimension() {
        return Err(UnitsError::IncompatibleUnits { from, to });
    }
    let base = value * from.to_base_factor();
    Ok(base / to.to_base_factor())
}
