//! Arakawa C-grid point types and axis labels.
//!
//! Every physical field lives at one of eight positions on the staggered
//! cell. Each position is either on the cell center or on a cell face along
//! each of the three axes, which decides the coordinate labels
//! (`x_c`/`x_f`, `y_c`/`y_f`, `z_c`/`z_f`) the field is indexed by.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NemoError;

/// All point types, in declaration order.
pub const ALL_POINTS: [GridPointType; 8] = [
    GridPointType::T,
    GridPointType::U,
    GridPointType::V,
    GridPointType::F,
    GridPointType::W,
    GridPointType::UW,
    GridPointType::VW,
    GridPointType::FW,
];

/// Where on the staggered cell a quantity is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GridPointType {
    T,
    U,
    V,
    F,
    W,
    UW,
    VW,
    FW,
}

impl GridPointType {
    /// Upper-case name as used in file names (`grid_U.nc`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::T => "T",
            Self::U => "U",
            Self::V => "V",
            Self::F => "F",
            Self::W => "W",
            Self::UW => "UW",
            Self::VW => "VW",
            Self::FW => "FW",
        }
    }

    /// Lower-case suffix used in scale factor names (`e3uw`).
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::T => "t",
            Self::U => "u",
            Self::V => "v",
            Self::F => "f",
            Self::W => "w",
            Self::UW => "uw",
            Self::VW => "vw",
            Self::FW => "fw",
        }
    }

    /// Positions along (x, y, z).
    pub fn positions(&self) -> (AxisPosition, AxisPosition, AxisPosition) {
        use AxisPosition::{Center as C, Face as Fc};
        match self {
            Self::T => (C, C, C),
            Self::U => (Fc, C, C),
            Self::V => (C, Fc, C),
            Self::F => (Fc, Fc, C),
            Self::W => (C, C, Fc),
            Self::UW => (Fc, C, Fc),
            Self::VW => (C, Fc, Fc),
            Self::FW => (Fc, Fc, Fc),
        }
    }
}

impl FromStr for GridPointType {
    type Err = NemoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "T" => Ok(Self::T),
            "U" => Ok(Self::U),
            "V" => Ok(Self::V),
            "F" => Ok(Self::F),
            "W" => Ok(Self::W),
            "UW" => Ok(Self::UW),
            "VW" => Ok(Self::VW),
            "FW" => Ok(Self::FW),
            other => Err(NemoError::InvalidPointType(other.to_string())),
        }
    }
}

impl fmt::Display for GridPointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Center or face of the cell along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisPosition {
    Center,
    Face,
}

impl AxisPosition {
    /// The other position on the same axis.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Center => Self::Face,
            Self::Face => Self::Center,
        }
    }
}

/// Physical axis of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Axis identifier as stored in the `axis` coordinate attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
        }
    }

    /// Parse an `axis` attribute value.
    pub fn from_attr(s: &str) -> Option<Self> {
        match s {
            "X" => Some(Self::X),
            "Y" => Some(Self::Y),
            "Z" => Some(Self::Z),
            _ => None,
        }
    }

    /// Label of this axis at the given position.
    pub fn label(&self, position: AxisPosition) -> AxisLabel {
        match (self, position) {
            (Self::X, AxisPosition::Center) => AxisLabel::XC,
            (Self::X, AxisPosition::Face) => AxisLabel::XF,
            (Self::Y, AxisPosition::Center) => AxisLabel::YC,
            (Self::Y, AxisPosition::Face) => AxisLabel::YF,
            (Self::Z, AxisPosition::Center) => AxisLabel::ZC,
            (Self::Z, AxisPosition::Face) => AxisLabel::ZF,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One of the six canonical coordinate names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AxisLabel {
    XC,
    XF,
    YC,
    YF,
    ZC,
    ZF,
}

impl AxisLabel {
    pub const ALL: [AxisLabel; 6] = [
        AxisLabel::XC,
        AxisLabel::XF,
        AxisLabel::YC,
        AxisLabel::YF,
        AxisLabel::ZC,
        AxisLabel::ZF,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::XC => "x_c",
            Self::XF => "x_f",
            Self::YC => "y_c",
            Self::YF => "y_f",
            Self::ZC => "z_c",
            Self::ZF => "z_f",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|label| label.name() == name)
    }

    pub fn axis(&self) -> Axis {
        match self {
            Self::XC | Self::XF => Axis::X,
            Self::YC | Self::YF => Axis::Y,
            Self::ZC | Self::ZF => Axis::Z,
        }
    }

    pub fn position(&self) -> AxisPosition {
        match self {
            Self::XC | Self::YC | Self::ZC => AxisPosition::Center,
            Self::XF | Self::YF | Self::ZF => AxisPosition::Face,
        }
    }

    /// Fractional shift relative to the center label.
    ///
    /// Horizontal faces sit to the right/up of the center (+0.5); vertical
    /// faces sit above the center, which in level numbering is -0.5.
    pub fn shift(&self) -> Option<f64> {
        match self {
            Self::XF | Self::YF => Some(0.5),
            Self::ZF => Some(-0.5),
            Self::XC | Self::YC | Self::ZC => None,
        }
    }
}

impl fmt::Display for AxisLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The axis labels a field at a given point type is indexed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub point_type: GridPointType,
    pub x: AxisLabel,
    pub y: AxisLabel,
    pub z: AxisLabel,
}

impl Point {
    pub fn new(point_type: GridPointType) -> Self {
        let (px, py, pz) = point_type.positions();
        Self {
            point_type,
            x: Axis::X.label(px),
            y: Axis::Y.label(py),
            z: Axis::Z.label(pz),
        }
    }

    /// Build a point from its textual type, failing with `InvalidPointType`
    /// for anything outside the eight variants.
    pub fn from_name(name: &str) -> Result<Self, NemoError> {
        name.parse::<GridPointType>().map(Self::new)
    }

    /// Label used along `axis`.
    pub fn label(&self, axis: Axis) -> AxisLabel {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}

impl From<GridPointType> for Point {
    fn from(point_type: GridPointType) -> Self {
        Self::new(point_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_labels_for_u() {
        let p = Point::new(GridPointType::U);
        assert_eq!(p.x, AxisLabel::XF);
        assert_eq!(p.y, AxisLabel::YC);
        assert_eq!(p.z, AxisLabel::ZC);
    }

    #[test]
    fn test_invalid_point_type() {
        let err = Point::from_name("X").unwrap_err();
        assert!(matches!(err, NemoError::InvalidPointType(ref s) if s == "X"));
        assert!(Point::from_name("t").is_err());
    }

    #[test]
    fn test_round_trip_names() {
        for p in ALL_POINTS {
            assert_eq!(p.as_str().parse::<GridPointType>().unwrap(), p);
            assert_eq!(p.suffix(), p.as_str().to_lowercase());
        }
    }

    #[test]
    fn test_label_metadata() {
        assert_eq!(AxisLabel::ZF.shift(), Some(-0.5));
        assert_eq!(AxisLabel::XF.shift(), Some(0.5));
        assert_eq!(AxisLabel::YC.shift(), None);
        assert_eq!(AxisLabel::from_name("y_f"), Some(AxisLabel::YF));
        assert_eq!(AxisLabel::from_name("nav_lev"), None);
        assert_eq!(AxisLabel::ZC.axis(), Axis::Z);
    }
}
