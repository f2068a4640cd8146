//! Error types for staggered-grid operations.

use nemo_common::{Axis, NemoError};
use thiserror::Error;

/// Errors raised by grid operators.
#[derive(Error, Debug)]
pub enum GridError {
    /// The grid has no such axis.
    #[error("axis {0} is not part of the grid")]
    AxisNotFound(Axis),

    /// The variable has neither position of the axis among its dimensions.
    #[error("variable with dims {dims:?} is not defined along axis {axis}")]
    DimensionNotOnAxis { dims: Vec<String>, axis: Axis },

    /// Coordinate metadata could not be interpreted.
    #[error("invalid axis metadata on '{coord}': {message}")]
    InvalidMetadata { coord: String, message: String },
}

/// Result type for grid operations.
pub type GridResult<T> = std::result::Result<T, GridError>;

impl From<GridError> for NemoError {
    fn from(err: GridError) -> Self {
        match err {
            GridError::AxisNotFound(axis) => NemoError::missing_coordinate(axis.as_str()),
            other => NemoError::InvalidShape(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_to_nemo_error() {
        let err: NemoError = GridError::DimensionNotOnAxis {
            dims: vec!["t".to_string()],
            axis: Axis::X,
        }
        .into();
        assert!(matches!(err, NemoError::InvalidShape(ref m) if m.contains("axis")));

        let err: NemoError = GridError::InvalidMetadata {
            coord: "x_f".to_string(),
            message: "missing c_grid_axis_shift".to_string(),
        }
        .into();
        assert!(matches!(err, NemoError::InvalidShape(ref m) if m.contains("x_f")));

        let err: NemoError = GridError::AxisNotFound(Axis::Z).into();
        assert!(matches!(err, NemoError::MissingCoordinate(_)));
    }
}
