//! Error types for NEMO domain processing.

use thiserror::Error;

/// Result type alias using NemoError.
pub type NemoResult<T> = Result<T, NemoError>;

/// Primary error type for domain assembly, field opening and metric resolution.
#[derive(Debug, Error)]
pub enum NemoError {
    // === Input Errors ===
    #[error("No files found: {0}")]
    NoFilesFound(String),

    #[error("Invalid point type '{0}', expected one of T, U, V, F, W, UW, VW, FW")]
    InvalidPointType(String),

    #[error(
        "Conflicting point type: filename says '{from_filename}' but description says '{from_description}'"
    )]
    ConflictingPointType {
        from_filename: String,
        from_description: String,
    },

    #[error("Cannot determine point type of {0}: no 'grid_<TYPE>' in the filename and no 'ocean <TYPE> grid' description")]
    UndeterminedPointType(String),

    // === Metric Errors ===
    #[error("Missing root metric: neither {0} nor e3t_1d is present")]
    MissingRootMetric(String),

    #[error("Unsupported derivation: {0}")]
    UnsupportedDerivation(String),

    // === Dataset Errors ===
    #[error("Variable not found: {0}")]
    MissingVariable(String),

    #[error("Coordinate not found: {0}")]
    MissingCoordinate(String),

    #[error("Dimension names {dims_given:?} do not fit an array with {ndim} dimensions")]
    DimensionMismatch { dims_given: Vec<String>, ndim: usize },

    #[error("Invalid array shape: {0}")]
    InvalidShape(String),

    #[error("Dimension '{dim}' has length {expected} in the dataset but {found} in '{name}'")]
    ShapeMismatch {
        name: String,
        dim: String,
        expected: usize,
        found: usize,
    },

    #[error("Variable '{0}' differs between the field and domain datasets")]
    MergeConflict(String),

    // === Infrastructure Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl NemoError {
    /// Create a MissingVariable error.
    pub fn missing_variable(name: impl Into<String>) -> Self {
        Self::MissingVariable(name.into())
    }

    /// Create a MissingCoordinate error.
    pub fn missing_coordinate(name: impl Into<String>) -> Self {
        Self::MissingCoordinate(name.into())
    }

    /// Create a Read error for a given source.
    pub fn read(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Read {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a Storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Whether this error comes from bad input rather than bad configuration
    /// or infrastructure. Callers use it to decide whether re-running with
    /// corrected paths can help.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            NemoError::NoFilesFound(_)
                | NemoError::ConflictingPointType { .. }
                | NemoError::UndeterminedPointType(_)
                | NemoError::MissingVariable(_)
                | NemoError::MissingCoordinate(_)
                | NemoError::MergeConflict(_)
        )
    }
}

impl From<serde_json::Error> for NemoError {
    fn from(err: serde_json::Error) -> Self {
        NemoError::Storage(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflicting_message_names_both_types() {
        let err = NemoError::ConflictingPointType {
            from_filename: "U".to_string(),
            from_description: "V".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'U'"));
        assert!(msg.contains("'V'"));
    }

    #[test]
    fn test_input_errors() {
        assert!(NemoError::NoFilesFound("x".into()).is_input_error());
        assert!(!NemoError::Config("x".into()).is_input_error());
        assert!(!NemoError::MissingRootMetric("e3t".into()).is_input_error());
        assert!(NemoError::MergeConflict("tmask".into()).is_input_error());
    }
}
