//! Datasets as read from disk, before any relabeling.

use std::path::{Path, PathBuf};

use crate::dataset::Dataset;

/// Attribute carrying the first global (1-based) index of a tile.
pub const POSITION_FIRST_ATTR: &str = "DOMAIN_position_first";
/// Attribute carrying the last global (1-based) index of a tile.
pub const POSITION_LAST_ATTR: &str = "DOMAIN_position_last";

/// Per-tile decomposition attributes, meaningless once tiles are merged.
pub const DECOMPOSITION_ATTRS: [&str; 5] = [
    POSITION_FIRST_ATTR,
    POSITION_LAST_ATTR,
    "DOMAIN_number",
    "DOMAIN_number_total",
    "DOMAIN_size_local",
];

/// A file's content under its generic dimension names (`x`, `y`, `z`,
/// `nav_lev`, `depthX`, `time_counter`).
///
/// Raw datasets are never relabeled in place; the assembly steps consume
/// them and produce a new [`Dataset`].
#[derive(Debug, Clone, Default)]
pub struct RawDataset {
    source: Option<PathBuf>,
    dataset: Dataset,
}

impl RawDataset {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            source: None,
            dataset,
        }
    }

    pub fn with_source(dataset: Dataset, source: impl Into<PathBuf>) -> Self {
        Self {
            source: Some(source.into()),
            dataset,
        }
    }

    /// Path the content was read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// File name of the source, or an empty string.
    pub fn file_name(&self) -> &str {
        self.source
            .as_deref()
            .and_then(Path::file_name)
            .and_then(|s| s.to_str())
            .unwrap_or("")
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn into_dataset(self) -> Dataset {
        self.dataset
    }

    /// `(x0, y0)` from the first-global-index attribute, if this is a
    /// per-processor tile.
    pub fn position_first(&self) -> Option<(i64, i64)> {
        let value = self.dataset.attrs().get(POSITION_FIRST_ATTR)?;
        let pair = value.as_array()?;
        match pair.as_slice() {
            [x0, y0, ..] => Some((as_index(x0)?, as_index(y0)?)),
            _ => None,
        }
    }
}

fn as_index(value: &serde_json::Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|v| v.round() as i64))
}
