//! Source of raw datasets.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use nemo_common::{Dataset, NemoError, NemoResult, RawDataset};

/// Reads one file into a [`RawDataset`].
///
/// Implementations must be shareable across worker threads; whether reads
/// actually run concurrently is decided by the scheduler.
pub trait DatasetReader: Send + Sync {
    fn read(&self, path: &Path) -> NemoResult<RawDataset>;
}

/// Reader serving datasets registered in memory under a path.
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    files: HashMap<PathBuf, Dataset>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `dataset` as the content of `path`.
    pub fn insert(&mut self, path: impl Into<PathBuf>, dataset: Dataset) {
        self.files.insert(path.into(), dataset);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_file(mut self, path: impl Into<PathBuf>, dataset: Dataset) -> Self {
        self.insert(path, dataset);
        self
    }

    /// Registered paths, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.files.keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl DatasetReader for MemoryReader {
    fn read(&self, path: &Path) -> NemoResult<RawDataset> {
        let dataset = self
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| NemoError::read(path.display().to_string(), "no such file"))?;
        Ok(RawDataset::with_source(dataset, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nemo_common::Variable;

    #[test]
    fn test_memory_reader() {
        let mut ds = Dataset::new();
        ds.insert("e1t", Variable::coordinate("x", vec![1.0, 2.0])).unwrap();
        let reader = MemoryReader::new().with_file("/mem/domain_cfg.nc", ds);

        let raw = reader.read(Path::new("/mem/domain_cfg.nc")).unwrap();
        assert_eq!(raw.file_name(), "domain_cfg.nc");
        assert!(raw.dataset().contains("e1t"));

        let err = reader.read(Path::new("/mem/other.nc")).unwrap_err();
        assert!(matches!(err, NemoError::Read { .. }));
    }
}
