//! Zarr V3 persistence of assembled datasets.
//!
//! Layout of a saved store:
//!
//! ```text
//! <dir>/
//!   zarr.json          root group, attributes hold the manifest
//!   <variable>/        one float64 array per variable, attributes are
//!                      the variable attributes
//! ```
//!
//! Zero-dimensional variables are stored as length-one arrays; the manifest
//! records the real dimensions so they come back unchanged. Variable
//! attributes are restored from the manifest, not from the array metadata,
//! which the Zarr library extends with its own entries.

use std::path::Path;
use std::sync::Arc;

use ndarray::{ArrayD, IxDyn};
use nemo_common::{Attributes, Dataset, NemoError, NemoResult, Variable};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zarrs::array::codec::bytes_to_bytes::blosc::{
    BloscCodec, BloscCompressionLevel, BloscCompressor, BloscShuffleMode,
};
use zarrs::array::{Array, ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs::group::{Group, GroupBuilder};
use zarrs_filesystem::FilesystemStore;

use crate::config::{ProcessorConfig, ZarrCompression};

/// Root group attribute holding the manifest.
const MANIFEST_ATTR: &str = "nemo_dataset";
const MANIFEST_VERSION: u32 = 1;

/// Description of a saved dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Manifest {
    version: u32,
    variables: Vec<ManifestEntry>,
    attrs: Attributes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ManifestEntry {
    name: String,
    dims: Vec<String>,
    shape: Vec<usize>,
    coord: bool,
    #[serde(default)]
    attrs: Attributes,
}

/// Save `ds` as a Zarr store at `dir`.
///
/// An existing store written by this function is replaced, as is an empty
/// directory. Any other existing path is left alone and the save fails with
/// a `Storage` error.
pub fn save_dataset(ds: &Dataset, dir: &Path, config: &ProcessorConfig) -> NemoResult<()> {
    config.validate()?;
    if dir.exists() {
        if !is_saved_dataset(dir) && !is_empty_dir(dir)? {
            return Err(NemoError::storage(format!(
                "refusing to replace {}: not a saved NEMO dataset",
                dir.display()
            )));
        }
        std::fs::remove_dir_all(dir)?;
    }
    std::fs::create_dir_all(dir)?;
    let store = Arc::new(FilesystemStore::new(dir).map_err(|e| NemoError::storage(e.to_string()))?);

    let mut entries = Vec::with_capacity(ds.len());
    for (name, var) in ds.variables() {
        write_variable(&store, name, var, config)?;
        entries.push(ManifestEntry {
            name: name.to_string(),
            dims: var.dims().to_vec(),
            shape: var.shape().to_vec(),
            coord: ds.is_coord(name),
            attrs: var.attrs().clone(),
        });
    }

    let manifest = Manifest {
        version: MANIFEST_VERSION,
        variables: entries,
        attrs: ds.attrs().clone(),
    };
    let mut attrs = Attributes::new();
    attrs.insert(
        MANIFEST_ATTR.to_string(),
        serde_json::to_value(&manifest).map_err(|e| NemoError::storage(e.to_string()))?,
    );
    let group = GroupBuilder::new()
        .attributes(attrs)
        .build(store.clone(), "/")
        .map_err(|e| NemoError::storage(e.to_string()))?;
    group
        .store_metadata()
        .map_err(|e| NemoError::storage(e.to_string()))?;

    info!(
        path = %dir.display(),
        variables = ds.len(),
        compression = %config.zarr_compression,
        "Saved dataset"
    );
    Ok(())
}

/// Load a dataset saved by [`save_dataset`].
pub fn load_dataset(dir: &Path) -> NemoResult<Dataset> {
    if !dir.is_dir() {
        return Err(NemoError::NoFilesFound(format!(
            "no saved dataset at {}",
            dir.display()
        )));
    }
    let store = Arc::new(FilesystemStore::new(dir).map_err(|e| NemoError::storage(e.to_string()))?);
    let group = Group::open(store.clone(), "/").map_err(|e| NemoError::storage(e.to_string()))?;
    let manifest: Manifest = group
        .attributes()
        .get(MANIFEST_ATTR)
        .cloned()
        .ok_or_else(|| {
            NemoError::storage(format!("{} is not a saved NEMO dataset", dir.display()))
        })
        .and_then(|v| serde_json::from_value(v).map_err(|e| NemoError::storage(e.to_string())))?;
    if manifest.version != MANIFEST_VERSION {
        return Err(NemoError::storage(format!(
            "unsupported manifest version {}",
            manifest.version
        )));
    }

    let mut ds = Dataset::new();
    for entry in &manifest.variables {
        let var = read_variable(&store, entry)?;
        if entry.coord {
            ds.insert_coord(entry.name.as_str(), var)?;
        } else {
            ds.insert(entry.name.as_str(), var)?;
        }
    }
    *ds.attrs_mut() = manifest.attrs;

    debug!(path = %dir.display(), variables = ds.len(), "Loaded dataset");
    Ok(ds)
}

/// Whether `dir` holds a store written by [`save_dataset`].
pub fn is_saved_dataset(dir: &Path) -> bool {
    if !dir.join("zarr.json").is_file() {
        return false;
    }
    let Ok(store) = FilesystemStore::new(dir) else {
        return false;
    };
    Group::open(Arc::new(store), "/")
        .map(|group| group.attributes().contains_key(MANIFEST_ATTR))
        .unwrap_or(false)
}

fn is_empty_dir(dir: &Path) -> NemoResult<bool> {
    Ok(dir.is_dir() && std::fs::read_dir(dir)?.next().is_none())
}

fn array_path(name: &str) -> String {
    format!("/{}", name)
}

/// Stored shape: the variable's shape, or `[1]` for scalars.
fn stored_shape(shape: &[usize]) -> Vec<u64> {
    if shape.is_empty() {
        vec![1]
    } else {
        shape.iter().map(|n| *n as u64).collect()
    }
}

fn write_variable(
    store: &Arc<FilesystemStore>,
    name: &str,
    var: &Variable,
    config: &ProcessorConfig,
) -> NemoResult<()> {
    let shape = stored_shape(var.shape());
    let chunk_shape: Vec<u64> = shape
        .iter()
        .map(|n| (*n).min(config.zarr_chunk_size as u64).max(1))
        .collect();
    let chunk_grid: zarrs::array::ChunkGrid = chunk_shape
        .try_into()
        .map_err(|e| NemoError::Config(format!("{:?}", e)))?;

    let mut binding = ArrayBuilder::new(
        shape.clone(),
        DataType::Float64,
        chunk_grid,
        FillValue::from(f64::NAN),
    );
    let mut builder = binding.attributes(var.attrs().clone());
    if config.zarr_compression != ZarrCompression::None {
        builder = builder.bytes_to_bytes_codecs(vec![compression_codec(config)?]);
    }
    let array = builder
        .build(store.clone(), &array_path(name))
        .map_err(|e| NemoError::storage(e.to_string()))?;
    array
        .store_metadata()
        .map_err(|e| NemoError::storage(e.to_string()))?;

    if var.data().is_empty() {
        return Ok(());
    }
    let values: Vec<f64> = var.data().iter().copied().collect();
    let subset = ArraySubset::new_with_start_shape(vec![0; shape.len()], shape)
        .map_err(|e| NemoError::storage(e.to_string()))?;
    array
        .store_array_subset_elements(&subset, values.as_slice())
        .map_err(|e| NemoError::storage(e.to_string()))?;
    Ok(())
}

fn read_variable(store: &Arc<FilesystemStore>, entry: &ManifestEntry) -> NemoResult<Variable> {
    let array = Array::open(store.clone(), &array_path(&entry.name))
        .map_err(|e| NemoError::storage(format!("{}: {}", entry.name, e)))?;

    let expected = stored_shape(&entry.shape);
    if array.shape() != expected.as_slice() {
        return Err(NemoError::storage(format!(
            "{}: stored shape {:?} does not match manifest {:?}",
            entry.name,
            array.shape(),
            entry.shape
        )));
    }

    let values: Vec<f64> = if entry.shape.iter().any(|n| *n == 0) {
        Vec::new()
    } else {
        let subset = ArraySubset::new_with_start_shape(vec![0; expected.len()], expected)
            .map_err(|e| NemoError::storage(e.to_string()))?;
        array
            .retrieve_array_subset_elements::<f64>(&subset)
            .map_err(|e| NemoError::storage(format!("{}: {}", entry.name, e)))?
    };
    let data = ArrayD::from_shape_vec(IxDyn(&entry.shape), values)
        .map_err(|e| NemoError::InvalidShape(format!("{}: {}", entry.name, e)))?;

    let mut var = Variable::new(entry.dims.clone(), data)?;
    *var.attrs_mut() = entry.attrs.clone();
    Ok(var)
}

fn compression_codec(
    config: &ProcessorConfig,
) -> NemoResult<Arc<dyn zarrs::array::codec::BytesToBytesCodecTraits>> {
    let level = BloscCompressionLevel::try_from(config.zarr_compression_level)
        .map_err(|_| NemoError::Config("Invalid compression level".to_string()))?;
    let compressor = match config.zarr_compression {
        ZarrCompression::None => {
            return Err(NemoError::Config("No compression configured".to_string()))
        }
        ZarrCompression::BloscLz4 => BloscCompressor::LZ4,
        ZarrCompression::BloscZstd => BloscCompressor::Zstd,
    };
    // typesize is required with byte shuffling
    let codec = BloscCodec::new(compressor, level, None, BloscShuffleMode::Shuffle, Some(8))
        .map_err(|e| NemoError::Config(e.to_string()))?;
    Ok(Arc::new(codec))
}
