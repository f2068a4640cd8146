//! File-facing side of NEMO output processing.
//!
//! This crate locates domain configuration, mesh mask and field output
//! files, works out which grid point a field file belongs to, and reads
//! files into [`RawDataset`](nemo_common::RawDataset)s through the
//! [`DatasetReader`] trait.
//!
//! # Implementation Notes
//!
//! Direct netCDF reading needs libnetcdf and HDF5 at link time and is only
//! compiled with the `native` feature. Without it, datasets can be supplied
//! through [`MemoryReader`] or any other [`DatasetReader`].

pub mod discovery;
pub mod point_type;
pub mod reader;

#[cfg(feature = "native")]
pub mod native;

pub use discovery::{
    expand_home, resolve_files, DOMCFG_PATTERNS, NAMELIST_PATTERNS, NEMO_PATTERNS,
};
pub use point_type::{infer_point_type, point_type_from_description, point_type_from_filename};
pub use reader::{DatasetReader, MemoryReader};

#[cfg(feature = "native")]
pub use native::{silence_hdf5_errors, NetCdfReader};
