//! Configuration for the domain processor.

use nemo_common::{NemoError, NemoResult};
use serde::{Deserialize, Serialize};

/// Configuration for opening, merging and saving NEMO datasets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Promote longitude/latitude/depth fields to coordinates.
    pub add_coordinates: bool,

    /// Copy static scale factors in as time-varying ones when merging.
    pub linear_free_surface: bool,

    /// How per-file preprocessing is scheduled.
    pub execution: ExecutionMode,

    /// Worker threads for parallel execution (0 = one per core).
    pub worker_threads: usize,

    /// Run file reads one at a time even in parallel mode.
    pub serialize_file_reads: bool,

    /// Maximum chunk length along each dimension of saved arrays.
    pub zarr_chunk_size: usize,

    /// Compression codec for saved arrays.
    pub zarr_compression: ZarrCompression,

    /// Compression level (1-9).
    pub zarr_compression_level: u8,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            add_coordinates: true,
            linear_free_surface: false,
            execution: ExecutionMode::Sequential,
            worker_threads: 0,
            serialize_file_reads: true,
            zarr_chunk_size: 512,
            zarr_compression: ZarrCompression::None,
            zarr_compression_level: 1,
        }
    }
}

fn parse_flag(val: &str) -> bool {
    val.to_lowercase() == "true" || val == "1"
}

impl ProcessorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("NEMO_ADD_COORDINATES") {
            config.add_coordinates = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("NEMO_LINEAR_FREE_SURFACE") {
            config.linear_free_surface = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("NEMO_EXECUTION") {
            config.execution = ExecutionMode::from_str(&val);
        }

        if let Ok(val) = std::env::var("NEMO_WORKER_THREADS") {
            if let Ok(n) = val.parse() {
                config.worker_threads = n;
            }
        }

        if let Ok(val) = std::env::var("NEMO_SERIALIZE_READS") {
            config.serialize_file_reads = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("ZARR_CHUNK_SIZE") {
            if let Ok(size) = val.parse() {
                config.zarr_chunk_size = size;
            }
        }

        if let Ok(val) = std::env::var("ZARR_COMPRESSION") {
            config.zarr_compression = ZarrCompression::from_str(&val);
        }

        if let Ok(val) = std::env::var("ZARR_COMPRESSION_LEVEL") {
            if let Ok(level) = val.parse() {
                config.zarr_compression_level = level;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> NemoResult<()> {
        if self.zarr_chunk_size == 0 {
            return Err(NemoError::Config("zarr_chunk_size must be > 0".to_string()));
        }

        if self.zarr_compression_level == 0 || self.zarr_compression_level > 9 {
            return Err(NemoError::Config(
                "zarr_compression_level must be 1-9".to_string(),
            ));
        }

        Ok(())
    }
}

/// Scheduling of per-file preprocessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// One file after the other on the calling thread.
    #[default]
    Sequential,
    /// Files spread over a worker pool.
    Parallel,
}

impl ExecutionMode {
    /// Parse from string (case-insensitive), defaulting to sequential.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "parallel" | "pool" => Self::Parallel,
            _ => Self::Sequential,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Parallel => "parallel",
        }
    }
}

/// Compression codec for Zarr stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ZarrCompression {
    /// No compression.
    #[default]
    None,
    /// Blosc with LZ4.
    BloscLz4,
    /// Blosc with Zstd.
    BloscZstd,
}

impl ZarrCompression {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "blosc_lz4" | "lz4" => Self::BloscLz4,
            "blosc_zstd" | "zstd" => Self::BloscZstd,
            _ => Self::None,
        }
    }

    /// Get the codec name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::BloscLz4 => "blosc_lz4",
            Self::BloscZstd => "blosc_zstd",
        }
    }
}

impl std::fmt::Display for ZarrCompression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
