//! NEMO domain and field processing.
//!
//! Turns the per-processor files written by a NEMO run into datasets laid
//! out on the Arakawa C-grid, ready for staggered-grid operators.
//!
//! # Architecture
//!
//! ```text
//! domain_cfg / mesh_mask tiles          *grid_<TYPE>.nc files
//!            │                                   │
//!            ▼                                   │
//!   ┌──────────────────┐                         │
//!   │ stitch           │ global x/y index        │
//!   └────────┬─────────┘                         │
//!            ▼                                   ▼
//!   ┌──────────────────┐   coordinates   ┌──────────────────┐
//!   │ domcfg           │ ──────────────► │ nemo             │
//!   │ (x_c .. z_f)     │                 │ (per point type) │
//!   └────────┬─────────┘                 └────────┬─────────┘
//!            └──────────────┬─────────────────────┘
//!                           ▼
//!                  ┌──────────────────┐      ┌──────────────────┐
//!                  │ merge            │ ───► │ metrics          │
//!                  └────────┬─────────┘      └──────────────────┘
//!                           ▼
//!                  ┌──────────────────┐
//!                  │ store (Zarr V3)  │
//!                  └──────────────────┘
//! ```
//!
//! Per-file reading and preprocessing runs through a [`Scheduler`], either
//! sequentially or on a worker pool.

pub mod config;
pub mod domcfg;
pub mod merge;
pub mod metrics;
pub mod nemo;
pub mod processor;
pub mod scheduler;
pub mod stitch;
pub mod store;

pub use config::{ExecutionMode, ProcessorConfig, ZarrCompression};
pub use domcfg::{assemble_domain_cfg, COORDINATE_FIELDS};
pub use merge::{merge, WARNING_ATTR};
pub use metrics::{
    compute_missing_metrics, get_metrics, scale_factor_node, Derivation, ScaleFactorNode,
    SCALE_FACTOR_GRAPH,
};
pub use nemo::{combine_nemo, preprocess_nemo, POINT_TYPE_ATTR};
pub use processor::{DomainCfgOptions, NemoOptions, NemoProcessor, DOMCFG_SAVING_NAME};
pub use scheduler::{scheduler_from_config, FileJob, ReadGate, Scheduler, Sequential, WorkerPool};
pub use stitch::{stitch_tiles, stitch_tiles_with_report, StitchReport};
pub use store::{load_dataset, save_dataset};

pub use nemo_common::{NemoError, NemoResult};
