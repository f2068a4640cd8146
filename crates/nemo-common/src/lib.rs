//! Common types shared across the NEMO domain crates.
//!
//! - Arakawa C-grid point types and the axis labels they map onto
//! - The hand-authored field registry (field name to grid point)
//! - The labeled dataset model used before and after assembly
//! - The error taxonomy surfaced to callers

pub mod dataset;
pub mod error;
pub mod point;
pub mod raw;
pub mod registry;

pub use dataset::{Attributes, Dataset, Variable};
pub use error::{NemoError, NemoResult};
pub use point::{Axis, AxisLabel, AxisPosition, GridPointType, Point, ALL_POINTS};
pub use raw::RawDataset;
pub use registry::{FieldPlacement, PointRegistry};
