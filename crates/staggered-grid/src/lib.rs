//! Staggered-grid operators.
//!
//! A [`StaggeredGrid`] is built from the `axis` / `c_grid_axis_shift`
//! metadata carried by a dataset's 1-D coordinates. It moves variables
//! between the center and face positions of an axis:
//!
//! ```text
//!   center:    c0      c1      c2      c3
//!   face +0.5:     f0      f1      f2      f3    (x_f, y_f)
//!   face -0.5: f0      f1      f2      f3        (z_f, level numbering)
//! ```
//!
//! Output keeps the input length; the missing neighbour at one end is
//! supplied by the [`Boundary`] policy.

pub mod error;
pub mod grid;
pub mod ops;

pub use error::{GridError, GridResult};
pub use grid::{GridAxis, StaggeredGrid, AXIS_ATTR, SHIFT_ATTR};
pub use ops::Boundary;
