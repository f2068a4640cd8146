//! Grid object built from coordinate metadata.

use std::collections::BTreeMap;

use ndarray::Axis as NdAxis;
use nemo_common::{Axis, AxisPosition, Dataset, Variable};

use crate::error::{GridError, GridResult};
use crate::ops::{cumsum_lane, diff_lane, interp_lane, Boundary, Neighbour};

/// Attribute naming the physical axis of a coordinate.
pub const AXIS_ATTR: &str = "axis";
/// Attribute giving the shift of a face coordinate relative to the center.
pub const SHIFT_ATTR: &str = "c_grid_axis_shift";

/// Center and face dimension names of one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct GridAxis {
    pub axis: Axis,
    pub center: String,
    pub face: String,
    /// +0.5 when faces lie after centers, -0.5 when they lie before.
    pub face_shift: f64,
}

impl GridAxis {
    /// The axis under its canonical `*_c` / `*_f` labels.
    pub fn canonical(axis: Axis) -> Self {
        let face = axis.label(AxisPosition::Face);
        Self {
            axis,
            center: axis.label(AxisPosition::Center).name().to_string(),
            face: face.name().to_string(),
            face_shift: face.shift().unwrap_or(0.5),
        }
    }

    fn neighbour(&self, from_center: bool) -> Neighbour {
        let faces_after = self.face_shift > 0.0;
        if from_center == faces_after {
            Neighbour::Next
        } else {
            Neighbour::Previous
        }
    }
}

/// Operators along the axes of a staggered grid.
#[derive(Debug, Clone, Default)]
pub struct StaggeredGrid {
    axes: BTreeMap<Axis, GridAxis>,
}

impl StaggeredGrid {
    /// Grid with all three axes under canonical labels.
    pub fn canonical() -> Self {
        let axes = [Axis::X, Axis::Y, Axis::Z]
            .into_iter()
            .map(|a| (a, GridAxis::canonical(a)))
            .collect();
        Self { axes }
    }

    /// Build the grid from coordinates carrying `axis` metadata.
    ///
    /// A coordinate without `c_grid_axis_shift` is the center of its axis;
    /// one with it is the face. Axes and positions without a coordinate keep
    /// their canonical label so that variables can still be moved onto them.
    pub fn from_dataset(ds: &Dataset) -> GridResult<Self> {
        let mut axes = Self::canonical().axes;
        for (name, var) in ds.coords() {
            if var.dims().len() != 1 || var.dims()[0] != name {
                continue;
            }
            let Some(axis_attr) = var.attr_str(AXIS_ATTR) else {
                continue;
            };
            let axis = Axis::from_attr(axis_attr).ok_or_else(|| GridError::InvalidMetadata {
                coord: name.to_string(),
                message: format!("unknown axis '{}'", axis_attr),
            })?;
            let entry = axes
                .entry(axis)
                .or_insert_with(|| GridAxis::canonical(axis));
            match var.attrs().get(SHIFT_ATTR) {
                None => entry.center = name.to_string(),
                Some(value) => {
                    let shift = value.as_f64().ok_or_else(|| GridError::InvalidMetadata {
                        coord: name.to_string(),
                        message: format!("non-numeric shift {}", value),
                    })?;
                    entry.face = name.to_string();
                    entry.face_shift = shift;
                }
            }
        }
        Ok(Self { axes })
    }

    pub fn axis(&self, axis: Axis) -> GridResult<&GridAxis> {
        self.axes.get(&axis).ok_or(GridError::AxisNotFound(axis))
    }

    pub fn has_axis(&self, axis: Axis) -> bool {
        self.axes.contains_key(&axis)
    }

    pub fn axes(&self) -> impl Iterator<Item = &GridAxis> {
        self.axes.values()
    }

    /// Interpolate onto the other position of `axis`.
    pub fn interp(&self, var: &Variable, axis: Axis, boundary: Boundary) -> GridResult<Variable> {
        self.apply(var, axis, |lane, neighbour| {
            interp_lane(lane, neighbour, boundary)
        })
    }

    /// Interpolate along several axes in turn.
    pub fn interp_along(
        &self,
        var: &Variable,
        axes: &[Axis],
        boundary: Boundary,
    ) -> GridResult<Variable> {
        let mut out = var.clone();
        for axis in axes {
            out = self.interp(&out, *axis, boundary)?;
        }
        Ok(out)
    }

    /// Difference onto the other position of `axis`.
    pub fn diff(&self, var: &Variable, axis: Axis, boundary: Boundary) -> GridResult<Variable> {
        self.apply(var, axis, |lane, neighbour| {
            diff_lane(lane, neighbour, boundary)
        })
    }

    /// Cumulative sum onto the other position of `axis`.
    pub fn cumsum(&self, var: &Variable, axis: Axis) -> GridResult<Variable> {
        self.apply(var, axis, cumsum_lane)
    }

    fn apply(
        &self,
        var: &Variable,
        axis: Axis,
        stencil: impl Fn(&[f64], Neighbour) -> Vec<f64>,
    ) -> GridResult<Variable> {
        let grid_axis = self.axis(axis)?;
        let (dim, target, from_center) = if var.has_dim(&grid_axis.center) {
            (&grid_axis.center, &grid_axis.face, true)
        } else if var.has_dim(&grid_axis.face) {
            (&grid_axis.face, &grid_axis.center, false)
        } else {
            return Err(GridError::DimensionNotOnAxis {
                dims: var.dims().to_vec(),
                axis,
            });
        };
        let index = var
            .axis_of(dim)
            .ok_or_else(|| GridError::DimensionNotOnAxis {
                dims: var.dims().to_vec(),
                axis,
            })?;
        let neighbour = grid_axis.neighbour(from_center);

        let mut out = var.data().clone();
        for (mut dst, src) in out
            .lanes_mut(NdAxis(index))
            .into_iter()
            .zip(var.data().lanes(NdAxis(index)))
        {
            let lane: Vec<f64> = src.iter().copied().collect();
            for (d, v) in dst.iter_mut().zip(stencil(&lane, neighbour)) {
                *d = v;
            }
        }

        let dims: Vec<String> = var
            .dims()
            .iter()
            .map(|d| if d == dim { target.clone() } else { d.clone() })
            .collect();
        let mut result = Variable::new(dims, out).map_err(|e| GridError::InvalidMetadata {
            coord: dim.clone(),
            message: e.to_string(),
        })?;
        *result.attrs_mut() = var.attrs().clone();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_neighbours() {
        let x = GridAxis::canonical(Axis::X);
        assert_eq!(x.neighbour(true), Neighbour::Next);
        assert_eq!(x.neighbour(false), Neighbour::Previous);
        let z = GridAxis::canonical(Axis::Z);
        assert_eq!(z.face_shift, -0.5);
        assert_eq!(z.neighbour(true), Neighbour::Previous);
        assert_eq!(z.neighbour(false), Neighbour::Next);
    }

    #[test]
    fn test_interp_relabels_dimension() {
        let grid = StaggeredGrid::canonical();
        let var = Variable::from_shape_vec(vec!["y_c", "x_c"], &[2, 3], vec![
            0.0, 2.0, 4.0, //
            10.0, 12.0, 14.0,
        ])
        .unwrap();
        let out = grid.interp(&var, Axis::X, Boundary::Extend).unwrap();
        assert_eq!(out.dims(), &["y_c".to_string(), "x_f".to_string()]);
        let values: Vec<f64> = out.data().iter().copied().collect();
        assert_eq!(values, vec![1.0, 3.0, 4.0, 11.0, 13.0, 14.0]);
    }

    #[test]
    fn test_dimension_not_on_axis() {
        let grid = StaggeredGrid::canonical();
        let var = Variable::coordinate("x_c", vec![1.0, 2.0]);
        let err = grid.interp(&var, Axis::Z, Boundary::Extend).unwrap_err();
        assert!(matches!(err, GridError::DimensionNotOnAxis { axis: Axis::Z, .. }));
    }

    #[test]
    fn test_missing_axis() {
        let grid = StaggeredGrid::default();
        let var = Variable::coordinate("x_c", vec![1.0]);
        assert!(matches!(
            grid.interp(&var, Axis::X, Boundary::Extend),
            Err(GridError::AxisNotFound(Axis::X))
        ));
    }
}
