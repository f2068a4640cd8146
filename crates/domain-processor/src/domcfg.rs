//! Assembly of the domain configuration.
//!
//! Takes the stitched raw dataset, moves every registered field onto the
//! axis labels of its grid point, builds the six staggered coordinates with
//! the metadata the grid operators read, and drops axes nobody uses.

use std::collections::BTreeSet;

use nemo_common::{
    Axis, AxisLabel, AxisPosition, Dataset, FieldPlacement, NemoResult, Point, PointRegistry,
    Variable,
};
use staggered_grid::{AXIS_ATTR, SHIFT_ATTR};
use tracing::debug;

/// Fields promoted to coordinates when `add_coordinates` is set.
pub const COORDINATE_FIELDS: [&str; 12] = [
    "glamt", "glamu", "glamv", "glamf", "gphit", "gphiu", "gphiv", "gphif", "gdept_0", "gdepw_0",
    "gdept_1d", "gdepw_1d",
];

/// Generic dimension names of raw files along each axis.
fn raw_dim(axis: Axis) -> &'static str {
    match axis {
        Axis::X => "x",
        Axis::Y => "y",
        Axis::Z => "nav_lev",
    }
}

/// Relabel a stitched dataset into a domain configuration.
pub fn assemble_domain_cfg(stitched: Dataset, add_coordinates: bool) -> NemoResult<Dataset> {
    let mut ds = relabel_fields(stitched)?;

    for axis in [Axis::X, Axis::Y, Axis::Z] {
        add_axis_coordinates(&mut ds, axis)?;
    }

    let pruned = prune_unused_coordinates(&mut ds);
    if !pruned.is_empty() {
        debug!(coordinates = ?pruned, "Dropped unused coordinates");
    }

    if add_coordinates {
        promote_coordinate_fields(&mut ds);
    }
    Ok(ds)
}

/// Rename the generic dimensions of every registered field.
fn relabel_fields(mut ds: Dataset) -> NemoResult<Dataset> {
    let names: Vec<String> = ds.data_vars().map(|(n, _)| n.to_string()).collect();
    for name in names {
        let Some(FieldPlacement::Point(point_type)) = PointRegistry::lookup(&name) else {
            continue;
        };
        let point = Point::new(point_type);
        let Some(var) = ds.get(&name) else {
            continue;
        };
        let dims: Vec<String> = var
            .dims()
            .iter()
            .map(|d| {
                [Axis::X, Axis::Y, Axis::Z]
                    .into_iter()
                    .find(|a| raw_dim(*a) == d)
                    .map(|a| point.label(a).name().to_string())
                    .unwrap_or_else(|| d.clone())
            })
            .collect();
        let relabeled = var.with_dims(dims)?;
        ds.insert(name, relabeled)?;
    }
    Ok(ds)
}

/// Build center and face coordinates along `axis` when any field uses it.
///
/// Horizontal centers keep the global index from stitching and faces sit
/// half a cell after them. Vertical centers are renumbered from zero and
/// faces sit half a level above.
fn add_axis_coordinates(ds: &mut Dataset, axis: Axis) -> NemoResult<()> {
    let center = axis.label(AxisPosition::Center);
    let face = axis.label(AxisPosition::Face);
    let Some(n) = ds
        .dim_len(center.name())
        .or_else(|| ds.dim_len(face.name()))
    else {
        return Ok(());
    };

    let center_values: Vec<f64> = match axis {
        Axis::Z => (0..n).map(|k| k as f64).collect(),
        _ => ds
            .get(raw_dim(axis))
            .and_then(Variable::values_1d)
            .filter(|v| v.len() == n)
            .unwrap_or_else(|| (0..n).map(|i| i as f64).collect()),
    };
    let shift = face.shift().unwrap_or(0.5);
    let face_values: Vec<f64> = center_values.iter().map(|v| v + shift).collect();

    ds.insert_coord(center.name(), axis_coordinate(center, center_values))?;
    ds.insert_coord(face.name(), axis_coordinate(face, face_values))?;
    Ok(())
}

/// A 1-D coordinate tagged with its axis and, for faces, its shift.
pub fn axis_coordinate(label: AxisLabel, values: Vec<f64>) -> Variable {
    let var = Variable::coordinate(label.name(), values).with_attr(AXIS_ATTR, label.axis().as_str());
    match label.shift() {
        Some(shift) => var.with_attr(SHIFT_ATTR, shift),
        None => var,
    }
}

/// Drop every coordinate whose dimension no data field uses, together with
/// anything else indexed by it. Returns the dropped names.
fn prune_unused_coordinates(ds: &mut Dataset) -> Vec<String> {
    let used: BTreeSet<String> = ds
        .data_vars()
        .flat_map(|(_, v)| v.dims().iter().cloned())
        .collect();
    let unused: Vec<String> = ds
        .coord_names()
        .filter(|c| !used.contains(*c))
        .map(str::to_string)
        .collect();
    for coord in &unused {
        ds.drop_dims(&[coord.as_str()]);
        ds.remove(coord);
    }
    unused
}

fn promote_coordinate_fields(ds: &mut Dataset) {
    for name in COORDINATE_FIELDS {
        ds.set_coord(name);
    }
}
