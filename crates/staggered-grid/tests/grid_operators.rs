//! Grid operators on a dataset laid out like an assembled domain.

use nemo_common::{Axis, Dataset, Variable};
use staggered_grid::{Boundary, GridError, StaggeredGrid, AXIS_ATTR, SHIFT_ATTR};
use test_utils::{assert_values_approx_eq, create_array};

fn axis_coord(dim: &str, axis: &str, shift: Option<f64>, n: usize) -> Variable {
    let offset = shift.unwrap_or(0.0);
    let var = Variable::coordinate(dim, (0..n).map(|i| i as f64 + offset).collect())
        .with_attr(AXIS_ATTR, axis);
    match shift {
        Some(s) => var.with_attr(SHIFT_ATTR, s),
        None => var,
    }
}

/// 3 levels, 2 rows, 4 columns under canonical labels.
fn domain() -> Dataset {
    let mut ds = Dataset::new();
    for (dim, axis, shift, n) in [
        ("x_c", "X", None, 4),
        ("x_f", "X", Some(0.5), 4),
        ("y_c", "Y", None, 2),
        ("y_f", "Y", Some(0.5), 2),
        ("z_c", "Z", None, 3),
        ("z_f", "Z", Some(-0.5), 3),
    ] {
        ds.insert_coord(dim, axis_coord(dim, axis, shift, n)).unwrap();
    }
    let e3t = Variable::new(
        vec!["z_c", "y_c", "x_c"],
        create_array(&[3, 2, 4], |n| 10.0 + n as f64),
    )
    .unwrap();
    ds.insert("e3t_0", e3t).unwrap();
    ds
}

#[test]
fn test_vertical_faces_sit_above_centers() {
    let ds = domain();
    let grid = StaggeredGrid::from_dataset(&ds).unwrap();
    let e3t = ds.get("e3t_0").unwrap();

    let e3w = grid.interp(e3t, Axis::Z, Boundary::Extend).unwrap();
    assert_eq!(e3w.dims(), &["z_f", "y_c", "x_c"]);
    // column (j=0, i=0) holds 10, 18, 26 on the centers
    let column: Vec<f64> = (0..3).map(|k| e3w.data()[[k, 0, 0]]).collect();
    assert_eq!(column, vec![10.0, 14.0, 22.0]);
}

#[test]
fn test_interp_along_reaches_the_corner_point() {
    let ds = domain();
    let grid = StaggeredGrid::from_dataset(&ds).unwrap();
    let e3t = ds.get("e3t_0").unwrap();

    let xy = grid
        .interp_along(e3t, &[Axis::X, Axis::Y], Boundary::Extend)
        .unwrap();
    let yx = grid
        .interp_along(e3t, &[Axis::Y, Axis::X], Boundary::Extend)
        .unwrap();
    assert_eq!(xy.dims(), &["z_c", "y_f", "x_f"]);
    assert_values_approx_eq!(xy.data().iter().copied(), yx.data().iter().copied(), 1e-12);

    // interior corner is the mean of its four surrounding centers
    let expected = (10.0 + 11.0 + 14.0 + 15.0) / 4.0;
    assert_eq!(xy.data()[[0, 0, 0]], expected);
}

#[test]
fn test_cumsum_undoes_diff() {
    let ds = domain();
    let grid = StaggeredGrid::from_dataset(&ds).unwrap();
    let squares = Variable::new(
        vec!["y_c", "x_c"],
        create_array(&[2, 4], |n| ((n % 4) * (n % 4)) as f64 + 1.0),
    )
    .unwrap();

    let slopes = grid.diff(&squares, Axis::X, Boundary::Fill(0.0)).unwrap();
    assert_eq!(slopes.dims(), &["y_c", "x_f"]);
    let row: Vec<f64> = (0..4).map(|i| slopes.data()[[0, i]]).collect();
    assert_eq!(row, vec![1.0, 3.0, 5.0, -10.0]);

    let back = grid.cumsum(&slopes, Axis::X).unwrap();
    assert_eq!(back.dims(), &["y_c", "x_c"]);
    let row: Vec<f64> = (0..4).map(|i| back.data()[[1, i]]).collect();
    assert_eq!(row, vec![0.0, 1.0, 4.0, 9.0]);
}

#[test]
fn test_renamed_labels_are_followed() {
    let mut ds = Dataset::new();
    ds.insert_coord("lon_t", axis_coord("lon_t", "X", None, 3))
        .unwrap();
    ds.insert_coord("lon_u", axis_coord("lon_u", "X", Some(0.5), 3))
        .unwrap();
    let grid = StaggeredGrid::from_dataset(&ds).unwrap();
    let x = grid.axis(Axis::X).unwrap();
    assert_eq!(x.center, "lon_t");
    assert_eq!(x.face, "lon_u");

    let field = Variable::coordinate("lon_t", vec![0.0, 2.0, 4.0]);
    let out = grid.interp(&field, Axis::X, Boundary::Extend).unwrap();
    assert_eq!(out.dims(), &["lon_u"]);
    assert_eq!(out.values_1d().unwrap(), vec![1.0, 3.0, 4.0]);
}

#[test]
fn test_bad_axis_metadata() {
    let mut ds = Dataset::new();
    ds.insert_coord("x_c", Variable::coordinate("x_c", vec![0.0]).with_attr(AXIS_ATTR, "Q"))
        .unwrap();
    let err = StaggeredGrid::from_dataset(&ds).unwrap_err();
    assert!(matches!(err, GridError::InvalidMetadata { ref coord, .. } if coord == "x_c"));
}
