//! Generators for synthetic NEMO-like datasets.
//!
//! Values follow predictable patterns so that tests can check where each
//! cell ended up after stitching and relabeling: a cell at global
//! `(i, j, k)` of a field with base `b` holds `b + i + 100 j + 10000 k`.

use std::ops::Range;

use ndarray::{ArrayD, Axis, IxDyn, Slice};
use nemo_common::{Dataset, GridPointType, Variable};
use serde_json::json;

use crate::fixtures::domain::DomainSize;
use crate::fixtures::names;

/// Value of cell `(i, j, k)` for a field with base `base`.
///
/// # Example
///
/// ```
/// use test_utils::cell_value;
///
/// assert_eq!(cell_value(0.0, 3, 2, 1), 10203.0);
/// ```
pub fn cell_value(base: f64, i: usize, j: usize, k: usize) -> f64 {
    base + i as f64 + 100.0 * j as f64 + 10000.0 * k as f64
}

/// Horizontal fields of a domain configuration with their bases.
const HORIZONTAL_FIELDS: [(&str, f64); 22] = [
    ("glamt", 0.0),
    ("glamu", 0.5),
    ("glamv", 0.25),
    ("glamf", 0.75),
    ("gphit", 1.0e6),
    ("gphiu", 1.0e6 + 0.5),
    ("gphiv", 1.0e6 + 0.25),
    ("gphif", 1.0e6 + 0.75),
    ("e1t", 2.0e6),
    ("e1u", 2.1e6),
    ("e1v", 2.2e6),
    ("e1f", 2.3e6),
    ("e2t", 3.0e6),
    ("e2u", 3.1e6),
    ("e2v", 3.2e6),
    ("e2f", 3.3e6),
    ("ff_t", 4.0e6),
    ("ff_f", 4.1e6),
    ("bottom_level", 5.0e6),
    ("top_level", 5.1e6),
    ("ht_0", 6.0e6),
    ("hu_0", 6.1e6),
];

/// Three-dimensional fields of a domain configuration.
const VOLUME_FIELDS: [(&str, f64); 13] = [
    ("e3t_0", 10.0),
    ("e3u_0", 20.0),
    ("e3v_0", 30.0),
    ("e3f_0", 40.0),
    ("e3w_0", 50.0),
    ("e3uw_0", 60.0),
    ("e3vw_0", 70.0),
    ("gdept_0", 80.0),
    ("gdepw_0", 90.0),
    ("tmask", 0.0),
    ("umask", 0.0),
    ("vmask", 0.0),
    ("fmask", 0.0),
];

/// One-dimensional vertical profiles.
const PROFILE_FIELDS: [(&str, f64); 4] = [
    ("e3t_1d", 10.0),
    ("e3w_1d", 50.0),
    ("gdept_1d", 80.0),
    ("gdepw_1d", 90.0),
];

fn grid_values(base: f64, nx: usize, ny: usize, nz: usize) -> Vec<f64> {
    let mut values = Vec::with_capacity(nx * ny * nz.max(1));
    for k in 0..nz.max(1) {
        for j in 0..ny {
            for i in 0..nx {
                values.push(cell_value(base, i, j, k));
            }
        }
    }
    values
}

fn var(dims: Vec<&str>, shape: &[usize], values: Vec<f64>) -> Variable {
    Variable::from_shape_vec(dims, shape, values).expect("generator shapes are consistent")
}

/// Creates a single-file domain configuration as NEMO writes it.
///
/// Dimensions are `t` (length 1), `nav_lev`, `y` and `x`. Masks are 1
/// everywhere; a surface-only domain gets no vertical field at all.
pub fn create_domcfg(size: &DomainSize) -> Dataset {
    let DomainSize { nx, ny, nz } = *size;
    let t = names::DOMCFG_TIME;
    let lev = names::DOMCFG_LEVEL;
    let mut ds = Dataset::new();

    for (name, base) in HORIZONTAL_FIELDS {
        let v = var(vec![t, "y", "x"], &[1, ny, nx], grid_values(base, nx, ny, 1));
        ds.insert(name, v).expect("consistent dims");
    }
    ds.insert(
        "nav_lon",
        var(vec!["y", "x"], &[ny, nx], grid_values(0.0, nx, ny, 1)),
    )
    .expect("consistent dims");
    ds.insert(
        "nav_lat",
        var(vec!["y", "x"], &[ny, nx], grid_values(1.0e6, nx, ny, 1)),
    )
    .expect("consistent dims");

    if size.has_vertical() {
        for (name, base) in VOLUME_FIELDS {
            let values = if name.ends_with("mask") {
                vec![1.0; nx * ny * nz]
            } else {
                grid_values(base, nx, ny, nz)
            };
            ds.insert(name, var(vec![t, lev, "y", "x"], &[1, nz, ny, nx], values))
                .expect("consistent dims");
        }
        for (name, base) in PROFILE_FIELDS {
            let values = (0..nz).map(|k| cell_value(base, 0, 0, k)).collect();
            ds.insert(name, var(vec![t, lev], &[1, nz], values))
                .expect("consistent dims");
        }
        let depths = (0..nz).map(|k| 5.0 + 10.0 * k as f64).collect();
        ds.insert_coord(lev, Variable::coordinate(lev, depths))
            .expect("consistent dims");
    }

    for (name, value) in [
        ("jpiglo", nx as f64),
        ("jpjglo", ny as f64),
        ("jpkglo", nz as f64),
        ("jperio", 0.0),
        ("ln_zco", 0.0),
        ("ln_zps", 1.0),
        ("ln_sco", 0.0),
        ("ln_isfcav", 0.0),
    ] {
        ds.insert(name, var(vec![t], &[1], vec![value]))
            .expect("consistent dims");
    }

    ds.attrs_mut().insert("Conventions".into(), json!("CF-1.6"));
    ds.attrs_mut().insert("title".into(), json!("BASIN domain configuration"));
    ds
}

/// Split `total` cells into `parts` contiguous ranges, larger ranges first.
pub fn split_range(total: usize, parts: usize) -> Vec<Range<usize>> {
    let parts = parts.max(1);
    let base = total / parts;
    let extra = total % parts;
    let mut ranges = Vec::with_capacity(parts);
    let mut start = 0;
    for p in 0..parts {
        let len = base + usize::from(p < extra);
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

/// Cut a global file into per-processor tiles.
///
/// Each tile carries the `DOMAIN_*` attributes NEMO writes, with 1-based
/// first and last global indices. Tiles are ordered row by row.
pub fn split_into_tiles(global: &Dataset, tiles_x: usize, tiles_y: usize) -> Vec<Dataset> {
    let nx = global.dim_len("x").unwrap_or(0);
    let ny = global.dim_len("y").unwrap_or(0);
    let total = tiles_x * tiles_y;
    let mut tiles = Vec::with_capacity(total);

    for (tj, yr) in split_range(ny, tiles_y).into_iter().enumerate() {
        for (ti, xr) in split_range(nx, tiles_x).into_iter().enumerate() {
            let mut tile = Dataset::new();
            for (name, v) in global.variables() {
                let sliced = slice_var(v, &xr, &yr);
                if global.is_coord(name) {
                    tile.insert_coord(name, sliced).expect("consistent dims");
                } else {
                    tile.insert(name, sliced).expect("consistent dims");
                }
            }
            *tile.attrs_mut() = global.attrs().clone();
            let attrs = tile.attrs_mut();
            attrs.insert(
                "DOMAIN_position_first".into(),
                json!([xr.start + 1, yr.start + 1]),
            );
            attrs.insert("DOMAIN_position_last".into(), json!([xr.end, yr.end]));
            attrs.insert("DOMAIN_number".into(), json!(tj * tiles_x + ti));
            attrs.insert("DOMAIN_number_total".into(), json!(total));
            attrs.insert("DOMAIN_size_local".into(), json!([xr.len(), yr.len()]));
            tiles.push(tile);
        }
    }
    tiles
}

fn slice_var(v: &Variable, xr: &Range<usize>, yr: &Range<usize>) -> Variable {
    let mut data: ArrayD<f64> = v.data().clone();
    if let Some(ix) = v.axis_of("x") {
        data = data
            .slice_axis(Axis(ix), Slice::from(xr.clone()))
            .to_owned();
    }
    if let Some(iy) = v.axis_of("y") {
        data = data
            .slice_axis(Axis(iy), Slice::from(yr.clone()))
            .to_owned();
    }
    v.with_data(data).expect("slicing keeps the rank")
}

/// Creates a `<prefix>_grid_<TYPE>.nc`-like field file.
///
/// The file holds one field variable over `time_counter`, the point's depth
/// dimension (when the domain has levels), `y` and `x`, plus `nav_lon`,
/// `nav_lat`, `time_counter`, `time_counter_bounds` and the depth axis.
pub fn create_field_file(point: GridPointType, size: &DomainSize, nt: usize) -> Dataset {
    let DomainSize { nx, ny, nz } = *size;
    let p = point.as_str();
    let depth = names::depth_dim(p);
    let mut ds = Dataset::new();

    let mut values = Vec::with_capacity(nt * nx * ny * nz.max(1));
    for step in 0..nt {
        values.extend(grid_values(1.0e5 * step as f64, nx, ny, nz));
    }
    let field = if size.has_vertical() {
        var(
            vec![names::TIME, depth.as_str(), "y", "x"],
            &[nt, nz, ny, nx],
            values,
        )
    } else {
        var(vec![names::TIME, "y", "x"], &[nt, ny, nx], values)
    };
    ds.insert(names::field_variable(p), field.with_attr("units", "1"))
        .expect("consistent dims");

    ds.insert(
        "nav_lon",
        var(vec!["y", "x"], &[ny, nx], grid_values(0.0, nx, ny, 1)),
    )
    .expect("consistent dims");
    ds.insert(
        "nav_lat",
        var(vec!["y", "x"], &[ny, nx], grid_values(1.0e6, nx, ny, 1)),
    )
    .expect("consistent dims");

    if size.has_vertical() {
        let depths = (0..nz).map(|k| 5.0 + 10.0 * k as f64).collect();
        ds.insert_coord(depth.as_str(), Variable::coordinate(depth.as_str(), depths))
            .expect("consistent dims");
    }

    let times: Vec<f64> = (0..nt).map(|s| 86400.0 * (s as f64 + 0.5)).collect();
    let bounds: Vec<f64> = (0..nt)
        .flat_map(|s| [86400.0 * s as f64, 86400.0 * (s as f64 + 1.0)])
        .collect();
    ds.insert_coord(
        names::TIME,
        Variable::coordinate(names::TIME, times).with_attr("units", "seconds since 1900-01-01"),
    )
    .expect("consistent dims");
    ds.insert(
        "time_counter_bounds",
        var(vec![names::TIME, names::BOUNDS], &[nt, 2], bounds),
    )
    .expect("consistent dims");

    ds.attrs_mut().insert(
        "description".into(),
        json!(format!("ocean {} grid variables", p)),
    );
    ds.attrs_mut()
        .insert("name".into(), json!(format!("BASIN_grid_{}", p)));
    ds
}

/// Adds a time-varying scale factor `e3<point>` to a field file.
pub fn add_time_varying_scale_factor(ds: &mut Dataset, point: GridPointType, size: &DomainSize) {
    let DomainSize { nx, ny, nz } = *size;
    let nt = ds.dim_len(names::TIME).unwrap_or(1);
    let depth = names::depth_dim(point.as_str());
    let mut values = Vec::with_capacity(nt * nx * ny * nz);
    for _ in 0..nt {
        values.extend(grid_values(11.0, nx, ny, nz));
    }
    let name = format!("e3{}", point.suffix());
    ds.insert(
        name,
        var(
            vec![names::TIME, depth.as_str(), "y", "x"],
            &[nt, nz, ny, nx],
            values,
        ),
    )
    .expect("consistent dims");
}

/// A row-major array of the given shape filled by `f(flat_index)`.
pub fn create_array(shape: &[usize], f: impl Fn(usize) -> f64) -> ArrayD<f64> {
    let n: usize = shape.iter().product();
    ArrayD::from_shape_vec(IxDyn(shape), (0..n).map(f).collect()).expect("length matches shape")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{decomposition, domain};

    #[test]
    fn test_split_range() {
        let ranges = split_range(10, 4);
        assert_eq!(ranges, vec![0..3, 3..6, 6..8, 8..10]);
        assert_eq!(split_range(5, 1), vec![0..5]);
    }

    #[test]
    fn test_domcfg_shapes() {
        let ds = create_domcfg(&domain::BASIN);
        assert_eq!(ds.get("e3t_0").unwrap().shape(), &[1, 5, 10, 10]);
        assert_eq!(ds.get("glamt").unwrap().shape(), &[1, 10, 10]);
        assert_eq!(ds.get("e3t_1d").unwrap().shape(), &[1, 5]);
        assert!(ds.is_coord("nav_lev"));
    }

    #[test]
    fn test_surface_domcfg_has_no_levels() {
        let ds = create_domcfg(&domain::SURFACE);
        assert!(!ds.has_dim("nav_lev"));
        assert!(!ds.contains("e3t_0"));
    }

    #[test]
    fn test_tiles_cover_domain() {
        let ds = create_domcfg(&domain::BASIN);
        let (tx, ty) = decomposition::FOUR_BY_ONE;
        let tiles = split_into_tiles(&ds, tx, ty);
        assert_eq!(tiles.len(), 4);
        let widths: usize = tiles.iter().map(|t| t.dim_len("x").unwrap()).sum();
        assert_eq!(widths, 10);
        assert_eq!(tiles[1].attrs()["DOMAIN_position_first"], json!([4, 1]));
        // first cell of the second tile is global column 3
        let first = tiles[1].get("glamt").unwrap().data().iter().next().copied();
        assert_eq!(first, Some(cell_value(0.0, 3, 0, 0)));
    }

    #[test]
    fn test_field_file() {
        let ds = create_field_file(GridPointType::U, &domain::SMALL, 3);
        assert_eq!(ds.get("uo").unwrap().shape(), &[3, 2, 3, 4]);
        assert_eq!(ds.attrs()["description"], json!("ocean U grid variables"));
        assert!(ds.contains("depthu"));
    }

    #[test]
    fn test_surface_field_file() {
        let ds = create_field_file(GridPointType::T, &domain::SURFACE, 1);
        assert_eq!(ds.get("thetao").unwrap().dims().len(), 3);
    }
}
