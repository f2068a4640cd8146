//! Merging per-processor tiles into one global dataset.
//!
//! NEMO run on N processors writes N domain configuration files, each
//! covering a rectangle of the global grid and carrying the 1-based global
//! index of its first cell in `DOMAIN_position_first`. Stitching places
//! every tile at `(x0 - 1, y0 - 1)` in a shared 0-based index space and
//! unions the tiles over it.
//!
//! # Overlaps
//!
//! Tiles are applied in input order and a later tile overwrites an earlier
//! one where both cover a cell. When the two values differ (and neither is
//! NaN) the cell is counted as a conflict and reported once per variable
//! with a warning; stitching never fails on conflicts.

use std::collections::{BTreeMap, BTreeSet};

use ndarray::{ArrayD, IxDyn};
use nemo_common::raw::DECOMPOSITION_ATTRS;
use nemo_common::{Attributes, Dataset, NemoError, NemoResult, RawDataset, Variable};
use serde_json::Value;
use tracing::{debug, warn};

/// Dimensions collapsed when they have a single step.
pub const SQUEEZED_TIME_DIMS: [&str; 2] = ["time_counter", "t"];

/// Horizontal dimensions of raw files.
const X: &str = "x";
const Y: &str = "y";
/// Vertical dimension of raw domain configuration files.
const LEVEL: &str = "nav_lev";

/// Outcome of a stitch, for callers that want the bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct StitchReport {
    pub tiles: usize,
    /// Cells written twice with different non-NaN values, per variable.
    pub conflicts: BTreeMap<String, usize>,
}

impl StitchReport {
    pub fn total_conflicts(&self) -> usize {
        self.conflicts.values().sum()
    }
}

/// A tile with its offset in the global index space.
struct Placed<'a> {
    dataset: Dataset,
    offset: (usize, usize),
    raw: &'a RawDataset,
}

/// Stitch tiles into one dataset over global `x`/`y` indices.
pub fn stitch_tiles(tiles: &[RawDataset]) -> NemoResult<Dataset> {
    stitch_tiles_with_report(tiles).map(|(ds, _)| ds)
}

/// [`stitch_tiles`] that also returns the overlap report.
pub fn stitch_tiles_with_report(tiles: &[RawDataset]) -> NemoResult<(Dataset, StitchReport)> {
    if tiles.is_empty() {
        return Err(NemoError::NoFilesFound(
            "no 'domain_cfg' or 'mesh_mask' files are provided".to_string(),
        ));
    }

    let placed = tiles
        .iter()
        .map(place_tile)
        .collect::<NemoResult<Vec<_>>>()?;

    let x_index = global_index(&placed, X, |p| p.offset.0);
    let y_index = global_index(&placed, Y, |p| p.offset.1);

    let mut names: Vec<String> = Vec::new();
    for p in &placed {
        for name in p.dataset.names() {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }

    let mut report = StitchReport {
        tiles: tiles.len(),
        ..Default::default()
    };
    let mut out = Dataset::new();
    for name in &names {
        let (var, conflicts) = stitch_variable(name, &placed, &x_index, &y_index)?;
        if conflicts > 0 {
            warn!(
                variable = %name,
                cells = conflicts,
                "Overlapping tiles disagree, keeping the later tile"
            );
            report.conflicts.insert(name.clone(), conflicts);
        }
        let is_coord = placed.iter().any(|p| p.dataset.is_coord(name));
        if is_coord {
            out.insert_coord(name.as_str(), var)?;
        } else {
            out.insert(name.as_str(), var)?;
        }
    }

    if !x_index.is_empty() {
        out.insert_coord(X, Variable::coordinate(X, to_f64(&x_index)))?;
    }
    if !y_index.is_empty() {
        out.insert_coord(Y, Variable::coordinate(Y, to_f64(&y_index)))?;
    }
    if out.contains(LEVEL) {
        out.set_coord(LEVEL);
    }

    for dim in SQUEEZED_TIME_DIMS {
        if out.squeeze(dim) {
            // the squeezed time coordinate is now a scalar with no meaning
            if out.get(dim).map(|v| v.ndim() == 0).unwrap_or(false) {
                out.remove(dim);
            }
        }
    }

    *out.attrs_mut() = merge_attrs(placed.iter().map(|p| p.dataset.attrs()));
    for key in DECOMPOSITION_ATTRS {
        out.attrs_mut().remove(key);
    }

    debug!(
        tiles = report.tiles,
        nx = x_index.len(),
        ny = y_index.len(),
        variables = out.len(),
        "Stitched tiles"
    );
    Ok((out, report))
}

fn place_tile(raw: &RawDataset) -> NemoResult<Placed<'_>> {
    let mut dataset = raw.dataset().clone();
    // mesh masks name the vertical dimension `z`
    if dataset.has_dim("z") || dataset.contains("z") {
        dataset.rename("z", LEVEL)?;
    }
    // positions are implied by the offset, a stored index would be local
    for dim in [X, Y] {
        if dataset.get(dim).map(|v| v.ndim() == 1).unwrap_or(false) {
            dataset.remove(dim);
        }
    }
    let offset = match raw.position_first() {
        Some((x0, y0)) => {
            if x0 < 1 || y0 < 1 {
                return Err(NemoError::read(
                    raw.file_name().to_string(),
                    format!("invalid DOMAIN_position_first ({}, {})", x0, y0),
                ));
            }
            ((x0 - 1) as usize, (y0 - 1) as usize)
        }
        None => (0, 0),
    };
    Ok(Placed {
        dataset,
        offset,
        raw,
    })
}

/// Sorted global indices covered by any tile along `dim`.
fn global_index(
    placed: &[Placed<'_>],
    dim: &str,
    offset: impl Fn(&Placed<'_>) -> usize,
) -> Vec<usize> {
    let mut covered = BTreeSet::new();
    for p in placed {
        if let Some(n) = p.dataset.dim_len(dim) {
            let o = offset(p);
            covered.extend(o..o + n);
        }
    }
    covered.into_iter().collect()
}

fn to_f64(index: &[usize]) -> Vec<f64> {
    index.iter().map(|&i| i as f64).collect()
}

fn stitch_variable(
    name: &str,
    placed: &[Placed<'_>],
    x_index: &[usize],
    y_index: &[usize],
) -> NemoResult<(Variable, usize)> {
    let sources: Vec<(&Placed<'_>, &Variable)> = placed
        .iter()
        .filter_map(|p| p.dataset.get(name).map(|v| (p, v)))
        .collect();
    let Some((_, first)) = sources.first() else {
        return Err(NemoError::missing_variable(name));
    };

    let dims = first.dims().to_vec();
    let ix = first.axis_of(X);
    let iy = first.axis_of(Y);
    let mut shape = first.shape().to_vec();
    if let Some(i) = ix {
        shape[i] = x_index.len();
    }
    if let Some(i) = iy {
        shape[i] = y_index.len();
    }

    let mut data = ArrayD::from_elem(IxDyn(&shape), f64::NAN);
    let mut written = ArrayD::from_elem(IxDyn(&shape), false);
    let mut attrs: Vec<&Attributes> = Vec::with_capacity(sources.len());
    let mut conflicts = 0;

    for (tile, var) in &sources {
        if var.dims() != dims.as_slice() {
            return Err(NemoError::read(
                tile.raw.file_name().to_string(),
                format!(
                    "variable '{}' has dimensions {:?}, other tiles use {:?}",
                    name,
                    var.dims(),
                    dims
                ),
            ));
        }
        for (axis, (&n, &expected)) in var.shape().iter().zip(&shape).enumerate() {
            if Some(axis) != ix && Some(axis) != iy && n != expected {
                return Err(NemoError::ShapeMismatch {
                    name: name.to_string(),
                    dim: dims[axis].clone(),
                    expected,
                    found: n,
                });
            }
        }
        attrs.push(var.attrs());

        let mut target = vec![0usize; shape.len()];
        for (local, &value) in var.data().indexed_iter() {
            for (axis, slot) in target.iter_mut().enumerate() {
                *slot = local[axis];
            }
            if let Some(i) = ix {
                target[i] = position(x_index, local[i] + tile.offset.0)?;
            }
            if let Some(i) = iy {
                target[i] = position(y_index, local[i] + tile.offset.1)?;
            }
            let at = IxDyn(&target);
            if written[&at] {
                let previous = data[&at];
                if !previous.is_nan() && !value.is_nan() && previous != value {
                    conflicts += 1;
                }
            }
            data[&at] = value;
            written[&at] = true;
        }
    }

    let mut var = Variable::new(dims, data)?;
    *var.attrs_mut() = merge_attrs(attrs.into_iter());
    Ok((var, conflicts))
}

fn position(index: &[usize], global: usize) -> NemoResult<usize> {
    index
        .binary_search(&global)
        .map_err(|_| NemoError::InvalidShape(format!("global index {} outside stitched grid", global)))
}

/// Union of attribute maps, dropping keys whose values disagree.
pub fn merge_attrs<'a>(maps: impl Iterator<Item = &'a Attributes>) -> Attributes {
    let mut merged = Attributes::new();
    let mut dropped: BTreeSet<String> = BTreeSet::new();
    for attrs in maps {
        for (key, value) in attrs {
            if dropped.contains(key) {
                continue;
            }
            match merged.get(key) {
                Some(existing) if !same_value(existing, value) => {
                    merged.remove(key);
                    dropped.insert(key.clone());
                }
                Some(_) => {}
                None => {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }
    }
    merged
}

fn same_value(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}
