//! Grid metrics and the scale factor dependency graph.
//!
//! NEMO only writes some of the vertical scale factors. The missing ones are
//! interpolated from a neighbouring point along a fixed graph rooted at
//! `e3t`:
//!
//! ```text
//! e3t ─X─► e3u ─Y─► e3f
//!  │  ─Y─► e3v ─X─►  ▲
//!  │                 └── (e3t, X then Y)
//!  Z
//!  ▼
//! e3w ─X─► e3uw ─Y─► e3fw
//!     ─Y─► e3vw ─X─►  ▲
//!                     └── (e3w, X then Y)
//! ```
//!
//! Nodes are visited in declaration order and each uses the first of its
//! listed parents that exists. Midpoint interpolation of a thickness is an
//! approximation; derived fields carry a `WARNING` attribute saying so.

use std::collections::BTreeMap;

use ndarray::{ArrayD, IxDyn};
use nemo_common::{Axis, AxisPosition, Dataset, NemoError, NemoResult, Variable};
use staggered_grid::{Boundary, StaggeredGrid};
use tracing::{debug, warn};

use crate::merge::WARNING_ATTR;

/// One way of deriving a scale factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Derivation {
    pub parent: &'static str,
    /// Axes to interpolate along, in order.
    pub axes: &'static [Axis],
}

/// A scale factor and its parents in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleFactorNode {
    pub name: &'static str,
    pub parents: &'static [Derivation],
}

impl ScaleFactorNode {
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }
}

const fn from(parent: &'static str, axes: &'static [Axis]) -> Derivation {
    Derivation { parent, axes }
}

/// Root of the graph.
pub const ROOT_SCALE_FACTOR: &str = "e3t";

/// Vertical profile broadcast when the root is missing.
pub const ROOT_PROFILE: &str = "e3t_1d";

/// The scale factor graph, in resolution order.
pub const SCALE_FACTOR_GRAPH: [ScaleFactorNode; 8] = [
    ScaleFactorNode {
        name: "e3t",
        parents: &[],
    },
    ScaleFactorNode {
        name: "e3u",
        parents: &[from("e3t", &[Axis::X])],
    },
    ScaleFactorNode {
        name: "e3v",
        parents: &[from("e3t", &[Axis::Y])],
    },
    ScaleFactorNode {
        name: "e3w",
        parents: &[from("e3t", &[Axis::Z])],
    },
    ScaleFactorNode {
        name: "e3f",
        parents: &[
            from("e3u", &[Axis::Y]),
            from("e3v", &[Axis::X]),
            from("e3t", &[Axis::X, Axis::Y]),
        ],
    },
    ScaleFactorNode {
        name: "e3uw",
        parents: &[from("e3w", &[Axis::X])],
    },
    ScaleFactorNode {
        name: "e3vw",
        parents: &[from("e3w", &[Axis::Y])],
    },
    ScaleFactorNode {
        name: "e3fw",
        parents: &[
            from("e3uw", &[Axis::Y]),
            from("e3vw", &[Axis::X]),
            from("e3w", &[Axis::X, Axis::Y]),
        ],
    },
];

/// Metric names per axis, in the order a grid expects them.
const METRICS: [(Axis, [&str; 5]); 3] = [
    (Axis::X, ["e1t", "e1u", "e1v", "e1f", ""]),
    (Axis::Y, ["e2t", "e2u", "e2v", "e2f", ""]),
    (Axis::Z, ["e3t", "e3u", "e3v", "e3f", "e3w"]),
];

/// Look up a node by its base name.
pub fn scale_factor_node(name: &str) -> Option<&'static ScaleFactorNode> {
    SCALE_FACTOR_GRAPH.iter().find(|n| n.name == name)
}

/// Metrics present in `ds`, per axis.
///
/// Axes with no metric present map to an empty list.
pub fn get_metrics(ds: &Dataset) -> BTreeMap<Axis, Vec<String>> {
    METRICS
        .iter()
        .map(|(axis, names)| {
            let present = names
                .iter()
                .filter(|n| !n.is_empty() && ds.contains(n))
                .map(|n| n.to_string())
                .collect();
            (*axis, present)
        })
        .collect()
}

/// Derive missing vertical scale factors.
///
/// `wanted` holds base names (`e3u`, `e3fw`, ...) and defaults to the whole
/// graph. With `time_varying` unset the static variants (`e3u_0`) are
/// resolved. Names outside the graph fail with `UnsupportedDerivation`.
/// Returns the names added to `ds`.
pub fn compute_missing_metrics(
    ds: &mut Dataset,
    wanted: Option<&[&str]>,
    time_varying: bool,
) -> NemoResult<Vec<String>> {
    let suffix = if time_varying { "" } else { "_0" };
    let wanted = resolve_wanted(wanted, suffix)?;

    let missing: Vec<&ScaleFactorNode> = SCALE_FACTOR_GRAPH
        .iter()
        .filter(|n| wanted.contains(&n.name))
        .filter(|n| !ds.contains(&format!("{}{}", n.name, suffix)))
        .collect();
    if missing.is_empty() {
        return Ok(Vec::new());
    }

    let mut added = Vec::new();
    let root = format!("{}{}", ROOT_SCALE_FACTOR, suffix);
    if !ds.contains(&root) {
        broadcast_root_profile(ds, &root)?;
        added.push(root.clone());
    }

    let grid = StaggeredGrid::from_dataset(ds)?;
    warn!(
        count = missing.len(),
        "Deriving scale factors by interpolation, results are approximate"
    );

    for node in missing {
        let target = format!("{}{}", node.name, suffix);
        if ds.contains(&target) {
            continue;
        }
        let found = node.parents.iter().find_map(|d| {
            let parent = format!("{}{}", d.parent, suffix);
            ds.get(&parent).map(|v| (d, parent, v.clone()))
        });
        let Some((derivation, parent, parent_var)) = found else {
            warn!(target = %target, "No parent scale factor available, skipping");
            continue;
        };

        let mut var = grid.interp_along(&parent_var, derivation.axes, Boundary::Extend)?;
        let along: Vec<&str> = derivation.axes.iter().map(Axis::as_str).collect();
        var.set_attr(
            WARNING_ATTR,
            format!(
                "Warning: {} has been interpolated from {} along {}, it is an approximation",
                target,
                parent,
                along.join(" then ")
            ),
        );
        debug!(target = %target, parent = %parent, axes = ?along, "Derived scale factor");
        ds.insert(target.as_str(), var)?;
        added.push(target);
    }
    Ok(added)
}

fn resolve_wanted(wanted: Option<&[&str]>, suffix: &str) -> NemoResult<Vec<&'static str>> {
    let Some(wanted) = wanted else {
        return Ok(SCALE_FACTOR_GRAPH.iter().map(|n| n.name).collect());
    };
    wanted
        .iter()
        .map(|w| {
            let base = if suffix.is_empty() {
                w
            } else {
                w.strip_suffix(suffix).unwrap_or(w)
            };
            scale_factor_node(base).map(|n| n.name).ok_or_else(|| {
                NemoError::UnsupportedDerivation(format!(
                    "'{}' cannot be derived from other scale factors",
                    w
                ))
            })
        })
        .collect()
}

/// Broadcast `e3t_1d` over the horizontal to stand in for the root.
fn broadcast_root_profile(ds: &mut Dataset, root: &str) -> NemoResult<()> {
    let profile = ds
        .get(ROOT_PROFILE)
        .ok_or_else(|| NemoError::MissingRootMetric(root.to_string()))?;
    let levels = profile
        .values_1d()
        .ok_or_else(|| NemoError::MissingRootMetric(root.to_string()))?;
    let z = profile.dims()[0].clone();

    let mut dims = vec![z];
    let mut shape = vec![levels.len()];
    for axis in [Axis::Y, Axis::X] {
        let label = axis.label(AxisPosition::Center).name();
        if let Some(n) = ds.dim_len(label) {
            dims.push(label.to_string());
            shape.push(n);
        }
    }
    let data = ArrayD::from_shape_fn(IxDyn(&shape), |idx| levels[idx[0]]);

    warn!(
        root = %root,
        profile = ROOT_PROFILE,
        "Root scale factor missing, broadcasting the 1-D profile; invalid with terrain-following levels"
    );
    let mut var = Variable::new(dims, data)?;
    *var.attrs_mut() = profile.attrs().clone();
    var.set_attr(
        WARNING_ATTR,
        format!(
            "Warning: {} has been broadcast from {}, it is not valid for terrain-following coordinates",
            root, ROOT_PROFILE
        ),
    );
    ds.insert(root, var)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domcfg::axis_coordinate;
    use nemo_common::AxisLabel;

    fn grid_dataset(nz: usize, ny: usize, nx: usize) -> Dataset {
        let mut ds = Dataset::new();
        for (label, n) in [
            (AxisLabel::XC, nx),
            (AxisLabel::XF, nx),
            (AxisLabel::YC, ny),
            (AxisLabel::YF, ny),
            (AxisLabel::ZC, nz),
            (AxisLabel::ZF, nz),
        ] {
            let values = (0..n)
                .map(|i| i as f64 + label.shift().unwrap_or(0.0))
                .collect();
            ds.insert_coord(label.name(), axis_coordinate(label, values))
                .unwrap();
        }
        ds
    }

    fn e3t(nz: usize, ny: usize, nx: usize) -> Variable {
        let values = (0..nz * ny * nx).map(|i| (i % nx) as f64 * 2.0 + 10.0).collect();
        Variable::from_shape_vec(vec!["z_c", "y_c", "x_c"], &[nz, ny, nx], values).unwrap()
    }

    #[test]
    fn test_graph_order_and_parents() {
        let names: Vec<_> = SCALE_FACTOR_GRAPH.iter().map(|n| n.name).collect();
        assert_eq!(
            names,
            vec!["e3t", "e3u", "e3v", "e3w", "e3f", "e3uw", "e3vw", "e3fw"]
        );
        assert!(SCALE_FACTOR_GRAPH[0].is_root());
        // every parent is declared before its child
        for (i, node) in SCALE_FACTOR_GRAPH.iter().enumerate() {
            for d in node.parents {
                let p = SCALE_FACTOR_GRAPH.iter().position(|n| n.name == d.parent).unwrap();
                assert!(p < i, "{} before {}", d.parent, node.name);
            }
        }
    }

    #[test]
    fn test_get_metrics_filters() {
        let mut ds = Dataset::new();
        for name in ["e1t", "e1u", "e2t", "e3t", "e3w"] {
            ds.insert(name, Variable::scalar(1.0)).unwrap();
        }
        let metrics = get_metrics(&ds);
        assert_eq!(metrics[&Axis::X], vec!["e1t", "e1u"]);
        assert_eq!(metrics[&Axis::Y], vec!["e2t"]);
        assert_eq!(metrics[&Axis::Z], vec!["e3t", "e3w"]);
    }

    #[test]
    fn test_unsupported_derivation() {
        let mut ds = grid_dataset(2, 2, 2);
        ds.insert("e3t_0", e3t(2, 2, 2)).unwrap();
        let err = compute_missing_metrics(&mut ds, Some(&["e1u"]), false).unwrap_err();
        assert!(matches!(err, NemoError::UnsupportedDerivation(_)));
    }

    #[test]
    fn test_missing_root() {
        let mut ds = grid_dataset(2, 2, 2);
        let err = compute_missing_metrics(&mut ds, Some(&["e3u"]), false).unwrap_err();
        assert!(matches!(err, NemoError::MissingRootMetric(ref r) if r == "e3t_0"));
    }

    #[test]
    fn test_nothing_missing_is_noop() {
        let mut ds = grid_dataset(2, 2, 2);
        ds.insert("e3u", e3t(2, 2, 2).with_dims(vec!["z_c", "y_c", "x_f"]).unwrap())
            .unwrap();
        let added = compute_missing_metrics(&mut ds, Some(&["e3u"]), true).unwrap();
        assert!(added.is_empty());
    }

    #[test]
    fn test_e3u_from_e3t() {
        let mut ds = grid_dataset(1, 1, 3);
        ds.insert("e3t_0", e3t(1, 1, 3)).unwrap();
        let added = compute_missing_metrics(&mut ds, Some(&["e3u_0"]), false).unwrap();
        assert_eq!(added, vec!["e3u_0"]);
        let e3u = ds.get("e3u_0").unwrap();
        assert_eq!(e3u.dims(), &["z_c", "y_c", "x_f"]);
        let values: Vec<f64> = e3u.data().iter().copied().collect();
        // 10, 12, 14 -> midpoints with the last value extended
        assert_eq!(values, vec![11.0, 13.0, 14.0]);
        assert!(e3u.attrs().contains_key(WARNING_ATTR));
    }

    #[test]
    fn test_root_broadcast_from_profile() {
        let mut ds = grid_dataset(2, 2, 3);
        ds.insert(
            ROOT_PROFILE,
            Variable::coordinate("z_c", vec![10.0, 20.0]),
        )
        .unwrap();
        let added = compute_missing_metrics(&mut ds, Some(&["e3t"]), false).unwrap();
        assert_eq!(added, vec!["e3t_0"]);
        let root = ds.get("e3t_0").unwrap();
        assert_eq!(root.dims(), &["z_c", "y_c", "x_c"]);
        assert_eq!(root.shape(), &[2, 2, 3]);
        let values: Vec<f64> = root.data().iter().copied().collect();
        assert_eq!(&values[..6], &[10.0; 6]);
        assert_eq!(&values[6..], &[20.0; 6]);
        assert!(root.attr_str(WARNING_ATTR).unwrap().contains("e3t_1d"));
    }
}
