//! One-dimensional stencils along a single axis.
//!
//! Each stencil combines a value with one neighbour, either the next one
//! (`i`, `i+1`) or the previous one (`i-1`, `i`). The neighbour that falls
//! outside the lane is provided by the [`Boundary`] policy.

/// What lies beyond the edge of the domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Boundary {
    /// Repeat the edge value.
    Extend,
    /// Pad with a constant.
    Fill(f64),
}

impl Boundary {
    fn pad(&self, edge: f64) -> f64 {
        match self {
            Boundary::Extend => edge,
            Boundary::Fill(value) => *value,
        }
    }
}

/// Which neighbour a stencil pairs each value with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neighbour {
    Next,
    Previous,
}

/// Midpoint interpolation.
pub fn interp_lane(values: &[f64], neighbour: Neighbour, boundary: Boundary) -> Vec<f64> {
    pairwise(values, neighbour, boundary, |a, b| 0.5 * (a + b))
}

/// Forward difference `later - earlier`.
pub fn diff_lane(values: &[f64], neighbour: Neighbour, boundary: Boundary) -> Vec<f64> {
    pairwise(values, neighbour, boundary, |earlier, later| later - earlier)
}

/// Cumulative sum landing on the other position.
///
/// With `Next` the sum includes the current value (face to the right of
/// the last summed cell); with `Previous` it starts from zero at the first
/// point.
pub fn cumsum_lane(values: &[f64], neighbour: Neighbour) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut total = 0.0;
    for v in values {
        match neighbour {
            Neighbour::Next => {
                total += v;
                out.push(total);
            }
            Neighbour::Previous => {
                out.push(total);
                total += v;
            }
        }
    }
    out
}

fn pairwise(
    values: &[f64],
    neighbour: Neighbour,
    boundary: Boundary,
    combine: impl Fn(f64, f64) -> f64,
) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| match neighbour {
            Neighbour::Next => {
                let next = if i + 1 < n {
                    values[i + 1]
                } else {
                    boundary.pad(values[n - 1])
                };
                combine(values[i], next)
            }
            Neighbour::Previous => {
                let prev = if i > 0 {
                    values[i - 1]
                } else {
                    boundary.pad(values[0])
                };
                combine(prev, values[i])
            }
        })
        .collect()
}
