//! Merging of field outputs with the domain configuration.

use nemo_common::{Dataset, NemoError, NemoResult, ALL_POINTS};
use tracing::{debug, warn};

/// Attribute carrying correctness caveats on a variable.
pub const WARNING_ATTR: &str = "WARNING";

/// Union a field dataset with its domain configuration.
///
/// A variable present in both datasets must hold the same values in each,
/// otherwise the merge fails with `MergeConflict`. The variable attributes
/// of `nemo` are kept, and its dataset attributes win. With `linear_free_surface` every static scale factor
/// `e3*_0` without a time-varying counterpart is copied in under the
/// time-varying name and flagged as unfit for thickness weighted data.
pub fn merge(nemo: &Dataset, domcfg: &Dataset, linear_free_surface: bool) -> NemoResult<Dataset> {
    for (name, var) in nemo.variables() {
        if let Some(other) = domcfg.get(name) {
            if !var.values_eq(other, 0.0) {
                return Err(NemoError::MergeConflict(name.to_string()));
            }
        }
    }

    let mut ds = nemo.clone();
    ds.union_with(domcfg, false)?;

    let mut attrs = domcfg.attrs().clone();
    attrs.extend(nemo.attrs().iter().map(|(k, v)| (k.clone(), v.clone())));
    *ds.attrs_mut() = attrs;

    if linear_free_surface {
        for point in ALL_POINTS {
            let suffix = point.suffix();
            let varying = format!("e3{}", suffix);
            let fixed = format!("e3{}_0", suffix);
            if ds.contains(&varying) {
                continue;
            }
            let Some(var) = domcfg.get(&fixed) else {
                continue;
            };
            let copied = var.clone().with_attr(
                WARNING_ATTR,
                format!(
                    "Warning: this scale factor has been copied from {}, it is not valid for thickness weighted data",
                    fixed
                ),
            );
            ds.insert(varying.as_str(), copied)?;
            warn!(scale_factor = %varying, from = %fixed, "Copied static scale factor");
        }
    }

    debug!(variables = ds.len(), "Merged field and domain datasets");
    Ok(ds)
}
