//! Native netCDF reading using the netcdf library.
//!
//! Every numeric variable is read as `f64`. Packed values are unpacked with
//! `scale_factor` / `add_offset` and `_FillValue` / `missing_value` become
//! NaN, so the packing attributes are not carried into the dataset.

use std::path::Path;
use std::sync::Once;

use nemo_common::{Attributes, Dataset, NemoError, NemoResult, RawDataset, Variable};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::reader::DatasetReader;

const PACKING_ATTRS: [&str; 4] = ["scale_factor", "add_offset", "_FillValue", "missing_value"];

/// Silence HDF5's automatic error printing to stderr.
///
/// HDF5 prints a diagnostic stack whenever an attribute lookup misses, even
/// though the miss is handled. Safe to call repeatedly.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: null handlers are a documented way to disable the automatic
        // error stack printing.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// [`DatasetReader`] over netCDF-3/4 files on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetCdfReader;

impl NetCdfReader {
    pub fn new() -> Self {
        silence_hdf5_errors();
        Self
    }
}

impl DatasetReader for NetCdfReader {
    fn read(&self, path: &Path) -> NemoResult<RawDataset> {
        let source = path.display().to_string();
        let file = netcdf::open(path).map_err(|e| NemoError::read(&source, e.to_string()))?;

        let mut ds = Dataset::new();
        for attr in file.attributes() {
            match attr.value() {
                Ok(value) => {
                    ds.attrs_mut().insert(attr.name().to_string(), to_json(value));
                }
                Err(e) => warn!(file = %source, attribute = %attr.name(), error = %e, "Skipping unreadable attribute"),
            }
        }

        for var in file.variables() {
            let name = var.name();
            let Some(variable) = read_variable(&var, &source)? else {
                continue;
            };
            ds.insert(name.clone(), variable)?;
            // a variable named after its own single dimension is a coordinate
            let is_dim_coord = var.dimensions().len() == 1 && var.dimensions()[0].name() == name;
            if is_dim_coord {
                ds.set_coord(&name);
            }
        }

        debug!(file = %source, variables = ds.len(), "Read netCDF file");
        Ok(RawDataset::with_source(ds, path))
    }
}

fn read_variable(var: &netcdf::Variable, source: &str) -> NemoResult<Option<Variable>> {
    let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();

    let raw: Vec<f64> = match var.get_values::<f64, _>(..) {
        Ok(values) => values,
        Err(e) => {
            // char and string variables have no numeric form
            debug!(file = %source, variable = %var.name(), error = %e, "Skipping non-numeric variable");
            return Ok(None);
        }
    };

    let scale = get_f64_attr(var, "scale_factor").unwrap_or(1.0);
    let offset = get_f64_attr(var, "add_offset").unwrap_or(0.0);
    let fill = get_f64_attr(var, "_FillValue");
    let missing = get_f64_attr(var, "missing_value");
    let values: Vec<f64> = raw
        .into_iter()
        .map(|v| {
            if Some(v) == fill || Some(v) == missing {
                f64::NAN
            } else {
                v * scale + offset
            }
        })
        .collect();

    let mut variable = Variable::from_shape_vec(dims, &shape, values)?;
    *variable.attrs_mut() = read_attributes(var, source);
    Ok(Some(variable))
}

fn read_attributes(var: &netcdf::Variable, source: &str) -> Attributes {
    let mut attrs = Attributes::new();
    for attr in var.attributes() {
        let name = attr.name().to_string();
        if PACKING_ATTRS.contains(&name.as_str()) {
            continue;
        }
        match attr.value() {
            Ok(value) => {
                attrs.insert(name, to_json(value));
            }
            Err(e) => warn!(file = %source, variable = %var.name(), attribute = %name, error = %e, "Skipping unreadable attribute"),
        }
    }
    attrs
}

fn to_json(value: netcdf::AttributeValue) -> Value {
    use netcdf::AttributeValue as A;
    match value {
        A::Uchar(v) => json!(v),
        A::Uchars(v) => json!(v),
        A::Schar(v) => json!(v),
        A::Schars(v) => json!(v),
        A::Ushort(v) => json!(v),
        A::Ushorts(v) => json!(v),
        A::Short(v) => json!(v),
        A::Shorts(v) => json!(v),
        A::Uint(v) => json!(v),
        A::Uints(v) => json!(v),
        A::Int(v) => json!(v),
        A::Ints(v) => json!(v),
        A::Ulonglong(v) => json!(v),
        A::Ulonglongs(v) => json!(v),
        A::Longlong(v) => json!(v),
        A::Longlongs(v) => json!(v),
        A::Float(v) => json!(v),
        A::Floats(v) => json!(v),
        A::Double(v) => json!(v),
        A::Doubles(v) => json!(v),
        A::Str(v) => json!(v),
        A::Strs(v) => json!(v),
        #[allow(unreachable_patterns)]
        _ => Value::Null,
    }
}

/// Check for an attribute before fetching it, which avoids HDF5 error output.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_is_idempotent() {
        silence_hdf5_errors();
        silence_hdf5_errors();
    }

    #[test]
    fn test_attribute_conversion() {
        assert_eq!(to_json(netcdf::AttributeValue::Ints(vec![1, 4])), json!([1, 4]));
        assert_eq!(
            to_json(netcdf::AttributeValue::Str("ocean T grid variables".into())),
            json!("ocean T grid variables")
        );
    }

    #[test]
    fn test_missing_file() {
        let err = NetCdfReader::new()
            .read(Path::new("/nonexistent/domain_cfg.nc"))
            .unwrap_err();
        assert!(matches!(err, NemoError::Read { .. }));
    }
}
