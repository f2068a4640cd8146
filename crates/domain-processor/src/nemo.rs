//! Field output files placed on their grid point.
//!
//! Each `*grid_<TYPE>.nc` file holds the fields of one grid point under
//! generic dimension names. Preprocessing moves them onto the point's axis
//! labels and borrows the coordinates of the domain configuration, so that
//! files of different points line up when combined.

use nemo_common::{Axis, Dataset, GridPointType, NemoError, NemoResult, Point, RawDataset};
use netcdf_parser::infer_point_type;
use tracing::debug;

/// Attribute recording the grid point of every field.
pub const POINT_TYPE_ATTR: &str = "arakawa_point_type";

const RAW_TIME: &str = "time_counter";
const RAW_TIME_BOUNDS: &str = "time_counter_bounds";
const TIME: &str = "t";
const TIME_BOUNDS: &str = "t_bounds";

const DATASET_NAME: &str = "NEMO dataset";
const DATASET_DESCRIPTION: &str = "Ocean grid variables, set on the proper positions";
const DATASET_TITLE: &str = "Ocean grid variables";

/// Relabel one field file onto its grid point.
///
/// The point type comes from `explicit` when given, otherwise from the
/// file name and `description` attribute.
pub fn preprocess_nemo(
    raw: RawDataset,
    domcfg: &Dataset,
    explicit: Option<GridPointType>,
) -> NemoResult<Dataset> {
    let description = raw
        .dataset()
        .attrs()
        .get("description")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    let file_name = raw.file_name().to_string();
    let point_type = infer_point_type(&file_name, description.as_deref(), explicit)?;
    let point = Point::new(point_type);
    let mut ds = raw.into_dataset();

    let fields: Vec<String> = ds.data_vars().map(|(n, _)| n.to_string()).collect();
    for name in &fields {
        if let Some(attrs) = ds.var_attrs_mut(name) {
            attrs.insert(POINT_TYPE_ATTR.to_string(), point_type.as_str().into());
        }
    }

    let depth = ds.dims().into_keys().find(|d| d.contains("depth"));
    let mut axes = vec![Axis::X, Axis::Y];
    ds.rename("x", point.x.name())?;
    ds.rename("y", point.y.name())?;
    if let Some(depth) = &depth {
        ds.rename(depth, point.z.name())?;
        axes.push(Axis::Z);
    }

    for axis in axes {
        let label = point.label(axis).name();
        let coord = domcfg
            .get(label)
            .ok_or_else(|| NemoError::missing_coordinate(label))?;
        ds.insert_coord(label, coord.clone())?;
    }

    ds.remove("nav_lat");
    ds.remove("nav_lon");

    ds.rename(RAW_TIME, TIME)?;
    ds.rename(RAW_TIME_BOUNDS, TIME_BOUNDS)?;
    if ds.contains(TIME_BOUNDS) {
        if let Some(attrs) = ds.var_attrs_mut(TIME) {
            attrs.insert("bounds".to_string(), TIME_BOUNDS.into());
        }
    }

    debug!(
        file = %file_name,
        point = %point_type,
        fields = fields.len(),
        surface = depth.is_none(),
        "Preprocessed field file"
    );
    Ok(ds)
}

/// Combine preprocessed files into one field dataset.
///
/// The first file holding a variable provides it; dataset attributes come
/// from the first file and are then stamped with the dataset identity.
pub fn combine_nemo(parts: Vec<Dataset>, file_prefix: &str) -> NemoResult<Dataset> {
    let mut parts = parts.into_iter();
    let mut ds = parts
        .next()
        .ok_or_else(|| NemoError::NoFilesFound("no field files to combine".to_string()))?;
    for part in parts {
        ds.union_with(&part, false)?;
    }

    let name = if file_prefix.is_empty() {
        DATASET_NAME.to_string()
    } else {
        format!("{} {}", DATASET_NAME, file_prefix)
    };
    let attrs = ds.attrs_mut();
    attrs.insert("name".to_string(), name.into());
    attrs.insert("description".to_string(), DATASET_DESCRIPTION.into());
    attrs.insert("title".to_string(), DATASET_TITLE.into());
    Ok(ds)
}
