//! Reading real NEMO files through libnetcdf.
//!
//! The files are not part of the repository; each test is skipped when its
//! file cannot be found (see `TEST_DATA_DIR`).

#![cfg(feature = "native")]

use nemo_common::GridPointType;
use netcdf_parser::{infer_point_type, DatasetReader, NetCdfReader};
use test_utils::{init_test_tracing, require_test_file};

#[test]
fn test_read_domain_cfg() {
    init_test_tracing();
    let path = require_test_file!("BASIN_domain_cfg.nc");
    let raw = NetCdfReader::new().read(&path).unwrap();
    let ds = raw.dataset();

    for name in ["glamt", "e1t", "e2t", "e3t_0"] {
        assert!(ds.contains(name), "{} missing", name);
    }
    assert!(ds.has_dim("x"));
    assert!(ds.has_dim("y"));
    assert_eq!(raw.file_name(), "BASIN_domain_cfg.nc");
}

#[test]
fn test_read_grid_t() {
    let path = require_test_file!("BASIN_grid_T.nc");
    let raw = NetCdfReader::new().read(&path).unwrap();
    let description = raw
        .dataset()
        .attrs()
        .get("description")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let point = infer_point_type(raw.file_name(), description.as_deref(), None).unwrap();
    assert_eq!(point, GridPointType::T);
    assert!(raw.dataset().has_dim("time_counter"));
}

#[test]
fn test_missing_file_is_read_error() {
    let err = NetCdfReader::new()
        .read(std::path::Path::new("/nonexistent/BASIN_grid_T.nc"))
        .unwrap_err();
    assert!(matches!(err, nemo_common::NemoError::Read { .. }));
}
