//! Integration tests: opening field output files onto their grid points.

use std::path::PathBuf;
use std::sync::Arc;

use domain_processor::{
    assemble_domain_cfg, stitch_tiles, ExecutionMode, NemoError, NemoOptions, NemoProcessor,
    ProcessorConfig, POINT_TYPE_ATTR,
};
use nemo_common::{Dataset, GridPointType, RawDataset};
use netcdf_parser::MemoryReader;
use serde_json::json;
use test_utils::{create_domcfg, create_field_file, domain, init_test_tracing};

fn domcfg(size: &domain::DomainSize) -> Dataset {
    let raw = vec![RawDataset::new(create_domcfg(size))];
    assemble_domain_cfg(stitch_tiles(&raw).unwrap(), true).unwrap()
}

fn field_reader(
    points: &[GridPointType],
    size: &domain::DomainSize,
) -> (MemoryReader, Vec<PathBuf>) {
    let mut reader = MemoryReader::new();
    for point in points {
        let path = format!("/run/BASIN_5d_grid_{}.nc", point);
        reader.insert(path, create_field_file(*point, size, 3));
    }
    let files = reader.paths();
    (reader, files)
}

fn processor(reader: MemoryReader, execution: ExecutionMode) -> NemoProcessor {
    let config = ProcessorConfig {
        execution,
        worker_threads: 2,
        ..Default::default()
    };
    NemoProcessor::new(config, Arc::new(reader)).unwrap()
}

#[test]
fn test_fields_land_on_their_points() {
    init_test_tracing();
    let cfg = domcfg(&domain::BASIN);
    let points = [
        GridPointType::T,
        GridPointType::U,
        GridPointType::V,
        GridPointType::W,
    ];
    let (reader, files) = field_reader(&points, &domain::BASIN);
    let ds = processor(reader, ExecutionMode::Sequential)
        .open_nemo(
            &NemoOptions {
                files,
                ..Default::default()
            },
            Some(&cfg),
        )
        .unwrap();

    let cases = [
        ("thetao", vec!["t", "z_c", "y_c", "x_c"], "T"),
        ("uo", vec!["t", "z_c", "y_c", "x_f"], "U"),
        ("vo", vec!["t", "z_c", "y_f", "x_c"], "V"),
        ("woce", vec!["t", "z_f", "y_c", "x_c"], "W"),
    ];
    for (name, dims, point) in cases {
        let var = ds.get(name).unwrap();
        assert_eq!(var.dims(), dims.as_slice(), "{}", name);
        assert_eq!(var.attr_str(POINT_TYPE_ATTR), Some(point));
    }

    // coordinates are the domain configuration's
    for label in ["x_c", "x_f", "y_c", "y_f", "z_c", "z_f"] {
        assert!(ds.get(label).unwrap().approx_eq(cfg.get(label).unwrap(), 0.0));
    }
    assert!(!ds.contains("nav_lon"));
    assert!(!ds.contains("nav_lat"));
    assert!(!ds.contains("time_counter"));
    assert_eq!(ds.dim_len("t"), Some(3));
    assert_eq!(ds.get("t").unwrap().attr_str("bounds"), Some("t_bounds"));
    assert_eq!(ds.attrs()["name"], json!("NEMO dataset"));
    assert_eq!(
        ds.attrs()["description"],
        json!("Ocean grid variables, set on the proper positions")
    );
}

#[test]
fn test_parallel_matches_sequential() {
    let cfg = domcfg(&domain::SMALL);
    let points = [
        GridPointType::T,
        GridPointType::U,
        GridPointType::UW,
        GridPointType::FW,
    ];
    let options = |files| NemoOptions {
        files,
        ..Default::default()
    };

    let (reader, files) = field_reader(&points, &domain::SMALL);
    let sequential = processor(reader, ExecutionMode::Sequential)
        .open_nemo(&options(files), Some(&cfg))
        .unwrap();
    let (reader, files) = field_reader(&points, &domain::SMALL);
    let parallel = processor(reader, ExecutionMode::Parallel)
        .open_nemo(&options(files), Some(&cfg))
        .unwrap();

    assert!(parallel.approx_eq(&sequential, 0.0));
    assert_eq!(
        parallel.get("avm_f").unwrap().dims(),
        &["t", "z_f", "y_f", "x_f"]
    );
}

#[test]
fn test_surface_files() {
    let cfg = domcfg(&domain::SURFACE);
    let (reader, files) = field_reader(&[GridPointType::T, GridPointType::V], &domain::SURFACE);
    let ds = processor(reader, ExecutionMode::Sequential)
        .open_nemo(
            &NemoOptions {
                files,
                ..Default::default()
            },
            Some(&cfg),
        )
        .unwrap();
    assert_eq!(ds.get("thetao").unwrap().dims(), &["t", "y_c", "x_c"]);
    assert_eq!(ds.get("vo").unwrap().dims(), &["t", "y_f", "x_c"]);
    assert!(!ds.has_dim("z_c"));
}

#[test]
fn test_conflicting_point_type() {
    let cfg = domcfg(&domain::SMALL);
    let mut file = create_field_file(GridPointType::U, &domain::SMALL, 1);
    file.attrs_mut()
        .insert("description".into(), json!("ocean V grid variables"));
    let reader = MemoryReader::new().with_file("/run/BASIN_grid_U.nc", file);
    let files = reader.paths();

    let err = processor(reader, ExecutionMode::Sequential)
        .open_nemo(
            &NemoOptions {
                files,
                ..Default::default()
            },
            Some(&cfg),
        )
        .unwrap_err();
    match &err {
        NemoError::ConflictingPointType {
            from_filename,
            from_description,
        } => {
            assert_eq!(from_filename, "U");
            assert_eq!(from_description, "V");
        }
        other => panic!("expected ConflictingPointType, got {:?}", other),
    }
    let message = err.to_string();
    assert!(message.contains('U') && message.contains('V'));
}

#[test]
fn test_undetermined_point_type() {
    let cfg = domcfg(&domain::SMALL);
    let mut file = create_field_file(GridPointType::T, &domain::SMALL, 1);
    file.attrs_mut().remove("description");
    let reader = MemoryReader::new().with_file("/run/BASIN_5d_output.nc", file);
    let files = reader.paths();

    let proc = processor(reader, ExecutionMode::Sequential);
    let err = proc
        .open_nemo(
            &NemoOptions {
                files: files.clone(),
                ..Default::default()
            },
            Some(&cfg),
        )
        .unwrap_err();
    assert!(matches!(err, NemoError::UndeterminedPointType(_)));

    // an explicit point type settles it
    let ds = proc
        .open_nemo(
            &NemoOptions {
                files,
                point_type: Some(GridPointType::T),
                ..Default::default()
            },
            Some(&cfg),
        )
        .unwrap();
    assert!(ds.contains("thetao"));
}

#[test]
fn test_file_prefix_filter() {
    let cfg = domcfg(&domain::SMALL);
    let mut reader = MemoryReader::new();
    reader.insert(
        "/run/BASIN_5d_grid_T.nc",
        create_field_file(GridPointType::T, &domain::SMALL, 1),
    );
    reader.insert(
        "/run/BASIN_1m_grid_U.nc",
        create_field_file(GridPointType::U, &domain::SMALL, 1),
    );
    let files = reader.paths();
    let proc = processor(reader, ExecutionMode::Sequential);

    let ds = proc
        .open_nemo(
            &NemoOptions {
                files: files.clone(),
                file_prefix: "5d".to_string(),
                ..Default::default()
            },
            Some(&cfg),
        )
        .unwrap();
    assert!(ds.contains("thetao"));
    assert!(!ds.contains("uo"));
    assert_eq!(ds.attrs()["name"], json!("NEMO dataset 5d"));

    let err = proc
        .open_nemo(
            &NemoOptions {
                files,
                file_prefix: "1y".to_string(),
                ..Default::default()
            },
            Some(&cfg),
        )
        .unwrap_err();
    assert!(matches!(err, NemoError::NoFilesFound(_)));
}

#[test]
fn test_grid_mismatch_is_reported() {
    let cfg = domcfg(&domain::SMALL);
    let (reader, files) = field_reader(&[GridPointType::T], &domain::BASIN);
    let err = processor(reader, ExecutionMode::Sequential)
        .open_nemo(
            &NemoOptions {
                files,
                ..Default::default()
            },
            Some(&cfg),
        )
        .unwrap_err();
    assert!(matches!(err, NemoError::ShapeMismatch { .. }));
}
