//! Where tests find real NEMO output and write scratch stores.
//!
//! Real domain configurations and field files are too large to check in.
//! Tests that need one look it up with [`find_test_file`] and skip when it
//! is absent.

use std::path::PathBuf;

/// Workspace root, two levels above this crate's manifest.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .nth(2)
        .map(PathBuf::from)
        .unwrap_or(manifest_dir)
}

/// `crates/<crate_name>/testdata/`.
pub fn crate_testdata_dir(crate_name: &str) -> PathBuf {
    workspace_root()
        .join("crates")
        .join(crate_name)
        .join("testdata")
}

/// Look for a real input file.
///
/// Candidates, first hit wins:
/// 1. `$TEST_DATA_DIR/<name>`
/// 2. `crates/netcdf-parser/testdata/<name>`
/// 3. `crates/domain-processor/testdata/<name>`
/// 4. `testdata/<name>` at the workspace root
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    let from_env = std::env::var_os("TEST_DATA_DIR").map(|dir| PathBuf::from(dir).join(name));
    let root = workspace_root();
    from_env
        .into_iter()
        .chain([
            crate_testdata_dir("netcdf-parser").join(name),
            crate_testdata_dir("domain-processor").join(name),
            root.join("testdata").join(name),
        ])
        .find(|path| path.exists())
}

/// Scratch directory removed when the returned guard drops.
pub fn temp_test_dir_with_prefix(prefix: &str) -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("Failed to create temporary test directory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_root_holds_manifest() {
        let root = workspace_root();
        assert!(root.join("Cargo.toml").exists(), "{:?}", root);
        assert!(root.join("crates").join("test-utils").is_dir());
    }

    #[test]
    fn test_crate_testdata_dir() {
        let dir = crate_testdata_dir("domain-processor");
        assert!(dir.ends_with("crates/domain-processor/testdata"));
    }

    #[test]
    fn test_missing_file_is_none() {
        assert_eq!(find_test_file("no_such_BASIN_output.nc"), None);
    }

    #[test]
    fn test_temp_test_dir_with_prefix() {
        let dir = temp_test_dir_with_prefix("nemo_zarr_");
        assert!(dir.path().exists());
        assert!(dir.path().to_string_lossy().contains("nemo_zarr_"));
    }
}
