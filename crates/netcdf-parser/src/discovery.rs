//! Locating input files.
//!
//! Files are given either as an explicit list, as names relative to a data
//! directory, or as every file of a data directory matching a set of glob
//! patterns.

use std::path::{Path, PathBuf};

use glob::Pattern;
use nemo_common::{NemoError, NemoResult};
use tracing::debug;
use walkdir::WalkDir;

/// Domain configuration and mesh mask files.
pub const DOMCFG_PATTERNS: [&str; 2] = ["*domain_cfg*.nc", "*mesh_mask*.nc"];
/// Field output files, one per grid point.
pub const NEMO_PATTERNS: [&str; 1] = ["*grid_*.nc"];
/// Fortran namelists.
pub const NAMELIST_PATTERNS: [&str; 1] = ["namelist*"];

/// Replace a leading `~` with the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).as_ref()),
        None => path.to_path_buf(),
    }
}

/// Combine a data directory and/or a file list into the files to open.
///
/// - directory only: every file directly in it matching one of `patterns`,
///   pattern by pattern, each group sorted by name
/// - directory and files: each file joined onto the directory
/// - files only: the files as given
/// - neither: `NoFilesFound`
pub fn resolve_files(
    datadir: Option<&Path>,
    files: &[PathBuf],
    patterns: &[&str],
) -> NemoResult<Vec<PathBuf>> {
    let resolved = match datadir {
        None if files.is_empty() => {
            return Err(NemoError::NoFilesFound(
                "no files to open, provide a data directory or files".to_string(),
            ))
        }
        None => files.to_vec(),
        Some(dir) => {
            let dir = expand_home(dir);
            if files.is_empty() {
                glob_dir(&dir, patterns)?
            } else {
                files.iter().map(|f| dir.join(f)).collect()
            }
        }
    };
    debug!(count = resolved.len(), "Resolved input files");
    Ok(resolved)
}

fn glob_dir(dir: &Path, patterns: &[&str]) -> NemoResult<Vec<PathBuf>> {
    let compiled = patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| NemoError::Config(format!("bad pattern '{}': {}", p, e)))
        })
        .collect::<NemoResult<Vec<_>>>()?;

    let mut entries: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| NemoError::read(dir.display().to_string(), e.to_string()))?;
        if entry.file_type().is_file() {
            entries.push(entry.into_path());
        }
    }

    let mut out = Vec::new();
    for pattern in &compiled {
        for path in &entries {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if pattern.matches(name) && !out.contains(path) {
                out.push(path.clone());
            }
        }
    }
    Ok(out)
}
