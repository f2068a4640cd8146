//! Entry points tying discovery, reading, assembly and persistence together.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use nemo_common::{Dataset, GridPointType, NemoError, NemoResult, RawDataset};
use netcdf_parser::{resolve_files, DatasetReader, DOMCFG_PATTERNS, NEMO_PATTERNS};
use tracing::{info, warn};

use crate::config::ProcessorConfig;
use crate::domcfg::assemble_domain_cfg;
use crate::merge::merge;
use crate::nemo::{combine_nemo, preprocess_nemo};
use crate::scheduler::{scheduler_from_config, ReadGate, Scheduler};
use crate::stitch::stitch_tiles_with_report;
use crate::store::{load_dataset, save_dataset};

/// Default store name of a saved domain configuration.
pub const DOMCFG_SAVING_NAME: &str = "xnemogcm.domcfg.zarr";

/// Fields whose absence means no mesh mask file was given.
const MASK_FIELDS: [&str; 4] = ["tmask", "umask", "vmask", "fmask"];

/// Options for opening a domain configuration.
#[derive(Debug, Clone, Default)]
pub struct DomainCfgOptions {
    /// Directory holding `*domain_cfg*.nc` / `*mesh_mask*.nc` files.
    pub datadir: Option<PathBuf>,
    /// Files to open, relative to `datadir` when both are given.
    pub files: Vec<PathBuf>,
    /// Reload a previously saved store instead of assembling again.
    pub load_from_saved: bool,
    /// Save the assembled dataset.
    pub save: bool,
    /// Store name, defaults to [`DOMCFG_SAVING_NAME`] when unset or empty.
    pub saving_name: Option<String>,
}

/// Options for opening field output files.
#[derive(Debug, Clone, Default)]
pub struct NemoOptions {
    /// Directory holding `*grid_*.nc` files.
    pub datadir: Option<PathBuf>,
    /// Files to open, relative to `datadir` when both are given.
    pub files: Vec<PathBuf>,
    /// Only open files whose name contains this prefix.
    pub file_prefix: String,
    /// Force the grid point of every file instead of inferring it.
    pub point_type: Option<GridPointType>,
    pub load_from_saved: bool,
    pub save: bool,
    /// Store name, defaults to `xnemogcm.nemo[.<prefix>].zarr` when unset or empty.
    pub saving_name: Option<String>,
}

impl NemoOptions {
    fn default_saving_name(&self) -> String {
        if self.file_prefix.is_empty() {
            "xnemogcm.nemo.zarr".to_string()
        } else {
            format!("xnemogcm.nemo.{}.zarr", self.file_prefix)
        }
    }
}

/// Opens NEMO domain configurations and field outputs.
///
/// Files are read through a [`DatasetReader`] and preprocessed by the
/// [`Scheduler`] chosen in the configuration.
pub struct NemoProcessor {
    config: ProcessorConfig,
    reader: Arc<dyn DatasetReader>,
    scheduler: Box<dyn Scheduler>,
}

impl NemoProcessor {
    /// Create a processor, validating the configuration.
    pub fn new(config: ProcessorConfig, reader: Arc<dyn DatasetReader>) -> NemoResult<Self> {
        config.validate()?;
        let scheduler = scheduler_from_config(&config)?;
        Ok(Self {
            config,
            reader,
            scheduler,
        })
    }

    /// Processor reading netCDF files from disk.
    #[cfg(feature = "native")]
    pub fn native(config: ProcessorConfig) -> NemoResult<Self> {
        Self::new(config, Arc::new(netcdf_parser::NetCdfReader::new()))
    }

    /// Replace the scheduler chosen from the configuration.
    pub fn with_scheduler(mut self, scheduler: Box<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &dyn Scheduler {
        self.scheduler.as_ref()
    }

    /// Open, stitch and assemble the domain configuration.
    pub fn open_domain_cfg(&self, options: &DomainCfgOptions) -> NemoResult<Dataset> {
        let saved = options.datadir.as_deref().map(|dir| {
            dir.join(
                options
                    .saving_name
                    .as_deref()
                    .filter(|n| !n.is_empty())
                    .unwrap_or(DOMCFG_SAVING_NAME),
            )
        });
        if let Some(path) = saved.as_deref().filter(|p| options.load_from_saved && p.exists()) {
            info!(path = %path.display(), "Loading saved domain configuration");
            return load_dataset(path);
        }

        let files = resolve_files(options.datadir.as_deref(), &options.files, &DOMCFG_PATTERNS)?;
        if files.is_empty() {
            return Err(NemoError::NoFilesFound(
                "no 'domain_cfg' or 'mesh_mask' files are provided".to_string(),
            ));
        }

        let reader = self.reader.as_ref();
        let job = |path: &Path, gate: &ReadGate| -> NemoResult<Dataset> {
            gate.read(|| reader.read(path)).map(RawDataset::into_dataset)
        };
        let tiles: Vec<RawDataset> = self
            .scheduler
            .map(&files, &job)?
            .into_iter()
            .zip(&files)
            .map(|(ds, path)| RawDataset::with_source(ds, path))
            .collect();

        let (stitched, report) = stitch_tiles_with_report(&tiles)?;
        if !MASK_FIELDS.iter().any(|m| stitched.contains(m)) {
            warn!("No mask fields found, was a mesh_mask file left out?");
        }
        let domcfg = assemble_domain_cfg(stitched, self.config.add_coordinates)?;
        info!(
            files = files.len(),
            conflicts = report.total_conflicts(),
            variables = domcfg.len(),
            scheduler = self.scheduler.name(),
            "Assembled domain configuration"
        );

        if options.save {
            let path = match saved {
                Some(path) => path,
                None => base_dir(&files).join(
                    options
                        .saving_name
                        .as_deref()
                        .filter(|n| !n.is_empty())
                        .unwrap_or(DOMCFG_SAVING_NAME),
                ),
            };
            save_dataset(&domcfg, &path, &self.config)?;
        }
        Ok(domcfg)
    }

    /// Open field output files onto their grid points.
    ///
    /// Without `domcfg` the domain configuration is opened from the same
    /// directory with the same load/save policy.
    pub fn open_nemo(&self, options: &NemoOptions, domcfg: Option<&Dataset>) -> NemoResult<Dataset> {
        let opened;
        let domcfg = match domcfg {
            Some(ds) => ds,
            None => {
                opened = self.open_domain_cfg(&DomainCfgOptions {
                    datadir: options.datadir.clone(),
                    load_from_saved: options.load_from_saved,
                    save: options.save,
                    ..Default::default()
                })?;
                &opened
            }
        };

        let saving_name = options
            .saving_name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| options.default_saving_name());
        let saved = options.datadir.as_deref().map(|dir| dir.join(&saving_name));
        if let Some(path) = saved.as_deref().filter(|p| options.load_from_saved && p.exists()) {
            info!(path = %path.display(), "Loading saved field dataset");
            return load_dataset(path);
        }

        let files: Vec<PathBuf> =
            resolve_files(options.datadir.as_deref(), &options.files, &NEMO_PATTERNS)?
                .into_iter()
                .filter(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .map(|n| n.contains(options.file_prefix.as_str()))
                        .unwrap_or(false)
                })
                .collect();
        if files.is_empty() {
            return Err(NemoError::NoFilesFound(format!(
                "no 'grid_' files with prefix '{}'",
                options.file_prefix
            )));
        }

        let reader = self.reader.as_ref();
        let point_type = options.point_type;
        let job = |path: &Path, gate: &ReadGate| -> NemoResult<Dataset> {
            let raw = gate.read(|| reader.read(path))?;
            preprocess_nemo(raw, domcfg, point_type)
        };
        let parts = self.scheduler.map(&files, &job)?;
        let nemo = combine_nemo(parts, &options.file_prefix)?;
        info!(
            files = files.len(),
            variables = nemo.len(),
            scheduler = self.scheduler.name(),
            "Opened field files"
        );

        if options.save {
            let path = saved.unwrap_or_else(|| base_dir(&files).join(&saving_name));
            save_dataset(&nemo, &path, &self.config)?;
        }
        Ok(nemo)
    }

    /// Open both datasets and merge them.
    ///
    /// `datadir`, when given, fills in the directory of either options.
    pub fn open_nemo_and_domain_cfg(
        &self,
        nemo: &NemoOptions,
        domcfg: &DomainCfgOptions,
        datadir: Option<&Path>,
    ) -> NemoResult<Dataset> {
        let mut nemo = nemo.clone();
        let mut domcfg_options = domcfg.clone();
        if let Some(dir) = datadir {
            nemo.datadir = Some(dir.to_path_buf());
            domcfg_options.datadir = Some(dir.to_path_buf());
        }
        let domcfg = self.open_domain_cfg(&domcfg_options)?;
        let nemo = self.open_nemo(&nemo, Some(&domcfg))?;
        merge(&nemo, &domcfg, self.config.linear_free_surface)
    }
}

impl std::fmt::Debug for NemoProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NemoProcessor")
            .field("config", &self.config)
            .field("scheduler", &self.scheduler.name())
            .finish()
    }
}

/// Directory of the first input file.
fn base_dir(files: &[PathBuf]) -> PathBuf {
    files
        .first()
        .and_then(|f| f.parent())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
