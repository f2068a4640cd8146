//! Scheduling of per-file work.
//!
//! A [`Scheduler`] runs the same job over a list of files and returns the
//! results in input order. Reads go through a [`ReadGate`], which either
//! lets them run freely or funnels them through one process-wide lock for
//! file backends that are not thread-safe.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use nemo_common::{Dataset, NemoError, NemoResult};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::config::{ExecutionMode, ProcessorConfig};

/// Held while reading a file when reads are serialized.
static FILE_READ_LOCK: Mutex<()> = Mutex::new(());

/// Per-file job: read and preprocess one file.
pub type FileJob<'a> = dyn Fn(&Path, &ReadGate) -> NemoResult<Dataset> + Sync + 'a;

/// Access policy for file reads inside a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadGate {
    /// Reads run concurrently.
    Open,
    /// Reads take the process-wide file lock.
    Serialized,
}

impl ReadGate {
    /// Run `read` under this gate's policy.
    pub fn read<T>(&self, read: impl FnOnce() -> T) -> T {
        match self {
            ReadGate::Open => read(),
            ReadGate::Serialized => {
                let _guard = FILE_READ_LOCK
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                read()
            }
        }
    }
}

/// Runs a file job over many files.
pub trait Scheduler: Send + Sync {
    fn name(&self) -> &'static str;

    /// Apply `job` to every path, returning results in input order.
    ///
    /// Fails with the error of a failing job; no partial result is kept.
    fn map(&self, paths: &[PathBuf], job: &FileJob<'_>) -> NemoResult<Vec<Dataset>>;
}

/// Runs jobs one after the other on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl Scheduler for Sequential {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn map(&self, paths: &[PathBuf], job: &FileJob<'_>) -> NemoResult<Vec<Dataset>> {
        paths.iter().map(|p| job(p.as_path(), &ReadGate::Open)).collect()
    }
}

/// Runs jobs on a rayon thread pool.
pub struct WorkerPool {
    pool: ThreadPool,
    serialize_file_reads: bool,
}

impl WorkerPool {
    /// Create a pool with `threads` workers (0 = one per core).
    pub fn new(threads: usize, serialize_file_reads: bool) -> NemoResult<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("nemo-worker-{}", i))
            .build()
            .map_err(|e| NemoError::Config(format!("failed to build worker pool: {}", e)))?;
        Ok(Self {
            pool,
            serialize_file_reads,
        })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn serializes_file_reads(&self) -> bool {
        self.serialize_file_reads
    }

    fn gate(&self) -> ReadGate {
        if self.serialize_file_reads {
            ReadGate::Serialized
        } else {
            ReadGate::Open
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads())
            .field("serialize_file_reads", &self.serialize_file_reads)
            .finish()
    }
}

impl Scheduler for WorkerPool {
    fn name(&self) -> &'static str {
        "worker-pool"
    }

    fn map(&self, paths: &[PathBuf], job: &FileJob<'_>) -> NemoResult<Vec<Dataset>> {
        let gate = self.gate();
        debug!(
            files = paths.len(),
            threads = self.threads(),
            serialized_reads = self.serialize_file_reads,
            "Scheduling file jobs on worker pool"
        );
        self.pool
            .install(|| paths.par_iter().map(|p| job(p.as_path(), &gate)).collect())
    }
}

/// Build the scheduler selected by the configuration.
pub fn scheduler_from_config(config: &ProcessorConfig) -> NemoResult<Box<dyn Scheduler>> {
    match config.execution {
        ExecutionMode::Sequential => Ok(Box::new(Sequential)),
        ExecutionMode::Parallel => Ok(Box::new(WorkerPool::new(
            config.worker_threads,
            config.serialize_file_reads,
        )?)),
    }
}
