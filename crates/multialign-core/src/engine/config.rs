use super::workers::WorkerRequest;
use crate::core::alignment::selection::AtomSelection;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid thread count {0}: use -1 for all available cores or a positive number")]
    InvalidThreadCount(i64),

    #[error("Invalid numeric thread count {0}: must be at least 1")]
    InvalidNumericThreads(usize),
}

/// What to do with the remaining targets once one of them fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Process every target and report all failures at the end.
    #[default]
    Continue,
    /// Skip targets that have not started yet after the first failure.
    FailFast,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentConfig {
    /// Atoms used to compute the superposition.
    pub fit_selection: AtomSelection,
    /// Atoms used for the before/after RMSD diagnostics.
    pub rmsd_selection: AtomSelection,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            fit_selection: AtomSelection::All,
            rmsd_selection: AtomSelection::AlphaCarbon,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParallelismConfig {
    pub workers: WorkerRequest,
    /// Number of slices each task splits its coordinate update into.
    pub numeric_threads: NonZeroUsize,
}

impl Default for ParallelismConfig {
    fn default() -> Self {
        Self {
            workers: WorkerRequest::Auto,
            numeric_threads: NonZeroUsize::MIN,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    pub output_dir: PathBuf,
    pub alignment: AlignmentConfig,
    pub parallelism: ParallelismConfig,
    pub failure_policy: FailurePolicy,
}

#[derive(Default)]
pub struct BatchConfigBuilder {
    output_dir: Option<PathBuf>,
    fit_selection: Option<AtomSelection>,
    rmsd_selection: Option<AtomSelection>,
    workers: Option<WorkerRequest>,
    numeric_threads: Option<usize>,
    failure_policy: Option<FailurePolicy>,
}

impl BatchConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_dir(mut self, path: PathBuf) -> Self {
        self.output_dir = Some(path);
        self
    }
    pub fn fit_selection(mut self, selection: AtomSelection) -> Self {
        self.fit_selection = Some(selection);
        self
    }
    pub fn rmsd_selection(mut self, selection: AtomSelection) -> Self {
        self.rmsd_selection = Some(selection);
        self
    }
    pub fn workers(mut self, request: WorkerRequest) -> Self {
        self.workers = Some(request);
        self
    }
    pub fn numeric_threads(mut self, threads: usize) -> Self {
        self.numeric_threads = Some(threads);
        self
    }
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = Some(policy);
        self
    }

    pub fn build(self) -> Result<BatchConfig, ConfigError> {
        let output_dir = self
            .output_dir
            .ok_or(ConfigError::MissingParameter("output_dir"))?;

        let parallelism_defaults = ParallelismConfig::default();
        let numeric_threads = match self.numeric_threads {
            Some(n) => NonZeroUsize::new(n).ok_or(ConfigError::InvalidNumericThreads(n))?,
            None => parallelism_defaults.numeric_threads,
        };

        let alignment_defaults = AlignmentConfig::default();
        Ok(BatchConfig {
            output_dir,
            alignment: AlignmentConfig {
                fit_selection: self
                    .fit_selection
                    .unwrap_or(alignment_defaults.fit_selection),
                rmsd_selection: self
                    .rmsd_selection
                    .unwrap_or(alignment_defaults.rmsd_selection),
            },
            parallelism: ParallelismConfig {
                workers: self.workers.unwrap_or(parallelism_defaults.workers),
                numeric_threads,
            },
            failure_policy: self.failure_policy.unwrap_or_default(),
        })
    }
}
