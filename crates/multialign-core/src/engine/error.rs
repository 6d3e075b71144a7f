use std::io;
use std::path::PathBuf;
use thiserror::Error;

use super::config::ConfigError;
use super::work_list::WorkListError;
use crate::core::alignment::AlignmentError;
use crate::core::io::pdb::PdbError;

/// Errors that abort a whole run before any target is processed.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    WorkList(#[from] WorkListError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to load reference structure '{path}': {source}")]
    Reference {
        path: PathBuf,
        #[source]
        source: PdbError,
    },

    #[error("Failed to prepare output directory '{path}': {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write reference copy '{path}': {source}")]
    ReferenceWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to build worker thread pool: {0}")]
    ThreadPool(String),
}

/// Errors confined to a single target. They are recorded in the run report
/// and never stop other targets under the default failure policy.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Failed to load '{path}': {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: PdbError,
    },

    #[error("Alignment failed: {0}")]
    Alignment(#[from] AlignmentError),

    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: PdbError,
    },

    #[error("Skipped after an earlier target failed")]
    Cancelled,
}
