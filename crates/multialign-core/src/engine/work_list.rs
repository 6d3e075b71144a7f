use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkListError {
    #[error("Failed to read structure list '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Structure list '{origin}' contains no paths")]
    Empty { origin: String },

    #[error("Entry {index} ('{path}') has no file name to write output under")]
    NoFileName { index: usize, path: PathBuf },

    #[error(
        "Entries '{first}' and '{second}' would both be written as '{name}' in the output directory"
    )]
    DuplicateOutputName {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// The ordered, immutable list of input structures.
///
/// Entry 0 is the reference; entries `1..len()` are the targets. Cloning is
/// cheap and every clone shares the same backing slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkList {
    paths: Arc<[PathBuf]>,
}

impl WorkList {
    /// Reads one path per line from a list file.
    ///
    /// Surrounding whitespace is trimmed and blank lines are skipped. Relative
    /// paths are kept as written.
    pub fn from_list_file(path: &Path) -> Result<Self, WorkListError> {
        let content = fs::read_to_string(path).map_err(|source| WorkListError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parses list-file content; `origin` names the source in error messages.
    pub fn parse(content: &str, origin: &str) -> Result<Self, WorkListError> {
        let paths: Vec<PathBuf> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect();

        if paths.is_empty() {
            return Err(WorkListError::Empty {
                origin: origin.to_string(),
            });
        }
        Self::from_paths(paths)
    }

    /// Builds a work list from paths already in memory.
    ///
    /// # Errors
    ///
    /// Fails if the list is empty, an entry has no file name, or two entries
    /// share a file name and would overwrite each other's output.
    pub fn from_paths(paths: Vec<PathBuf>) -> Result<Self, WorkListError> {
        if paths.is_empty() {
            return Err(WorkListError::Empty {
                origin: "<in-memory list>".to_string(),
            });
        }

        let mut seen: HashMap<&std::ffi::OsStr, &Path> = HashMap::with_capacity(paths.len());
        for (index, path) in paths.iter().enumerate() {
            let name = path.file_name().ok_or_else(|| WorkListError::NoFileName {
                index,
                path: path.clone(),
            })?;
            if let Some(first) = seen.insert(name, path) {
                return Err(WorkListError::DuplicateOutputName {
                    name: name.to_string_lossy().into_owned(),
                    first: first.to_path_buf(),
                    second: path.clone(),
                });
            }
        }

        Ok(Self {
            paths: paths.into(),
        })
    }

    pub fn reference(&self) -> &Path {
        &self.paths[0]
    }

    /// Target paths, in list order. Target `i` (1-based) is `targets()[i - 1]`.
    pub fn targets(&self) -> &[PathBuf] {
        &self.paths[1..]
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(PathBuf::as_path)
    }

    /// Total entries including the reference.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn target_count(&self) -> usize {
        self.paths.len() - 1
    }

    /// Where entry `index` is written: `output_dir` joined with its file name.
    pub fn output_path(&self, index: usize, output_dir: &Path) -> Option<PathBuf> {
        self.paths
            .get(index)
            .and_then(|path| path.file_name())
            .map(|name| output_dir.join(name))
    }
}
