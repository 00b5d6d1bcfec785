//! Sort job configuration.

use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::fs;
use std::io;
use std::mem;
use std::path::PathBuf;

/// Lower bound on the sort budget, in bytes. Below this the run buffer is
/// too small for external sorting to make any sense. Tunable; the hard
/// invariant is only that one integer fits.
pub const MIN_SORT_BUDGET: usize = 500;

/// Refuse inputs larger than `merge_budget * MAX_FILE_TO_BUDGET_RATIO`.
/// A crude cap on how large an ASCII integer file can be relative to the
/// memory allotted to sorting it. Tunable, not a correctness contract.
pub const MAX_FILE_TO_BUDGET_RATIO: u64 = 1200;

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    /// The input file does not exist or its metadata is unreadable.
    InputNotFound(PathBuf, io::Error),
    /// The input file has no parent directory to use as a workspace.
    NoWorkDir(PathBuf),
    /// The sort budget is too small to hold a usable run buffer.
    SortBudgetTooSmall { budget: usize, minimum: usize },
    /// The input file is too large for the allotted memory budget.
    InputTooLarge { file_len: u64, limit: u64 },
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self {
            ConfigError::InputNotFound(_, err) => Some(err),
            _ => None,
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            ConfigError::InputNotFound(path, err) => {
                write!(f, "input file {} not found: {}", path.display(), err)
            }
            ConfigError::NoWorkDir(path) => {
                write!(f, "input file {} has no parent directory to work in", path.display())
            }
            ConfigError::SortBudgetTooSmall { budget, minimum } => {
                write!(f, "sort budget of {} bytes is below the {} byte minimum", budget, minimum)
            }
            ConfigError::InputTooLarge { file_len, limit } => {
                write!(
                    f,
                    "input file of {} bytes exceeds the {} byte limit for this memory budget",
                    file_len, limit
                )
            }
        }
    }
}

/// Resolved configuration of a single sort job.
///
/// Budgets are static for the lifetime of the job; a job is assumed to own
/// its full allotment with no contention from concurrent jobs.
#[derive(Debug, Clone)]
pub struct SortConfig {
    /// File to be sorted.
    pub input_path: PathBuf,
    /// Directory holding the run files and the final output.
    pub work_dir: PathBuf,
    /// Bytes available for the in-memory run buffer.
    pub sort_budget: usize,
    /// Bytes available for merge stream buffering.
    pub merge_budget: usize,
}

impl SortConfig {
    /// Creates a configuration with the working directory derived from the
    /// input file's location.
    pub fn for_input(
        input_path: impl Into<PathBuf>,
        sort_budget: usize,
        merge_budget: usize,
    ) -> Result<Self, ConfigError> {
        let input_path = input_path.into();
        let work_dir = match input_path.parent() {
            // a bare file name resolves to the current directory
            Some(parent) if parent.as_os_str().is_empty() => PathBuf::from("."),
            Some(parent) => parent.to_path_buf(),
            None => return Err(ConfigError::NoWorkDir(input_path)),
        };

        return Ok(SortConfig {
            input_path,
            work_dir,
            sort_budget,
            merge_budget,
        });
    }

    /// Validates the configuration against the input file.
    /// Called before any run file is created so that a bad configuration
    /// leaves no partial state behind.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let minimum = MIN_SORT_BUDGET.max(mem::size_of::<i32>());
        if self.sort_budget < minimum {
            return Err(ConfigError::SortBudgetTooSmall {
                budget: self.sort_budget,
                minimum,
            });
        }

        let metadata = fs::metadata(&self.input_path)
            .map_err(|err| ConfigError::InputNotFound(self.input_path.clone(), err))?;

        let limit = self.merge_budget as u64 * MAX_FILE_TO_BUDGET_RATIO;
        if metadata.len() > limit {
            return Err(ConfigError::InputTooLarge {
                file_len: metadata.len(),
                limit,
            });
        }

        log::debug!(
            "configuration valid: input={}, work_dir={}, sort_budget={}, merge_budget={}",
            self.input_path.display(),
            self.work_dir.display(),
            self.sort_budget,
            self.merge_budget
        );

        return Ok(());
    }

    /// Maximum number of integers a single run may hold.
    pub fn max_elements_per_run(&self) -> usize {
        self.sort_budget / mem::size_of::<i32>()
    }
}
