//! External sorter.

use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::fs;
use std::io;
use std::io::prelude::*;
use std::num::ParseIntError;
use std::path::PathBuf;

use crate::buffer::SortBuffer;
use crate::config::{ConfigError, SortConfig};
use crate::merger::{KWayMerger, MergePlan, UndersizedBufferError};
use crate::mergesort;
use crate::run::RunRegistry;

/// Name of the sorted output file within the working directory.
pub const OUTPUT_FILE_NAME: &str = "sorted.txt";

/// Sorting error.
#[derive(Debug)]
pub enum SortError {
    /// Invalid configuration, rejected before any run file is created.
    Config(ConfigError),
    /// A line of the input is not a valid integer literal.
    Parse {
        /// 1-based line number of the offending line.
        line: usize,
        /// The offending text.
        literal: String,
        /// Underlying parse failure.
        source: ParseIntError,
    },
    /// Common I/O error.
    Io(io::Error),
    /// The merge budget cannot provide a usable buffer per run stream.
    UndersizedBuffer(UndersizedBufferError),
}

impl Error for SortError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(match &self {
            SortError::Config(err) => err,
            SortError::Parse { source, .. } => source,
            SortError::Io(err) => err,
            SortError::UndersizedBuffer(err) => err,
        })
    }
}

impl Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            SortError::Config(err) => write!(f, "invalid configuration: {}", err),
            SortError::Parse { line, literal, .. } => {
                write!(f, "line {} is not a valid integer: {:?}", line, literal)
            }
            SortError::Io(err) => write!(f, "I/O operation failed: {}", err),
            SortError::UndersizedBuffer(err) => write!(f, "merge buffering too small: {}", err),
        }
    }
}

impl From<ConfigError> for SortError {
    fn from(err: ConfigError) -> Self {
        SortError::Config(err)
    }
}

impl From<io::Error> for SortError {
    fn from(err: io::Error) -> Self {
        SortError::Io(err)
    }
}

impl From<UndersizedBufferError> for SortError {
    fn from(err: UndersizedBufferError) -> Self {
        SortError::UndersizedBuffer(err)
    }
}

/// External sorter.
///
/// Partitions the input into sorted binary runs, k-way merges them into a
/// single ascending text output, then deletes the runs. Every failure is
/// fatal for the whole job: no sorted prefix is ever left behind, and run
/// files created before the failure are removed.
pub struct ExternalSorter {
    config: SortConfig,
}

impl ExternalSorter {
    /// Creates a sorter for the given job, validating the configuration
    /// before any work starts.
    pub fn new(config: SortConfig) -> Result<Self, SortError> {
        config.validate()?;
        return Ok(ExternalSorter { config });
    }

    /// Location of the sorted output within the working directory.
    pub fn output_path(&self) -> PathBuf {
        self.config.work_dir.join(OUTPUT_FILE_NAME)
    }

    /// Sorts the input file end to end and returns the output path.
    pub fn sort(&self) -> Result<PathBuf, SortError> {
        let mut registry = RunRegistry::new(&self.config.work_dir);

        let result = self.run_job(&mut registry);
        registry.remove_all();

        if result.is_err() {
            // a partial output would be indistinguishable from a sorted one
            let _ = fs::remove_file(self.output_path());
        }

        return result;
    }

    fn run_job(&self, registry: &mut RunRegistry) -> Result<PathBuf, SortError> {
        let input = io::BufReader::new(fs::File::open(&self.config.input_path)?);

        let num_runs = self.create_runs(input, registry)?;
        log::info!("partitioning done, {} runs created", num_runs);

        self.merge_runs(registry)?;
        log::info!("sort successful, output at {}", self.output_path().display());

        return Ok(self.output_path());
    }

    /// Partitions the input into sorted binary run files and returns the
    /// number of runs created.
    ///
    /// Every integer of the input lands in exactly one run, each run holds
    /// at most [`SortConfig::max_elements_per_run`] elements, and each run
    /// is sorted ascending before it is written. An empty input creates no
    /// runs. A malformed line fails the whole job.
    pub fn create_runs(
        &self,
        input: impl BufRead,
        registry: &mut RunRegistry,
    ) -> Result<usize, SortError> {
        let mut buffer = SortBuffer::new(self.config.max_elements_per_run());

        for (line_idx, line) in input.lines().enumerate() {
            let line = line?;
            let value = line.trim().parse::<i32>().map_err(|source| SortError::Parse {
                line: line_idx + 1,
                literal: line.clone(),
                source,
            })?;

            buffer.push(value);
            if buffer.is_full() {
                Self::flush_run(&mut buffer, registry)?;
            }
        }

        if !buffer.is_empty() {
            Self::flush_run(&mut buffer, registry)?;
        }

        return Ok(registry.len());
    }

    /// Sorts the buffered prefix and writes it out as the next run.
    /// The buffer is cleared for reuse only once the flush has completed.
    fn flush_run(buffer: &mut SortBuffer, registry: &mut RunRegistry) -> Result<(), SortError> {
        let end = buffer.len();
        mergesort::sort_prefix(buffer.as_mut_slice(), end);

        let mut writer = registry.create_run()?;
        for value in buffer.iter() {
            writer.write_value(value)?;
        }
        writer.finish()?;

        buffer.clear();

        return Ok(());
    }

    /// Merges all runs into the text output, one integer per line.
    /// The buffer plan is checked before any run stream or the output file
    /// is opened.
    fn merge_runs(&self, registry: &RunRegistry) -> Result<(), SortError> {
        if registry.is_empty() {
            fs::File::create(self.output_path())?;
            return Ok(());
        }

        let plan = MergePlan::for_budget(registry.len(), self.config.merge_budget)?;
        let merger = KWayMerger::open(registry, &plan)?;

        let output = fs::File::create(self.output_path())?;
        let mut output = io::BufWriter::with_capacity(plan.output_buf_size, output);

        for value in merger {
            writeln!(output, "{}", value?)?;
        }
        output.flush()?;

        return Ok(());
    }
}
