//! `runsort` is an external merge sort for huge newline-delimited integer files.
//!
//! External sorting handles data sets that do not fit into the main memory (RAM) of a computer.
//! Sorting is achieved in two passes: during the first pass the input is partitioned into
//! memory-sized runs, each sorted in RAM and persisted as a compact binary file; during the second
//! pass the runs are k-way merged into a single sorted output. For more information see
//! [External Sorting](https://en.wikipedia.org/wiki/External_sorting).
//!
//! # Overview
//!
//! `runsort` provides:
//!
//! * **Memory-bounded sorting:**
//!   the run buffer and all merge stream buffers are sized from explicit byte budgets, so the job
//!   never consumes more memory than it was allotted.
//! * **Compact intermediate state:**
//!   runs are stored as raw fixed-width big-endian integers with no framing overhead and are
//!   deleted once the merge completes.
//! * **Fail-fast semantics:**
//!   malformed input, I/O failures and degenerate buffer configurations abort the whole job with a
//!   typed error; no partially sorted output is ever left behind.
//!
//! # Example
//!
//! ```no_run
//! use runsort::{ExternalSorter, SortConfig};
//!
//! fn main() {
//!     let config = SortConfig::for_input("./input.txt", 500_000, 1_000_000).unwrap();
//!     let sorter = ExternalSorter::new(config).unwrap();
//!
//!     let output = sorter.sort().unwrap();
//!     println!("sorted output written to {}", output.display());
//! }
//! ```

pub mod buffer;
pub mod config;
pub mod merger;
pub mod mergesort;
pub mod run;
pub mod sort;

pub use buffer::SortBuffer;
pub use config::{ConfigError, SortConfig};
pub use merger::{KWayMerger, MergePlan, UndersizedBufferError};
pub use run::{RunReader, RunRegistry, RunWriter};
pub use sort::{ExternalSorter, SortError, OUTPUT_FILE_NAME};
