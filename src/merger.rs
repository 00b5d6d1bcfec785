//! K-way run merger.

use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::io;
use std::mem;

use crate::run::{RunReader, RunRegistry};

/// Smallest usable per-stream read buffer, in bytes (a handful of binary
/// integers). Below this, buffering degenerates into thrashing and the merge
/// refuses to start. Tunable.
pub const MIN_STREAM_BUF_SIZE: usize = 16;

/// The merge budget cannot provide a usable read buffer per stream.
#[derive(Debug)]
pub struct UndersizedBufferError {
    /// Bytes available per stream.
    pub computed: usize,
    /// Required minimum, [`MIN_STREAM_BUF_SIZE`].
    pub minimum: usize,
}

impl Error for UndersizedBufferError {}

impl Display for UndersizedBufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "merge budget allows only {} bytes of buffering per stream, minimum is {}",
            self.computed, self.minimum
        )
    }
}

/// Buffer sizing for one merge pass.
///
/// The budget is split across `N + 2` consumers: one read buffer per run
/// stream, with a double share reserved for the output stream, which sees
/// the highest write volume.
#[derive(Debug, Clone, Copy)]
pub struct MergePlan {
    /// Read buffer size for each run stream.
    pub stream_buf_size: usize,
    /// Write buffer size for the output stream.
    pub output_buf_size: usize,
}

impl MergePlan {
    /// Computes the plan for merging `num_runs` runs within `merge_budget`
    /// bytes. Fails before any stream is opened if the per-stream share is
    /// below [`MIN_STREAM_BUF_SIZE`].
    pub fn for_budget(num_runs: usize, merge_budget: usize) -> Result<Self, UndersizedBufferError> {
        let stream_buf_size = merge_budget / (num_runs + 2);

        if stream_buf_size < MIN_STREAM_BUF_SIZE {
            return Err(UndersizedBufferError {
                computed: stream_buf_size,
                minimum: MIN_STREAM_BUF_SIZE,
            });
        }

        return Ok(MergePlan {
            stream_buf_size,
            output_buf_size: stream_buf_size * 2,
        });
    }
}

/// Per-run cursor state.
///
/// `Empty → Loaded` by reading the next binary integer; `Loaded → Empty`
/// when the buffered value is consumed; `→ Closed` (terminal) when a read
/// hits end-of-stream, releasing the file handle.
enum CursorState {
    Empty(RunReader),
    Loaded(RunReader, i32),
    Closed,
}

/// Transient per-run merge state: the cursor's run index, its input stream
/// and its buffered value, advanced in lock step so the two can never fall
/// out of sync.
struct MergeCursor {
    index: usize,
    state: CursorState,
}

impl MergeCursor {
    /// Loads the next value if the cursor is empty, closing the stream at
    /// end-of-run.
    fn fill(&mut self) -> io::Result<()> {
        if let CursorState::Empty(mut reader) = mem::replace(&mut self.state, CursorState::Closed) {
            match reader.read_value()? {
                Some(value) => self.state = CursorState::Loaded(reader, value),
                None => log::debug!("run {} exhausted, stream closed", self.index),
            }
        }

        return Ok(());
    }

    /// Returns the buffered value, if one is held.
    fn value(&self) -> Option<i32> {
        match &self.state {
            CursorState::Loaded(_, value) => Some(*value),
            _ => None,
        }
    }

    /// Consumes the buffered value, leaving the cursor empty.
    fn consume(&mut self) -> i32 {
        match mem::replace(&mut self.state, CursorState::Closed) {
            CursorState::Loaded(reader, value) => {
                self.state = CursorState::Empty(reader);
                value
            }
            _ => unreachable!("consume on a cursor holding no value"),
        }
    }
}

/// K-way merger over the run files of one job.
///
/// Yields every element of every run in ascending order, assuming each run
/// is itself sorted ascending. Ties across runs are broken by lowest run
/// index, which makes the emitted sequence deterministic.
pub struct KWayMerger {
    cursors: Vec<MergeCursor>,
}

impl KWayMerger {
    /// Opens every run in the registry with the planned per-stream buffer.
    pub fn open(registry: &RunRegistry, plan: &MergePlan) -> io::Result<Self> {
        let mut cursors = Vec::with_capacity(registry.len());
        for index in 1..=registry.len() {
            let reader = registry.open_run(index, plan.stream_buf_size)?;
            cursors.push(MergeCursor {
                index,
                state: CursorState::Empty(reader),
            });
        }

        log::debug!("merging {} runs", cursors.len());

        return Ok(KWayMerger { cursors });
    }
}

impl Iterator for KWayMerger {
    type Item = io::Result<i32>;

    /// Returns the next element of the merged sequence in ascending order.
    fn next(&mut self) -> Option<Self::Item> {
        for cursor in self.cursors.iter_mut() {
            if let Err(err) = cursor.fill() {
                return Some(Err(err));
            }
        }

        let mut min: Option<(i32, usize)> = None;
        for (position, cursor) in self.cursors.iter().enumerate() {
            if let Some(value) = cursor.value() {
                // strict comparison keeps the lowest run index on ties
                if min.map_or(true, |(smallest, _)| value < smallest) {
                    min = Some((value, position));
                }
            }
        }

        let (value, position) = min?;
        self.cursors[position].consume();

        return Some(Ok(value));
    }
}

#[cfg(test)]
mod test {
    use rstest::*;

    use super::{KWayMerger, MergePlan, MIN_STREAM_BUF_SIZE};
    use crate::run::RunRegistry;

    #[fixture]
    fn tmp_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    fn write_runs(dir: &std::path::Path, runs: &[Vec<i32>]) -> RunRegistry {
        let mut registry = RunRegistry::new(dir);
        for run in runs {
            let mut writer = registry.create_run().unwrap();
            for value in run {
                writer.write_value(*value).unwrap();
            }
            writer.finish().unwrap();
        }
        registry
    }

    fn merge(registry: &RunRegistry) -> Vec<i32> {
        let plan = MergePlan::for_budget(registry.len(), 4096).unwrap();
        let merger = KWayMerger::open(registry, &plan).unwrap();
        let merged: std::io::Result<Vec<i32>> = merger.collect();
        merged.unwrap()
    }

    #[rstest]
    #[case(vec![], vec![])]
    #[case(vec![vec![], vec![]], vec![])]
    #[case(
        vec![vec![4, 5, 7], vec![1, 6], vec![3], vec![]],
        vec![1, 3, 4, 5, 6, 7],
    )]
    #[case(
        vec![vec![3, 5], vec![2, 4], vec![1]],
        vec![1, 2, 3, 4, 5],
    )]
    #[case(
        vec![vec![7, 7], vec![7]],
        vec![7, 7, 7],
    )]
    #[case(
        vec![vec![-5, 0, 5], vec![-10, 10]],
        vec![-10, -5, 0, 5, 10],
    )]
    fn test_merge(
        tmp_dir: tempfile::TempDir,
        #[case] runs: Vec<Vec<i32>>,
        #[case] expected: Vec<i32>,
    ) {
        let registry = write_runs(tmp_dir.path(), &runs);
        assert_eq!(merge(&registry), expected);
    }

    #[rstest]
    fn test_merge_deterministic(tmp_dir: tempfile::TempDir) {
        let runs = vec![vec![1, 4, 4, 9], vec![2, 4, 8], vec![4, 4]];
        let registry = write_runs(tmp_dir.path(), &runs);

        let first = merge(&registry);
        let second = merge(&registry);

        assert_eq!(first, vec![1, 2, 4, 4, 4, 4, 4, 8, 9]);
        assert_eq!(first, second);
    }

    #[rstest]
    #[case(0, 4096, true)]
    #[case(10, MIN_STREAM_BUF_SIZE * 12, true)]
    #[case(10, MIN_STREAM_BUF_SIZE * 12 - 1, false)]
    #[case(10, 0, false)]
    fn test_plan_boundary(#[case] num_runs: usize, #[case] budget: usize, #[case] ok: bool) {
        let plan = MergePlan::for_budget(num_runs, budget);
        assert_eq!(plan.is_ok(), ok);

        if let Ok(plan) = plan {
            assert_eq!(plan.stream_buf_size, budget / (num_runs + 2));
            assert_eq!(plan.output_buf_size, plan.stream_buf_size * 2);
        }
    }
}
