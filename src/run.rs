//! Run files and the run registry.

use std::fs;
use std::io;
use std::io::prelude::*;
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

/// Writer side of a single run file.
///
/// Values are written as fixed-width big-endian 4-byte integers with no
/// header or delimiters; the element count is inferred from the file length
/// on the read side. A run is never mutated once [`finish`](Self::finish)
/// returns.
pub struct RunWriter {
    inner: io::BufWriter<fs::File>,
}

impl RunWriter {
    fn create(path: &Path) -> io::Result<Self> {
        let file = fs::File::create(path)?;
        return Ok(RunWriter {
            inner: io::BufWriter::new(file),
        });
    }

    /// Appends a value to the run.
    pub fn write_value(&mut self, value: i32) -> io::Result<()> {
        self.inner.write_i32::<BigEndian>(value)
    }

    /// Flushes and closes the run file.
    pub fn finish(mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Reader side of a single run file.
pub struct RunReader {
    inner: io::BufReader<fs::File>,
}

impl RunReader {
    fn open(path: &Path, buf_size: usize) -> io::Result<Self> {
        let file = fs::File::open(path)?;
        return Ok(RunReader {
            inner: io::BufReader::with_capacity(buf_size, file),
        });
    }

    /// Reads the next value, or [`None`] once the run is exhausted.
    pub fn read_value(&mut self) -> io::Result<Option<i32>> {
        match self.inner.read_i32::<BigEndian>() {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// Registry of the run files produced for one sort job.
///
/// Encapsulates the naming contract: run *i* (1-based, contiguous) lives at
/// `<dir>/S<i>`. Runs are created in sequence order and the registry is the
/// single owner of their paths, from creation until [`remove_all`](Self::remove_all).
pub struct RunRegistry {
    dir: PathBuf,
    count: usize,
}

impl RunRegistry {
    /// Creates an empty registry rooted at the given working directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        RunRegistry {
            dir: dir.into(),
            count: 0,
        }
    }

    /// Returns the number of registered runs.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Checks if no run has been created.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the path of the run with the given 1-based sequence index.
    pub fn path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("S{}", index))
    }

    /// Creates the next run file and returns its writer.
    pub fn create_run(&mut self) -> io::Result<RunWriter> {
        let index = self.count + 1;
        let writer = RunWriter::create(&self.path(index))?;
        self.count = index;

        log::debug!("run {} created at {}", index, self.path(index).display());

        return Ok(writer);
    }

    /// Opens the run with the given 1-based sequence index for reading,
    /// buffered at `buf_size` bytes.
    pub fn open_run(&self, index: usize, buf_size: usize) -> io::Result<RunReader> {
        RunReader::open(&self.path(index), buf_size)
    }

    /// Deletes every registered run file. Failures are logged and skipped;
    /// there is nothing better to do with a file that refuses to go away.
    pub fn remove_all(&mut self) {
        for index in 1..=self.count {
            let path = self.path(index);
            if let Err(err) = fs::remove_file(&path) {
                log::warn!("failed to delete run file {}: {}", path.display(), err);
            }
        }
        self.count = 0;
    }
}

#[cfg(test)]
mod test {
    use rstest::*;

    use super::RunRegistry;

    #[fixture]
    fn tmp_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[rstest]
    fn test_run_round_trip(tmp_dir: tempfile::TempDir) {
        let saved = Vec::from_iter(-50..50);

        let mut registry = RunRegistry::new(tmp_dir.path());
        let mut writer = registry.create_run().unwrap();
        for value in &saved {
            writer.write_value(*value).unwrap();
        }
        writer.finish().unwrap();

        let mut reader = registry.open_run(1, 64).unwrap();
        let mut restored = Vec::new();
        while let Some(value) = reader.read_value().unwrap() {
            restored.push(value);
        }

        assert_eq!(restored, saved);
    }

    #[rstest]
    fn test_empty_run(tmp_dir: tempfile::TempDir) {
        let mut registry = RunRegistry::new(tmp_dir.path());
        registry.create_run().unwrap().finish().unwrap();

        let mut reader = registry.open_run(1, 64).unwrap();
        assert_eq!(reader.read_value().unwrap(), None);
    }

    #[rstest]
    fn test_sequential_naming(tmp_dir: tempfile::TempDir) {
        let mut registry = RunRegistry::new(tmp_dir.path());
        assert!(registry.is_empty());

        for _ in 0..3 {
            registry.create_run().unwrap().finish().unwrap();
        }

        assert_eq!(registry.len(), 3);
        for index in 1..=3 {
            assert_eq!(registry.path(index), tmp_dir.path().join(format!("S{}", index)));
            assert!(registry.path(index).exists());
        }
    }

    #[rstest]
    fn test_remove_all(tmp_dir: tempfile::TempDir) {
        let mut registry = RunRegistry::new(tmp_dir.path());
        for _ in 0..3 {
            registry.create_run().unwrap().finish().unwrap();
        }

        let paths = Vec::from_iter((1..=3).map(|i| registry.path(i)));
        registry.remove_all();

        assert!(registry.is_empty());
        assert!(paths.iter().all(|p| !p.exists()));
    }
}
