//! Bounded run buffer.

/// Fixed-capacity integer buffer filled once per run.
///
/// The buffer is exclusively owned by the current run's sort-and-flush
/// operation; it is cleared for reuse only after the flush completes, so the
/// allocation is paid once for the whole job.
pub struct SortBuffer {
    limit: usize,
    inner: Vec<i32>,
}

impl SortBuffer {
    /// Creates a buffer holding at most `limit` integers.
    /// The backing storage is pre-allocated up front.
    pub fn new(limit: usize) -> Self {
        SortBuffer {
            limit,
            inner: Vec::with_capacity(limit),
        }
    }

    /// Adds a new element to the buffer.
    ///
    /// # Panics
    /// Panics if the buffer is already full. The caller must flush a full
    /// buffer before pushing further elements.
    pub fn push(&mut self, item: i32) {
        assert!(self.inner.len() < self.limit, "push into a full run buffer");
        self.inner.push(item);
    }

    /// Returns the number of buffered elements.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Checks if the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Checks if the buffer reached its capacity.
    pub fn is_full(&self) -> bool {
        self.inner.len() >= self.limit
    }

    /// Returns the populated prefix for in-place sorting.
    pub fn as_mut_slice(&mut self) -> &mut [i32] {
        self.inner.as_mut_slice()
    }

    /// Returns the buffered elements in order.
    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.inner.iter().copied()
    }

    /// Empties the buffer for the next run, keeping the allocation.
    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

#[cfg(test)]
mod test {
    use super::SortBuffer;

    #[test]
    fn test_fill_and_reuse() {
        let mut buffer = SortBuffer::new(2);

        buffer.push(0);
        assert_eq!(buffer.is_full(), false);
        buffer.push(1);
        assert_eq!(buffer.is_full(), true);
        assert_eq!(Vec::from_iter(buffer.iter()), vec![0, 1]);

        buffer.clear();
        assert!(buffer.is_empty());

        buffer.push(2);
        assert_eq!(buffer.len(), 1);
        assert_eq!(Vec::from_iter(buffer.iter()), vec![2]);
    }

    #[test]
    #[should_panic]
    fn test_overfill_panics() {
        let mut buffer = SortBuffer::new(1);
        buffer.push(0);
        buffer.push(1);
    }
}
