//! Fixed-Capacity Circular Buffer for Resistance Samples
//!
//! ## Overview
//!
//! The sampler keeps the most recent accepted ADC counts in a ring buffer.
//! The aggregation step averages whatever is in it, so the buffer acts as a
//! sliding window over the last `resistances_to_keep` good samples.
//!
//! Capacity comes from configuration and is fixed for the life of the
//! buffer. Storage is allocated once in [`ResistanceBuffer::new`] and never
//! grows afterwards.
//!
//! ### Memory Layout
//!
//! ```text
//! ResistanceBuffer (capacity 5) after 7 writes:
//! ┌─────┬─────┬─────┬─────┬─────┐
//! │  F  │  G  │  C  │  D  │  E  │  ← slots
//! └─────┴─────┴─────┴─────┴─────┘
//!              ↑
//!              └── cursor = 2 (next write, also the oldest slot)
//!
//! Logical view (oldest → newest): C D E F G
//! ```
//!
//! ### Invariants
//!
//! - `len <= capacity`
//! - `cursor < capacity`
//! - iteration yields the newest `len` accepted samples in write order
//!
//! ## Usage Example
//!
//! ```rust
//! use thermolog_core::buffer::ResistanceBuffer;
//!
//! let mut window = ResistanceBuffer::new(3);
//! for count in [500, 510, 495, 505] {
//!     window.push(count);
//! }
//!
//! // Oldest sample (500) was overwritten
//! let counts: Vec<u16> = window.iter().collect();
//! assert_eq!(counts, vec![510, 495, 505]);
//! assert_eq!(window.last(), Some(505));
//! ```

/// Ring buffer of accepted ADC counts
///
/// Not thread-safe. The pipeline shares it between the sampling and
/// aggregation tasks behind a mutex.
#[derive(Debug, Clone)]
pub struct ResistanceBuffer {
    /// Slot storage, length equals capacity once constructed
    data: Vec<u16>,

    /// Index where the next write will occur
    cursor: usize,

    /// Number of populated slots
    len: usize,
}

impl ResistanceBuffer {
    /// Creates an empty buffer holding at most `capacity` samples
    ///
    /// A zero capacity is bumped to one so that the cursor invariant can
    /// hold; configuration validation rejects zero before it gets here.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: vec![0; capacity],
            cursor: 0,
            len: 0,
        }
    }

    /// Writes a sample at the cursor and advances it with wraparound
    ///
    /// When full, this overwrites the oldest sample.
    pub fn push(&mut self, count: u16) {
        self.data[self.cursor] = count;
        self.cursor = (self.cursor + 1) % self.data.len();

        if self.len < self.data.len() {
            self.len += 1;
        }
    }

    /// Number of populated slots
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check if buffer is full
    pub fn is_full(&self) -> bool {
        self.len == self.data.len()
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Slot the next write lands in
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Most recently stored sample
    pub fn last(&self) -> Option<u16> {
        if self.is_empty() {
            return None;
        }

        // Most recent is one before the cursor
        let idx = if self.cursor == 0 {
            self.data.len() - 1
        } else {
            self.cursor - 1
        };

        Some(self.data[idx])
    }

    /// Arithmetic mean of the populated slots, `None` when empty
    pub fn mean(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }

        let sum: u64 = self.iter().map(u64::from).sum();
        Some(sum as f64 / self.len as f64)
    }

    /// Iterate over samples from oldest to newest
    pub fn iter(&self) -> ResistanceBufferIter<'_> {
        ResistanceBufferIter {
            buffer: self,
            index: 0,
        }
    }

    /// Drop all samples, keeping the allocation
    pub fn clear(&mut self) {
        self.cursor = 0;
        self.len = 0;
    }

    /// Gets a sample by its logical index (0 = oldest, len-1 = newest)
    ///
    /// ```text
    /// Physical:  [D, E, A, B, C]  (cursor = 2, full)
    /// Logical:   [A, B, C, D, E]
    ///
    /// logical[0] = physical[(2 + 0) % 5] = A
    /// ```
    fn get(&self, index: usize) -> Option<u16> {
        if index >= self.len {
            return None;
        }

        let actual_index = if self.len < self.data.len() {
            // Not wrapped yet, data starts at 0
            index
        } else {
            // Full, oldest data sits under the cursor
            (self.cursor + index) % self.data.len()
        };

        Some(self.data[actual_index])
    }
}

/// Iterator over buffer contents in write order
pub struct ResistanceBufferIter<'a> {
    buffer: &'a ResistanceBuffer,
    index: usize,
}

impl Iterator for ResistanceBufferIter<'_> {
    type Item = u16;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.buffer.get(self.index)?;
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.buffer.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ResistanceBufferIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_buffer() {
        let buffer = ResistanceBuffer::new(5);
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.last(), None);
        assert_eq!(buffer.mean(), None);
    }

    #[test]
    fn push_and_retrieve() {
        let mut buffer = ResistanceBuffer::new(5);
        buffer.push(512);

        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.last(), Some(512));
        assert_eq!(buffer.cursor(), 1);
    }

    #[test]
    fn circular_overwrite() {
        let mut buffer = ResistanceBuffer::new(3);

        for count in 0..5 {
            buffer.push(count);
        }

        assert_eq!(buffer.len(), 3);
        assert!(buffer.is_full());
        // 0 and 1 were overwritten
        assert_eq!(buffer.iter().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(buffer.cursor(), 2);
    }

    #[test]
    fn mean_of_populated_slots() {
        let mut buffer = ResistanceBuffer::new(10);
        for count in [100, 200, 300] {
            buffer.push(count);
        }
        assert_eq!(buffer.mean(), Some(200.0));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut buffer = ResistanceBuffer::new(0);
        buffer.push(7);
        buffer.push(8);
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.iter().collect::<Vec<_>>(), vec![8]);
    }

    #[test]
    fn clear_resets_cursor() {
        let mut buffer = ResistanceBuffer::new(4);
        buffer.push(1);
        buffer.push(2);
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.cursor(), 0);
    }

    proptest! {
        #[test]
        fn never_exceeds_capacity_and_keeps_newest(
            capacity in 1usize..16,
            counts in proptest::collection::vec(1u16..=1023, 0..64),
        ) {
            let mut buffer = ResistanceBuffer::new(capacity);
            for &count in &counts {
                buffer.push(count);
            }

            prop_assert!(buffer.len() <= capacity);
            prop_assert!(buffer.cursor() < capacity);

            let expected: Vec<u16> = counts
                .iter()
                .copied()
                .skip(counts.len().saturating_sub(capacity))
                .collect();
            prop_assert_eq!(buffer.iter().collect::<Vec<_>>(), expected);
        }
    }
}
