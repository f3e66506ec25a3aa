//! Shipsync Ring Buffer - Fixed-capacity history storage
//!
//! This crate provides the bounded buffers used by the client netcode:
//!
//! - **Bounded memory**: Fixed capacity, never grows past it
//! - **O(1) insertion**: Pushing overwrites the oldest slot once full
//! - **Indexing from both ends**: `buffer[i]` counts from the oldest entry,
//!   [`RingBuffer::from_back`] counts from the newest
//! - **Moving average**: [`MovingAverage`] keeps a windowed integer mean
//!
//! # Example
//!
//! ```rust
//! use shipsync_ring_buffer::RingBuffer;
//!
//! // 128 ticks at 60Hz = ~2 seconds of history
//! let mut buffer = RingBuffer::new(128);
//!
//! buffer.push(10u32);
//! buffer.push(11);
//! buffer.push(12);
//!
//! assert_eq!(buffer[0], 10);
//! assert_eq!(buffer.from_back(0), Some(&12));
//! assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec![10, 11, 12]);
//! ```

mod moving_average;

pub use moving_average::MovingAverage;

use std::ops::{Index, IndexMut};

/// A circular array with oldest-overwrite eviction
///
/// Logical index 0 is always the oldest entry and `len() - 1` the newest.
/// Indexing past `len()` is a contract violation and panics.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    /// Backing storage, grows up to `capacity` then wraps
    items: Vec<T>,
    /// Physical slot of the oldest entry once the buffer has wrapped
    head: usize,
    /// Capacity (max entries)
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Create a new ring buffer with the given capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of entries to keep
    ///
    /// # Example
    ///
    /// ```rust
    /// use shipsync_ring_buffer::RingBuffer;
    ///
    /// let buffer: RingBuffer<u32> = RingBuffer::new(1000);
    /// assert_eq!(buffer.capacity(), 1000);
    /// ```
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");
        Self {
            items: Vec::with_capacity(capacity),
            head: 0,
            capacity,
        }
    }

    /// Physical slot for a logical index
    fn slot(&self, index: usize) -> usize {
        (self.head + index) % self.capacity
    }

    /// Append an entry, returning the evicted oldest entry if the buffer was full
    pub fn push(&mut self, item: T) -> Option<T> {
        if self.items.len() < self.capacity {
            self.items.push(item);
            return None;
        }

        let evicted = std::mem::replace(&mut self.items[self.head], item);
        self.head = (self.head + 1) % self.capacity;
        Some(evicted)
    }

    /// Get the entry at a logical index (0 = oldest)
    pub fn get(&self, index: usize) -> Option<&T> {
        if index < self.items.len() {
            Some(&self.items[self.slot(index)])
        } else {
            None
        }
    }

    /// Get mutable access to the entry at a logical index (0 = oldest)
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index < self.items.len() {
            let slot = self.slot(index);
            Some(&mut self.items[slot])
        } else {
            None
        }
    }

    /// Get the entry `back` positions from the newest (0 = newest)
    pub fn from_back(&self, back: usize) -> Option<&T> {
        let len = self.items.len();
        if back < len {
            self.get(len - 1 - back)
        } else {
            None
        }
    }

    /// Get the newest entry
    pub fn newest(&self) -> Option<&T> {
        self.from_back(0)
    }

    /// Get the oldest entry
    pub fn oldest(&self) -> Option<&T> {
        self.get(0)
    }

    /// Iterate entries from oldest to newest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        (0..self.items.len()).map(move |i| &self.items[self.slot(i)])
    }

    /// Iterate entries mutably from oldest to newest
    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut T> {
        let (wrapped, oldest) = self.items.split_at_mut(self.head);
        oldest.iter_mut().chain(wrapped.iter_mut())
    }

    /// Logical index of the newest entry matching the predicate
    ///
    /// Scans backward from the newest entry.
    pub fn rposition<P>(&self, mut predicate: P) -> Option<usize>
    where
        P: FnMut(&T) -> bool,
    {
        (0..self.items.len())
            .rev()
            .find(|&i| predicate(&self.items[self.slot(i)]))
    }

    /// Remove all entries
    pub fn clear(&mut self) {
        self.items.clear();
        self.head = 0;
    }

    /// Get the number of stored entries
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Check if the next push will evict
    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    /// Get the capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get statistics about the buffer
    pub fn stats(&self) -> BufferStats {
        BufferStats {
            capacity: self.capacity,
            count: self.items.len(),
        }
    }
}

impl<T> Default for RingBuffer<T> {
    fn default() -> Self {
        Self::new(128) // ~2 seconds at 60Hz
    }
}

impl<T> Index<usize> for RingBuffer<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        let len = self.items.len();
        assert!(
            index < len,
            "index {index} out of range for ring buffer of length {len}"
        );
        &self.items[self.slot(index)]
    }
}

impl<T> IndexMut<usize> for RingBuffer<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.items.len();
        assert!(
            index < len,
            "index {index} out of range for ring buffer of length {len}"
        );
        let slot = self.slot(index);
        &mut self.items[slot]
    }
}

/// Statistics about a ring buffer
#[derive(Debug, Clone, Copy)]
pub struct BufferStats {
    /// Maximum capacity
    pub capacity: usize,
    /// Current number of stored entries
    pub count: usize,
}

impl BufferStats {
    /// Get the fill percentage (0.0 to 1.0)
    pub fn fill_ratio(&self) -> f32 {
        self.count as f32 / self.capacity as f32
    }
}
