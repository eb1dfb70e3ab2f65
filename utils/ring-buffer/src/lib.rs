//! Fixed-capacity ring buffer that only grows at the head.
//!
//! Pushing onto a full buffer silently overwrites the oldest element (the
//! tail). Iteration is available in both directions so callers can walk from
//! the newest element outward.

use std::fmt;

#[derive(Clone, Debug)]
pub struct RingBuffer<T, const N: usize> {
    slots: [Option<T>; N],
    /// Index of the oldest element.
    tail: usize,
    len: usize,
}

impl<T, const N: usize> RingBuffer<T, N> {
    pub fn new() -> Self {
        const { assert!(N > 0, "ring buffer capacity must be non-zero") };
        Self {
            slots: std::array::from_fn(|_| None),
            tail: 0,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Adds `item` as the newest element. Returns the evicted tail if the
    /// buffer was already full.
    pub fn push_head(&mut self, item: T) -> Option<T> {
        if self.len == N {
            let evicted = self.slots[self.tail].replace(item);
            self.tail = (self.tail + 1) % N;
            return evicted;
        }
        let idx = (self.tail + self.len) % N;
        self.slots[idx] = Some(item);
        self.len += 1;
        None
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.tail = 0;
        self.len = 0;
    }

    /// Iterates from the oldest element to the newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        (0..self.len).filter_map(move |offset| self.slots[(self.tail + offset) % N].as_ref())
    }

    /// Iterates from the newest element back to the oldest.
    pub fn iter_newest_first(&self) -> impl Iterator<Item = &T> + '_ {
        self.iter().rev()
    }
}

impl<T, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Display, const N: usize> fmt::Display for RingBuffer<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (idx, item) in self.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{item}")?;
        }
        f.write_str("]")
    }
}
