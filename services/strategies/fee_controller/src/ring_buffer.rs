//! Fixed-capacity observation buffer
//!
//! An arena that grows to `capacity` once and is then overwritten in place at the write
//! index. Fill state is tracked by count, never by sentinel values.

#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<T>,
    capacity: usize,
    /// Next slot to overwrite once full
    write: usize,
}

impl<T: Clone> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            write: 0,
        }
    }

    /// Append, evicting the oldest entry when full
    pub fn push(&mut self, item: T) {
        if self.slots.len() < self.capacity {
            self.slots.push(item);
        } else {
            self.slots[self.write] = item;
        }
        self.write = (self.write + 1) % self.capacity;
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&T> {
        if self.slots.is_empty() {
            return None;
        }
        let index = (self.write + self.capacity - 1) % self.capacity;
        self.slots.get(index)
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let split = if self.is_full() { self.write } else { 0 };
        self.slots[split..].iter().chain(self.slots[..split].iter())
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}
