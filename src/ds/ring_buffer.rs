use std::ops::Index;

/// A bounded buffer that grows up to its capacity, then overwrites its oldest element
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    buffer: Vec<T>,
    next: usize,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Create an empty buffer holding at most `capacity` elements
    ///
    /// **Panics** if `capacity` is zero
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be at least 1");
        Self {
            buffer: Vec::with_capacity(capacity),
            next: 0,
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True once every slot has been written at least once
    pub fn is_full(&self) -> bool {
        self.buffer.len() == self.capacity
    }

    /// Insert an element, overwriting the oldest one when full
    ///
    /// **Returns** the slot that was written
    pub fn push(&mut self, item: T) -> usize {
        let slot = self.next;
        if slot < self.buffer.len() {
            self.buffer[slot] = item;
        } else {
            self.buffer.push(item);
        }
        self.next = (slot + 1) % self.capacity;
        slot
    }

    /// Slice view of the stored elements, in slot order (not insertion order once wrapped)
    pub fn view(&self) -> &[T] {
        &self.buffer
    }
}

impl<T> Index<usize> for RingBuffer<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.buffer[index]
    }
}
