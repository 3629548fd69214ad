//! Fixed-capacity circular queue
//!
//! Used for the cars on every link and for the parking lot of idle cars.
//! Capacity is chosen once, large enough for every car in the simulation, so
//! the queue never grows. Overflow and underflow are internal faults and panic.

/// A fixed-capacity FIFO backed by a circular buffer
#[derive(Debug, Clone)]
pub struct RingQueue<T> {
    slots: Vec<Option<T>>,
    head: usize,
    len: usize,
}

impl<T> RingQueue<T> {
    /// Create an empty queue that can hold `capacity` items
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingQueue capacity must be positive");
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// Append an item at the tail
    ///
    /// # Panics
    /// If the queue is already full.
    pub fn enqueue(&mut self, item: T) {
        assert!(
            !self.is_full(),
            "enqueue on a full RingQueue (capacity {})",
            self.capacity()
        );
        let idx = self.slot_index(self.len);
        self.slots[idx] = Some(item);
        self.len += 1;
    }

    /// Remove and return the item at the head
    ///
    /// # Panics
    /// If the queue is empty.
    pub fn dequeue(&mut self) -> T {
        assert!(!self.is_empty(), "dequeue on an empty RingQueue");
        let Some(item) = self.slots[self.head].take() else {
            unreachable!("RingQueue slot {} is vacant inside the live range", self.head);
        };
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;
        item
    }

    /// The item at the head (the oldest one)
    pub fn first(&self) -> &T {
        self.peek(0)
    }

    /// The item at the tail (the newest one)
    pub fn last(&self) -> &T {
        assert!(!self.is_empty(), "last() on an empty RingQueue");
        self.peek(self.len - 1)
    }

    /// The item `offset` places behind the head
    ///
    /// # Panics
    /// If `offset >= len()`.
    pub fn peek(&self, offset: usize) -> &T {
        assert!(
            offset < self.len,
            "peek({offset}) out of range for RingQueue of length {}",
            self.len
        );
        match &self.slots[self.slot_index(offset)] {
            Some(item) => item,
            None => unreachable!("RingQueue slot vacant inside the live range"),
        }
    }

    /// Iterate from head to tail
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len).map(move |offset| self.peek(offset))
    }

    fn slot_index(&self, offset: usize) -> usize {
        (self.head + offset) % self.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order_and_length() {
        let mut queue = RingQueue::new(4);
        assert!(queue.is_empty());

        queue.enqueue('a');
        queue.enqueue('b');
        queue.enqueue('c');
        assert_eq!(queue.len(), 3);
        assert_eq!(*queue.first(), 'a');
        assert_eq!(*queue.last(), 'c');
        assert_eq!(*queue.peek(1), 'b');

        assert_eq!(queue.dequeue(), 'a');
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec!['b', 'c']);
    }

    #[test]
    fn test_wrap_around_keeps_order() {
        let n = 5;
        let mut queue = RingQueue::new(n);
        for i in 0..n {
            queue.enqueue(i);
        }
        assert!(queue.is_full());
        for i in 0..n {
            assert_eq!(queue.dequeue(), i);
        }
        for i in 0..n {
            queue.enqueue(100 + i);
        }
        for i in 0..n {
            assert_eq!(*queue.peek(i), 100 + i);
        }
        assert_eq!(*queue.last(), 100 + n - 1);
    }

    #[test]
    fn test_interleaved_operations_track_length() {
        let mut queue = RingQueue::new(3);
        let mut expected = std::collections::VecDeque::new();
        for step in 0..50 {
            if step % 3 == 2 && !expected.is_empty() {
                assert_eq!(queue.dequeue(), expected.pop_front().unwrap());
            } else if !queue.is_full() {
                queue.enqueue(step);
                expected.push_back(step);
            } else {
                assert_eq!(queue.dequeue(), expected.pop_front().unwrap());
            }
            assert_eq!(queue.len(), expected.len());
            assert!(queue.iter().eq(expected.iter()));
        }
    }

    #[test]
    #[should_panic(expected = "full RingQueue")]
    fn test_overflow_is_a_fault() {
        let mut queue = RingQueue::new(1);
        queue.enqueue(1);
        queue.enqueue(2);
    }

    #[test]
    #[should_panic(expected = "empty RingQueue")]
    fn test_underflow_is_a_fault() {
        let mut queue: RingQueue<u8> = RingQueue::new(2);
        queue.dequeue();
    }
}
