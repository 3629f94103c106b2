//! Growable ring buffer used for queue values and queue waiters.
//!
//! Slots are laid out in a boxed slice indexed modulo its length. `head` points
//! at the oldest element and `count` live elements follow it (wrapping). When a
//! push or unshift finds the buffer full, the storage doubles and the live
//! elements are rewritten contiguously starting at index 0.

use std::fmt;

/// A FIFO sequence with amortized O(1) operations at both ends.
///
/// The buffer owns its elements. It imposes no ordering or equality logic of
/// its own besides what [`RingBuffer::delete`] needs.
pub struct RingBuffer<T> {
    slots: Box<[Option<T>]>,
    head: usize,
    count: usize,
}

impl<T> RingBuffer<T> {
    /// Creates an empty buffer without allocating.
    pub fn new() -> Self {
        Self {
            slots: Box::new([]),
            head: 0,
            count: 0,
        }
    }

    /// Creates an empty buffer able to hold `capacity` elements before growing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Appends `value` at the back.
    pub fn push(&mut self, value: T) {
        self.reserve_one();

        let index = self.physical(self.count);
        self.slots[index] = Some(value);
        self.count += 1;
    }

    /// Prepends `value` at the front.
    pub fn unshift(&mut self, value: T) {
        self.reserve_one();

        let capacity = self.slots.len();
        self.head = (self.head + capacity - 1) % capacity;
        self.slots[self.head] = Some(value);
        self.count += 1;
    }

    /// Removes and returns the front element.
    pub fn shift(&mut self) -> Option<T> {
        if self.count == 0 {
            return None;
        }

        let value = self.slots[self.head].take();
        self.head = (self.head + 1) % self.slots.len();
        self.count -= 1;

        if self.count == 0 {
            self.head = 0;
        }

        value
    }

    /// Removes and returns the back element.
    pub fn pop(&mut self) -> Option<T> {
        if self.count == 0 {
            return None;
        }

        let index = self.physical(self.count - 1);
        self.count -= 1;

        self.slots[index].take()
    }

    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// Returns the element at logical position `offset` from the front.
    pub fn get(&self, offset: usize) -> Option<&T> {
        if offset >= self.count {
            return None;
        }

        self.slots[self.physical(offset)].as_ref()
    }

    /// Removes the first element for which `matches` returns true.
    ///
    /// Elements behind the removed one shift forward by one slot, so the
    /// relative order of the remaining elements is preserved.
    pub fn delete_by(&mut self, mut matches: impl FnMut(&T) -> bool) -> Option<T> {
        let position = (0..self.count).find(|&offset| {
            self.slots[self.physical(offset)]
                .as_ref()
                .is_some_and(&mut matches)
        })?;

        let removed = self.slots[self.physical(position)].take();

        for offset in position..self.count - 1 {
            let from = self.physical(offset + 1);
            let to = self.physical(offset);
            self.slots[to] = self.slots[from].take();
        }

        self.count -= 1;
        if self.count == 0 {
            self.head = 0;
        }

        removed
    }

    /// Drops every element, keeping the allocated storage.
    pub fn clear(&mut self) {
        while self.shift().is_some() {}
    }

    /// Removes every element front to back, handing each to `f`.
    pub fn shift_each(&mut self, mut f: impl FnMut(T)) {
        while let Some(value) = self.shift() {
            f(value);
        }
    }

    /// Removes every element, returning them in FIFO order.
    pub fn shift_all(&mut self) -> Vec<T> {
        let mut values = Vec::with_capacity(self.count);
        self.shift_each(|value| values.push(value));

        values
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.count).filter_map(move |offset| self.slots[self.physical(offset)].as_ref())
    }

    fn physical(&self, offset: usize) -> usize {
        (self.head + offset) % self.slots.len()
    }

    fn reserve_one(&mut self) {
        if self.count < self.slots.len() {
            return;
        }

        let new_capacity = if self.slots.is_empty() {
            1
        } else {
            self.slots.len() * 2
        };

        let mut slots: Box<[Option<T>]> = (0..new_capacity).map(|_| None).collect();
        for (index, slot) in slots.iter_mut().take(self.count).enumerate() {
            let from = self.physical(index);
            *slot = self.slots[from].take();
        }

        self.slots = slots;
        self.head = 0;
    }
}

impl<T: PartialEq> RingBuffer<T> {
    /// Removes the first element equal to `value`. Returns whether one was found.
    pub fn delete(&mut self, value: &T) -> bool {
        self.delete_by(|candidate| candidate == value).is_some()
    }
}

impl<T> Default for RingBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Extend<T> for RingBuffer<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl<T> FromIterator<T> for RingBuffer<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut ring = Self::new();
        ring.extend(iter);
        ring
    }
}
