//! Fixed-size history that drops its oldest value once full.

use num_traits::Float;

/// Holds the last `SIZE` values pushed, stored inline.
pub struct RingBuffer<T, const SIZE: usize> {
    data: [T; SIZE],
    next: usize,
    full: bool,
}

impl<T: Default + Copy, const SIZE: usize> RingBuffer<T, SIZE> {
    pub fn new() -> Self {
        Self {
            data: [T::default(); SIZE],
            next: 0,
            full: false,
        }
    }
}

impl<T, const SIZE: usize> RingBuffer<T, SIZE> {
    /// Stores `val`, overwriting the oldest value when full.
    pub fn push(&mut self, val: T) {
        self.data[self.next] = val;
        self.next += 1;
        if self.next == SIZE {
            self.next = 0;
            self.full = true;
        }
    }

    pub fn len(&self) -> usize {
        self.values().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The slots written so far, in storage order.
    fn values(&self) -> &[T] {
        match self.full {
            true => &self.data,
            false => &self.data[..self.next],
        }
    }
}

impl<T: Float, const SIZE: usize> RingBuffer<T, SIZE> {
    /// Mean of the held values, NaN when empty.
    pub fn avg(&self) -> T {
        let values = self.values();
        let sum = values.iter().fold(T::zero(), |acc, &x| acc + x);
        match T::from(values.len()) {
            Some(len) => sum / len,
            None => T::nan(),
        }
    }
}
