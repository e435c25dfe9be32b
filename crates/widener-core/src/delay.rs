//! Circular delay line with sparse tap reads.
//!
//! [`DelayLine`] backs the velvet-noise convolver. The write pointer moves
//! *backwards* through the buffer, so a tap at offset `m` from the read
//! pointer always sees the sample written `length + m` steps ago, without any
//! subtraction in the inner convolution loop.
//!
//! ```text
//!   buffer:  ... | x[n] | x[n-1] | x[n-2] | ... | x[n-L] | x[n-L-1] | ...
//!                   ^ write                        ^ read = write + L
//! ```
//!
//! Capacity is rounded up to a power of two and wrapping is a bit mask. The
//! buffer is allocated once in [`DelayLine::new`] and never reallocates.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

/// Fixed-capacity circular buffer with a decrementing write pointer.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    mask: usize,
    write: usize,
    read: usize,
    length: usize,
}

impl DelayLine {
    /// Creates a delay line holding at least `min_capacity` samples whose read
    /// pointer trails the write pointer by `length` samples.
    ///
    /// `length` is clamped below the capacity.
    pub fn new(min_capacity: usize, length: usize) -> Self {
        let capacity = min_capacity.max(length + 1).max(2).next_power_of_two();
        let length = length.min(capacity - 1);
        Self {
            buffer: vec![0.0; capacity],
            mask: capacity - 1,
            write: 0,
            read: length,
            length,
        }
    }

    /// Total number of samples the buffer holds.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Fixed distance between write and read pointers.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Moves both pointers one step (write backwards, read follows at `length`).
    #[inline]
    pub fn advance(&mut self) {
        self.write = self.write.wrapping_sub(1) & self.mask;
        self.read = (self.write + self.length) & self.mask;
    }

    /// Stores a sample at the write pointer.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write] = sample;
    }

    /// Advances the pointers, then writes `sample` as the newest entry.
    #[inline]
    pub fn push(&mut self, sample: f32) {
        self.advance();
        self.write(sample);
    }

    /// Reads the sample `offset` positions past the read pointer.
    #[inline]
    pub fn tap(&self, offset: usize) -> f32 {
        self.buffer[(self.read + offset) & self.mask]
    }

    /// Zeroes the buffer without moving the pointers.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_rounds_to_power_of_two() {
        let line = DelayLine::new(1000, 10);
        assert_eq!(line.capacity(), 1024);
        assert_eq!(line.length(), 10);

        let tiny = DelayLine::new(0, 0);
        assert_eq!(tiny.capacity(), 2);
    }

    #[test]
    fn length_is_clamped_below_capacity() {
        let line = DelayLine::new(8, 100);
        assert!(line.length() < line.capacity());
    }

    #[test]
    fn zero_length_taps_see_recent_history() {
        let mut line = DelayLine::new(16, 0);
        for i in 1..=5 {
            line.push(i as f32);
        }
        assert_eq!(line.tap(0), 5.0);
        assert_eq!(line.tap(1), 4.0);
        assert_eq!(line.tap(4), 1.0);
        assert_eq!(line.tap(5), 0.0);
    }

    #[test]
    fn read_pointer_trails_by_length() {
        let mut line = DelayLine::new(64, 3);
        for i in 1..=10 {
            line.push(i as f32);
        }
        // Newest is 10; the read pointer sits 3 samples behind it.
        assert_eq!(line.tap(0), 7.0);
        assert_eq!(line.tap(2), 5.0);
    }

    #[test]
    fn wraps_around_capacity() {
        let mut line = DelayLine::new(4, 0);
        for i in 0..11 {
            line.push(i as f32);
        }
        assert_eq!(line.tap(0), 10.0);
        assert_eq!(line.tap(3), 7.0);
    }

    #[test]
    fn clear_zeroes_contents() {
        let mut line = DelayLine::new(8, 1);
        for _ in 0..8 {
            line.push(1.0);
        }
        line.clear();
        for offset in 0..8 {
            assert_eq!(line.tap(offset), 0.0);
        }
    }
}
