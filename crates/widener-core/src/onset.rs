//! Onset/offset detection over a block-granular envelope.
//!
//! The detector follows the input with a [`LeakyIntegrator`] and watches the
//! last three envelope samples:
//!
//! ```text
//!  local peak:  second_last < last > current
//!  rising:      second_last < last < current
//!  falling:     second_last > last > current
//! ```
//!
//! An adaptive threshold chases four times the running mean of the envelope.
//! It moves fast (forget factor 0.01) on a local peak and slowly (0.99)
//! otherwise:
//!
//! ```text
//! threshold = ff·threshold + (1 − ff)·4·mean
//! ```
//!
//! Within a block, the first `rising ∧ last > threshold` raises the onset
//! flag and the first `falling ∧ last < threshold` raises the offset flag.
//! Once one of them is set, the rest of the block only updates the tracker.
//! The window, mean and threshold persist across blocks.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use crate::envelope::{DEFAULT_ATTACK_MS, DEFAULT_RELEASE_MS, LeakyIntegrator};
use alloc::vec;
use alloc::vec::Vec;

/// Threshold target as a multiple of the running envelope mean.
pub const THRESHOLD_MULTIPLIER: f32 = 4.0;

/// Forget factor applied on a local envelope peak.
pub const FAST_FORGET: f32 = 0.01;

/// Forget factor applied everywhere else.
pub const SLOW_FORGET: f32 = 0.99;

/// Threshold before any signal has been seen (full scale).
pub const INITIAL_THRESHOLD: f32 = 1.0;

/// Block-level transient events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OnsetFlags {
    /// A rising envelope crossed above the threshold in this block.
    pub onset: bool,
    /// A falling envelope dropped below the threshold in this block.
    pub offset: bool,
}

/// Sliding three-sample window plus adaptive threshold.
#[derive(Debug, Clone)]
struct ThresholdTracker {
    second_last: f32,
    last: f32,
    current: f32,
    mean: f32,
    count: u64,
    threshold: f32,
}

impl ThresholdTracker {
    fn new() -> Self {
        Self {
            second_last: 0.0,
            last: 0.0,
            current: 0.0,
            mean: 0.0,
            count: 0,
            threshold: INITIAL_THRESHOLD,
        }
    }

    /// Pushes one envelope sample and returns `(rising, falling)`.
    #[inline]
    fn observe(&mut self, envelope: f32) -> (bool, bool) {
        self.second_last = self.last;
        self.last = self.current;
        self.current = envelope;

        self.count += 1;
        self.mean += (envelope - self.mean) / self.count as f32;

        let local_peak = self.last > self.second_last && self.last > self.current;
        let forget = if local_peak { FAST_FORGET } else { SLOW_FORGET };
        self.threshold =
            forget * self.threshold + (1.0 - forget) * THRESHOLD_MULTIPLIER * self.mean;

        let rising = self.second_last < self.last && self.last < self.current;
        let falling = self.second_last > self.last && self.last > self.current;
        (rising, falling)
    }
}

/// Peak-based adaptive-threshold transient classifier.
#[derive(Debug, Clone)]
pub struct OnsetDetector {
    follower: LeakyIntegrator,
    envelope: Vec<f32>,
    tracker: ThresholdTracker,
}

impl OnsetDetector {
    /// Creates a detector with the default 5 ms attack / 50 ms release follower.
    ///
    /// `block_size` sizes the envelope scratch buffer; longer blocks are
    /// handled in pieces.
    pub fn new(sample_rate: f32, block_size: usize) -> Self {
        Self::with_times(sample_rate, block_size, DEFAULT_ATTACK_MS, DEFAULT_RELEASE_MS)
    }

    /// Creates a detector with custom follower times.
    pub fn with_times(sample_rate: f32, block_size: usize, attack_ms: f32, release_ms: f32) -> Self {
        Self {
            follower: LeakyIntegrator::new(sample_rate, attack_ms, release_ms),
            envelope: vec![0.0; block_size.max(1)],
            tracker: ThresholdTracker::new(),
        }
    }

    /// Analyses one block and returns its onset/offset flags.
    pub fn process_block(&mut self, block: &[f32]) -> OnsetFlags {
        let mut flags = OnsetFlags::default();
        let scratch_len = self.envelope.len();

        for chunk in block.chunks(scratch_len) {
            let envelope = &mut self.envelope[..chunk.len()];
            self.follower.process_block(chunk, envelope);

            for &e in envelope.iter() {
                let (rising, falling) = self.tracker.observe(e);
                if flags.onset || flags.offset {
                    continue;
                }
                if rising && self.tracker.last > self.tracker.threshold {
                    flags.onset = true;
                } else if falling && self.tracker.last < self.tracker.threshold {
                    flags.offset = true;
                }
            }
        }

        flags
    }

    /// Current adaptive threshold.
    pub fn threshold(&self) -> f32 {
        self.tracker.threshold
    }

    /// Running mean of the envelope.
    pub fn mean(&self) -> f32 {
        self.tracker.mean
    }

    /// Last envelope value.
    pub fn envelope_level(&self) -> f32 {
        self.follower.level()
    }

    /// Forgets all history (envelope, window, mean, threshold).
    pub fn reset(&mut self) {
        self.follower.reset();
        self.tracker = ThresholdTracker::new();
    }
}
