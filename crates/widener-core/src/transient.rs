//! Transient-aware dry/widened switching.
//!
//! Decorrelation smears attacks. When transient handling is on, each block is
//! classified by an [`OnsetDetector`] and the handler decides, per block,
//! whether the channel outputs the widened signal, the dry input, or a
//! one-block crossfade between them:
//!
//! ```text
//!            onset                 hold expired
//!  Idle ───────────▶ FadeToDry ──▶ Hold … Hold ──▶ FadeToWidened ──▶ Inhibit … ──▶ Idle
//!  (widened)                       (dry)                             (widened)
//! ```
//!
//! Hold and inhibit durations are given in milliseconds and rounded up to
//! whole blocks, since the detector only resolves flags once per block.
//!
//! The crossfade is a half-Hann pair that sums to one at every sample:
//!
//! ```text
//! in[i]  = 0.5·(1 − cos(π·i/(N−1)))
//! out[i] = 1 − in[i]
//! ```

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use crate::envelope::{DEFAULT_ATTACK_MS, DEFAULT_RELEASE_MS};
use crate::onset::{OnsetDetector, OnsetFlags};
use alloc::vec::Vec;
use core::f32::consts::PI;
use libm::{ceilf, cosf};

/// Default minimum time to stay dry after an onset.
pub const DEFAULT_MIN_HOLD_MS: f32 = 80.0;

/// Default minimum time to stay widened after leaving the hold.
pub const DEFAULT_MIN_INHIBIT_MS: f32 = 20.0;

/// What the handler did with one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransientAction {
    /// Widened signal passed through.
    #[default]
    Widened,
    /// Crossfaded from widened to dry.
    FadeToDry,
    /// Dry input passed through.
    Hold,
    /// Crossfaded from dry back to widened.
    FadeToWidened,
    /// Widened signal passed through while onsets are ignored.
    Inhibit,
}

impl TransientAction {
    /// Handler state implied by this action.
    pub const fn state(self) -> TransientState {
        match self {
            Self::Widened => TransientState::Idle,
            Self::FadeToDry | Self::FadeToWidened => TransientState::Fading,
            Self::Hold => TransientState::Holding,
            Self::Inhibit => TransientState::Inhibiting,
        }
    }
}

/// Coarse state of the crossfade machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransientState {
    /// Steady widened output.
    #[default]
    Idle,
    /// Outputting dry input after an onset.
    Holding,
    /// Outputting widened signal with onsets suppressed.
    Inhibiting,
    /// In a one-block crossfade.
    Fading,
}

/// Timing for a [`TransientHandler`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransientConfig {
    /// Envelope follower attack in ms.
    pub attack_ms: f32,
    /// Envelope follower release in ms.
    pub release_ms: f32,
    /// Minimum dry time after an onset in ms.
    pub min_hold_ms: f32,
    /// Minimum widened time after a hold in ms.
    pub min_inhibit_ms: f32,
}

impl Default for TransientConfig {
    fn default() -> Self {
        Self {
            attack_ms: DEFAULT_ATTACK_MS,
            release_ms: DEFAULT_RELEASE_MS,
            min_hold_ms: DEFAULT_MIN_HOLD_MS,
            min_inhibit_ms: DEFAULT_MIN_INHIBIT_MS,
        }
    }
}

/// Number of whole blocks covering `time_ms` (ceiling division).
pub fn frames_for_ms(time_ms: f32, sample_rate: f32, block_size: usize) -> u32 {
    if block_size == 0 || time_ms <= 0.0 {
        return 0;
    }
    ceilf(time_ms * sample_rate / (1000.0 * block_size as f32)) as u32
}

/// Rising half of the half-Hann crossfade at index `i` of `n`.
#[inline]
fn fade_in_gain(i: usize, n: usize) -> f32 {
    if n <= 1 {
        1.0
    } else {
        0.5 * (1.0 - cosf(PI * i as f32 / (n - 1) as f32))
    }
}

/// Per-channel transient crossfade state machine.
#[derive(Debug, Clone)]
pub struct TransientHandler {
    detector: OnsetDetector,
    fade_in: Vec<f32>,
    min_hold_frames: u32,
    min_inhibit_frames: u32,
    hold_counter: u32,
    inhibit_counter: u32,
    flags: OnsetFlags,
    state: TransientState,
}

impl TransientHandler {
    /// Creates a handler for blocks of `block_size` samples.
    pub fn new(sample_rate: f32, block_size: usize, config: TransientConfig) -> Self {
        let block_size = block_size.max(1);
        let fade_in = (0..block_size).map(|i| fade_in_gain(i, block_size)).collect();
        let min_hold_frames = frames_for_ms(config.min_hold_ms, sample_rate, block_size);
        let min_inhibit_frames = frames_for_ms(config.min_inhibit_ms, sample_rate, block_size);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            block_size,
            min_hold_frames,
            min_inhibit_frames,
            "transient handler prepared"
        );

        Self {
            detector: OnsetDetector::with_times(
                sample_rate,
                block_size,
                config.attack_ms,
                config.release_ms,
            ),
            fade_in,
            min_hold_frames,
            min_inhibit_frames,
            hold_counter: 0,
            inhibit_counter: 0,
            flags: OnsetFlags::default(),
            state: TransientState::Idle,
        }
    }

    /// Classifies `dry` and writes the chosen mix of `dry` and `widened` to `output`.
    ///
    /// Processes `min(dry.len(), widened.len(), output.len())` samples.
    pub fn process(&mut self, dry: &[f32], widened: &[f32], output: &mut [f32]) -> TransientAction {
        let len = dry.len().min(widened.len()).min(output.len());
        let flags = self.detector.process_block(&dry[..len]);
        let action = self.advance(flags);
        self.apply(action, &dry[..len], &widened[..len], &mut output[..len]);
        action
    }

    /// Steps the state machine with one block's flags.
    pub fn advance(&mut self, flags: OnsetFlags) -> TransientAction {
        let holding = self.hold_counter > 0;

        // Flags are ignored until the minimum hold has run out.
        let action = if holding && self.hold_counter < self.min_hold_frames {
            self.hold_counter += 1;
            TransientAction::Hold
        } else if self.inhibit_counter > 0 && self.inhibit_counter < self.min_inhibit_frames {
            self.inhibit_counter += 1;
            TransientAction::Inhibit
        } else if flags.onset {
            self.hold_counter = 1;
            self.inhibit_counter = 0;
            if holding {
                TransientAction::Hold
            } else {
                TransientAction::FadeToDry
            }
        } else if holding {
            // Expired hold; an onset→offset pair exits here as well.
            self.hold_counter = 0;
            self.inhibit_counter = 1;
            TransientAction::FadeToWidened
        } else {
            self.hold_counter = 0;
            self.inhibit_counter = 0;
            TransientAction::Widened
        };

        self.flags = flags;
        self.state = action.state();
        action
    }

    fn apply(&self, action: TransientAction, dry: &[f32], widened: &[f32], output: &mut [f32]) {
        let n = output.len();
        let precomputed = n == self.fade_in.len();
        let gain = |i: usize| {
            if precomputed {
                self.fade_in[i]
            } else {
                fade_in_gain(i, n)
            }
        };

        match action {
            TransientAction::Widened | TransientAction::Inhibit => output.copy_from_slice(widened),
            TransientAction::Hold => output.copy_from_slice(dry),
            TransientAction::FadeToDry => {
                for (i, out) in output.iter_mut().enumerate() {
                    let g = gain(i);
                    *out = g * dry[i] + (1.0 - g) * widened[i];
                }
            }
            TransientAction::FadeToWidened => {
                for (i, out) in output.iter_mut().enumerate() {
                    let g = gain(i);
                    *out = g * widened[i] + (1.0 - g) * dry[i];
                }
            }
        }
    }

    /// Blocks spent dry since the last onset (0 when not holding).
    pub fn hold_counter(&self) -> u32 {
        self.hold_counter
    }

    /// Blocks spent inhibited since the last hold (0 when not inhibiting).
    pub fn inhibit_counter(&self) -> u32 {
        self.inhibit_counter
    }

    /// Minimum hold length in blocks.
    pub fn min_hold_frames(&self) -> u32 {
        self.min_hold_frames
    }

    /// Minimum inhibit length in blocks.
    pub fn min_inhibit_frames(&self) -> u32 {
        self.min_inhibit_frames
    }

    /// State after the last block.
    pub fn state(&self) -> TransientState {
        self.state
    }

    /// Detector flags of the last block.
    pub fn flags(&self) -> OnsetFlags {
        self.flags
    }

    /// Returns to steady widened output and clears detector history.
    pub fn reset(&mut self) {
        self.detector.reset();
        self.hold_counter = 0;
        self.inhibit_counter = 0;
        self.flags = OnsetFlags::default();
        self.state = TransientState::Idle;
    }
}
