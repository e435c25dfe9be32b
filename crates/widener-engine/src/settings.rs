//! Construction-time settings of the widener.
//!
//! These are fixed for the lifetime of a prepared engine and take effect on
//! the next [`prepare`](crate::StereoWidener::prepare). Live controls live in
//! [`WidenerParams`](crate::WidenerParams) instead.

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::string::String;

use widener_core::{AllpassConfig, TransientConfig, VelvetConfig};

/// Default control smoothing time in milliseconds.
pub const DEFAULT_SMOOTHING_MS: f32 = 10.0;

/// Engine settings.
///
/// | Setting | Default |
/// |---------|---------|
/// | velvet length | 15 ms |
/// | grid density | 1000 impulses/s |
/// | velvet decay | 10 dB |
/// | logarithmic placement | on |
/// | all-pass sections | 200 |
/// | max group delay | 15 ms |
/// | smoothing | 10 ms |
/// | envelope attack / release | 5 ms / 50 ms |
/// | min hold / inhibit | 80 ms / 20 ms |
/// | seed | 0 |
#[derive(Debug, Clone, PartialEq)]
pub struct WidenerSettings {
    /// Velvet-noise sequence generation.
    pub velvet: VelvetConfig,
    /// All-pass cascade generation.
    pub allpass: AllpassConfig,
    /// Envelope and hold/inhibit timing of the transient path.
    pub transient: TransientConfig,
    /// Time constant of the width and cutoff smoothers in milliseconds.
    pub smoothing_ms: f32,
    /// Base seed; each channel derives its own generator from it.
    pub seed: u64,
    /// Precomputed velvet sequences, one line per channel. Replaces random
    /// velvet generation when set.
    pub velvet_table: Option<String>,
}

impl Default for WidenerSettings {
    fn default() -> Self {
        Self {
            velvet: VelvetConfig::default(),
            allpass: AllpassConfig::default(),
            transient: TransientConfig::default(),
            smoothing_ms: DEFAULT_SMOOTHING_MS,
            seed: 0,
            velvet_table: None,
        }
    }
}

impl WidenerSettings {
    /// Default settings with a different seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Generator seed for `channel`.
    ///
    /// Channels must never share a sequence, otherwise the decorrelated
    /// copies would be identical and the image would not widen.
    pub fn channel_seed(&self, channel: usize) -> u64 {
        self.seed ^ (channel as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = WidenerSettings::default();
        assert_eq!(s.velvet.length_ms, 15.0);
        assert_eq!(s.velvet.grid_density, 1000.0);
        assert_eq!(s.velvet.decay_db, 10.0);
        assert!(s.velvet.log_distribution);
        assert_eq!(s.allpass.sections, 200);
        assert_eq!(s.allpass.max_group_delay_ms, 15.0);
        assert_eq!(s.smoothing_ms, 10.0);
        assert_eq!(s.transient.min_hold_ms, 80.0);
        assert_eq!(s.transient.min_inhibit_ms, 20.0);
        assert!(s.velvet_table.is_none());
    }

    #[test]
    fn channel_seeds_differ() {
        let s = WidenerSettings::with_seed(7);
        assert_ne!(s.channel_seed(0), s.channel_seed(1));
        assert_eq!(s.channel_seed(0), WidenerSettings::with_seed(7).channel_seed(0));
        assert_ne!(s.channel_seed(0), WidenerSettings::with_seed(8).channel_seed(0));
    }
}
