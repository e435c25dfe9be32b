//! Decorrelation engines behind one interface.
//!
//! The widener can decorrelate with either a sparse velvet-noise convolution
//! ([`VelvetNoise`]) or a randomized all-pass cascade ([`AllpassCascade`]).
//! [`Decorrelator`] is the tagged union the processing code holds; the live
//! `allpass_decorrelation` switch picks the variant through
//! [`DecorrelatorKind::for_allpass_flag`].

use crate::allpass::AllpassCascade;
use crate::velvet::VelvetNoise;

/// Which decorrelation engine to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecorrelatorKind {
    /// Sparse signed-impulse convolution.
    #[default]
    VelvetNoise,
    /// Random-pole all-pass cascade.
    Allpass,
}

impl DecorrelatorKind {
    /// Maps the `allpass_decorrelation` control flag to an engine.
    pub fn for_allpass_flag(use_allpass: bool) -> Self {
        if use_allpass {
            Self::Allpass
        } else {
            Self::VelvetNoise
        }
    }

    /// Dense index (0 or 1) for per-kind storage.
    pub const fn index(self) -> usize {
        match self {
            Self::VelvetNoise => 0,
            Self::Allpass => 1,
        }
    }
}

/// A prepared decorrelation engine.
#[derive(Debug, Clone)]
pub enum Decorrelator {
    /// Velvet-noise convolver.
    VelvetNoise(VelvetNoise),
    /// All-pass cascade.
    Allpass(AllpassCascade),
}

impl Decorrelator {
    /// Produces the decorrelated counterpart of one input sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        match self {
            Self::VelvetNoise(vn) => vn.process(input),
            Self::Allpass(ap) => ap.process(input),
        }
    }

    /// Clears the engine's history (sequence or pole set is kept).
    pub fn clear(&mut self) {
        match self {
            Self::VelvetNoise(vn) => vn.clear(),
            Self::Allpass(ap) => ap.clear(),
        }
    }

    /// Engine variant.
    pub fn kind(&self) -> DecorrelatorKind {
        match self {
            Self::VelvetNoise(_) => DecorrelatorKind::VelvetNoise,
            Self::Allpass(_) => DecorrelatorKind::Allpass,
        }
    }
}

impl From<VelvetNoise> for Decorrelator {
    fn from(vn: VelvetNoise) -> Self {
        Self::VelvetNoise(vn)
    }
}

impl From<AllpassCascade> for Decorrelator {
    fn from(ap: AllpassCascade) -> Self {
        Self::Allpass(ap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allpass::AllpassConfig;
    use crate::velvet::VelvetConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn flag_selects_kind() {
        assert_eq!(DecorrelatorKind::for_allpass_flag(true), DecorrelatorKind::Allpass);
        assert_eq!(
            DecorrelatorKind::for_allpass_flag(false),
            DecorrelatorKind::VelvetNoise
        );
        assert_ne!(
            DecorrelatorKind::Allpass.index(),
            DecorrelatorKind::VelvetNoise.index()
        );
    }

    #[test]
    fn both_engines_are_zero_preserving() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut engines: [Decorrelator; 2] = [
            VelvetNoise::new(VelvetConfig::default(), 48000.0, &mut rng).into(),
            AllpassCascade::new(AllpassConfig::default(), 48000.0, &mut rng).into(),
        ];
        for engine in &mut engines {
            for _ in 0..256 {
                assert_eq!(engine.process(0.0), 0.0);
            }
        }
        assert_eq!(engines[0].kind(), DecorrelatorKind::VelvetNoise);
        assert_eq!(engines[1].kind(), DecorrelatorKind::Allpass);
    }

    #[test]
    fn clear_silences_tail() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut d: Decorrelator = AllpassCascade::new(AllpassConfig::default(), 48000.0, &mut rng).into();
        d.process(1.0);
        d.clear();
        assert_eq!(d.process(0.0), 0.0);
    }
}
