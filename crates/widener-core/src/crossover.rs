//! Two-band crossover filterbank.
//!
//! Splits a signal into a low and a high band around a cutoff frequency. Two
//! interchangeable designs share one implementation:
//!
//! | Kind | Order | Sections | Recombination property |
//! |------|-------|----------|------------------------|
//! | [`CrossoverKind::PhasePreserving`] | 2 (Linkwitz-Riley) | 1 | `LP − HP` is a first-order all-pass, flat magnitude |
//! | [`CrossoverKind::EnergyPreserving`] | 8 (Butterworth) | 4 | `\|LP\|² + \|HP\|² = 1` |
//!
//! The phase-preserving high band comes out of the section 180° out of phase
//! with the low band; [`CrossoverFilter::process`] negates it so that the
//! two bands can simply be added back together.
//!
//! ```text
//!            ┌──────────┐
//!   x ──┬───►│ low-pass │──────────► low
//!       │    └──────────┘
//!       │    ┌──────────┐
//!       └───►│ high-pass│──(±1)────► high
//!            └──────────┘
//! ```
//!
//! Both designs use the bilinear transform pre-warped at the cutoff, so the
//! digital band edge lands exactly on the requested frequency.

use crate::biquad::{BiquadCascade, BiquadCoefficients};
use crate::math::hz_to_omega;
use core::f32::consts::PI;
use libm::{cosf, tanf};

/// Order of the energy-preserving Butterworth design.
pub const BUTTERWORTH_ORDER: usize = 8;

/// Maximum number of second-order sections any crossover design uses.
pub const MAX_SECTIONS: usize = BUTTERWORTH_ORDER / 2;

/// Lowest cutoff the designs accept; lower requests are raised to this.
pub const MIN_CUTOFF_HZ: f32 = 1.0;

/// Which crossover design a band filter uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossoverKind {
    /// 2nd-order Linkwitz-Riley split; bands sum to an all-pass.
    #[default]
    PhasePreserving,
    /// 8th-order Butterworth split; band powers sum to one.
    EnergyPreserving,
}

impl CrossoverKind {
    /// Design that matches the widener's global recombination mode.
    ///
    /// Amplitude-preserving processing needs bands that add coherently, so it
    /// uses the phase-preserving design; otherwise the Butterworth bank.
    pub fn for_amplitude_preserve(amplitude_preserve: bool) -> Self {
        if amplitude_preserve {
            Self::PhasePreserving
        } else {
            Self::EnergyPreserving
        }
    }

    /// Dense index (0 or 1) for per-kind storage.
    pub const fn index(self) -> usize {
        match self {
            Self::PhasePreserving => 0,
            Self::EnergyPreserving => 1,
        }
    }

    /// Number of second-order sections the design needs.
    pub const fn sections(self) -> usize {
        match self {
            Self::PhasePreserving => 1,
            Self::EnergyPreserving => MAX_SECTIONS,
        }
    }
}

/// Frequency band produced by a [`CrossoverFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    /// Content below the cutoff.
    Low,
    /// Content above the cutoff.
    High,
}

/// Coefficient set for one band of one design.
#[derive(Debug, Clone, Copy)]
pub struct SectionSet {
    coeffs: [BiquadCoefficients; MAX_SECTIONS],
    len: usize,
}

impl SectionSet {
    /// The designed sections in processing order.
    pub fn as_slice(&self) -> &[BiquadCoefficients] {
        &self.coeffs[..self.len]
    }
}

/// Clamps a cutoff into the range where the bilinear designs stay stable.
fn clamp_cutoff(cutoff: f32, sample_rate: f32) -> f32 {
    cutoff.clamp(MIN_CUTOFF_HZ, 0.499 * sample_rate)
}

/// 2nd-order Linkwitz-Riley section for one band.
///
/// With `K = tan(π·fc/fs)` and `D = (1 + K)²`:
///
/// ```text
/// a1 = 2(K² − 1)/D     a2 = (1 − K)²/D
/// LP: b = K²·[1, 2, 1]/D
/// HP: b =    [1, −2, 1]/D
/// ```
///
/// This is the analog prototype `ωc² / (s + ωc)²` (and `s² / (s + ωc)²`)
/// mapped through the bilinear transform with `k = ωc / tan(π·fc/fs)`,
/// divided through by `k²`.
pub fn linkwitz_coefficients(cutoff: f32, sample_rate: f32, band: Band) -> BiquadCoefficients {
    let k = tanf(PI * clamp_cutoff(cutoff, sample_rate) / sample_rate);
    let norm = 1.0 / ((1.0 + k) * (1.0 + k));
    let a1 = 2.0 * (k * k - 1.0) * norm;
    let a2 = (1.0 - k) * (1.0 - k) * norm;

    match band {
        Band::Low => {
            let b0 = k * k * norm;
            BiquadCoefficients::new(b0, 2.0 * b0, b0, a1, a2)
        }
        Band::High => BiquadCoefficients::new(norm, -2.0 * norm, norm, a1, a2),
    }
}

/// 8th-order Butterworth band as four bilinear-transformed sections.
///
/// Section `k` (1-based) realizes the analog pole pair at angle
/// `π·(2k + N − 1)/(2N)`, giving damping `d = −2·cos(angle)`. With
/// `K = tan(π·fc/fs)` and `n = 1/(1 + d·K + K²)`:
///
/// ```text
/// a1 = 2(K² − 1)·n     a2 = (1 − d·K + K²)·n
/// LP: b = K²·[1, 2, 1]·n
/// HP: b =    [1, −2, 1]·n
/// ```
pub fn butterworth_coefficients(cutoff: f32, sample_rate: f32, band: Band) -> SectionSet {
    let k = tanf(PI * clamp_cutoff(cutoff, sample_rate) / sample_rate);
    let k2 = k * k;
    let order = BUTTERWORTH_ORDER as f32;
    let mut coeffs = [BiquadCoefficients::IDENTITY; MAX_SECTIONS];

    for (i, c) in coeffs.iter_mut().enumerate() {
        let section = (i + 1) as f32;
        let angle = PI * (2.0 * section + order - 1.0) / (2.0 * order);
        let damping = -2.0 * cosf(angle);
        let norm = 1.0 / (1.0 + damping * k + k2);
        let a1 = 2.0 * (k2 - 1.0) * norm;
        let a2 = (1.0 - damping * k + k2) * norm;

        *c = match band {
            Band::Low => {
                let b0 = k2 * norm;
                BiquadCoefficients::new(b0, 2.0 * b0, b0, a1, a2)
            }
            Band::High => BiquadCoefficients::new(norm, -2.0 * norm, norm, a1, a2),
        };
    }

    SectionSet {
        coeffs,
        len: MAX_SECTIONS,
    }
}

/// Designs the sections for any kind and band.
pub fn design(kind: CrossoverKind, band: Band, cutoff: f32, sample_rate: f32) -> SectionSet {
    match kind {
        CrossoverKind::PhasePreserving => {
            let mut coeffs = [BiquadCoefficients::IDENTITY; MAX_SECTIONS];
            coeffs[0] = linkwitz_coefficients(cutoff, sample_rate, band);
            SectionSet { coeffs, len: 1 }
        }
        CrossoverKind::EnergyPreserving => butterworth_coefficients(cutoff, sample_rate, band),
    }
}

/// One band of a crossover: a cascade of designed sections plus output polarity.
#[derive(Debug, Clone)]
pub struct CrossoverFilter {
    kind: CrossoverKind,
    band: Band,
    sample_rate: f32,
    cutoff: f32,
    stages: BiquadCascade,
    polarity: f32,
}

impl CrossoverFilter {
    /// Creates a band filter with cleared history.
    pub fn new(kind: CrossoverKind, band: Band, cutoff: f32, sample_rate: f32) -> Self {
        let sections = design(kind, band, cutoff, sample_rate);
        let polarity = match (kind, band) {
            (CrossoverKind::PhasePreserving, Band::High) => -1.0,
            _ => 1.0,
        };
        Self {
            kind,
            band,
            sample_rate,
            cutoff,
            stages: BiquadCascade::from_coefficients(sections.as_slice()),
            polarity,
        }
    }

    /// Filters one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.polarity * self.stages.process(input)
    }

    /// Retunes to a new cutoff, keeping filter history.
    pub fn update(&mut self, cutoff: f32) {
        self.cutoff = cutoff;
        let sections = design(self.kind, self.band, cutoff, self.sample_rate);
        self.stages.update(sections.as_slice());
    }

    /// Clears filter history.
    pub fn clear(&mut self) {
        self.stages.clear();
    }

    /// Design kind.
    pub fn kind(&self) -> CrossoverKind {
        self.kind
    }

    /// Band this filter extracts.
    pub fn band(&self) -> Band {
        self.band
    }

    /// Current cutoff in Hz.
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Magnitude response at `freq_hz`.
    pub fn magnitude_at_hz(&self, freq_hz: f32) -> f32 {
        self.stages.magnitude_at(hz_to_omega(freq_hz, self.sample_rate))
    }
}

/// Matched low/high band pair.
#[derive(Debug, Clone)]
pub struct Crossover {
    low: CrossoverFilter,
    high: CrossoverFilter,
}

impl Crossover {
    /// Creates a crossover of the given kind.
    pub fn new(kind: CrossoverKind, cutoff: f32, sample_rate: f32) -> Self {
        Self {
            low: CrossoverFilter::new(kind, Band::Low, cutoff, sample_rate),
            high: CrossoverFilter::new(kind, Band::High, cutoff, sample_rate),
        }
    }

    /// Splits one sample into `(low, high)`.
    #[inline]
    pub fn split(&mut self, input: f32) -> (f32, f32) {
        (self.low.process(input), self.high.process(input))
    }

    /// Retunes both bands, keeping history.
    pub fn update(&mut self, cutoff: f32) {
        self.low.update(cutoff);
        self.high.update(cutoff);
    }

    /// Clears both bands.
    pub fn clear(&mut self) {
        self.low.clear();
        self.high.clear();
    }

    /// Design kind.
    pub fn kind(&self) -> CrossoverKind {
        self.low.kind()
    }

    /// Current cutoff in Hz.
    pub fn cutoff(&self) -> f32 {
        self.low.cutoff()
    }

    /// Low band filter.
    pub fn low(&self) -> &CrossoverFilter {
        &self.low
    }

    /// High band filter.
    pub fn high(&self) -> &CrossoverFilter {
        &self.high
    }
}
