//! Width panning and band recombination.
//!
//! Each band of each channel has a [`Panner`] that blends the direct band
//! signal with its decorrelated counterpart on a constant-power law:
//!
//! ```text
//! θ   = width/100 · π/2
//! out = sin θ · decorrelated + cos θ · direct
//! ```
//!
//! Width 0 is the direct signal exactly, width 100 the decorrelated signal
//! exactly, and `sin²θ + cos²θ = 1` everywhere in between.
//!
//! After panning, the bands are summed according to a [`Recombination`] law:
//!
//! | Law | Correction | Tracks |
//! |-----|------------|--------|
//! | `AmplitudePreserving` | per band, [`LevelCompensator`] matches the decorrelated band's mean absolute level to the direct band's | amplitude envelope |
//! | `EnergyPreserving` | [`EnergyNormalizer`] scales the band sum by `sqrt(Σ_k Σ y_k²) / sqrt(Σ (Σ_k y_k)²)` | loudness |
//!
//! Corrective gains are computed once per block, smoothed across blocks and
//! limited to ±[`MAX_COMPENSATION_DB`].

use crate::math::db_to_linear;
use crate::param::SmoothedParam;
use core::f32::consts::FRAC_PI_2;
use libm::{cosf, sinf, sqrtf};

/// Limit on any corrective gain, in dB.
pub const MAX_COMPENSATION_DB: f32 = 12.0;

/// Level below which a measurement is treated as silence and ignored.
const SILENCE_FLOOR: f32 = 1e-9;

/// Constant-power width panner.
///
/// # Example
///
/// ```rust
/// use widener_core::Panner;
///
/// let mut p = Panner::new(0.0);
/// assert_eq!(p.process(0.8, 0.3), 0.3);
/// p.update(100.0);
/// assert_eq!(p.process(0.8, 0.3), 0.8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Panner {
    angle: f32,
    sin: f32,
    cos: f32,
}

impl Panner {
    /// Creates a panner at `width` percent.
    pub fn new(width: f32) -> Self {
        let mut panner = Self {
            angle: 0.0,
            sin: 0.0,
            cos: 1.0,
        };
        panner.update(width);
        panner
    }

    /// Recomputes the angle from an (already smoothed) width in percent.
    pub fn update(&mut self, width: f32) {
        let width = width.clamp(0.0, 100.0);
        self.angle = width / 100.0 * FRAC_PI_2;
        // The endpoints are exact so width 0 and 100 are bit-transparent.
        (self.sin, self.cos) = if width <= 0.0 {
            (0.0, 1.0)
        } else if width >= 100.0 {
            (1.0, 0.0)
        } else {
            (sinf(self.angle), cosf(self.angle))
        };
    }

    /// Blends one decorrelated/direct sample pair.
    #[inline]
    pub fn process(&self, decorrelated: f32, direct: f32) -> f32 {
        self.sin * decorrelated + self.cos * direct
    }

    /// Pan angle θ in radians.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// `(decorrelated_gain, direct_gain)`, i.e. `(sin θ, cos θ)`.
    pub fn gains(&self) -> (f32, f32) {
        (self.sin, self.cos)
    }
}

impl Default for Panner {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// How panned bands are recombined into the channel output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Recombination {
    /// Per-band level matching, then a plain sum.
    #[default]
    AmplitudePreserving,
    /// Plain sum, then block energy normalisation.
    EnergyPreserving,
}

impl Recombination {
    /// Maps the `amplitude_preserve` control flag to a law.
    pub fn for_amplitude_preserve(amplitude_preserve: bool) -> Self {
        if amplitude_preserve {
            Self::AmplitudePreserving
        } else {
            Self::EnergyPreserving
        }
    }
}

fn gain_limits() -> (f32, f32) {
    (db_to_linear(-MAX_COMPENSATION_DB), db_to_linear(MAX_COMPENSATION_DB))
}

/// Matches a decorrelated band's level to its direct band.
///
/// Once per block, measures the mean absolute level of both signals, sets
/// the smoothed gain's target to `direct / decorrelated` and scales the
/// decorrelated block by the advanced gain. Silent blocks keep the previous
/// target.
#[derive(Debug, Clone)]
pub struct LevelCompensator {
    gain: SmoothedParam,
    min_gain: f32,
    max_gain: f32,
}

impl LevelCompensator {
    /// Creates a unity-gain compensator advanced `update_rate` times per second.
    pub fn new(update_rate: f32, smoothing_time_ms: f32) -> Self {
        let (min_gain, max_gain) = gain_limits();
        Self {
            gain: SmoothedParam::with_config(1.0, update_rate, smoothing_time_ms),
            min_gain,
            max_gain,
        }
    }

    /// Levels `decorrelated` against `direct` in place; returns the applied gain.
    pub fn process_block(&mut self, direct: &[f32], decorrelated: &mut [f32]) -> f32 {
        let len = direct.len().min(decorrelated.len());
        if len > 0 {
            let direct_level = mean_abs(&direct[..len]);
            let decorrelated_level = mean_abs(&decorrelated[..len]);
            if decorrelated_level > SILENCE_FLOOR && direct_level > SILENCE_FLOOR {
                let ratio = direct_level / decorrelated_level;
                self.gain.set_target(ratio.clamp(self.min_gain, self.max_gain));
            }
        }

        let g = self.gain.advance();
        for x in &mut decorrelated[..len] {
            *x *= g;
        }
        g
    }

    /// Current gain.
    pub fn gain(&self) -> f32 {
        self.gain.get()
    }

    /// Returns to unity gain.
    pub fn reset(&mut self) {
        self.gain.set_immediate(1.0);
    }
}

/// Restores the summed energy of independently panned bands.
#[derive(Debug, Clone)]
pub struct EnergyNormalizer {
    gain: SmoothedParam,
    min_gain: f32,
    max_gain: f32,
}

impl EnergyNormalizer {
    /// Creates a unity-gain normalizer advanced `update_rate` times per second.
    pub fn new(update_rate: f32, smoothing_time_ms: f32) -> Self {
        let (min_gain, max_gain) = gain_limits();
        Self {
            gain: SmoothedParam::with_config(1.0, update_rate, smoothing_time_ms),
            min_gain,
            max_gain,
        }
    }

    /// Writes `low + high` to `output`, scaled so its energy matches the sum
    /// of the band energies. Returns the applied gain.
    pub fn process_block(&mut self, low: &[f32], high: &[f32], output: &mut [f32]) -> f32 {
        let len = low.len().min(high.len()).min(output.len());
        let mut band_energy = 0.0f32;
        let mut sum_energy = 0.0f32;
        for i in 0..len {
            let (l, h) = (low[i], high[i]);
            let y = l + h;
            band_energy += l * l + h * h;
            sum_energy += y * y;
            output[i] = y;
        }

        if band_energy > SILENCE_FLOOR && sum_energy > SILENCE_FLOOR {
            let ratio = sqrtf(band_energy) / sqrtf(sum_energy);
            self.gain.set_target(ratio.clamp(self.min_gain, self.max_gain));
        }

        let g = self.gain.advance();
        for y in &mut output[..len] {
            *y *= g;
        }
        g
    }

    /// Current gain.
    pub fn gain(&self) -> f32 {
        self.gain.get()
    }

    /// Returns to unity gain.
    pub fn reset(&mut self) {
        self.gain.set_immediate(1.0);
    }
}

fn mean_abs(block: &[f32]) -> f32 {
    block.iter().map(|x| x.abs()).sum::<f32>() / block.len() as f32
}
