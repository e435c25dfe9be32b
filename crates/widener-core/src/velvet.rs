//! Velvet-noise decorrelator.
//!
//! A velvet-noise sequence is a sparse train of signed impulses. Convolving a
//! channel with it smears the signal in time just enough to decorrelate it
//! from the other channel, at the cost of one multiply-add per impulse.
//!
//! # Sequence generation
//!
//! For a line of `L` samples and a grid density of `D` impulses per second:
//!
//! ```text
//! spacing    = fs / D
//! seq_length = floor(L / spacing)
//! sign[i]    = ±1 (fair coin)
//! value[i]   = sign[i] · exp(−ρ·i),   ρ = (decay_dB / 20)·ln(10) / seq_length
//! ```
//!
//! Positions are either evenly spaced with jitter
//! (`round(i·spacing + r·(spacing − 1))`) or, with logarithmic placement,
//! spread over slots that grow geometrically (first to last slot ratio 100)
//! so the impulses crowd the start of the line like early reflections.
//! The values are finally scaled to unit energy (`Σ value² = 1`) so the
//! decorrelated copy is as loud as its input.
//!
//! # Processing
//!
//! ```text
//! x ──► DelayLine ──► Σ value[i] · tap(position[i]) ──► y
//! ```

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use crate::delay::DelayLine;
use crate::error::SequenceParseError;
use crate::math::ms_to_samples;
use alloc::vec::Vec;
use core::f32::consts::LN_10;
use libm::{expf, floorf, powf, roundf, sqrtf};
use rand::Rng;

/// Ratio between the last and first slot widths in logarithmic placement.
const LOG_SPACING_RATIO: f32 = 100.0;

/// Generation settings for a velvet-noise sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelvetConfig {
    /// Length of the convolution line in milliseconds.
    pub length_ms: f32,
    /// Impulses per second.
    pub grid_density: f32,
    /// Magnitude decay over the whole sequence in dB.
    pub decay_db: f32,
    /// Crowd impulses toward the start of the line.
    pub log_distribution: bool,
}

impl Default for VelvetConfig {
    fn default() -> Self {
        Self {
            length_ms: 15.0,
            grid_density: 1000.0,
            decay_db: 10.0,
            log_distribution: true,
        }
    }
}

/// Line length in samples for a configuration.
pub fn line_samples(length_ms: f32, sample_rate: f32) -> usize {
    floorf(ms_to_samples(length_ms.max(0.0), sample_rate)) as usize
}

/// Generates impulse positions and values into the given buffers.
///
/// Buffers are cleared first. Zero (or non-finite) density and lines shorter
/// than one grid period produce an empty sequence.
pub fn generate_sequence<R: Rng + ?Sized>(
    config: &VelvetConfig,
    sample_rate: f32,
    rng: &mut R,
    positions: &mut Vec<usize>,
    values: &mut Vec<f32>,
) {
    positions.clear();
    values.clear();

    let length = line_samples(config.length_ms, sample_rate);
    if length == 0 || !config.grid_density.is_finite() || config.grid_density <= 0.0 {
        return;
    }

    // Density above the sample rate would need sub-sample spacing.
    let spacing = sample_rate / config.grid_density.min(sample_rate);
    let seq_length = floorf(length as f32 / spacing) as usize;
    if seq_length == 0 {
        return;
    }

    let decay_rate = config.decay_db / 20.0 * LN_10 / seq_length as f32;

    // Logarithmic slots: width_i ∝ 100^(i / seq_length), scaled to fill the line.
    let slot_scale = if config.log_distribution {
        let total: f32 = (0..seq_length)
            .map(|i| powf(LOG_SPACING_RATIO, i as f32 / seq_length as f32))
            .sum();
        length as f32 / total
    } else {
        0.0
    };

    let mut slot_start = 0.0f32;
    for i in 0..seq_length {
        let sign_draw: f32 = rng.random();
        let jitter: f32 = rng.random();

        let position = if config.log_distribution {
            let slot = slot_scale * powf(LOG_SPACING_RATIO, i as f32 / seq_length as f32);
            let p = roundf(slot_start + jitter * (slot - 1.0).max(0.0));
            slot_start += slot;
            p
        } else {
            roundf(i as f32 * spacing + jitter * (spacing - 1.0))
        };

        let sign = if sign_draw < 0.5 { -1.0 } else { 1.0 };
        positions.push((position.max(0.0) as usize).min(length - 1));
        values.push(sign * expf(-decay_rate * i as f32));
    }

    normalize_energy(values);
}

/// Scales `values` so their squares sum to one. Leaves all-zero input untouched.
pub fn normalize_energy(values: &mut [f32]) {
    let energy: f32 = values.iter().map(|v| v * v).sum();
    if energy > 0.0 {
        let scale = 1.0 / sqrtf(energy);
        for v in values.iter_mut() {
            *v *= scale;
        }
    }
}

/// Parses one line of a precomputed table.
///
/// Tokens are whitespace-separated magnitudes; every non-zero entry becomes an
/// impulse at its token index. Returns `(positions, values, line_length)`.
pub fn parse_sequence(line: &str) -> Result<(Vec<usize>, Vec<f32>, usize), SequenceParseError> {
    let mut positions = Vec::new();
    let mut values = Vec::new();
    let mut count = 0;

    for (index, token) in line.split_whitespace().enumerate() {
        let value: f32 = token
            .parse()
            .map_err(|_| SequenceParseError::InvalidNumber { index })?;
        if value != 0.0 {
            positions.push(index);
            values.push(value);
        }
        count = index + 1;
    }

    if count == 0 {
        return Err(SequenceParseError::Empty);
    }
    Ok((positions, values, count))
}

/// Returns the sequence line for `channel` from a multi-channel table.
///
/// Blank lines are skipped, so channel `n` is the `n`-th non-empty line.
pub fn table_line(table: &str, channel: usize) -> Result<&str, SequenceParseError> {
    table
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .nth(channel)
        .ok_or(SequenceParseError::MissingChannel { channel })
}

/// Sparse convolution decorrelator driven by a velvet-noise sequence.
#[derive(Debug, Clone)]
pub struct VelvetNoise {
    config: VelvetConfig,
    sample_rate: f32,
    positions: Vec<usize>,
    values: Vec<f32>,
    line: DelayLine,
}

impl VelvetNoise {
    /// Generates a random sequence for `config` at `sample_rate`.
    pub fn new<R: Rng + ?Sized>(config: VelvetConfig, sample_rate: f32, rng: &mut R) -> Self {
        let length = line_samples(config.length_ms, sample_rate);
        // The sequence never exceeds one impulse per sample, so reserving the
        // line length lets `update` regenerate in place.
        let mut positions = Vec::with_capacity(length);
        let mut values = Vec::with_capacity(length);
        generate_sequence(&config, sample_rate, rng, &mut positions, &mut values);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            impulses = positions.len(),
            length_samples = length,
            density = config.grid_density,
            "velvet sequence generated"
        );

        Self {
            config,
            sample_rate,
            positions,
            values,
            // Zero pre-delay: a tap at position 0 is the current input.
            line: DelayLine::new(length, 0),
        }
    }

    /// Builds a decorrelator from one line of a precomputed table.
    ///
    /// Magnitudes are used as given; curated sequences carry their own scaling.
    pub fn from_table_line(line: &str, sample_rate: f32) -> Result<Self, SequenceParseError> {
        let (positions, values, length) = parse_sequence(line)?;
        Ok(Self {
            config: VelvetConfig {
                length_ms: length as f32 * 1e3 / sample_rate,
                grid_density: positions.len() as f32 * sample_rate / length as f32,
                decay_db: 0.0,
                log_distribution: false,
            },
            sample_rate,
            positions,
            values,
            line: DelayLine::new(length, 0),
        })
    }

    /// Regenerates the whole sequence for a new grid density.
    ///
    /// Reuses the storage reserved at construction and keeps the line contents.
    pub fn update<R: Rng + ?Sized>(&mut self, grid_density: f32, rng: &mut R) {
        self.config.grid_density = grid_density;
        generate_sequence(
            &self.config,
            self.sample_rate,
            rng,
            &mut self.positions,
            &mut self.values,
        );
    }

    /// Convolves one sample with the sequence.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.line.push(input);
        let line = &self.line;
        self.positions
            .iter()
            .zip(&self.values)
            .map(|(&position, &value)| value * line.tap(position))
            .sum()
    }

    /// Zeroes the convolution history.
    pub fn clear(&mut self) {
        self.line.clear();
    }

    /// Generation settings (reconstructed for table-built sequences).
    pub fn config(&self) -> &VelvetConfig {
        &self.config
    }

    /// Impulse offsets into the line, in sequence order.
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// Signed impulse values, in sequence order.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Sum of squared impulse values.
    pub fn energy(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum()
    }

    /// Number of impulses.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True if the sequence has no impulses (output is silent).
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
