//! Offline optimisation of velvet-noise sequences.
//!
//! A random velvet sequence colours the signal it decorrelates: its magnitude
//! response ripples by a few dB. [`optimize_sequence`] moves impulses and
//! adjusts their gains to flatten the third-octave smoothed response, which is
//! the cost [`coloration`] measures:
//!
//! ```text
//! S(f)  = mean of 20·log10|H(f')| over f' in [f/2^(1/6), f·2^(1/6)]
//! cost  = rms(S − mean(S))      f log-spaced from 20 Hz to Nyquist
//! ```
//!
//! The first impulse is fixed. Every other impulse stays strictly between its
//! neighbours, keeps its sign, and keeps its gain within `max_gain_deviation`
//! of the starting value. The search is a deterministic pattern search, so a
//! given sequence always optimises to the same result.

use std::f64::consts::PI;

use widener_core::velvet::normalize_energy;

/// Lowest frequency of the cost's frequency axis in Hz.
pub const MIN_FREQ_HZ: f32 = 20.0;

/// Floor applied to the unsmoothed magnitude response in dB.
const FLOOR_DB: f64 = -120.0;

/// Relative gain step below which the search stops refining.
const MIN_GAIN_STEP: f32 = 1e-3;

/// Search settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizeConfig {
    /// Number of log-spaced frequencies the cost is evaluated at.
    pub freq_bins: usize,
    /// Largest factor by which a gain may move away from its starting value.
    pub max_gain_deviation: f32,
    /// Upper limit on search sweeps over the sequence.
    pub max_iterations: usize,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            freq_bins: 256,
            max_gain_deviation: 2.0,
            max_iterations: 60,
        }
    }
}

/// Result of [`optimize_sequence`].
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedSequence {
    /// Impulse positions, strictly increasing and below the line length.
    pub positions: Vec<usize>,
    /// Signed impulse gains, normalised to unit energy.
    pub values: Vec<f32>,
    /// Coloration of the input sequence in dB.
    pub initial_cost: f32,
    /// Coloration of the optimised sequence in dB.
    pub cost: f32,
    /// Sweeps run before the search converged or hit the limit.
    pub iterations: usize,
}

/// Evaluates the coloration cost with preallocated scratch buffers.
struct Coloration {
    omegas: Vec<f64>,
    half_width: usize,
    db: Vec<f64>,
    smoothed: Vec<f64>,
}

impl Coloration {
    fn new(sample_rate: f32, freq_bins: usize) -> Self {
        let bins = freq_bins.max(2);
        let sample_rate = f64::from(sample_rate);
        let nyquist = sample_rate * 0.5;
        let start = f64::from(MIN_FREQ_HZ).min(nyquist * 0.5);
        let ratio = (nyquist / start).powf(1.0 / (bins - 1) as f64);
        let omegas = (0..bins)
            .map(|k| 2.0 * PI * start * ratio.powi(k as i32) / sample_rate)
            .collect();
        // Bins within a sixth of an octave on either side.
        let half_width = ((2.0f64.ln() / 6.0) / ratio.ln() + 1e-9).floor() as usize;

        Self {
            omegas,
            half_width,
            db: vec![0.0; bins],
            smoothed: vec![0.0; bins],
        }
    }

    fn evaluate(&mut self, positions: &[usize], values: &[f32]) -> f32 {
        if positions.is_empty() {
            return 0.0;
        }

        for (db, &omega) in self.db.iter_mut().zip(&self.omegas) {
            let (mut re, mut im) = (0.0f64, 0.0f64);
            for (&position, &value) in positions.iter().zip(values) {
                let phase = omega * position as f64;
                re += f64::from(value) * phase.cos();
                im -= f64::from(value) * phase.sin();
            }
            *db = (20.0 * re.hypot(im).log10()).max(FLOOR_DB);
        }

        let n = self.db.len();
        for k in 0..n {
            let lo = k.saturating_sub(self.half_width);
            let hi = (k + self.half_width).min(n - 1);
            let window = &self.db[lo..=hi];
            self.smoothed[k] = window.iter().sum::<f64>() / window.len() as f64;
        }

        let mean = self.smoothed.iter().sum::<f64>() / n as f64;
        let variance = self.smoothed.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>() / n as f64;
        variance.sqrt() as f32
    }
}

/// RMS deviation in dB of the third-octave smoothed magnitude response of a
/// sparse sequence from its own mean. Zero for a flat response.
pub fn coloration(positions: &[usize], values: &[f32], sample_rate: f32, freq_bins: usize) -> f32 {
    Coloration::new(sample_rate, freq_bins).evaluate(positions, values)
}

/// Flattens the magnitude response of a sparse sequence on a line of
/// `length` samples.
pub fn optimize_sequence(
    positions: &[usize],
    values: &[f32],
    length: usize,
    sample_rate: f32,
    config: &OptimizeConfig,
) -> OptimizedSequence {
    let n = positions.len().min(values.len());
    let mut positions = positions[..n].to_vec();
    let mut values = values[..n].to_vec();
    let mut cost_fn = Coloration::new(sample_rate, config.freq_bins);
    let initial_cost = cost_fn.evaluate(&positions, &values);

    if n < 2 || length == 0 {
        return OptimizedSequence {
            positions,
            values,
            initial_cost,
            cost: initial_cost,
            iterations: 0,
        };
    }

    let deviation = config.max_gain_deviation.max(1.0);
    let gain_bounds: Vec<(f32, f32)> = values
        .iter()
        .map(|v| (v.abs() / deviation, v.abs() * deviation))
        .collect();
    let signs: Vec<f32> = values.iter().map(|&v| if v < 0.0 { -1.0 } else { 1.0 }).collect();

    let mut position_step = (length / n / 4).max(1);
    let mut gain_step = 0.25f32;
    let mut cost = initial_cost;
    let mut iterations = 0;

    while iterations < config.max_iterations {
        iterations += 1;
        let mut improved = false;

        for i in 1..n {
            let lower = positions[i - 1] + 1;
            let upper = if i + 1 < n {
                positions[i + 1].saturating_sub(1)
            } else {
                length - 1
            };
            let current = positions[i];
            let moves = [current.checked_sub(position_step), current.checked_add(position_step)];
            for candidate in moves.into_iter().flatten() {
                if candidate < lower || candidate > upper {
                    continue;
                }
                positions[i] = candidate;
                let trial = cost_fn.evaluate(&positions, &values);
                if trial < cost {
                    cost = trial;
                    improved = true;
                    break;
                }
                positions[i] = current;
            }

            let magnitude = values[i].abs();
            if !magnitude.is_normal() {
                continue;
            }
            let (min_gain, max_gain) = gain_bounds[i];
            for factor in [1.0 + gain_step, 1.0 / (1.0 + gain_step)] {
                let candidate = (magnitude * factor).clamp(min_gain, max_gain);
                if candidate == magnitude {
                    continue;
                }
                values[i] = signs[i] * candidate;
                let trial = cost_fn.evaluate(&positions, &values);
                if trial < cost {
                    cost = trial;
                    improved = true;
                    break;
                }
                values[i] = signs[i] * magnitude;
            }
        }

        if !improved {
            if position_step == 1 && gain_step < MIN_GAIN_STEP {
                break;
            }
            position_step = (position_step / 2).max(1);
            gain_step *= 0.5;
        }
    }

    normalize_energy(&mut values);
    let cost = cost_fn.evaluate(&positions, &values);

    #[cfg(feature = "tracing")]
    tracing::debug!(initial_cost, cost, iterations, impulses = n, "velvet sequence optimised");

    OptimizedSequence {
        positions,
        values,
        initial_cost,
        cost,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use widener_core::{VelvetConfig, VelvetNoise, line_samples};

    const SR: f32 = 48000.0;

    fn random_velvet(seed: u64) -> VelvetNoise {
        VelvetNoise::new(VelvetConfig::default(), SR, &mut ChaCha8Rng::seed_from_u64(seed))
    }

    #[test]
    fn single_impulse_has_no_coloration() {
        assert!(coloration(&[3], &[1.0], SR, 256) < 1e-6);
        assert_eq!(coloration(&[], &[], SR, 256), 0.0);
    }

    #[test]
    fn comb_is_coloured() {
        // Two equal impulses form a comb with deep notches.
        let cost = coloration(&[0, 24], &[0.7, 0.7], SR, 256);
        assert!(cost > 1.0, "comb coloration {cost}");
    }

    #[test]
    fn optimisation_flattens_the_response() {
        let config = OptimizeConfig::default();
        let length = line_samples(VelvetConfig::default().length_ms, SR);
        for seed in [0, 1, 2] {
            let velvet = random_velvet(seed);
            let result = optimize_sequence(velvet.positions(), velvet.values(), length, SR, &config);

            let before = coloration(velvet.positions(), velvet.values(), SR, config.freq_bins);
            assert!((result.initial_cost - before).abs() < 1e-6);
            assert!(
                result.cost < result.initial_cost,
                "seed {seed}: {} -> {}",
                result.initial_cost,
                result.cost
            );
            assert!(result.iterations >= 1 && result.iterations <= config.max_iterations);
        }
    }

    #[test]
    fn optimised_sequence_respects_bounds() {
        let config = OptimizeConfig::default();
        let velvet = random_velvet(5);
        let length = line_samples(VelvetConfig::default().length_ms, SR);
        let result = optimize_sequence(velvet.positions(), velvet.values(), length, SR, &config);

        assert_eq!(result.positions.len(), velvet.len());
        assert_eq!(result.positions[0], velvet.positions()[0]);
        assert!(result.positions.windows(2).all(|w| w[0] < w[1]));
        assert!(result.positions.iter().all(|&p| p < length));

        let energy: f32 = result.values.iter().map(|v| v * v).sum();
        assert!((energy - 1.0).abs() < 1e-4, "energy {energy}");
        for (new, old) in result.values.iter().zip(velvet.values()) {
            assert_eq!(new.signum(), old.signum());
        }
    }

    #[test]
    fn optimisation_is_deterministic() {
        let config = OptimizeConfig {
            max_iterations: 10,
            ..OptimizeConfig::default()
        };
        let velvet = random_velvet(9);
        let a = optimize_sequence(velvet.positions(), velvet.values(), 720, SR, &config);
        let b = optimize_sequence(velvet.positions(), velvet.values(), 720, SR, &config);
        assert_eq!(a, b);
    }

    #[test]
    fn too_short_sequences_are_returned_unchanged() {
        let result = optimize_sequence(&[4], &[1.0], 16, SR, &OptimizeConfig::default());
        assert_eq!(result.positions, vec![4]);
        assert_eq!(result.values, vec![1.0]);
        assert_eq!(result.iterations, 0);
    }
}
