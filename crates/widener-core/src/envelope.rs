//! Leaky-integrator envelope follower.
//!
//! Tracks the rectified amplitude of a signal with separate attack and
//! release time constants. The transient detector runs it over whole blocks;
//! the last envelope sample of one block is the starting point of the next.

use crate::math::{flush_denormal, ms_to_samples};
use libm::expf;

/// Default attack time for transient detection.
pub const DEFAULT_ATTACK_MS: f32 = 5.0;

/// Default release time for transient detection.
pub const DEFAULT_RELEASE_MS: f32 = 50.0;

/// Asymmetric one-pole envelope tracker.
///
/// ```text
/// env[n] = env[n-1] + g·(|x[n]| − env[n-1])
/// g = 1 − exp(−1/τ),  τ = attack or release time in samples
/// ```
///
/// The attack gain applies while `|x[n]| > env[n-1]`, the release gain otherwise.
///
/// # Example
///
/// ```rust
/// use widener_core::LeakyIntegrator;
///
/// let mut env = LeakyIntegrator::new(48000.0, 5.0, 50.0);
/// let input = [0.5f32; 256];
/// let mut envelope = [0.0f32; 256];
/// env.process_block(&input, &mut envelope);
/// assert!(envelope[255] > envelope[0]);
/// ```
#[derive(Debug, Clone)]
pub struct LeakyIntegrator {
    /// Envelope value carried into the next sample or block
    envelope: f32,
    attack_gain: f32,
    release_gain: f32,
}

impl LeakyIntegrator {
    /// Create a follower with the given attack and release times.
    pub fn new(sample_rate: f32, attack_ms: f32, release_ms: f32) -> Self {
        Self {
            envelope: 0.0,
            attack_gain: time_constant_gain(attack_ms, sample_rate),
            release_gain: time_constant_gain(release_ms, sample_rate),
        }
    }

    /// Track one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let rectified = input.abs();
        let gain = if rectified > self.envelope {
            self.attack_gain
        } else {
            self.release_gain
        };
        self.envelope = flush_denormal(self.envelope + gain * (rectified - self.envelope));
        self.envelope
    }

    /// Track a block, writing one envelope value per input sample.
    ///
    /// Processes `min(input.len(), output.len())` samples.
    pub fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        for (out, &x) in output.iter_mut().zip(input) {
            *out = self.process(x);
        }
    }

    /// Last envelope value.
    pub fn level(&self) -> f32 {
        self.envelope
    }

    /// Zero the carried envelope.
    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }
}

/// `1 − exp(−1/τ)` for a time constant in milliseconds; instant for τ ≤ 0.
fn time_constant_gain(time_ms: f32, sample_rate: f32) -> f32 {
    let samples = ms_to_samples(time_ms, sample_rate);
    if samples <= 0.0 {
        1.0
    } else {
        1.0 - expf(-1.0 / samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attack_rises_toward_input() {
        let mut env = LeakyIntegrator::new(48000.0, 1.0, 50.0);
        let mut level = 0.0;
        for _ in 0..500 {
            level = env.process(1.0);
        }
        assert!(level > 0.99, "envelope should rise, got {}", level);
    }

    #[test]
    fn test_release_is_slower_than_attack() {
        let mut env = LeakyIntegrator::new(48000.0, 5.0, 50.0);
        let rise = env.process(1.0);
        let mut env2 = LeakyIntegrator::new(48000.0, 5.0, 50.0);
        for _ in 0..48000 {
            env2.process(1.0);
        }
        let fall = 1.0 - env2.process(0.0);
        assert!(rise > fall * 5.0, "rise {} fall {}", rise, fall);
    }

    #[test]
    fn test_negative_input_is_rectified() {
        let mut env = LeakyIntegrator::new(48000.0, 5.0, 50.0);
        assert!(env.process(-0.5) > 0.0);
    }

    #[test]
    fn test_block_carry_matches_continuous() {
        let input: Vec<f32> = (0..512).map(|n| libm::sinf(n as f32 * 0.05)).collect();

        let mut whole = LeakyIntegrator::new(48000.0, 5.0, 50.0);
        let mut expected = vec![0.0; 512];
        whole.process_block(&input, &mut expected);

        let mut split = LeakyIntegrator::new(48000.0, 5.0, 50.0);
        let mut got = vec![0.0; 512];
        split.process_block(&input[..200], &mut got[..200]);
        split.process_block(&input[200..], &mut got[200..]);

        assert_eq!(expected, got);
    }

    #[test]
    fn test_release_tail_flushes_to_zero() {
        let mut env = LeakyIntegrator::new(48000.0, 5.0, 50.0);
        env.process(1.0);
        // 50 ms release: e^-(n/2400) drops below 1e-20 after about 100k samples.
        for _ in 0..200_000 {
            env.process(0.0);
        }
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn test_one_attack_time_constant() {
        // 5 ms at 48 kHz = 240 samples to reach 63% of a step.
        let mut env = LeakyIntegrator::new(48000.0, 5.0, 50.0);
        let mut level = 0.0;
        for _ in 0..240 {
            level = env.process(1.0);
        }
        assert!((level - 0.632).abs() < 0.01, "got {}", level);
    }
}
