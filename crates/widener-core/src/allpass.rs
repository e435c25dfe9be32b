//! Randomized all-pass cascade decorrelator.
//!
//! A long chain of second-order all-pass sections scrambles phase without
//! touching the magnitude spectrum. Each section's pole pair is drawn once:
//!
//! - radius uniform in `[0.5, r_max]`, where `r_max = (1 − d)/(1 + d)` with
//!   `d` the maximum group delay in seconds, bounding how long any one
//!   section can ring;
//! - angle uniform in `[0, 2π)`, then warped toward low frequencies through
//!   the first-order all-pass map
//!   `λ = arg((w + e^{jθ}) / (1 + w·e^{jθ}))` with the ERB-rate warp factor
//!   `w = 0.7464·sqrt(2/π·atan(0.1418·fs)) + 0.03237`.
//!
//! Section coefficients follow from the pole: `a1 = −2r·cos λ`, `a2 = r²`,
//! numerator = reversed denominator.
//!
//! The generator is supplied by the caller, so a seeded
//! [`ChaCha8Rng`](rand_chacha::ChaCha8Rng) gives the same pole set every run.

use crate::biquad::{Biquad, BiquadCascade, BiquadCoefficients};
use core::f32::consts::{PI, TAU};
use libm::{atan2f, atanf, cosf, sinf, sqrtf};
use rand::Rng;

/// Lower bound of the pole radius distribution.
pub const MIN_POLE_RADIUS: f32 = 0.5;

/// Construction settings for an [`AllpassCascade`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllpassConfig {
    /// Number of second-order sections.
    pub sections: usize,
    /// Maximum group delay target in milliseconds.
    pub max_group_delay_ms: f32,
}

impl Default for AllpassConfig {
    fn default() -> Self {
        Self {
            sections: 200,
            max_group_delay_ms: 15.0,
        }
    }
}

/// ERB-rate frequency warping factor for a sample rate in Hz.
pub fn warp_factor(sample_rate: f32) -> f32 {
    0.7464 * sqrtf(2.0 / PI * atanf(0.1418 * sample_rate)) + 0.03237
}

/// Warps a pole angle through the first-order all-pass map with factor `w`.
///
/// Returns `arg((w + e^{jθ}) / (1 + w·e^{jθ}))`, i.e. the imaginary part of
/// the complex logarithm of that unit-modulus ratio.
pub fn warp_pole_angle(angle: f32, w: f32) -> f32 {
    let (s, c) = (sinf(angle), cosf(angle));
    let (num_re, num_im) = (w + c, s);
    let (den_re, den_im) = (1.0 + w * c, w * s);
    // arg(num / den) = arg(num · conj(den))
    let re = num_re * den_re + num_im * den_im;
    let im = num_im * den_re - num_re * den_im;
    atan2f(im, re)
}

/// Upper bound for pole radii given a maximum group delay in milliseconds.
pub fn radius_bound(max_group_delay_ms: f32) -> f32 {
    let d = max_group_delay_ms * 1e-3;
    (1.0 - d) / (1.0 + d)
}

/// Phase-scrambling cascade of randomly placed all-pass sections.
#[derive(Debug, Clone)]
pub struct AllpassCascade {
    config: AllpassConfig,
    cascade: BiquadCascade,
    radius_bound: f32,
}

impl AllpassCascade {
    /// Draws a pole set from `rng` and builds the cascade.
    pub fn new<R: Rng + ?Sized>(config: AllpassConfig, sample_rate: f32, rng: &mut R) -> Self {
        let w = warp_factor(sample_rate);
        let upper = radius_bound(config.max_group_delay_ms).max(MIN_POLE_RADIUS);

        let mut cascade = BiquadCascade::new(config.sections);
        for section in cascade.sections_mut() {
            let radius = if upper > MIN_POLE_RADIUS {
                rng.random_range(MIN_POLE_RADIUS..upper)
            } else {
                MIN_POLE_RADIUS
            };
            let angle = warp_pole_angle(rng.random_range(0.0..TAU), w);
            section.initialize(BiquadCoefficients::allpass(radius, angle));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            sections = config.sections,
            warp = w,
            radius_bound = upper,
            "all-pass cascade built"
        );

        Self {
            config,
            cascade,
            radius_bound: upper,
        }
    }

    /// Runs one sample through every section in series.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.cascade.process(input)
    }

    /// Clears every section's history.
    pub fn clear(&mut self) {
        self.cascade.clear();
    }

    /// Construction settings.
    pub fn config(&self) -> &AllpassConfig {
        &self.config
    }

    /// The underlying section chain.
    pub fn cascade(&self) -> &BiquadCascade {
        &self.cascade
    }

    /// The all-pass sections in processing order.
    pub fn sections(&self) -> &[Biquad] {
        self.cascade.sections()
    }

    /// Largest pole radius any section was allowed to draw.
    pub fn group_delay_bound(&self) -> f32 {
        self.radius_bound
    }

    /// Magnitude response of the cascade at `omega` radians/sample.
    pub fn magnitude_at(&self, omega: f32) -> f32 {
        self.cascade.magnitude_at(omega)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const SR: f32 = 48000.0;

    #[test]
    fn warp_factor_near_point_seven_eight() {
        let w = warp_factor(SR);
        assert!((w - 0.7788).abs() < 1e-3, "warp {}", w);
    }

    #[test]
    fn warping_keeps_endpoints_and_compresses_low_angles() {
        let w = warp_factor(SR);
        assert!(warp_pole_angle(0.0, w).abs() < 1e-6);
        assert!((warp_pole_angle(PI * 0.999, w).abs() - PI * 0.999).abs() < 0.05);
        // Positive warp maps low angles lower still.
        let warped = warp_pole_angle(0.5, w);
        assert!(warped > 0.0 && warped < 0.5, "warped {}", warped);
    }

    #[test]
    fn radius_bound_for_fifteen_ms() {
        let r = radius_bound(15.0);
        assert!((r - 0.985 / 1.015).abs() < 1e-6);
    }

    #[test]
    fn poles_lie_inside_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let ap = AllpassCascade::new(AllpassConfig::default(), SR, &mut rng);
        let bound = ap.group_delay_bound();
        assert_eq!(bound, radius_bound(15.0));
        assert_eq!(ap.sections().len(), 200);
        for section in ap.sections() {
            let c = section.coefficients();
            let radius = sqrtf(c.a2);
            assert!(radius >= MIN_POLE_RADIUS - 1e-6 && radius <= bound + 1e-6, "radius {}", radius);
            // Numerator is the reversed denominator.
            assert_eq!(c.b0, c.a2);
            assert_eq!(c.b1, c.a1);
            assert_eq!(c.b2, 1.0);
        }
    }

    #[test]
    fn cascade_magnitude_is_flat() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let ap = AllpassCascade::new(AllpassConfig::default(), SR, &mut rng);
        for i in 1..128 {
            let omega = PI * i as f32 / 128.0;
            let mag = ap.magnitude_at(omega);
            assert!((mag - 1.0).abs() < 1e-2, "|H| at {} = {}", omega, mag);
        }
    }

    #[test]
    fn impulse_response_has_unit_energy() {
        let mut rng = ChaCha8Rng::seed_from_u64(15);
        let config = AllpassConfig {
            sections: 16,
            max_group_delay_ms: 15.0,
        };
        let mut ap = AllpassCascade::new(config, SR, &mut rng);
        let mut energy = 0.0f64;
        for n in 0..48000 {
            let y = ap.process(if n == 0 { 1.0 } else { 0.0 });
            energy += f64::from(y * y);
        }
        assert!((energy - 1.0).abs() < 1e-3, "energy {}", energy);
    }

    #[test]
    fn seeded_construction_is_reproducible() {
        let a = AllpassCascade::new(AllpassConfig::default(), SR, &mut ChaCha8Rng::seed_from_u64(1));
        let b = AllpassCascade::new(AllpassConfig::default(), SR, &mut ChaCha8Rng::seed_from_u64(1));
        for (x, y) in a.cascade().sections().iter().zip(b.cascade().sections()) {
            assert_eq!(x.coefficients(), y.coefficients());
        }
    }

    #[test]
    fn group_delay_bound_follows_config() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let short = AllpassConfig {
            sections: 8,
            max_group_delay_ms: 5.0,
        };
        let ap = AllpassCascade::new(short, SR, &mut rng);
        assert!((ap.group_delay_bound() - 0.995 / 1.005).abs() < 1e-6);
        assert_eq!(ap.sections().len(), 8);
        for section in ap.sections() {
            assert!(sqrtf(section.coefficients().a2) <= ap.group_delay_bound() + 1e-6);
        }

        // A bound below the minimum radius pins every pole to it.
        let long = AllpassConfig {
            sections: 4,
            max_group_delay_ms: 500.0,
        };
        let ap = AllpassCascade::new(long, SR, &mut rng);
        assert_eq!(ap.group_delay_bound(), MIN_POLE_RADIUS);
        for section in ap.sections() {
            assert!((sqrtf(section.coefficients().a2) - MIN_POLE_RADIUS).abs() < 1e-6);
        }
    }

    #[test]
    fn zero_sections_pass_through() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let config = AllpassConfig {
            sections: 0,
            max_group_delay_ms: 15.0,
        };
        let mut ap = AllpassCascade::new(config, SR, &mut rng);
        assert_eq!(ap.process(0.3), 0.3);
    }
}
