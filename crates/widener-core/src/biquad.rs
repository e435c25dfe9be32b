//! Biquad (bi-quadratic) filter section and series cascade.
//!
//! [`Biquad`] is the atomic DSP unit of the widener: every crossover band and
//! every all-pass decorrelator stage is one or more of these sections.
//! [`BiquadCascade`] chains sections in series to realize a higher-order
//! transfer function as a product of second-order ones.
//!
//! Coefficients are normalized (`a0 = 1`) and carried as a
//! [`BiquadCoefficients`] value so that filter designs can be computed on the
//! stack and handed to a section in one move.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use crate::math::flush_denormal;
use alloc::vec::Vec;
use libm::{cos, cosf, sin, sqrt};

/// Normalized second-order transfer function coefficients.
///
/// ```text
///          b0 + b1·z⁻¹ + b2·z⁻²
/// H(z) = ------------------------
///          1 + a1·z⁻¹ + a2·z⁻²
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    /// Feedforward coefficient for x[n].
    pub b0: f32,
    /// Feedforward coefficient for x[n-1].
    pub b1: f32,
    /// Feedforward coefficient for x[n-2].
    pub b2: f32,
    /// Feedback coefficient for y[n-1].
    pub a1: f32,
    /// Feedback coefficient for y[n-2].
    pub a2: f32,
}

impl BiquadCoefficients {
    /// Passthrough coefficients (`H(z) = 1`).
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Creates coefficients from already-normalized values.
    pub const fn new(b0: f32, b1: f32, b2: f32, a1: f32, a2: f32) -> Self {
        Self { b0, b1, b2, a1, a2 }
    }

    /// All-pass section for a complex-conjugate pole pair at `radius·e^{±j·angle}`.
    ///
    /// The denominator is `1 − 2r·cos(angle)·z⁻¹ + r²·z⁻²` and the numerator is
    /// the reversed denominator, so `|H(e^{jω})| = 1` for every ω.
    pub fn allpass(radius: f32, angle: f32) -> Self {
        let a1 = -2.0 * radius * cosf(angle);
        let a2 = radius * radius;
        Self::new(a2, a1, 1.0, a1, a2)
    }

    /// Evaluates `|H(e^{jω})|` for a normalized angular frequency `omega` (radians/sample).
    ///
    /// Evaluated in `f64`: near a low cutoff the denominator is of order
    /// `tan²(π·fc/fs)` and `f32` cancellation would dominate the result.
    pub fn magnitude_at(&self, omega: f32) -> f32 {
        let w = f64::from(omega);
        let (c1, s1) = (cos(w), sin(w));
        let (c2, s2) = (cos(2.0 * w), sin(2.0 * w));
        let [b0, b1, b2, a1, a2] = [self.b0, self.b1, self.b2, self.a1, self.a2].map(f64::from);

        let num_re = b0 + b1 * c1 + b2 * c2;
        let num_im = -(b1 * s1 + b2 * s2);
        let den_re = 1.0 + a1 * c1 + a2 * c2;
        let den_im = -(a1 * s1 + a2 * s2);

        sqrt((num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im)) as f32
    }
}

impl Default for BiquadCoefficients {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Second-order IIR filter section.
///
/// Implements the Direct Form I structure:
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
///                - a1*y[n-1] - a2*y[n-2]
/// ```
///
/// Stability is the caller's responsibility: coefficients that place poles
/// outside the unit circle produce unbounded output.
#[derive(Debug, Clone)]
pub struct Biquad {
    coeffs: BiquadCoefficients,

    /// Input history: x[n-1], x[n-2]
    x1: f32,
    x2: f32,

    /// Output history: y[n-1], y[n-2]
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Creates a new biquad with passthrough coefficients.
    pub fn new() -> Self {
        Self::with_coefficients(BiquadCoefficients::IDENTITY)
    }

    /// Creates a biquad with the given coefficients and cleared history.
    pub fn with_coefficients(coeffs: BiquadCoefficients) -> Self {
        Self {
            coeffs,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Stores new coefficients and resets the history to zero.
    pub fn initialize(&mut self, coeffs: BiquadCoefficients) {
        self.coeffs = coeffs;
        self.clear();
    }

    /// Replaces the coefficients without touching the history.
    ///
    /// Retuning keeps the filter memory so the output only moves by what the
    /// coefficient change itself implies.
    #[inline]
    pub fn update(&mut self, coeffs: BiquadCoefficients) {
        self.coeffs = coeffs;
    }

    /// Current coefficients.
    pub fn coefficients(&self) -> BiquadCoefficients {
        self.coeffs
    }

    /// Processes a single sample through the section.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let c = &self.coeffs;
        let output = flush_denormal(
            c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2,
        );

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    /// Clears the filter history without changing coefficients.
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    /// Magnitude response of this section at `omega` radians/sample.
    pub fn magnitude_at(&self, omega: f32) -> f32 {
        self.coeffs.magnitude_at(omega)
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordered series chain of [`Biquad`] sections.
///
/// Stage *i*'s output feeds stage *i+1*. Sections never share state; the
/// order only matters through the signal flow. Storage is allocated once at
/// construction.
#[derive(Debug, Clone, Default)]
pub struct BiquadCascade {
    sections: Vec<Biquad>,
}

impl BiquadCascade {
    /// Creates a cascade of `count` passthrough sections.
    pub fn new(count: usize) -> Self {
        let mut sections = Vec::with_capacity(count);
        sections.resize_with(count, Biquad::new);
        Self { sections }
    }

    /// Creates a cascade with one section per coefficient set, history cleared.
    pub fn from_coefficients(coeffs: &[BiquadCoefficients]) -> Self {
        Self {
            sections: coeffs.iter().copied().map(Biquad::with_coefficients).collect(),
        }
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// True if the cascade has no sections (acts as a wire).
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Read access to the sections in processing order.
    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    /// Mutable access to the sections, for designs that set them one by one.
    pub fn sections_mut(&mut self) -> &mut [Biquad] {
        &mut self.sections
    }

    /// Replaces every section's coefficients and clears all history.
    ///
    /// Extra entries in `coeffs` beyond the section count are ignored.
    pub fn initialize(&mut self, coeffs: &[BiquadCoefficients]) {
        for (section, &c) in self.sections.iter_mut().zip(coeffs) {
            section.initialize(c);
        }
    }

    /// Replaces every section's coefficients in place, keeping history.
    pub fn update(&mut self, coeffs: &[BiquadCoefficients]) {
        for (section, &c) in self.sections.iter_mut().zip(coeffs) {
            section.update(c);
        }
    }

    /// Runs one sample through every section in order.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.sections
            .iter_mut()
            .fold(input, |sample, section| section.process(sample))
    }

    /// Clears the history of every section.
    pub fn clear(&mut self) {
        for section in &mut self.sections {
            section.clear();
        }
    }

    /// Magnitude response of the whole cascade (product of section magnitudes).
    pub fn magnitude_at(&self, omega: f32) -> f32 {
        self.sections
            .iter()
            .map(|s| s.magnitude_at(omega))
            .product()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::PI;

    #[test]
    fn identity_passes_through() {
        let mut biquad = Biquad::new();
        for &x in &[1.0, -0.5, 0.25, 0.0, 0.75] {
            assert_eq!(biquad.process(x), x);
        }
    }

    #[test]
    fn real_pole_decays_geometrically() {
        // Single real pole at radius 0.5: h[n] = 0.5^n
        let mut biquad = Biquad::with_coefficients(BiquadCoefficients::new(1.0, 0.0, 0.0, -0.5, 0.0));
        let mut expected = 1.0;
        for n in 0..16 {
            let y = biquad.process(if n == 0 { 1.0 } else { 0.0 });
            assert!(
                (y - expected).abs() < 1e-7,
                "h[{}] expected {}, got {}",
                n,
                expected,
                y
            );
            expected *= 0.5;
        }
    }

    #[test]
    fn update_keeps_history_initialize_clears_it() {
        let coeffs = BiquadCoefficients::new(0.5, 0.5, 0.0, -0.3, 0.0);
        let mut a = Biquad::with_coefficients(coeffs);
        let mut b = Biquad::with_coefficients(coeffs);
        a.process(1.0);
        b.process(1.0);

        a.update(coeffs);
        b.initialize(coeffs);

        // `a` still carries x[n-1] = 1.0 so its output differs from the cleared section.
        let ya = a.process(0.0);
        let yb = b.process(0.0);
        assert!(ya.abs() > 0.1, "updated section lost its history: {}", ya);
        assert_eq!(yb, 0.0);
    }

    #[test]
    fn allpass_section_is_flat() {
        let c = BiquadCoefficients::allpass(0.9, 0.7);
        for i in 1..64 {
            let omega = PI * i as f32 / 64.0;
            let mag = c.magnitude_at(omega);
            assert!((mag - 1.0).abs() < 1e-4, "|H| at {} = {}", omega, mag);
        }
    }

    #[test]
    fn cascade_matches_sections_in_series() {
        let c1 = BiquadCoefficients::new(0.2, 0.4, 0.2, -0.5, 0.1);
        let c2 = BiquadCoefficients::allpass(0.6, 1.2);
        let mut cascade = BiquadCascade::from_coefficients(&[c1, c2]);
        let mut s1 = Biquad::with_coefficients(c1);
        let mut s2 = Biquad::with_coefficients(c2);

        for n in 0..32 {
            let x = libm::sinf(n as f32 * 0.3);
            let expected = s2.process(s1.process(x));
            let got = cascade.process(x);
            assert!((expected - got).abs() < 1e-6);
        }
        assert_eq!(cascade.len(), 2);
    }

    #[test]
    fn empty_cascade_is_a_wire() {
        let mut cascade = BiquadCascade::new(0);
        assert!(cascade.is_empty());
        assert_eq!(cascade.process(0.42), 0.42);
        assert_eq!(cascade.magnitude_at(1.0), 1.0);
    }

    #[test]
    fn clear_resets_cascade_state() {
        let mut cascade = BiquadCascade::from_coefficients(&[BiquadCoefficients::allpass(0.8, 0.4); 3]);
        for _ in 0..10 {
            cascade.process(1.0);
        }
        cascade.clear();
        assert_eq!(cascade.process(0.0), 0.0);
    }

    #[test]
    fn ringing_tail_settles_to_exact_zero() {
        // Poles at radius 0.99 ring for a long time after the impulse.
        let mut biquad = Biquad::with_coefficients(BiquadCoefficients::allpass(0.99, 0.3));
        biquad.process(1.0);
        for _ in 0..20_000 {
            biquad.process(0.0);
        }
        assert_eq!(biquad.process(0.0), 0.0);
    }
}
