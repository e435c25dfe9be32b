//! Small DSP math helpers.
//!
//! - [`db_to_linear`] / [`linear_to_db`] - level conversions
//! - [`hz_to_omega`] - frequency to radians per sample
//! - [`ms_to_samples`] - time conversion
//! - [`flush_denormal`] - subnormal guard for recursive state
//! - [`correlation`] - zero-lag inter-channel correlation coefficient

use libm::{expf, logf, sqrt};

/// Convert decibels to linear gain.
///
/// ```rust
/// use widener_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels (floored at -200 dB).
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Angular frequency in radians per sample.
#[inline]
pub fn hz_to_omega(freq_hz: f32, sample_rate: f32) -> f32 {
    core::f32::consts::TAU * freq_hz / sample_rate
}

/// Milliseconds to (fractional) samples.
#[inline]
pub fn ms_to_samples(ms: f32, sample_rate: f32) -> f32 {
    ms * sample_rate / 1000.0
}

/// Flush subnormal floats to zero.
///
/// Long all-pass chains and leaky integrators decay toward zero
/// indefinitely; values below 1e-20 are replaced with zero well before the
/// IEEE 754 subnormal range.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Pearson correlation of two equally long signals at zero lag.
///
/// Returns a value in `[-1, 1]`: 1 for identical channels (mono), around 0
/// for fully decorrelated channels. Returns 0 when either signal is silent.
/// Accumulates in `f64`.
pub fn correlation(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }

    let (mut sum_a, mut sum_b) = (0.0f64, 0.0f64);
    for (&x, &y) in a[..n].iter().zip(&b[..n]) {
        sum_a += f64::from(x);
        sum_b += f64::from(y);
    }
    let mean_a = sum_a / n as f64;
    let mean_b = sum_b / n as f64;

    let (mut cov, mut var_a, mut var_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a[..n].iter().zip(&b[..n]) {
        let dx = f64::from(x) - mean_a;
        let dy = f64::from(y) - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    let denom = sqrt(var_a * var_b);
    if denom <= f64::EPSILON {
        0.0
    } else {
        (cov / denom).clamp(-1.0, 1.0) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_linear_roundtrip() {
        let original = 0.5;
        let back = db_to_linear(linear_to_db(original));
        assert!((original - back).abs() < 1e-5, "got {}", back);
    }

    #[test]
    fn test_db_known_values() {
        assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_linear(12.0) - 3.981).abs() < 0.001);
        assert!((db_to_linear(-12.0) - 0.2512).abs() < 0.001);
    }

    #[test]
    fn test_ms_to_samples() {
        assert_eq!(ms_to_samples(10.0, 48000.0), 480.0);
    }

    #[test]
    fn test_flush_denormal() {
        assert_eq!(flush_denormal(1e-30), 0.0);
        assert_eq!(flush_denormal(0.25), 0.25);
    }

    #[test]
    fn test_correlation_extremes() {
        let a: [f32; 8] = [0.1, -0.3, 0.5, 0.2, -0.7, 0.4, 0.0, -0.1];
        let neg: [f32; 8] = a.map(|x| -x);
        assert!((correlation(&a, &a) - 1.0).abs() < 1e-6);
        assert!((correlation(&a, &neg) + 1.0).abs() < 1e-6);
        assert_eq!(correlation(&a, &[0.0; 8]), 0.0);
        assert_eq!(correlation(&[], &[]), 0.0);
    }

    #[test]
    fn test_correlation_of_quadrature_sines_is_small() {
        let n = 4800;
        let a: Vec<f32> = (0..n)
            .map(|i| libm::sinf(hz_to_omega(100.0, 48000.0) * i as f32))
            .collect();
        let b: Vec<f32> = (0..n)
            .map(|i| libm::cosf(hz_to_omega(100.0, 48000.0) * i as f32))
            .collect();
        assert!(correlation(&a, &b).abs() < 0.01);
    }
}
