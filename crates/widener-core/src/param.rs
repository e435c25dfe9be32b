//! Control-rate parameter smoothing.
//!
//! Control values (widths, crossover cutoff) arrive from a non-realtime
//! thread as step changes. Applying each step directly would retune filters
//! and pan laws in audible jumps, so every externally driven value passes
//! through a [`SmoothedParam`] that is advanced **once per block**:
//!
//! ```text
//! smoothed = target·(1 − α) + previous·α,    α = exp(−1 / (τ_ms · 0.001 · rate))
//! ```
//!
//! `rate` is the rate at which [`SmoothedParam::advance`] is called. The
//! widener advances once per block, so it passes the block rate
//! (`sample_rate / block_size`).
//!
//! ## Usage
//!
//! ```rust
//! use widener_core::SmoothedParam;
//!
//! // 10 ms smoothing, advanced at 48 kHz / 256 = 187.5 blocks per second.
//! let mut width = SmoothedParam::with_config(0.0, 187.5, 10.0);
//! width.set_target(100.0);
//!
//! while !width.is_settled() {
//!     let w = width.advance();
//!     // recompute pan angles from `w` once for this block...
//!     # let _ = w;
//! }
//! assert_eq!(width.get(), 100.0);
//! ```

use libm::expf;

/// Relative distance below which a parameter snaps onto its target.
const SETTLE_EPSILON: f32 = 1e-4;

/// A one-pole smoothed control value.
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    /// Current smoothed value
    current: f32,
    /// Target value we're smoothing towards
    target: f32,
    /// Weight of the previous value (0 = instant, ~1 = very slow)
    alpha: f32,
}

impl SmoothedParam {
    /// Create a parameter with no smoothing (targets apply on the next advance).
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            alpha: 0.0,
        }
    }

    /// Create a smoothed parameter.
    ///
    /// # Arguments
    /// * `initial` - Initial value (already settled)
    /// * `update_rate` - How often [`advance`](Self::advance) is called, in Hz
    /// * `smoothing_time_ms` - Time constant in milliseconds
    pub fn with_config(initial: f32, update_rate: f32, smoothing_time_ms: f32) -> Self {
        let alpha = if smoothing_time_ms <= 0.0 || update_rate <= 0.0 {
            0.0
        } else {
            expf(-1.0 / (smoothing_time_ms * 0.001 * update_rate))
        };
        Self {
            alpha,
            ..Self::new(initial)
        }
    }

    /// Set the value to smooth towards.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Set target and snap to it (no smoothing).
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.target = value;
        self.current = value;
    }

    /// Move one step toward the target and return the new value.
    ///
    /// Snaps onto the target once within a relative `1e-4`, so
    /// [`is_settled`](Self::is_settled) eventually reports true and callers
    /// can stop recomputing derived state.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        self.current = self.target * (1.0 - self.alpha) + self.current * self.alpha;
        if (self.current - self.target).abs() <= SETTLE_EPSILON * self.target.abs().max(1.0) {
            self.current = self.target;
        }
        self.current
    }

    /// Current smoothed value.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Smoothing coefficient α.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// True when the smoothed value equals its target.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.current == self.target
    }

    /// Jump to the target.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }
}

impl Default for SmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsmoothed_applies_on_next_advance() {
        let mut p = SmoothedParam::new(1.0);
        p.set_target(3.0);
        assert_eq!(p.get(), 1.0);
        assert_eq!(p.advance(), 3.0);
        assert!(p.is_settled());
    }

    #[test]
    fn test_alpha_matches_time_constant() {
        let p = SmoothedParam::with_config(0.0, 1000.0, 10.0);
        // 10 ms at 1 kHz = 10 updates per time constant.
        assert!((p.alpha() - expf(-0.1)).abs() < 1e-6);
    }

    #[test]
    fn test_one_time_constant_reaches_63_percent() {
        let mut p = SmoothedParam::with_config(0.0, 1000.0, 10.0);
        p.set_target(1.0);
        for _ in 0..10 {
            p.advance();
        }
        assert!((p.get() - 0.632).abs() < 0.01, "got {}", p.get());
    }

    #[test]
    fn test_settles_and_snaps() {
        let mut p = SmoothedParam::with_config(500.0, 187.5, 10.0);
        p.set_target(2000.0);
        let mut steps = 0;
        let mut last = p.get();
        while !p.is_settled() {
            let v = p.advance();
            assert!(v >= last, "smoothing overshot backwards");
            last = v;
            steps += 1;
            assert!(steps < 100, "never settled");
        }
        assert_eq!(p.get(), 2000.0);
    }

    #[test]
    fn test_set_immediate() {
        let mut p = SmoothedParam::with_config(0.0, 100.0, 50.0);
        p.set_immediate(42.0);
        assert!(p.is_settled());
        assert_eq!(p.get(), 42.0);
    }

    #[test]
    fn test_alpha_follows_update_rate() {
        let fast = SmoothedParam::with_config(0.0, 100.0, 10.0).alpha();
        let slow = SmoothedParam::with_config(0.0, 10.0, 10.0).alpha();
        assert!(slow < fast);
        assert_eq!(SmoothedParam::with_config(0.0, 100.0, 0.0).alpha(), 0.0);
        assert_eq!(SmoothedParam::with_config(0.0, 0.0, 10.0).alpha(), 0.0);
    }
}
