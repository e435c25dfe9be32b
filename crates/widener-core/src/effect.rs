//! Block-based stereo processor interface.
//!
//! The [`Effect`] trait is what the offline renderer and the real-time stream
//! drive. Unlike a per-sample mono effect, a stereo widener needs both
//! channels of a block at once (width is an inter-channel property) and a
//! preparation step that sizes every internal buffer before audio starts.
//!
//! - **Two-phase lifecycle**: [`prepare`](Effect::prepare) may allocate and
//!   can fail; [`process_stereo`](Effect::process_stereo) never allocates
//!   and never fails.
//! - **In place**: channels are processed in the caller's buffers.
//! - **Object-safe**: `dyn Effect` works for runtime selection.

use crate::error::PrepareError;

/// A stereo in-place block processor.
///
/// # Example
///
/// ```rust
/// use widener_core::{Effect, PrepareError};
///
/// struct Swap;
///
/// impl Effect for Swap {
///     fn prepare(&mut self, sample_rate: f32, block_size: usize) -> Result<(), PrepareError> {
///         PrepareError::check(sample_rate, block_size)
///     }
///
///     fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
///         for (l, r) in left.iter_mut().zip(right.iter_mut()) {
///             core::mem::swap(l, r);
///         }
///     }
///
///     fn reset(&mut self) {}
/// }
///
/// let mut fx = Swap;
/// fx.prepare(48000.0, 64).unwrap();
/// let (mut l, mut r) = ([1.0f32; 4], [2.0f32; 4]);
/// fx.process_stereo(&mut l, &mut r);
/// assert_eq!(l, [2.0; 4]);
/// ```
pub trait Effect {
    /// Sizes and initializes all internal state for `sample_rate` and
    /// blocks of up to `block_size` samples.
    ///
    /// Must be called before processing and again whenever either value
    /// changes. On error the previous configuration stays in place.
    fn prepare(&mut self, sample_rate: f32, block_size: usize) -> Result<(), PrepareError>;

    /// Processes one stereo block in place.
    ///
    /// Both slices should have the same length; implementations process
    /// the shorter length.
    fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32]);

    /// Clears all signal history without changing parameters.
    fn reset(&mut self);
}
