//! Offline rendering of whole signals through an effect.

use crate::{Result, StereoSamples};
use widener_core::Effect;

/// Runs an [`Effect`] over complete signals in fixed-size blocks.
///
/// The effect is prepared for the signal's sample rate on every render, so
/// a renderer can be reused across files with different rates.
#[derive(Debug)]
pub struct OfflineRenderer<E> {
    effect: E,
    block_size: usize,
}

impl<E: Effect> OfflineRenderer<E> {
    /// Wraps `effect`, processing `block_size` frames per call.
    pub fn new(effect: E, block_size: usize) -> Self {
        Self { effect, block_size }
    }

    /// Frames per processing call.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// The wrapped effect.
    pub fn effect(&self) -> &E {
        &self.effect
    }

    /// Mutable access to the wrapped effect.
    pub fn effect_mut(&mut self) -> &mut E {
        &mut self.effect
    }

    /// Unwraps the effect.
    pub fn into_inner(self) -> E {
        self.effect
    }

    /// Renders `input` and returns the processed copy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Prepare`](crate::Error::Prepare) if the effect rejects
    /// the sample rate or block size.
    pub fn render(&mut self, input: &StereoSamples, sample_rate: f32) -> Result<StereoSamples> {
        self.render_with_progress(input, sample_rate, |_, _| {})
    }

    /// Like [`render`](Self::render), calling `progress(done, total)` in
    /// frames after every block.
    ///
    /// # Errors
    ///
    /// Same as [`render`](Self::render).
    pub fn render_with_progress<F>(
        &mut self,
        input: &StereoSamples,
        sample_rate: f32,
        mut progress: F,
    ) -> Result<StereoSamples>
    where
        F: FnMut(usize, usize),
    {
        self.effect.prepare(sample_rate, self.block_size)?;
        self.effect.reset();

        let total = input.len();
        let mut output = input.clone();
        let mut done = 0;
        for (left, right) in output
            .left
            .chunks_mut(self.block_size)
            .zip(output.right.chunks_mut(self.block_size))
        {
            self.effect.process_stereo(left, right);
            done += left.len();
            progress(done, total);
        }

        tracing::debug!(
            frames = total,
            sample_rate,
            block_size = self.block_size,
            "render finished"
        );
        Ok(output)
    }
}
