//! One channel of the widener.
//!
//! A strip owns everything that must never be shared between channels: both
//! decorrelators, both crossover banks (one pair for the direct signal, one
//! for the decorrelated copy), the recombination gain stages, the transient
//! handler and the block scratch buffers. Only the engines selected by the
//! current modes run; the others keep their (cleared) history until chosen.

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use widener_core::{
    AllpassCascade, Crossover, CrossoverKind, Decorrelator, DecorrelatorKind, EnergyNormalizer,
    LevelCompensator, OnsetFlags, Panner, PrepareError, Recombination, SequenceParseError,
    TransientAction, TransientHandler, VelvetNoise, table_line,
};

use crate::settings::WidenerSettings;

/// Crossover designs in [`CrossoverKind::index`] order.
const CROSSOVER_KINDS: [CrossoverKind; 2] =
    [CrossoverKind::PhasePreserving, CrossoverKind::EnergyPreserving];

/// Per-block state shared by both strips.
pub(crate) struct BlockContext<'a> {
    pub decorrelator: DecorrelatorKind,
    pub crossover: CrossoverKind,
    pub recombination: Recombination,
    pub handle_transients: bool,
    pub low: &'a Panner,
    pub high: &'a Panner,
}

/// Matched crossovers for the direct signal and its decorrelated copy.
#[derive(Debug, Clone)]
struct BandSplitter {
    direct: Crossover,
    decorrelated: Crossover,
}

impl BandSplitter {
    fn new(kind: CrossoverKind, cutoff: f32, sample_rate: f32) -> Self {
        Self {
            direct: Crossover::new(kind, cutoff, sample_rate),
            decorrelated: Crossover::new(kind, cutoff, sample_rate),
        }
    }

    fn update(&mut self, cutoff: f32) {
        self.direct.update(cutoff);
        self.decorrelated.update(cutoff);
    }

    fn clear(&mut self) {
        self.direct.clear();
        self.decorrelated.clear();
    }
}

/// Builds the velvet decorrelator for `channel`, from the table when one is set.
pub(crate) fn build_velvet(
    settings: &WidenerSettings,
    channel: usize,
    sample_rate: f32,
    rng: &mut ChaCha8Rng,
) -> Result<VelvetNoise, SequenceParseError> {
    match &settings.velvet_table {
        Some(table) => VelvetNoise::from_table_line(table_line(table, channel)?, sample_rate),
        None => Ok(VelvetNoise::new(settings.velvet, sample_rate, rng)),
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ChannelStrip {
    decorrelators: [Decorrelator; 2],
    banks: [BandSplitter; 2],
    /// Low and high band level matching (amplitude-preserving law).
    compensators: [LevelCompensator; 2],
    normalizer: EnergyNormalizer,
    transient: TransientHandler,
    rng: ChaCha8Rng,
    dry: Vec<f32>,
    direct_low: Vec<f32>,
    direct_high: Vec<f32>,
    decorrelated_low: Vec<f32>,
    decorrelated_high: Vec<f32>,
    widened: Vec<f32>,
}

impl ChannelStrip {
    /// Allocates and initialises every engine of one channel.
    pub(crate) fn new(
        settings: &WidenerSettings,
        channel: usize,
        sample_rate: f32,
        block_size: usize,
        cutoff: f32,
    ) -> Result<Self, PrepareError> {
        let mut rng = ChaCha8Rng::seed_from_u64(settings.channel_seed(channel));
        let velvet = build_velvet(settings, channel, sample_rate, &mut rng)?;
        let allpass = AllpassCascade::new(settings.allpass, sample_rate, &mut rng);

        let block_rate = sample_rate / block_size as f32;
        let compensator = LevelCompensator::new(block_rate, settings.smoothing_ms);

        Ok(Self {
            decorrelators: [velvet.into(), allpass.into()],
            banks: CROSSOVER_KINDS.map(|kind| BandSplitter::new(kind, cutoff, sample_rate)),
            compensators: [compensator.clone(), compensator],
            normalizer: EnergyNormalizer::new(block_rate, settings.smoothing_ms),
            transient: TransientHandler::new(sample_rate, block_size, settings.transient),
            rng,
            dry: vec![0.0; block_size],
            direct_low: vec![0.0; block_size],
            direct_high: vec![0.0; block_size],
            decorrelated_low: vec![0.0; block_size],
            decorrelated_high: vec![0.0; block_size],
            widened: vec![0.0; block_size],
        })
    }

    /// Processes up to one prepared block in place.
    ///
    /// Returns the transient action (when transient handling is on) and the
    /// onset flags seen in this block.
    pub(crate) fn process(
        &mut self,
        io: &mut [f32],
        ctx: &BlockContext<'_>,
    ) -> (Option<TransientAction>, OnsetFlags) {
        let n = io.len().min(self.dry.len());
        let io = &mut io[..n];
        self.dry[..n].copy_from_slice(io);

        let decorrelator = &mut self.decorrelators[ctx.decorrelator.index()];
        let bank = &mut self.banks[ctx.crossover.index()];
        for i in 0..n {
            let x = self.dry[i];
            let d = decorrelator.process(x);
            let (low, high) = bank.direct.split(x);
            let (d_low, d_high) = bank.decorrelated.split(d);
            self.direct_low[i] = low;
            self.direct_high[i] = high;
            self.decorrelated_low[i] = d_low;
            self.decorrelated_high[i] = d_high;
        }

        match ctx.recombination {
            Recombination::AmplitudePreserving => {
                self.compensators[0]
                    .process_block(&self.direct_low[..n], &mut self.decorrelated_low[..n]);
                self.compensators[1]
                    .process_block(&self.direct_high[..n], &mut self.decorrelated_high[..n]);
                for i in 0..n {
                    self.widened[i] = ctx.low.process(self.decorrelated_low[i], self.direct_low[i])
                        + ctx.high.process(self.decorrelated_high[i], self.direct_high[i]);
                }
            }
            Recombination::EnergyPreserving => {
                // Panned bands overwrite the direct buffers before normalisation.
                for i in 0..n {
                    self.direct_low[i] = ctx.low.process(self.decorrelated_low[i], self.direct_low[i]);
                    self.direct_high[i] =
                        ctx.high.process(self.decorrelated_high[i], self.direct_high[i]);
                }
                self.normalizer.process_block(
                    &self.direct_low[..n],
                    &self.direct_high[..n],
                    &mut self.widened[..n],
                );
            }
        }

        if ctx.handle_transients {
            let action = self.transient.process(&self.dry[..n], &self.widened[..n], io);
            (Some(action), self.transient.flags())
        } else {
            io.copy_from_slice(&self.widened[..n]);
            (None, OnsetFlags::default())
        }
    }

    /// Retunes both splitters of `kind`.
    pub(crate) fn retune(&mut self, kind: CrossoverKind, cutoff: f32) {
        self.banks[kind.index()].update(cutoff);
    }

    /// Prepares a newly selected decorrelator.
    pub(crate) fn select_decorrelator(&mut self, kind: DecorrelatorKind) {
        self.decorrelators[kind.index()].clear();
    }

    /// Prepares a newly selected crossover bank and recombination law.
    pub(crate) fn select_crossover(&mut self, kind: CrossoverKind, cutoff: f32) {
        let bank = &mut self.banks[kind.index()];
        bank.update(cutoff);
        bank.clear();
        for compensator in &mut self.compensators {
            compensator.reset();
        }
        self.normalizer.reset();
    }

    /// Restarts transient detection.
    pub(crate) fn reset_transient(&mut self) {
        self.transient.reset();
    }

    /// Regenerates the velvet sequence from this channel's generator.
    pub(crate) fn set_grid_density(&mut self, grid_density: f32) {
        if let Decorrelator::VelvetNoise(velvet) =
            &mut self.decorrelators[DecorrelatorKind::VelvetNoise.index()]
        {
            velvet.update(grid_density, &mut self.rng);
        }
    }

    /// Swaps in a new velvet decorrelator.
    pub(crate) fn replace_velvet(&mut self, velvet: VelvetNoise) {
        self.decorrelators[DecorrelatorKind::VelvetNoise.index()] = velvet.into();
    }

    /// Generator used for velvet regeneration.
    pub(crate) fn rng_mut(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Clears all history; sequences and pole sets are kept.
    pub(crate) fn reset(&mut self) {
        for decorrelator in &mut self.decorrelators {
            decorrelator.clear();
        }
        for bank in &mut self.banks {
            bank.clear();
        }
        for compensator in &mut self.compensators {
            compensator.reset();
        }
        self.normalizer.reset();
        self.transient.reset();
    }

    /// Velvet sequence currently loaded.
    pub(crate) fn velvet(&self) -> Option<&VelvetNoise> {
        match &self.decorrelators[DecorrelatorKind::VelvetNoise.index()] {
            Decorrelator::VelvetNoise(velvet) => Some(velvet),
            Decorrelator::Allpass(_) => None,
        }
    }
}
