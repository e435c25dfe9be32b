//! The stereo widener processor.

use widener_core::{
    CrossoverKind, DecorrelatorKind, Effect, OnsetFlags, Panner, ParamDescriptor, ParameterInfo,
    PrepareError, Recombination, SequenceParseError, SmoothedParam, TransientAction, VelvetNoise,
    table_line, velvet::parse_sequence,
};

use crate::params::{PARAM_COUNT, SharedParams, WidenerParams, param_descriptor};
use crate::settings::WidenerSettings;
use crate::strip::{BlockContext, ChannelStrip, build_velvet};

/// Number of channels the widener processes.
pub const CHANNELS: usize = 2;

/// What happened during one call to [`StereoWidener::process_block`].
///
/// When a call spans several prepared blocks, onset flags are merged and
/// `transient` holds the action of the last block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockReport {
    /// Transient handler action per channel; `None` while transient
    /// handling is off or the engine is unprepared.
    pub transient: [Option<TransientAction>; CHANNELS],
    /// Onset/offset flags per channel.
    pub flags: [OnsetFlags; CHANNELS],
}

impl BlockReport {
    /// True when any channel saw an onset.
    pub fn onset(&self) -> bool {
        self.flags.iter().any(|f| f.onset)
    }

    /// True when any channel saw an offset.
    pub fn offset(&self) -> bool {
        self.flags.iter().any(|f| f.offset)
    }

    fn merge(&mut self, other: &Self) {
        for ch in 0..CHANNELS {
            if other.transient[ch].is_some() {
                self.transient[ch] = other.transient[ch];
            }
            self.flags[ch].onset |= other.flags[ch].onset;
            self.flags[ch].offset |= other.flags[ch].offset;
        }
    }
}

/// Two-band stereo widener.
///
/// Each channel is split at the crossover frequency, the same split is
/// applied to a decorrelated copy of the channel, and each band is panned
/// between its direct and decorrelated versions by that band's width. The
/// bands are recombined under the amplitude- or energy-preserving law and,
/// optionally, crossfaded back to the dry input around transients.
///
/// ```text
///  L ─┬─► Crossover ─────────────┬─► Panner(lo) ─┐
///     └─► Decorrelator ─► Crossover ─► Panner(hi) ─┴─► Recombine ─► Transient ─► L'
///  R ─ (same, independently seeded) ──────────────────────────────────────────► R'
/// ```
///
/// ## Parameters
///
/// See [`params`](crate::params) for the index table. Widths and cutoff are
/// smoothed once per block; the three switches take effect at the next
/// block and clear the history of the engine they select.
///
/// # Example
///
/// ```rust
/// use widener_engine::{StereoWidener, WidenerParams, WidenerSettings};
///
/// let mut widener = StereoWidener::new(WidenerSettings::default());
/// widener.prepare(48000.0, 256).unwrap();
/// widener.set_params(&WidenerParams {
///     width_higher: 80.0,
///     ..WidenerParams::default()
/// });
///
/// let mut left = vec![0.0f32; 256];
/// let mut right = vec![0.0f32; 256];
/// widener.process_block(&mut left, &mut right);
/// assert!(left.iter().chain(&right).all(|x| *x == 0.0));
/// ```
#[derive(Debug, Clone)]
pub struct StereoWidener {
    settings: WidenerSettings,
    params: WidenerParams,
    channels: Option<[ChannelStrip; CHANNELS]>,
    sample_rate: f32,
    block_size: usize,
    width_lower: SmoothedParam,
    width_higher: SmoothedParam,
    cutoff: SmoothedParam,
    low_panner: Panner,
    high_panner: Panner,
    applied_cutoff: f32,
    decorrelator: DecorrelatorKind,
    crossover: CrossoverKind,
    handle_transients: bool,
}

impl StereoWidener {
    /// Creates an unprepared widener. Audio passes through untouched until
    /// [`prepare`](Self::prepare) succeeds.
    pub fn new(settings: WidenerSettings) -> Self {
        let params = WidenerParams::default();
        Self {
            settings,
            params,
            channels: None,
            sample_rate: 0.0,
            block_size: 0,
            width_lower: SmoothedParam::new(params.width_lower),
            width_higher: SmoothedParam::new(params.width_higher),
            cutoff: SmoothedParam::new(params.cutoff_hz),
            low_panner: Panner::new(params.width_lower),
            high_panner: Panner::new(params.width_higher),
            applied_cutoff: params.cutoff_hz,
            decorrelator: DecorrelatorKind::for_allpass_flag(params.allpass_decorrelation),
            crossover: CrossoverKind::for_amplitude_preserve(params.amplitude_preserve),
            handle_transients: params.handle_transients,
        }
    }

    /// Allocates and initialises both channels for a sample rate and block size.
    ///
    /// Everything is built before anything is replaced, so on error the
    /// previous preparation (if any) stays in effect. Smoothed controls start
    /// settled at their current targets.
    pub fn prepare(&mut self, sample_rate: f32, block_size: usize) -> Result<(), PrepareError> {
        PrepareError::check(sample_rate, block_size)?;

        let cutoff = self.params.cutoff_hz;
        let left = ChannelStrip::new(&self.settings, 0, sample_rate, block_size, cutoff)?;
        let right = ChannelStrip::new(&self.settings, 1, sample_rate, block_size, cutoff)?;

        let block_rate = sample_rate / block_size as f32;
        let smoothing = self.settings.smoothing_ms;
        self.width_lower = SmoothedParam::with_config(self.params.width_lower, block_rate, smoothing);
        self.width_higher =
            SmoothedParam::with_config(self.params.width_higher, block_rate, smoothing);
        self.cutoff = SmoothedParam::with_config(cutoff, block_rate, smoothing);
        self.low_panner.update(self.params.width_lower);
        self.high_panner.update(self.params.width_higher);
        self.applied_cutoff = cutoff;
        self.decorrelator = DecorrelatorKind::for_allpass_flag(self.params.allpass_decorrelation);
        self.crossover = CrossoverKind::for_amplitude_preserve(self.params.amplitude_preserve);
        self.handle_transients = self.params.handle_transients;

        self.channels = Some([left, right]);
        self.sample_rate = sample_rate;
        self.block_size = block_size;

        #[cfg(feature = "tracing")]
        tracing::info!(
            sample_rate,
            block_size,
            seed = self.settings.seed,
            table = self.settings.velvet_table.is_some(),
            "widener prepared"
        );

        Ok(())
    }

    /// True once [`prepare`](Self::prepare) has succeeded.
    pub fn is_prepared(&self) -> bool {
        self.channels.is_some()
    }

    /// Prepared sample rate (0 when unprepared).
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Prepared block size (0 when unprepared).
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Construction settings.
    pub fn settings(&self) -> &WidenerSettings {
        &self.settings
    }

    /// Processes a stereo buffer in place.
    ///
    /// Buffers of any length are accepted and handled in prepared-size
    /// blocks; if the channels differ in length only the common prefix is
    /// processed. Allocation-free.
    pub fn process_block(&mut self, left: &mut [f32], right: &mut [f32]) -> BlockReport {
        let mut report = BlockReport::default();
        if self.channels.is_none() {
            return report;
        }

        let len = left.len().min(right.len());
        let block_size = self.block_size;
        for (l, r) in left[..len]
            .chunks_mut(block_size)
            .zip(right[..len].chunks_mut(block_size))
        {
            let chunk = self.process_chunk(l, r);
            report.merge(&chunk);
        }
        report
    }

    fn process_chunk(&mut self, left: &mut [f32], right: &mut [f32]) -> BlockReport {
        if !self.width_lower.is_settled() {
            self.low_panner.update(self.width_lower.advance());
        }
        if !self.width_higher.is_settled() {
            self.high_panner.update(self.width_higher.advance());
        }
        let cutoff = self.cutoff.advance();

        let mut report = BlockReport::default();
        let Some(channels) = self.channels.as_mut() else {
            return report;
        };

        if cutoff != self.applied_cutoff {
            for strip in channels.iter_mut() {
                strip.retune(self.crossover, cutoff);
            }
            self.applied_cutoff = cutoff;
        }

        let ctx = BlockContext {
            decorrelator: self.decorrelator,
            crossover: self.crossover,
            recombination: Recombination::for_amplitude_preserve(
                self.crossover == CrossoverKind::PhasePreserving,
            ),
            handle_transients: self.handle_transients,
            low: &self.low_panner,
            high: &self.high_panner,
        };

        for (ch, io) in [left, right].into_iter().enumerate() {
            let (action, flags) = channels[ch].process(io, &ctx);
            report.transient[ch] = action;
            report.flags[ch] = flags;
        }
        report
    }

    /// Clears all DSP history and jumps smoothed controls to their targets.
    ///
    /// Sequences, pole sets and parameters are kept.
    pub fn reset(&mut self) {
        self.width_lower.snap_to_target();
        self.width_higher.snap_to_target();
        self.cutoff.snap_to_target();
        self.low_panner.update(self.width_lower.get());
        self.high_panner.update(self.width_higher.get());
        if let Some(channels) = self.channels.as_mut() {
            let cutoff = self.cutoff.get();
            for strip in channels.iter_mut() {
                strip.reset();
                strip.retune(self.crossover, cutoff);
            }
            self.applied_cutoff = cutoff;
        }
    }

    /// Applies a control snapshot (clamped).
    ///
    /// Widths and cutoff glide to their new values; switching modes clears
    /// the newly selected engine so it starts from silence. Realtime-safe.
    pub fn set_params(&mut self, params: &WidenerParams) {
        let params = params.clamped();
        self.params = params;
        self.width_lower.set_target(params.width_lower);
        self.width_higher.set_target(params.width_higher);
        self.cutoff.set_target(params.cutoff_hz);
        if self.channels.is_none() {
            // Nothing to glide from; take everything as is on prepare.
            self.width_lower.snap_to_target();
            self.width_higher.snap_to_target();
            self.cutoff.snap_to_target();
        }
        self.apply_modes();
    }

    fn apply_modes(&mut self) {
        let decorrelator = DecorrelatorKind::for_allpass_flag(self.params.allpass_decorrelation);
        let crossover = CrossoverKind::for_amplitude_preserve(self.params.amplitude_preserve);
        let handle_transients = self.params.handle_transients;

        if let Some(channels) = self.channels.as_mut() {
            let cutoff = self.cutoff.get();
            for strip in channels.iter_mut() {
                if decorrelator != self.decorrelator {
                    strip.select_decorrelator(decorrelator);
                }
                if crossover != self.crossover {
                    strip.select_crossover(crossover, cutoff);
                }
                if handle_transients && !self.handle_transients {
                    strip.reset_transient();
                }
            }
            self.applied_cutoff = cutoff;
        }

        #[cfg(feature = "tracing")]
        if decorrelator != self.decorrelator
            || crossover != self.crossover
            || handle_transients != self.handle_transients
        {
            tracing::debug!(
                ?decorrelator,
                ?crossover,
                handle_transients,
                "widener mode changed"
            );
        }

        self.decorrelator = decorrelator;
        self.crossover = crossover;
        self.handle_transients = handle_transients;
    }

    /// Current control targets.
    pub fn params(&self) -> WidenerParams {
        self.params
    }

    /// Pulls the latest values from a lock-free bridge. Call once per block
    /// from the audio thread.
    pub fn sync(&mut self, shared: &SharedParams) {
        let params = shared.load();
        if params != self.params {
            self.set_params(&params);
        }
    }

    /// Replaces the velvet-noise sequences with a precomputed table (one
    /// line per channel), or returns to random generation with `None`.
    ///
    /// The table is validated before anything changes. Allocates; call from
    /// the control path, not the audio thread.
    pub fn set_decorrelation_table(&mut self, table: Option<&str>) -> Result<(), SequenceParseError> {
        if let Some(table) = table {
            for channel in 0..CHANNELS {
                parse_sequence(table_line(table, channel)?)?;
            }
        }
        self.settings.velvet_table = table.map(Into::into);

        if let Some(channels) = self.channels.as_mut() {
            for (channel, strip) in channels.iter_mut().enumerate() {
                let velvet = match &self.settings.velvet_table {
                    Some(table) => {
                        VelvetNoise::from_table_line(table_line(table, channel)?, self.sample_rate)?
                    }
                    None => build_velvet(&self.settings, channel, self.sample_rate, strip.rng_mut())?,
                };
                strip.replace_velvet(velvet);
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(table = table.is_some(), "velvet sequences replaced");

        Ok(())
    }

    /// Regenerates both velvet sequences at a new grid density.
    ///
    /// Ignored for sequences loaded from a table.
    pub fn set_grid_density(&mut self, grid_density: f32) {
        if self.settings.velvet_table.is_some() {
            return;
        }
        self.settings.velvet.grid_density = grid_density;
        if let Some(channels) = self.channels.as_mut() {
            for strip in channels.iter_mut() {
                strip.set_grid_density(grid_density);
            }
        }
    }

    /// Velvet sequence of `channel`, once prepared.
    pub fn velvet(&self, channel: usize) -> Option<&VelvetNoise> {
        self.channels.as_ref()?.get(channel)?.velvet()
    }

    /// Smoothed (width low, width high, cutoff) as of the last block.
    pub fn smoothed(&self) -> (f32, f32, f32) {
        (self.width_lower.get(), self.width_higher.get(), self.cutoff.get())
    }
}

impl Default for StereoWidener {
    fn default() -> Self {
        Self::new(WidenerSettings::default())
    }
}

impl ParameterInfo for StereoWidener {
    fn param_count(&self) -> usize {
        PARAM_COUNT
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        param_descriptor(index)
    }

    fn get_param(&self, index: usize) -> f32 {
        self.params.get(index)
    }

    fn set_param(&mut self, index: usize, value: f32) {
        let mut params = self.params;
        params.set(index, value);
        self.set_params(&params);
    }
}

impl Effect for StereoWidener {
    fn prepare(&mut self, sample_rate: f32, block_size: usize) -> Result<(), PrepareError> {
        StereoWidener::prepare(self, sample_rate, block_size)
    }

    fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        self.process_block(left, right);
    }

    fn reset(&mut self) {
        StereoWidener::reset(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48000.0;

    fn prepared(params: WidenerParams) -> StereoWidener {
        let mut w = StereoWidener::default();
        w.set_params(&params);
        w.prepare(SR, 64).unwrap();
        w
    }

    #[test]
    fn unprepared_passes_through() {
        let mut w = StereoWidener::default();
        let mut l = vec![0.25f32; 100];
        let mut r = vec![-0.5f32; 100];
        let report = w.process_block(&mut l, &mut r);
        assert!(l.iter().all(|&x| x == 0.25));
        assert!(r.iter().all(|&x| x == -0.5));
        assert_eq!(report, BlockReport::default());
        assert!(!w.is_prepared());
    }

    #[test]
    fn failed_prepare_keeps_previous_state() {
        let mut w = prepared(WidenerParams::default());
        assert_eq!(w.prepare(0.0, 64), Err(PrepareError::InvalidSampleRate(0.0)));
        assert_eq!(w.prepare(SR, 0), Err(PrepareError::InvalidBlockSize));
        assert!(w.is_prepared());
        assert_eq!(w.block_size(), 64);

        w.settings.velvet_table = Some("1 0 0".into());
        assert!(matches!(w.prepare(SR, 128), Err(PrepareError::Table(_))));
        assert_eq!(w.block_size(), 64);
    }

    #[test]
    fn params_round_trip_through_parameter_info() {
        let mut w = StereoWidener::default();
        w.set_param(crate::params::WIDTH_LOWER, 40.0);
        w.set_param(crate::params::CUTOFF, 20000.0);
        w.set_param(crate::params::HANDLE_TRANSIENTS, 1.0);
        assert_eq!(w.get_param(crate::params::WIDTH_LOWER), 40.0);
        assert_eq!(w.get_param(crate::params::CUTOFF), 8000.0);
        assert!(w.params().handle_transients);
        assert_eq!(w.find_param_by_string_id("width_higher"), Some(1));
    }

    #[test]
    fn width_glides_once_per_block() {
        let mut w = prepared(WidenerParams::default());
        w.set_params(&WidenerParams {
            width_higher: 100.0,
            ..WidenerParams::default()
        });
        let mut l = vec![0.0f32; 64];
        let mut r = vec![0.0f32; 64];
        w.process_block(&mut l, &mut r);
        let (_, first, _) = w.smoothed();
        assert!(first > 0.0 && first < 100.0, "one block in: {first}");

        for _ in 0..200 {
            w.process_block(&mut l, &mut r);
        }
        assert_eq!(w.smoothed().1, 100.0);
    }

    #[test]
    fn long_buffers_are_chunked() {
        let mut w = prepared(WidenerParams {
            width_lower: 100.0,
            width_higher: 100.0,
            ..WidenerParams::default()
        });
        let mut l: Vec<f32> = (0..1000).map(|i| (i as f32 * 0.05).sin()).collect();
        let mut r = l.clone();
        w.process_block(&mut l, &mut r);
        assert!(l.iter().chain(&r).all(|x| x.is_finite()));
        // Widened channels must no longer be identical.
        assert!(l.iter().zip(&r).any(|(a, b)| (a - b).abs() > 1e-3));
    }

    #[test]
    fn mode_switch_takes_effect_next_block() {
        let mut w = prepared(WidenerParams::default());
        w.set_params(&WidenerParams {
            allpass_decorrelation: true,
            amplitude_preserve: false,
            handle_transients: true,
            ..WidenerParams::default()
        });
        assert_eq!(w.decorrelator, DecorrelatorKind::Allpass);
        assert_eq!(w.crossover, CrossoverKind::EnergyPreserving);

        let mut l = vec![0.0f32; 64];
        let mut r = vec![0.0f32; 64];
        let report = w.process_block(&mut l, &mut r);
        assert!(report.transient.iter().all(Option::is_some));
    }

    #[test]
    fn sync_reads_shared_params() {
        let mut w = prepared(WidenerParams::default());
        let shared = SharedParams::default();
        shared.set(crate::params::WIDTH_LOWER, 55.0);
        w.sync(&shared);
        assert_eq!(w.params().width_lower, 55.0);
    }

    #[test]
    fn table_validation_is_atomic() {
        let mut w = prepared(WidenerParams::default());
        let before = w.velvet(0).unwrap().positions().to_vec();
        assert_eq!(
            w.set_decorrelation_table(Some("0.5 x")),
            Err(SequenceParseError::InvalidNumber { index: 1 })
        );
        assert_eq!(w.velvet(0).unwrap().positions(), before.as_slice());

        w.set_decorrelation_table(Some("0 1\n1 0")).unwrap();
        assert_eq!(w.velvet(0).unwrap().positions(), &[1]);
        assert_eq!(w.velvet(1).unwrap().positions(), &[0]);

        w.set_decorrelation_table(None).unwrap();
        assert!(w.velvet(0).unwrap().len() > 1);
    }

    #[test]
    fn grid_density_regenerates() {
        let mut w = prepared(WidenerParams::default());
        assert_eq!(w.velvet(0).unwrap().len(), 15);
        w.set_grid_density(2000.0);
        assert_eq!(w.velvet(0).unwrap().len(), 30);
        assert_eq!(w.settings().velvet.grid_density, 2000.0);
    }
}
