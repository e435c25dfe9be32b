//! Precomputed velvet-noise decorrelation tables.
//!
//! A table is plain text: one line per channel, each a dense run of
//! whitespace-separated floats where non-zero entries are impulses. Blank
//! lines are ignored. Tables replace random velvet generation when handed to
//! the engine through `WidenerSettings::velvet_table` or
//! `StereoWidener::set_decorrelation_table`.

use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use widener_core::{SequenceParseError, VelvetNoise, line_samples, table_line};
use widener_core::velvet::parse_sequence;
use widener_engine::{CHANNELS, WidenerSettings};

use crate::ConfigError;
use crate::optimize::{OptimizeConfig, OptimizedSequence, optimize_sequence};
use crate::paths::ensure_dir;

/// Validated decorrelation table text.
#[derive(Debug, Clone, PartialEq)]
pub struct DecorrelationTable {
    text: String,
}

impl DecorrelationTable {
    /// Generates the velvet sequences `settings` would produce at
    /// `sample_rate`, one dense line per channel.
    ///
    /// Loading the result reproduces the engine's own velvet sequences for
    /// the same seed.
    pub fn generate(settings: &WidenerSettings, sample_rate: f32) -> Self {
        let length = line_samples(settings.velvet.length_ms, sample_rate);
        let mut text = String::new();
        for channel in 0..CHANNELS {
            let velvet = channel_velvet(settings, channel, sample_rate);
            push_dense_line(&mut text, velvet.positions(), velvet.values(), length);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(length, sample_rate, "decorrelation table generated");

        Self { text }
    }

    /// Generates the same sequences as [`generate`](Self::generate), then
    /// flattens each channel's magnitude response with [`optimize_sequence`].
    ///
    /// Returns the table and the per-channel search results.
    pub fn generate_optimized(
        settings: &WidenerSettings,
        sample_rate: f32,
        config: &OptimizeConfig,
    ) -> (Self, Vec<OptimizedSequence>) {
        let length = line_samples(settings.velvet.length_ms, sample_rate);
        let mut text = String::new();
        let mut results = Vec::with_capacity(CHANNELS);
        for channel in 0..CHANNELS {
            let velvet = channel_velvet(settings, channel, sample_rate);
            let result =
                optimize_sequence(velvet.positions(), velvet.values(), length, sample_rate, config);
            push_dense_line(&mut text, &result.positions, &result.values, length);
            results.push(result);
        }
        (Self { text }, results)
    }

    /// Parses and validates a table.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Table`] when a line holds a non-number or fewer lines
    /// than channels are present.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        for channel in 0..CHANNELS {
            parse_sequence(table_line(text, channel)?)?;
        }
        Ok(Self {
            text: text.to_string(),
        })
    }

    /// Loads and validates a table file.
    ///
    /// # Errors
    ///
    /// Read failures and the errors of [`parse`](Self::parse).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::parse(&text)
    }

    /// Writes the table, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Directory creation and write failures.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent)?;
        }
        std::fs::write(path, &self.text).map_err(|e| ConfigError::write_file(path, e))
    }

    /// The table text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of channel lines (at least [`CHANNELS`]).
    pub fn channels(&self) -> usize {
        self.text.lines().filter(|line| !line.trim().is_empty()).count()
    }

    /// Builds the velvet decorrelator for `channel`.
    ///
    /// # Errors
    ///
    /// [`SequenceParseError::MissingChannel`] past the last line.
    pub fn velvet(&self, channel: usize, sample_rate: f32) -> Result<VelvetNoise, SequenceParseError> {
        VelvetNoise::from_table_line(table_line(&self.text, channel)?, sample_rate)
    }

    /// Consumes the table, returning its text.
    pub fn into_string(self) -> String {
        self.text
    }
}

/// The velvet sequence the engine draws for `channel`.
fn channel_velvet(settings: &WidenerSettings, channel: usize, sample_rate: f32) -> VelvetNoise {
    let mut rng = ChaCha8Rng::seed_from_u64(settings.channel_seed(channel));
    VelvetNoise::new(settings.velvet, sample_rate, &mut rng)
}

fn push_dense_line(text: &mut String, positions: &[usize], values: &[f32], length: usize) {
    let mut dense = vec![0.0f32; length];
    for (&position, &value) in positions.iter().zip(values) {
        if let Some(slot) = dense.get_mut(position) {
            *slot = value;
        }
    }
    let line: Vec<String> = dense.iter().map(ToString::to_string).collect();
    // Writing to a String cannot fail.
    let _ = writeln!(text, "{}", line.join(" "));
}

impl FromStr for DecorrelationTable {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
