//! Shared CLI helpers used across multiple commands.

use anyhow::Context;
use clap::Args;
use std::path::PathBuf;
use widener_config::{DecorrelationTable, WidenerState, find_table, resolve_preset, validate_param};
use widener_engine::{StereoWidener, WidenerParams, WidenerSettings};

/// Widener controls shared by `process`, `play` and `presets save`.
///
/// Values start from the preset or state file (defaults otherwise); explicit
/// flags override them.
#[derive(Args, Debug, Clone, Default)]
pub struct WidenerArgs {
    /// Low-band width in percent (0-100)
    #[arg(long, value_name = "PERCENT")]
    pub width_lower: Option<f32>,

    /// High-band width in percent (0-100)
    #[arg(long, value_name = "PERCENT")]
    pub width_higher: Option<f32>,

    /// Crossover frequency in Hz (100-8000)
    #[arg(long, value_name = "HZ")]
    pub cutoff: Option<f32>,

    /// Butterworth bands with energy normalisation instead of the
    /// phase-preserving bank
    #[arg(long)]
    pub energy_preserving: bool,

    /// Decorrelate with the all-pass cascade instead of velvet noise
    #[arg(long)]
    pub allpass: bool,

    /// Keep transients dry
    #[arg(long)]
    pub transients: bool,

    /// Preset name or path
    #[arg(short, long, value_name = "NAME|PATH")]
    pub preset: Option<String>,

    /// State file to start from
    #[arg(long, value_name = "FILE", conflicts_with = "preset")]
    pub state: Option<PathBuf>,

    /// Precomputed decorrelation table (path or name in the tables directory)
    #[arg(long, value_name = "FILE")]
    pub table: Option<String>,

    /// Seed for sequence and pole generation
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

impl WidenerArgs {
    /// Preset or state file contents, or the default state.
    pub fn base_state(&self) -> anyhow::Result<WidenerState> {
        if let Some(name) = &self.preset {
            return resolve_preset(name).with_context(|| {
                format!("Preset '{name}' not found. Use 'widener presets list' to see available presets.")
            });
        }
        if let Some(path) = &self.state {
            return WidenerState::load(path)
                .with_context(|| format!("cannot load state {}", path.display()));
        }
        Ok(WidenerState::default())
    }

    /// Base state with the explicit flags applied.
    pub fn state(&self) -> anyhow::Result<WidenerState> {
        let mut state = self.base_state()?;
        let overrides = [
            ("width_lower", self.width_lower),
            ("width_higher", self.width_higher),
            ("cutoff", self.cutoff),
        ];
        for (id, value) in overrides {
            if let Some(value) = value {
                validate_param(id, value)?;
                state.set(id, value);
            }
        }
        if self.energy_preserving {
            state.set("amplitude_preserve", 0.0);
        }
        if self.allpass {
            state.set("allpass_decorrelation", 1.0);
        }
        if self.transients {
            state.set("handle_transients", 1.0);
        }
        Ok(state)
    }

    /// Resolved control values.
    pub fn params(&self) -> anyhow::Result<WidenerParams> {
        Ok(self.state()?.to_params())
    }

    /// Engine settings for the seed and optional table.
    pub fn settings(&self) -> anyhow::Result<WidenerSettings> {
        let mut settings = WidenerSettings::with_seed(self.seed);
        if let Some(name) = &self.table {
            let path = find_table(name)
                .with_context(|| format!("decorrelation table '{name}' not found"))?;
            let table = DecorrelationTable::load(&path)
                .with_context(|| format!("cannot load table {}", path.display()))?;
            settings.velvet_table = Some(table.into_string());
        }
        Ok(settings)
    }

    /// An unprepared widener with settings and params applied.
    pub fn build(&self) -> anyhow::Result<StereoWidener> {
        let mut widener = StereoWidener::new(self.settings()?);
        widener.set_params(&self.params()?);
        Ok(widener)
    }
}

/// One-line summary of a parameter set.
pub fn describe_params(params: &WidenerParams) -> String {
    format!(
        "width {:.0}% / {:.0}% @ {:.0} Hz, {}, {}{}",
        params.width_lower,
        params.width_higher,
        params.cutoff_hz,
        if params.amplitude_preserve {
            "phase-preserving"
        } else {
            "energy-preserving"
        },
        if params.allpass_decorrelation {
            "all-pass"
        } else {
            "velvet"
        },
        if params.handle_transients {
            ", transients dry"
        } else {
            ""
        }
    )
}

/// Linear amplitude to dB, floored at -120.
pub fn to_db(linear: f32) -> f32 {
    widener_core::linear_to_db(linear).max(-120.0)
}
