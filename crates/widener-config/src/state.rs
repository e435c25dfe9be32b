//! Persisted control state.
//!
//! Only the six control values are stored; DSP internals (filter history,
//! sequences, envelopes) are rebuilt on `prepare`. The same format is used
//! for the state file and for presets, which add a name and description.
//!
//! ```toml
//! version = 1
//! name = "Wide"
//!
//! [params]
//! width_lower = 30.0
//! width_higher = 90.0
//! cutoff = 400.0
//! amplitude_preserve = 1.0
//! allpass_decorrelation = 0.0
//! handle_transients = 0.0
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use widener_core::ParameterInfo;
use widener_engine::WidenerParams;

use crate::ConfigError;
use crate::paths::ensure_dir;
use crate::validation::{ValidationError, validate_params};

/// Newest state format this build reads and writes.
pub const STATE_VERSION: u32 = 1;

fn default_version() -> u32 {
    STATE_VERSION
}

/// Control values keyed by parameter string id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidenerState {
    /// Format version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Display name (presets).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Free-form description (presets).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Parameter values. Missing keys fall back to the parameter default.
    #[serde(default)]
    pub params: BTreeMap<String, f32>,
}

impl Default for WidenerState {
    fn default() -> Self {
        Self::from_params(&WidenerParams::default())
    }
}

impl WidenerState {
    /// Captures every parameter of `source` by string id.
    pub fn capture<P: ParameterInfo + ?Sized>(source: &P) -> Self {
        let params = (0..source.param_count())
            .filter_map(|index| {
                let desc = source.param_info(index)?;
                Some((desc.string_id.to_string(), source.get_param(index)))
            })
            .collect();
        Self {
            version: STATE_VERSION,
            name: None,
            description: None,
            params,
        }
    }

    /// Captures a parameter snapshot.
    pub fn from_params(params: &WidenerParams) -> Self {
        Self::capture(params)
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Writes every parameter of `target`: stored values where present,
    /// descriptor defaults otherwise. Keys `target` does not know are skipped.
    ///
    /// Values go through `set_param`, which clamps.
    pub fn apply<P: ParameterInfo + ?Sized>(&self, target: &mut P) {
        for index in 0..target.param_count() {
            let Some(desc) = target.param_info(index) else {
                continue;
            };
            let value = self
                .params
                .get(desc.string_id)
                .copied()
                .unwrap_or(desc.default);
            target.set_param(index, value);
        }
    }

    /// The stored values as an engine parameter snapshot.
    pub fn to_params(&self) -> WidenerParams {
        let mut params = WidenerParams::default();
        self.apply(&mut params);
        params
    }

    /// Stored value for `string_id`, if any.
    pub fn get(&self, string_id: &str) -> Option<f32> {
        self.params.get(string_id).copied()
    }

    /// Stores a value without validating it.
    pub fn set(&mut self, string_id: impl Into<String>, value: f32) {
        self.params.insert(string_id.into(), value);
    }

    /// Checks the version and every stored value.
    ///
    /// # Errors
    ///
    /// [`ValidationError::UnsupportedVersion`] for newer files, otherwise the
    /// result of [`validate_params`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version > STATE_VERSION {
            return Err(ValidationError::UnsupportedVersion {
                found: self.version,
                supported: STATE_VERSION,
            });
        }
        validate_params(&self.params)
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Parse errors and validation failures.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let state: Self = toml::from_str(content)?;
        state.validate()?;
        Ok(state)
    }

    /// Serializes to pretty TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Loads and validates a state or preset file.
    ///
    /// # Errors
    ///
    /// Read, parse and validation failures.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Loads `path` if it exists, otherwise returns the default state.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load) for an existing file.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Writes the state, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Directory creation, serialization and write failures.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent)?;
        }
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }
}
