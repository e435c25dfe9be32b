//! Persisted state, presets and decorrelation tables for the stereo widener.
//!
//! - [`WidenerState`]: the six control values as TOML, keyed by parameter
//!   string id, for the state file and for presets
//! - [`paths`]: platform locations of the state file, presets and tables
//! - [`factory_presets`]: presets compiled into the library
//! - [`validation`]: range and key checks against the parameter descriptors
//! - [`DecorrelationTable`]: precomputed velvet sequences as text
//! - [`optimize_sequence`]: flattens a velvet sequence's magnitude response
//!   before it is stored in a table
//!
//! # Example
//!
//! ```rust,no_run
//! use widener_config::{WidenerState, get_factory_preset, paths};
//! use widener_engine::{StereoWidener, WidenerSettings};
//!
//! let mut widener = StereoWidener::new(WidenerSettings::default());
//! let state = WidenerState::load_or_default(paths::state_file_path()).unwrap();
//! widener.set_params(&state.to_params());
//!
//! // Switch to a built-in preset and persist it as the new state
//! let wide = get_factory_preset("wide").unwrap();
//! widener.set_params(&wide.to_params());
//! WidenerState::capture(&widener).save(paths::state_file_path()).unwrap();
//! ```

mod error;
mod optimize;
mod state;
mod table;

/// Platform-specific paths for state, presets and tables.
pub mod paths;

/// Validation of persisted control values.
pub mod validation;

/// Presets compiled into the library.
pub mod factory_presets;

pub use error::ConfigError;
pub use factory_presets::{
    FACTORY_PRESET_NAMES, factory_preset_names, factory_presets, get_factory_preset,
    is_factory_preset,
};
pub use optimize::{OptimizeConfig, OptimizedSequence, coloration, optimize_sequence};
pub use paths::{
    ensure_user_config_dir, ensure_user_presets_dir, find_preset, find_table, list_all_presets,
    list_system_presets, list_user_presets, preset_name_from_path, state_file_path,
    system_presets_dir, user_config_dir, user_presets_dir, user_tables_dir,
};
pub use state::{STATE_VERSION, WidenerState};
pub use table::DecorrelationTable;
pub use validation::{ValidationError, ValidationResult, validate_param, validate_params};

/// Resolves a preset by factory name, file path or user/system preset name,
/// in that order.
///
/// # Errors
///
/// [`ConfigError::PresetNotFound`] if nothing matches, otherwise load errors.
pub fn resolve_preset(name: &str) -> Result<WidenerState, ConfigError> {
    if let Some(state) = get_factory_preset(name) {
        return Ok(state);
    }
    let path = find_preset(name).ok_or_else(|| ConfigError::PresetNotFound(name.to_string()))?;
    WidenerState::load(path)
}
