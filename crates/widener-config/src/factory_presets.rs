//! Presets compiled into the library.
//!
//! Always available without files on disk, and usable by name wherever a
//! preset path is accepted.

use crate::WidenerState;

/// Names of the built-in presets.
pub static FACTORY_PRESET_NAMES: &[&str] = &["init", "subtle", "wide", "bass_mono", "drums"];

static FACTORY_PRESETS_TOML: &[(&str, &str)] = &[
    ("init", INIT_PRESET),
    ("subtle", SUBTLE_PRESET),
    ("wide", WIDE_PRESET),
    ("bass_mono", BASS_MONO_PRESET),
    ("drums", DRUMS_PRESET),
];

const INIT_PRESET: &str = r#"
version = 1
name = "Init"
description = "Widening off in both bands"

[params]
width_lower = 0.0
width_higher = 0.0
cutoff = 500.0
amplitude_preserve = 1.0
allpass_decorrelation = 0.0
handle_transients = 0.0
"#;

const SUBTLE_PRESET: &str = r#"
version = 1
name = "Subtle"
description = "Gentle widening for mix buses"

[params]
width_lower = 10.0
width_higher = 35.0
cutoff = 600.0
amplitude_preserve = 1.0
allpass_decorrelation = 0.0
handle_transients = 0.0
"#;

const WIDE_PRESET: &str = r#"
version = 1
name = "Wide"
description = "Strong widening for pads and ambiences"

[params]
width_lower = 40.0
width_higher = 90.0
cutoff = 400.0
amplitude_preserve = 0.0
allpass_decorrelation = 1.0
handle_transients = 0.0
"#;

const BASS_MONO_PRESET: &str = r#"
version = 1
name = "Bass Mono"
description = "Keeps the low end centred, widens everything above"

[params]
width_lower = 0.0
width_higher = 70.0
cutoff = 200.0
amplitude_preserve = 1.0
allpass_decorrelation = 0.0
handle_transients = 0.0
"#;

const DRUMS_PRESET: &str = r#"
version = 1
name = "Drums"
description = "Widens the room while keeping attacks dry"

[params]
width_lower = 15.0
width_higher = 60.0
cutoff = 800.0
amplitude_preserve = 1.0
allpass_decorrelation = 0.0
handle_transients = 1.0
"#;

/// All built-in presets, in [`FACTORY_PRESET_NAMES`] order.
pub fn factory_presets() -> Vec<WidenerState> {
    FACTORY_PRESETS_TOML
        .iter()
        .filter_map(|(_, toml)| WidenerState::from_toml(toml).ok())
        .collect()
}

/// Looks up a built-in preset by internal name (`bass_mono`) or display
/// name (`Bass Mono`), ignoring case.
pub fn get_factory_preset(name: &str) -> Option<WidenerState> {
    FACTORY_PRESETS_TOML.iter().find_map(|(key, toml)| {
        let state = WidenerState::from_toml(toml).ok()?;
        let display_matches = state
            .name
            .as_deref()
            .is_some_and(|display| display.eq_ignore_ascii_case(name));
        (key.eq_ignore_ascii_case(name) || display_matches).then_some(state)
    })
}

/// Internal names of the built-in presets.
pub fn factory_preset_names() -> Vec<&'static str> {
    FACTORY_PRESETS_TOML.iter().map(|(name, _)| *name).collect()
}

/// True if `name` refers to a built-in preset.
pub fn is_factory_preset(name: &str) -> bool {
    get_factory_preset(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_presets_parse() {
        for (name, toml) in FACTORY_PRESETS_TOML {
            let state = WidenerState::from_toml(toml)
                .unwrap_or_else(|e| panic!("factory preset '{name}' invalid: {e}"));
            assert_eq!(state.params.len(), 6, "{name}");
            assert!(state.description.is_some(), "{name}");
        }
        assert_eq!(factory_presets().len(), FACTORY_PRESET_NAMES.len());
        assert_eq!(factory_preset_names(), FACTORY_PRESET_NAMES);
    }

    #[test]
    fn lookup_by_key_and_display_name() {
        let by_key = get_factory_preset("bass_mono").unwrap();
        let by_display = get_factory_preset("BASS MONO").unwrap();
        assert_eq!(by_key, by_display);
        assert!(is_factory_preset("Wide"));
        assert!(!is_factory_preset("crunch"));
    }

    #[test]
    fn init_matches_defaults() {
        let init = get_factory_preset("init").unwrap();
        assert_eq!(init.to_params(), widener_engine::WidenerParams::default());
    }

    #[test]
    fn bass_mono_keeps_low_band_centred() {
        let params = get_factory_preset("bass_mono").unwrap().to_params();
        assert_eq!(params.width_lower, 0.0);
        assert!(params.width_higher > 0.0);
    }

    #[test]
    fn drums_handle_transients() {
        assert!(get_factory_preset("drums").unwrap().to_params().handle_transients);
    }
}
