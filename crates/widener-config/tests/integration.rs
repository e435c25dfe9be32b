//! Config round trips driving a real engine.

use widener_config::{
    ConfigError, DecorrelationTable, WidenerState, factory_presets, get_factory_preset,
    list_all_presets, resolve_preset,
};
use widener_core::ParameterInfo;
use widener_engine::{StereoWidener, WidenerParams, WidenerSettings};
use tempfile::TempDir;

const SR: f32 = 48000.0;
const BLOCK: usize = 256;

fn noise(len: usize) -> Vec<f32> {
    // Deterministic LCG so the test does not depend on the rand crate.
    let mut x: u32 = 0x1234_5678;
    (0..len)
        .map(|_| {
            x = x.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (x >> 8) as f32 / (1u32 << 24) as f32 - 0.5
        })
        .collect()
}

fn render(widener: &mut StereoWidener, input: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let (mut left, mut right) = (input.to_vec(), input.to_vec());
    widener.process_block(&mut left, &mut right);
    (left, right)
}

#[test]
fn state_captured_from_engine_restores_engine() {
    let mut original = StereoWidener::new(WidenerSettings::default());
    original.set_params(&WidenerParams {
        width_lower: 35.0,
        width_higher: 80.0,
        cutoff_hz: 900.0,
        amplitude_preserve: false,
        allpass_decorrelation: true,
        handle_transients: true,
    });

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("state.toml");
    WidenerState::capture(&original).save(&path).unwrap();

    let mut restored = StereoWidener::new(WidenerSettings::default());
    WidenerState::load(&path).unwrap().apply(&mut restored);
    assert_eq!(restored.params(), original.params());
    for index in 0..restored.param_count() {
        assert_eq!(restored.get_param(index), original.get_param(index));
    }
}

#[test]
fn every_factory_preset_runs() {
    let input = noise(BLOCK * 8);
    for preset in factory_presets() {
        let mut widener = StereoWidener::new(WidenerSettings::default());
        widener.set_params(&preset.to_params());
        widener.prepare(SR, BLOCK).unwrap();
        let (left, right) = render(&mut widener, &input);
        assert!(
            left.iter().chain(&right).all(|s| s.is_finite() && s.abs() < 4.0),
            "preset {:?}",
            preset.name
        );
    }
}

#[test]
fn generated_table_reproduces_seeded_output() {
    let params = WidenerParams {
        width_lower: 100.0,
        width_higher: 100.0,
        ..WidenerParams::default()
    };
    let settings = WidenerSettings::with_seed(21);
    let input = noise(BLOCK * 4);

    let mut seeded = StereoWidener::new(settings.clone());
    seeded.set_params(&params);
    seeded.prepare(SR, BLOCK).unwrap();

    let table = DecorrelationTable::generate(&settings, SR);
    let mut tabled = StereoWidener::new(WidenerSettings {
        velvet_table: Some(table.into_string()),
        ..settings
    });
    tabled.set_params(&params);
    tabled.prepare(SR, BLOCK).unwrap();

    assert_eq!(render(&mut seeded, &input), render(&mut tabled, &input));
}

#[test]
fn table_file_can_be_installed_at_runtime() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("table.txt");
    DecorrelationTable::generate(&WidenerSettings::with_seed(5), SR)
        .save(&path)
        .unwrap();

    let table = DecorrelationTable::load(&path).unwrap();
    let mut widener = StereoWidener::new(WidenerSettings::default());
    widener.prepare(SR, BLOCK).unwrap();
    widener.set_decorrelation_table(Some(table.as_str())).unwrap();
    assert_eq!(
        widener.velvet(0).unwrap().positions(),
        table.velvet(0, SR).unwrap().positions()
    );
}

#[test]
fn resolve_preset_order() {
    assert_eq!(resolve_preset("Drums").unwrap(), get_factory_preset("drums").unwrap());

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("custom.toml");
    WidenerState::from_params(&WidenerParams {
        width_higher: 42.0,
        ..WidenerParams::default()
    })
    .with_name("Custom")
    .save(&path)
    .unwrap();
    let custom = resolve_preset(path.to_str().unwrap()).unwrap();
    assert_eq!(custom.to_params().width_higher, 42.0);

    assert!(matches!(
        resolve_preset("no_such_preset_98765"),
        Err(ConfigError::PresetNotFound(_))
    ));
}

#[test]
fn listing_presets_does_not_panic() {
    for path in list_all_presets() {
        assert!(path.extension().is_some_and(|ext| ext == "toml"));
    }
}
