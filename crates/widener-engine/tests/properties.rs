//! Property-based tests for the stereo widener.
//!
//! For any control values, block size and bounded input, the widener must
//! produce finite, bounded output and leave identical inputs identical at
//! width 0.

use proptest::prelude::*;
use widener_engine::{PARAM_COUNT, StereoWidener, WidenerParams, WidenerSettings, param_descriptor};

const SAMPLE_RATE: f32 = 48000.0;

/// Builds a control snapshot from normalized `[0, 1]` values.
fn params_from(normalized: &[f32; PARAM_COUNT]) -> WidenerParams {
    let mut params = WidenerParams::default();
    for (index, &t) in normalized.iter().enumerate() {
        let desc = param_descriptor(index).unwrap();
        params.set(index, desc.denormalize(t));
    }
    params
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Output stays finite and bounded for random parameters and input.
    #[test]
    fn output_is_finite_and_bounded(
        normalized in prop::array::uniform6(0.0f32..=1.0f32),
        input in prop::collection::vec(-1.0f32..=1.0f32, 1024),
        block_size in prop::sample::select(vec![32usize, 64, 128, 256, 333]),
        seed in any::<u64>(),
    ) {
        let params = params_from(&normalized);
        let mut widener = StereoWidener::new(WidenerSettings::with_seed(seed));
        widener.set_params(&params);
        widener.prepare(SAMPLE_RATE, block_size).unwrap();

        let mut left = input.clone();
        let mut right: Vec<f32> = input.iter().rev().copied().collect();
        widener.process_block(&mut left, &mut right);

        for (i, (&l, &r)) in left.iter().zip(&right).enumerate() {
            prop_assert!(l.is_finite() && r.is_finite(), "sample {} with {:?}", i, params);
            prop_assert!(l.abs() < 32.0 && r.abs() < 32.0, "sample {} = ({}, {})", i, l, r);
        }
    }

    /// Parameters written through the control path always land in range.
    #[test]
    fn params_are_clamped(values in prop::array::uniform6(-1.0e5f32..1.0e5f32)) {
        let mut params = WidenerParams::default();
        for (index, &v) in values.iter().enumerate() {
            params.set(index, v);
        }
        for index in 0..PARAM_COUNT {
            let desc = param_descriptor(index).unwrap();
            let v = params.get(index);
            prop_assert!(v >= desc.min && v <= desc.max, "{} = {}", desc.string_id, v);
        }
    }

    /// Identical channels stay identical at width 0 in every mode.
    #[test]
    fn width_zero_keeps_mono_mono(
        cutoff in 100.0f32..8000.0f32,
        amplitude_preserve in any::<bool>(),
        allpass_decorrelation in any::<bool>(),
        input in prop::collection::vec(-1.0f32..=1.0f32, 512),
    ) {
        let mut widener = StereoWidener::default();
        widener.set_params(&WidenerParams {
            cutoff_hz: cutoff,
            amplitude_preserve,
            allpass_decorrelation,
            ..WidenerParams::default()
        });
        widener.prepare(SAMPLE_RATE, 128).unwrap();

        let mut left = input.clone();
        let mut right = input;
        widener.process_block(&mut left, &mut right);
        prop_assert_eq!(left, right);
    }
}
