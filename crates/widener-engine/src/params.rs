//! Control-parameter snapshot and the lock-free bridge that carries it.
//!
//! [`WidenerParams`] is the plain value set the engine consumes at the start
//! of every block. [`SharedParams`] stores the same six values in atomics so
//! a control thread (CLI sweep, host automation) can write while the audio
//! thread reads, with no locks on either side.
//!
//! ## Parameter Indices (`ParameterInfo`)
//!
//! | Index | Id | Name | Range | Default |
//! |-------|----|------|-------|---------|
//! | 0 | `width_lower` | Width Low | 0–100 % | 0 |
//! | 1 | `width_higher` | Width High | 0–100 % | 0 |
//! | 2 | `cutoff` | Crossover | 100–8000 Hz | 500 |
//! | 3 | `amplitude_preserve` | Amplitude Preserve | 0/1 | 1 |
//! | 4 | `allpass_decorrelation` | All-pass Decorrelation | 0/1 | 0 |
//! | 5 | `handle_transients` | Handle Transients | 0/1 | 0 |

use core::sync::atomic::{AtomicU32, Ordering};

use widener_core::{ParamDescriptor, ParamId, ParameterInfo};

/// Number of control parameters.
pub const PARAM_COUNT: usize = 6;

/// Index of the low-band width.
pub const WIDTH_LOWER: usize = 0;
/// Index of the high-band width.
pub const WIDTH_HIGHER: usize = 1;
/// Index of the crossover frequency.
pub const CUTOFF: usize = 2;
/// Index of the amplitude-preserve switch.
pub const AMPLITUDE_PRESERVE: usize = 3;
/// Index of the all-pass decorrelation switch.
pub const ALLPASS_DECORRELATION: usize = 4;
/// Index of the transient handling switch.
pub const HANDLE_TRANSIENTS: usize = 5;

/// Lowest crossover frequency in Hz.
pub const MIN_CUTOFF_HZ: f32 = 100.0;
/// Highest crossover frequency in Hz.
pub const MAX_CUTOFF_HZ: f32 = 8000.0;
/// Default crossover frequency in Hz.
pub const DEFAULT_CUTOFF_HZ: f32 = 500.0;

/// Descriptor for the parameter at `index`.
pub fn param_descriptor(index: usize) -> Option<ParamDescriptor> {
    let desc = match index {
        WIDTH_LOWER => {
            ParamDescriptor::width("Width Low", "Lo Width").with_id(ParamId(100), "width_lower")
        }
        WIDTH_HIGHER => {
            ParamDescriptor::width("Width High", "Hi Width").with_id(ParamId(101), "width_higher")
        }
        CUTOFF => ParamDescriptor::frequency_hz(
            "Crossover",
            "XOver",
            MIN_CUTOFF_HZ,
            MAX_CUTOFF_HZ,
            DEFAULT_CUTOFF_HZ,
        )
        .with_id(ParamId(102), "cutoff"),
        AMPLITUDE_PRESERVE => ParamDescriptor::toggle("Amplitude Preserve", "AmpPres", true)
            .with_id(ParamId(103), "amplitude_preserve"),
        ALLPASS_DECORRELATION => ParamDescriptor::toggle("All-pass Decorrelation", "Allpass", false)
            .with_id(ParamId(104), "allpass_decorrelation"),
        HANDLE_TRANSIENTS => ParamDescriptor::toggle("Handle Transients", "Trans", false)
            .with_id(ParamId(105), "handle_transients"),
        _ => return None,
    };
    Some(desc)
}

fn flag(value: bool) -> f32 {
    if value { 1.0 } else { 0.0 }
}

/// One block's worth of control values.
///
/// Values are always within their descriptor range when produced through
/// [`set`](Self::set), [`clamped`](Self::clamped) or [`SharedParams::load`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidenerParams {
    /// Low-band width, 0–100 %.
    pub width_lower: f32,
    /// High-band width, 0–100 %.
    pub width_higher: f32,
    /// Crossover frequency in Hz.
    pub cutoff_hz: f32,
    /// Phase-preserving bank with per-band level matching when set,
    /// Butterworth bank with energy normalisation otherwise.
    pub amplitude_preserve: bool,
    /// All-pass decorrelation when set, velvet noise otherwise.
    pub allpass_decorrelation: bool,
    /// Crossfade to the dry signal around transients.
    pub handle_transients: bool,
}

impl Default for WidenerParams {
    fn default() -> Self {
        Self {
            width_lower: 0.0,
            width_higher: 0.0,
            cutoff_hz: DEFAULT_CUTOFF_HZ,
            amplitude_preserve: true,
            allpass_decorrelation: false,
            handle_transients: false,
        }
    }
}

impl WidenerParams {
    /// Returns a copy with every value clamped to its range.
    pub fn clamped(self) -> Self {
        let mut out = self;
        for index in [WIDTH_LOWER, WIDTH_HIGHER, CUTOFF] {
            out.set(index, self.get(index));
        }
        out
    }

    /// Value at `index` as a float (switches read `0.0`/`1.0`).
    pub fn get(&self, index: usize) -> f32 {
        match index {
            WIDTH_LOWER => self.width_lower,
            WIDTH_HIGHER => self.width_higher,
            CUTOFF => self.cutoff_hz,
            AMPLITUDE_PRESERVE => flag(self.amplitude_preserve),
            ALLPASS_DECORRELATION => flag(self.allpass_decorrelation),
            HANDLE_TRANSIENTS => flag(self.handle_transients),
            _ => 0.0,
        }
    }

    /// Clamps `value` to the range of `index` and stores it.
    pub fn set(&mut self, index: usize, value: f32) {
        let Some(desc) = param_descriptor(index) else {
            return;
        };
        let value = desc.clamp(value);
        match index {
            WIDTH_LOWER => self.width_lower = value,
            WIDTH_HIGHER => self.width_higher = value,
            CUTOFF => self.cutoff_hz = value,
            AMPLITUDE_PRESERVE => self.amplitude_preserve = value >= 0.5,
            ALLPASS_DECORRELATION => self.allpass_decorrelation = value >= 0.5,
            HANDLE_TRANSIENTS => self.handle_transients = value >= 0.5,
            _ => {}
        }
    }
}

impl ParameterInfo for WidenerParams {
    fn param_count(&self) -> usize {
        PARAM_COUNT
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        param_descriptor(index)
    }

    fn get_param(&self, index: usize) -> f32 {
        self.get(index)
    }

    fn set_param(&mut self, index: usize, value: f32) {
        self.set(index, value);
    }
}

/// Lock-free control values shared between a control thread and the
/// audio thread.
///
/// Each value is an `f32` stored as bits in an [`AtomicU32`]. Writers clamp
/// through the parameter descriptors, so the audio thread never sees an
/// out-of-range value. All accesses are `Relaxed`: parameters are
/// independent and a block may see a mix of old and new values.
///
/// ```rust
/// use std::sync::Arc;
/// use widener_engine::{SharedParams, WidenerParams, params::WIDTH_HIGHER};
///
/// let shared = Arc::new(SharedParams::new(WidenerParams::default()));
/// let control = Arc::clone(&shared);
/// std::thread::spawn(move || control.set(WIDTH_HIGHER, 250.0)).join().unwrap();
/// assert_eq!(shared.load().width_higher, 100.0);
/// ```
#[derive(Debug)]
pub struct SharedParams {
    values: [AtomicU32; PARAM_COUNT],
}

impl SharedParams {
    /// Creates a bridge holding `params` (clamped).
    pub fn new(params: WidenerParams) -> Self {
        let params = params.clamped();
        Self {
            values: core::array::from_fn(|i| AtomicU32::new(params.get(i).to_bits())),
        }
    }

    /// Reads one value.
    pub fn get(&self, index: usize) -> f32 {
        self.values
            .get(index)
            .map_or(0.0, |v| f32::from_bits(v.load(Ordering::Relaxed)))
    }

    /// Clamps and writes one value. Unknown indices are ignored.
    pub fn set(&self, index: usize, value: f32) {
        if let (Some(slot), Some(desc)) = (self.values.get(index), param_descriptor(index)) {
            slot.store(desc.clamp(value).to_bits(), Ordering::Relaxed);
        }
    }

    /// Writes a whole snapshot.
    pub fn store(&self, params: &WidenerParams) {
        for index in 0..PARAM_COUNT {
            self.set(index, params.get(index));
        }
    }

    /// Reads a whole snapshot.
    pub fn load(&self) -> WidenerParams {
        let mut params = WidenerParams::default();
        for index in 0..PARAM_COUNT {
            params.set(index, self.get(index));
        }
        params
    }
}

impl Default for SharedParams {
    fn default() -> Self {
        Self::new(WidenerParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_defaults() {
        let params = WidenerParams::default();
        for index in 0..PARAM_COUNT {
            let desc = param_descriptor(index).unwrap();
            assert_eq!(params.get(index), desc.default, "{}", desc.string_id);
        }
        assert!(param_descriptor(PARAM_COUNT).is_none());
    }

    #[test]
    fn string_ids_are_stable() {
        let params = WidenerParams::default();
        assert_eq!(params.find_param_by_string_id("width_lower"), Some(WIDTH_LOWER));
        assert_eq!(params.find_param_by_string_id("cutoff"), Some(CUTOFF));
        assert_eq!(
            params.find_param_by_string_id("handle_transients"),
            Some(HANDLE_TRANSIENTS)
        );
        assert_eq!(params.find_param_by_name("crossover"), Some(CUTOFF));
    }

    #[test]
    fn set_clamps_to_range() {
        let mut params = WidenerParams::default();
        params.set(WIDTH_LOWER, -5.0);
        params.set(WIDTH_HIGHER, 140.0);
        params.set(CUTOFF, 20.0);
        assert_eq!(params.width_lower, 0.0);
        assert_eq!(params.width_higher, 100.0);
        assert_eq!(params.cutoff_hz, MIN_CUTOFF_HZ);

        params.set(CUTOFF, 1.0e6);
        assert_eq!(params.cutoff_hz, MAX_CUTOFF_HZ);
    }

    #[test]
    fn switches_round_to_bool() {
        let mut params = WidenerParams::default();
        params.set(ALLPASS_DECORRELATION, 0.7);
        params.set(AMPLITUDE_PRESERVE, 0.2);
        assert!(params.allpass_decorrelation);
        assert!(!params.amplitude_preserve);
        assert_eq!(params.get(ALLPASS_DECORRELATION), 1.0);
    }

    #[test]
    fn clamped_fixes_direct_field_writes() {
        let params = WidenerParams {
            width_lower: 300.0,
            cutoff_hz: f32::NAN,
            ..WidenerParams::default()
        }
        .clamped();
        assert_eq!(params.width_lower, 100.0);
        assert_eq!(params.cutoff_hz, DEFAULT_CUTOFF_HZ);
    }

    #[test]
    fn shared_round_trip() {
        let shared = SharedParams::default();
        let params = WidenerParams {
            width_lower: 30.0,
            width_higher: 80.0,
            cutoff_hz: 1200.0,
            amplitude_preserve: false,
            allpass_decorrelation: true,
            handle_transients: true,
        };
        shared.store(&params);
        assert_eq!(shared.load(), params);
    }

    #[test]
    fn shared_ignores_unknown_index() {
        let shared = SharedParams::default();
        shared.set(42, 1.0);
        assert_eq!(shared.get(42), 0.0);
        assert_eq!(shared.load(), WidenerParams::default());
    }
}
