//! Parameter introspection for the widener's control surface.
//!
//! The control path (CLI flags, presets, persisted state, a playback thread)
//! never touches DSP state directly. It discovers parameters through the
//! [`ParameterInfo`] trait and reads/writes them by index. Each parameter is
//! described by a [`ParamDescriptor`] carrying:
//!
//! - display metadata (name, short name, [`ParamUnit`])
//! - the valid range and default, used for clamping at the control boundary
//! - [`ParamId`] - stable numeric ID for persistence
//! - `string_id` - stable textual key used in TOML state and presets
//! - [`ParamScale`] - normalization curve (linear or logarithmic)
//! - [`ParamFlags`] - capability flags (automatable, stepped)
//!
//! # Example
//!
//! ```rust
//! use widener_core::{ParameterInfo, ParamDescriptor, ParamId};
//!
//! struct Width {
//!     percent: f32,
//! }
//!
//! impl ParameterInfo for Width {
//!     fn param_count(&self) -> usize { 1 }
//!
//!     fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
//!         match index {
//!             0 => Some(ParamDescriptor::width("Width", "Width").with_id(ParamId(1), "width")),
//!             _ => None,
//!         }
//!     }
//!
//!     fn get_param(&self, index: usize) -> f32 {
//!         match index {
//!             0 => self.percent,
//!             _ => 0.0,
//!         }
//!     }
//!
//!     fn set_param(&mut self, index: usize, value: f32) {
//!         if let Some(desc) = self.param_info(index) {
//!             self.percent = desc.clamp(value);
//!         }
//!     }
//! }
//!
//! let mut w = Width { percent: 0.0 };
//! w.set_param(0, 250.0);
//! assert_eq!(w.get_param(0), 100.0);
//! assert_eq!(w.find_param_by_string_id("width"), Some(0));
//! ```

/// Scaling curve for parameter normalization.
///
/// - **Linear**: `normalized = (value - min) / (max - min)`
/// - **Logarithmic**: `normalized = ln(value/min) / ln(max/min)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamScale {
    /// Equal resolution across the range.
    #[default]
    Linear,
    /// More resolution at low values. Requires `min > 0.0`.
    Logarithmic,
}

/// Stable parameter identifier that survives reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamId(pub u32);

/// Parameter capability flags.
///
/// ```rust
/// use widener_core::ParamFlags;
///
/// let flags = ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED);
/// assert!(flags.contains(ParamFlags::STEPPED));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamFlags(u8);

impl ParamFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Value may change while audio is running.
    pub const AUTOMATABLE: Self = Self(1 << 0);
    /// Discrete values only (switches).
    pub const STEPPED: Self = Self(1 << 1);

    /// Returns `true` if all bits in `other` are set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of two flag sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl Default for ParamFlags {
    fn default() -> Self {
        Self::AUTOMATABLE
    }
}

/// Index-addressed parameter access.
///
/// Indices are stable for the lifetime of the implementor. `set_param`
/// implementations clamp to the descriptor range and ignore unknown indices;
/// `get_param` returns `0.0` for unknown indices.
pub trait ParameterInfo {
    /// Number of parameters; valid indices are `0..param_count()`.
    fn param_count(&self) -> usize;

    /// Descriptor for `index`, or `None` when out of range.
    fn param_info(&self, index: usize) -> Option<ParamDescriptor>;

    /// Current value of the parameter at `index`.
    fn get_param(&self, index: usize) -> f32;

    /// Sets (and clamps) the parameter at `index`.
    fn set_param(&mut self, index: usize, value: f32);

    /// Finds a parameter by display or short name (case-insensitive).
    fn find_param_by_name(&self, name: &str) -> Option<usize> {
        (0..self.param_count()).find(|&i| {
            self.param_info(i).is_some_and(|desc| {
                desc.name.eq_ignore_ascii_case(name) || desc.short_name.eq_ignore_ascii_case(name)
            })
        })
    }

    /// Finds a parameter by its stable string id.
    fn find_param_by_string_id(&self, string_id: &str) -> Option<usize> {
        (0..self.param_count())
            .find(|&i| self.param_info(i).is_some_and(|desc| desc.string_id == string_id))
    }

    /// Stable [`ParamId`] for `index`.
    fn param_id(&self, index: usize) -> Option<ParamId> {
        self.param_info(index).map(|d| d.id)
    }

    /// Finds a parameter index by its stable [`ParamId`].
    fn param_index_by_id(&self, id: ParamId) -> Option<usize> {
        (0..self.param_count()).find(|&i| self.param_info(i).is_some_and(|d| d.id == id))
    }
}

/// Metadata for one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Full display name (e.g. "Width Low").
    pub name: &'static str,
    /// Short name, 8 characters or less.
    pub short_name: &'static str,
    /// Display unit.
    pub unit: ParamUnit,
    /// Minimum value.
    pub min: f32,
    /// Maximum value.
    pub max: f32,
    /// Value on construction and reset.
    pub default: f32,
    /// Recommended increment for stepwise control.
    pub step: f32,
    /// Stable numeric ID. `ParamId(0)` means unassigned.
    pub id: ParamId,
    /// Stable textual key used in state and preset files.
    pub string_id: &'static str,
    /// Normalization curve.
    pub scale: ParamScale,
    /// Capability flags.
    pub flags: ParamFlags,
}

impl ParamDescriptor {
    /// Stereo width in percent (0–100, default 0).
    pub fn width(name: &'static str, short_name: &'static str) -> Self {
        Self {
            name,
            short_name,
            unit: ParamUnit::Percent,
            min: 0.0,
            max: 100.0,
            default: 0.0,
            step: 1.0,
            id: ParamId(0),
            string_id: "",
            scale: ParamScale::Linear,
            flags: ParamFlags::AUTOMATABLE,
        }
    }

    /// Frequency in Hz with logarithmic scaling.
    pub fn frequency_hz(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            short_name,
            unit: ParamUnit::Hertz,
            min,
            max,
            default,
            step: 1.0,
            id: ParamId(0),
            string_id: "",
            scale: ParamScale::Logarithmic,
            flags: ParamFlags::AUTOMATABLE,
        }
    }

    /// On/off switch stored as `0.0` / `1.0`.
    pub fn toggle(name: &'static str, short_name: &'static str, default_on: bool) -> Self {
        Self {
            name,
            short_name,
            unit: ParamUnit::None,
            min: 0.0,
            max: 1.0,
            default: if default_on { 1.0 } else { 0.0 },
            step: 1.0,
            id: ParamId(0),
            string_id: "",
            scale: ParamScale::Linear,
            flags: ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED),
        }
    }

    /// Sets the stable parameter ID and string ID.
    pub const fn with_id(mut self, id: ParamId, string_id: &'static str) -> Self {
        self.id = id;
        self.string_id = string_id;
        self
    }

    /// Sets the normalization scale.
    pub const fn with_scale(mut self, scale: ParamScale) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the parameter flags.
    pub const fn with_flags(mut self, flags: ParamFlags) -> Self {
        self.flags = flags;
        self
    }

    /// True for on/off switches.
    pub const fn is_toggle(&self) -> bool {
        self.flags.contains(ParamFlags::STEPPED)
    }

    /// Clamps a value to this parameter's range; stepped values snap to the
    /// nearest step. NaN maps to the default.
    ///
    /// ```rust
    /// use widener_core::ParamDescriptor;
    ///
    /// let desc = ParamDescriptor::frequency_hz("Crossover", "XOver", 100.0, 8000.0, 500.0);
    /// assert_eq!(desc.clamp(20.0), 100.0);
    /// assert_eq!(desc.clamp(20000.0), 8000.0);
    /// ```
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.default;
        }
        let clamped = value.clamp(self.min, self.max);
        if self.is_toggle() {
            libm::roundf(clamped)
        } else {
            clamped
        }
    }

    /// Converts a plain value to `[0, 1]`, respecting [`ParamScale`].
    #[inline]
    pub fn normalize(&self, value: f32) -> f32 {
        let range = self.max - self.min;
        if range == 0.0 {
            return 0.0;
        }
        match self.scale {
            ParamScale::Linear => (value - self.min) / range,
            ParamScale::Logarithmic => {
                if self.min <= 0.0 || value <= 0.0 {
                    return 0.0;
                }
                libm::logf(value / self.min) / libm::logf(self.max / self.min)
            }
        }
    }

    /// Inverse of [`normalize`](Self::normalize).
    #[inline]
    pub fn denormalize(&self, normalized: f32) -> f32 {
        match self.scale {
            ParamScale::Linear => self.min + normalized * (self.max - self.min),
            ParamScale::Logarithmic => {
                if self.min <= 0.0 {
                    return self.min;
                }
                self.min * libm::powf(self.max / self.min, normalized)
            }
        }
    }
}

/// Display unit of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamUnit {
    /// Percentage.
    Percent,
    /// Hertz.
    Hertz,
    /// Dimensionless (switches).
    None,
}

impl ParamUnit {
    /// Suffix appended when printing a value.
    pub const fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::Percent => "%",
            ParamUnit::Hertz => " Hz",
            ParamUnit::None => "",
        }
    }
}
