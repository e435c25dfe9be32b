//! Validation of persisted control values.
//!
//! State and preset files address parameters by their stable string id
//! (`width_lower`, `cutoff`, ...). Validation checks each key against the
//! widener's parameter descriptors before anything reaches the engine.
//!
//! ```rust
//! use widener_config::validation::{validate_param, ValidationError};
//!
//! assert_eq!(validate_param("cutoff", 1200.0), Ok(2));
//! assert!(matches!(
//!     validate_param("width_lower", 140.0),
//!     Err(ValidationError::OutOfRange { .. })
//! ));
//! ```

use std::collections::BTreeMap;

use thiserror::Error;
use widener_core::ParamDescriptor;
use widener_engine::{PARAM_COUNT, param_descriptor};

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// No parameter with this string id.
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    /// Parameter value out of range.
    #[error("parameter '{param}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// String id of the parameter.
        param: String,
        /// The value that was out of range.
        value: f32,
        /// Minimum allowed value.
        min: f32,
        /// Maximum allowed value.
        max: f32,
    },

    /// NaN or infinite value.
    #[error("parameter '{0}' is not a finite number")]
    NotFinite(String),

    /// File written by a newer format version.
    #[error("unsupported state version {found} (newest supported is {supported})")]
    UnsupportedVersion {
        /// Version found in the file.
        found: u32,
        /// Newest version this build reads.
        supported: u32,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Index and descriptor of the parameter with `string_id`.
pub fn find_param(string_id: &str) -> Option<(usize, ParamDescriptor)> {
    (0..PARAM_COUNT)
        .filter_map(|index| param_descriptor(index).map(|desc| (index, desc)))
        .find(|(_, desc)| desc.string_id == string_id)
}

/// Checks one value and returns the parameter index it addresses.
///
/// # Errors
///
/// Unknown id, non-finite value, or a value outside the descriptor range.
pub fn validate_param(string_id: &str, value: f32) -> ValidationResult<usize> {
    let (index, desc) =
        find_param(string_id).ok_or_else(|| ValidationError::UnknownParameter(string_id.into()))?;
    if !value.is_finite() {
        return Err(ValidationError::NotFinite(string_id.into()));
    }
    if value < desc.min || value > desc.max {
        return Err(ValidationError::OutOfRange {
            param: string_id.into(),
            value,
            min: desc.min,
            max: desc.max,
        });
    }
    Ok(index)
}

/// Checks every entry of a parameter map.
///
/// # Errors
///
/// A single error is returned as is; several are wrapped in
/// [`ValidationError::Multiple`] in key order.
pub fn validate_params(params: &BTreeMap<String, f32>) -> ValidationResult<()> {
    let mut errors: Vec<ValidationError> = params
        .iter()
        .filter_map(|(id, &value)| validate_param(id, value).err())
        .collect();
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_param_is_findable() {
        for index in 0..PARAM_COUNT {
            let desc = param_descriptor(index).unwrap();
            assert_eq!(find_param(desc.string_id).map(|(i, _)| i), Some(index));
        }
        assert!(find_param("Width Low").is_none());
    }

    #[test]
    fn range_edges_are_valid() {
        assert_eq!(validate_param("width_lower", 0.0), Ok(0));
        assert_eq!(validate_param("width_higher", 100.0), Ok(1));
        assert_eq!(validate_param("cutoff", 100.0), Ok(2));
        assert_eq!(validate_param("cutoff", 8000.0), Ok(2));
        assert_eq!(validate_param("handle_transients", 1.0), Ok(5));
    }

    #[test]
    fn out_of_range_reports_bounds() {
        let err = validate_param("cutoff", 20.0).unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutOfRange {
                param: "cutoff".into(),
                value: 20.0,
                min: 100.0,
                max: 8000.0,
            }
        );
        assert_eq!(
            err.to_string(),
            "parameter 'cutoff' value 20 out of range [100, 8000]"
        );
    }

    #[test]
    fn nan_and_unknown() {
        assert_eq!(
            validate_param("width_lower", f32::NAN),
            Err(ValidationError::NotFinite("width_lower".into()))
        );
        assert_eq!(
            validate_param("drive", 0.5),
            Err(ValidationError::UnknownParameter("drive".into()))
        );
    }

    #[test]
    fn collects_multiple() {
        let mut params = BTreeMap::new();
        params.insert("width_lower".to_string(), 50.0);
        assert!(validate_params(&params).is_ok());

        params.insert("depth".to_string(), 1.0);
        assert!(matches!(
            validate_params(&params),
            Err(ValidationError::UnknownParameter(_))
        ));

        params.insert("cutoff".to_string(), 9000.0);
        let Err(ValidationError::Multiple(errors)) = validate_params(&params) else {
            panic!("expected multiple errors");
        };
        assert_eq!(errors.len(), 2);
        // BTreeMap order: cutoff before depth.
        assert!(matches!(errors[0], ValidationError::OutOfRange { .. }));
    }
}
