//! Error types for the fallible, non-realtime entry points.
//!
//! Per-sample and per-block processing never fails; only preparation and
//! parsing of precomputed decorrelation tables can.

/// Errors from parsing a precomputed velvet-noise sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceParseError {
    /// A token could not be parsed as a float (zero-based token index).
    InvalidNumber {
        /// Index of the offending token within its line.
        index: usize,
    },
    /// The line contained no tokens.
    Empty,
    /// The table has fewer channel lines than required.
    MissingChannel {
        /// Zero-based channel index without a line.
        channel: usize,
    },
}

impl core::fmt::Display for SequenceParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidNumber { index } => write!(f, "invalid number at token {index}"),
            Self::Empty => write!(f, "sequence has no entries"),
            Self::MissingChannel { channel } => write!(f, "no sequence for channel {channel}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SequenceParseError {}

/// Errors from preparing a processor for a sample rate and block size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrepareError {
    /// Sample rate was zero, negative, or not finite.
    InvalidSampleRate(f32),
    /// Block size was zero.
    InvalidBlockSize,
    /// The precomputed decorrelation table could not be used.
    Table(SequenceParseError),
}

impl From<SequenceParseError> for PrepareError {
    fn from(err: SequenceParseError) -> Self {
        Self::Table(err)
    }
}

impl PrepareError {
    /// Validates a sample rate and block size pair.
    pub fn check(sample_rate: f32, block_size: usize) -> Result<(), Self> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(Self::InvalidSampleRate(sample_rate));
        }
        if block_size == 0 {
            return Err(Self::InvalidBlockSize);
        }
        Ok(())
    }
}

impl core::fmt::Display for PrepareError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidSampleRate(sr) => write!(f, "invalid sample rate {sr}"),
            Self::InvalidBlockSize => write!(f, "block size must be at least one sample"),
            Self::Table(err) => write!(f, "decorrelation table: {err}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PrepareError {}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            SequenceParseError::InvalidNumber { index: 3 }.to_string(),
            "invalid number at token 3"
        );
        assert_eq!(
            PrepareError::InvalidSampleRate(-1.0).to_string(),
            "invalid sample rate -1"
        );
        assert_eq!(
            PrepareError::InvalidBlockSize.to_string(),
            "block size must be at least one sample"
        );
    }

    #[test]
    fn prepare_check() {
        assert!(PrepareError::check(44100.0, 1).is_ok());
        assert_eq!(
            PrepareError::check(f32::NAN, 64).map_err(|e| matches!(e, PrepareError::InvalidSampleRate(_))),
            Err(true)
        );
        assert_eq!(PrepareError::check(48000.0, 0), Err(PrepareError::InvalidBlockSize));
    }

    #[test]
    fn table_errors_convert() {
        let err: PrepareError = SequenceParseError::MissingChannel { channel: 1 }.into();
        assert_eq!(err.to_string(), "decorrelation table: no sequence for channel 1");
    }
}
