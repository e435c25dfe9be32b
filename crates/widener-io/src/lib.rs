//! Audio I/O for the stereo widener.
//!
//! - **WAV files**: [`read_wav_stereo`], [`write_wav_stereo`] and
//!   [`read_wav_info`] over `hound`
//! - **Offline rendering**: [`OfflineRenderer`] drives any [`Effect`] over a
//!   whole file in fixed-size blocks
//! - **Playback**: [`OutputStream`] feeds a stereo callback to a `cpal`
//!   output device until stopped
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use widener_engine::{StereoWidener, WidenerSettings};
//! use widener_io::{OfflineRenderer, read_wav_stereo, write_wav_stereo};
//!
//! let (input, spec) = read_wav_stereo("input.wav")?;
//! let mut renderer = OfflineRenderer::new(StereoWidener::new(WidenerSettings::default()), 512);
//! let output = renderer.render(&input, spec.sample_rate as f32)?;
//! write_wav_stereo("output.wav", &output, spec)?;
//! ```
//!
//! [`Effect`]: widener_core::Effect

mod render;
mod stream;
mod wav;

pub use render::OfflineRenderer;
pub use stream::{
    AudioDevice, OutputStream, StopHandle, default_output_device, list_devices,
    list_output_devices,
};
pub use wav::{
    StereoSamples, WavFormat, WavInfo, WavSpec, read_wav_info, read_wav_stereo, write_wav_stereo,
};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested sample format is not supported.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The effect rejected the sample rate or block size.
    #[error("Cannot prepare effect: {0}")]
    Prepare(#[from] widener_core::PrepareError),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
