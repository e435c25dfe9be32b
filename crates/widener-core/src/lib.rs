//! Widener Core - DSP primitives for real-time stereo widening
//!
//! This crate provides the building blocks of a two-band stereo widener:
//! each channel is decorrelated at full band, the direct signal and the
//! decorrelated copy are each split by their own crossover, each band is
//! panned between its direct and decorrelated versions, and the bands are
//! summed back under an amplitude- or energy-preserving law. Everything on
//! the audio path is allocation-free once constructed.
//!
//! ```text
//! x ─┬────────────────────► Crossover ─► (low, high) ─────┐
//!    │                                                    ├─► Panner per band ─► Recombination ─┐
//!    ├─► Decorrelator ─► Crossover ─► (d_low, d_high) ────┘                       (amp/energy)  │
//!    │                                                                                          ▼
//!    └─────────────────────────────────── dry ───────────────────────────────► TransientHandler ─► y
//! ```
//!
//! # Filters
//!
//! - [`Biquad`] / [`BiquadCascade`] - second-order sections and chains
//! - [`Crossover`] - Linkwitz-Riley (phase-preserving) or Butterworth
//!   (energy-preserving) band split
//!
//! # Decorrelation
//!
//! - [`VelvetNoise`] - sparse signed-impulse convolution over a [`DelayLine`]
//! - [`AllpassCascade`] - randomly placed all-pass poles
//! - [`Decorrelator`] - either of the above, chosen at runtime
//!
//! Random sequences and pole sets are drawn from a caller-owned generator
//! (`rand_chacha::ChaCha8Rng`), so a fixed seed reproduces them exactly.
//!
//! # Panning and recombination
//!
//! - [`Panner`] - constant-power width law
//! - [`Recombination`], [`LevelCompensator`], [`EnergyNormalizer`]
//!
//! # Control and transients
//!
//! - [`SmoothedParam`] - block-rate one-pole parameter smoothing
//! - [`LeakyIntegrator`] - attack/release envelope follower
//! - [`OnsetDetector`] - adaptive-threshold onset/offset flags
//! - [`TransientHandler`] - dry/widened crossfade state machine
//!
//! # Interfaces
//!
//! - [`Effect`] - stereo in-place block processor with a fallible `prepare`
//! - [`ParameterInfo`] - index-based parameter discovery
//!
//! # no_std Support
//!
//! Disable the default `std` feature for embedded targets:
//!
//! ```toml
//! [dependencies]
//! widener-core = { version = "0.1", default-features = false }
//! ```
//!
//! Enable the `tracing` feature to log sequence generation and cascade
//! construction (never from the audio path).

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod allpass;
pub mod biquad;
pub mod crossover;
pub mod decorrelator;
pub mod delay;
pub mod effect;
pub mod envelope;
pub mod error;
pub mod math;
pub mod onset;
pub mod panner;
pub mod param;
pub mod param_info;
pub mod transient;
pub mod velvet;

// Re-export main types at crate root
pub use allpass::{AllpassCascade, AllpassConfig};
pub use biquad::{Biquad, BiquadCascade, BiquadCoefficients};
pub use crossover::{Band, Crossover, CrossoverFilter, CrossoverKind};
pub use decorrelator::{Decorrelator, DecorrelatorKind};
pub use delay::DelayLine;
pub use effect::Effect;
pub use envelope::LeakyIntegrator;
pub use error::{PrepareError, SequenceParseError};
pub use math::{correlation, db_to_linear, flush_denormal, linear_to_db};
pub use onset::{OnsetDetector, OnsetFlags};
pub use panner::{EnergyNormalizer, LevelCompensator, Panner, Recombination};
pub use param::SmoothedParam;
pub use param_info::{ParamDescriptor, ParamFlags, ParamId, ParamScale, ParamUnit, ParameterInfo};
pub use transient::{TransientAction, TransientConfig, TransientHandler, TransientState};
pub use velvet::{VelvetConfig, VelvetNoise, line_samples, table_line};
