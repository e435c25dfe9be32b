//! Widener Engine - the two-band stereo widener processor
//!
//! This crate assembles the primitives of `widener-core` into a complete
//! stereo processor:
//!
//! - [`StereoWidener`] - per-channel strips, preparation, block processing
//! - [`WidenerParams`] - the six live controls as one snapshot
//! - [`SharedParams`] - lock-free bridge for a separate control thread
//! - [`WidenerSettings`] - construction-time settings (sequence shapes,
//!   timing, seed, precomputed tables)
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use widener_engine::{SharedParams, StereoWidener, WidenerParams, WidenerSettings};
//!
//! let mut widener = StereoWidener::new(WidenerSettings::with_seed(42));
//! widener.prepare(48000.0, 128).unwrap();
//!
//! let shared = Arc::new(SharedParams::new(WidenerParams {
//!     width_lower: 20.0,
//!     width_higher: 70.0,
//!     ..WidenerParams::default()
//! }));
//!
//! // Audio callback
//! let mut left = vec![0.1f32; 128];
//! let mut right = vec![-0.1f32; 128];
//! widener.sync(&shared);
//! let report = widener.process_block(&mut left, &mut right);
//! assert!(report.transient[0].is_none());
//! ```
//!
//! Enable the `tracing` feature to log preparation and mode switches.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod params;
pub mod settings;
mod strip;
pub mod widener;

// Re-export main types at crate root
pub use params::{PARAM_COUNT, SharedParams, WidenerParams, param_descriptor};
pub use settings::WidenerSettings;
pub use widener::{BlockReport, CHANNELS, StereoWidener};
