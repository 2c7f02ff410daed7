//! Configuration for the sampling flow simulation CLI.
//!
//! The configuration lives in a directory holding a single `config.yml`. Every value has a
//! default, so an empty or partial file is valid:
//!
//! ```yaml
//! population:
//!   error: 500
//!   performance: 5000
//! filter_rates:
//!   sampleRate: 0.5
//!   traceSampleRate: 0.2
//! inbound_filters:
//!   localhost:
//!     isEnabled: true
//! simulation:
//!   events: 5000
//!   seed: 42
//! logging:
//!   level: debug
//! ```
//!
//! Values can be overridden from the command line through [`OverridableConfig`]. Loaded and
//! overridden values are validated: populations, event counts, canvas size and animation duration
//! must be positive, and retention rates are clamped into `[0, 1]`.
#![warn(missing_docs)]

mod config;

pub use crate::config::*;
