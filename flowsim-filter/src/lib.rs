//! Inbound data filters.
//!
//! Inbound filters discard events before any server-side rule sees them. The simulation does not
//! inspect event payloads. Instead, each enabled filter removes a fixed share of the traffic:
//!
//! * localhost (events originating from the local machine)
//! * browser extensions (events caused by known problematic browser extensions)
//! * web crawlers (events sent by user agents known to be web crawlers)
//! * legacy browsers (events originating from legacy browsers)
//!
//! The combined retention rate of all enabled filters is available through
//! [`InboundFiltersConfig::retention_rate`].
#![warn(missing_docs)]

mod common;
mod config;

pub use crate::common::*;
pub use crate::config::*;
