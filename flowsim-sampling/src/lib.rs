//! Event generation, filter cascade and outcome rates of the sampling flow simulation.
//!
//! The simulation models how errors and transactions flow through client sampling, inbound data
//! filters and server side rules before they end up indexed, dropped or discarded. Every event
//! takes a random route through the chain of [`Filter`]s, which is recorded as a sequence of
//! anchor points for drawing.
//!
//! # Components
//!
//! - [`RateDistribution`]: a normalized weighted distribution that draws categories.
//! - [`generate_events`]: produces a batch of events with sampled attributes.
//! - [`build_filters`]: lays out the filter chain for the given [`FilterRates`].
//! - [`process_events`]: runs events through the filters and decides their outcome.
//! - [`FinalRates`]: the expected outcome fractions computed in closed form, from which counts and
//!   end bands are derived.
//! - [`simulate`]: runs all of the above for a single batch and renders the event paths.
//!
//! # Randomness
//!
//! All random decisions draw from a generator passed in by the caller. Use [`simulate_seeded`] or
//! a seeded [`rand_pcg::Pcg32`] to reproduce a run. The realized outcomes approximate the
//! analytic [`FinalRates`] but never match them exactly.
//!
//! # Example
//!
//! ```
//! use flowsim_sampling::{Population, SimulationParams, simulate_seeded};
//!
//! let params = SimulationParams::new(Population {
//!     error: 500,
//!     performance: 5000,
//! });
//!
//! let result = simulate_seeded(&params, 42).unwrap();
//! assert_eq!(result.events.len(), 5000);
//! assert_eq!(result.realized.total(), 5000);
//! ```
#![warn(missing_docs)]

mod cascade;
mod condition;
mod distribution;
mod filter;
mod generator;
mod layout;
mod rates;
mod simulation;

pub use self::cascade::*;
pub use self::condition::*;
pub use self::distribution::*;
pub use self::filter::*;
pub use self::generator::*;
pub use self::layout::*;
pub use self::rates::*;
pub use self::simulation::*;
