//! Event and anchor point types for the sampling flow simulation.
//!
//! Every simulated [`Event`] carries three categorical attributes ([`EventType`], [`Release`] and
//! [`Environment`]) and the ordered [`AnchorPoint`]s its visual path passes through. Filters match
//! on the attributes through the [`Getter`] trait and decide the event's [`Outcome`].
#![warn(missing_docs)]

mod attributes;
mod event;

pub use crate::attributes::*;
pub use crate::event::*;
