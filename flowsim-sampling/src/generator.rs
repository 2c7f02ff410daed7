//! Generation of event batches with sampled attributes.

use flowsim_log::debug;
use flowsim_protocol::{AnchorPoint, Environment, Event, EventType, Release, START_ANCHOR};
use rand::Rng;
use serde::Serialize;

use crate::{Band, ByType, DistributionError, Population, RateDistribution};

/// The band that all events start in at `x = 0`.
pub const ORIGIN_BAND: Band = Band::new(0.0, 0.25);

/// Share of events sent from each release.
pub const RELEASE_RATES: [(Release, f64); 2] = [(Release::V1, 0.4), (Release::V2, 0.6)];

/// Share of events sent from each environment.
pub const ENVIRONMENT_RATES: [(Environment, f64); 2] =
    [(Environment::Prod, 0.8), (Environment::Stage, 0.2)];

/// Independent distributions used to assign attributes to generated events.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventSamplingRates {
    /// Distribution of event types.
    #[serde(rename = "type")]
    pub ty: RateDistribution<EventType>,
    /// Distribution of releases.
    pub release: RateDistribution<Release>,
    /// Distribution of environments.
    pub environment: RateDistribution<Environment>,
}

impl EventSamplingRates {
    /// Derives sampling rates from a population.
    ///
    /// The type distribution follows the population split. Releases and environments use a fixed
    /// mix.
    pub fn from_population(population: &Population) -> Result<Self, DistributionError> {
        Ok(Self {
            ty: RateDistribution::new([
                (EventType::Error, f64::from(population.error)),
                (EventType::Performance, f64::from(population.performance)),
            ])?,
            release: RateDistribution::new(RELEASE_RATES)?,
            environment: RateDistribution::new(ENVIRONMENT_RATES)?,
        })
    }

    /// Returns the share of each event type.
    pub fn type_shares(&self) -> ByType<f64> {
        ByType {
            error: self.ty.rate(EventType::Error),
            performance: self.ty.rate(EventType::Performance),
        }
    }
}

/// Generates a batch of `count` events.
///
/// Type, environment and release are drawn independently. Every event starts with a single
/// anchor point at `x = 0` and a uniform position within [`ORIGIN_BAND`].
pub fn generate_events<R>(count: usize, rates: &EventSamplingRates, rng: &mut R) -> Vec<Event>
where
    R: Rng + ?Sized,
{
    let events = (0..count)
        .map(|_| {
            let ty = rates.ty.sample(rng);
            let environment = rates.environment.sample(rng);
            let release = rates.release.sample(rng);
            let origin = AnchorPoint::new(START_ANCHOR, 0.0, ORIGIN_BAND.sample(rng));
            Event::new(ty, release, environment, origin)
        })
        .collect::<Vec<_>>();

    debug!(count, "generated event batch");
    events
}
