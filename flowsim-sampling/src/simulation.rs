//! End to end simulation of a single batch.

use flowsim_filter::InboundFiltersConfig;
use flowsim_log::debug;
use flowsim_path::{DEFAULT_RESOLUTION, Path, anchors_to_progress, draw_path};
use flowsim_protocol::{AnchorPoint, Event};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::{
    ByType, DistributionError, EndBands, EventSamplingRates, Filter, FilterRates, FinalRates,
    OutcomeCounts, Population, build_filters, generate_events, process_events,
};

/// Default number of events generated per batch.
pub const DEFAULT_EVENT_COUNT: usize = 5000;

/// Errors returned by [`simulate`].
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// The population cannot be turned into a type distribution.
    #[error("invalid population")]
    Population(#[from] DistributionError),
}

/// Pixel dimensions that paths are scaled to.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Canvas {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Canvas {
    /// Returns the horizontal control point offset for paths drawn on this canvas.
    pub fn control_point_offset(&self) -> f64 {
        self.width / 20.0
    }

    /// Scales normalized anchor points to pixels.
    pub fn scale(&self, anchor_points: &[AnchorPoint]) -> Vec<AnchorPoint> {
        anchor_points
            .iter()
            .map(|anchor| anchor.scaled(self.width, self.height))
            .collect()
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 320.0,
        }
    }
}

/// Parameters of a simulation run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimulationParams {
    /// Size of the population per event type.
    pub population: Population,
    /// Client and server side retention rates.
    pub filter_rates: FilterRates,
    /// Enabled inbound data filters.
    pub inbound_filters: InboundFiltersConfig,
    /// Number of events to generate.
    pub events: usize,
    /// Dimensions of the rendered paths.
    pub canvas: Canvas,
}

impl SimulationParams {
    /// Creates parameters for the given population with default rates and event count.
    pub fn new(population: Population) -> Self {
        Self {
            population,
            events: DEFAULT_EVENT_COUNT,
            ..Default::default()
        }
    }
}

/// The deterministic part of a simulation that only depends on the parameters.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    /// Distributions used to generate events.
    pub sampling_rates: EventSamplingRates,
    /// Combined retention rate of the enabled inbound filters.
    pub inbound_rate: f64,
    /// The ordered filter chain.
    pub filters: Vec<Filter>,
    /// Expected fraction of the population per outcome and type.
    pub final_rates: FinalRates,
    /// Expected fraction of each type's share per outcome.
    pub type_fractions: FinalRates,
    /// Expected counts for the whole population.
    pub counts: OutcomeCounts,
    /// Band of each outcome at the end of the cascade.
    pub end_bands: EndBands,
}

impl Analysis {
    /// Computes rates, filters and bands for the given parameters.
    pub fn new(params: &SimulationParams) -> Result<Self, DistributionError> {
        let sampling_rates = EventSamplingRates::from_population(&params.population)?;
        let inbound_rate = params.inbound_filters.retention_rate();

        let filters = build_filters(&sampling_rates, &params.filter_rates, inbound_rate);
        let final_rates = FinalRates::compute(&sampling_rates, &params.filter_rates, inbound_rate);
        let type_fractions = final_rates.per_type(&sampling_rates.type_shares());

        Ok(Self {
            inbound_rate,
            filters,
            type_fractions,
            counts: final_rates.counts(params.population.sum()),
            end_bands: final_rates.end_bands(),
            final_rates,
            sampling_rates,
        })
    }

    /// Returns the share of each event type in the population.
    pub fn type_shares(&self) -> ByType<f64> {
        self.sampling_rates.type_shares()
    }
}

/// A finalized event with the paths needed to draw and animate it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedEvent {
    /// The event with its finalized anchor points.
    #[serde(flatten)]
    pub event: Event,
    /// The full path through all anchor points.
    pub path: Path,
    /// The path without the final segment.
    pub path_active: Path,
    /// The final segment.
    pub path_inactive: Path,
    /// Progress along the path at which the event was removed, or `1` if it was indexed.
    pub removal_progress: f64,
}

impl RenderedEvent {
    /// Draws the paths of a finalized event on the given canvas.
    pub fn render(event: Event, canvas: &Canvas) -> Self {
        let anchors = canvas.scale(&event.anchor_points);
        let offset = canvas.control_point_offset();

        let path = draw_path(&anchors, offset);
        let path_active = draw_path(&anchors[..anchors.len().saturating_sub(1)], offset);
        let path_inactive = draw_path(&anchors[anchors.len().saturating_sub(2)..], offset);

        // The removal anchor is the last one before the end anchor.
        let removal_index = anchors.len().checked_sub(2).filter(|_| event.is_removed());
        let removal_progress = removal_index
            .and_then(|index| {
                let progress = anchors_to_progress(&path, DEFAULT_RESOLUTION);
                progress.get(index).copied()
            })
            .unwrap_or(1.0);

        Self {
            event,
            path,
            path_active,
            path_inactive,
            removal_progress,
        }
    }
}

/// The result of a simulation run.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    /// Deterministic rates and layout.
    #[serde(flatten)]
    pub analysis: Analysis,
    /// Counts of the simulated outcomes.
    pub realized: OutcomeCounts,
    /// All simulated events.
    pub events: Vec<RenderedEvent>,
}

/// Runs one batch of the simulation.
///
/// Generates `params.events` events, runs them through the filter chain and renders their paths.
pub fn simulate<R>(
    params: &SimulationParams,
    rng: &mut R,
) -> Result<SimulationResult, SimulationError>
where
    R: Rng + ?Sized,
{
    let analysis = Analysis::new(params)?;

    let events = generate_events(params.events, &analysis.sampling_rates, rng);
    let events = process_events(&events, &analysis.filters, &analysis.end_bands, rng);
    let realized = OutcomeCounts::tally(&events);

    debug!(
        events = events.len(),
        indexed = realized.indexed.total(),
        dropped = realized.dropped.total(),
        discarded = realized.discarded.total(),
        "simulated batch"
    );

    let events = events
        .into_iter()
        .map(|event| RenderedEvent::render(event, &params.canvas))
        .collect();

    Ok(SimulationResult {
        analysis,
        realized,
        events,
    })
}

/// Runs one batch of the simulation with a generator seeded from `seed`.
///
/// Runs with the same seed and parameters produce identical results.
pub fn simulate_seeded(
    params: &SimulationParams,
    seed: u64,
) -> Result<SimulationResult, SimulationError> {
    simulate(params, &mut Pcg32::seed_from_u64(seed))
}
