//! Analytic outcome rates and their derived counts and bands.

use std::ops::Add;

use flowsim_log::warn;
use flowsim_protocol::{Environment, Event, EventType, Outcome, Release};
use serde::{Deserialize, Serialize};

use crate::{Band, EventSamplingRates};

/// Share of the end column taken by the outcome bands.
const END_BAND_SCALE: f64 = 0.8;

/// Gap between the indexed and the dropped end band.
const END_BAND_GAP: f64 = 0.1;

/// A value for each event type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ByType<T> {
    /// The value for error events.
    pub error: T,
    /// The value for performance events.
    pub performance: T,
}

impl<T> ByType<T> {
    /// Returns the value for the given event type.
    pub fn get(&self, ty: EventType) -> &T {
        match ty {
            EventType::Error => &self.error,
            EventType::Performance => &self.performance,
        }
    }

    /// Returns a mutable reference to the value for the given event type.
    pub fn get_mut(&mut self, ty: EventType) -> &mut T {
        match ty {
            EventType::Error => &mut self.error,
            EventType::Performance => &mut self.performance,
        }
    }

    /// Applies `f` to the value of every event type.
    pub fn map<U, F>(self, mut f: F) -> ByType<U>
    where
        F: FnMut(EventType, T) -> U,
    {
        ByType {
            error: f(EventType::Error, self.error),
            performance: f(EventType::Performance, self.performance),
        }
    }
}

impl<T: Add<Output = T>> ByType<T> {
    /// Returns the sum over all event types.
    pub fn total(self) -> T {
        self.error + self.performance
    }
}

/// A value for each outcome.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ByOutcome<T> {
    /// The value for indexed events.
    pub indexed: T,
    /// The value for dropped events.
    pub dropped: T,
    /// The value for discarded events.
    pub discarded: T,
}

impl<T> ByOutcome<T> {
    /// Returns the value for the given outcome.
    pub fn get(&self, outcome: Outcome) -> &T {
        match outcome {
            Outcome::Indexed => &self.indexed,
            Outcome::Dropped => &self.dropped,
            Outcome::Discarded => &self.discarded,
        }
    }

    /// Returns a mutable reference to the value for the given outcome.
    pub fn get_mut(&mut self, outcome: Outcome) -> &mut T {
        match outcome {
            Outcome::Indexed => &mut self.indexed,
            Outcome::Dropped => &mut self.dropped,
            Outcome::Discarded => &mut self.discarded,
        }
    }

    /// Applies `f` to the value of every outcome.
    pub fn map<U, F>(self, mut f: F) -> ByOutcome<U>
    where
        F: FnMut(Outcome, T) -> U,
    {
        ByOutcome {
            indexed: f(Outcome::Indexed, self.indexed),
            dropped: f(Outcome::Dropped, self.dropped),
            discarded: f(Outcome::Discarded, self.discarded),
        }
    }
}

/// Number of events of each type in the simulated population.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Population {
    /// Number of error events.
    pub error: u32,
    /// Number of performance transactions.
    pub performance: u32,
}

impl Population {
    /// Returns the size of the whole population.
    pub fn sum(&self) -> u64 {
        u64::from(self.error) + u64::from(self.performance)
    }
}

impl Default for Population {
    fn default() -> Self {
        Self {
            error: 500,
            performance: 5000,
        }
    }
}

/// Retention rates of the client and server side filters.
///
/// All rates are probabilities in `[0, 1]`. Use [`FilterRates::clamp`] to enforce this on
/// untrusted input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterRates {
    /// Client sample rate for errors.
    pub sample_rate: f64,
    /// Client sample rate for transactions.
    pub trace_sample_rate: f64,
    /// Server side rule for errors.
    ///
    /// Accepted for completeness. The cascade does not contain a filter for it.
    pub server_error: f64,
    /// Server side rule for all transactions.
    pub server_performance: f64,
    /// Server side rule for transactions of release `v1`.
    pub server_release_v1: f64,
    /// Server side rule for transactions of release `v2`.
    pub server_release_v2: f64,
    /// Server side rule for transactions in production.
    pub server_environment_prod: f64,
    /// Server side rule for transactions in staging.
    pub server_environment_stage: f64,
}

impl FilterRates {
    fn fields_mut(&mut self) -> [(&'static str, &mut f64); 8] {
        [
            ("sampleRate", &mut self.sample_rate),
            ("traceSampleRate", &mut self.trace_sample_rate),
            ("serverError", &mut self.server_error),
            ("serverPerformance", &mut self.server_performance),
            ("serverReleaseV1", &mut self.server_release_v1),
            ("serverReleaseV2", &mut self.server_release_v2),
            ("serverEnvironmentProd", &mut self.server_environment_prod),
            ("serverEnvironmentStage", &mut self.server_environment_stage),
        ]
    }

    /// Clamps all rates into `[0, 1]` and returns the names of the rates that changed.
    ///
    /// `NaN` is replaced with `0`.
    pub fn clamp(&mut self) -> Vec<&'static str> {
        let mut clamped = Vec::new();

        for (name, rate) in self.fields_mut() {
            let valid = if rate.is_nan() {
                0.0
            } else {
                rate.clamp(0.0, 1.0)
            };

            if valid.to_bits() != rate.to_bits() {
                warn!(field = name, value = *rate, "clamped filter rate into [0, 1]");
                *rate = valid;
                clamped.push(name);
            }
        }

        clamped
    }
}

impl Default for FilterRates {
    fn default() -> Self {
        Self {
            sample_rate: 0.5,
            trace_sample_rate: 0.2,
            server_error: 1.0,
            server_performance: 1.0,
            server_release_v1: 1.0,
            server_release_v2: 1.0,
            server_environment_prod: 1.0,
            server_environment_stage: 1.0,
        }
    }
}

/// Expected fraction of the whole population in each outcome, by event type.
pub type FinalRates = ByOutcome<ByType<f64>>;

/// Number of events in each outcome, by event type.
pub type OutcomeCounts = ByOutcome<ByType<u64>>;

/// The vertical band of each outcome at the end of the cascade.
pub type EndBands = ByOutcome<Band>;

impl FinalRates {
    /// Computes the expected outcome fractions in closed form.
    ///
    /// Retention rates are composed along the cascade. Events that pass the client and inbound
    /// filters but not the server rules are dropped, all others that are not indexed are
    /// discarded.
    pub fn compute(
        sampling_rates: &EventSamplingRates,
        filter_rates: &FilterRates,
        inbound_rate: f64,
    ) -> Self {
        let share = sampling_rates.type_shares();
        let release = &sampling_rates.release;
        let environment = &sampling_rates.environment;
        let fr = filter_rates;

        let rule = |rate: f64, retention: f64| 1.0 - rate * (1.0 - retention);

        let accepted = ByType {
            error: share.error * fr.sample_rate * inbound_rate,
            performance: share.performance * fr.trace_sample_rate * inbound_rate,
        };

        let indexed = ByType {
            error: accepted.error,
            performance: accepted.performance
                * fr.server_performance
                * rule(release.rate(Release::V1), fr.server_release_v1)
                * rule(release.rate(Release::V2), fr.server_release_v2)
                * rule(environment.rate(Environment::Prod), fr.server_environment_prod)
                * rule(environment.rate(Environment::Stage), fr.server_environment_stage),
        };

        let dropped = accepted.map(|ty, accepted| accepted - indexed.get(ty));
        let discarded = share.map(|ty, share| share - indexed.get(ty) - dropped.get(ty));

        Self {
            indexed,
            dropped,
            discarded,
        }
    }

    /// Returns the fraction of each outcome summed over all event types.
    pub fn combined(&self) -> ByOutcome<f64> {
        self.map(|_, rates| rates.total())
    }

    /// Returns the fractions relative to the share of each event type.
    ///
    /// Types without share have a fraction of `0`.
    pub fn per_type(&self, shares: &ByType<f64>) -> Self {
        self.map(|_, rates| {
            rates.map(|ty, rate| {
                let share = *shares.get(ty);
                if share > 0.0 { rate / share } else { 0.0 }
            })
        })
    }

    /// Scales the fractions to a population of `total` events, rounding each bucket.
    pub fn counts(&self, total: u64) -> OutcomeCounts {
        // Rounding may leave tiny negative remainders, which count as zero.
        self.map(|_, rates| rates.map(|_, rate| (total as f64 * rate).round().max(0.0) as u64))
    }

    /// Computes the end bands of all outcomes.
    pub fn end_bands(&self) -> EndBands {
        let combined = self.combined();
        let indexed_end = combined.indexed * END_BAND_SCALE;
        let dropped_start = indexed_end + END_BAND_GAP;

        EndBands {
            indexed: Band(0.0, indexed_end),
            dropped: Band(dropped_start, dropped_start + combined.dropped * END_BAND_SCALE),
            discarded: Band(1.0 - combined.discarded * END_BAND_SCALE, 1.0),
        }
    }
}

impl OutcomeCounts {
    /// Counts the realized outcome of every event.
    pub fn tally<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a Event>,
    {
        let mut counts = Self::default();
        for event in events {
            *counts.get_mut(event.outcome()).get_mut(event.ty) += 1;
        }
        counts
    }

    /// Returns the total number of events.
    pub fn total(&self) -> u64 {
        self.indexed.total() + self.dropped.total() + self.discarded.total()
    }

    /// Returns the fraction of all events in each outcome and type.
    pub fn fractions(&self) -> FinalRates {
        let total = self.total();
        self.map(|_, counts| {
            counts.map(|_, count| {
                if total > 0 {
                    count as f64 / total as f64
                } else {
                    0.0
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use flowsim_protocol::{AnchorPoint, RemovalType, START_ANCHOR};

    use super::*;

    fn sampling_rates(population: Population) -> EventSamplingRates {
        EventSamplingRates::from_population(&population).unwrap()
    }

    fn assert_sums_to_one(rates: &FinalRates) {
        let combined = rates.combined();
        flowsim_test::assert_approx_eq(
            combined.indexed + combined.dropped + combined.discarded,
            1.0,
            1e-9,
        );
    }

    #[test]
    fn test_default_rates() {
        let population = Population::default();
        let rates = FinalRates::compute(&sampling_rates(population), &FilterRates::default(), 1.0);
        let per_type = rates.per_type(&sampling_rates(population).type_shares());

        flowsim_test::assert_approx_eq(per_type.indexed.error, 0.5, 1e-9);
        flowsim_test::assert_approx_eq(per_type.indexed.performance, 0.2, 1e-9);
        flowsim_test::assert_approx_eq(per_type.dropped.error, 0.0, 1e-9);
        flowsim_test::assert_approx_eq(per_type.dropped.performance, 0.0, 1e-9);
        flowsim_test::assert_approx_eq(per_type.discarded.error, 0.5, 1e-9);
        flowsim_test::assert_approx_eq(per_type.discarded.performance, 0.8, 1e-9);
        assert_sums_to_one(&rates);
    }

    #[test]
    fn test_inbound_rate() {
        let population = Population {
            error: 500,
            performance: 5000,
        };
        let shares = sampling_rates(population).type_shares();
        let rates = FinalRates::compute(&sampling_rates(population), &FilterRates::default(), 0.93);
        let per_type = rates.per_type(&shares);

        flowsim_test::assert_approx_eq(per_type.indexed.error, 0.5 * 0.93, 1e-9);
        flowsim_test::assert_approx_eq(per_type.indexed.performance, 0.2 * 0.93, 1e-9);
        assert_sums_to_one(&rates);
    }

    #[test]
    fn test_server_rules() {
        let filter_rates = FilterRates {
            server_performance: 0.5,
            server_release_v1: 0.5,
            server_environment_stage: 0.0,
            ..FilterRates::default()
        };
        let population = Population {
            error: 1000,
            performance: 1000,
        };
        let rates = FinalRates::compute(&sampling_rates(population), &filter_rates, 1.0);

        // 0.5 * 0.2 * 0.5 * (1 - 0.4 * 0.5) * (1 - 0.2)
        flowsim_test::assert_approx_eq(rates.indexed.performance, 0.032, 1e-12);
        flowsim_test::assert_approx_eq(rates.dropped.performance, 0.1 - 0.032, 1e-12);
        flowsim_test::assert_approx_eq(rates.discarded.performance, 0.4, 1e-12);
        flowsim_test::assert_approx_eq(rates.dropped.error, 0.0, 1e-12);
        assert_sums_to_one(&rates);
    }

    #[test]
    fn test_server_error_is_not_applied() {
        let filter_rates = FilterRates {
            server_error: 0.0,
            ..FilterRates::default()
        };
        let population = Population::default();
        let with_rule = FinalRates::compute(&sampling_rates(population), &filter_rates, 1.0);
        let without_rule =
            FinalRates::compute(&sampling_rates(population), &FilterRates::default(), 1.0);
        assert_eq!(with_rule, without_rule);
    }

    #[test]
    fn test_counts() {
        let population = Population {
            error: 500,
            performance: 5000,
        };
        let rates = FinalRates::compute(&sampling_rates(population), &FilterRates::default(), 1.0);
        let counts = rates.counts(population.sum());

        assert_eq!(counts.indexed.error, 250);
        assert_eq!(counts.indexed.performance, 1000);
        assert_eq!(counts.dropped, ByType::default());
        assert_eq!(counts.discarded.error, 250);
        assert_eq!(counts.discarded.performance, 4000);
        assert_eq!(counts.total(), population.sum());
    }

    #[test]
    fn test_end_bands() {
        let rates = FinalRates {
            indexed: ByType {
                error: 0.1,
                performance: 0.2,
            },
            dropped: ByType {
                error: 0.0,
                performance: 0.25,
            },
            discarded: ByType {
                error: 0.15,
                performance: 0.3,
            },
        };
        let bands = rates.end_bands();

        assert_eq!(bands.indexed.start(), 0.0);
        flowsim_test::assert_approx_eq(bands.indexed.end(), 0.24, 1e-12);
        flowsim_test::assert_approx_eq(bands.dropped.start(), 0.34, 1e-12);
        flowsim_test::assert_approx_eq(bands.dropped.end(), 0.54, 1e-12);
        flowsim_test::assert_approx_eq(bands.discarded.start(), 0.64, 1e-12);
        assert_eq!(bands.discarded.end(), 1.0);
    }

    #[test]
    fn test_clamp() {
        let mut filter_rates = FilterRates {
            sample_rate: 1.5,
            server_release_v2: -0.25,
            server_environment_prod: f64::NAN,
            ..FilterRates::default()
        };

        let clamped = filter_rates.clamp();
        assert_eq!(
            clamped,
            ["sampleRate", "serverReleaseV2", "serverEnvironmentProd"]
        );
        assert_eq!(filter_rates.sample_rate, 1.0);
        assert_eq!(filter_rates.server_release_v2, 0.0);
        assert_eq!(filter_rates.server_environment_prod, 0.0);
        assert!(filter_rates.clamp().is_empty());
    }

    #[test]
    fn test_filter_rates_defaults() {
        let filter_rates: FilterRates =
            serde_json::from_str(r#"{"sampleRate": 0.75, "serverReleaseV1": 0.1}"#).unwrap();

        assert_eq!(filter_rates.sample_rate, 0.75);
        assert_eq!(filter_rates.trace_sample_rate, 0.2);
        assert_eq!(filter_rates.server_release_v1, 0.1);
        assert_eq!(filter_rates.server_environment_stage, 1.0);
    }

    #[test]
    fn test_tally() {
        let origin = || AnchorPoint::new(START_ANCHOR, 0.0, 0.0);
        let mut events = vec![
            Event::new(EventType::Error, Release::V1, Environment::Prod, origin()),
            Event::new(EventType::Error, Release::V2, Environment::Prod, origin()),
            Event::new(EventType::Performance, Release::V1, Environment::Stage, origin()),
            Event::new(EventType::Performance, Release::V2, Environment::Prod, origin()),
        ];
        events[1].remove(RemovalType::Discarded);
        events[3].remove(RemovalType::Dropped);

        let counts = OutcomeCounts::tally(&events);
        let indexed = ByType {
            error: 1,
            performance: 1,
        };
        assert_eq!(counts.indexed, indexed);
        assert_eq!(counts.dropped.performance, 1);
        assert_eq!(counts.discarded.error, 1);
        assert_eq!(counts.total(), 4);
        assert_eq!(counts.fractions().indexed.error, 0.25);
    }
}
