//! Layout of the filter chain.
//!
//! The chain models client sampling, inbound data filters and server side rules in this order.
//! Bands are chosen so that the lanes of consecutive filters line up with the events that
//! passed the previous stage.

use flowsim_protocol::{Environment, EventProperty, EventType, Release, RemovalType};

use crate::{Band, EventSamplingRates, Filter, FilterCondition, FilterConditions, FilterRates};

/// Share of the vertical space above the transaction lane taken by errors.
const ERROR_LANE_SCALE: f64 = 0.9;

/// Gap between the error and the transaction lane.
const LANE_GAP: f64 = 0.1;

/// Start of the first server side rule.
const SERVER_RULES_START: f64 = 0.2;

/// Vertical step between consecutive server side rules.
const SERVER_RULES_STEP: f64 = 0.01;

/// Horizontal position of the client sampling filters.
const CLIENT_X: f64 = 0.25;

/// Horizontal position of the inbound data filters.
const INBOUND_X: f64 = 0.55;

struct FilterBuilder {
    filter: Filter,
}

impl FilterBuilder {
    fn new(name: &str, removal_type: RemovalType, retention_rate: f64, x: f64) -> Self {
        Self {
            filter: Filter {
                name: name.to_owned(),
                label: None,
                label_y_offset: None,
                conditions: FilterConditions::new(),
                removal_type,
                retention_rate,
                x,
                y_active: Band::default(),
                y_inactive: None,
            },
        }
    }

    fn label(mut self, label: &str) -> Self {
        self.filter.label = Some(label.to_owned());
        self
    }

    fn label_y_offset(mut self, offset: f64) -> Self {
        self.filter.label_y_offset = Some(offset);
        self
    }

    fn condition(mut self, property: EventProperty, value: impl ToString) -> Self {
        self.filter
            .conditions
            .push(FilterCondition::equals(property, value));
        self
    }

    fn band(mut self, band: Band) -> Filter {
        self.filter.y_active = band;
        self.filter
    }
}

/// Builds the ordered filter chain for the given parameters.
///
/// Errors pass the client `sampleRate` and the inbound filters. Transactions pass
/// `traceSampleRate`, the inbound filters and five server side rules, of which the release and
/// environment rules only apply to their respective attribute values.
pub fn build_filters(
    sampling_rates: &EventSamplingRates,
    filter_rates: &FilterRates,
    inbound_rate: f64,
) -> Vec<Filter> {
    let error_ratio = sampling_rates.type_shares().error;
    let fr = filter_rates;

    let sample_rate = Band(0.0, ERROR_LANE_SCALE * error_ratio);
    let trace_sample_rate = Band(sample_rate.end() + LANE_GAP, 1.0);
    let inbound_error = Band(0.0, sample_rate.end() * fr.sample_rate);
    let inbound_performance = Band(
        sample_rate.end() * fr.sample_rate,
        trace_sample_rate.width() * fr.trace_sample_rate,
    );

    let mut filters = vec![
        FilterBuilder::new("sampleRate", RemovalType::Discarded, fr.sample_rate, CLIENT_X)
            .label("sampleRate")
            .condition(EventProperty::Type, EventType::Error)
            .band(sample_rate),
        FilterBuilder::new(
            "traceSampleRate",
            RemovalType::Discarded,
            fr.trace_sample_rate,
            CLIENT_X,
        )
        .label("traceSampleRate")
        .condition(EventProperty::Type, EventType::Performance)
        .band(trace_sample_rate),
        FilterBuilder::new(
            "inboundFilterError",
            RemovalType::Discarded,
            inbound_rate,
            INBOUND_X,
        )
        .label("Inbound Data Filters")
        .condition(EventProperty::Type, EventType::Error)
        .band(inbound_error),
        FilterBuilder::new(
            "inboundFilterPerformance",
            RemovalType::Discarded,
            inbound_rate,
            INBOUND_X,
        )
        .condition(EventProperty::Type, EventType::Performance)
        .band(inbound_performance),
    ];

    let server_rules: [(&str, f64, f64, Option<(EventProperty, String)>); 5] = [
        ("serverPerformance", fr.server_performance, 0.65, None),
        (
            "serverReleaseV1",
            fr.server_release_v1,
            0.70,
            Some((EventProperty::Release, Release::V1.to_string())),
        ),
        (
            "serverReleaseV2",
            fr.server_release_v2,
            0.75,
            Some((EventProperty::Release, Release::V2.to_string())),
        ),
        (
            "serverEnvironmentProd",
            fr.server_environment_prod,
            0.80,
            Some((EventProperty::Environment, Environment::Prod.to_string())),
        ),
        (
            "serverEnvironmentStage",
            fr.server_environment_stage,
            0.85,
            Some((EventProperty::Environment, Environment::Stage.to_string())),
        ),
    ];

    // The first rule sees all transactions that passed client sampling. Every following rule
    // sits slightly above its predecessor and only spans the events that it retained.
    let mut band = Band(
        SERVER_RULES_START,
        SERVER_RULES_START + trace_sample_rate.width() * fr.trace_sample_rate,
    );
    let mut previous_retention = None;

    for (name, retention_rate, x, condition) in server_rules {
        if let Some(previous_retention) = previous_retention {
            let start = band.start() - SERVER_RULES_STEP;
            band = Band(start, start + band.width() * previous_retention);
        }

        let mut builder = FilterBuilder::new(name, RemovalType::Dropped, retention_rate, x)
            .condition(EventProperty::Type, EventType::Performance);
        if let Some((property, value)) = condition {
            builder = builder.condition(property, value);
        } else {
            builder = builder.label("Custom Rules").label_y_offset(-4.0);
        }

        filters.push(builder.band(band));
        previous_retention = Some(retention_rate);
    }

    filters
}
