//! The filter cascade that decides the outcome of every event.

use flowsim_log::{debug, trace};
use flowsim_protocol::{AnchorPoint, END_ANCHOR, Event};
use rand::Rng;

use crate::{EndBands, Filter};

/// Runs a single event through the filters and appends its end anchor.
///
/// Once an event is removed, remaining filters are skipped. Filters whose conditions do not
/// match the event are skipped without an anchor point.
pub fn process_event<R>(event: &mut Event, filters: &[Filter], end_bands: &EndBands, rng: &mut R)
where
    R: Rng + ?Sized,
{
    for filter in filters {
        if event.is_removed() {
            break;
        }

        if !filter.matches(&*event) {
            continue;
        }

        let band = if rng.random::<f64>() > filter.retention_rate {
            trace!(filter = %filter.name, "removed event");
            event.remove(filter.removal_type);
            filter.removal_band()
        } else {
            filter.retention_band()
        };

        let y = band.sample(rng);
        event
            .anchor_points
            .push(AnchorPoint::new(filter.name.as_str(), filter.x, y));
    }

    let y = end_bands.get(event.outcome()).sample(rng);
    event.anchor_points.push(AnchorPoint::new(END_ANCHOR, 1.0, y));
}

/// Runs a batch of events through the filter cascade.
///
/// Returns finalized copies of the events. The input is left untouched.
pub fn process_events<R>(
    events: &[Event],
    filters: &[Filter],
    end_bands: &EndBands,
    rng: &mut R,
) -> Vec<Event>
where
    R: Rng + ?Sized,
{
    let processed = events
        .iter()
        .map(|event| {
            let mut event = event.clone();
            process_event(&mut event, filters, end_bands, rng);
            event
        })
        .collect::<Vec<_>>();

    debug!(
        events = processed.len(),
        removed = processed.iter().filter(|event| event.is_removed()).count(),
        "processed events through filter cascade"
    );
    processed
}

#[cfg(test)]
mod tests {
    use flowsim_protocol::{
        Environment, EventProperty, EventType, Outcome, Release, RemovalType, START_ANCHOR,
    };
    use smallvec::smallvec;

    use super::*;
    use crate::{Band, ByOutcome, FilterCondition};

    fn end_bands() -> EndBands {
        ByOutcome {
            indexed: Band(0.0, 0.3),
            dropped: Band(0.4, 0.5),
            discarded: Band(0.6, 1.0),
        }
    }

    fn filter(name: &str, ty: EventType, removal_type: RemovalType, rate: f64, x: f64) -> Filter {
        Filter {
            name: name.to_owned(),
            label: None,
            label_y_offset: None,
            conditions: smallvec![FilterCondition::equals(EventProperty::Type, ty)],
            removal_type,
            retention_rate: rate,
            x,
            y_active: Band(0.0, 1.0),
            y_inactive: None,
        }
    }

    fn event(ty: EventType) -> Event {
        Event::new(
            ty,
            Release::V1,
            Environment::Prod,
            AnchorPoint::new(START_ANCHOR, 0.0, 0.1),
        )
    }

    #[test]
    fn test_retain_all() {
        let filters = [
            filter("a", EventType::Error, RemovalType::Discarded, 1.0, 0.25),
            filter("b", EventType::Error, RemovalType::Dropped, 1.0, 0.5),
        ];
        let mut rng = flowsim_test::rng(0);

        let events = process_events(&[event(EventType::Error)], &filters, &end_bands(), &mut rng);
        let event = &events[0];

        assert!(!event.is_removed());
        let names = event
            .anchor_points
            .iter()
            .map(|anchor| anchor.filter_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["start", "a", "b", "end"]);
        assert!((0.0..0.3).contains(&event.anchor_points[3].y));
    }

    #[test]
    fn test_remove_all() {
        let filters = [
            filter("a", EventType::Error, RemovalType::Discarded, 0.0, 0.25),
            filter("b", EventType::Error, RemovalType::Dropped, 0.0, 0.5),
        ];
        let mut rng = flowsim_test::rng(0);

        let events = process_events(&[event(EventType::Error)], &filters, &end_bands(), &mut rng);
        let event = &events[0];

        assert_eq!(event.outcome(), Outcome::Discarded);
        assert_eq!(event.anchor_points.len(), 3);
        assert_eq!(event.anchor_points[1].filter_name, "a");
        assert!((0.6..=1.0).contains(&event.anchor_points[2].y));
    }

    #[test]
    fn test_skip_unmatched() {
        let filters = [
            filter("a", EventType::Error, RemovalType::Discarded, 0.0, 0.25),
            filter("b", EventType::Performance, RemovalType::Dropped, 0.0, 0.5),
        ];
        let mut rng = flowsim_test::rng(0);

        let events = process_events(
            &[event(EventType::Performance)],
            &filters,
            &end_bands(),
            &mut rng,
        );
        let event = &events[0];

        assert_eq!(event.outcome(), Outcome::Dropped);
        assert_eq!(event.anchor_points.len(), 3);
        assert_eq!(event.anchor_points[1].filter_name, "b");
        assert_eq!(event.anchor_points[1].x, 0.5);
        assert!((0.4..=0.5).contains(&event.anchor_points[2].y));
    }

    #[test]
    fn test_input_untouched() {
        let filters = [filter("a", EventType::Error, RemovalType::Discarded, 0.0, 0.25)];
        let input = vec![event(EventType::Error)];
        let mut rng = flowsim_test::rng(0);

        let output = process_events(&input, &filters, &end_bands(), &mut rng);

        assert_eq!(input[0], event(EventType::Error));
        assert!(output[0].is_removed());
    }

    #[test]
    fn test_anchor_invariants() {
        flowsim_test::setup();

        let filters = [
            filter("a", EventType::Error, RemovalType::Discarded, 0.7, 0.25),
            filter("b", EventType::Performance, RemovalType::Discarded, 0.4, 0.25),
            filter("c", EventType::Performance, RemovalType::Dropped, 0.5, 0.65),
            filter("d", EventType::Error, RemovalType::Dropped, 0.9, 0.8),
        ];
        let input = [EventType::Error, EventType::Performance]
            .into_iter()
            .cycle()
            .take(2000)
            .map(event)
            .collect::<Vec<_>>();
        let mut rng = flowsim_test::rng(17);

        for event in process_events(&input, &filters, &end_bands(), &mut rng) {
            let anchors = &event.anchor_points;
            assert_eq!(anchors.first().unwrap().x, 0.0);
            assert_eq!(anchors.last().unwrap().x, 1.0);
            assert!(anchors.windows(2).all(|pair| pair[0].x <= pair[1].x));

            let evaluated = anchors.len() - 2;
            if event.is_removed() {
                let removed_by = filters
                    .iter()
                    .find(|filter| filter.name == anchors[evaluated].filter_name)
                    .unwrap();
                assert_eq!(event.removal_type(), Some(removed_by.removal_type));
                assert!(evaluated <= 2);
            } else {
                assert_eq!(evaluated, 2);
            }

            let band = *end_bands().get(event.outcome());
            let end = anchors.last().unwrap().y;
            assert!(band.start() <= end && end <= band.end());
        }
    }
}
