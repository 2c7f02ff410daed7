//! Per event animation tracks.

use std::fmt;

use flowsim_path::{DEFAULT_RESOLUTION, PathMeasure};
use flowsim_protocol::{EventType, RemovalType};
use flowsim_sampling::RenderedEvent;
use serde::{Serialize, Serializer};

use crate::PlaybackError;

/// Default length of one pass through the cascade, in seconds.
pub const DEFAULT_DURATION: f64 = 5.0;

/// Opacity of events before their first removal point.
pub const BASE_ALPHA: f64 = 0.65;

/// Opacity of discarded events after their removal point.
pub const DISCARDED_ALPHA: f64 = 0.1;

/// Opacity of dropped events after their removal point.
pub const DROPPED_ALPHA: f64 = 0.3;

/// An RGB color.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Color(pub u32);

/// Color of error events.
pub const ERROR_COLOR: Color = Color(0xff5555);

/// Color of performance events.
pub const PERFORMANCE_COLOR: Color = Color(0x5555ff);

/// Tint of discarded events.
pub const DISCARDED_COLOR: Color = Color(0x999999);

impl Color {
    /// Returns the color of the given event type.
    pub fn for_type(ty: EventType) -> Self {
        match ty {
            EventType::Error => ERROR_COLOR,
            EventType::Performance => PERFORMANCE_COLOR,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Color and opacity of an event marker.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Tint {
    /// The fill color.
    pub color: Color,
    /// Opacity in `[0, 1]`.
    pub alpha: f64,
}

impl Tint {
    /// The tint of a marker when the animation starts.
    pub fn initial(ty: EventType) -> Self {
        Self {
            color: Color::for_type(ty),
            alpha: BASE_ALPHA,
        }
    }

    /// The tint of a marker at the start of every following pass.
    pub fn reset(ty: EventType) -> Self {
        Self {
            color: Color::for_type(ty),
            alpha: 1.0,
        }
    }

    /// The tint of a removed marker after its removal point.
    ///
    /// Returns `None` for indexed events, which keep their tint.
    pub fn removed(ty: EventType, removal_type: Option<RemovalType>) -> Option<Self> {
        match removal_type? {
            RemovalType::Discarded => Some(Self {
                color: DISCARDED_COLOR,
                alpha: DISCARDED_ALPHA,
            }),
            RemovalType::Dropped => Some(Self {
                color: Color::for_type(ty),
                alpha: DROPPED_ALPHA,
            }),
        }
    }
}

/// Position and tint of an event marker at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FrameState {
    /// Horizontal position in pixels.
    pub x: f64,
    /// Vertical position in pixels.
    pub y: f64,
    /// Fraction of the current pass through the path.
    pub progress: f64,
    /// Current tint.
    pub tint: Tint,
}

/// The looping animation of a single event along its path.
///
/// A track starts after its delay and then loops with the timeline's duration. When a pass
/// reaches the removal point, removed events change their tint until the pass ends.
#[derive(Clone, Debug)]
pub struct Track {
    ty: EventType,
    delay: f64,
    removal_point: f64,
    removal_tint: Option<Tint>,
    measure: PathMeasure,
}

impl Track {
    /// Creates the track of a rendered event starting after `delay` seconds.
    pub fn new(event: &RenderedEvent, delay: f64) -> Self {
        let ty = event.event.ty;
        let removal_tint = Tint::removed(ty, event.event.removal_type());

        Self {
            ty,
            delay,
            removal_point: if removal_tint.is_some() {
                event.removal_progress
            } else {
                1.0
            },
            removal_tint,
            measure: PathMeasure::new(&event.path, DEFAULT_RESOLUTION),
        }
    }

    /// Returns the time in seconds at which the track starts.
    pub fn delay(&self) -> f64 {
        self.delay
    }

    /// Returns the fraction of a pass at which the tint changes.
    pub fn removal_point(&self) -> f64 {
        self.removal_point
    }

    /// Returns the time of the first tint change for a pass of `duration` seconds.
    pub fn removal_time(&self, duration: f64) -> f64 {
        self.delay + duration * self.removal_point
    }

    /// Returns the state of the marker at `time` for passes of `duration` seconds.
    ///
    /// Before its delay, the marker rests at the start of its path. Returns `None` if the path is
    /// empty.
    pub fn state_at(&self, time: f64, duration: f64) -> Option<FrameState> {
        let (progress, pass) = if time < self.delay {
            (0.0, None)
        } else {
            let passes = (time - self.delay) / duration;
            (passes.fract(), Some(passes.trunc()))
        };

        let tint = match (pass, self.removal_tint) {
            (Some(_), Some(tint)) if progress >= self.removal_point => tint,
            (Some(pass), _) if pass >= 1.0 => Tint::reset(self.ty),
            _ => Tint::initial(self.ty),
        };

        let point = self.measure.point_at(progress)?;
        Some(FrameState {
            x: point.x,
            y: point.y,
            progress,
            tint,
        })
    }
}

/// Animation tracks of a whole batch of events.
///
/// Track starts are staggered evenly over the first pass, so that event `i` of `n` starts after
/// `i * duration / n` seconds.
#[derive(Clone, Debug)]
pub struct Timeline {
    duration: f64,
    tracks: Vec<Track>,
}

impl Timeline {
    /// Schedules the given events for passes of `duration` seconds.
    pub fn new(events: &[RenderedEvent], duration: f64) -> Result<Self, PlaybackError> {
        if !(duration.is_finite() && duration > 0.0) {
            return Err(PlaybackError::InvalidDuration(duration));
        }

        let count = events.len() as f64;
        let tracks = events
            .iter()
            .enumerate()
            .map(|(index, event)| Track::new(event, index as f64 * duration / count))
            .collect();

        Ok(Self { duration, tracks })
    }

    /// Returns the length of one pass in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Returns all tracks in event order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Returns the state of every marker at `time`.
    pub fn frame(&self, time: f64) -> Vec<FrameState> {
        self.tracks
            .iter()
            .filter_map(|track| track.state_at(time, self.duration))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use flowsim_sampling::{Population, SimulationParams, simulate_seeded};

    use super::*;

    fn events(count: usize) -> Vec<RenderedEvent> {
        let params = SimulationParams {
            events: count,
            ..SimulationParams::new(Population::default())
        };
        simulate_seeded(&params, 9).unwrap().events
    }

    fn find(events: &[RenderedEvent], removal_type: Option<RemovalType>) -> &RenderedEvent {
        events
            .iter()
            .find(|event| event.event.removal_type() == removal_type)
            .unwrap()
    }

    #[test]
    fn test_color_display() {
        assert_eq!(ERROR_COLOR.to_string(), "#ff5555");
        assert_eq!(PERFORMANCE_COLOR.to_string(), "#5555ff");
        assert_eq!(
            serde_json::to_value(Tint::removed(EventType::Error, Some(RemovalType::Discarded)))
                .unwrap(),
            serde_json::json!({"color": "#999999", "alpha": 0.1})
        );
    }

    #[test]
    fn test_removed_tints() {
        assert_eq!(Tint::removed(EventType::Performance, None), None);
        assert_eq!(
            Tint::removed(EventType::Performance, Some(RemovalType::Dropped)),
            Some(Tint {
                color: PERFORMANCE_COLOR,
                alpha: DROPPED_ALPHA
            })
        );
    }

    #[test]
    fn test_staggered_delays() {
        let timeline = Timeline::new(&events(4), 2.0).unwrap();
        let delays = timeline
            .tracks()
            .iter()
            .map(Track::delay)
            .collect::<Vec<_>>();
        assert_eq!(delays, [0.0, 0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_invalid_duration() {
        assert_eq!(
            Timeline::new(&[], 0.0).unwrap_err(),
            PlaybackError::InvalidDuration(0.0)
        );
        assert!(Timeline::new(&[], f64::NAN).is_err());
        assert!(Timeline::new(&[], 1.0).unwrap().frame(0.0).is_empty());
    }

    #[test]
    fn test_discarded_track() {
        let events = events(200);
        let event = find(&events, Some(RemovalType::Discarded));
        let track = Track::new(event, 1.0);
        let duration = DEFAULT_DURATION;

        assert_eq!(track.removal_point(), event.removal_progress);
        assert!(track.removal_point() < 1.0);

        let before_start = track.state_at(0.5, duration).unwrap();
        assert_eq!(before_start.progress, 0.0);
        assert_eq!(before_start.tint, Tint::initial(event.event.ty));

        let removal_time = track.removal_time(duration);
        let before_removal = track.state_at(removal_time - 0.01, duration).unwrap();
        assert_eq!(before_removal.tint.alpha, BASE_ALPHA);

        let after_removal = track.state_at(removal_time + 0.01, duration).unwrap();
        assert_eq!(after_removal.tint.color, DISCARDED_COLOR);
        assert_eq!(after_removal.tint.alpha, DISCARDED_ALPHA);

        let second_pass = track.state_at(1.0 + duration + 0.01, duration).unwrap();
        assert_eq!(second_pass.tint, Tint::reset(event.event.ty));
    }

    #[test]
    fn test_indexed_track_keeps_tint() {
        let events = events(200);
        let event = find(&events, None);
        let track = Track::new(event, 0.0);

        assert_eq!(track.removal_point(), 1.0);
        let ty = event.event.ty;
        assert_eq!(track.state_at(4.99, 5.0).unwrap().tint, Tint::initial(ty));
        assert_eq!(track.state_at(5.01, 5.0).unwrap().tint, Tint::reset(ty));
    }

    #[test]
    fn test_marker_follows_path() {
        let events = events(1);
        let timeline = Timeline::new(&events, DEFAULT_DURATION).unwrap();

        let start = timeline.frame(0.0)[0];
        let first = &events[0].event.anchor_points[0];
        flowsim_test::assert_approx_eq(start.x, 0.0, 1e-9);
        flowsim_test::assert_approx_eq(start.y, first.y * 320.0, 1e-9);

        let halfway = timeline.frame(DEFAULT_DURATION / 2.0)[0];
        assert!(halfway.x > 0.0 && halfway.x < 800.0);
        flowsim_test::assert_approx_eq(halfway.progress, 0.5, 1e-12);
    }
}
