//! Simulated events and their anchor points.

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::{Environment, EventProperty, EventType, Release};

/// The filter name of the first anchor point of every event.
pub const START_ANCHOR: &str = "start";

/// The filter name of the last anchor point of every finalized event.
pub const END_ANCHOR: &str = "end";

/// Reads attribute values off an item by property.
///
/// Filter conditions are evaluated against this trait rather than against concrete fields.
pub trait Getter {
    /// Returns the string value of the given property, if the item has one.
    fn get_value(&self, property: EventProperty) -> Option<&str>;
}

/// Declares which kind of filter removed an event.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalType {
    /// Removed by a client-side or inbound sampling filter.
    Discarded,
    /// Removed by a server-side custom rule.
    Dropped,
}

/// The final bucket an event lands in after passing the filter cascade.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Survived the entire cascade.
    Indexed,
    /// Removed by a server-side custom rule.
    Dropped,
    /// Removed by a client-side or inbound sampling filter.
    Discarded,
}

impl Outcome {
    /// All outcomes in display order, from top to bottom.
    pub const ALL: &'static [Self] = &[Self::Indexed, Self::Dropped, Self::Discarded];

    /// Returns the string identifier of this outcome.
    pub fn name(self) -> &'static str {
        match self {
            Self::Indexed => "indexed",
            Self::Dropped => "dropped",
            Self::Discarded => "discarded",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Option<RemovalType>> for Outcome {
    fn from(removal_type: Option<RemovalType>) -> Self {
        match removal_type {
            None => Self::Indexed,
            Some(RemovalType::Dropped) => Self::Dropped,
            Some(RemovalType::Discarded) => Self::Discarded,
        }
    }
}

/// A point in normalized `[0, 1]` space that an event's path passes through.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorPoint {
    /// The name of the filter that placed this point, or [`START_ANCHOR`] / [`END_ANCHOR`].
    pub filter_name: String,
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl AnchorPoint {
    /// Creates a new anchor point.
    pub fn new(filter_name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            filter_name: filter_name.into(),
            x,
            y,
        }
    }

    /// Returns a copy of this point scaled from normalized to pixel space.
    pub fn scaled(&self, width: f64, height: f64) -> Self {
        Self {
            filter_name: self.filter_name.clone(),
            x: self.x * width,
            y: self.y * height,
        }
    }
}

/// A simulated telemetry event.
///
/// An event is removed if and only if it has a removal type. Use [`Event::remove`] to mark it,
/// which keeps the first removal and ignores subsequent ones.
///
/// The serialized form carries a `removed` flag derived from the removal type.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// The kind of telemetry.
    #[serde(rename = "type")]
    pub ty: EventType,
    /// The release the event was sent from.
    pub release: Release,
    /// The environment the event was sent from.
    pub environment: Environment,
    /// The ordered points the event's path passes through.
    pub anchor_points: Vec<AnchorPoint>,
    /// Which kind of filter removed this event, if any.
    #[serde(default)]
    removal_type: Option<RemovalType>,
}

impl Event {
    /// Creates a new event that starts at the given origin point.
    pub fn new(
        ty: EventType,
        release: Release,
        environment: Environment,
        origin: AnchorPoint,
    ) -> Self {
        Self {
            ty,
            release,
            environment,
            anchor_points: vec![origin],
            removal_type: None,
        }
    }

    /// Returns `true` if a filter removed this event.
    pub fn is_removed(&self) -> bool {
        self.removal_type.is_some()
    }

    /// Returns the kind of filter that removed this event.
    pub fn removal_type(&self) -> Option<RemovalType> {
        self.removal_type
    }

    /// Marks this event as removed.
    ///
    /// Returns `false` without changes if the event was removed before.
    pub fn remove(&mut self, removal_type: RemovalType) -> bool {
        if self.is_removed() {
            return false;
        }

        self.removal_type = Some(removal_type);
        true
    }

    /// Returns the bucket this event ends up in.
    pub fn outcome(&self) -> Outcome {
        self.removal_type.into()
    }
}

impl Serialize for Event {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Event", 6)?;
        state.serialize_field("type", &self.ty)?;
        state.serialize_field("release", &self.release)?;
        state.serialize_field("environment", &self.environment)?;
        state.serialize_field("anchorPoints", &self.anchor_points)?;
        state.serialize_field("removed", &self.is_removed())?;
        match self.removal_type {
            Some(ref removal_type) => state.serialize_field("removalType", removal_type)?,
            None => state.skip_field("removalType")?,
        }
        state.end()
    }
}

impl Getter for Event {
    fn get_value(&self, property: EventProperty) -> Option<&str> {
        Some(match property {
            EventProperty::Type => self.ty.name(),
            EventProperty::Release => self.release.name(),
            EventProperty::Environment => self.environment.name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> Event {
        Event::new(
            EventType::Performance,
            Release::V1,
            Environment::Stage,
            AnchorPoint::new(START_ANCHOR, 0.0, 0.125),
        )
    }

    #[test]
    fn test_remove_once() {
        let mut event = event();
        assert_eq!(event.outcome(), Outcome::Indexed);

        assert!(event.remove(RemovalType::Dropped));
        assert!(!event.remove(RemovalType::Discarded));

        assert!(event.is_removed());
        assert_eq!(event.removal_type(), Some(RemovalType::Dropped));
        assert_eq!(event.outcome(), Outcome::Dropped);
    }

    #[test]
    fn test_getter() {
        let event = event();
        assert_eq!(event.get_value(EventProperty::Type), Some("performance"));
        assert_eq!(event.get_value(EventProperty::Release), Some("v1"));
        assert_eq!(event.get_value(EventProperty::Environment), Some("stage"));
    }

    #[test]
    fn test_scaled() {
        let point = AnchorPoint::new("sampleRate", 0.25, 0.5).scaled(800.0, 320.0);
        assert_eq!(point, AnchorPoint::new("sampleRate", 200.0, 160.0));
    }

    #[test]
    fn test_serialize() {
        let mut event = event();
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::json!({
                "type": "performance",
                "release": "v1",
                "environment": "stage",
                "anchorPoints": [{"filterName": "start", "x": 0.0, "y": 0.125}],
                "removed": false,
            })
        );

        event.remove(RemovalType::Discarded);
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::json!({
                "type": "performance",
                "release": "v1",
                "environment": "stage",
                "anchorPoints": [{"filterName": "start", "x": 0.0, "y": 0.125}],
                "removed": true,
                "removalType": "discarded",
            })
        );
    }

    #[test]
    fn test_deserialize_ignores_removed_flag() {
        let mut event = event();
        event.remove(RemovalType::Dropped);

        let json = serde_json::to_string(&event).unwrap();
        let parsed = serde_json::from_str::<Event>(&json).unwrap();
        assert_eq!(parsed, event);
        assert!(parsed.is_removed());
    }
}
