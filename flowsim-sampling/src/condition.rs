//! Types to specify conditions on events.
//!
//! The root type is [`FilterConditions`].

use flowsim_protocol::{EventProperty, Getter};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A condition that compares an event property for equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCondition {
    /// The property of the event that should match the value.
    pub property: EventProperty,

    /// The value to check against.
    pub value: String,
}

impl FilterCondition {
    /// Creates a condition that requires `property` to equal `value`.
    pub fn equals(property: EventProperty, value: impl ToString) -> Self {
        Self {
            property,
            value: value.to_string(),
        }
    }

    /// Returns `true` if the instance has the required value.
    ///
    /// An instance without a value for the property never matches.
    pub fn matches<T>(&self, instance: &T) -> bool
    where
        T: Getter + ?Sized,
    {
        instance.get_value(self.property) == Some(self.value.as_str())
    }
}

/// Conditions that all have to match for a filter to apply.
///
/// Filters carry at most two conditions, so they are kept inline.
pub type FilterConditions = SmallVec<[FilterCondition; 2]>;

/// Returns `true` if every condition matches the instance.
///
/// An empty set of conditions matches everything.
pub fn matches_all<T>(conditions: &[FilterCondition], instance: &T) -> bool
where
    T: Getter + ?Sized,
{
    conditions.iter().all(|condition| condition.matches(instance))
}

#[cfg(test)]
mod tests {
    use flowsim_protocol::{AnchorPoint, Environment, Event, EventType, Release, START_ANCHOR};
    use smallvec::smallvec;

    use super::*;

    fn event(ty: EventType, release: Release, environment: Environment) -> Event {
        Event::new(ty, release, environment, AnchorPoint::new(START_ANCHOR, 0.0, 0.0))
    }

    #[test]
    fn test_condition_matching() {
        let event = event(EventType::Performance, Release::V2, Environment::Prod);

        let conditions = [
            (
                "type",
                FilterCondition::equals(EventProperty::Type, EventType::Performance),
                true,
            ),
            (
                "wrong type",
                FilterCondition::equals(EventProperty::Type, EventType::Error),
                false,
            ),
            (
                "release",
                FilterCondition::equals(EventProperty::Release, Release::V2),
                true,
            ),
            (
                "wrong release",
                FilterCondition::equals(EventProperty::Release, Release::V1),
                false,
            ),
            (
                "environment",
                FilterCondition::equals(EventProperty::Environment, Environment::Prod),
                true,
            ),
            (
                "raw value",
                FilterCondition::equals(EventProperty::Environment, "stage"),
                false,
            ),
        ];

        for (name, condition, expected) in conditions {
            assert_eq!(condition.matches(&event), expected, "Failed on: {name}");
        }
    }

    #[test]
    fn test_all_conditions_must_match() {
        let conditions: FilterConditions = smallvec![
            FilterCondition::equals(EventProperty::Type, EventType::Performance),
            FilterCondition::equals(EventProperty::Release, Release::V1),
        ];

        let matching = event(EventType::Performance, Release::V1, Environment::Dev);
        let wrong_release = event(EventType::Performance, Release::V2, Environment::Dev);
        let wrong_type = event(EventType::Error, Release::V1, Environment::Dev);

        assert!(matches_all(&conditions, &matching));
        assert!(!matches_all(&conditions, &wrong_release));
        assert!(!matches_all(&conditions, &wrong_type));
        assert!(matches_all(&[], &wrong_type));
    }

    #[test]
    fn test_deserialize() {
        let json = r#"{"property": "environment", "value": "prod"}"#;
        let condition = serde_json::from_str::<FilterCondition>(json).unwrap();
        assert_eq!(
            condition,
            FilterCondition::equals(EventProperty::Environment, Environment::Prod)
        );
    }
}
