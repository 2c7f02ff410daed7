//! Probabilistic filters and the vertical bands they occupy.

use flowsim_protocol::{Getter, RemovalType};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::condition::{self, FilterConditions};

/// A vertical interval `[start, end]` in normalized coordinates.
///
/// Bands serialize as a two-element array.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Band(pub f64, pub f64);

impl Band {
    /// Creates a band from its boundaries.
    pub const fn new(start: f64, end: f64) -> Self {
        Self(start, end)
    }

    /// Returns the lower boundary.
    pub fn start(self) -> f64 {
        self.0
    }

    /// Returns the upper boundary.
    pub fn end(self) -> f64 {
        self.1
    }

    /// Returns the signed extent of the band.
    pub fn width(self) -> f64 {
        self.1 - self.0
    }

    /// Returns the position at `ratio` along the band, where `0` is the start and `1` the end.
    pub fn position(self, ratio: f64) -> f64 {
        self.0 + self.width() * ratio
    }

    /// Splits the band at `ratio` into a leading and a trailing part.
    pub fn split(self, ratio: f64) -> (Self, Self) {
        let inflection = self.position(ratio);
        (Self(self.0, inflection), Self(inflection, self.1))
    }

    /// Draws a uniformly distributed position within the band.
    pub fn sample<R: Rng + ?Sized>(self, rng: &mut R) -> f64 {
        self.position(rng.random::<f64>())
    }
}

/// A named stage of the cascade that may remove events.
///
/// A filter applies to an event only if all of its conditions match. It then retains the event
/// with probability `retention_rate`, and otherwise removes it with `removal_type`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    /// Unique name of the filter, also used as the anchor point name.
    pub name: String,

    /// Display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Vertical label nudge in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_y_offset: Option<f64>,

    /// Conditions that all have to match for this filter to apply.
    #[serde(default)]
    pub conditions: FilterConditions,

    /// How events removed by this filter are classified.
    pub removal_type: RemovalType,

    /// Probability in `[0, 1]` that a matching event passes.
    pub retention_rate: f64,

    /// Normalized horizontal position.
    pub x: f64,

    /// The band that matching events pass through.
    pub y_active: Band,

    /// An additional band, currently unused by the cascade.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_inactive: Option<Band>,
}

impl Filter {
    /// Returns `true` if this filter applies to the given instance.
    pub fn matches<T>(&self, instance: &T) -> bool
    where
        T: Getter + ?Sized,
    {
        condition::matches_all(&self.conditions, instance)
    }

    /// Returns the position in the active band that separates retained from removed events.
    pub fn inflection_point(&self) -> f64 {
        self.y_active.position(self.retention_rate)
    }

    /// Returns the part of the active band taken by retained events.
    pub fn retention_band(&self) -> Band {
        self.y_active.split(self.retention_rate).0
    }

    /// Returns the part of the active band taken by removed events.
    pub fn removal_band(&self) -> Band {
        self.y_active.split(self.retention_rate).1
    }
}
