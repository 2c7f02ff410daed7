//! Weighted sampling of categories.

use rand::Rng;
use serde::{Serialize, Serializer};

/// An error returned when building a [`RateDistribution`] from invalid weights.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum DistributionError {
    /// The distribution has no categories.
    #[error("rate distribution has no categories")]
    Empty,
    /// A weight is negative, infinite or NaN.
    #[error("rate distribution has an invalid weight {0}")]
    InvalidWeight(f64),
    /// All weights are zero, so the distribution cannot be normalized.
    #[error("rate distribution has no positive weight")]
    ZeroTotal,
}

/// A normalized, ordered distribution over labeled categories.
///
/// Weights are normalized at construction so that they sum to `1`. The order of categories is
/// preserved, as it determines which category a random draw falls into.
#[derive(Clone, Debug, PartialEq)]
pub struct RateDistribution<T> {
    rates: Vec<(T, f64)>,
}

impl<T: Copy + PartialEq> RateDistribution<T> {
    /// Creates a distribution from `(category, weight)` pairs.
    ///
    /// Weights must be finite and non-negative, and at least one weight must be positive.
    pub fn new<I>(weights: I) -> Result<Self, DistributionError>
    where
        I: IntoIterator<Item = (T, f64)>,
    {
        let weights = weights.into_iter().collect::<Vec<_>>();
        if weights.is_empty() {
            return Err(DistributionError::Empty);
        }

        if let Some(&(_, weight)) = weights
            .iter()
            .find(|(_, weight)| !weight.is_finite() || *weight < 0.0)
        {
            return Err(DistributionError::InvalidWeight(weight));
        }

        let total = weights.iter().map(|(_, weight)| weight).sum::<f64>();
        if total <= 0.0 {
            return Err(DistributionError::ZeroTotal);
        }

        let rates = weights
            .into_iter()
            .map(|(category, weight)| (category, weight / total))
            .collect();

        Ok(Self { rates })
    }

    /// Returns the normalized rate of a category, or `0` if it is not part of the distribution.
    pub fn rate(&self, category: T) -> f64 {
        self.rates
            .iter()
            .filter(|(c, _)| *c == category)
            .map(|(_, rate)| rate)
            .sum()
    }

    /// Returns an iterator over all categories and their normalized rates in order.
    pub fn iter(&self) -> impl Iterator<Item = (T, f64)> + '_ {
        self.rates.iter().copied()
    }

    /// Draws one category.
    ///
    /// A single uniform number in `[0, 1)` is walked through the categories in order, subtracting
    /// each rate. The first category that takes the remainder below zero is returned. If rounding
    /// leaves a remainder, the last category is returned.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        let mut random_number = rng.random::<f64>();

        for &(category, rate) in &self.rates {
            random_number -= rate;
            if random_number < 0.0 {
                return category;
            }
        }

        // `new` guarantees at least one category.
        self.rates[self.rates.len() - 1].0
    }
}

impl<T: Serialize> Serialize for RateDistribution<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(&self.rates)
    }
}
