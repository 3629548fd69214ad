//! Route choice policies
//!
//! Launching cars pick a route from the currently available set. Routing is
//! either random or selfish; selfish drivers estimate every route's travel
//! time and then either take the quickest or draw one with probability
//! proportional to the reciprocal time.

use clap::ValueEnum;
use ordered_float::OrderedFloat;
use rand::seq::IndexedRandom;
use rand::Rng;

/// Whether drivers look at travel times at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RoutingMode {
    #[default]
    Selfish,
    Random,
}

/// Which travel-time estimator selfish drivers consult
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SpeedMode {
    #[default]
    Theoretical,
    Actual,
    Historical,
}

/// How selfish drivers turn estimates into a choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SelectionMethod {
    #[default]
    Minimum,
    Probabilistic,
}

/// A route selection policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteChooser {
    /// Uniform choice, ignoring the times
    Random,
    /// Quickest route; ties broken uniformly at random
    Minimum,
    /// Weighted draw with weights proportional to 1 / time
    Probabilistic,
}

impl RouteChooser {
    /// The policy implied by the global routing settings
    pub fn from_settings(mode: RoutingMode, method: SelectionMethod) -> Self {
        match (mode, method) {
            (RoutingMode::Random, _) => RouteChooser::Random,
            (RoutingMode::Selfish, SelectionMethod::Minimum) => RouteChooser::Minimum,
            (RoutingMode::Selfish, SelectionMethod::Probabilistic) => RouteChooser::Probabilistic,
        }
    }

    /// Pick an index into `times`, one entry per candidate route
    ///
    /// # Panics
    /// If there are no candidates.
    pub fn choose<R: Rng + ?Sized>(&self, times: &[f64], rng: &mut R) -> usize {
        assert!(!times.is_empty(), "no routes to choose from");
        match self {
            RouteChooser::Random => rng.random_range(0..times.len()),
            RouteChooser::Minimum => choose_minimum(times, rng),
            RouteChooser::Probabilistic => choose_weighted(&selection_weights(times), rng),
        }
    }
}

fn choose_minimum<R: Rng + ?Sized>(times: &[f64], rng: &mut R) -> usize {
    let Some(best) = times.iter().copied().map(OrderedFloat).min() else {
        unreachable!("candidate list checked non-empty");
    };
    let tied: Vec<usize> = (0..times.len())
        .filter(|&i| OrderedFloat(times[i]) == best)
        .collect();
    match tied.as_slice() {
        [only] => *only,
        _ => tied.choose(rng).copied().unwrap_or(tied[0]),
    }
}

fn choose_weighted<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> usize {
    let draw: f64 = rng.random();
    let mut accum = 0.0;
    for (i, weight) in weights.iter().enumerate() {
        accum += weight;
        if draw <= accum {
            return i;
        }
    }
    // Rounding can leave the cumulative sum a hair under the draw.
    weights.len() - 1
}

/// Normalized reciprocal travel times
///
/// Returns a fresh vector summing to 1. Degenerate inputs (no finite positive
/// total) fall back to uniform weights.
pub fn selection_weights(times: &[f64]) -> Vec<f64> {
    let inverted: Vec<f64> = times.iter().map(|time| 1.0 / time).collect();
    let total: f64 = inverted.iter().sum();
    if total.is_finite() && total > 0.0 {
        inverted.iter().map(|weight| weight / total).collect()
    } else {
        vec![1.0 / times.len() as f64; times.len()]
    }
}
