//! Trip statistics
//!
//! Counts departures and completed trips, per route and in total, and keeps
//! running sums of travel time so averages can be shown after every arrival.
//! Times are in ticks.

use super::types::RouteId;

/// Completed trips and their summed travel time
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TripTally {
    pub count: usize,
    pub total_time: f64,
}

impl TripTally {
    fn record(&mut self, elapsed: f64) {
        self.count += 1;
        self.total_time += elapsed;
    }

    pub fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.total_time / self.count as f64)
    }
}

/// The statistics surface read by dashboards
#[derive(Debug, Clone)]
pub struct Dashboard {
    departures: usize,
    per_route: Vec<TripTally>,
    total: TripTally,
    /// Ticks for the quickest route with no congestion; normalizes averages
    quickest_trip: f64,
}

impl Dashboard {
    pub fn new(route_count: usize, quickest_trip: f64) -> Self {
        Self {
            departures: 0,
            per_route: vec![TripTally::default(); route_count],
            total: TripTally::default(),
            quickest_trip,
        }
    }

    pub fn record_departure(&mut self) {
        self.departures += 1;
    }

    pub fn record_arrival(&mut self, route: RouteId, elapsed: f64) {
        self.per_route[route.0].record(elapsed);
        self.total.record(elapsed);
    }

    pub fn departures(&self) -> usize {
        self.departures
    }

    pub fn count(&self, route: RouteId) -> usize {
        self.per_route[route.0].count
    }

    pub fn total_count(&self) -> usize {
        self.total.count
    }

    pub fn tally(&self, route: RouteId) -> TripTally {
        self.per_route[route.0]
    }

    pub fn total_tally(&self) -> TripTally {
        self.total
    }

    /// Mean trip time on a route, `None` before the first arrival
    pub fn average_time(&self, route: RouteId) -> Option<f64> {
        self.per_route[route.0].average()
    }

    pub fn total_average_time(&self) -> Option<f64> {
        self.total.average()
    }

    /// Mean trip time divided by the quickest possible trip
    pub fn normalized_time(&self, route: RouteId) -> Option<f64> {
        self.average_time(route).map(|avg| avg / self.quickest_trip)
    }

    pub fn normalized_total_time(&self) -> Option<f64> {
        self.total_average_time().map(|avg| avg / self.quickest_trip)
    }

    pub fn quickest_trip(&self) -> f64 {
        self.quickest_trip
    }

    pub fn reset(&mut self) {
        self.departures = 0;
        self.per_route.fill(TripTally::default());
        self.total = TripTally::default();
    }
}

/// Render an optional normalized time the way the dashboard shows it
pub fn format_normalized(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{value:.3}"),
        None => "--".to_string(),
    }
}
