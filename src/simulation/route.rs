//! Routes and travel-time estimation
//!
//! A route is an itinerary of links from the origin to the destination plus
//! a per-node lookup of which link to take next. Travel-time estimates are
//! pure functions of the current network state; nothing is written back onto
//! the route.

use super::car::SimCar;
use super::chooser::SpeedMode;
use super::link::SimLink;
use super::stats::Dashboard;
use super::types::{LinkId, NodeId, RouteId};

/// Read-only view of the state the estimators look at
#[derive(Debug, Clone, Copy)]
pub struct EstimateContext<'a> {
    pub links: &'a [SimLink],
    pub cars: &'a [SimCar],
    pub dashboard: &'a Dashboard,
    pub clock: f64,
    pub speed_limit: f64,
}

/// A named path through the network
#[derive(Debug, Clone)]
pub struct SimRoute {
    pub id: RouteId,
    pub label: String,
    /// Only used by renderers
    pub color: String,
    /// Indexed by node; `None` where the route does not pass through
    directions: Vec<Option<LinkId>>,
    itinerary: Vec<LinkId>,
    route_length: f64,
}

impl SimRoute {
    pub fn new(
        id: RouteId,
        label: impl Into<String>,
        color: impl Into<String>,
        itinerary: Vec<LinkId>,
        links: &[SimLink],
        node_count: usize,
    ) -> Self {
        let mut directions = vec![None; node_count];
        for link_id in &itinerary {
            directions[links[link_id.0].origin.0] = Some(*link_id);
        }
        let route_length = itinerary.iter().map(|id| links[id.0].length).sum();
        Self {
            id,
            label: label.into(),
            color: color.into(),
            directions,
            itinerary,
            route_length,
        }
    }

    /// The link a car on this route takes when it leaves `node`
    pub fn next_link(&self, node: NodeId) -> Option<LinkId> {
        self.directions.get(node.0).copied().flatten()
    }

    pub fn itinerary(&self) -> &[LinkId] {
        &self.itinerary
    }

    pub fn route_length(&self) -> f64 {
        self.route_length
    }

    /// Ticks to drive the route with no congestion at all
    pub fn free_flow_time(&self, speed_limit: f64) -> f64 {
        self.route_length / speed_limit
    }

    /// A route can be offered only if every link on it is open
    pub fn is_available(&self, links: &[SimLink]) -> bool {
        self.itinerary
            .iter()
            .all(|link_id| links[link_id.0].open_to_traffic)
    }

    /// Estimate the travel time with the selected method
    pub fn estimate(&self, mode: SpeedMode, ctx: &EstimateContext) -> f64 {
        match mode {
            SpeedMode::Theoretical => self.theoretical_time(ctx.links),
            SpeedMode::Actual => self.actual_time(ctx.cars, ctx.clock, ctx.speed_limit),
            SpeedMode::Historical => self.historical_time(ctx.dashboard, ctx.speed_limit),
        }
    }

    /// Sum of the current travel times of the links; ignores node queueing
    pub fn theoretical_time(&self, links: &[SimLink]) -> f64 {
        self.itinerary
            .iter()
            .map(|link_id| links[link_id.0].travel_time())
            .sum()
    }

    /// Average implied trip time of the cars now driving this route
    ///
    /// Each car that has moved contributes `route_length / v`, where `v` is its
    /// average speed since departure. Falls back to free flow when no car qualifies.
    pub fn actual_time(&self, cars: &[SimCar], clock: f64, speed_limit: f64) -> f64 {
        let (sum, n) = cars
            .iter()
            .filter(|car| car.route == Some(self.id) && car.odometer > 0.0)
            .filter(|car| clock > car.depart_time)
            .map(|car| {
                let speed = car.odometer / (clock - car.depart_time) * speed_limit;
                self.route_length / speed
            })
            .fold((0.0, 0usize), |(sum, n), time| (sum + time, n + 1));

        if n == 0 {
            self.free_flow_time(speed_limit)
        } else {
            sum / n as f64
        }
    }

    /// Mean travel time of every completed trip on this route so far
    pub fn historical_time(&self, dashboard: &Dashboard, speed_limit: f64) -> f64 {
        dashboard
            .average_time(self.id)
            .unwrap_or_else(|| self.free_flow_time(speed_limit))
    }
}
