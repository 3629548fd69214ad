//! Vehicle state for the traffic simulation
//!
//! Cars are created once when the world is built and cycle forever between
//! the parking lot and the road network. They are never destroyed.

use super::types::{CarId, CarLocation, LinkId, NodeId, RouteId};

/// A car in the traffic simulation
#[derive(Debug, Clone)]
pub struct SimCar {
    pub id: CarId,
    /// Distance travelled along the current link
    pub progress: f64,
    /// Progress at the previous tick
    pub past_progress: f64,
    /// Clock reading at launch
    pub depart_time: f64,
    /// Clock reading at the last arrival
    pub arrive_time: f64,
    /// The route assigned at launch; `None` while parked
    pub route: Option<RouteId>,
    /// Distance covered on the whole trip so far
    pub odometer: f64,
    pub location: CarLocation,
}

impl SimCar {
    pub fn new(id: CarId) -> Self {
        Self {
            id,
            progress: 0.0,
            past_progress: 0.0,
            depart_time: 0.0,
            arrive_time: 0.0,
            route: None,
            odometer: 0.0,
            location: CarLocation::Parked,
        }
    }

    /// Move the car to `target` progress and add the distance to the odometer
    pub fn advance_to(&mut self, target: f64) {
        self.past_progress = self.progress;
        self.progress = target;
        self.odometer += self.progress - self.past_progress;
    }

    /// Put the car at the start of a link
    pub fn enter_link(&mut self, link: LinkId) {
        self.progress = 0.0;
        self.past_progress = 0.0;
        self.location = CarLocation::OnLink(link);
    }

    pub fn enter_node(&mut self, node: NodeId) {
        self.location = CarLocation::AtNode(node);
    }

    /// Clear trip state before the car goes back to the parking lot
    pub fn park(&mut self) {
        self.route = None;
        self.progress = 0.0;
        self.past_progress = 0.0;
        self.odometer = 0.0;
        self.location = CarLocation::Parked;
    }

    /// Whether a renderer should draw this car
    pub fn is_visible(&self) -> bool {
        self.location != CarLocation::Parked
    }

    /// The link the car is on, if any
    pub fn link(&self) -> Option<LinkId> {
        match self.location {
            CarLocation::OnLink(link) => Some(link),
            _ => None,
        }
    }
}
