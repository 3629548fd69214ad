//! Node logic for the traffic simulation
//!
//! A node is a junction with room for exactly one car. Each car carries its
//! own route, so dispatching only means looking up the next link and moving
//! the car onto it when the link entrance is clear.

use super::car::SimCar;
use super::link::SimLink;
use super::route::SimRoute;
use super::types::{CarId, LinkId, NodeId, NodeKind, Position, TrafficParams};
use super::ring_queue::RingQueue;

/// Result of a node dispatch indicating what happened to the resident car
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No car was waiting
    Idle,
    /// The next link had no room at its entrance; the car stays put
    Blocked,
    /// The car moved onto the given link
    Dispatched(LinkId),
    /// The car reached the destination and left the network
    Arrived(CarId),
}

/// A junction in the road network
#[derive(Debug, Clone)]
pub struct SimNode {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub position: Position,
    /// The car currently occupying the node (if any)
    car: Option<CarId>,
}

impl SimNode {
    pub fn new(id: NodeId, name: impl Into<String>, kind: NodeKind, position: Position) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            position,
            car: None,
        }
    }

    /// Must be checked before handing a car to this node
    pub fn has_room(&self) -> bool {
        self.car.is_none()
    }

    pub fn car(&self) -> Option<CarId> {
        self.car
    }

    /// Take ownership of a car
    ///
    /// # Panics
    /// If the node is already occupied.
    pub fn accept(&mut self, car: &mut SimCar) {
        assert!(
            self.has_room(),
            "node {} accepted {:?} while holding {:?}",
            self.name,
            car.id,
            self.car
        );
        car.enter_node(self.id);
        self.car = Some(car.id);
    }

    /// Try to move the resident car onward
    ///
    /// The destination node releases its car as [`DispatchOutcome::Arrived`];
    /// the caller records the trip and parks the car.
    pub fn dispatch(
        &mut self,
        cars: &mut [SimCar],
        routes: &[SimRoute],
        links: &mut [SimLink],
        params: &TrafficParams,
    ) -> DispatchOutcome {
        let Some(car_id) = self.car else {
            return DispatchOutcome::Idle;
        };

        if self.kind == NodeKind::Destination {
            self.car = None;
            return DispatchOutcome::Arrived(car_id);
        }

        let route_id = cars[car_id.0]
            .route
            .unwrap_or_else(|| panic!("{car_id:?} at node {} has no route", self.name));
        let link_id = routes[route_id.0].next_link(self.id).unwrap_or_else(|| {
            panic!(
                "route {} has no direction at node {}",
                routes[route_id.0].label, self.name
            )
        });

        let link = &mut links[link_id.0];
        if !link.has_entry_room(cars, params.car_length) {
            return DispatchOutcome::Blocked;
        }

        link.enter(&mut cars[car_id.0], params);
        self.car = None;
        DispatchOutcome::Dispatched(link_id)
    }

    /// Send the resident car (if any) straight back to the parking lot
    pub fn evacuate(&mut self, cars: &mut [SimCar], parking_lot: &mut RingQueue<CarId>) {
        if let Some(car_id) = self.car.take() {
            cars[car_id.0].park();
            parking_lot.enqueue(car_id);
        }
    }
}
