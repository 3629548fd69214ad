//! Link logic for the traffic simulation
//!
//! A link is a directed road segment between two nodes. The cars on it sit in
//! a queue ordered front to back, so the head of the queue is the car closest
//! to the destination node. This is where most of the CPU time goes.

use super::car::SimCar;
use super::node::SimNode;
use super::ring_queue::RingQueue;
use super::types::{CarId, LinkId, LinkKind, NodeId, TrafficParams, SPEED_FLOOR};

/// A one-way road segment
#[derive(Debug, Clone)]
pub struct SimLink {
    pub id: LinkId,
    pub name: String,
    /// Integer-valued so that symmetric links have identical lengths
    pub length: f64,
    pub origin: NodeId,
    pub destination: NodeId,
    /// Closed links are never offered to launching cars
    pub open_to_traffic: bool,
    /// Bridge links are opened and closed together
    pub is_bridge: bool,
    pub kind: LinkKind,
    cars: RingQueue<CarId>,
    speed: f64,
    travel_time: f64,
}

impl SimLink {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: LinkId,
        name: impl Into<String>,
        length: f64,
        origin: NodeId,
        destination: NodeId,
        kind: LinkKind,
        capacity: usize,
        params: &TrafficParams,
    ) -> Self {
        let mut link = Self {
            id,
            name: name.into(),
            length,
            origin,
            destination,
            open_to_traffic: true,
            is_bridge: false,
            kind,
            cars: RingQueue::new(capacity),
            speed: params.speed_limit,
            travel_time: length / params.speed_limit,
        };
        link.update_speed(params);
        link
    }

    /// Number of cars currently on the link
    pub fn occupancy(&self) -> usize {
        self.cars.len()
    }

    /// Distance covered per tick at the current occupancy
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Ticks needed to traverse the link at the current speed
    pub fn travel_time(&self) -> f64 {
        self.travel_time
    }

    /// The cars on the link, front first
    pub fn cars(&self) -> impl Iterator<Item = CarId> + '_ {
        self.cars.iter().copied()
    }

    /// Recompute speed and travel time from the current occupancy
    pub fn update_speed(&mut self, params: &TrafficParams) {
        self.speed = match self.kind {
            LinkKind::Constant => params.speed_limit,
            LinkKind::Congestible => {
                let slowdown = self.occupancy() as f64
                    * params.car_length
                    * params.speed_limit
                    * params.congestion_coef
                    / self.length;
                (params.speed_limit - slowdown).max(SPEED_FLOOR)
            }
        };
        self.travel_time = self.length / self.speed;
    }

    /// Whether a car can be placed at progress 0 without overlapping the last car
    pub fn has_entry_room(&self, cars: &[SimCar], car_length: f64) -> bool {
        self.cars.is_empty() || cars[self.cars.last().0].progress >= car_length
    }

    /// Put a car at the start of the link
    pub fn enter(&mut self, car: &mut SimCar, params: &TrafficParams) {
        car.enter_link(self.id);
        self.cars.enqueue(car.id);
        self.update_speed(params);
    }

    /// Move every car on the link forward by one tick
    ///
    /// Followers never close to within one car length of their leader. The
    /// front car hands off to the destination node once it reaches the end
    /// and the node is free; otherwise it waits at the end of the link.
    pub fn drive(&mut self, cars: &mut [SimCar], destination: &mut SimNode, params: &TrafficParams) {
        if self.cars.is_empty() {
            return;
        }

        let front = *self.cars.first();
        let lead = &mut cars[front.0];
        lead.advance_to((lead.progress + self.speed).min(self.length));
        let mut leader_progress = lead.progress;

        for offset in 1..self.cars.len() {
            let follower = &mut cars[self.cars.peek(offset).0];
            let target = (follower.progress + self.speed).min(leader_progress - params.car_length);
            follower.advance_to(target);
            leader_progress = follower.progress;
        }

        if cars[front.0].progress >= self.length && destination.has_room() {
            let car_id = self.cars.dequeue();
            destination.accept(&mut cars[car_id.0]);
            self.update_speed(params);
        }
    }

    /// Send every car on the link back to the parking lot
    pub fn evacuate(
        &mut self,
        cars: &mut [SimCar],
        parking_lot: &mut RingQueue<CarId>,
        params: &TrafficParams,
    ) {
        while !self.cars.is_empty() {
            let car_id = self.cars.dequeue();
            cars[car_id.0].park();
            parking_lot.enqueue(car_id);
        }
        self.update_speed(params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::types::{NodeKind, Position};
    use assert_approx_eq::assert_approx_eq;

    fn narrow(length: f64, params: &TrafficParams) -> SimLink {
        SimLink::new(
            LinkId(0),
            "a",
            length,
            NodeId(0),
            NodeId(1),
            LinkKind::Congestible,
            64,
            params,
        )
    }

    fn end_node() -> SimNode {
        SimNode::new(NodeId(1), "end", NodeKind::Junction, Position::default())
    }

    #[test]
    fn test_constant_link_ignores_occupancy() {
        let params = TrafficParams::default();
        let mut link = SimLink::new(
            LinkId(1),
            "A",
            498.0,
            NodeId(0),
            NodeId(2),
            LinkKind::Constant,
            8,
            &params,
        );
        let mut cars: Vec<SimCar> = (0..3).map(|i| SimCar::new(CarId(i))).collect();
        for car in cars.iter_mut() {
            link.enter(car, &params);
        }
        assert_eq!(link.speed(), params.speed_limit);
        assert_approx_eq!(link.travel_time(), 166.0);
    }

    #[test]
    fn test_congestible_speed_decreases_with_occupancy() {
        let params = TrafficParams {
            congestion_coef: 1.0,
            ..TrafficParams::default()
        };
        let mut link = narrow(270.0, &params);
        assert_eq!(link.speed(), params.speed_limit);

        let capacity = (270.0 / params.car_length) as usize + 1;
        let mut cars: Vec<SimCar> = (0..capacity).map(|i| SimCar::new(CarId(i))).collect();
        let mut previous = link.speed();
        for car in cars.iter_mut() {
            link.enter(car, &params);
            assert!(link.speed() > 0.0);
            assert!(link.speed() < previous || link.speed() == SPEED_FLOOR);
            previous = link.speed();
        }
        // A full link at coefficient 1 bottoms out at the floor instead of going negative.
        assert_eq!(link.speed(), SPEED_FLOOR);
        assert!(link.travel_time().is_finite());
    }

    #[test]
    fn test_congestion_formula() {
        let params = TrafficParams::default();
        let mut link = narrow(270.0, &params);
        let mut cars: Vec<SimCar> = (0..10).map(|i| SimCar::new(CarId(i))).collect();
        for car in cars.iter_mut() {
            link.enter(car, &params);
        }
        let expected = 3.0 - 10.0 * 6.0 * 3.0 * 0.55 / 270.0;
        assert_approx_eq!(link.speed(), expected);
        assert_approx_eq!(link.travel_time(), 270.0 / expected);
    }

    #[test]
    fn test_followers_keep_one_car_length() {
        let params = TrafficParams::default();
        let mut link = SimLink::new(
            LinkId(0),
            "B",
            120.0,
            NodeId(0),
            NodeId(1),
            LinkKind::Constant,
            32,
            &params,
        );
        let mut node = end_node();
        // Keep the node full so cars pile up at the end of the link.
        let mut blocker = SimCar::new(CarId(99));
        node.accept(&mut blocker);

        let mut cars: Vec<SimCar> = (0..12).map(|i| SimCar::new(CarId(i))).collect();
        let mut next = 0;
        for _ in 0..200 {
            if next < cars.len() && link.has_entry_room(&cars, params.car_length) {
                link.enter(&mut cars[next], &params);
                next += 1;
            }
            link.drive(&mut cars, &mut node, &params);

            let order: Vec<CarId> = link.cars().collect();
            for pair in order.windows(2) {
                let gap = cars[pair[0].0].progress - cars[pair[1].0].progress;
                assert!(gap >= params.car_length - 1e-9, "gap {gap} too small");
            }
        }
        assert_eq!(link.occupancy(), 12);
        assert_eq!(cars[0].progress, 120.0);
    }

    #[test]
    fn test_front_car_hands_off_when_node_has_room() {
        let params = TrafficParams::default();
        let mut link = SimLink::new(
            LinkId(0),
            "sn",
            6.0,
            NodeId(0),
            NodeId(1),
            LinkKind::Constant,
            4,
            &params,
        );
        let mut node = end_node();
        let mut cars = vec![SimCar::new(CarId(0))];
        link.enter(&mut cars[0], &params);

        link.drive(&mut cars, &mut node, &params);
        assert_eq!(cars[0].progress, 3.0);
        assert!(node.has_room());

        link.drive(&mut cars, &mut node, &params);
        assert_eq!(cars[0].progress, 6.0);
        assert_eq!(cars[0].odometer, 6.0);
        assert_eq!(node.car(), Some(CarId(0)));
        assert_eq!(link.occupancy(), 0);
    }

    #[test]
    fn test_evacuate_empties_link() {
        let params = TrafficParams::default();
        let mut link = narrow(270.0, &params);
        let mut cars: Vec<SimCar> = (0..3).map(|i| SimCar::new(CarId(i))).collect();
        for car in cars.iter_mut() {
            link.enter(car, &params);
            car.progress = 40.0;
        }
        let mut lot = RingQueue::new(3);
        link.evacuate(&mut cars, &mut lot, &params);
        assert_eq!(link.occupancy(), 0);
        assert_eq!(lot.len(), 3);
        assert_eq!(link.speed(), params.speed_limit);
        assert!(cars.iter().all(|car| car.progress == 0.0 && !car.is_visible()));
    }
}
