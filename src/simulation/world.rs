//! Main simulation world that ties everything together
//!
//! `SimWorld` owns the network, the car pool, the dashboard and the RNG. An
//! external scheduler calls [`SimWorld::step`] at a fixed cadence; control
//! panels call the setters between ticks.

use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::car::SimCar;
use super::chooser::{RouteChooser, RoutingMode, SelectionMethod, SpeedMode};
use super::config::{clamp_congestion, clamp_launch_rate, parse_max_cars, SimConfig};
use super::link::SimLink;
use super::network::{braess_network, NetworkSpec, SimNetwork};
use super::node::{DispatchOutcome, SimNode};
use super::ring_queue::RingQueue;
use super::route::{EstimateContext, SimRoute};
use super::stats::{format_normalized, Dashboard};
use super::timing::LaunchTiming;
use super::types::{CarId, LinkId, ModelState, NodeId, Position, RouteId, TrafficParams};

/// The main simulation world
pub struct SimWorld {
    network: SimNetwork,

    /// Every car ever created, indexed by `CarId`
    cars: Vec<SimCar>,

    /// Idle cars waiting to be launched
    parking_lot: RingQueue<CarId>,

    dashboard: Dashboard,

    config: SimConfig,
    params: TrafficParams,

    /// Non-origin nodes and their inbound links; link order is reshuffled every tick
    service_order: Vec<(NodeId, Vec<LinkId>)>,

    /// Advances by the speed limit every tick
    clock: f64,
    next_departure: f64,
    state: ModelState,

    rng: StdRng,
}

impl SimWorld {
    /// Create a world on the reference Braess network
    pub fn new(config: SimConfig) -> Result<Self> {
        Self::from_spec(&braess_network(), config)
    }

    /// Create a reproducible world with default settings
    pub fn new_with_seed(seed: u64) -> Result<Self> {
        Self::new(SimConfig::with_seed(seed))
    }

    /// Create a world on an arbitrary topology
    pub fn from_spec(spec: &NetworkSpec, config: SimConfig) -> Result<Self> {
        let config = config.normalized();
        if !(config.speed_limit > 0.0 && config.car_length > 0.0) {
            bail!(
                "Speed limit {} and car length {} must be positive",
                config.speed_limit,
                config.car_length
            );
        }
        let params = config.traffic_params();

        let pool_size = spec.pool_size(params.car_length);
        let mut network = SimNetwork::build(spec, pool_size, &params)
            .context("Failed to build road network")?;
        network.set_bridge_open(config.bridge_open);

        let cars: Vec<SimCar> = (0..pool_size).map(|i| SimCar::new(CarId(i))).collect();
        let mut parking_lot = RingQueue::new(pool_size);
        for car in &cars {
            parking_lot.enqueue(car.id);
        }

        let dashboard = Dashboard::new(
            network.routes.len(),
            network.quickest_trip(params.speed_limit),
        );
        let service_order = network.service_order().to_vec();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        info!(
            "Created world with {} cars, {} links, bridge {}",
            pool_size,
            network.links.len(),
            if network.bridge_open() { "open" } else { "closed" }
        );

        Ok(Self {
            network,
            cars,
            parking_lot,
            dashboard,
            config,
            params,
            service_order,
            clock: 0.0,
            next_departure: 0.0,
            state: ModelState::Stopped,
            rng,
        })
    }

    /// Begin launching cars. Only valid from `Stopped`.
    pub fn start(&mut self) -> bool {
        if self.state != ModelState::Stopped {
            return false;
        }
        self.state = ModelState::Running;
        info!("Model running at clock {:.0}", self.clock);
        true
    }

    /// Stop launching and let the network drain. Only valid from `Running`.
    pub fn request_stop(&mut self) -> bool {
        if self.state != ModelState::Running {
            return false;
        }
        self.state = ModelState::Stopping;
        info!("Model stopping; {} cars still on the road", self.vehicles_in_network());
        true
    }

    /// Advance the simulation by one tick and return the resulting state
    pub fn step(&mut self) -> ModelState {
        for slot in 0..self.service_order.len() {
            let node = self.service_order[slot].0;
            self.service_order[slot].1.shuffle(&mut self.rng);
            for i in 0..self.service_order[slot].1.len() {
                let link = self.service_order[slot].1[i];
                self.dispatch(node);
                self.drive(link);
            }
        }

        // Clear a car left waiting at the origin before launching another.
        let origin = self.network.origin();
        self.dispatch(origin);
        self.dispatch(origin);
        self.launch_car();

        self.clock += self.params.speed_limit;

        if self.state == ModelState::Stopping && self.parking_lot.len() == self.cars.len() {
            self.state = ModelState::Stopped;
            info!("Model stopped at clock {:.0}", self.clock);
            self.log_report();
        }
        if self.state == ModelState::Running {
            if let Some(max_cars) = self.config.max_cars {
                if self.dashboard.departures() >= max_cars {
                    self.state = ModelState::Stopping;
                    info!("Reached {max_cars} departures; model stopping");
                }
            }
        }

        self.state
    }

    fn dispatch(&mut self, node: NodeId) {
        let outcome = self.network.nodes[node.0].dispatch(
            &mut self.cars,
            &self.network.routes,
            &mut self.network.links,
            &self.params,
        );
        if let DispatchOutcome::Arrived(car_id) = outcome {
            self.record_arrival(car_id);
        }
    }

    fn drive(&mut self, link: LinkId) {
        let destination = self.network.links[link.0].destination;
        self.network.links[link.0].drive(
            &mut self.cars,
            &mut self.network.nodes[destination.0],
            &self.params,
        );
    }

    fn record_arrival(&mut self, car_id: CarId) {
        let car = &mut self.cars[car_id.0];
        let route = car
            .route
            .unwrap_or_else(|| panic!("{car_id:?} arrived without a route"));
        car.arrive_time = self.clock;
        let elapsed = (self.clock - car.depart_time) / self.params.speed_limit;
        self.dashboard.record_arrival(route, elapsed);
        car.park();
        self.parking_lot.enqueue(car_id);
    }

    /// Launch the next idle car if the origin is free and a departure is due
    pub fn launch_car(&mut self) -> Option<CarId> {
        let origin = self.network.origin();
        if self.state != ModelState::Running
            || !self.network.nodes[origin.0].has_room()
            || self.clock < self.next_departure
            || self.parking_lot.is_empty()
        {
            return None;
        }

        let Some(route) = self.choose_route() else {
            warn!("Every route is closed; skipping launch");
            self.schedule_next_departure();
            return None;
        };

        let car_id = self.parking_lot.dequeue();
        let car = &mut self.cars[car_id.0];
        car.depart_time = self.clock;
        car.route = Some(route);
        self.network.nodes[origin.0].accept(car);
        self.dashboard.record_departure();
        self.schedule_next_departure();

        debug!(
            "Launched {:?} on route {} at clock {:.0}",
            car_id, self.network.routes[route.0].label, self.clock
        );
        Some(car_id)
    }

    fn schedule_next_departure(&mut self) {
        let lambda = self.config.launch_rate / self.params.speed_limit;
        self.next_departure = self.clock + self.config.timing.sample(lambda, &mut self.rng);
    }

    fn choose_route(&mut self) -> Option<RouteId> {
        let available = self.network.available_routes();
        if available.is_empty() {
            return None;
        }
        let chooser = RouteChooser::from_settings(self.config.routing, self.config.selection);
        let times = match chooser {
            RouteChooser::Random => vec![0.0; available.len()],
            _ => self.estimate_times(&available),
        };
        Some(available[chooser.choose(&times, &mut self.rng)])
    }

    /// Travel-time estimates for the given routes with the active estimator
    pub fn estimate_times(&self, routes: &[RouteId]) -> Vec<f64> {
        let ctx = EstimateContext {
            links: &self.network.links,
            cars: &self.cars,
            dashboard: &self.dashboard,
            clock: self.clock,
            speed_limit: self.params.speed_limit,
        };
        routes
            .iter()
            .map(|id| self.network.routes[id.0].estimate(self.config.speed_mode, &ctx))
            .collect()
    }

    /// Return every car to the parking lot and zero the clock and statistics
    pub fn reset(&mut self) {
        for link in self.network.links.iter_mut() {
            link.evacuate(&mut self.cars, &mut self.parking_lot, &self.params);
        }
        for node in self.network.nodes.iter_mut() {
            node.evacuate(&mut self.cars, &mut self.parking_lot);
        }
        assert_eq!(
            self.parking_lot.len(),
            self.cars.len(),
            "cars lost during reset"
        );

        self.clock = 0.0;
        self.next_departure = 0.0;
        self.state = ModelState::Stopped;
        self.dashboard.reset();
        info!("Model reset");
    }

    pub fn set_launch_rate(&mut self, rate: f64) {
        self.config.launch_rate = clamp_launch_rate(rate);
        self.schedule_next_departure();
    }

    pub fn set_congestion(&mut self, coef: f64) {
        self.config.congestion_coef = clamp_congestion(coef);
        self.params.congestion_coef = self.config.congestion_coef;
        self.network.update_speeds(&self.params);
    }

    pub fn set_timing(&mut self, timing: LaunchTiming) {
        self.config.timing = timing;
    }

    pub fn set_routing(&mut self, routing: RoutingMode) {
        self.config.routing = routing;
    }

    pub fn set_speed_mode(&mut self, speed_mode: SpeedMode) {
        self.config.speed_mode = speed_mode;
    }

    pub fn set_selection(&mut self, selection: SelectionMethod) {
        self.config.selection = selection;
    }

    pub fn set_bridge_open(&mut self, open: bool) {
        self.config.bridge_open = open;
        self.network.set_bridge_open(open);
        debug!("Bridge {}", if open { "opened" } else { "closed" });
    }

    /// Flip the bridge and return whether it is now open
    pub fn toggle_bridge(&mut self) -> bool {
        let open = !self.network.bridge_open();
        self.set_bridge_open(open);
        open
    }

    /// `None` or `Some(0)` means unlimited
    pub fn set_max_cars(&mut self, max_cars: Option<usize>) {
        self.config.max_cars = max_cars.filter(|&max| max > 0);
    }

    pub fn set_max_cars_from_str(&mut self, input: &str) {
        self.set_max_cars(parse_max_cars(input));
    }

    pub fn state(&self) -> ModelState {
        self.state
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn next_departure(&self) -> f64 {
        self.next_departure
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn params(&self) -> &TrafficParams {
        &self.params
    }

    pub fn network(&self) -> &SimNetwork {
        &self.network
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn cars(&self) -> &[SimCar] {
        &self.cars
    }

    pub fn links(&self) -> &[SimLink] {
        &self.network.links
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.network.nodes
    }

    pub fn routes(&self) -> &[SimRoute] {
        &self.network.routes
    }

    pub fn link_by_name(&self, name: &str) -> Option<&SimLink> {
        self.network.link_by_name(name)
    }

    pub fn route_by_label(&self, label: &str) -> Option<&SimRoute> {
        self.network.route_by_label(label)
    }

    pub fn available_routes(&self) -> Vec<RouteId> {
        self.network.available_routes()
    }

    pub fn bridge_open(&self) -> bool {
        self.network.bridge_open()
    }

    pub fn node_position(&self, node: NodeId) -> Position {
        self.network.nodes[node.0].position
    }

    /// Cars a renderer should draw (on a link or waiting at a node)
    pub fn visible_cars(&self) -> impl Iterator<Item = &SimCar> + '_ {
        self.cars.iter().filter(|car| car.is_visible())
    }

    /// Paint color of the car's route, `None` while parked
    pub fn car_color(&self, car: CarId) -> Option<&str> {
        self.cars[car.0]
            .route
            .map(|route| self.network.routes[route.0].color.as_str())
    }

    pub fn total_cars(&self) -> usize {
        self.cars.len()
    }

    pub fn parked_count(&self) -> usize {
        self.parking_lot.len()
    }

    /// Cars on links plus cars held at nodes
    pub fn vehicles_in_network(&self) -> usize {
        let on_links: usize = self.network.links.iter().map(|link| link.occupancy()).sum();
        let at_nodes = self
            .network
            .nodes
            .iter()
            .filter(|node| !node.has_room())
            .count();
        on_links + at_nodes
    }

    /// Log the dashboard readouts at info level
    pub fn log_report(&self) {
        info!(
            "launch rate {:.2}, congestion {:.2}, bridge {}",
            self.config.launch_rate,
            self.config.congestion_coef,
            if self.bridge_open() { "open" } else { "closed" }
        );
        for route in &self.network.routes {
            info!(
                "route {}: {} trips, normalized time {}",
                route.label,
                self.dashboard.count(route.id),
                format_normalized(self.dashboard.normalized_time(route.id))
            );
        }
        info!(
            "total: {} trips of {} departures, normalized time {}",
            self.dashboard.total_count(),
            self.dashboard.departures(),
            format_normalized(self.dashboard.normalized_total_time())
        );
    }

    /// Print a human-readable summary of the world state
    pub fn print_summary(&self) {
        println!("=== Braess Network Summary ===");
        println!("Clock: {:.0} ({} ticks)", self.clock, (self.clock / self.params.speed_limit) as u64);
        println!("State: {}", self.state);
        println!(
            "Bridge: {}, launch rate: {:.2}, congestion: {:.2}",
            if self.bridge_open() { "open" } else { "closed" },
            self.config.launch_rate,
            self.config.congestion_coef
        );
        println!(
            "Routing: {} / {} / {}, timing: {}",
            self.config.routing, self.config.speed_mode, self.config.selection, self.config.timing
        );
        println!(
            "Cars: {} parked, {} on the road, {} total",
            self.parked_count(),
            self.vehicles_in_network(),
            self.total_cars()
        );
        println!();

        println!("--- Links ---");
        for link in &self.network.links {
            println!(
                "  {:<10} occupancy={:<3} speed={:.3} travel_time={:.1}{}",
                link.name,
                link.occupancy(),
                link.speed(),
                link.travel_time(),
                if link.open_to_traffic { "" } else { " (closed)" }
            );
        }

        println!("--- Routes ---");
        for route in &self.network.routes {
            println!(
                "  {:<4} trips={:<6} time={}",
                route.label,
                self.dashboard.count(route.id),
                format_normalized(self.dashboard.normalized_time(route.id))
            );
        }
        println!(
            "  total trips={:<6} time={} departures={}",
            self.dashboard.total_count(),
            format_normalized(self.dashboard.normalized_total_time()),
            self.dashboard.departures()
        );
    }
}
