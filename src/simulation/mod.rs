//! Braess network simulation
//!
//! The discrete-time engine behind the Braess's paradox demonstration: ring
//! queues, links and nodes, route estimation and choice, and the world that
//! steps them. Rendering and controls live outside this module and talk to
//! it only through `SimWorld`.

mod car;
mod chooser;
mod config;
mod link;
mod network;
mod node;
mod ring_queue;
mod route;
mod stats;
mod timing;
mod types;
mod world;

pub use car::SimCar;
pub use chooser::{selection_weights, RouteChooser, RoutingMode, SelectionMethod, SpeedMode};
pub use config::{parse_max_cars, SimConfig};
pub use link::SimLink;
pub use network::{braess_network, LinkSpec, NetworkSpec, NodeSpec, RouteSpec, SimNetwork};
pub use node::{DispatchOutcome, SimNode};
pub use ring_queue::RingQueue;
pub use route::{EstimateContext, SimRoute};
pub use stats::{format_normalized, Dashboard, TripTally};
pub use timing::LaunchTiming;
pub use types::{
    CarId, CarLocation, LinkId, LinkKind, ModelState, NodeId, NodeKind, Position, RouteId,
    TrafficParams, CAR_LENGTH, MIN_LAUNCH_RATE, POOL_SLACK, SPEED_FLOOR, SPEED_LIMIT,
};
pub use world::SimWorld;
