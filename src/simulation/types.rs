//! Core types for the Braess network simulation
//!
//! Identifiers, positions, shared constants and the small enums used by
//! links, nodes and the model state machine.

use std::fmt;

/// A wrapper type for car IDs (index into the world's vehicle table)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CarId(pub usize);

/// A wrapper type for link IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(pub usize);

/// A wrapper type for node IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// A wrapper type for route IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(pub usize);

/// A 2D reference position. Only renderers read it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Length of a car in distance units (two car radii of 3)
pub const CAR_LENGTH: f64 = 6.0;

/// Distance per tick in free-flowing traffic
pub const SPEED_LIMIT: f64 = 3.0;

/// Congestible links never slow below this speed
pub const SPEED_FLOOR: f64 = 1e-10;

/// Smallest accepted launch rate
pub const MIN_LAUNCH_RATE: f64 = 0.001;

/// Extra cars in the pool beyond what the links can physically hold
pub const POOL_SLACK: usize = 10;

/// How a link derives its speed from its occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// Always travels at the speed limit (the wide roads)
    Constant,
    /// Slows down linearly as cars pile onto it (the narrow roads)
    Congestible,
}

/// The role a node plays in the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Where cars are launched
    Origin,
    /// An intermediate junction
    Junction,
    /// Where cars finish their trip and return to the pool
    Destination,
}

/// Lifecycle of the model as driven by the external scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelState {
    #[default]
    Stopped,
    Running,
    /// No more launches; cars already on the road drain out
    Stopping,
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelState::Stopped => "stopped",
            ModelState::Running => "running",
            ModelState::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

/// Where a car currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CarLocation {
    /// Idle in the parking lot
    #[default]
    Parked,
    /// Resident in a node buffer
    AtNode(NodeId),
    /// Travelling along a link
    OnLink(LinkId),
}

/// The traffic parameters every link update needs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrafficParams {
    pub speed_limit: f64,
    pub car_length: f64,
    /// 0 means no slowdown at all; 1 means a full link slows to a stop
    pub congestion_coef: f64,
}

impl Default for TrafficParams {
    fn default() -> Self {
        Self {
            speed_limit: SPEED_LIMIT,
            car_length: CAR_LENGTH,
            congestion_coef: 0.55,
        }
    }
}
