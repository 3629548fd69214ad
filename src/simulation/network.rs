//! Road network topology
//!
//! A [`NetworkSpec`] is a plain descriptor of nodes, links and routes by name.
//! [`SimNetwork::build`] resolves the names, validates the topology with a
//! petgraph directed graph and produces the indexed nodes, links and routes
//! the simulation steps over.

use anyhow::{bail, Context, Result};
use log::debug;
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

use super::link::SimLink;
use super::node::SimNode;
use super::route::SimRoute;
use super::types::{LinkId, LinkKind, NodeId, NodeKind, Position, RouteId, TrafficParams, POOL_SLACK};

#[derive(Debug, Clone)]
pub struct NodeSpec {
    pub name: String,
    pub kind: NodeKind,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub struct LinkSpec {
    pub name: String,
    pub from: String,
    pub to: String,
    /// Rounded to whole units when the network is built
    pub length: f64,
    pub kind: LinkKind,
    /// Bridge links start closed and open or close as a unit
    pub bridge: bool,
}

#[derive(Debug, Clone)]
pub struct RouteSpec {
    pub label: String,
    pub color: String,
    /// Link names from the origin to the destination
    pub links: Vec<String>,
}

/// Topology descriptor shared by the simulation and any renderer
#[derive(Debug, Clone, Default)]
pub struct NetworkSpec {
    pub nodes: Vec<NodeSpec>,
    pub links: Vec<LinkSpec>,
    pub routes: Vec<RouteSpec>,
}

impl NetworkSpec {
    /// Summed length of every link, after rounding
    pub fn total_length(&self) -> f64 {
        self.links.iter().map(|link| link.length.round()).sum()
    }

    /// Cars needed so that the links can fill up and the lot still has spares
    pub fn pool_size(&self, car_length: f64) -> usize {
        (self.total_length() / car_length).ceil() as usize + POOL_SLACK
    }

    fn node(&mut self, name: &str, kind: NodeKind, x: f64, y: f64) -> &mut Self {
        self.nodes.push(NodeSpec {
            name: name.to_string(),
            kind,
            position: Position::new(x, y),
        });
        self
    }

    fn link(&mut self, name: &str, from: &str, to: &str, length: f64, kind: LinkKind, bridge: bool) -> &mut Self {
        self.links.push(LinkSpec {
            name: name.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            length,
            kind,
            bridge,
        });
        self
    }

    fn route(&mut self, label: &str, color: &str, links: &[&str]) -> &mut Self {
        self.routes.push(RouteSpec {
            label: label.to_string(),
            color: color.to_string(),
            links: links.iter().map(|name| name.to_string()).collect(),
        });
        self
    }
}

/// The four-node diamond used to demonstrate Braess's paradox
///
/// Wide links `A` and `B` always run at the speed limit; narrow links `a`
/// and `b` slow down with occupancy. The bridge joins the two midpoints.
pub fn braess_network() -> NetworkSpec {
    use LinkKind::{Congestible, Constant};

    let mut spec = NetworkSpec::default();
    spec.node("orig", NodeKind::Origin, 100.0, 300.0)
        .node("south", NodeKind::Junction, 400.0, 321.0)
        .node("north", NodeKind::Junction, 400.0, 279.0)
        .node("dest", NodeKind::Destination, 700.0, 300.0);
    spec.link("a", "orig", "south", 270.0, Congestible, false)
        .link("A", "orig", "north", 498.0, Constant, false)
        .link("b", "north", "dest", 270.0, Congestible, false)
        .link("B", "south", "dest", 498.0, Constant, false)
        .link("sn-bridge", "south", "north", 42.0, Constant, true)
        .link("ns-bridge", "north", "south", 42.0, Constant, true);
    spec.route("Ab", "#cb0130", &["A", "b"])
        .route("aB", "#1010a5", &["a", "B"])
        .route("AB", "#ffc526", &["A", "ns-bridge", "B"])
        .route("ab", "#4b9b55", &["a", "sn-bridge", "b"]);
    spec
}

/// Indexed, validated network ready to simulate
#[derive(Debug, Clone)]
pub struct SimNetwork {
    pub nodes: Vec<SimNode>,
    pub links: Vec<SimLink>,
    pub routes: Vec<SimRoute>,
    origin: NodeId,
    destination: NodeId,
    /// Non-origin nodes with their inbound links, in the order a tick services them
    service_order: Vec<(NodeId, Vec<LinkId>)>,
}

impl SimNetwork {
    /// Resolve and validate a descriptor
    ///
    /// Every link queue gets `capacity` slots; callers pass the car pool size
    /// so no queue can overflow.
    pub fn build(spec: &NetworkSpec, capacity: usize, params: &TrafficParams) -> Result<Self> {
        let mut graph: DiGraph<NodeId, LinkId> = DiGraph::new();
        let mut node_index: HashMap<&str, NodeIndex> = HashMap::new();
        let mut nodes = Vec::with_capacity(spec.nodes.len());

        for (i, node) in spec.nodes.iter().enumerate() {
            let id = NodeId(i);
            if node_index.insert(node.name.as_str(), graph.add_node(id)).is_some() {
                bail!("Duplicate node name {:?}", node.name);
            }
            nodes.push(SimNode::new(id, node.name.clone(), node.kind, node.position));
        }

        let origin = single_node_of_kind(&nodes, NodeKind::Origin)?;
        let destination = single_node_of_kind(&nodes, NodeKind::Destination)?;

        let mut link_ids: HashMap<&str, LinkId> = HashMap::new();
        let mut links = Vec::with_capacity(spec.links.len());
        for (i, link) in spec.links.iter().enumerate() {
            let id = LinkId(i);
            let from = *node_index
                .get(link.from.as_str())
                .with_context(|| format!("Link {:?} starts at unknown node {:?}", link.name, link.from))?;
            let to = *node_index
                .get(link.to.as_str())
                .with_context(|| format!("Link {:?} ends at unknown node {:?}", link.name, link.to))?;
            let length = link.length.round();
            if !length.is_finite() || length <= 0.0 {
                bail!("Link {:?} has non-positive length {}", link.name, link.length);
            }
            if link_ids.insert(link.name.as_str(), id).is_some() {
                bail!("Duplicate link name {:?}", link.name);
            }

            graph.add_edge(from, to, id);
            let mut sim_link = SimLink::new(
                id,
                link.name.clone(),
                length,
                graph[from],
                graph[to],
                link.kind,
                capacity,
                params,
            );
            sim_link.is_bridge = link.bridge;
            sim_link.open_to_traffic = !link.bridge;
            links.push(sim_link);
        }

        if !has_path_connecting(&graph, NodeIndex::new(origin.0), NodeIndex::new(destination.0), None) {
            bail!("No path from the origin to the destination");
        }

        let mut routes = Vec::with_capacity(spec.routes.len());
        let mut labels = HashSet::new();
        for (i, route) in spec.routes.iter().enumerate() {
            if !labels.insert(route.label.as_str()) {
                bail!("Duplicate route label {:?}", route.label);
            }
            let itinerary = resolve_itinerary(route, &link_ids, &links, origin, destination)
                .with_context(|| format!("Invalid route {:?}", route.label))?;
            routes.push(SimRoute::new(
                RouteId(i),
                route.label.clone(),
                route.color.clone(),
                itinerary,
                &links,
                nodes.len(),
            ));
        }
        if routes.is_empty() {
            bail!("Network has no routes");
        }

        let service_order = nodes
            .iter()
            .rev()
            .filter(|node| node.id != origin)
            .map(|node| {
                let mut inbound: Vec<LinkId> = graph
                    .edges_directed(NodeIndex::new(node.id.0), Direction::Incoming)
                    .map(|edge| *edge.weight())
                    .collect();
                inbound.sort();
                (node.id, inbound)
            })
            .collect();

        debug!(
            "Built network with {} nodes, {} links and {} routes",
            nodes.len(),
            links.len(),
            routes.len()
        );

        Ok(Self {
            nodes,
            links,
            routes,
            origin,
            destination,
            service_order,
        })
    }

    pub fn origin(&self) -> NodeId {
        self.origin
    }

    pub fn destination(&self) -> NodeId {
        self.destination
    }

    pub fn service_order(&self) -> &[(NodeId, Vec<LinkId>)] {
        &self.service_order
    }

    pub fn node_by_name(&self, name: &str) -> Option<&SimNode> {
        self.nodes.iter().find(|node| node.name == name)
    }

    pub fn link_by_name(&self, name: &str) -> Option<&SimLink> {
        self.links.iter().find(|link| link.name == name)
    }

    pub fn route_by_label(&self, label: &str) -> Option<&SimRoute> {
        self.routes.iter().find(|route| route.label == label)
    }

    /// Open or close every bridge link together
    pub fn set_bridge_open(&mut self, open: bool) {
        for link in self.links.iter_mut().filter(|link| link.is_bridge) {
            link.open_to_traffic = open;
        }
    }

    pub fn bridge_open(&self) -> bool {
        self.links
            .iter()
            .any(|link| link.is_bridge && link.open_to_traffic)
    }

    /// Routes whose links are all open, in declaration order
    pub fn available_routes(&self) -> Vec<RouteId> {
        self.routes
            .iter()
            .filter(|route| route.is_available(&self.links))
            .map(|route| route.id)
            .collect()
    }

    /// Ticks for the shortest route at the speed limit, bridge or not
    pub fn quickest_trip(&self, speed_limit: f64) -> f64 {
        self.routes
            .iter()
            .map(|route| route.free_flow_time(speed_limit))
            .fold(f64::INFINITY, f64::min)
    }

    pub fn update_speeds(&mut self, params: &TrafficParams) {
        for link in self.links.iter_mut() {
            link.update_speed(params);
        }
    }
}

fn single_node_of_kind(nodes: &[SimNode], kind: NodeKind) -> Result<NodeId> {
    let mut matching = nodes.iter().filter(|node| node.kind == kind);
    match (matching.next(), matching.next()) {
        (Some(node), None) => Ok(node.id),
        (None, _) => bail!("Network has no {:?} node", kind),
        (Some(_), Some(_)) => bail!("Network has more than one {:?} node", kind),
    }
}

/// Turn link names into ids, checking the links form a simple origin-to-destination path
fn resolve_itinerary(
    route: &RouteSpec,
    link_ids: &HashMap<&str, LinkId>,
    links: &[SimLink],
    origin: NodeId,
    destination: NodeId,
) -> Result<Vec<LinkId>> {
    if route.links.is_empty() {
        bail!("Itinerary is empty");
    }

    let mut itinerary = Vec::with_capacity(route.links.len());
    let mut visited = HashSet::from([origin]);
    let mut at = origin;
    for name in &route.links {
        let id = *link_ids
            .get(name.as_str())
            .with_context(|| format!("Unknown link {name:?}"))?;
        let link = &links[id.0];
        if link.origin != at {
            bail!("Link {name:?} does not continue from node {}", at.0);
        }
        if !visited.insert(link.destination) {
            bail!("Link {name:?} revisits node {}", link.destination.0);
        }
        at = link.destination;
        itinerary.push(id);
    }

    if at != destination {
        bail!("Itinerary ends at node {} instead of the destination", at.0);
    }
    Ok(itinerary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn build(spec: &NetworkSpec) -> Result<SimNetwork> {
        SimNetwork::build(spec, 16, &TrafficParams::default())
    }

    #[test]
    fn test_reference_geometry() {
        let spec = braess_network();
        assert_eq!(spec.total_length(), 1620.0);
        assert_eq!(spec.pool_size(6.0), 280);

        let network = build(&spec).unwrap();
        let lengths: Vec<f64> = ["Ab", "aB", "AB", "ab"]
            .iter()
            .map(|label| network.route_by_label(label).unwrap().route_length())
            .collect();
        assert_eq!(lengths, vec![768.0, 768.0, 1038.0, 582.0]);
        assert_approx_eq!(network.quickest_trip(3.0), 194.0);
    }

    #[test]
    fn test_bridge_starts_closed_and_toggles_as_unit() {
        let mut network = build(&braess_network()).unwrap();
        assert!(!network.bridge_open());
        assert_eq!(network.available_routes(), vec![RouteId(0), RouteId(1)]);

        network.set_bridge_open(true);
        assert!(network.bridge_open());
        assert!(network.link_by_name("sn-bridge").unwrap().open_to_traffic);
        assert!(network.link_by_name("ns-bridge").unwrap().open_to_traffic);
        assert_eq!(network.available_routes().len(), 4);

        network.set_bridge_open(false);
        assert_eq!(network.available_routes().len(), 2);
    }

    #[test]
    fn test_service_order_is_reverse_declaration() {
        let network = build(&braess_network()).unwrap();
        let names: Vec<&str> = network
            .service_order()
            .iter()
            .map(|(node, _)| network.nodes[node.0].name.as_str())
            .collect();
        assert_eq!(names, vec!["dest", "north", "south"]);

        let north = network.node_by_name("north").unwrap().id;
        assert_eq!(inbound_names(&network, network.destination()), vec!["b", "B"]);
        assert_eq!(inbound_names(&network, north), vec!["A", "sn-bridge"]);
    }

    fn inbound_names(network: &SimNetwork, node: NodeId) -> Vec<&str> {
        let (_, links) = network
            .service_order()
            .iter()
            .find(|(id, _)| *id == node)
            .unwrap();
        links.iter().map(|id| network.links[id.0].name.as_str()).collect()
    }

    #[test]
    fn test_route_directions() {
        let network = build(&braess_network()).unwrap();
        let ab = network.route_by_label("ab").unwrap();
        let south = network.node_by_name("south").unwrap().id;
        let next = ab.next_link(south).unwrap();
        assert_eq!(network.links[next.0].name, "sn-bridge");
        assert_eq!(ab.next_link(network.destination()), None);
    }

    #[test]
    fn test_rejects_unknown_node() {
        let mut spec = braess_network();
        spec.links[0].to = "west".to_string();
        let err = build(&spec).unwrap_err();
        assert!(err.to_string().contains("unknown node"), "{err}");
    }

    #[test]
    fn test_rejects_bad_lengths_and_duplicates() {
        let mut spec = braess_network();
        spec.links[2].length = 0.2;
        assert!(build(&spec).is_err());

        let mut spec = braess_network();
        spec.links[1].name = "a".to_string();
        assert!(build(&spec).unwrap_err().to_string().contains("Duplicate link"));

        let mut spec = braess_network();
        spec.nodes[2].name = "south".to_string();
        assert!(build(&spec).unwrap_err().to_string().contains("Duplicate node"));
    }

    #[test]
    fn test_rejects_broken_itineraries() {
        let mut spec = braess_network();
        spec.routes[0].links = vec!["A".to_string(), "B".to_string()];
        assert!(build(&spec).is_err());

        let mut spec = braess_network();
        spec.routes[0].links = vec!["A".to_string()];
        assert!(build(&spec).is_err());

        let mut spec = braess_network();
        spec.routes[0].links = vec![
            "a".to_string(),
            "sn-bridge".to_string(),
            "ns-bridge".to_string(),
            "B".to_string(),
        ];
        let err = build(&spec).unwrap_err();
        assert!(format!("{err:#}").contains("revisits"), "{err:#}");
    }

    #[test]
    fn test_rejects_unreachable_destination() {
        let mut spec = braess_network();
        spec.links.retain(|link| link.to != "dest");
        spec.routes.clear();
        assert!(build(&spec)
            .unwrap_err()
            .to_string()
            .contains("No path"));
    }
}
