use crate::port::{PickupType, Port, VesselClass};
use fixedbitset::FixedBitSet;
use itertools::Itertools;
use noisy_float::prelude::*;
use petgraph::graph::{DiGraph, EdgeReference, NodeIndex};
use petgraph::visit::EdgeRef;

/// Role of a vertex in a time-expanded graph.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NodeType {
    /// Start depot, the unique source.
    H1,
    /// A regular port call at some time instant.
    Port,
    /// End depot, the unique sink.
    H2,
}

/// A (port, pickup type, time) vertex. Port attributes are copied in when the
/// graph is built so that pricing never chases a pointer back to the instance.
#[derive(Debug, Clone)]
pub struct Node {
    pub port: usize,
    pub pu_type: PickupType,
    pub time: i32,
    pub n_type: NodeType,
    pickup_demand: i32,
    delivery_demand: i32,
    pickup_penalty: f64,
    delivery_penalty: f64,
}

impl Node {
    pub fn port_call(port_id: usize, port: &Port, pu_type: PickupType, time: i32) -> Node {
        Node {
            port: port_id,
            pu_type,
            time,
            n_type: NodeType::Port,
            pickup_demand: port.pickup_demand,
            delivery_demand: port.delivery_demand,
            pickup_penalty: port.pickup_penalty,
            delivery_penalty: port.delivery_penalty,
        }
    }

    /// H1 leaves the hub loaded for pickups, H2 returns it empty; typing the
    /// depots this way keeps the two on different rows.
    pub fn depot(port_id: usize, n_type: NodeType, time: i32) -> Node {
        let pu_type = match n_type {
            NodeType::H1 => PickupType::Pickup,
            NodeType::H2 => PickupType::Delivery,
            NodeType::Port => panic!("a depot node must be typed H1 or H2"),
        };
        Node {
            port: port_id,
            pu_type,
            time,
            n_type,
            pickup_demand: 0,
            delivery_demand: 0,
            pickup_penalty: 0.0,
            delivery_penalty: 0.0,
        }
    }

    pub fn pu_demand(&self) -> i32 {
        match self.pu_type {
            PickupType::Pickup => self.pickup_demand,
            PickupType::Delivery => 0,
        }
    }

    pub fn de_demand(&self) -> i32 {
        match self.pu_type {
            PickupType::Delivery => self.delivery_demand,
            PickupType::Pickup => 0,
        }
    }

    pub fn pu_penalty(&self) -> f64 {
        match self.pu_type {
            PickupType::Pickup => self.pickup_penalty,
            PickupType::Delivery => 0.0,
        }
    }

    pub fn de_penalty(&self) -> f64 {
        match self.pu_type {
            PickupType::Delivery => self.delivery_penalty,
            PickupType::Pickup => 0.0,
        }
    }

    /// Two nodes share a row when they are the same port call at different times.
    pub fn same_row_as(&self, other: &Node) -> bool {
        self.port == other.port && self.pu_type == other.pu_type
    }

    pub(crate) fn row_key(&self) -> usize {
        2 * self.port + self.pu_type.index()
    }
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub cost: f64,
    /// Sailing distance; read by preprocessing only.
    pub length: f64,
}

/// The time-expanded graph of one vessel class, together with the dual prices
/// of the current master solution, stored densely by node index.
#[derive(Debug, Clone)]
pub struct VesselGraph {
    graph: DiGraph<Node, Edge>,
    duals: Vec<f64>,
    vessel_class: VesselClass,
    num_ports: usize,
}

impl VesselGraph {
    pub fn new(vessel_class: VesselClass, num_ports: usize) -> VesselGraph {
        VesselGraph {
            graph: DiGraph::new(),
            duals: Vec::new(),
            vessel_class,
            num_ports,
        }
    }

    pub fn add_node(&mut self, node: Node) -> NodeIndex {
        if node.port >= self.num_ports {
            panic!(
                "node references port {} but the instance has {} ports",
                node.port, self.num_ports
            );
        }
        self.duals.push(0.0);
        self.graph.add_node(node)
    }

    pub fn connect(&mut self, from: NodeIndex, to: NodeIndex, cost: f64, length: f64) {
        if self.graph[from].same_row_as(&self.graph[to]) {
            panic!(
                "edge {} -> {} stays on one row",
                from.index(),
                to.index()
            );
        }
        self.graph.add_edge(from, to, Edge { cost, length });
    }

    pub fn graph(&self) -> &DiGraph<Node, Edge> {
        &self.graph
    }

    pub fn node(&self, n: NodeIndex) -> &Node {
        &self.graph[n]
    }

    pub fn vessel_class(&self) -> &VesselClass {
        &self.vessel_class
    }

    pub fn num_ports(&self) -> usize {
        self.num_ports
    }

    pub fn dual_of(&self, n: NodeIndex) -> f64 {
        self.duals[n.index()]
    }

    pub fn set_dual(&mut self, n: NodeIndex, dual: f64) {
        self.duals[n.index()] = dual;
    }

    /// Installs a fresh master dual solution before the next pricing call.
    pub fn set_duals(&mut self, duals: Vec<f64>) {
        if duals.len() != self.graph.node_count() {
            panic!(
                "{} duals for {} nodes",
                duals.len(),
                self.graph.node_count()
            );
        }
        self.duals = duals;
    }

    pub fn source(&self) -> NodeIndex {
        self.graph
            .node_indices()
            .filter(|&n| self.graph[n].n_type == NodeType::H1)
            .exactly_one()
            .ok()
            .expect("exactly one start depot")
    }

    pub fn sink(&self) -> NodeIndex {
        self.graph
            .node_indices()
            .filter(|&n| self.graph[n].n_type == NodeType::H2)
            .exactly_one()
            .ok()
            .expect("exactly one end depot")
    }

    /// What taking `e` adds to a path's reduced cost: the sailing cost minus
    /// the penalty avoided and the dual collected at the destination.
    pub fn edge_reduced_cost(&self, e: EdgeReference<Edge>) -> f64 {
        let dest = &self.graph[e.target()];
        e.weight().cost - dest.pu_penalty() - dest.de_penalty() - self.dual_of(e.target())
    }

    /// A copy keeping only the `ceil(lambda * m)` edges of smallest reduced
    /// cost, ties broken by edge index. Node indices are preserved, so paths
    /// found on the copy are valid in `self`.
    pub fn reduced(&self, lambda: f64) -> VesselGraph {
        let m = self.graph.edge_count();
        let kept = ((m as f64 * lambda).ceil() as usize).min(m);

        let mut ranked: Vec<_> = self
            .graph
            .edge_references()
            .map(|e| (n64(self.edge_reduced_cost(e)), e.id()))
            .collect();
        ranked.sort_unstable();

        let mut keep = FixedBitSet::with_capacity(m);
        for &(_, e) in ranked.iter().take(kept) {
            keep.insert(e.index());
        }

        let graph = self.graph.filter_map(
            |_, n| Some(n.clone()),
            |i, e| {
                if keep.contains(i.index()) {
                    Some(e.clone())
                } else {
                    None
                }
            },
        );
        debug_assert_eq!(graph.node_count(), self.graph.node_count());

        VesselGraph {
            graph,
            duals: self.duals.clone(),
            vessel_class: self.vessel_class.clone(),
            num_ports: self.num_ports,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub(crate) fn port(name: &str, pickup_demand: i32, delivery_demand: i32) -> Port {
        Port {
            name: name.to_owned(),
            pickup_demand,
            delivery_demand,
            pickup_penalty: 0.0,
            delivery_penalty: 0.0,
        }
    }

    pub(crate) fn class(capacity: i32) -> VesselClass {
        VesselClass {
            name: "panamax".to_owned(),
            capacity,
        }
    }

    /// H1 -> H2 with a single zero-cost sailing.
    pub(crate) fn depot_only_graph() -> VesselGraph {
        let mut g = VesselGraph::new(class(10), 1);
        let h1 = g.add_node(Node::depot(0, NodeType::H1, 0));
        let h2 = g.add_node(Node::depot(0, NodeType::H2, 1));
        g.connect(h1, h2, 0.0, 0.0);
        g
    }

    /// H1 -> A -> H2 where A picks up one unit and pays `dual`; the two legs
    /// each cost one.
    pub(crate) fn single_call_graph(dual: f64) -> VesselGraph {
        let mut g = VesselGraph::new(class(10), 2);
        let h1 = g.add_node(Node::depot(0, NodeType::H1, 0));
        let a = g.add_node(Node::port_call(
            1,
            &port("anchorage", 1, 0),
            PickupType::Pickup,
            1,
        ));
        let h2 = g.add_node(Node::depot(0, NodeType::H2, 2));
        g.connect(h1, a, 1.0, 1.0);
        g.connect(a, h2, 1.0, 1.0);
        g.set_dual(a, dual);
        g
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn rows_split_on_port_and_pickup_type() {
        let p = port("valparaiso", 2, 1);
        let pu = Node::port_call(0, &p, PickupType::Pickup, 3);
        let pu_later = Node::port_call(0, &p, PickupType::Pickup, 7);
        let de = Node::port_call(0, &p, PickupType::Delivery, 3);

        assert!(pu.same_row_as(&pu_later));
        assert!(!pu.same_row_as(&de));
        assert_ne!(pu.row_key(), de.row_key());
    }

    #[test]
    fn depots_sit_on_different_rows() {
        let h1 = Node::depot(0, NodeType::H1, 0);
        let h2 = Node::depot(0, NodeType::H2, 9);
        assert!(!h1.same_row_as(&h2));
    }

    #[test]
    fn demand_gates_on_pickup_type() {
        let p = port("valparaiso", 2, 5);
        let pu = Node::port_call(0, &p, PickupType::Pickup, 1);
        let de = Node::port_call(0, &p, PickupType::Delivery, 1);

        assert_eq!(pu.pu_demand(), 2);
        assert_eq!(pu.de_demand(), 0);
        assert_eq!(de.pu_demand(), 0);
        assert_eq!(de.de_demand(), 5);
    }

    #[test]
    #[should_panic(expected = "stays on one row")]
    fn edges_may_not_stay_on_a_row() {
        let p = port("valparaiso", 1, 0);
        let mut g = VesselGraph::new(class(10), 1);
        let early = g.add_node(Node::port_call(0, &p, PickupType::Pickup, 1));
        let late = g.add_node(Node::port_call(0, &p, PickupType::Pickup, 2));
        g.connect(early, late, 1.0, 1.0);
    }

    #[test]
    fn duals_refresh_in_place() {
        let mut g = single_call_graph(10.0);
        let a = g
            .graph()
            .node_indices()
            .find(|&n| g.node(n).n_type == NodeType::Port)
            .unwrap();
        assert_eq!(g.dual_of(a), 10.0);

        g.set_duals(vec![0.0, 3.5, 0.0]);
        assert_eq!(g.dual_of(a), 3.5);
    }

    #[test]
    fn reduction_keeps_the_cheapest_fraction() {
        let mut g = VesselGraph::new(class(10), 3);
        let h1 = g.add_node(Node::depot(0, NodeType::H1, 0));
        let a = g.add_node(Node::port_call(1, &port("a", 1, 0), PickupType::Pickup, 1));
        let b = g.add_node(Node::port_call(2, &port("b", 1, 0), PickupType::Pickup, 1));
        let h2 = g.add_node(Node::depot(0, NodeType::H2, 2));
        g.connect(h1, a, -5.0, 1.0);
        g.connect(h1, b, 4.0, 1.0);
        g.connect(a, h2, -1.0, 1.0);
        g.connect(b, h2, 8.0, 1.0);

        let half = g.reduced(0.5);
        assert_eq!(half.graph().node_count(), 4);
        assert_eq!(half.graph().edge_count(), 2);
        // the kept edges are the two negative ones
        assert!(half.graph().find_edge(h1, a).is_some());
        assert!(half.graph().find_edge(a, h2).is_some());

        let all = g.reduced(1.0);
        assert_eq!(all.graph().edge_count(), 4);
    }

    #[test]
    fn source_and_sink_survive_reduction() {
        let g = single_call_graph(0.0).reduced(0.34);
        // a heavily thinned graph still designates its depots
        assert_eq!(g.node(g.source()).n_type, NodeType::H1);
        assert_eq!(g.node(g.sink()).n_type, NodeType::H2);
    }
}
