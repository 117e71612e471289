use crate::graph::{Edge, VesselGraph};
use crate::pool::Solution;
use fixedbitset::FixedBitSet;
use petgraph::graph::{EdgeReference, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::VecDeque;

/// Partial-path state that can be pushed along an edge and pruned by
/// dominance. The two implementors differ only in whether they remember which
/// rows the path has already called at.
pub trait PathLabel: Clone {
    fn at_source(g: &VesselGraph) -> Self;

    /// Transition along `e`; `None` when the move is infeasible.
    fn extended(&self, g: &VesselGraph, e: EdgeReference<Edge>) -> Option<Self>;

    fn dominates(&self, other: &Self) -> bool;

    /// Equality up to an absolute tolerance on the accumulated cost.
    fn agrees_with(&self, other: &Self, cost_eps: f64) -> bool;

    fn cost(&self) -> f64;
}

/// Resources carried from H1 to the current node: room left for future
/// pickups and deliveries, and the reduced cost accumulated so far.
#[derive(Debug, Clone)]
pub struct Label {
    pub q_pickupable: i32,
    pub q_deliverable: i32,
    pub cost: f64,
}

impl PathLabel for Label {
    fn at_source(g: &VesselGraph) -> Label {
        let capacity = g.vessel_class().capacity;
        Label {
            q_pickupable: capacity,
            q_deliverable: capacity,
            cost: 0.0,
        }
    }

    fn extended(&self, g: &VesselGraph, e: EdgeReference<Edge>) -> Option<Label> {
        let dest = g.node(e.target());
        debug_assert!(
            !dest.same_row_as(g.node(e.source())),
            "edge {} -> {} stays on one row",
            e.source().index(),
            e.target().index()
        );

        if self.q_pickupable < dest.pu_demand() || self.q_deliverable < dest.de_demand() {
            return None;
        }

        let dual = g.dual_of(e.target());
        let avoided_penalty = dest.pu_penalty() + dest.de_penalty(); // at most one is non-zero
        Some(Label {
            q_pickupable: self.q_pickupable - dest.pu_demand(),
            q_deliverable: (self.q_deliverable - dest.de_demand())
                .min(self.q_pickupable - dest.pu_demand()),
            cost: self.cost + e.weight().cost - avoided_penalty - dual,
        })
    }

    fn dominates(&self, other: &Label) -> bool {
        let strict = self.q_pickupable > other.q_pickupable
            || self.q_deliverable > other.q_deliverable
            || self.cost < other.cost;

        self.q_pickupable >= other.q_pickupable
            && self.q_deliverable >= other.q_deliverable
            && self.cost <= other.cost
            && strict
    }

    fn agrees_with(&self, other: &Label, cost_eps: f64) -> bool {
        self.q_pickupable == other.q_pickupable
            && self.q_deliverable == other.q_deliverable
            && (self.cost - other.cost).abs() < cost_eps
    }

    fn cost(&self) -> f64 {
        self.cost
    }
}

/// A `Label` that also refuses to call at any (port, pickup type) row twice.
/// `visited_ports` always spans every row of the graph, one bit per row.
#[derive(Debug, Clone)]
pub struct ElementaryLabel {
    pub label: Label,
    pub visited_ports: FixedBitSet,
}

impl PathLabel for ElementaryLabel {
    fn at_source(g: &VesselGraph) -> ElementaryLabel {
        ElementaryLabel {
            label: Label::at_source(g),
            visited_ports: FixedBitSet::with_capacity(2 * g.num_ports()),
        }
    }

    fn extended(&self, g: &VesselGraph, e: EdgeReference<Edge>) -> Option<ElementaryLabel> {
        let dest = g.node(e.target());
        if self.visited_ports.contains(dest.row_key()) {
            return None;
        }
        let label = self.label.extended(g, e)?;
        let mut visited_ports = self.visited_ports.clone();
        visited_ports.insert(dest.row_key());
        Some(ElementaryLabel {
            label,
            visited_ports,
        })
    }

    fn dominates(&self, other: &ElementaryLabel) -> bool {
        // a path that has called at a subset of the other's rows keeps
        // options the other has burned
        let visited_d = self.visited_ports.is_subset(&other.visited_ports);

        let strict = self.label.q_pickupable > other.label.q_pickupable
            || self.label.q_deliverable > other.label.q_deliverable
            || self.label.cost < other.label.cost
            || (visited_d && self.visited_ports != other.visited_ports);

        self.label.q_pickupable >= other.label.q_pickupable
            && self.label.q_deliverable >= other.label.q_deliverable
            && self.label.cost <= other.label.cost
            && visited_d
            && strict
    }

    fn agrees_with(&self, other: &ElementaryLabel, cost_eps: f64) -> bool {
        self.label.agrees_with(&other.label, cost_eps)
            && self.visited_ports == other.visited_ports
    }

    fn cost(&self) -> f64 {
        self.label.cost
    }
}

struct Trace<L> {
    node: NodeIndex,
    label: L,
    parent: Option<usize>,
    pruned: bool,
}

/// Label-setting search from H1 to H2 keeping a non-dominated frontier at
/// every node. Monomorphised per label variant since the dominance rules
/// differ.
pub struct LabellingEngine<'a> {
    graph: &'a VesselGraph,
    cost_eps: f64,
}

impl<'a> LabellingEngine<'a> {
    pub fn new(graph: &'a VesselGraph, cost_eps: f64) -> LabellingEngine<'a> {
        LabellingEngine { graph, cost_eps }
    }

    pub fn solve<L: PathLabel>(&self) -> Vec<Solution> {
        let g = self.graph;
        let source = g.source();
        let sink = g.sink();

        let mut arena: Vec<Trace<L>> = Vec::new();
        let mut frontier: Vec<Vec<usize>> = vec![Vec::new(); g.graph().node_count()];
        let mut queue: VecDeque<usize> = VecDeque::new();

        arena.push(Trace {
            node: source,
            label: L::at_source(g),
            parent: None,
            pruned: false,
        });
        frontier[source.index()].push(0);
        queue.push_back(0);

        while let Some(id) = queue.pop_front() {
            if arena[id].pruned {
                continue;
            }
            let node = arena[id].node;
            for e in g.graph().edges(node) {
                let next = match arena[id].label.extended(g, e) {
                    Some(next) => next,
                    None => continue,
                };
                let target = e.target();
                if let Some(new_id) =
                    self.settle(&mut arena, &mut frontier[target.index()], target, next, id)
                {
                    queue.push_back(new_id);
                }
            }
        }

        frontier[sink.index()]
            .iter()
            .map(|&id| self.unwind(&arena, id))
            .collect()
    }

    /// Admits `label` to a node's frontier unless an incumbent dominates or
    /// equals it; incumbents it dominates are evicted.
    fn settle<L: PathLabel>(
        &self,
        arena: &mut Vec<Trace<L>>,
        bucket: &mut Vec<usize>,
        node: NodeIndex,
        label: L,
        parent: usize,
    ) -> Option<usize> {
        for &held in bucket.iter() {
            let incumbent = &arena[held].label;
            if incumbent.agrees_with(&label, self.cost_eps) || incumbent.dominates(&label) {
                return None;
            }
        }

        bucket.retain(|&held| {
            if label.dominates(&arena[held].label) {
                arena[held].pruned = true;
                false
            } else {
                true
            }
        });

        let id = arena.len();
        arena.push(Trace {
            node,
            label,
            parent: Some(parent),
            pruned: false,
        });
        bucket.push(id);
        Some(id)
    }

    fn unwind<L: PathLabel>(&self, arena: &[Trace<L>], id: usize) -> Solution {
        let mut path = Vec::new();
        let mut cur = Some(id);
        while let Some(i) = cur {
            path.push(arena[i].node);
            cur = arena[i].parent;
        }
        path.reverse();
        Solution::new(
            path,
            arena[id].label.cost(),
            self.graph.vessel_class().name.clone(),
        )
    }
}
