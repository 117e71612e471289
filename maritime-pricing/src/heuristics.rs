use crate::graph::VesselGraph;
use crate::labelling::{Label, LabellingEngine, PathLabel};
use crate::pool::Solution;
use crate::problem::ProgramParams;
use noisy_float::prelude::*;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction::Incoming;

/// Cheap producers tried before exact labelling: two greedy walks and
/// labelling on a thinned graph.
pub struct HeuristicsSolver<'a> {
    params: &'a ProgramParams,
    graph: &'a VesselGraph,
}

impl<'a> HeuristicsSolver<'a> {
    pub fn new(params: &'a ProgramParams, graph: &'a VesselGraph) -> HeuristicsSolver<'a> {
        HeuristicsSolver { params, graph }
    }

    /// Greedy walks from H1. The first move branches over the cheapest
    /// feasible extensions, every later step takes the locally cheapest one;
    /// walks that dead-end before H2 yield nothing.
    pub fn solve_fast_forward(&self) -> Vec<Solution> {
        let g = self.graph;
        let h1 = g.source();
        let h2 = g.sink();
        let start = Label::at_source(g);

        let mut first_moves: Vec<(N64, NodeIndex, Label)> = g
            .graph()
            .edges(h1)
            .filter_map(|e| start.extended(g, e).map(|l| (n64(l.cost), e.target(), l)))
            .collect();
        first_moves.sort_by_key(|&(cost, node, _)| (cost, node));
        first_moves.truncate(self.params.greedy_max_outgoing.max(1));

        first_moves
            .into_iter()
            .filter_map(|(_, node, label)| self.run_forward(h1, node, label, h2))
            .collect()
    }

    fn run_forward(
        &self,
        h1: NodeIndex,
        mut node: NodeIndex,
        mut label: Label,
        h2: NodeIndex,
    ) -> Option<Solution> {
        let g = self.graph;
        let mut path = vec![h1, node];
        // a simple walk visits no more vertices than the graph holds
        let mut steps = g.graph().node_count();
        while node != h2 {
            if steps == 0 {
                return None;
            }
            steps -= 1;
            let (next_node, next_label) = g
                .graph()
                .edges(node)
                .filter_map(|e| label.extended(g, e).map(|l| (e.target(), l)))
                .min_by_key(|&(n, ref l)| (n64(l.cost), n))?;
            node = next_node;
            label = next_label;
            path.push(node);
        }
        Some(Solution::new(path, label.cost, g.vessel_class().name.clone()))
    }

    /// The mirror walk: from H2 along incoming sailings back to H1. Capacity
    /// cannot be booked while walking backwards, so these candidates rely on
    /// the caller's capacity check.
    pub fn solve_fast_backward(&self) -> Vec<Solution> {
        let g = self.graph;
        let h1 = g.source();
        let h2 = g.sink();

        let mut first_moves: Vec<(N64, NodeIndex, f64)> = g
            .graph()
            .edges_directed(h2, Incoming)
            .map(|e| {
                let score = n64(e.weight().cost - self.lookahead_profit(e.source(), h1));
                (score, e.source(), g.edge_reduced_cost(e))
            })
            .collect();
        first_moves.sort_by_key(|&(score, node, _)| (score, node));
        first_moves.truncate(self.params.greedy_max_outgoing.max(1));

        first_moves
            .into_iter()
            .filter_map(|(_, node, cost)| self.run_backward(node, cost, h1, h2))
            .collect()
    }

    fn run_backward(
        &self,
        mut node: NodeIndex,
        mut cost: f64,
        h1: NodeIndex,
        h2: NodeIndex,
    ) -> Option<Solution> {
        let g = self.graph;
        let mut rev_path = vec![h2, node];
        let mut steps = g.graph().node_count();
        while node != h1 {
            if steps == 0 {
                return None;
            }
            steps -= 1;
            let (_, next, arrived) = g
                .graph()
                .edges_directed(node, Incoming)
                .map(|e| {
                    let score = n64(e.weight().cost - self.lookahead_profit(e.source(), h1));
                    (score, e.source(), g.edge_reduced_cost(e))
                })
                .min_by_key(|&(score, n, _)| (score, n))?;
            cost += arrived;
            node = next;
            rev_path.push(node);
        }
        rev_path.reverse();
        Some(Solution::new(
            rev_path,
            cost,
            g.vessel_class().name.clone(),
        ))
    }

    // what landing on `n` next would earn; H1 ends the walk and earns nothing
    fn lookahead_profit(&self, n: NodeIndex, h1: NodeIndex) -> f64 {
        if n == h1 {
            return 0.0;
        }
        let node = self.graph.node(n);
        node.pu_penalty() + node.de_penalty() + self.graph.dual_of(n)
    }

    /// Non-elementary labelling on the graph thinned to the fraction
    /// `lambda` of its most promising sailings.
    pub fn solve_on_reduced_graph(&self, lambda: f64) -> Vec<Solution> {
        let reduced = self.graph.reduced(lambda);
        LabellingEngine::new(&reduced, self.params.cost_eps).solve::<Label>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::{class, port, single_call_graph};
    use crate::graph::{Node, NodeType};

    fn params() -> ProgramParams {
        ProgramParams::default()
    }

    #[test]
    fn fast_forward_finds_the_negative_itinerary() {
        let g = single_call_graph(10.0);
        let p = params();
        let sols = HeuristicsSolver::new(&p, &g).solve_fast_forward();

        assert_eq!(sols.len(), 1);
        assert_eq!(sols[0].path, vec![g.source(), g.graph().node_indices().nth(1).unwrap(), g.sink()]);
        assert!((sols[0].reduced_cost - (-8.0)).abs() < 1e-9);
    }

    #[test]
    fn fast_backward_agrees_with_fast_forward_on_a_line() {
        let g = single_call_graph(10.0);
        let p = params();
        let solver = HeuristicsSolver::new(&p, &g);

        let fwd = solver.solve_fast_forward();
        let bwd = solver.solve_fast_backward();
        assert_eq!(fwd.len(), 1);
        assert_eq!(bwd.len(), 1);
        assert_eq!(fwd[0], bwd[0]);
        assert!((fwd[0].reduced_cost - bwd[0].reduced_cost).abs() < 1e-9);
    }

    /// Two disjoint calls reachable first; branching must explore both.
    fn forked_graph() -> VesselGraph {
        use crate::port::PickupType;

        let mut g = VesselGraph::new(class(10), 3);
        let h1 = g.add_node(Node::depot(0, NodeType::H1, 0));
        let a = g.add_node(Node::port_call(1, &port("a", 1, 0), PickupType::Pickup, 1));
        let b = g.add_node(Node::port_call(2, &port("b", 1, 0), PickupType::Pickup, 1));
        let h2 = g.add_node(Node::depot(0, NodeType::H2, 2));
        g.connect(h1, a, 1.0, 1.0);
        g.connect(h1, b, 2.0, 1.0);
        g.connect(a, h2, 1.0, 1.0);
        g.connect(b, h2, 1.0, 1.0);
        g.set_dual(a, 5.0);
        g.set_dual(b, 5.0);
        g
    }

    #[test]
    fn branching_emits_one_walk_per_first_move() {
        let g = forked_graph();
        let mut p = params();
        p.greedy_max_outgoing = 2;
        let sols = HeuristicsSolver::new(&p, &g).solve_fast_forward();

        assert_eq!(sols.len(), 2);
        assert_ne!(sols[0], sols[1]);
        // the cheaper first move comes out first
        assert!(sols[0].reduced_cost <= sols[1].reduced_cost);
    }

    #[test]
    fn branching_is_capped_by_the_option() {
        let g = forked_graph();
        let mut p = params();
        p.greedy_max_outgoing = 1;
        let sols = HeuristicsSolver::new(&p, &g).solve_fast_forward();
        assert_eq!(sols.len(), 1);
    }

    #[test]
    fn a_dead_end_walk_yields_nothing() {
        use crate::port::PickupType;

        let mut g = VesselGraph::new(class(10), 3);
        let h1 = g.add_node(Node::depot(0, NodeType::H1, 0));
        // tempting but leads nowhere
        let trap = g.add_node(Node::port_call(1, &port("trap", 0, 0), PickupType::Pickup, 1));
        let a = g.add_node(Node::port_call(2, &port("a", 1, 0), PickupType::Pickup, 1));
        let h2 = g.add_node(Node::depot(0, NodeType::H2, 2));
        g.connect(h1, trap, -100.0, 1.0);
        g.connect(h1, a, 1.0, 1.0);
        g.connect(a, h2, 1.0, 1.0);

        let mut p = params();
        p.greedy_max_outgoing = 1;
        let sols = HeuristicsSolver::new(&p, &g).solve_fast_forward();
        assert!(sols.is_empty());
    }

    #[test]
    fn reduced_labelling_needs_enough_edges() {
        let g = single_call_graph(10.0);
        let p = params();
        let solver = HeuristicsSolver::new(&p, &g);

        // half the edges cannot connect the depots here
        assert!(solver.solve_on_reduced_graph(0.5).is_empty());

        let sols = solver.solve_on_reduced_graph(1.0);
        assert_eq!(sols.len(), 1);
        assert!((sols[0].reduced_cost - (-8.0)).abs() < 1e-9);
    }
}
