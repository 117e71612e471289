use crate::graph::VesselGraph;
use crate::labelling::{ElementaryLabel, LabellingEngine};
use crate::pool::Solution;
use crate::problem::ProgramParams;

/// Elementary labelling on the full graph; the cascade's last resort.
pub struct ExactSolver<'a> {
    params: &'a ProgramParams,
    graph: &'a VesselGraph,
}

impl<'a> ExactSolver<'a> {
    pub fn new(params: &'a ProgramParams, graph: &'a VesselGraph) -> ExactSolver<'a> {
        ExactSolver { params, graph }
    }

    pub fn solve(&self) -> Vec<Solution> {
        LabellingEngine::new(self.graph, self.params.cost_eps).solve::<ElementaryLabel>()
    }
}
