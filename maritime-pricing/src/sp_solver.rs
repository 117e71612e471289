use crate::exact::ExactSolver;
use crate::graph::VesselGraph;
use crate::heuristics::HeuristicsSolver;
use crate::pool::{Column, ColumnPool, Solution};
use crate::problem::Problem;
use log::*;

/// One pricing pass over all vessel-class graphs: fast walks first, then
/// labelling on thinned graphs, exact labelling only when everything cheaper
/// came up empty.
pub struct SPSolver<'a> {
    prob: &'a Problem,
}

/// Screens one stage's raw candidates into accepted solutions and the four
/// discard buckets, in strict priority order.
#[derive(Default)]
struct Screen {
    valid_sols: Vec<Solution>,
    discarded_prc: usize,
    discarded_infeasible: usize,
    discarded_generated: usize,
    discarded_in_pool: usize,
}

impl Screen {
    fn offer(&mut self, s: Solution, g: &VesselGraph, pool: &ColumnPool) {
        if s.reduced_cost > -(f32::EPSILON as f64) {
            self.discarded_prc += 1;
        } else if !s.satisfies_capacity_constraints(g) {
            self.discarded_infeasible += 1;
        } else if self.valid_sols.contains(&s) {
            self.discarded_generated += 1;
        } else if pool.contains_solution(&s) {
            self.discarded_in_pool += 1;
        } else {
            self.valid_sols.push(s);
        }
    }

    fn report(&self, stage: &str) {
        info!("{}", stage);
        info!("We found {} new columns.", self.valid_sols.len());
        info!(
            "\t{} columns were discarded because they have positive reduced cost.",
            self.discarded_prc
        );
        info!(
            "\t{} columns were discarded because they're infeasible wrt capacity constraints.",
            self.discarded_infeasible
        );
        info!(
            "\t{} columns were discarded because they had already been generated in this iteration.",
            self.discarded_generated
        );
        info!(
            "\t{} columns were discarded because they were already in the columns pool.",
            self.discarded_in_pool
        );
    }

    /// Moves the accepted solutions into the pool; `true` if any moved.
    fn commit(self, pool: &mut ColumnPool) -> bool {
        if self.valid_sols.is_empty() {
            return false;
        }
        for s in self.valid_sols {
            pool.push(Column::new(s));
        }
        true
    }
}

impl<'a> SPSolver<'a> {
    pub fn new(prob: &'a Problem) -> SPSolver<'a> {
        SPSolver { prob }
    }

    /// Runs the cascade, appending any accepted columns to `pool`. Returns
    /// `false` only when all four stages produced nothing acceptable.
    pub fn solve(&self, pool: &mut ColumnPool) -> bool {
        let prob = self.prob;

        let mut screen = Screen::default();
        for g in prob.graphs.values() {
            let hsolv = HeuristicsSolver::new(&prob.params, g);
            for s in hsolv.solve_fast_forward() {
                screen.offer(s, g, pool);
            }
        }
        screen.report("Fast forward heuristics.");
        if screen.commit(pool) {
            return true;
        }

        let mut screen = Screen::default();
        for g in prob.graphs.values() {
            let hsolv = HeuristicsSolver::new(&prob.params, g);
            for s in hsolv.solve_fast_backward() {
                screen.offer(s, g, pool);
            }
        }
        screen.report("Fast backward heuristics.");
        if screen.commit(pool) {
            return true;
        }

        let mut screen = Screen::default();
        for g in prob.graphs.values() {
            let hsolv = HeuristicsSolver::new(&prob.params, g);
            let mut lambda = prob.params.lambda_start;
            while screen.valid_sols.is_empty() && lambda <= prob.params.lambda_end {
                for s in hsolv.solve_on_reduced_graph(lambda) {
                    screen.offer(s, g, pool);
                }
                lambda += prob.params.lambda_inc;
            }
        }
        screen.report("Labelling on the reduced graph.");
        if screen.commit(pool) {
            return true;
        }

        let mut screen = Screen::default();
        for g in prob.graphs.values() {
            let esolv = ExactSolver::new(&prob.params, g);
            for s in esolv.solve() {
                screen.offer(s, g, pool);
            }
        }
        screen.report("Labelling on the complete graph.");
        screen.commit(pool)
    }
}
