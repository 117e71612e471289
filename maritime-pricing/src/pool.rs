use crate::graph::VesselGraph;
use crate::labelling::{Label, PathLabel};
use petgraph::graph::NodeIndex;

/// An H1 -> H2 itinerary priced by the subproblem.
#[derive(Debug, Clone)]
pub struct Solution {
    pub path: Vec<NodeIndex>,
    pub reduced_cost: f64,
    pub vessel_class: String,
}

impl Solution {
    pub fn new(path: Vec<NodeIndex>, reduced_cost: f64, vessel_class: String) -> Solution {
        Solution {
            path,
            reduced_cost,
            vessel_class,
        }
    }

    /// Replays the itinerary against `g`, booking both load resources at
    /// every call. The backward heuristic cannot track capacity while it
    /// walks, so its candidates are vetted here.
    pub fn satisfies_capacity_constraints(&self, g: &VesselGraph) -> bool {
        let mut label = Label::at_source(g);
        for &n in self.path.iter().skip(1) {
            let dest = g.node(n);
            if label.q_pickupable < dest.pu_demand() || label.q_deliverable < dest.de_demand() {
                return false;
            }
            label = Label {
                q_pickupable: label.q_pickupable - dest.pu_demand(),
                q_deliverable: (label.q_deliverable - dest.de_demand())
                    .min(label.q_pickupable - dest.pu_demand()),
                cost: label.cost,
            };
        }
        true
    }
}

// candidates are deduplicated on the itinerary, never on floating cost
impl PartialEq for Solution {
    fn eq(&self, other: &Solution) -> bool {
        self.vessel_class == other.vessel_class && self.path == other.path
    }
}

/// A priced column ready for the restricted master.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub sol: Solution,
}

impl Column {
    pub fn new(sol: Solution) -> Column {
        Column { sol }
    }
}

/// Insertion-ordered set of the columns accepted so far. Membership is a
/// linear scan by solution equality; the pool outlives pricing calls.
#[derive(Debug, Clone, Default)]
pub struct ColumnPool {
    columns: Vec<Column>,
}

impl ColumnPool {
    pub fn new() -> ColumnPool {
        ColumnPool::default()
    }

    pub fn contains_solution(&self, s: &Solution) -> bool {
        self.columns.iter().any(|c| c.sol == *s)
    }

    pub fn push(&mut self, column: Column) {
        self.columns.push(column);
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
