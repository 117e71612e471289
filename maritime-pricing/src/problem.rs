use crate::graph::VesselGraph;
use crate::port::{Port, VesselClass};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Static instance data handed over by preprocessing.
#[derive(Debug, Clone, Default)]
pub struct ProblemData {
    pub ports: Vec<Port>,
    pub vessel_classes: Vec<VesselClass>,
}

fn lambda_start() -> f64 {
    0.1
}
fn lambda_end() -> f64 {
    0.5
}
fn lambda_inc() -> f64 {
    0.1
}
fn greedy_max_outgoing() -> usize {
    4
}
fn cost_eps() -> f64 {
    1e-5
}

/// Tuning options; a params file only needs to name what it overrides.
#[derive(Deserialize, Debug, Clone)]
pub struct ProgramParams {
    #[serde(default = "lambda_start")]
    pub lambda_start: f64,
    #[serde(default = "lambda_end")]
    pub lambda_end: f64,
    #[serde(default = "lambda_inc")]
    pub lambda_inc: f64,
    /// How many first moves the fast walks branch over.
    #[serde(default = "greedy_max_outgoing")]
    pub greedy_max_outgoing: usize,
    /// Absolute tolerance when two label costs count as equal.
    #[serde(default = "cost_eps")]
    pub cost_eps: f64,
}

impl Default for ProgramParams {
    fn default() -> ProgramParams {
        ProgramParams {
            lambda_start: lambda_start(),
            lambda_end: lambda_end(),
            lambda_inc: lambda_inc(),
            greedy_max_outgoing: greedy_max_outgoing(),
            cost_eps: cost_eps(),
        }
    }
}

impl ProgramParams {
    pub fn load(path: impl AsRef<Path>) -> ProgramParams {
        let mut s = String::new();
        File::open(path).unwrap().read_to_string(&mut s).unwrap();
        serde_json::from_str(&s).unwrap()
    }
}

/// Everything one pricing call reads: instance data, options, and one
/// time-expanded graph per vessel class. The map is ordered so stages visit
/// the graphs in the same sequence on every run.
#[derive(Debug)]
pub struct Problem {
    pub data: ProblemData,
    pub params: ProgramParams,
    pub graphs: BTreeMap<String, VesselGraph>,
}
