// src/opt/lcm/mod.rs
//! Lazy Code Motion: the four chained `2^Expr` dataflow passes
//! (Anticipated, Available, Postponable, Used), `earliest`/`latest`
//! derivation, and the two-phase transform in [`transform`].
pub mod sets;
pub mod transform;

pub use transform::{apply_lcm, split_critical_edges};

use crate::cfg::ControlFlowGraph;
use crate::dataflow::{DataflowAnalysis, Direction, TransferFunction};
use crate::lattice::ExprSet;
use petgraph::graph::NodeIndex;
use std::collections::HashMap;

struct AnticipatedTransfer<'a> {
    e_use: &'a HashMap<NodeIndex, ExprSet>,
    e_kill: &'a HashMap<NodeIndex, ExprSet>,
}
impl TransferFunction<ExprSet> for AnticipatedTransfer<'_> {
    fn apply(&self, block: NodeIndex, input: &ExprSet) -> ExprSet {
        self.e_use[&block].union(&input.difference(&self.e_kill[&block]))
    }
}

struct AvailableTransfer<'a> {
    an_in: &'a HashMap<NodeIndex, ExprSet>,
    e_kill: &'a HashMap<NodeIndex, ExprSet>,
}
impl TransferFunction<ExprSet> for AvailableTransfer<'_> {
    fn apply(&self, block: NodeIndex, input: &ExprSet) -> ExprSet {
        self.an_in[&block].union(input).difference(&self.e_kill[&block])
    }
}

struct PostponableTransfer<'a> {
    earliest: &'a HashMap<NodeIndex, ExprSet>,
    e_use: &'a HashMap<NodeIndex, ExprSet>,
}
impl TransferFunction<ExprSet> for PostponableTransfer<'_> {
    fn apply(&self, block: NodeIndex, input: &ExprSet) -> ExprSet {
        self.earliest[&block].union(input).difference(&self.e_use[&block])
    }
}

struct UsedTransfer<'a> {
    e_use: &'a HashMap<NodeIndex, ExprSet>,
    latest: &'a HashMap<NodeIndex, ExprSet>,
}
impl TransferFunction<ExprSet> for UsedTransfer<'_> {
    fn apply(&self, block: NodeIndex, input: &ExprSet) -> ExprSet {
        self.e_use[&block].union(input).difference(&self.latest[&block])
    }
}

/// The converged per-block facts the transform reads: the expression
/// universe, `eUse`, and `latest`/`U.out`, the two sets the placement and
/// rewrite conditions are built from.
#[derive(Debug, Clone)]
pub struct LcmAnalysis {
    pub universe: ExprSet,
    pub e_use: HashMap<NodeIndex, ExprSet>,
    pub latest: HashMap<NodeIndex, ExprSet>,
    pub used_out: HashMap<NodeIndex, ExprSet>,
}

/// Runs Anticipated (backward) and Available (forward) to a fixed point,
/// derives `earliest`, runs Postponable (forward) from it, derives `latest`,
/// then runs Used (backward) from `latest` — the chain in the design's
/// table, each lattice seeded with the `init`/`safe` pair that table gives.
/// Each pass's iteration ceiling is `max_iterations * |blocks|`
/// (`PipelineConfig::max_iterations`, default
/// [`crate::dataflow::DEFAULT_CEILING_MULTIPLIER`]).
#[must_use]
pub fn analyze(cfg: &ControlFlowGraph, max_iterations: usize) -> LcmAnalysis {
    let universe = sets::universe(cfg);
    let e_use = sets::e_use_sets(cfg);
    let e_kill = sets::e_kill_sets(cfg, &universe);

    let an = DataflowAnalysis::run_with_ceiling(
        cfg,
        Direction::Backward,
        ExprSet::empty(),
        universe.clone(),
        &AnticipatedTransfer { e_use: &e_use, e_kill: &e_kill },
        max_iterations,
    );
    let av = DataflowAnalysis::run_with_ceiling(
        cfg,
        Direction::Forward,
        ExprSet::empty(),
        universe.clone(),
        &AvailableTransfer { an_in: &an.in_states, e_kill: &e_kill },
        max_iterations,
    );

    let mut earliest: HashMap<NodeIndex, ExprSet> = HashMap::new();
    for block in cfg.blocks() {
        let not_available = universe.difference(&av.in_states[&block]);
        earliest.insert(block, an.in_states[&block].intersection(&not_available));
    }

    let pp = DataflowAnalysis::run_with_ceiling(
        cfg,
        Direction::Forward,
        ExprSet::empty(),
        universe.clone(),
        &PostponableTransfer { earliest: &earliest, e_use: &e_use },
        max_iterations,
    );

    let mut latest: HashMap<NodeIndex, ExprSet> = HashMap::new();
    for block in cfg.blocks() {
        let succs = cfg.successors(block);
        let inter_succ = succs.iter().fold(None, |acc: Option<ExprSet>, &s| {
            let term = earliest[&s].union(&pp.in_states[&s]);
            Some(acc.map_or(term.clone(), |a| a.intersection(&term)))
        });
        let inter_succ = inter_succ.unwrap_or_else(|| universe.clone());
        let complement = universe.difference(&inter_succ);
        let lhs = an.in_states[&block].union(&pp.in_states[&block]);
        let rhs = e_use[&block].union(&complement);
        latest.insert(block, lhs.intersection(&rhs));
    }

    let used = DataflowAnalysis::run_with_ceiling(
        cfg,
        Direction::Backward,
        universe.clone(),
        universe.clone(),
        &UsedTransfer { e_use: &e_use, latest: &latest },
        max_iterations,
    );

    LcmAnalysis { universe, e_use, latest, used_out: used.out_states }
}
