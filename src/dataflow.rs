// src/dataflow.rs
//! A generic, worklist-driven dataflow framework parameterized over a
//! semilattice and a per-block transfer function.
use crate::cfg::ControlFlowGraph;
use crate::diagnostics;
use crate::lattice::Semilattice;
use petgraph::graph::NodeIndex;
use std::collections::{HashMap, HashSet, VecDeque};

/// Which way facts flow across an edge: forward analyses flow from a
/// block's predecessors into it; backward analyses flow from successors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// The per-block transfer function of one dataflow analysis.
pub trait TransferFunction<L: Semilattice> {
    fn apply(&self, block: NodeIndex, input: &L) -> L;
}

/// The converged `in`/`out` state of every block.
#[derive(Debug, Clone)]
pub struct DataflowResult<L: Semilattice> {
    pub in_states: HashMap<NodeIndex, L>,
    pub out_states: HashMap<NodeIndex, L>,
    /// `true` if the worklist emptied before the iteration ceiling; `false`
    /// if the analysis was cut off (the best-available state is still
    /// returned,: a non-convergence is a warning, not an
    /// error).
    pub converged: bool,
}

/// The generic dataflow driver: seeds the source block(s) with `init` and
/// every other block with `safe`, then iterates `TransferFunction::apply`
/// to a fixed point via a FIFO worklist.
pub struct DataflowAnalysis;

/// Default per-block multiplier for the iteration ceiling (`spec.md` §4.6's
/// "10·|blocks|"), used by [`DataflowAnalysis::run`]. Callers that want the
/// ceiling tied to [`crate::opt::PipelineConfig::max_iterations`] should use
/// [`DataflowAnalysis::run_with_ceiling`] instead.
pub const DEFAULT_CEILING_MULTIPLIER: usize = 10;

impl DataflowAnalysis {
    /// Runs one dataflow analysis over `cfg` to a fixed point (or the
    /// default iteration ceiling of `10 * blocks.len()`).
    #[must_use]
    pub fn run<L: Semilattice>(
        cfg: &ControlFlowGraph,
        direction: Direction,
        init: L,
        safe: L,
        transfer: &impl TransferFunction<L>,
    ) -> DataflowResult<L> {
        Self::run_with_ceiling(cfg, direction, init, safe, transfer, DEFAULT_CEILING_MULTIPLIER)
    }

    /// Same as [`Self::run`], but with the per-block iteration-ceiling
    /// multiplier supplied explicitly (`PipelineConfig::max_iterations`'s
    /// wiring point).
    #[must_use]
    pub fn run_with_ceiling<L: Semilattice>(
        cfg: &ControlFlowGraph,
        direction: Direction,
        init: L,
        safe: L,
        transfer: &impl TransferFunction<L>,
        ceiling_multiplier: usize,
    ) -> DataflowResult<L> {
        let blocks: Vec<NodeIndex> = cfg.blocks().collect();
        let source = match direction {
            Direction::Forward => cfg.entry(),
            Direction::Backward => cfg.exit(),
        };

        let mut in_states: HashMap<NodeIndex, L> = HashMap::new();
        let mut out_states: HashMap<NodeIndex, L> = HashMap::new();
        for &b in &blocks {
            let seed = if b == source { init.clone() } else { safe.clone() };
            match direction {
                Direction::Forward => {
                    in_states.insert(b, seed);
                    out_states.insert(b, safe.clone());
                }
                Direction::Backward => {
                    out_states.insert(b, seed);
                    in_states.insert(b, safe.clone());
                }
            }
        }

        let mut worklist: VecDeque<NodeIndex> = blocks.iter().copied().filter(|&b| b != source).collect();
        worklist.push_front(source);
        let mut queued: HashSet<NodeIndex> = worklist.iter().copied().collect();

        let ceiling = ceiling_multiplier.max(1) * blocks.len().max(1);
        let mut iterations = 0usize;
        let mut converged = true;

        while let Some(block) = worklist.pop_front() {
            queued.remove(&block);
            iterations += 1;
            if iterations > ceiling {
                converged = false;
                break;
            }

            match direction {
                Direction::Forward => {
                    let meet_in = cfg
                    .predecessors(block)
                    .iter()
                    .map(|p| &out_states[p])
                    .fold(None, |acc: Option<L>, s| Some(acc.map_or_else(|| s.clone(), |a| a.meet(s))));
                    let new_in = meet_in.unwrap_or_else(|| if block == source { init.clone() } else { safe.clone() });
                    let new_out = transfer.apply(block, &new_in);
                    let changed = new_in != in_states[&block] || new_out != out_states[&block];
                    in_states.insert(block, new_in);
                    if changed {
                        out_states.insert(block, new_out);
                        for succ in cfg.successors(block) {
                            if queued.insert(succ) {
                                worklist.push_back(succ);
                            }
                        }
                    }
                }
                Direction::Backward => {
                    let meet_out = cfg
                    .successors(block)
                    .iter()
                    .map(|s| &in_states[s])
                    .fold(None, |acc: Option<L>, s| Some(acc.map_or_else(|| s.clone(), |a| a.meet(s))));
                    let new_out =
                    meet_out.unwrap_or_else(|| if block == source { init.clone() } else { safe.clone() });
                    let new_in = transfer.apply(block, &new_out);
                    let changed = new_out != out_states[&block] || new_in != in_states[&block];
                    out_states.insert(block, new_out);
                    if changed {
                        in_states.insert(block, new_in);
                        for &pred in cfg.predecessors(block) {
                            if queued.insert(pred) {
                                worklist.push_back(pred);
                            }
                        }
                    }
                }
            }
        }

        if !converged {
            diagnostics::warn_non_convergence(ceiling);
        }

        DataflowResult { in_states, out_states, converged }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::CfgBuilder;
    use crate::lattice::ConstLattice;
    use crate::mir::{Literal, MirInst, Operand, Operator};

    struct Identity;
    impl TransferFunction<ConstLattice> for Identity {
        fn apply(&self, _block: NodeIndex, input: &ConstLattice) -> ConstLattice {
            input.clone()
        }
    }

    #[test]
    fn forward_analysis_propagates_init_from_entry() {
        let entry = MirInst::marker(Operator::Entry);
        let print = MirInst::print(Operand::literal(Literal::Int(1)));
        let exit = MirInst::marker(Operator::Exit);
        let cfg = CfgBuilder::build("f", &[entry, print, exit]).unwrap();
        let result = DataflowAnalysis::run(
            &cfg,
            Direction::Forward,
            ConstLattice::Constant(Literal::Int(1)),
            ConstLattice::top(),
            &Identity,
        );
        assert!(result.converged);
        assert_eq!(result.in_states[&cfg.entry()], ConstLattice::Constant(Literal::Int(1)));
    }
}
