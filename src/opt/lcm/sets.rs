// src/opt/lcm/sets.rs
//! Per-block expression sets (`eUse_B`/`eKill_B`) and the per-function
//! expression universe every Lazy Code Motion lattice subsets.
use crate::cfg::ControlFlowGraph;
use crate::lattice::ExprSet;
use crate::mir::Expression;
use petgraph::graph::NodeIndex;
use std::collections::{HashMap, HashSet};

/// Every expression computed anywhere in the function — the universal set
/// each LCM lattice's degenerate `top` stands in for (see `ExprSet`'s doc).
#[must_use]
pub fn universe(cfg: &ControlFlowGraph) -> ExprSet {
    let mut all = HashSet::new();
    for block in cfg.blocks() {
        for inst in cfg.block(block).insts.ordinary() {
            if let Some(e) = Expression::from_inst(inst) {
                all.insert(e);
            }
        }
    }
    ExprSet::universe(all)
}

/// `eUse_B`: expressions computed in `B` before any redefinition, within
/// `B`, of one of their own operands — locally anticipated at block entry.
#[must_use]
pub fn e_use_sets(cfg: &ControlFlowGraph) -> HashMap<NodeIndex, ExprSet> {
    let mut out = HashMap::new();
    for block in cfg.blocks() {
        let mut redefined = HashSet::new();
        let mut set = HashSet::new();
        for inst in cfg.block(block).insts.ordinary() {
            if let Some(e) = Expression::from_inst(inst) {
                if e.operand_ssa_variables().all(|v| !redefined.contains(v)) {
                    set.insert(e);
                }
            }
            if let Some(ssa) = inst.defined_ssa() {
                redefined.insert(ssa.clone());
            }
        }
        out.insert(block, ExprSet::universe(set));
    }
    out
}

/// `eKill_B`: every universe expression with an operand `B` redefines,
/// anywhere in the block. Under the minimal-SSA invariant every name has
/// exactly one static definition, so this is structurally `∅` on
/// well-formed input — computed the general way regardless, since nothing
/// downstream special-cases that degeneracy.
#[must_use]
pub fn e_kill_sets(cfg: &ControlFlowGraph, universe: &ExprSet) -> HashMap<NodeIndex, ExprSet> {
    let mut out = HashMap::new();
    for block in cfg.blocks() {
        let defined: HashSet<_> = cfg.block(block).insts.iter().filter_map(|i| i.defined_ssa().cloned()).collect();
        let killed: HashSet<_> =
            universe.0.iter().filter(|e| e.operand_ssa_variables().any(|v| defined.contains(v))).cloned().collect();
        out.insert(block, ExprSet::universe(killed));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::{CfgBuilder, DominanceInfo};
    use crate::mir::{Literal, MirInst, Operand, Operator, Variable};
    use crate::ssa::{insert_phis, rename};

    #[test]
    fn e_use_sees_the_expression_computed_in_its_block() {
        let entry = MirInst::marker(Operator::Entry);
        let a = MirInst::assign(Operand::var(Variable::local("a")), Operand::literal(Literal::Int(1)));
        let sum = MirInst::binary(
            Operator::Add,
            Operand::var(Variable::local("s")),
            Operand::var(Variable::local("a")),
            Operand::literal(Literal::Int(2)),
        );
        let exit = MirInst::marker(Operator::Exit);
        let mut cfg = CfgBuilder::build("f", &[entry, a, sum, exit]).unwrap();
        let dom = DominanceInfo::compute(&mut cfg);
        insert_phis(&mut cfg, &dom);
        rename(&mut cfg).unwrap();
        let uses = e_use_sets(&cfg);
        let total: usize = uses.values().map(|s| s.0.len()).sum();
        assert_eq!(total, 1);
    }
}
