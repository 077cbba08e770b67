// src/ssa/mod.rs
//! Minimal SSA construction: phi insertion and renaming.
pub mod edges;
pub mod rename;

pub use edges::{SsaEdge, SsaEdgeBuilder, SsaEdgeKind};
pub use rename::rename;

use crate::cfg::{ControlFlowGraph, DominanceInfo};
use crate::error::TacmirError;
use crate::mir::{MirInst, Operand, Variable, VariableScope};
use petgraph::graph::NodeIndex;
use std::collections::{HashMap, HashSet, VecDeque};

/// Inserts phi instructions at the top of every block in the iterated
/// dominance frontier of each variable's defining blocks, per the classical
/// Cytron et al. placement algorithm.
///
/// One worklist per variable: seeded with the variable's defining blocks,
/// each pop examines `DF(b)` and inserts a phi (with one placeholder slot
/// per predecessor) in any frontier block that does not already have one,
/// re-queuing that block since it is now itself a definition site.
pub fn insert_phis(cfg: &mut ControlFlowGraph, dom: &DominanceInfo) {
    let mut defs: HashMap<Variable, Vec<NodeIndex>> = HashMap::new();
    for block in cfg.blocks().collect::<Vec<_>>() {
        for inst in cfg.block(block).insts.ordinary() {
            if let Some(op) = inst.defined_operand() {
                if let Some(var) = op.as_var() {
                    defs.entry(var.clone()).or_default().push(block);
                }
            }
        }
    }

    let mut vars: Vec<(Variable, Vec<NodeIndex>)> = defs.into_iter().collect();
    vars.sort_by(|a, b| {
            a.0.name
            .cmp(&b.0.name)
            .then_with(|| scope_rank(a.0.scope).cmp(&scope_rank(b.0.scope)))
            .then_with(|| a.0.compiler_generated.cmp(&b.0.compiler_generated))
    });

    for (var, defining_blocks) in vars {
        let mut seen: HashSet<NodeIndex> = HashSet::new();
        let mut worklist: VecDeque<NodeIndex> = VecDeque::new();
        for b in defining_blocks {
            if seen.insert(b) {
                worklist.push_back(b);
            }
        }
        while let Some(b) = worklist.pop_front() {
            for &y in dom.frontier(b) {
                if !has_phi_for_var(cfg, y, &var) {
                    insert_phi_at(cfg, y, &var);
                }
                if seen.insert(y) {
                    worklist.push_back(y);
                }
            }
        }
    }

    cfg.rebuild_indices();
}

const fn scope_rank(scope: VariableScope) -> u8 {
    match scope {
        VariableScope::Global => 0,
        VariableScope::Local => 1,
    }
}

fn has_phi_for_var(cfg: &ControlFlowGraph, block: NodeIndex, var: &Variable) -> bool {
    cfg.block(block).insts.phis().iter().any(|phi| phi.result.as_var() == Some(var))
}

fn insert_phi_at(cfg: &mut ControlFlowGraph, block: NodeIndex, var: &Variable) {
    let num_preds = cfg.predecessors(block).len();
    let args = vec![Operand::var(var.clone()); num_preds];
    let phi = MirInst::phi(Operand::var(var.clone()), args);
    cfg.block_mut(block).insts.push_phi(phi);
}

/// Checks the post-renaming invariant that every phi has exactly one
/// argument slot per predecessor of its block,
///
/// # Errors
/// Returns [`TacmirError::SsaInconsistency`] on the first mismatch found.
pub fn verify_phi_arg_counts(cfg: &ControlFlowGraph) -> Result<(), TacmirError> {
    for block in cfg.blocks() {
        let expected = cfg.predecessors(block).len();
        for phi in cfg.block(block).insts.phis() {
            if phi.phi_args().len() != expected {
                return Err(TacmirError::SsaInconsistency {
                        message: format!(
                            "phi {} in block {} has {} argument slot(s), expected {expected} (one per predecessor)",
                            phi.unique_id,
                            cfg.block(block).id,
                            phi.phi_args().len(),
                        ),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::CfgBuilder;
    use crate::mir::{Literal, MirInst, Operand, Operator, Variable};

    fn diamond_cfg_with_merge_assign() -> ControlFlowGraph {
        let entry = MirInst::marker(Operator::Entry);
        let cond = MirInst::assign(Operand::var(Variable::local("c")), Operand::literal(Literal::Bool(true)));
        let left = MirInst::assign(Operand::var(Variable::local("x")), Operand::literal(Literal::Int(1)));
        let mut goto_join = MirInst::goto(0);
        let right = MirInst::assign(Operand::var(Variable::local("x")), Operand::literal(Literal::Int(2)));
        let join_print = MirInst::print(Operand::var(Variable::local("x")));
        let exit = MirInst::marker(Operator::Exit);
        goto_join.set_branch_target(join_print.unique_id);
        let if_inst = MirInst::if_branch(Operand::var(Variable::local("c")), left.unique_id);
        let insts = vec![entry, cond, if_inst, left, goto_join, right, join_print, exit];
        CfgBuilder::build("f", &insts).unwrap()
    }

    #[test]
    fn phi_inserted_at_merge_point_for_variable_assigned_on_both_paths() {
        let mut cfg = diamond_cfg_with_merge_assign();
        let dom = DominanceInfo::compute(&mut cfg);
        insert_phis(&mut cfg, &dom);
        let join = cfg.blocks().find(|&b| !cfg.block(b).insts.phis().is_empty());
        assert!(join.is_some());
        let join = join.unwrap();
        assert_eq!(cfg.block(join).insts.phis().len(), 1);
        assert_eq!(cfg.block(join).insts.phis()[0].phi_args().len(), cfg.predecessors(join).len());
    }

    #[test]
    fn no_phi_inserted_for_variable_assigned_only_in_entry() {
        let entry = MirInst::marker(Operator::Entry);
        let assign = MirInst::assign(Operand::var(Variable::local("x")), Operand::literal(Literal::Int(1)));
        let print = MirInst::print(Operand::var(Variable::local("x")));
        let exit = MirInst::marker(Operator::Exit);
        let mut cfg = CfgBuilder::build("f", &[entry, assign, print, exit]).unwrap();
        let dom = DominanceInfo::compute(&mut cfg);
        insert_phis(&mut cfg, &dom);
        assert!(cfg.blocks().all(|b| cfg.block(b).insts.phis().is_empty()));
    }
}
