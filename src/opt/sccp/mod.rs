// src/opt/sccp/mod.rs
//! Sparse Conditional Constant Propagation: the flow- and SSA-sensitive
//! fixed-point analysis in `propagator`, followed by the rewrite `fold.rs`'s
//! `eval_binary` feeds.
pub mod fold;
pub mod propagator;

pub use propagator::{run, run_with_ceiling, SccpResult};

use crate::cfg::ControlFlowGraph;
use crate::error::TacmirError;
use crate::lattice::ConstLattice;
use crate::mir::{InstId, Operand, OperandValue};

/// Counts the folding rewrite performed, threaded into the driver's
/// `PipelineStats`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FoldStats {
    pub constants_propagated: usize,
    pub expressions_folded: usize,
    pub branches_resolved: usize,
    pub phis_simplified: usize,
}

/// Rewrites `cfg` per `result`: propagates discovered constants into every
/// SSA use, folds fully-literal expressions via `eval_binary`, and collapses
/// constant-condition `If` instructions to unconditional `Goto`.
///
/// # Errors
/// Propagates a fatal [`TacmirError::Evaluation`] from `eval_binary` (e.g. a
/// division by a folded zero).
pub fn apply_folding(cfg: &mut ControlFlowGraph, result: &SccpResult) -> Result<FoldStats, TacmirError> {
    let mut stats = FoldStats::default();
    let ids = all_inst_ids(cfg);

    for &id in &ids {
        if let Some(inst) = cfg.inst_mut(id) {
            rewrite_operand(&mut inst.operand1, result, &mut stats);
            rewrite_operand(&mut inst.operand2, result, &mut stats);
            if inst.is_phi() {
                for arg in inst.phi_args_mut() {
                    rewrite_operand(arg, result, &mut stats);
                }
            }
        }
    }

    for &id in &ids {
        let Some(inst) = cfg.inst(id) else { continue };
        if !inst.op.is_expression() {
            continue;
        }
        let (Some(a), Some(b)) = (inst.operand1.as_literal().cloned(), inst.operand2.as_literal().cloned()) else {
            continue;
        };
        let value = fold::eval_binary(inst.op, &a, &b)?;
        if let Some(inst) = cfg.inst_mut(id) {
            inst.op = crate::mir::Operator::Assign;
            inst.operand1 = Operand::literal(value);
            inst.operand2 = Operand::void();
        }
        stats.expressions_folded += 1;
    }

    for &id in &ids {
        let Some(inst) = cfg.inst(id) else { continue };
        if inst.op != crate::mir::Operator::If {
            continue;
        }
        let Some(lit) = inst.operand1.as_literal().cloned() else { continue };
        let target = if lit.is_true() {
            inst.operand2.as_ptr()
        } else {
            cfg.block_of_inst(id)
                .and_then(|b| cfg.block(b).false_target())
                .and_then(|fb| cfg.block(fb).insts.iter().next().map(|i| i.unique_id))
        };
        let Some(target) = target else { continue };
        if let Some(inst) = cfg.inst_mut(id) {
            inst.op = crate::mir::Operator::Goto;
            inst.operand1 = Operand::ptr(target);
            inst.operand2 = Operand::void();
        }
        stats.branches_resolved += 1;
    }

    // A phi whose destination the analysis pinned to a single constant
    // needs no merge at all; replace it with a plain assignment.
    for &id in &ids {
        let Some(inst) = cfg.inst(id) else { continue };
        if !inst.is_phi() {
            continue;
        }
        let Some(ssa) = inst.result.as_ssa() else { continue };
        let Some(ConstLattice::Constant(lit)) = result.lat_cell.get(ssa).cloned() else { continue };
        if let Some(inst) = cfg.inst_mut(id) {
            inst.op = crate::mir::Operator::Assign;
            inst.operand1 = Operand::literal(lit);
            inst.operand2 = Operand::void();
        }
        stats.phis_simplified += 1;
    }
    cfg.rebuild_indices();

    Ok(stats)
}

fn rewrite_operand(op: &mut Operand, result: &SccpResult, stats: &mut FoldStats) {
    if let OperandValue::SsaVar(v) = &op.value
        && let Some(ConstLattice::Constant(lit)) = result.lat_cell.get(v)
    {
        *op = Operand::literal(lit.clone());
        stats.constants_propagated += 1;
    }
}

fn all_inst_ids(cfg: &ControlFlowGraph) -> Vec<InstId> {
    let mut ids = Vec::with_capacity(cfg.inst_count());
    for block in cfg.blocks() {
        for inst in cfg.block(block).insts.iter() {
            ids.push(inst.unique_id);
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::{CfgBuilder, DominanceInfo};
    use crate::loops::LoopForest;
    use crate::mir::{Literal, MirInst, Operator, Variable};
    use crate::ssa::{insert_phis, rename, SsaEdgeBuilder};

    #[test]
    fn folds_a_constant_expression_into_an_assign() {
        let entry = MirInst::marker(Operator::Entry);
        let a = MirInst::assign(Operand::var(Variable::local("a")), Operand::literal(Literal::Int(2)));
        let sum = MirInst::binary(
            Operator::Add,
            Operand::var(Variable::local("s")),
            Operand::var(Variable::local("a")),
            Operand::literal(Literal::Int(3)),
        );
        let print = MirInst::print(Operand::var(Variable::local("s")));
        let exit = MirInst::marker(Operator::Exit);
        let mut cfg = CfgBuilder::build("f", &[entry, a, sum, print, exit]).unwrap();
        let dom = DominanceInfo::compute(&mut cfg);
        insert_phis(&mut cfg, &dom);
        rename(&mut cfg).unwrap();
        let loops = LoopForest::analyze(&cfg);
        let ssa = SsaEdgeBuilder::build(&cfg, &loops);
        let result = run(&cfg, &ssa);
        let stats = apply_folding(&mut cfg, &result).unwrap();
        assert_eq!(stats.expressions_folded, 1);
        let folded = cfg.linearize().into_iter().find(|i| i.result.as_ssa().map(|v| v.name()) == Some("s")).unwrap();
        assert_eq!(folded.op, Operator::Assign);
        assert_eq!(folded.operand1.as_literal(), Some(&Literal::Int(5)));
    }

    #[test]
    fn division_by_a_folded_zero_is_a_fatal_error() {
        let entry = MirInst::marker(Operator::Entry);
        let zero = MirInst::assign(Operand::var(Variable::local("z")), Operand::literal(Literal::Int(0)));
        let div = MirInst::binary(
            Operator::Div,
            Operand::var(Variable::local("r")),
            Operand::literal(Literal::Int(10)),
            Operand::var(Variable::local("z")),
        );
        let exit = MirInst::marker(Operator::Exit);
        let mut cfg = CfgBuilder::build("f", &[entry, zero, div, exit]).unwrap();
        let dom = DominanceInfo::compute(&mut cfg);
        insert_phis(&mut cfg, &dom);
        rename(&mut cfg).unwrap();
        let loops = LoopForest::analyze(&cfg);
        let ssa = SsaEdgeBuilder::build(&cfg, &loops);
        let result = run(&cfg, &ssa);
        assert!(apply_folding(&mut cfg, &result).is_err());
    }
}
