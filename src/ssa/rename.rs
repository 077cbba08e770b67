// src/ssa/rename.rs
//! Dominator-tree-walk SSA renaming: assigns a fresh version to every
//! definition and rewrites uses to the version reaching them.
use crate::cfg::ControlFlowGraph;
use crate::error::TacmirError;
use crate::mir::{Operand, SsaVariable, Variable};
use petgraph::graph::NodeIndex;
use std::collections::HashMap;

/// Renames every `Var` operand in `cfg` to a versioned `SsaVar`, walking the
/// dominator tree depth-first from the entry block.
///
/// Each original variable gets its own version stack and monotonic counter.
/// Entering a block pushes one new version per definition in that block
/// (phi results first, then ordinary instructions in program order);
/// leaving it pops exactly what was pushed, in reverse order, so a sibling
/// subtree never observes a version defined in a block it doesn't dominate.
///
/// # Errors
/// Returns [`TacmirError::SsaInconsistency`] if the post-renaming phi
/// argument-count invariant does not hold.
pub fn rename(cfg: &mut ControlFlowGraph) -> Result<(), TacmirError> {
    let mut stacks: HashMap<Variable, Vec<i64>> = HashMap::new();
    let mut counters: HashMap<Variable, i64> = HashMap::new();
    rename_block(cfg, cfg.entry(), &mut stacks, &mut counters);
    super::verify_phi_arg_counts(cfg)
}

fn next_version(counters: &mut HashMap<Variable, i64>, var: &Variable) -> i64 {
    let counter = counters.entry(var.clone()).or_insert(0);
    let version = *counter;
    *counter += 1;
    version
}

/// Reads the underlying source variable out of a (possibly already renamed)
/// phi result or argument slot.
fn base_variable(op: &Operand) -> Option<Variable> {
    op.as_var().cloned().or_else(|| op.as_ssa().map(|ssa| ssa.base.clone()))
}

fn rename_block(
    cfg: &mut ControlFlowGraph,
    block: NodeIndex,
    stacks: &mut HashMap<Variable, Vec<i64>>,
    counters: &mut HashMap<Variable, i64>,
) {
    let mut pushed: Vec<Variable> = Vec::new();

    let phi_count = cfg.block(block).insts.phi_insts_idx_end();
    for i in 0..phi_count {
        let var = base_variable(&cfg.block(block).insts.phis()[i].result)
        .expect("phi result must carry a base variable");
        let version = next_version(counters, &var);
        stacks.entry(var.clone()).or_default().push(version);
        pushed.push(var.clone());
        cfg.block_mut(block).insts.phis_mut()[i].result = Operand::ssa_var(SsaVariable::new(var, version));
    }

    let ordinary_count = cfg.block(block).insts.ordinary().len();
    for i in 0..ordinary_count {
        {
            let inst = &mut cfg.block_mut(block).insts.ordinary_mut()[i];
            inst.visit_used_operands_mut(|op| {
                    if let Some(v) = op.as_var().cloned() {
                        let renamed = match stacks.get(&v).and_then(|s| s.last()) {
                            Some(&version) => SsaVariable::new(v, version),
                            None => SsaVariable::placeholder(v),
                        };
                        *op = Operand::ssa_var(renamed);
                    }
            });
        }
        let defined = cfg.block(block).insts.ordinary()[i].defined_operand().and_then(|op| op.as_var().cloned());
        if let Some(var) = defined {
            let version = next_version(counters, &var);
            stacks.entry(var.clone()).or_default().push(version);
            pushed.push(var.clone());
            cfg.block_mut(block).insts.ordinary_mut()[i].result = Operand::ssa_var(SsaVariable::new(var, version));
        }
    }

    for succ in cfg.successors(block) {
        let preds = cfg.predecessors(succ).to_vec();
        let Some(slot) = preds.iter().position(|&p| p == block) else { continue };
        let phi_count_succ = cfg.block(succ).insts.phi_insts_idx_end();
        for i in 0..phi_count_succ {
            let var = base_variable(&cfg.block(succ).insts.phis()[i].result)
            .expect("phi result must carry a base variable");
            let arg = match stacks.get(&var).and_then(|s| s.last()) {
                Some(&version) => SsaVariable::new(var, version),
                None => SsaVariable::placeholder(var),
            };
            cfg.block_mut(succ).insts.phis_mut()[i].phi_args_mut()[slot] = Operand::ssa_var(arg);
        }
    }

    let children = cfg.block(block).dominator_tree_children.clone();
    for child in children {
        rename_block(cfg, child, stacks, counters);
    }

    for var in pushed.into_iter().rev() {
        if let Some(stack) = stacks.get_mut(&var) {
            stack.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::{CfgBuilder, DominanceInfo};
    use crate::mir::{Literal, MirInst, Operand, Operator, Variable};
    use crate::ssa::insert_phis;

    #[test]
    fn straight_line_definitions_get_increasing_versions() {
        let entry = MirInst::marker(Operator::Entry);
        let first = MirInst::assign(Operand::var(Variable::local("x")), Operand::literal(Literal::Int(1)));
        let second = MirInst::assign(Operand::var(Variable::local("x")), Operand::literal(Literal::Int(2)));
        let print = MirInst::print(Operand::var(Variable::local("x")));
        let exit = MirInst::marker(Operator::Exit);
        let mut cfg = CfgBuilder::build("f", &[entry, first, second, print, exit]).unwrap();
        let dom = DominanceInfo::compute(&mut cfg);
        insert_phis(&mut cfg, &dom);
        rename(&mut cfg).unwrap();

        let linear = cfg.linearize();
        let versions: Vec<i64> = linear
        .iter()
        .filter_map(|i| i.defined_operand().and_then(|o| o.as_ssa()).map(|s| s.version))
        .collect();
        assert_eq!(versions, vec![0, 1]);
        let used = linear.iter().find(|i| i.op == Operator::Print).unwrap();
        assert_eq!(used.operand1.as_ssa().unwrap().version, 1);
    }

    #[test]
    fn merge_point_phi_args_reflect_each_predecessor_last_version() {
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
        let mut cfg = CfgBuilder::build("f", &insts).unwrap();
        let dom = DominanceInfo::compute(&mut cfg);
        insert_phis(&mut cfg, &dom);
        rename(&mut cfg).unwrap();

        let join = cfg.blocks().find(|&b| !cfg.block(b).insts.phis().is_empty()).unwrap();
        let phi = &cfg.block(join).insts.phis()[0];
        assert_eq!(phi.phi_args().len(), 2);
        for arg in phi.phi_args() {
            assert!(arg.as_ssa().is_some());
        }
    }
}
