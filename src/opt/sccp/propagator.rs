// src/opt/sccp/propagator.rs
//! The SCCP fixed-point propagator: flow- and SSA-worklist-driven constant
//! discovery over a renamed, SSA-edge-built CFG.
use crate::cfg::basic_block::EdgeFlow;
use crate::cfg::ControlFlowGraph;
use crate::lattice::{ConstLattice, Semilattice};
use crate::mir::{InstId, Literal, Operand, OperandValue, Operator, SsaVariable};
use crate::ssa::SsaEdgeBuilder;
use std::collections::{HashMap, VecDeque};

/// The propagator's fixed-point result: every SSA name's discovered
/// constant-lattice cell, plus which instruction-level control-flow edges
/// were proven executable.
#[derive(Debug, Clone, Default)]
pub struct SccpResult {
    pub lat_cell: HashMap<SsaVariable, ConstLattice>,
    pub exec_flag: HashMap<(InstId, InstId), bool>,
}

/// Instruction-level control-flow edges: a within-block chain plus each
/// block's terminator wired to its successors' first instructions, flow-
/// labelled the same way `ControlFlowGraph::edge_flow` labels block edges.
struct FlattenedProgram {
    outgoing: HashMap<InstId, Vec<(InstId, EdgeFlow)>>,
    incoming: HashMap<InstId, Vec<InstId>>,
}

impl FlattenedProgram {
    fn build(cfg: &ControlFlowGraph) -> Self {
        let mut outgoing: HashMap<InstId, Vec<(InstId, EdgeFlow)>> = HashMap::new();
        let mut incoming: HashMap<InstId, Vec<InstId>> = HashMap::new();
        for block in cfg.blocks() {
            let insts: Vec<InstId> = cfg.block(block).insts.iter().map(|i| i.unique_id).collect();
            for w in insts.windows(2) {
                outgoing.entry(w[0]).or_default().push((w[1], EdgeFlow::UnCond));
                incoming.entry(w[1]).or_default().push(w[0]);
            }
            let Some(&last) = insts.last() else { continue };
            for succ in cfg.successors(block) {
                let flow = cfg.edge_flow(block, succ);
                if let Some(first) = cfg.block(succ).insts.iter().next().map(|i| i.unique_id) {
                    outgoing.entry(last).or_default().push((first, flow));
                    incoming.entry(first).or_default().push(last);
                }
            }
        }
        Self { outgoing, incoming }
    }

    fn outgoing(&self, id: InstId) -> &[(InstId, EdgeFlow)] {
        self.outgoing.get(&id).map_or(&[], Vec::as_slice)
    }

    fn incoming(&self, id: InstId) -> &[InstId] {
        self.incoming.get(&id).map_or(&[], Vec::as_slice)
    }

    fn first_instruction(cfg: &ControlFlowGraph) -> Option<InstId> {
        cfg.block(cfg.entry()).insts.iter().next().map(|i| i.unique_id)
    }
}

/// Default per-instruction multiplier for SCCP's iteration ceiling, used by
/// [`run`]. Callers that want the ceiling tied to
/// [`crate::opt::PipelineConfig::max_iterations`] should use
/// [`run_with_ceiling`] instead.
pub const DEFAULT_CEILING_MULTIPLIER: usize = 50;

/// Runs SCCP to a fixed point over `cfg`, whose SSA edges are `ssa`, with the
/// default iteration ceiling of `50 * |instructions|`.
#[must_use]
pub fn run(cfg: &ControlFlowGraph, ssa: &SsaEdgeBuilder) -> SccpResult {
    run_with_ceiling(cfg, ssa, DEFAULT_CEILING_MULTIPLIER)
}

/// Same as [`run`], but with the per-instruction iteration-ceiling multiplier
/// supplied explicitly (`PipelineConfig::max_iterations`'s wiring point).
#[must_use]
pub fn run_with_ceiling(cfg: &ControlFlowGraph, ssa: &SsaEdgeBuilder, ceiling_multiplier: usize) -> SccpResult {
    let flat = FlattenedProgram::build(cfg);
    let mut lat_cell: HashMap<SsaVariable, ConstLattice> = HashMap::new();
    let mut exec_flag: HashMap<(InstId, InstId), bool> = HashMap::new();
    let mut flow_wl: VecDeque<(InstId, InstId)> = VecDeque::new();
    let mut ssa_wl: VecDeque<(InstId, InstId)> = VecDeque::new();

    for block in cfg.blocks() {
        for inst in cfg.block(block).insts.iter() {
            if let Some(ssa_var) = inst.defined_ssa() {
                lat_cell.entry(ssa_var.clone()).or_insert(ConstLattice::Top);
            }
        }
    }

    if let Some(first) = FlattenedProgram::first_instruction(cfg) {
        for &(to, _) in flat.outgoing(first) {
            flow_wl.push_back((first, to));
        }
    }

    let ceiling = ceiling_multiplier.max(1) * cfg.inst_count().max(1);
    let mut visits = 0usize;
    let mut converged = true;

    while !flow_wl.is_empty() || !ssa_wl.is_empty() {
        while let Some(edge) = flow_wl.pop_front() {
            visits += 1;
            if visits > ceiling {
                converged = false;
                break;
            }
            if exec_flag.get(&edge).copied().unwrap_or(false) {
                continue;
            }
            exec_flag.insert(edge, true);
            let (_, to) = edge;
            let Some(inst) = cfg.inst(to) else { continue };
            if inst.is_phi() {
                visit_phi(cfg, &exec_flag, &mut lat_cell, &flat, &mut flow_wl, &mut ssa_wl, &ssa.succ, to);
            } else if executable_incoming_count(&flat, &exec_flag, to) == 1 {
                visit_inst(cfg, &mut lat_cell, &flat, &mut flow_wl, &mut ssa_wl, &ssa.succ, to);
            }
        }
        if !converged {
            break;
        }
        while let Some((_, to)) = ssa_wl.pop_front() {
            visits += 1;
            if visits > ceiling {
                converged = false;
                break;
            }
            let Some(inst) = cfg.inst(to) else { continue };
            if inst.is_phi() {
                visit_phi(cfg, &exec_flag, &mut lat_cell, &flat, &mut flow_wl, &mut ssa_wl, &ssa.succ, to);
            } else if executable_incoming_count(&flat, &exec_flag, to) >= 1 {
                visit_inst(cfg, &mut lat_cell, &flat, &mut flow_wl, &mut ssa_wl, &ssa.succ, to);
            }
        }
        if !converged {
            break;
        }
    }

    if !converged {
        crate::diagnostics::warn_non_convergence(ceiling);
    }

    SccpResult { lat_cell, exec_flag }
}

fn executable_incoming_count(
    flat: &FlattenedProgram,
    exec_flag: &HashMap<(InstId, InstId), bool>,
    to: InstId,
) -> usize {
    flat.incoming(to).iter().filter(|&&from| exec_flag.get(&(from, to)).copied().unwrap_or(false)).count()
}

fn predecessor_executable(
    cfg: &ControlFlowGraph,
    exec_flag: &HashMap<(InstId, InstId), bool>,
    pred_block: petgraph::graph::NodeIndex,
    block: petgraph::graph::NodeIndex,
) -> bool {
    let Some(last) = cfg.block(pred_block).insts.iter().next_back().map(|i| i.unique_id) else { return false };
    let Some(first) = cfg.block(block).insts.iter().next().map(|i| i.unique_id) else { return false };
    exec_flag.get(&(last, first)).copied().unwrap_or(false)
}

fn operand_lattice(op: &Operand, lat_cell: &HashMap<SsaVariable, ConstLattice>) -> ConstLattice {
    match &op.value {
        OperandValue::Literal(lit) => ConstLattice::Constant(lit.clone()),
        OperandValue::SsaVar(v) => lat_cell.get(v).cloned().unwrap_or(ConstLattice::Top),
        _ => ConstLattice::Bottom,
    }
}

/// Evaluates the lattice value an instruction's result should take, given
/// the current state of its operand cells.
fn lat_eval(lat_cell: &HashMap<SsaVariable, ConstLattice>, op: Operator, operand1: &Operand, operand2: &Operand) -> ConstLattice {
    if !op.is_evaluatable() {
        return ConstLattice::Top;
    }
    if op == Operator::Assign {
        return operand_lattice(operand1, lat_cell);
    }
    let lhs = operand_lattice(operand1, lat_cell);
    let rhs = operand_lattice(operand2, lat_cell);
    match (&lhs, &rhs) {
        (ConstLattice::Constant(a), ConstLattice::Constant(b)) => {
            super::fold::eval_binary(op, a, b).map_or(ConstLattice::Bottom, ConstLattice::Constant)
        }
        _ => lhs.meet(&rhs),
    }
}

fn visit_phi(
    cfg: &ControlFlowGraph,
    exec_flag: &HashMap<(InstId, InstId), bool>,
    lat_cell: &mut HashMap<SsaVariable, ConstLattice>,
    flat: &FlattenedProgram,
    flow_wl: &mut VecDeque<(InstId, InstId)>,
    ssa_wl: &mut VecDeque<(InstId, InstId)>,
    succ: &HashMap<InstId, Vec<InstId>>,
    phi_id: InstId,
) {
    let Some(block) = cfg.block_of_inst(phi_id) else { return };
    let Some(phi) = cfg.inst(phi_id) else { return };
    let preds = cfg.predecessors(block);
    let mut acc: Option<ConstLattice> = None;
    for (i, arg) in phi.phi_args().iter().enumerate() {
        let Some(&pred_block) = preds.get(i) else { continue };
        if !predecessor_executable(cfg, exec_flag, pred_block, block) {
            continue;
        }
        let val = operand_lattice(arg, lat_cell);
        acc = Some(match acc {
            None => val,
            Some(a) => a.meet(&val),
        });
    }
    let new_val = acc.unwrap_or(ConstLattice::Top);
    if let Some(dest) = phi.defined_ssa().cloned() {
        if lat_cell.get(&dest) != Some(&new_val) {
            lat_cell.insert(dest, new_val);
            for &use_id in succ.get(&phi_id).into_iter().flatten() {
                ssa_wl.push_back((phi_id, use_id));
            }
        }
    }
    enqueue_flow_successors(cfg, lat_cell, flat, flow_wl, phi_id);
}

fn visit_inst(
    cfg: &ControlFlowGraph,
    lat_cell: &mut HashMap<SsaVariable, ConstLattice>,
    flat: &FlattenedProgram,
    flow_wl: &mut VecDeque<(InstId, InstId)>,
    ssa_wl: &mut VecDeque<(InstId, InstId)>,
    succ: &HashMap<InstId, Vec<InstId>>,
    id: InstId,
) {
    let Some(inst) = cfg.inst(id) else { return };
    if let Some(dest) = inst.defined_ssa().cloned() {
        let new_val = lat_eval(lat_cell, inst.op, &inst.operand1, &inst.operand2);
        if lat_cell.get(&dest) != Some(&new_val) {
            lat_cell.insert(dest, new_val);
            for &use_id in succ.get(&id).into_iter().flatten() {
                ssa_wl.push_back((id, use_id));
            }
        }
    }
    enqueue_flow_successors(cfg, lat_cell, flat, flow_wl, id);
}

/// Enqueues `from`'s outgoing instruction-level flow edges. A conditional
/// branch enqueues only the edge(s) its condition cell allows; every other
/// instruction (including the internal phi/ordinary chain within a block)
/// enqueues all of its outgoing edges unconditionally.
fn enqueue_flow_successors(
    cfg: &ControlFlowGraph,
    lat_cell: &HashMap<SsaVariable, ConstLattice>,
    flat: &FlattenedProgram,
    flow_wl: &mut VecDeque<(InstId, InstId)>,
    from: InstId,
) {
    let Some(inst) = cfg.inst(from) else { return };
    let outgoing = flat.outgoing(from);
    if inst.op == Operator::If {
        match operand_lattice(&inst.operand1, lat_cell) {
            ConstLattice::Top => {}
            ConstLattice::Bottom => {
                for &(to, _) in outgoing {
                    flow_wl.push_back((from, to));
                }
            }
            ConstLattice::Constant(lit) => {
                let want = if lit.is_true() { EdgeFlow::True } else { EdgeFlow::False };
                for &(to, flow) in outgoing {
                    if flow == want {
                        flow_wl.push_back((from, to));
                    }
                }
            }
        }
    } else {
        for &(to, _) in outgoing {
            flow_wl.push_back((from, to));
        }
    }
}
