// src/cfg/builder.rs
//! CFG construction from a flat, ordered instruction list, per the design
//! §4.1.
use super::basic_block::{BasicBlock, BranchType, EdgeFlow};
use super::ControlFlowGraph;
use crate::error::TacmirError;
use crate::mir::{InstId, MirInst, MirInsts, Operator};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Builds control-flow graphs from a function's flat instruction stream.
pub struct CfgBuilder;

impl CfgBuilder {
    /// Builds a [`ControlFlowGraph`] for one function's ordered instruction
    /// list, steps 1-5.
    ///
    /// # Errors
    /// Returns [`TacmirError::CfgConstruction`] if a branch target cannot be
    /// resolved or the function body is empty.
    pub fn build(function_name: &str, insts: &[MirInst]) -> Result<ControlFlowGraph, TacmirError> {
        if insts.is_empty() {
            return Err(TacmirError::CfgConstruction {
                    function: function_name.to_string(),
                    message: "function body has no instructions".to_string(),
            });
        }

        let id_to_idx: HashMap<InstId, usize> =
        insts.iter().enumerate().map(|(i, inst)| (inst.unique_id, i)).collect();

        let leaders = Self::find_leaders(insts);
        let leader_vec: Vec<usize> = leaders.into_iter().collect();

        // Materialize blocks: [leader_i, leader_{i+1}), last block runs to end.
        let mut graph: DiGraph<BasicBlock, EdgeFlow> = DiGraph::new();
        let mut ranges = Vec::with_capacity(leader_vec.len());
        for (i, &start) in leader_vec.iter().enumerate() {
            let end = leader_vec.get(i + 1).copied().unwrap_or(insts.len());
            ranges.push((start, end));
        }

        let mut block_of_idx = vec![NodeIndex::end(); insts.len()];
        let mut node_indices = Vec::with_capacity(ranges.len());
        for (block_id, &(start, end)) in ranges.iter().enumerate() {
            let block_insts = MirInsts::from_ordinary(insts[start..end].to_vec());
            let node = graph.add_node(BasicBlock::new(block_id, block_insts));
            node_indices.push(node);
            for idx in start..end {
                block_of_idx[idx] = node;
            }
        }

        let resolve_target = |target_id: InstId| -> Result<NodeIndex, TacmirError> {
            id_to_idx
            .get(&target_id)
            .map(|&idx| block_of_idx[idx])
            .ok_or_else(|| TacmirError::CfgConstruction {
                    function: function_name.to_string(),
                    message: format!("branch target instruction {target_id} not found"),
            })
        };

        // Edge wiring per terminator kind.
        for (block_id, &(start, end)) in ranges.iter().enumerate() {
            let node = node_indices[block_id];
            let next_node = node_indices.get(block_id + 1).copied();
            let terminator = &insts[end - 1];
            match terminator.op {
                Operator::Goto => {
                    let target = terminator
                    .branch_target()
                    .ok_or_else(|| TacmirError::CfgConstruction {
                            function: function_name.to_string(),
                            message: "goto with no target".to_string(),
                    })?;
                    let to = resolve_target(target)?;
                    graph.add_edge(node, to, EdgeFlow::UnCond);
                    graph[node].branch_type = BranchType::Jump;
                    graph[node].ordered_succ_bbs = vec![to];
                }
                Operator::If => {
                    let true_target =
                    terminator.branch_target().ok_or_else(|| TacmirError::CfgConstruction {
                            function: function_name.to_string(),
                            message: "if with no true target".to_string(),
                    })?;
                    let true_node = resolve_target(true_target)?;
                    let false_node = next_node.ok_or_else(|| TacmirError::CfgConstruction {
                            function: function_name.to_string(),
                            message: "if has no fall-through block".to_string(),
                    })?;
                    graph.add_edge(node, true_node, EdgeFlow::True);
                    graph.add_edge(node, false_node, EdgeFlow::False);
                    graph[node].branch_type = BranchType::Cond;
                    graph[node].ordered_succ_bbs = vec![true_node, false_node];
                }
                _ => {
                    if let Some(to) = next_node {
                        graph.add_edge(node, to, EdgeFlow::UnCond);
                        graph[node].branch_type = BranchType::Jump;
                        graph[node].ordered_succ_bbs = vec![to];
                    }
                    // last block (exit): no outgoing edges.
                }
            }
            let _ = start;
        }

        let entry = *node_indices.first().ok_or_else(|| TacmirError::CfgConstruction {
                function: function_name.to_string(),
                message: "no entry block".to_string(),
        })?;
        let exit = *node_indices.last().expect("ranges is non-empty");

        Self::assign_ranks(&mut graph, entry);

        Ok(ControlFlowGraph::new(graph, entry, exit))
    }

    /// Leader discovery step 1.
    fn find_leaders(insts: &[MirInst]) -> BTreeSet<usize> {
        let mut leaders = BTreeSet::new();
        leaders.insert(0);

        let id_to_idx: HashMap<InstId, usize> =
        insts.iter().enumerate().map(|(i, inst)| (inst.unique_id, i)).collect();

        for (i, inst) in insts.iter().enumerate() {
            if inst.is_branch() || inst.is_jump() {
                if i + 1 < insts.len() {
                    leaders.insert(i + 1);
                }
                if let Some(target_id) = inst.branch_target()
                && let Some(&target_idx) = id_to_idx.get(&target_id)
                {
                    leaders.insert(target_idx);
                }
            }
        }

        let mut pos = usize::from(insts.first().map(|i| i.op) == Some(Operator::Entry));
        while pos < insts.len() && insts[pos].op == Operator::Init {
            pos += 1;
        }
        if pos < insts.len() {
            leaders.insert(pos);
        }

        leaders
    }

    /// BFS ranking from entry, step 4: at a `Cond` block,
    /// the FALSE target is enqueued before the TRUE target so ties at equal
    /// rank resolve deterministically in program order.
    fn assign_ranks(graph: &mut DiGraph<BasicBlock, EdgeFlow>, entry: NodeIndex) {
        let n = graph.node_count();
        let mut rank = vec![usize::MAX; n];
        let mut preorder = vec![0usize; n];
        let mut discovery = 0usize;
        let mut queue = VecDeque::new();

        rank[entry.index()] = 0;
        preorder[entry.index()] = discovery;
        discovery += 1;
        queue.push_back(entry);

        while let Some(node) = queue.pop_front() {
            let r = rank[node.index()];
            let block = &graph[node];
            let succs: Vec<NodeIndex> = match block.branch_type {
                BranchType::Cond => {
                    let mut v = Vec::with_capacity(2);
                    if let Some(f) = block.false_target() {
                        v.push(f);
                    }
                    if let Some(t) = block.true_target() {
                        v.push(t);
                    }
                    v
                }
                _ => block.ordered_succ_bbs.clone(),
            };
            for s in succs {
                if rank[s.index()] == usize::MAX {
                    rank[s.index()] = r + 1;
                    preorder[s.index()] = discovery;
                    discovery += 1;
                    queue.push_back(s);
                }
            }
        }

        for node in graph.node_indices() {
            let idx = node.index();
            graph[node].rank = if rank[idx] == usize::MAX { 0 } else { rank[idx] };
            graph[node].preorder = preorder[idx];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mir::{Literal, MirInst, Operand, Operator, Variable};

    fn diamond() -> Vec<MirInst> {
        let entry = MirInst::marker(Operator::Entry);
        let cond_assign = MirInst::assign(Operand::var(Variable::local("c")), Operand::literal(Literal::Bool(true)));
        let print_l = MirInst::print(Operand::var(Variable::local("c")));
        let goto_join = MirInst::goto(0); // patched below
        let print_r = MirInst::print(Operand::var(Variable::local("c")));
        let exit = MirInst::marker(Operator::Exit);

        let if_inst = MirInst::if_branch(Operand::var(Variable::local("c")), print_l.unique_id);
        let mut goto_join = goto_join;
        goto_join.set_branch_target(exit.unique_id);

        vec![entry, cond_assign, if_inst, print_l, goto_join, print_r, exit]
    }

    #[test]
    fn builds_diamond_with_cond_and_jump_blocks() {
        let insts = diamond();
        let cfg = CfgBuilder::build("f", &insts).unwrap();
        assert!(cfg.graph().node_count() >= 4);
        cfg.verify().unwrap();
    }

    #[test]
    fn empty_function_is_rejected() {
        let err = CfgBuilder::build("f", &[]);
        assert!(err.is_err());
    }

    #[test]
    fn entry_initializer_prefix_splits_into_its_own_leader_block() {
        // `spec.md` §4.1 step 1 makes the instruction right after the
        // entry-initializer prefix (a run of `INIT`s, here zero-length) a
        // leader, so the entry marker and the body fall into two blocks.
        let entry = MirInst::marker(Operator::Entry);
        let print = MirInst::print(Operand::literal(Literal::Int(1)));
        let exit = MirInst::marker(Operator::Exit);
        let insts = vec![entry, print, exit];
        let cfg = CfgBuilder::build("f", &insts).unwrap();
        assert_eq!(cfg.graph().node_count(), 2);
    }
}
