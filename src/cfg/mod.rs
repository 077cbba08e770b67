// src/cfg/mod.rs
//! Control-flow graph construction and dominance,
pub mod builder;
pub mod dominance;

use crate::mir::InstId;
use basic_block::{BasicBlock, EdgeFlow};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

pub mod basic_block;
pub use builder::CfgBuilder;
pub use dominance::DominanceInfo;

/// A function's control-flow graph: blocks and flow-labelled edges, plus the
/// indices the rest of the pipeline needs (the design §3).
#[derive(Debug, Clone)]
pub struct ControlFlowGraph {
    graph: DiGraph<BasicBlock, EdgeFlow>,
    entry: NodeIndex,
    exit: NodeIndex,
    /// Instruction id -> (owning block, position within the block's full
    /// instruction list including phis). Rebuilt whenever blocks are
    /// materialized or instructions are inserted.
    inst_index: HashMap<InstId, (NodeIndex, usize)>,
    /// Explicit, stored predecessor order per block — materialized once
    /// after construction and reused by every phi in that block and by SSA
    /// renaming, "Phi operand indexing" note: relying on
    /// `petgraph`'s edge iteration order instead would not give every phi in
    /// a block the same slot assignment.
    predecessors: HashMap<NodeIndex, Vec<NodeIndex>>,
}

impl ControlFlowGraph {
    #[must_use]
    pub fn new(graph: DiGraph<BasicBlock, EdgeFlow>, entry: NodeIndex, exit: NodeIndex) -> Self {
        let mut cfg = Self { graph, entry, exit, inst_index: HashMap::new(), predecessors: HashMap::new() };
        cfg.rebuild_indices();
        cfg
    }

    /// Rebuilds `inst_index` and `predecessors` from the current graph
    /// topology. Must be called after any structural edit (block
    /// insertion/removal, instruction insertion) that the builder or a later
    /// pass performs directly on `graph_mut`.
    pub fn rebuild_indices(&mut self) {
        self.inst_index.clear();
        for node in self.graph.node_indices() {
            let block = &self.graph[node];
            for (pos, inst) in block.insts.iter().enumerate() {
                self.inst_index.insert(inst.unique_id, (node, pos));
            }
        }
        self.predecessors.clear();
        for node in self.graph.node_indices() {
            let preds: Vec<NodeIndex> = self.graph.neighbors_directed(node, Direction::Incoming).collect();
            self.predecessors.insert(node, preds);
        }
    }

    #[must_use]
    pub const fn graph(&self) -> &DiGraph<BasicBlock, EdgeFlow> {
        &self.graph
    }
    pub const fn graph_mut(&mut self) -> &mut DiGraph<BasicBlock, EdgeFlow> {
        &mut self.graph
    }

    #[must_use]
    pub const fn entry(&self) -> NodeIndex {
        self.entry
    }
    #[must_use]
    pub const fn exit(&self) -> NodeIndex {
        self.exit
    }

    #[must_use]
    pub fn block(&self, idx: NodeIndex) -> &BasicBlock {
        &self.graph[idx]
    }
    pub fn block_mut(&mut self, idx: NodeIndex) -> &mut BasicBlock {
        &mut self.graph[idx]
    }

    pub fn blocks(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    #[must_use]
    pub fn successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.graph[idx].ordered_succ_bbs.clone()
    }

    /// The stored, explicit predecessor order for `idx` (see the
    /// `predecessors` field doc).
    #[must_use]
    pub fn predecessors(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.predecessors.get(&idx).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn edge_flow(&self, from: NodeIndex, to: NodeIndex) -> EdgeFlow {
        let block = &self.graph[from];
        match block.branch_type {
            basic_block::BranchType::Cond => {
                if block.true_target() == Some(to) {
                    EdgeFlow::True
                } else if block.false_target() == Some(to) {
                    EdgeFlow::False
                } else {
                    EdgeFlow::UnCond
                }
            }
            _ => EdgeFlow::UnCond,
        }
    }

    #[must_use]
    pub fn block_of_inst(&self, id: InstId) -> Option<NodeIndex> {
        self.inst_index.get(&id).map(|&(node, _)| node)
    }

    #[must_use]
    pub fn position_of_inst(&self, id: InstId) -> Option<usize> {
        self.inst_index.get(&id).map(|&(_, pos)| pos)
    }

    /// Looks up an instruction by its `unique_id`, wherever it currently
    /// lives in the graph.
    #[must_use]
    pub fn inst(&self, id: InstId) -> Option<&crate::mir::MirInst> {
        let &(node, pos) = self.inst_index.get(&id)?;
        self.graph[node].insts.get(pos)
    }

    pub fn inst_mut(&mut self, id: InstId) -> Option<&mut crate::mir::MirInst> {
        let &(node, pos) = self.inst_index.get(&id)?;
        self.graph[node].insts.get_mut(pos)
    }

    /// Reverse-post-order from the entry block, via an explicit DFS over
    /// the stored successor order (never `petgraph`'s default neighbor
    /// iteration, which is not slot-order-stable).
    #[must_use]
    pub fn reverse_post_order(&self) -> Vec<NodeIndex> {
        let mut visited = vec![false; self.graph.node_count()];
        let mut post_order = Vec::with_capacity(self.graph.node_count());
        let mut stack = vec![(self.entry, 0usize)];
        visited[self.entry.index()] = true;
        while let Some((node, next_child)) = stack.pop() {
            let succs = &self.graph[node].ordered_succ_bbs;
            if next_child < succs.len() {
                stack.push((node, next_child + 1));
                let child = succs[next_child];
                if !visited[child.index()] {
                    visited[child.index()] = true;
                    stack.push((child, 0));
                }
            } else {
                post_order.push(node);
            }
        }
        post_order.reverse();
        post_order
    }

    /// Total instruction count across every block, phis included.
    #[must_use]
    pub fn inst_count(&self) -> usize {
        self.graph.node_weights().map(|b| b.insts.len()).sum()
    }

    /// Flattens every block back into one program-order instruction stream,
    /// in ascending block-id order, phis first within each block. Used by
    /// the optimization driver to fold pass results back into a function's
    /// linear instruction list after its pipeline run.
    #[must_use]
    pub fn linearize(&self) -> Vec<crate::mir::MirInst> {
        let mut blocks: Vec<NodeIndex> = self.blocks().collect();
        blocks.sort_by_key(|&n| self.graph[n].id);
        blocks.into_iter().flat_map(|n| self.graph[n].insts.iter().cloned()).collect()
    }

    /// Verifies the CFG soundness invariants of the design §8: `preds(b)`
    /// matches the graph's actual incoming edges, and the exit block has no
    /// successors.
    ///
    /// # Errors
    /// Returns a description of the first violated invariant found.
    pub fn verify(&self) -> Result<(), String> {
        for node in self.graph.node_indices() {
            let actual_preds: std::collections::HashSet<_> =
            self.graph.neighbors_directed(node, Direction::Incoming).collect();
            let stored_preds: std::collections::HashSet<_> = self.predecessors(node).iter().copied().collect();
            if actual_preds != stored_preds {
                return Err(format!("predecessor mismatch at block {}", self.graph[node].id));
            }
        }
        if self.graph.neighbors_directed(self.exit, Direction::Outgoing).next().is_some() {
            return Err("exit block has a successor".to_string());
        }
        Ok(())
    }
}
