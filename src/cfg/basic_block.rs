// src/cfg/basic_block.rs
//! `BasicBlock`: a maximal straight-line run of instructions, per the design
//! §3.
use crate::mir::MirInsts;
use petgraph::graph::NodeIndex;

/// How a block's terminator branches to its successors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchType {
    /// A single unconditional successor (`Goto` or fall-through).
    Jump,
    /// Two successors: slot 0 is the `True` target, slot 1 the `False`
    /// fall-through.
    Cond,
    /// Reserved for a future multi-way dispatch; unused by the grammar in
    /// the design §6 but kept so `BranchType` matches the closed set in
    /// the design §3 exactly.
    Switch,
}

/// The execution-flow label on a CFG edge, invariant:
/// "TRUE iff `dst` is slot 0 of a `cond` src; FALSE iff slot 1; UN_COND
/// otherwise".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeFlow {
    UnCond,
    True,
    False,
}

#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub id: usize,
    pub insts: MirInsts,
    pub branch_type: BranchType,
    /// Successors in slot order: for `Cond`, `[true_target, false_target]`;
    /// for `Jump`, the single successor (if any — the exit block has none).
    pub ordered_succ_bbs: Vec<NodeIndex>,
    pub preorder: usize,
    pub rank: usize,
    pub dominator_tree_parent: Option<NodeIndex>,
    pub dominator_tree_children: Vec<NodeIndex>,
}

impl BasicBlock {
    #[must_use]
    pub fn new(id: usize, insts: MirInsts) -> Self {
        Self {
            id,
            insts,
            branch_type: BranchType::Jump,
            ordered_succ_bbs: Vec::new(),
            preorder: 0,
            rank: 0,
            dominator_tree_parent: None,
            dominator_tree_children: Vec::new(),
        }
    }

    #[must_use]
    pub fn true_target(&self) -> Option<NodeIndex> {
        (self.branch_type == BranchType::Cond).then(|| self.ordered_succ_bbs.first().copied()).flatten()
    }

    #[must_use]
    pub fn false_target(&self) -> Option<NodeIndex> {
        (self.branch_type == BranchType::Cond).then(|| self.ordered_succ_bbs.get(1).copied()).flatten()
    }
}
