// src/loops.rs
//! Natural loop detection and nesting.
use crate::cfg::ControlFlowGraph;
use petgraph::graph::NodeIndex;
use std::collections::{HashSet, VecDeque};

/// A single natural loop: header, body blocks (header included), and the
/// latches (blocks with a back edge into the header).
#[derive(Debug, Clone)]
pub struct Loop {
    pub header: NodeIndex,
    pub body_blocks: HashSet<NodeIndex>,
    pub latches: HashSet<NodeIndex>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl Loop {
    #[must_use]
    pub fn contains(&self, block: NodeIndex) -> bool {
        self.body_blocks.contains(&block)
    }
}

/// The set of loops in a function, as a flat arena with parent/child indices
/// (Rust can't hold sibling `Loop` values behind shared mutable back-pointers
/// as cheaply as the original's direct object references).
#[derive(Debug, Clone, Default)]
pub struct LoopForest {
    loops: Vec<Loop>,
}

impl LoopForest {
    #[must_use]
    pub fn loops(&self) -> &[Loop] {
        &self.loops
    }

    #[must_use]
    pub fn get(&self, idx: usize) -> &Loop {
        &self.loops[idx]
    }

    /// The innermost loop containing `block`, if any: the loop among those
    /// containing `block` with the smallest body, walked down the ancestor
    /// chain the way `Loop.is_inner_relative_to` does in the original.
    #[must_use]
    pub fn innermost_loop_for(&self, block: NodeIndex) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (idx, l) in self.loops.iter().enumerate() {
            if l.contains(block) {
                best = Some(match best {
                        None => idx,
                        Some(cur) if l.body_blocks.len() < self.loops[cur].body_blocks.len() => idx,
                        Some(cur) => cur,
                });
            }
        }
        best
    }

    /// Detects every natural loop in `cfg` and builds the nesting forest.
    ///
    /// Back edges are `(latch, header)` pairs with `header ∈ succ(latch)`
    /// and `rank(header) ≤ rank(latch)` — the non-strict `≤` is the design's
    /// explicit deviation from the original's strict `<`, which would miss a
    /// self-loop back edge where `latch == header`.
    #[must_use]
    pub fn analyze(cfg: &ControlFlowGraph) -> Self {
        let mut back_edges: Vec<(NodeIndex, NodeIndex)> = Vec::new();
        for block in cfg.blocks() {
            let rank_b = cfg.block(block).rank;
            for succ in cfg.successors(block) {
                let rank_s = cfg.block(succ).rank;
                if rank_s <= rank_b {
                    back_edges.push((block, succ));
                }
            }
        }

        // Group back edges by header; one natural loop per distinct header.
        let mut by_header: std::collections::HashMap<NodeIndex, Vec<NodeIndex>> = std::collections::HashMap::new();
        for (latch, header) in back_edges {
            by_header.entry(header).or_default().push(latch);
        }

        let mut loops: Vec<Loop> = by_header
        .into_iter()
        .map(|(header, latches)| {
                let body_blocks = Self::natural_loop_body(cfg, header, &latches);
                Loop {
                    header,
                    body_blocks,
                    latches: latches.into_iter().collect(),
                    parent: None,
                    children: Vec::new(),
                }
        })
        .collect();

        // Sort ascending by body size to build nesting: a loop nests inside
        // the smallest already-placed loop whose body contains its header.
        loops.sort_by_key(|l| l.body_blocks.len());

        let n = loops.len();
        let mut parent = vec![None; n];
        for i in 0..n {
            for j in (i + 1)..n {
                if loops[j].body_blocks.contains(&loops[i].header) {
                    parent[i] = match parent[i] {
                        None => Some(j),
                        Some(cur) if loops[j].body_blocks.len() < loops[cur].body_blocks.len() => Some(j),
                        Some(cur) => Some(cur),
                    };
                }
            }
        }
        for (i, p) in parent.into_iter().enumerate() {
            loops[i].parent = p;
            if let Some(p) = p {
                loops[p].children.push(i);
            }
        }

        Self { loops }
    }

    /// Natural loop body for one header: predecessor-driven BFS from each
    /// latch, stopping whenever the walk reaches the header.
    fn natural_loop_body(cfg: &ControlFlowGraph, header: NodeIndex, latches: &[NodeIndex]) -> HashSet<NodeIndex> {
        let mut body = HashSet::from([header]);
        let mut queue: VecDeque<NodeIndex> = VecDeque::new();
        for &latch in latches {
            if body.insert(latch) {
                queue.push_back(latch);
            }
        }
        while let Some(block) = queue.pop_front() {
            if block == header {
                continue;
            }
            for &pred in cfg.predecessors(block) {
                if body.insert(pred) {
                    queue.push_back(pred);
                }
            }
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::CfgBuilder;
    use crate::mir::{Literal, MirInst, Operand, Operator, Variable};

    fn while_loop_cfg() -> ControlFlowGraph {
        let entry = MirInst::marker(Operator::Entry);
        let header_cond = MirInst::assign(Operand::var(Variable::local("c")), Operand::literal(Literal::Bool(true)));
        let body_print = MirInst::print(Operand::var(Variable::local("c")));
        let mut back_edge = MirInst::goto(0);
        let exit_print = MirInst::print(Operand::literal(Literal::Int(0)));
        let exit = MirInst::marker(Operator::Exit);

        back_edge.set_branch_target(header_cond.unique_id);
        let if_inst = MirInst::if_branch(Operand::var(Variable::local("c")), body_print.unique_id);

        let insts = vec![entry, header_cond, if_inst, body_print, back_edge, exit_print, exit];
        CfgBuilder::build("f", &insts).unwrap()
    }

    #[test]
    fn detects_single_natural_loop() {
        let cfg = while_loop_cfg();
        let forest = LoopForest::analyze(&cfg);
        assert_eq!(forest.loops().len(), 1);
    }

    #[test]
    fn loop_free_function_has_no_loops() {
        let entry = MirInst::marker(Operator::Entry);
        let print = MirInst::print(Operand::literal(Literal::Int(1)));
        let exit = MirInst::marker(Operator::Exit);
        let cfg = CfgBuilder::build("f", &[entry, print, exit]).unwrap();
        let forest = LoopForest::analyze(&cfg);
        assert!(forest.loops().is_empty());
    }

    #[test]
    fn innermost_loop_for_header_returns_its_own_loop() {
        let cfg = while_loop_cfg();
        let forest = LoopForest::analyze(&cfg);
        let header = forest.get(0).header;
        assert_eq!(forest.innermost_loop_for(header), Some(0));
    }
}
