// src/cfg/dominance.rs
//! Dominator computation, dominator tree and dominance frontiers, per
//! the design §4.2.
use super::ControlFlowGraph;
use petgraph::graph::NodeIndex;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Dominance facts for one function's [`ControlFlowGraph`].
#[derive(Debug, Clone, Default)]
pub struct DominanceInfo {
    /// `Dom(b)`: every block that dominates `b`, `b` included.
    dom: HashMap<NodeIndex, BTreeSet<NodeIndex>>,
    idom: HashMap<NodeIndex, NodeIndex>,
    /// `DF(b)`: the dominance frontier of `b`.
    frontier: HashMap<NodeIndex, BTreeSet<NodeIndex>>,
}

impl DominanceInfo {
    /// Computes `Dom`, `idom`, the dominator tree (written back onto the
    /// blocks' `dominator_tree_parent`/`dominator_tree_children` fields) and
    /// the dominance frontier of every block in `cfg`.
    #[must_use]
    pub fn compute(cfg: &mut ControlFlowGraph) -> Self {
        let rpo = cfg.reverse_post_order();
        let entry = cfg.entry();
        let all_blocks: BTreeSet<NodeIndex> = cfg.blocks().collect();

        // Step 1: iterative fixed point on Dom(b),
        // Dom(entry) = {entry}; Dom(b) = {b} U (intersection of Dom(p) over
        // every predecessor p), iterated to a fixed point.
        let mut dom: HashMap<NodeIndex, BTreeSet<NodeIndex>> = HashMap::new();
        for &b in &all_blocks {
            if b == entry {
                dom.insert(b, BTreeSet::from([entry]));
            } else {
                dom.insert(b, all_blocks.clone());
            }
        }

        let mut changed = true;
        while changed {
            changed = false;
            for &b in &rpo {
                if b == entry {
                    continue;
                }
                let preds = cfg.predecessors(b);
                let mut new_dom: Option<BTreeSet<NodeIndex>> = None;
                for &p in preds {
                    let pd = &dom[&p];
                    new_dom = Some(match new_dom {
                            None => pd.clone(),
                            Some(acc) => acc.intersection(pd).copied().collect(),
                    });
                }
                let mut new_dom = new_dom.unwrap_or_default();
                new_dom.insert(b);
                if new_dom != dom[&b] {
                    dom.insert(b, new_dom);
                    changed = true;
                }
            }
        }

        // Step 2: idom(b) is the strict dominator of b that is dominated by
        // every other strict dominator of b; ties (which cannot arise from a
        // single valid CFG, but can from malformed/disconnected input) break
        // on smallest block id, explicit deviation from
        // both prior sources.
        let mut idom: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        for &b in &all_blocks {
            if b == entry {
                continue;
            }
            let strict_doms: Vec<NodeIndex> = dom[&b].iter().copied().filter(|&d| d != b).collect();
            let mut candidate: Option<NodeIndex> = None;
            for &d in &strict_doms {
                let d_dominates_all_other_strict_doms =
                strict_doms.iter().all(|&other| other == d || dom[&other].contains(&d));
                if d_dominates_all_other_strict_doms {
                    candidate = Some(match candidate {
                            None => d,
                            Some(existing) => {
                                let d_id = cfg.block(d).id;
                                let existing_id = cfg.block(existing).id;
                                if d_id < existing_id { d } else { existing }
                            }
                    });
                }
            }
            if let Some(idom_b) = candidate {
                idom.insert(b, idom_b);
            }
        }

        // Step 3: dominator tree, written back onto the blocks.
        for node in cfg.blocks().collect::<Vec<_>>() {
            cfg.block_mut(node).dominator_tree_parent = None;
            cfg.block_mut(node).dominator_tree_children.clear();
        }
        for (&b, &parent) in &idom {
            cfg.block_mut(b).dominator_tree_parent = Some(parent);
        }
        let mut children: HashMap<NodeIndex, Vec<NodeIndex>> = HashMap::new();
        for (&b, &parent) in &idom {
            children.entry(parent).or_default().push(b);
        }
        for (parent, mut kids) in children {
            kids.sort_by_key(|&k| cfg.block(k).id);
            cfg.block_mut(parent).dominator_tree_children = kids;
        }

        // Step 4: dominance frontier, Cytron et al.: local + up components.
        let mut frontier: HashMap<NodeIndex, BTreeSet<NodeIndex>> =
        all_blocks.iter().map(|&b| (b, BTreeSet::new())).collect();
        for &b in &all_blocks {
            let preds = cfg.predecessors(b).to_vec();
            if preds.len() < 2 {
                continue;
            }
            for p in preds {
                let mut runner = p;
                while Some(runner) != idom.get(&b).copied() {
                    frontier.entry(runner).or_default().insert(b);
                    match idom.get(&runner) {
                        Some(&next) if next != runner => runner = next,
                        _ => break,
                    }
                }
            }
        }

        Self { dom, idom, frontier }
    }

    #[must_use]
    pub fn dominates(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.dom.get(&b).is_some_and(|set| set.contains(&a))
    }

    #[must_use]
    pub fn strictly_dominates(&self, a: NodeIndex, b: NodeIndex) -> bool {
        a != b && self.dominates(a, b)
    }

    #[must_use]
    pub fn idom(&self, b: NodeIndex) -> Option<NodeIndex> {
        self.idom.get(&b).copied()
    }

    #[must_use]
    pub fn frontier(&self, b: NodeIndex) -> &BTreeSet<NodeIndex> {
        static EMPTY: std::sync::OnceLock<BTreeSet<NodeIndex>> = std::sync::OnceLock::new();
        self.frontier.get(&b).unwrap_or_else(|| EMPTY.get_or_init(BTreeSet::new))
    }

    /// Iterated dominance frontier of a block set, `DF+(S)`: closes `S`'s
    /// frontier under repeated frontier expansion to a fixed point.
    #[must_use]
    pub fn iterated_frontier(&self, seeds: impl IntoIterator<Item = NodeIndex>) -> BTreeSet<NodeIndex> {
        let mut result: BTreeSet<NodeIndex> = BTreeSet::new();
        let mut worklist: Vec<NodeIndex> = seeds.into_iter().collect();
        let mut seen: HashSet<NodeIndex> = worklist.iter().copied().collect();
        while let Some(b) = worklist.pop() {
            for &f in self.frontier(b) {
                if result.insert(f) && seen.insert(f) {
                    worklist.push(f);
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::CfgBuilder;
    use crate::mir::{Literal, MirInst, Operand, Operator, Variable};

    fn diamond_cfg() -> ControlFlowGraph {
        let entry = MirInst::marker(Operator::Entry);
        let cond = MirInst::assign(Operand::var(Variable::local("c")), Operand::literal(Literal::Bool(true)));
        let left = MirInst::print(Operand::var(Variable::local("c")));
        let mut goto_join = MirInst::goto(0);
        let right = MirInst::print(Operand::var(Variable::local("c")));
        let exit = MirInst::marker(Operator::Exit);
        goto_join.set_branch_target(exit.unique_id);
        let if_inst = MirInst::if_branch(Operand::var(Variable::local("c")), left.unique_id);
        let insts = vec![entry, cond, if_inst, left, goto_join, right, exit];
        CfgBuilder::build("f", &insts).unwrap()
    }

    #[test]
    fn entry_dominates_every_block() {
        let mut cfg = diamond_cfg();
        let entry = cfg.entry();
        let info = DominanceInfo::compute(&mut cfg);
        for b in cfg.blocks().collect::<Vec<_>>() {
            assert!(info.dominates(entry, b));
        }
    }

    #[test]
    fn join_block_frontier_is_empty_for_its_own_idom() {
        let mut cfg = diamond_cfg();
        let entry = cfg.entry();
        let info = DominanceInfo::compute(&mut cfg);
        assert!(!info.frontier(entry).contains(&entry));
    }

    #[test]
    fn iterated_frontier_is_superset_of_direct_frontier() {
        let mut cfg = diamond_cfg();
        let info = DominanceInfo::compute(&mut cfg);
        let blocks: Vec<NodeIndex> = cfg.blocks().collect();
        let direct = info.frontier(blocks[0]).clone();
        let iterated = info.iterated_frontier(vec![blocks[0]]);
        assert!(direct.is_subset(&iterated));
    }
}
