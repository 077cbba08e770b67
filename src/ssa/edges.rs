// src/ssa/edges.rs
//! SSA def-use edge construction: `SsaEdge`/`SsaEdgeBuilder` walk a renamed
//! CFG and record every definition-to-use relationship.
use crate::cfg::ControlFlowGraph;
use crate::loops::LoopForest;
use crate::mir::{InstId, SsaVariable};
use petgraph::graph::NodeIndex;
use std::collections::HashMap;

/// The provenance of one SSA def-use edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SsaEdgeKind {
    /// An ordinary (non-phi) use of a definition.
    Regular,
    /// A phi argument slot whose defining block lies outside the phi's loop,
    /// or is the loop's own header.
    PhiArg,
    /// A phi argument slot whose defining block lies inside the same loop as
    /// the phi and is not that loop's header — the edge carries a value
    /// around the back edge.
    LoopCarried,
}

/// One SSA definition-to-use edge.
#[derive(Debug, Clone)]
pub struct SsaEdge {
    pub source_inst: InstId,
    pub target_inst: InstId,
    pub src_block: NodeIndex,
    pub dest_block: NodeIndex,
    pub variable: SsaVariable,
    pub kind: SsaEdgeKind,
}

/// Builds the SSA def-use graph of a renamed function: every `Regular`,
/// `PhiArg` and `LoopCarried` edge, plus the `def_map` (SSA name -> defining
/// instruction) and `succ` map (defining instruction -> its SSA successors)
/// SCCP's `ssa_wl` consumes.
pub struct SsaEdgeBuilder {
    pub edges: Vec<SsaEdge>,
    pub def_map: HashMap<SsaVariable, InstId>,
    pub succ: HashMap<InstId, Vec<InstId>>,
}

impl SsaEdgeBuilder {
    #[must_use]
    pub fn build(cfg: &ControlFlowGraph, loops: &LoopForest) -> Self {
        let mut def_map: HashMap<SsaVariable, InstId> = HashMap::new();
        for block in cfg.blocks() {
            for inst in cfg.block(block).insts.iter() {
                if let Some(ssa) = inst.defined_ssa() {
                    def_map.insert(ssa.clone(), inst.unique_id);
                }
            }
        }

        let mut edges: Vec<SsaEdge> = Vec::new();
        let mut succ: HashMap<InstId, Vec<InstId>> = HashMap::new();

        for block in cfg.blocks() {
            for inst in cfg.block(block).insts.ordinary() {
                for used in inst.ordinary_ssa_uses() {
                    if let Some(&def_id) = def_map.get(&used) {
                        let src_block = cfg.block_of_inst(def_id).unwrap_or(block);
                        edges.push(SsaEdge {
                                source_inst: def_id,
                                target_inst: inst.unique_id,
                                src_block,
                                dest_block: block,
                                variable: used,
                                kind: SsaEdgeKind::Regular,
                        });
                        succ.entry(def_id).or_default().push(inst.unique_id);
                    }
                }
            }

            for phi in cfg.block(block).insts.phis() {
                for arg in phi.phi_args() {
                    let Some(ssa) = arg.as_ssa() else { continue };
                    if ssa.version == SsaVariable::UNVERSIONED {
                        continue;
                    }
                    if let Some(&def_id) = def_map.get(ssa) {
                        let src_block = cfg.block_of_inst(def_id).unwrap_or(block);
                        let kind = if Self::is_loop_carried(loops, src_block, block) {
                            SsaEdgeKind::LoopCarried
                        } else {
                            SsaEdgeKind::PhiArg
                        };
                        edges.push(SsaEdge {
                                source_inst: def_id,
                                target_inst: phi.unique_id,
                                src_block,
                                dest_block: block,
                                variable: ssa.clone(),
                                kind,
                        });
                        succ.entry(def_id).or_default().push(phi.unique_id);
                    }
                }
            }
        }

        Self { edges, def_map, succ }
    }

    /// A phi argument edge is loop-carried if its source block lies inside
    /// the same loop as the phi's block and is not that loop's header —
    /// the value flows around the back edge rather than in from outside.
    fn is_loop_carried(loops: &LoopForest, src_block: NodeIndex, phi_block: NodeIndex) -> bool {
        loops
        .innermost_loop_for(phi_block)
        .map(|idx| loops.get(idx))
        .is_some_and(|l| l.contains(src_block) && src_block != l.header)
    }
}
