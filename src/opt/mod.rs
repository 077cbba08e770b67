// src/opt/mod.rs
//! The optimization pipeline: per-function orchestration of CFG/dominance/
//! loop/SSA construction followed by the configured optimization passes.
//! Grounded on the teacher's `Phase` trait and `run_pipeline`
//! (`src/ir/optimizer/phase.rs`), generalized from one `Module`-wide phase
//! list into the per-function driver `spec.md` §4.10 describes.
pub mod lcm;
pub mod sccp;

use crate::cfg::{CfgBuilder, ControlFlowGraph, DominanceInfo};
use crate::diagnostics;
use crate::error::TacmirError;
use crate::loops::LoopForest;
use crate::mir::{Function, MirModule};
use crate::ssa::{self, SsaEdgeBuilder};

/// One stage of a module-wide optimization pipeline.
///
/// `Driver` itself does not build a `Vec<Box<dyn Phase>>` the way the
/// teacher's `run_pipeline` does — its stages need per-function CFG/SSA
/// state a `&mut MirModule`-only signature cannot carry between them — but
/// every stage it runs still implements this trait, kept at this signature
/// so external callers can add their own whole-module passes downstream of
/// `Driver::run` without learning a second interface.
pub trait Phase {
    fn name(&self) -> &'static str;

    /// # Errors
    /// Returns a fatal [`TacmirError`] if the phase cannot complete.
    fn run(&mut self, module: &mut MirModule) -> Result<(), TacmirError>;
}

/// Runs every phase in `phases` over `module` in order, stopping at the
/// first error.
///
/// # Errors
/// Returns the first fatal error any phase raises.
pub fn run_pipeline(module: &mut MirModule, phases: &mut [Box<dyn Phase>]) -> Result<(), TacmirError> {
    for phase in phases.iter_mut() {
        diagnostics::verbose(&format!("running phase: {}", phase.name()));
        phase.run(module)?;
    }
    Ok(())
}

/// Which partial-redundancy-elimination family to run before SSA is
/// finalized. Only `Lcm` has a real implementation; `Dae`/`Cse` are
/// accepted by the CLI grammar but rejected at this boundary (`spec.md`
/// §9 reserves them without specifying behavior).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreAlgorithm {
    Lcm,
    Dae,
    Cse,
    #[default]
    None,
}

/// When to (re)build minimal SSA relative to the optimization passes.
/// `Postpone` has no observable effect in this driver: every implemented
/// pass requires SSA, so it behaves exactly like `Always`
/// (`diagnostics::note_ssa_period_postpone_is_always`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SsaPeriod {
    #[default]
    Always,
    Never,
    Postpone,
}

/// The pipeline's configuration, mirroring the CLI flags in `spec.md` §6.3.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub sccp: bool,
    pub pre: PreAlgorithm,
    pub ssa_period: SsaPeriod,
    /// Per-block (LCM's four dataflow passes) or per-instruction (SCCP)
    /// multiplier for each pass's worklist iteration ceiling (`spec.md`
    /// §4.6/§7's "bounded, not fatal" convergence ceiling). Threaded into
    /// `dataflow::DataflowAnalysis::run_with_ceiling` and
    /// `sccp::run_with_ceiling`.
    pub max_iterations: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { sccp: false, pre: PreAlgorithm::None, ssa_period: SsaPeriod::Always, max_iterations: 100 }
    }
}

/// Cumulative counters across every function one `Driver::run`/`run_parallel`
/// call processes, matching the teacher's `OptimizationStats` in shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineStats {
    pub constants_propagated: usize,
    pub branches_resolved: usize,
    pub phis_simplified: usize,
    pub temporaries_inserted: usize,
    pub convergence_warnings: usize,
}

impl PipelineStats {
    fn absorb_fold(&mut self, fold: sccp::FoldStats) {
        self.constants_propagated += fold.constants_propagated;
        self.branches_resolved += fold.branches_resolved;
        self.phis_simplified += fold.phis_simplified;
    }

    fn merge(&mut self, other: Self) {
        self.constants_propagated += other.constants_propagated;
        self.branches_resolved += other.branches_resolved;
        self.phis_simplified += other.phis_simplified;
        self.temporaries_inserted += other.temporaries_inserted;
        self.convergence_warnings += other.convergence_warnings;
    }
}

impl std::fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "pipeline stats: {} constant(s) propagated, {} branch(es) resolved, {} phi(s) simplified, \
             {} temporary(ies) inserted, {} convergence warning(s)",
            self.constants_propagated,
            self.branches_resolved,
            self.phis_simplified,
            self.temporaries_inserted,
            self.convergence_warnings,
        )
    }
}

/// Orchestrates the full per-function optimization pipeline described in
/// `spec.md` §4.10.
#[derive(Debug, Clone, Copy, Default)]
pub struct Driver;

impl Driver {
    /// Runs the configured pipeline over every function in `module`,
    /// processing functions sequentially.
    ///
    /// # Errors
    /// Returns `TacmirError::Unimplemented` if `config.pre` selects `Dae` or
    /// `Cse`, or propagates the first fatal error any function's pipeline
    /// raises (malformed CFG, SSA inconsistency, or a constant-folding
    /// evaluation failure such as division by a folded zero).
    pub fn run(module: &mut MirModule, config: &PipelineConfig) -> Result<PipelineStats, TacmirError> {
        Self::reject_unimplemented_pre(config)?;
        if matches!(config.ssa_period, SsaPeriod::Postpone) {
            diagnostics::note_ssa_period_postpone_is_always();
        }

        let mut stats = PipelineStats::default();
        for function in &mut module.functions {
            Self::run_function(function, config, &mut stats)?;
        }
        Ok(stats)
    }

    /// Same pipeline as [`Self::run`], one OS thread per function via
    /// `std::thread::scope`. Sound without extra synchronization: each
    /// function's pipeline owns its instruction list exclusively and no
    /// mutable state crosses function boundaries (`spec.md` §5), and
    /// `unique_id` allocation is already a shared `AtomicU64`.
    ///
    /// # Errors
    /// Same conditions as [`Self::run`]; returns the first fatal error
    /// encountered across all threads after every thread has finished.
    pub fn run_parallel(module: &mut MirModule, config: &PipelineConfig) -> Result<PipelineStats, TacmirError> {
        Self::reject_unimplemented_pre(config)?;
        if matches!(config.ssa_period, SsaPeriod::Postpone) {
            diagnostics::note_ssa_period_postpone_is_always();
        }

        let per_function: Vec<Result<PipelineStats, TacmirError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = module
                .functions
                .iter_mut()
                .map(|function| {
                    scope.spawn(move || {
                        let mut local = PipelineStats::default();
                        Self::run_function(function, config, &mut local)?;
                        Ok(local)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().expect("optimization worker thread panicked")).collect()
        });

        let mut total = PipelineStats::default();
        for result in per_function {
            total.merge(result?);
        }
        Ok(total)
    }

    fn reject_unimplemented_pre(config: &PipelineConfig) -> Result<(), TacmirError> {
        match config.pre {
            PreAlgorithm::Dae => Err(TacmirError::Unimplemented("dae PRE algorithm")),
            PreAlgorithm::Cse => Err(TacmirError::Unimplemented("cse PRE algorithm")),
            PreAlgorithm::Lcm | PreAlgorithm::None => Ok(()),
        }
    }

    fn run_function(function: &mut Function, config: &PipelineConfig, stats: &mut PipelineStats) -> Result<(), TacmirError> {
        diagnostics::verbose(&format!("optimizing function `{}`", function.name));

        let mut cfg = CfgBuilder::build(&function.name, &function.insts)?;
        let dom = DominanceInfo::compute(&mut cfg);
        ssa::insert_phis(&mut cfg, &dom);
        ssa::rename(&mut cfg)?;

        if config.sccp {
            let loops = LoopForest::analyze(&cfg);
            let edges = SsaEdgeBuilder::build(&cfg, &loops);
            let result = sccp::run_with_ceiling(&cfg, &edges, config.max_iterations);
            if !result.converged {
                stats.convergence_warnings += 1;
            }
            let fold = sccp::apply_folding(&mut cfg, &result)?;
            stats.absorb_fold(fold);
        }

        if matches!(config.pre, PreAlgorithm::Lcm) {
            lcm::split_critical_edges(&mut cfg);
            let analysis = lcm::analyze(&cfg, config.max_iterations);
            let inserted = lcm::apply_lcm(&mut cfg, &analysis);
            stats.temporaries_inserted += inserted;
        }

        Self::reassign_addresses(&mut cfg);
        function.insts = cfg.linearize();
        Ok(())
    }

    /// Assigns sequential addresses to every instruction, ascending block-id
    /// then in-block order, last so every structural edit (phi insertion,
    /// folding, LCM hoisting/splitting) has already happened — `spec.md`
    /// §4.10's final step, consumed by `printer::print_module`'s
    /// `[addr:NNNN]` prefix.
    fn reassign_addresses(cfg: &mut ControlFlowGraph) {
        let mut blocks: Vec<_> = cfg.blocks().collect();
        blocks.sort_by_key(|&b| cfg.block(b).id);
        let mut addr = 0u32;
        for block in blocks {
            let count = cfg.block(block).insts.len();
            for pos in 0..count {
                if let Some(inst) = cfg.block_mut(block).insts.get_mut(pos) {
                    inst.addr = addr;
                }
                addr += 1;
            }
        }
    }
}
