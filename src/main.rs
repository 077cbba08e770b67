// src/main.rs
//! `tacmir` command-line entry point: `optimize` runs the configured
//! pipeline over a textual MIR file and re-emits it; `analyze` builds the
//! CFG/dominator/loop/SSA-edge facts and prints a summary without mutating
//! anything.
use std::fs;
use std::io::Write as _;
use std::process::ExitCode;

use clap::Parser;

use tacmir::cfg::{CfgBuilder, DominanceInfo};
use tacmir::cli::{AnalyzeArgs, Args, Command, OptimizeArgs};
use tacmir::diagnostics::{self, Verbosity};
use tacmir::error::TacmirError;
use tacmir::loops::LoopForest;
use tacmir::opt::Driver;
use tacmir::parser;
use tacmir::printer;
use tacmir::ssa::{self, SsaEdgeBuilder};

fn main() -> ExitCode {
    let args = Args::parse();
    let result = match args.command {
        Command::Optimize(optimize) => run_optimize(&optimize),
        Command::Analyze(analyze) => run_analyze(&analyze),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            diagnostics::report_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn run_optimize(args: &OptimizeArgs) -> Result<(), TacmirError> {
    diagnostics::set_verbosity(Verbosity::from(args.verbose));

    let source = fs::read_to_string(&args.input)?;
    let mut module = parser::parse(&source)?;

    let config = args.pipeline_config();
    let stats = Driver::run(&mut module, &config)?;
    diagnostics::verbose(&stats.to_string());

    if args.dry_run {
        return Ok(());
    }

    let rendered = printer::print_module(&module);
    write_output(args.output.as_deref(), &rendered)
}

fn run_analyze(args: &AnalyzeArgs) -> Result<(), TacmirError> {
    diagnostics::set_verbosity(Verbosity::from(args.verbose));

    let source = fs::read_to_string(&args.input)?;
    let module = parser::parse(&source)?;

    for function in &module.functions {
        let mut cfg = CfgBuilder::build(&function.name, &function.insts)?;
        let dom = DominanceInfo::compute(&mut cfg);
        ssa::insert_phis(&mut cfg, &dom);
        ssa::rename(&mut cfg)?;
        let loops = LoopForest::analyze(&cfg);
        let edges = SsaEdgeBuilder::build(&cfg, &loops);

        println!("function {}", function.name);
        println!("  blocks: {}", cfg.blocks().count());
        println!("  instructions: {}", cfg.inst_count());
        println!("  loops: {}", loops.loops().len());
        println!("  ssa def-use edges: {}", edges.edges.len());

        let mut blocks: Vec<_> = cfg.blocks().collect();
        blocks.sort_by_key(|&b| cfg.block(b).id);
        for block in blocks {
            let b = cfg.block(block);
            let preds: Vec<usize> = cfg.predecessors(block).iter().map(|p| cfg.block(*p).id).collect();
            let succs: Vec<usize> = cfg.successors(block).iter().map(|s| cfg.block(*s).id).collect();
            let idom = b.dominator_tree_parent.map(|p| cfg.block(p).id);
            println!("  block {} (rank {}): preds={preds:?} succs={succs:?} idom={idom:?}", b.id, b.rank);
        }
    }

    Ok(())
}

fn write_output(path: Option<&std::path::Path>, content: &str) -> Result<(), TacmirError> {
    match path {
        Some(path) => fs::write(path, content).map_err(TacmirError::from),
        None => {
            print!("{content}");
            std::io::stdout().flush().map_err(TacmirError::from)
        }
    }
}
