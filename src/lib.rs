// src/lib.rs
/// # tacmir
///
/// A textual three-address MIR mid-end: CFG and dominator construction,
/// minimal SSA, a generic worklist dataflow framework, and two optimization
/// passes (sparse conditional constant propagation and lazy code motion).
///
/// ## Module map
/// * `mir` - the instruction/operand/variable data model
/// * `cfg` - control-flow graph construction and dominance
/// * `ssa` - phi insertion, renaming, def-use edges
/// * `loops` - natural loop and nesting analysis
/// * `lattice` - the semilattices the dataflow framework is parameterized over
/// * `dataflow` - the generic worklist dataflow framework
/// * `opt` - the SCCP and LCM optimization passes and the pipeline driver
/// * `parser` - the textual MIR lexer and recursive-descent parser
/// * `printer` - textual MIR re-emission
/// * `error` - the crate-wide error type
/// * `diagnostics` - human-readable, console-styled diagnostics
/// * `cli` - command-line interface
pub mod cfg;
pub mod cli;
pub mod dataflow;
pub mod diagnostics;
pub mod error;
pub mod lattice;
pub mod loops;
pub mod mir;
pub mod opt;
pub mod parser;
pub mod printer;
pub mod ssa;
