// src/diagnostics.rs
//! Human-readable, `console`-styled diagnostics. MIR instructions carry no
//! source span past the parser, so this renders one-line, category-tagged
//! messages instead of a source-context block.
use crate::error::TacmirError;
use console::style;
use std::sync::atomic::{AtomicU8, Ordering};

/// How much diagnostic chatter to emit, driven by repeated `-v` flags
/// (`--verbose`/`-v` generalized to a count, per `SPEC_FULL.md`
/// §6.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl From<u8> for Verbosity {
    fn from(count: u8) -> Self {
        match count {
            0 => Self::Normal,
            _ => Self::Verbose,
        }
    }
}

static VERBOSITY: AtomicU8 = AtomicU8::new(1); // Normal by default.

/// Installs the process-wide verbosity level, read by every diagnostic call
/// below. Set once by `main` from the parsed CLI flags.
pub fn set_verbosity(v: Verbosity) {
    let code = match v {
        Verbosity::Quiet => 0,
        Verbosity::Normal => 1,
        Verbosity::Verbose => 2,
    };
    VERBOSITY.store(code, Ordering::Relaxed);
}

fn verbosity() -> Verbosity {
    match VERBOSITY.load(Ordering::Relaxed) {
        0 => Verbosity::Quiet,
        1 => Verbosity::Normal,
        _ => Verbosity::Verbose,
    }
}

/// Renders a fatal [`TacmirError`] to stderr, styled by category.
pub fn report_error(err: &TacmirError) {
    if verbosity() == Verbosity::Quiet {
        return;
    }
    let (category, message) = match err {
        TacmirError::Parse { message, line } => ("PARSE".to_string(), format!("line {line}: {message}")),
        TacmirError::CfgConstruction { function, message } => {
            ("CFG".to_string(), format!("function `{function}`: {message}"))
        }
        TacmirError::Evaluation { message } => ("EVAL".to_string(), message.clone()),
        TacmirError::SsaInconsistency { message } => ("SSA".to_string(), message.clone()),
        TacmirError::Unimplemented(what) => ("UNIMPLEMENTED".to_string(), (*what).to_string()),
        TacmirError::Io(e) => ("IO".to_string(), e.to_string()),
    };
    eprintln!("{} {}: {}", style("error").red().bold(), style(category).red(), style(message).yellow());
}

/// Logs a non-convergence warning: a dataflow pass hit its iteration
/// ceiling (the design §7: "Logged; pipeline continues with current state").
/// A side-channel diagnostic, never a [`TacmirError`].
pub fn warn_non_convergence(ceiling: usize) {
    if verbosity() < Verbosity::Normal {
        return;
    }
    eprintln!(
        "{} dataflow analysis did not converge within {ceiling} iterations; continuing with best-available state",
        style("warning").yellow().bold()
    );
}

/// Notes that `--ssa-period postpone` was requested and is being treated as
/// `always`,
pub fn note_ssa_period_postpone_is_always() {
    if verbosity() < Verbosity::Verbose {
        return;
    }
    eprintln!(
        "{} --ssa-period postpone has no observable effect: every pass the driver runs requires SSA",
        style("note").cyan().bold()
    );
}

/// Verbose-only progress line, used by the driver between pipeline stages.
pub fn verbose(message: &str) {
    if verbosity() == Verbosity::Verbose {
        eprintln!("{} {}", style("info").blue().bold(), message);
    }
}
