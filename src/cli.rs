// src/cli.rs
//! Command-line surface: `tacmir optimize` / `tacmir analyze`, restructured
//! from the teacher's single-file-input `Args` but kept in its
//! `clap::Parser`-derive plus custom `Styles` idiom.
use crate::opt::{PipelineConfig, PreAlgorithm, SsaPeriod};
use clap::{
    Parser, Subcommand, ValueEnum, ValueHint,
    builder::{Styles, styling::{AnsiColor, Effects}},
};
use std::path::PathBuf;

const HELP_STR: &str = r#"
{before-help}{name} {version}
{author-with-newline}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}"#;

/// Custom styles for clap.
pub fn custom_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightMagenta.on_default() | Effects::BOLD)
        .error(AnsiColor::BrightRed.on_default() | Effects::BOLD)
        .valid(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .invalid(AnsiColor::BrightYellow.on_default() | Effects::BOLD | Effects::UNDERLINE)
        .placeholder(AnsiColor::BrightBlue.on_default())
        .usage(AnsiColor::BrightCyan.on_default() | Effects::BOLD | Effects::UNDERLINE)
}

/// `--pre`: which partial-redundancy-elimination family to run.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum PreArg {
    Lcm,
    Dae,
    Cse,
    None,
}

impl From<PreArg> for PreAlgorithm {
    fn from(arg: PreArg) -> Self {
        match arg {
            PreArg::Lcm => Self::Lcm,
            PreArg::Dae => Self::Dae,
            PreArg::Cse => Self::Cse,
            PreArg::None => Self::None,
        }
    }
}

/// `--ssa-period`: when to (re)build minimal SSA relative to the passes.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum SsaPeriodArg {
    Always,
    Never,
    Postpone,
}

impl From<SsaPeriodArg> for SsaPeriod {
    fn from(arg: SsaPeriodArg) -> Self {
        match arg {
            SsaPeriodArg::Always => Self::Always,
            SsaPeriodArg::Never => Self::Never,
            SsaPeriodArg::Postpone => Self::Postpone,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version = clap::crate_version!(),
    author = clap::crate_authors!("\n"),
    about,
    long_about = None,
    help_template = HELP_STR,
    styles = custom_styles()
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Runs the optimization pipeline over a textual MIR file.
    Optimize(OptimizeArgs),
    /// Prints a CFG/dominator/loop/SSA-edge summary without mutating the IR.
    Analyze(AnalyzeArgs),
}

#[derive(Parser, Debug)]
pub struct OptimizeArgs {
    /// Input MIR file.
    #[arg(short, long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Output file; stdout if omitted.
    #[arg(short, long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Runs sparse conditional constant propagation and constant folding.
    #[arg(long)]
    pub sccp: bool,

    /// Selects the partial-redundancy-elimination pass to run, if any.
    #[arg(long, value_enum, default_value_t = PreArg::None)]
    pub pre: PreArg,

    /// Controls when minimal SSA is (re)built.
    #[arg(long, value_enum, default_value_t = SsaPeriodArg::Always)]
    pub ssa_period: SsaPeriodArg,

    /// Repeatable: raises diagnostic verbosity (one step per occurrence).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Parses and runs the pipeline but does not write any output.
    #[arg(long)]
    pub dry_run: bool,
}

impl OptimizeArgs {
    #[must_use]
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig { sccp: self.sccp, pre: self.pre.into(), ssa_period: self.ssa_period.into(), ..PipelineConfig::default() }
    }
}

#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Input MIR file.
    #[arg(short, long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Repeatable: raises diagnostic verbosity (one step per occurrence).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl std::fmt::Display for PreArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Lcm => "lcm",
            Self::Dae => "dae",
            Self::Cse => "cse",
            Self::None => "none",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for SsaPeriodArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Always => "always",
            Self::Never => "never",
            Self::Postpone => "postpone",
        };
        write!(f, "{s}")
    }
}
