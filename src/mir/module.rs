// src/mir/module.rs
//! The top-level unit the driver receives: a global instruction prefix plus
//! a list of functions, "driver receives
//! `(global_insts, functions)`".
use super::inst::MirInst;
use super::variable::Variable;
use std::sync::Arc;

/// One function's flat, program-order instruction stream (post-parse,
/// pre-CFG). `Entry`/`Exit` markers bound the function.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: Arc<str>,
    pub params: Vec<Variable>,
    pub insts: Vec<MirInst>,
}

impl Function {
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, params: Vec<Variable>, insts: Vec<MirInst>) -> Self {
        Self { name: name.into(), params, insts }
    }
}

/// A parsed program: global instructions (outside any `@function` block, if
/// the grammar ever allows them) plus the function list.
#[derive(Debug, Clone, Default)]
pub struct MirModule {
    pub global_insts: Vec<MirInst>,
    pub functions: Vec<Function>,
}

impl MirModule {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
