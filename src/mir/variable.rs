// src/mir/variable.rs
//! Variables and SSA variables.
use std::fmt;
use std::sync::Arc;

/// Naming prefix for temporaries synthesized by Lazy Code Motion.
pub const LCM_TMP_PREFIX: &str = "__lcm_";

/// The storage class of a [`Variable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableScope {
    Global,
    Local,
}

impl fmt::Display for VariableScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// A source-level (pre-SSA) variable: name, scope and whether the compiler
/// synthesized it (e.g. an LCM temporary),
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable {
    pub name: Arc<str>,
    pub scope: VariableScope,
    pub compiler_generated: bool,
}

impl Variable {
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, scope: VariableScope, compiler_generated: bool) -> Self {
        Self { name: name.into(), scope, compiler_generated }
    }

    #[must_use]
    pub fn local(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, VariableScope::Local, false)
    }

    #[must_use]
    pub fn global(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, VariableScope::Global, false)
    }

    /// Builds a fresh compiler-generated local variable with the given prefix
    /// and ordinal, used by LCM temporaries.
    #[must_use]
    pub fn synthetic(prefix: &str, ordinal: u64) -> Self {
        Self::new(format!("{prefix}{ordinal}"), VariableScope::Local, true)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A name in minimal SSA form: an original [`Variable`] plus a version.
///
/// Version `-1` denotes an unversioned placeholder (a phi result or use
/// that has not yet been assigned a version during renaming).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SsaVariable {
    pub base: Variable,
    pub version: i64,
}

impl SsaVariable {
    pub const UNVERSIONED: i64 = -1;

    #[must_use]
    pub fn new(base: Variable, version: i64) -> Self {
        Self { base, version }
    }

    #[must_use]
    pub fn placeholder(base: Variable) -> Self {
        Self::new(base, Self::UNVERSIONED)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.base.name
    }
}

impl fmt::Display for SsaVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.base.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variable_equality_is_over_all_fields() {
        let a = Variable::new("x", VariableScope::Local, false);
        let b = Variable::new("x", VariableScope::Global, false);
        assert_ne!(a, b);
    }

    #[test]
    fn ssa_variable_displays_name_hash_version() {
        let v = SsaVariable::new(Variable::local("x"), 3);
        assert_eq!(v.to_string(), "x#3");
    }

    #[test]
    fn unversioned_placeholder_prints_minus_one() {
        let v = SsaVariable::placeholder(Variable::local("y"));
        assert_eq!(v.to_string(), "y#-1");
    }
}
