// src/lattice/exprset.rs
//! The subset-of-expressions lattice the four Lazy Code Motion passes share,
//!'s table (`meet = ∩`).
use super::Semilattice;
use crate::mir::Expression;
use std::collections::HashSet;
use std::fmt;

/// A concrete subset of the (per-function) universe of expressions.
///
/// `bottom` is always `∅`. The lattice's true `top` is the universal set of
/// expressions in the function being analyzed, which this type cannot know
/// on its own — `Semilattice::top()` therefore returns `∅` degenerately and
/// is never relied upon operationally. Every LCM pass instead builds its
/// `init`/`safe` values explicitly from the function's computed expression
/// universe (`ExprSet::universe`) before calling
/// `crate::dataflow::DataflowAnalysis::run`, matching table
/// where `top = U` is a per-function constant, not a type-level one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExprSet(pub HashSet<Expression>);

impl ExprSet {
    #[must_use]
    pub fn empty() -> Self {
        Self(HashSet::new())
    }

    #[must_use]
    pub fn universe(all: HashSet<Expression>) -> Self {
        Self(all)
    }

    #[must_use]
    pub fn contains(&self, e: &Expression) -> bool {
        self.0.contains(e)
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self(self.0.union(&other.0).cloned().collect())
    }

    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        Self(self.0.difference(&other.0).cloned().collect())
    }

    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        Self(self.0.intersection(&other.0).cloned().collect())
    }
}

impl Semilattice for ExprSet {
    fn top() -> Self {
        Self::empty()
    }
    fn bottom() -> Self {
        Self::empty()
    }

    fn meet(&self, other: &Self) -> Self {
        self.intersection(other)
    }

    fn leq(&self, other: &Self) -> bool {
        self.0.is_subset(&other.0)
    }
}

impl fmt::Display for ExprSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{e}")?;
        }
        write!(f, "}}")
    }
}
