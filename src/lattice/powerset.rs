// src/lattice/powerset.rs
//! Power-set-of-definition-points lattice for a single variable, the base
//! component of the reaching-definitions product lattice (the design §2 item
//! 2, §9 "Lattice variants"). A "may" analysis: joining at a merge point is
//! the union of reaching definition sets, not their intersection.
use super::Semilattice;
use crate::mir::InstId;
use std::collections::BTreeSet;
use std::fmt;

/// The set of instruction ids that may define a given variable and reach the
/// current program point.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DefPowerSet(pub BTreeSet<InstId>);

impl DefPowerSet {
    #[must_use]
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    #[must_use]
    pub fn singleton(id: InstId) -> Self {
        Self(BTreeSet::from([id]))
    }

    #[must_use]
    pub fn contains(&self, id: InstId) -> bool {
        self.0.contains(&id)
    }

    /// Removes every definition of the variable this set is keyed by except
    /// `keep`, used when a new definition kills prior reaching ones.
    #[must_use]
    pub fn killed_by(&self, keep: InstId) -> Self {
        Self(BTreeSet::from([keep]))
    }
}

impl Semilattice for DefPowerSet {
    /// Degenerate: the true top (every definition of the variable in the
    /// program) depends on the function being analyzed, exactly as
    /// [`super::ExprSet::top`] does; analyses build it explicitly instead.
    fn top() -> Self {
        Self::empty()
    }
    fn bottom() -> Self {
        Self::empty()
    }

    fn meet(&self, other: &Self) -> Self {
        Self(self.0.union(&other.0).copied().collect())
    }

    fn leq(&self, other: &Self) -> bool {
        self.0.is_subset(&other.0)
    }
}

impl fmt::Display for DefPowerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "inst{id}")?;
        }
        write!(f, "}}")
    }
}
