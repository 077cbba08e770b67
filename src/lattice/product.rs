// src/lattice/product.rs
//! The per-variable product of [`super::powerset::DefPowerSet`]s: a reaching
//! definitions lattice keyed by variable name, with pointwise meet
//! (the design §9: "Meet of the product lattice is pointwise").
use super::powerset::DefPowerSet;
use super::Semilattice;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A tuple of [`DefPowerSet`]s indexed by variable name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductLattice(pub BTreeMap<Arc<str>, DefPowerSet>);

impl ProductLattice {
    #[must_use]
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    #[must_use]
    pub fn get(&self, var: &str) -> DefPowerSet {
        self.0.get(var).cloned().unwrap_or_default()
    }

    pub fn set(&mut self, var: impl Into<Arc<str>>, defs: DefPowerSet) {
        self.0.insert(var.into(), defs);
    }
}

impl Semilattice for ProductLattice {
    fn top() -> Self {
        Self::empty()
    }
    fn bottom() -> Self {
        Self::empty()
    }

    fn meet(&self, other: &Self) -> Self {
        let mut out = self.clone();
        for (var, defs) in &other.0 {
            let merged = out.get(var).meet(defs);
            out.set(var.clone(), merged);
        }
        out
    }

    fn leq(&self, other: &Self) -> bool {
        self.0.iter().all(|(var, defs)| defs.leq(&other.get(var)))
    }
}

impl fmt::Display for ProductLattice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (var, defs)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{var}: {defs}")?;
        }
        write!(f, "}}")
    }
}
