// src/lattice/mod.rs
//! The generic semilattice abstraction the design §2 item 2 and §9 call for:
//! a single trait implemented by every concrete value domain the dataflow
//! framework (`crate::dataflow`) is parameterised over.
pub mod constant;
pub mod exprset;
pub mod powerset;
pub mod product;

pub use constant::ConstLattice;
pub use exprset::ExprSet;
pub use powerset::DefPowerSet;
pub use product::ProductLattice;

/// A bounded semilattice: `meet` must be commutative, associative and
/// idempotent (the design §4.6), with `bottom` the identity of `meet` and
/// `top` its absorbing element.
pub trait Semilattice: Clone + PartialEq {
    fn top() -> Self;
    fn bottom() -> Self;
    #[must_use]
    fn meet(&self, other: &Self) -> Self;
    /// `self ⊑ other`.
    #[must_use]
    fn leq(&self, other: &Self) -> bool;
}
