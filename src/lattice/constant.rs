// src/lattice/constant.rs
//! The three-state constant lattice SCCP propagates facts through.
use super::Semilattice;
use crate::mir::Literal;
use std::fmt;

/// `Top` = "undiscovered but possibly constant", `Constant(v)` = "proven to
/// always be `v`", `Bottom` = "not a compile-time constant".
#[derive(Debug, Clone, PartialEq)]
pub enum ConstLattice {
    Top,
    Constant(Literal),
    Bottom,
}

impl ConstLattice {
    #[must_use]
    pub const fn is_top(&self) -> bool {
        matches!(self, Self::Top)
    }
    #[must_use]
    pub const fn is_bottom(&self) -> bool {
        matches!(self, Self::Bottom)
    }
    #[must_use]
    pub const fn as_constant(&self) -> Option<&Literal> {
        match self {
            Self::Constant(v) => Some(v),
            _ => None,
        }
    }
}

impl Semilattice for ConstLattice {
    fn top() -> Self {
        Self::Top
    }
    fn bottom() -> Self {
        Self::Bottom
    }

    fn meet(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Bottom, _) | (_, Self::Bottom) => Self::Bottom,
            (Self::Top, x) => x.clone(),
            (x, Self::Top) => x.clone(),
            (Self::Constant(a), Self::Constant(b)) => {
                if a == b { self.clone() } else { Self::Bottom }
            }
        }
    }

    fn leq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bottom, _) => true,
            (_, Self::Top) => true,
            (Self::Constant(a), Self::Constant(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for ConstLattice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => write!(f, "TOP"),
            Self::Bottom => write!(f, "BOTTOM"),
            Self::Constant(v) => write!(f, "CONST({v})"),
        }
    }
}
