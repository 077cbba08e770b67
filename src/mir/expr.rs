// src/mir/expr.rs
//! `Expression`: the `(op, operand1, operand2)` key LCM dedups computations by.
use super::inst::MirInst;
use super::operand::Operand;
use super::operator::Operator;

/// A binary computation, keyed by operator and both operand values. Equality
/// and hashing cover exactly `(op, operand1, operand2)`, matching the design
/// §3's "hash derived from `(op, op1.value, op2.value)`" — the derive here
/// plays the role of that cached hash field, since Rust recomputes it from
/// the same fields on demand rather than storing it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expression {
    pub op: Operator,
    pub operand1: Operand,
    pub operand2: Operand,
}

impl Expression {
    #[must_use]
    pub fn new(op: Operator, operand1: Operand, operand2: Operand) -> Self {
        Self { op, operand1, operand2 }
    }

    /// Extracts the expression an instruction computes, if it computes one.
    /// Only arithmetic/comparison instructions with two live operands count;
    /// `Assign`, phis, calls and control instructions have none.
    #[must_use]
    pub fn from_inst(inst: &MirInst) -> Option<Self> {
        if !inst.op.is_expression() {
            return None;
        }
        Some(Self::new(inst.op, inst.operand1.clone(), inst.operand2.clone()))
    }

    /// Variables read by this expression, for `eKill` computation.
    pub fn operand_variables(&self) -> impl Iterator<Item = &super::variable::Variable> {
        [&self.operand1, &self.operand2].into_iter().filter_map(Operand::as_var)
    }

    /// SSA variables read by this expression (post-SSA-construction form).
    pub fn operand_ssa_variables(&self) -> impl Iterator<Item = &super::variable::SsaVariable> {
        [&self.operand1, &self.operand2].into_iter().filter_map(Operand::as_ssa)
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.operand1, self.op, self.operand2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mir::operand::Literal;
    use crate::mir::variable::Variable;

    #[test]
    fn identical_expressions_are_equal_and_hash_equal() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let a = Expression::new(Operator::Add, Operand::var(Variable::local("a")), Operand::var(Variable::local("b")));
        let b = Expression::new(Operator::Add, Operand::var(Variable::local("a")), Operand::var(Variable::local("b")));
        assert_eq!(a, b);
        let mut h1 = DefaultHasher::new();
        let mut h2 = DefaultHasher::new();
        a.hash(&mut h1);
        b.hash(&mut h2);
        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn different_operators_are_distinct_expressions() {
        let a = Expression::new(Operator::Add, Operand::literal(Literal::Int(1)), Operand::literal(Literal::Int(2)));
        let b = Expression::new(Operator::Sub, Operand::literal(Literal::Int(1)), Operand::literal(Literal::Int(2)));
        assert_ne!(a, b);
    }
}
