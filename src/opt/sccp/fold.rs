// src/opt/sccp/fold.rs
//! Constant folding numeric semantics,
use crate::error::TacmirError;
use crate::mir::{Literal, Operator};
use std::cmp::Ordering;

/// Evaluates a binary operator over two literal operands.
///
/// # Errors
/// Returns [`TacmirError::Evaluation`] for integer division/modulo by zero,
/// a `NaN` comparison, or an operator/type combination the grammar does not
/// define (string or boolean arithmetic, cross-type comparison).
pub fn eval_binary(op: Operator, lhs: &Literal, rhs: &Literal) -> Result<Literal, TacmirError> {
    if op.is_bool_op() {
        return eval_comparison(op, lhs, rhs);
    }
    match (lhs, rhs) {
        (Literal::Int(a), Literal::Int(b)) => eval_int_arith(op, *a, *b),
        (Literal::Float(a), Literal::Float(b)) => Ok(eval_float_arith(op, *a, *b)),
        (Literal::Int(a), Literal::Float(b)) => Ok(eval_float_arith(op, *a as f64, *b)),
        (Literal::Float(a), Literal::Int(b)) => Ok(eval_float_arith(op, *a, *b as f64)),
        _ => Err(TacmirError::Evaluation {
                message: format!("operator {op} is not defined for operand types {lhs:?} and {rhs:?}"),
        }),
    }
}

fn eval_int_arith(op: Operator, a: i64, b: i64) -> Result<Literal, TacmirError> {
    match op {
        Operator::Add => Ok(Literal::Int(a.wrapping_add(b))),
        Operator::Sub => Ok(Literal::Int(a.wrapping_sub(b))),
        Operator::Mul => Ok(Literal::Int(a.wrapping_mul(b))),
        Operator::Div if b == 0 => {
            Err(TacmirError::Evaluation { message: "division by zero".to_string() })
        }
        Operator::Div => Ok(Literal::Int(a.wrapping_div(b))),
        Operator::Mod if b == 0 => {
            Err(TacmirError::Evaluation { message: "modulo by zero".to_string() })
        }
        Operator::Mod => Ok(Literal::Int(a.wrapping_rem(b))),
        _ => unreachable!("eval_int_arith called with a non-arithmetic operator"),
    }
}

fn eval_float_arith(op: Operator, a: f64, b: f64) -> Literal {
    match op {
        Operator::Add => Literal::Float(a + b),
        Operator::Sub => Literal::Float(a - b),
        Operator::Mul => Literal::Float(a * b),
        Operator::Div => Literal::Float(a / b),
        Operator::Mod => Literal::Float(a % b),
        _ => unreachable!("eval_float_arith called with a non-arithmetic operator"),
    }
}

fn eval_comparison(op: Operator, lhs: &Literal, rhs: &Literal) -> Result<Literal, TacmirError> {
    let ordering = match (lhs, rhs) {
        (Literal::Int(a), Literal::Int(b)) => a.cmp(b),
        (Literal::Float(a), Literal::Float(b)) => a.partial_cmp(b).ok_or_else(|| TacmirError::Evaluation {
                message: "comparison of NaN is not ordered".to_string(),
        })?,
        (Literal::Bool(a), Literal::Bool(b)) => a.cmp(b),
        (Literal::Str(a), Literal::Str(b)) => a.cmp(b),
        _ => {
            return Err(TacmirError::Evaluation {
                    message: format!("comparison requires same-type operands, got {lhs:?} and {rhs:?}"),
            });
        }
    };
    let result = match op {
        Operator::Le => ordering == Ordering::Less,
        Operator::Ge => ordering == Ordering::Greater,
        Operator::Leq => ordering != Ordering::Greater,
        Operator::Geq => ordering != Ordering::Less,
        Operator::Eq => ordering == Ordering::Equal,
        Operator::Neq => ordering != Ordering::Equal,
        _ => unreachable!("eval_comparison called with a non-comparison operator"),
    };
    Ok(Literal::Bool(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matched_int_add() {
        assert_eq!(eval_binary(Operator::Add, &Literal::Int(2), &Literal::Int(3)).unwrap(), Literal::Int(5));
    }

    #[test]
    fn mixed_int_float_widens_to_float() {
        let result = eval_binary(Operator::Mul, &Literal::Int(2), &Literal::Float(1.5)).unwrap();
        assert_eq!(result, Literal::Float(3.0));
    }

    #[test]
    fn integer_division_by_zero_is_fatal() {
        assert!(eval_binary(Operator::Div, &Literal::Int(5), &Literal::Int(0)).is_err());
    }

    #[test]
    fn float_division_by_zero_is_not_fatal() {
        let result = eval_binary(Operator::Div, &Literal::Float(5.0), &Literal::Float(0.0)).unwrap();
        assert_eq!(result, Literal::Float(f64::INFINITY));
    }

    #[test]
    fn string_arithmetic_is_rejected() {
        assert!(eval_binary(Operator::Add, &Literal::Str("a".into()), &Literal::Str("b".into())).is_err());
    }

    #[test]
    fn comparison_across_types_is_rejected() {
        assert!(eval_binary(Operator::Eq, &Literal::Int(1), &Literal::Bool(true)).is_err());
    }

    #[test]
    fn same_type_comparison_yields_bool() {
        assert_eq!(eval_binary(Operator::Leq, &Literal::Int(1), &Literal::Int(2)).unwrap(), Literal::Bool(true));
    }
}
