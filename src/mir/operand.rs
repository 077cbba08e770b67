// src/mir/operand.rs
//! Operands: the tagged `(OperandType, value)` pairs MIR instructions carry.
use super::variable::{SsaVariable, Variable};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// The unique, process-wide identity of a [`super::inst::MirInst`]; branch
/// targets and other instruction references use this, never an address.
pub type InstId = u64;

/// The tag half of an [`Operand`],
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandType {
    Void,
    Var,
    SsaVar,
    Bool,
    Int,
    Float,
    Str,
    Ptr,
    Args,
    Function,
    Unknown,
}

impl OperandType {
    #[must_use]
    pub const fn is_const(self) -> bool {
        matches!(self, Self::Bool | Self::Int | Self::Float | Self::Str)
    }
}

/// A literal constant value. Equality/hashing is manual because `f64` does
/// not implement `Eq`/`Hash`; floats compare and hash by bit pattern, which
/// is what `Expression`'s "(op, op1.value, op2.value)" hash (the design §3)
/// needs for a `HashSet<Expression>` universe in LCM.
#[derive(Debug, Clone)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
}

impl Literal {
    #[must_use]
    pub const fn operand_type(&self) -> OperandType {
        match self {
            Self::Bool(_) => OperandType::Bool,
            Self::Int(_) => OperandType::Int,
            Self::Float(_) => OperandType::Float,
            Self::Str(_) => OperandType::Str,
        }
    }

    /// Per the design §3: only `Bool(false)` is false; every other value
    /// (including `0` and `""`) is true.
    #[must_use]
    pub fn is_true(&self) -> bool {
        !matches!(self, Self::Bool(false))
    }
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            _ => false,
        }
    }
}
impl Eq for Literal {}

impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Bool(b) => b.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Float(f) => f.to_bits().hash(state),
            Self::Str(s) => s.hash(state),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => write!(f, "%true"),
            Self::Bool(false) => write!(f, "%false"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

/// The value half of an [`Operand`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperandValue {
    Void,
    Var(Variable),
    SsaVar(SsaVariable),
    Literal(Literal),
    /// References another instruction by `unique_id` (a branch target, or a
    /// phi source that still needs SSA renaming).
    Ptr(InstId),
    Args(Vec<Operand>),
    Function(Arc<str>),
}

/// A tagged `(OperandType, value)` pair,
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Operand {
    pub ty: OperandType,
    pub value: OperandValue,
}

impl Operand {
    #[must_use]
    pub const fn void() -> Self {
        Self { ty: OperandType::Void, value: OperandValue::Void }
    }

    #[must_use]
    pub fn var(v: Variable) -> Self {
        Self { ty: OperandType::Var, value: OperandValue::Var(v) }
    }

    #[must_use]
    pub fn ssa_var(v: SsaVariable) -> Self {
        Self { ty: OperandType::SsaVar, value: OperandValue::SsaVar(v) }
    }

    #[must_use]
    pub fn literal(lit: Literal) -> Self {
        Self { ty: lit.operand_type(), value: OperandValue::Literal(lit) }
    }

    #[must_use]
    pub fn ptr(id: InstId) -> Self {
        Self { ty: OperandType::Ptr, value: OperandValue::Ptr(id) }
    }

    #[must_use]
    pub fn args(items: Vec<Self>) -> Self {
        Self { ty: OperandType::Args, value: OperandValue::Args(items) }
    }

    #[must_use]
    pub fn function(name: impl Into<Arc<str>>) -> Self {
        Self { ty: OperandType::Function, value: OperandValue::Function(name.into()) }
    }

    #[must_use]
    pub const fn is_void(&self) -> bool {
        matches!(self.ty, OperandType::Void)
    }

    #[must_use]
    pub const fn as_ptr(&self) -> Option<InstId> {
        match self.value {
            OperandValue::Ptr(id) => Some(id),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_ssa(&self) -> Option<&SsaVariable> {
        match &self.value {
            OperandValue::SsaVar(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_var(&self) -> Option<&Variable> {
        match &self.value {
            OperandValue::Var(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_literal(&self) -> Option<&Literal> {
        match &self.value {
            OperandValue::Literal(l) => Some(l),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_args(&self) -> Option<&[Self]> {
        match &self.value {
            OperandValue::Args(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_args_mut(&mut self) -> Option<&mut Vec<Self>> {
        match &mut self.value {
            OperandValue::Args(v) => Some(v),
            _ => None,
        }
    }

    /// Truthiness: only a literal `false` is false; any
    /// non-literal operand (variable, pointer, ...) is treated as true since
    /// its concrete value is not statically known here.
    #[must_use]
    pub fn is_true(&self) -> bool {
        self.as_literal().is_none_or(Literal::is_true)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            OperandValue::Void => write!(f, ""),
            OperandValue::Var(v) => write!(f, "{v}"),
            OperandValue::SsaVar(v) => write!(f, "{v}"),
            OperandValue::Literal(l) => write!(f, "{l}"),
            OperandValue::Ptr(id) => write!(f, "&inst{id}"),
            OperandValue::Function(name) => write!(f, "{name}"),
            OperandValue::Args(args) => {
                write!(f, "(")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{a}")?;
                }
                write!(f, ")")
            }
        }
    }
}
