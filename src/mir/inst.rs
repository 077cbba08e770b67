// src/mir/inst.rs
//! `MirInst`: a single three-address instruction, and `MirInsts`, an ordered
//! block-local instruction sequence with a phi/ordinary split.
use super::operand::{InstId, Operand, OperandValue};
use super::operator::Operator;
use super::variable::{SsaVariable, Variable};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Allocates the next process-wide unique instruction id. An `AtomicU64` so
/// that a parallel driver (the design §5) can mint ids from multiple function
/// pipelines without synchronizing through anything else.
#[must_use]
pub fn next_inst_id() -> InstId {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// A single three-address MIR instruction,
///
/// Operand-slot conventions by operator:
/// - `Entry` / `Exit` / `FunctionDef`: markers, all slots void (`FunctionDef`
/// additionally carries the function name in `operand1` and its parameter
/// vector in `operand2`).
/// - `Init`: `result` is the initialized variable.
/// - `Assign`: `operand1` is the source, `result` the destination.
/// - arithmetic/comparison: `operand1`/`operand2` are the operands, `result`
/// the destination.
/// - `If`: `operand1` is the condition, `operand2` is a `Ptr` to the true
/// target; the false target is the fall-through (next instruction).
/// - `Goto`: `operand1` is a `Ptr` to the target.
/// - `Phi`: `operand1` is an `Args` vector with one slot per predecessor (in
/// the block's stored predecessor order), `result` the destination.
/// - `Call` / `CallAssign`: `operand1` is a `Function` operand, `operand2`
/// an `Args` vector of arguments; `CallAssign`'s `result` is the
/// destination.
/// - `Print`: `operand1` is the printed value.
#[derive(Debug, Clone)]
pub struct MirInst {
    pub unique_id: InstId,
    pub addr: u32,
    pub offset: u32,
    pub op: Operator,
    pub operand1: Operand,
    pub operand2: Operand,
    pub result: Operand,
}

impl MirInst {
    #[must_use]
    pub fn new(op: Operator, operand1: Operand, operand2: Operand, result: Operand) -> Self {
        Self { unique_id: next_inst_id(), addr: 0, offset: 0, op, operand1, operand2, result }
    }

    #[must_use]
    pub fn marker(op: Operator) -> Self {
        Self::new(op, Operand::void(), Operand::void(), Operand::void())
    }

    #[must_use]
    pub fn assign(dest: Operand, src: Operand) -> Self {
        Self::new(Operator::Assign, src, Operand::void(), dest)
    }

    #[must_use]
    pub fn binary(op: Operator, dest: Operand, lhs: Operand, rhs: Operand) -> Self {
        debug_assert!(op.is_expression());
        Self::new(op, lhs, rhs, dest)
    }

    #[must_use]
    pub fn if_branch(cond: Operand, true_target: InstId) -> Self {
        Self::new(Operator::If, cond, Operand::ptr(true_target), Operand::void())
    }

    #[must_use]
    pub fn goto(target: InstId) -> Self {
        Self::new(Operator::Goto, Operand::ptr(target), Operand::void(), Operand::void())
    }

    #[must_use]
    pub fn phi(dest: Operand, args: Vec<Operand>) -> Self {
        Self::new(Operator::Phi, Operand::args(args), Operand::void(), dest)
    }

    #[must_use]
    pub fn init(var: Variable) -> Self {
        Self::new(Operator::Init, Operand::void(), Operand::void(), Operand::var(var))
    }

    #[must_use]
    pub fn print(value: Operand) -> Self {
        Self::new(Operator::Print, value, Operand::void(), Operand::void())
    }

    #[must_use]
    pub const fn is_assignment(&self) -> bool {
        self.op.is_assignment()
    }
    #[must_use]
    pub const fn is_arithmetic(&self) -> bool {
        self.op.is_arithmetic()
    }
    #[must_use]
    pub const fn is_phi(&self) -> bool {
        self.op.is_phi()
    }
    #[must_use]
    pub const fn is_branch(&self) -> bool {
        self.op.is_branch()
    }
    #[must_use]
    pub const fn is_jump(&self) -> bool {
        self.op.is_jump()
    }

    /// The branch target of `If`/`Goto` instructions.
    #[must_use]
    pub fn branch_target(&self) -> Option<InstId> {
        match self.op {
            Operator::Goto => self.operand1.as_ptr(),
            Operator::If => self.operand2.as_ptr(),
            _ => None,
        }
    }

    pub fn set_branch_target(&mut self, id: InstId) {
        match self.op {
            Operator::Goto => self.operand1 = Operand::ptr(id),
            Operator::If => self.operand2 = Operand::ptr(id),
            _ => {}
        }
    }

    /// The defined operand, if any (the SSA destination, post-renaming).
    #[must_use]
    pub const fn defined_operand(&self) -> Option<&Operand> {
        if self.op.is_assignment() { Some(&self.result) } else { None }
    }

    #[must_use]
    pub const fn defined_ssa(&self) -> Option<&SsaVariable> {
        match self.defined_operand() {
            Some(o) => o.as_ssa(),
            None => None,
        }
    }

    /// Phi argument slots, in the block's stored predecessor order.
    #[must_use]
    pub fn phi_args(&self) -> &[Operand] {
        debug_assert!(self.is_phi());
        self.operand1.as_args().unwrap_or(&[])
    }

    pub fn phi_args_mut(&mut self) -> &mut Vec<Operand> {
        debug_assert!(self.is_phi());
        self.operand1.as_args_mut().expect("phi operand1 must be an Args vector")
    }

    /// Visits every *used* (non-phi, non-branch-target) operand in place,
    /// recursing into `Args` vectors (call arguments). Used by SSA renaming
    /// to rewrite `Var` operands to `SsaVar`. Phi instructions have no
    /// ordinary uses: their argument slots are filled in by the
    /// predecessor-visiting step of renaming, not by visiting the phi
    /// itself, so this is a no-op for phis.
    pub fn visit_used_operands_mut(&mut self, mut f: impl FnMut(&mut Operand)) {
        if self.is_phi() {
            return;
        }
        visit_operand_mut(&mut self.operand1, &mut f);
        visit_operand_mut(&mut self.operand2, &mut f);
    }

    /// Read-only counterpart of [`Self::visit_used_operands_mut`], collecting
    /// every SSA variable used (outside phi argument slots).
    #[must_use]
    pub fn ordinary_ssa_uses(&self) -> Vec<SsaVariable> {
        if self.is_phi() {
            return Vec::new();
        }
        let mut out = Vec::new();
        collect_ssa(&self.operand1, &mut out);
        collect_ssa(&self.operand2, &mut out);
        out
    }
}

fn visit_operand_mut(op: &mut Operand, f: &mut impl FnMut(&mut Operand)) {
    match &mut op.value {
        OperandValue::Var(_) => f(op),
        OperandValue::Args(args) => {
            for a in args {
                visit_operand_mut(a, f);
            }
        }
        _ => {}
    }
}

fn collect_ssa(op: &Operand, out: &mut Vec<SsaVariable>) {
    match &op.value {
        OperandValue::SsaVar(v) => out.push(v.clone()),
        OperandValue::Args(args) => {
            for a in args {
                collect_ssa(a, out);
            }
        }
        _ => {}
    }
}

impl fmt::Display for MirInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.op {
            Operator::Entry => write!(f, "%entry"),
            Operator::Exit => write!(f, "%exit"),
            Operator::FunctionDef => write!(f, "@function {} {}", self.operand1, self.operand2),
            Operator::Init => write!(f, "%init {}", self.result),
            Operator::Print => write!(f, "%print {}", self.operand1),
            Operator::Goto => write!(f, "%goto &inst{}", self.operand1.as_ptr().unwrap_or_default()),
            Operator::If => {
                write!(f, "%if {} %goto &inst{}", self.operand1, self.operand2.as_ptr().unwrap_or_default())
            }
            Operator::Assign => write!(f, "{} := {}", self.result, self.operand1),
            Operator::Phi => {
                write!(f, "{} := phi(", self.result)?;
                for (i, a) in self.phi_args().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{a}")?;
                }
                write!(f, ")")
            }
            Operator::Call => write!(f, "{} {}", self.operand1, self.operand2),
            Operator::CallAssign => write!(f, "{} := {} {}", self.result, self.operand1, self.operand2),
            _ => write!(f, "{} := {} {} {}", self.result, self.operand1, self.op, self.operand2),
        }
    }
}

/// An ordered, block-local instruction sequence with an explicit split
/// between the leading phi prefix and the ordinary-instruction suffix.
#[derive(Debug, Clone, Default)]
pub struct MirInsts {
    insts: Vec<MirInst>,
    /// Count of leading phi instructions; invariant: equals the number of
    /// `Phi`-op instructions at the front of `insts`.
    phi_insts_idx_end: usize,
}

impl MirInsts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_ordinary(insts: Vec<MirInst>) -> Self {
        debug_assert!(insts.iter().all(|i| !i.is_phi()));
        Self { insts, phi_insts_idx_end: 0 }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.insts.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.insts.is_empty()
    }

    #[must_use]
    pub fn phis(&self) -> &[MirInst] {
        &self.insts[..self.phi_insts_idx_end]
    }
    pub fn phis_mut(&mut self) -> &mut [MirInst] {
        &mut self.insts[..self.phi_insts_idx_end]
    }

    #[must_use]
    pub fn ordinary(&self) -> &[MirInst] {
        &self.insts[self.phi_insts_idx_end..]
    }
    pub fn ordinary_mut(&mut self) -> &mut [MirInst] {
        &mut self.insts[self.phi_insts_idx_end..]
    }

    pub fn iter(&self) -> impl Iterator<Item = &MirInst> {
        self.insts.iter()
    }
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut MirInst> {
        self.insts.iter_mut()
    }

    /// Inserts a new phi at the top of the block, extending the phi prefix.
    pub fn push_phi(&mut self, phi: MirInst) {
        debug_assert!(phi.is_phi());
        self.insts.insert(self.phi_insts_idx_end, phi);
        self.phi_insts_idx_end += 1;
    }

    pub fn push_ordinary(&mut self, inst: MirInst) {
        debug_assert!(!inst.is_phi());
        self.insts.push(inst);
    }

    /// Inserts a non-phi instruction immediately after the phi prefix (used
    /// by LCM to place hoisted temporaries at the top of a block).
    pub fn insert_after_phis(&mut self, inst: MirInst) {
        debug_assert!(!inst.is_phi());
        self.insts.insert(self.phi_insts_idx_end, inst);
    }

    #[must_use]
    pub fn phi_insts_idx_end(&self) -> usize {
        self.phi_insts_idx_end
    }

    /// Looks up an instruction by its position in the full (phi-prefixed)
    /// sequence, used by passes that index instructions by `(block,
    /// position)` rather than walking `phis()`/`ordinary()` separately (the
    /// SCCP propagator and constant folder).
    #[must_use]
    pub fn get(&self, pos: usize) -> Option<&MirInst> {
        self.insts.get(pos)
    }

    pub fn get_mut(&mut self, pos: usize) -> Option<&mut MirInst> {
        self.insts.get_mut(pos)
    }
}
