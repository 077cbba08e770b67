// src/printer.rs
//! Re-emits a [`MirModule`] in the same textual form the parser accepts,
//! prefixed with each instruction's `[addr:NNNN]`. Addresses are read, never
//! computed: the driver's address-reassignment pass
//! (`opt::reassign_addresses`) must run first.
use crate::mir::{Function, MirInst, MirModule, Operand, OperandValue, Operator};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Renders every function (plus any global prefix) in `module` to the
/// textual MIR form, in declaration order.
#[must_use]
pub fn print_module(module: &MirModule) -> String {
    let addr_by_id = address_index(module);
    let mut out = String::new();
    if !module.global_insts.is_empty() {
        for inst in &module.global_insts {
            print_inst(&mut out, inst, &addr_by_id, 0);
        }
    }
    for function in &module.functions {
        print_function(&mut out, function, &addr_by_id);
    }
    out
}

fn address_index(module: &MirModule) -> HashMap<u64, u32> {
    let mut map = HashMap::new();
    for inst in &module.global_insts {
        map.insert(inst.unique_id, inst.addr);
    }
    for function in &module.functions {
        for inst in &function.insts {
            map.insert(inst.unique_id, inst.addr);
        }
    }
    map
}

fn print_function(out: &mut String, function: &Function, addr_by_id: &HashMap<u64, u32>) {
    let params = function.params.iter().map(|p| p.name.as_ref()).collect::<Vec<_>>().join(" ");
    let _ = writeln!(out, "@function {} ( {} )", function.name, params);
    for inst in &function.insts {
        print_inst(out, inst, addr_by_id, 1);
    }
    let _ = writeln!(out, "@end function");
}

fn print_inst(out: &mut String, inst: &MirInst, addr_by_id: &HashMap<u64, u32>, indent: usize) {
    for _ in 0..indent {
        out.push('\t');
    }
    let _ = write!(out, "[addr:{:04}] ", inst.addr);
    let _ = writeln!(out, "{}", render(inst, addr_by_id));
}

/// Renders one instruction's body (no address prefix, no indentation),
/// resolving `Ptr` operands to the pointee's current address rather than
/// `MirInst`'s own `Display`, which renders them by `unique_id`.
fn render(inst: &MirInst, addr_by_id: &HashMap<u64, u32>) -> String {
    match inst.op {
        Operator::Entry => "%entry".to_string(),
        Operator::Exit => "%exit".to_string(),
        Operator::Init => format!("%init {}", inst.result),
        Operator::Print => format!("%print {}", render_operand(&inst.operand1, addr_by_id)),
        Operator::Goto => format!("%goto &{}", resolve_target(&inst.operand1, addr_by_id)),
        Operator::If => {
            format!(
                "%if {} %goto &{}",
                render_operand(&inst.operand1, addr_by_id),
                resolve_target(&inst.operand2, addr_by_id)
            )
        }
        Operator::Assign => format!("{} := {}", inst.result, render_operand(&inst.operand1, addr_by_id)),
        Operator::Phi => {
            let args = inst.phi_args().iter().map(|a| render_operand(a, addr_by_id)).collect::<Vec<_>>().join(", ");
            format!("{} := phi({args})", inst.result)
        }
        Operator::Call => format!("{} {}", inst.operand1, render_operand(&inst.operand2, addr_by_id)),
        Operator::CallAssign => {
            format!("{} := {} {}", inst.result, inst.operand1, render_operand(&inst.operand2, addr_by_id))
        }
        _ => format!(
            "{} := {} {} {}",
            inst.result,
            render_operand(&inst.operand1, addr_by_id),
            inst.op,
            render_operand(&inst.operand2, addr_by_id)
        ),
    }
}

fn render_operand(op: &Operand, addr_by_id: &HashMap<u64, u32>) -> String {
    match &op.value {
        OperandValue::Args(items) => {
            let rendered = items.iter().map(|a| render_operand(a, addr_by_id)).collect::<Vec<_>>().join(" ");
            format!("({rendered})")
        }
        OperandValue::Ptr(_) => format!("&{}", resolve_target(op, addr_by_id)),
        _ => op.to_string(),
    }
}

fn resolve_target(op: &Operand, addr_by_id: &HashMap<u64, u32>) -> String {
    match op.as_ptr() {
        Some(id) => match addr_by_id.get(&id) {
            Some(addr) => format!("inst{addr:04}"),
            None => format!("inst{id}"),
        },
        None => "?".to_string(),
    }
}
