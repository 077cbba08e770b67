// src/parser/parser.rs
//! A hand-written recursive-descent parser over the line-grouped MIR token
//! stream, producing an [`MirModule`]. Label references are resolved in a
//! second pass once every label in the enclosing segment (a function body,
//! or the top-level global prefix) has been seen, since a branch may jump
//! forward to a label not yet parsed.
use super::lexer::{Tok, Token};
use crate::error::TacmirError;
use crate::mir::{Literal, MirInst, MirModule, Operand, Operator, Variable};
use std::collections::HashMap;

/// Parses a complete MIR source text into a [`MirModule`].
///
/// # Errors
/// Returns [`TacmirError::Parse`] for an unrecognised token, an unknown
/// label reference, or a line that does not match any instruction shape.
pub fn parse(source: &str) -> Result<MirModule, TacmirError> {
    let tokens = super::lexer::tokenize(source)
        .map_err(|line| TacmirError::Parse { message: "unrecognised token".to_string(), line })?;
    let lines = super::lexer::split_lines(tokens);

    let mut module = MirModule::new();
    let mut segment = Segment::new();

    let mut lines = lines.into_iter().peekable();
    while let Some(line) = lines.next() {
        if let Some(name) = label_def(&line) {
            segment.pending_labels.push(name);
            continue;
        }

        let first = &line[0].tok;
        if *first == Tok::AtFunction {
            let (name, params) = parse_function_header(&line)?;
            segment.resolve(&mut module.global_insts)?;
            segment = Segment::new();
            segment.function = Some((name, params));
            continue;
        }
        if *first == Tok::AtEnd {
            expect_kw_function(&line)?;
            let Some((name, params)) = segment.function.take() else {
                return Err(TacmirError::Parse {
                    message: "`@end function` with no open `@function` block".to_string(),
                    line: line[0].line,
                });
            };
            let mut insts = Vec::new();
            segment.resolve(&mut insts)?;
            module.functions.push(crate::mir::Function::new(name, params, insts));
            segment = Segment::new();
            continue;
        }

        let (inst, target_label) = parse_instruction(&line)?;
        let idx = segment.insts.len();
        segment.insts.push(inst);
        if !segment.pending_labels.is_empty() {
            let id = segment.insts[idx].unique_id;
            for label in segment.pending_labels.drain(..) {
                segment.labels.insert(label, id);
            }
        }
        if let Some(label) = target_label {
            segment.unresolved.push((idx, label, line[0].line));
        }
    }

    if segment.function.is_some() {
        return Err(TacmirError::Parse { message: "unterminated `@function` block".to_string(), line: 0 });
    }
    segment.resolve(&mut module.global_insts)?;

    Ok(module)
}

/// One open lexical scope for label resolution: either the top-level
/// global prefix, or the body of the `@function` block currently being
/// parsed.
struct Segment {
    function: Option<(String, Vec<Variable>)>,
    insts: Vec<MirInst>,
    labels: HashMap<String, u64>,
    pending_labels: Vec<String>,
    /// `(instruction index, label name, source line)` awaiting resolution.
    unresolved: Vec<(usize, String, usize)>,
}

impl Segment {
    fn new() -> Self {
        Self {
            function: None,
            insts: Vec::new(),
            labels: HashMap::new(),
            pending_labels: Vec::new(),
            unresolved: Vec::new(),
        }
    }

    /// Resolves every pending branch/jump target against this segment's
    /// label map and drains `self.insts` into `out`.
    fn resolve(&mut self, out: &mut Vec<MirInst>) -> Result<(), TacmirError> {
        for (idx, label, line) in self.unresolved.drain(..) {
            let target = self.labels.get(&label).copied().ok_or_else(|| TacmirError::Parse {
                message: format!("unknown label `{label}`"),
                line,
            })?;
            self.insts[idx].set_branch_target(target);
        }
        out.append(&mut self.insts);
        Ok(())
    }
}

fn label_def(line: &[Token]) -> Option<String> {
    if let [Token { tok: Tok::Ident(name), .. }, Token { tok: Tok::Colon, .. }] = line {
        Some(name.clone())
    } else {
        None
    }
}

fn expect_kw_function(line: &[Token]) -> Result<(), TacmirError> {
    match line.get(1).map(|t| &t.tok) {
        Some(Tok::KwFunction) => Ok(()),
        _ => Err(TacmirError::Parse { message: "expected `function` after `@end`".to_string(), line: line[0].line }),
    }
}

fn parse_function_header(line: &[Token]) -> Result<(String, Vec<Variable>), TacmirError> {
    let line_no = line[0].line;
    let name = match line.get(1).map(|t| &t.tok) {
        Some(Tok::Ident(n)) => n.clone(),
        _ => return Err(TacmirError::Parse { message: "expected function name after `@function`".to_string(), line: line_no }),
    };
    match line.get(2).map(|t| &t.tok) {
        Some(Tok::LParen) => {}
        _ => return Err(TacmirError::Parse { message: "expected `(` after function name".to_string(), line: line_no }),
    }
    let mut params = Vec::new();
    let mut i = 3;
    loop {
        match line.get(i).map(|t| &t.tok) {
            Some(Tok::RParen) => break,
            Some(Tok::Ident(p)) => {
                params.push(Variable::local(p.clone()));
                i += 1;
            }
            _ => return Err(TacmirError::Parse { message: "expected parameter name or `)`".to_string(), line: line_no }),
        }
    }
    Ok((name, params))
}

fn binary_op(tok: &Tok) -> Option<Operator> {
    Some(match tok {
        Tok::Plus => Operator::Add,
        Tok::Minus => Operator::Sub,
        Tok::Star => Operator::Mul,
        Tok::Slash => Operator::Div,
        Tok::Percent => Operator::Mod,
        Tok::Lt => Operator::Le,
        Tok::Gt => Operator::Ge,
        Tok::Leq => Operator::Leq,
        Tok::Geq => Operator::Geq,
        Tok::Eq => Operator::Eq,
        Tok::Neq => Operator::Neq,
        _ => return None,
    })
}

fn parse_value(tok: &Tok, line_no: usize) -> Result<Operand, TacmirError> {
    match tok {
        Tok::Ident(name) => Ok(Operand::var(Variable::local(name.clone()))),
        Tok::Int(i) => Ok(Operand::literal(Literal::Int(*i))),
        Tok::Float(f) => Ok(Operand::literal(Literal::Float(*f))),
        Tok::KwTrue => Ok(Operand::literal(Literal::Bool(true))),
        Tok::KwFalse => Ok(Operand::literal(Literal::Bool(false))),
        _ => Err(TacmirError::Parse { message: format!("expected a value, found {tok:?}"), line: line_no }),
    }
}

fn parse_label_ref(line: &[Token], i: usize) -> Result<String, TacmirError> {
    let line_no = line.first().map_or(0, |t| t.line);
    match (line.get(i).map(|t| &t.tok), line.get(i + 1).map(|t| &t.tok)) {
        (Some(Tok::Amp), Some(Tok::Ident(name))) => Ok(name.clone()),
        _ => Err(TacmirError::Parse { message: "expected a label reference `&ident`".to_string(), line: line_no }),
    }
}

fn parse_args(line: &[Token], start: usize, line_no: usize) -> Result<Vec<Operand>, TacmirError> {
    if line.get(start).map(|t| &t.tok) != Some(&Tok::LParen) {
        return Err(TacmirError::Parse { message: "expected `(` to start an argument list".to_string(), line: line_no });
    }
    let mut args = Vec::new();
    let mut i = start + 1;
    loop {
        match line.get(i).map(|t| &t.tok) {
            Some(Tok::RParen) => {
                if i + 1 != line.len() {
                    return Err(TacmirError::Parse { message: "trailing tokens after `)`".to_string(), line: line_no });
                }
                break;
            }
            Some(other) => {
                args.push(parse_value(other, line_no)?);
                i += 1;
            }
            None => return Err(TacmirError::Parse { message: "unterminated argument list".to_string(), line: line_no }),
        }
    }
    Ok(args)
}

/// Parses one instruction line. Returns the instruction plus an optional
/// pending label name (for `If`/`Goto`, whose target is filled in once the
/// segment's label map is complete).
fn parse_instruction(line: &[Token]) -> Result<(MirInst, Option<String>), TacmirError> {
    let line_no = line[0].line;
    match &line[0].tok {
        Tok::KwEntry => Ok((MirInst::marker(Operator::Entry), None)),
        Tok::KwExit => Ok((MirInst::marker(Operator::Exit), None)),
        Tok::KwInit => {
            let Tok::Ident(name) = &line.get(1).ok_or_else(|| TacmirError::Parse {
                message: "expected a variable after `%init`".to_string(),
                line: line_no,
            })?.tok else {
                return Err(TacmirError::Parse { message: "`%init` requires a variable name".to_string(), line: line_no });
            };
            Ok((MirInst::init(Variable::local(name.clone())), None))
        }
        Tok::KwPrint => {
            let value = parse_value(&line.get(1).ok_or_else(|| TacmirError::Parse {
                message: "expected a value after `%print`".to_string(),
                line: line_no,
            })?.tok, line_no)?;
            Ok((MirInst::print(value), None))
        }
        Tok::KwGoto => {
            let label = parse_label_ref(line, 1)?;
            Ok((MirInst::goto(0), Some(label)))
        }
        Tok::KwIf => {
            let cond = parse_value(&line.get(1).ok_or_else(|| TacmirError::Parse {
                message: "expected a condition after `%if`".to_string(),
                line: line_no,
            })?.tok, line_no)?;
            if line.get(2).map(|t| &t.tok) != Some(&Tok::KwGoto) {
                return Err(TacmirError::Parse { message: "expected `%goto` after the `%if` condition".to_string(), line: line_no });
            }
            let label = parse_label_ref(line, 3)?;
            Ok((MirInst::if_branch(cond, 0), Some(label)))
        }
        Tok::Ident(first_name) => {
            if line.get(1).map(|t| &t.tok) == Some(&Tok::LParen) {
                // `f ( a1 a2 ... )` — a bare call.
                let args = parse_args(line, 1, line_no)?;
                return Ok((
                    MirInst::new(Operator::Call, Operand::function(first_name.clone()), Operand::args(args), Operand::void()),
                    None,
                ));
            }
            if line.get(1).map(|t| &t.tok) != Some(&Tok::Assign) {
                return Err(TacmirError::Parse { message: format!("unrecognised instruction starting with `{first_name}`"), line: line_no });
            }
            let dest = Variable::local(first_name.clone());
            match line.get(2).map(|t| &t.tok) {
                Some(Tok::Ident(callee)) if line.get(3).map(|t| &t.tok) == Some(&Tok::LParen) => {
                    let args = parse_args(line, 3, line_no)?;
                    Ok((
                        MirInst::new(
                            Operator::CallAssign,
                            Operand::function(callee.clone()),
                            Operand::args(args),
                            Operand::var(dest),
                        ),
                        None,
                    ))
                }
                Some(operand1_tok) => {
                    let operand1 = parse_value(operand1_tok, line_no)?;
                    match line.get(3).map(|t| &t.tok) {
                        None => Ok((MirInst::assign(Operand::var(dest), operand1), None)),
                        Some(op_tok) => {
                            let op = binary_op(op_tok).ok_or_else(|| TacmirError::Parse {
                                message: format!("expected a binary operator, found {op_tok:?}"),
                                line: line_no,
                            })?;
                            let operand2_tok = &line.get(4).ok_or_else(|| TacmirError::Parse {
                                message: "expected a right-hand operand".to_string(),
                                line: line_no,
                            })?.tok;
                            let operand2 = parse_value(operand2_tok, line_no)?;
                            Ok((MirInst::binary(op, Operand::var(dest), operand1, operand2), None))
                        }
                    }
                }
                None => Err(TacmirError::Parse { message: "expected a value after `:=`".to_string(), line: line_no }),
            }
        }
        other => Err(TacmirError::Parse { message: format!("unrecognised instruction, starts with {other:?}"), line: line_no }),
    }
}
