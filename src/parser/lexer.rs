// src/parser/lexer.rs
//! A `logos`-based lexer for the textual MIR grammar: comments and blank
//! lines stripped, operators/keywords/literals/identifiers tokenized, with
//! newlines kept as a token since the grammar is line-oriented (one
//! instruction per line, a label definition alone on its own line).
use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")]
#[logos(skip r"#[^\n]*")]
pub enum Tok {
    #[token("\n")]
    Newline,

    #[token("@function")]
    AtFunction,
    #[token("@end")]
    AtEnd,
    #[token("function")]
    KwFunction,
    #[token("%if")]
    KwIf,
    #[token("%goto")]
    KwGoto,
    #[token("%print")]
    KwPrint,
    #[token("%init")]
    KwInit,
    #[token("%entry")]
    KwEntry,
    #[token("%exit")]
    KwExit,
    #[token("%true")]
    KwTrue,
    #[token("%false")]
    KwFalse,

    #[token(":=")]
    Assign,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(":")]
    Colon,
    #[token("&")]
    Amp,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("<=")]
    Leq,
    #[token(">=")]
    Geq,
    #[token("!=")]
    Neq,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,

    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

/// One lexed token plus its source line (1-based), used for `Parse` error
/// reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tok: Tok,
    pub line: usize,
}

/// Tokenizes `source`, attaching a 1-based line number to every token.
///
/// # Errors
/// Returns `Err(line)` for the first byte sequence `logos` cannot match to
/// any token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, usize> {
    let mut line = 1usize;
    let mut out = Vec::new();
    let mut lexer = Tok::lexer(source);
    while let Some(result) = lexer.next() {
        match result {
            Ok(tok) => {
                let is_newline = tok == Tok::Newline;
                out.push(Token { tok, line });
                if is_newline {
                    line += 1;
                }
            }
            Err(()) => return Err(line),
        }
    }
    Ok(out)
}

/// Splits a token stream into lines, dropping empty lines (consecutive or
/// trailing newlines, including a leading blank line).
#[must_use]
pub fn split_lines(tokens: Vec<Token>) -> Vec<Vec<Token>> {
    let mut lines = Vec::new();
    let mut current = Vec::new();
    for tok in tokens {
        if tok.tok == Tok::Newline {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
        } else {
            current.push(tok);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
