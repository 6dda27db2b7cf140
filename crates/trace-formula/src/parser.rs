//! Placeholder extraction and expression parsing.
//!
//! Parsing is a hand-written tokenizer feeding a recursive-descent parser.
//! Operator precedence, loosest first:
//!
//! | level | operators |
//! |---|---|
//! | or | `or` |
//! | and | `and` |
//! | not | `not` (prefix) |
//! | comparison | `< <= > >= == !=` (chainable) |
//! | sum | `+ -` |
//! | term | `* / %` |
//! | unary | `-x`, `+x` |
//! | power | `**` (right associative) |

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::engine;
use crate::types::{BinaryOp, Expr, FormulaError, Function, UnaryOp};

/// Prefix that marks a series as a formula.
pub const FORMULA_PREFIX: &str = "f://";

/// Returns `true` if `text` is formula text (starts with `f://`).
pub fn is_formula(text: &str) -> bool {
    text.starts_with(FORMULA_PREFIX)
}

/// Strip the `f://` prefix, returning the bare expression.
pub fn strip_prefix(text: &str) -> Result<&str, FormulaError> {
    text.strip_prefix(FORMULA_PREFIX)
        .ok_or(FormulaError::MissingPrefix {
            prefix: FORMULA_PREFIX,
        })
}

/// Extract every `{name}` placeholder from `text`, in order of appearance.
///
/// Duplicates are kept. A placeholder name is the shortest non-empty run of
/// characters (newlines excluded) followed by `}`, so `{}}` yields `}`.
pub fn extract_variables(text: &str) -> Vec<String> {
    let mut vars = Vec::new();
    let mut i = 0;
    while let Some(rel) = text[i..].find('{') {
        let open = i + rel;
        match placeholder_end(text, open) {
            Some(close) => {
                vars.push(text[open + 1..close].to_string());
                i = close + 1;
            }
            None => i = open + 1,
        }
    }
    vars
}

/// Given the byte offset of a `{`, return the offset of the `}` closing the
/// placeholder, or `None` if no placeholder starts here.
fn placeholder_end(text: &str, open: usize) -> Option<usize> {
    let mut chars = text[open + 1..].char_indices();
    // The first character always belongs to the name, even if it is `}`.
    let (_, first) = chars.next()?;
    if first == '\n' {
        return None;
    }
    for (off, c) in chars {
        match c {
            '}' => return Some(open + 1 + off),
            '\n' => return None,
            _ => {}
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Formula
// ---------------------------------------------------------------------------

/// A parsed `f://` formula.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    text: String,
    expr: Expr,
}

impl Formula {
    /// Parse full formula text, including the `f://` prefix.
    pub fn parse(text: &str) -> Result<Self, FormulaError> {
        let body = strip_prefix(text)?;
        let expr = parse_expression(body)?;
        Ok(Self {
            text: text.to_string(),
            expr,
        })
    }

    /// Full text as written, prefix included.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The expression without its prefix.
    pub fn body(&self) -> &str {
        &self.text[FORMULA_PREFIX.len()..]
    }

    /// Parsed expression tree.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Placeholder names in order of appearance (duplicates kept).
    pub fn variables(&self) -> Vec<String> {
        extract_variables(&self.text)
    }

    /// Evaluate against sample values keyed by placeholder name.
    pub fn evaluate(&self, env: &HashMap<String, f64>) -> Result<f64, FormulaError> {
        engine::evaluate(&self.expr, env)
    }
}

impl FromStr for Formula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Formula::parse(s)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Parse a bare expression (no `f://` prefix) into an AST.
pub fn parse_expression(source: &str) -> Result<Expr, FormulaError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    match parser.peek() {
        Token::End => Ok(expr),
        other => Err(FormulaError::syntax(
            parser.offset(),
            format!("unexpected {}", other.describe()),
        )),
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Variable(String),
    Ident(String),
    Op(&'static str),
    LParen,
    RParen,
    Comma,
    End,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::Variable(v) => format!("placeholder {{{}}}", v),
            Token::Ident(s) => format!("name '{}'", s),
            Token::Op(op) => format!("operator '{}'", op),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Comma => "','".to_string(),
            Token::End => "end of expression".to_string(),
        }
    }
}

/// Two-character operators must be tried before their one-character prefixes.
const OPERATORS: [&str; 12] = ["**", "<=", ">=", "==", "!=", "+", "-", "*", "/", "%", "<", ">"];

fn tokenize(source: &str) -> Result<Vec<(Token, usize)>, FormulaError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    'outer: while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        match b {
            b'(' => {
                tokens.push((Token::LParen, i));
                i += 1;
            }
            b')' => {
                tokens.push((Token::RParen, i));
                i += 1;
            }
            b',' => {
                tokens.push((Token::Comma, i));
                i += 1;
            }
            b'{' => {
                let close = placeholder_end(source, i)
                    .ok_or_else(|| FormulaError::syntax(i, "unterminated placeholder"))?;
                tokens.push((Token::Variable(source[i + 1..close].to_string()), i));
                i = close + 1;
            }
            b'0'..=b'9' | b'.' => {
                let end = scan_number(bytes, i);
                let literal = &source[i..end];
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| FormulaError::syntax(i, format!("invalid number '{}'", literal)))?;
                tokens.push((Token::Number(value), i));
                i = end;
            }
            b if is_ident_start(b) => {
                let mut end = i + 1;
                while end < bytes.len() && is_ident_cont(bytes[end]) {
                    end += 1;
                }
                tokens.push((Token::Ident(source[i..end].to_string()), i));
                i = end;
            }
            _ => {
                for op in OPERATORS {
                    if source[i..].starts_with(op) {
                        tokens.push((Token::Op(op), i));
                        i += op.len();
                        continue 'outer;
                    }
                }
                let c = source[i..].chars().next().unwrap_or('?');
                return Err(FormulaError::syntax(i, format!("unexpected character '{}'", c)));
            }
        }
    }

    tokens.push((Token::End, source.len()));
    Ok(tokens)
}

/// Scan a numeric literal: digits, optional fraction, optional exponent.
fn scan_number(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp = end + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        if exp < bytes.len() && bytes[exp].is_ascii_digit() {
            while exp < bytes.len() && bytes[exp].is_ascii_digit() {
                exp += 1;
            }
            end = exp;
        }
    }
    end
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_cont(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

// ---------------------------------------------------------------------------
// Recursive-descent parser
// ---------------------------------------------------------------------------

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos].0
    }

    fn offset(&self) -> usize {
        self.tokens[self.pos].1
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].0.clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if matches!(self.peek(), Token::Op(o) if *o == op) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        if matches!(self.peek(), Token::Ident(s) if s == kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, want: Token) -> Result<(), FormulaError> {
        if *self.peek() == want {
            self.advance();
            Ok(())
        } else {
            Err(FormulaError::syntax(
                self.offset(),
                format!("expected {}, found {}", want.describe(), self.peek().describe()),
            ))
        }
    }

    fn parse_or(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.parse_and()?;
        while self.eat_keyword("or") {
            let rhs = self.parse_and()?;
            lhs = binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.parse_not()?;
        while self.eat_keyword("and") {
            let rhs = self.parse_not()?;
            lhs = binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expr, FormulaError> {
        if self.eat_keyword("not") {
            let operand = self.parse_not()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    /// `a < b < c` means `a < b and b < c`.
    fn parse_comparison(&mut self) -> Result<Expr, FormulaError> {
        let first = self.parse_sum()?;
        let mut links: Vec<Expr> = Vec::new();
        let mut lhs = first.clone();
        while let Some(op) = self.comparison_op() {
            let rhs = self.parse_sum()?;
            links.push(binary(op, lhs, rhs.clone()));
            lhs = rhs;
        }
        let mut iter = links.into_iter();
        match iter.next() {
            None => Ok(first),
            Some(head) => Ok(iter.fold(head, |acc, next| binary(BinaryOp::And, acc, next))),
        }
    }

    fn comparison_op(&mut self) -> Option<BinaryOp> {
        let op = match self.peek() {
            Token::Op("<") => BinaryOp::Lt,
            Token::Op("<=") => BinaryOp::Le,
            Token::Op(">") => BinaryOp::Gt,
            Token::Op(">=") => BinaryOp::Ge,
            Token::Op("==") => BinaryOp::Eq,
            Token::Op("!=") => BinaryOp::Ne,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn parse_sum(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = if self.eat_op("+") {
                BinaryOp::Add
            } else if self.eat_op("-") {
                BinaryOp::Sub
            } else {
                break;
            };
            let rhs = self.parse_term()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = if self.eat_op("*") {
                BinaryOp::Mul
            } else if self.eat_op("/") {
                BinaryOp::Div
            } else if self.eat_op("%") {
                BinaryOp::Rem
            } else {
                break;
            };
            let rhs = self.parse_unary()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, FormulaError> {
        let op = if self.eat_op("-") {
            UnaryOp::Neg
        } else if self.eat_op("+") {
            UnaryOp::Plus
        } else {
            return self.parse_power();
        };
        let operand = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_power(&mut self) -> Result<Expr, FormulaError> {
        let base = self.parse_primary()?;
        if self.eat_op("**") {
            // Right operand may itself carry a sign: `2 ** -1`.
            let exponent = self.parse_unary()?;
            return Ok(binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, FormulaError> {
        let offset = self.offset();
        match self.advance() {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Variable(name) => Ok(Expr::Variable(name)),
            Token::LParen => {
                let inner = self.parse_or()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::Ident(name) => self.parse_name(name, offset),
            other => Err(FormulaError::syntax(
                offset,
                format!("unexpected {}", other.describe()),
            )),
        }
    }

    fn parse_name(&mut self, name: String, offset: usize) -> Result<Expr, FormulaError> {
        match name.as_str() {
            "pi" => return Ok(Expr::Number(std::f64::consts::PI)),
            "e" => return Ok(Expr::Number(std::f64::consts::E)),
            "True" => return Ok(Expr::Number(1.0)),
            "False" => return Ok(Expr::Number(0.0)),
            _ => {}
        }

        let func = Function::from_name(&name)
            .ok_or_else(|| FormulaError::syntax(offset, format!("unknown name '{}'", name)))?;
        self.expect(Token::LParen)?;

        let mut args = Vec::new();
        if *self.peek() != Token::RParen {
            args.push(self.parse_or()?);
            while *self.peek() == Token::Comma {
                self.advance();
                args.push(self.parse_or()?);
            }
        }
        self.expect(Token::RParen)?;

        let (min, max) = func.arity();
        if args.len() < min || max.is_some_and(|m| args.len() > m) {
            return Err(FormulaError::syntax(
                offset,
                format!("{}() does not take {} argument(s)", func, args.len()),
            ));
        }
        Ok(Expr::Call { func, args })
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}
