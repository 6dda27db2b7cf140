//! Evaluate parsed formulas.

use std::collections::HashMap;

use crate::parser::parse_expression;
use crate::types::{BinaryOp, Expr, FormulaError, Function, UnaryOp};

/// Evaluate an expression against sample values keyed by placeholder name.
///
/// Arithmetic follows IEEE-754: division by zero yields an infinity or NaN
/// rather than an error. Booleans are `1.0` / `0.0`.
pub fn evaluate(expr: &Expr, env: &HashMap<String, f64>) -> Result<f64, FormulaError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Variable(name) => env
            .get(name)
            .copied()
            .ok_or_else(|| FormulaError::UnboundVariable(name.clone())),
        Expr::Unary { op, operand } => {
            let v = evaluate(operand, env)?;
            Ok(match op {
                UnaryOp::Neg => -v,
                UnaryOp::Plus => v,
                UnaryOp::Not => from_bool(!truthy(v)),
            })
        }
        Expr::Binary { op, lhs, rhs } => eval_binary(*op, lhs, rhs, env),
        Expr::Call { func, args } => {
            let values = args
                .iter()
                .map(|a| evaluate(a, env))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(call(*func, &values))
        }
    }
}

/// Check that a bare expression (no placeholders, prefix already stripped)
/// parses and evaluates against an empty environment.
pub fn validate_bare_expression(body: &str) -> Result<(), FormulaError> {
    let expr = parse_expression(body)?;
    evaluate(&expr, &HashMap::new())?;
    Ok(())
}

fn eval_binary(
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    env: &HashMap<String, f64>,
) -> Result<f64, FormulaError> {
    let a = evaluate(lhs, env)?;

    // Short-circuit like the host language: the right side is only needed
    // when the left side does not decide the result.
    match op {
        BinaryOp::And if !truthy(a) => return Ok(a),
        BinaryOp::Or if truthy(a) => return Ok(a),
        _ => {}
    }

    let b = evaluate(rhs, env)?;
    Ok(match op {
        BinaryOp::And | BinaryOp::Or => b,
        BinaryOp::Lt => from_bool(a < b),
        BinaryOp::Le => from_bool(a <= b),
        BinaryOp::Gt => from_bool(a > b),
        BinaryOp::Ge => from_bool(a >= b),
        BinaryOp::Eq => from_bool(a == b),
        BinaryOp::Ne => from_bool(a != b),
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Rem => floored_rem(a, b),
        BinaryOp::Pow => a.powf(b),
    })
}

fn call(func: Function, args: &[f64]) -> f64 {
    let x = args.first().copied().unwrap_or(f64::NAN);
    match func {
        Function::Abs => x.abs(),
        Function::Sqrt => x.sqrt(),
        Function::Exp => x.exp(),
        Function::Log => x.ln(),
        Function::Log10 => x.log10(),
        Function::Sin => x.sin(),
        Function::Cos => x.cos(),
        Function::Tan => x.tan(),
        Function::Asin => x.asin(),
        Function::Acos => x.acos(),
        Function::Atan => x.atan(),
        Function::Sinh => x.sinh(),
        Function::Cosh => x.cosh(),
        Function::Tanh => x.tanh(),
        Function::Floor => x.floor(),
        Function::Ceil => x.ceil(),
        Function::Round => x.round_ties_even(),
        Function::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
        Function::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        Function::Pow => x.powf(args.get(1).copied().unwrap_or(f64::NAN)),
    }
}

/// Remainder with the sign of the divisor (`-1 % 3 == 2`).
fn floored_rem(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r }
}

fn truthy(v: f64) -> bool {
    v != 0.0 && !v.is_nan()
}

fn from_bool(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}
