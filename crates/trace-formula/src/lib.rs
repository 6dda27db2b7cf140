//! Formula engine for trace plot curves.
//!
//! A formula curve is written as `f://<expression>`, where the expression may
//! reference other curves through `{KEY}` placeholders. This crate extracts
//! those placeholders, parses the expression into an explicit AST, and
//! evaluates it against a map of sample values.

pub mod engine;
pub mod parser;
pub mod types;

pub use engine::{evaluate, validate_bare_expression};
pub use parser::{FORMULA_PREFIX, Formula, extract_variables, is_formula, strip_prefix};
pub use types::{BinaryOp, Expr, FormulaError, Function, UnaryOp};
