//! Restricted expression language for watches and ad-hoc message literals.
//!
//! An expression is evaluated against exactly one implicit variable, `$`, bound to the current
//! message content. The language is a small subset of JavaScript expressions: JSON literals,
//! field and index access, arithmetic, comparison and logical operators.

pub mod parser;

use chumsky::prelude::end;
use chumsky::Parser;
use itertools::Itertools;
use serde_json::{Number, Value};
use strum_macros::Display;

/// Expression compile error, contains source text and parser diagnostic.
#[derive(Debug, Clone, thiserror::Error)]
#[error("expression `{text}` compile error: {reason}")]
pub struct CompileError {
    pub text: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("cannot read `{0}` of null")]
    NullAccess(String),
    #[error("{kind} has no property `{property}`")]
    NoProperty {
        kind: &'static str,
        property: String,
    },
    #[error("cannot index {kind} with `{index}`")]
    InvalidIndex { kind: &'static str, index: String },
    #[error("operator `{op}` is not applicable to {lhs} and {rhs}")]
    BinaryOperands {
        op: BinaryOp,
        lhs: &'static str,
        rhs: &'static str,
    },
    #[error("operator `{op}` is not applicable to {operand}")]
    UnaryOperand { op: UnaryOp, operand: &'static str },
    #[error("division by zero")]
    DivisionByZero,
    #[error("result is not a finite number")]
    NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq, Display)]
pub enum UnaryOp {
    #[strum(serialize = "!")]
    Not,
    #[strum(serialize = "-")]
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Display)]
pub enum BinaryOp {
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "%")]
    Rem,
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    Ge,
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    Ne,
    #[strum(serialize = "&&")]
    And,
    #[strum(serialize = "||")]
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Implicit variable `$`.
    Root,
    Literal(Value),
    Array(Vec<Expression>),
    Object(Vec<(String, Expression)>),
    Field(Box<Expression>, String),
    Index(Box<Expression>, Box<Expression>),
    Unary(UnaryOp, Box<Expression>),
    Binary(BinaryOp, Box<Expression>, Box<Expression>),
}

/// Maximum nesting of brackets in an expression.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Maximum number of operators in an expression.
pub const MAX_OPERATORS: usize = 1024;

/// Reject expressions whose syntax tree would be too deep to parse or evaluate safely.
/// String literals are skipped.
fn check_complexity(text: &str) -> Result<(), CompileError> {
    let error = |reason: String| CompileError {
        text: text.trim().to_string(),
        reason,
    };

    let mut depth = 0usize;
    let mut operators = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for c in text.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '(' | '[' | '{' => {
                depth += 1;
                if depth > MAX_NESTING_DEPTH {
                    return Err(error(format!(
                        "brackets nested deeper than {MAX_NESTING_DEPTH} levels"
                    )));
                }
            }
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            '.' | '+' | '-' | '*' | '/' | '%' | '<' | '>' | '=' | '!' | '&' | '|' => {
                operators += 1;
                if operators > MAX_OPERATORS {
                    return Err(error(format!("more than {MAX_OPERATORS} operators")));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Compile expression source text.
pub fn compile(text: &str) -> Result<Expression, CompileError> {
    check_complexity(text)?;
    parser::parser()
        .then_ignore(end())
        .parse(text)
        .into_result()
        .map_err(|errors| CompileError {
            text: text.trim().to_string(),
            reason: errors.iter().join("; "),
        })
}

/// Compile a `<content> to <target>` pair, used for message injection.
pub fn compile_message(text: &str) -> Result<(Expression, Expression), CompileError> {
    check_complexity(text)?;
    parser::message_parser()
        .parse(text)
        .into_result()
        .map_err(|errors| CompileError {
            text: text.trim().to_string(),
            reason: errors.iter().join("; "),
        })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// JavaScript-like truthiness.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a value for humans: strings without quotes, everything else as JSON.
pub fn to_display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn number(n: f64) -> Result<Value, EvalError> {
    if !n.is_finite() {
        return Err(EvalError::NonFinite);
    }
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return Ok(Value::from(n as i64));
    }
    Number::from_f64(n)
        .map(Value::Number)
        .ok_or(EvalError::NonFinite)
}

impl Expression {
    /// Evaluate expression, `root` is a value of `$`.
    pub fn evaluate(&self, root: &Value) -> Result<Value, EvalError> {
        match self {
            Expression::Root => Ok(root.clone()),
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Array(items) => items
                .iter()
                .map(|item| item.evaluate(root))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Expression::Object(fields) => fields
                .iter()
                .map(|(key, item)| Ok::<_, EvalError>((key.clone(), item.evaluate(root)?)))
                .collect::<Result<serde_json::Map<_, _>, _>>()
                .map(Value::Object),
            Expression::Field(base, field) => read_field(&base.evaluate(root)?, field),
            Expression::Index(base, index) => {
                let base = base.evaluate(root)?;
                let index = index.evaluate(root)?;
                match (&base, &index) {
                    (_, Value::String(key)) => read_field(&base, key),
                    (Value::Null, _) => Err(EvalError::NullAccess(index.to_string())),
                    (Value::Array(items), Value::Number(n)) => match position(n) {
                        Some(i) => Ok(items.get(i).cloned().unwrap_or(Value::Null)),
                        None => Err(EvalError::InvalidIndex {
                            kind: "array",
                            index: n.to_string(),
                        }),
                    },
                    (Value::String(s), Value::Number(n)) => match position(n) {
                        Some(i) => Ok(s
                            .chars()
                            .nth(i)
                            .map(|c| Value::String(c.to_string()))
                            .unwrap_or(Value::Null)),
                        None => Err(EvalError::InvalidIndex {
                            kind: "string",
                            index: n.to_string(),
                        }),
                    },
                    (Value::Object(_), Value::Number(n)) => read_field(&base, &n.to_string()),
                    _ => Err(EvalError::InvalidIndex {
                        kind: kind(&base),
                        index: index.to_string(),
                    }),
                }
            }
            Expression::Unary(op, operand) => {
                let operand = operand.evaluate(root)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!is_truthy(&operand))),
                    UnaryOp::Neg => match operand.as_f64() {
                        Some(n) => number(-n),
                        None => Err(EvalError::UnaryOperand {
                            op: *op,
                            operand: kind(&operand),
                        }),
                    },
                }
            }
            Expression::Binary(BinaryOp::And, lhs, rhs) => {
                let lhs = lhs.evaluate(root)?;
                if is_truthy(&lhs) {
                    rhs.evaluate(root)
                } else {
                    Ok(lhs)
                }
            }
            Expression::Binary(BinaryOp::Or, lhs, rhs) => {
                let lhs = lhs.evaluate(root)?;
                if is_truthy(&lhs) {
                    Ok(lhs)
                } else {
                    rhs.evaluate(root)
                }
            }
            Expression::Binary(op, lhs, rhs) => {
                binary(*op, &lhs.evaluate(root)?, &rhs.evaluate(root)?)
            }
        }
    }
}

fn position(n: &Number) -> Option<usize> {
    n.as_f64()
        .filter(|f| *f >= 0.0 && f.fract() == 0.0)
        .map(|f| f as usize)
}

fn read_field(base: &Value, field: &str) -> Result<Value, EvalError> {
    match base {
        Value::Object(fields) => Ok(fields.get(field).cloned().unwrap_or(Value::Null)),
        Value::Array(items) if field == "length" => Ok(Value::from(items.len())),
        Value::String(s) if field == "length" => Ok(Value::from(s.chars().count())),
        Value::Null => Err(EvalError::NullAccess(field.to_string())),
        other => Err(EvalError::NoProperty {
            kind: kind(other),
            property: field.to_string(),
        }),
    }
}

fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    let mismatch = || EvalError::BinaryOperands {
        op,
        lhs: kind(lhs),
        rhs: kind(rhs),
    };

    match op {
        BinaryOp::Eq | BinaryOp::Ne => {
            let equal = match (lhs.as_f64(), rhs.as_f64()) {
                (Some(l), Some(r)) => l == r,
                _ => lhs == rhs,
            };
            Ok(Value::Bool(equal == (op == BinaryOp::Eq)))
        }
        BinaryOp::Add if lhs.is_string() || rhs.is_string() => Ok(Value::String(format!(
            "{}{}",
            to_display_string(lhs),
            to_display_string(rhs)
        ))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = match (lhs, rhs) {
                (Value::String(l), Value::String(r)) => l.partial_cmp(r),
                _ => match (lhs.as_f64(), rhs.as_f64()) {
                    (Some(l), Some(r)) => l.partial_cmp(&r),
                    _ => return Err(mismatch()),
                },
            };
            let result = ordering
                .map(|ord| match op {
                    BinaryOp::Lt => ord.is_lt(),
                    BinaryOp::Le => ord.is_le(),
                    BinaryOp::Gt => ord.is_gt(),
                    _ => ord.is_ge(),
                })
                .unwrap_or(false);
            Ok(Value::Bool(result))
        }
        _ => {
            let (Some(l), Some(r)) = (lhs.as_f64(), rhs.as_f64()) else {
                return Err(mismatch());
            };
            match op {
                BinaryOp::Add => number(l + r),
                BinaryOp::Sub => number(l - r),
                BinaryOp::Mul => number(l * r),
                BinaryOp::Div if r == 0.0 => Err(EvalError::DivisionByZero),
                BinaryOp::Div => number(l / r),
                BinaryOp::Rem if r == 0.0 => Err(EvalError::DivisionByZero),
                BinaryOp::Rem => number(l % r),
                _ => Err(mismatch()),
            }
        }
    }
}
