// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Binary and unary operator semantics.

use std::cmp::Ordering;

use docval_ast::expr::BinOp;

use super::RuntimeError;
use crate::value::Value;

/// Upper bound on the length of a string or list built by `+` or `*`.
const MAX_SEQUENCE_LEN: usize = 10_000_000;

pub(super) fn binary(op: BinOp, lhs: Value, rhs: Value) -> Result<Value, RuntimeError> {
    match op {
        BinOp::Add => add(lhs, rhs),
        BinOp::Sub => arithmetic(op, lhs, rhs, i64::checked_sub, |a, b| a - b),
        BinOp::Mul => multiply(lhs, rhs),
        BinOp::Div => divide(lhs, rhs),
        BinOp::Rem => remainder(lhs, rhs),
        BinOp::Eq => Ok(Value::Bool(lhs == rhs)),
        BinOp::Ne => Ok(Value::Bool(lhs != rhs)),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ord = compare(op, &lhs, &rhs)?;
            Ok(Value::Bool(match op {
                BinOp::Lt => ord == Ordering::Less,
                BinOp::Le => ord != Ordering::Greater,
                BinOp::Gt => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            }))
        }
        // Short-circuit operators are evaluated by the caller.
        BinOp::And | BinOp::Or => Err(RuntimeError::type_error(format!("'{}' cannot be applied eagerly", op.symbol()))),
    }
}

pub(super) fn negate(value: Value) -> Result<Value, RuntimeError> {
    match value {
        Value::Int(n) => n.checked_neg().map(Value::Int).ok_or(RuntimeError::Overflow),
        Value::Float(f) => Ok(Value::Float(-f)),
        other => Err(RuntimeError::type_error(format!("bad operand type for unary -: '{}'", other.type_name()))),
    }
}

pub(super) fn index(target: &Value, index: &Value) -> Result<Value, RuntimeError> {
    match target {
        Value::List(items) => {
            let i = resolve_index(index, items.len(), "list")?;
            Ok(items[i].clone())
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let i = resolve_index(index, chars.len(), "string")?;
            Ok(Value::Str(chars[i].to_string()))
        }
        other => Err(RuntimeError::type_error(format!("'{}' is not indexable", other.type_name()))),
    }
}

/// Turn a possibly negative index into a position, checking bounds.
pub(super) fn resolve_index(index: &Value, len: usize, what: &str) -> Result<usize, RuntimeError> {
    let Value::Int(i) = index else {
        return Err(RuntimeError::type_error(format!(
            "{} indices must be int, not '{}'",
            what,
            index.type_name()
        )));
    };
    let pos = if *i < 0 { len as i64 + *i } else { *i };
    if pos < 0 || pos as usize >= len {
        return Err(RuntimeError::IndexError(format!("{} index {} out of range for length {}", what, i, len)));
    }
    Ok(pos as usize)
}

fn unsupported(op: BinOp, lhs: &Value, rhs: &Value) -> RuntimeError {
    RuntimeError::type_error(format!(
        "unsupported operand types for {}: '{}' and '{}'",
        op.symbol(),
        lhs.type_name(),
        rhs.type_name()
    ))
}

fn add(lhs: Value, rhs: Value) -> Result<Value, RuntimeError> {
    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => {
            check_concat_len(a.len(), b.len())?;
            Ok(Value::Str(a + &b))
        }
        (Value::List(mut a), Value::List(b)) => {
            check_concat_len(a.len(), b.len())?;
            a.extend(b);
            Ok(Value::List(a))
        }
        (lhs, rhs) => arithmetic(BinOp::Add, lhs, rhs, i64::checked_add, |a, b| a + b),
    }
}

fn check_concat_len(a: usize, b: usize) -> Result<(), RuntimeError> {
    if a.saturating_add(b) > MAX_SEQUENCE_LEN {
        return Err(RuntimeError::ValueError("concatenation result is too large".to_string()));
    }
    Ok(())
}

fn multiply(lhs: Value, rhs: Value) -> Result<Value, RuntimeError> {
    match (lhs, rhs) {
        (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
            let count = repeat_count(n, s.len())?;
            Ok(Value::Str(s.repeat(count)))
        }
        (Value::List(items), Value::Int(n)) | (Value::Int(n), Value::List(items)) => {
            let count = repeat_count(n, items.len())?;
            let mut out = Vec::with_capacity(items.len() * count);
            for _ in 0..count {
                out.extend(items.iter().cloned());
            }
            Ok(Value::List(out))
        }
        (lhs, rhs) => arithmetic(BinOp::Mul, lhs, rhs, i64::checked_mul, |a, b| a * b),
    }
}

fn repeat_count(n: i64, unit_len: usize) -> Result<usize, RuntimeError> {
    if n <= 0 {
        return Ok(0);
    }
    let count = n as usize;
    if unit_len.saturating_mul(count) > MAX_SEQUENCE_LEN {
        return Err(RuntimeError::ValueError("repetition result is too large".to_string()));
    }
    Ok(count)
}

/// Integer division floors, like the remainder below.
fn divide(lhs: Value, rhs: Value) -> Result<Value, RuntimeError> {
    match (&lhs, &rhs) {
        (Value::Int(a), Value::Int(b)) => {
            if *b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            let q = a.checked_div(*b).ok_or(RuntimeError::Overflow)?;
            let floored = if a % b != 0 && ((*a < 0) != (*b < 0)) { q - 1 } else { q };
            Ok(Value::Int(floored))
        }
        _ => {
            let (a, b) = float_operands(BinOp::Div, &lhs, &rhs)?;
            if b == 0.0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Ok(Value::Float(a / b))
        }
    }
}

/// The result takes the sign of the divisor.
fn remainder(lhs: Value, rhs: Value) -> Result<Value, RuntimeError> {
    match (&lhs, &rhs) {
        (Value::Int(a), Value::Int(b)) => {
            if *b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            let r = a.checked_rem(*b).ok_or(RuntimeError::Overflow)?;
            Ok(Value::Int(if r != 0 && ((r < 0) != (*b < 0)) { r + b } else { r }))
        }
        _ => {
            let (a, b) = float_operands(BinOp::Rem, &lhs, &rhs)?;
            if b == 0.0 {
                return Err(RuntimeError::DivisionByZero);
            }
            let r = a % b;
            Ok(Value::Float(if r != 0.0 && ((r < 0.0) != (b < 0.0)) { r + b } else { r }))
        }
    }
}

fn arithmetic(
    op: BinOp,
    lhs: Value,
    rhs: Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, RuntimeError> {
    if let (Value::Int(a), Value::Int(b)) = (&lhs, &rhs) {
        return int_op(*a, *b).map(Value::Int).ok_or(RuntimeError::Overflow);
    }
    let (a, b) = float_operands(op, &lhs, &rhs)?;
    Ok(Value::Float(float_op(a, b)))
}

fn float_operands(op: BinOp, lhs: &Value, rhs: &Value) -> Result<(f64, f64), RuntimeError> {
    match (as_number(lhs), as_number(rhs)) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(unsupported(op, lhs, rhs)),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Int(n) => Some(*n as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

/// Ordering for `<`-style operators. Numbers, strings and lists of comparable
/// items are ordered; anything else is a type error.
pub(crate) fn compare(op: BinOp, lhs: &Value, rhs: &Value) -> Result<Ordering, RuntimeError> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (Value::List(a), Value::List(b)) => {
            for (x, y) in a.iter().zip(b.iter()) {
                match compare(op, x, y)? {
                    Ordering::Equal => continue,
                    ord => return Ok(ord),
                }
            }
            Ok(a.len().cmp(&b.len()))
        }
        _ => match (as_number(lhs), as_number(rhs)) {
            (Some(a), Some(b)) => a.partial_cmp(&b).ok_or_else(|| {
                RuntimeError::type_error(format!("'{}' is not defined for nan", op.symbol()))
            }),
            _ => Err(RuntimeError::type_error(format!(
                "'{}' not supported between '{}' and '{}'",
                op.symbol(),
                lhs.type_name(),
                rhs.type_name()
            ))),
        },
    }
}
