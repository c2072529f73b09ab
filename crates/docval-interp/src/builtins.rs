// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Builtin functions.
//!
//! Builtins are pure apart from `print`, whose text is handed back to the
//! interpreter for capture. None of them touch the clock, the filesystem or
//! randomness, so examples stay reproducible.

use std::cmp::Ordering;

use docval_ast::expr::BinOp;

use crate::interp::operators::compare;
use crate::interp::RuntimeError;
use crate::value::{format_float, Value};

/// Longest list `range` will build.
const MAX_RANGE_LEN: i64 = 10_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Len,
    Str,
    Repr,
    Int,
    Float,
    Type,
    Range,
    Push,
    Upper,
    Lower,
    Join,
    Abs,
    Min,
    Max,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "print" => Builtin::Print,
            "len" => Builtin::Len,
            "str" => Builtin::Str,
            "repr" => Builtin::Repr,
            "int" => Builtin::Int,
            "float" => Builtin::Float,
            "type" => Builtin::Type,
            "range" => Builtin::Range,
            "push" => Builtin::Push,
            "upper" => Builtin::Upper,
            "lower" => Builtin::Lower,
            "join" => Builtin::Join,
            "abs" => Builtin::Abs,
            "min" => Builtin::Min,
            "max" => Builtin::Max,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::Len => "len",
            Builtin::Str => "str",
            Builtin::Repr => "repr",
            Builtin::Int => "int",
            Builtin::Float => "float",
            Builtin::Type => "type",
            Builtin::Range => "range",
            Builtin::Push => "push",
            Builtin::Upper => "upper",
            Builtin::Lower => "lower",
            Builtin::Join => "join",
            Builtin::Abs => "abs",
            Builtin::Min => "min",
            Builtin::Max => "max",
        }
    }
}

/// What a builtin call produced.
pub struct BuiltinResult {
    pub value: Value,
    /// Text written by `print`.
    pub printed: Option<String>,
}

impl From<Value> for BuiltinResult {
    fn from(value: Value) -> Self {
        Self { value, printed: None }
    }
}

pub fn call(builtin: Builtin, args: Vec<Value>) -> Result<BuiltinResult, RuntimeError> {
    let name = builtin.name();
    let value = match builtin {
        Builtin::Print => {
            let line = args.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" ");
            return Ok(BuiltinResult { value: Value::Nil, printed: Some(line + "\n") });
        }
        Builtin::Len => match one_arg(name, args)? {
            Value::Str(s) => Value::Int(s.chars().count() as i64),
            Value::List(items) => Value::Int(items.len() as i64),
            other => return Err(arg_type(name, &other)),
        },
        Builtin::Str => Value::Str(one_arg(name, args)?.to_string()),
        Builtin::Repr => Value::Str(one_arg(name, args)?.repr()),
        Builtin::Type => Value::Str(one_arg(name, args)?.type_name().to_string()),
        Builtin::Int => to_int(one_arg(name, args)?)?,
        Builtin::Float => to_float(one_arg(name, args)?)?,
        Builtin::Range => range(args)?,
        Builtin::Push => {
            let [list, item] = n_args::<2>(name, args)?;
            match list {
                Value::List(mut items) => {
                    items.push(item);
                    Value::List(items)
                }
                other => return Err(arg_type(name, &other)),
            }
        }
        Builtin::Upper => match one_arg(name, args)? {
            Value::Str(s) => Value::Str(s.to_uppercase()),
            other => return Err(arg_type(name, &other)),
        },
        Builtin::Lower => match one_arg(name, args)? {
            Value::Str(s) => Value::Str(s.to_lowercase()),
            other => return Err(arg_type(name, &other)),
        },
        Builtin::Join => {
            let [list, sep] = n_args::<2>(name, args)?;
            match (list, sep) {
                (Value::List(items), Value::Str(sep)) => {
                    Value::Str(items.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(sep.as_str()))
                }
                (Value::List(_), other) | (other, _) => return Err(arg_type(name, &other)),
            }
        }
        Builtin::Abs => match one_arg(name, args)? {
            Value::Int(n) => n.checked_abs().map(Value::Int).ok_or(RuntimeError::Overflow)?,
            Value::Float(f) => Value::Float(f.abs()),
            other => return Err(arg_type(name, &other)),
        },
        Builtin::Min => extreme(name, args, Ordering::Less)?,
        Builtin::Max => extreme(name, args, Ordering::Greater)?,
    };
    Ok(value.into())
}

fn arity(name: &str, expected: &str, got: usize) -> RuntimeError {
    RuntimeError::type_error(format!("{}() takes {} but {} were given", name, expected, got))
}

fn arg_type(name: &str, value: &Value) -> RuntimeError {
    RuntimeError::type_error(format!("{}() does not accept '{}'", name, value.type_name()))
}

fn one_arg(name: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
    let [value] = n_args::<1>(name, args)?;
    Ok(value)
}

fn n_args<const N: usize>(name: &str, args: Vec<Value>) -> Result<[Value; N], RuntimeError> {
    let got = args.len();
    args.try_into().map_err(|_| {
        let expected = if N == 1 { "1 argument".to_string() } else { format!("{} arguments", N) };
        arity(name, &expected, got)
    })
}

fn to_int(value: Value) -> Result<Value, RuntimeError> {
    match value {
        Value::Int(n) => Ok(Value::Int(n)),
        Value::Bool(b) => Ok(Value::Int(b as i64)),
        Value::Float(f) => {
            if !f.is_finite() || f.abs() >= 9.2e18 {
                return Err(RuntimeError::ValueError(format!("cannot convert float {} to int", format_float(f))));
            }
            Ok(Value::Int(f.trunc() as i64))
        }
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| RuntimeError::ValueError(format!("invalid literal for int(): {}", Value::Str(s.clone()).repr()))),
        other => Err(arg_type("int", &other)),
    }
}

fn to_float(value: Value) -> Result<Value, RuntimeError> {
    match value {
        Value::Int(n) => Ok(Value::Float(n as f64)),
        Value::Float(f) => Ok(Value::Float(f)),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| RuntimeError::ValueError(format!("could not convert string to float: {}", Value::Str(s.clone()).repr()))),
        other => Err(arg_type("float", &other)),
    }
}

fn range(args: Vec<Value>) -> Result<Value, RuntimeError> {
    let (start, end) = match args.as_slice() {
        [Value::Int(end)] => (0, *end),
        [Value::Int(start), Value::Int(end)] => (*start, *end),
        [_] | [_, _] => return Err(RuntimeError::type_error("range() arguments must be int")),
        _ => return Err(arity("range", "1 or 2 arguments", args.len())),
    };
    if end.saturating_sub(start) > MAX_RANGE_LEN {
        return Err(RuntimeError::ValueError("range is too large".to_string()));
    }
    Ok(Value::List((start..end).map(Value::Int).collect()))
}

/// `min`/`max` over either one list argument or several arguments.
fn extreme(name: &str, args: Vec<Value>, want: Ordering) -> Result<Value, RuntimeError> {
    let items = match args.len() {
        0 => return Err(arity(name, "at least 1 argument", 0)),
        1 => match args.into_iter().next() {
            Some(Value::List(items)) => items,
            Some(other) => return Err(arg_type(name, &other)),
            None => Vec::new(),
        },
        _ => args,
    };

    let mut iter = items.into_iter();
    let Some(mut best) = iter.next() else {
        return Err(RuntimeError::ValueError(format!("{}() arg is an empty list", name)));
    };
    for item in iter {
        if compare(BinOp::Lt, &item, &best)? == want {
            best = item;
        }
    }
    Ok(best)
}
