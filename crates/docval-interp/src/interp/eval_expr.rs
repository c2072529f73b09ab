// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Expression evaluation.

use docval_ast::expr::{BinOp, Expr, ExprKind, UnaryOp};

use super::{operators, Interpreter, RuntimeError};
use crate::builtins::Builtin;
use crate::value::Value;

impl Interpreter {
    pub(super) fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        self.enter()?;
        let result = self.eval_expr_kind(expr);
        self.depth -= 1;
        result
    }

    fn eval_expr_kind(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match &expr.kind {
            ExprKind::Int(n) => Ok(Value::Int(*n)),
            ExprKind::Float(f) => Ok(Value::Float(*f)),
            ExprKind::String(s) => Ok(Value::Str(s.clone())),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Nil => Ok(Value::Nil),
            ExprKind::Ident(name) => self.lookup(name),
            ExprKind::List(items) => {
                let values = items.iter().map(|e| self.eval_expr(e)).collect::<Result<Vec<_>, _>>()?;
                Ok(Value::List(values))
            }
            ExprKind::Binary { op: BinOp::And, left, right } => {
                let lhs = self.eval_expr(left)?;
                if !lhs.is_truthy() {
                    return Ok(lhs);
                }
                self.eval_expr(right)
            }
            ExprKind::Binary { op: BinOp::Or, left, right } => {
                let lhs = self.eval_expr(left)?;
                if lhs.is_truthy() {
                    return Ok(lhs);
                }
                self.eval_expr(right)
            }
            ExprKind::Binary { op, left, right } => {
                let lhs = self.eval_expr(left)?;
                let rhs = self.eval_expr(right)?;
                operators::binary(*op, lhs, rhs)
            }
            ExprKind::Unary { op, operand } => {
                let value = self.eval_expr(operand)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                    UnaryOp::Neg => operators::negate(value),
                }
            }
            ExprKind::Call { callee, args } => {
                let callee = self.eval_expr(callee)?;
                let args = args.iter().map(|e| self.eval_expr(e)).collect::<Result<Vec<_>, _>>()?;
                self.call_value(callee, args)
            }
            ExprKind::Index { target, index } => {
                let target = self.eval_expr(target)?;
                let index = self.eval_expr(index)?;
                operators::index(&target, &index)
            }
        }
    }

    /// Variables shadow builtins of the same name.
    fn lookup(&self, name: &str) -> Result<Value, RuntimeError> {
        if let Some(value) = self.env.get(name) {
            return Ok(value.clone());
        }
        Builtin::from_name(name)
            .map(Value::Builtin)
            .ok_or_else(|| RuntimeError::UndefinedVariable(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use crate::{Interpreter, Limits};

    fn eval(src: &str) -> Result<String, String> {
        let mut interp = Interpreter::new();
        match interp.execute(src, &Limits::default()) {
            Ok(()) => Ok(interp.take_output()),
            Err(e) => Err(e.to_string()),
        }
    }

    #[test]
    fn short_circuit_returns_operand() {
        assert_eq!(eval("nil or \"default\""), Ok("\"default\"\n".to_string()));
        assert_eq!(eval("0 and undefined_name"), Ok("0\n".to_string()));
        assert_eq!(eval("not []"), Ok("true\n".to_string()));
    }

    #[test]
    fn undefined_variable() {
        assert_eq!(eval("missing + 1"), Err("NameError: undefined variable 'missing'".to_string()));
    }

    #[test]
    fn builtins_can_be_shadowed() {
        assert_eq!(eval("let len = 3\nlen"), Ok("3\n".to_string()));
        assert_eq!(eval("len"), Ok("<builtin len>\n".to_string()));
    }

    #[test]
    fn string_indexing() {
        assert_eq!(eval("\"hey\"[1]"), Ok("\"e\"\n".to_string()));
        assert_eq!(eval("\"hey\"[-1]"), Ok("\"y\"\n".to_string()));
    }
}
