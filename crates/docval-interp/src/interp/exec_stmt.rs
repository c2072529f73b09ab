// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Statement execution.

use std::sync::Arc;

use docval_ast::expr::{Expr, ExprKind};
use docval_ast::stmt::{Stmt, StmtKind};

use super::{Interpreter, RuntimeError};
use crate::value::Value;

impl Interpreter {
    pub(super) fn exec_stmt(&mut self, stmt: &Stmt) -> Result<(), RuntimeError> {
        self.enter()?;
        let result = self.exec_stmt_kind(stmt);
        self.depth -= 1;
        result
    }

    fn exec_stmt_kind(&mut self, stmt: &Stmt) -> Result<(), RuntimeError> {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.eval_expr(expr)?;
            }
            StmtKind::Let { name, init } => {
                let value = self.eval_expr(init)?;
                self.env.define(name.clone(), value);
            }
            StmtKind::Assign { target, value } => {
                let value = self.eval_expr(value)?;
                self.assign(target, value)?;
            }
            StmtKind::Fn(decl) => {
                self.env.define(decl.name.clone(), Value::Function(Arc::new(decl.clone())));
            }
            StmtKind::If { cond, then_branch, else_branch } => {
                if self.eval_expr(cond)?.is_truthy() {
                    self.exec_block(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.exec_block(else_branch)?;
                }
            }
            StmtKind::While { cond, body } => {
                while self.eval_expr(cond)?.is_truthy() {
                    self.tick()?;
                    if !self.run_loop_body(body)? {
                        break;
                    }
                }
            }
            StmtKind::For { binding, iter, body } => {
                let items: Vec<Value> = match self.eval_expr(iter)? {
                    Value::List(items) => items,
                    Value::Str(s) => s.chars().map(|c| Value::Str(c.to_string())).collect(),
                    other => {
                        return Err(RuntimeError::type_error(format!("'{}' is not iterable", other.type_name())));
                    }
                };
                for item in items {
                    self.tick()?;
                    self.env.push_scope();
                    self.env.define(binding.clone(), item);
                    let result = self.run_loop_body_in_scope(body);
                    self.env.pop_scope();
                    if !result? {
                        break;
                    }
                }
            }
            StmtKind::Loop { body } => loop {
                self.tick()?;
                if !self.run_loop_body(body)? {
                    break;
                }
            },
            StmtKind::Break => return Err(RuntimeError::Break),
            StmtKind::Continue => return Err(RuntimeError::Continue),
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Nil,
                };
                return Err(RuntimeError::Return(value));
            }
            StmtKind::Raise(expr) => {
                let value = self.eval_expr(expr)?;
                return Err(RuntimeError::Raised(value.to_string()));
            }
        }
        Ok(())
    }

    /// Run statements in a fresh scope.
    pub(super) fn exec_block(&mut self, stmts: &[Stmt]) -> Result<(), RuntimeError> {
        self.env.push_scope();
        let result = stmts.iter().try_for_each(|stmt| self.exec_stmt(stmt));
        self.env.pop_scope();
        result
    }

    /// Returns `Ok(false)` when the loop should stop.
    fn run_loop_body(&mut self, body: &[Stmt]) -> Result<bool, RuntimeError> {
        match self.exec_block(body) {
            Ok(()) | Err(RuntimeError::Continue) => Ok(true),
            Err(RuntimeError::Break) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Like `run_loop_body`, for bodies whose scope the caller already pushed.
    fn run_loop_body_in_scope(&mut self, body: &[Stmt]) -> Result<bool, RuntimeError> {
        match body.iter().try_for_each(|stmt| self.exec_stmt(stmt)) {
            Ok(()) | Err(RuntimeError::Continue) => Ok(true),
            Err(RuntimeError::Break) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn assign(&mut self, target: &Expr, value: Value) -> Result<(), RuntimeError> {
        match &target.kind {
            ExprKind::Ident(name) => {
                self.env.assign(name, value);
                Ok(())
            }
            ExprKind::Index { .. } => {
                // Evaluate every index before borrowing the root binding.
                let mut indices = Vec::new();
                let mut cursor = target;
                while let ExprKind::Index { target: inner, index } = &cursor.kind {
                    indices.push(self.eval_expr(index)?);
                    cursor = inner;
                }
                indices.reverse();

                let ExprKind::Ident(root) = &cursor.kind else {
                    return Err(RuntimeError::type_error("cannot assign to this expression"));
                };
                let mut slot = self
                    .env
                    .get_mut(root)
                    .ok_or_else(|| RuntimeError::UndefinedVariable(root.clone()))?;
                for index in &indices {
                    slot = index_slot(slot, index)?;
                }
                *slot = value;
                Ok(())
            }
            _ => Err(RuntimeError::type_error("cannot assign to this expression")),
        }
    }
}

/// A mutable reference to a list element.
fn index_slot<'a>(container: &'a mut Value, index: &Value) -> Result<&'a mut Value, RuntimeError> {
    match container {
        Value::List(items) => {
            let i = super::operators::resolve_index(index, items.len(), "list")?;
            Ok(&mut items[i])
        }
        Value::Str(_) => Err(RuntimeError::type_error("'string' does not support item assignment")),
        other => Err(RuntimeError::type_error(format!(
            "'{}' does not support item assignment",
            other.type_name()
        ))),
    }
}
