// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Statement AST nodes.

use crate::expr::Expr;
use crate::Span;

/// A statement in the AST.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

/// The kind of statement.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// Expression statement. At the top level of an example its value is
    /// displayed, the way an interactive prompt echoes it.
    Expr(Expr),
    /// `let name = init`
    Let { name: String, init: Expr },
    /// `target = value` where target is a name or an index expression
    Assign { target: Expr, value: Expr },
    /// `fn name(params) { body }`
    Fn(FnDecl),
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
    },
    While { cond: Expr, body: Vec<Stmt> },
    For { binding: String, iter: Expr, body: Vec<Stmt> },
    Loop { body: Vec<Stmt> },
    Break,
    Continue,
    Return(Option<Expr>),
    /// `raise expr`, raising a user error that carries `str(expr)`.
    Raise(Expr),
}

/// A function declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FnDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}
