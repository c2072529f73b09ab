// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The parser implementation using Pratt parsing for expressions.

use docval_ast::expr::{BinOp, Expr, ExprKind, UnaryOp};
use docval_ast::stmt::{FnDecl, Stmt, StmtKind};
use docval_ast::token::{Token, TokenKind};
use docval_ast::Span;
use docval_lexer::LexError;

/// Maximum number of errors to collect before stopping.
const MAX_ERRORS: usize = 20;

/// Deepest nesting of blocks and expressions accepted.
const MAX_NESTING: usize = 256;

/// Binding power of `not`; its operand binds comparisons but not `and`/`or`.
const NOT_BP: u8 = 5;
/// Binding power of unary minus.
const NEG_BP: u8 = 13;
/// Binding power of calls and indexing.
const POSTFIX_BP: u8 = 15;

/// The parser for docval script.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Collected errors during parsing
    errors: Vec<ParseError>,
    depth: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)) {
            let end = tokens.last().map(|t| t.span.end).unwrap_or(0);
            tokens.push(Token { kind: TokenKind::Eof, span: Span::new(end, end) });
        }
        Self { tokens, pos: 0, errors: Vec::new(), depth: 0 }
    }

    /// Record error, return if should continue.
    fn record_error(&mut self, error: ParseError) -> bool {
        self.errors.push(error);
        self.errors.len() < MAX_ERRORS
    }

    /// Run `f` one nesting level deeper.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, ParseError>) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::too_deep(self.current().span));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Skip to the next statement boundary after an error.
    fn synchronize(&mut self) {
        let mut brace_depth = 0usize;

        while !self.at_end() {
            match self.current_kind() {
                TokenKind::LBrace => brace_depth += 1,
                TokenKind::RBrace => {
                    if brace_depth == 0 {
                        return;
                    }
                    brace_depth -= 1;
                }
                TokenKind::Newline | TokenKind::Semi if brace_depth == 0 => {
                    self.advance();
                    return;
                }
                _ => {}
            }
            self.advance();
        }
    }

    // =========================================================================
    // Token Navigation
    // =========================================================================

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn advance(&mut self) -> &Token {
        let idx = self.pos.min(self.tokens.len() - 1);
        if !self.at_end() {
            self.pos += 1;
        }
        &self.tokens[idx]
    }

    fn previous_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .map(|i| self.tokens[i].span.end)
            .unwrap_or(0)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<&Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::expected(kind.display_name(), self.current_kind(), self.current().span))
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
    }

    /// A statement ends at a newline, `;`, a closing brace or end of input.
    fn expect_terminator(&mut self) -> Result<(), ParseError> {
        match self.current_kind() {
            TokenKind::Newline | TokenKind::Semi => {
                self.advance();
                Ok(())
            }
            TokenKind::RBrace | TokenKind::Eof => Ok(()),
            found => Err(ParseError::expected("newline or ';'", found, self.current().span)),
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        if let TokenKind::Ident(name) = self.current_kind() {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(ParseError::expected("a name", self.current_kind(), self.current().span))
        }
    }

    fn peek_past_newlines_is_else(&self) -> bool {
        self.tokens[self.pos..]
            .iter()
            .find(|t| !matches!(t.kind, TokenKind::Newline))
            .map(|t| matches!(t.kind, TokenKind::Else))
            .unwrap_or(false)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    pub fn parse(&mut self) -> ParseResult {
        let mut stmts = Vec::new();
        self.skip_separators();

        while !self.at_end() {
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(e) => {
                    if !self.record_error(e) {
                        break;
                    }
                    self.synchronize();
                }
            }
            self.skip_separators();
            // A stray `}` at the top level has no block to close.
            if self.check(&TokenKind::RBrace) {
                let span = self.current().span;
                if !self.record_error(ParseError::unmatched_brace(span)) {
                    break;
                }
                self.advance();
                self.skip_separators();
            }
        }

        ParseResult {
            stmts,
            errors: std::mem::take(&mut self.errors),
        }
    }

    fn skip_separators(&mut self) {
        while self.check(&TokenKind::Newline) || self.check(&TokenKind::Semi) {
            self.advance();
        }
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.nested(Self::parse_block_body)
    }

    fn parse_block_body(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(&TokenKind::LBrace)?;
        self.skip_separators();

        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(e) => {
                    if !self.record_error(e) {
                        break;
                    }
                    self.synchronize();
                }
            }
            self.skip_separators();
        }

        self.expect(&TokenKind::RBrace)?;
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current().span.start;

        let kind = match self.current_kind() {
            TokenKind::Let => self.parse_let_stmt()?,
            TokenKind::Fn => self.parse_fn_stmt()?,
            TokenKind::If => self.parse_if_stmt()?,
            TokenKind::While => {
                self.advance();
                let cond = self.parse_expr()?;
                let body = self.parse_block()?;
                StmtKind::While { cond, body }
            }
            TokenKind::For => {
                self.advance();
                let binding = self.expect_ident()?;
                self.expect(&TokenKind::In)?;
                let iter = self.parse_expr()?;
                let body = self.parse_block()?;
                StmtKind::For { binding, iter, body }
            }
            TokenKind::Loop => {
                self.advance();
                StmtKind::Loop { body: self.parse_block()? }
            }
            TokenKind::Break => {
                self.advance();
                StmtKind::Break
            }
            TokenKind::Continue => {
                self.advance();
                StmtKind::Continue
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.is_expr_start() { Some(self.parse_expr()?) } else { None };
                StmtKind::Return(value)
            }
            TokenKind::Raise => {
                self.advance();
                StmtKind::Raise(self.parse_expr()?)
            }
            _ => self.parse_expr_or_assign()?,
        };

        let end = self.previous_end();
        self.expect_terminator()?;
        Ok(Stmt { kind, span: Span::new(start, end) })
    }

    fn parse_let_stmt(&mut self) -> Result<StmtKind, ParseError> {
        self.expect(&TokenKind::Let)?;
        let name = self.expect_ident()?;
        self.expect(&TokenKind::Eq)?;
        self.skip_newlines();
        let init = self.parse_expr()?;
        Ok(StmtKind::Let { name, init })
    }

    fn parse_fn_stmt(&mut self) -> Result<StmtKind, ParseError> {
        self.expect(&TokenKind::Fn)?;
        let name = self.expect_ident()?;
        self.expect(&TokenKind::LParen)?;
        self.skip_newlines();

        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) {
            let param = self.expect_ident()?;
            if params.contains(&param) {
                return Err(ParseError::duplicate_param(&param, self.tokens[self.pos - 1].span));
            }
            params.push(param);
            self.skip_newlines();
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.expect(&TokenKind::RParen)?;

        let body = self.parse_block()?;
        Ok(StmtKind::Fn(FnDecl { name, params, body }))
    }

    fn parse_if_stmt(&mut self) -> Result<StmtKind, ParseError> {
        self.expect(&TokenKind::If)?;
        let cond = self.parse_expr()?;
        let then_branch = self.parse_block()?;

        let else_branch = if self.peek_past_newlines_is_else() {
            self.skip_newlines();
            self.advance();
            if self.check(&TokenKind::If) {
                let nested_start = self.current().span.start;
                let nested = self.nested(Self::parse_if_stmt)?;
                Some(vec![Stmt { kind: nested, span: Span::new(nested_start, self.previous_end()) }])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };

        Ok(StmtKind::If { cond, then_branch, else_branch })
    }

    fn parse_expr_or_assign(&mut self) -> Result<StmtKind, ParseError> {
        let target = self.parse_expr()?;
        if !self.check(&TokenKind::Eq) {
            return Ok(StmtKind::Expr(target));
        }

        if !matches!(target.kind, ExprKind::Ident(_) | ExprKind::Index { .. }) {
            return Err(ParseError::invalid_assign_target(target.span));
        }
        self.advance();
        self.skip_newlines();
        let value = self.parse_expr()?;
        Ok(StmtKind::Assign { target, value })
    }

    fn is_expr_start(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Int(_)
                | TokenKind::Float(_)
                | TokenKind::String(_)
                | TokenKind::Bool(_)
                | TokenKind::Nil
                | TokenKind::Ident(_)
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::Minus
                | TokenKind::Not
        )
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_expr_bp(0)
    }

    fn infix_bp(&self) -> Option<(u8, u8)> {
        Some(match self.current_kind() {
            TokenKind::Or => (1, 2),
            TokenKind::And => (3, 4),
            TokenKind::EqEq
            | TokenKind::BangEq
            | TokenKind::Lt
            | TokenKind::LtEq
            | TokenKind::Gt
            | TokenKind::GtEq => (7, 8),
            TokenKind::Plus | TokenKind::Minus => (9, 10),
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => (11, 12),
            _ => return None,
        })
    }

    fn parse_binop(&mut self) -> Result<BinOp, ParseError> {
        let op = match self.current_kind() {
            TokenKind::Or => BinOp::Or,
            TokenKind::And => BinOp::And,
            TokenKind::EqEq => BinOp::Eq,
            TokenKind::BangEq => BinOp::Ne,
            TokenKind::Lt => BinOp::Lt,
            TokenKind::LtEq => BinOp::Le,
            TokenKind::Gt => BinOp::Gt,
            TokenKind::GtEq => BinOp::Ge,
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            TokenKind::Star => BinOp::Mul,
            TokenKind::Slash => BinOp::Div,
            TokenKind::Percent => BinOp::Rem,
            found => return Err(ParseError::expected("operator like '+' or '-'", found, self.current().span)),
        };
        self.advance();
        Ok(op)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        self.nested(|p| p.parse_operand_chain(min_bp))
    }

    fn parse_operand_chain(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let start = self.current().span.start;
        let mut lhs = self.parse_prefix()?;
        // Each postfix or infix step nests `lhs` one level deeper.
        let mut chained = 0usize;

        loop {
            if matches!(self.current_kind(), TokenKind::LParen | TokenKind::LBracket) {
                if POSTFIX_BP < min_bp {
                    break;
                }
                chained += 1;
                if self.depth + chained > MAX_NESTING {
                    return Err(ParseError::too_deep(self.current().span));
                }
                lhs = self.parse_postfix(lhs, start)?;
                continue;
            }

            if let Some((l_bp, r_bp)) = self.infix_bp() {
                if l_bp < min_bp {
                    break;
                }
                chained += 1;
                if self.depth + chained > MAX_NESTING {
                    return Err(ParseError::too_deep(self.current().span));
                }
                let op = self.parse_binop()?;
                self.skip_newlines();
                let rhs = self.parse_expr_bp(r_bp)?;
                let end = rhs.span.end;
                lhs = Expr {
                    kind: ExprKind::Binary { op, left: Box::new(lhs), right: Box::new(rhs) },
                    span: Span::new(start, end),
                };
                continue;
            }

            break;
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        let start = self.current().span.start;
        let token = self.current().clone();

        let kind = match token.kind {
            TokenKind::Int(n) => {
                self.advance();
                ExprKind::Int(n)
            }
            TokenKind::Float(n) => {
                self.advance();
                ExprKind::Float(n)
            }
            TokenKind::String(s) => {
                self.advance();
                ExprKind::String(s)
            }
            TokenKind::Bool(b) => {
                self.advance();
                ExprKind::Bool(b)
            }
            TokenKind::Nil => {
                self.advance();
                ExprKind::Nil
            }
            TokenKind::Ident(name) => {
                self.advance();
                ExprKind::Ident(name)
            }
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_expr_bp(NEG_BP)?;
                ExprKind::Unary { op: UnaryOp::Neg, operand: Box::new(operand) }
            }
            TokenKind::Not => {
                self.advance();
                let operand = self.parse_expr_bp(NOT_BP)?;
                ExprKind::Unary { op: UnaryOp::Not, operand: Box::new(operand) }
            }
            TokenKind::LParen => {
                self.advance();
                self.skip_newlines();
                let inner = self.parse_expr()?;
                self.skip_newlines();
                self.expect(&TokenKind::RParen)?;
                // Grouping keeps the inner node; only the span widens.
                return Ok(Expr { kind: inner.kind, span: Span::new(start, self.previous_end()) });
            }
            TokenKind::LBracket => {
                self.advance();
                ExprKind::List(self.parse_list_items(&TokenKind::RBracket)?)
            }
            ref found => return Err(ParseError::expected("expression", found, token.span)),
        };

        Ok(Expr { kind, span: Span::new(start, self.previous_end()) })
    }

    fn parse_postfix(&mut self, lhs: Expr, start: usize) -> Result<Expr, ParseError> {
        let kind = if self.match_token(&TokenKind::LParen) {
            let args = self.parse_list_items(&TokenKind::RParen)?;
            ExprKind::Call { callee: Box::new(lhs), args }
        } else {
            self.expect(&TokenKind::LBracket)?;
            self.skip_newlines();
            let index = self.parse_expr()?;
            self.skip_newlines();
            self.expect(&TokenKind::RBracket)?;
            ExprKind::Index { target: Box::new(lhs), index: Box::new(index) }
        };
        Ok(Expr { kind, span: Span::new(start, self.previous_end()) })
    }

    /// Comma-separated expressions up to `close`, which is consumed. Newlines
    /// inside the delimiters are insignificant and a trailing comma is allowed.
    fn parse_list_items(&mut self, close: &TokenKind) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        self.skip_newlines();
        while !self.check(close) {
            items.push(self.parse_expr()?);
            self.skip_newlines();
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.expect(close)?;
        Ok(items)
    }
}

/// Result of parsing: statements plus any errors found.
#[derive(Debug)]
pub struct ParseResult {
    pub stmts: Vec<Stmt>,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A parse error with location and friendly message.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub span: Span,
    pub message: String,
    pub hint: Option<String>,
}

impl ParseError {
    fn expected(expected: &str, found: &TokenKind, span: Span) -> Self {
        let message = format_expected_message(expected, found);
        let hint = crate::hints::for_expected(expected, found).map(String::from);
        Self { span, message, hint }
    }

    fn invalid_assign_target(span: Span) -> Self {
        Self {
            span,
            message: "cannot assign to this expression".to_string(),
            hint: Some("assign to a name like `x = 1` or an element like `xs[0] = 1`".to_string()),
        }
    }

    fn duplicate_param(name: &str, span: Span) -> Self {
        Self {
            span,
            message: format!("duplicate parameter '{}'", name),
            hint: None,
        }
    }

    fn too_deep(span: Span) -> Self {
        Self {
            span,
            message: "expression nested too deeply".to_string(),
            hint: Some(format!("nesting is limited to {} levels; split it into smaller statements", MAX_NESTING)),
        }
    }

    fn unmatched_brace(span: Span) -> Self {
        Self {
            span,
            message: "unmatched '}'".to_string(),
            hint: Some("remove it or add the opening '{'".to_string()),
        }
    }
}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        Self { span: e.span, message: e.message, hint: e.hint }
    }
}

/// Format a user-friendly "expected X, found Y" message.
fn format_expected_message(expected: &str, found: &TokenKind) -> String {
    match expected {
        "newline or ';'" => format!("expected newline or ';' after statement, found {}", found.display_name()),
        "'{'" => format!("expected '{{' to start block, found {}", found.display_name()),
        "'}'" if matches!(found, TokenKind::Eof) => "unclosed '{' - missing '}'".to_string(),
        "')'" if matches!(found, TokenKind::Eof) => "unclosed '(' - missing ')'".to_string(),
        "']'" if matches!(found, TokenKind::Eof) => "unclosed '[' - missing ']'".to_string(),
        _ => format!("expected {}, found {}", expected, found.display_name()),
    }
}
