//! Frontend — lexing and parsing.
//!
//! The lexer is a `logos` derive lexer; the parser is a hand-written
//! recursive-descent parser over the token stream. Expression parsing
//! follows the precedence chain
//! `lor → land → eq → rel → add → mul → unary → primary`.

pub mod lexer;

use crate::ir::ast::*;
use crate::CompileError;
use lexer::{position_to_line_col, Span, Token};

/// Parse source text into a [`CompUnit`].
pub fn parse(source: &str) -> Result<CompUnit, CompileError> {
    let tokens = lexer::tokenize(source)?;
    Parser::new(source, tokens).parse_comp_unit()
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<(Token, Span)>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, tokens: Vec<(Token, Span)>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
        }
    }

    // ── Token stream helpers ────────────────────────────────────────────

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|(t, _)| t)
    }

    fn current_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some((_, span)) => *span,
            None => {
                let end = self.source.len();
                Span::new(end, end)
            }
        }
    }

    fn prev_span(&self) -> Span {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some((_, span)) => *span,
            None => Span::new(0, 0),
        }
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, tok: &Token) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: Token) -> Result<Span, CompileError> {
        if self.peek() == Some(&tok) {
            let span = self.current_span();
            self.pos += 1;
            Ok(span)
        } else {
            Err(self.error_here(format!("expected '{}'", tok)))
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Span), CompileError> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                let span = self.current_span();
                self.pos += 1;
                Ok((name, span))
            }
            _ => Err(self.error_here("expected identifier".to_string())),
        }
    }

    fn error_here(&self, message: String) -> CompileError {
        let span = self.current_span();
        let (line, col) = position_to_line_col(self.source, span.start);
        let message = match self.peek() {
            Some(tok) => format!("{message}, found '{tok}'"),
            None => format!("{message}, found end of input"),
        };
        CompileError::Parse { line, col, message }
    }

    // ── Top level ───────────────────────────────────────────────────────

    fn parse_comp_unit(&mut self) -> Result<CompUnit, CompileError> {
        let mut items = Vec::new();
        while self.peek().is_some() {
            items.push(self.parse_global_item()?);
        }
        Ok(CompUnit { items })
    }

    fn parse_global_item(&mut self) -> Result<GlobalItem, CompileError> {
        match self.peek() {
            Some(Token::Const) => Ok(GlobalItem::Decl(self.parse_decl()?)),
            Some(Token::Void) => Ok(GlobalItem::Func(self.parse_func_def()?)),
            Some(Token::Int) => {
                // `int name (` starts a function definition, anything else
                // is a variable declaration.
                if matches!(self.peek_at(1), Some(Token::Ident(_)))
                    && self.peek_at(2) == Some(&Token::LParen)
                {
                    Ok(GlobalItem::Func(self.parse_func_def()?))
                } else {
                    Ok(GlobalItem::Decl(self.parse_decl()?))
                }
            }
            _ => Err(self.error_here("expected declaration or function definition".to_string())),
        }
    }

    // ── Declarations ────────────────────────────────────────────────────

    fn parse_decl(&mut self) -> Result<Decl, CompileError> {
        let is_const = self.eat(&Token::Const);
        self.expect(Token::Int)?;

        let mut defs = vec![self.parse_var_def(is_const)?];
        while self.eat(&Token::Comma) {
            defs.push(self.parse_var_def(is_const)?);
        }
        self.expect(Token::Semicolon)?;
        Ok(Decl { is_const, defs })
    }

    fn parse_var_def(&mut self, is_const: bool) -> Result<VarDef, CompileError> {
        let (name, name_span) = self.expect_ident()?;

        let mut dims = Vec::new();
        while self.eat(&Token::LBracket) {
            dims.push(self.parse_expr()?);
            self.expect(Token::RBracket)?;
        }

        let init = if self.eat(&Token::Assign) {
            Some(self.parse_init_val()?)
        } else if is_const {
            return Err(self.error_here(format!("const '{name}' requires an initializer")));
        } else {
            None
        };

        let span = name_span.to(self.prev_span());
        Ok(VarDef {
            name,
            dims,
            init,
            span,
        })
    }

    fn parse_init_val(&mut self) -> Result<InitVal, CompileError> {
        if self.eat(&Token::LBrace) {
            let mut items = Vec::new();
            if self.peek() != Some(&Token::RBrace) {
                items.push(self.parse_init_val()?);
                while self.eat(&Token::Comma) {
                    items.push(self.parse_init_val()?);
                }
            }
            self.expect(Token::RBrace)?;
            Ok(InitVal::List(items))
        } else {
            Ok(InitVal::Expr(self.parse_expr()?))
        }
    }

    // ── Functions ───────────────────────────────────────────────────────

    fn parse_func_def(&mut self) -> Result<FuncDef, CompileError> {
        let start = self.current_span();
        let ret = match self.advance() {
            Some(Token::Int) => FuncType::Int,
            Some(Token::Void) => FuncType::Void,
            _ => return Err(self.error_here("expected 'int' or 'void'".to_string())),
        };
        let (name, _) = self.expect_ident()?;

        self.expect(Token::LParen)?;
        let mut params = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            params.push(self.parse_func_param()?);
            while self.eat(&Token::Comma) {
                params.push(self.parse_func_param()?);
            }
        }
        self.expect(Token::RParen)?;

        let body = self.parse_block()?;
        let span = start.to(self.prev_span());
        Ok(FuncDef {
            ret,
            name,
            params,
            body,
            span,
        })
    }

    fn parse_func_param(&mut self) -> Result<FuncParam, CompileError> {
        let start = self.current_span();
        self.expect(Token::Int)?;
        let (name, _) = self.expect_ident()?;

        let array_dims = if self.eat(&Token::LBracket) {
            // First dimension is unsized: `int a[]`.
            self.expect(Token::RBracket)?;
            let mut dims = Vec::new();
            while self.eat(&Token::LBracket) {
                dims.push(self.parse_expr()?);
                self.expect(Token::RBracket)?;
            }
            Some(dims)
        } else {
            None
        };

        let span = start.to(self.prev_span());
        Ok(FuncParam {
            name,
            array_dims,
            span,
        })
    }

    // ── Statements ──────────────────────────────────────────────────────

    fn parse_block(&mut self) -> Result<Block, CompileError> {
        self.expect(Token::LBrace)?;
        let mut items = Vec::new();
        while self.peek() != Some(&Token::RBrace) {
            if self.peek().is_none() {
                return Err(self.error_here("expected '}'".to_string()));
            }
            items.push(self.parse_block_item()?);
        }
        self.expect(Token::RBrace)?;
        Ok(Block { items })
    }

    fn parse_block_item(&mut self) -> Result<BlockItem, CompileError> {
        match self.peek() {
            Some(Token::Const) | Some(Token::Int) => Ok(BlockItem::Decl(self.parse_decl()?)),
            _ => Ok(BlockItem::Stmt(self.parse_stmt()?)),
        }
    }

    fn parse_stmt(&mut self) -> Result<Stmt, CompileError> {
        match self.peek() {
            Some(Token::LBrace) => Ok(Stmt::Block(self.parse_block()?)),
            Some(Token::Semicolon) => {
                self.advance();
                Ok(Stmt::Expr(None))
            }
            Some(Token::If) => self.parse_if(),
            Some(Token::While) => self.parse_while(),
            Some(Token::Break) => {
                let span = self.current_span();
                self.advance();
                self.expect(Token::Semicolon)?;
                Ok(Stmt::Break(span))
            }
            Some(Token::Continue) => {
                let span = self.current_span();
                self.advance();
                self.expect(Token::Semicolon)?;
                Ok(Stmt::Continue(span))
            }
            Some(Token::Return) => {
                let start = self.current_span();
                self.advance();
                let value = if self.peek() == Some(&Token::Semicolon) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                let end = self.expect(Token::Semicolon)?;
                Ok(Stmt::Return {
                    value,
                    span: start.to(end),
                })
            }
            _ => self.parse_assign_or_expr(),
        }
    }

    fn parse_if(&mut self) -> Result<Stmt, CompileError> {
        let start = self.expect(Token::If)?;
        self.expect(Token::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(Token::RParen)?;
        let then_branch = Box::new(self.parse_stmt()?);
        let else_branch = if self.eat(&Token::Else) {
            Some(Box::new(self.parse_stmt()?))
        } else {
            None
        };
        let span = start.to(self.prev_span());
        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
            span,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, CompileError> {
        let start = self.expect(Token::While)?;
        self.expect(Token::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(Token::RParen)?;
        let body = Box::new(self.parse_stmt()?);
        let span = start.to(self.prev_span());
        Ok(Stmt::While { cond, body, span })
    }

    /// Disambiguate `x = e;` / `a[i] = e;` from an expression statement
    /// such as `f();` by trying an lvalue first and rewinding when no
    /// `=` follows.
    fn parse_assign_or_expr(&mut self) -> Result<Stmt, CompileError> {
        if matches!(self.peek(), Some(Token::Ident(_))) {
            let mark = self.pos;
            if let Ok(target) = self.parse_lval() {
                if self.eat(&Token::Assign) {
                    let value = self.parse_expr()?;
                    let end = self.expect(Token::Semicolon)?;
                    let span = target.span.to(end);
                    return Ok(Stmt::Assign {
                        target,
                        value,
                        span,
                    });
                }
            }
            self.pos = mark;
        }

        let expr = self.parse_expr()?;
        self.expect(Token::Semicolon)?;
        Ok(Stmt::Expr(Some(expr)))
    }

    fn parse_lval(&mut self) -> Result<LVal, CompileError> {
        let (name, name_span) = self.expect_ident()?;
        let mut indices = Vec::new();
        while self.eat(&Token::LBracket) {
            indices.push(self.parse_expr()?);
            self.expect(Token::RBracket)?;
        }
        let span = name_span.to(self.prev_span());
        Ok(LVal {
            name,
            indices,
            span,
        })
    }

    // ── Expressions ─────────────────────────────────────────────────────

    fn parse_expr(&mut self) -> Result<Expr, CompileError> {
        self.parse_lor()
    }

    fn parse_lor(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_land()?;
        while self.eat(&Token::OrOr) {
            let rhs = self.parse_land()?;
            lhs = binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_land(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_eq()?;
        while self.eat(&Token::AndAnd) {
            let rhs = self.parse_eq()?;
            lhs = binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_eq(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_rel()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => BinaryOp::Eq,
                Some(Token::Neq) => BinaryOp::Neq,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_rel()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_rel(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_add()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Le) => BinaryOp::Le,
                Some(Token::Ge) => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_add()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_add(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_mul()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_mul(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, CompileError> {
        match self.peek() {
            Some(Token::Plus) => {
                // Unary plus is a no-op.
                self.advance();
                self.parse_unary()
            }
            Some(Token::Minus) => {
                let start = self.current_span();
                self.advance();
                let operand = Box::new(self.parse_unary()?);
                let span = start.to(operand.span());
                Ok(Expr::Unary {
                    op: UnaryOp::Neg,
                    operand,
                    span,
                })
            }
            Some(Token::Not) => {
                let start = self.current_span();
                self.advance();
                let operand = Box::new(self.parse_unary()?);
                let span = start.to(operand.span());
                Ok(Expr::Unary {
                    op: UnaryOp::Not,
                    operand,
                    span,
                })
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, CompileError> {
        match self.peek() {
            Some(Token::LParen) => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Some(Token::Number(n)) => {
                let n = *n;
                let span = self.current_span();
                self.advance();
                Ok(Expr::Number(span, n))
            }
            Some(Token::Ident(_)) => {
                if self.peek_at(1) == Some(&Token::LParen) {
                    self.parse_call()
                } else {
                    Ok(Expr::LVal(self.parse_lval()?))
                }
            }
            _ => Err(self.error_here("expected expression".to_string())),
        }
    }

    fn parse_call(&mut self) -> Result<Expr, CompileError> {
        let (name, name_span) = self.expect_ident()?;
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            args.push(self.parse_expr()?);
            while self.eat(&Token::Comma) {
                args.push(self.parse_expr()?);
            }
        }
        let end = self.expect(Token::RParen)?;
        Ok(Expr::Call {
            name,
            args,
            span: name_span.to(end),
        })
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    let span = lhs.span().to(rhs.span());
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        span,
    }
}
