//! Lowering of declarations, statements and function definitions.

use super::context::{Gen, LoopCtx};
use super::fold::eval_const;
use crate::ir::ast::{
    Block, BlockItem, Decl, Expr, FuncDef, FuncType, InitVal, Span, Stmt, VarDef,
};
use crate::ir::symbol_table::Symbol;
use crate::ir::{Addr, Global, Instr, Operand, Terminator};
use crate::{CompileError, SemanticErrorKind};

impl<'a> Gen<'a> {
    // ── Functions ───────────────────────────────────────────────────────

    pub fn lower_function(&mut self, func: &FuncDef) -> Result<(), CompileError> {
        let returns_value = func.ret == FuncType::Int;
        // Registered before the body so the function can call itself.
        // Functions defined later in the file stay invisible here.
        let defined = self.symbols.define(
            &func.name,
            Symbol::Func {
                returns_value,
                param_count: func.params.len(),
            },
        );
        if !defined {
            return Err(self.error(
                SemanticErrorKind::Redefinition,
                func.span,
                format!("'{}' is already defined", func.name),
            ));
        }

        self.start_function(returns_value);
        self.symbols.enter_scope();

        // Arguments are copied into ordinary local slots right away, so
        // the rest of lowering never distinguishes parameters from
        // locals.
        for (i, param) in func.params.iter().enumerate() {
            let ir_name = self.local_name(&param.name);
            self.emit(Instr::Alloc {
                name: ir_name.clone(),
                words: 1,
            });
            self.emit(Instr::Store {
                addr: Addr::Slot(ir_name.clone()),
                src: Operand::Arg(i as u8),
            });
            let symbol = match &param.array_dims {
                None => Symbol::Var {
                    ir_name,
                    is_global: false,
                },
                Some(dim_exprs) => {
                    let mut trailing_dims = Vec::with_capacity(dim_exprs.len());
                    for expr in dim_exprs {
                        trailing_dims.push(self.eval_dim(expr)?);
                    }
                    Symbol::Ptr {
                        ir_name,
                        trailing_dims,
                    }
                }
            };
            if !self.symbols.define(&param.name, symbol) {
                return Err(self.error(
                    SemanticErrorKind::Redefinition,
                    param.span,
                    format!("duplicate parameter '{}'", param.name),
                ));
            }
        }

        // The body opens its own scope, so a local may shadow a
        // parameter of the same name.
        self.symbols.enter_scope();
        let result = self.lower_block(&func.body);
        self.symbols.exit_scope();
        self.symbols.exit_scope();
        result?;

        self.finish_function(func.name.clone(), func.params.len());
        Ok(())
    }

    pub fn lower_block(&mut self, block: &Block) -> Result<(), CompileError> {
        for item in &block.items {
            match item {
                BlockItem::Decl(decl) => self.lower_local_decl(decl)?,
                BlockItem::Stmt(stmt) => self.lower_stmt(stmt)?,
            }
        }
        Ok(())
    }

    // ── Statements ──────────────────────────────────────────────────────

    pub fn lower_stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        match stmt {
            Stmt::Assign { target, value, .. } => {
                let addr = self.lval_addr(target)?;
                let src = self.eval_expr(value)?;
                self.emit(Instr::Store { addr, src });
                Ok(())
            }

            Stmt::Expr(None) => Ok(()),
            Stmt::Expr(Some(expr)) => {
                // A bare call may be void; anything else evaluates for
                // its side effects and drops the value.
                if let Expr::Call { name, args, span } = expr {
                    self.lower_call(name, args, *span)?;
                } else {
                    self.eval_expr(expr)?;
                }
                Ok(())
            }

            Stmt::Block(block) => {
                self.symbols.enter_scope();
                let result = self.lower_block(block);
                self.symbols.exit_scope();
                result
            }

            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => self.lower_if(cond, then_branch, else_branch.as_deref()),

            Stmt::While { cond, body, .. } => self.lower_while(cond, body),

            Stmt::Break(span) => {
                let Some(ctx) = self.loops.last() else {
                    return Err(self.error(
                        SemanticErrorKind::BreakOutsideLoop,
                        *span,
                        "break outside of a loop",
                    ));
                };
                let exit = ctx.exit.clone();
                self.seal(Terminator::Jump(exit));
                Ok(())
            }

            Stmt::Continue(span) => {
                let Some(ctx) = self.loops.last() else {
                    return Err(self.error(
                        SemanticErrorKind::ContinueOutsideLoop,
                        *span,
                        "continue outside of a loop",
                    ));
                };
                let entry = ctx.entry.clone();
                self.seal(Terminator::Jump(entry));
                Ok(())
            }

            Stmt::Return { value, span } => self.lower_return(value.as_ref(), *span),
        }
    }

    fn lower_if(
        &mut self,
        cond: &Expr,
        then_branch: &Stmt,
        else_branch: Option<&Stmt>,
    ) -> Result<(), CompileError> {
        let cond = self.eval_expr(cond)?;
        let then_label = self.new_label("then");
        let else_label = else_branch.map(|_| self.new_label("else"));
        let end_label = self.new_label("endif");

        let false_target = else_label.clone().unwrap_or_else(|| end_label.clone());
        self.seal(Terminator::Branch {
            cond,
            then_label: then_label.clone(),
            else_label: false_target,
        });

        self.start_block(then_label);
        self.lower_stmt(then_branch)?;
        self.seal(Terminator::Jump(end_label.clone()));

        if let (Some(label), Some(branch)) = (else_label, else_branch) {
            self.start_block(label);
            self.lower_stmt(branch)?;
            self.seal(Terminator::Jump(end_label.clone()));
        }

        self.start_block(end_label);
        Ok(())
    }

    fn lower_while(&mut self, cond: &Expr, body: &Stmt) -> Result<(), CompileError> {
        let entry = self.new_label("while_entry");
        let body_label = self.new_label("while_body");
        let end_label = self.new_label("while_end");

        self.seal(Terminator::Jump(entry.clone()));
        self.start_block(entry.clone());
        let cond = self.eval_expr(cond)?;
        self.seal(Terminator::Branch {
            cond,
            then_label: body_label.clone(),
            else_label: end_label.clone(),
        });

        self.start_block(body_label);
        self.loops.push(LoopCtx {
            entry: entry.clone(),
            exit: end_label.clone(),
        });
        let result = self.lower_stmt(body);
        self.loops.pop();
        result?;
        self.seal(Terminator::Jump(entry));

        self.start_block(end_label);
        Ok(())
    }

    fn lower_return(&mut self, value: Option<&Expr>, span: Span) -> Result<(), CompileError> {
        match (value, self.returns_value()) {
            (Some(expr), true) => {
                let value = self.eval_expr(expr)?;
                self.seal(Terminator::Ret(Some(value)));
            }
            (None, false) => self.seal(Terminator::Ret(None)),
            (Some(_), false) => {
                return Err(self.error(
                    SemanticErrorKind::ReturnTypeMismatch,
                    span,
                    "void function cannot return a value",
                ));
            }
            (None, true) => {
                return Err(self.error(
                    SemanticErrorKind::ReturnTypeMismatch,
                    span,
                    "function must return a value",
                ));
            }
        }
        Ok(())
    }

    // ── Declarations ────────────────────────────────────────────────────

    pub fn lower_global_decl(&mut self, decl: &Decl) -> Result<(), CompileError> {
        for def in &decl.defs {
            self.lower_global_def(def, decl.is_const)?;
        }
        Ok(())
    }

    fn lower_global_def(&mut self, def: &VarDef, is_const: bool) -> Result<(), CompileError> {
        let dims = self.eval_dims(&def.dims)?;

        if dims.is_empty() {
            // Global initializers must be compile-time constants.
            let value = match &def.init {
                Some(InitVal::Expr(expr)) => eval_const(self, expr)?,
                Some(InitVal::List(_)) => {
                    return Err(self.brace_init_on_scalar(def));
                }
                None => 0,
            };
            let symbol = if is_const {
                Symbol::Const(value)
            } else {
                Symbol::Var {
                    ir_name: def.name.clone(),
                    is_global: true,
                }
            };
            self.define_or_redef(&def.name, symbol, def.span)?;
            if !is_const {
                self.program.globals.push(Global {
                    name: def.name.clone(),
                    words: 1,
                    init: vec![value],
                    is_array: false,
                });
            }
            return Ok(());
        }

        let words: usize = dims.iter().product();
        let flat = match &def.init {
            Some(init) => self.flatten_init(init, &dims, def.span)?,
            None => vec![None; words],
        };
        let mut values = Vec::with_capacity(words);
        for slot in &flat {
            values.push(match slot {
                Some(expr) => eval_const(self, expr)?,
                None => 0,
            });
        }

        let symbol = Symbol::Array {
            ir_name: def.name.clone(),
            dims,
            is_global: true,
            const_values: is_const.then(|| values.clone()),
        };
        self.define_or_redef(&def.name, symbol, def.span)?;
        self.program.globals.push(Global {
            name: def.name.clone(),
            words,
            init: values,
            is_array: true,
        });
        Ok(())
    }

    pub fn lower_local_decl(&mut self, decl: &Decl) -> Result<(), CompileError> {
        for def in &decl.defs {
            self.lower_local_def(def, decl.is_const)?;
        }
        Ok(())
    }

    fn lower_local_def(&mut self, def: &VarDef, is_const: bool) -> Result<(), CompileError> {
        let dims = self.eval_dims(&def.dims)?;

        if dims.is_empty() {
            if is_const {
                // A const scalar is a pure compile-time binding, no
                // storage is allocated for it.
                let value = match &def.init {
                    Some(InitVal::Expr(expr)) => eval_const(self, expr)?,
                    Some(InitVal::List(_)) => return Err(self.brace_init_on_scalar(def)),
                    None => unreachable!("parser requires const initializers"),
                };
                return self.define_or_redef(&def.name, Symbol::Const(value), def.span);
            }

            // Evaluate the initializer before binding the name, so
            // `int x = x;` reads the outer `x`.
            let init = match &def.init {
                Some(InitVal::Expr(expr)) => Some(self.eval_expr(expr)?),
                Some(InitVal::List(_)) => return Err(self.brace_init_on_scalar(def)),
                None => None,
            };
            let ir_name = self.local_name(&def.name);
            self.emit(Instr::Alloc {
                name: ir_name.clone(),
                words: 1,
            });
            if let Some(src) = init {
                self.emit(Instr::Store {
                    addr: Addr::Slot(ir_name.clone()),
                    src,
                });
            }
            return self.define_or_redef(
                &def.name,
                Symbol::Var {
                    ir_name,
                    is_global: false,
                },
                def.span,
            );
        }

        let words: usize = dims.iter().product();
        let flat = match &def.init {
            Some(init) => Some(self.flatten_init(init, &dims, def.span)?),
            None => None,
        };

        let ir_name = self.local_name(&def.name);
        self.emit(Instr::Alloc {
            name: ir_name.clone(),
            words,
        });

        // Initialized local arrays are filled element by element;
        // gaps in the initializer become zero stores.
        let mut const_values = is_const.then(|| Vec::with_capacity(words));
        if let Some(flat) = flat {
            for (i, slot) in flat.iter().enumerate() {
                let src = match slot {
                    Some(expr) => {
                        if let Some(values) = const_values.as_mut() {
                            let value = eval_const(self, expr)?;
                            values.push(value);
                            Operand::Imm(value)
                        } else {
                            self.eval_expr(expr)?
                        }
                    }
                    None => {
                        if let Some(values) = const_values.as_mut() {
                            values.push(0);
                        }
                        Operand::Imm(0)
                    }
                };
                let dst = self.new_temp();
                self.emit(Instr::GetPtr {
                    dst,
                    base: Addr::Slot(ir_name.clone()),
                    offset: Operand::Imm((i * 4) as i32),
                });
                self.emit(Instr::Store {
                    addr: Addr::Ptr(dst),
                    src,
                });
            }
        }

        self.define_or_redef(
            &def.name,
            Symbol::Array {
                ir_name,
                dims,
                is_global: false,
                const_values,
            },
            def.span,
        )
    }

    // ── Declaration helpers ─────────────────────────────────────────────

    fn eval_dims(&mut self, dims: &[Expr]) -> Result<Vec<usize>, CompileError> {
        dims.iter().map(|expr| self.eval_dim(expr)).collect()
    }

    fn eval_dim(&mut self, expr: &Expr) -> Result<usize, CompileError> {
        let value = eval_const(self, expr)?;
        if value <= 0 {
            return Err(self.error(
                SemanticErrorKind::InvalidArrayDimension,
                expr.span(),
                format!("array dimension must be positive, got {value}"),
            ));
        }
        Ok(value as usize)
    }

    /// Flatten a brace initializer into one slot per array element,
    /// row-major. A nested list fills the largest sub-array whose
    /// boundary the current position sits on; unfilled slots stay
    /// `None` and read as zero.
    fn flatten_init(
        &self,
        init: &InitVal,
        dims: &[usize],
        span: Span,
    ) -> Result<Vec<Option<Expr>>, CompileError> {
        let InitVal::List(items) = init else {
            return Err(self.error(
                SemanticErrorKind::InvalidInitializer,
                span,
                "array initializer must be a brace list",
            ));
        };
        let total: usize = dims.iter().product();
        let mut out = vec![None; total];
        self.fill_init(items, dims, &mut out, span)?;
        Ok(out)
    }

    fn fill_init(
        &self,
        items: &[InitVal],
        dims: &[usize],
        out: &mut [Option<Expr>],
        span: Span,
    ) -> Result<(), CompileError> {
        let mut pos = 0usize;
        for item in items {
            match item {
                InitVal::Expr(expr) => {
                    if pos >= out.len() {
                        return Err(self.too_many_initializers(span));
                    }
                    out[pos] = Some(expr.clone());
                    pos += 1;
                }
                InitVal::List(sub) => {
                    let mut d = 1;
                    while d < dims.len() {
                        let stride: usize = dims[d..].iter().product();
                        if pos % stride == 0 {
                            break;
                        }
                        d += 1;
                    }
                    if d >= dims.len() {
                        return Err(self.error(
                            SemanticErrorKind::InvalidInitializer,
                            span,
                            "nested initializer does not start at a sub-array boundary",
                        ));
                    }
                    let stride: usize = dims[d..].iter().product();
                    if pos + stride > out.len() {
                        return Err(self.too_many_initializers(span));
                    }
                    self.fill_init(sub, &dims[d..], &mut out[pos..pos + stride], span)?;
                    pos += stride;
                }
            }
        }
        Ok(())
    }

    fn define_or_redef(
        &mut self,
        name: &str,
        symbol: Symbol,
        span: Span,
    ) -> Result<(), CompileError> {
        if self.symbols.define(name, symbol) {
            Ok(())
        } else {
            Err(self.error(
                SemanticErrorKind::Redefinition,
                span,
                format!("'{name}' is already defined in this scope"),
            ))
        }
    }

    fn brace_init_on_scalar(&self, def: &VarDef) -> CompileError {
        self.error(
            SemanticErrorKind::InvalidInitializer,
            def.span,
            format!("'{}' is not an array, brace initializer is invalid", def.name),
        )
    }

    fn too_many_initializers(&self, span: Span) -> CompileError {
        self.error(
            SemanticErrorKind::InvalidInitializer,
            span,
            "too many values in array initializer",
        )
    }
}
