//! Expression lowering.
//!
//! Every expression lowers to exactly one [`Operand`]: an immediate
//! when constant folding succeeds, otherwise the temporary holding the
//! computed value. Array expressions that stop short of a full element
//! access evaluate to the element pointer, which is how arrays are
//! passed to functions.

use super::context::Gen;
use super::fold::fold_expr;
use crate::frontend::lexer::Span;
use crate::ir::ast::{BinaryOp, Expr, LVal, UnaryOp};
use crate::ir::symbol_table::Symbol;
use crate::ir::{Addr, BinOp, Instr, Operand};
use crate::{CompileError, SemanticErrorKind};

impl<'a> Gen<'a> {
    pub fn eval_expr(&mut self, expr: &Expr) -> Result<Operand, CompileError> {
        if let Some(value) = fold_expr(self, expr)? {
            return Ok(Operand::Imm(value));
        }

        match expr {
            Expr::Number(_, n) => Ok(Operand::Imm(*n)),

            Expr::LVal(lval) => self.eval_lval(lval),

            Expr::Call { name, args, span } => {
                let result = self.lower_call(name, args, *span)?;
                result.ok_or_else(|| {
                    self.error(
                        SemanticErrorKind::VoidValueUsed,
                        *span,
                        format!("void function '{name}' used as a value"),
                    )
                })
            }

            Expr::Unary { op, operand, .. } => {
                let value = self.eval_expr(operand)?;
                Ok(match op {
                    UnaryOp::Neg => self.emit_binary(BinOp::Sub, Operand::Imm(0), value),
                    UnaryOp::Not => self.emit_binary(BinOp::Eq, value, Operand::Imm(0)),
                })
            }

            Expr::Binary { op, lhs, rhs, .. } => {
                // Both operands are always evaluated; `&&` and `||` do
                // not short-circuit. Their results are normalized to
                // 0/1 before the bitwise op.
                let lhs = self.eval_expr(lhs)?;
                let rhs = self.eval_expr(rhs)?;
                Ok(match op {
                    BinaryOp::And => {
                        let lhs = self.emit_binary(BinOp::Ne, lhs, Operand::Imm(0));
                        let rhs = self.emit_binary(BinOp::Ne, rhs, Operand::Imm(0));
                        self.emit_binary(BinOp::And, lhs, rhs)
                    }
                    BinaryOp::Or => {
                        let any = self.emit_binary(BinOp::Or, lhs, rhs);
                        self.emit_binary(BinOp::Ne, any, Operand::Imm(0))
                    }
                    _ => self.emit_binary(ir_op(*op), lhs, rhs),
                })
            }
        }
    }

    /// Emit a binary instruction, or fold it when both operands are
    /// immediates. Division is never folded here so a runtime divide by
    /// zero stays a runtime event.
    pub fn emit_binary(&mut self, op: BinOp, lhs: Operand, rhs: Operand) -> Operand {
        if let (Operand::Imm(l), Operand::Imm(r)) = (lhs, rhs) {
            let folded = match op {
                BinOp::Add => Some(l.wrapping_add(r)),
                BinOp::Sub => Some(l.wrapping_sub(r)),
                BinOp::Mul => Some(l.wrapping_mul(r)),
                BinOp::Div | BinOp::Mod => None,
                BinOp::Lt => Some((l < r) as i32),
                BinOp::Gt => Some((l > r) as i32),
                BinOp::Le => Some((l <= r) as i32),
                BinOp::Ge => Some((l >= r) as i32),
                BinOp::Eq => Some((l == r) as i32),
                BinOp::Ne => Some((l != r) as i32),
                BinOp::And => Some(l & r),
                BinOp::Or => Some(l | r),
            };
            if let Some(value) = folded {
                return Operand::Imm(value);
            }
        }
        // Additive identity shows up constantly in address math.
        if op == BinOp::Add {
            if lhs == Operand::Imm(0) {
                return rhs;
            }
            if rhs == Operand::Imm(0) {
                return lhs;
            }
        }
        let dst = self.new_temp();
        self.emit(Instr::Binary { dst, op, lhs, rhs });
        Operand::Temp(dst)
    }

    /// Evaluate a (possibly indexed) name as a value.
    fn eval_lval(&mut self, lval: &LVal) -> Result<Operand, CompileError> {
        let Some(symbol) = self.symbols.lookup(&lval.name).cloned() else {
            return Err(self.error(
                SemanticErrorKind::UndefinedVariable,
                lval.span,
                format!("'{}' is not defined", lval.name),
            ));
        };

        match symbol {
            Symbol::Const(value) => {
                if lval.indices.is_empty() {
                    Ok(Operand::Imm(value))
                } else {
                    Err(self.not_an_array(lval))
                }
            }

            Symbol::Var { ir_name, is_global } => {
                if !lval.indices.is_empty() {
                    return Err(self.not_an_array(lval));
                }
                let addr = var_addr(ir_name, is_global);
                Ok(self.emit_load(addr))
            }

            Symbol::Array {
                ir_name,
                dims,
                is_global,
                ..
            } => {
                if lval.indices.len() > dims.len() {
                    return Err(self.not_an_array(lval));
                }
                let strides = array_strides(&dims);
                let base = var_addr(ir_name, is_global);
                let addr = self.offset_addr(base, &strides, &lval.indices)?;
                if lval.indices.len() == dims.len() {
                    Ok(self.emit_load(addr))
                } else {
                    // Partial access decays to a pointer.
                    Ok(addr_value(addr))
                }
            }

            Symbol::Ptr {
                ir_name,
                trailing_dims,
            } => {
                if lval.indices.len() > trailing_dims.len() + 1 {
                    return Err(self.not_an_array(lval));
                }
                let base = self.emit_load(Addr::Slot(ir_name));
                let base = match base {
                    Operand::Temp(t) => Addr::Ptr(t),
                    _ => unreachable!("loads always produce temporaries"),
                };
                let strides = ptr_strides(&trailing_dims);
                let addr = self.offset_addr(base, &strides, &lval.indices)?;
                if lval.indices.len() == trailing_dims.len() + 1 {
                    Ok(self.emit_load(addr))
                } else {
                    Ok(addr_value(addr))
                }
            }

            Symbol::Func { .. } => Err(self.error(
                SemanticErrorKind::NotAVariable,
                lval.span,
                format!("'{}' is a function, not a variable", lval.name),
            )),
        }
    }

    /// Resolve an assignment target to an address. Only fully indexed
    /// variable storage is assignable.
    pub fn lval_addr(&mut self, lval: &LVal) -> Result<Addr, CompileError> {
        let Some(symbol) = self.symbols.lookup(&lval.name).cloned() else {
            return Err(self.error(
                SemanticErrorKind::UndefinedVariable,
                lval.span,
                format!("'{}' is not defined", lval.name),
            ));
        };

        match symbol {
            Symbol::Const(_) => Err(self.error(
                SemanticErrorKind::NotAVariable,
                lval.span,
                format!("cannot assign to constant '{}'", lval.name),
            )),

            Symbol::Var { ir_name, is_global } => {
                if !lval.indices.is_empty() {
                    return Err(self.not_an_array(lval));
                }
                Ok(var_addr(ir_name, is_global))
            }

            Symbol::Array {
                ir_name,
                dims,
                is_global,
                ..
            } => {
                if lval.indices.len() != dims.len() {
                    return Err(self.error(
                        SemanticErrorKind::NotAVariable,
                        lval.span,
                        format!("cannot assign to array '{}'", lval.name),
                    ));
                }
                let strides = array_strides(&dims);
                let base = var_addr(ir_name, is_global);
                self.offset_addr(base, &strides, &lval.indices)
            }

            Symbol::Ptr {
                ir_name,
                trailing_dims,
            } => {
                if lval.indices.len() != trailing_dims.len() + 1 {
                    return Err(self.error(
                        SemanticErrorKind::NotAVariable,
                        lval.span,
                        format!("cannot assign to array '{}'", lval.name),
                    ));
                }
                let base = self.emit_load(Addr::Slot(ir_name));
                let base = match base {
                    Operand::Temp(t) => Addr::Ptr(t),
                    _ => unreachable!("loads always produce temporaries"),
                };
                let strides = ptr_strides(&trailing_dims);
                self.offset_addr(base, &strides, &lval.indices)
            }

            Symbol::Func { .. } => Err(self.error(
                SemanticErrorKind::NotAVariable,
                lval.span,
                format!("'{}' is a function, not a variable", lval.name),
            )),
        }
    }

    /// Lower a call. `Ok(None)` means the callee is void.
    pub fn lower_call(
        &mut self,
        name: &str,
        args: &[Expr],
        span: Span,
    ) -> Result<Option<Operand>, CompileError> {
        let (returns_value, param_count) = match self.symbols.lookup(name) {
            Some(Symbol::Func {
                returns_value,
                param_count,
            }) => (*returns_value, *param_count),
            Some(_) => {
                return Err(self.error(
                    SemanticErrorKind::NotAFunction,
                    span,
                    format!("'{name}' is not a function"),
                ));
            }
            None => {
                return Err(self.error(
                    SemanticErrorKind::UndefinedFunction,
                    span,
                    format!("function '{name}' is not defined"),
                ));
            }
        };

        if args.len() != param_count {
            return Err(self.error(
                SemanticErrorKind::ArgumentCountMismatch,
                span,
                format!(
                    "'{name}' expects {param_count} argument(s), got {}",
                    args.len()
                ),
            ));
        }

        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.eval_expr(arg)?);
        }

        let dst = if returns_value {
            Some(self.new_temp())
        } else {
            None
        };
        self.emit(Instr::Call {
            dst,
            func: name.to_string(),
            args: arg_values,
        });
        Ok(dst.map(Operand::Temp))
    }

    /// Emit the index arithmetic for `base[indices...]` and return the
    /// resulting element address. `strides` gives the word stride of
    /// each subscript position.
    fn offset_addr(
        &mut self,
        base: Addr,
        strides: &[usize],
        indices: &[Expr],
    ) -> Result<Addr, CompileError> {
        let mut offset = Operand::Imm(0);
        for (expr, stride) in indices.iter().zip(strides) {
            let index = self.eval_expr(expr)?;
            let scaled =
                self.emit_binary(BinOp::Mul, index, Operand::Imm((stride * 4) as i32));
            offset = self.emit_binary(BinOp::Add, offset, scaled);
        }
        let dst = self.new_temp();
        self.emit(Instr::GetPtr { dst, base, offset });
        Ok(Addr::Ptr(dst))
    }

    fn emit_load(&mut self, addr: Addr) -> Operand {
        let dst = self.new_temp();
        self.emit(Instr::Load { dst, addr });
        Operand::Temp(dst)
    }

    fn not_an_array(&self, lval: &LVal) -> CompileError {
        self.error(
            SemanticErrorKind::NotAnArray,
            lval.span,
            format!("'{}' cannot be subscripted like that", lval.name),
        )
    }
}

fn var_addr(ir_name: String, is_global: bool) -> Addr {
    if is_global {
        Addr::Global(ir_name)
    } else {
        Addr::Slot(ir_name)
    }
}

fn addr_value(addr: Addr) -> Operand {
    match addr {
        Addr::Ptr(t) => Operand::Temp(t),
        _ => unreachable!("offset_addr always yields a pointer temporary"),
    }
}

/// Word stride of each subscript of an array with the given dims.
fn array_strides(dims: &[usize]) -> Vec<usize> {
    (0..dims.len())
        .map(|i| dims[i + 1..].iter().product())
        .collect()
}

/// Word stride of each subscript of a decayed array parameter: the
/// first subscript steps over a whole trailing sub-array.
fn ptr_strides(trailing_dims: &[usize]) -> Vec<usize> {
    let mut strides = vec![trailing_dims.iter().product::<usize>()];
    strides.extend(
        (0..trailing_dims.len()).map(|i| trailing_dims[i + 1..].iter().product::<usize>()),
    );
    strides
}

fn ir_op(op: BinaryOp) -> BinOp {
    match op {
        BinaryOp::Add => BinOp::Add,
        BinaryOp::Sub => BinOp::Sub,
        BinaryOp::Mul => BinOp::Mul,
        BinaryOp::Div => BinOp::Div,
        BinaryOp::Mod => BinOp::Mod,
        BinaryOp::Lt => BinOp::Lt,
        BinaryOp::Gt => BinOp::Gt,
        BinaryOp::Le => BinOp::Le,
        BinaryOp::Ge => BinOp::Ge,
        BinaryOp::Eq => BinOp::Eq,
        BinaryOp::Neq => BinOp::Ne,
        BinaryOp::And => BinOp::And,
        BinaryOp::Or => BinOp::Or,
    }
}
