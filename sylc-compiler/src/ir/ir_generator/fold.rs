//! Compile-time expression evaluation.
//!
//! [`fold_expr`] answers "does this expression have a value known at
//! compile time?", consulting the symbol table for constants. It is
//! used both opportunistically (every folded expression becomes an
//! immediate instead of instructions) and as the backbone of
//! [`eval_const`], which contexts like array dimensions and `const`
//! initializers require to succeed.
//!
//! Arithmetic wraps on overflow, matching the two's-complement
//! behaviour of the generated code.

use super::context::Gen;
use crate::ir::ast::{BinaryOp, Expr, UnaryOp};
use crate::ir::symbol_table::Symbol;
use crate::{CompileError, SemanticErrorKind};

/// Try to evaluate `expr` at compile time. `Ok(None)` means the value
/// is not a compile-time constant; an error is only produced for
/// expressions that are constant but ill-formed (division by zero).
pub fn fold_expr(gen: &Gen, expr: &Expr) -> Result<Option<i32>, CompileError> {
    match expr {
        Expr::Number(_, n) => Ok(Some(*n)),

        Expr::LVal(lval) => match gen.symbols.lookup(&lval.name) {
            Some(Symbol::Const(value)) if lval.indices.is_empty() => Ok(Some(*value)),
            Some(Symbol::Array {
                dims,
                const_values: Some(values),
                ..
            }) if lval.indices.len() == dims.len() => {
                // A const array element folds when every subscript does.
                let mut flat = 0usize;
                for (i, index_expr) in lval.indices.iter().enumerate() {
                    let index = match fold_expr(gen, index_expr)? {
                        Some(v) if v >= 0 => v as usize,
                        _ => return Ok(None),
                    };
                    let stride: usize = dims[i + 1..].iter().product();
                    flat += index * stride;
                }
                Ok(values.get(flat).copied())
            }
            _ => Ok(None),
        },

        Expr::Call { .. } => Ok(None),

        Expr::Unary { op, operand, .. } => {
            let Some(value) = fold_expr(gen, operand)? else {
                return Ok(None);
            };
            Ok(Some(match op {
                UnaryOp::Neg => value.wrapping_neg(),
                UnaryOp::Not => (value == 0) as i32,
            }))
        }

        Expr::Binary {
            op, lhs, rhs, span, ..
        } => {
            // Both sides must fold, even for `&&` and `||`: logical
            // operators always evaluate both operands, so a folded
            // left side alone must not erase the right side's code.
            let (Some(l), Some(r)) = (fold_expr(gen, lhs)?, fold_expr(gen, rhs)?) else {
                return Ok(None);
            };
            let value = match op {
                BinaryOp::Add => l.wrapping_add(r),
                BinaryOp::Sub => l.wrapping_sub(r),
                BinaryOp::Mul => l.wrapping_mul(r),
                BinaryOp::Div | BinaryOp::Mod if r == 0 => {
                    return Err(gen.error(
                        SemanticErrorKind::DivisionByZero,
                        *span,
                        "division by zero in constant expression",
                    ));
                }
                BinaryOp::Div => l.wrapping_div(r),
                BinaryOp::Mod => l.wrapping_rem(r),
                BinaryOp::Lt => (l < r) as i32,
                BinaryOp::Gt => (l > r) as i32,
                BinaryOp::Le => (l <= r) as i32,
                BinaryOp::Ge => (l >= r) as i32,
                BinaryOp::Eq => (l == r) as i32,
                BinaryOp::Neq => (l != r) as i32,
                BinaryOp::And => (l != 0 && r != 0) as i32,
                BinaryOp::Or => (l != 0 || r != 0) as i32,
            };
            Ok(Some(value))
        }
    }
}

/// Evaluate an expression that the language requires to be constant.
pub fn eval_const(gen: &Gen, expr: &Expr) -> Result<i32, CompileError> {
    match fold_expr(gen, expr)? {
        Some(value) => Ok(value),
        None => Err(gen.error(
            SemanticErrorKind::NonConstantExpression,
            expr.span(),
            "expression is not a compile-time constant",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend;
    use crate::ir::ast::{BlockItem, GlobalItem, Stmt};

    /// Parse `src` as a full program and pull the first expression
    /// statement out of `main`.
    fn first_expr(src: &str) -> Expr {
        let unit = frontend::parse(src).expect("parse failed");
        for item in unit.items {
            if let GlobalItem::Func(func) = item {
                for item in func.body.items {
                    if let BlockItem::Stmt(Stmt::Expr(Some(expr))) = item {
                        return expr;
                    }
                }
            }
        }
        panic!("no expression statement in source");
    }

    #[test]
    fn folds_arithmetic_with_precedence() {
        let gen = Gen::new("");
        let expr = first_expr("int main() { 1 + 2 * 3; }");
        assert_eq!(fold_expr(&gen, &expr).unwrap(), Some(7));
    }

    #[test]
    fn folds_relational_and_logical_chain() {
        let gen = Gen::new("");
        let expr = first_expr("int main() { (5 > 3) && (2 < 1); }");
        assert_eq!(fold_expr(&gen, &expr).unwrap(), Some(0));
    }

    #[test]
    fn folds_unary_not_and_negation() {
        let gen = Gen::new("");
        let expr = first_expr("int main() { !(3 - 3) + -2; }");
        assert_eq!(fold_expr(&gen, &expr).unwrap(), Some(-1));
    }

    #[test]
    fn resolves_named_constants() {
        let mut gen = Gen::new("");
        gen.symbols.define("N", Symbol::Const(10));
        let expr = first_expr("int main() { N * 2 + 1; }");
        assert_eq!(fold_expr(&gen, &expr).unwrap(), Some(21));
    }

    #[test]
    fn call_does_not_fold() {
        let gen = Gen::new("");
        let expr = first_expr("int main() { getint() + 1; }");
        assert_eq!(fold_expr(&gen, &expr).unwrap(), None);
    }

    #[test]
    fn constant_division_by_zero_is_an_error() {
        let gen = Gen::new("int main() { 1 / 0; }");
        let expr = first_expr("int main() { 1 / 0; }");
        let err = fold_expr(&gen, &expr).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Semantic {
                kind: SemanticErrorKind::DivisionByZero,
                ..
            }
        ));
    }

    #[test]
    fn wrapping_overflow_matches_twos_complement() {
        let gen = Gen::new("");
        let expr = first_expr("int main() { 2147483647 + 1; }");
        assert_eq!(fold_expr(&gen, &expr).unwrap(), Some(i32::MIN));
    }
}
