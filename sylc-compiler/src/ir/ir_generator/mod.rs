//! Lowering from the AST to the linear IR.
//!
//! The work is split across a few files: `context` holds the [`Gen`]
//! state (symbol table, block builder, counters), `fold` is the
//! compile-time evaluator, `expr` lowers expressions and `stmt` lowers
//! declarations, statements and whole functions.

mod context;
mod expr;
mod fold;
mod stmt;

pub use context::Gen;
pub use fold::{eval_const, fold_expr};

use crate::ir::ast::{CompUnit, GlobalItem};
use crate::ir::symbol_table::Symbol;
use crate::ir::Program;
use crate::CompileError;

/// Runtime library functions every program can call without declaring.
/// `(name, parameter count, returns a value)`.
pub const INTRINSICS: &[(&str, usize, bool)] = &[
    ("getint", 0, true),
    ("getch", 0, true),
    ("getarray", 1, true),
    ("putint", 1, false),
    ("putch", 1, false),
    ("putarray", 2, false),
    ("starttime", 0, false),
    ("stoptime", 0, false),
];

/// Lower a whole translation unit. `source` is kept around purely for
/// error positions.
pub fn lower(unit: &CompUnit, source: &str) -> Result<Program, CompileError> {
    let mut gen = Gen::new(source);

    for &(name, param_count, returns_value) in INTRINSICS {
        gen.symbols.define(
            name,
            Symbol::Func {
                returns_value,
                param_count,
            },
        );
    }

    for item in &unit.items {
        match item {
            GlobalItem::Decl(decl) => gen.lower_global_decl(decl)?,
            GlobalItem::Func(func) => gen.lower_function(func)?,
        }
    }

    Ok(gen.finish())
}
