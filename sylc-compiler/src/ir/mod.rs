//! The intermediate representation and everything that produces it.
//!
//! `ast` holds the parse tree, `ir_generator` lowers it into the linear
//! IR defined in this module, and `symbol_table` tracks name bindings
//! during that lowering.

pub mod ast;
pub mod ir_generator;
pub mod symbol_table;

mod program;

pub use program::*;
