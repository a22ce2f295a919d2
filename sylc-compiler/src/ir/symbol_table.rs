//! Lexically scoped symbol table used during IR generation.
//!
//! A stack of frames, one per source block. Definition always targets
//! the innermost frame; lookup walks outward so inner bindings shadow
//! outer ones. Frames are pushed and popped around every block, which
//! makes leaving a scope restore the shadowed bindings for free.

use std::collections::HashMap;

/// What a name is bound to.
#[derive(Debug, Clone)]
pub enum Symbol {
    /// A compile-time integer constant.
    Const(i32),
    /// A scalar variable backed by a named allocation.
    Var { ir_name: String, is_global: bool },
    /// An array variable. `dims` are the declared dimension sizes.
    /// `const_values` holds the flattened initializer for const arrays
    /// so indexing with constant subscripts can fold.
    Array {
        ir_name: String,
        dims: Vec<usize>,
        is_global: bool,
        const_values: Option<Vec<i32>>,
    },
    /// An array parameter. The first dimension decayed to a pointer;
    /// `trailing_dims` are the remaining declared dimensions.
    Ptr {
        ir_name: String,
        trailing_dims: Vec<usize>,
    },
    /// A function.
    Func {
        returns_value: bool,
        param_count: usize,
    },
}

#[derive(Debug)]
pub struct SymbolTable {
    frames: Vec<HashMap<String, Symbol>>,
}

impl SymbolTable {
    /// Create a table with the global frame already in place.
    pub fn new() -> Self {
        Self {
            frames: vec![HashMap::new()],
        }
    }

    pub fn enter_scope(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn exit_scope(&mut self) {
        debug_assert!(self.frames.len() > 1, "cannot pop the global frame");
        self.frames.pop();
    }

    /// Bind `name` in the innermost frame. Returns `false` when the
    /// frame already holds a binding for `name`.
    pub fn define(&mut self, name: &str, symbol: Symbol) -> bool {
        let frame = self
            .frames
            .last_mut()
            .expect("symbol table always has a frame");
        if frame.contains_key(name) {
            return false;
        }
        frame.insert(name.to_string(), symbol);
        true
    }

    /// Look `name` up, innermost frame first.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Depth of the scope stack; 1 means only the global frame.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
