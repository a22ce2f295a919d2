//! Shared state threaded through the whole lowering pass.

use crate::frontend::lexer::{position_to_line_col, Span};
use crate::ir::symbol_table::SymbolTable;
use crate::ir::{BasicBlock, Function, Instr, Program, TempId, Terminator};
use crate::{CompileError, SemanticErrorKind};

/// Jump targets for `continue` (the loop's condition check) and
/// `break` (the first block after the loop).
pub struct LoopCtx {
    pub entry: String,
    pub exit: String,
}

/// Per-function build state. `cur` is the block under construction;
/// `None` means the last block was sealed and the next instruction has
/// no home yet.
pub struct FuncState {
    pub blocks: Vec<BasicBlock>,
    pub cur: Option<(String, Vec<Instr>)>,
    pub returns_value: bool,
    local_count: usize,
}

/// The IR generation context: symbol table, the program being built,
/// the loop stack and the fresh-name counters.
pub struct Gen<'a> {
    pub source: &'a str,
    pub symbols: SymbolTable,
    pub program: Program,
    pub loops: Vec<LoopCtx>,
    cur_fn: Option<FuncState>,
    temp_count: u32,
    label_count: u32,
}

impl<'a> Gen<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            symbols: SymbolTable::new(),
            program: Program::default(),
            loops: Vec::new(),
            cur_fn: None,
            temp_count: 0,
            label_count: 0,
        }
    }

    pub fn finish(self) -> Program {
        self.program
    }

    // ── Fresh names ─────────────────────────────────────────────────────

    pub fn new_temp(&mut self) -> TempId {
        let id = self.temp_count;
        self.temp_count += 1;
        id
    }

    /// Fresh label, e.g. `then_3`. Labels are function-scoped.
    pub fn new_label(&mut self, base: &str) -> String {
        let n = self.label_count;
        self.label_count += 1;
        format!("{base}_{n}")
    }

    /// Mangle a local variable name into a unique allocation name.
    pub fn local_name(&mut self, name: &str) -> String {
        let state = self.func_mut();
        let n = state.local_count;
        state.local_count += 1;
        format!("{name}_{n}")
    }

    // ── Block builder ───────────────────────────────────────────────────

    fn func_mut(&mut self) -> &mut FuncState {
        self.cur_fn
            .as_mut()
            .expect("instruction emitted outside a function")
    }

    /// Append an instruction to the current block. Code that follows a
    /// terminator (e.g. statements after `return`) lands in a fresh
    /// unreachable block so lowering never has to special-case it.
    pub fn emit(&mut self, instr: Instr) {
        if self.is_terminated() {
            let label = self.new_label("unreachable");
            self.func_mut().cur = Some((label, Vec::new()));
        }
        if let Some((_, instrs)) = self.func_mut().cur.as_mut() {
            instrs.push(instr);
        }
    }

    /// Close the current block with `term`. A no-op when the block is
    /// already sealed, which makes redundant fallthrough jumps vanish.
    pub fn seal(&mut self, term: Terminator) {
        let state = self.func_mut();
        if let Some((label, instrs)) = state.cur.take() {
            state.blocks.push(BasicBlock {
                label,
                instrs,
                term,
            });
        }
    }

    /// Open a new block. The previous one must have been sealed.
    pub fn start_block(&mut self, label: String) {
        let state = self.func_mut();
        debug_assert!(state.cur.is_none(), "starting a block over an open one");
        state.cur = Some((label, Vec::new()));
    }

    pub fn is_terminated(&self) -> bool {
        self.cur_fn
            .as_ref()
            .map_or(true, |state| state.cur.is_none())
    }

    // ── Function lifecycle ──────────────────────────────────────────────

    pub fn start_function(&mut self, returns_value: bool) {
        debug_assert!(self.cur_fn.is_none(), "nested function definitions");
        self.temp_count = 0;
        self.label_count = 0;
        self.cur_fn = Some(FuncState {
            blocks: Vec::new(),
            cur: Some(("entry".to_string(), Vec::new())),
            returns_value,
            local_count: 0,
        });
    }

    /// Seal the trailing block with a synthesized return and push the
    /// finished function into the program.
    pub fn finish_function(&mut self, name: String, param_count: usize) {
        let returns_value = self.func_mut().returns_value;
        if !self.is_terminated() {
            let term = if returns_value {
                Terminator::Ret(Some(crate::ir::Operand::Imm(0)))
            } else {
                Terminator::Ret(None)
            };
            self.seal(term);
        }
        let state = self
            .cur_fn
            .take()
            .expect("finish_function outside a function");
        self.program.functions.push(Function {
            name,
            param_count,
            returns_value,
            blocks: state.blocks,
        });
    }

    pub fn returns_value(&self) -> bool {
        self.cur_fn
            .as_ref()
            .map_or(false, |state| state.returns_value)
    }

    // ── Errors ──────────────────────────────────────────────────────────

    pub fn error(
        &self,
        kind: SemanticErrorKind,
        span: Span,
        message: impl Into<String>,
    ) -> CompileError {
        let (line, col) = position_to_line_col(self.source, span.start);
        CompileError::Semantic {
            kind,
            line,
            col,
            message: message.into(),
        }
    }
}
