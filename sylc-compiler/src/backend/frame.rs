//! Stack frame layout.
//!
//! Storage policy is spill-everything: every IR temporary gets its own
//! 4-byte frame slot and lives there between the instruction that
//! defines it and the instructions that use it. Nothing stays in a
//! register across an IR instruction, so calls clobber nothing that
//! needs saving except `ra`.
//!
//! Frame shape, from the stack pointer upward:
//!
//! ```text
//! sp + 0            outgoing stack arguments (9th and later)
//! sp + out          local allocations, in order of their alloc
//! sp + out + locals one slot per temporary
//! sp + size - 4     saved ra (non-leaf functions only)
//! ```
//!
//! `size` is rounded up to 16 bytes per the ABI. Incoming stack
//! arguments live in the caller's frame, above `sp + size`.

use crate::ir::{Function, Instr, TempId};
use std::collections::HashMap;

#[derive(Debug)]
pub struct FrameLayout {
    pub size: i32,
    pub save_ra: bool,
    slots: HashMap<String, i32>,
    temps: HashMap<TempId, i32>,
}

impl FrameLayout {
    pub fn build(func: &Function) -> Self {
        let mut max_call_args = 0usize;
        let mut is_leaf = true;
        let mut local_words = 0usize;
        let mut temp_count = 0usize;

        for block in &func.blocks {
            for instr in &block.instrs {
                match instr {
                    Instr::Alloc { words, .. } => local_words += words,
                    Instr::Call { dst, args, .. } => {
                        is_leaf = false;
                        max_call_args = max_call_args.max(args.len());
                        if dst.is_some() {
                            temp_count += 1;
                        }
                    }
                    Instr::Binary { .. } | Instr::Load { .. } | Instr::GetPtr { .. } => {
                        temp_count += 1
                    }
                    Instr::Store { .. } => {}
                }
            }
        }

        let out_words = max_call_args.saturating_sub(8);
        let mut bytes = (out_words + local_words + temp_count) * 4;
        if !is_leaf {
            bytes += 4;
        }
        let size = ((bytes + 15) & !15) as i32;

        // Second scan hands out the actual offsets, in the same order
        // the sizing scan counted them.
        let mut slots = HashMap::new();
        let mut temps = HashMap::new();
        let mut offset = (out_words * 4) as i32;
        for block in &func.blocks {
            for instr in &block.instrs {
                match instr {
                    Instr::Alloc { name, words } => {
                        slots.insert(name.clone(), offset);
                        offset += (*words * 4) as i32;
                    }
                    Instr::Binary { dst, .. }
                    | Instr::Load { dst, .. }
                    | Instr::GetPtr { dst, .. } => {
                        temps.insert(*dst, offset);
                        offset += 4;
                    }
                    Instr::Call { dst: Some(dst), .. } => {
                        temps.insert(*dst, offset);
                        offset += 4;
                    }
                    Instr::Call { dst: None, .. } | Instr::Store { .. } => {}
                }
            }
        }

        Self {
            size,
            save_ra: !is_leaf,
            slots,
            temps,
        }
    }

    /// Offset from `sp` of a named local allocation.
    pub fn slot_offset(&self, name: &str) -> i32 {
        self.slots[name]
    }

    /// Offset from `sp` of a temporary's spill slot.
    pub fn temp_offset(&self, temp: TempId) -> i32 {
        self.temps[&temp]
    }

    /// Offset from `sp` of the saved return address.
    pub fn ra_offset(&self) -> i32 {
        self.size - 4
    }

    /// Offset from `sp` of the i-th incoming argument, for `i >= 8`;
    /// these sit in the caller's outgoing area just above this frame.
    pub fn incoming_arg_offset(&self, i: usize) -> i32 {
        self.size + ((i - 8) * 4) as i32
    }
}
