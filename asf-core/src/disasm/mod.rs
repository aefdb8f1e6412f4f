//! Bytecode disassembly.
//!
//! [`disassemble`] walks a function's instruction words lazily, one
//! [`Instruction`] per step, resolving operands through a [`SymbolTable`].

mod printf;
mod render;
mod words;

use std::fmt;
use std::iter::FusedIterator;

pub use printf::{escape, format_f, format_g};
pub use render::UNRESOLVED;
pub use words::InstructionWords;

use crate::vm::{Opcode, OpcodeInfo, OperandLayout, PointerWidth, SymbolTable};
use render::Renderer;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DisasmError {
    #[error("unknown opcode 0x{opcode:02X} at {position:04x}")]
    UnknownOpcode { opcode: u8, position: u32 },

    #[error("{mnemonic} at {position:04x} needs {needed} words, only {available} left")]
    TruncatedInstruction {
        mnemonic: &'static str,
        position: u32,
        needed: usize,
        available: usize,
    },
}

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Index of the instruction's first 32-bit word within its function.
    /// This is a word index, not a byte offset; multiply by 4 for bytes.
    pub position: u32,
    pub opcode: Opcode,
    pub layout: OperandLayout,
    pub words: InstructionWords,
    /// Full rendered text, mnemonic included.
    pub text: String,
}

impl Instruction {
    pub fn mnemonic(&self) -> &'static str {
        self.opcode.mnemonic()
    }

    pub fn word_len(&self) -> usize {
        self.layout.word_len()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}: {}", self.position, self.text)
    }
}

/// Lazy instruction stream over one function's code.
///
/// Stops after the first error. A clone continues from the same position, so
/// clone a fresh stream to walk the code again.
pub struct Disassembly<'a, S: ?Sized> {
    code: &'a [u32],
    symbols: &'a S,
    width: PointerWidth,
    position: usize,
    failed: bool,
}

pub fn disassemble<'a, S: SymbolTable + ?Sized>(
    code: &'a [u32],
    symbols: &'a S,
    width: PointerWidth,
) -> Disassembly<'a, S> {
    Disassembly {
        code,
        symbols,
        width,
        position: 0,
        failed: false,
    }
}

impl<'a, S: ?Sized> Clone for Disassembly<'a, S> {
    fn clone(&self) -> Self {
        Self {
            code: self.code,
            symbols: self.symbols,
            width: self.width,
            position: self.position,
            failed: self.failed,
        }
    }
}

impl<'a, S: SymbolTable + ?Sized> Disassembly<'a, S> {
    fn decode(&self) -> Result<Instruction, DisasmError> {
        let position = self.position as u32;
        let remaining = &self.code[self.position..];
        let opcode = (remaining[0] & 0xff) as u8;

        let info = OpcodeInfo::lookup(opcode, self.width)
            .ok_or(DisasmError::UnknownOpcode { opcode, position })?;

        let Some(raw) = remaining.get(..info.word_len) else {
            return Err(DisasmError::TruncatedInstruction {
                mnemonic: info.mnemonic,
                position,
                needed: info.word_len,
                available: remaining.len(),
            });
        };
        let words = InstructionWords::new(raw);

        let text = Renderer {
            symbols: self.symbols,
            info,
            words,
            position,
        }
        .render();

        Ok(Instruction {
            position,
            opcode: info.opcode,
            layout: info.layout,
            words,
            text,
        })
    }
}

impl<'a, S: SymbolTable + ?Sized> Iterator for Disassembly<'a, S> {
    type Item = Result<Instruction, DisasmError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.position >= self.code.len() {
            return None;
        }
        match self.decode() {
            Ok(instruction) => {
                self.position += instruction.word_len();
                Some(Ok(instruction))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

impl<'a, S: SymbolTable + ?Sized> FusedIterator for Disassembly<'a, S> {}
