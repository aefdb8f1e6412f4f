//! The script engine seam.
//!
//! Linking a code blob into a live module is the engine's job; everything the
//! disassembler and the dumpers need from the result goes through [`SymbolTable`].

pub mod flat;
pub mod opcode;
pub mod registry;
pub mod symbols;

use bytes::Bytes;

pub use flat::{Environment, FlatLinker};
pub use opcode::{Opcode, OpcodeInfo, OperandLayout, PointerWidth, IMPORTED_FUNCTION_TAG};
pub use registry::Registry;
pub use symbols::{
    EnumDecl, GlobalProperty, ImportedFunctionDecl, ModuleSymbols, ObjectTypeDecl,
    ScriptFunction, SymbolTable, TypedefDecl,
};

#[derive(thiserror::Error, Debug)]
pub enum LinkError {
    #[error("failed to link module {module}: {reason}")]
    Rejected { module: String, reason: String },

    #[error("module {module}: code blob of {len} bytes is not a whole number of instruction words")]
    UnalignedCode { module: String, len: usize },
}

/// Turns a container's code blob into a linked module.
///
/// A linker is called at most once per module name, after all of the module's
/// dependencies have been linked.
pub trait ModuleLinker {
    type Symbols: SymbolTable;

    fn link(&mut self, name: &str, code: &Bytes) -> Result<Self::Symbols, LinkError>;
}
