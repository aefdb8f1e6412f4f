//! This crate implements the core functionality of the ASF tooling
//!
//! This mostly includes the container format, module resolution, bytecode disassembly and dumping.

#![allow(clippy::uninlined_format_args)]

pub mod disasm;
pub mod format;
pub mod resolver;
pub mod serialize;
pub mod vm;

pub use disasm::{disassemble, DisasmError, Disassembly, Instruction};
pub use format::asf::{AsfContainer, FormatError};
pub use resolver::{FsSource, LoadedModule, ModuleResolver, ModuleSource, ResolveError};
pub use vm::{LinkError, ModuleLinker, SymbolTable};
