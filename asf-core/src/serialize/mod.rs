//! Module dumps.
//!
//! [`ModuleDump::collect`] walks a linked module once, in a fixed order, and
//! disassembles every function. The renderers only format what was collected.

pub mod json;
pub mod text;
pub mod yaml;

use std::collections::HashSet;

pub use json::to_json;
pub use text::TextDump;
pub use yaml::{to_yaml_str, YamlDump};

use crate::disasm::{disassemble, DisasmError, Instruction};
use crate::vm::{
    EnumDecl, ImportedFunctionDecl, ObjectTypeDecl, PointerWidth, SymbolTable, TypedefDecl,
};

/// Appended to an object type name until it no longer clashes.
pub const DUPLICATE_SUFFIX: &str = "__$";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectTypeEntry<'a> {
    /// Name made unique within the dump.
    pub name: String,
    pub decl: &'a ObjectTypeDecl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDump<'a> {
    pub declaration: &'a str,
    /// Instructions decoded before `error`, or the whole function.
    pub instructions: Vec<Instruction>,
    pub error: Option<DisasmError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDump<'a> {
    pub dependencies: &'a [String],
    pub enums: &'a [EnumDecl],
    pub typedefs: &'a [TypedefDecl],
    pub object_types: Vec<ObjectTypeEntry<'a>>,
    pub global_variables: &'a [String],
    pub imported_functions: &'a [ImportedFunctionDecl],
    pub functions: Vec<FunctionDump<'a>>,
}

impl<'a> ModuleDump<'a> {
    pub fn collect<S: SymbolTable + ?Sized>(
        dependencies: &'a [String],
        symbols: &'a S,
        width: PointerWidth,
    ) -> Self {
        let mut seen = HashSet::new();
        let object_types = symbols
            .object_types()
            .iter()
            .map(|decl| {
                let mut name = decl.name.clone();
                while seen.contains(&name) {
                    name.push_str(DUPLICATE_SUFFIX);
                }
                seen.insert(name.clone());
                ObjectTypeEntry { name, decl }
            })
            .collect();

        let functions = symbols
            .functions()
            .iter()
            .map(|function| {
                let mut instructions = Vec::new();
                let mut error = None;
                for result in disassemble(&function.code, symbols, width) {
                    match result {
                        Ok(instruction) => instructions.push(instruction),
                        Err(err) => {
                            log::error!("{}: {}", function.declaration, err);
                            error = Some(err);
                        }
                    }
                }
                FunctionDump {
                    declaration: &function.declaration,
                    instructions,
                    error,
                }
            })
            .collect();

        Self {
            dependencies,
            enums: symbols.enums(),
            typedefs: symbols.typedefs(),
            object_types,
            global_variables: symbols.global_variables(),
            imported_functions: symbols.imported_functions(),
            functions,
        }
    }

    /// Functions whose disassembly stopped on an error.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &DisasmError)> + '_ {
        self.functions
            .iter()
            .filter_map(|f| f.error.as_ref().map(|err| (f.declaration, err)))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_names_get_suffix() {
        let mut symbols = fixtures::symbols();
        symbols.object_types.push(symbols.object_types[0].clone());
        let deps = Vec::new();
        let dump = ModuleDump::collect(&deps, &symbols, PointerWidth::Bits32);

        let names = dump
            .object_types
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Player", "Player__$", "Player__$__$"]);
    }

    #[test]
    fn failing_function_keeps_prefix() {
        let symbols = fixtures::symbols();
        let deps = Vec::new();
        let dump = ModuleDump::collect(&deps, &symbols, PointerWidth::Bits32);

        assert_eq!(dump.functions[0].instructions.len(), 3);
        assert!(dump.functions[0].error.is_none());

        let broken = &dump.functions[1];
        assert_eq!(broken.instructions.len(), 1);
        assert_eq!(
            broken.error,
            Some(DisasmError::UnknownOpcode {
                opcode: 0xcd,
                position: 1
            })
        );
        assert_eq!(dump.failures().count(), 1);
    }
}
