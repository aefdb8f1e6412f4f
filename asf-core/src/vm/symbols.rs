use std::collections::HashMap;

use serde::Serialize;

/// A script-declared enum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnumDecl {
    pub namespace: String,
    pub name: String,
    /// Explicit underlying type, `None` for the default `int`.
    pub underlying: Option<String>,
    pub values: Vec<(String, i32)>,
}

impl EnumDecl {
    /// `ns::Name : type`, omitting the parts that are empty.
    pub fn display_name(&self) -> String {
        let mut name = if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}::{}", self.namespace, self.name)
        };
        if let Some(underlying) = &self.underlying {
            name.push_str(" : ");
            name.push_str(underlying);
        }
        name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypedefDecl {
    pub type_id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ObjectTypeDecl {
    pub name: String,
    pub size: u32,
    pub flags: u32,
    /// Property declarations, e.g. `int x`.
    pub properties: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportedFunctionDecl {
    pub declaration: String,
    /// Module the function is bound from.
    pub origin: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptFunction {
    pub declaration: String,
    pub code: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalProperty {
    pub id: i32,
    pub name: String,
}

/// Read-only view of a linked module and the engine it was linked into.
///
/// The enumerations describe the module surface in declaration order. The
/// point lookups resolve operand values found in bytecode; handles are the
/// pointer-sized values the linker baked into the code.
pub trait SymbolTable {
    fn enums(&self) -> &[EnumDecl];
    fn typedefs(&self) -> &[TypedefDecl];
    fn object_types(&self) -> &[ObjectTypeDecl];
    fn global_variables(&self) -> &[String];
    fn imported_functions(&self) -> &[ImportedFunctionDecl];
    fn functions(&self) -> &[ScriptFunction];

    fn global_property(&self, handle: u64) -> Option<&GlobalProperty>;
    fn function_declaration(&self, id: i32) -> Option<&str>;
    fn imported_function_declaration(&self, index: u32) -> Option<&str> {
        self.imported_functions()
            .get(index as usize)
            .map(|f| f.declaration.as_str())
    }
    fn function_at(&self, handle: u64) -> Option<&str>;
    fn type_name(&self, handle: u64) -> Option<&str>;
    fn type_declaration(&self, type_id: i32) -> Option<&str>;
    fn string_constant(&self, index: u16) -> Option<&str>;
}

/// Plain-data symbol table, filled in by a linker or by hand.
#[derive(Debug, Clone, Default)]
pub struct ModuleSymbols {
    pub enums: Vec<EnumDecl>,
    pub typedefs: Vec<TypedefDecl>,
    pub object_types: Vec<ObjectTypeDecl>,
    pub global_variables: Vec<String>,
    pub imported_functions: Vec<ImportedFunctionDecl>,
    pub functions: Vec<ScriptFunction>,

    pub global_properties: HashMap<u64, GlobalProperty>,
    pub function_ids: HashMap<i32, String>,
    pub function_handles: HashMap<u64, String>,
    pub type_handles: HashMap<u64, String>,
    pub type_ids: HashMap<i32, String>,
    pub strings: Vec<String>,
}

impl SymbolTable for ModuleSymbols {
    fn enums(&self) -> &[EnumDecl] {
        &self.enums
    }

    fn typedefs(&self) -> &[TypedefDecl] {
        &self.typedefs
    }

    fn object_types(&self) -> &[ObjectTypeDecl] {
        &self.object_types
    }

    fn global_variables(&self) -> &[String] {
        &self.global_variables
    }

    fn imported_functions(&self) -> &[ImportedFunctionDecl] {
        &self.imported_functions
    }

    fn functions(&self) -> &[ScriptFunction] {
        &self.functions
    }

    fn global_property(&self, handle: u64) -> Option<&GlobalProperty> {
        self.global_properties.get(&handle)
    }

    fn function_declaration(&self, id: i32) -> Option<&str> {
        self.function_ids.get(&id).map(String::as_str)
    }

    fn function_at(&self, handle: u64) -> Option<&str> {
        self.function_handles.get(&handle).map(String::as_str)
    }

    fn type_name(&self, handle: u64) -> Option<&str> {
        self.type_handles.get(&handle).map(String::as_str)
    }

    fn type_declaration(&self, type_id: i32) -> Option<&str> {
        self.type_ids.get(&type_id).map(String::as_str)
    }

    fn string_constant(&self, index: u16) -> Option<&str> {
        self.strings.get(index as usize).map(String::as_str)
    }
}
