use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;
use itertools::Itertools;

use super::registry::{declared_name, qualify_method, Registry};
use super::symbols::{EnumDecl, GlobalProperty, ModuleSymbols, ObjectTypeDecl, ScriptFunction};
use super::{LinkError, ModuleLinker};

/// Declaration given to the single function a flat module links into.
pub const ENTRY_DECLARATION: &str = "void main()";

/// Host symbols registered before any module is linked.
///
/// Every table hands out `index + 1` as handle (and id) in registration order;
/// zero stays the null handle.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    enums: Vec<EnumDecl>,
    object_types: Vec<ObjectTypeDecl>,
    functions: Vec<String>,
    global_properties: Vec<GlobalProperty>,
}

impl Environment {
    pub fn from_registry(registry: &Registry) -> Self {
        let enums = registry
            .enums
            .iter()
            .chunk_by(|r| (r.namespace.clone(), r.enum_name.clone()))
            .into_iter()
            .map(|((namespace, name), values)| EnumDecl {
                namespace,
                name,
                underlying: None,
                values: values.map(|v| (v.value_name.clone(), v.value)).collect(),
            })
            .collect();

        let mut object_types = registry
            .object_types
            .iter()
            .map(|r| ObjectTypeDecl {
                name: r.object_name.clone(),
                size: r.size.max(0) as u32,
                flags: r.flags,
                properties: Vec::new(),
            })
            .collect::<Vec<_>>();
        for property in &registry.object_properties {
            match object_types
                .iter_mut()
                .find(|t| t.name == property.object_name)
            {
                Some(ty) => ty.properties.push(property.declaration.clone()),
                None => log::warn!(
                    "property {:?} registered on unknown type {}",
                    property.declaration,
                    property.object_name
                ),
            }
        }

        let functions = registry
            .global_functions
            .iter()
            .map(|r| r.declaration.clone())
            .chain(
                registry
                    .object_methods
                    .iter()
                    .map(|r| qualify_method(&r.object_name, &r.declaration)),
            )
            .chain(
                registry
                    .object_behaviours
                    .iter()
                    .map(|r| qualify_method(&r.object_name, &r.declaration)),
            )
            .chain(registry.funcdefs.iter().map(|r| r.declaration.clone()))
            .collect();

        let global_properties = registry
            .global_properties
            .iter()
            .enumerate()
            .map(|(i, r)| GlobalProperty {
                id: i as i32,
                name: declared_name(&r.declaration).to_string(),
            })
            .collect();

        let environment = Self {
            enums,
            object_types,
            functions,
            global_properties,
        };
        log::info!(
            "environment: {} enums, {} object types, {} functions, {} global properties",
            environment.enums.len(),
            environment.object_types.len(),
            environment.functions.len(),
            environment.global_properties.len()
        );
        environment
    }

    pub fn enums(&self) -> &[EnumDecl] {
        &self.enums
    }

    pub fn object_types(&self) -> &[ObjectTypeDecl] {
        &self.object_types
    }

    pub fn functions(&self) -> &[String] {
        &self.functions
    }

    pub fn global_properties(&self) -> &[GlobalProperty] {
        &self.global_properties
    }

    /// Symbol table holding the host enums, object types and lookups.
    fn base_symbols(&self) -> ModuleSymbols {
        let mut symbols = ModuleSymbols {
            enums: self.enums.clone(),
            object_types: self.object_types.clone(),
            ..Default::default()
        };
        for (handle, property) in (1u64..).zip(&self.global_properties) {
            symbols.global_properties.insert(handle, property.clone());
        }
        for (handle, declaration) in (1u64..).zip(&self.functions) {
            symbols.function_ids.insert(handle as i32, declaration.clone());
            symbols.function_handles.insert(handle, declaration.clone());
        }
        for (handle, ty) in (1u64..).zip(&self.object_types) {
            symbols.type_handles.insert(handle, ty.name.clone());
            symbols.type_ids.insert(handle as i32, ty.name.clone());
        }
        symbols
    }
}

/// Links every code blob as a single entry function against a fixed environment.
///
/// Used when no script engine is at hand: the blob is taken as one function's
/// bytecode and operands resolve against the registered host symbols only.
#[derive(Debug, Clone, Default)]
pub struct FlatLinker {
    environment: Environment,
}

impl FlatLinker {
    pub fn new(environment: Environment) -> Self {
        Self { environment }
    }
}

impl ModuleLinker for FlatLinker {
    type Symbols = ModuleSymbols;

    fn link(&mut self, name: &str, code: &Bytes) -> Result<ModuleSymbols, LinkError> {
        if code.len() % 4 != 0 {
            return Err(LinkError::UnalignedCode {
                module: name.to_string(),
                len: code.len(),
            });
        }
        let mut words = vec![0u32; code.len() / 4];
        LittleEndian::read_u32_into(code, &mut words);
        log::info!("linked {} ({} words)", name, words.len());

        let mut symbols = self.environment.base_symbols();
        let entry_id = self.environment.functions.len() as i32 + 1;
        symbols
            .function_ids
            .insert(entry_id, ENTRY_DECLARATION.to_string());
        symbols.functions.push(ScriptFunction {
            declaration: ENTRY_DECLARATION.to_string(),
            code: words,
        });
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::SymbolTable;

    fn registry() -> Registry {
        Registry::from_slice(
            br#"{
                "enums": [
                    { "namespace": "", "enum_name": "Mode", "value_name": "Off", "value": 0 },
                    { "namespace": "", "enum_name": "Mode", "value_name": "On", "value": 1 }
                ],
                "object_types": [{ "namespace": "", "object_name": "Vec3", "size": 12, "flags": 1 }],
                "object_properties": [
                    { "namespace": "", "object_name": "Vec3", "declaration": "float x", "offset": 0 },
                    { "namespace": "", "object_name": "Nope", "declaration": "int y", "offset": 0 }
                ],
                "object_methods": [
                    { "namespace": "", "object_name": "Vec3", "declaration": "float Length() const", "calling_convention": 3 }
                ],
                "global_functions": [{ "namespace": "", "declaration": "void Print(const string &in)" }],
                "global_properties": [
                    { "namespace": "", "declaration": "int g_frame" },
                    { "namespace": "", "declaration": "const float g_speed" }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn environment_tables() {
        let env = Environment::from_registry(&registry());

        assert_eq!(env.enums().len(), 1);
        assert_eq!(env.enums()[0].values, vec![("Off".to_string(), 0), ("On".to_string(), 1)]);
        assert_eq!(env.object_types()[0].properties, vec!["float x".to_string()]);
        assert_eq!(
            env.functions(),
            &["void Print(const string &in)", "float Vec3::Length() const"]
        );
        assert_eq!(env.global_properties()[1].name, "g_speed");
    }

    #[test]
    fn link_resolves_host_symbols() {
        let mut linker = FlatLinker::new(Environment::from_registry(&registry()));
        let code = Bytes::from_static(&[0x3f, 0, 0, 0, 0x0a, 0, 0, 0]);
        let symbols = linker.link("main.bin", &code).unwrap();

        assert_eq!(symbols.functions().len(), 1);
        assert_eq!(symbols.functions()[0].declaration, ENTRY_DECLARATION);
        assert_eq!(symbols.functions()[0].code, vec![0x3f, 0x0a]);

        let property = symbols.global_property(2).unwrap();
        assert_eq!((property.id, property.name.as_str()), (1, "g_speed"));
        assert!(symbols.global_property(0).is_none());
        assert_eq!(symbols.function_declaration(1), Some("void Print(const string &in)"));
        assert_eq!(symbols.function_declaration(3), Some(ENTRY_DECLARATION));
        assert_eq!(symbols.type_name(1), Some("Vec3"));
        assert_eq!(symbols.string_constant(0), None);

        assert_eq!(symbols.enums()[0].display_name(), "Mode");
        assert_eq!(symbols.object_types()[0].name, "Vec3");
        assert_eq!(symbols.object_types()[0].properties, vec!["float x".to_string()]);
    }

    #[test]
    fn link_rejects_partial_word() {
        let mut linker = FlatLinker::default();
        let err = linker
            .link("odd.bin", &Bytes::from_static(&[1, 2, 3]))
            .unwrap_err();
        assert!(matches!(err, LinkError::UnalignedCode { len: 3, .. }));
    }
}
