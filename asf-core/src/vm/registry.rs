use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Host-registered environment, as exported from the game's engine setup.
///
/// Every section is an ordered list; records are registered in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Registry {
    pub namespaces: Vec<NamespaceRecord>,
    pub enums: Vec<EnumValueRecord>,
    pub object_types: Vec<ObjectTypeRecord>,
    pub object_properties: Vec<ObjectPropertyRecord>,
    pub object_behaviours: Vec<ObjectBehaviourRecord>,
    pub object_methods: Vec<ObjectMethodRecord>,
    pub global_functions: Vec<DeclarationRecord>,
    pub global_properties: Vec<DeclarationRecord>,
    pub funcdefs: Vec<DeclarationRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceRecord {
    #[serde(default)]
    pub namespace: String,
}

/// One value of a registered enum; values of the same enum share `enum_name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValueRecord {
    #[serde(default)]
    pub namespace: String,
    pub enum_name: String,
    pub value_name: String,
    pub value: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectTypeRecord {
    #[serde(default)]
    pub namespace: String,
    pub object_name: String,
    #[serde(default)]
    pub size: i32,
    #[serde(default)]
    pub flags: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectPropertyRecord {
    #[serde(default)]
    pub namespace: String,
    pub object_name: String,
    pub declaration: String,
    #[serde(default)]
    pub offset: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectBehaviourRecord {
    #[serde(default)]
    pub namespace: String,
    pub object_name: String,
    pub behaviour: i32,
    pub declaration: String,
    #[serde(default)]
    pub calling_convention: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMethodRecord {
    #[serde(default)]
    pub namespace: String,
    pub object_name: String,
    pub declaration: String,
    #[serde(default)]
    pub calling_convention: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationRecord {
    #[serde(default)]
    pub namespace: String,
    pub declaration: String,
}

impl Registry {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .with_context(|| format!("failed to read registry {}", path.display()))?;
        Self::from_slice(&data)
            .with_context(|| format!("failed to parse registry {}", path.display()))
    }

    pub fn from_slice(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}

/// Name declared by a variable declaration: the trailing identifier.
///
/// `const float g_speed` gives `g_speed`, `array<int>@ g_list` gives `g_list`.
pub fn declared_name(declaration: &str) -> &str {
    let declaration = declaration.trim_end();
    let start = declaration
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_ident_char(*c))
        .last()
        .map_or(declaration.len(), |(i, _)| i);
    &declaration[start..]
}

/// Insert `Object::` in front of the function name of a method declaration.
pub fn qualify_method(object: &str, declaration: &str) -> String {
    let paren = declaration.find('(').unwrap_or(declaration.len());
    let head = declaration[..paren].trim_end();
    let name_start = head
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_ident_char(*c) || *c == '~')
        .last()
        .map_or(head.len(), |(i, _)| i);
    format!(
        "{}{}::{}",
        &declaration[..name_start],
        object,
        &declaration[name_start..]
    )
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_sections() {
        let registry = Registry::from_slice(
            br#"{
                "namespaces": [{ "namespace": "ui" }],
                "object_types": [{ "namespace": "", "object_name": "Vec3", "size": 12, "flags": 262 }],
                "object_properties": [
                    { "namespace": "", "object_name": "Vec3", "declaration": "float x", "offset": 0 }
                ],
                "global_functions": [{ "namespace": "", "declaration": "void Print(const string &in)" }],
                "global_properties": [{ "namespace": "ui", "declaration": "int g_cursor" }]
            }"#,
        )
        .unwrap();

        assert_eq!(registry.namespaces.len(), 1);
        assert_eq!(registry.object_types[0].object_name, "Vec3");
        assert_eq!(registry.object_types[0].size, 12);
        assert_eq!(registry.object_properties[0].declaration, "float x");
        assert_eq!(registry.global_properties[0].namespace, "ui");
        assert!(registry.funcdefs.is_empty());
        assert!(registry.enums.is_empty());
    }

    #[test]
    fn rejects_bad_record() {
        let err = Registry::from_slice(br#"{ "global_functions": [{ "namespace": "" }] }"#);
        assert!(err.is_err());
    }

    #[test]
    fn declared_names() {
        assert_eq!(declared_name("int g_count"), "g_count");
        assert_eq!(declared_name("const float g_speed "), "g_speed");
        assert_eq!(declared_name("array<int>@ g_list"), "g_list");
        assert_eq!(declared_name("bogus@"), "");
    }

    #[test]
    fn qualified_methods() {
        assert_eq!(
            qualify_method("Vec3", "float Length() const"),
            "float Vec3::Length() const"
        );
        assert_eq!(
            qualify_method("Vec3", "Vec3 &opAssign(const Vec3 &in)"),
            "Vec3 &Vec3::opAssign(const Vec3 &in)"
        );
        assert_eq!(qualify_method("Obj", "void f"), "void Obj::f");
    }
}
