use serde_json::{json, Map, Value};

use super::ModuleDump;

/// Structured dump; map keys keep walk order.
pub fn to_json(dump: &ModuleDump<'_>) -> Value {
    let enums = dump
        .enums
        .iter()
        .map(|decl| {
            let values = decl
                .values
                .iter()
                .map(|(name, value)| (name.clone(), json!(value)))
                .collect::<Map<_, _>>();
            (decl.display_name(), Value::Object(values))
        })
        .collect::<Map<_, _>>();

    let typedefs = dump
        .typedefs
        .iter()
        .map(|t| (t.type_id.to_string(), json!(t.name)))
        .collect::<Map<_, _>>();

    let object_types = dump
        .object_types
        .iter()
        .map(|t| {
            (
                t.name.clone(),
                json!({
                    "size": t.decl.size,
                    "flags": format!("{:08x}", t.decl.flags),
                    "properties": t.decl.properties,
                }),
            )
        })
        .collect::<Map<_, _>>();

    let imported_functions = dump
        .imported_functions
        .iter()
        .map(|f| json!({ "declaration": f.declaration, "origin": f.origin }))
        .collect::<Vec<_>>();

    let functions = dump
        .functions
        .iter()
        .map(|f| {
            let mut lines = f
                .instructions
                .iter()
                .map(|i| json!(i.to_string()))
                .collect::<Vec<_>>();
            if let Some(err) = &f.error {
                lines.push(json!(format!("error: {}", err)));
            }
            (f.declaration.to_string(), Value::Array(lines))
        })
        .collect::<Map<_, _>>();

    json!({
        "dependencies": dump.dependencies,
        "enums": enums,
        "typedefs": typedefs,
        "objectTypes": object_types,
        "globalVariables": dump.global_variables,
        "importedFunctions": imported_functions,
        "functions": functions,
    })
}
