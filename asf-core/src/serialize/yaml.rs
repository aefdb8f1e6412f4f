use std::borrow::Cow;
use std::fmt;

use super::ModuleDump;

/// Quote a scalar when a plain YAML scalar would be misread.
///
/// Only `" #"`, `": "` and line breaks trigger quoting; inside quotes `\`,
/// line breaks and `"` are escaped.
pub fn to_yaml_str(input: &str) -> Cow<'_, str> {
    if input.contains(" #") || input.contains(": ") || input.contains('\n') {
        let escaped = input
            .replace('\\', "\\\\")
            .replace('\n', "\\n")
            .replace('"', "\\\"");
        Cow::Owned(format!("\"{}\"", escaped))
    } else {
        Cow::Borrowed(input)
    }
}

/// Block-style YAML dump, one top-level key per section.
pub struct YamlDump<'d, 'a>(pub &'d ModuleDump<'a>);

impl fmt::Display for YamlDump<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dump = self.0;

        writeln!(f, "dependencies:")?;
        for dependency in dump.dependencies {
            writeln!(f, "  - {}", to_yaml_str(dependency))?;
        }

        writeln!(f, "enums:")?;
        for decl in dump.enums {
            writeln!(f, "  {}:", to_yaml_str(&decl.display_name()))?;
            for (name, value) in &decl.values {
                writeln!(f, "    {}: {}", to_yaml_str(name), value)?;
            }
        }

        writeln!(f, "typedefs:")?;
        for typedef in dump.typedefs {
            writeln!(f, "  {}: {}", typedef.type_id, to_yaml_str(&typedef.name))?;
        }

        writeln!(f, "object_types:")?;
        for ty in &dump.object_types {
            writeln!(f, "  {}:", to_yaml_str(&ty.name))?;
            writeln!(f, "    size: {}", ty.decl.size)?;
            writeln!(f, "    flags: {:08x}", ty.decl.flags)?;
            writeln!(f, "    properties:")?;
            for property in &ty.decl.properties {
                writeln!(f, "      - {}", to_yaml_str(property))?;
            }
        }

        writeln!(f, "global_variables:")?;
        for global in dump.global_variables {
            writeln!(f, "  - {}", to_yaml_str(global))?;
        }

        writeln!(f, "imported_functions:")?;
        for import in dump.imported_functions {
            writeln!(f, "  - function: {}", to_yaml_str(&import.declaration))?;
            writeln!(f, "    origin: {}", to_yaml_str(&import.origin))?;
        }

        writeln!(f, "functions:")?;
        for function in &dump.functions {
            writeln!(f, "  {}:", to_yaml_str(function.declaration))?;
            for instruction in &function.instructions {
                writeln!(f, "    - {}", to_yaml_str(instruction.text.trim_end()))?;
            }
            if let Some(err) = &function.error {
                writeln!(f, "    - {}", to_yaml_str(&format!("error: {}", err)))?;
            }
        }

        Ok(())
    }
}
