use std::fmt;

use super::ModuleDump;

/// Tab-indented plain-text dump.
pub struct TextDump<'d, 'a>(pub &'d ModuleDump<'a>);

impl fmt::Display for TextDump<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dump = self.0;

        writeln!(f, "dependencies: {}", dump.dependencies.len())?;
        for dependency in dump.dependencies {
            writeln!(f, "\t{}", dependency)?;
        }

        writeln!(f, "enums: {}", dump.enums.len())?;
        for decl in dump.enums {
            writeln!(f, "\t{}", decl.display_name())?;
            for (name, value) in &decl.values {
                writeln!(f, "\t\t{} = {},", name, value)?;
            }
        }

        writeln!(f, "typedefs: {}", dump.typedefs.len())?;
        for typedef in dump.typedefs {
            writeln!(f, "\t{} {}", typedef.name, typedef.type_id)?;
        }

        writeln!(f, "object_types: {}", dump.object_types.len())?;
        for ty in &dump.object_types {
            writeln!(f, "\t{} {} {:08x}", ty.name, ty.decl.size, ty.decl.flags)?;
            writeln!(f, "\t\tproperties: {}", ty.decl.properties.len())?;
            for property in &ty.decl.properties {
                writeln!(f, "\t\t\t{}", property)?;
            }
        }

        writeln!(f, "global_variables: {}", dump.global_variables.len())?;
        for global in dump.global_variables {
            writeln!(f, "\t{}", global)?;
        }

        writeln!(f, "imported_functions: {}", dump.imported_functions.len())?;
        for import in dump.imported_functions {
            writeln!(f, "\t{} {}", import.declaration, import.origin)?;
        }

        writeln!(f, "functions: {}", dump.functions.len())?;
        for function in &dump.functions {
            writeln!(f, "\t{}", function.declaration)?;
            for instruction in &function.instructions {
                writeln!(f, "\t\t{}", instruction)?;
            }
            if let Some(err) = &function.error {
                writeln!(f, "\t\t; error: {}", err)?;
            }
        }

        Ok(())
    }
}
