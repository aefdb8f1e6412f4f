use std::fmt::Display;

use super::printf::{escape, format_f, format_g};
use super::words::InstructionWords;
use crate::vm::{Opcode, OpcodeInfo, OperandLayout, SymbolTable, IMPORTED_FUNCTION_TAG};

/// Placeholder for a symbol the table could not answer.
pub const UNRESOLVED: &str = "{unresolved}";

/// Renders one instruction's text given its decoded words.
pub(crate) struct Renderer<'a, S: ?Sized> {
    pub symbols: &'a S,
    pub info: OpcodeInfo,
    pub words: InstructionWords,
    pub position: u32,
}

impl<'a, S: SymbolTable + ?Sized> Renderer<'a, S> {
    pub fn render(&self) -> String {
        use Opcode::*;

        let op = self.info.opcode;
        let w = &self.words;

        match self.info.layout {
            OperandLayout::NoArg => self.info.mnemonic.to_string(),

            OperandLayout::Word => match op {
                STR => {
                    let index = w.word_arg0();
                    match self.symbols.string_constant(index) {
                        Some(text) => self.line(format_args!(
                            "{} ({}:\"{}\")",
                            index,
                            text.len(),
                            escape(text)
                        )),
                        None => {
                            self.missing("string constant", index as u64);
                            self.line(format_args!("{} ({})", index, UNRESOLVED))
                        }
                    }
                }
                _ => self.line(w.var0()),
            },

            OperandLayout::Var => self.line(format_args!("v{}", w.var0())),

            OperandLayout::VarVar => self.line(format_args!("v{}, v{}", w.var0(), w.var1())),

            OperandLayout::VarImm => self.line(format_args!("v{}, {}", w.var0(), w.var1())),

            OperandLayout::VarVarDword => {
                let imm = w.dword_arg1();
                match op {
                    ADDIf | SUBIf | MULIf => self.line(format_args!(
                        "v{}, v{}, {}",
                        w.var0(),
                        w.var1(),
                        format_f(f32::from_bits(imm) as f64)
                    )),
                    _ => self.line(format_args!("v{}, v{}, {}", w.var0(), w.var1(), imm as i32)),
                }
            }

            OperandLayout::Dword => {
                let arg = w.dword_arg();
                match op {
                    PshC4 | Cast => self.line(format_args!(
                        "0x{:x} (i:{}, f:{})",
                        arg,
                        arg as i32,
                        format_g(f32::from_bits(arg) as f64)
                    )),
                    TYPEID => self.line(format_args!(
                        "0x{:x} (decl:{})",
                        arg,
                        self.resolved(
                            self.symbols.type_declaration(arg as i32),
                            "type id",
                            arg as u64
                        )
                    )),
                    CALL | CALLSYS | CALLBND | CALLINTF | Thiscall1 => {
                        self.line(format_args!("{} ({})", arg as i32, self.function(arg)))
                    }
                    _ if op.is_jump() => {
                        let displacement = arg as i32;
                        let target = self.position.wrapping_add(displacement as u32);
                        self.line(format_args!("{:+} (d:{:x})", displacement, target))
                    }
                    OBJTYPE | FuncPtr | PGA | PshGPtr | LDG | PshG4 | REFCPY => {
                        self.pointer(arg as u64)
                    }
                    _ => self.line(arg as i32),
                }
            }

            OperandLayout::Qword => {
                let arg = w.qword_arg();
                if op.is_pointer_typed() {
                    self.pointer(arg)
                } else {
                    self.line(format_args!(
                        "0x{:x} (i:{}, f:{})",
                        arg,
                        arg as i64,
                        format_g(f64::from_bits(arg))
                    ))
                }
            }

            OperandLayout::VarQword => self.var_handle(w.qword_arg()),

            OperandLayout::DwordDword => {
                let (arg0, arg1) = (w.dword_arg(), w.dword_arg1());
                match op {
                    ALLOC | SetG4 => self.pointer_pair(arg0 as u64, arg1),
                    _ => self.line(format_args!("{}, {}", arg0, arg1 as i32)),
                }
            }

            OperandLayout::VarDwordDword => self.line(format_args!(
                "v{}, {}, {}",
                w.var0(),
                w.dword_arg(),
                w.dword_arg1()
            )),

            OperandLayout::QwordDword => {
                let (arg0, arg1) = (w.qword_arg(), w.qword_tail());
                match op {
                    ALLOC | SetG4 => self.pointer_pair(arg0, arg1),
                    _ => self.line(format_args!(
                        "0x{:x} (i:{}, f:{}), {}",
                        arg0,
                        arg0 as i64,
                        format_g(f64::from_bits(arg0)),
                        arg1 as i32
                    )),
                }
            }

            OperandLayout::Info => match op {
                LABEL => format!("{}:", w.word_arg0()),
                Block => (if w.word_arg0() != 0 { "{" } else { "}" }).to_string(),
                _ => self.info.mnemonic.to_string(),
            },

            OperandLayout::VarDword => {
                let arg = w.dword_arg();
                match op {
                    SetV1 => self.line(format_args!("v{}, 0x{:x}", w.var0(), arg as u8)),
                    SetV2 => self.line(format_args!("v{}, 0x{:x}", w.var0(), arg as u16)),
                    SetV4 => self.line(format_args!(
                        "v{}, 0x{:x} (i:{}, f:{})",
                        w.var0(),
                        arg,
                        arg as i32,
                        format_g(f32::from_bits(arg) as f64)
                    )),
                    CMPIf => self.line(format_args!(
                        "v{}, {}",
                        w.var0(),
                        format_f(f32::from_bits(arg) as f64)
                    )),
                    _ if op.is_pointer_typed() => self.var_handle(arg as u64),
                    _ => self.line(format_args!("v{}, {}", w.var0(), arg as i32)),
                }
            }

            OperandLayout::VarVarVar => self.line(format_args!(
                "v{}, v{}, v{}",
                w.var0(),
                w.var1(),
                w.var2()
            )),
        }
    }

    fn line(&self, operands: impl Display) -> String {
        format!("{:<8} {}", self.info.mnemonic, operands)
    }

    /// A lone pointer-sized handle operand.
    fn pointer(&self, handle: u64) -> String {
        match self.info.opcode {
            Opcode::OBJTYPE => self.line(format_args!(
                "0x{:x} (type:{})",
                handle,
                self.type_name(handle)
            )),
            Opcode::FuncPtr => self.line(format_args!(
                "0x{:x} (func:{})",
                handle,
                self.resolved(self.symbols.function_at(handle), "function handle", handle)
            )),
            Opcode::PGA | Opcode::PshGPtr | Opcode::LDG | Opcode::PshG4 => {
                self.line(format_args!("0x{:x} ({})", handle, self.global(handle)))
            }
            Opcode::REFCPY => self.line(format_args!("0x{:x}", handle)),
            _ => self.line(handle as i64),
        }
    }

    /// A variable slot followed by a handle operand.
    fn var_handle(&self, handle: u64) -> String {
        let var = self.words.var0();
        match self.info.opcode {
            Opcode::RefCpyV | Opcode::FREE => self.line(format_args!(
                "v{}, 0x{:x} (type:{})",
                var,
                handle,
                self.type_name(handle)
            )),
            Opcode::LdGRdR4 | Opcode::CpyGtoV4 | Opcode::CpyVtoG4 => self.line(format_args!(
                "v{}, 0x{:x} ({})",
                var,
                handle,
                self.global(handle)
            )),
            _ => self.line(format_args!(
                "v{}, 0x{:x} (i:{}, f:{})",
                var,
                handle,
                handle as i64,
                format_g(f64::from_bits(handle))
            )),
        }
    }

    /// `ALLOC`/`SetG4`: a handle followed by a 32-bit value.
    fn pointer_pair(&self, handle: u64, value: u32) -> String {
        if self.info.opcode == Opcode::ALLOC {
            let ctor = self
                .symbols
                .function_declaration(self.words.word_arg0() as i32)
                .unwrap_or("{no func}");
            self.line(format_args!(
                "0x{:x}, {} (type:{}, {})",
                handle,
                value as i32,
                self.type_name(handle),
                ctor
            ))
        } else {
            self.line(format_args!(
                "0x{:x}, {} ({})",
                handle,
                value as i32,
                self.global(handle)
            ))
        }
    }

    fn function(&self, id: u32) -> &'a str {
        if id & IMPORTED_FUNCTION_TAG != 0 {
            let index = id & !IMPORTED_FUNCTION_TAG;
            self.resolved(
                self.symbols.imported_function_declaration(index),
                "imported function",
                index as u64,
            )
        } else {
            self.resolved(
                self.symbols.function_declaration(id as i32),
                "function id",
                id as u64,
            )
        }
    }

    fn type_name(&self, handle: u64) -> &'a str {
        self.resolved(self.symbols.type_name(handle), "object type", handle)
    }

    fn global(&self, handle: u64) -> String {
        match self.symbols.global_property(handle) {
            Some(property) => format!("{}:{}", property.id, property.name),
            None => {
                self.missing("global property", handle);
                UNRESOLVED.to_string()
            }
        }
    }

    fn resolved(&self, found: Option<&'a str>, what: &str, key: u64) -> &'a str {
        found.unwrap_or_else(|| {
            self.missing(what, key);
            UNRESOLVED
        })
    }

    fn missing(&self, what: &str, key: u64) {
        log::warn!(
            "{:04x}: {} has no {} for 0x{:x}",
            self.position,
            self.info.mnemonic,
            what,
            key
        );
    }
}
