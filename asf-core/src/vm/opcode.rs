use std::fmt;
use std::str::FromStr;

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

/// Function ids carrying this bit index the imported-function table instead.
pub const IMPORTED_FUNCTION_TAG: u32 = 0x4000_0000;

/// Bytecode instructions understood by the disassembler.
///
/// Discriminants are the opcode byte; variant names are the mnemonics.
#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
#[derive(FromPrimitive, IntoStaticStr, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    PopPtr = 0,
    PshGPtr = 1,
    PshC4 = 2,
    PshV4 = 3,
    PSF = 4,
    SwapPtr = 5,
    NOT = 6,
    PshG4 = 7,
    LdGRdR4 = 8,
    CALL = 9,
    RET = 10,
    JMP = 11,
    JZ = 12,
    JNZ = 13,
    JS = 14,
    JNS = 15,
    JP = 16,
    JNP = 17,
    TZ = 18,
    TNZ = 19,
    TS = 20,
    TNS = 21,
    TP = 22,
    TNP = 23,
    NEGi = 24,
    NEGf = 25,
    NEGd = 26,
    INCi16 = 27,
    INCi8 = 28,
    DECi16 = 29,
    DECi8 = 30,
    INCi = 31,
    DECi = 32,
    INCf = 33,
    DECf = 34,
    INCd = 35,
    DECd = 36,
    IncVi = 37,
    DecVi = 38,
    BNOT = 39,
    BAND = 40,
    BOR = 41,
    BXOR = 42,
    BSLL = 43,
    BSRL = 44,
    BSRA = 45,
    COPY = 46,
    PshC8 = 47,
    PshVPtr = 48,
    RDSPtr = 49,
    CMPd = 50,
    CMPu = 51,
    CMPf = 52,
    CMPi = 53,
    CMPIi = 54,
    CMPIf = 55,
    CMPIu = 56,
    JMPP = 57,
    PopRPtr = 58,
    PshRPtr = 59,
    STR = 60,
    CALLSYS = 61,
    CALLBND = 62,
    SUSPEND = 63,
    ALLOC = 64,
    FREE = 65,
    LOADOBJ = 66,
    STOREOBJ = 67,
    GETOBJ = 68,
    REFCPY = 69,
    CHKREF = 70,
    GETOBJREF = 71,
    GETREF = 72,
    PshNull = 73,
    ClrVPtr = 74,
    OBJTYPE = 75,
    TYPEID = 76,
    SetV4 = 77,
    SetV8 = 78,
    ADDSi = 79,
    CpyVtoV4 = 80,
    CpyVtoV8 = 81,
    CpyVtoR4 = 82,
    CpyVtoR8 = 83,
    CpyVtoG4 = 84,
    CpyRtoV4 = 85,
    CpyRtoV8 = 86,
    CpyGtoV4 = 87,
    WRTV1 = 88,
    WRTV2 = 89,
    WRTV4 = 90,
    WRTV8 = 91,
    RDR1 = 92,
    RDR2 = 93,
    RDR4 = 94,
    RDR8 = 95,
    LDG = 96,
    LDV = 97,
    PGA = 98,
    CmpPtr = 99,
    VAR = 100,
    iTOf = 101,
    fTOi = 102,
    uTOf = 103,
    fTOu = 104,
    sbTOi = 105,
    swTOi = 106,
    ubTOi = 107,
    uwTOi = 108,
    dTOi = 109,
    dTOu = 110,
    dTOf = 111,
    iTOd = 112,
    uTOd = 113,
    fTOd = 114,
    ADDi = 115,
    SUBi = 116,
    MULi = 117,
    DIVi = 118,
    MODi = 119,
    ADDf = 120,
    SUBf = 121,
    MULf = 122,
    DIVf = 123,
    MODf = 124,
    ADDd = 125,
    SUBd = 126,
    MULd = 127,
    DIVd = 128,
    MODd = 129,
    ADDIi = 130,
    SUBIi = 131,
    MULIi = 132,
    ADDIf = 133,
    SUBIf = 134,
    MULIf = 135,
    SetG4 = 136,
    ChkRefS = 137,
    ChkNullV = 138,
    CALLINTF = 139,
    iTOb = 140,
    iTOw = 141,
    SetV1 = 142,
    SetV2 = 143,
    Cast = 144,
    i64TOi = 145,
    uTOi64 = 146,
    iTOi64 = 147,
    fTOi64 = 148,
    dTOi64 = 149,
    fTOu64 = 150,
    dTOu64 = 151,
    i64TOf = 152,
    u64TOf = 153,
    i64TOd = 154,
    u64TOd = 155,
    NEGi64 = 156,
    INCi64 = 157,
    DECi64 = 158,
    BNOT64 = 159,
    ADDi64 = 160,
    SUBi64 = 161,
    MULi64 = 162,
    DIVi64 = 163,
    MODi64 = 164,
    BAND64 = 165,
    BOR64 = 166,
    BXOR64 = 167,
    BSLL64 = 168,
    BSRL64 = 169,
    BSRA64 = 170,
    CMPi64 = 171,
    CMPu64 = 172,
    ChkNullS = 173,
    ClrHi = 174,
    JitEntry = 175,
    CallPtr = 176,
    FuncPtr = 177,
    LoadThisR = 178,
    PshV8 = 179,
    DIVu = 180,
    MODu = 181,
    DIVu64 = 182,
    MODu64 = 183,
    LoadRObjR = 184,
    LoadVObjR = 185,
    RefCpyV = 186,
    JLowZ = 187,
    JLowNZ = 188,
    AllocMem = 189,
    SetListSize = 190,
    PshListElmnt = 191,
    SetListType = 192,
    POWi = 193,
    POWu = 194,
    POWf = 195,
    POWd = 196,
    POWdi = 197,
    POWi64 = 198,
    POWu64 = 199,
    Thiscall1 = 200,

    // pseudo instructions, only present in unoptimised code
    VarDecl = 251,
    Block = 252,
    ObjInfo = 253,
    LINE = 254,
    LABEL = 255,
}

/// Shape of an instruction's operands.
///
/// `Var` slots are 16-bit stack variable indices rendered as `v<n>`.
#[derive(IntoStaticStr, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandLayout {
    NoArg,
    Word,
    Var,
    VarVar,
    /// Variable slot plus a 16-bit immediate. The bytecode format defines it
    /// but no opcode in the current table is encoded this way.
    VarImm,
    VarVarDword,
    Dword,
    Qword,
    VarQword,
    DwordDword,
    VarDwordDword,
    QwordDword,
    Info,
    VarDword,
    VarVarVar,
}

impl OperandLayout {
    /// Number of 32-bit words an instruction of this shape occupies, opcode included.
    pub const fn word_len(self) -> usize {
        match self {
            OperandLayout::NoArg
            | OperandLayout::Word
            | OperandLayout::Var
            | OperandLayout::Info => 1,
            OperandLayout::VarVar
            | OperandLayout::VarImm
            | OperandLayout::Dword
            | OperandLayout::VarDword
            | OperandLayout::VarVarVar => 2,
            OperandLayout::VarVarDword
            | OperandLayout::Qword
            | OperandLayout::VarQword
            | OperandLayout::DwordDword
            | OperandLayout::VarDwordDword => 3,
            OperandLayout::QwordDword => 4,
        }
    }
}

/// Width of pointer operands in the linked bytecode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PointerWidth {
    #[default]
    Bits32,
    Bits64,
}

impl TryFrom<u8> for PointerWidth {
    type Error = String;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            32 => Ok(PointerWidth::Bits32),
            64 => Ok(PointerWidth::Bits64),
            _ => Err(format!("unsupported pointer width: {} (expected 32 or 64)", bits)),
        }
    }
}

impl From<PointerWidth> for u8 {
    fn from(width: PointerWidth) -> u8 {
        match width {
            PointerWidth::Bits32 => 32,
            PointerWidth::Bits64 => 64,
        }
    }
}

impl FromStr for PointerWidth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bits = s
            .trim()
            .parse::<u8>()
            .map_err(|_| format!("invalid pointer width: {:?}", s))?;
        PointerWidth::try_from(bits)
    }
}

impl fmt::Display for PointerWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

/// Metadata table entry for one opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeInfo {
    pub opcode: Opcode,
    pub mnemonic: &'static str,
    pub layout: OperandLayout,
    pub word_len: usize,
}

impl OpcodeInfo {
    pub fn lookup(byte: u8, width: PointerWidth) -> Option<Self> {
        Opcode::from_u8(byte).map(|opcode| opcode.info(width))
    }
}

impl Opcode {
    #[inline]
    pub fn mnemonic(self) -> &'static str {
        self.into()
    }

    pub fn info(self, width: PointerWidth) -> OpcodeInfo {
        let layout = self.layout(width);
        OpcodeInfo {
            opcode: self,
            mnemonic: self.mnemonic(),
            layout,
            word_len: layout.word_len(),
        }
    }

    /// Opcodes whose operand is a pointer-sized handle (global, type, function).
    pub fn is_pointer_typed(self) -> bool {
        matches!(
            self,
            Opcode::PshGPtr
                | Opcode::PshG4
                | Opcode::LdGRdR4
                | Opcode::ALLOC
                | Opcode::FREE
                | Opcode::REFCPY
                | Opcode::OBJTYPE
                | Opcode::CpyVtoG4
                | Opcode::CpyGtoV4
                | Opcode::LDG
                | Opcode::PGA
                | Opcode::SetG4
                | Opcode::JitEntry
                | Opcode::FuncPtr
                | Opcode::RefCpyV
        )
    }

    /// One of the nine branch instructions taking a relative displacement.
    pub fn is_jump(self) -> bool {
        matches!(
            self,
            Opcode::JMP
                | Opcode::JZ
                | Opcode::JLowZ
                | Opcode::JS
                | Opcode::JP
                | Opcode::JNZ
                | Opcode::JLowNZ
                | Opcode::JNS
                | Opcode::JNP
        )
    }

    pub fn layout(self, width: PointerWidth) -> OperandLayout {
        let layout = self.layout32();
        if width == PointerWidth::Bits32 || !self.is_pointer_typed() {
            return layout;
        }
        match layout {
            OperandLayout::Dword => OperandLayout::Qword,
            OperandLayout::VarDword => OperandLayout::VarQword,
            OperandLayout::DwordDword => OperandLayout::QwordDword,
            other => other,
        }
    }

    fn layout32(self) -> OperandLayout {
        use Opcode::*;
        use OperandLayout as L;

        match self {
            PopPtr | SwapPtr | TZ | TNZ | TS | TNS | TP | TNP | INCi16 | INCi8 | DECi16 | DECi8
            | INCi | DECi | INCf | DECf | INCd | DECd | RDSPtr | PopRPtr | PshRPtr | SUSPEND
            | CHKREF | PshNull | ChkRefS | INCi64 | DECi64 | ClrHi => L::NoArg,

            RET | STR | GETOBJ | GETOBJREF | GETREF | ChkNullS | VarDecl => L::Word,

            PshV4 | PSF | NOT | NEGi | NEGf | NEGd | IncVi | DecVi | BNOT | PshVPtr | JMPP
            | LOADOBJ | STOREOBJ | ClrVPtr | CpyVtoR4 | CpyVtoR8 | CpyRtoV4 | CpyRtoV8 | WRTV1
            | WRTV2 | WRTV4 | WRTV8 | RDR1 | RDR2 | RDR4 | RDR8 | LDV | VAR | iTOf | fTOi
            | uTOf | fTOu | sbTOi | swTOi | ubTOi | uwTOi | ChkNullV | iTOb | iTOw | dTOi64
            | dTOu64 | i64TOd | u64TOd | NEGi64 | BNOT64 | CallPtr | PshV8 => L::Var,

            CMPd | CMPu | CMPf | CMPi | CpyVtoV4 | CpyVtoV8 | CmpPtr | dTOi | dTOu | dTOf
            | iTOd | uTOd | fTOd | i64TOi | uTOi64 | iTOi64 | fTOi64 | fTOu64 | i64TOf
            | u64TOf | CMPi64 | CMPu64 => L::VarVar,

            ADDIi | SUBIi | MULIi | ADDIf | SUBIf | MULIf | LoadRObjR | LoadVObjR => {
                L::VarVarDword
            }

            PshGPtr | PshC4 | PshG4 | CALL | JMP | JZ | JNZ | JS | JNS | JP | JNP | CALLSYS
            | CALLBND | REFCPY | OBJTYPE | TYPEID | LDG | PGA | CALLINTF | Cast | JitEntry
            | FuncPtr | JLowZ | JLowNZ | Thiscall1 => L::Dword,

            PshC8 => L::Qword,

            SetV8 => L::VarQword,

            ALLOC | SetG4 => L::DwordDword,

            SetListSize | SetListType => L::VarDwordDword,

            Block | LINE | LABEL => L::Info,

            LdGRdR4 | COPY | CMPIi | CMPIf | CMPIu | FREE | SetV4 | ADDSi | CpyVtoG4
            | CpyGtoV4 | SetV1 | SetV2 | LoadThisR | RefCpyV | AllocMem | PshListElmnt
            | ObjInfo => L::VarDword,

            BAND | BOR | BXOR | BSLL | BSRL | BSRA | ADDi | SUBi | MULi | DIVi | MODi | ADDf
            | SUBf | MULf | DIVf | MODf | ADDd | SUBd | MULd | DIVd | MODd | ADDi64 | SUBi64
            | MULi64 | DIVi64 | MODi64 | BAND64 | BOR64 | BXOR64 | BSLL64 | BSRL64 | BSRA64
            | DIVu | MODu | DIVu64 | MODu64 | POWi | POWu | POWf | POWd | POWdi | POWi64
            | POWu64 => L::VarVarVar,
        }
    }
}
