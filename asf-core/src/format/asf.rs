use std::io::Cursor;

use binrw::{binrw, BinRead, BinWrite};
use bytes::Bytes;

/// File signature of every ASF container.
pub const ASF_MAGIC: [u8; 4] = *b"ASF\x01";
/// Size of the fixed header: magic, code offset, code size, dependency count.
pub const HEADER_SIZE: usize = 16;
/// Each dependency name occupies a NUL-padded slot of this size.
pub const DEPENDENCY_SLOT_SIZE: usize = 128;
/// Absolute offset of the code blob in containers written by the toolchain.
pub const CODE_OFFSET: u32 = 0x2010;
/// Number of dependency slots that fit between the header and [`CODE_OFFSET`].
pub const MAX_DEPENDENCIES: usize = (CODE_OFFSET as usize - HEADER_SIZE) / DEPENDENCY_SLOT_SIZE;

#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    #[error("malformed container at offset 0x{offset:X}: {reason}")]
    MalformedContainer { offset: u64, reason: String },

    #[error("dependency table overflow: {count} names need 0x{needed:X} bytes but code starts at 0x2010")]
    DependencyTableOverflow { count: usize, needed: usize },

    #[error("dependency name is {len} bytes long, a slot holds 128: {name:?}")]
    DependencyNameTooLong { name: String, len: usize },

    #[error("dependency name contains a NUL byte: {name:?}")]
    DependencyNameContainsNul { name: String },

    #[error("code blob of {len} bytes does not fit a 32-bit size field")]
    CodeTooLarge { len: usize },

    #[error("failed to write container header")]
    Write(#[from] binrw::Error),
}

/// The fixed part of the envelope, everything before the dependency slots.
#[binrw]
#[brw(little, magic = b"ASF\x01")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AsfHeader {
    code_offset: u32,
    code_size: u32,
    dependency_count: u32,
}

/// A decoded ASF container.
///
/// Layout (little-endian):
/// - 0x00: magic `ASF\x01`
/// - 0x04: u32 code_offset
/// - 0x08: u32 code_size
/// - 0x0C: u32 dependency_count
/// - 0x10: dependency_count slots of 128 bytes, each a NUL-padded module name
/// - code_offset: code_size bytes of linked bytecode
///
/// Containers produced by the toolchain always put the code at [`CODE_OFFSET`]
/// and zero-fill the gap after the dependency table; [`AsfContainer::encode`] does the same.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsfContainer {
    /// Where the code blob started in the decoded file.
    pub code_offset: u32,
    /// Module names this container depends on, in table order.
    pub dependencies: Vec<String>,
    /// The raw bytecode blob handed to the linker.
    pub code: Bytes,
}

impl AsfContainer {
    pub fn new(dependencies: Vec<String>, code: impl Into<Bytes>) -> Self {
        Self {
            code_offset: CODE_OFFSET,
            dependencies,
            code: code.into(),
        }
    }

    pub fn decode(data: impl Into<Bytes>) -> Result<Self, FormatError> {
        let data: Bytes = data.into();
        let mut reader = Cursor::new(&data[..]);

        let header = AsfHeader::read(&mut reader).map_err(|err| FormatError::MalformedContainer {
            offset: match &err {
                binrw::Error::BadMagic { pos, .. } => *pos,
                _ => reader.position(),
            },
            reason: err.to_string(),
        })?;

        let count = header.dependency_count as usize;
        let table_end = count
            .checked_mul(DEPENDENCY_SLOT_SIZE)
            .and_then(|len| len.checked_add(HEADER_SIZE))
            .filter(|end| *end <= data.len())
            .ok_or_else(|| FormatError::MalformedContainer {
                offset: HEADER_SIZE as u64,
                reason: format!(
                    "dependency table of {} slots runs past end of file (len=0x{:X})",
                    count,
                    data.len()
                ),
            })?;

        let dependencies = data[HEADER_SIZE..table_end]
            .chunks_exact(DEPENDENCY_SLOT_SIZE)
            .enumerate()
            .map(|(index, slot)| slot_name(slot, HEADER_SIZE + index * DEPENDENCY_SLOT_SIZE))
            .collect::<Result<Vec<_>, _>>()?;

        let code_start = header.code_offset as usize;
        let code_end = code_start
            .checked_add(header.code_size as usize)
            .filter(|end| *end <= data.len())
            .ok_or_else(|| FormatError::MalformedContainer {
                offset: header.code_offset as u64,
                reason: format!(
                    "code blob of 0x{:X} bytes runs past end of file (len=0x{:X})",
                    header.code_size,
                    data.len()
                ),
            })?;

        Ok(Self {
            code_offset: header.code_offset,
            dependencies,
            code: data.slice(code_start..code_end),
        })
    }

    /// Serialize with the fixed toolchain layout.
    pub fn to_bytes(&self) -> Result<Vec<u8>, FormatError> {
        Self::encode(&self.dependencies, &self.code)
    }

    pub fn encode<S: AsRef<str>>(dependencies: &[S], code: &[u8]) -> Result<Vec<u8>, FormatError> {
        let needed = HEADER_SIZE + DEPENDENCY_SLOT_SIZE * dependencies.len();
        if needed > CODE_OFFSET as usize {
            return Err(FormatError::DependencyTableOverflow {
                count: dependencies.len(),
                needed,
            });
        }
        let code_size =
            u32::try_from(code.len()).map_err(|_| FormatError::CodeTooLarge { len: code.len() })?;

        let header = AsfHeader {
            code_offset: CODE_OFFSET,
            code_size,
            dependency_count: dependencies.len() as u32,
        };
        let mut writer = Cursor::new(Vec::with_capacity(CODE_OFFSET as usize + code.len()));
        header.write(&mut writer)?;
        let mut out = writer.into_inner();

        for name in dependencies {
            let name = name.as_ref();
            let raw = name.as_bytes();
            if raw.contains(&0) {
                return Err(FormatError::DependencyNameContainsNul {
                    name: name.to_string(),
                });
            }
            if raw.len() > DEPENDENCY_SLOT_SIZE {
                return Err(FormatError::DependencyNameTooLong {
                    name: name.to_string(),
                    len: raw.len(),
                });
            }
            out.extend_from_slice(raw);
            out.resize(out.len() + DEPENDENCY_SLOT_SIZE - raw.len(), 0);
        }

        out.resize(CODE_OFFSET as usize, 0);
        out.extend_from_slice(code);
        Ok(out)
    }
}

/// A slot holds a C string; a full slot has no terminator.
///
/// Names must be UTF-8 so that re-encoding writes the same bytes back.
fn slot_name(slot: &[u8], offset: usize) -> Result<String, FormatError> {
    let end = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
    std::str::from_utf8(&slot[..end])
        .map(str::to_string)
        .map_err(|err| FormatError::MalformedContainer {
            offset: (offset + err.valid_up_to()) as u64,
            reason: format!("dependency name is not UTF-8: {}", err),
        })
}
