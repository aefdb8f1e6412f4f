/// The words of one decoded instruction with typed views of its operand slots.
///
/// Word 0 holds the opcode in its low byte and a 16-bit argument in its high half.
/// Shorter instructions are zero-padded, so every accessor is total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstructionWords {
    raw: [u32; 4],
}

impl InstructionWords {
    pub fn new(words: &[u32]) -> Self {
        let mut raw = [0u32; 4];
        let len = words.len().min(raw.len());
        raw[..len].copy_from_slice(&words[..len]);
        Self { raw }
    }

    #[inline]
    pub fn word_arg0(&self) -> u16 {
        (self.raw[0] >> 16) as u16
    }

    #[inline]
    pub fn word_arg1(&self) -> u16 {
        (self.raw[1] & 0xffff) as u16
    }

    #[inline]
    pub fn word_arg2(&self) -> u16 {
        (self.raw[1] >> 16) as u16
    }

    /// First variable slot, a signed stack offset.
    #[inline]
    pub fn var0(&self) -> i16 {
        self.word_arg0() as i16
    }

    #[inline]
    pub fn var1(&self) -> i16 {
        self.word_arg1() as i16
    }

    #[inline]
    pub fn var2(&self) -> i16 {
        self.word_arg2() as i16
    }

    #[inline]
    pub fn dword_arg(&self) -> u32 {
        self.raw[1]
    }

    #[inline]
    pub fn dword_arg1(&self) -> u32 {
        self.raw[2]
    }

    #[inline]
    pub fn qword_arg(&self) -> u64 {
        self.raw[1] as u64 | (self.raw[2] as u64) << 32
    }

    /// The 32-bit value following a qword operand.
    #[inline]
    pub fn qword_tail(&self) -> u32 {
        self.raw[3]
    }
}
