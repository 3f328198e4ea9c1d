use std::fmt;
use std::ops::Deref;

use super::inst::Instruction;

/// A compiled instruction sequence. Dereferences to `[Instruction]`, so any
/// program can be passed where the VM takes a slice.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    insts: Vec<Instruction>,
}

impl Program {
    pub fn new(insts: Vec<Instruction>) -> Self {
        Self { insts }
    }

    /// Rebuild a program from raw instruction words.
    pub fn from_words(words: &[u32]) -> Self {
        Self::new(words.iter().copied().map(Instruction::from_word).collect())
    }

    /// Rebuild a program from little-endian words. Trailing bytes that do not
    /// fill a word are ignored.
    pub fn from_le_bytes(bytes: &[u8]) -> Self {
        Self::new(
            bytes
                .chunks_exact(4)
                .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                .map(Instruction::from_word)
                .collect(),
        )
    }

    pub fn as_words(&self) -> Vec<u32> {
        self.insts.iter().map(Instruction::word).collect()
    }

    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.insts.iter().flat_map(|inst| inst.word().to_le_bytes()).collect()
    }

    pub fn into_inner(self) -> Vec<Instruction> {
        self.insts
    }
}

impl Deref for Program {
    type Target = [Instruction];

    fn deref(&self) -> &[Instruction] {
        &self.insts
    }
}

impl From<Vec<Instruction>> for Program {
    fn from(insts: Vec<Instruction>) -> Self {
        Self::new(insts)
    }
}

impl FromIterator<Instruction> for Program {
    fn from_iter<I: IntoIterator<Item = Instruction>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Disassembly listing, one `pc: MNEMONIC operand` line per instruction.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.insts.len().saturating_sub(1).to_string().len();
        for (pc, inst) in self.insts.iter().enumerate() {
            writeln!(f, "{pc:>width$}: {inst}")?;
        }
        Ok(())
    }
}
